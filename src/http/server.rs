//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all registry handlers
//! - Wire up middleware (request ID, tracing, timeout, metrics)
//! - Run the health monitor for the lifetime of the server
//! - Serve until shutdown is signalled, then drain

use std::future::IntoFuture;
use std::time::Duration;

use axum::{
    Router, middleware,
    routing::{delete, get, post},
};
use tokio::net::TcpListener;
use tokio::sync::{broadcast, oneshot};
use tokio::time;
use tower::ServiceBuilder;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::RegistryConfig;
use crate::health::HealthMonitor;
use crate::http::handlers;
use crate::http::request::{UuidRequestId, request_id_header, track_requests};
use crate::lifecycle::recv_shutdown;
use crate::registry::Registry;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub registry: Registry,
}

/// HTTP front of the service registry.
pub struct HttpServer {
    router: Router,
    config: RegistryConfig,
    registry: Registry,
}

impl HttpServer {
    /// Create a new HTTP server with an empty registry.
    pub fn new(config: RegistryConfig) -> Self {
        Self::with_registry(config, Registry::new())
    }

    /// Create a server around an existing registry handle.
    pub fn with_registry(config: RegistryConfig, registry: Registry) -> Self {
        let state = AppState {
            registry: registry.clone(),
        };
        let router = Self::build_router(&config, state);
        Self {
            router,
            config,
            registry,
        }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &RegistryConfig, state: AppState) -> Router {
        let header = request_id_header();

        Router::new()
            .route("/register", post(handlers::register))
            .route("/heartbeat/{id}", post(handlers::heartbeat))
            .route("/deregister/{id}", delete(handlers::deregister))
            .route("/discover/{name}", get(handlers::discover))
            .route("/services", get(handlers::list_services))
            .route("/health", get(handlers::health))
            .route_layer(middleware::from_fn(track_requests))
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::new(header.clone(), UuidRequestId))
                    .layer(TraceLayer::new_for_http())
                    .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
                    .layer(PropagateRequestIdLayer::new(header)),
            )
    }

    /// The router, for in-process use.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Run the server, accepting connections on the given listener.
    ///
    /// Once shutdown fires, in-flight requests get `shutdown_grace_secs` to
    /// finish; after that `run` returns without waiting for them.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let monitor = HealthMonitor::new(self.registry.clone(), self.config.monitor.clone()).start();
        let grace = Duration::from_secs(self.config.timeouts.shutdown_grace_secs);

        let (fired_tx, fired_rx) = oneshot::channel();
        let signal = async move {
            recv_shutdown(shutdown).await;
            let _ = fired_tx.send(());
        };
        let serve = axum::serve(listener, self.router)
            .with_graceful_shutdown(signal)
            .into_future();
        tokio::pin!(serve);

        let drain_deadline = async {
            match fired_rx.await {
                Ok(()) => time::sleep(grace).await,
                // serve finished without a shutdown signal
                Err(_) => std::future::pending::<()>().await,
            }
        };

        let result = tokio::select! {
            res = &mut serve => res,
            _ = drain_deadline => {
                tracing::warn!(
                    grace_secs = grace.as_secs(),
                    "Shutdown grace period elapsed with connections still open"
                );
                Ok(())
            }
        };

        monitor.stop().await;
        tracing::info!(
            registered_services = self.registry.count(),
            "HTTP server stopped"
        );
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{Body, to_bytes};
    use axum::http::{Method, Request, StatusCode};
    use serde_json::{Value, json};
    use tower::ServiceExt;

    async fn call(router: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(v) => {
                builder = builder.header("content-type", "application/json");
                Body::from(v.to_string())
            }
            None => Body::empty(),
        };
        let response = router
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, json)
    }

    fn server() -> HttpServer {
        HttpServer::new(RegistryConfig::default())
    }

    #[tokio::test]
    async fn test_register_and_discover() {
        let router = server().router();

        let (status, body) = call(
            &router,
            Method::POST,
            "/register",
            Some(json!({"service_name": "svc-a", "host": "127.0.0.1", "port": 9001})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["service_id"], "svc-a_127.0.0.1_9001");
        assert_eq!(body["message"], "Service 'svc-a' registered successfully");

        let (status, body) = call(&router, Method::GET, "/discover/svc-a", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["host"], "127.0.0.1");
        assert_eq!(body["port"], 9001);
        assert_eq!(body["url"], "http://127.0.0.1:9001");
    }

    #[tokio::test]
    async fn test_malformed_register_is_422() {
        let router = server().router();

        let (status, body) = call(
            &router,
            Method::POST,
            "/register",
            Some(json!({"host": "127.0.0.1", "port": 9001})),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["success"], false);

        let (status, _) = call(
            &router,
            Method::POST,
            "/register",
            Some(json!({"service_name": "svc", "host": "h", "port": 70000})),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_unknown_ids_are_404() {
        let router = server().router();

        let (status, body) = call(&router, Method::POST, "/heartbeat/nonexistent", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["detail"], "Service 'nonexistent' not found");

        let (status, _) = call(&router, Method::DELETE, "/deregister/nonexistent", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, body) = call(&router, Method::GET, "/discover/ghost", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["detail"], "Service 'ghost' not found or unavailable");
    }

    #[tokio::test]
    async fn test_health_and_list() {
        let server = server();
        server
            .registry()
            .register(&crate::registry::Registration::new("svc-a", "127.0.0.1", 9001))
            .unwrap();
        let router = server.router();

        let (status, body) = call(&router, Method::GET, "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["service"], "service-registry");
        assert_eq!(body["registered_services"], 1);

        let (_, body) = call(&router, Method::GET, "/services", None).await;
        assert_eq!(body["count"], 1);
        assert_eq!(body["services"][0]["status"], "UP");
        assert_eq!(body["services"][0]["version"], "1.0.0");
    }

    #[tokio::test]
    async fn test_request_id_is_echoed() {
        let router = server().router();
        let response = router
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert!(response.headers().contains_key("x-request-id"));
    }

    #[tokio::test]
    async fn test_stalled_request_does_not_block_shutdown() {
        use tokio::io::AsyncWriteExt;

        let mut config = RegistryConfig::default();
        config.timeouts.request_secs = 60;
        config.timeouts.shutdown_grace_secs = 1;

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let shutdown = crate::lifecycle::Shutdown::new();
        let server_shutdown = shutdown.subscribe();
        let task = tokio::spawn(HttpServer::new(config).run(listener, server_shutdown));

        // headers promise a body that never arrives, so the handler stays in flight
        let mut stream = tokio::net::TcpStream::connect(addr).await.unwrap();
        stream
            .write_all(
                b"POST /register HTTP/1.1\r\nhost: localhost\r\ncontent-type: application/json\r\ncontent-length: 100\r\n\r\n{\"service_name\"",
            )
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(200)).await;

        shutdown.trigger();
        let result = tokio::time::timeout(Duration::from_secs(5), task)
            .await
            .expect("run should return after the grace period")
            .unwrap();
        assert!(result.is_ok());
        drop(stream);
    }

    #[tokio::test]
    async fn test_idle_server_stops_immediately() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let shutdown = crate::lifecycle::Shutdown::new();
        let server_shutdown = shutdown.subscribe();
        let task = tokio::spawn(HttpServer::new(RegistryConfig::default()).run(listener, server_shutdown));

        tokio::time::sleep(Duration::from_millis(50)).await;
        shutdown.trigger();

        // default grace is 10s; an idle server must not wait for it
        tokio::time::timeout(Duration::from_secs(2), task)
            .await
            .expect("idle server should stop without waiting out the grace period")
            .unwrap()
            .unwrap();
    }
}
