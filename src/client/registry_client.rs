//! HTTP client for the registry API.

use std::time::Duration;

use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use url::Url;

use crate::http::response::{
    DiscoverResponse, ErrorResponse, HealthResponse, ListResponse, MessageResponse,
    RegisterResponse,
};
use crate::registry::Registration;

pub const DEFAULT_REGISTRY_URL: &str = "http://127.0.0.1:8500";

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("invalid registry url: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("registry url cannot carry a path")]
    CannotBeABase,

    #[error("request to registry failed: {0}")]
    Http(#[from] reqwest::Error),

    /// 404 from the registry: unknown instance id or no live instance.
    #[error("not found: {0}")]
    NotFound(String),

    #[error("registry rejected request with {status}: {detail}")]
    Rejected { status: StatusCode, detail: String },
}

/// Thin client over the registry's JSON endpoints.
#[derive(Debug, Clone)]
pub struct RegistryClient {
    http: Client,
    base_url: Url,
}

impl RegistryClient {
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        Self::with_timeout(base_url, Duration::from_secs(5))
    }

    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self, ClientError> {
        let http = Client::builder().timeout(timeout).build()?;
        Self::with_http_client(base_url, http)
    }

    /// Use a preconfigured `reqwest::Client` (proxies, TLS, pooling).
    pub fn with_http_client(base_url: &str, http: Client) -> Result<Self, ClientError> {
        let base_url = Url::parse(base_url)?;
        if base_url.cannot_be_a_base() {
            return Err(ClientError::CannotBeABase);
        }
        Ok(Self { http, base_url })
    }

    /// Join path segments onto the base url, percent-encoding each one.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, ClientError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ClientError::CannotBeABase)?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Register an instance; returns its service id.
    pub async fn register(&self, registration: &Registration) -> Result<String, ClientError> {
        let res = self
            .http
            .post(self.endpoint(&["register"])?)
            .json(registration)
            .send()
            .await?;
        let body: RegisterResponse = parse(res).await?;
        Ok(body.service_id)
    }

    pub async fn heartbeat(&self, service_id: &str) -> Result<(), ClientError> {
        let res = self
            .http
            .post(self.endpoint(&["heartbeat", service_id])?)
            .send()
            .await?;
        parse::<MessageResponse>(res).await.map(|_| ())
    }

    pub async fn deregister(&self, service_id: &str) -> Result<(), ClientError> {
        let res = self
            .http
            .delete(self.endpoint(&["deregister", service_id])?)
            .send()
            .await?;
        parse::<MessageResponse>(res).await.map(|_| ())
    }

    pub async fn discover(&self, service_name: &str) -> Result<DiscoverResponse, ClientError> {
        let res = self
            .http
            .get(self.endpoint(&["discover", service_name])?)
            .send()
            .await?;
        parse(res).await
    }

    /// Resolve a service name to its base url, logging instead of failing.
    pub async fn discover_url(&self, service_name: &str) -> Option<Url> {
        match self.discover(service_name).await {
            Ok(found) => Url::parse(&found.url).ok(),
            Err(e) => {
                tracing::warn!(service = %service_name, error = %e, "Discovery failed");
                None
            }
        }
    }

    pub async fn list(&self) -> Result<ListResponse, ClientError> {
        let res = self.http.get(self.endpoint(&["services"])?).send().await?;
        parse(res).await
    }

    pub async fn health(&self) -> Result<HealthResponse, ClientError> {
        let res = self.http.get(self.endpoint(&["health"])?).send().await?;
        parse(res).await
    }
}

async fn parse<T: DeserializeOwned>(res: Response) -> Result<T, ClientError> {
    let status = res.status();
    if status.is_success() {
        return Ok(res.json().await?);
    }

    let text = res.text().await?;
    let detail = serde_json::from_str::<ErrorResponse>(&text)
        .map(|e| e.detail)
        .unwrap_or(text);

    if status == StatusCode::NOT_FOUND {
        Err(ClientError::NotFound(detail))
    } else {
        Err(ClientError::Rejected { status, detail })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_encodes_segments() {
        let client = RegistryClient::new("http://127.0.0.1:8500").unwrap();
        let url = client.endpoint(&["heartbeat", "svc a_127.0.0.1_9001"]).unwrap();
        assert_eq!(
            url.as_str(),
            "http://127.0.0.1:8500/heartbeat/svc%20a_127.0.0.1_9001"
        );
    }

    #[test]
    fn test_endpoint_keeps_base_path() {
        let client = RegistryClient::new("http://gateway.local/registry/").unwrap();
        let url = client.endpoint(&["services"]).unwrap();
        assert_eq!(url.as_str(), "http://gateway.local/registry/services");
    }

    #[test]
    fn test_rejects_bad_urls() {
        assert!(matches!(
            RegistryClient::new("not a url"),
            Err(ClientError::InvalidUrl(_))
        ));
        assert!(matches!(
            RegistryClient::new("mailto:ops@example.com"),
            Err(ClientError::CannotBeABase)
        ));
    }
}
