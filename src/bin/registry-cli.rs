use std::time::Duration;

use clap::{Parser, Subcommand};
use serde::Serialize;

use service_registry::client::{
    DEFAULT_HEARTBEAT_INTERVAL, DEFAULT_REGISTRY_URL, RegistryClient, ServiceAgent,
};
use service_registry::lifecycle::{Shutdown, recv_shutdown, wait_for_signal};
use service_registry::registry::{Metadata, Registration};

#[derive(Parser)]
#[command(name = "registry-cli")]
#[command(about = "Management CLI for the service registry", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = DEFAULT_REGISTRY_URL)]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args)]
struct InstanceArgs {
    name: String,
    host: String,
    port: u16,
    #[arg(long, default_value = "1.0.0")]
    version: String,
    /// JSON object attached to the record, e.g. '{"zone":"a"}'
    #[arg(long, value_parser = parse_metadata)]
    metadata: Option<Metadata>,
}

impl InstanceArgs {
    fn into_registration(self) -> Registration {
        let registration =
            Registration::new(self.name, self.host, self.port).with_version(self.version);
        match self.metadata {
            Some(metadata) => registration.with_metadata(metadata),
            None => registration,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Check registry health
    Health,
    /// List all registered instances
    List,
    /// Resolve a service name to a live instance
    Discover { name: String },
    /// Register an instance
    Register(InstanceArgs),
    /// Register an instance and keep it alive until Ctrl+C
    Agent {
        #[command(flatten)]
        instance: InstanceArgs,
        /// Seconds between heartbeats
        #[arg(long)]
        interval_secs: Option<u64>,
    },
    /// Send one heartbeat for an instance id
    Heartbeat { id: String },
    /// Remove an instance
    Deregister { id: String },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = RegistryClient::new(&cli.url)?;

    match cli.command {
        Commands::Health => print_json(&client.health().await?)?,
        Commands::List => print_json(&client.list().await?)?,
        Commands::Discover { name } => print_json(&client.discover(&name).await?)?,
        Commands::Register(instance) => {
            let id = client.register(&instance.into_registration()).await?;
            println!("{}", id);
        }
        Commands::Agent {
            instance,
            interval_secs,
        } => {
            tracing_subscriber::fmt().with_target(false).init();

            let interval = interval_secs
                .map(Duration::from_secs)
                .unwrap_or(DEFAULT_HEARTBEAT_INTERVAL);
            let agent = ServiceAgent::start(client, instance.into_registration(), interval).await?;
            println!("Registered {} (heartbeat every {:?})", agent.service_id(), interval);

            let shutdown = Shutdown::new();
            let rx = shutdown.subscribe();
            tokio::spawn(wait_for_signal(shutdown));
            recv_shutdown(rx).await;

            agent.shutdown().await?;
            println!("Deregistered");
        }
        Commands::Heartbeat { id } => {
            client.heartbeat(&id).await?;
            println!("Heartbeat received for {}", id);
        }
        Commands::Deregister { id } => {
            client.deregister(&id).await?;
            println!("Deregistered {}", id);
        }
    }

    Ok(())
}

fn parse_metadata(raw: &str) -> Result<Metadata, serde_json::Error> {
    serde_json::from_str(raw)
}

fn print_json<T: Serialize>(value: &T) -> Result<(), serde_json::Error> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
