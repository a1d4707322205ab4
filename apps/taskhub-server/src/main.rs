mod directory;
mod error;
mod handlers;
mod http;
mod locks;
mod server;

#[cfg(test)]
mod tests;

use std::sync::Arc;

use clap::{Parser, Subcommand};
use taskhub_events::EventBus;
use taskhub_events_memory::MemoryEventBus;
use taskhub_storage::{CreateUserParams, Store};
use taskhub_store_sqlite::SqliteStore;

use server::TaskhubServer;

// ────────────────────────────────────── CLI Types ──────────────────────────────────────

#[derive(Parser)]
#[command(name = "taskhub-server")]
#[command(about = "Taskhub server CLI for administration and serving")]
struct Cli {
    /// Database URL (sqlite://path/to/db.db). Defaults to ~/.taskhub/store.db
    #[arg(long, global = true, env = "DATABASE_URL")]
    database_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Start the HTTP server
    Serve {
        /// Server address
        #[arg(long, default_value = "0.0.0.0:8080")]
        addr: String,
    },
    /// User management commands
    User {
        #[command(subcommand)]
        user_cmd: UserCommand,
    },
}

#[derive(Subcommand)]
enum UserCommand {
    /// Create a user (for bootstrapping; registration is handled upstream)
    Create {
        /// Email address
        #[arg(long)]
        email: String,
        /// Short unique handle, e.g. "alice"
        #[arg(long)]
        handle: String,
        /// Display name
        #[arg(long)]
        display_name: Option<String>,
    },
}

// ────────────────────────────────────── Commands ──────────────────────────────────────

async fn open_store(database_url: Option<String>) -> Result<SqliteStore, Box<dyn std::error::Error>> {
    let store = match database_url {
        Some(url) => SqliteStore::open(&url).await?,
        None => SqliteStore::open_default().await?,
    };
    Ok(store)
}

async fn cmd_serve(
    database_url: Option<String>,
    addr: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let addr: std::net::SocketAddr = addr.parse()?;

    let store = Arc::new(open_store(database_url).await?);
    let events: Arc<dyn EventBus> = Arc::new(MemoryEventBus::new());
    let server = TaskhubServer::new(store, events);

    let app = http::router(server);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(addr = %listener.local_addr()?, "taskhub-server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn cmd_user_create(
    database_url: Option<String>,
    email: String,
    handle: String,
    display_name: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let store = open_store(database_url).await?;
    let user_id = store
        .create_user(&CreateUserParams {
            email,
            handle,
            display_name,
        })
        .await?;
    println!("{}", user_id);
    Ok(())
}

async fn shutdown_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigterm = signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");
    let mut sigint = signal(SignalKind::interrupt()).expect("failed to install SIGINT handler");

    tokio::select! {
        _ = sigterm.recv() => {
            tracing::info!("received SIGTERM, shutting down gracefully");
        }
        _ = sigint.recv() => {
            tracing::info!("received SIGINT, shutting down gracefully");
        }
    }
}

// ────────────────────────────────────── Main ──────────────────────────────────────

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Serve { addr } => {
            cmd_serve(cli.database_url, &addr).await?;
        }
        Command::User { user_cmd } => match user_cmd {
            UserCommand::Create {
                email,
                handle,
                display_name,
            } => {
                cmd_user_create(cli.database_url, email, handle, display_name).await?;
            }
        },
    }

    Ok(())
}
