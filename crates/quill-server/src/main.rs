mod config;

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::{info, warn};

use quill_api::AppStateInner;
use quill_db::Database;

use crate::config::Config;

#[derive(Parser)]
#[command(name = "quill", version, about = "A small blog with accounts and posts")]
struct Cli {
    /// SQLite database file (overrides QUILL_DB_PATH)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the web server (default)
    Serve,
    /// Clear the existing data and create new tables
    InitDb,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "quill=debug,tower_http=debug".into()),
        )
        .init();

    let cli = Cli::parse();
    let mut config = Config::from_env()?;
    if let Some(db) = cli.db {
        config.db_path = db;
    }

    match cli.cmd.unwrap_or(Command::Serve) {
        Command::Serve => serve(config).await,
        Command::InitDb => {
            let db = Database::open(&config.db_path)?;
            db.reset()?;
            println!("Initialized the database.");
            Ok(())
        }
    }
}

async fn serve(config: Config) -> anyhow::Result<()> {
    if config.uses_dev_secret() {
        warn!("QUILL_SECRET_KEY is unset; sessions are signed with the development key");
    }

    let db = Database::open(&config.db_path)?;
    let state = AppStateInner::new(db, &config.secret_key, config.session_lifetime);
    let app = quill_api::router(state);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    info!("Quill listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
