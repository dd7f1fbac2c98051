use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use bunkhouse::{api, db, models::Limits};

#[derive(Parser)]
#[command(name = "bunkhouse")]
#[command(about = "Shared-housing occupancy and billing server")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the Bunkhouse server
    Serve {
        /// Port for HTTP API
        #[arg(short, long, default_value = "3000")]
        port: u16,

        /// Database file (defaults to the platform data directory)
        #[arg(long)]
        db: Option<PathBuf>,

        /// Maximum beds a room may have
        #[arg(long, default_value = "12")]
        max_capacity: i64,

        /// Maximum monthly fee a room may charge
        #[arg(long, default_value = "1000000")]
        max_fee: f64,
    },
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "bunkhouse=debug,tower_http=debug".into()),
    );

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

async fn serve(port: u16, db_path: Option<PathBuf>, limits: Limits) -> anyhow::Result<()> {
    let db = match db_path {
        Some(path) => db::Database::open(path)?,
        None => db::Database::open_default()?,
    }
    .with_limits(limits);
    db.migrate()?;

    let app = api::create_router(db);

    let listener = tokio::net::TcpListener::bind(format!("127.0.0.1:{}", port)).await?;
    tracing::info!("Bunkhouse server listening on http://127.0.0.1:{}", port);

    axum::serve(listener, app).await?;
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing();

    match cli.command {
        Some(Commands::Serve {
            port,
            db,
            max_capacity,
            max_fee,
        }) => {
            tracing::info!("Starting Bunkhouse server on port {}", port);
            serve(
                port,
                db,
                Limits {
                    max_capacity,
                    max_monthly_fee: max_fee,
                },
            )
            .await?;
        }
        None => {
            // Default: start server with defaults
            tracing::info!("Starting Bunkhouse server on port 3000");
            serve(3000, None, Limits::default()).await?;
        }
    }

    Ok(())
}
