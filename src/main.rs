//! AWS inventory compliance dashboard server.
//!
//! Reads daily resource snapshots from Postgres and serves server-rendered
//! compliance reports grouped by team, with drill-down detail pages and
//! Markdown-backed policy documentation.

use std::net::SocketAddr;
use std::path::PathBuf;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use inventory_dashboard::config::TeamDirectory;
use inventory_dashboard::render::Presenter;
use inventory_dashboard::routes::create_router;
use inventory_dashboard::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "inventory_dashboard=debug,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting inventory compliance dashboard");

    let database_url = std::env::var("DATABASE_URL")
        .unwrap_or_else(|_| "postgresql:///aws_inventory".to_string());
    let pool = match sqlx::PgPool::connect(&database_url).await {
        Ok(p) => {
            tracing::info!("Database connection established");
            p
        }
        Err(e) => {
            tracing::error!("Failed to connect to database at {}: {}", database_url, e);
            tracing::error!(
                "Please check DATABASE_URL environment variable and ensure PostgreSQL is running"
            );
            anyhow::bail!("database connection failed: {}", e);
        }
    };

    let mappings_path = PathBuf::from(
        std::env::var("ACCOUNT_MAPPINGS")
            .unwrap_or_else(|_| "config/account_mappings.yaml".to_string()),
    );
    let teams = TeamDirectory::load(&mappings_path)?;
    tracing::info!("Loaded account mappings from {}", mappings_path.display());

    let markdown_root = PathBuf::from(
        std::env::var("MARKDOWN_ROOT").unwrap_or_else(|_| "markdown".to_string()),
    );

    let presenter = Presenter::new()?;
    let state = AppState::new(pool, teams, presenter, markdown_root);
    let app = create_router(state);

    let port: u16 = std::env::var("SERVER_PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(3000);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));

    tracing::info!("Compliance dashboard listening on http://{}", addr);
    tracing::info!("Reports:");
    tracing::info!("  /compliance/tagging        - mandatory tag compliance");
    tracing::info!("  /compliance/loadbalancers  - TLS policies and LB types");
    tracing::info!("  /compliance/database       - engine/version inventory");
    tracing::info!("  /compliance/kms            - key age buckets");
    tracing::info!("  /compliance/autoscaling    - capacity dimensions");
    tracing::info!("  /policies                  - policy documentation");

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(l) => l,
        Err(e) => {
            tracing::error!("Failed to bind to {}: {}", addr, e);
            if e.kind() == std::io::ErrorKind::AddrInUse {
                tracing::error!(
                    "Port {} is already in use. Try: lsof -ti:{} | xargs kill -9",
                    port,
                    port
                );
            }
            anyhow::bail!("failed to bind to {}: {}", addr, e);
        }
    };

    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!("Server error: {}", e);
        anyhow::bail!("server error: {}", e);
    }

    Ok(())
}
