use clap::Parser;
use sqlx::postgres::{PgPool, PgPoolOptions};

#[macro_use]
mod macros;

mod api;
mod cli;
mod db;
mod difficulty_tree;
mod env;
mod error;
mod format;
mod platform;
mod resolve;
mod routes;
mod traits;

pub(crate) use traits::RequestBody;

#[derive(Clone)]
pub(crate) struct AppState {
    pool: PgPool,
    http: reqwest::Client,
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = cli::Args::parse();

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .acquire_timeout(std::time::Duration::from_secs(3))
        .connect(&env::DATABASE_URL)
        .await?;

    let state = AppState {
        pool,
        http: reqwest::Client::new(),
    };

    match args.command.unwrap_or_default() {
        cli::Command::Run => {
            state.migrate().await?;

            let app = routes::router().with_state(state);
            let listener = tokio::net::TcpListener::bind(env::BIND_ADDRESS.as_str()).await?;
            tracing::info!("Listening on {}", *env::BIND_ADDRESS);
            axum::serve(listener, app).await?;
        }
        cli::Command::Reset => {
            state.reset().await?;
            tracing::info!("Database reset.");
        }
        cli::Command::Migrate => {
            state.migrate().await?;
            tracing::info!("Database migrated.");
        }
        cli::Command::Seed => {
            state.migrate().await?;
            state.seed().await?;
            tracing::info!("Reference tables seeded.");
        }
    }

    Ok(())
}
