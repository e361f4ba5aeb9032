//! Memberly API server entry point

use std::sync::Arc;

use anyhow::Context;
use sqlx::PgPool;
use tracing_subscriber::EnvFilter;

use memberly_api::config::StoreBackend;
use memberly_api::{routes, AppState, Config};
use memberly_billing::StripeClient;
use memberly_shared::{db, MemoryUserStore, PgUserStore, UserStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("memberly_api=info,tower_http=info")),
        )
        .init();

    let config = Config::from_env().context("invalid configuration")?;

    // Stripe config is startup-fatal too: a missing webhook secret must
    // never be discovered on the first inbound event
    let stripe = StripeClient::from_env().context("invalid Stripe configuration")?;

    let (users, pool): (Arc<dyn UserStore>, Option<PgPool>) = match config.store_backend {
        StoreBackend::Postgres => {
            let url = config
                .database_url
                .as_deref()
                .context("DATABASE_URL required for the postgres backend")?;
            let pool = db::create_pool(url, config.database_max_connections)
                .await
                .context("failed to connect to database")?;
            db::run_migrations(&pool)
                .await
                .context("failed to run migrations")?;
            (Arc::new(PgUserStore::new(pool.clone())), Some(pool))
        }
        StoreBackend::Memory => {
            tracing::warn!("running with the in-memory user store; data will not persist");
            (Arc::new(MemoryUserStore::new()), None)
        }
    };

    let bind_address = config.bind_address.clone();
    let state = AppState::new(config, users, stripe, pool);
    let app = routes::create_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("failed to bind {}", bind_address))?;
    tracing::info!(address = %bind_address, "memberly api listening");

    axum::serve(listener, app).await?;

    Ok(())
}
