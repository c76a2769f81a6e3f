use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use anyhow::Context;
use moneywise::{
    AppState,
    cache::SessionStore,
    clock::{SharedClock, SystemClock},
    config::Config,
    database::{UserStore, repositories::user::PostgRestUsers},
    router::build_router,
};
use sqlx::Executor;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().context("Failed to load configuration")?;
    let clock: SharedClock = Arc::new(SystemClock);

    let sessions = match &config.redis_url {
        Some(url) => {
            let client = redis::Client::open(url.as_str()).context("Failed to create Redis client")?;
            tracing::info!("Session store: redis");
            SessionStore::redis(Arc::new(client), clock.clone(), config.session_store_ttl())
        }
        None => {
            tracing::warn!("REDIS_URL not set, sessions are kept in process memory");
            SessionStore::memory(clock.clone(), config.session_store_ttl())
        }
    };

    let users = match (&config.supabase_url, &config.database_url) {
        (Some(url), _) => {
            let key = config
                .supabase_api_key
                .as_deref()
                .context("SUPABASE_API_KEY is required with SUPABASE_URL")?;
            tracing::info!("User store: PostgREST at {}", url);
            UserStore::PostgRest(PostgRestUsers::new(url, key)?)
        }
        (None, Some(database_url)) => {
            let pool = PgPoolOptions::new()
                .max_connections(10)
                .after_connect(|conn, _meta| {
                    Box::pin(async move {
                        conn.execute("SET application_name = 'moneywise';").await?;
                        Ok(())
                    })
                })
                .connect(database_url)
                .await
                .context("Failed to connect to Postgres")?;
            tracing::info!("User store: postgres");
            UserStore::Postgres(pool)
        }
        (None, None) => {
            tracing::warn!("No durable store configured, users are kept in process memory");
            UserStore::memory()
        }
    };

    #[cfg(debug_assertions)]
    tracing::info!("Running in debug mode with CORS enabled");

    #[cfg(not(debug_assertions))]
    tracing::info!("Running in production mode with CORS disabled");

    let state = AppState::new(config, sessions, users, clock)?;
    let router = build_router(state.clone());

    #[cfg(debug_assertions)]
    let router = router.layer(tower_http::cors::CorsLayer::permissive());

    let addr = SocketAddr::new(
        state.config.server_host.parse().unwrap_or_else(|_| {
            tracing::warn!("Invalid server_host, falling back to dual-stack default");
            IpAddr::V6(std::net::Ipv6Addr::UNSPECIFIED)
        }),
        state.config.server_port,
    );
    tracing::info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, router)
        .await
        .context("Server terminated")?;
    Ok(())
}
