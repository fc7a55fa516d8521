use std::sync::Arc;

use quantbase::api::router::create_router;
use quantbase::config::AppConfig;
use quantbase::db::{self, PgStore};
use quantbase::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::from_env()?;
    init_tracing(config.wants_json_logs());

    let addr = format!("{}:{}", config.host, config.port);

    tracing::info!("Connecting to database...");
    let pool = db::init_pool(&config.database_url).await?;
    sqlx::migrate!("./migrations").run(&pool).await?;
    tracing::info!("Database connected, migrations applied");

    let metrics_handle = quantbase::metrics::init_metrics()?;

    tracing::info!(
        backend = %config.backend_api_url,
        sources = ?config.portfolio_sources,
        default_collection = %config.default_ticks_collection,
        auth = config.api_token.is_some(),
        "Configuration loaded"
    );

    let state = AppState::new(Arc::new(PgStore::new(pool)), config, metrics_handle);
    let router = create_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {addr}");
    axum::serve(listener, router).await?;

    Ok(())
}

fn init_tracing(json: bool) {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    if json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer()).init();
    }
}
