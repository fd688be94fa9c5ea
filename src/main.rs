use std::sync::Arc;
use todo_search::{config::Config, search::HttpEngine, TodoRepository};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::load().unwrap_or_else(|e| {
        eprintln!("Failed to load configuration: {}", e);
        eprintln!("Using default configuration");
        Config::default()
    });

    init_tracing(&config);

    tracing::info!("Starting todo-search v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        url = %config.engine.url,
        index = %config.search.index_name,
        "Search engine target"
    );

    let engine = Arc::new(HttpEngine::new(&config.engine)?);
    let repository = TodoRepository::new(engine, config.search.clone());

    repository.index_manager().ensure_index().await?;
    tracing::info!("✅ Index ready");

    if config.search.backfill_on_startup {
        let updated = repository.index_manager().backfill().await?;
        tracing::info!(updated, "✅ Legacy documents backfilled");
    } else {
        tracing::info!("Backfill on startup disabled in configuration");
    }

    Ok(())
}

fn init_tracing(config: &Config) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("todo_search={}", config.observability.log_level).into());

    if config.observability.json_logs {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}
