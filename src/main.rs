use anyhow::Context;
use catalog_chat::chat::{prompt, Assistant, ToolRegistry};
use catalog_chat::{create_router, AppState, Config, Database};
use clap::Parser;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::parse();

    let db = Database::new(&config.database_path)
        .with_context(|| format!("failed to open database at {}", config.database_path.display()))?;
    let (provider, model_id) = config.resolve_provider()?;
    let registry = ToolRegistry::catalog()?;
    let system = prompt::system_instruction(&prompt::load_schema_doc(config.schema_doc.as_deref()));

    tracing::info!(
        provider = provider.name(),
        model = %model_id,
        database = %config.database_path.display(),
        "starting assistant"
    );
    let assistant = Assistant::new(Arc::new(provider), model_id, system, registry);

    let state = AppState {
        db: Arc::new(db),
        assistant: Arc::new(assistant),
        project_name: config.project_name.clone(),
    };
    let app = create_router(state, &config.cors_origins);

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;
    tracing::info!(addr = %config.bind_addr, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;

    Ok(())
}
