use moneylingo_orchestrator::{
    api::start_server,
    config::Settings,
    providers::{GeminiClient, LlmProvider},
    Orchestrator,
};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenv::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let settings = Settings::from_env();

    if settings.gemini_api_key.is_none() {
        warn!("GEMINI_API_KEY not set, text capabilities will run in degraded mode");
    }
    if settings.elevenlabs_api_key.is_none() {
        warn!("ELEVENLABS_API_KEY not set, voice output is disabled");
    }

    info!("MoneyLingo Orchestrator - API Server");
    info!(host = %settings.host, port = settings.port, model = %settings.gemini_model, "Configuration loaded");

    let llm: Arc<dyn LlmProvider> = Arc::new(GeminiClient::new(
        settings.gemini_api_key.clone().unwrap_or_default(),
        settings.gemini_model.clone(),
    )?);
    let orchestrator = Arc::new(Orchestrator::from_settings(&settings, llm)?);

    info!("Orchestrator initialized");

    start_server(orchestrator, &settings.host, settings.port).await?;

    Ok(())
}
