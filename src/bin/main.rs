use moneylingo_orchestrator::{
    config::Settings,
    providers::{mock::MockLlm, GeminiClient, LlmProvider},
    Orchestrator, Request,
};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

const USAGE: &str = "usage: orchestrator [--user <id>] [--voice] <text...>";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();

    // Logs go to stderr so stdout stays pure JSON
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut user_id = "cli".to_string();
    let mut voice = false;
    let mut words = Vec::new();

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--user" => user_id = args.next().ok_or(USAGE)?,
            "--voice" => voice = true,
            "-h" | "--help" => {
                println!("{}", USAGE);
                return Ok(());
            }
            _ => words.push(arg),
        }
    }

    if words.is_empty() {
        eprintln!("{}", USAGE);
        std::process::exit(2);
    }

    let settings = Settings::from_env();
    let llm: Arc<dyn LlmProvider> = match settings.gemini_api_key.clone() {
        Some(key) => Arc::new(GeminiClient::new(key, settings.gemini_model.clone())?),
        None => {
            info!("GEMINI_API_KEY not set, using the mock LLM");
            Arc::new(MockLlm::echo())
        }
    };
    let orchestrator = Orchestrator::from_settings(&settings, llm)?;

    let mut request = Request::new(user_id, words.join(" "));
    if voice {
        request = request.with_voice();
    }

    let response = orchestrator.handle(&request).await;
    println!("{}", serde_json::to_string_pretty(&response)?);

    Ok(())
}
