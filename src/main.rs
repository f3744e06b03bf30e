mod config;
mod gemini_client;
mod heartbeat;
mod models;
mod moltbook_client;
mod registry;
mod secret;

use tracing_subscriber::EnvFilter;

use config::HeartbeatConfig;
use heartbeat::Heartbeat;

// One heartbeat per invocation; periodic scheduling is the caller's concern
// (cron or similar).
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,moltbook_agent=debug")),
        )
        .init();

    tracing::info!("[{}] Heartbeat started", chrono::Utc::now().to_rfc3339());

    let config = HeartbeatConfig::load()?;
    tracing::info!("MoltBook API: {}", config.moltbook_api_url);

    let gemini_key = secret::fetch_gemini_key(&config).await?;
    let agents = registry::load_agents(&config.agents_file)?;

    let heartbeat = Heartbeat::new(config, gemini_key, agents);
    let outcome = heartbeat.run(&mut rand::thread_rng()).await?;
    tracing::debug!(?outcome, "Heartbeat finished");

    Ok(())
}
