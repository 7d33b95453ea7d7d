use briefing_pipeline::{run_briefing, ArtifactStore, GeminiClient};
use news_client::{ExaClient, NewsService};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    market_core::init_tracing("info");

    let store = ArtifactStore::from_env();
    let news = NewsService::new(ExaClient::from_env()?);
    let generator = GeminiClient::from_env()?;
    tracing::info!("Using model {}", generator.model());

    match run_briefing(&news, &generator, &store, chrono::Utc::now()).await {
        Ok(output) => {
            tracing::info!(
                "Briefing complete: {} and {}",
                output.json_path.display(),
                output.html_path.display()
            );
            Ok(())
        }
        Err(e) => {
            tracing::error!("Briefing failed: {}", e);
            Err(e.into())
        }
    }
}
