use briefing_pipeline::{run_screening, ArtifactStore};
use yahoo_client::YahooClient;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    market_core::init_tracing("info");

    let store = ArtifactStore::from_env();
    let provider = YahooClient::new();

    match run_screening(&provider, &store, chrono::Utc::now()).await {
        Ok((artifact, path)) => {
            tracing::info!(
                "Screening complete: {} stocks (fallback: {}) -> {}",
                artifact.count,
                artifact.used_fallback,
                path.display()
            );
            for stock in &artifact.stocks {
                tracing::info!(
                    "  {} {} ${:.2} ({:+.2}%)",
                    stock.symbol,
                    stock.name,
                    stock.price,
                    stock.change_percent
                );
            }
            Ok(())
        }
        Err(e) => {
            tracing::error!("Screening failed: {}", e);
            Err(e.into())
        }
    }
}
