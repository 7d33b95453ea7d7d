use chrono::{DateTime, Utc};
use market_core::{NewsProvider, NewsResult, Quote, TextGenerator, DEFAULT_NEWS_HOURS, DEFAULT_TRENDING_COUNT};
use news_client::NewsService;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::html::render_briefing_html;
use crate::prompt::build_prompt;
use crate::screening::{ScreeningArtifact, SCREENING_PREFIX};
use crate::{ArtifactStore, PipelineError, PipelineResult};

pub const BRIEFING_PREFIX: &str = "briefing";
/// News items fetched per stock.
pub const BRIEFING_NEWS_RESULTS: u32 = 5;

/// Contents of `briefing_<slug>.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BriefingArtifact {
    pub timestamp: DateTime<Utc>,
    pub briefing: String,
    pub stocks: Vec<Quote>,
    #[serde(default)]
    pub news: BTreeMap<String, NewsResult>,
    pub success: bool,
}

#[derive(Debug, Clone)]
pub struct BriefingOutput {
    pub artifact: BriefingArtifact,
    pub json_path: PathBuf,
    pub html_path: PathBuf,
}

/// Most recent screening artifact, rejected if it failed or holds no stocks.
pub fn load_latest_screening(store: &ArtifactStore) -> PipelineResult<ScreeningArtifact> {
    let path = store
        .latest(SCREENING_PREFIX, "json")?
        .ok_or_else(|| PipelineError::NoArtifact(SCREENING_PREFIX.to_string()))?;
    tracing::info!("Loading screening result {}", path.display());

    let screening: ScreeningArtifact = store.read_json(&path)?;
    if !screening.success {
        return Err(PipelineError::InvalidScreening(
            screening
                .error
                .unwrap_or_else(|| "latest screening did not succeed".to_string()),
        ));
    }
    if screening.stocks.is_empty() {
        return Err(PipelineError::InvalidScreening("no trending stocks".to_string()));
    }
    Ok(screening)
}

/// Generate the briefing from the latest screening artifact and write the
/// JSON and HTML artifacts under one timestamp.
pub async fn run_briefing<N, G>(
    news: &NewsService<N>,
    generator: &G,
    store: &ArtifactStore,
    now: DateTime<Utc>,
) -> PipelineResult<BriefingOutput>
where
    N: NewsProvider,
    G: TextGenerator + ?Sized,
{
    tracing::info!("Starting briefing generation");

    let screening = load_latest_screening(store)?;
    let stocks: Vec<Quote> = screening
        .stocks
        .into_iter()
        .take(DEFAULT_TRENDING_COUNT)
        .collect();
    tracing::info!("Collecting news for {} trending stocks", stocks.len());

    let symbols: Vec<String> = stocks.iter().map(|s| s.symbol.clone()).collect();
    let news_by_symbol = news
        .search_multiple_stocks_news(&symbols, DEFAULT_NEWS_HOURS, BRIEFING_NEWS_RESULTS)
        .await;
    for (symbol, result) in &news_by_symbol {
        match &result.error {
            Some(e) => tracing::warn!("{}: news unavailable: {}", symbol, e),
            None => tracing::info!("{}: {} news items", symbol, result.total_results),
        }
    }

    let prompt = build_prompt(&stocks, &news_by_symbol);
    let briefing = generator.generate(&prompt).await?;
    tracing::info!("Briefing text generated ({} chars)", briefing.len());

    let html = render_briefing_html(
        &briefing,
        &stocks,
        &now.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
    );

    let artifact = BriefingArtifact {
        timestamp: now,
        briefing,
        stocks,
        news: news_by_symbol,
        success: true,
    };

    // HTML first: a listed JSON artifact always has its HTML beside it.
    let slug = ArtifactStore::timestamp_slug(now);
    let html_path = store.write_text(BRIEFING_PREFIX, &slug, "html", &html)?;
    let json_path = store.write_json(BRIEFING_PREFIX, &slug, &artifact)?;

    tracing::info!(
        "Briefing written to {} and {}",
        json_path.display(),
        html_path.display()
    );

    Ok(BriefingOutput {
        artifact,
        json_path,
        html_path,
    })
}
