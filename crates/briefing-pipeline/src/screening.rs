use chrono::{DateTime, Utc};
use market_core::{
    format_quote_list, select_trending, MarketResult, Quote, QuoteProvider, ScreenType,
    TrendingSelection, DEFAULT_SCREENER_COUNT, DEFAULT_TRENDING_COUNT,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::{ArtifactStore, PipelineResult};

pub const SCREENING_PREFIX: &str = "screening";

/// Contents of `screening_<slug>.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScreeningArtifact {
    pub timestamp: DateTime<Utc>,
    pub stocks: Vec<Quote>,
    pub count: usize,
    #[serde(default)]
    pub used_fallback: bool,
    pub success: bool,
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ScreeningArtifact {
    fn succeeded(timestamp: DateTime<Utc>, selection: TrendingSelection) -> Self {
        let count = selection.stocks.len();
        Self {
            timestamp,
            stocks: selection.stocks,
            count,
            used_fallback: selection.used_fallback,
            success: true,
            message: format!("Selected {} trending stocks", count),
            error: None,
        }
    }

    fn failed(timestamp: DateTime<Utc>, error: String) -> Self {
        Self {
            timestamp,
            stocks: Vec::new(),
            count: 0,
            used_fallback: false,
            success: false,
            message: format!("Screening failed: {}", error),
            error: Some(error),
        }
    }
}

async fn select<P: QuoteProvider + ?Sized>(provider: &P) -> MarketResult<TrendingSelection> {
    let actives = provider
        .screen(ScreenType::MostActives, DEFAULT_SCREENER_COUNT)
        .await?;
    let gainers = provider
        .screen(ScreenType::DayGainers, DEFAULT_SCREENER_COUNT)
        .await?;

    tracing::info!(
        "Fetched {} most_actives and {} day_gainers",
        actives.len(),
        gainers.len()
    );

    Ok(select_trending(
        &format_quote_list(&actives),
        &format_quote_list(&gainers),
        DEFAULT_TRENDING_COUNT,
    ))
}

/// Run the screening stage and persist its artifact.
///
/// A provider failure still writes a failure artifact before the error is
/// returned.
pub async fn run_screening<P: QuoteProvider + ?Sized>(
    provider: &P,
    store: &ArtifactStore,
    now: DateTime<Utc>,
) -> PipelineResult<(ScreeningArtifact, PathBuf)> {
    tracing::info!("Starting trending stock screening");
    let slug = ArtifactStore::timestamp_slug(now);

    match select(provider).await {
        Ok(selection) => {
            let artifact = ScreeningArtifact::succeeded(now, selection);
            let path = store.write_json(SCREENING_PREFIX, &slug, &artifact)?;
            tracing::info!(
                "Screening complete: {} stocks (fallback: {})",
                artifact.count,
                artifact.used_fallback
            );
            Ok((artifact, path))
        }
        Err(e) => {
            tracing::error!("Screening failed: {}", e);
            let artifact = ScreeningArtifact::failed(now, e.to_string());
            // Always report the provider error, even if the artifact write fails.
            if let Err(write_err) = store.write_json(SCREENING_PREFIX, &slug, &artifact) {
                tracing::error!("Failed to write screening failure artifact: {}", write_err);
            }
            Err(e.into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::TimeZone;
    use market_core::{DetailModule, MarketError, ModuleData, RawQuote};

    struct FakeScreens {
        actives: Vec<&'static str>,
        gainers: Vec<&'static str>,
        fail: bool,
    }

    fn raw(symbol: &str) -> RawQuote {
        RawQuote {
            symbol: Some(symbol.to_string()),
            short_name: Some(format!("{symbol} Inc.")),
            regular_market_price: Some(10.0),
            ..Default::default()
        }
    }

    #[async_trait]
    impl QuoteProvider for FakeScreens {
        async fn screen(&self, screen: ScreenType, count: usize) -> MarketResult<Vec<RawQuote>> {
            if self.fail {
                return Err(MarketError::Provider("HTTP 503".into()));
            }
            let symbols = match screen {
                ScreenType::MostActives => &self.actives,
                _ => &self.gainers,
            };
            Ok(symbols.iter().take(count).map(|s| raw(s)).collect())
        }

        async fn module(&self, symbol: &str, _module: DetailModule) -> MarketResult<ModuleData> {
            Err(MarketError::NotFound(symbol.to_string()))
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 15, 6, 30, 0).unwrap()
    }

    #[tokio::test]
    async fn test_screening_writes_intersection() {
        let tmp = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(tmp.path());
        let provider = FakeScreens {
            actives: vec!["AAPL", "MSFT", "TSLA"],
            gainers: vec!["TSLA", "GOOGL"],
            fail: false,
        };

        let (artifact, path) = run_screening(&provider, &store, now()).await.unwrap();

        assert!(path.ends_with("screening_20250115_063000.json"));
        assert!(artifact.success);
        assert!(!artifact.used_fallback);
        assert_eq!(artifact.count, 1);
        assert_eq!(artifact.stocks[0].symbol, "TSLA");

        let stored: ScreeningArtifact = store.read_json(&path).unwrap();
        assert_eq!(stored, artifact);
    }

    #[tokio::test]
    async fn test_screening_records_fallback() {
        let tmp = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(tmp.path());
        let provider = FakeScreens {
            actives: vec!["A", "B", "C", "D", "E", "F"],
            gainers: vec!["X"],
            fail: false,
        };

        let (artifact, _) = run_screening(&provider, &store, now()).await.unwrap();
        assert!(artifact.used_fallback);
        let symbols: Vec<_> = artifact.stocks.iter().map(|q| q.symbol.as_str()).collect();
        assert_eq!(symbols, vec!["A", "B", "C", "D", "E"]);
    }

    #[tokio::test]
    async fn test_failure_artifact_is_still_written() {
        let tmp = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(tmp.path());
        let provider = FakeScreens {
            actives: vec![],
            gainers: vec![],
            fail: true,
        };

        let err = run_screening(&provider, &store, now()).await.unwrap_err();
        assert!(err.to_string().contains("503"));

        let path = store.latest(SCREENING_PREFIX, "json").unwrap().unwrap();
        let stored: ScreeningArtifact = store.read_json(&path).unwrap();
        assert!(!stored.success);
        assert!(stored.stocks.is_empty());
        assert!(stored.error.unwrap().contains("503"));
    }

    #[tokio::test]
    async fn test_provider_error_survives_failed_artifact_write() {
        let tmp = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(tmp.path());
        store
            .write_text(SCREENING_PREFIX, "20250115_063000", "json", "{}")
            .unwrap();
        let provider = FakeScreens {
            actives: vec![],
            gainers: vec![],
            fail: true,
        };

        let err = run_screening(&provider, &store, now()).await.unwrap_err();
        assert!(matches!(err, crate::PipelineError::Market(_)));
        assert!(err.to_string().contains("503"));
    }

    #[tokio::test]
    async fn test_symbol_less_rows_are_not_screened_in() {
        let tmp = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(tmp.path());
        let provider = FakeScreens {
            actives: vec!["", "AAPL"],
            gainers: vec![""],
            fail: false,
        };

        let (artifact, _) = run_screening(&provider, &store, now()).await.unwrap();
        let symbols: Vec<_> = artifact.stocks.iter().map(|q| q.symbol.as_str()).collect();
        assert_eq!(symbols, vec!["AAPL"]);
        assert!(artifact.used_fallback);
    }
}
