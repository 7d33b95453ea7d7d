use chrono::{Duration, Utc};
use market_core::{NewsProvider, NewsQuery, NewsResult, SearchPeriod, MAX_NEWS_RESULTS};
use std::collections::BTreeMap;

/// Never-failing news search on top of a [`NewsProvider`]. Provider errors
/// are reported in [`NewsResult::error`].
#[derive(Clone)]
pub struct NewsService<P> {
    provider: P,
}

impl<P: NewsProvider> NewsService<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Search the last `hours` hours for `query`, returning at most
    /// `max_results` items (clamped to `1..=MAX_NEWS_RESULTS`).
    pub async fn search_news(
        &self,
        query: &str,
        hours: u32,
        max_results: u32,
        include_domains: Option<Vec<String>>,
    ) -> NewsResult {
        let end = Utc::now();
        let start = end - Duration::hours(i64::from(hours));
        let period = SearchPeriod::last_hours(end, hours);

        let request = NewsQuery {
            query: query.to_string(),
            num_results: max_results.clamp(1, MAX_NEWS_RESULTS),
            start_published: start,
            end_published: end,
            include_domains,
        };

        tracing::info!(
            "Searching news for '{}' from {} to {} ({} results)",
            query,
            period.start_date,
            period.end_date,
            request.num_results
        );

        match self.provider.search(&request).await {
            Ok(news) => {
                tracing::info!("Found {} news items for '{}'", news.len(), query);
                NewsResult::found(query, period, news)
            }
            Err(e) => {
                tracing::error!("News search failed for '{}': {}", query, e);
                NewsResult::failed(query, format!("Error while searching news: {}", e))
            }
        }
    }

    pub async fn search_stock_news(&self, ticker: &str, hours: u32, max_results: u32) -> NewsResult {
        self.search_news(&format!("{} stock news", ticker), hours, max_results, None)
            .await
            .with_ticker(ticker)
    }

    /// Per-ticker results, searched one ticker at a time.
    pub async fn search_multiple_stocks_news(
        &self,
        tickers: &[String],
        hours: u32,
        per_ticker: u32,
    ) -> BTreeMap<String, NewsResult> {
        let mut results = BTreeMap::new();
        for ticker in tickers {
            let result = self.search_stock_news(ticker, hours, per_ticker).await;
            results.insert(ticker.clone(), result);
        }
        results
    }

    pub async fn search_market_news(
        &self,
        query: &str,
        hours: u32,
        max_results: u32,
        include_domains: Option<Vec<String>>,
    ) -> NewsResult {
        self.search_news(query, hours, max_results, include_domains.filter(|d| !d.is_empty()))
            .await
    }
}
