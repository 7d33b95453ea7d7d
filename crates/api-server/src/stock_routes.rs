//! Trending-stock and single-symbol endpoints.

use std::collections::BTreeMap;
use std::str::FromStr;

use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    routing::get,
    Json, Router,
};
use market_core::{
    basic_info, basic_info_from_price, format_overview, format_quote_list, rank_annotations,
    select_trending, BasicInfo, MarketError, NewsResult, Quote, RankedStock, ScreenType,
    StockDetail, StockOverview, DATA_SOURCE, DEFAULT_SCREENER_COUNT, DEFAULT_TRENDING_COUNT,
};
use serde::{Deserialize, Serialize};

use crate::{AppError, AppState};

const MAX_NEWS_COUNT: u32 = 20;
const MAX_NEWS_HOURS: u32 = 168;
const MAX_LIST_COUNT: usize = 25;

/// News settings used by `/api/stocks/trending/all`.
const ALL_SCREENS_NEWS_HOURS: u32 = 24;
const ALL_SCREENS_NEWS_COUNT: u32 = 3;

// ---------------------------------------------------------------------------
// Query parameters
// ---------------------------------------------------------------------------

fn default_true() -> bool {
    true
}
fn default_screen() -> String {
    ScreenType::MostActives.as_str().to_string()
}
fn default_trending_news_count() -> u32 {
    5
}
fn default_trending_news_hours() -> u32 {
    24
}
fn default_detail_news_count() -> u32 {
    10
}
fn default_detail_news_hours() -> u32 {
    48
}
fn default_list_count() -> usize {
    5
}

#[derive(Debug, Deserialize)]
pub struct TrendingQuery {
    #[serde(rename = "type", default = "default_screen")]
    pub screen: String,
    #[serde(default = "default_true")]
    pub include_news: bool,
    #[serde(default = "default_trending_news_count")]
    pub news_count: u32,
    #[serde(default = "default_trending_news_hours")]
    pub news_hours: u32,
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default = "default_screen")]
    pub screener_type: String,
    #[serde(default = "default_list_count")]
    pub count: usize,
}

#[derive(Debug, Deserialize)]
pub struct AllQuery {
    #[serde(default)]
    pub include_news: bool,
}

#[derive(Debug, Deserialize)]
pub struct DetailQuery {
    #[serde(default = "default_true")]
    pub include_news: bool,
    #[serde(default = "default_detail_news_count")]
    pub news_count: u32,
    #[serde(default = "default_detail_news_hours")]
    pub news_hours: u32,
}

fn query<T>(extracted: Result<Query<T>, QueryRejection>) -> Result<T, AppError> {
    extracted
        .map(|Query(q)| q)
        .map_err(|e| AppError::bad_request(e.body_text()))
}

fn check_range<T>(name: &str, value: T, min: T, max: T) -> Result<(), AppError>
where
    T: PartialOrd + std::fmt::Display,
{
    if value < min || value > max {
        return Err(AppError::bad_request(format!(
            "{} must be between {} and {} (got {})",
            name, min, max, value
        )));
    }
    Ok(())
}

fn check_news_bounds(news_count: u32, news_hours: u32) -> Result<(), AppError> {
    check_range("news_count", news_count, 1, MAX_NEWS_COUNT)?;
    check_range("news_hours", news_hours, 1, MAX_NEWS_HOURS)
}

/// Tickers are 1-10 uppercase ASCII letters.
pub fn validate_ticker(ticker: &str) -> Result<(), MarketError> {
    let valid = (1..=10).contains(&ticker.len()) && ticker.bytes().all(|b| b.is_ascii_uppercase());
    if valid {
        Ok(())
    } else {
        Err(MarketError::InvalidTicker(ticker.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct TrendingStockResponse {
    pub symbol: String,
    pub screener_type: ScreenType,
    pub basic_info: BasicInfo,
    pub detail_info: StockDetail,
    pub news: Option<NewsResult>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum ScreenOutcome {
    Found(Box<TrendingStockResponse>),
    Failed {
        symbol: Option<String>,
        screener_type: ScreenType,
        error: String,
    },
}

#[derive(Debug, Serialize)]
pub struct StockInfoResponse {
    pub symbol: String,
    pub basic_info: BasicInfo,
    pub detail_info: StockDetail,
    pub overview: StockOverview,
    pub news: Option<NewsResult>,
}

#[derive(Debug, Serialize)]
pub struct SelectionResponse {
    pub trending: Vec<Quote>,
    pub most_actives: Vec<Quote>,
    pub day_gainers: Vec<Quote>,
    pub used_fallback: bool,
    pub source: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

// ---------------------------------------------------------------------------
// Routes
// ---------------------------------------------------------------------------

pub fn stock_routes() -> Router<AppState> {
    Router::new()
        .route("/api/stocks/trending", get(get_trending_stock))
        .route("/api/stocks/trending/list", get(get_trending_list))
        .route("/api/stocks/trending/all", get(get_all_trending))
        .route("/api/stocks/trending/selection", get(get_trending_selection))
        .route("/api/stocks/:ticker", get(get_stock_info))
}

async fn stock_news(state: &AppState, symbol: &str, hours: u32, count: u32) -> Option<NewsResult> {
    let news = state.news.as_ref()?;
    let result = news.search_stock_news(symbol, hours, count).await;
    if let Some(e) = &result.error {
        tracing::warn!("News lookup for {} degraded: {}", symbol, e);
    }
    Some(result)
}

/// Rank-1 symbol of `screen` with its detail modules.
async fn top_of_screen(
    state: &AppState,
    screen: ScreenType,
) -> Result<TrendingStockResponse, AppError> {
    let rows = state.quotes.screen(screen, 1).await?;
    let top = rows
        .first()
        .filter(|raw| raw.symbol.as_deref().is_some_and(|s| !s.is_empty()))
        .ok_or_else(|| AppError::not_found(format!("No stock found for screener {}", screen)))?;

    let info = basic_info(top);
    let detail = state.quotes.stock_detail(&info.symbol).await;

    Ok(TrendingStockResponse {
        symbol: info.symbol.clone(),
        screener_type: screen,
        basic_info: info,
        detail_info: detail,
        news: None,
    })
}

async fn get_trending_stock(
    State(state): State<AppState>,
    params: Result<Query<TrendingQuery>, QueryRejection>,
) -> Result<Json<TrendingStockResponse>, AppError> {
    let params = query(params)?;
    let screen = ScreenType::from_str(&params.screen)?;
    check_news_bounds(params.news_count, params.news_hours)?;

    tracing::info!("Trending stock request for {}", screen);
    let mut response = top_of_screen(&state, screen).await?;

    if params.include_news {
        response.news =
            stock_news(&state, &response.symbol, params.news_hours, params.news_count).await;
    }

    tracing::info!("Trending stock for {}: {}", screen, response.symbol);
    Ok(Json(response))
}

async fn get_trending_list(
    State(state): State<AppState>,
    params: Result<Query<ListQuery>, QueryRejection>,
) -> Result<Json<Vec<RankedStock>>, AppError> {
    let params = query(params)?;
    let screen = ScreenType::from_str(&params.screener_type)?;
    check_range("count", params.count, 1, MAX_LIST_COUNT)?;

    let rows = state.quotes.screen(screen, params.count).await?;
    if rows.is_empty() {
        return Err(AppError::not_found(format!(
            "No stocks found for screener {}",
            screen
        )));
    }

    let ranked: Vec<RankedStock> = rows
        .iter()
        .take(params.count)
        .enumerate()
        .map(|(i, raw)| rank_annotations(screen, i + 1, raw))
        .collect();

    tracing::info!("Trending list for {}: {} stocks", screen, ranked.len());
    Ok(Json(ranked))
}

async fn get_all_trending(
    State(state): State<AppState>,
    params: Result<Query<AllQuery>, QueryRejection>,
) -> Result<Json<BTreeMap<ScreenType, ScreenOutcome>>, AppError> {
    let params = query(params)?;
    let mut results = BTreeMap::new();

    for screen in ScreenType::ALL {
        let outcome = match top_of_screen(&state, screen).await {
            Ok(mut found) => {
                if params.include_news {
                    found.news = stock_news(
                        &state,
                        &found.symbol,
                        ALL_SCREENS_NEWS_HOURS,
                        ALL_SCREENS_NEWS_COUNT,
                    )
                    .await;
                }
                ScreenOutcome::Found(Box::new(found))
            }
            Err(e) => {
                tracing::warn!("Screener {} unavailable: {}", screen, e.error);
                ScreenOutcome::Failed {
                    symbol: None,
                    screener_type: screen,
                    error: e.error.to_string(),
                }
            }
        };
        results.insert(screen, outcome);
    }

    Ok(Json(results))
}

async fn get_trending_selection(State(state): State<AppState>) -> Json<SelectionResponse> {
    let screens = async {
        let actives = state
            .quotes
            .screen(ScreenType::MostActives, DEFAULT_SCREENER_COUNT)
            .await?;
        let gainers = state
            .quotes
            .screen(ScreenType::DayGainers, DEFAULT_SCREENER_COUNT)
            .await?;
        Ok::<_, MarketError>((format_quote_list(&actives), format_quote_list(&gainers)))
    };

    match screens.await {
        Ok((actives, gainers)) => {
            let selection = select_trending(&actives, &gainers, DEFAULT_TRENDING_COUNT);
            if selection.used_fallback {
                tracing::info!("No overlap between most_actives and day_gainers; using fallback");
            }
            Json(SelectionResponse {
                trending: selection.stocks,
                most_actives: actives.into_iter().take(DEFAULT_TRENDING_COUNT).collect(),
                day_gainers: gainers.into_iter().take(DEFAULT_TRENDING_COUNT).collect(),
                used_fallback: selection.used_fallback,
                source: DATA_SOURCE,
                error: None,
            })
        }
        Err(e) => {
            tracing::error!("Trending selection failed: {}", e);
            Json(SelectionResponse {
                trending: Vec::new(),
                most_actives: Vec::new(),
                day_gainers: Vec::new(),
                used_fallback: false,
                source: DATA_SOURCE,
                error: Some(e.to_string()),
            })
        }
    }
}

async fn get_stock_info(
    State(state): State<AppState>,
    Path(ticker): Path<String>,
    params: Result<Query<DetailQuery>, QueryRejection>,
) -> Result<Json<StockInfoResponse>, AppError> {
    validate_ticker(&ticker)?;
    let params = query(params)?;
    check_news_bounds(params.news_count, params.news_hours)?;

    tracing::info!("Stock detail request for {}", ticker);
    let detail = state.quotes.stock_detail(&ticker).await;
    let price = detail
        .price
        .as_ref()
        .ok_or_else(|| AppError::not_found(format!("Stock '{}' not found", ticker)))?;

    let info = basic_info_from_price(&ticker, price);
    let overview = format_overview(&detail);
    let news = if params.include_news {
        stock_news(&state, &ticker, params.news_hours, params.news_count).await
    } else {
        None
    };

    Ok(Json(StockInfoResponse {
        symbol: ticker,
        basic_info: info,
        detail_info: detail,
        overview,
        news,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{app, get, price_module, raw, state, FakeQuotes};
    use axum::http::StatusCode;
    use briefing_pipeline::ArtifactStore;

    fn quotes() -> FakeQuotes {
        let mut fake = FakeQuotes::default();
        fake.screens.insert(
            ScreenType::MostActives,
            vec![raw("NVDA", 2.5), raw("TSLA", -1.0), raw("AAPL", 0.0)],
        );
        fake.screens
            .insert(ScreenType::DayGainers, vec![raw("SMCI", 12.0), raw("TSLA", 8.0)]);
        fake.modules.insert("NVDA".into(), price_module("NVDA"));
        fake.modules.insert("AAPL".into(), price_module("AAPL"));
        fake
    }

    fn store() -> ArtifactStore {
        ArtifactStore::new(std::env::temp_dir().join("gmws-unused"))
    }

    #[test]
    fn test_validate_ticker() {
        assert!(validate_ticker("AAPL").is_ok());
        assert!(validate_ticker("ABCDEFGHIJ").is_ok());
        assert!(validate_ticker("").is_err());
        assert!(validate_ticker("abc").is_err());
        assert!(validate_ticker("BRK.B").is_err());
        assert!(validate_ticker("ABCDEFGHIJK").is_err());
    }

    #[tokio::test]
    async fn test_trending_returns_top_symbol_with_news() {
        let app = app(state(quotes(), true, store()));
        let (status, body) = get(app, "/api/stocks/trending?type=most_actives&news_count=2").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["symbol"], "NVDA");
        assert_eq!(body["screener_type"], "most_actives");
        assert_eq!(body["basic_info"]["shortName"], "NVDA Corp");
        assert_eq!(body["detail_info"]["price"]["regularMarketPrice"], 190.5);
        assert!(body["detail_info"]["summary_detail"].is_null());
        assert_eq!(body["news"]["ticker"], "NVDA");
        assert_eq!(body["news"]["total_results"], 2);
    }

    #[tokio::test]
    async fn test_trending_without_news_service() {
        let app = app(state(quotes(), false, store()));
        let (status, body) = get(app, "/api/stocks/trending").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["news"].is_null());
    }

    #[tokio::test]
    async fn test_trending_rejects_unknown_screen() {
        let app = app(state(quotes(), false, store()));
        let (status, body) = get(app, "/api/stocks/trending?type=weekly").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["detail"].as_str().unwrap().contains("most_actives"));
    }

    #[tokio::test]
    async fn test_trending_rejects_out_of_range_news_count() {
        let app = app(state(quotes(), false, store()));
        let (status, body) = get(app.clone(), "/api/stocks/trending?news_count=0").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["detail"].as_str().unwrap().contains("news_count"));

        let (status, _) = get(app, "/api/stocks/trending?news_hours=169").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_trending_empty_screen_is_not_found() {
        let app = app(state(quotes(), false, store()));
        let (status, _) = get(app, "/api/stocks/trending?type=day_losers").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_trending_provider_failure_is_server_error() {
        let fake = FakeQuotes {
            fail_screens: true,
            ..Default::default()
        };
        let app = app(state(fake, false, store()));
        let (status, body) = get(app, "/api/stocks/trending").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body["detail"].as_str().unwrap().contains("503"));
    }

    #[tokio::test]
    async fn test_list_is_ranked_and_annotated() {
        let app = app(state(quotes(), false, store()));
        let (status, body) = get(app, "/api/stocks/trending/list?count=2").await;

        assert_eq!(status, StatusCode::OK);
        let rows = body.as_array().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["rank"], 1);
        assert_eq!(rows[0]["ticker"], "NVDA");
        assert_eq!(rows[0]["confidence"], "HIGH");
        assert_eq!(rows[0]["selection_reason"], "Top volume + highest attention");
        assert_eq!(rows[1]["confidence"], "MEDIUM");
        assert_eq!(rows[1]["highlight"], "Falling 1.0% on heavy volume");
    }

    #[tokio::test]
    async fn test_list_count_bounds() {
        let app = app(state(quotes(), false, store()));
        let (status, body) = get(app.clone(), "/api/stocks/trending/list?count=26").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["detail"].as_str().unwrap().contains("count"));

        let (status, _) = get(app, "/api/stocks/trending/list?count=abc").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_list_empty_screen_is_not_found() {
        let app = app(state(quotes(), false, store()));
        let (status, _) = get(app, "/api/stocks/trending/list?screener_type=day_losers").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_all_reports_each_screen() {
        let app = app(state(quotes(), true, store()));
        let (status, body) = get(app, "/api/stocks/trending/all?include_news=true").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["most_actives"]["symbol"], "NVDA");
        assert_eq!(body["day_gainers"]["symbol"], "SMCI");
        assert_eq!(body["most_actives"]["news"]["query"], "NVDA stock news");
        assert!(body["day_losers"]["symbol"].is_null());
        assert!(body["day_losers"]["error"].is_string());
    }

    #[tokio::test]
    async fn test_selection_intersects_screens() {
        let app = app(state(quotes(), false, store()));
        let (status, body) = get(app, "/api/stocks/trending/selection").await;

        assert_eq!(status, StatusCode::OK);
        let trending = body["trending"].as_array().unwrap();
        assert_eq!(trending.len(), 1);
        assert_eq!(trending[0]["symbol"], "TSLA");
        assert_eq!(body["used_fallback"], false);
        assert_eq!(body["most_actives"].as_array().unwrap().len(), 3);
        assert_eq!(body["source"], "yahoo");
        assert!(body.get("error").is_none());
    }

    #[tokio::test]
    async fn test_selection_failure_is_reported_inline() {
        let fake = FakeQuotes {
            fail_screens: true,
            ..Default::default()
        };
        let app = app(state(fake, false, store()));
        let (status, body) = get(app, "/api/stocks/trending/selection").await;

        assert_eq!(status, StatusCode::OK);
        assert!(body["trending"].as_array().unwrap().is_empty());
        assert!(body["error"].as_str().unwrap().contains("503"));
    }

    #[tokio::test]
    async fn test_stock_detail() {
        let app = app(state(quotes(), true, store()));
        let (status, body) = get(app, "/api/stocks/AAPL?news_count=1").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["symbol"], "AAPL");
        assert_eq!(body["basic_info"]["regularMarketPrice"], 190.5);
        assert_eq!(body["overview"]["sector"], "Technology");
        assert_eq!(body["overview"]["source"], "yahoo");
        assert_eq!(body["news"]["total_results"], 1);
    }

    #[tokio::test]
    async fn test_stock_detail_rejects_lowercase_ticker() {
        let app = app(state(quotes(), false, store()));
        let (status, body) = get(app, "/api/stocks/abc").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["detail"].as_str().unwrap().contains("abc"));
    }

    #[tokio::test]
    async fn test_stock_detail_unknown_symbol() {
        let app = app(state(quotes(), false, store()));
        let (status, body) = get(app, "/api/stocks/ZZZZ?include_news=false").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["detail"].as_str().unwrap().contains("ZZZZ"));
    }
}
