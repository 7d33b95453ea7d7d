use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

use crate::MarketError;

/// Named ranked query against the quote provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScreenType {
    MostActives,
    DayGainers,
    DayLosers,
}

impl ScreenType {
    pub const ALL: [ScreenType; 3] = [
        ScreenType::MostActives,
        ScreenType::DayGainers,
        ScreenType::DayLosers,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ScreenType::MostActives => "most_actives",
            ScreenType::DayGainers => "day_gainers",
            ScreenType::DayLosers => "day_losers",
        }
    }
}

impl fmt::Display for ScreenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScreenType {
    type Err = MarketError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ScreenType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| MarketError::InvalidScreenType(s.to_string()))
    }
}

/// Quote record exactly as the provider returned it. Every field is optional
/// and unknown keys are kept, so deserialising any JSON object succeeds.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawQuote {
    #[serde(default, deserialize_with = "lenient::string")]
    pub symbol: Option<String>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub short_name: Option<String>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub long_name: Option<String>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub regular_market_price: Option<f64>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub regular_market_change: Option<f64>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub regular_market_change_percent: Option<f64>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub regular_market_volume: Option<f64>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub market_cap: Option<f64>,
    #[serde(rename = "trailingPE", default, deserialize_with = "lenient::number")]
    pub trailing_pe: Option<f64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Normalised quote snapshot served to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub symbol: String,
    pub name: String,
    pub price: f64,
    pub change: f64,
    pub change_percent: f64,
    pub volume: u64,
    pub market_cap: u64,
}

/// Provider-named view of a quote used by the single-symbol endpoints.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BasicInfo {
    pub symbol: String,
    pub short_name: Option<String>,
    pub long_name: Option<String>,
    pub regular_market_price: Option<f64>,
    pub regular_market_change: Option<f64>,
    pub regular_market_change_percent: Option<f64>,
    pub regular_market_volume: Option<u64>,
    pub market_cap: Option<u64>,
}

/// Independently fetchable per-symbol data group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DetailModule {
    Price,
    SummaryDetail,
    FinancialData,
    AssetProfile,
}

impl DetailModule {
    pub const ALL: [DetailModule; 4] = [
        DetailModule::Price,
        DetailModule::SummaryDetail,
        DetailModule::FinancialData,
        DetailModule::AssetProfile,
    ];

    /// Module name on the provider's quote summary API.
    pub fn provider_name(&self) -> &'static str {
        match self {
            DetailModule::Price => "price",
            DetailModule::SummaryDetail => "summaryDetail",
            DetailModule::FinancialData => "financialData",
            DetailModule::AssetProfile => "assetProfile",
        }
    }
}

impl fmt::Display for DetailModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.provider_name())
    }
}

pub type ModuleData = Map<String, Value>;

/// Best-effort per-symbol detail. A module the provider failed to return is `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StockDetail {
    pub symbol: String,
    pub price: Option<ModuleData>,
    pub summary_detail: Option<ModuleData>,
    pub financial_data: Option<ModuleData>,
    pub asset_profile: Option<ModuleData>,
}

impl StockDetail {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            ..Default::default()
        }
    }

    pub fn get(&self, module: DetailModule) -> Option<&ModuleData> {
        match module {
            DetailModule::Price => self.price.as_ref(),
            DetailModule::SummaryDetail => self.summary_detail.as_ref(),
            DetailModule::FinancialData => self.financial_data.as_ref(),
            DetailModule::AssetProfile => self.asset_profile.as_ref(),
        }
    }

    pub fn set(&mut self, module: DetailModule, data: Option<ModuleData>) {
        match module {
            DetailModule::Price => self.price = data,
            DetailModule::SummaryDetail => self.summary_detail = data,
            DetailModule::FinancialData => self.financial_data = data,
            DetailModule::AssetProfile => self.asset_profile = data,
        }
    }

    pub fn is_empty(&self) -> bool {
        DetailModule::ALL.iter().all(|m| self.get(*m).is_none())
    }
}

/// Flattened company overview built from the detail modules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockOverview {
    pub symbol: String,
    pub name: String,
    pub long_name: String,
    pub price: f64,
    pub change: f64,
    pub change_percent: f64,
    pub volume: u64,
    pub market_cap: u64,
    pub pe_ratio: Option<f64>,
    pub fifty_two_week_high: f64,
    pub fifty_two_week_low: f64,
    pub sector: String,
    pub industry: String,
    pub description: String,
    pub source: String,
}

/// Single news hit. The provider may omit any field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewsItem {
    pub title: Option<String>,
    pub url: Option<String>,
    pub published_date: Option<String>,
    pub author: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchPeriod {
    pub start_date: String,
    pub end_date: String,
    pub hours: u32,
}

impl SearchPeriod {
    pub fn last_hours(now: DateTime<Utc>, hours: u32) -> Self {
        let start = now - Duration::hours(i64::from(hours));
        Self {
            start_date: start.format("%Y-%m-%d").to_string(),
            end_date: now.format("%Y-%m-%d").to_string(),
            hours,
        }
    }
}

/// Outcome of a news search. Provider failures are carried in `error`
/// instead of being raised.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ticker: Option<String>,
    pub query: String,
    pub total_results: usize,
    #[serde(default)]
    pub news: Vec<NewsItem>,
    #[serde(default)]
    pub search_period: Option<SearchPeriod>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl NewsResult {
    pub fn found(query: impl Into<String>, period: SearchPeriod, news: Vec<NewsItem>) -> Self {
        Self {
            ticker: None,
            query: query.into(),
            total_results: news.len(),
            news,
            search_period: Some(period),
            error: None,
        }
    }

    pub fn failed(query: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            ticker: None,
            query: query.into(),
            total_results: 0,
            news: Vec::new(),
            search_period: None,
            error: Some(error.into()),
        }
    }

    pub fn with_ticker(mut self, ticker: impl Into<String>) -> Self {
        self.ticker = Some(ticker.into());
        self
    }

    pub fn headlines(&self) -> impl Iterator<Item = &str> {
        self.news.iter().filter_map(|n| n.title.as_deref())
    }
}

/// One search call against the news provider.
#[derive(Debug, Clone, PartialEq)]
pub struct NewsQuery {
    pub query: String,
    pub num_results: u32,
    pub start_published: DateTime<Utc>,
    pub end_published: DateTime<Utc>,
    pub include_domains: Option<Vec<String>>,
}

/// Output of the selection policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendingSelection {
    pub stocks: Vec<Quote>,
    /// True when no symbol was shared by both screens and the plain
    /// most-actives ranking was substituted.
    pub used_fallback: bool,
}

/// Screener row annotated with rank-based display strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedStock {
    pub rank: usize,
    pub ticker: String,
    pub name: String,
    pub current_price: f64,
    pub change_amount: f64,
    pub change_percent: f64,
    pub volume: u64,
    pub market_cap: u64,
    pub pe_ratio: Option<f64>,
    pub selection_reason: String,
    pub confidence: Confidence,
    pub highlight: String,
    pub beginner_note: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

/// Tolerant field decoders: a value of the wrong shape becomes `None`
/// rather than failing the whole record.
mod lenient {
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    pub fn number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<Value>::deserialize(deserializer)?;
        Ok(value.as_ref().and_then(as_f64))
    }

    pub fn string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<Value>::deserialize(deserializer)?;
        Ok(match value {
            Some(Value::String(s)) => Some(s),
            Some(Value::Number(n)) => Some(n.to_string()),
            _ => None,
        })
    }

    fn as_f64(value: &Value) -> Option<f64> {
        match value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            // Yahoo's {"raw": 1.0, "fmt": "1.00"} wrapper
            Value::Object(map) => map.get("raw").and_then(as_f64),
            _ => None,
        }
    }
}
