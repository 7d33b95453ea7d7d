use async_trait::async_trait;
use market_core::{DetailModule, MarketError, MarketResult, ModuleData, QuoteProvider, RawQuote, ScreenType};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

const QUERY_BASE_URL: &str = "https://query2.finance.yahoo.com";
const COOKIE_URL: &str = "https://fc.yahoo.com";
const CRUMB_URL: &str = "https://query1.finance.yahoo.com/v1/test/getcrumb";
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

/// Yahoo Finance client for predefined screeners and quote-summary modules.
#[derive(Clone)]
pub struct YahooClient {
    client: Client,
    query_base: String,
    cookie_url: String,
    crumb_url: String,
    crumb: Arc<Mutex<Option<String>>>,
}

impl Default for YahooClient {
    fn default() -> Self {
        Self::new()
    }
}

impl YahooClient {
    pub fn new() -> Self {
        Self::with_base_urls(QUERY_BASE_URL, COOKIE_URL, CRUMB_URL)
    }

    /// Point the client at other hosts, e.g. a local mock server.
    pub fn with_base_urls(
        query_base: impl Into<String>,
        cookie_url: impl Into<String>,
        crumb_url: impl Into<String>,
    ) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(USER_AGENT)
            .cookie_store(true)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            query_base: query_base.into().trim_end_matches('/').to_string(),
            cookie_url: cookie_url.into(),
            crumb_url: crumb_url.into(),
            crumb: Arc::new(Mutex::new(None)),
        }
    }

    /// Return the cached crumb, performing the cookie + crumb handshake on
    /// first use. A failed handshake yields `None` and the caller proceeds
    /// without one.
    async fn crumb(&self) -> Option<String> {
        let mut guard = self.crumb.lock().await;
        if guard.is_none() {
            match self.fetch_crumb().await {
                Ok(crumb) => *guard = Some(crumb),
                Err(e) => tracing::warn!("Yahoo crumb handshake failed: {}", e),
            }
        }
        guard.clone()
    }

    async fn clear_crumb(&self) {
        *self.crumb.lock().await = None;
    }

    async fn fetch_crumb(&self) -> MarketResult<String> {
        // The cookie host answers 404 but still sets the session cookie.
        self.client
            .get(&self.cookie_url)
            .send()
            .await
            .map_err(|e| MarketError::Provider(e.to_string()))?;

        let response = self
            .client
            .get(&self.crumb_url)
            .send()
            .await
            .map_err(|e| MarketError::Provider(e.to_string()))?;

        if !response.status().is_success() {
            return Err(MarketError::Provider(format!(
                "crumb request returned HTTP {}",
                response.status()
            )));
        }

        let crumb = response
            .text()
            .await
            .map_err(|e| MarketError::Provider(e.to_string()))?;

        if crumb.is_empty() || crumb.contains('{') || crumb.contains('<') {
            return Err(MarketError::Provider(format!("Received invalid crumb: {}", crumb)));
        }

        Ok(crumb)
    }

    /// GET a Yahoo JSON endpoint, refreshing the crumb and retrying once if
    /// Yahoo rejects it.
    async fn get_json(&self, path: &str, params: &[(&str, String)]) -> MarketResult<Value> {
        let url = format!("{}{}", self.query_base, path);

        for attempt in 0..2 {
            let mut request = self.client.get(&url).query(params);
            if let Some(crumb) = self.crumb().await {
                request = request.query(&[("crumb", crumb)]);
            }

            let response = request.send().await.map_err(|e| {
                tracing::error!("Yahoo request to {} failed: {}", path, e);
                MarketError::Provider(e.to_string())
            })?;

            let status = response.status();
            let text = response.text().await.unwrap_or_default();

            if attempt == 0
                && (status == StatusCode::UNAUTHORIZED
                    || text.to_ascii_lowercase().contains("invalid crumb"))
            {
                tracing::warn!("Yahoo rejected crumb for {}, refreshing", path);
                self.clear_crumb().await;
                continue;
            }

            if status == StatusCode::NOT_FOUND {
                return Err(MarketError::NotFound(
                    error_description(&text).unwrap_or_else(|| path.to_string()),
                ));
            }

            if !status.is_success() {
                tracing::error!("Yahoo returned HTTP {} for {}", status, path);
                return Err(MarketError::Provider(format!("HTTP {}: {}", status, text)));
            }

            return serde_json::from_str(&text).map_err(|e| {
                MarketError::Provider(format!("Failed to parse Yahoo response: {}", e))
            });
        }

        Err(MarketError::Provider(format!(
            "Yahoo request to {} failed after crumb refresh",
            path
        )))
    }
}

#[async_trait]
impl QuoteProvider for YahooClient {
    async fn screen(&self, screen: ScreenType, count: usize) -> MarketResult<Vec<RawQuote>> {
        let body = self
            .get_json(
                "/v1/finance/screener/predefined/saved",
                &[("scrIds", screen.as_str().to_string()), ("count", count.to_string())],
            )
            .await?;

        let envelope: ScreenerEnvelope = serde_json::from_value(body)
            .map_err(|e| MarketError::Provider(format!("Unexpected screener payload: {}", e)))?;

        let Some(finance) = envelope.finance else {
            return Ok(Vec::new());
        };

        if let Some(err) = finance.error {
            return Err(MarketError::Provider(err.describe()));
        }

        let quotes = finance
            .result
            .and_then(|results| results.into_iter().next())
            .map(|r| r.quotes)
            .unwrap_or_default();

        Ok(quotes
            .into_iter()
            .filter(Value::is_object)
            .filter_map(|v| serde_json::from_value::<RawQuote>(v).ok())
            .take(count)
            .collect())
    }

    async fn module(&self, symbol: &str, module: DetailModule) -> MarketResult<ModuleData> {
        let body = self
            .get_json(
                &format!("/v10/finance/quoteSummary/{}", symbol),
                &[("modules", module.provider_name().to_string())],
            )
            .await?;

        let envelope: QuoteSummaryEnvelope = serde_json::from_value(body)
            .map_err(|e| MarketError::Provider(format!("Unexpected quoteSummary payload: {}", e)))?;

        let summary = envelope
            .quote_summary
            .ok_or_else(|| MarketError::Provider("quoteSummary missing".to_string()))?;

        if let Some(err) = summary.error {
            return Err(MarketError::Provider(err.describe()));
        }

        let data = summary
            .result
            .and_then(|results| results.into_iter().next())
            .and_then(|mut result| result.remove(module.provider_name()))
            .ok_or_else(|| MarketError::NotFound(format!("{} for {}", module, symbol)))?;

        match flatten_raw(data) {
            Value::Object(map) => Ok(map),
            _ => Err(MarketError::Provider(format!(
                "{} for {} is not an object",
                module, symbol
            ))),
        }
    }
}

/// Replace Yahoo's `{"raw": .., "fmt": ..}` wrappers with the raw value.
pub fn flatten_raw(value: Value) -> Value {
    match value {
        Value::Object(mut map) => {
            if let Some(raw) = map.remove("raw") {
                return raw;
            }
            Value::Object(map.into_iter().map(|(k, v)| (k, flatten_raw(v))).collect())
        }
        Value::Array(items) => Value::Array(items.into_iter().map(flatten_raw).collect()),
        other => other,
    }
}

fn error_description(text: &str) -> Option<String> {
    let value: Value = serde_json::from_str(text).ok()?;
    ["quoteSummary", "finance"]
        .iter()
        .find_map(|key| value.get(key)?.get("error")?.get("description")?.as_str())
        .map(str::to_string)
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    description: Option<String>,
}

impl ApiError {
    fn describe(&self) -> String {
        match (&self.code, &self.description) {
            (Some(code), Some(desc)) => format!("{}: {}", code, desc),
            (None, Some(desc)) => desc.clone(),
            (Some(code), None) => code.clone(),
            (None, None) => "unknown Yahoo error".to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ScreenerEnvelope {
    #[serde(default)]
    finance: Option<ScreenerFinance>,
}

#[derive(Debug, Deserialize)]
struct ScreenerFinance {
    #[serde(default)]
    result: Option<Vec<ScreenerResult>>,
    #[serde(default)]
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct ScreenerResult {
    #[serde(default)]
    quotes: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct QuoteSummaryEnvelope {
    #[serde(rename = "quoteSummary", default)]
    quote_summary: Option<QuoteSummary>,
}

#[derive(Debug, Deserialize)]
struct QuoteSummary {
    #[serde(default)]
    result: Option<Vec<serde_json::Map<String, Value>>>,
    #[serde(default)]
    error: Option<ApiError>,
}
