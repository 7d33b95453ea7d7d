use async_trait::async_trait;
use market_core::{MarketError, MarketResult, NewsItem, NewsProvider, NewsQuery};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const BASE_URL: &str = "https://api.exa.ai";

#[derive(Clone)]
pub struct ExaClient {
    api_key: String,
    base_url: String,
    client: Client,
}

impl ExaClient {
    pub fn new(api_key: String) -> Self {
        Self::with_base_url(api_key, BASE_URL)
    }

    pub fn with_base_url(api_key: String, base_url: impl Into<String>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            api_key,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        }
    }

    /// Build from `EXA_API_KEY`. Fails when the key is unset or empty.
    pub fn from_env() -> MarketResult<Self> {
        let api_key = std::env::var("EXA_API_KEY")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| MarketError::Config("EXA_API_KEY is not set".to_string()))?;
        Ok(Self::new(api_key))
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SearchRequest<'a> {
    query: &'a str,
    num_results: u32,
    start_published_date: String,
    end_published_date: String,
    #[serde(rename = "type")]
    search_type: &'static str,
    category: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    include_domains: Option<&'a [String]>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchHit {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    published_date: Option<String>,
    #[serde(default)]
    author: Option<String>,
}

impl From<SearchHit> for NewsItem {
    fn from(hit: SearchHit) -> Self {
        NewsItem {
            title: hit.title,
            url: hit.url,
            published_date: hit.published_date,
            author: hit.author,
        }
    }
}

#[async_trait]
impl NewsProvider for ExaClient {
    async fn search(&self, query: &NewsQuery) -> MarketResult<Vec<NewsItem>> {
        let body = SearchRequest {
            query: &query.query,
            num_results: query.num_results,
            start_published_date: query.start_published.to_rfc3339(),
            end_published_date: query.end_published.to_rfc3339(),
            search_type: "auto",
            category: "news",
            include_domains: query.include_domains.as_deref(),
        };

        let response = self
            .client
            .post(format!("{}/search", self.base_url))
            .header("x-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| MarketError::Provider(e.to_string()))?;

        if !response.status().is_success() {
            return Err(MarketError::Provider(format!(
                "HTTP {}: {}",
                response.status(),
                response.text().await.unwrap_or_default()
            )));
        }

        let data: SearchResponse = response
            .json()
            .await
            .map_err(|e| MarketError::Provider(format!("Failed to parse Exa response: {}", e)))?;

        Ok(data.results.into_iter().map(NewsItem::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use httpmock::{Method::POST, MockServer};
    use serde_json::json;

    fn query() -> NewsQuery {
        NewsQuery {
            query: "AAPL stock news".to_string(),
            num_results: 3,
            start_published: Utc.with_ymd_and_hms(2025, 3, 1, 6, 0, 0).unwrap(),
            end_published: Utc.with_ymd_and_hms(2025, 3, 2, 6, 0, 0).unwrap(),
            include_domains: None,
        }
    }

    #[tokio::test]
    async fn test_search_maps_hits() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/search")
                .header("x-api-key", "test-key")
                .json_body_includes(
                    r#"{"query": "AAPL stock news", "numResults": 3, "type": "auto", "category": "news"}"#,
                );
            then.status(200)
                .header("content-type", "application/json")
                .json_body(json!({
                    "requestId": "abc",
                    "results": [
                        {"id": "1", "title": "Apple beats estimates", "url": "https://example.com/a",
                         "publishedDate": "2025-03-01T14:00:00.000Z", "author": "Jane Doe"},
                        {"id": "2", "url": "https://example.com/b"}
                    ]
                }));
        });

        let client = ExaClient::with_base_url("test-key".to_string(), server.base_url());
        let items = client.search(&query()).await.unwrap();

        mock.assert();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].title.as_deref(), Some("Apple beats estimates"));
        assert_eq!(items[0].published_date.as_deref(), Some("2025-03-01T14:00:00.000Z"));
        assert_eq!(items[0].author.as_deref(), Some("Jane Doe"));
        assert_eq!(items[1].title, None);
    }

    #[tokio::test]
    async fn test_search_sends_domain_filter() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/search")
                .json_body_includes(r#"{"includeDomains": ["reuters.com"]}"#);
            then.status(200).json_body(json!({"results": []}));
        });

        let mut q = query();
        q.include_domains = Some(vec!["reuters.com".to_string()]);
        let client = ExaClient::with_base_url("k".to_string(), server.base_url());
        let items = client.search(&q).await.unwrap();

        mock.assert();
        assert!(items.is_empty());
    }

    #[tokio::test]
    async fn test_search_http_error() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/search");
            then.status(401).body("invalid api key");
        });

        let client = ExaClient::with_base_url("bad".to_string(), server.base_url());
        let err = client.search(&query()).await.unwrap_err();
        assert!(err.to_string().contains("401"));
        assert!(err.to_string().contains("invalid api key"));
    }

    #[test]
    fn test_request_omits_missing_domains() {
        let q = query();
        let body = SearchRequest {
            query: &q.query,
            num_results: 5,
            start_published_date: q.start_published.to_rfc3339(),
            end_published_date: q.end_published.to_rfc3339(),
            search_type: "auto",
            category: "news",
            include_domains: None,
        };
        let value = serde_json::to_value(&body).unwrap();
        assert!(value.get("includeDomains").is_none());
        assert_eq!(value["numResults"], json!(5));
        assert_eq!(value["startPublishedDate"], json!("2025-03-01T06:00:00+00:00"));
    }
}
