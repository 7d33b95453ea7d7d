use std::sync::Arc;

use async_trait::async_trait;

use crate::{
    DetailModule, MarketResult, ModuleData, NewsItem, NewsQuery, RawQuote, ScreenType, StockDetail,
};

// ---------------------------------------------------------------------------
// Quote provider
// ---------------------------------------------------------------------------

#[async_trait]
pub trait QuoteProvider: Send + Sync {
    /// Run a predefined screen and return up to `count` rows in provider order.
    async fn screen(&self, screen: ScreenType, count: usize) -> MarketResult<Vec<RawQuote>>;

    /// Fetch one detail module for `symbol`.
    async fn module(&self, symbol: &str, module: DetailModule) -> MarketResult<ModuleData>;

    /// Fetch every detail module independently. A module that fails is left
    /// empty; this never fails as a whole.
    async fn stock_detail(&self, symbol: &str) -> StockDetail {
        let mut detail = StockDetail::new(symbol);
        for module in DetailModule::ALL {
            match self.module(symbol, module).await {
                Ok(data) => detail.set(module, Some(data)),
                Err(e) => {
                    tracing::warn!("Failed to fetch {} for {}: {}", module, symbol, e);
                    detail.set(module, None);
                }
            }
        }
        detail
    }
}

#[async_trait]
impl<T: QuoteProvider + ?Sized> QuoteProvider for Arc<T> {
    async fn screen(&self, screen: ScreenType, count: usize) -> MarketResult<Vec<RawQuote>> {
        (**self).screen(screen, count).await
    }

    async fn module(&self, symbol: &str, module: DetailModule) -> MarketResult<ModuleData> {
        (**self).module(symbol, module).await
    }

    async fn stock_detail(&self, symbol: &str) -> StockDetail {
        (**self).stock_detail(symbol).await
    }
}

// ---------------------------------------------------------------------------
// News provider
// ---------------------------------------------------------------------------

#[async_trait]
pub trait NewsProvider: Send + Sync {
    async fn search(&self, query: &NewsQuery) -> MarketResult<Vec<NewsItem>>;
}

#[async_trait]
impl<T: NewsProvider + ?Sized> NewsProvider for Arc<T> {
    async fn search(&self, query: &NewsQuery) -> MarketResult<Vec<NewsItem>> {
        (**self).search(query).await
    }
}

// ---------------------------------------------------------------------------
// Text generation
// ---------------------------------------------------------------------------

#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> MarketResult<String>;
}

#[async_trait]
impl<T: TextGenerator + ?Sized> TextGenerator for Arc<T> {
    async fn generate(&self, prompt: &str) -> MarketResult<String> {
        (**self).generate(prompt).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MarketError;
    use serde_json::json;

    struct FlakyProvider {
        failing: DetailModule,
    }

    #[async_trait]
    impl QuoteProvider for FlakyProvider {
        async fn screen(&self, _screen: ScreenType, _count: usize) -> MarketResult<Vec<RawQuote>> {
            Ok(Vec::new())
        }

        async fn module(&self, symbol: &str, module: DetailModule) -> MarketResult<ModuleData> {
            if module == self.failing {
                return Err(MarketError::Provider("HTTP 500".into()));
            }
            let mut data = ModuleData::new();
            data.insert("symbol".into(), json!(symbol));
            data.insert("module".into(), json!(module.provider_name()));
            Ok(data)
        }
    }

    #[tokio::test]
    async fn test_failed_module_does_not_drop_the_others() {
        let provider = FlakyProvider {
            failing: DetailModule::FinancialData,
        };
        let detail = provider.stock_detail("AAPL").await;

        assert_eq!(detail.symbol, "AAPL");
        assert!(detail.financial_data.is_none());
        assert_eq!(detail.price.as_ref().unwrap()["module"], json!("price"));
        assert_eq!(detail.summary_detail.as_ref().unwrap()["module"], json!("summaryDetail"));
        assert_eq!(detail.asset_profile.as_ref().unwrap()["module"], json!("assetProfile"));
    }

    #[tokio::test]
    async fn test_shared_provider_delegates() {
        let provider: Arc<dyn QuoteProvider> = Arc::new(FlakyProvider {
            failing: DetailModule::Price,
        });
        let detail = provider.stock_detail("TSLA").await;
        assert!(detail.price.is_none());
        assert!(detail.asset_profile.is_some());
    }
}
