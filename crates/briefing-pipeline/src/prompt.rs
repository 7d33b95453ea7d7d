use market_core::{NewsResult, Quote, DEFAULT_VALUE_STRING};
use std::collections::BTreeMap;
use std::fmt::Write;

/// Headlines embedded per stock.
pub const PROMPT_HEADLINES: usize = 3;

const INSTRUCTIONS: &str = "
## Instructions
1. Briefly explain why each stock is drawing attention
2. Summarize the overall market mood
3. Point out what investors should keep an eye on
4. Write in friendly, easy-to-understand language
5. Keep it between 300 and 500 words

**Important**: State clearly that this is not investment advice and that every investment decision is the reader's own responsibility.
";

/// Build the generation prompt from the trending stocks and their news.
pub fn build_prompt(stocks: &[Quote], news: &BTreeMap<String, NewsResult>) -> String {
    let mut prompt = String::from(
        "You are an analyst covering the US stock market.\n\
         Write a morning briefing for individual investors.\n\n\
         ## Today's trending stocks\n",
    );

    for (i, stock) in stocks.iter().enumerate() {
        // Writing to a String cannot fail.
        let _ = writeln!(prompt, "\n{}. **{}** ({})", i + 1, stock.symbol, stock.name);
        let _ = writeln!(prompt, "   - Price: ${:.2}", stock.price);
        let _ = writeln!(prompt, "   - Change: {:+.2}%", stock.change_percent);

        let items = news.get(&stock.symbol).map(|r| r.news.as_slice()).unwrap_or_default();
        if !items.is_empty() {
            prompt.push_str("   - Key news:\n");
            for item in items.iter().take(PROMPT_HEADLINES) {
                let title = item.title.as_deref().unwrap_or(DEFAULT_VALUE_STRING);
                let _ = writeln!(prompt, "     * {}", title);
            }
        }
    }

    prompt.push_str(INSTRUCTIONS);
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use market_core::NewsItem;

    fn quote(symbol: &str, price: f64, change_percent: f64) -> Quote {
        Quote {
            symbol: symbol.to_string(),
            name: format!("{symbol} Holdings"),
            price,
            change: 0.0,
            change_percent,
            volume: 0,
            market_cap: 0,
        }
    }

    fn news(titles: &[Option<&str>]) -> NewsResult {
        let mut result = NewsResult::failed("q", "unused");
        result.error = None;
        result.news = titles
            .iter()
            .map(|t| NewsItem {
                title: t.map(str::to_string),
                ..Default::default()
            })
            .collect();
        result.total_results = result.news.len();
        result
    }

    #[test]
    fn test_prompt_lists_stocks_in_order() {
        let stocks = vec![quote("TSLA", 250.5, 5.0), quote("AMD", 160.0, -1.234)];
        let prompt = build_prompt(&stocks, &BTreeMap::new());

        let tsla = prompt.find("1. **TSLA** (TSLA Holdings)").unwrap();
        let amd = prompt.find("2. **AMD** (AMD Holdings)").unwrap();
        assert!(tsla < amd);
        assert!(prompt.contains("Price: $250.50"));
        assert!(prompt.contains("Change: +5.00%"));
        assert!(prompt.contains("Change: -1.23%"));
        assert!(!prompt.contains("Key news"));
    }

    #[test]
    fn test_prompt_embeds_at_most_three_headlines() {
        let stocks = vec![quote("NVDA", 120.0, 2.0)];
        let mut all = BTreeMap::new();
        all.insert(
            "NVDA".to_string(),
            news(&[Some("one"), None, Some("three"), Some("four")]),
        );

        let prompt = build_prompt(&stocks, &all);
        assert!(prompt.contains("     * one\n"));
        assert!(prompt.contains("     * N/A\n"));
        assert!(prompt.contains("     * three\n"));
        assert!(!prompt.contains("four"));
    }

    #[test]
    fn test_prompt_carries_disclaimer() {
        let prompt = build_prompt(&[], &BTreeMap::new());
        assert!(prompt.contains("not investment advice"));
        assert!(prompt.contains("300 and 500 words"));
    }
}
