//! Mapping from provider records to the stable output shapes.
//!
//! Every function here is total: missing or malformed fields degrade to
//! defaults instead of failing.

use serde_json::Value;

use crate::{
    BasicInfo, ModuleData, Quote, RawQuote, StockDetail, StockOverview, DATA_SOURCE,
    DEFAULT_VALUE_STRING,
};

pub fn format_quote(raw: &RawQuote) -> Quote {
    Quote {
        symbol: raw.symbol.clone().unwrap_or_default(),
        name: display_name(raw.short_name.as_deref(), raw.long_name.as_deref())
            .unwrap_or(DEFAULT_VALUE_STRING)
            .to_string(),
        price: finite_or_zero(raw.regular_market_price),
        change: finite_or_zero(raw.regular_market_change),
        change_percent: finite_or_zero(raw.regular_market_change_percent),
        volume: to_count(raw.regular_market_volume),
        market_cap: to_count(raw.market_cap),
    }
}

pub fn format_quote_list(raws: &[RawQuote]) -> Vec<Quote> {
    raws.iter().map(format_quote).collect()
}

pub fn basic_info(raw: &RawQuote) -> BasicInfo {
    BasicInfo {
        symbol: raw.symbol.clone().unwrap_or_default(),
        short_name: raw.short_name.clone(),
        long_name: raw.long_name.clone(),
        regular_market_price: raw.regular_market_price,
        regular_market_change: raw.regular_market_change,
        regular_market_change_percent: raw.regular_market_change_percent,
        regular_market_volume: raw.regular_market_volume.map(|v| to_count(Some(v))),
        market_cap: raw.market_cap.map(|v| to_count(Some(v))),
    }
}

/// Build `BasicInfo` from a quote-summary `price` module.
pub fn basic_info_from_price(symbol: &str, price: &ModuleData) -> BasicInfo {
    BasicInfo {
        symbol: symbol.to_string(),
        short_name: text(price, "shortName"),
        long_name: text(price, "longName"),
        regular_market_price: number(price, "regularMarketPrice"),
        regular_market_change: number(price, "regularMarketChange"),
        regular_market_change_percent: number(price, "regularMarketChangePercent"),
        regular_market_volume: number(price, "regularMarketVolume").map(|v| to_count(Some(v))),
        market_cap: number(price, "marketCap").map(|v| to_count(Some(v))),
    }
}

pub fn format_overview(detail: &StockDetail) -> StockOverview {
    let empty = ModuleData::new();
    let price = detail.price.as_ref().unwrap_or(&empty);
    let summary = detail.summary_detail.as_ref().unwrap_or(&empty);
    let profile = detail.asset_profile.as_ref().unwrap_or(&empty);

    let short_name = text(price, "shortName");
    let long_name = text(price, "longName");

    StockOverview {
        symbol: detail.symbol.clone(),
        name: short_name.unwrap_or_else(|| DEFAULT_VALUE_STRING.to_string()),
        long_name: long_name.unwrap_or_else(|| DEFAULT_VALUE_STRING.to_string()),
        price: finite_or_zero(number(price, "regularMarketPrice")),
        change: finite_or_zero(number(price, "regularMarketChange")),
        change_percent: finite_or_zero(number(price, "regularMarketChangePercent")),
        volume: to_count(number(price, "regularMarketVolume")),
        market_cap: to_count(number(summary, "marketCap")),
        pe_ratio: number(summary, "trailingPE").filter(|v| v.is_finite()),
        fifty_two_week_high: finite_or_zero(number(summary, "fiftyTwoWeekHigh")),
        fifty_two_week_low: finite_or_zero(number(summary, "fiftyTwoWeekLow")),
        sector: text(profile, "sector").unwrap_or_else(|| DEFAULT_VALUE_STRING.to_string()),
        industry: text(profile, "industry").unwrap_or_else(|| DEFAULT_VALUE_STRING.to_string()),
        description: text(profile, "longBusinessSummary")
            .unwrap_or_else(|| DEFAULT_VALUE_STRING.to_string()),
        source: DATA_SOURCE.to_string(),
    }
}

/// Short name, else long name. Blank names are skipped.
pub(crate) fn display_name<'a>(short: Option<&'a str>, long: Option<&'a str>) -> Option<&'a str> {
    short
        .filter(|s| !s.trim().is_empty())
        .or_else(|| long.filter(|s| !s.trim().is_empty()))
}

fn finite_or_zero(value: Option<f64>) -> f64 {
    value.filter(|v| v.is_finite()).unwrap_or(0.0)
}

fn to_count(value: Option<f64>) -> u64 {
    match value {
        Some(v) if v.is_finite() && v > 0.0 => v.round() as u64,
        _ => 0,
    }
}

fn text(module: &ModuleData, key: &str) -> Option<String> {
    match module.get(key) {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.clone()),
        _ => None,
    }
}

fn number(module: &ModuleData, key: &str) -> Option<f64> {
    match module.get(key)? {
        Value::Number(n) => n.as_f64(),
        Value::Object(obj) => obj.get("raw").and_then(Value::as_f64),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
