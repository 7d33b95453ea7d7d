use std::collections::HashSet;

use crate::{Quote, TrendingSelection};

/// Pick the trending set from the most-actives and day-gainers screens.
///
/// Quotes whose symbol appears in both lists are kept in `actives` order
/// (volume rank). When the lists share no symbol the first `limit` entries
/// of `actives` are used unchanged and `used_fallback` is set. The result
/// never holds more than `limit` quotes. Rows without a symbol are ignored.
pub fn select_trending(actives: &[Quote], gainers: &[Quote], limit: usize) -> TrendingSelection {
    let actives: Vec<&Quote> = actives.iter().filter(|q| has_symbol(q)).collect();
    let gainer_symbols: HashSet<&str> = gainers
        .iter()
        .filter(|q| has_symbol(q))
        .map(|q| q.symbol.as_str())
        .collect();

    let intersected: Vec<Quote> = actives
        .iter()
        .filter(|q| gainer_symbols.contains(q.symbol.as_str()))
        .take(limit)
        .map(|q| (*q).clone())
        .collect();

    if intersected.is_empty() && !actives.is_empty() {
        tracing::warn!(
            "No symbol shared by most_actives and day_gainers, using top {} by volume",
            limit
        );
        return TrendingSelection {
            stocks: actives.iter().take(limit).map(|q| (*q).clone()).collect(),
            used_fallback: true,
        };
    }

    TrendingSelection {
        stocks: intersected,
        used_fallback: false,
    }
}

fn has_symbol(quote: &Quote) -> bool {
    !quote.symbol.trim().is_empty()
}
