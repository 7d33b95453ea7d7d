use crate::format::{display_name, format_quote};
use crate::{Confidence, RankedStock, RawQuote, ScreenType};

/// Annotate a screener row with display strings derived from its screen and
/// 1-based rank.
pub fn rank_annotations(screen: ScreenType, rank: usize, raw: &RawQuote) -> RankedStock {
    let quote = format_quote(raw);
    let name = display_name(raw.short_name.as_deref(), raw.long_name.as_deref());

    RankedStock {
        rank,
        ticker: quote.symbol,
        name: quote.name,
        current_price: quote.price,
        change_amount: quote.change,
        change_percent: quote.change_percent,
        volume: quote.volume,
        market_cap: quote.market_cap,
        pe_ratio: raw.trailing_pe.filter(|v| v.is_finite()),
        selection_reason: selection_reason(screen, rank).to_string(),
        confidence: confidence(rank),
        highlight: highlight(screen, quote.change_percent),
        beginner_note: format!(
            "{} is drawing strong market interest right now.",
            name.unwrap_or("This stock")
        ),
    }
}

fn selection_reason(screen: ScreenType, rank: usize) -> &'static str {
    match screen {
        ScreenType::MostActives if rank == 1 => "Top volume + highest attention",
        ScreenType::MostActives => "Top volume",
        ScreenType::DayGainers => "Top volume + rising",
        ScreenType::DayLosers => "Top volume + falling",
    }
}

fn confidence(rank: usize) -> Confidence {
    match rank {
        0 | 1 => Confidence::High,
        2 | 3 => Confidence::Medium,
        _ => Confidence::Low,
    }
}

fn highlight(screen: ScreenType, change_percent: f64) -> String {
    match screen {
        ScreenType::DayGainers => format!("Up {:.1}% today", change_percent.abs()),
        ScreenType::DayLosers => format!("Down {:.1}% today", change_percent.abs()),
        ScreenType::MostActives => {
            if change_percent > 0.0 {
                format!("Rising {:.1}% on heavy volume", change_percent)
            } else if change_percent < 0.0 {
                format!("Falling {:.1}% on heavy volume", change_percent.abs())
            } else {
                "Drawing attention on heavy volume".to_string()
            }
        }
    }
}
