use market_core::Quote;
use std::fmt::Write;

const STYLE: &str = r#"
        body { font-family: -apple-system, BlinkMacSystemFont, 'Helvetica Neue', sans-serif; max-width: 800px; margin: 0 auto; padding: 20px; background: #000; color: #fff; }
        h1 { color: #00D26A; border-bottom: 2px solid #00D26A; padding-bottom: 10px; }
        .stock-item { background: #1a1a1a; border-left: 3px solid #00D26A; padding: 15px; margin: 10px 0; }
        .positive { color: #00D26A; }
        .negative { color: #FF4757; }
        .briefing { background: #1a1a1a; padding: 20px; margin: 20px 0; line-height: 1.6; white-space: pre-wrap; }
        .footer { text-align: center; margin-top: 40px; padding-top: 20px; border-top: 1px solid #333; color: #888; font-size: 12px; }
"#;

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Render the standalone HTML briefing: a card per stock, then the
/// generated text.
pub fn render_briefing_html(briefing: &str, stocks: &[Quote], generated_at: &str) -> String {
    let generated_at = escape_html(generated_at);
    let mut html = format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Good Morning Wall Street - {generated_at}</title>
    <style>{STYLE}    </style>
</head>
<body>
    <h1>Good Morning Wall Street</h1>
    <p style="color: #888;">Generated at: {generated_at}</p>

    <h2>Today's Trending Stocks</h2>
"#
    );

    for stock in stocks {
        let change_class = if stock.change_percent > 0.0 {
            "positive"
        } else {
            "negative"
        };
        let _ = write!(
            html,
            r#"
    <div class="stock-item">
        <h3>{} - {}</h3>
        <p>Price: ${:.2}
        <span class="{}">({:+.2}%)</span></p>
    </div>
"#,
            escape_html(&stock.symbol),
            escape_html(&stock.name),
            stock.price,
            change_class,
            stock.change_percent
        );
    }

    let _ = write!(
        html,
        r#"
    <h2>Briefing</h2>
    <div class="briefing">{}</div>

    <div class="footer">
        <p>This is not investment advice. Make every investment decision carefully and at your own discretion.</p>
        <p>Good Morning Wall Street</p>
    </div>
</body>
</html>
"#,
        escape_html(briefing)
    );

    html
}
