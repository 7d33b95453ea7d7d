/// Quotes requested from each screen before selection.
pub const DEFAULT_SCREENER_COUNT: usize = 10;
/// Maximum size of the trending set.
pub const DEFAULT_TRENDING_COUNT: usize = 5;

pub const DEFAULT_NEWS_HOURS: u32 = 24;
pub const DEFAULT_NEWS_RESULTS: u32 = 10;
pub const MAX_NEWS_RESULTS: u32 = 100;

pub const DEFAULT_VALUE_STRING: &str = "N/A";

/// Source tag attached to formatted provider data.
pub const DATA_SOURCE: &str = "yahoo";
