//! Domain types, selection policy, and formatting shared by the market
//! briefing services.

pub mod constants;
pub mod error;
pub mod format;
pub mod logging;
pub mod ranking;
pub mod selection;
pub mod traits;
pub mod types;

pub use constants::*;
pub use error::*;
pub use format::{basic_info, basic_info_from_price, format_overview, format_quote, format_quote_list};
pub use logging::init_tracing;
pub use ranking::rank_annotations;
pub use selection::select_trending;
pub use traits::*;
pub use types::*;
