//! News search over the Exa API.

pub mod exa;
pub mod service;

pub use exa::ExaClient;
pub use service::NewsService;
