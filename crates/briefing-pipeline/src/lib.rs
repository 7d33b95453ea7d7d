//! Offline "Good Morning Wall Street" pipeline.
//!
//! Three stages run as separate binaries and hand over work through
//! timestamped artifacts in the output directory:
//!
//! 1. `screening` selects the trending stocks and writes `screening_*.json`.
//! 2. `briefing` gathers news, asks the text generator for a briefing and
//!    writes `briefing_*.json` plus `briefing_*.html`.
//! 3. `send-briefing` mails the newest HTML briefing.

pub mod artifacts;
pub mod briefing;
pub mod delivery;
pub mod error;
pub mod gemini;
pub mod html;
pub mod prompt;
pub mod screening;

pub use artifacts::{ArtifactEntry, ArtifactStore, DEFAULT_OUTPUT_DIR};
pub use briefing::{
    load_latest_screening, run_briefing, BriefingArtifact, BriefingOutput, BRIEFING_PREFIX,
};
pub use delivery::run_email_delivery;
pub use error::{PipelineError, PipelineResult};
pub use gemini::{GeminiClient, DEFAULT_GEMINI_MODEL};
pub use html::{escape_html, render_briefing_html};
pub use prompt::build_prompt;
pub use screening::{run_screening, ScreeningArtifact, SCREENING_PREFIX};
