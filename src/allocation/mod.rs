//! Budget Allocation Engine
//!
//! Resolves a channel budget split for a product through a strict
//! three-tier chain:
//!
//! 1. **Evidence extraction** — scored search snippets from the first
//!    query that returns anything, tallied per channel and normalized
//! 2. **Generative prediction** — a completion parsed for percent tokens,
//!    used only when extraction yields no signal
//! 3. **Fixed default split** — when the completion is under-specified
//!
//! ## Architecture
//! - `extractor`: keyword-tally extraction over evidence snippets
//! - `fallback`: generative prediction with the fixed default floor
//! - `orchestrator`: query sequencing, deadlines, retries, tier chaining
//! - `insights`: post-allocation explanatory completion

pub mod extractor;
pub mod fallback;
pub mod insights;
pub mod orchestrator;

pub use extractor::EvidenceExtractor;
pub use fallback::{default_split, FallbackPredictor};
pub use orchestrator::{AllocationOrchestrator, ChainSettings, ResolvedAllocation};

use crate::llm::LlmError;
use crate::search::SearchError;

/// Failures of the allocation chain. "A capability returned nothing" is
/// never an error — it moves the chain to the next tier. These mean a
/// capability itself failed and the service boundary must say so.
#[derive(Debug, thiserror::Error)]
pub enum AllocationError {
    #[error("search capability unavailable: {0}")]
    SearchUnavailable(#[from] SearchError),
    #[error("generative capability unavailable: {0}")]
    GenerativeUnavailable(#[from] LlmError),
}
