//! AdPilot: Marketing Campaign Intelligence
//!
//! Recommends a campaign variation and a channel budget split by
//! combining a learned conversion-rate predictor with noisy, multi-source
//! search evidence and a generative fallback.
//!
//! ## Architecture
//!
//! - **A/B Engine**: feature encoding, regression ensemble, candidate
//!   generation, and arg-max selection
//! - **Allocation Engine**: evidence extraction and the three-tier
//!   resolution chain (evidence → generative → fixed default)
//! - **Collaborators**: search provider and generative backend behind
//!   traits, dependency-injected at startup

pub mod ab_engine;
pub mod allocation;
pub mod api;
pub mod config;
pub mod ingest;
pub mod llm;
pub mod search;
pub mod types;

// Re-export commonly used types
pub use types::{
    AllocationDistribution, AllocationSource, CampaignRecord, Channel, EvidenceItem,
    ScoredVariation, Variation,
};

// Re-export A/B engine components
pub use ab_engine::{
    ConversionEstimator, EncodingError, FeatureEncoder, RatePredictor, SelectionError,
    VariationGenerator, VariationSelector,
};

// Re-export allocation components
pub use allocation::{AllocationError, AllocationOrchestrator, EvidenceExtractor};

// Re-export collaborator traits
pub use llm::LlmBackend;
pub use search::SearchProvider;
