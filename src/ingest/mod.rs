//! Historical Campaign Data Ingestion
//!
//! Loads the historical campaign dataset (CSV) into [`CampaignRecord`]s.
//! Column lookup is header-driven, so column order in the file does not
//! matter. Missing categorical values are normalized to `"Unknown"`
//! before they ever reach the feature encoder.
//!
//! [`CampaignRecord`]: crate::types::CampaignRecord

mod csv;

pub use csv::{load_campaign_csv, IngestError, IngestReport};
