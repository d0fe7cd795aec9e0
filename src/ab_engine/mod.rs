//! A/B Test Engine — Predictive Variation Selection
//!
//! Trains a conversion-rate model on the historical campaign dataset and
//! uses it to rank candidate campaign variations.
//!
//! ## Architecture
//! - `encoder`: categorical attribute -> stable integer codes, with
//!   explicit unseen-category failure
//! - `forest`: bagged regression-tree ensemble (the learned capability)
//! - `estimator`: train/validation split, fit diagnostics, prediction
//! - `variations`: candidate pool construction and randomized sampling
//! - `selector`: arg-max choice over scored candidates

pub mod encoder;
pub mod estimator;
pub mod forest;
pub mod selector;
pub mod variations;

pub use encoder::{Attribute, EncodingError, FeatureEncoder, FeatureRow};
pub use estimator::{ConversionEstimator, ModelError, RatePredictor, TrainingDiagnostics};
pub use forest::{ForestConfig, RandomForest};
pub use selector::{SelectionError, VariationSelector};
pub use variations::VariationGenerator;

use crate::types::CampaignRecord;

/// Encode the full historical set into training rows and target rates.
///
/// Every record's categorical values were part of `fit`, so encoding
/// failures here indicate an encoder/estimator lifecycle bug.
pub fn encode_training_data(
    records: &[CampaignRecord],
    encoder: &FeatureEncoder,
) -> Result<(Vec<FeatureRow>, Vec<f64>), EncodingError> {
    let mut rows = Vec::with_capacity(records.len());
    let mut rates = Vec::with_capacity(records.len());
    for record in records {
        rows.push(encoder.encode_row(
            &record.campaign_type,
            &record.target_audience,
            &record.channel_used,
            record.clicks,
        )?);
        rates.push(record.conversion_rate);
    }
    Ok((rows, rates))
}
