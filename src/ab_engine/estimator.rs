//! Conversion Rate Estimator.
//!
//! Wraps the regression ensemble behind a fit-once, read-only-thereafter
//! lifecycle: a deterministic 80/20 train/validation split produces MAE
//! diagnostics at fit time, and `predict` serves as an advisory ranking
//! signal from then on. The trained estimator is immutable and safe to
//! share across concurrent selection requests.

use crate::ab_engine::encoder::FeatureRow;
use crate::ab_engine::forest::{ForestConfig, RandomForest};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use tracing::info;

/// Deterministic seed for the train/validation shuffle and the forest.
pub const SPLIT_SEED: u64 = 42;
/// Fraction of rows held out for validation diagnostics.
const VALIDATION_FRACTION: f64 = 0.2;
/// Below this there is no meaningful split to diagnose.
const MIN_TRAINING_ROWS: usize = 5;

/// Ranking-signal seam between the estimator and the selector. Tests
/// substitute deterministic stubs here.
pub trait RatePredictor: Send + Sync {
    /// Predicted conversion rate for an encoded feature row. Advisory
    /// only — never treated as ground truth.
    fn predict_rate(&self, row: &FeatureRow) -> f64;
}

/// Estimator training failures.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("not enough training data: {rows} rows (need at least {MIN_TRAINING_ROWS})")]
    NotEnoughData { rows: usize },
    #[error("feature rows ({rows}) and target rates ({targets}) differ in length")]
    ShapeMismatch { rows: usize, targets: usize },
}

/// Fit-time diagnostics. Reported on the status endpoint; not part of
/// the decision path.
#[derive(Debug, Clone, serde::Serialize)]
pub struct TrainingDiagnostics {
    pub train_rows: usize,
    pub validation_rows: usize,
    pub train_mae: f64,
    pub validation_mae: f64,
}

/// Trained conversion-rate estimator.
pub struct ConversionEstimator {
    forest: RandomForest,
    diagnostics: TrainingDiagnostics,
}

impl ConversionEstimator {
    /// Train on encoded historical rows.
    ///
    /// The split shuffle is seeded ([`SPLIT_SEED`]), so the same dataset
    /// always produces the same split, model, and diagnostics.
    pub fn fit(rows: &[FeatureRow], rates: &[f64]) -> Result<Self, ModelError> {
        if rows.len() != rates.len() {
            return Err(ModelError::ShapeMismatch {
                rows: rows.len(),
                targets: rates.len(),
            });
        }
        if rows.len() < MIN_TRAINING_ROWS {
            return Err(ModelError::NotEnoughData { rows: rows.len() });
        }

        let mut indices: Vec<usize> = (0..rows.len()).collect();
        indices.shuffle(&mut StdRng::seed_from_u64(SPLIT_SEED));

        let validation_count = ((rows.len() as f64) * VALIDATION_FRACTION).round() as usize;
        let validation_count = validation_count.max(1);
        let (validation_idx, train_idx) = indices.split_at(validation_count);

        let train_rows: Vec<[f64; 4]> = train_idx.iter().map(|&i| rows[i].as_array()).collect();
        let train_rates: Vec<f64> = train_idx.iter().map(|&i| rates[i]).collect();

        let forest = RandomForest::fit(&train_rows, &train_rates, &ForestConfig::default(), SPLIT_SEED);

        let train_mae = mae(&forest, rows, rates, train_idx);
        let validation_mae = mae(&forest, rows, rates, validation_idx);
        let diagnostics = TrainingDiagnostics {
            train_rows: train_idx.len(),
            validation_rows: validation_idx.len(),
            train_mae,
            validation_mae,
        };

        info!(
            train_rows = diagnostics.train_rows,
            validation_rows = diagnostics.validation_rows,
            train_mae = format!("{train_mae:.3}"),
            validation_mae = format!("{validation_mae:.3}"),
            trees = forest.tree_count(),
            "Conversion-rate estimator trained"
        );

        Ok(Self { forest, diagnostics })
    }

    /// Predicted conversion rate for one encoded row.
    pub fn predict(&self, row: &FeatureRow) -> f64 {
        self.forest.predict(&row.as_array())
    }

    pub fn diagnostics(&self) -> &TrainingDiagnostics {
        &self.diagnostics
    }
}

impl RatePredictor for ConversionEstimator {
    fn predict_rate(&self, row: &FeatureRow) -> f64 {
        self.predict(row)
    }
}

fn mae(forest: &RandomForest, rows: &[FeatureRow], rates: &[f64], indices: &[usize]) -> f64 {
    if indices.is_empty() {
        return 0.0;
    }
    let total: f64 = indices
        .iter()
        .map(|&i| (forest.predict(&rows[i].as_array()) - rates[i]).abs())
        .sum();
    total / indices.len() as f64
}
