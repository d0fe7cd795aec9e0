//! Variation Selector — arg-max over predictor-scored candidates.

use crate::ab_engine::encoder::{EncodingError, FeatureEncoder};
use crate::ab_engine::estimator::RatePredictor;
use crate::types::{CampaignRecord, ScoredVariation, Variation};
use tracing::{debug, info};

/// Selection failures.
#[derive(Debug, thiserror::Error)]
pub enum SelectionError {
    #[error("no candidate variations to select from")]
    EmptyCandidateSet,
    /// A candidate referenced a category unseen during training.
    #[error(transparent)]
    Encoding(#[from] EncodingError),
}

/// Scores candidates through the estimator and picks the best one.
pub struct VariationSelector;

impl VariationSelector {
    /// Score each candidate (reusing the top campaign's target audience
    /// and clicks) and return the one with the strictly maximal predicted
    /// rate. On an exact tie the first-encountered maximum wins — the
    /// iteration order is stable, never randomized.
    pub fn select(
        candidates: &[Variation],
        top_campaign: &CampaignRecord,
        predictor: &dyn RatePredictor,
        encoder: &FeatureEncoder,
    ) -> Result<ScoredVariation, SelectionError> {
        if candidates.is_empty() {
            return Err(SelectionError::EmptyCandidateSet);
        }

        let mut best: Option<ScoredVariation> = None;
        for candidate in candidates {
            let row = encoder.encode_row(
                &candidate.campaign_type,
                &top_campaign.target_audience,
                &candidate.channel_used,
                top_campaign.clicks,
            )?;
            let predicted_rate = predictor.predict_rate(&row);
            debug!(
                variation = %candidate,
                rate = format!("{predicted_rate:.2}"),
                "Scored candidate variation"
            );

            match &best {
                Some(current) if predicted_rate <= current.predicted_rate => {}
                _ => {
                    best = Some(ScoredVariation {
                        variation: candidate.clone(),
                        predicted_rate,
                    });
                }
            }
        }

        // Non-empty candidates guarantee a winner.
        let chosen = best.ok_or(SelectionError::EmptyCandidateSet)?;
        info!(
            variation = %chosen.variation,
            rate = format!("{:.2}", chosen.predicted_rate),
            "Recommended A/B test variation"
        );
        Ok(chosen)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ab_engine::encoder::FeatureRow;
    use crate::types::CampaignRecord;

    /// Scores by channel code so tests control the ranking.
    struct ChannelCodePredictor;

    impl RatePredictor for ChannelCodePredictor {
        fn predict_rate(&self, row: &FeatureRow) -> f64 {
            f64::from(row.channel_used)
        }
    }

    /// Same score for everything — exercises the tie rule.
    struct FlatPredictor;

    impl RatePredictor for FlatPredictor {
        fn predict_rate(&self, _row: &FeatureRow) -> f64 {
            3.0
        }
    }

    fn record(campaign_type: &str, channel: &str, rate: f64) -> CampaignRecord {
        CampaignRecord {
            campaign_id: "C1".to_string(),
            company: "Tech".to_string(),
            campaign_type: campaign_type.to_string(),
            target_audience: "Men".to_string(),
            channel_used: channel.to_string(),
            clicks: 250.0,
            impressions: 1000,
            conversion_rate: rate,
            duration_days: 0,
            acquisition_cost: 0.0,
            roi: 0.0,
            engagement_score: 0.0,
            location: String::new(),
            language: String::new(),
            customer_segment: String::new(),
            date: String::new(),
        }
    }

    fn fitted_encoder() -> FeatureEncoder {
        FeatureEncoder::fit(&[
            record("Email", "Website", 2.0),
            record("Display", "YouTube", 4.0),
            record("Search", "Instagram", 6.0),
        ])
    }

    #[test]
    fn test_select_returns_an_input_candidate_with_its_score() {
        let encoder = fitted_encoder();
        let top = record("Email", "Website", 99.0);
        let candidates = vec![
            Variation::new("Email", "Instagram"),
            Variation::new("Display", "YouTube"),
            Variation::new("Search", "Website"),
        ];
        let chosen =
            VariationSelector::select(&candidates, &top, &ChannelCodePredictor, &encoder).unwrap();
        assert!(candidates.contains(&chosen.variation));

        // Score equals the predictor applied to the chosen candidate's row.
        let row = encoder
            .encode_row(&chosen.variation.campaign_type, &top.target_audience, &chosen.variation.channel_used, top.clicks)
            .unwrap();
        assert_eq!(chosen.predicted_rate, ChannelCodePredictor.predict_rate(&row));
    }

    #[test]
    fn test_tie_keeps_first_encountered() {
        let encoder = fitted_encoder();
        let top = record("Email", "Website", 99.0);
        let candidates = vec![
            Variation::new("Email", "Website"),
            Variation::new("Display", "YouTube"),
        ];
        let chosen =
            VariationSelector::select(&candidates, &top, &FlatPredictor, &encoder).unwrap();
        assert_eq!(chosen.variation, candidates[0]);
    }

    #[test]
    fn test_unseen_category_propagates() {
        let encoder = fitted_encoder();
        let top = record("Email", "Website", 99.0);
        let candidates = vec![Variation::new("Podcast", "Website")];
        let err =
            VariationSelector::select(&candidates, &top, &FlatPredictor, &encoder).unwrap_err();
        assert!(matches!(err, SelectionError::Encoding(_)));
    }

    #[test]
    fn test_empty_candidates_rejected() {
        let encoder = fitted_encoder();
        let top = record("Email", "Website", 99.0);
        let err = VariationSelector::select(&[], &top, &FlatPredictor, &encoder).unwrap_err();
        assert!(matches!(err, SelectionError::EmptyCandidateSet));
    }
}
