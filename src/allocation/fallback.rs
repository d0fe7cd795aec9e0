//! Generative Fallback Predictor — tier 2 and tier 3 of the chain.
//!
//! Asks the generative backend for a percentage split and parses the
//! first seven integer-percent tokens in appearance order, mapping them
//! positionally onto [`FALLBACK_PARSE_ORDER`]. The prompt enumerates the
//! channels in exactly that order; positional parsing is still brittle
//! against a model that reorders its answer, so an under-specified
//! completion (fewer than seven tokens) drops to the fixed default split
//! instead of erroring.

use super::AllocationError;
use crate::llm::LlmBackend;
use crate::types::{AllocationDistribution, AllocationSource, Channel};
use regex::Regex;
use std::sync::OnceLock;
use tracing::{info, warn};

/// Positional channel order for parsed percent tokens.
pub const FALLBACK_PARSE_ORDER: [Channel; 7] = [
    Channel::GoogleAds,
    Channel::InstagramAds,
    Channel::YoutubeAds,
    Channel::FacebookAds,
    Channel::TvAds,
    Channel::Seo,
    Channel::EmailMarketing,
];

/// The fixed literal default split. Sums to exactly 100.
pub fn default_split() -> AllocationDistribution {
    [
        (Channel::GoogleAds, 30.0),
        (Channel::FacebookAds, 20.0),
        (Channel::YoutubeAds, 15.0),
        (Channel::LinkedinAds, 10.0),
        (Channel::TvAds, 15.0),
        (Channel::Seo, 5.0),
        (Channel::EmailMarketing, 5.0),
    ]
    .into_iter()
    .collect()
}

fn percent_token_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(\d+)%").expect("static percent regex is valid"))
}

/// Predicts a budget split from the generative capability when no search
/// evidence exists.
pub struct FallbackPredictor;

impl FallbackPredictor {
    /// Build the prediction prompt for a product.
    pub fn build_prompt(product: &str) -> String {
        let channels: Vec<&str> = FALLBACK_PARSE_ORDER.iter().map(|c| c.as_str()).collect();
        format!(
            "Predict the ideal ad budget distribution (in percentages) for {product}. \
             Categories: {}.",
            channels.join(", ")
        )
    }

    /// Parse the first seven percent tokens of a completion into a
    /// positionally mapped distribution. `None` when fewer than seven
    /// tokens appear.
    pub fn parse_completion(response: &str) -> Option<AllocationDistribution> {
        let values: Vec<f64> = percent_token_regex()
            .captures_iter(response)
            .take(FALLBACK_PARSE_ORDER.len())
            .filter_map(|caps| caps.get(1)?.as_str().parse::<f64>().ok())
            .collect();

        if values.len() < FALLBACK_PARSE_ORDER.len() {
            return None;
        }
        Some(
            FALLBACK_PARSE_ORDER
                .iter()
                .zip(values)
                .map(|(channel, value)| (*channel, value))
                .collect(),
        )
    }

    /// Tier 2 with the tier-3 floor: issue one completion, parse it, and
    /// substitute the fixed default when parsing is ambiguous. A backend
    /// failure propagates — an unreachable model is not "no signal".
    pub async fn predict(
        product: &str,
        llm: &dyn LlmBackend,
        max_tokens: usize,
        temperature: f64,
    ) -> Result<(AllocationDistribution, AllocationSource), AllocationError> {
        let prompt = Self::build_prompt(product);
        let response = llm.complete(&prompt, max_tokens, temperature).await?;

        match Self::parse_completion(&response) {
            Some(distribution) => {
                info!(product, "Budget split predicted generatively");
                Ok((distribution, AllocationSource::Generative))
            }
            None => {
                warn!(
                    product,
                    "Completion carried fewer than {} percent tokens — using default split",
                    FALLBACK_PARSE_ORDER.len()
                );
                Ok((default_split(), AllocationSource::DefaultSplit))
            }
        }
    }
}
