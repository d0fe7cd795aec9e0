//! Post-allocation insights generation.
//!
//! One explanatory completion per resolved allocation: the backend is
//! asked to justify the split in terms of the usual campaign metrics.
//! Failures propagate — the service boundary decides how to present
//! them.

use crate::llm::{LlmBackend, LlmError};
use crate::types::AllocationDistribution;
use std::fmt::Write as _;

/// Build the insights prompt for a resolved distribution.
pub fn build_prompt(distribution: &AllocationDistribution) -> String {
    let mut split = String::new();
    for (channel, percentage) in distribution.iter() {
        let _ = writeln!(split, "{channel}: {percentage}%");
    }
    format!(
        "Here is the ad budget split in percentages:\n{split}\
         Explain why this distribution is effective using key performance metrics: \
         CTR (Click-Through Rate), Conversion Rate, Click Rate, Impressions, \
         Customer Time on the Product, and other relevant stats."
    )
}

/// Ask the generative backend to explain the split.
pub async fn generate(
    llm: &dyn LlmBackend,
    distribution: &AllocationDistribution,
    max_tokens: usize,
    temperature: f64,
) -> Result<String, LlmError> {
    let prompt = build_prompt(distribution);
    llm.complete(&prompt, max_tokens, temperature).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Channel;

    #[test]
    fn test_prompt_lists_every_channel_share() {
        let distribution: AllocationDistribution =
            [(Channel::GoogleAds, 60.0), (Channel::Seo, 40.0)].into_iter().collect();
        let prompt = build_prompt(&distribution);
        assert!(prompt.contains("Google Ads: 60%"));
        assert!(prompt.contains("SEO: 40%"));
        assert!(prompt.contains("CTR"));
    }
}
