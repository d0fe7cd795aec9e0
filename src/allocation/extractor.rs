//! Evidence Extractor — scored snippets to a normalized channel split.
//!
//! Only snippets containing a literal `%` count as evidentiary. A single
//! snippet may credit several channels at once — one article routinely
//! mentions multiple platforms — and each mention adds the snippet's
//! relevance score to that channel's tally. Zero total tally means "no
//! signal", never an all-zero distribution.

use crate::types::{AllocationDistribution, Channel, EvidenceItem};

/// Channel vocabulary with the lowercase keywords that credit each one.
pub const EXTRACTION_CHANNELS: [(Channel, &[&str]); 7] = [
    (Channel::GoogleAds, &["google ads"]),
    (Channel::FacebookAds, &["facebook ads", "meta ads"]),
    (Channel::YoutubeAds, &["youtube ads"]),
    (Channel::LinkedinAds, &["linkedin ads"]),
    (Channel::TvAds, &["tv ads"]),
    (Channel::Seo, &["seo"]),
    (Channel::EmailMarketing, &["email marketing"]),
];

/// Turns evidence snippets into a normalized percentage distribution.
pub struct EvidenceExtractor;

impl EvidenceExtractor {
    /// Extract a distribution, or `None` when the evidence carries no
    /// usable signal.
    ///
    /// Percentages are rounded to 2 decimals; the sum may drift from 100
    /// by a few hundredths, which is accepted rather than corrected by
    /// redistributing the remainder.
    pub fn extract(items: &[EvidenceItem]) -> Option<AllocationDistribution> {
        let mut tallies = [0.0f64; EXTRACTION_CHANNELS.len()];

        for item in items {
            let snippet = item.snippet.to_lowercase();
            if !snippet.contains('%') {
                continue;
            }
            for (slot, (_, keywords)) in tallies.iter_mut().zip(EXTRACTION_CHANNELS.iter()) {
                if keywords.iter().any(|keyword| snippet.contains(keyword)) {
                    *slot += item.score;
                }
            }
        }

        let total: f64 = tallies.iter().sum();
        if total <= 0.0 {
            return None;
        }

        let distribution = EXTRACTION_CHANNELS
            .iter()
            .zip(tallies.iter())
            .map(|((channel, _), tally)| (*channel, round2(tally / total * 100.0)))
            .collect();
        Some(distribution)
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
