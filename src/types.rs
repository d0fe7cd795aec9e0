//! Core domain types shared across the AdPilot engine.
//!
//! - [`CampaignRecord`]: one historical (or submitted) marketing campaign
//! - [`Channel`]: the fixed advertising-channel vocabulary
//! - [`AllocationDistribution`]: channel -> percentage budget split
//! - [`Variation`] / [`ScoredVariation`]: A/B-test candidates
//! - [`EvidenceItem`]: one scored search snippet

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Sentinel used for missing categorical values, assigned before encoding.
pub const UNKNOWN_CATEGORY: &str = "Unknown";

// ============================================================================
// Campaign Records
// ============================================================================

/// One marketing campaign: a historical row from the dataset or a newly
/// submitted campaign appended to the working set.
///
/// Historical rows are immutable once loaded. Conversion rate is a
/// percentage in [0, 100]; ingestion rejects rows outside that range.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CampaignRecord {
    pub campaign_id: String,
    /// Business category ("company" column in the source dataset).
    pub company: String,
    pub campaign_type: String,
    pub target_audience: String,
    pub channel_used: String,
    pub clicks: f64,
    pub impressions: u64,
    /// Percentage in [0, 100].
    pub conversion_rate: f64,
    #[serde(default)]
    pub duration_days: u32,
    #[serde(default)]
    pub acquisition_cost: f64,
    #[serde(default)]
    pub roi: f64,
    #[serde(default)]
    pub engagement_score: f64,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub language: String,
    #[serde(default)]
    pub customer_segment: String,
    #[serde(default)]
    pub date: String,
}

impl CampaignRecord {
    /// The top-performing campaign in a working set: strictly maximal
    /// conversion rate, first-encountered on an exact tie.
    pub fn top_of<'a>(records: &'a [CampaignRecord]) -> Option<&'a CampaignRecord> {
        let mut best: Option<&CampaignRecord> = None;
        for record in records {
            match best {
                Some(b) if record.conversion_rate <= b.conversion_rate => {}
                _ => best = Some(record),
            }
        }
        best
    }
}

// ============================================================================
// Channel Vocabulary
// ============================================================================

/// Fixed advertising-channel vocabulary for budget allocation.
///
/// Serializes to the human-readable channel name (also used as the JSON
/// map key in [`AllocationDistribution`]).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum Channel {
    #[serde(rename = "Google Ads")]
    GoogleAds,
    #[serde(rename = "Facebook Ads")]
    FacebookAds,
    #[serde(rename = "Instagram Ads")]
    InstagramAds,
    #[serde(rename = "YouTube Ads")]
    YoutubeAds,
    #[serde(rename = "LinkedIn Ads")]
    LinkedinAds,
    #[serde(rename = "TV Ads")]
    TvAds,
    #[serde(rename = "SEO")]
    Seo,
    #[serde(rename = "Email Marketing")]
    EmailMarketing,
}

impl Channel {
    /// Human-readable channel name (matches the serde rename).
    pub fn as_str(self) -> &'static str {
        match self {
            Channel::GoogleAds => "Google Ads",
            Channel::FacebookAds => "Facebook Ads",
            Channel::InstagramAds => "Instagram Ads",
            Channel::YoutubeAds => "YouTube Ads",
            Channel::LinkedinAds => "LinkedIn Ads",
            Channel::TvAds => "TV Ads",
            Channel::Seo => "SEO",
            Channel::EmailMarketing => "Email Marketing",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Allocation Distribution
// ============================================================================

/// Budget split: channel -> percentage.
///
/// Any distribution derived from evidence or generative parsing sums to
/// 100 within rounding tolerance (a few hundredths); the fixed default
/// split sums to exactly 100.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AllocationDistribution {
    #[serde(flatten)]
    shares: BTreeMap<Channel, f64>,
}

impl AllocationDistribution {
    pub fn new() -> Self {
        Self {
            shares: BTreeMap::new(),
        }
    }

    /// Set a channel's percentage share.
    pub fn set(&mut self, channel: Channel, percentage: f64) {
        self.shares.insert(channel, percentage);
    }

    pub fn get(&self, channel: Channel) -> Option<f64> {
        self.shares.get(&channel).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.shares.is_empty()
    }

    pub fn len(&self) -> usize {
        self.shares.len()
    }

    /// Sum of all shares. Within ±0.1 of 100 for any derived distribution.
    pub fn total(&self) -> f64 {
        self.shares.values().sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Channel, f64)> + '_ {
        self.shares.iter().map(|(c, p)| (*c, *p))
    }
}

impl FromIterator<(Channel, f64)> for AllocationDistribution {
    fn from_iter<T: IntoIterator<Item = (Channel, f64)>>(iter: T) -> Self {
        Self {
            shares: iter.into_iter().collect(),
        }
    }
}

/// Which tier of the resolution chain produced a distribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AllocationSource {
    /// Extracted from search evidence (index of the query that produced it).
    Evidence { query_index: usize },
    /// Parsed from a generative completion.
    Generative,
    /// The fixed literal default split.
    DefaultSplit,
}

// ============================================================================
// A/B Test Variations
// ============================================================================

/// A candidate (campaign type, channel) pair for A/B testing. Partial by
/// design: target audience and clicks come from the top campaign at
/// scoring time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variation {
    pub campaign_type: String,
    pub channel_used: String,
}

impl Variation {
    pub fn new(campaign_type: impl Into<String>, channel_used: impl Into<String>) -> Self {
        Self {
            campaign_type: campaign_type.into(),
            channel_used: channel_used.into(),
        }
    }
}

impl fmt::Display for Variation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} via {}", self.campaign_type, self.channel_used)
    }
}

/// A variation with its predicted conversion rate. Ephemeral, produced
/// per selection run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredVariation {
    pub variation: Variation,
    /// Advisory ranking signal, never treated as ground truth.
    pub predicted_rate: f64,
}

// ============================================================================
// Search Evidence
// ============================================================================

/// One scored text snippet from a search query result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvidenceItem {
    pub snippet: String,
    /// Relevance score from the search provider, >= 0.
    pub score: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_top_of_picks_max_conversion_rate() {
        let records = vec![
            record_with_rate("C100", 4.5),
            record_with_rate("C200", 99.0),
            record_with_rate("C300", 7.2),
        ];
        let top = CampaignRecord::top_of(&records).unwrap();
        assert_eq!(top.campaign_id, "C200");
    }

    #[test]
    fn test_top_of_tie_keeps_first() {
        let records = vec![record_with_rate("C1", 5.0), record_with_rate("C2", 5.0)];
        assert_eq!(CampaignRecord::top_of(&records).unwrap().campaign_id, "C1");
    }

    #[test]
    fn test_top_of_empty_is_none() {
        assert!(CampaignRecord::top_of(&[]).is_none());
    }

    #[test]
    fn test_distribution_serializes_with_channel_name_keys() {
        let dist: AllocationDistribution =
            [(Channel::GoogleAds, 60.0), (Channel::Seo, 40.0)].into_iter().collect();
        let json = serde_json::to_value(&dist).unwrap();
        assert_eq!(json["Google Ads"], 60.0);
        assert_eq!(json["SEO"], 40.0);
    }

    #[test]
    fn test_distribution_total() {
        let dist: AllocationDistribution = [
            (Channel::GoogleAds, 33.33),
            (Channel::FacebookAds, 33.33),
            (Channel::Seo, 33.34),
        ]
        .into_iter()
        .collect();
        assert!((dist.total() - 100.0).abs() < 1e-9);
    }

    fn record_with_rate(id: &str, rate: f64) -> CampaignRecord {
        CampaignRecord {
            campaign_id: id.to_string(),
            company: "Tech".to_string(),
            campaign_type: "Email".to_string(),
            target_audience: "Men".to_string(),
            channel_used: "Website".to_string(),
            clicks: 100.0,
            impressions: 10_000,
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
}
