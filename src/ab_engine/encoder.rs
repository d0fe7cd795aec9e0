//! Feature Encoder — categorical attributes to stable integer codes.
//!
//! One code table per categorical attribute, built once over the
//! historical set. Codes are contiguous from 0 and assigned over the
//! lexicographically sorted distinct values, so the same data always
//! yields the same codes. Encoding a value never seen at fit time fails
//! loudly instead of approximating — a wrong code silently corrupts the
//! feature space, a failed encode does not.

use crate::types::{CampaignRecord, UNKNOWN_CATEGORY};
use std::collections::{BTreeSet, HashMap};
use std::fmt;

/// Number of features in an encoded row.
pub const FEATURE_COUNT: usize = 4;

/// The categorical attributes the encoder manages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Attribute {
    CampaignType,
    TargetAudience,
    ChannelUsed,
}

impl Attribute {
    const ALL: [Attribute; 3] = [
        Attribute::CampaignType,
        Attribute::TargetAudience,
        Attribute::ChannelUsed,
    ];
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Attribute::CampaignType => "Campaign_Type",
            Attribute::TargetAudience => "Target_Audience",
            Attribute::ChannelUsed => "Channel_Used",
        };
        f.write_str(name)
    }
}

/// Encoding failures.
#[derive(Debug, Clone, thiserror::Error)]
pub enum EncodingError {
    /// The value was not in the historical set at fit time. Fatal to the
    /// single prediction that needed it; never substituted with a default
    /// code.
    #[error("category '{value}' for attribute {attribute} was not seen during training")]
    UnseenCategory { attribute: Attribute, value: String },
}

/// A fixed-shape encoded feature vector:
/// {campaign type code, target audience code, channel code, clicks}.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureRow {
    pub campaign_type: u32,
    pub target_audience: u32,
    pub channel_used: u32,
    pub clicks: f64,
}

impl FeatureRow {
    /// Numeric view for the regression model.
    pub fn as_array(&self) -> [f64; FEATURE_COUNT] {
        [
            f64::from(self.campaign_type),
            f64::from(self.target_audience),
            f64::from(self.channel_used),
            self.clicks,
        ]
    }
}

/// Per-attribute code tables, immutable after [`FeatureEncoder::fit`].
///
/// Re-fitting on new data changes code meanings, so it requires
/// retraining the estimator as well.
#[derive(Debug, Clone)]
pub struct FeatureEncoder {
    tables: HashMap<Attribute, HashMap<String, u32>>,
}

impl FeatureEncoder {
    /// Build code tables from the historical set. Every distinct value of
    /// each categorical attribute (missing values arrive pre-normalized
    /// to `"Unknown"`) gets a contiguous code; the `"Unknown"` bucket is
    /// always reserved even when the data has no missing values.
    pub fn fit(records: &[CampaignRecord]) -> Self {
        let mut tables = HashMap::with_capacity(Attribute::ALL.len());

        for attribute in Attribute::ALL {
            let mut values: BTreeSet<&str> = records
                .iter()
                .map(|r| match attribute {
                    Attribute::CampaignType => r.campaign_type.as_str(),
                    Attribute::TargetAudience => r.target_audience.as_str(),
                    Attribute::ChannelUsed => r.channel_used.as_str(),
                })
                .collect();
            values.insert(UNKNOWN_CATEGORY);

            let table: HashMap<String, u32> = values
                .into_iter()
                .enumerate()
                .map(|(code, value)| (value.to_string(), code as u32))
                .collect();
            tables.insert(attribute, table);
        }

        Self { tables }
    }

    /// Look up the code for a value observed at fit time.
    pub fn encode(&self, attribute: Attribute, value: &str) -> Result<u32, EncodingError> {
        self.tables
            .get(&attribute)
            .and_then(|table| table.get(value))
            .copied()
            .ok_or_else(|| EncodingError::UnseenCategory {
                attribute,
                value: value.to_string(),
            })
    }

    /// Encode a full feature row.
    pub fn encode_row(
        &self,
        campaign_type: &str,
        target_audience: &str,
        channel_used: &str,
        clicks: f64,
    ) -> Result<FeatureRow, EncodingError> {
        Ok(FeatureRow {
            campaign_type: self.encode(Attribute::CampaignType, campaign_type)?,
            target_audience: self.encode(Attribute::TargetAudience, target_audience)?,
            channel_used: self.encode(Attribute::ChannelUsed, channel_used)?,
            clicks,
        })
    }

    /// Number of distinct codes for an attribute.
    pub fn code_count(&self, attribute: Attribute) -> usize {
        self.tables.get(&attribute).map_or(0, HashMap::len)
    }
}
