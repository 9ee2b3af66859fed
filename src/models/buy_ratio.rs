//! Tiered buy-ratio configuration: the split-buy ladder.
//!
//! The ladder is persisted as a JSON string on the strategy/stock record.
//! Stored payloads from the old console are loosely typed (`secondStage`
//! arrives as a bool, a number, or a string depending on which screen wrote
//! it), so parsing is tolerant and everything past [`BuyRatioConfig::parse`]
//! is a normalized typed value; the raw string never crosses that boundary.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Deserializer, Serialize};
use tracing::warn;

/// One step of the split-buy ladder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuyTier {
    /// Price-drop trigger for this tier, in percent.
    pub drop: Decimal,

    /// Fraction of the allocation ceiling deployed at this tier, in percent.
    pub ratio: Decimal,

    /// Follow-up strategy flag. At most one tier in a config may carry it.
    #[serde(default, deserialize_with = "de_loose_bool")]
    pub second_stage: bool,
}

impl BuyTier {
    pub fn new(drop: Decimal, ratio: Decimal) -> Self {
        Self {
            drop,
            ratio,
            second_stage: false,
        }
    }
}

/// Normalized buy-ratio configuration for one strategy/stock pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuyRatioConfig {
    /// Fraction of the allocation ceiling used for each of the first
    /// `limit_start_shares` buy orders, in percent.
    pub first_share_ratio: Decimal,

    /// Ladder tiers beyond the first block, in stored order.
    #[serde(default)]
    pub extra_shares: Vec<BuyTier>,
}

impl BuyRatioConfig {
    /// Parse a stored JSON payload into a normalized config.
    ///
    /// Absent or unparsable input degrades to [`BuyRatioConfig::default`];
    /// the failure is logged and never surfaced to the caller.
    pub fn parse(raw: Option<&str>) -> Self {
        let Some(raw) = raw else {
            return Self::default();
        };

        match serde_json::from_str::<Self>(raw) {
            Ok(mut config) => {
                config.normalize();
                config
            }
            Err(err) => {
                warn!(error = %err, "unparsable buy-ratio payload, using defaults");
                Self::default()
            }
        }
    }

    /// Enforce the mutual-exclusivity invariant: after the first tier found
    /// with `second_stage == true`, the flag is cleared on every later tier.
    ///
    /// Runs after every mutation and after deserialization, so stored
    /// payloads that violated the invariant are repaired on read.
    pub fn normalize(&mut self) {
        let mut seen = false;
        for tier in &mut self.extra_shares {
            if tier.second_stage {
                if seen {
                    tier.second_stage = false;
                } else {
                    seen = true;
                }
            }
        }
    }

    /// Mark `index` as the second-stage tier, clearing the flag everywhere
    /// else. Returns false (leaving every flag cleared) when `index` is out
    /// of range.
    pub fn select_second_stage(&mut self, index: usize) -> bool {
        for (i, tier) in self.extra_shares.iter_mut().enumerate() {
            tier.second_stage = i == index;
        }
        index < self.extra_shares.len()
    }

    /// Index of the tier currently carrying the second-stage flag, if any.
    pub fn second_stage_index(&self) -> Option<usize> {
        self.extra_shares.iter().position(|t| t.second_stage)
    }

    /// Serialize back to the stored JSON form.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

impl Default for BuyRatioConfig {
    /// Canonical seed ladder: 3% first-block ratio and seven tiers deepening
    /// toward the tail, second stage on the sixth.
    fn default() -> Self {
        let mut tiers = vec![
            BuyTier::new(dec!(3), dec!(3)),
            BuyTier::new(dec!(4), dec!(3)),
            BuyTier::new(dec!(5), dec!(5)),
            BuyTier::new(dec!(6), dec!(5)),
            BuyTier::new(dec!(7), dec!(8)),
            BuyTier::new(dec!(8), dec!(8)),
            BuyTier::new(dec!(10), dec!(10)),
        ];
        tiers[5].second_stage = true;

        Self {
            first_share_ratio: dec!(3),
            extra_shares: tiers,
        }
    }
}

/// Accept `true`, `1`, `"true"`, `"1"`, `"Y"`: the encodings the old
/// console wrote over the years.
fn de_loose_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::Bool(b) => b,
        serde_json::Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        serde_json::Value::String(s) => {
            matches!(s.trim(), "true" | "TRUE" | "True" | "1" | "y" | "Y")
        }
        _ => false,
    })
}
