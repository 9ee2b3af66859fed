//! Reusable configuration templates.
//!
//! Two flavors share one store: the generic strategy-config template (an
//! opaque payload plus listing metadata) and the time-segment template (a
//! segment list tagged with a level and a usage note). Identity is
//! name-within-config-type for the generic flavor and stock + account +
//! level for the time-segment flavor; creating a second template under an
//! existing identity is a conflict that requires explicit overwrite
//! confirmation.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::time_segment::TimeSegmentEntry;

/// Which store scope a template lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConfigType {
    /// Generic strategy-config template.
    StrategyConfig,
    /// Time-segment template.
    TimeSegment,
}

impl ConfigType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConfigType::StrategyConfig => "STRATEGY_CONFIG",
            ConfigType::TimeSegment => "TIME_SEGMENT",
        }
    }
}

/// Closed-set label classifying a time-segment template's aggressiveness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TemplateLevel {
    S,
    A,
    B,
    C,
    D,
}

impl TemplateLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            TemplateLevel::S => "S",
            TemplateLevel::A => "A",
            TemplateLevel::B => "B",
            TemplateLevel::C => "C",
            TemplateLevel::D => "D",
        }
    }
}

impl std::str::FromStr for TemplateLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "S" => Ok(TemplateLevel::S),
            "A" => Ok(TemplateLevel::A),
            "B" => Ok(TemplateLevel::B),
            "C" => Ok(TemplateLevel::C),
            "D" => Ok(TemplateLevel::D),
            other => Err(format!("unknown template level \"{other}\"")),
        }
    }
}

/// Generic reusable template record.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigTemplate {
    #[serde(default)]
    pub id: Option<String>,

    pub template_name: String,
    pub config_type: ConfigType,

    /// Stock the template was authored from. Unset means the template is a
    /// wildcard applicable to any stock.
    #[serde(default)]
    pub source_stock_code: Option<String>,

    #[serde(default)]
    pub strategy_id: Option<String>,

    /// Market-cap band the template is meant for, used by listing filters.
    #[serde(default)]
    pub min_market_cap: Option<Decimal>,
    #[serde(default)]
    pub max_market_cap: Option<Decimal>,

    /// Opaque config payload (a serialized allocation or buy-ratio config).
    pub payload: serde_json::Value,

    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl ConfigTemplate {
    /// Advisory narrowing used when target rows are pre-selected: a template
    /// is a candidate when its source stock is unset (wildcard) or matches
    /// one of the selected rows.
    pub fn matches_selection(&self, selected_stock_codes: &[String]) -> bool {
        match &self.source_stock_code {
            None => true,
            Some(code) if code.is_empty() => true,
            Some(code) => selected_stock_codes.iter().any(|c| c == code),
        }
    }
}

/// Time-segment template: a segment list promoted for reuse.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeSegmentTemplate {
    #[serde(default)]
    pub id: Option<String>,

    pub stock_code: String,

    /// Set for account-level overrides; unset for strategy-level templates.
    #[serde(default)]
    pub account_id: Option<String>,

    pub template_level: TemplateLevel,

    /// Free-text note describing when to use this template.
    #[serde(default)]
    pub use_scenario: String,

    pub entries: Vec<TimeSegmentEntry>,

    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl TimeSegmentTemplate {
    /// Identity key: stock + account + level. Unique within the store.
    pub fn identity(&self) -> (&str, Option<&str>, TemplateLevel) {
        (
            self.stock_code.as_str(),
            self.account_id.as_deref(),
            self.template_level,
        )
    }

    pub fn same_identity(&self, other: &TimeSegmentTemplate) -> bool {
        self.identity() == other.identity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn template(source: Option<&str>) -> ConfigTemplate {
        ConfigTemplate {
            id: None,
            template_name: "aggressive".to_string(),
            config_type: ConfigType::StrategyConfig,
            source_stock_code: source.map(String::from),
            strategy_id: None,
            min_market_cap: None,
            max_market_cap: None,
            payload: serde_json::json!({}),
            created_at: None,
        }
    }

    #[test]
    fn level_round_trip() {
        for (text, level) in [
            ("S", TemplateLevel::S),
            ("a", TemplateLevel::A),
            (" b ", TemplateLevel::B),
        ] {
            assert_eq!(text.parse::<TemplateLevel>().unwrap(), level);
        }
        assert!("X".parse::<TemplateLevel>().is_err());
    }

    #[test]
    fn selection_narrowing_treats_unset_source_as_wildcard() {
        let selected = vec!["005930".to_string(), "000660".to_string()];

        assert!(template(None).matches_selection(&selected));
        assert!(template(Some("")).matches_selection(&selected));
        assert!(template(Some("005930")).matches_selection(&selected));
        assert!(!template(Some("035720")).matches_selection(&selected));
    }

    #[test]
    fn time_segment_identity() {
        let a = TimeSegmentTemplate {
            id: None,
            stock_code: "005930".to_string(),
            account_id: Some("acct-1".to_string()),
            template_level: TemplateLevel::A,
            use_scenario: String::new(),
            entries: Vec::new(),
            created_at: None,
        };
        let mut b = a.clone();
        assert!(a.same_identity(&b));

        b.template_level = TemplateLevel::B;
        assert!(!a.same_identity(&b));

        b.template_level = TemplateLevel::A;
        b.account_id = None;
        assert!(!a.same_identity(&b));
    }
}
