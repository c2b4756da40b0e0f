//! Engine configuration.
//!
//! Every field has a default matching the hand-tuned rule set, so an empty
//! TOML document yields the stock engine. Partial documents override only
//! what they name.
//!
//! ```
//! use u_rota::config::EngineConfig;
//!
//! let config = EngineConfig::from_toml_str(
//!     r#"
//!     mandatory_off_days = ["Sun"]
//!
//!     [scoring]
//!     leader_conflict_penalty = 250.0
//!     "#,
//! )
//! .unwrap();
//! assert_eq!(config.scoring.leader_conflict_penalty, 250.0);
//! assert_eq!(config.scoring.continuity_bonus, 25.0);
//! ```

use std::path::Path;

use chrono::Weekday;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::scheduler::ScoringWeights;

/// Root configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Day scorer weights.
    #[serde(default)]
    pub scoring: ScoringWeights,

    /// Week days on which a member still without an Off this week is pushed
    /// to take one.
    #[serde(default = "default_mandatory_off_days")]
    pub mandatory_off_days: Vec<Weekday>,

    /// Week days that get the late-week Off bonus.
    #[serde(default = "default_late_week_days")]
    pub late_week_days: Vec<Weekday>,

    /// Constraint repair settings.
    #[serde(default)]
    pub repair: RepairConfig,
}

/// Constraint repair settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepairConfig {
    /// Run the minimal-change search when the ordered repair steps leave a
    /// hard-rule violation.
    #[serde(default = "default_true")]
    pub exhaustive_fallback: bool,
}

fn default_mandatory_off_days() -> Vec<Weekday> {
    vec![Weekday::Mon, Weekday::Sun]
}

fn default_late_week_days() -> Vec<Weekday> {
    vec![Weekday::Fri, Weekday::Sat]
}

fn default_true() -> bool {
    true
}

impl Default for RepairConfig {
    fn default() -> Self {
        Self {
            exhaustive_fallback: default_true(),
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            scoring: ScoringWeights::default(),
            mandatory_off_days: default_mandatory_off_days(),
            late_week_days: default_late_week_days(),
            repair: RepairConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Parses a TOML document.
    pub fn from_toml_str(input: &str) -> Result<Self> {
        Ok(toml::from_str(input)?)
    }

    /// Loads a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ScheduleError;

    #[test]
    fn test_empty_document_is_default() {
        let config = EngineConfig::from_toml_str("").unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.mandatory_off_days, vec![Weekday::Mon, Weekday::Sun]);
        assert_eq!(config.late_week_days, vec![Weekday::Fri, Weekday::Sat]);
        assert!(config.repair.exhaustive_fallback);
    }

    #[test]
    fn test_partial_override() {
        let config = EngineConfig::from_toml_str(
            r#"
            late_week_days = ["Thu"]

            [repair]
            exhaustive_fallback = false

            [scoring]
            zigzag_penalty = 30.0
            "#,
        )
        .unwrap();
        assert_eq!(config.late_week_days, vec![Weekday::Thu]);
        assert!(!config.repair.exhaustive_fallback);
        assert_eq!(config.scoring.zigzag_penalty, 30.0);
        assert_eq!(config.scoring.off_quota_bonus, 60.0);
    }

    #[test]
    fn test_malformed_document() {
        let err = EngineConfig::from_toml_str("scoring = 3").unwrap_err();
        assert!(matches!(err, ScheduleError::Config(_)));
    }

    #[test]
    fn test_load_missing_file() {
        let err = EngineConfig::load("/nonexistent/u-rota.toml").unwrap_err();
        assert!(matches!(err, ScheduleError::Io(_)));
    }
}
