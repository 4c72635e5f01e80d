//! Planner configuration.
//!
//! Every field has a default, so an empty document is a valid configuration.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// What happens when a task is inserted under an id that is already taken.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum DuplicatePolicy {
    /// Replace the existing task, keeping its registration position.
    #[default]
    Overwrite,
    /// Keep the existing task and reject the new one.
    Reject,
}

/// Main configuration structure for the planner
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct PlannerConfig {
    /// Handling of colliding task ids.
    pub duplicate_policy: DuplicatePolicy,

    /// Risk scoring weights and thresholds.
    pub risk: RiskConfig,

    /// Upper bound on paths returned by dependency-chain enumeration.
    pub max_dependency_chains: usize,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            duplicate_policy: DuplicatePolicy::default(),
            risk: RiskConfig::default(),
            max_dependency_chains: 1000,
        }
    }
}

impl PlannerConfig {
    /// Parse a TOML document.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if the document is not valid TOML or
    /// contains unknown keys.
    pub fn from_toml_str(source: &str) -> Result<Self> {
        toml::from_str(source).map_err(|e| Error::configuration(e.to_string(), None))
    }

    /// Read and parse a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let source = std::fs::read_to_string(path)
            .map_err(|e| Error::configuration(e.to_string(), Some(path.to_path_buf())))?;
        toml::from_str(&source)
            .map_err(|e| Error::configuration(e.to_string(), Some(path.to_path_buf())))
    }
}

/// Weights and thresholds of the additive risk score.
///
/// A factor applies when the measured value is strictly greater than its
/// threshold; a task is high risk when its score reaches `threshold`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct RiskConfig {
    /// Score at which a task counts as high risk.
    pub threshold: u32,
    /// Added for high-priority tasks.
    pub high_priority_weight: u32,
    /// Added for tasks of high technical difficulty.
    pub high_difficulty_weight: u32,
    /// Added when the duration exceeds `long_duration_days`.
    pub long_duration_weight: u32,
    /// Duration threshold.
    pub long_duration_days: u64,
    /// Added when the prerequisite count exceeds `many_prerequisites_count`.
    pub many_prerequisites_weight: u32,
    /// Prerequisite threshold.
    pub many_prerequisites_count: usize,
    /// Added when the dependent count exceeds `many_dependents_count`.
    pub many_dependents_weight: u32,
    /// Dependent threshold.
    pub many_dependents_count: usize,
    /// Added when the key-technology count exceeds `many_technologies_count`.
    pub many_technologies_weight: u32,
    /// Key-technology threshold.
    pub many_technologies_count: usize,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            threshold: 50,
            high_priority_weight: 30,
            high_difficulty_weight: 40,
            long_duration_weight: 20,
            long_duration_days: 20,
            many_prerequisites_weight: 15,
            many_prerequisites_count: 2,
            many_dependents_weight: 15,
            many_dependents_count: 2,
            many_technologies_weight: 10,
            many_technologies_count: 3,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_empty_document_is_default() {
        let config = PlannerConfig::from_toml_str("").unwrap();
        assert_eq!(config, PlannerConfig::default());
        assert_eq!(config.risk.threshold, 50);
        assert_eq!(config.max_dependency_chains, 1000);
    }

    #[test]
    fn test_partial_document() {
        let config = PlannerConfig::from_toml_str(
            r#"
duplicatePolicy = "reject"

[risk]
threshold = 40
longDurationDays = 10
"#,
        )
        .unwrap();
        assert_eq!(config.duplicate_policy, DuplicatePolicy::Reject);
        assert_eq!(config.risk.threshold, 40);
        assert_eq!(config.risk.long_duration_days, 10);
        assert_eq!(config.risk.high_priority_weight, 30);
    }

    #[test]
    fn test_unknown_keys_are_rejected() {
        let err = PlannerConfig::from_toml_str("colour = \"blue\"").unwrap_err();
        assert!(matches!(err, Error::Configuration { path: None, .. }));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "maxDependencyChains = 5").unwrap();
        let config = PlannerConfig::load(file.path()).unwrap();
        assert_eq!(config.max_dependency_chains, 5);
    }

    #[test]
    fn test_load_missing_file_reports_path() {
        let err = PlannerConfig::load(Path::new("/nonexistent/taskplan.toml")).unwrap_err();
        match err {
            Error::Configuration { path, .. } => {
                assert_eq!(path.as_deref(), Some(Path::new("/nonexistent/taskplan.toml")));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
