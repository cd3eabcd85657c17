// ⚙️ Resolver Configuration
// Per-run knobs for the name heuristics, loadable from JSON

use anyhow::{Context as AnyhowContext, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::ResolveError;
use crate::rules::{OverrideRule, OverrideRules};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Fully upper-case names in owner buckets read as LAST FIRST [MIDDLE...]
    pub assessor_order_for_owners: bool,

    /// Same convention for grantor/grantee strings on sales
    pub assessor_order_for_sales: bool,

    /// Fill a missing middle name when a fuller spelling of the same person appears
    pub backfill_middle_names: bool,

    /// Appended to the built-in company keyword table
    pub extra_company_keywords: Vec<String>,

    /// Appended to the canonical-key stop-words
    pub extra_stop_words: Vec<String>,

    /// Appended to the "no owner" sentinel values
    pub extra_sentinels: Vec<String>,

    /// Forced classifications, checked before any heuristic
    pub override_rules: Vec<OverrideRule>,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        ResolverConfig {
            assessor_order_for_owners: true,
            assessor_order_for_sales: false,
            backfill_middle_names: true,
            extra_company_keywords: Vec::new(),
            extra_stop_words: Vec::new(),
            extra_sentinels: Vec::new(),
            override_rules: Vec::new(),
        }
    }
}

impl ResolverConfig {
    /// Load configuration from a JSON file; missing fields take defaults
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;

        let config: ResolverConfig =
            serde_json::from_str(&content).context("Failed to parse config JSON")?;

        config.validate().context("Invalid resolver config")?;

        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ResolveError> {
        self.override_rules().map(|_| ())
    }

    /// Validated, priority-ordered override rules
    pub fn override_rules(&self) -> Result<OverrideRules, ResolveError> {
        OverrideRules::from_rules(self.override_rules.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::OwnerKind;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = ResolverConfig::default();

        assert!(config.assessor_order_for_owners);
        assert!(!config.assessor_order_for_sales);
        assert!(config.backfill_middle_names);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_takes_defaults() {
        let config: ResolverConfig =
            serde_json::from_str(r#"{"assessor_order_for_sales": true}"#).unwrap();

        assert!(config.assessor_order_for_sales);
        assert!(config.assessor_order_for_owners);
        assert!(config.override_rules.is_empty());
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{
                "extra_company_keywords": ["COOPERATIVE"],
                "override_rules": [
                    {{"id": "manor", "pattern": "SUNRISE MANOR", "kind": "company", "priority": 5}}
                ]
            }}"#
        )
        .unwrap();

        let config = ResolverConfig::from_file(file.path()).unwrap();

        assert_eq!(config.extra_company_keywords, vec!["COOPERATIVE"]);
        assert_eq!(config.override_rules[0].kind, OwnerKind::Company);
        assert_eq!(config.override_rules().unwrap().rule_count(), 1);
    }

    #[test]
    fn test_from_file_rejects_invalid_rule() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"override_rules": [{{"id": "bad", "pattern": "*", "kind": "person"}}]}}"#
        )
        .unwrap();

        let err = ResolverConfig::from_file(file.path()).unwrap_err();
        assert!(format!("{:#}", err).contains("bad"));
    }

    #[test]
    fn test_from_file_missing() {
        let result = ResolverConfig::from_file("/definitely/not/here.json");
        assert!(result.is_err());
    }
}
