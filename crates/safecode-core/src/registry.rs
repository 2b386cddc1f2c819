// SPDX-License-Identifier: Apache-2.0

//! Validated set of detector rules.
//!
//! A registry can only be built when every definition id its rules can emit
//! resolves in the catalogs, so a misconfigured catalog fails at startup
//! instead of during a scan.

use std::fmt;

use tracing::debug;

use crate::Result;
use crate::catalog::Catalogs;
use crate::config::ScanConfig;
use crate::rules::{DetectorRule, standard_rules};

/// Ordered, catalog-checked detector rules.
pub struct RuleRegistry {
    rules: Vec<Box<dyn DetectorRule>>,
}

impl fmt::Debug for RuleRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.rules.iter().map(|r| r.id())).finish()
    }
}

impl RuleRegistry {
    /// Builds a registry from explicit rules.
    ///
    /// # Errors
    ///
    /// Returns `SafeCodeError::DanglingDefinition` for the first definition
    /// id that does not resolve in `catalogs`.
    pub fn new(catalogs: &Catalogs, rules: Vec<Box<dyn DetectorRule>>) -> Result<Self> {
        for rule in &rules {
            for id in rule.definition_ids() {
                catalogs.ensure_resolves(rule.id(), id)?;
            }
        }
        debug!(rules = rules.len(), "Rule registry validated");
        Ok(Self { rules })
    }

    /// Builds the built-in rules, leaving out those disabled in `scan`.
    ///
    /// # Errors
    ///
    /// Same as [`RuleRegistry::new`].
    pub fn standard(catalogs: &Catalogs, scan: &ScanConfig) -> Result<Self> {
        let rules = standard_rules()
            .into_iter()
            .filter(|rule| {
                let enabled = scan.is_rule_enabled(rule.id());
                if !enabled {
                    debug!(rule = rule.id(), "Rule disabled by configuration");
                }
                enabled
            })
            .collect();
        Self::new(catalogs, rules)
    }

    /// Appends a rule after validating it.
    ///
    /// # Errors
    ///
    /// Same as [`RuleRegistry::new`].
    pub fn with_rule(mut self, catalogs: &Catalogs, rule: Box<dyn DetectorRule>) -> Result<Self> {
        for id in rule.definition_ids() {
            catalogs.ensure_resolves(rule.id(), id)?;
        }
        self.rules.push(rule);
        Ok(self)
    }

    /// Rules in scan order.
    pub fn iter(&self) -> impl Iterator<Item = &dyn DetectorRule> {
        self.rules.iter().map(AsRef::as_ref)
    }

    /// Looks up a rule by id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&dyn DetectorRule> {
        self.iter().find(|r| r.id() == id)
    }

    /// Number of rules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Whether the registry has no rules.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SafeCodeError;
    use crate::finding::Finding;
    use crate::session::ScanSession;
    use crate::syntax::SyntaxTree;

    struct Dangling;

    impl DetectorRule for Dangling {
        fn id(&self) -> &'static str {
            "dangling"
        }

        fn name(&self) -> &'static str {
            "Dangling"
        }

        fn definition_ids(&self) -> &'static [&'static str] {
            &["101", "9999"]
        }

        fn scan(&self, _tree: &SyntaxTree, _session: &ScanSession<'_>) -> Result<Vec<Finding>> {
            Ok(Vec::new())
        }
    }

    #[test]
    fn test_standard_registry() {
        let catalogs = Catalogs::bundled().unwrap();
        let registry = RuleRegistry::standard(&catalogs, &ScanConfig::default()).unwrap();
        assert_eq!(registry.len(), 8);
        assert_eq!(registry.iter().next().unwrap().id(), "injection");
        assert!(registry.get("hipaa").is_some());
    }

    #[test]
    fn test_disabled_rules_are_left_out() {
        let catalogs = Catalogs::bundled().unwrap();
        let scan = ScanConfig {
            disabled_rules: vec!["logging".to_string(), "exposure".to_string()],
            ..ScanConfig::default()
        };
        let registry = RuleRegistry::standard(&catalogs, &scan).unwrap();
        assert_eq!(registry.len(), 6);
        assert!(registry.get("logging").is_none());
    }

    #[test]
    fn test_dangling_definition_fails_fast() {
        let catalogs = Catalogs::bundled().unwrap();
        let err = RuleRegistry::new(&catalogs, vec![Box::new(Dangling)]).unwrap_err();
        match err {
            SafeCodeError::DanglingDefinition {
                rule,
                definition_id,
                catalog,
            } => {
                assert_eq!(rule, "dangling");
                assert_eq!(definition_id, "9999");
                assert_eq!(catalog, "vulnerabilities");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_with_rule_validates() {
        let catalogs = Catalogs::bundled().unwrap();
        let registry = RuleRegistry::new(&catalogs, Vec::new()).unwrap();
        assert!(registry.is_empty());
        assert!(registry.with_rule(&catalogs, Box::new(Dangling)).is_err());
    }
}
