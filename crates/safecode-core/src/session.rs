// SPDX-License-Identifier: Apache-2.0

//! Scan-scoped context handed to every detector.

use std::collections::HashSet;
use std::sync::{Mutex, PoisonError};

use crate::Result;
use crate::catalog::{Catalogs, VulnerabilityDefinition};
use crate::config::SeverityConfig;
use crate::error::SafeCodeError;
use crate::exemption::ExemptionSet;
use crate::finding::{Finding, Severity};
use crate::project::ProjectConfig;
use crate::syntax::{NodeId, SyntaxTree};

/// Everything a detector may read during one scan, plus the session's
/// one-shot bookkeeping.
///
/// Catalogs, project configuration and exemptions are borrowed read-only.
/// The session is dropped when the scan ends, so no state outlives it.
#[derive(Debug)]
pub struct ScanSession<'a> {
    catalogs: &'a Catalogs,
    project: &'a ProjectConfig,
    exemptions: &'a ExemptionSet,
    severity: &'a SeverityConfig,
    processed: Mutex<HashSet<(&'static str, String)>>,
}

impl<'a> ScanSession<'a> {
    /// Opens a session over frozen inputs.
    #[must_use]
    pub fn new(
        catalogs: &'a Catalogs,
        project: &'a ProjectConfig,
        exemptions: &'a ExemptionSet,
        severity: &'a SeverityConfig,
    ) -> Self {
        Self {
            catalogs,
            project,
            exemptions,
            severity,
            processed: Mutex::new(HashSet::new()),
        }
    }

    /// Catalogs the session reads from.
    #[must_use]
    pub fn catalogs(&self) -> &'a Catalogs {
        self.catalogs
    }

    /// Project configuration.
    #[must_use]
    pub fn project(&self) -> &'a ProjectConfig {
        self.project
    }

    /// Permit-all endpoints extracted before the scan.
    #[must_use]
    pub fn exemptions(&self) -> &'a ExemptionSet {
        self.exemptions
    }

    /// Severity mapping.
    #[must_use]
    pub fn severity_config(&self) -> &'a SeverityConfig {
        self.severity
    }

    /// Records that `detector` processed `path`.
    ///
    /// Returns `true` the first time a pair is seen in this session.
    pub fn first_visit(&self, detector: &'static str, path: &str) -> bool {
        self.processed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert((detector, path.to_string()))
    }

    /// Default severity of a definition.
    ///
    /// Configured definition severity wins over the catalog entry, which wins
    /// over the configured category severity; `medium` otherwise.
    #[must_use]
    pub fn default_severity(&self, definition: &VulnerabilityDefinition) -> Severity {
        self.severity
            .for_definition(&definition.id)
            .or(definition.severity)
            .or_else(|| self.severity.for_category(definition.category))
            .unwrap_or_default()
    }

    /// Creates a finding for `definition_id` located at `node`.
    ///
    /// The message defaults to the definition description and the base
    /// recommendations are attached.
    ///
    /// # Errors
    ///
    /// Returns `SafeCodeError::DanglingDefinition` if the id does not resolve.
    pub fn finding(&self, tree: &SyntaxTree, node: NodeId, definition_id: &str) -> Result<Finding> {
        self.finding_at_line(tree, tree.line_of(node), definition_id)
    }

    /// Creates a finding for `definition_id` on an explicit line.
    pub fn finding_at_line(
        &self,
        tree: &SyntaxTree,
        line: usize,
        definition_id: &str,
    ) -> Result<Finding> {
        let definition = self
            .catalogs
            .vulnerabilities
            .get(definition_id)
            .ok_or_else(|| SafeCodeError::DanglingDefinition {
                rule: "session".to_string(),
                definition_id: definition_id.to_string(),
                catalog: "vulnerabilities".to_string(),
            })?;

        Ok(Finding {
            message: definition.description.clone(),
            file_path: tree.path().to_string(),
            line,
            category: definition.category,
            severity: self.default_severity(definition),
            definition_id: Some(definition.id.clone()),
            recommendations: definition.base_recommendations.clone(),
            ..Finding::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::finding::{Category, UNKNOWN_LINE};
    use crate::syntax::TreeBuilder;
    use std::collections::HashMap;

    fn tree() -> SyntaxTree {
        let mut b = TreeBuilder::new("src/A.java");
        b.at_line(12);
        let call = b.call(None, "addBatch", &[]);
        b.finish(&[call]).unwrap()
    }

    #[test]
    fn test_finding_defaults_from_catalog() {
        let catalogs = Catalogs::bundled().unwrap();
        let project = ProjectConfig::default();
        let exemptions = ExemptionSet::default();
        let severity = SeverityConfig::default();
        let session = ScanSession::new(&catalogs, &project, &exemptions, &severity);

        let tree = tree();
        let call = tree.children(tree.root())[0];
        let finding = session.finding(&tree, call, "102").unwrap();

        assert_eq!(finding.line, 12);
        assert_eq!(finding.file_path, "src/A.java");
        assert_eq!(finding.category, Category::SqlInjection);
        assert_eq!(finding.severity, Severity::Medium);
        assert_eq!(finding.definition_id.as_deref(), Some("102"));
        assert!(!finding.recommendations.is_empty());
        assert!(finding.performance_impacts.is_empty());
    }

    #[test]
    fn test_configured_severity_wins() {
        let catalogs = Catalogs::bundled().unwrap();
        let project = ProjectConfig::default();
        let exemptions = ExemptionSet::default();
        let severity = SeverityConfig {
            definitions: HashMap::from([("102".to_string(), Severity::Critical)]),
            ..SeverityConfig::default()
        };
        let session = ScanSession::new(&catalogs, &project, &exemptions, &severity);

        let tree = tree();
        let finding = session.finding_at_line(&tree, UNKNOWN_LINE, "102").unwrap();
        assert_eq!(finding.severity, Severity::Critical);
        assert_eq!(finding.line, UNKNOWN_LINE);
    }

    #[test]
    fn test_category_severity_used_without_catalog_severity() {
        let catalogs = Catalogs::from_json(
            r#"[{"id": "1", "type": "SQL_INJECTION", "description": "d"}]"#,
            r#"[{"id": "1"}]"#,
        )
        .unwrap();
        let project = ProjectConfig::default();
        let exemptions = ExemptionSet::default();
        let severity = SeverityConfig {
            categories: HashMap::from([("SQL_INJECTION".to_string(), Severity::Low)]),
            ..SeverityConfig::default()
        };
        let session = ScanSession::new(&catalogs, &project, &exemptions, &severity);

        let def = catalogs.vulnerabilities.get("1").unwrap();
        assert_eq!(session.default_severity(def), Severity::Low);
    }

    #[test]
    fn test_unknown_definition_is_error() {
        let catalogs = Catalogs::bundled().unwrap();
        let project = ProjectConfig::default();
        let exemptions = ExemptionSet::default();
        let severity = SeverityConfig::default();
        let session = ScanSession::new(&catalogs, &project, &exemptions, &severity);

        let tree = tree();
        let err = session.finding(&tree, tree.root(), "9999").unwrap_err();
        assert!(matches!(err, SafeCodeError::DanglingDefinition { .. }));
    }

    #[test]
    fn test_first_visit_is_per_detector_and_path() {
        let catalogs = Catalogs::default();
        let project = ProjectConfig::default();
        let exemptions = ExemptionSet::default();
        let severity = SeverityConfig::default();
        let session = ScanSession::new(&catalogs, &project, &exemptions, &severity);

        assert!(session.first_visit("hardcoded", "A.java"));
        assert!(!session.first_visit("hardcoded", "A.java"));
        assert!(session.first_visit("hardcoded", "B.java"));
        assert!(session.first_visit("other", "A.java"));
    }
}
