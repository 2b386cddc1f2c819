// SPDX-License-Identifier: Apache-2.0

//! Scan orchestration.
//!
//! A session runs in three phases: the exemption pre-pass over every tree,
//! per-file detection (in parallel unless disabled), then enrichment and
//! aggregation. Rule failures and panics are contained per rule and file.

use std::panic::{AssertUnwindSafe, catch_unwind};

use rayon::prelude::*;
use tracing::{debug, info, instrument, warn};

use crate::Result;
use crate::catalog::Catalogs;
use crate::compliance;
use crate::config::{ScanConfig, SeverityConfig};
use crate::enrichment::{self, RecommendationService};
use crate::exemption::{ExemptionExtractor, ExemptionSet};
use crate::finding::Finding;
use crate::project::ProjectConfig;
use crate::registry::RuleRegistry;
use crate::report::ScanReport;
use crate::rules::DetectorRule;
use crate::session::ScanSession;
use crate::syntax::SyntaxTree;

/// Runs a rule registry over a set of trees.
///
/// Holds only shared references; one scanner can run any number of sessions.
#[derive(Debug, Clone, Copy)]
pub struct Scanner<'a> {
    catalogs: &'a Catalogs,
    registry: &'a RuleRegistry,
    project: &'a ProjectConfig,
    scan: &'a ScanConfig,
    severity: &'a SeverityConfig,
}

impl<'a> Scanner<'a> {
    /// Creates a scanner over validated rules and read-only configuration.
    #[must_use]
    pub fn new(
        catalogs: &'a Catalogs,
        registry: &'a RuleRegistry,
        project: &'a ProjectConfig,
        scan: &'a ScanConfig,
        severity: &'a SeverityConfig,
    ) -> Self {
        Self {
            catalogs,
            registry,
            project,
            scan,
            severity,
        }
    }

    /// Detects findings across all trees, in tree order.
    ///
    /// The exemption pre-pass completes before any file is scanned. Ignored
    /// definitions and paths are already filtered out.
    #[instrument(skip_all, fields(files = trees.len()))]
    pub fn detect(&self, trees: &[SyntaxTree]) -> Vec<Finding> {
        let exemptions = ExemptionExtractor::extract(trees);
        debug!(exemptions = exemptions.len(), "Exemption pre-pass complete");
        self.detect_with(trees, &exemptions)
    }

    /// Detects findings with an already extracted exemption set.
    pub fn detect_with(&self, trees: &[SyntaxTree], exemptions: &ExemptionSet) -> Vec<Finding> {
        let session = ScanSession::new(self.catalogs, self.project, exemptions, self.severity);

        let per_file: Vec<Vec<Finding>> = if self.scan.parallel {
            trees
                .par_iter()
                .map(|tree| self.scan_file(tree, &session))
                .collect()
        } else {
            trees
                .iter()
                .map(|tree| self.scan_file(tree, &session))
                .collect()
        };

        per_file.into_iter().flatten().collect()
    }

    /// Runs every applicable rule over one tree.
    pub fn scan_file(&self, tree: &SyntaxTree, session: &ScanSession<'_>) -> Vec<Finding> {
        let mut findings = Vec::new();
        for rule in self.registry.iter() {
            if !compliance::applies(rule, self.project) {
                continue;
            }
            let Some(mut found) = run_rule(rule, tree, session) else {
                continue;
            };
            for finding in &mut found {
                finding.rule_id = rule.id().to_string();
            }
            if let Some(regime) = rule.compliance_regime() {
                compliance::apply(regime, self.severity, &mut found);
            }
            findings.extend(found.into_iter().filter(|f| !self.scan.should_ignore(f)));
        }
        debug!(file = %tree.path(), findings = findings.len(), "File scanned");
        findings
    }

    /// Detects, attaches performance impacts and aggregates.
    ///
    /// # Errors
    ///
    /// Returns `SafeCodeError::Catalog` if a finding's definition has no
    /// performance entry.
    pub fn scan(&self, trees: &[SyntaxTree]) -> Result<ScanReport> {
        let mut findings = self.detect(trees);
        enrichment::attach_performance(&self.catalogs.performance, &mut findings)?;
        Ok(self.aggregate(findings))
    }

    /// Like [`Scanner::scan`], then merges recommendations from `service`.
    ///
    /// An unreachable or misbehaving service only skips the merge.
    ///
    /// # Errors
    ///
    /// Same as [`Scanner::scan`].
    pub async fn scan_and_enrich(
        &self,
        trees: &[SyntaxTree],
        service: &dyn RecommendationService,
    ) -> Result<ScanReport> {
        let mut findings = self.detect(trees);
        enrichment::attach_performance(&self.catalogs.performance, &mut findings)?;
        enrichment::enrich_recommendations(service, &mut findings).await;
        Ok(self.aggregate(findings))
    }

    fn aggregate(&self, findings: Vec<Finding>) -> ScanReport {
        let report = ScanReport::from_findings(findings);
        info!(
            findings = report.len(),
            files = report.file_count(),
            rules = self.registry.len(),
            "Scan complete"
        );
        report
    }
}

/// Runs one rule, turning errors and panics into a logged skip.
fn run_rule(
    rule: &dyn DetectorRule,
    tree: &SyntaxTree,
    session: &ScanSession<'_>,
) -> Option<Vec<Finding>> {
    match catch_unwind(AssertUnwindSafe(|| rule.scan(tree, session))) {
        Ok(Ok(findings)) => Some(findings),
        Ok(Err(e)) => {
            warn!(rule = rule.id(), file = %tree.path(), "Rule failed, skipping: {e}");
            None
        }
        Err(payload) => {
            let message = payload
                .downcast_ref::<&str>()
                .map(ToString::to_string)
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            warn!(rule = rule.id(), file = %tree.path(), "Rule panicked, skipping: {message}");
            None
        }
    }
}
