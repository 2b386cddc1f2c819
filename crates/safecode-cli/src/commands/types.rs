// SPDX-License-Identifier: Apache-2.0

//! Result types returned by command handlers.
//!
//! Handlers return data; `output` decides how to present it.

use safecode_core::{
    PerformanceImpactEntry, SarifReport, ScanReport, Severity, VulnerabilityDefinition,
};
use serde::Serialize;

/// Result from the scan command.
///
/// Structured formats serialize only the report: a map of file path to
/// findings.
#[derive(Debug, Clone, Serialize)]
#[serde(transparent)]
pub struct ScanResult {
    /// Findings grouped by file.
    pub report: ScanReport,
    /// Number of input files.
    #[serde(skip)]
    pub files_scanned: usize,
    /// Whether remote recommendations were requested.
    #[serde(skip)]
    pub enrichment_requested: bool,
    /// SARIF rendition of the report.
    #[serde(skip)]
    pub sarif: SarifReport,
}

/// Result from the catalog list command.
#[derive(Debug, Clone, Serialize)]
#[serde(transparent)]
pub struct CatalogListResult {
    /// Definitions in catalog order.
    pub definitions: Vec<VulnerabilityDefinition>,
}

/// Result from the catalog show command.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogShowResult {
    /// The definition.
    #[serde(flatten)]
    pub definition: VulnerabilityDefinition,
    /// Remediation options and their cost.
    pub performance_impacts: Vec<PerformanceImpactEntry>,
    /// Rule that emits this definition, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rule: Option<String>,
}

/// One detector rule.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleInfo {
    /// Rule id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Definitions the rule can emit.
    pub definition_ids: Vec<String>,
    /// Regime the rule belongs to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compliance_regime: Option<String>,
    /// Whether the rule is enabled by configuration.
    pub enabled: bool,
}

/// Result from the rules command.
#[derive(Debug, Clone, Serialize)]
#[serde(transparent)]
pub struct RulesResult {
    /// Rules in registry order.
    pub rules: Vec<RuleInfo>,
}

impl ScanResult {
    /// Finding counts per severity, most severe first, zero counts omitted.
    pub fn severity_counts(&self) -> Vec<(Severity, usize)> {
        [
            Severity::Critical,
            Severity::High,
            Severity::Medium,
            Severity::Low,
        ]
        .into_iter()
        .map(|s| (s, self.report.count_severity(s)))
        .filter(|(_, n)| *n > 0)
        .collect()
    }
}
