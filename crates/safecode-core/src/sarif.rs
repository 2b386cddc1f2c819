// SPDX-License-Identifier: Apache-2.0

//! SARIF (Static Analysis Results Interchange Format) output support.
//!
//! Converts a [`ScanReport`] to SARIF 2.1.0 for code-scanning dashboards.
//! Each catalog definition that produced a finding becomes one rule.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::catalog::VulnerabilityCatalog;
use crate::finding::{Finding, Severity, UNKNOWN_LINE};
use crate::report::ScanReport;

const SARIF_VERSION: &str = "2.1.0";
const SARIF_SCHEMA: &str =
    "https://raw.githubusercontent.com/oasis-tcs/sarif-spec/master/Schemata/sarif-schema-2.1.0.json";

/// SARIF log (SARIF 2.1.0).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SarifReport {
    /// SARIF schema version.
    pub version: String,
    /// SARIF schema URI.
    #[serde(rename = "$schema")]
    pub schema: String,
    /// One run per invocation.
    pub runs: Vec<SarifRun>,
}

/// A single run of the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SarifRun {
    /// Tool information.
    pub tool: SarifTool,
    /// Results in report order.
    pub results: Vec<SarifResult>,
}

/// Tool information.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SarifTool {
    /// The engine itself.
    pub driver: SarifDriver,
}

/// Tool driver with its rule metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SarifDriver {
    /// Tool name.
    pub name: String,
    /// Tool version.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Information URI.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub information_uri: Option<String>,
    /// Rules referenced by results.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rules: Vec<SarifRule>,
}

/// Rule metadata, one per definition id.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SarifRule {
    /// Definition id.
    pub id: String,
    /// Catalog description.
    pub short_description: SarifMessage,
    /// Catalog category.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, String>,
}

/// A single result.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SarifResult {
    /// Definition id that triggered this result.
    pub rule_id: String,
    /// Result level (note, warning, error).
    pub level: String,
    /// Human-readable message.
    pub message: SarifMessage,
    /// Where the issue was found.
    pub locations: Vec<SarifLocation>,
    /// Stable fingerprints for deduplication across runs.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub partial_fingerprints: BTreeMap<String, String>,
}

/// Message text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SarifMessage {
    /// Text.
    pub text: String,
}

/// Location of a result.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SarifLocation {
    /// Physical location in source code.
    pub physical_location: SarifPhysicalLocation,
}

/// File and line.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SarifPhysicalLocation {
    /// File path.
    pub artifact_location: SarifArtifactLocation,
    /// Line, absent when it could not be resolved.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<SarifRegion>,
}

/// File path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SarifArtifactLocation {
    /// File URI or path.
    pub uri: String,
}

/// Line information.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SarifRegion {
    /// Start line (1-indexed).
    pub start_line: usize,
}

impl SarifReport {
    /// Builds a SARIF log from a report, describing rules from `catalog`.
    #[must_use]
    pub fn from_report(report: &ScanReport, catalog: &VulnerabilityCatalog) -> Self {
        let results: Vec<SarifResult> = report.findings().map(SarifResult::from).collect();

        let mut rules: Vec<SarifRule> = Vec::new();
        for result in &results {
            if rules.iter().any(|r| r.id == result.rule_id) {
                continue;
            }
            let definition = catalog.get(&result.rule_id);
            rules.push(SarifRule {
                id: result.rule_id.clone(),
                short_description: SarifMessage {
                    text: definition
                        .map(|d| d.description.clone())
                        .unwrap_or_else(|| result.message.text.clone()),
                },
                properties: definition
                    .map(|d| BTreeMap::from([("category".to_string(), d.category.to_string())]))
                    .unwrap_or_default(),
            });
        }

        SarifReport {
            version: SARIF_VERSION.to_string(),
            schema: SARIF_SCHEMA.to_string(),
            runs: vec![SarifRun {
                tool: SarifTool {
                    driver: SarifDriver {
                        name: "safecode".to_string(),
                        version: Some(env!("CARGO_PKG_VERSION").to_string()),
                        information_uri: Some(env!("CARGO_PKG_REPOSITORY").to_string()),
                        rules,
                    },
                },
                results,
            }],
        }
    }
}

/// SHA-256 of `path:line:id`, hex encoded.
fn fingerprint(finding: &Finding, rule_id: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(format!("{}:{}:{rule_id}", finding.file_path, finding.line).as_bytes());
    hex::encode(hasher.finalize())
}

impl From<&Finding> for SarifResult {
    fn from(finding: &Finding) -> Self {
        let level = match finding.severity {
            Severity::Critical | Severity::High => "error",
            Severity::Medium => "warning",
            Severity::Low => "note",
        };
        let rule_id = finding
            .definition_id
            .clone()
            .unwrap_or_else(|| finding.rule_id.clone());

        let region = (finding.line != UNKNOWN_LINE).then_some(SarifRegion {
            start_line: finding.line,
        });

        SarifResult {
            level: level.to_string(),
            message: SarifMessage {
                text: finding.message.clone(),
            },
            locations: vec![SarifLocation {
                physical_location: SarifPhysicalLocation {
                    artifact_location: SarifArtifactLocation {
                        uri: finding.file_path.clone(),
                    },
                    region,
                },
            }],
            partial_fingerprints: BTreeMap::from([(
                "primaryLocationLineHash".to_string(),
                fingerprint(finding, &rule_id),
            )]),
            rule_id,
        }
    }
}
