// SPDX-License-Identifier: Apache-2.0

//! Finding types and data structures.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::catalog::PerformanceImpactEntry;

/// Line reported when a node's location cannot be resolved.
///
/// Lines are 1-indexed, so `0` never collides with a real location.
pub const UNKNOWN_LINE: usize = 0;

/// Severity level of a finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Critical issue requiring immediate attention.
    Critical,
    /// High severity issue that should be addressed soon.
    High,
    /// Medium severity issue.
    #[default]
    Medium,
    /// Low severity issue or informational finding.
    Low,
}

impl Severity {
    fn rank(self) -> u8 {
        match self {
            Severity::Critical => 3,
            Severity::High => 2,
            Severity::Medium => 1,
            Severity::Low => 0,
        }
    }

    /// Returns the more severe of `self` and `other`.
    #[must_use]
    pub fn at_least(self, other: Severity) -> Severity {
        if other.rank() > self.rank() {
            other
        } else {
            self
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Severity::Critical => "critical",
            Severity::High => "high",
            Severity::Medium => "medium",
            Severity::Low => "low",
        };
        f.write_str(s)
    }
}

/// Confidence level of a finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    /// High confidence - very likely a real issue.
    High,
    /// Medium confidence - may require manual review.
    #[default]
    Medium,
    /// Low confidence - may be a false positive.
    Low,
}

/// What a detector matched on.
///
/// `Textual` findings come from substring or keyword heuristics over source
/// text and are not semantic proof.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MatchBasis {
    /// Node kinds, resolved types and declarations.
    #[default]
    Structural,
    /// Substring or keyword match on node text.
    Textual,
}

/// Issue category, serialized as the catalog's `type` value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Category {
    /// SQL / query injection.
    SqlInjection,
    /// Missing authorization on endpoints.
    BrokenAccessControl,
    /// Credential and session weaknesses.
    BrokenAuthentication,
    /// Unsafe object deserialization.
    InsecureDeserialization,
    /// Missing or unsafe logging.
    InsufficientLogging,
    /// Insecure framework or file configuration.
    SecurityMisconfiguration,
    /// Secrets in code or logs.
    SensitiveDataExposure,
    /// Regulatory compliance violation.
    ComplianceViolation,
    /// Anything else.
    #[default]
    Other,
}

impl Category {
    /// Snake-case key used in configuration maps.
    #[must_use]
    pub fn key(self) -> &'static str {
        match self {
            Category::SqlInjection => "sql_injection",
            Category::BrokenAccessControl => "broken_access_control",
            Category::BrokenAuthentication => "broken_authentication",
            Category::InsecureDeserialization => "insecure_deserialization",
            Category::InsufficientLogging => "insufficient_logging",
            Category::SecurityMisconfiguration => "security_misconfiguration",
            Category::SensitiveDataExposure => "sensitive_data_exposure",
            Category::ComplianceViolation => "compliance_violation",
            Category::Other => "other",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// A reported issue with location and remediation metadata.
///
/// Serialized in camelCase, which is the shape the recommendation service
/// consumes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Finding {
    /// Human-readable description of the issue.
    #[serde(default)]
    pub message: String,
    /// File path where the finding was detected.
    #[serde(default)]
    pub file_path: String,
    /// Line number in the file (1-indexed, [`UNKNOWN_LINE`] when unresolved).
    #[serde(default)]
    pub line: usize,
    /// Issue category.
    #[serde(default)]
    pub category: Category,
    /// Severity level.
    #[serde(default)]
    pub severity: Severity,
    /// Confidence level.
    #[serde(default)]
    pub confidence: Confidence,
    /// Whether the match is structural or a textual heuristic.
    #[serde(default)]
    pub basis: MatchBasis,
    /// Whether this is a compliance finding.
    #[serde(default)]
    pub is_compliance: bool,
    /// Regime the compliance finding belongs to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compliance_regime: Option<String>,
    /// Vulnerability catalog id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub definition_id: Option<String>,
    /// Id of the rule that emitted the finding.
    #[serde(default)]
    pub rule_id: String,
    /// Remediation guidance.
    #[serde(default)]
    pub recommendations: Vec<String>,
    /// Estimated cost of remediation.
    #[serde(default)]
    pub performance_impacts: Vec<PerformanceImpactEntry>,
    /// Reconstructed code the finding refers to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code_fragment: Option<String>,
}

impl Finding {
    /// Sets the message.
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Overrides the policy severity for this heuristic.
    #[must_use]
    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    /// Sets the confidence.
    #[must_use]
    pub fn with_confidence(mut self, confidence: Confidence) -> Self {
        self.confidence = confidence;
        self
    }

    /// Marks the finding as coming from a textual heuristic.
    #[must_use]
    pub fn textual(mut self) -> Self {
        self.basis = MatchBasis::Textual;
        self
    }

    /// Attaches the code fragment the finding refers to.
    #[must_use]
    pub fn with_code_fragment(mut self, fragment: impl Into<String>) -> Self {
        self.code_fragment = Some(fragment.into());
        self
    }

    /// Parses the definition id as the integer key used by the
    /// recommendation service.
    #[must_use]
    pub fn numeric_definition_id(&self) -> Option<u32> {
        self.definition_id.as_deref()?.trim().parse().ok()
    }
}
