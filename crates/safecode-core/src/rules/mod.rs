// SPDX-License-Identifier: Apache-2.0

//! Detector rules.
//!
//! Each rule is a stateless coordinator over small sub-detectors. Sub-detectors
//! inspect one node and return a [`Hit`]; the rule's visitor collects hits and
//! [`collect`] turns them into catalog-backed findings.

pub mod access_control;
pub mod authentication;
pub mod deserialization;
pub mod exposure;
pub mod hipaa;
pub mod injection;
pub mod logging;
pub mod misconfiguration;

pub use access_control::AccessControlRule;
pub use authentication::AuthenticationRule;
pub use deserialization::DeserializationRule;
pub use exposure::ExposureRule;
pub use hipaa::HipaaRule;
pub use injection::InjectionRule;
pub use logging::LoggingRule;
pub use misconfiguration::MisconfigurationRule;

use std::sync::LazyLock;

use regex::Regex;

use crate::Result;
use crate::finding::{Confidence, Finding, MatchBasis};
use crate::session::ScanSession;
use crate::syntax::{NodeId, NodeKind, SyntaxTree};

/// A detector over one file's syntax tree.
pub trait DetectorRule: Send + Sync {
    /// Stable rule identifier (e.g., `"injection"`).
    fn id(&self) -> &'static str;

    /// Human-readable rule name.
    fn name(&self) -> &'static str;

    /// Every definition id this rule can emit.
    ///
    /// The registry checks each against the catalogs before any scan runs.
    fn definition_ids(&self) -> &'static [&'static str];

    /// Compliance regime this rule belongs to, if any.
    ///
    /// Rules with a regime only run when the project declares it.
    fn compliance_regime(&self) -> Option<&'static str> {
        None
    }

    /// Scans one tree. Must not mutate anything outside the session.
    ///
    /// # Errors
    ///
    /// Returns an error if a finding cannot be built; the engine logs it and
    /// skips this rule for this file.
    fn scan(&self, tree: &SyntaxTree, session: &ScanSession<'_>) -> Result<Vec<Finding>>;
}

/// Every built-in rule in scan order.
#[must_use]
pub fn standard_rules() -> Vec<Box<dyn DetectorRule>> {
    vec![
        Box::new(InjectionRule),
        Box::new(AuthenticationRule),
        Box::new(AccessControlRule),
        Box::new(DeserializationRule),
        Box::new(LoggingRule),
        Box::new(MisconfigurationRule),
        Box::new(ExposureRule),
        Box::new(HipaaRule),
    ]
}

/// A sub-detector match waiting to become a finding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hit {
    /// Node the finding is reported at.
    pub node: NodeId,
    /// Catalog definition id.
    pub definition_id: &'static str,
    /// Finding message.
    pub message: String,
    /// How sure the heuristic is.
    pub confidence: Confidence,
    /// Structural or textual match.
    pub basis: MatchBasis,
    /// Optional code fragment.
    pub fragment: Option<String>,
}

impl Hit {
    /// A match on tree shape or resolved types.
    pub fn structural(
        node: NodeId,
        definition_id: &'static str,
        message: impl Into<String>,
    ) -> Self {
        Self {
            node,
            definition_id,
            message: message.into(),
            confidence: Confidence::Medium,
            basis: MatchBasis::Structural,
            fragment: None,
        }
    }

    /// A substring or keyword match.
    pub fn textual(node: NodeId, definition_id: &'static str, message: impl Into<String>) -> Self {
        Self {
            basis: MatchBasis::Textual,
            confidence: Confidence::Low,
            ..Self::structural(node, definition_id, message)
        }
    }

    /// Overrides the confidence.
    #[must_use]
    pub fn with_confidence(mut self, confidence: Confidence) -> Self {
        self.confidence = confidence;
        self
    }

    /// Attaches a code fragment.
    #[must_use]
    pub fn with_fragment(mut self, fragment: impl Into<String>) -> Self {
        self.fragment = Some(fragment.into());
        self
    }

    /// Builds the finding through the session's catalog.
    pub fn into_finding(self, tree: &SyntaxTree, session: &ScanSession<'_>) -> Result<Finding> {
        let mut finding = session
            .finding(tree, self.node, self.definition_id)?
            .with_message(self.message)
            .with_confidence(self.confidence);
        finding.basis = self.basis;
        finding.code_fragment = self.fragment;
        Ok(finding)
    }
}

/// Converts hits into findings, preserving order.
pub fn collect(
    tree: &SyntaxTree,
    session: &ScanSession<'_>,
    hits: Vec<Hit>,
) -> Result<Vec<Finding>> {
    hits.into_iter()
        .map(|hit| hit.into_finding(tree, session))
        .collect()
}

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error", "fatal"];

/// Whether a call is `<logger>.<level>(...)`.
pub(crate) fn is_logging_call(tree: &SyntaxTree, call: NodeId) -> bool {
    tree.kind(call) == NodeKind::Call
        && LOG_LEVELS.contains(&tree.name(call))
        && tree
            .receiver(call)
            .is_some_and(|r| tree.text(r).to_ascii_lowercase().contains("log"))
}

/// Case-insensitive substring match against lowercase keywords.
pub(crate) fn contains_any(text: &str, keywords: &[&str]) -> bool {
    let lower = text.to_ascii_lowercase();
    keywords.iter().any(|k| lower.contains(k))
}

/// Operands of a (possibly nested) `+` expression, flattened left to right.
///
/// Any other expression is its own single operand.
pub(crate) fn concat_operands(tree: &SyntaxTree, expr: NodeId) -> Vec<NodeId> {
    let node = tree.node(expr);
    if node.kind == NodeKind::Binary && node.operator.as_deref() == Some("+") {
        tree.children(expr)
            .iter()
            .flat_map(|&child| concat_operands(tree, child))
            .collect()
    } else {
        vec![expr]
    }
}

/// Whether `expr` is a `+` expression producing a string.
///
/// Numeric addition (`1 + id`) is not a string concatenation.
pub(crate) fn is_string_concatenation(tree: &SyntaxTree, expr: NodeId) -> bool {
    let node = tree.node(expr);
    node.kind == NodeKind::Binary
        && node.operator.as_deref() == Some("+")
        && (node.is_string_typed()
            || concat_operands(tree, expr)
                .iter()
                .any(|&o| tree.node(o).is_string_typed()))
}

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{[^}]*\}").expect("placeholder pattern is valid"));

/// Key of one `key=value` or `key: value` line of a properties or YAML file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct KeyValueEntry<'a> {
    /// 1-based line number.
    pub line: usize,
    pub key: &'a str,
}

/// Entries of a key-value file that carry a literal value.
///
/// `#` and `!` comments, empty values and `${...}` placeholders are skipped.
pub(crate) fn literal_entries(tree: &SyntaxTree) -> impl Iterator<Item = KeyValueEntry<'_>> {
    tree.source()
        .lines()
        .enumerate()
        .filter_map(|(index, line)| {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with('!') {
                return None;
            }

            let split = line.find(['=', ':'])?;
            let key = line[..split].trim();
            let value = line[split + 1..]
                .trim()
                .trim_matches(|c| c == '"' || c == '\'');

            if value.is_empty() || PLACEHOLDER.is_match(value) {
                return None;
            }
            Some(KeyValueEntry {
                line: index + 1,
                key,
            })
        })
}
