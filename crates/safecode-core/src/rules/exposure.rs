// SPDX-License-Identifier: Apache-2.0

//! Sensitive data exposure detection.

use super::{DetectorRule, Hit, collect, contains_any, is_logging_call, literal_entries};
use crate::Result;
use crate::finding::{Confidence, Finding};
use crate::session::ScanSession;
use crate::syntax::{NodeId, NodeKind, SyntaxTree, Visitor, walk};

const SENSITIVE_KEYWORDS: &[&str] = &["password", "secret", "key", "token", "credential"];

/// Composite sensitive data exposure rule (701, 702).
///
/// Hardcoded values are reported at most once per file per session.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExposureRule;

impl DetectorRule for ExposureRule {
    fn id(&self) -> &'static str {
        "exposure"
    }

    fn name(&self) -> &'static str {
        "Sensitive Data Exposure"
    }

    fn definition_ids(&self) -> &'static [&'static str] {
        &["701", "702"]
    }

    fn scan(&self, tree: &SyntaxTree, session: &ScanSession<'_>) -> Result<Vec<Finding>> {
        if tree.language().is_key_value() {
            if !session.first_visit(self.id(), tree.path()) {
                return Ok(Vec::new());
            }
            return hardcoded_entries(tree)
                .into_iter()
                .map(|(line, key)| {
                    Ok(session
                        .finding_at_line(tree, line, "702")?
                        .with_message(format!("Hardcoded sensitive information detected: {key}"))
                        .with_confidence(Confidence::Low)
                        .textual())
                })
                .collect();
        }

        let mut visitor = ExposureVisitor {
            hardcoded: session.first_visit(self.id(), tree.path()),
            hits: Vec::new(),
        };
        walk(tree, &mut visitor);
        collect(tree, session, visitor.hits)
    }
}

struct ExposureVisitor {
    hardcoded: bool,
    hits: Vec<Hit>,
}

impl Visitor for ExposureVisitor {
    fn visit_call(&mut self, tree: &SyntaxTree, id: NodeId) {
        self.hits.extend(logged_sensitive_data(tree, id));
    }

    fn visit_field(&mut self, tree: &SyntaxTree, id: NodeId) {
        if self.hardcoded {
            self.hits.extend(hardcoded_field(tree, id));
        }
    }

    fn visit_assignment(&mut self, tree: &SyntaxTree, id: NodeId) {
        if self.hardcoded {
            self.hits.extend(hardcoded_assignment(tree, id));
        }
    }
}

/// Logging call with an operand that names or contains a secret.
pub(crate) fn logged_sensitive_data(tree: &SyntaxTree, call: NodeId) -> Option<Hit> {
    if !is_logging_call(tree, call) {
        return None;
    }
    tree.arguments(call)
        .any(|arg| is_sensitive_operand(tree, arg))
        .then(|| Hit::structural(call, "701", "Sensitive data is logged."))
}

fn is_sensitive_operand(tree: &SyntaxTree, id: NodeId) -> bool {
    let node = tree.node(id);
    match node.kind {
        NodeKind::Literal => node
            .string_value()
            .is_some_and(|s| contains_any(s, SENSITIVE_KEYWORDS)),
        NodeKind::Reference => contains_any(node.name(), SENSITIVE_KEYWORDS),
        NodeKind::Binary => tree
            .children(id)
            .iter()
            .any(|&child| is_sensitive_operand(tree, child)),
        _ => false,
    }
}

/// Field with a sensitive name initialized from a string literal.
pub(crate) fn hardcoded_field(tree: &SyntaxTree, field: NodeId) -> Option<Hit> {
    let name = tree.name(field);
    let init = tree.initializer(field)?;
    if tree.node(init).string_value().is_none() || !contains_any(name, SENSITIVE_KEYWORDS) {
        return None;
    }
    Some(hardcoded_hit(field, name))
}

/// Assignment of a string literal to a sensitive name.
pub(crate) fn hardcoded_assignment(tree: &SyntaxTree, assignment: NodeId) -> Option<Hit> {
    let &[target, value] = tree.children(assignment) else {
        return None;
    };
    let name = tree.text(target);
    if tree.node(value).string_value().is_none() || !contains_any(name, SENSITIVE_KEYWORDS) {
        return None;
    }
    Some(hardcoded_hit(assignment, name))
}

/// `(line, key)` of every properties or YAML key ending in a sensitive
/// keyword and assigned a literal value.
pub(crate) fn hardcoded_entries(tree: &SyntaxTree) -> Vec<(usize, String)> {
    literal_entries(tree)
        .filter(|entry| {
            let key = entry.key.to_ascii_lowercase();
            SENSITIVE_KEYWORDS.iter().any(|k| key.ends_with(k))
        })
        .map(|entry| (entry.line, entry.key.to_string()))
        .collect()
}

fn hardcoded_hit(node: NodeId, name: &str) -> Hit {
    Hit::textual(
        node,
        "702",
        format!(
            "Hardcoded sensitive information detected for variable: {}",
            name.to_ascii_lowercase()
        ),
    )
}
