// SPDX-License-Identifier: Apache-2.0

//! Broken authentication detection.

use std::sync::LazyLock;

use regex::Regex;

use super::{DetectorRule, Hit, collect, contains_any};
use crate::Result;
use crate::finding::{Confidence, Finding};
use crate::session::ScanSession;
use crate::syntax::{NodeId, NodeKind, SyntaxTree, Visitor, walk};

const CREDENTIAL_KEYWORDS: &[&str] = &["password", "username", "key", "secret"];
const PASSWORD_KEYWORDS: &[&str] = &["password", "pwd"];
const PROTECTION_KEYWORDS: &[&str] = &["encode", "encrypt", "hash"];
const MAX_WEAK_LENGTH: u32 = 8;
const MIN_HMAC_KEY_LENGTH: usize = 32;

static LENGTH_CHECK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"length\s*(?:\(\s*\))?\s*<\s*(\d+)").expect("length check pattern is valid")
});

/// Composite broken authentication rule (307-311).
#[derive(Debug, Clone, Copy, Default)]
pub struct AuthenticationRule;

impl DetectorRule for AuthenticationRule {
    fn id(&self) -> &'static str {
        "authentication"
    }

    fn name(&self) -> &'static str {
        "Broken Authentication"
    }

    fn definition_ids(&self) -> &'static [&'static str] {
        &["307", "308", "309", "310", "311"]
    }

    fn scan(&self, tree: &SyntaxTree, session: &ScanSession<'_>) -> Result<Vec<Finding>> {
        let mut visitor = AuthenticationVisitor::default();
        walk(tree, &mut visitor);
        collect(tree, session, visitor.hits)
    }
}

#[derive(Default)]
struct AuthenticationVisitor {
    hits: Vec<Hit>,
}

impl Visitor for AuthenticationVisitor {
    fn visit_assignment(&mut self, tree: &SyntaxTree, id: NodeId) {
        self.hits.extend(hardcoded_credential(tree, id));
    }

    fn visit_method(&mut self, tree: &SyntaxTree, id: NodeId) {
        self.hits.extend(weak_password_policy(tree, id));
    }

    fn visit_call(&mut self, tree: &SyntaxTree, id: NodeId) {
        self.hits.extend(plaintext_password_storage(tree, id));
        self.hits.extend(session_fixation(tree, id));
        self.hits.extend(weak_jwt_signing(tree, id));
    }
}

/// Non-empty string literal assigned to a credential-named or string target.
pub(crate) fn hardcoded_credential(tree: &SyntaxTree, assignment: NodeId) -> Option<Hit> {
    let &[target, value] = tree.children(assignment) else {
        return None;
    };
    let literal = tree.node(value).string_value()?;
    if literal.is_empty() {
        return None;
    }

    let target_text = tree.text(target);
    let named = contains_any(target_text, CREDENTIAL_KEYWORDS);
    if !named && !tree.node(target).is_string_typed() {
        return None;
    }

    let confidence = if named {
        Confidence::Medium
    } else {
        Confidence::Low
    };
    Some(
        Hit::textual(
            assignment,
            "307",
            format!("Hardcoded credential detected in '{target_text}'"),
        )
        .with_confidence(confidence),
    )
}

/// Password validator with a weak length bound, no complexity check, or a
/// naive comparison. Inspected textually.
pub(crate) fn weak_password_policy(tree: &SyntaxTree, method: NodeId) -> Option<Hit> {
    if !tree.name(method).to_ascii_lowercase().contains("validatepassword") {
        return None;
    }
    let body = tree.text(tree.body(method)?).to_ascii_lowercase();

    let weak_length = LENGTH_CHECK
        .captures_iter(&body)
        .any(|c| c[1].parse::<u32>().is_ok_and(|bound| bound <= MAX_WEAK_LENGTH));
    let no_complexity = !body.contains("matches") || !body.contains("regex");
    let naive = body.contains("password.equals") || body.contains("password.contains");

    let reason = if weak_length {
        "weak minimum length"
    } else if no_complexity {
        "no complexity check"
    } else if naive {
        "naive comparison"
    } else {
        return None;
    };

    Some(Hit::textual(
        method,
        "308",
        format!(
            "Weak password policy detected in '{}' ({reason})",
            tree.name(method)
        ),
    ))
}

/// Password setter or saver storing a literal password without protection.
pub(crate) fn plaintext_password_storage(tree: &SyntaxTree, call: NodeId) -> Option<Hit> {
    let name = tree.name(call).to_ascii_lowercase();
    if !name.contains("setpassword") && !name.contains("savepassword") {
        return None;
    }
    if contains_any(tree.text(call), PROTECTION_KEYWORDS) {
        return None;
    }

    let hardcoded = tree
        .arguments(call)
        .any(|arg| is_password_literal(tree, arg) || is_password_variable(tree, arg));

    hardcoded.then(|| {
        Hit::structural(
            call,
            "309",
            format!("Plaintext password storage detected in '{}'", tree.name(call)),
        )
    })
}

fn is_password_literal(tree: &SyntaxTree, id: NodeId) -> bool {
    tree.node(id)
        .string_value()
        .is_some_and(|s| contains_any(s, PASSWORD_KEYWORDS))
}

/// A reference whose declaration is initialized from a password literal.
fn is_password_variable(tree: &SyntaxTree, id: NodeId) -> bool {
    let node = tree.node(id);
    node.kind == NodeKind::Reference
        && node
            .declaration
            .and_then(|decl| tree.initializer(decl))
            .is_some_and(|init| is_password_literal(tree, init))
}

/// Session attribute written without regenerating the session.
pub(crate) fn session_fixation(tree: &SyntaxTree, call: NodeId) -> Option<Hit> {
    if !tree.name(call).eq_ignore_ascii_case("setAttribute") {
        return None;
    }
    let receiver = tree.receiver(call)?;
    if !tree.text(receiver).to_ascii_lowercase().contains("session") {
        return None;
    }
    Some(Hit::textual(
        call,
        "310",
        "Potential session fixation detected. Regenerate session IDs after login.",
    ))
}

/// `signWith` using HS256 with a short literal key.
pub(crate) fn weak_jwt_signing(tree: &SyntaxTree, call: NodeId) -> Option<Hit> {
    if tree.name(call) != "signWith" {
        return None;
    }
    let args: Vec<NodeId> = tree.arguments(call).collect();
    if !args.iter().any(|&a| tree.text(a).contains("HS256")) {
        return None;
    }

    let short_key = args
        .iter()
        .flat_map(|&a| tree.subtree(a))
        .filter_map(|id| tree.node(id).string_value())
        .any(|key| key.chars().count() < MIN_HMAC_KEY_LENGTH);

    short_key.then(|| {
        Hit::textual(
            call,
            "311",
            "Weak JWT signing detected. Use a key of at least 256 bits.",
        )
        .with_confidence(Confidence::Medium)
    })
}
