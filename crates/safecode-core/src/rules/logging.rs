// SPDX-License-Identifier: Apache-2.0

//! Insufficient logging and monitoring detection.
//!
//! The four checks are independent: one method may be both sensitive and
//! administrative, and a logging call inside it may also leak data.

use super::{DetectorRule, Hit, collect, contains_any, is_logging_call};
use crate::Result;
use crate::finding::{Confidence, Finding};
use crate::session::ScanSession;
use crate::syntax::{NodeId, NodeKind, SyntaxTree, Visitor, walk};

const SENSITIVE_OPERATIONS: &[&str] = &[
    "login",
    "logout",
    "changepassword",
    "accesssensitivedata",
    "viewmedicalrecord",
    "updatemedicalrecord",
    "deletemedicalrecord",
    "scheduleappointment",
    "cancelappointment",
    "prescribemedication",
    "viewlabresults",
    "updatelabresults",
    "accesspatientdata",
    "getpatientdata",
    "transferfunds",
    "viewaccountbalance",
    "updateaccountdetails",
    "processpayment",
    "refundpayment",
    "applyforloan",
    "approveloan",
    "rejectloan",
    "viewtransactionhistory",
    "downloadstatement",
    "updatecreditcardinfo",
];

const ADMIN_ACTIONS: &[&str] = &[
    "createuser",
    "deleteuser",
    "updateuserrole",
    "resetpassword",
    "deactivateuser",
    "adduser",
    "removeuser",
    "assignrole",
    "revokerole",
    "managepermissions",
    "activateaccount",
    "suspendaccount",
    "unlockaccount",
    "changeusersettings",
];

const ERROR_LEVELS: &[&str] = &["error", "warn"];
const LEAKED_KEYWORDS: &[&str] = &["password", "token", "creditcard"];

/// Composite insufficient logging rule (516-519).
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingRule;

impl DetectorRule for LoggingRule {
    fn id(&self) -> &'static str {
        "logging"
    }

    fn name(&self) -> &'static str {
        "Insufficient Logging & Monitoring"
    }

    fn definition_ids(&self) -> &'static [&'static str] {
        &["516", "517", "518", "519"]
    }

    fn scan(&self, tree: &SyntaxTree, session: &ScanSession<'_>) -> Result<Vec<Finding>> {
        let mut visitor = LoggingVisitor::default();
        walk(tree, &mut visitor);
        collect(tree, session, visitor.hits)
    }
}

#[derive(Default)]
struct LoggingVisitor {
    hits: Vec<Hit>,
}

impl Visitor for LoggingVisitor {
    fn visit_method(&mut self, tree: &SyntaxTree, id: NodeId) {
        self.hits.extend(unlogged_sensitive_operation(tree, id));
        self.hits.extend(unlogged_admin_action(tree, id));
    }

    fn visit_catch(&mut self, tree: &SyntaxTree, id: NodeId) {
        self.hits.extend(silent_catch(tree, id));
    }

    fn visit_call(&mut self, tree: &SyntaxTree, id: NodeId) {
        self.hits.extend(insecure_logging(tree, id));
    }
}

/// Whether any logging call appears under `id`, optionally restricted to
/// given levels.
fn has_logging(tree: &SyntaxTree, id: NodeId, levels: Option<&[&str]>) -> bool {
    tree.descendants(id).any(|d| {
        is_logging_call(tree, d) && levels.is_none_or(|l| l.contains(&tree.name(d)))
    })
}

/// Sensitive operation whose body never logs.
pub(crate) fn unlogged_sensitive_operation(tree: &SyntaxTree, method: NodeId) -> Option<Hit> {
    let name = tree.name(method);
    if !contains_any(name, SENSITIVE_OPERATIONS) || has_logging(tree, method, None) {
        return None;
    }
    Some(Hit::textual(
        method,
        "516",
        format!("Sensitive operation '{name}' is not logged"),
    ))
}

/// Administrative action whose body never logs.
pub(crate) fn unlogged_admin_action(tree: &SyntaxTree, method: NodeId) -> Option<Hit> {
    let name = tree.name(method);
    if !contains_any(name, ADMIN_ACTIONS) || has_logging(tree, method, None) {
        return None;
    }
    Some(Hit::textual(
        method,
        "519",
        format!("Administrative action '{name}' is not logged"),
    ))
}

/// Catch clause without an error- or warn-level log call.
pub(crate) fn silent_catch(tree: &SyntaxTree, catch: NodeId) -> Option<Hit> {
    if tree.kind(catch) != NodeKind::Catch || has_logging(tree, catch, Some(ERROR_LEVELS)) {
        return None;
    }
    let exception = tree
        .parameters(catch)
        .next()
        .and_then(|p| tree.node(p).type_name.as_deref())
        .unwrap_or("exception");
    Some(
        Hit::structural(
            catch,
            "517",
            format!("Caught {exception} is not logged at error or warn level"),
        )
        .with_confidence(Confidence::High),
    )
}

/// Logging call whose arguments mention secrets.
pub(crate) fn insecure_logging(tree: &SyntaxTree, call: NodeId) -> Option<Hit> {
    if !is_logging_call(tree, call) {
        return None;
    }
    let leaks = tree
        .arguments(call)
        .any(|arg| contains_any(tree.text(arg), LEAKED_KEYWORDS));
    leaks.then(|| Hit::textual(call, "518", "Sensitive data may be written to logs"))
}
