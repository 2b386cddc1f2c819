// SPDX-License-Identifier: Apache-2.0

//! SQL injection detection.

use super::{DetectorRule, Hit, collect, concat_operands, is_string_concatenation};
use crate::Result;
use crate::finding::{Confidence, Finding};
use crate::session::ScanSession;
use crate::syntax::{LiteralValue, NodeId, NodeKind, SyntaxTree, Visitor, names_match, walk};

const EXECUTE_METHODS: &[&str] = &["executeQuery", "executeUpdate", "executeLargeUpdate"];
const PARAMETERIZED_TYPES: &[&str] = &["java.sql.PreparedStatement", "java.sql.CallableStatement"];
const SQL_KEYWORDS: &[&str] = &["select", "insert", "update", "delete", "call", "from", "where"];
const STORED_PROCEDURE_METHODS: &[&str] =
    &["prepareCall", "createNativeQuery", "createStoredProcedureQuery"];
const QUERY_METHODS: &[&str] = &[
    "createQuery",
    "createNativeQuery",
    "createSQLQuery",
    "getCriteriaBuilder",
];
const QUERY_ANNOTATION: &str = "org.springframework.data.jpa.repository.Query";

/// Composite SQL injection rule (101-107).
#[derive(Debug, Clone, Copy, Default)]
pub struct InjectionRule;

impl DetectorRule for InjectionRule {
    fn id(&self) -> &'static str {
        "injection"
    }

    fn name(&self) -> &'static str {
        "SQL Injection"
    }

    fn definition_ids(&self) -> &'static [&'static str] {
        &["101", "102", "103", "104", "105", "106", "107"]
    }

    fn scan(&self, tree: &SyntaxTree, session: &ScanSession<'_>) -> Result<Vec<Finding>> {
        let mut visitor = InjectionVisitor::default();
        walk(tree, &mut visitor);
        collect(tree, session, visitor.hits)
    }
}

#[derive(Default)]
struct InjectionVisitor {
    hits: Vec<Hit>,
}

impl Visitor for InjectionVisitor {
    fn visit_call(&mut self, tree: &SyntaxTree, id: NodeId) {
        self.hits.extend(classic_injection(tree, id));
        self.hits.extend(batch_execution(tree, id));

        match stored_procedure(tree, id) {
            Some(hit) => self.hits.push(hit),
            None => self.hits.extend(query_concatenation(tree, id)),
        }

        self.hits.extend(named_query(tree, id));
    }

    fn visit_local_variable(&mut self, tree: &SyntaxTree, id: NodeId) {
        self.hits.extend(dynamic_query(tree, id));
    }

    fn visit_annotation(&mut self, tree: &SyntaxTree, id: NodeId) {
        self.hits.extend(native_query(tree, id));
    }
}

/// Execute-style call on a receiver that is not a parameterized statement.
pub(crate) fn classic_injection(tree: &SyntaxTree, call: NodeId) -> Option<Hit> {
    let name = tree.name(call);
    if !EXECUTE_METHODS.contains(&name) {
        return None;
    }

    let receiver = tree.receiver(call)?;
    let receiver_type = tree.node(receiver).type_name.as_deref();
    if receiver_type.is_some_and(|t| PARAMETERIZED_TYPES.iter().any(|p| names_match(t, p))) {
        return None;
    }

    // An unresolved receiver might still be a prepared statement.
    let confidence = if receiver_type.is_some() {
        Confidence::High
    } else {
        Confidence::Medium
    };

    Some(
        Hit::structural(
            call,
            "101",
            format!("Potential SQL Injection detected in '{name}' (Classic SQLi)"),
        )
        .with_confidence(confidence),
    )
}

/// `addBatch` calls.
pub(crate) fn batch_execution(tree: &SyntaxTree, call: NodeId) -> Option<Hit> {
    (tree.name(call) == "addBatch").then(|| {
        Hit::structural(
            call,
            "102",
            "Batch SQL execution via 'addBatch' may combine unvalidated statements",
        )
        .with_confidence(Confidence::Low)
    })
}

/// String variable initialized from a concatenation that looks like SQL.
pub(crate) fn dynamic_query(tree: &SyntaxTree, variable: NodeId) -> Option<Hit> {
    if !tree.node(variable).is_string_typed() {
        return None;
    }
    let init = tree.initializer(variable)?;
    if !is_string_concatenation(tree, init) {
        return None;
    }

    let operands = concat_operands(tree, init);
    if operands.iter().all(|&o| tree.kind(o) == NodeKind::Literal) {
        return None;
    }

    let literal_text: Vec<&str> = operands
        .iter()
        .filter_map(|&o| tree.node(o).string_value())
        .collect();
    if !has_sql_keyword(&literal_text.join(" ")) {
        return None;
    }

    let query: String = operands
        .iter()
        .map(|&o| tree.node(o).string_value().unwrap_or(tree.text(o)))
        .collect();

    Some(
        Hit::textual(
            variable,
            "103",
            format!(
                "Dynamic SQL query detected in string variable: {}",
                tree.name(variable)
            ),
        )
        .with_fragment(query),
    )
}

fn has_sql_keyword(text: &str) -> bool {
    text.split(|c: char| !c.is_ascii_alphanumeric())
        .any(|word| SQL_KEYWORDS.iter().any(|k| word.eq_ignore_ascii_case(k)))
}

/// Stored-procedure call whose `CALL` literal is concatenated with a string.
pub(crate) fn stored_procedure(tree: &SyntaxTree, call: NodeId) -> Option<Hit> {
    let name = tree.name(call);
    if !STORED_PROCEDURE_METHODS.contains(&name) {
        return None;
    }

    let dynamic = tree.arguments(call).any(|arg| {
        if !is_string_concatenation(tree, arg) {
            return false;
        }
        let operands = concat_operands(tree, arg);
        let has_marker = operands.iter().any(|&o| {
            tree.node(o)
                .string_value()
                .is_some_and(|s| s.to_ascii_uppercase().contains("CALL"))
        });
        let has_input = operands.iter().any(|&o| {
            let node = tree.node(o);
            node.kind != NodeKind::Literal && node.is_string_typed()
        });
        has_marker && has_input
    });

    dynamic.then(|| {
        Hit::textual(
            call,
            "104",
            format!("Stored procedure call built by string concatenation in '{name}'"),
        )
    })
}

/// Query-builder call whose argument is a string concatenation.
pub(crate) fn query_concatenation(tree: &SyntaxTree, call: NodeId) -> Option<Hit> {
    let name = tree.name(call);
    if !QUERY_METHODS.contains(&name) {
        return None;
    }

    let concatenated = tree.arguments(call).any(|arg| {
        is_string_concatenation(tree, arg)
            && concat_operands(tree, arg)
                .iter()
                .any(|&o| tree.kind(o) != NodeKind::Literal)
    });

    concatenated.then(|| {
        Hit::structural(
            call,
            "106",
            format!("Concatenated query string passed to '{name}'"),
        )
        .with_confidence(Confidence::High)
    })
}

/// `@Query(nativeQuery = true)` with positional parameters, reported at the
/// annotated method.
pub(crate) fn native_query(tree: &SyntaxTree, annotation: NodeId) -> Option<Hit> {
    if !names_match(tree.name(annotation), QUERY_ANNOTATION) {
        return None;
    }

    let native = tree.annotation_attribute(annotation, "nativeQuery")?;
    let is_native = matches!(tree.node(native).literal, Some(LiteralValue::Boolean(true)))
        || tree.text(native).trim() == "true";
    if !is_native {
        return None;
    }

    let value = tree.annotation_attribute(annotation, "value")?;
    if !tree.text(value).contains('?') {
        return None;
    }

    let method = tree
        .parent(annotation)
        .filter(|&p| tree.kind(p) == NodeKind::Method)?;

    Some(Hit::textual(
        method,
        "105",
        format!(
            "Potential SQL Injection detected in native @Query on '{}'",
            tree.name(method)
        ),
    ))
}

/// `createNamedQuery` whose result later binds an unvalidated parameter.
///
/// The query is either chained directly into `setParameter` or held in a
/// variable; in the latter case every reference to the variable is searched
/// before concluding.
pub(crate) fn named_query(tree: &SyntaxTree, call: NodeId) -> Option<Hit> {
    if tree.name(call) != "createNamedQuery" {
        return None;
    }

    let chained = receiver_chain(tree, call).any(|c| is_unvalidated_binding(tree, c));
    let bound = chained
        || query_variable(tree, call).is_some_and(|decl| {
            tree.references_to(decl)
                .into_iter()
                .any(|r| receiver_chain(tree, r).any(|c| is_unvalidated_binding(tree, c)))
        });

    bound.then(|| {
        Hit::structural(
            call,
            "107",
            "Named query parameters are bound from unvalidated values",
        )
        .with_confidence(Confidence::Low)
    })
}

/// Calls chained onto `start` (`start.a().b()` yields `a`, then `b`).
fn receiver_chain(tree: &SyntaxTree, start: NodeId) -> impl Iterator<Item = NodeId> + '_ {
    std::iter::successors(chained_call(tree, start), move |&c| chained_call(tree, c))
}

fn chained_call(tree: &SyntaxTree, id: NodeId) -> Option<NodeId> {
    tree.parent(id)
        .filter(|&p| tree.kind(p) == NodeKind::Call && tree.receiver(p) == Some(id))
}

/// Declaration the named query is stored into, if any.
fn query_variable(tree: &SyntaxTree, call: NodeId) -> Option<NodeId> {
    let parent = tree.parent(call)?;
    match tree.kind(parent) {
        NodeKind::LocalVariable | NodeKind::Field => Some(parent),
        NodeKind::Assignment => match tree.children(parent) {
            &[target, value] if value == call => tree.node(target).declaration,
            _ => None,
        },
        _ => None,
    }
}

fn is_unvalidated_binding(tree: &SyntaxTree, call: NodeId) -> bool {
    if tree.name(call) != "setParameter" {
        return false;
    }
    tree.arguments(call)
        .nth(1)
        .is_some_and(|arg| matches!(tree.kind(arg), NodeKind::Literal | NodeKind::Reference))
}
