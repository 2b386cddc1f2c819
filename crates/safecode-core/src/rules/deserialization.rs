// SPDX-License-Identifier: Apache-2.0

//! Insecure deserialization detection.

use super::{DetectorRule, Hit, collect};
use crate::Result;
use crate::finding::{Confidence, Finding};
use crate::session::ScanSession;
use crate::syntax::{NodeId, SyntaxTree, Visitor, walk};

const DANGEROUS_METHODS: &[&str] = &["readObject", "readUnshared", "fromXML"];
const UNTRUSTED_SOURCES: &[&str] = &["getParameter", "getInputStream", "getHeader"];
const GENERIC_OBJECT_TYPES: &[&str] = &["Object", "java.lang.Object"];
const VULNERABLE_LIBRARIES: &[&str] = &[
    "org.apache.commons.collections",
    "com.thoughtworks.xstream",
    "org.springframework.beans",
];

/// Composite insecure deserialization rule (412-415).
#[derive(Debug, Clone, Copy, Default)]
pub struct DeserializationRule;

impl DetectorRule for DeserializationRule {
    fn id(&self) -> &'static str {
        "deserialization"
    }

    fn name(&self) -> &'static str {
        "Insecure Deserialization"
    }

    fn definition_ids(&self) -> &'static [&'static str] {
        &["412", "413", "414", "415"]
    }

    fn scan(&self, tree: &SyntaxTree, session: &ScanSession<'_>) -> Result<Vec<Finding>> {
        let mut visitor = DeserializationVisitor::default();
        walk(tree, &mut visitor);
        collect(tree, session, visitor.hits)
    }
}

#[derive(Default)]
struct DeserializationVisitor {
    hits: Vec<Hit>,
}

impl Visitor for DeserializationVisitor {
    fn visit_import(&mut self, tree: &SyntaxTree, id: NodeId) {
        self.hits.extend(vulnerable_library(tree, id));
    }

    fn visit_call(&mut self, tree: &SyntaxTree, id: NodeId) {
        self.hits.extend(dangerous_method(tree, id));
        self.hits.extend(untrusted_source(tree, id));
    }

    fn visit_new(&mut self, tree: &SyntaxTree, id: NodeId) {
        self.hits.extend(untrusted_source(tree, id));
    }

    fn visit_local_variable(&mut self, tree: &SyntaxTree, id: NodeId) {
        self.hits.extend(generic_object_variable(tree, id));
    }
}

pub(crate) fn dangerous_method(tree: &SyntaxTree, call: NodeId) -> Option<Hit> {
    let name = tree.name(call);
    DANGEROUS_METHODS.contains(&name).then(|| {
        Hit::structural(call, "412", format!("Dangerous deserialization call '{name}'"))
            .with_confidence(Confidence::High)
    })
}

/// Call or object creation fed directly from request or stream accessors.
pub(crate) fn untrusted_source(tree: &SyntaxTree, id: NodeId) -> Option<Hit> {
    let source = tree.arguments(id).find_map(|arg| {
        let text = tree.text(arg);
        UNTRUSTED_SOURCES.iter().find(|s| text.contains(*s))
    })?;
    Some(Hit::textual(
        id,
        "413",
        format!("Deserialization input taken from untrusted source '{source}'"),
    ))
}

pub(crate) fn generic_object_variable(tree: &SyntaxTree, local: NodeId) -> Option<Hit> {
    let type_name = tree.node(local).type_name.as_deref()?;
    GENERIC_OBJECT_TYPES.contains(&type_name).then(|| {
        Hit::structural(
            local,
            "414",
            format!(
                "Variable '{}' holds an unvalidated generic Object",
                tree.name(local)
            ),
        )
        .with_confidence(Confidence::Low)
    })
}

pub(crate) fn vulnerable_library(tree: &SyntaxTree, import: NodeId) -> Option<Hit> {
    let imported = tree.name(import);
    VULNERABLE_LIBRARIES
        .iter()
        .any(|lib| imported.starts_with(lib))
        .then(|| {
            Hit::structural(
                import,
                "415",
                format!("Import of library with known deserialization flaws: {imported}"),
            )
            .with_confidence(Confidence::High)
        })
}
