// SPDX-License-Identifier: Apache-2.0

//! HIPAA encryption-at-rest checks.
//!
//! Only methods whose names mention protected health information and that
//! persist data are inspected. A persistence call passes when one of its
//! string literals carries a strong encryption marker: every token of the
//! project's `encryptionLevel` setting, or `AES` and `256` by default.

use super::{DetectorRule, Hit, collect, contains_any};
use crate::Result;
use crate::finding::Finding;
use crate::session::ScanSession;
use crate::syntax::{NodeId, NodeKind, SyntaxTree, Visitor, walk};

/// Regime name as declared in project configuration.
pub const HIPAA: &str = "HIPAA";

/// Custom setting that overrides the strong encryption marker.
pub const ENCRYPTION_LEVEL_SETTING: &str = "encryptionLevel";

const PHI_KEYWORDS: &[&str] = &[
    "fullname",
    "firstname",
    "lastname",
    "middlename",
    "fname",
    "lname",
    "mname",
    "socialsecuritynumber",
    "ssn",
    "medicalrecordnumber",
    "mrn",
    "healthinsurancepolicy",
    "subscribernumber",
    "policynumber",
    "dateofbirth",
    "dob",
    "birthdate",
    "birthday",
    "address",
    "phonenumber",
    "mobilenumber",
    "labtestresults",
    "testresults",
    "labresults",
    "diagnoses",
    "medicalconditions",
    "patientid",
    "patientidentifier",
    "insuranceid",
    "insuranceidentifier",
    "patient",
    "record",
    "clinical",
    "medical",
    "doctor",
    "nurse",
    "prescription",
    "treatment",
    "healthcare",
    "diagnosis",
    "hospital",
    "coverage",
    "emergency",
];

const PERSISTENCE_METHODS: &[&str] = &["save", "store", "write", "insert", "update"];
const STORAGE_TYPES: &[&str] = &["Repository", "Database", "Storage"];
const DEFAULT_STRONG_MARKER: &[&str] = &["AES", "256"];
const WEAK_ALGORITHMS: &[&str] = &["DES", "MD5", "RC4"];

/// Unencrypted PHI persistence (1001).
#[derive(Debug, Clone, Copy, Default)]
pub struct HipaaRule;

impl DetectorRule for HipaaRule {
    fn id(&self) -> &'static str {
        "hipaa"
    }

    fn name(&self) -> &'static str {
        "HIPAA Encryption at Rest"
    }

    fn definition_ids(&self) -> &'static [&'static str] {
        &["1001"]
    }

    fn compliance_regime(&self) -> Option<&'static str> {
        Some(HIPAA)
    }

    fn scan(&self, tree: &SyntaxTree, session: &ScanSession<'_>) -> Result<Vec<Finding>> {
        let marker = strong_marker(session.project().custom_str(ENCRYPTION_LEVEL_SETTING));
        let mut visitor = HipaaVisitor {
            marker,
            hits: Vec::new(),
        };
        walk(tree, &mut visitor);
        collect(tree, session, visitor.hits)
    }
}

struct HipaaVisitor {
    marker: Vec<String>,
    hits: Vec<Hit>,
}

impl Visitor for HipaaVisitor {
    fn visit_method(&mut self, tree: &SyntaxTree, id: NodeId) {
        self.hits.extend(unencrypted_phi_persistence(tree, id, &self.marker));
    }
}

/// Upper-case tokens every strong marker must contain.
///
/// `"AES-256"` becomes `["AES", "256"]`. A blank setting keeps the default.
pub(crate) fn strong_marker(setting: Option<&str>) -> Vec<String> {
    let tokens: Vec<String> = setting
        .unwrap_or_default()
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_ascii_uppercase)
        .collect();

    if tokens.is_empty() {
        DEFAULT_STRONG_MARKER.iter().map(|t| (*t).to_string()).collect()
    } else {
        tokens
    }
}

pub(crate) fn is_phi_method(name: &str) -> bool {
    contains_any(name, PHI_KEYWORDS)
}

/// `save`-like call on a repository, database or storage type, or any
/// `*.save*` call.
pub(crate) fn is_persistence_call(tree: &SyntaxTree, call: NodeId) -> bool {
    if tree.kind(call) != NodeKind::Call {
        return false;
    }
    let name = tree.name(call);
    let Some(receiver) = tree.receiver(call) else {
        return false;
    };

    let storage_typed = tree
        .node(receiver)
        .type_name
        .as_deref()
        .is_some_and(|t| STORAGE_TYPES.iter().any(|s| t.contains(s)));
    if PERSISTENCE_METHODS.contains(&name) && storage_typed {
        return true;
    }
    format!("{}.{name}", tree.text(receiver)).contains(".save")
}

/// Whether a string literal among the call's arguments carries the marker.
///
/// Arguments are checked in order; a weak algorithm in an argument ends the
/// search before the marker is found.
pub(crate) fn has_strong_encryption(tree: &SyntaxTree, call: NodeId, marker: &[String]) -> bool {
    for arg in tree.arguments(call) {
        let literals: String = tree
            .subtree(arg)
            .filter_map(|id| tree.node(id).string_value())
            .collect::<Vec<_>>()
            .join(" ")
            .to_ascii_uppercase();

        if marker.iter().all(|t| literals.contains(t.as_str())) {
            return true;
        }
        if WEAK_ALGORITHMS.iter().any(|w| literals.contains(w)) {
            return false;
        }
    }
    false
}

pub(crate) fn unencrypted_phi_persistence(
    tree: &SyntaxTree,
    method: NodeId,
    marker: &[String],
) -> Vec<Hit> {
    if !is_phi_method(tree.name(method)) {
        return Vec::new();
    }
    let Some(body) = tree.body(method) else {
        return Vec::new();
    };

    let persistence: Vec<NodeId> = tree
        .descendants(body)
        .filter(|&d| is_persistence_call(tree, d))
        .collect();

    persistence
        .into_iter()
        .filter(|&call| !has_strong_encryption(tree, call, marker))
        .map(|call| {
            Hit::textual(
                call,
                "1001",
                "Unencrypted PHI data detected. Ensure data is encrypted before saving.",
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::finding::MatchBasis;
    use crate::rules::fixture::{Fixture, ids};
    use crate::syntax::TreeBuilder;

    fn save_medical_record(method_name: &str, algorithm: &str) -> SyntaxTree {
        let mut b = TreeBuilder::new("src/RecordService.java");
        b.at_line(20);
        let repo = b.reference("recordRepository", Some("MedicalRecordRepository"));
        let record = b.reference("record", Some("MedicalRecord"));
        let alg = b.string(algorithm);
        let call = b.call(Some(repo), "save", &[record, alg]);
        let stmt = b.expr_stmt(call);
        let body = b.block(&[stmt]);
        let method = b.method(&[], method_name, &[], body);
        let class = b.class(&[], "RecordService", &[method]);
        b.finish(&[class]).unwrap()
    }

    #[test]
    fn test_unencrypted_save_is_flagged() {
        let tree = save_medical_record("saveMedicalRecord", "plain");
        let findings = Fixture::new().run(&HipaaRule, &tree);
        assert_eq!(ids(&findings), vec!["1001"]);

        let finding = &findings[0];
        assert_eq!(finding.line, 20);
        assert_eq!(finding.basis, MatchBasis::Textual);
        // Regime tagging belongs to the compliance overlay.
        assert!(!finding.is_compliance);
    }

    #[test]
    fn test_strong_marker_passes() {
        let tree = save_medical_record("saveMedicalRecord", "AES/GCM-256");
        assert!(Fixture::new().run(&HipaaRule, &tree).is_empty());
    }

    #[test]
    fn test_weak_algorithm_is_flagged() {
        let tree = save_medical_record("saveMedicalRecord", "DES-256");
        assert_eq!(ids(&Fixture::new().run(&HipaaRule, &tree)), vec!["1001"]);
    }

    #[test]
    fn test_non_phi_method_is_ignored() {
        let tree = save_medical_record("saveInvoice", "plain");
        assert!(Fixture::new().run(&HipaaRule, &tree).is_empty());
    }

    #[test]
    fn test_project_encryption_level_overrides_marker() {
        let mut fixture = Fixture::new();
        fixture.project = crate::project::ProjectConfig::from_json(
            r#"{"compliance": ["HIPAA"], "customSettings": {"encryptionLevel": "ChaCha20-Poly1305"}}"#,
        )
        .unwrap();

        let aes = save_medical_record("savePatient", "AES-256");
        assert_eq!(ids(&fixture.run(&HipaaRule, &aes)), vec!["1001"]);

        let chacha = save_medical_record("savePatient", "chacha20-poly1305");
        assert!(fixture.run(&HipaaRule, &chacha).is_empty());
    }

    #[test]
    fn test_strong_marker_parsing() {
        assert_eq!(strong_marker(None), vec!["AES", "256"]);
        assert_eq!(strong_marker(Some("  ")), vec!["AES", "256"]);
        assert_eq!(strong_marker(Some("aes-128")), vec!["AES", "128"]);
    }

    #[test]
    fn test_save_chain_without_storage_type() {
        let mut b = TreeBuilder::new("A.java");
        let dao = b.reference("dao", None);
        let call = b.call(Some(dao), "saveAll", &[]);
        let plain = b.reference("store", Some("Cache"));
        let put = b.call(Some(plain), "put", &[]);
        let tree = b.finish(&[call, put]).unwrap();

        let calls: Vec<NodeId> = tree.nodes_of_kind(NodeKind::Call).collect();
        assert!(is_persistence_call(&tree, calls[0]));
        assert!(!is_persistence_call(&tree, calls[1]));
    }
}
