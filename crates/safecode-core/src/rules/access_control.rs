// SPDX-License-Identifier: Apache-2.0

//! Broken access control detection for web controllers.

use super::{DetectorRule, Hit, collect};
use crate::Result;
use crate::exemption::ExemptionSet;
use crate::finding::{Confidence, Finding};
use crate::session::ScanSession;
use crate::syntax::{NodeId, NodeKind, SyntaxTree, Visitor, walk};

const CONTROLLER_ANNOTATIONS: &[&str] = &[
    "org.springframework.web.bind.annotation.RestController",
    "org.springframework.stereotype.Controller",
];

const AUTHORIZATION_ANNOTATIONS: &[&str] = &[
    "org.springframework.security.access.prepost.PreAuthorize",
    "org.springframework.security.access.prepost.PostAuthorize",
    "org.springframework.security.access.annotation.Secured",
    "jakarta.annotation.security.RolesAllowed",
];

const PRE_LOGIN_METHODS: &[&str] = &[
    "login",
    "register",
    "signup",
    "forgotpassword",
    "resetpassword",
];

const REQUEST_MAPPING: &str = "org.springframework.web.bind.annotation.RequestMapping";

/// Controller endpoints without an authorization annotation (205).
#[derive(Debug, Clone, Copy, Default)]
pub struct AccessControlRule;

impl DetectorRule for AccessControlRule {
    fn id(&self) -> &'static str {
        "access-control"
    }

    fn name(&self) -> &'static str {
        "Broken Access Control"
    }

    fn definition_ids(&self) -> &'static [&'static str] {
        &["205"]
    }

    fn scan(&self, tree: &SyntaxTree, session: &ScanSession<'_>) -> Result<Vec<Finding>> {
        let mut visitor = AccessControlVisitor {
            exemptions: session.exemptions(),
            hits: Vec::new(),
        };
        walk(tree, &mut visitor);
        collect(tree, session, visitor.hits)
    }
}

struct AccessControlVisitor<'a> {
    exemptions: &'a ExemptionSet,
    hits: Vec<Hit>,
}

impl Visitor for AccessControlVisitor<'_> {
    fn visit_method(&mut self, tree: &SyntaxTree, id: NodeId) {
        self.hits.extend(unprotected_endpoint(tree, id, self.exemptions));
    }
}

/// A controller method that is neither authorized, pre-login nor exempt.
pub(crate) fn unprotected_endpoint(
    tree: &SyntaxTree,
    method: NodeId,
    exemptions: &ExemptionSet,
) -> Option<Hit> {
    if tree.kind(method) != NodeKind::Method {
        return None;
    }
    let class = tree.enclosing(method, &[NodeKind::Class])?;
    if !CONTROLLER_ANNOTATIONS
        .iter()
        .any(|a| tree.has_annotation(class, a))
    {
        return None;
    }
    if is_pre_login(tree.name(method)) {
        return None;
    }
    if AUTHORIZATION_ANNOTATIONS
        .iter()
        .any(|a| tree.has_annotation(method, a))
    {
        return None;
    }
    if mapped_paths(tree, class, method)
        .iter()
        .any(|path| exemptions.permits(path))
    {
        return None;
    }

    Some(
        Hit::structural(
            method,
            "205",
            format!(
                "Missing security annotations (e.g., @PreAuthorize, @Secured) on endpoint method '{}'",
                tree.name(method)
            ),
        )
        .with_confidence(Confidence::Medium),
    )
}

fn is_pre_login(name: &str) -> bool {
    let normalized: String = name
        .chars()
        .filter(|c| *c != '_' && *c != '-')
        .collect::<String>()
        .to_ascii_lowercase();
    PRE_LOGIN_METHODS.contains(&normalized.as_str())
}

/// Endpoint paths a method is mapped to, both as declared and prefixed by the
/// class-level `@RequestMapping`.
pub(crate) fn mapped_paths(tree: &SyntaxTree, class: NodeId, method: NodeId) -> Vec<String> {
    let prefixes: Vec<String> = tree
        .find_annotation(class, REQUEST_MAPPING)
        .map(|a| annotation_paths(tree, a))
        .unwrap_or_default();

    let mut paths = Vec::new();
    for annotation in tree.annotations(method) {
        if !tree.name(annotation).ends_with("Mapping") {
            continue;
        }
        for path in annotation_paths(tree, annotation) {
            for prefix in &prefixes {
                paths.push(join_path(prefix, &path));
            }
            paths.push(path);
        }
    }
    paths
}

fn annotation_paths(tree: &SyntaxTree, annotation: NodeId) -> Vec<String> {
    ["value", "path"]
        .iter()
        .filter_map(|attr| tree.annotation_attribute(annotation, attr))
        .flat_map(|value| tree.subtree(value))
        .filter_map(|id| tree.node(id).string_value())
        .map(|s| s.trim().to_string())
        .collect()
}

fn join_path(prefix: &str, path: &str) -> String {
    let prefix = prefix.trim_end_matches('/');
    let path = path.trim_start_matches('/');
    if path.is_empty() {
        prefix.to_string()
    } else {
        format!("{prefix}/{path}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::fixture::{Fixture, ids};
    use crate::syntax::TreeBuilder;

    /// `(method name, mapping path, has @PreAuthorize)`
    type Endpoint<'a> = (&'a str, Option<&'a str>, bool);

    fn controller(class_prefix: Option<&str>, endpoints: &[Endpoint<'_>]) -> SyntaxTree {
        let mut b = TreeBuilder::new("src/UserController.java");
        let mut members = Vec::new();
        for (i, &(name, mapping, authorized)) in endpoints.iter().enumerate() {
            b.at_line(10 * (i + 1));
            let mut annotations = Vec::new();
            if let Some(path) = mapping {
                let p = b.string(path);
                annotations.push(b.annotation("GetMapping", &[("value", p)]));
            }
            if authorized {
                let expr = b.string("hasRole('ADMIN')");
                annotations.push(b.annotation("PreAuthorize", &[("value", expr)]));
            }
            let body = b.block(&[]);
            members.push(b.method(&annotations, name, &[], body));
        }
        let body = b.block(&[]);
        members.push(b.constructor(&[], "UserController", &[], body));

        let mut class_annotations = vec![b.annotation("RestController", &[])];
        if let Some(prefix) = class_prefix {
            let p = b.string(prefix);
            class_annotations.push(b.annotation("RequestMapping", &[("value", p)]));
        }
        let class = b.class(&class_annotations, "UserController", &members);
        b.finish(&[class]).unwrap()
    }

    #[test]
    fn test_flags_unprotected_endpoint_only() {
        let tree = controller(
            None,
            &[
                ("listUsers", Some("/users"), false),
                ("deleteUser", Some("/users/delete"), true),
                ("login", Some("/login"), false),
                ("forgot_password", None, false),
            ],
        );
        let findings = Fixture::new().run(&AccessControlRule, &tree);
        assert_eq!(ids(&findings), vec!["205"]);
        assert_eq!(findings[0].line, 10);
        assert!(findings[0].message.contains("listUsers"));
    }

    #[test]
    fn test_exempt_endpoint_is_not_flagged() {
        let tree = controller(None, &[("docs", Some("/public/**"), false)]);
        let mut fixture = Fixture::new();
        fixture.exemptions = ["/public/**".to_string()].into_iter().collect();
        assert!(fixture.run(&AccessControlRule, &tree).is_empty());
    }

    #[test]
    fn test_class_prefix_is_matched_against_exemptions() {
        let tree = controller(Some("/public"), &[("index", Some("/index"), false)]);
        let mut fixture = Fixture::new();
        fixture.exemptions = ["/public/**".to_string()].into_iter().collect();
        assert!(fixture.run(&AccessControlRule, &tree).is_empty());
    }

    #[test]
    fn test_non_controller_methods_are_ignored() {
        let mut b = TreeBuilder::new("src/UserService.java");
        let body = b.block(&[]);
        let method = b.method(&[], "listUsers", &[], body);
        let service = b.annotation("Service", &[]);
        let class = b.class(&[service], "UserService", &[method]);
        let tree = b.finish(&[class]).unwrap();

        assert!(Fixture::new().run(&AccessControlRule, &tree).is_empty());
    }

    #[test]
    fn test_join_path() {
        assert_eq!(join_path("/api/", "/users"), "/api/users");
        assert_eq!(join_path("/api", ""), "/api");
        assert_eq!(join_path("", "users"), "/users");
    }
}
