// SPDX-License-Identifier: Apache-2.0

//! Security misconfiguration detection.
//!
//! Java trees are checked for an incomplete `HttpSecurity` setup inside
//! security configuration classes. Properties and YAML files are checked
//! line by line for hardcoded credentials.

use super::{DetectorRule, Hit, collect, contains_any, literal_entries};
use crate::Result;
use crate::finding::{Confidence, Finding};
use crate::session::ScanSession;
use crate::syntax::{NodeId, NodeKind, SyntaxTree, Visitor, names_match, walk};

const CONFIGURATION: &str = "org.springframework.context.annotation.Configuration";
const ENABLE_WEB_SECURITY: &str =
    "org.springframework.security.config.annotation.web.configuration.EnableWebSecurity";
const HTTP_SECURITY: &str =
    "org.springframework.security.config.annotation.web.builders.HttpSecurity";
const BUILDER_METHODS: &[&str] = &["configure", "securityFilterChain"];

const REQUIRED_HEADERS: &[&str] = &[
    "xssProtection",
    "contentTypeOptions",
    "frameOptions",
    "httpStrictTransportSecurity",
];

const SENSITIVE_PROPERTY_KEYS: &[&str] = &["password", "username", "apikey", "secret", "key"];

/// Composite security misconfiguration rule (601-603).
#[derive(Debug, Clone, Copy, Default)]
pub struct MisconfigurationRule;

impl DetectorRule for MisconfigurationRule {
    fn id(&self) -> &'static str {
        "misconfiguration"
    }

    fn name(&self) -> &'static str {
        "Security Misconfiguration"
    }

    fn definition_ids(&self) -> &'static [&'static str] {
        &["601", "602", "603"]
    }

    fn scan(&self, tree: &SyntaxTree, session: &ScanSession<'_>) -> Result<Vec<Finding>> {
        if tree.language().is_key_value() {
            return hardcoded_properties(tree)
                .into_iter()
                .map(|(line, key)| {
                    Ok(session
                        .finding_at_line(tree, line, "603")?
                        .with_message(format!("Hardcoded credential found for key: {key}"))
                        .with_confidence(Confidence::Medium)
                        .textual())
                })
                .collect();
        }

        let mut visitor = SecurityConfigVisitor::default();
        walk(tree, &mut visitor);
        collect(tree, session, visitor.hits)
    }
}

#[derive(Default)]
struct SecurityConfigVisitor {
    hits: Vec<Hit>,
}

impl Visitor for SecurityConfigVisitor {
    fn visit_method(&mut self, tree: &SyntaxTree, id: NodeId) {
        if !is_security_builder(tree, id) {
            return;
        }
        self.hits.extend(missing_security_headers(tree, id));
        self.hits.extend(https_not_enforced(tree, id));
    }
}

/// `configure(HttpSecurity)` or `securityFilterChain(HttpSecurity)` inside a
/// class carrying both `@Configuration` and `@EnableWebSecurity`.
pub(crate) fn is_security_builder(tree: &SyntaxTree, method: NodeId) -> bool {
    let Some(class) = tree.enclosing(method, &[NodeKind::Class]) else {
        return false;
    };
    if !tree.has_annotation(class, CONFIGURATION)
        || !tree.has_annotation(class, ENABLE_WEB_SECURITY)
    {
        return false;
    }
    if !BUILDER_METHODS.contains(&tree.name(method)) {
        return false;
    }

    let params: Vec<NodeId> = tree.parameters(method).collect();
    matches!(params.as_slice(), [p] if tree
        .node(*p)
        .type_name
        .as_deref()
        .is_some_and(|t| names_match(t, HTTP_SECURITY)))
}

/// Text of the whole call chain an expression belongs to.
fn chain_text(tree: &SyntaxTree, id: NodeId) -> &str {
    let top = tree
        .ancestors(id)
        .take_while(|&a| tree.node(a).is_expression())
        .last()
        .unwrap_or(id);
    tree.text(top)
}

fn calls_named<'a>(
    tree: &'a SyntaxTree,
    root: NodeId,
    name: &'a str,
) -> impl Iterator<Item = NodeId> + 'a {
    tree.descendants(root)
        .filter(move |&d| tree.kind(d) == NodeKind::Call && tree.name(d) == name)
}

/// Security builder without a complete `headers()` configuration.
pub(crate) fn missing_security_headers(tree: &SyntaxTree, method: NodeId) -> Option<Hit> {
    let configured = calls_named(tree, method, "headers").any(|call| {
        let text = chain_text(tree, call);
        !text.contains("defaultsDisabled") && REQUIRED_HEADERS.iter().all(|h| text.contains(h))
    });

    (!configured).then(|| {
        Hit::textual(
            method,
            "601",
            "Missing or improperly configured HTTP security headers.",
        )
    })
}

/// Security builder without a `requiresChannel()...requiresSecure()` chain.
pub(crate) fn https_not_enforced(tree: &SyntaxTree, method: NodeId) -> Option<Hit> {
    let enforced = calls_named(tree, method, "requiresChannel")
        .any(|call| chain_text(tree, call).contains("requiresSecure"));

    (!enforced).then(|| {
        Hit::textual(
            method,
            "602",
            "HTTPS is not enforced. HTTP traffic may be insecure.",
        )
    })
}

/// `(line, key)` of every sensitive key assigned a literal value.
pub(crate) fn hardcoded_properties(tree: &SyntaxTree) -> Vec<(usize, String)> {
    literal_entries(tree)
        .filter(|entry| contains_any(entry.key, SENSITIVE_PROPERTY_KEYS))
        .map(|entry| (entry.line, entry.key.to_string()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::fixture::{Fixture, ids};
    use crate::syntax::TreeBuilder;

    fn scan(tree: &SyntaxTree) -> Vec<Finding> {
        Fixture::new().run(&MisconfigurationRule, tree)
    }

    fn security_config(chains: &[&[&str]], enable_web_security: bool) -> SyntaxTree {
        let mut b = TreeBuilder::new("SecurityConfig.java");
        let mut stmts = Vec::new();
        for chain in chains {
            let mut current = b.reference("http", Some("HttpSecurity"));
            for name in *chain {
                current = b.call(Some(current), name, &[]);
            }
            stmts.push(b.expr_stmt(current));
        }
        let body = b.block(&stmts);
        let param = b.parameter("HttpSecurity", "http");
        let method = b.method(&[], "securityFilterChain", &[param], body);

        let mut annotations = vec![b.annotation(CONFIGURATION, &[])];
        if enable_web_security {
            annotations.push(b.annotation("EnableWebSecurity", &[]));
        }
        let class = b.class(&annotations, "SecurityConfig", &[method]);
        b.finish(&[class]).unwrap()
    }

    const FULL_HEADERS: &[&str] = &[
        "headers",
        "xssProtection",
        "and",
        "contentTypeOptions",
        "and",
        "frameOptions",
        "and",
        "httpStrictTransportSecurity",
    ];

    const HTTPS: &[&str] = &["requiresChannel", "anyRequest", "requiresSecure"];

    #[test]
    fn test_complete_configuration_is_clean() {
        let tree = security_config(&[FULL_HEADERS, HTTPS], true);
        assert!(scan(&tree).is_empty());
    }

    #[test]
    fn test_missing_headers_and_https() {
        let tree = security_config(&[&["csrf"]], true);
        assert_eq!(ids(&scan(&tree)), vec!["601", "602"]);
    }

    #[test]
    fn test_incomplete_or_disabled_headers() {
        let partial: &[&str] = &["headers", "frameOptions"];
        let tree = security_config(&[partial, HTTPS], true);
        assert_eq!(ids(&scan(&tree)), vec!["601"]);

        let mut disabled = FULL_HEADERS.to_vec();
        disabled.push("defaultsDisabled");
        let tree = security_config(&[disabled.as_slice(), HTTPS], true);
        assert_eq!(ids(&scan(&tree)), vec!["601"]);
    }

    #[test]
    fn test_requires_both_annotations() {
        let tree = security_config(&[&["csrf"]], false);
        assert!(scan(&tree).is_empty());
    }

    #[test]
    fn test_properties_credentials() {
        let tree = SyntaxTree::from_text(
            "src/main/resources/application.properties",
            "# db.password=commented\n\
             db.url=jdbc:h2:mem:test\n\
             db.password=supersecret\n\
             db.username=${DB_USER}\n\
             ! api.key=legacy\n\
             api.key =\n\
             jwt.secret: s3cr3t\n",
        );

        let findings = scan(&tree);
        assert_eq!(ids(&findings), vec!["603", "603"]);
        assert_eq!(findings[0].line, 3);
        assert!(findings[0].message.ends_with("db.password"));
        assert_eq!(findings[1].line, 7);
    }

    #[test]
    fn test_placeholder_is_not_flagged() {
        let tree =
            SyntaxTree::from_text("application.properties", "db.password=${DB_PASSWORD}\n");
        assert!(scan(&tree).is_empty());
    }

    #[test]
    fn test_yaml_credentials() {
        let tree = SyntaxTree::from_text(
            "application.yml",
            "spring:\n  datasource:\n    username: app\n    password: '${DB_PASSWORD}'\n",
        );
        let findings = scan(&tree);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].line, 3);
    }
}
