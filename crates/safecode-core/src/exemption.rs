// SPDX-License-Identifier: Apache-2.0

//! Permit-all endpoint extraction.
//!
//! The extractor runs over every configuration class before any file is
//! scanned, and its [`ExemptionSet`] is read-only afterwards.

use std::collections::BTreeSet;

use regex::Regex;
use tracing::{debug, warn};

use crate::syntax::{NodeId, NodeKind, SyntaxTree};

/// Annotation marking a configuration class.
pub const CONFIGURATION_ANNOTATION: &str = "org.springframework.context.annotation.Configuration";

/// Route matcher methods whose arguments are endpoint patterns.
const MATCHER_METHODS: &[&str] = &["requestMatchers", "antMatchers", "mvcMatchers"];

/// Immutable set of endpoint patterns exempt from access control.
#[derive(Debug, Clone, Default)]
pub struct ExemptionSet {
    patterns: BTreeSet<String>,
    matchers: Vec<Regex>,
}

impl PartialEq for ExemptionSet {
    fn eq(&self, other: &Self) -> bool {
        self.patterns == other.patterns
    }
}

impl Eq for ExemptionSet {}

impl FromIterator<String> for ExemptionSet {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        let patterns: BTreeSet<String> = iter.into_iter().collect();
        let matchers = patterns
            .iter()
            .filter_map(|p| match Regex::new(&ant_to_regex(p)) {
                Ok(re) => Some(re),
                Err(e) => {
                    warn!(pattern = %p, "Ignoring unmatchable exemption pattern: {e}");
                    None
                }
            })
            .collect();
        Self { patterns, matchers }
    }
}

impl ExemptionSet {
    /// Whether the exact pattern was extracted.
    #[must_use]
    pub fn contains(&self, pattern: &str) -> bool {
        self.patterns.contains(pattern)
    }

    /// Whether an endpoint path is exempt, either verbatim or through an
    /// Ant-style pattern (`**`, `*`, `?`).
    #[must_use]
    pub fn permits(&self, endpoint: &str) -> bool {
        self.patterns.contains(endpoint) || self.matchers.iter().any(|m| m.is_match(endpoint))
    }

    /// Extracted patterns in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.patterns.iter().map(String::as_str)
    }

    /// Number of patterns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    /// Whether no endpoint is exempt.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

/// Translates an Ant path pattern to an anchored regex.
fn ant_to_regex(pattern: &str) -> String {
    let mut out = String::from("^");
    let mut rest = pattern;
    while let Some(c) = rest.chars().next() {
        if let Some(tail) = rest.strip_prefix("/**") {
            out.push_str("(/.*)?");
            rest = tail;
        } else if let Some(tail) = rest.strip_prefix("**") {
            out.push_str(".*");
            rest = tail;
        } else {
            match c {
                '*' => out.push_str("[^/]*"),
                '?' => out.push_str("[^/]"),
                _ => out.push_str(&regex::escape(&c.to_string())),
            }
            rest = &rest[c.len_utf8()..];
        }
    }
    out.push('$');
    out
}

/// Harvests permit-all endpoint patterns from configuration classes.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExemptionExtractor;

impl ExemptionExtractor {
    /// Whether the tree declares a `@Configuration` class.
    #[must_use]
    pub fn is_configuration_file(tree: &SyntaxTree) -> bool {
        tree.nodes_of_kind(NodeKind::Class)
            .any(|class| tree.has_annotation(class, CONFIGURATION_ANNOTATION))
    }

    /// Patterns of every `matcher(...).permitAll()` chain in one file.
    ///
    /// Non-configuration files yield nothing.
    #[must_use]
    pub fn extract_from(tree: &SyntaxTree) -> Vec<String> {
        if !Self::is_configuration_file(tree) {
            return Vec::new();
        }

        let mut patterns = Vec::new();
        for call in tree.nodes_of_kind(NodeKind::Call) {
            if tree.name(call) != "permitAll" {
                continue;
            }
            let Some(matcher) = matcher_of(tree, call) else {
                continue;
            };
            for arg in tree.arguments(matcher) {
                if let Some(value) = tree.node(arg).string_value() {
                    let pattern = value.trim().to_string();
                    debug!(file = %tree.path(), pattern = %pattern, "Found permitAll URL");
                    patterns.push(pattern);
                }
            }
        }
        patterns
    }

    /// Runs the pre-pass over all trees and freezes the result.
    #[must_use]
    pub fn extract<'a>(trees: impl IntoIterator<Item = &'a SyntaxTree>) -> ExemptionSet {
        trees
            .into_iter()
            .flat_map(Self::extract_from)
            .collect()
    }
}

/// The route matcher call a `permitAll` call is chained onto.
fn matcher_of(tree: &SyntaxTree, permit_all: NodeId) -> Option<NodeId> {
    let receiver = tree.receiver(permit_all)?;
    (tree.kind(receiver) == NodeKind::Call && MATCHER_METHODS.contains(&tree.name(receiver)))
        .then_some(receiver)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::TreeBuilder;

    fn security_config(patterns: &[&str], annotated: bool) -> SyntaxTree {
        let mut b = TreeBuilder::new("src/SecurityConfig.java");
        let http = b.reference("http", Some("HttpSecurity"));
        let authorize = b.call(Some(http), "authorizeHttpRequests", &[]);
        let args: Vec<NodeId> = patterns.iter().map(|p| b.string(p)).collect();
        let matcher = b.call(Some(authorize), "requestMatchers", &args);
        let permit = b.call(Some(matcher), "permitAll", &[]);
        let stmt = b.expr_stmt(permit);
        let body = b.block(&[stmt]);
        let method = b.method(&[], "securityFilterChain", &[], body);
        let annotations = if annotated {
            vec![b.annotation("Configuration", &[])]
        } else {
            Vec::new()
        };
        let class = b.class(&annotations, "SecurityConfig", &[method]);
        b.finish(&[class]).unwrap()
    }

    #[test]
    fn test_extracts_permit_all_patterns() {
        let tree = security_config(&["/public/**"], true);
        let set = ExemptionExtractor::extract([&tree]);
        assert_eq!(set.iter().collect::<Vec<_>>(), vec!["/public/**"]);
    }

    #[test]
    fn test_multiple_patterns_and_trimming() {
        let tree = security_config(&[" /login ", "/health"], true);
        let set = ExemptionExtractor::extract([&tree]);
        assert!(set.contains("/login"));
        assert!(set.contains("/health"));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_ignores_non_configuration_files() {
        let tree = security_config(&["/public/**"], false);
        assert!(!ExemptionExtractor::is_configuration_file(&tree));
        assert!(ExemptionExtractor::extract([&tree]).is_empty());
    }

    #[test]
    fn test_permit_all_without_matcher_is_ignored() {
        let mut b = TreeBuilder::new("src/SecurityConfig.java");
        let http = b.reference("http", Some("HttpSecurity"));
        let any = b.call(Some(http), "anyRequest", &[]);
        let permit = b.call(Some(any), "permitAll", &[]);
        let stmt = b.expr_stmt(permit);
        let body = b.block(&[stmt]);
        let method = b.method(&[], "configure", &[], body);
        let config = b.annotation("org.springframework.context.annotation.Configuration", &[]);
        let class = b.class(&[config], "SecurityConfig", &[method]);
        let tree = b.finish(&[class]).unwrap();

        assert!(ExemptionExtractor::extract([&tree]).is_empty());
    }

    #[test]
    fn test_ant_matching() {
        let set: ExemptionSet = ["/public/**", "/api/*/info", "/v?"]
            .into_iter()
            .map(String::from)
            .collect();

        assert!(set.permits("/public/**"));
        assert!(set.permits("/public"));
        assert!(set.permits("/public/docs/index.html"));
        assert!(!set.permits("/publicity"));
        assert!(set.permits("/api/users/info"));
        assert!(!set.permits("/api/users/admin/info"));
        assert!(set.permits("/v1"));
        assert!(!set.permits("/v10"));
    }

    #[test]
    fn test_regex_metacharacters_are_literal() {
        let set: ExemptionSet = ["/a.b".to_string()].into_iter().collect();
        assert!(set.permits("/a.b"));
        assert!(!set.permits("/axb"));
    }
}
