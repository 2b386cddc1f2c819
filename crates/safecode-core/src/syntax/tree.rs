// SPDX-License-Identifier: Apache-2.0

//! Validated syntax tree arena and structural queries.

use serde::{Deserialize, Serialize};

use super::node::{Node, NodeId, NodeKind};
use crate::Result;
use crate::error::SafeCodeError;
use crate::finding::UNKNOWN_LINE;

/// Source language of a tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    /// Java source.
    #[default]
    Java,
    /// `.properties` file.
    Properties,
    /// `.yml` / `.yaml` file.
    Yaml,
}

impl Language {
    /// Infers the language from a file extension.
    #[must_use]
    pub fn from_path(path: &str) -> Self {
        let ext = std::path::Path::new(path)
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);

        match ext.as_deref() {
            Some("properties") => Language::Properties,
            Some("yml" | "yaml") => Language::Yaml,
            _ => Language::Java,
        }
    }

    /// Whether files of this language are line-oriented key/value text.
    #[must_use]
    pub fn is_key_value(self) -> bool {
        matches!(self, Language::Properties | Language::Yaml)
    }
}

#[derive(Deserialize)]
struct TreeData {
    path: String,
    #[serde(default)]
    language: Option<Language>,
    #[serde(default)]
    source: String,
    #[serde(default)]
    nodes: Vec<Node>,
}

impl TryFrom<TreeData> for SyntaxTree {
    type Error = SafeCodeError;

    fn try_from(data: TreeData) -> Result<Self> {
        let language = data
            .language
            .unwrap_or_else(|| Language::from_path(&data.path));
        SyntaxTree::new(data.path, language, data.source, data.nodes)
    }
}

/// One file's syntax tree.
///
/// Node `0` is the `File` root. Every other node has exactly one parent and is
/// reachable from the root; [`SyntaxTree::new`] rejects anything else.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "TreeData")]
pub struct SyntaxTree {
    path: String,
    language: Language,
    #[serde(skip_serializing_if = "String::is_empty")]
    source: String,
    nodes: Vec<Node>,
}

impl SyntaxTree {
    /// Validates a node arena and links parents.
    ///
    /// # Errors
    ///
    /// Returns `SafeCodeError::Tree` when the root is missing, an id is out of
    /// range, a node has two parents, a receiver is not a child, or a node is
    /// unreachable from the root.
    pub fn new(
        path: impl Into<String>,
        language: Language,
        source: impl Into<String>,
        mut nodes: Vec<Node>,
    ) -> Result<Self> {
        let path = path.into();

        if nodes.is_empty() {
            nodes.push(Node::new(NodeKind::File));
        }
        if nodes[0].kind != NodeKind::File {
            return Err(SafeCodeError::tree(&path, "node 0 must be the file root"));
        }

        let len = nodes.len();
        let in_range = |id: NodeId| id.0 < len;

        for node in &mut nodes {
            node.parent = None;
        }

        for index in 0..len {
            let children = nodes[index].children.clone();
            for child in &children {
                if !in_range(*child) || child.0 == 0 || child.0 == index {
                    return Err(SafeCodeError::tree(
                        &path,
                        format!("node {index} has invalid child {}", child.0),
                    ));
                }
                if nodes[child.0].parent.is_some() {
                    return Err(SafeCodeError::tree(
                        &path,
                        format!("node {} has more than one parent", child.0),
                    ));
                }
                nodes[child.0].parent = Some(NodeId(index));
            }

            let node = &nodes[index];
            if let Some(receiver) = node.receiver
                && !node.children.contains(&receiver)
            {
                return Err(SafeCodeError::tree(
                    &path,
                    format!("receiver of node {index} is not one of its children"),
                ));
            }
            if let Some(decl) = node.declaration
                && !in_range(decl)
            {
                return Err(SafeCodeError::tree(
                    &path,
                    format!("node {index} resolves to missing declaration {}", decl.0),
                ));
            }
        }

        let tree = Self {
            path,
            language,
            source: source.into(),
            nodes,
        };

        let reachable = tree.subtree(tree.root()).count();
        if reachable != len {
            return Err(SafeCodeError::tree(
                &tree.path,
                format!("{} node(s) are unreachable from the root", len - reachable),
            ));
        }

        Ok(tree)
    }

    /// Parses a tree from its JSON interchange form.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Wraps a plain-text configuration file.
    #[must_use]
    pub fn from_text(path: impl Into<String>, source: impl Into<String>) -> Self {
        let path = path.into();
        let language = Language::from_path(&path);
        Self {
            path,
            language,
            source: source.into(),
            nodes: vec![Node::new(NodeKind::File)],
        }
    }

    /// File path used for reporting.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Source language.
    #[must_use]
    pub fn language(&self) -> Language {
        self.language
    }

    /// Raw source text (may be empty for trees).
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// The file root.
    #[must_use]
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// Number of nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the tree only holds its root.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    /// The node behind an id.
    #[must_use]
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    /// Kind of a node.
    #[must_use]
    pub fn kind(&self, id: NodeId) -> NodeKind {
        self.node(id).kind
    }

    /// Name of a node, or the empty string.
    #[must_use]
    pub fn name(&self, id: NodeId) -> &str {
        self.node(id).name()
    }

    /// Source text of a node.
    #[must_use]
    pub fn text(&self, id: NodeId) -> &str {
        &self.node(id).text
    }

    /// Line of a node, or [`UNKNOWN_LINE`] when it was not resolved.
    #[must_use]
    pub fn line_of(&self, id: NodeId) -> usize {
        self.nodes
            .get(id.0)
            .and_then(|n| n.line)
            .unwrap_or(UNKNOWN_LINE)
    }

    /// Parent of a node.
    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    /// Ordered children of a node.
    #[must_use]
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.node(id).children
    }

    /// Children of a given kind.
    pub fn children_of_kind(&self, id: NodeId, kind: NodeKind) -> impl Iterator<Item = NodeId> {
        self.children(id)
            .iter()
            .copied()
            .filter(move |&c| self.kind(c) == kind)
    }

    /// Ancestors from the parent up to the root.
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> {
        std::iter::successors(self.parent(id), |&p| self.parent(p))
    }

    /// Nearest ancestor of one of the given kinds.
    #[must_use]
    pub fn enclosing(&self, id: NodeId, kinds: &[NodeKind]) -> Option<NodeId> {
        self.ancestors(id).find(|&a| kinds.contains(&self.kind(a)))
    }

    /// The node and all of its descendants in preorder.
    #[must_use]
    pub fn subtree(&self, id: NodeId) -> Subtree<'_> {
        Subtree {
            tree: self,
            stack: vec![id],
        }
    }

    /// Descendants of a node in preorder, excluding the node itself.
    pub fn descendants(&self, id: NodeId) -> impl Iterator<Item = NodeId> {
        self.subtree(id).skip(1)
    }

    /// Receiver of a call.
    #[must_use]
    pub fn receiver(&self, call: NodeId) -> Option<NodeId> {
        self.node(call).receiver
    }

    /// Arguments of a call or object creation.
    pub fn arguments(&self, call: NodeId) -> impl Iterator<Item = NodeId> {
        let receiver = self.receiver(call);
        self.children(call)
            .iter()
            .copied()
            .filter(move |&c| Some(c) != receiver)
    }

    /// Annotations declared on a class, method, field or parameter.
    pub fn annotations(&self, id: NodeId) -> impl Iterator<Item = NodeId> {
        self.children_of_kind(id, NodeKind::Annotation)
    }

    /// First annotation matching a qualified name by full or simple name.
    #[must_use]
    pub fn find_annotation(&self, id: NodeId, qualified: &str) -> Option<NodeId> {
        self.annotations(id)
            .find(|&a| names_match(self.name(a), qualified))
    }

    /// Whether a declaration carries the annotation.
    #[must_use]
    pub fn has_annotation(&self, id: NodeId, qualified: &str) -> bool {
        self.find_annotation(id, qualified).is_some()
    }

    /// Value expression of a named annotation attribute.
    #[must_use]
    pub fn annotation_attribute(&self, annotation: NodeId, attribute: &str) -> Option<NodeId> {
        self.children_of_kind(annotation, NodeKind::AnnotationAttribute)
            .find(|&a| self.name(a) == attribute)
            .and_then(|a| self.children(a).first().copied())
    }

    /// Initializer expression of a field or local variable.
    #[must_use]
    pub fn initializer(&self, variable: NodeId) -> Option<NodeId> {
        self.children(variable)
            .iter()
            .copied()
            .find(|&c| self.node(c).is_expression())
    }

    /// Body block of a method, constructor or catch clause.
    #[must_use]
    pub fn body(&self, id: NodeId) -> Option<NodeId> {
        self.children_of_kind(id, NodeKind::Block).next()
    }

    /// Parameters of a method, constructor or catch clause.
    pub fn parameters(&self, id: NodeId) -> impl Iterator<Item = NodeId> {
        self.children_of_kind(id, NodeKind::Parameter)
    }

    /// Every reference that resolves to `declaration`, in preorder.
    #[must_use]
    pub fn references_to(&self, declaration: NodeId) -> Vec<NodeId> {
        self.subtree(self.root())
            .filter(|&id| {
                let node = self.node(id);
                node.kind == NodeKind::Reference && node.declaration == Some(declaration)
            })
            .collect()
    }

    /// Every node of a kind, in preorder.
    pub fn nodes_of_kind(&self, kind: NodeKind) -> impl Iterator<Item = NodeId> {
        self.subtree(self.root())
            .filter(move |&id| self.kind(id) == kind)
    }
}

/// Preorder iterator over a subtree.
pub struct Subtree<'a> {
    tree: &'a SyntaxTree,
    stack: Vec<NodeId>,
}

impl Iterator for Subtree<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.stack.pop()?;
        self.stack
            .extend(self.tree.children(id).iter().rev().copied());
        Some(id)
    }
}

/// Whether a (possibly simple) type or annotation name refers to `qualified`.
///
/// `PreparedStatement`, `java.sql.PreparedStatement` and `@PreparedStatement`
/// all match `java.sql.PreparedStatement`.
#[must_use]
pub fn names_match(name: &str, qualified: &str) -> bool {
    let name = name.trim().trim_start_matches('@');
    if name == qualified {
        return true;
    }
    let simple = qualified.rsplit('.').next().unwrap_or(qualified);
    name == simple
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::TreeBuilder;

    #[test]
    fn test_language_from_path() {
        assert_eq!(Language::from_path("a/application.properties"), Language::Properties);
        assert_eq!(Language::from_path("application.YML"), Language::Yaml);
        assert_eq!(Language::from_path("Main.java"), Language::Java);
        assert_eq!(Language::from_path("Makefile"), Language::Java);
    }

    #[test]
    fn test_names_match() {
        assert!(names_match("PreparedStatement", "java.sql.PreparedStatement"));
        assert!(names_match("java.sql.PreparedStatement", "java.sql.PreparedStatement"));
        assert!(names_match(
            "@RestController",
            "org.springframework.web.bind.annotation.RestController"
        ));
        assert!(!names_match("Statement", "java.sql.PreparedStatement"));
        assert!(!names_match("sql.PreparedStatement", "java.sql.PreparedStatement"));
    }

    #[test]
    fn test_json_round_trip_links_parents() {
        let mut b = TreeBuilder::new("src/Dao.java");
        let stmt = b.reference("stmt", Some("java.sql.Statement"));
        let call = b.call(Some(stmt), "executeQuery", &[]);
        let tree = b.finish(&[call]).unwrap();

        let json = serde_json::to_string(&tree).unwrap();
        let parsed = SyntaxTree::from_json(&json).unwrap();
        assert_eq!(parsed, tree);

        let call = parsed.nodes_of_kind(NodeKind::Call).next().unwrap();
        assert_eq!(parsed.parent(call), Some(parsed.root()));
        let receiver = parsed.receiver(call).unwrap();
        assert_eq!(parsed.parent(receiver), Some(call));
        assert_eq!(parsed.arguments(call).count(), 0);
    }

    #[test]
    fn test_rejects_missing_root() {
        let json = r#"{"path": "A.java", "nodes": [{"kind": "class"}]}"#;
        let err = SyntaxTree::from_json(json).unwrap_err();
        assert!(err.to_string().contains("file root"));
    }

    #[test]
    fn test_rejects_out_of_range_child() {
        let json = r#"{"path": "A.java", "nodes": [{"kind": "file", "children": [7]}]}"#;
        let err = SyntaxTree::from_json(json).unwrap_err();
        assert!(err.to_string().contains("invalid child 7"));
    }

    #[test]
    fn test_rejects_shared_child() {
        let json = r#"{"path": "A.java", "nodes": [
            {"kind": "file", "children": [1, 2]},
            {"kind": "class", "children": [2]},
            {"kind": "method"}
        ]}"#;
        let err = SyntaxTree::from_json(json).unwrap_err();
        assert!(err.to_string().contains("more than one parent"));
    }

    #[test]
    fn test_rejects_unreachable_cycle() {
        let json = r#"{"path": "A.java", "nodes": [
            {"kind": "file"},
            {"kind": "other", "children": [2]},
            {"kind": "other", "children": [1]}
        ]}"#;
        let err = SyntaxTree::from_json(json).unwrap_err();
        assert!(err.to_string().contains("unreachable"));
    }

    #[test]
    fn test_rejects_receiver_outside_children() {
        let json = r#"{"path": "A.java", "nodes": [
            {"kind": "file", "children": [1, 2]},
            {"kind": "call", "name": "run", "receiver": 2},
            {"kind": "reference", "name": "x"}
        ]}"#;
        let err = SyntaxTree::from_json(json).unwrap_err();
        assert!(err.to_string().contains("receiver"));
    }

    #[test]
    fn test_empty_nodes_get_a_root() {
        let json = r#"{"path": "application.properties", "source": "a=b"}"#;
        let tree = SyntaxTree::from_json(json).unwrap();
        assert_eq!(tree.language(), Language::Properties);
        assert_eq!(tree.kind(tree.root()), NodeKind::File);
        assert!(tree.is_empty());
    }

    #[test]
    fn test_unresolved_line_is_sentinel() {
        let json = r#"{"path": "A.java", "nodes": [{"kind": "file", "children": [1]}, {"kind": "class"}]}"#;
        let tree = SyntaxTree::from_json(json).unwrap();
        let class = tree.children(tree.root())[0];
        assert_eq!(tree.line_of(class), UNKNOWN_LINE);
    }

    #[test]
    fn test_preorder_and_references() {
        let mut b = TreeBuilder::new("src/A.java");
        let init = b.string("x");
        let var = b.local("String", "q", Some(init));
        let r1 = b.reference_to(var);
        let use1 = b.call(Some(r1), "trim", &[]);
        let s1 = b.expr_stmt(use1);
        let r2 = b.reference_to(var);
        let s2 = b.expr_stmt(r2);
        let body = b.block(&[var, s1, s2]);
        let method = b.method(&[], "run", &[], body);
        let class = b.class(&[], "A", &[method]);
        let tree = b.finish(&[class]).unwrap();

        let kinds: Vec<NodeKind> = tree
            .subtree(tree.root())
            .map(|id| tree.kind(id))
            .take(5)
            .collect();
        assert_eq!(
            kinds,
            vec![
                NodeKind::File,
                NodeKind::Class,
                NodeKind::Method,
                NodeKind::Block,
                NodeKind::LocalVariable
            ]
        );

        let var = tree.nodes_of_kind(NodeKind::LocalVariable).next().unwrap();
        let refs = tree.references_to(var);
        assert_eq!(refs.len(), 2);
        assert!(tree.line_of(refs[0]) <= tree.line_of(refs[1]));
        let method = tree.enclosing(refs[0], &[NodeKind::Method]).unwrap();
        assert_eq!(tree.name(method), "run");
    }
}
