// SPDX-License-Identifier: Apache-2.0

//! Programmatic tree construction.
//!
//! Nodes are created bottom-up: build the children first, then pass their ids
//! to the parent constructor. Node text is synthesized from structure, so
//! textual heuristics see Java-like source.
//!
//! ```rust
//! use safecode_core::syntax::TreeBuilder;
//!
//! let mut b = TreeBuilder::new("src/UserDao.java");
//! let sql = b.string("SELECT * FROM users WHERE id=");
//! let id = b.reference("userId", Some("java.lang.String"));
//! let query = b.binary("+", &[sql, id]);
//! let stmt = b.reference("stmt", Some("java.sql.Statement"));
//! let call = b.call(Some(stmt), "executeQuery", &[query]);
//! assert_eq!(b.text(call), "stmt.executeQuery(\"SELECT * FROM users WHERE id=\" + userId)");
//! ```

use super::node::{LiteralValue, Node, NodeId, NodeKind};
use super::tree::{Language, SyntaxTree};
use crate::Result;

/// Builds a [`SyntaxTree`] node by node.
#[derive(Debug)]
pub struct TreeBuilder {
    path: String,
    language: Language,
    source: String,
    nodes: Vec<Node>,
    line: Option<usize>,
}

impl TreeBuilder {
    /// Starts a tree for `path`; nodes are placed on line 1 until moved.
    #[must_use]
    pub fn new(path: impl Into<String>) -> Self {
        let path = path.into();
        Self {
            language: Language::from_path(&path),
            path,
            source: String::new(),
            nodes: Vec::new(),
            line: Some(1),
        }
    }

    /// Places subsequently created nodes on `line`.
    pub fn at_line(&mut self, line: usize) -> &mut Self {
        self.line = Some(line);
        self
    }

    /// Creates subsequent nodes without a resolved line.
    pub fn without_line(&mut self) -> &mut Self {
        self.line = None;
        self
    }

    /// Moves an existing node to `line`.
    pub fn set_line(&mut self, id: NodeId, line: usize) -> NodeId {
        self.nodes[id.0].line = Some(line);
        id
    }

    /// Sets the resolved static type of an existing node.
    pub fn typed(&mut self, id: NodeId, type_name: &str) -> NodeId {
        self.nodes[id.0].type_name = Some(type_name.to_string());
        id
    }

    /// Attaches raw source text to the tree.
    pub fn source(&mut self, source: impl Into<String>) -> &mut Self {
        self.source = source.into();
        self
    }

    /// Synthesized text of a node built so far.
    #[must_use]
    pub fn text(&self, id: NodeId) -> &str {
        &self.nodes[id.0].text
    }

    fn push(&mut self, mut node: Node) -> NodeId {
        node.line = self.line;
        self.nodes.push(node);
        NodeId(self.nodes.len() - 1)
    }

    fn node(kind: NodeKind, name: Option<&str>, text: String, children: &[NodeId]) -> Node {
        let mut node = Node::new(kind);
        node.name = name.map(str::to_string);
        node.text = text;
        node.children = children.to_vec();
        node
    }

    fn joined(&self, ids: &[NodeId], sep: &str) -> String {
        ids.iter()
            .map(|id| self.text(*id))
            .collect::<Vec<_>>()
            .join(sep)
    }

    // ------------------------------------------------------------------
    // Expressions
    // ------------------------------------------------------------------

    /// String literal.
    pub fn string(&mut self, value: &str) -> NodeId {
        let mut node = Self::node(NodeKind::Literal, None, format!("\"{value}\""), &[]);
        node.literal = Some(LiteralValue::String(value.to_string()));
        node.type_name = Some("java.lang.String".to_string());
        self.push(node)
    }

    /// Numeric literal.
    pub fn number(&mut self, value: &str) -> NodeId {
        let mut node = Self::node(NodeKind::Literal, None, value.to_string(), &[]);
        node.literal = Some(LiteralValue::Number(value.to_string()));
        node.type_name = Some("int".to_string());
        self.push(node)
    }

    /// Boolean literal.
    pub fn boolean(&mut self, value: bool) -> NodeId {
        let mut node = Self::node(NodeKind::Literal, None, value.to_string(), &[]);
        node.literal = Some(LiteralValue::Boolean(value));
        node.type_name = Some("boolean".to_string());
        self.push(node)
    }

    /// `null` literal.
    pub fn null(&mut self) -> NodeId {
        let mut node = Self::node(NodeKind::Literal, None, "null".to_string(), &[]);
        node.literal = Some(LiteralValue::Null);
        self.push(node)
    }

    /// Unresolved (or externally typed) reference.
    pub fn reference(&mut self, name: &str, type_name: Option<&str>) -> NodeId {
        let mut node = Self::node(NodeKind::Reference, Some(name), name.to_string(), &[]);
        node.type_name = type_name.map(str::to_string);
        self.push(node)
    }

    /// Reference resolved to a declaration, inheriting its name and type.
    pub fn reference_to(&mut self, declaration: NodeId) -> NodeId {
        let decl = &self.nodes[declaration.0];
        let name = decl.name().to_string();
        let type_name = decl.type_name.clone();
        let mut node = Self::node(NodeKind::Reference, Some(&name), name.clone(), &[]);
        node.type_name = type_name;
        node.declaration = Some(declaration);
        self.push(node)
    }

    /// Binary or polyadic expression.
    ///
    /// `+` with a string-typed operand is typed `String`; comparison and
    /// logical operators are typed `boolean`.
    pub fn binary(&mut self, operator: &str, operands: &[NodeId]) -> NodeId {
        let text = self.joined(operands, &format!(" {operator} "));
        let type_name = match operator {
            "+" if operands.iter().any(|&o| self.nodes[o.0].is_string_typed()) => {
                Some("java.lang.String")
            }
            "<" | ">" | "<=" | ">=" | "==" | "!=" | "&&" | "||" => Some("boolean"),
            _ => operands
                .first()
                .and_then(|&o| self.nodes[o.0].type_name.as_deref())
                .filter(|t| matches!(*t, "int" | "long" | "double" | "float")),
        }
        .map(str::to_string);

        let mut node = Self::node(NodeKind::Binary, None, text, operands);
        node.operator = Some(operator.to_string());
        node.type_name = type_name;
        self.push(node)
    }

    /// Method call, optionally qualified by a receiver.
    pub fn call(&mut self, receiver: Option<NodeId>, name: &str, args: &[NodeId]) -> NodeId {
        let args_text = self.joined(args, ", ");
        let text = match receiver {
            Some(r) => format!("{}.{name}({args_text})", self.text(r)),
            None => format!("{name}({args_text})"),
        };
        let mut children = Vec::with_capacity(args.len() + 1);
        children.extend(receiver);
        children.extend_from_slice(args);

        let mut node = Self::node(NodeKind::Call, Some(name), text, &children);
        node.receiver = receiver;
        self.push(node)
    }

    /// Object creation (`new T(args)`).
    pub fn new_object(&mut self, type_name: &str, args: &[NodeId]) -> NodeId {
        let text = format!("new {type_name}({})", self.joined(args, ", "));
        let mut node = Self::node(NodeKind::New, Some(type_name), text, args);
        node.type_name = Some(type_name.to_string());
        self.push(node)
    }

    /// Assignment `target = value`.
    pub fn assign(&mut self, target: NodeId, value: NodeId) -> NodeId {
        let text = format!("{} = {}", self.text(target), self.text(value));
        let type_name = self.nodes[target.0].type_name.clone();
        let mut node = Self::node(NodeKind::Assignment, None, text, &[target, value]);
        node.operator = Some("=".to_string());
        node.type_name = type_name;
        self.push(node)
    }

    // ------------------------------------------------------------------
    // Statements
    // ------------------------------------------------------------------

    /// Expression statement.
    pub fn expr_stmt(&mut self, expr: NodeId) -> NodeId {
        let text = format!("{};", self.text(expr));
        let node = Self::node(NodeKind::ExpressionStatement, None, text, &[expr]);
        self.push(node)
    }

    /// Local variable declaration.
    pub fn local(&mut self, type_name: &str, name: &str, init: Option<NodeId>) -> NodeId {
        self.variable(NodeKind::LocalVariable, &[], type_name, name, init)
    }

    /// Statement block.
    pub fn block(&mut self, statements: &[NodeId]) -> NodeId {
        let body = self.joined(statements, "\n    ");
        let text = if statements.is_empty() {
            "{}".to_string()
        } else {
            format!("{{\n    {body}\n}}")
        };
        let node = Self::node(NodeKind::Block, None, text, statements);
        self.push(node)
    }

    /// Catch clause.
    pub fn catch(&mut self, exception_type: &str, name: &str, body: NodeId) -> NodeId {
        let param = self.parameter(exception_type, name);
        let text = format!(
            "catch ({exception_type} {name}) {}",
            self.text(body)
        );
        let node = Self::node(NodeKind::Catch, None, text, &[param, body]);
        self.push(node)
    }

    /// Try statement with catch clauses.
    pub fn try_catch(&mut self, body: NodeId, catches: &[NodeId]) -> NodeId {
        let text = format!("try {} {}", self.text(body), self.joined(catches, " "));
        let mut children = vec![body];
        children.extend_from_slice(catches);
        let node = Self::node(NodeKind::Try, None, text, &children);
        self.push(node)
    }

    /// Any other statement or expression with explicit text.
    pub fn other(&mut self, text: &str, children: &[NodeId]) -> NodeId {
        let node = Self::node(NodeKind::Other, None, text.to_string(), children);
        self.push(node)
    }

    // ------------------------------------------------------------------
    // Declarations
    // ------------------------------------------------------------------

    /// Import declaration.
    pub fn import(&mut self, qualified: &str) -> NodeId {
        let node = Self::node(
            NodeKind::Import,
            Some(qualified),
            format!("import {qualified};"),
            &[],
        );
        self.push(node)
    }

    /// Annotation with named attributes.
    ///
    /// A lone `value` attribute renders in the short form `@Name(value)`.
    pub fn annotation(&mut self, name: &str, attributes: &[(&str, NodeId)]) -> NodeId {
        let mut children = Vec::with_capacity(attributes.len());
        let mut rendered = Vec::with_capacity(attributes.len());
        for &(attr, value) in attributes {
            let value_text = self.text(value).to_string();
            let text = format!("{attr} = {value_text}");
            let node =
                Self::node(NodeKind::AnnotationAttribute, Some(attr), text.clone(), &[value]);
            children.push(self.push(node));
            rendered.push(if attr == "value" && attributes.len() == 1 {
                value_text
            } else {
                text
            });
        }

        let simple = name.rsplit('.').next().unwrap_or(name);
        let text = if rendered.is_empty() {
            format!("@{simple}")
        } else {
            format!("@{simple}({})", rendered.join(", "))
        };
        let node = Self::node(NodeKind::Annotation, Some(name), text, &children);
        self.push(node)
    }

    /// Method, constructor or catch parameter.
    pub fn parameter(&mut self, type_name: &str, name: &str) -> NodeId {
        let mut node = Self::node(
            NodeKind::Parameter,
            Some(name),
            format!("{type_name} {name}"),
            &[],
        );
        node.type_name = Some(type_name.to_string());
        self.push(node)
    }

    /// Field declaration.
    pub fn field(
        &mut self,
        annotations: &[NodeId],
        type_name: &str,
        name: &str,
        init: Option<NodeId>,
    ) -> NodeId {
        self.variable(NodeKind::Field, annotations, type_name, name, init)
    }

    fn variable(
        &mut self,
        kind: NodeKind,
        annotations: &[NodeId],
        type_name: &str,
        name: &str,
        init: Option<NodeId>,
    ) -> NodeId {
        let prefix = self.annotation_prefix(annotations);
        let text = match init {
            Some(i) => format!("{prefix}{type_name} {name} = {};", self.text(i)),
            None => format!("{prefix}{type_name} {name};"),
        };
        let mut children = annotations.to_vec();
        children.extend(init);
        let mut node = Self::node(kind, Some(name), text, &children);
        node.type_name = Some(type_name.to_string());
        self.push(node)
    }

    fn annotation_prefix(&self, annotations: &[NodeId]) -> String {
        annotations
            .iter()
            .map(|a| format!("{}\n", self.text(*a)))
            .collect()
    }

    /// Method declaration.
    pub fn method(
        &mut self,
        annotations: &[NodeId],
        name: &str,
        params: &[NodeId],
        body: NodeId,
    ) -> NodeId {
        self.callable(NodeKind::Method, annotations, name, params, body)
    }

    /// Constructor declaration.
    pub fn constructor(
        &mut self,
        annotations: &[NodeId],
        name: &str,
        params: &[NodeId],
        body: NodeId,
    ) -> NodeId {
        self.callable(NodeKind::Constructor, annotations, name, params, body)
    }

    fn callable(
        &mut self,
        kind: NodeKind,
        annotations: &[NodeId],
        name: &str,
        params: &[NodeId],
        body: NodeId,
    ) -> NodeId {
        let prefix = self.annotation_prefix(annotations);
        let ret = if kind == NodeKind::Method { "void " } else { "" };
        let text = format!(
            "{prefix}public {ret}{name}({}) {}",
            self.joined(params, ", "),
            self.text(body)
        );
        let mut children = annotations.to_vec();
        children.extend_from_slice(params);
        children.push(body);
        let node = Self::node(kind, Some(name), text, &children);
        self.push(node)
    }

    /// Class declaration.
    pub fn class(&mut self, annotations: &[NodeId], name: &str, members: &[NodeId]) -> NodeId {
        let prefix = self.annotation_prefix(annotations);
        let text = format!(
            "{prefix}public class {name} {{\n{}\n}}",
            self.joined(members, "\n\n")
        );
        let mut children = annotations.to_vec();
        children.extend_from_slice(members);
        let node = Self::node(NodeKind::Class, Some(name), text, &children);
        self.push(node)
    }

    /// Wraps `items` in a file root and validates the tree.
    ///
    /// The root is placed at index 0; every id handed out by this builder is
    /// shifted by one in the finished tree.
    pub fn finish(self, items: &[NodeId]) -> Result<SyntaxTree> {
        let shift = |id: NodeId| NodeId(id.0 + 1);

        let mut root = Node::new(NodeKind::File);
        root.text = items
            .iter()
            .map(|id| self.nodes[id.0].text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");
        root.children = items.iter().copied().map(shift).collect();
        root.line = Some(1);

        let mut nodes = Vec::with_capacity(self.nodes.len() + 1);
        nodes.push(root);
        for mut node in self.nodes {
            node.children = node.children.into_iter().map(shift).collect();
            node.receiver = node.receiver.map(shift);
            node.declaration = node.declaration.map(shift);
            nodes.push(node);
        }

        SyntaxTree::new(self.path, self.language, self.source, nodes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_binary_typing() {
        let mut b = TreeBuilder::new("A.java");
        let one = b.number("1");
        let two = b.number("2");
        let sum = b.binary("+", &[one, two]);
        assert_eq!(b.nodes[sum.0].type_name.as_deref(), Some("int"));

        let s = b.string("id=");
        let concat = b.binary("+", &[s, one]);
        assert!(b.nodes[concat.0].is_string_typed());
        assert_eq!(b.text(concat), "\"id=\" + 1");

        let len = b.reference("len", Some("int"));
        let cmp = b.binary("<", &[len, two]);
        assert_eq!(b.nodes[cmp.0].type_name.as_deref(), Some("boolean"));
    }

    #[test]
    fn test_annotation_text() {
        let mut b = TreeBuilder::new("A.java");
        let path = b.string("/users");
        let short = b.annotation(
            "org.springframework.web.bind.annotation.GetMapping",
            &[("value", path)],
        );
        assert_eq!(b.text(short), "@GetMapping(\"/users\")");

        let flag = b.boolean(true);
        let sql = b.string("SELECT * FROM t WHERE id = ?1");
        let long = b.annotation("Query", &[("value", sql), ("nativeQuery", flag)]);
        assert_eq!(
            b.text(long),
            "@Query(value = \"SELECT * FROM t WHERE id = ?1\", nativeQuery = true)"
        );
    }

    #[test]
    fn test_finish_shifts_ids() {
        let mut b = TreeBuilder::new("A.java");
        let init = b.string("v");
        let var = b.local("String", "x", Some(init));
        let r = b.reference_to(var);
        let stmt = b.expr_stmt(r);
        let body = b.block(&[var, stmt]);
        let m = b.method(&[], "m", &[], body);
        let tree = b.finish(&[m]).unwrap();

        let reference = tree.nodes_of_kind(NodeKind::Reference).next().unwrap();
        let decl = tree.node(reference).declaration.unwrap();
        assert_eq!(tree.kind(decl), NodeKind::LocalVariable);
        assert_eq!(tree.name(decl), "x");
        assert_eq!(tree.initializer(decl).map(|i| tree.text(i)), Some("\"v\""));
    }

    #[test]
    fn test_lines_follow_cursor() {
        let mut b = TreeBuilder::new("A.java");
        b.at_line(7);
        let lit = b.string("a");
        b.without_line();
        let other = b.string("b");
        let tree = b.finish(&[lit, other]).unwrap();

        let literals: Vec<NodeId> = tree.nodes_of_kind(NodeKind::Literal).collect();
        assert_eq!(tree.line_of(literals[0]), 7);
        assert_eq!(tree.line_of(literals[1]), crate::finding::UNKNOWN_LINE);
    }
}
