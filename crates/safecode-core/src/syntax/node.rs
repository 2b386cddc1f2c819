// SPDX-License-Identifier: Apache-2.0

//! Node types of the interchange syntax tree.

use serde::{Deserialize, Serialize};

/// Index of a node inside its [`SyntaxTree`](super::SyntaxTree).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    /// Position of the node in the arena.
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

/// Kind of a syntax node.
///
/// Child layout per kind:
/// - `File`: imports and classes
/// - `Class`: annotations, then members (fields, methods, constructors, classes)
/// - `Method` / `Constructor`: annotations, parameters, body block
/// - `Field` / `LocalVariable`: annotations, then at most one initializer expression
/// - `Annotation`: attributes; `AnnotationAttribute`: one value expression
/// - `Try`: block, catches, optional finally block; `Catch`: parameter, block
/// - `Call`: receiver (if any, also referenced by `receiver`) followed by arguments
/// - `New`: constructor arguments
/// - `Binary`: two or more operands joined by `operator`
/// - `Assignment`: target, value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    /// Compilation unit root.
    File,
    /// Import declaration; `name` is the qualified name.
    Import,
    /// Class, interface or enum declaration.
    Class,
    /// Method declaration.
    Method,
    /// Constructor declaration.
    Constructor,
    /// Field declaration.
    Field,
    /// Local variable declaration.
    LocalVariable,
    /// Method, constructor or catch parameter.
    Parameter,
    /// Annotation; `name` is the qualified or simple annotation name.
    Annotation,
    /// Named annotation attribute (`value`, `nativeQuery`, ...).
    AnnotationAttribute,
    /// Statement block.
    Block,
    /// Expression used as a statement.
    ExpressionStatement,
    /// Try statement.
    Try,
    /// Catch clause.
    Catch,
    /// Method call; `name` is the callee method name.
    Call,
    /// Object creation; `name` is the instantiated type.
    New,
    /// Binary or polyadic expression.
    Binary,
    /// Assignment expression.
    Assignment,
    /// Literal value.
    Literal,
    /// Identifier or qualified reference.
    Reference,
    /// Any other node (return, if, lambda, cast, ...).
    Other,
}

/// Value of a literal node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum LiteralValue {
    /// String literal, unquoted.
    String(String),
    /// Numeric literal, as written.
    Number(String),
    /// Boolean literal.
    Boolean(bool),
    /// `null`.
    Null,
}

/// A single node in the tree arena.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    /// Node kind.
    pub kind: NodeKind,
    /// Declared or referenced name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Source text of the node.
    #[serde(default)]
    pub text: String,
    /// 1-based line, when the producer could resolve it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    /// Literal value for `Literal` nodes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub literal: Option<LiteralValue>,
    /// Resolved static type (declared type for declarations).
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub type_name: Option<String>,
    /// Declaration a reference resolves to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub declaration: Option<NodeId>,
    /// Operator of `Binary` and `Assignment` nodes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operator: Option<String>,
    /// Qualifier of a `Call` node; also present in `children`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receiver: Option<NodeId>,
    /// Ordered children.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<NodeId>,
    #[serde(skip)]
    pub(crate) parent: Option<NodeId>,
}

impl Node {
    /// Creates an empty node of the given kind.
    #[must_use]
    pub fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            name: None,
            text: String::new(),
            line: None,
            literal: None,
            type_name: None,
            declaration: None,
            operator: None,
            receiver: None,
            children: Vec::new(),
            parent: None,
        }
    }

    /// Name or the empty string.
    #[must_use]
    pub fn name(&self) -> &str {
        self.name.as_deref().unwrap_or("")
    }

    /// Unquoted value if this is a string literal.
    #[must_use]
    pub fn string_value(&self) -> Option<&str> {
        match &self.literal {
            Some(LiteralValue::String(s)) => Some(s),
            _ => None,
        }
    }

    /// Whether the resolved static type is `String`.
    #[must_use]
    pub fn is_string_typed(&self) -> bool {
        matches!(
            self.type_name.as_deref(),
            Some("String" | "java.lang.String")
        ) || self.string_value().is_some()
    }

    /// Whether the node is an expression that can appear as an initializer
    /// or argument.
    #[must_use]
    pub fn is_expression(&self) -> bool {
        matches!(
            self.kind,
            NodeKind::Call
                | NodeKind::New
                | NodeKind::Binary
                | NodeKind::Assignment
                | NodeKind::Literal
                | NodeKind::Reference
                | NodeKind::Other
        )
    }
}
