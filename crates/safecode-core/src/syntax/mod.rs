// SPDX-License-Identifier: Apache-2.0

//! Owned syntax tree model.
//!
//! Parsing happens outside this crate. Integrations hand the engine a
//! [`SyntaxTree`], either deserialized from its JSON interchange form or
//! assembled with [`TreeBuilder`]. Plain-text configuration files are wrapped
//! with [`SyntaxTree::from_text`].

pub mod builder;
pub mod node;
pub mod tree;
pub mod visit;

pub use builder::TreeBuilder;
pub use node::{LiteralValue, Node, NodeId, NodeKind};
pub use tree::{Language, Subtree, SyntaxTree, names_match};
pub use visit::{Visitor, walk, walk_from};
