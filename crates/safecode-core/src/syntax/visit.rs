// SPDX-License-Identifier: Apache-2.0

//! Explicit visitor over a syntax tree.
//!
//! Visitors own their results; callbacks receive the tree and a node id and
//! record matches into fields of the implementing type.

use super::node::{NodeId, NodeKind};
use super::tree::SyntaxTree;

/// Per-kind callbacks invoked in preorder. All default to no-ops.
#[allow(unused_variables)]
pub trait Visitor {
    /// Import declaration.
    fn visit_import(&mut self, tree: &SyntaxTree, id: NodeId) {}
    /// Class declaration.
    fn visit_class(&mut self, tree: &SyntaxTree, id: NodeId) {}
    /// Method declaration.
    fn visit_method(&mut self, tree: &SyntaxTree, id: NodeId) {}
    /// Constructor declaration.
    fn visit_constructor(&mut self, tree: &SyntaxTree, id: NodeId) {}
    /// Field declaration.
    fn visit_field(&mut self, tree: &SyntaxTree, id: NodeId) {}
    /// Local variable declaration.
    fn visit_local_variable(&mut self, tree: &SyntaxTree, id: NodeId) {}
    /// Annotation.
    fn visit_annotation(&mut self, tree: &SyntaxTree, id: NodeId) {}
    /// Catch clause.
    fn visit_catch(&mut self, tree: &SyntaxTree, id: NodeId) {}
    /// Method call.
    fn visit_call(&mut self, tree: &SyntaxTree, id: NodeId) {}
    /// Object creation.
    fn visit_new(&mut self, tree: &SyntaxTree, id: NodeId) {}
    /// Binary expression.
    fn visit_binary(&mut self, tree: &SyntaxTree, id: NodeId) {}
    /// Assignment.
    fn visit_assignment(&mut self, tree: &SyntaxTree, id: NodeId) {}
}

/// Walks the whole tree in preorder.
pub fn walk<V: Visitor + ?Sized>(tree: &SyntaxTree, visitor: &mut V) {
    walk_from(tree, tree.root(), visitor);
}

/// Walks the subtree rooted at `start` in preorder, including `start`.
pub fn walk_from<V: Visitor + ?Sized>(tree: &SyntaxTree, start: NodeId, visitor: &mut V) {
    for id in tree.subtree(start) {
        match tree.kind(id) {
            NodeKind::Import => visitor.visit_import(tree, id),
            NodeKind::Class => visitor.visit_class(tree, id),
            NodeKind::Method => visitor.visit_method(tree, id),
            NodeKind::Constructor => visitor.visit_constructor(tree, id),
            NodeKind::Field => visitor.visit_field(tree, id),
            NodeKind::LocalVariable => visitor.visit_local_variable(tree, id),
            NodeKind::Annotation => visitor.visit_annotation(tree, id),
            NodeKind::Catch => visitor.visit_catch(tree, id),
            NodeKind::Call => visitor.visit_call(tree, id),
            NodeKind::New => visitor.visit_new(tree, id),
            NodeKind::Binary => visitor.visit_binary(tree, id),
            NodeKind::Assignment => visitor.visit_assignment(tree, id),
            NodeKind::File
            | NodeKind::Parameter
            | NodeKind::AnnotationAttribute
            | NodeKind::Block
            | NodeKind::ExpressionStatement
            | NodeKind::Try
            | NodeKind::Literal
            | NodeKind::Reference
            | NodeKind::Other => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::TreeBuilder;

    #[derive(Default)]
    struct CallNames(Vec<String>);

    impl Visitor for CallNames {
        fn visit_call(&mut self, tree: &SyntaxTree, id: NodeId) {
            self.0.push(tree.name(id).to_string());
        }
    }

    #[test]
    fn test_calls_visited_outer_first() {
        let mut b = TreeBuilder::new("A.java");
        let http = b.reference("http", Some("HttpSecurity"));
        let inner = b.call(Some(http), "csrf", &[]);
        let outer = b.call(Some(inner), "disable", &[]);
        let stmt = b.expr_stmt(outer);
        let tree = b.finish(&[stmt]).unwrap();

        let mut names = CallNames::default();
        walk(&tree, &mut names);
        assert_eq!(names.0, vec!["disable", "csrf"]);
    }

    #[test]
    fn test_walk_from_limits_scope() {
        let mut b = TreeBuilder::new("A.java");
        let a = b.call(None, "a", &[]);
        let sa = b.expr_stmt(a);
        let first = b.block(&[sa]);
        let c = b.call(None, "c", &[]);
        let sc = b.expr_stmt(c);
        let second = b.block(&[sc]);
        let tree = b.finish(&[first, second]).unwrap();

        let second = tree.children(tree.root())[1];
        let mut names = CallNames::default();
        walk_from(&tree, second, &mut names);
        assert_eq!(names.0, vec!["c"]);
    }
}
