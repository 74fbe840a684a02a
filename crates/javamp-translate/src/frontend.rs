//! Java front end: parses one compilation unit through the tree-sitter
//! Java grammar and exposes small node helpers.
//!
//! The translation stage never touches the source string through the tree;
//! it slices byte ranges itself and edits them through the rewriter.

use arborium_tree_sitter::{Language, Node, Parser, Tree};

use crate::diagnostics::Span;
use crate::{Error, Result};

/// Parse `source` as one Java compilation unit.
///
/// Any grammar error or missing node is unit-fatal: translating a tree the
/// grammar could not fully account for would produce garbage edits.
pub fn parse(source: &str) -> Result<Tree> {
    let language: Language = arborium_java::language().into();
    let mut parser = Parser::new();
    parser
        .set_language(&language)
        .map_err(|e| Error::Internal(format!("failed to load the Java grammar: {e}")))?;
    let tree = parser
        .parse(source, None)
        .ok_or_else(|| Error::Internal("parser returned no tree".to_owned()))?;
    if let Some(span) = first_error_span(tree.root_node()) {
        return Err(Error::Parse(span));
    }
    Ok(tree)
}

fn first_error_span(node: Node) -> Option<Span> {
    if !node.has_error() {
        return None;
    }
    if node.is_error() || node.is_missing() {
        return Some(Span::of(&node));
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if let Some(span) = first_error_span(child) {
            return Some(span);
        }
    }
    // has_error() without a visible error child: report the node itself.
    Some(Span::of(&node))
}

/// Source text of a node.
pub fn text<'s>(node: &Node, source: &'s str) -> &'s str {
    &source[node.start_byte()..node.end_byte()]
}

/// Named children, collected so call sites do not juggle cursors.
pub fn named_children<'t>(node: &Node<'t>) -> Vec<Node<'t>> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor).collect()
}

/// All children for a repeated field.
pub fn children_by_field<'t>(node: &Node<'t>, field: &str) -> Vec<Node<'t>> {
    let mut cursor = node.walk();
    node.children_by_field_name(field, &mut cursor).collect()
}

pub fn is_comment(kind: &str) -> bool {
    matches!(kind, "line_comment" | "block_comment")
}
