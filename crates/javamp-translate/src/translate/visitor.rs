//! Capture analysis and identifier rewriting for one directive region.
//!
//! The visitor walks the region subtree with an explicit class stack and
//! classifies every name-bearing construct: simple expression names, method
//! invocations, `this` primaries, and nested class bodies. Names that
//! resolve to an outer local, parameter, or field are rewritten to a field
//! access on the directive's context object; names the translator does not
//! own are left alone.
//!
//! Node-kind dispatch is a single match table so the classification is
//! exhaustive by inspection, not spread over dynamic dispatch.

use arborium_tree_sitter::Node;
use indexmap::IndexSet;
use log::{debug, trace};

use javamp_core::{ClassId, Variable, array_less};

use crate::analyze::ClassIndex;
use crate::analyze::scope;
use crate::diagnostics::{Diagnostics, Span};
use crate::frontend::{children_by_field, is_comment, named_children, text};
use crate::rewrite::Rewriter;
use crate::{Error, Result};

/// One enclosing team's translation facts, nearest team first in the chain
/// handed to the visitor. A name already captured by an enclosing team is
/// re-captured from that team's context instead of being re-discovered.
#[derive(Clone, Debug)]
pub(crate) struct TeamLink {
    pub ctx_var: String,
    pub exec_var: String,
    pub class: ClassId,
    pub captured: IndexSet<Variable>,
    pub captured_this: bool,
    pub privatized: IndexSet<String>,
}

/// What one walk contributed: captures new to this directive only.
#[derive(Debug, Default)]
pub(crate) struct VisitOutcome {
    pub captured: IndexSet<Variable>,
    pub captured_this: bool,
}

struct Resolution {
    ctx_var: String,
    exec_var: String,
    var: Variable,
    privatized: bool,
    own: bool,
}

pub(crate) struct Visitor<'a, 't, 's> {
    rw: &'a mut Rewriter<'s>,
    source: &'s str,
    classes: &'a ClassIndex,
    diags: &'a mut Diagnostics,
    region: Node<'t>,
    directive_class: ClassId,
    ctx_var: String,
    exec_var: String,
    privatized: IndexSet<String>,
    links: &'a [TeamLink],
    locals: indexmap::IndexMap<String, Variable>,
    params: indexmap::IndexMap<String, Variable>,
    class_stack: Vec<ClassId>,
    captured: IndexSet<Variable>,
    captured_this: bool,
}

impl<'a, 't, 's> Visitor<'a, 't, 's> {
    pub fn new(
        rw: &'a mut Rewriter<'s>,
        source: &'s str,
        classes: &'a ClassIndex,
        diags: &'a mut Diagnostics,
        region: Node<'t>,
        ctx_var: String,
        exec_var: String,
        privatized: IndexSet<String>,
        links: &'a [TeamLink],
    ) -> Result<Self> {
        let mut class_stack = classes.parent_classes(&region);
        class_stack.reverse();
        let Some(&directive_class) = class_stack.last() else {
            return Err(Error::Parse(Span::of(&region)));
        };
        let locals = scope::inherited_locals(&region, source, directive_class);
        let params = scope::inherited_params(&region, source, directive_class);
        Ok(Self {
            rw,
            source,
            classes,
            diags,
            region,
            directive_class,
            ctx_var,
            exec_var,
            privatized,
            links,
            locals,
            params,
            class_stack,
            captured: IndexSet::new(),
            captured_this: false,
        })
    }

    pub fn walk(mut self) -> Result<VisitOutcome> {
        self.visit(self.region)?;
        if self.class_stack.last() != Some(&self.directive_class) {
            return Err(Error::Internal(
                "class stack unbalanced after region walk".to_owned(),
            ));
        }
        Ok(VisitOutcome {
            captured: self.captured,
            captured_this: self.captured_this,
        })
    }

    fn visit(&mut self, node: Node<'t>) -> Result<()> {
        match node.kind() {
            "identifier" => self.handle_identifier(node),
            "this" => self.handle_this(node),
            "field_access" => self.handle_field_access(node),
            "method_invocation" => self.handle_method_invocation(node),
            "method_reference" => self.handle_method_reference(node),
            // `this(...)` / `super(...)` delegate calls: only the arguments
            // are expressions.
            "explicit_constructor_invocation" => {
                match node.child_by_field_name("arguments") {
                    Some(args) => self.visit(args),
                    None => Ok(()),
                }
            }

            "class_declaration"
            | "interface_declaration"
            | "enum_declaration"
            | "record_declaration" => match node.child_by_field_name("body") {
                Some(body) => self.visit_class_body(body),
                None => Ok(()),
            },
            "object_creation_expression" => {
                for child in named_children(&node) {
                    match child.kind() {
                        "class_body" => self.visit_class_body(child)?,
                        "argument_list" => self.visit(child)?,
                        k if is_skippable(k) => {}
                        // A qualified `outer.new Inner()` receiver.
                        _ => self.visit(child)?,
                    }
                }
                Ok(())
            }
            "enum_constant" => {
                for child in named_children(&node) {
                    match child.kind() {
                        "class_body" => self.visit_class_body(child)?,
                        "argument_list" => self.visit(child)?,
                        _ => {}
                    }
                }
                Ok(())
            }

            "method_declaration" | "constructor_declaration" | "compact_constructor_declaration" => {
                match node.child_by_field_name("body") {
                    Some(body) => self.visit(body),
                    None => Ok(()),
                }
            }
            "lambda_expression" => match node.child_by_field_name("body") {
                Some(body) => self.visit(body),
                None => Ok(()),
            },

            "local_variable_declaration" | "field_declaration" | "constant_declaration" => {
                for declarator in children_by_field(&node, "declarator") {
                    if let Some(value) = declarator.child_by_field_name("value") {
                        self.visit(value)?;
                    }
                }
                Ok(())
            }
            "variable_declarator" => match node.child_by_field_name("value") {
                Some(value) => self.visit(value),
                None => Ok(()),
            },
            "enhanced_for_statement" => {
                if let Some(value) = node.child_by_field_name("value") {
                    self.visit(value)?;
                }
                match node.child_by_field_name("body") {
                    Some(body) => self.visit(body),
                    None => Ok(()),
                }
            }
            "catch_clause" => match node.child_by_field_name("body") {
                Some(body) => self.visit(body),
                None => Ok(()),
            },
            "resource" => match node.child_by_field_name("value") {
                Some(value) => self.visit(value),
                // `try (existing)` re-uses a variable: that is a use.
                None => self.visit_children(node),
            },
            "labeled_statement" => {
                for child in named_children(&node).into_iter().skip(1) {
                    self.visit(child)?;
                }
                Ok(())
            }
            "break_statement" | "continue_statement" => Ok(()),
            "cast_expression" => match node.child_by_field_name("value") {
                Some(value) => self.visit(value),
                None => Ok(()),
            },
            "instanceof_expression" => match node.child_by_field_name("left") {
                Some(left) => self.visit(left),
                None => Ok(()),
            },

            k if is_skippable(k) => Ok(()),
            _ => self.visit_children(node),
        }
    }

    fn visit_children(&mut self, node: Node<'t>) -> Result<()> {
        for child in named_children(&node) {
            if !is_comment(child.kind()) {
                self.visit(child)?;
            }
        }
        Ok(())
    }

    fn visit_class_body(&mut self, body: Node<'t>) -> Result<()> {
        let Some(id) = self.classes.class_for_body(&body) else {
            // The tree says class body, the map has never seen it.
            return Err(Error::Parse(Span::of(&body)));
        };
        self.class_stack.push(id);
        let result = self.visit_children(body);
        self.class_stack.pop();
        result
    }

    fn at_directive_class(&self) -> bool {
        self.class_stack.last() == Some(&self.directive_class)
    }

    /// A name that resolves to a field of a class entered *inside* the
    /// region belongs to that class, not to the directive scope.
    fn nested_class_field(&self, name: &str) -> bool {
        for &cid in self.class_stack.iter().rev() {
            if cid == self.directive_class {
                break;
            }
            if self.classes.arena.find_field(cid, name).is_some() {
                return true;
            }
        }
        false
    }

    fn link_resolution(&self, link: &TeamLink, var: &Variable) -> Resolution {
        Resolution {
            ctx_var: link.ctx_var.clone(),
            exec_var: link.exec_var.clone(),
            var: var.clone(),
            privatized: link.privatized.contains(&var.name),
            own: false,
        }
    }

    fn own_resolution(&self, var: Variable) -> Resolution {
        Resolution {
            ctx_var: self.ctx_var.clone(),
            exec_var: self.exec_var.clone(),
            privatized: self.privatized.contains(&var.name),
            var,
            own: true,
        }
    }

    /// Classification order for a simple name: enclosing-team captures of
    /// the same scope first, then locals, parameters, and the inheritance
    /// chain, then teams beyond the nearest class boundary. Failure means
    /// the name is not ours to rewrite.
    fn resolve_name(&self, name: &str) -> Option<Resolution> {
        let bare = array_less(name);
        for link in self.links.iter().filter(|l| l.class == self.directive_class) {
            if let Some(v) = Variable::find(bare, &link.captured) {
                return Some(self.link_resolution(link, v));
            }
        }
        if let Some(v) = self.locals.get(bare) {
            return Some(self.own_resolution(v.clone()));
        }
        if let Some(v) = self.params.get(bare) {
            return Some(self.own_resolution(v.clone()));
        }
        if let Some(v) = self.classes.arena.find_field(self.directive_class, bare) {
            return Some(self.own_resolution(v));
        }
        for link in self.links.iter().filter(|l| l.class != self.directive_class) {
            if let Some(v) = Variable::find(bare, &link.captured) {
                return Some(self.link_resolution(link, v));
            }
        }
        None
    }

    /// Field-only resolution for `this.<field>` receivers.
    fn resolve_field(&self, name: &str) -> Option<Resolution> {
        let is_field = |v: &&Variable| matches!(v.kind, javamp_core::VarKind::Field(_));
        for link in self.links.iter().filter(|l| l.class == self.directive_class) {
            if let Some(v) = link.captured.iter().filter(is_field).find(|v| v.name == name) {
                return Some(self.link_resolution(link, v));
            }
        }
        if let Some(v) = self.classes.arena.find_field(self.directive_class, name) {
            return Some(self.own_resolution(v));
        }
        for link in self.links.iter().filter(|l| l.class != self.directive_class) {
            if let Some(v) = link.captured.iter().filter(is_field).find(|v| v.name == name) {
                return Some(self.link_resolution(link, v));
            }
        }
        None
    }

    fn extension(&self, resolution: &Resolution) -> String {
        if resolution.privatized {
            format!("[{}.getThreadNum()]", resolution.exec_var)
        } else {
            String::new()
        }
    }

    fn rewrite_to(&mut self, start: usize, end: usize, resolution: Resolution) {
        let ext = self.extension(&resolution);
        self.rw.replace(
            start,
            end,
            format!("{}.{}{}", resolution.ctx_var, resolution.var.full_name(), ext),
        );
        if resolution.own {
            debug!(
                "captured `{}` as {} via {}",
                resolution.var.name,
                resolution.var.full_name(),
                resolution.ctx_var
            );
            self.captured.insert(resolution.var);
        }
    }

    fn handle_identifier(&mut self, node: Node<'t>) -> Result<()> {
        let name = text(&node, self.source);
        if scope::region_declares(name, &node, &self.region, self.source) {
            return Ok(());
        }
        if !self.at_directive_class() && self.nested_class_field(name) {
            return Ok(());
        }
        match self.resolve_name(name) {
            Some(resolution) => {
                self.rewrite_to(node.start_byte(), node.end_byte(), resolution);
            }
            None => trace!("`{name}` is not a capturable identifier"),
        }
        Ok(())
    }

    /// The replacement for a `this` of the directive class, and the place
    /// where `capturedThis` is decided: an enclosing team of the same scope
    /// that already captured `this` wins, otherwise this directive owns it.
    fn this_replacement(&mut self) -> String {
        for link in self.links {
            if link.captured_this && link.class == self.directive_class {
                return format!("{}.THAT", link.ctx_var);
            }
        }
        self.captured_this = true;
        format!("{}.THAT", self.ctx_var)
    }

    fn handle_this(&mut self, node: Node<'t>) -> Result<()> {
        if !self.at_directive_class() {
            // `this` of an anonymous or local class entered inside the
            // region keeps its meaning in the generated worker.
            return Ok(());
        }
        let replacement = self.this_replacement();
        self.rw.replace(node.start_byte(), node.end_byte(), replacement);
        Ok(())
    }

    fn handle_field_access(&mut self, node: Node<'t>) -> Result<()> {
        let (Some(object), Some(field)) = (
            node.child_by_field_name("object"),
            node.child_by_field_name("field"),
        ) else {
            return self.visit_children(node);
        };
        // `Outer.this` stays lexically valid inside the generated worker.
        if field.kind() == "this" {
            return Ok(());
        }
        match object.kind() {
            "this" => {
                if !self.at_directive_class() {
                    return Ok(());
                }
                let name = text(&field, self.source);
                match self.resolve_field(name) {
                    Some(resolution) => {
                        if resolution.own {
                            self.captured_this = true;
                        }
                        self.rewrite_to(node.start_byte(), node.end_byte(), resolution);
                    }
                    None => {
                        // Unknown field, e.g. inherited from an external
                        // supertype: keep the member access, reroute the
                        // receiver.
                        let replacement = self.this_replacement();
                        self.rw
                            .replace(object.start_byte(), object.end_byte(), replacement);
                    }
                }
                Ok(())
            }
            "super" => {
                self.diags.warning(
                    Span::of(&node),
                    "`super` access inside a parallel region resolves against the generated worker class",
                );
                Ok(())
            }
            _ => self.visit(object),
        }
    }

    fn handle_method_invocation(&mut self, node: Node<'t>) -> Result<()> {
        if let Some(object) = node.child_by_field_name("object") {
            match object.kind() {
                "this" => {
                    if self.at_directive_class() {
                        let replacement = self.this_replacement();
                        self.rw
                            .replace(object.start_byte(), object.end_byte(), replacement);
                    }
                }
                "super" => {
                    self.diags.warning(
                        Span::of(&object),
                        "`super` call inside a parallel region resolves against the generated worker class",
                    );
                }
                _ => self.visit(object)?,
            }
        }
        match node.child_by_field_name("arguments") {
            Some(args) => self.visit(args),
            None => Ok(()),
        }
    }

    fn handle_method_reference(&mut self, node: Node<'t>) -> Result<()> {
        let Some(first) = named_children(&node).into_iter().next() else {
            return Ok(());
        };
        match first.kind() {
            "this" => self.handle_this(first),
            "identifier" => self.handle_identifier(first),
            k if is_skippable(k) => Ok(()),
            _ => self.visit(first),
        }
    }
}

/// Kinds with no capturable expression inside: types, labels, annotations,
/// parameter lists, case constants.
fn is_skippable(kind: &str) -> bool {
    matches!(
        kind,
        "type_identifier"
            | "scoped_type_identifier"
            | "scoped_identifier"
            | "generic_type"
            | "array_type"
            | "integral_type"
            | "floating_point_type"
            | "boolean_type"
            | "void_type"
            | "type_arguments"
            | "type_parameters"
            | "dimensions"
            | "modifiers"
            | "annotation"
            | "marker_annotation"
            | "inferred_parameters"
            | "formal_parameters"
            | "switch_label"
            | "super"
            | "line_comment"
            | "block_comment"
    )
}
