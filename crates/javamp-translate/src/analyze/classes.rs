//! Class discovery: one walk over the unit builds the arena and the map
//! from class-body nodes to arena ids.

use std::collections::HashMap;

use arborium_tree_sitter::Node;

use javamp_core::{ClassArena, ClassEntry, ClassId, ClassKind, Variable};

use crate::frontend::{children_by_field, named_children, text};

/// Frozen class model of one compilation unit.
#[derive(Debug, Default)]
pub struct ClassIndex {
    pub arena: ClassArena,
    by_body: HashMap<usize, ClassId>,
}

pub(crate) fn is_class_body(kind: &str) -> bool {
    matches!(
        kind,
        "class_body" | "interface_body" | "enum_body" | "annotation_type_body"
    )
}

pub(crate) fn has_modifier(decl: &Node, source: &str, word: &str) -> bool {
    named_children(decl)
        .iter()
        .filter(|c| c.kind() == "modifiers")
        .any(|m| text(m, source).split_whitespace().any(|w| w == word))
}

/// Strip type arguments off a supertype reference (`Base<T>` -> `Base`).
fn simple_type_name(type_text: &str) -> &str {
    match type_text.find('<') {
        Some(pos) => type_text[..pos].trim(),
        None => type_text.trim(),
    }
}

impl ClassIndex {
    /// Build the index for a unit. Infallible: nodes the walk does not
    /// understand simply contribute no classes.
    pub fn build(root: Node, source: &str) -> Self {
        let mut index = Self::default();
        let mut pending: Vec<(ClassId, String)> = Vec::new();
        index.discover(root, source, None, &mut pending);
        for (id, super_name) in pending {
            let resolved = index.arena.find_by_name(&super_name);
            index.arena.get_mut(id).superclass = resolved;
        }
        index
    }

    pub fn class_for_body(&self, node: &Node) -> Option<ClassId> {
        self.by_body.get(&node.id()).copied()
    }

    /// Enclosing classes of `node`, innermost first.
    pub fn parent_classes(&self, node: &Node) -> Vec<ClassId> {
        let mut out = Vec::new();
        let mut current = node.parent();
        while let Some(n) = current {
            if let Some(id) = self.by_body.get(&n.id()) {
                out.push(*id);
            }
            current = n.parent();
        }
        out
    }

    pub fn enclosing_class(&self, node: &Node) -> Option<ClassId> {
        self.parent_classes(node).first().copied()
    }

    fn discover(
        &mut self,
        node: Node,
        source: &str,
        enclosing: Option<ClassId>,
        pending: &mut Vec<(ClassId, String)>,
    ) {
        match node.kind() {
            "class_declaration"
            | "interface_declaration"
            | "enum_declaration"
            | "record_declaration" => {
                let name = node
                    .child_by_field_name("name")
                    .map(|n| text(&n, source).to_owned())
                    .unwrap_or_else(|| "<unnamed>".to_owned());
                let kind = if enclosing.is_none() {
                    ClassKind::Top
                } else if node.parent().is_some_and(|p| {
                    is_class_body(p.kind()) || p.kind() == "enum_body_declarations"
                }) {
                    ClassKind::Inner
                } else {
                    ClassKind::Local
                };
                let id = self.arena.push(ClassEntry {
                    name,
                    kind,
                    superclass: None,
                    enclosing,
                    fields: Vec::new(),
                });
                if let Some(sup) = node.child_by_field_name("superclass") {
                    if let Some(ty) = named_children(&sup).last() {
                        pending.push((id, simple_type_name(text(ty, source)).to_owned()));
                    }
                }
                if let Some(body) = node.child_by_field_name("body") {
                    self.by_body.insert(body.id(), id);
                    let fields = collect_fields(&body, source, id);
                    self.arena.get_mut(id).fields = fields;
                    self.discover(body, source, Some(id), pending);
                }
            }
            "object_creation_expression" | "enum_constant" => {
                let body = named_children(&node)
                    .into_iter()
                    .find(|c| c.kind() == "class_body");
                match body {
                    Some(body) => {
                        let super_name = node
                            .child_by_field_name("type")
                            .map(|t| simple_type_name(text(&t, source)).to_owned());
                        let name = format!(
                            "{}${}",
                            super_name.as_deref().unwrap_or("anonymous"),
                            self.arena.len()
                        );
                        let id = self.arena.push(ClassEntry {
                            name,
                            kind: ClassKind::Anonymous,
                            superclass: if node.kind() == "enum_constant" {
                                // An enum constant body subclasses its enum.
                                enclosing
                            } else {
                                None
                            },
                            enclosing,
                            fields: Vec::new(),
                        });
                        if let Some(super_name) = super_name {
                            pending.push((id, super_name));
                        }
                        self.by_body.insert(body.id(), id);
                        let fields = collect_fields(&body, source, id);
                        self.arena.get_mut(id).fields = fields;
                        for child in named_children(&node) {
                            let inside = if child.id() == body.id() { Some(id) } else { enclosing };
                            self.discover(child, source, inside, pending);
                        }
                    }
                    None => {
                        for child in named_children(&node) {
                            self.discover(child, source, enclosing, pending);
                        }
                    }
                }
            }
            _ => {
                for child in named_children(&node) {
                    self.discover(child, source, enclosing, pending);
                }
            }
        }
    }
}

fn collect_fields(body: &Node, source: &str, owner: ClassId) -> Vec<Variable> {
    let mut fields = Vec::new();
    collect_fields_into(body, source, owner, &mut fields);
    fields
}

fn collect_fields_into(body: &Node, source: &str, owner: ClassId, out: &mut Vec<Variable>) {
    for child in named_children(body) {
        match child.kind() {
            "field_declaration" | "constant_declaration" => {
                let Some(jtype) = child.child_by_field_name("type") else {
                    continue;
                };
                let base_type = text(&jtype, source).to_owned();
                let is_final = has_modifier(&child, source, "final");
                let is_static = has_modifier(&child, source, "static");
                let is_private = has_modifier(&child, source, "private");
                for declarator in children_by_field(&child, "declarator") {
                    let Some(name) = declarator.child_by_field_name("name") else {
                        continue;
                    };
                    let mut jtype = base_type.clone();
                    if let Some(dims) = declarator.child_by_field_name("dimensions") {
                        jtype.push_str(text(&dims, source));
                    }
                    out.push(
                        Variable::field(text(&name, source), jtype, owner).with_flags(
                            is_final,
                            is_static,
                            is_private,
                        ),
                    );
                }
            }
            // Enum field declarations sit behind the `;` separator node.
            "enum_body_declarations" => collect_fields_into(&child, source, owner, out),
            _ => {}
        }
    }
}
