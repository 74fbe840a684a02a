//! Scope inheritance: which locals and parameters are visible at a tree
//! position, and which names a directive region declares for itself.
//!
//! All functions are pure walks over parent pointers; nothing here mutates
//! or caches. Shadowing resolves innermost-first because the walk moves
//! outward and never overwrites an entry it already has.

use arborium_tree_sitter::Node;
use indexmap::IndexMap;

use javamp_core::{ClassId, Variable, array_less};

use crate::analyze::classes::{has_modifier, is_class_body};
use crate::frontend::{children_by_field, named_children, text};

/// Locals visible at `node`: declarations textually preceding it in every
/// enclosing scope up to, but not crossing, a class boundary. A declaration
/// at the position of `node` itself is not visible to itself.
pub fn inherited_locals(node: &Node, source: &str, owner: ClassId) -> IndexMap<String, Variable> {
    let mut vars = IndexMap::new();
    let mut current = *node;
    while let Some(parent) = current.parent() {
        let kind = parent.kind();
        if is_class_body(kind) {
            break;
        }
        match kind {
            "block" | "constructor_body" | "switch_block_statement_group" => {
                for child in named_children(&parent) {
                    if child.id() == current.id() {
                        break;
                    }
                    if child.kind() == "local_variable_declaration" {
                        add_declarators(&child, source, owner, &mut vars);
                    }
                }
            }
            // The loop variable counts as declared from the loop's opening
            // brace: visible in the condition, update, and body.
            "for_statement" => {
                if let Some(init) = parent.child_by_field_name("init") {
                    if init.id() != current.id() && init.kind() == "local_variable_declaration" {
                        add_declarators(&init, source, owner, &mut vars);
                    }
                }
            }
            "enhanced_for_statement" => {
                if is_field_child(&parent, "body", &current) {
                    add_enhanced_for_var(&parent, source, owner, &mut vars);
                }
            }
            "catch_clause" => {
                if is_field_child(&parent, "body", &current) {
                    add_catch_param(&parent, source, owner, &mut vars);
                }
            }
            "try_with_resources_statement" => {
                if is_field_child(&parent, "body", &current) {
                    add_resources(&parent, source, owner, &mut vars);
                }
            }
            _ => {}
        }
        current = parent;
    }
    vars
}

/// Parameters of enclosing methods, constructors, and lambdas up to the
/// first class boundary. Parameters of methods of *outer* classes are
/// deliberately absent: local and anonymous classes reach those through
/// their enclosing instance, not through direct capture.
pub fn inherited_params(node: &Node, source: &str, owner: ClassId) -> IndexMap<String, Variable> {
    let mut vars = IndexMap::new();
    let mut current = *node;
    while let Some(parent) = current.parent() {
        let kind = parent.kind();
        if is_class_body(kind) {
            break;
        }
        match kind {
            "method_declaration" | "constructor_declaration" | "compact_constructor_declaration" => {
                if let Some(params) = parent.child_by_field_name("parameters") {
                    add_formal_params(&params, source, owner, &mut vars);
                }
            }
            "lambda_expression" => {
                if let Some(params) = parent.child_by_field_name("parameters") {
                    add_lambda_params(&params, source, owner, &mut vars);
                }
            }
            _ => {}
        }
        current = parent;
    }
    vars
}

/// Whether `name` at `occurrence` refers to something the region declares
/// for itself (a region-local that must not be captured).
///
/// Scans whole scopes rather than only declarations preceding the
/// occurrence: a name declared later in the same block still claims every
/// use in that block. Declarations in sibling nested blocks do not leak.
pub fn region_declares(name: &str, occurrence: &Node, region: &Node, source: &str) -> bool {
    let bare = array_less(name);
    let mut current = *occurrence;
    loop {
        let Some(parent) = current.parent() else {
            return false;
        };
        if parent.start_byte() < region.start_byte() || parent.end_byte() > region.end_byte() {
            return false;
        }
        match parent.kind() {
            "block" | "constructor_body" | "switch_block_statement_group" => {
                for child in named_children(&parent) {
                    if child.kind() == "local_variable_declaration" && declares(&child, source, bare)
                    {
                        return true;
                    }
                }
            }
            "for_statement" => {
                if let Some(init) = parent.child_by_field_name("init") {
                    if init.kind() == "local_variable_declaration" && declares(&init, source, bare) {
                        return true;
                    }
                }
            }
            "enhanced_for_statement" => {
                if parent
                    .child_by_field_name("name")
                    .is_some_and(|n| text(&n, source) == bare)
                {
                    return true;
                }
            }
            "catch_clause" => {
                if catch_param_name(&parent, source) == Some(bare) {
                    return true;
                }
            }
            "try_with_resources_statement" => {
                if resource_names(&parent, source).any(|n| n == bare) {
                    return true;
                }
            }
            "method_declaration" | "constructor_declaration" => {
                if let Some(params) = parent.child_by_field_name("parameters") {
                    let mut vars = IndexMap::new();
                    add_formal_params(&params, source, ClassId::from_raw(0), &mut vars);
                    if vars.contains_key(bare) {
                        return true;
                    }
                }
            }
            "lambda_expression" => {
                if let Some(params) = parent.child_by_field_name("parameters") {
                    let mut vars = IndexMap::new();
                    add_lambda_params(&params, source, ClassId::from_raw(0), &mut vars);
                    if vars.contains_key(bare) {
                        return true;
                    }
                }
            }
            _ => {}
        }
        if parent.id() == region.id() {
            return false;
        }
        current = parent;
    }
}

fn is_field_child(parent: &Node, field: &str, child: &Node) -> bool {
    parent
        .child_by_field_name(field)
        .is_some_and(|n| n.id() == child.id())
}

fn declares(decl: &Node, source: &str, bare: &str) -> bool {
    children_by_field(decl, "declarator").iter().any(|d| {
        d.child_by_field_name("name")
            .is_some_and(|n| array_less(text(&n, source)) == bare)
    })
}

fn insert(vars: &mut IndexMap<String, Variable>, var: Variable) {
    if !vars.contains_key(&var.name) {
        vars.insert(var.name.clone(), var);
    }
}

fn add_declarators(
    decl: &Node,
    source: &str,
    owner: ClassId,
    vars: &mut IndexMap<String, Variable>,
) {
    let Some(type_node) = decl.child_by_field_name("type") else {
        return;
    };
    let base_type = text(&type_node, source);
    let is_final = has_modifier(decl, source, "final");
    for declarator in children_by_field(decl, "declarator") {
        let Some(name) = declarator.child_by_field_name("name") else {
            continue;
        };
        let mut jtype = base_type.to_owned();
        if let Some(dims) = declarator.child_by_field_name("dimensions") {
            jtype.push_str(text(&dims, source));
        }
        insert(
            vars,
            Variable::local(text(&name, source), jtype, owner).with_flags(is_final, false, false),
        );
    }
}

fn add_enhanced_for_var(
    stmt: &Node,
    source: &str,
    owner: ClassId,
    vars: &mut IndexMap<String, Variable>,
) {
    let (Some(type_node), Some(name)) = (
        stmt.child_by_field_name("type"),
        stmt.child_by_field_name("name"),
    ) else {
        return;
    };
    let is_final = has_modifier(stmt, source, "final");
    insert(
        vars,
        Variable::local(text(&name, source), text(&type_node, source), owner)
            .with_flags(is_final, false, false),
    );
}

fn catch_param_name<'s>(clause: &Node, source: &'s str) -> Option<&'s str> {
    let param = named_children(clause)
        .into_iter()
        .find(|c| c.kind() == "catch_formal_parameter")?;
    let name = param.child_by_field_name("name")?;
    Some(text(&name, source))
}

fn add_catch_param(clause: &Node, source: &str, owner: ClassId, vars: &mut IndexMap<String, Variable>) {
    let Some(param) = named_children(clause)
        .into_iter()
        .find(|c| c.kind() == "catch_formal_parameter")
    else {
        return;
    };
    let Some(name) = param.child_by_field_name("name") else {
        return;
    };
    let jtype = named_children(&param)
        .into_iter()
        .find(|c| c.kind() == "catch_type")
        .map(|t| text(&t, source).to_owned())
        .unwrap_or_else(|| "Throwable".to_owned());
    insert(
        vars,
        Variable::local(text(&name, source), jtype, owner).with_flags(false, false, false),
    );
}

fn resource_names<'s>(stmt: &Node, source: &'s str) -> impl Iterator<Item = &'s str> {
    let mut names = Vec::new();
    if let Some(spec) = named_children(stmt)
        .into_iter()
        .find(|c| c.kind() == "resource_specification")
    {
        for resource in named_children(&spec) {
            if let Some(name) = resource.child_by_field_name("name") {
                names.push(text(&name, source));
            }
        }
    }
    names.into_iter()
}

fn add_resources(stmt: &Node, source: &str, owner: ClassId, vars: &mut IndexMap<String, Variable>) {
    let Some(spec) = named_children(stmt)
        .into_iter()
        .find(|c| c.kind() == "resource_specification")
    else {
        return;
    };
    for resource in named_children(&spec) {
        let (Some(type_node), Some(name)) = (
            resource.child_by_field_name("type"),
            resource.child_by_field_name("name"),
        ) else {
            continue;
        };
        insert(
            vars,
            Variable::local(text(&name, source), text(&type_node, source), owner)
                .with_flags(true, false, false),
        );
    }
}

fn add_formal_params(
    params: &Node,
    source: &str,
    owner: ClassId,
    vars: &mut IndexMap<String, Variable>,
) {
    for param in named_children(params) {
        match param.kind() {
            "formal_parameter" => {
                let (Some(type_node), Some(name)) = (
                    param.child_by_field_name("type"),
                    param.child_by_field_name("name"),
                ) else {
                    continue;
                };
                let mut jtype = text(&type_node, source).to_owned();
                if let Some(dims) = param.child_by_field_name("dimensions") {
                    jtype.push_str(text(&dims, source));
                }
                let is_final = has_modifier(&param, source, "final");
                insert(
                    vars,
                    Variable::param(text(&name, source), jtype, owner)
                        .with_flags(is_final, false, false),
                );
            }
            "spread_parameter" => {
                let Some(declarator) = named_children(&param)
                    .into_iter()
                    .find(|c| c.kind() == "variable_declarator")
                else {
                    continue;
                };
                let Some(name) = declarator.child_by_field_name("name") else {
                    continue;
                };
                let jtype = named_children(&param)
                    .first()
                    .map(|t| format!("{}[]", text(t, source)))
                    .unwrap_or_else(|| "Object[]".to_owned());
                insert(vars, Variable::param(text(&name, source), jtype, owner));
            }
            // `this` receiver parameters declare nothing capturable.
            _ => {}
        }
    }
}

fn add_lambda_params(
    params: &Node,
    source: &str,
    owner: ClassId,
    vars: &mut IndexMap<String, Variable>,
) {
    match params.kind() {
        "identifier" => insert(
            vars,
            Variable::param(text(params, source), "Object".to_owned(), owner),
        ),
        "inferred_parameters" => {
            for ident in named_children(params) {
                if ident.kind() == "identifier" {
                    insert(
                        vars,
                        Variable::param(text(&ident, source), "Object".to_owned(), owner),
                    );
                }
            }
        }
        "formal_parameters" => add_formal_params(params, source, owner, vars),
        _ => {}
    }
}
