//! Directive orchestration: pragma discovery, placement validation,
//! capture analysis, and synthesis over one compilation unit.
//!
//! Spawning directives (`parallel`, `parallel for`) are translated
//! parent-before-child so a nested team re-captures through its enclosing
//! team's context instead of re-discovering outer variables. Auxiliary
//! directives run on the enclosing team's threads and only add scheduling
//! wrappers; their tokens are rewritten by the enclosing team's visitor.

mod synth;
mod visitor;

#[cfg(test)]
mod translate_tests;

use arborium_tree_sitter::Node;
use indexmap::IndexSet;
use serde::Serialize;

use javamp_core::{ClassId, Clauses, DirectiveKind, GeneratedNames, Variable};

use crate::analyze::ClassIndex;
use crate::analyze::classes::has_modifier;
use crate::diagnostics::{Diagnostics, Span};
use crate::frontend::{self, is_comment, named_children, text};
use crate::pragma;
use crate::rewrite::Rewriter;
use crate::{Error, PassResult};

use visitor::{TeamLink, Visitor};

/// Translation options.
#[derive(Clone, Debug, Default)]
pub struct Config {
    /// Team size used when a pragma has no `threadNum` clause. `None`
    /// emits a runtime processor-count query instead.
    pub default_num_threads: Option<u32>,
}

/// Result of translating one unit.
#[derive(Clone, Debug, Serialize)]
pub struct Translation {
    /// The rewritten unit text.
    pub text: String,
    pub directives: Vec<DirectiveReport>,
}

/// What one directive contributed, for reporting and tooling.
#[derive(Clone, Debug, Serialize)]
pub struct DirectiveReport {
    pub kind: DirectiveKind,
    pub span: Span,
    pub context_var: Option<String>,
    pub captured: Vec<Variable>,
    pub captured_this: bool,
}

/// One pragma attached to one region, plus everything translation learns
/// about it.
pub(crate) struct Directive<'t> {
    pub kind: DirectiveKind,
    pub clauses: Clauses,
    pub names: GeneratedNames,
    pub pragma: Node<'t>,
    pub region: Node<'t>,
    /// Nearest enclosing directive of any kind.
    pub parent: Option<usize>,
    /// Nearest enclosing spawning directive.
    pub team: Option<usize>,
    pub class: ClassId,
    pub in_static: bool,
    pub captured: IndexSet<Variable>,
    pub captured_this: bool,
    pub needs_barrier: bool,
}

/// Translate one compilation unit.
///
/// Error diagnostics fail the unit as [`Error::Translate`]; warnings ride
/// along with the successful result.
pub fn translate_unit(source: &str, config: &Config) -> PassResult<Translation> {
    let tree = frontend::parse(source)?;
    let root = tree.root_node();
    let classes = ClassIndex::build(root, source);
    let mut diags = Diagnostics::new();

    let mut directives = discover(root, source, &classes, &mut diags);
    validate(&mut directives, &mut diags);
    if diags.has_errors() {
        return Err(Error::Translate(diags));
    }

    let mut rw = Rewriter::new(source);

    // Capture analysis, outer teams first: a nested team must see its
    // enclosing team's finished capture set.
    let mut order: Vec<usize> = (0..directives.len())
        .filter(|&i| directives[i].kind.is_spawning())
        .collect();
    order.sort_by_key(|&i| {
        (
            directives[i].region.start_byte(),
            std::cmp::Reverse(directives[i].region.end_byte()),
        )
    });
    for idx in order {
        let links = team_links(&directives, directives[idx].team);
        let d = &directives[idx];
        let visitor = Visitor::new(
            &mut rw,
            source,
            &classes,
            &mut diags,
            d.region,
            d.names.context_var.clone(),
            d.names.executor_var.clone(),
            d.clauses.privatized(),
            &links,
        )?;
        let outcome = visitor.walk()?;
        let d = &mut directives[idx];
        d.captured = outcome.captured;
        d.captured_this = outcome.captured_this;
        for name in d.clauses.privatized() {
            if !d.captured.iter().any(|v| v.name == name) {
                diags.warning(
                    Span::of(&d.pragma),
                    format!("privatized name `{name}` was not captured by this region"),
                );
            }
        }
        for name in &d.clauses.shared_vars {
            if !d.captured.iter().any(|v| v.name == *name) {
                diags.warning(
                    Span::of(&d.pragma),
                    format!("shared name `{name}` was not captured by this region"),
                );
            }
        }
    }

    synth::emit_unit(&mut rw, &directives, &classes, config, source, &mut diags)?;
    if diags.has_errors() {
        return Err(Error::Translate(diags));
    }

    let rendered = rw
        .render()
        .map_err(|e| Error::Internal(e.to_string()))?;
    let reports = directives
        .iter()
        .map(|d| DirectiveReport {
            kind: d.kind,
            span: Span::of(&d.pragma),
            context_var: d
                .kind
                .is_spawning()
                .then(|| d.names.context_var.clone()),
            captured: d.captured.iter().cloned().collect(),
            captured_this: d.captured_this,
        })
        .collect();
    Ok((
        Translation {
            text: rendered,
            directives: reports,
        },
        diags,
    ))
}

/// The chain of enclosing teams, nearest first.
fn team_links(directives: &[Directive], mut team: Option<usize>) -> Vec<TeamLink> {
    let mut links = Vec::new();
    while let Some(idx) = team {
        let d = &directives[idx];
        links.push(TeamLink {
            ctx_var: d.names.context_var.clone(),
            exec_var: d.names.executor_var.clone(),
            class: d.class,
            captured: d.captured.clone(),
            captured_this: d.captured_this,
            privatized: d.clauses.privatized(),
        });
        team = d.team;
    }
    links
}

fn discover<'t>(
    root: Node<'t>,
    source: &str,
    classes: &ClassIndex,
    diags: &mut Diagnostics,
) -> Vec<Directive<'t>> {
    let mut comments = Vec::new();
    collect_line_comments(root, &mut comments);

    let mut directives: Vec<Directive<'t>> = Vec::new();
    for comment in comments {
        let comment_text = text(&comment, source);
        let Some((payload_offset, payload)) = pragma::pragma_payload(comment_text) else {
            continue;
        };
        let parsed = match pragma::parse(payload) {
            Ok(parsed) => parsed,
            Err(e) => {
                diags.error(pragma_error_span(&comment, payload_offset + e.offset), e.message);
                continue;
            }
        };
        let Some(region) = region_of(&comment) else {
            diags.error(Span::of(&comment), "pragma is not followed by a statement");
            continue;
        };
        if !is_statement(region.kind()) {
            diags.error(
                Span::of(&comment),
                format!("pragma must precede a statement, not a {}", region.kind()),
            );
            continue;
        }
        let Some(class) = classes.enclosing_class(&region) else {
            diags.error(Span::of(&comment), "directive region is outside any class");
            continue;
        };
        let names = GeneratedNames::new(directives.len() + 1);
        directives.push(Directive {
            kind: parsed.kind,
            clauses: parsed.clauses,
            names,
            pragma: comment,
            region,
            parent: None,
            team: None,
            class,
            in_static: region_in_static(&region, source),
            captured: IndexSet::new(),
            captured_this: false,
            needs_barrier: false,
        });
    }

    link_parents(&mut directives);
    directives
}

fn collect_line_comments<'t>(node: Node<'t>, out: &mut Vec<Node<'t>>) {
    if node.kind() == "line_comment" {
        out.push(node);
        return;
    }
    for child in named_children(&node) {
        collect_line_comments(child, out);
    }
}

fn pragma_error_span(comment: &Node, delta: usize) -> Span {
    let base = Span::of(comment);
    Span::new(
        base.start + delta,
        base.end,
        base.line,
        base.column + delta,
    )
}

/// The statement a pragma governs: the next named sibling that is not a
/// comment.
fn region_of<'t>(comment: &Node<'t>) -> Option<Node<'t>> {
    let mut sibling = comment.next_named_sibling();
    while let Some(s) = sibling {
        if is_comment(s.kind()) {
            sibling = s.next_named_sibling();
        } else {
            return Some(s);
        }
    }
    None
}

fn is_statement(kind: &str) -> bool {
    matches!(
        kind,
        "block"
            | "expression_statement"
            | "local_variable_declaration"
            | "for_statement"
            | "enhanced_for_statement"
            | "if_statement"
            | "while_statement"
            | "do_statement"
            | "try_statement"
            | "try_with_resources_statement"
            | "switch_expression"
            | "synchronized_statement"
            | "labeled_statement"
            | "assert_statement"
            | "throw_statement"
            | "return_statement"
            | "break_statement"
            | "continue_statement"
            | "yield_statement"
    )
}

fn link_parents(directives: &mut [Directive]) {
    let ranges: Vec<(usize, usize, usize)> = directives
        .iter()
        .map(|d| (d.region.start_byte(), d.region.end_byte(), d.pragma.start_byte()))
        .collect();
    for i in 0..directives.len() {
        let pragma_start = ranges[i].2;
        let mut best: Option<usize> = None;
        for (j, &(start, end, _)) in ranges.iter().enumerate() {
            if j == i {
                continue;
            }
            if start <= pragma_start && pragma_start < end {
                match best {
                    Some(b) if ranges[b].0 >= start => {}
                    _ => best = Some(j),
                }
            }
        }
        directives[i].parent = best;
    }
    for i in 0..directives.len() {
        let mut current = directives[i].parent;
        while let Some(p) = current {
            if directives[p].kind.is_spawning() {
                directives[i].team = Some(p);
                break;
            }
            current = directives[p].parent;
        }
    }
}

fn validate(directives: &mut [Directive], diags: &mut Diagnostics) {
    // Two pragmas on one statement cannot both own the region.
    for i in 0..directives.len() {
        for j in 0..i {
            if directives[i].region.id() == directives[j].region.id() {
                diags.error(
                    Span::of(&directives[i].pragma),
                    "this statement already carries a directive; combine them into one pragma",
                );
            }
        }
    }

    for i in 0..directives.len() {
        let d = &directives[i];
        let span = Span::of(&d.pragma);
        match d.kind {
            DirectiveKind::Parallel | DirectiveKind::ParallelFor => {
                if matches!(
                    d.region.kind(),
                    "local_variable_declaration"
                        | "return_statement"
                        | "break_statement"
                        | "continue_statement"
                        | "yield_statement"
                ) {
                    diags.error(
                        span,
                        format!("a `{}` region cannot be a {}", d.kind, d.region.kind()),
                    );
                }
                if d.kind == DirectiveKind::ParallelFor && d.region.kind() != "for_statement" {
                    diags.error(span, "`parallel for` requires a for statement");
                }
                scan_escapes(&d.region, diags);
            }
            DirectiveKind::Section => {
                let parent_is_sections = d
                    .parent
                    .is_some_and(|p| directives[p].kind == DirectiveKind::Sections);
                if !parent_is_sections {
                    diags.error(span, "`section` must sit directly inside a `sections` block");
                }
            }
            _ => {
                if d.team.is_none() {
                    diags.error(
                        span,
                        format!("`{}` must be nested inside a parallel region", d.kind),
                    );
                }
                if d.kind == DirectiveKind::Sections && d.region.kind() != "block" {
                    diags.error(span, "`sections` requires a block region");
                }
                if d.kind == DirectiveKind::For && d.region.kind() != "for_statement" {
                    diags.error(span, "`for` requires a for statement");
                }
            }
        }
    }

    for i in 0..directives.len() {
        let needs = directives[i].kind == DirectiveKind::Barrier
            || directives[i].kind.has_implicit_barrier();
        if needs {
            if let Some(team) = directives[i].team {
                directives[team].needs_barrier = true;
            }
        }
    }
}

/// `return` would leave the generated worker, not the method the user
/// wrote. Nested class and lambda bodies keep their own returns.
fn scan_escapes(region: &Node, diags: &mut Diagnostics) {
    fn walk(node: Node, diags: &mut Diagnostics) {
        match node.kind() {
            "class_body" | "interface_body" | "enum_body" | "lambda_expression" => {}
            "return_statement" => {
                diags.error(Span::of(&node), "`return` may not leave a parallel region");
            }
            _ => {
                for child in named_children(&node) {
                    walk(child, diags);
                }
            }
        }
    }
    for child in named_children(region) {
        walk(child, diags);
    }
}

fn region_in_static(region: &Node, source: &str) -> bool {
    let mut current = *region;
    while let Some(parent) = current.parent() {
        match parent.kind() {
            "method_declaration" => return has_modifier(&parent, source, "static"),
            "constructor_declaration" | "compact_constructor_declaration" => return false,
            "static_initializer" => return true,
            k if crate::analyze::classes::is_class_body(k) => return false,
            _ => {}
        }
        current = parent;
    }
    false
}
