//! Code synthesis: the fork/join scaffold around each rewritten region.
//!
//! Everything emitted here is plain JDK Java. One package-private executor
//! class per translated unit replaces the runtime jar the original design
//! shipped, so translated files stand alone.

use arborium_tree_sitter::Node;

use javamp_core::{ClassKind, DirectiveKind, EXECUTOR_CLASS};

use crate::analyze::ClassIndex;
use crate::diagnostics::{Diagnostics, Span};
use crate::frontend::{children_by_field, text};
use crate::rewrite::Rewriter;
use crate::translate::{Config, Directive};
use crate::{Error, Result};

pub(crate) fn emit_unit(
    rw: &mut Rewriter,
    directives: &[Directive],
    classes: &ClassIndex,
    config: &Config,
    source: &str,
    diags: &mut Diagnostics,
) -> Result<()> {
    for (idx, d) in directives.iter().enumerate() {
        rw.delete(d.pragma.start_byte(), d.pragma.end_byte());
        match d.kind {
            DirectiveKind::Parallel | DirectiveKind::ParallelFor => {
                emit_spawning(rw, d, classes, config, source, diags)?;
            }
            DirectiveKind::Sections => {
                let team = team_of(directives, d)?;
                emit_sections(rw, idx, directives, team);
            }
            DirectiveKind::Section => {
                // Wrapped by its enclosing `sections`.
            }
            _ => {
                let team = team_of(directives, d)?;
                emit_aux(rw, d, team, source)?;
            }
        }
    }
    if directives.iter().any(|d| d.kind.is_spawning()) {
        rw.insert(source.len(), executor_class_text());
    }
    Ok(())
}

fn team_of<'d, 't>(directives: &'d [Directive<'t>], d: &Directive<'t>) -> Result<&'d Directive<'t>> {
    let Some(team) = d.team else {
        return Err(Error::Internal(format!(
            "`{}` directive reached synthesis without an enclosing team",
            d.kind
        )));
    };
    Ok(&directives[team])
}

fn emit_spawning(
    rw: &mut Rewriter,
    d: &Directive,
    classes: &ClassIndex,
    config: &Config,
    source: &str,
    diags: &mut Diagnostics,
) -> Result<()> {
    let names = &d.names;
    let privatized = d.clauses.privatized();
    let nth_value = d
        .clauses
        .thread_num
        .or(config.default_num_threads)
        .map(|n| n.to_string())
        .unwrap_or_else(|| "Runtime.getRuntime().availableProcessors()".to_owned());

    let entry = classes.arena.get(d.class);
    if d.captured_this && matches!(entry.kind, ClassKind::Anonymous) {
        diags.error(
            Span::of(&d.pragma),
            "cannot capture `this` of an anonymous class",
        );
    }

    let mut pre = String::new();
    pre.push_str("{\n");
    pre.push_str(&format!("final int {} = {};\n", names.nth_var, nth_value));

    pre.push_str(&format!("class {} {{\n", names.context_class));
    if d.captured_this {
        pre.push_str(&format!("public {} THAT;\n", entry.name));
    }
    for v in &d.captured {
        if privatized.contains(&v.name) {
            if v.jtype.contains('<') {
                diags.warning(
                    Span::of(&d.pragma),
                    format!(
                        "privatized name `{}` has a generic type; the generated array creation will not compile",
                        v.name
                    ),
                );
            }
            pre.push_str(&format!(
                "public {}[] {} = new {};\n",
                v.jtype,
                v.full_name(),
                array_new(&v.jtype, &names.nth_var)
            ));
        } else {
            pre.push_str(&format!("public {} {};\n", v.jtype, v.full_name()));
        }
    }
    pre.push_str("}\n");

    pre.push_str(&format!(
        "final {cls} {var} = new {cls}();\n",
        cls = names.context_class,
        var = names.context_var
    ));
    if d.captured_this {
        pre.push_str(&format!("{}.THAT = this;\n", names.context_var));
    }
    for v in &d.captured {
        let origin = source_ref(v, d.in_static);
        if d.clauses.firstprivate_vars.contains(&v.name) {
            pre.push_str(&format!(
                "java.util.Arrays.fill({}.{}, {});\n",
                names.context_var,
                v.full_name(),
                origin
            ));
        } else if let Some(op) = d.clauses.reduction_vars.get(&v.name) {
            pre.push_str(&format!(
                "java.util.Arrays.fill({}.{}, {});\n",
                names.context_var,
                v.full_name(),
                op.identity_text()
            ));
        } else if !d.clauses.private_vars.contains(&v.name) {
            pre.push_str(&format!(
                "{}.{} = {};\n",
                names.context_var,
                v.full_name(),
                origin
            ));
        }
    }

    pre.push_str(&format!(
        "final {cls} {var} = new {cls}({nth});\n",
        cls = EXECUTOR_CLASS,
        var = names.executor_var,
        nth = names.nth_var
    ));
    if d.needs_barrier {
        pre.push_str(&format!(
            "final java.util.concurrent.CyclicBarrier {} = new java.util.concurrent.CyclicBarrier({});\n",
            names.barrier_var, names.nth_var
        ));
    }
    pre.push_str(&format!(
        "for (int {t} = 0; {t} < {n}; {t}++) {{\n",
        t = names.loop_var,
        n = names.nth_var
    ));
    pre.push_str(&format!(
        "{}.submit({}, new Runnable() {{\n",
        names.executor_var, names.loop_var
    ));
    pre.push_str("@Override\npublic void run() {\n");
    if d.kind == DirectiveKind::ParallelFor {
        pre.push_str(&format!(
            "final int {} = {}.getThreadNum();\n",
            names.tid_var, names.executor_var
        ));
    }
    pre.push_str("try {\n");
    rw.insert(d.region.start_byte(), pre);

    let mut post = String::new();
    post.push_str(&format!(
        "\n}} catch (Throwable {t}) {{\nthrow new RuntimeException({t});\n}}\n",
        t = names.thrown_var
    ));
    post.push_str("}\n});\n}\n");
    post.push_str(&format!("{}.join();\n", names.executor_var));
    for v in &d.captured {
        let target = source_ref(v, d.in_static);
        if let Some(op) = d.clauses.reduction_vars.get(&v.name) {
            post.push_str(&format!(
                "for (int {t} = 0; {t} < {n}; {t}++) {{ {target} = {target} {op} {ctx}.{full}[{t}]; }}\n",
                t = names.loop_var,
                n = names.nth_var,
                op = op.combine_symbol(),
                ctx = names.context_var,
                full = v.full_name()
            ));
        } else if !privatized.contains(&v.name) && !v.is_final {
            post.push_str(&format!(
                "{target} = {}.{};\n",
                names.context_var,
                v.full_name()
            ));
        }
    }
    post.push_str("}");
    rw.insert(d.region.end_byte(), post);

    if d.kind == DirectiveKind::ParallelFor {
        distribute_for(rw, &d.region, d.kind, &names.tid_var, &names.nth_var, source)?;
    }
    Ok(())
}

fn emit_aux(rw: &mut Rewriter, d: &Directive, team: &Directive, source: &str) -> Result<()> {
    let exec = &team.names.executor_var;
    match d.kind {
        DirectiveKind::For => {
            let tid = format!("{exec}.getThreadNum()");
            distribute_for(rw, &d.region, d.kind, &tid, &team.names.nth_var, source)?;
            rw.insert(d.region.end_byte(), format!("\n{}", await_text(d, team)));
        }
        DirectiveKind::Single => {
            rw.insert(
                d.region.start_byte(),
                format!("if ({exec}.getThreadNum() == 0) {{\n"),
            );
            rw.insert(d.region.end_byte(), "\n}".to_owned());
            rw.insert(d.region.end_byte(), format!("\n{}", await_text(d, team)));
        }
        DirectiveKind::Master => {
            rw.insert(
                d.region.start_byte(),
                format!("if ({exec}.getThreadNum() == 0) {{\n"),
            );
            rw.insert(d.region.end_byte(), "\n}".to_owned());
        }
        DirectiveKind::Critical | DirectiveKind::Atomic => {
            rw.insert(
                d.region.start_byte(),
                format!("synchronized ({}) {{\n", team.names.context_var),
            );
            rw.insert(d.region.end_byte(), "\n}".to_owned());
        }
        DirectiveKind::Barrier => {
            rw.insert(d.region.start_byte(), format!("{}\n", await_text(d, team)));
        }
        _ => {
            return Err(Error::Internal(format!(
                "`{}` is not an auxiliary directive",
                d.kind
            )));
        }
    }
    Ok(())
}

fn emit_sections(rw: &mut Rewriter, idx: usize, directives: &[Directive], team: &Directive) {
    let exec = &team.names.executor_var;
    let nth = &team.names.nth_var;
    let mut sections: Vec<&Directive> = directives
        .iter()
        .filter(|s| s.kind == DirectiveKind::Section && s.parent == Some(idx))
        .collect();
    sections.sort_by_key(|s| s.region.start_byte());
    for (ordinal, section) in sections.iter().enumerate() {
        rw.insert(
            section.region.start_byte(),
            format!("if ({exec}.getThreadNum() == {ordinal} % {nth}) {{\n"),
        );
        rw.insert(section.region.end_byte(), "\n}".to_owned());
    }
    let sections_dir = &directives[idx];
    rw.insert(
        sections_dir.region.end_byte(),
        format!("\n{}", await_text(sections_dir, team)),
    );
}

fn await_text(d: &Directive, team: &Directive) -> String {
    format!(
        "try {{ {bar}.await(); }} catch (Exception {t}) {{ throw new RuntimeException({t}); }}",
        bar = team.names.barrier_var,
        t = d.names.thrown_var
    )
}

fn source_ref(v: &javamp_core::Variable, in_static: bool) -> String {
    match v.kind {
        javamp_core::VarKind::Field(_) if !in_static && !v.is_static => {
            format!("this.{}", v.name)
        }
        _ => v.name.clone(),
    }
}

/// `int` -> `int[nth]`, `double[]` -> `double[nth][]`.
fn array_new(jtype: &str, nth: &str) -> String {
    match jtype.find('[') {
        Some(pos) => format!("{}[{}]{}", &jtype[..pos], nth, &jtype[pos..]),
        None => format!("{jtype}[{nth}]"),
    }
}

/// Rewrite a canonical for header so each worker takes every nth iteration.
fn distribute_for(
    rw: &mut Rewriter,
    region: &Node,
    kind: DirectiveKind,
    tid_expr: &str,
    nth_var: &str,
    source: &str,
) -> Result<()> {
    let unsupported = |node: &Node, what: &str| Error::Unsupported {
        span: Span::of(node),
        what: format!("`{kind}` {what}"),
    };

    if region.kind() != "for_statement" {
        return Err(unsupported(region, "requires a for statement"));
    }

    let init = region
        .child_by_field_name("init")
        .ok_or_else(|| unsupported(region, "requires a loop initialization"))?;
    let (loop_var, init_value_end) = match init.kind() {
        "local_variable_declaration" => {
            let declarators = children_by_field(&init, "declarator");
            let [declarator] = declarators.as_slice() else {
                return Err(unsupported(&init, "requires a single loop variable"));
            };
            let (Some(name), Some(value)) = (
                declarator.child_by_field_name("name"),
                declarator.child_by_field_name("value"),
            ) else {
                return Err(unsupported(&init, "requires an initialized loop variable"));
            };
            (text(&name, source).to_owned(), value.end_byte())
        }
        "assignment_expression" => {
            let (Some(left), Some(right)) = (
                init.child_by_field_name("left"),
                init.child_by_field_name("right"),
            ) else {
                return Err(unsupported(&init, "requires an initialized loop variable"));
            };
            if left.kind() != "identifier" {
                return Err(unsupported(&left, "requires a simple loop variable"));
            }
            (text(&left, source).to_owned(), right.end_byte())
        }
        _ => {
            return Err(unsupported(&init, "requires a canonical loop initialization"));
        }
    };

    let condition = region
        .child_by_field_name("condition")
        .ok_or_else(|| unsupported(region, "requires a loop condition"))?;
    if condition.kind() != "binary_expression" {
        return Err(unsupported(&condition, "requires a relational loop condition"));
    }
    let (Some(left), Some(right)) = (
        condition.child_by_field_name("left"),
        condition.child_by_field_name("right"),
    ) else {
        return Err(unsupported(&condition, "requires a relational loop condition"));
    };
    if left.kind() != "identifier" || text(&left, source) != loop_var {
        return Err(unsupported(&condition, "must test the loop variable"));
    }
    let cond_op = source[left.end_byte()..right.start_byte()].trim();
    let upward = match cond_op {
        "<" | "<=" => true,
        ">" | ">=" => false,
        _ => return Err(unsupported(&condition, "requires a relational loop condition")),
    };

    let updates = children_by_field(region, "update");
    let [update] = updates.as_slice() else {
        return Err(unsupported(region, "requires a single loop update"));
    };
    let (step, step_up) = match update.kind() {
        "update_expression" => {
            let operand = update
                .named_child(0)
                .ok_or_else(|| unsupported(update, "requires a canonical loop update"))?;
            if text(&operand, source) != loop_var {
                return Err(unsupported(update, "must step the loop variable"));
            }
            let update_text = text(update, source);
            ("1".to_owned(), update_text.contains("++"))
        }
        "assignment_expression" => {
            let (Some(left), Some(right)) = (
                update.child_by_field_name("left"),
                update.child_by_field_name("right"),
            ) else {
                return Err(unsupported(update, "requires a canonical loop update"));
            };
            if left.kind() != "identifier" || text(&left, source) != loop_var {
                return Err(unsupported(update, "must step the loop variable"));
            }
            if right.kind() != "decimal_integer_literal" {
                return Err(unsupported(&right, "requires an integer literal step"));
            }
            let op = source[left.end_byte()..right.start_byte()].trim();
            match op {
                "+=" => (text(&right, source).to_owned(), true),
                "-=" => (text(&right, source).to_owned(), false),
                _ => return Err(unsupported(update, "requires a canonical loop update")),
            }
        }
        _ => return Err(unsupported(update, "requires a canonical loop update")),
    };
    if upward != step_up {
        return Err(unsupported(region, "loop direction and condition disagree"));
    }

    let sign = if upward { "+" } else { "-" };
    rw.insert(init_value_end, format!(" {sign} {tid_expr} * ({step})"));
    let assign_op = if upward { "+=" } else { "-=" };
    rw.replace(
        update.start_byte(),
        update.end_byte(),
        format!("{loop_var} {assign_op} {nth_var} * ({step})"),
    );
    Ok(())
}

fn executor_class_text() -> String {
    format!(
        r#"

class {EXECUTOR_CLASS} {{
    private final Thread[] javampThreads;

    {EXECUTOR_CLASS}(int n) {{
        javampThreads = new Thread[n];
    }}

    void submit(int id, Runnable task) {{
        javampThreads[id] = new Thread(task);
        javampThreads[id].start();
    }}

    int getThreadNum() {{
        Thread current = Thread.currentThread();
        for (int i = 0; i < javampThreads.length; i++) {{
            if (javampThreads[i] == current) {{
                return i;
            }}
        }}
        return 0;
    }}

    void join() {{
        for (Thread t : javampThreads) {{
            try {{
                t.join();
            }} catch (InterruptedException e) {{
                Thread.currentThread().interrupt();
            }}
        }}
    }}
}}
"#
    )
}
