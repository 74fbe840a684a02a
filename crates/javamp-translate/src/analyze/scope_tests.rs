use indoc::indoc;
use pretty_assertions::assert_eq;

use arborium_tree_sitter::{Node, Tree};
use javamp_core::ClassId;

use super::scope::{inherited_locals, inherited_params, region_declares};
use crate::frontend;

fn parse(source: &str) -> Tree {
    frontend::parse(source).expect("fixture must parse")
}

/// Smallest named node covering the `needle` occurrence.
fn node_at<'t>(tree: &'t Tree, source: &str, needle: &str) -> Node<'t> {
    let pos = source.find(needle).unwrap_or_else(|| panic!("`{needle}` not in fixture"));
    tree.root_node()
        .descendant_for_byte_range(pos, pos + needle.len())
        .unwrap()
}

const OWNER: ClassId = ClassId::from_raw(0);

#[test]
fn locals_declared_before_are_visible() {
    let source = indoc! {r#"
        class C {
            void work() {
                int a = 1;
                String s = "x";
                a = a + 1; /*probe*/
                int late = 2;
            }
        }
    "#};
    let tree = parse(source);
    let probe = node_at(&tree, source, "a = a + 1;");
    let locals = inherited_locals(&probe, source, OWNER);
    assert!(locals.contains_key("a"));
    assert!(locals.contains_key("s"));
    // Declared after the probe: not visible at it.
    assert!(!locals.contains_key("late"));
    assert_eq!(locals["s"].jtype, "String");
}

#[test]
fn shadowing_innermost_wins() {
    let source = indoc! {r#"
        class C {
            void work() {
                long x = 0;
                {
                    int x = 1;
                    x++; /*probe*/
                }
            }
        }
    "#};
    let tree = parse(source);
    let probe = node_at(&tree, source, "x++;");
    let locals = inherited_locals(&probe, source, OWNER);
    assert_eq!(locals["x"].jtype, "int");
}

#[test]
fn for_header_variable_visible_in_body() {
    let source = indoc! {r#"
        class C {
            void work() {
                for (int i = 0; i < 10; i++) {
                    use(i);
                }
            }
        }
    "#};
    let tree = parse(source);
    let probe = node_at(&tree, source, "use(i);");
    let locals = inherited_locals(&probe, source, OWNER);
    assert!(locals.contains_key("i"));
}

#[test]
fn enhanced_for_and_catch_variables() {
    let source = indoc! {r#"
        class C {
            void work(int[] data) {
                for (final int v : data) {
                    use(v);
                }
                try {
                    risky();
                } catch (RuntimeException boom) {
                    handle(boom);
                }
            }
        }
    "#};
    let tree = parse(source);

    let in_loop = node_at(&tree, source, "use(v);");
    let locals = inherited_locals(&in_loop, source, OWNER);
    assert!(locals.contains_key("v"));
    assert!(locals["v"].is_final);

    let in_catch = node_at(&tree, source, "handle(boom);");
    let locals = inherited_locals(&in_catch, source, OWNER);
    assert!(locals.contains_key("boom"));
    // The loop variable is out of scope here.
    assert!(!locals.contains_key("v"));
}

#[test]
fn params_of_enclosing_method() {
    let source = indoc! {r#"
        class C {
            void work(int n, double[] weights, int... rest) {
                n = n + 1; /*probe*/
            }
        }
    "#};
    let tree = parse(source);
    let probe = node_at(&tree, source, "n = n + 1;");
    let params = inherited_params(&probe, source, OWNER);
    assert!(params.contains_key("n"));
    assert_eq!(params["weights"].jtype, "double[]");
    assert_eq!(params["rest"].jtype, "int[]");
}

#[test]
fn params_stop_at_class_boundary() {
    let source = indoc! {r#"
        class C {
            void work(int outerParam) {
                Runnable r = new Runnable() {
                    public void run() {
                        int probe = 0;
                    }
                };
            }
        }
    "#};
    let tree = parse(source);
    let probe = node_at(&tree, source, "int probe = 0;");
    let params = inherited_params(&probe, source, OWNER);
    // Reached through the enclosing instance, not direct capture.
    assert!(!params.contains_key("outerParam"));
}

#[test]
fn region_declarations_cover_later_same_block_names() {
    let source = indoc! {r#"
        class C {
            void work() {
                {
                    use(early);
                    int early = 1;
                }
            }
        }
    "#};
    let tree = parse(source);
    let region = node_at(&tree, source, "{\n            use(early);");
    let probe = node_at(&tree, source, "early);");
    assert!(region_declares("early", &probe, &region, source));
}

#[test]
fn sibling_nested_block_declarations_do_not_leak() {
    let source = indoc! {r#"
        class C {
            void work() {
                {
                    {
                        int w = 0;
                    }
                    w++;
                }
            }
        }
    "#};
    let tree = parse(source);
    let region = node_at(&tree, source, "{\n            {");
    let probe = node_at(&tree, source, "w++;");
    assert!(!region_declares("w", &probe, &region, source));
}

#[test]
fn region_for_header_and_lambda_params_count() {
    let source = indoc! {r#"
        class C {
            void work() {
                for (int i = 0; i < 4; i++) {
                    java.util.function.IntConsumer f = t -> use(t);
                    use(i);
                }
            }
        }
    "#};
    let tree = parse(source);
    let region = node_at(&tree, source, "for (int i = 0;");
    let i_probe = node_at(&tree, source, "i);");
    assert!(region_declares("i", &i_probe, &region, source));
    let t_probe = node_at(&tree, source, "t)");
    assert!(region_declares("t", &t_probe, &region, source));
}
