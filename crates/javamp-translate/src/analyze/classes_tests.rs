use indoc::indoc;
use pretty_assertions::assert_eq;

use javamp_core::{ClassKind, VarKind};

use super::classes::ClassIndex;
use crate::frontend;

fn build(source: &str) -> ClassIndex {
    let tree = frontend::parse(source).expect("fixture must parse");
    ClassIndex::build(tree.root_node(), source)
}

#[test]
fn discovers_nesting_kinds() {
    let source = indoc! {r#"
        class Outer {
            int count;

            class Inner {
            }

            void work() {
                class Helper {
                }
                Runnable r = new Runnable() {
                    public void run() {
                    }
                };
            }
        }
    "#};
    let index = build(source);
    let kinds: Vec<(String, ClassKind)> = index
        .arena
        .iter()
        .map(|(_, e)| (e.name.clone(), e.kind))
        .collect();
    assert_eq!(
        kinds,
        vec![
            ("Outer".to_owned(), ClassKind::Top),
            ("Inner".to_owned(), ClassKind::Inner),
            ("Helper".to_owned(), ClassKind::Local),
            ("Runnable$3".to_owned(), ClassKind::Anonymous),
        ]
    );

    let outer = index.arena.find_by_name("Outer").unwrap();
    let inner = index.arena.find_by_name("Inner").unwrap();
    assert_eq!(index.arena.get(inner).enclosing, Some(outer));
}

#[test]
fn resolves_superclass_by_simple_name() {
    let source = indoc! {r#"
        class Base {
            protected int width;
            private int secret;
        }

        class Shape extends Base {
            int area;
        }

        class Blob extends java.util.ArrayList {
        }
    "#};
    let index = build(source);
    let base = index.arena.find_by_name("Base").unwrap();
    let shape = index.arena.find_by_name("Shape").unwrap();
    let blob = index.arena.find_by_name("Blob").unwrap();
    assert_eq!(index.arena.get(shape).superclass, Some(base));
    // External supertypes stay unresolved.
    assert_eq!(index.arena.get(blob).superclass, None);

    let width = index.arena.find_field(shape, "width").unwrap();
    assert!(matches!(width.kind, VarKind::Field(c) if c == base));
    assert!(index.arena.find_field(shape, "secret").is_none());
}

#[test]
fn collects_field_declarators_and_flags() {
    let source = indoc! {r#"
        class C {
            private static final int LIMIT = 16;
            double a, b[];
        }
    "#};
    let index = build(source);
    let c = index.arena.find_by_name("C").unwrap();
    let fields = &index.arena.get(c).fields;
    assert_eq!(fields.len(), 3);

    let limit = index.arena.find_field(c, "LIMIT").unwrap();
    assert!(limit.is_final && limit.is_static && limit.is_private);
    assert_eq!(limit.jtype, "int");

    let b = index.arena.find_field(c, "b").unwrap();
    assert_eq!(b.jtype, "double[]");
}

#[test]
fn enum_fields_live_behind_the_separator() {
    let source = indoc! {r#"
        enum Color {
            RED, GREEN;

            int weight;
        }
    "#};
    let index = build(source);
    let color = index.arena.find_by_name("Color").unwrap();
    assert!(index.arena.find_field(color, "weight").is_some());
}

#[test]
fn parent_classes_walk_outward() {
    let source = indoc! {r#"
        class Outer {
            class Inner {
                void work() {
                    int x = 0;
                }
            }
        }
    "#};
    let tree = frontend::parse(source).expect("fixture must parse");
    let index = ClassIndex::build(tree.root_node(), source);

    let decl_pos = source.find("int x").unwrap();
    let node = tree
        .root_node()
        .descendant_for_byte_range(decl_pos, decl_pos + 5)
        .unwrap();
    let chain = index.parent_classes(&node);
    let names: Vec<&str> = chain
        .iter()
        .map(|id| index.arena.get(*id).name.as_str())
        .collect();
    assert_eq!(names, vec!["Inner", "Outer"]);
    assert_eq!(index.enclosing_class(&node), Some(chain[0]));
}
