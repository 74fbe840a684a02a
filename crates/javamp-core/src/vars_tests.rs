use pretty_assertions::assert_eq;

use crate::classes::ClassId;
use crate::vars::{VarKind, Variable, array_less};

fn c(n: u32) -> ClassId {
    ClassId::from_raw(n)
}

#[test]
fn array_less_strips_suffix() {
    assert_eq!(array_less("a"), "a");
    assert_eq!(array_less("a[]"), "a");
    assert_eq!(array_less("a[10]"), "a");
}

#[test]
fn equality_is_name_and_kind() {
    let a = Variable::local("x", "int", c(0));
    let b = Variable::local("x", "long", c(3));
    assert_eq!(a, b);

    let p = Variable::param("x", "int", c(0));
    assert_ne!(a, p);

    let f0 = Variable::field("x", "int", c(0));
    let f1 = Variable::field("x", "int", c(1));
    assert_ne!(f0, f1);
    assert_ne!(a, f0);
}

#[test]
fn full_name_tracks_equality() {
    let a = Variable::local("x", "int", c(0));
    let b = Variable::local("x", "int", c(0));
    assert_eq!(a.full_name(), b.full_name());
    assert_eq!(a.full_name(), "L_0_x");

    let f = Variable::field("count", "int", c(2));
    assert_eq!(f.full_name(), "F_2_count");
    let p = Variable::param("n", "int", c(1));
    assert_eq!(p.full_name(), "P_1_n");
}

#[test]
fn find_matches_array_less_names() {
    let set = vec![
        Variable::local("sum", "int", c(0)),
        Variable::param("n", "int", c(0)),
    ];
    assert_eq!(Variable::find("sum", &set).unwrap().name, "sum");
    assert_eq!(Variable::find("sum[]", &set).unwrap().name, "sum");
    assert!(Variable::find("missing", &set).is_none());
}

#[test]
fn kind_is_payload_compatible() {
    let f = Variable::field("count", "int", c(1)).with_flags(true, false, true);
    assert!(f.is_final);
    assert!(f.is_private);
    assert!(matches!(f.kind, VarKind::Field(id) if id == c(1)));
}
