#![cfg(test)]

use crate::ast::*;

macro_rules! success {
    ($obj:expr) => {{
        $obj.unwrap()
    }};
}
macro_rules! failure {
    ($obj:expr) => {{
        assert!($obj.is_err())
    }};
}

macro_rules! parse_as {
    ($typ:ty, $from:expr) => {{
        syn::parse_str::<$typ>($from)
    }};
}

#[test]
fn names() {
    success!(parse_as!(Name, "x"));
    success!(parse_as!(Name, "dt_1"));
    // Rust keywords are fine.
    success!(parse_as!(Name, "const"));
    success!(parse_as!(Name, "type"));
    // Except those that cannot be raw.
    failure!(parse_as!(Name, "self"));
    failure!(parse_as!(Name, "Self"));
    failure!(parse_as!(Name, "super"));
    failure!(parse_as!(Name, "crate"));
    failure!(parse_as!(Name, "1"));
    assert_eq!(success!(parse_as!(Name, "r#match")).to_string(), "match");
}

#[test]
fn numbers() {
    let value = |s: &str| success!(success!(parse_as!(Number, s)).value());
    assert_eq!(value("1"), 1.0);
    assert_eq!(value("-2.5"), -2.5);
    assert_eq!(value("1e-3"), 0.001);
    assert_eq!(value("3."), 3.0);
    failure!(parse_as!(Number, "1f32"));
    failure!(parse_as!(Number, "1u8"));
    failure!(parse_as!(Number, "true"));
    failure!(parse_as!(Number, "\"1\""));
    failure!(parse_as!(Number, "x"));
    assert_eq!(success!(parse_as!(Number, "12")).count(), Some(12));
    assert_eq!(success!(parse_as!(Number, "-12")).count(), None);
    assert_eq!(success!(parse_as!(Number, "1.0")).count(), None);
    assert_eq!(success!(parse_as!(Number, "-0.50")).to_string(), "-0.50");
}

#[test]
fn args() {
    assert!(matches!(success!(parse_as!(Arg, "x")), Arg::Var(_)));
    assert!(matches!(success!(parse_as!(Arg, "-1")), Arg::Lit(_)));
    assert!(matches!(success!(parse_as!(Arg, "f()")), Arg::Call(_)));
    let Arg::Call(c) = success!(parse_as!(Arg, "int(neg(y), 0.1, 1,)")) else {
        panic!("expected a call")
    };
    assert_eq!(c.t.head.t.to_string(), "int");
    assert_eq!(c.t.args.len(), 3);
    failure!(parse_as!(Arg, "(x)"));
    failure!(parse_as!(Arg, "f(x"));
    failure!(parse_as!(Arg, "f(x y)"));
}

#[test]
fn defs() {
    success!(parse_as!(Def, "x = 1"));
    success!(parse_as!(Def, "x = add(y, z);"));
    failure!(parse_as!(Def, "x"));
    failure!(parse_as!(Def, "x = "));
    failure!(parse_as!(Def, "1 = x"));
    failure!(parse_as!(Def, "x == 1"));
}

#[test]
fn circuits() {
    let c = success!(parse_as!(Circuit, ""));
    assert!(c.defs.is_empty());
    let c = success!(parse_as!(Circuit, "x = 1 y = x; z = neg(y)"));
    assert_eq!(c.defs.len(), 3);
    let c = success!(parse_as!(Circuit, "#[main] #[writer(x)] x = 1"));
    assert_eq!(c.attrs.len(), 2);
    failure!(parse_as!(Circuit, "x = 1 2"));
    failure!(parse_as!(Circuit, "x = 1 #[main] y = 2"));
}

#[test]
fn attr_args() {
    assert!(matches!(success!(parse_as!(AttrArg, "false")), AttrArg::Bool(_)));
    assert!(matches!(success!(parse_as!(AttrArg, "4")), AttrArg::Num(_)));
    assert!(matches!(success!(parse_as!(AttrArg, "y")), AttrArg::Name(_)));
}
