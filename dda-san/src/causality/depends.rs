//! Defines the dependencies between definitions of the program.
//!
//! A definition `a = f(b, c)` provides `a` and requires `b` and `c`.
//! Both lists keep the location of each name so that diagnostics can
//! point at the exact reference.

use crate::ast::{Definition, Expr};
use crate::sp::Sp;

/// Construct the dependency constraints introduced by `Self`.
pub trait Depends {
    /// The type of elementary dependencies (e.g. variable names)
    type Output;
    /// List all the basic building blocks that this element defines.
    fn provides(&self, v: &mut Vec<Self::Output>);
    /// List all the basic building blocks that must be defined before this element.
    fn requires(&self, v: &mut Vec<Self::Output>);
}

/// An expression is pure: it provides nothing, and requires every
/// variable it references, in order of appearance.
impl Depends for Sp<Expr> {
    type Output = Sp<String>;
    fn provides(&self, _: &mut Vec<Self::Output>) {}
    fn requires(&self, v: &mut Vec<Self::Output>) {
        self.references(v);
    }
}

impl Depends for Definition {
    type Output = Sp<String>;
    fn provides(&self, v: &mut Vec<Self::Output>) {
        v.push(self.name.clone());
    }
    fn requires(&self, v: &mut Vec<Self::Output>) {
        self.value.requires(v);
    }
}
