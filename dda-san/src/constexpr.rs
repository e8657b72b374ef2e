//! Reduce step sizes and initial values to numbers.
//!
//! The step and initial value of an integrator are ordinary expressions
//! that must be computable before the simulation starts: literals,
//! references to auxiliaries that are themselves constant, and element
//! applications over constants.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt;

use dda_sem::Element;

use crate::ast::{Expr, Program};
use crate::sp::Sp;

/// Why an expression is not a constant.
#[derive(Debug, Clone, PartialEq)]
pub enum NotConst {
    /// Depends on a state variable.
    State(String),
    /// Refers to a variable that has no definition.
    Undefined(Sp<String>),
    /// The evaluation reached back to a variable being evaluated.
    SelfReferential(String),
    /// The element has no value over these arguments.
    Element(String),
}

impl fmt::Display for NotConst {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::State(v) => write!(f, "It depends on `{v}`, which is a state variable"),
            Self::Undefined(v) => write!(f, "It depends on `{v}`, which is never defined"),
            Self::SelfReferential(v) => {
                write!(f, "It depends on `{v}`, whose definition depends on itself")
            }
            Self::Element(e) => write!(f, "`{e}` cannot be evaluated before the simulation"),
        }
    }
}

/// Memoizing evaluator over the definitions of a program.
pub struct ConstEval<'p> {
    /// Definitions to follow references into.
    program: &'p Program,
    /// Variables that never reduce.
    state: &'p BTreeSet<String>,
    /// Variables already reduced.
    cache: HashMap<String, f64>,
    /// Variables currently being reduced.
    visiting: HashSet<String>,
}

impl<'p> ConstEval<'p> {
    /// Evaluator for the auxiliaries of `program`.
    #[must_use]
    pub fn new(program: &'p Program, state: &'p BTreeSet<String>) -> Self {
        Self {
            program,
            state,
            cache: HashMap::new(),
            visiting: HashSet::new(),
        }
    }

    /// Reduce an expression to a number.
    ///
    /// # Errors
    /// The first reason found for which the expression is not a constant.
    pub fn eval(&mut self, e: &Sp<Expr>) -> Result<f64, NotConst> {
        match &e.t {
            Expr::Lit(x) => Ok(*x),
            Expr::Var(v) => self.eval_var(Sp::new(v, e.span)),
            Expr::Apply { head, args } => {
                let Some(elem) = Element::lookup(&head.t) else {
                    return Err(NotConst::Element(head.t.clone()));
                };
                let vals = args
                    .iter()
                    .map(|a| self.eval(a))
                    .collect::<Result<Vec<_>, _>>()?;
                elem.eval(&vals)
                    .ok_or_else(|| NotConst::Element(head.t.clone()))
            }
        }
    }

    /// Reduce the definition of a variable.
    fn eval_var(&mut self, v: Sp<&String>) -> Result<f64, NotConst> {
        if self.state.contains(v.t) {
            return Err(NotConst::State(v.t.clone()));
        }
        if let Some(x) = self.cache.get(v.t) {
            return Ok(*x);
        }
        let program = self.program;
        let Some(def) = program.get(v.t) else {
            return Err(NotConst::Undefined(v.cloned()));
        };
        if !self.visiting.insert(v.t.clone()) {
            return Err(NotConst::SelfReferential(v.t.clone()));
        }
        let res = self.eval(&def.value);
        self.visiting.remove(v.t);
        let x = res?;
        self.cache.insert(v.t.clone(), x);
        Ok(x)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn program() -> Program {
        Program::default()
            .with("a", Expr::lit(2.0))
            .with("b", Expr::apply("mult", [Expr::var("a"), Expr::lit(3.0)]))
            .with("loop1", Expr::apply("neg", [Expr::var("loop2")]))
            .with("loop2", Expr::apply("neg", [Expr::var("loop1")]))
            .with("y", Expr::var("b"))
    }

    #[test]
    fn transitive() {
        let p = program();
        let state = BTreeSet::new();
        let mut ce = ConstEval::new(&p, &state);
        let e = Expr::apply("add", [Expr::var("b"), Expr::var("a")]);
        assert_eq!(ce.eval(&e), Ok(8.0));
    }

    #[test]
    fn failures() {
        let p = program();
        let state = ["y".to_owned()].into_iter().collect();
        let mut ce = ConstEval::new(&p, &state);
        assert_eq!(
            ce.eval(&Expr::var("y")),
            Err(NotConst::State("y".to_owned()))
        );
        assert_eq!(
            ce.eval(&Expr::var("loop1")),
            Err(NotConst::SelfReferential("loop1".to_owned()))
        );
        assert!(matches!(
            ce.eval(&Expr::var("nope")),
            Err(NotConst::Undefined(v)) if v.t == "nope"
        ));
        assert_eq!(
            ce.eval(&Expr::apply("div", [Expr::lit(1.0)])),
            Err(NotConst::Element("div".to_owned()))
        );
    }
}
