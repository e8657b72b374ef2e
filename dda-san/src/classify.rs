//! Split the variables of a program into state and auxiliaries.
//!
//! A variable is state if and only if its definition is an application
//! of the integrator `int(integrand, ..., step, initial)`. Classification
//! rewrites the definition of every state variable into its derivative
//! and evaluates its step and initial value.

use std::collections::{BTreeMap, BTreeSet};

use dda_err::{self as err, consistency, malformed, EAccum};
use dda_sem::Element;

use crate::ast::{Definition, Expr, Program};
use crate::constexpr::{ConstEval, NotConst};
use crate::sp::Sp;

/// A program whose variables are partitioned.
#[derive(Debug, Clone)]
pub struct Classified {
    /// Definitions, where state variables hold their derivative and
    /// `const(...)` wrappers are gone.
    pub program: Program,
    /// Integrated variables.
    pub state: BTreeSet<String>,
    /// All other defined variables.
    pub aux: BTreeSet<String>,
    /// Step expression of each state variable.
    pub step: BTreeMap<String, Sp<Expr>>,
    /// Initial value expression of each state variable.
    pub initial: BTreeMap<String, Sp<Expr>>,
    /// Reduced step of each state variable.
    pub step_values: BTreeMap<String, f64>,
    /// Reduced initial value of each state variable.
    pub initial_values: BTreeMap<String, f64>,
}

impl Program {
    /// Run the classification.
    ///
    /// Fatal errors: malformed integrators, unknown elements, arity
    /// mismatches, and steps or initial values that are not constants.
    pub fn classify(self, eaccum: &mut EAccum) -> Option<Classified> {
        tracing::debug!(definitions = self.len(), "classification starts");
        let program = self.hoist_integrators();
        program.check_elements(eaccum)?;
        let program = program.map(strip_const);

        let mut state = BTreeSet::new();
        let mut aux = BTreeSet::new();
        let mut step = BTreeMap::new();
        let mut initial = BTreeMap::new();
        let mut rewritten = Program::default();
        for Definition { name, value } in program {
            let value = match value.t {
                Expr::Apply { head, mut args } if head.t == Element::Int.name() => {
                    let (Some(init), Some(dt)) = (args.pop(), args.pop()) else {
                        malformed!()
                    };
                    state.insert(name.t.clone());
                    step.insert(name.t.clone(), dt);
                    initial.insert(name.t.clone(), init);
                    if args.len() == 1 {
                        args.pop().unwrap_or_else(|| malformed!())
                    } else {
                        // Several integrands are summed.
                        Sp::new(
                            Expr::Apply {
                                head: Sp::new(Element::Sum.name().to_owned(), head.span),
                                args,
                            },
                            value.span,
                        )
                    }
                }
                t => {
                    aux.insert(name.t.clone());
                    Sp::new(t, value.span)
                }
            };
            consistency!(
                rewritten.insert(name, value).is_ok(),
                "Names are unique in a program"
            );
        }

        let count = eaccum.error_count();
        let (step_values, initial_values) = {
            let mut ce = ConstEval::new(&rewritten, &state);
            let mut reduce = |role: &str, exprs: &BTreeMap<String, Sp<Expr>>| {
                let mut values = BTreeMap::new();
                for (var, e) in exprs {
                    match ce.eval(e) {
                        Ok(x) => {
                            values.insert(var.clone(), x);
                        }
                        Err(NotConst::Undefined(r)) => {
                            eaccum.error::<()>(err::UndeclaredVariable {
                                var: &r,
                                site: r.span,
                                user: var,
                                suggest: err::Suggest {
                                    available: rewritten.names(),
                                },
                            });
                        }
                        Err(reason) => {
                            eaccum.error::<()>(err::NotConstant {
                                var,
                                role,
                                site: e.span,
                                reason,
                            });
                        }
                    }
                }
                values
            };
            let steps = reduce("step", &step);
            let initials = reduce("initial value", &initial);
            (steps, initials)
        };
        eaccum.check_since(count)?;

        tracing::debug!(
            state = state.len(),
            aux = aux.len(),
            "classification done"
        );
        Some(Classified {
            program: rewritten,
            state,
            aux,
            step,
            initial,
            step_values,
            initial_values,
        })
    }

    /// Move every integrator that is not the head of a definition into
    /// a fresh state variable `<owner>_int<k>`.
    fn hoist_integrators(self) -> Program {
        let mut taken = self.all_variables();
        let mut hoisted = Program::default();
        let mut out = Program::default();
        for Definition { name, value } in self {
            let mut k = 0;
            let mut fresh = Vec::new();
            let value = value.rewrite_args(&mut |e: Sp<Expr>| {
                if e.t.head() != Some(Element::Int.name()) {
                    return e;
                }
                let var = loop {
                    k += 1;
                    let candidate = format!("{}_int{k}", name.t);
                    if taken.insert(candidate.clone()) {
                        break candidate;
                    }
                };
                let span = e.span;
                fresh.push((Sp::new(var.clone(), span), e));
                Sp::new(Expr::Var(var), span)
            });
            for (var, e) in fresh {
                tracing::debug!(owner = %name, var = %var, "hoisting a nested integrator");
                consistency!(hoisted.insert(var, e).is_ok(), "Fresh names are unique");
            }
            consistency!(out.insert(name, value).is_ok(), "Names are unique in a program");
        }
        for Definition { name, value } in hoisted {
            consistency!(out.insert(name, value).is_ok(), "Fresh names are unique");
        }
        out
    }

    /// Check that every application is of a known element with an
    /// acceptable number of arguments.
    fn check_elements(&self, eaccum: &mut EAccum) -> Option<()> {
        let count = eaccum.error_count();
        for def in self.iter() {
            if let Expr::Apply { head, args } = &def.value.t {
                if head.t == Element::Int.name() && !Element::Int.arity().accepts(args.len()) {
                    eaccum.error::<()>(err::IntArity {
                        var: &def.name,
                        site: def.value.span,
                        found: args.len(),
                    });
                }
            }
            check_expr(&def.value, eaccum);
        }
        eaccum.check_since(count)
    }
}

/// Check the elements of one expression, recursively.
fn check_expr(e: &Sp<Expr>, eaccum: &mut EAccum) {
    let Expr::Apply { head, args } = &e.t else {
        return;
    };
    match Element::lookup(&head.t) {
        None => {
            eaccum.error::<()>(err::UnknownElement {
                element: head,
                site: head.span,
                suggest: err::Suggest {
                    available: Element::ALL.iter().map(|e| e.name()),
                },
            });
        }
        // Only found at the root of a definition, checked by the caller.
        Some(Element::Int) => {}
        Some(elem) => {
            if !elem.arity().accepts(args.len()) {
                eaccum.error::<()>(err::ElementArity {
                    element: elem,
                    site: e.span,
                    expected: elem.arity(),
                    found: args.len(),
                });
            }
        }
    }
    for a in args {
        check_expr(a, eaccum);
    }
}

/// `const(x)` is `x`.
fn strip_const(e: Sp<Expr>) -> Sp<Expr> {
    match e.t {
        Expr::Apply { head, args } if head.t == Element::Const.name() => {
            let mut args = args.into_iter();
            match (args.next(), args.next()) {
                (Some(inner), None) => inner,
                _ => malformed!(),
            }
        }
        t => Sp::new(t, e.span),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use dda_err::Kind;

    fn int(args: impl IntoIterator<Item = Sp<Expr>>) -> Sp<Expr> {
        Expr::apply("int", args)
    }

    fn kinds(eaccum: EAccum) -> Vec<Kind> {
        eaccum.fetch().0.into_iter().map(|d| d.kind).collect()
    }

    #[test]
    fn round_trip() {
        let p = Program::default().with(
            "y",
            int([
                Expr::apply("mult", [Expr::var("y"), Expr::var("y")]),
                Expr::lit(0.5),
                Expr::lit(1.0),
            ]),
        );
        let mut eaccum = EAccum::default();
        let c = p.classify(&mut eaccum);
        assert!(!eaccum.is_fatal());
        let Some(c) = c else {
            panic!("classification failed")
        };
        assert_eq!(c.state.len(), 1);
        assert!(c.state.contains("y"));
        assert!(c.aux.is_empty());
        assert_eq!(c.step_values.get("y"), Some(&0.5));
        assert_eq!(c.initial_values.get("y"), Some(&1.0));
        assert_eq!(
            c.program.get("y").map(|d| d.value.to_string()),
            Some("mult(y, y)".to_owned())
        );
    }

    #[test]
    fn constants_and_partition() {
        let p = Program::default()
            .with("dt", Expr::apply("const", [Expr::lit(0.01)]))
            .with("y0", Expr::apply("const", [Expr::lit(2.0)]))
            .with("half", Expr::apply("div", [Expr::var("y0"), Expr::lit(2.0)]))
            .with(
                "y",
                int([
                    Expr::apply("neg", [Expr::var("y")]),
                    Expr::var("half"),
                    Expr::var("dt"),
                    Expr::var("y0"),
                ]),
            );
        let mut eaccum = EAccum::default();
        let Some(c) = p.classify(&mut eaccum) else {
            panic!("classification failed")
        };
        let all: BTreeSet<_> = c.state.union(&c.aux).cloned().collect();
        assert_eq!(all.len(), c.state.len() + c.aux.len());
        let defined: BTreeSet<String> = c.program.names().map(String::from).collect();
        assert_eq!(all, defined);
        assert_eq!(c.step_values.get("y"), Some(&0.01));
        assert_eq!(c.initial_values.get("y"), Some(&2.0));
        assert_eq!(
            c.program.get("y").map(|d| d.value.to_string()),
            Some("sum(neg(y), half)".to_owned())
        );
        assert_eq!(
            c.program.get("dt").map(|d| d.value.to_string()),
            Some("0.01".to_owned())
        );
    }

    #[test]
    fn nested_integrators_are_hoisted() {
        let p = Program::default()
            .with("x_int1", Expr::lit(0.0))
            .with(
                "x",
                Expr::apply(
                    "add",
                    [
                        int([Expr::var("x"), Expr::lit(0.1), Expr::lit(1.0)]),
                        Expr::lit(1.0),
                    ],
                ),
            );
        let mut eaccum = EAccum::default();
        let Some(c) = p.classify(&mut eaccum) else {
            panic!("classification failed")
        };
        assert!(c.state.contains("x_int2"));
        assert!(c.aux.contains("x"));
        assert!(c.aux.contains("x_int1"));
        assert_eq!(
            c.program.get("x").map(|d| d.value.to_string()),
            Some("add(x_int2, 1)".to_owned())
        );
        assert_eq!(c.step_values.get("x_int2"), Some(&0.1));
    }

    #[test]
    fn malformed_elements() {
        let p = Program::default()
            .with("y", int([Expr::var("y"), Expr::lit(0.1)]))
            .with("a", Expr::apply("div", [Expr::lit(1.0)]))
            .with("b", Expr::apply("frobnicate", [Expr::lit(1.0)]));
        let mut eaccum = EAccum::default();
        assert!(p.classify(&mut eaccum).is_none());
        let mut ks = kinds(eaccum);
        ks.sort_by_key(ToString::to_string);
        assert_eq!(ks, vec![Kind::Arity, Kind::Arity, Kind::Reference]);
    }

    #[test]
    fn not_constant() {
        let p = Program::default()
            .with("x", int([Expr::var("x"), Expr::lit(0.1), Expr::lit(1.0)]))
            .with("y", int([Expr::var("x"), Expr::var("x"), Expr::var("missing")]));
        let mut eaccum = EAccum::default();
        assert!(p.classify(&mut eaccum).is_none());
        let mut ks = kinds(eaccum);
        ks.sort_by_key(ToString::to_string);
        assert_eq!(ks, vec![Kind::Constant, Kind::Reference]);
    }
}
