//! The evaluation plan: a scheduled circuit where every name has been
//! resolved to a slot of the state or auxiliary record.
//!
//! Both the code generator and the interpreter consume a `Plan`, so the
//! phases below are the single definition of the evaluation order.

use std::collections::{BTreeSet, HashMap};
use std::fmt;

use dda_err::{self as err, malformed, EAccum};
use dda_sem::{Element, RkOrder};

use crate::ast::Expr;
use crate::causality::Schedule;
use crate::options::{Options, WriterFields};
use crate::sp::{Sp, Span};

/// A storage location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Slot {
    /// Index into the state record (or the derivative record).
    State(usize),
    /// Index into the auxiliary record.
    Aux(usize),
}

/// A closed expression over slots.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Constant.
    Lit(f64),
    /// Current contents of a slot.
    Read(Slot),
    /// Application of a computing element other than `int` and `const`.
    Call(Element, Vec<Value>),
}

impl Value {
    /// Collect the elements applied, recursively.
    fn elements(&self, out: &mut BTreeSet<Element>) {
        if let Self::Call(e, args) = self {
            out.insert(*e);
            for a in args {
                a.elements(out);
            }
        }
    }
}

/// When an equation is evaluated during one evaluation of the derivative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Phase {
    /// Auxiliaries in dependency order.
    Sorted,
    /// Auxiliaries involved in a cycle, best effort.
    Cyclic,
    /// Derivatives of the state variables.
    Derivative,
    /// Auxiliaries that no other auxiliary depends on and that depend on
    /// no other auxiliary.
    Isolated,
}

impl Phase {
    /// All phases in evaluation order.
    pub const ALL: [Self; 4] = [Self::Sorted, Self::Cyclic, Self::Derivative, Self::Isolated];
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sorted => write!(f, "sorted auxiliaries"),
            Self::Cyclic => write!(f, "cyclic auxiliaries"),
            Self::Derivative => write!(f, "derivatives"),
            Self::Isolated => write!(f, "isolated auxiliaries"),
        }
    }
}

/// `target = value`
///
/// For the `Derivative` phase the target is the slot of the derivative
/// record, which has the same layout as the state record.
#[derive(Debug, Clone, PartialEq)]
pub struct Equation {
    /// When it is evaluated.
    pub phase: Phase,
    /// Assigned slot.
    pub target: Slot,
    /// Assigned value.
    pub value: Value,
}

/// A circuit ready to be printed or executed.
#[derive(Debug, Clone, PartialEq)]
pub struct Plan {
    /// Names of the state variables, sorted. Index is `Slot::State`.
    pub state: Vec<Sp<String>>,
    /// Names of the auxiliaries, sorted. Index is `Slot::Aux`.
    pub aux: Vec<Sp<String>>,
    /// Initial value of each state variable.
    pub initial: Vec<f64>,
    /// Step of each state variable.
    pub step: Vec<f64>,
    /// All equations, grouped by phase in evaluation order.
    pub equations: Vec<Equation>,
    /// Reported slots, in column order.
    pub writer: Vec<Slot>,
    /// Integration scheme.
    pub order: RkOrder,
    /// Options the plan was lowered with.
    pub options: Options,
}

/// Whether `name` can be a field of the generated records.
///
/// Keywords are accepted (they are printed as raw identifiers) except
/// those that cannot be raw.
#[must_use]
pub fn is_valid_name(name: &str) -> bool {
    !matches!(name, "_" | "self" | "Self" | "super" | "crate")
        && syn::parse_str::<syn::Ident>(&format!("r#{name}")).is_ok()
}

impl Plan {
    /// Name of the variable stored in a slot.
    #[must_use]
    pub fn name(&self, slot: Slot) -> &Sp<String> {
        let found = match slot {
            Slot::State(i) => self.state.get(i),
            Slot::Aux(i) => self.aux.get(i),
        };
        found.unwrap_or_else(|| err::abort!("Slot {slot:?} is out of bounds"))
    }

    /// Equations of one phase, in evaluation order.
    pub fn phase(&self, phase: Phase) -> impl Iterator<Item = &Equation> {
        self.equations.iter().filter(move |eq| eq.phase == phase)
    }

    /// Elements used anywhere in the equations.
    #[must_use]
    pub fn elements(&self) -> BTreeSet<Element> {
        let mut out = BTreeSet::new();
        for eq in &self.equations {
            eq.value.elements(&mut out);
        }
        out
    }

    /// Header line of the output: reported names separated by spaces.
    #[must_use]
    pub fn header(&self) -> String {
        self.writer
            .iter()
            .map(|s| self.name(*s).t.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl Schedule {
    /// Resolve names and group the equations into phases.
    ///
    /// Fatal errors: invalid options, names that cannot be generated,
    /// writer fields that name no variable.
    pub fn lower(self, eaccum: &mut EAccum, options: &Options) -> Option<Plan> {
        let count = eaccum.error_count();
        let order = RkOrder::new(options.rk_order);
        if order.is_none() {
            eaccum.error::<()>(err::UnsupportedScheme {
                order: options.rk_order,
                site: Option::<Span>::None,
            });
        }
        if options.modulo_write == 0 {
            eaccum.error::<()>(err::OptionValue {
                name: "modulo_write",
                site: Option::<Span>::None,
                expect: "a positive number of iterations",
            });
        }
        let program = &self.classified.program;
        for def in program.iter() {
            if !is_valid_name(&def.name.t) {
                eaccum.error::<()>(err::InvalidName {
                    var: &def.name,
                    site: def.site(),
                });
            }
        }

        let named = |vars: &BTreeSet<String>| -> Vec<Sp<String>> {
            vars.iter()
                .map(|v| program.get(v).map_or_else(|| Sp::forged(v.clone()), |d| d.name.clone()))
                .collect()
        };
        let state = named(&self.classified.state);
        let aux = named(&self.classified.aux);
        let mut slots: HashMap<&str, Slot> = HashMap::new();
        for (i, v) in state.iter().enumerate() {
            slots.insert(&v.t, Slot::State(i));
        }
        for (i, v) in aux.iter().enumerate() {
            slots.insert(&v.t, Slot::Aux(i));
        }

        let writer: Vec<Slot> = match &options.writer_fields {
            WriterFields::All => {
                let all: BTreeSet<&str> = slots.keys().copied().collect();
                all.into_iter().filter_map(|v| slots.get(v).copied()).collect()
            }
            WriterFields::Only(fields) => fields
                .iter()
                .filter_map(|f| {
                    let slot = slots.get(f.t.as_str()).copied();
                    if slot.is_none() {
                        eaccum.error::<()>(err::UnknownWriterField {
                            field: f,
                            site: f.span,
                            suggest: err::Suggest {
                                available: program.names(),
                            },
                        });
                    }
                    slot
                })
                .collect(),
        };
        eaccum.check_since(count)?;
        let Some(order) = order else {
            malformed!();
        };

        let lookup = |v: &str| -> Slot {
            slots
                .get(v)
                .copied()
                .unwrap_or_else(|| err::abort!("Variable {v} has no slot"))
        };
        let mut equations = Vec::new();
        let mut push = |phase: Phase, var: &str| {
            let Some(def) = program.get(var) else {
                err::abort!("Variable {var} has no definition");
            };
            equations.push(Equation {
                phase,
                target: lookup(var),
                value: lower_expr(&def.value, &lookup),
            });
        };
        for v in &self.ordered {
            push(Phase::Sorted, v);
        }
        for v in &self.cyclic {
            push(Phase::Cyclic, v);
        }
        for v in &self.classified.state {
            push(Phase::Derivative, v);
        }
        for v in &self.isolated {
            push(Phase::Isolated, v);
        }

        let values = |m: &std::collections::BTreeMap<String, f64>| -> Vec<f64> {
            state
                .iter()
                .map(|v| {
                    m.get(&v.t)
                        .copied()
                        .unwrap_or_else(|| err::abort!("State variable {v} has no constant"))
                })
                .collect()
        };
        let initial = values(&self.classified.initial_values);
        let step = values(&self.classified.step_values);

        tracing::debug!(
            state = state.len(),
            aux = aux.len(),
            equations = equations.len(),
            writer = writer.len(),
            order = %order,
            "lowering done"
        );
        Some(Plan {
            state,
            aux,
            initial,
            step,
            equations,
            writer,
            order,
            options: options.clone(),
        })
    }
}

/// Resolve every reference of an expression.
fn lower_expr(e: &Sp<Expr>, lookup: &impl Fn(&str) -> Slot) -> Value {
    match &e.t {
        Expr::Lit(x) => Value::Lit(*x),
        Expr::Var(v) => Value::Read(lookup(v)),
        Expr::Apply { head, args } => {
            let Some(elem) = Element::lookup(&head.t) else {
                err::abort!("Element {head} should have been checked during classification");
            };
            err::consistency!(
                !matches!(elem, Element::Int | Element::Const),
                "`{head}` should have been removed during classification"
            );
            Value::Call(elem, args.iter().map(|a| lower_expr(a, lookup)).collect())
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::ast::Program;
    use dda_err::Kind;

    fn lower(p: Program, options: &Options) -> (Option<Plan>, EAccum) {
        let mut eaccum = EAccum::default();
        let plan = p
            .classify(&mut eaccum)
            .and_then(|c| c.causality(&mut eaccum))
            .and_then(|s| s.lower(&mut eaccum, options));
        (plan, eaccum)
    }

    fn oscillator() -> Program {
        // x'' = -x, with a reported energy
        Program::default()
            .with(
                "x",
                Expr::apply("int", [Expr::var("v"), Expr::lit(0.1), Expr::lit(1.0)]),
            )
            .with(
                "v",
                Expr::apply("int", [Expr::var("mx"), Expr::lit(0.1), Expr::lit(0.0)]),
            )
            .with("mx", Expr::apply("neg", [Expr::var("x")]))
            .with(
                "energy",
                Expr::apply(
                    "add",
                    [
                        Expr::apply("mult", [Expr::var("x"), Expr::var("x")]),
                        Expr::apply("mult", [Expr::var("v"), Expr::var("v")]),
                    ],
                ),
            )
    }

    #[test]
    fn layout() {
        let (plan, eaccum) = lower(oscillator(), &Options::default());
        assert!(!eaccum.is_fatal());
        let Some(plan) = plan else { panic!("lowering failed") };
        let names = |v: &[Sp<String>]| v.iter().map(|s| s.t.clone()).collect::<Vec<_>>();
        assert_eq!(names(&plan.state), ["v", "x"]);
        assert_eq!(names(&plan.aux), ["energy", "mx"]);
        assert_eq!(plan.initial, [0.0, 1.0]);
        assert_eq!(plan.step, [0.1, 0.1]);
        assert_eq!(plan.header(), "energy mx v x");
        assert_eq!(plan.order, RkOrder::EULER);
        // Both auxiliaries are isolated: they only read state variables.
        assert_eq!(plan.phase(Phase::Isolated).count(), 2);
        assert_eq!(plan.phase(Phase::Derivative).count(), 2);
        assert_eq!(
            plan.elements().into_iter().collect::<Vec<_>>(),
            [Element::Neg, Element::Add, Element::Mult]
        );
        let derivative_of_v = plan.phase(Phase::Derivative).next().map(|eq| &eq.value);
        assert_eq!(derivative_of_v, Some(&Value::Read(Slot::Aux(1))));
    }

    #[test]
    fn phases_are_ordered() {
        let p = Program::default()
            .with("a", Expr::apply("neg", [Expr::var("b")]))
            .with("b", Expr::apply("neg", [Expr::var("a")]))
            .with("c", Expr::apply("abs", [Expr::var("d")]))
            .with("d", Expr::lit(1.0))
            .with("e", Expr::lit(2.0))
            .with(
                "y",
                Expr::apply("int", [Expr::var("c"), Expr::lit(0.1), Expr::lit(1.0)]),
            );
        let (plan, _) = lower(p, &Options::default());
        let Some(plan) = plan else { panic!("lowering failed") };
        let phases: Vec<(Phase, String)> = plan
            .equations
            .iter()
            .map(|eq| (eq.phase, plan.name(eq.target).t.clone()))
            .collect();
        let expected = [
            (Phase::Sorted, "d"),
            (Phase::Sorted, "c"),
            (Phase::Cyclic, "a"),
            (Phase::Cyclic, "b"),
            (Phase::Derivative, "y"),
            (Phase::Isolated, "e"),
        ];
        assert_eq!(
            phases,
            expected.map(|(p, s)| (p, s.to_owned())).to_vec()
        );
    }

    #[test]
    fn option_errors() {
        let opts = Options::default()
            .with_rk_order(5)
            .with_modulo_write(0)
            .with_writer_fields(["x", "nope"]);
        let (plan, eaccum) = lower(oscillator(), &opts);
        assert!(plan.is_none());
        let mut kinds: Vec<_> = eaccum.errors().iter().map(|e| e.kind).collect();
        kinds.sort_by_key(ToString::to_string);
        assert_eq!(kinds, [Kind::Option, Kind::Reference, Kind::Scheme]);
    }

    #[test]
    fn writer_subset() {
        let opts = Options::default().with_writer_fields(["x", "energy"]);
        let (plan, _) = lower(oscillator(), &opts);
        let Some(plan) = plan else { panic!("lowering failed") };
        assert_eq!(plan.writer, [Slot::State(1), Slot::Aux(0)]);
        assert_eq!(plan.header(), "x energy");
    }

    #[test]
    fn names() {
        assert!(is_valid_name("x"));
        assert!(is_valid_name("type"));
        assert!(is_valid_name("const"));
        assert!(!is_valid_name("self"));
        assert!(!is_valid_name("_"));
        assert!(!is_valid_name("1x"));
        let p = Program::default().with("self", Expr::lit(1.0));
        let (plan, eaccum) = lower(p, &Options::default());
        assert!(plan.is_none());
        assert_eq!(eaccum.errors()[0].kind, Kind::Syntax);
    }
}
