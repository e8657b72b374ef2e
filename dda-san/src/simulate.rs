//! Reference interpreter of a `Plan`.
//!
//! The interpreter follows the generated program step by step: same
//! phases, same persistence of the auxiliaries from one evaluation to the
//! next, same floating-point operations in the same order. Hardware traps
//! are emulated by inspecting the operands and result of every element.

use std::collections::BTreeMap;
use std::fmt;

use dda_err::{self as err, EAccum};
use dda_sem::Trap;

use crate::plan::{Phase, Plan, Slot, Value};

/// A trapped floating-point exception.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fault {
    /// Variable being computed.
    pub var: String,
    /// Exception.
    pub trap: Trap,
}

/// Execution state of a plan.
#[derive(Debug, Clone)]
pub struct Simulator<'p> {
    /// What to execute.
    plan: &'p Plan,
    /// Auxiliaries left by the last evaluation.
    aux: Vec<f64>,
}

/// Observable output of a simulation.
#[derive(Debug, Clone, PartialEq)]
pub struct Trace {
    /// Names of the reported variables.
    pub fields: Vec<String>,
    /// One row per report.
    pub rows: Vec<Vec<f64>>,
    /// Final state.
    pub state: BTreeMap<String, f64>,
    /// Auxiliaries at the end of the simulation.
    pub aux: BTreeMap<String, f64>,
}

impl Trace {
    /// Final value of a variable.
    #[must_use]
    pub fn value(&self, name: &str) -> Option<f64> {
        self.state.get(name).or_else(|| self.aux.get(name)).copied()
    }

    /// All reported values of a field.
    #[must_use]
    pub fn column(&self, name: &str) -> Option<Vec<f64>> {
        let i = self.fields.iter().position(|f| f == name)?;
        self.rows.iter().map(|r| r.get(i).copied()).collect()
    }
}

/// Exactly what the generated `main` prints.
impl fmt::Display for Trace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.fields.join(" "))?;
        for row in &self.rows {
            writeln!(f, "{}", format_row(row))?;
        }
        Ok(())
    }
}

/// `{:.6}` space separated.
fn format_row(row: &[f64]) -> String {
    row.iter()
        .map(|x| format!("{x:.6}"))
        .collect::<Vec<_>>()
        .join(" ")
}

impl<'p> Simulator<'p> {
    /// Auxiliaries start at zero.
    #[must_use]
    pub fn new(plan: &'p Plan) -> Self {
        Self {
            plan,
            aux: vec![0.0; plan.aux.len()],
        }
    }

    /// One evaluation of the derivative function.
    ///
    /// # Errors
    /// The first trapped exception, if traps are enabled.
    pub fn derivative(&mut self, state: &[f64]) -> Result<Vec<f64>, Fault> {
        let plan = self.plan;
        let trap = plan.options.trap_fp;
        if trap {
            // Building a state out of a trapped value would have trapped.
            for (i, x) in state.iter().enumerate() {
                let fault = if x.is_nan() {
                    Some(Trap::Invalid)
                } else if x.is_infinite() {
                    Some(Trap::Overflow)
                } else {
                    None
                };
                if let Some(trap) = fault {
                    return Err(Fault {
                        var: plan.name(Slot::State(i)).t.clone(),
                        trap,
                    });
                }
            }
            self.aux.fill(Trap::poison());
        }
        let mut dqdt = vec![0.0; plan.state.len()];
        for phase in Phase::ALL {
            for eq in plan.phase(phase) {
                let x = self.eval(&eq.value, state, trap).map_err(|trap| Fault {
                    var: plan.name(eq.target).t.clone(),
                    trap,
                })?;
                let target = match (phase, eq.target) {
                    (Phase::Derivative, Slot::State(i)) => dqdt.get_mut(i),
                    (_, Slot::Aux(i)) => self.aux.get_mut(i),
                    _ => err::malformed!(),
                };
                match target {
                    Some(t) => *t = x,
                    None => err::abort!("Equation for {:?} is out of bounds", eq.target),
                }
            }
        }
        Ok(dqdt)
    }

    /// Value of an expression.
    fn eval(&self, v: &Value, state: &[f64], trap: bool) -> Result<f64, Trap> {
        Ok(match v {
            Value::Lit(x) => *x,
            Value::Read(Slot::State(i)) => at(state, *i),
            Value::Read(Slot::Aux(i)) => at(&self.aux, *i),
            Value::Call(elem, args) => {
                let vals = args
                    .iter()
                    .map(|a| self.eval(a, state, trap))
                    .collect::<Result<Vec<_>, _>>()?;
                let Some(res) = elem.eval(&vals) else {
                    err::abort!("Element {elem} applied to {} arguments", vals.len());
                };
                if trap {
                    if let Some(t) = Trap::detect(*elem, &vals, res) {
                        return Err(t);
                    }
                }
                res
            }
        })
    }

    /// Run the whole simulation.
    ///
    /// Reports a `RuntimeTrap` error and returns `None` if a trapped
    /// exception occurs.
    pub fn run(&mut self, eaccum: &mut EAccum) -> Option<Trace> {
        let plan = self.plan;
        let scheme = plan.order.scheme();
        let trap = plan.options.trap_fp;
        let writer_names: Vec<String> = plan.writer.iter().map(|s| plan.name(*s).t.clone()).collect();
        tracing::debug!(
            scheme = scheme.name,
            iterations = plan.options.max_iterations,
            "simulation starts"
        );

        let mut state = plan.initial.clone();
        let mut rows = Vec::new();
        for iter in 0..plan.options.max_iterations {
            let next = match scheme.step(&state, &plan.step, |s| self.derivative(s)) {
                Ok(next) => next,
                Err(fault) => {
                    return eaccum.error(err::RuntimeTrap {
                        var: fault.var,
                        step: iter,
                        what: fault.trap,
                    })
                }
            };
            if trap {
                for (i, (before, after)) in state.iter().zip(&next).enumerate() {
                    if let Some(t) = Trap::detect_update(*before, *after) {
                        return eaccum.error(err::RuntimeTrap {
                            var: plan.name(Slot::State(i)).t.clone(),
                            step: iter,
                            what: t,
                        });
                    }
                }
            }
            state = next;
            if iter.checked_rem(plan.options.modulo_write) == Some(0) {
                let row: Vec<f64> = plan
                    .writer
                    .iter()
                    .map(|s| match s {
                        Slot::State(i) => at(&state, *i),
                        Slot::Aux(i) => at(&self.aux, *i),
                    })
                    .collect();
                tracing::trace!(iteration = iter, row = %format_row(&row), "report");
                rows.push(row);
            }
        }

        let named = |names: &[crate::sp::Sp<String>], vals: &[f64]| {
            names
                .iter()
                .map(|n| n.t.clone())
                .zip(vals.iter().copied())
                .collect::<BTreeMap<_, _>>()
        };
        tracing::debug!(rows = rows.len(), "simulation done");
        Some(Trace {
            fields: writer_names,
            rows,
            state: named(&plan.state, &state),
            aux: named(&plan.aux, &self.aux),
        })
    }
}

/// Checked read.
fn at(v: &[f64], i: usize) -> f64 {
    match v.get(i) {
        Some(x) => *x,
        None => err::abort!("No index {i} on array of length {}", v.len()),
    }
}
