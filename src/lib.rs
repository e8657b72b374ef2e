//! Compiler of DDA analog circuit descriptions.
//!
//! A circuit assigns each variable either the output of a computing
//! element or an integrator `int(derivative, step, initial)`. The
//! compiler classifies the variables, orders the computation of the
//! auxiliaries, and generates a standalone Rust program that integrates
//! the circuit with an explicit Runge-Kutta scheme and prints a table of
//! the reported variables. The same compiled circuit can also be run in
//! process by a reference interpreter.
//!
//! ```
//! let options = dda::Options::default()
//!     .with_max_iterations(100)
//!     .with_rk_order(4);
//! let trace = dda::simulate("dt = const(0.01)\ny = int(neg(y), dt, 1)", &options)?;
//! let y = trace.value("y").unwrap_or_default();
//! assert!((y - (-1.0_f64).exp()).abs() < 1e-6);
//! # Ok::<(), dda::Diagnostics>(())
//! ```
//!
//! Circuits can also be compiled inline with [`circuit!`].

#![warn(
    missing_docs,
    unused_crate_dependencies,
    unused_macro_rules,
    variant_size_differences,
    clippy::allow_attributes,
    clippy::allow_attributes_without_reason,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::missing_docs_in_private_items,
    clippy::multiple_inherent_impl,
    clippy::panic,
    clippy::pedantic,
    clippy::str_to_string,
    clippy::unreachable,
    clippy::unwrap_used,
    clippy::use_debug
)]

use std::fmt;

use quote::ToTokens;

use dda_err::EAccum;

pub use dda_err::{Diagnostic, Kind};
pub use dda_macros::circuit;
pub use dda_san::ast::{Definition, Expr, Program};
pub use dda_san::causality::graph::{topological_sort, Sorted};
pub use dda_san::options::{Options, WriterFields};
pub use dda_san::plan::{Phase, Plan};
pub use dda_san::simulate::{Simulator, Trace};
pub use dda_sem::{Element, RkOrder, Trap};

/// Everything that prevented a circuit from compiling or running.
#[derive(Debug, Clone)]
pub struct Diagnostics {
    /// Fatal diagnostics, at least one.
    pub errors: Vec<Diagnostic>,
    /// Warnings recorded before the failure.
    pub warnings: Vec<Diagnostic>,
}

impl From<EAccum> for Diagnostics {
    fn from(eaccum: EAccum) -> Self {
        let (errors, warnings) = eaccum.fetch();
        Self { errors, warnings }
    }
}

/// One diagnostic per paragraph, errors first.
impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, d) in self.errors.iter().chain(&self.warnings).enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{d}")?;
        }
        Ok(())
    }
}

impl std::error::Error for Diagnostics {}

/// Run a pass, converting its failure into `Diagnostics`.
fn run<T>(pass: impl FnOnce(&mut EAccum) -> Option<T>) -> Result<(T, Vec<Diagnostic>), Diagnostics> {
    let mut eaccum = EAccum::default();
    match pass(&mut eaccum) {
        Some(t) => {
            dda_err::consistency!(!eaccum.is_fatal(), "Pass succeeded despite fatal errors");
            let (_, warnings) = eaccum.fetch();
            Ok((t, warnings))
        }
        None => {
            dda_err::consistency!(eaccum.is_fatal(), "Pass failed without a fatal error");
            Err(eaccum.into())
        }
    }
}

/// A circuit ready to be emitted or executed.
#[derive(Debug, Clone)]
pub struct Compiled {
    /// Evaluation plan.
    pub plan: Plan,
    /// Non-fatal diagnostics.
    pub warnings: Vec<Diagnostic>,
}

impl Compiled {
    /// Source of the standalone simulation.
    #[must_use]
    pub fn to_rust(&self) -> String {
        format!(
            "// This code was generated by dda.\n{}\n",
            self.plan.to_token_stream()
        )
    }

    /// Run the simulation in process.
    ///
    /// # Errors
    /// A `RuntimeTrap` if a floating-point exception is trapped.
    pub fn simulate(&self) -> Result<Trace, Diagnostics> {
        run(|eaccum| Simulator::new(&self.plan).run(eaccum)).map(|(trace, _)| trace)
    }
}

/// Parse a circuit given as text.
///
/// # Errors
/// Syntax errors and variables defined twice.
pub fn parse(text: &str) -> Result<Program, Diagnostics> {
    run(|eaccum| match dda_syn::text::parse_text(text) {
        Ok(circuit) => circuit.into_program(eaccum),
        Err(e) => dda_syn::syntax_error(&e, eaccum),
    })
    .map(|(program, _)| program)
}

/// Analyze a program down to its evaluation plan.
///
/// # Errors
/// Every fatal diagnostic of the first pass that failed.
pub fn compile(program: Program, options: &Options) -> Result<Compiled, Diagnostics> {
    tracing::debug!(definitions = program.len(), "compiling");
    let (plan, warnings) = run(|eaccum| {
        program
            .classify(eaccum)?
            .causality(eaccum)?
            .lower(eaccum, options)
    })?;
    Ok(Compiled { plan, warnings })
}

/// Parse then compile.
///
/// # Errors
/// See `parse` and `compile`.
pub fn compile_str(text: &str, options: &Options) -> Result<Compiled, Diagnostics> {
    compile(parse(text)?, options)
}

/// Generate the source of the simulation of a circuit given as text.
///
/// # Errors
/// See `compile_str`.
pub fn generate(text: &str, options: &Options) -> Result<String, Diagnostics> {
    Ok(compile_str(text, options)?.to_rust())
}

/// Run the simulation of a circuit given as text with the interpreter.
///
/// # Errors
/// See `compile_str` and `Compiled::simulate`.
pub fn simulate(text: &str, options: &Options) -> Result<Trace, Diagnostics> {
    compile_str(text, options)?.simulate()
}
