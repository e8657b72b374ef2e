//! Generation options.
//!
//! These describe the program that is generated rather than the circuit:
//! which variables are reported, how often, for how long, and with which
//! integration scheme.

use crate::sp::Sp;

/// Which variables are reported in each output row.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum WriterFields {
    /// Every variable of the circuit, sorted by name.
    #[default]
    All,
    /// Only these, in this order.
    Only(Vec<Sp<String>>),
}

/// Parameters of the generated simulation.
#[derive(Debug, Clone, PartialEq)]
pub struct Options {
    /// Reported variables.
    pub writer_fields: WriterFields,
    /// Report every `modulo_write` iterations.
    pub modulo_write: usize,
    /// Number of integration steps.
    pub max_iterations: usize,
    /// Order of the Runge-Kutta scheme (1 to 4), validated when lowering.
    pub rk_order: u32,
    /// Abort on floating-point exceptions and poison the auxiliaries
    /// at the start of each evaluation.
    pub trap_fp: bool,
    /// Generate a `main` function.
    pub emit_main: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            writer_fields: WriterFields::All,
            modulo_write: 20,
            max_iterations: 30000,
            rk_order: 1,
            trap_fp: true,
            emit_main: true,
        }
    }
}

impl Options {
    /// Report only these variables.
    #[must_use]
    pub fn with_writer_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.writer_fields =
            WriterFields::Only(fields.into_iter().map(|f| Sp::forged(f.into())).collect());
        self
    }

    /// Report every `n` iterations.
    #[must_use]
    pub fn with_modulo_write(mut self, n: usize) -> Self {
        self.modulo_write = n;
        self
    }

    /// Run for `n` iterations.
    #[must_use]
    pub fn with_max_iterations(mut self, n: usize) -> Self {
        self.max_iterations = n;
        self
    }

    /// Integrate with the scheme of this order.
    #[must_use]
    pub fn with_rk_order(mut self, order: u32) -> Self {
        self.rk_order = order;
        self
    }

    /// Enable or disable floating-point traps.
    #[must_use]
    pub fn with_trap_fp(mut self, trap: bool) -> Self {
        self.trap_fp = trap;
        self
    }

    /// Enable or disable the generation of `main`.
    #[must_use]
    pub fn with_main(mut self, main: bool) -> Self {
        self.emit_main = main;
        self
    }
}
