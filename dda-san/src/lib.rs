//! Analysis of a DDA circuit all the way down to code generation.
//!
//! The entry point for this entire crate is in constructing an
//! `ast::Program`, and then you should do the following in exactly that
//! order (each step consumes the output of the previous one):
//!
//! 0. From a parsed result or by hand, construct an `ast::Program`.
//!
//! 1. Classification
//!     by `Program::classify`
//!
//!     (hoists nested integrators, checks every computing element,
//!     strips `const(...)`, splits state from auxiliary variables and
//!     evaluates the step and initial value of each state variable)
//!
//! 2. Causality
//!     by `Classified::causality`
//!
//!     (builds the dependency edges, rejects undefined references and
//!     orders the auxiliaries, isolating those caught in a cycle)
//!
//! 3. Lowering
//!     by `Schedule::lower`
//!
//!     (resolves every name to a slot of the state or auxiliary record
//!     and groups the equations into evaluation phases)
//!
//! 4. Codegen
//!     by `quote::ToTokens` on `plan::Plan`
//!
//! The `plan::Plan` can also be executed in process by
//! `simulate::Simulator`, which follows exactly the evaluation order of
//! the generated code.
//!
//! Each step takes an `EAccum` and returns `None` if a fatal error was
//! recorded; warnings do not interrupt the pipeline.

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

pub mod ast;
pub mod causality;
pub mod classify;
pub mod codegen;
pub mod constexpr;
pub mod options;
pub mod plan;
pub mod simulate;
pub mod sp;
