//! Runtime semantics of a DDA circuit.
//!
//! This crate is shared between the reference interpreter and the code
//! generator: both evaluate the same [`Element`]s and advance the state
//! with the same [`Scheme`]s, so that the coefficients of the integration
//! formulas and the meaning of each computing element are written down
//! exactly once.

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

pub mod elements;
pub mod schemes;
pub mod trap;

pub use elements::{Arity, Element};
pub use schemes::{Increment, RkOrder, Scheme, Term};
pub use trap::Trap;
