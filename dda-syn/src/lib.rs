//! Syntax of DDA circuits.
//!
//! A circuit is a sequence of definitions `name = arg`, where `arg` is
//! the application `head(arg, ...)` of a computing element, a reference
//! to a variable, or a numeric literal. Definitions may be followed by a
//! `;`, which is only useful to separate two definitions on the same line
//! for readability.
//!
//! ```skip
//! #[rk_order(4)]
//! #[writer(y)]
//! dt = const(0.01)
//! y = int(neg(y), dt, 1.0)
//! ```
//!
//! When a circuit is given as text, `#` starts a comment that extends to
//! the end of the line (see [`text`]). When it is given to the `circuit!`
//! macro, comments are those of Rust and the circuit may start with outer
//! attributes setting the generation options (see [`translate::options`]).

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
pub mod text;
pub mod translate;

mod test;

pub use ast::Circuit;

use dda_err::{self as err, EAccum};
use dda_san::sp::Span;

/// Record every message of a parse error as a `Syntax` diagnostic.
pub fn syntax_error<T>(e: &syn::Error, eaccum: &mut EAccum) -> Option<T> {
    for e in e {
        eaccum.error::<()>(err::SyntaxError {
            msg: e.to_string(),
            site: Span::from(e.span()),
        });
    }
    None
}
