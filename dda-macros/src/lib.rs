//! Procedural macro of the dda suite.
//!
//! This crate defines the `proc_macro` that compiles a DDA circuit into
//! a standalone simulation, placed directly in the invoking module.

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

mod pipeline;

use proc_macro2::{Span, TokenStream};
use quote::quote_spanned;

use dda_err::{self as err, Diagnostic, EAccum};
use dda_san::options::Options;
use dda_syn as syntax;

/// Frontend of `dda_macros`.
///
/// Usage:
/// ```skip
/// dda_macros::circuit! {
///     #[rk_order(4)]         // Classical Runge-Kutta.
///     #[max_iterations(100)]
///     #[main]                // Also generate `fn main`, which prints
///                            // a header and the reported rows.
///     dt = const(0.01)
///     y = int(neg(y), dt, 1.0)
/// }
/// ```
/// expands to the items `elements`, `State`, `Aux`, `f`, `INITIAL`,
/// `DT`, `HEADER`, `MAX_ITERATIONS`, `MODULO_WRITE`, `RK_ORDER`,
/// `simulate` and, with `#[main]`, `enable_fp_traps` and `main`.
///
/// Errors are reported at the offending location. Warnings (cycles,
/// stale reads) are reported as uses of a deprecated constant.
#[proc_macro]
pub fn circuit(i: proc_macro::TokenStream) -> proc_macro::TokenStream {
    use syn::parse_macro_input;
    let circuit = parse_macro_input!(i as syntax::Circuit);
    let mut eaccum = EAccum::default();

    let toks = circuit_pipeline(&mut eaccum, circuit);
    let fatal = eaccum.is_fatal();
    let (es, ws) = eaccum.fetch();
    let mut out = TokenStream::new();
    if let Some(toks) = toks {
        out.extend(toks);
    } else {
        err::consistency!(fatal, "No program generated, but no fatal error emitted");
    }
    for e in &es {
        out.extend(emit_error(e));
    }
    for w in &ws {
        out.extend(emit_warning(w));
    }
    out.into()
}

/// Apply all compiler passes.
fn circuit_pipeline(eaccum: &mut EAccum, circuit: syntax::Circuit) -> Option<TokenStream> {
    let base = Options::default().with_main(false);
    // Just let the trait impls from [pipeline] guide you...
    pipeline::CompilerPass::new(eaccum, circuit, base)?
        .finish()
        .apply(eaccum)?
        .finish()
        .apply(eaccum)?
        .finish()
        .apply(eaccum)?
        .finish()
        .codegen()
}

/// Where to point a diagnostic.
fn span_of(site: Option<err::Span>) -> Span {
    site.map_or_else(Span::call_site, err::Span::or_call_site)
}

/// Emit one error message as a `compile_error!` from a sequence of spans
/// and associated hint messages.
fn emit_error(d: &Diagnostic) -> TokenStream {
    let mut lines = d.lines.iter();
    let Some((msg, site)) = lines.next() else {
        err::abort!("This error message is empty")
    };
    let mut headline = format!("{}: {msg}", d.kind);
    let mut notes = Vec::new();
    for (msg, site) in lines {
        if site.is_some() {
            notes.push(syn::Error::new(span_of(*site), format!("note: {msg}")));
        } else {
            headline.push_str(&format!("\n  note: {msg}"));
        }
    }
    let mut e = syn::Error::new(span_of(*site), headline);
    for note in notes {
        e.combine(note);
    }
    e.to_compile_error()
}

/// Emit one warning.
///
/// Stable procedural macros cannot emit warnings, but the compiler warns
/// about every use of a deprecated item, with the note of the item.
fn emit_warning(d: &Diagnostic) -> TokenStream {
    let note = d
        .lines
        .iter()
        .map(|(msg, _)| msg.as_str())
        .collect::<Vec<_>>()
        .join("; ");
    let note = format!("{}: {note}", d.kind);
    quote_spanned! {span_of(d.span())=>
        const _: () = {
            #[deprecated(note = #note)]
            const DDA_WARNING: () = ();
            DDA_WARNING
        };
    }
}

/// Generate a run of trybuild test cases.
/// Usage: `compiling!(test_name with expected_outcome in path/to/test/folder)`.
macro_rules! compiling {
    ($fun:ident with $testing:ident in $($dir:ident / )*) => {
        #[test]
        fn $fun() {
            let t = trybuild::TestCases::new();
            t.$testing(concat!("tests/", $( concat!(stringify!($dir), "/") , )* "**/*.rs"));
        }
    };
}

// Pass tests. These should compile and run.
compiling!(pass with pass in pass/);
