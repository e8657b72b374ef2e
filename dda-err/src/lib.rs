//! Error accumulator and prebuilt diagnostics of the dda compiler.
//!
//! Every pass of the compiler receives an [`EAccum`] and pushes into it
//! either fatal errors (through [`EAccum::error`], which returns `None` so
//! that the pass can abort with `?`) or non-fatal warnings
//! (through [`EAccum::warning`]).
//! Diagnostics themselves are prebuilt message structs declared in
//! [`error`](crate::error) that implement [`IntoError`].

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

mod error;
mod transparent;

pub use error::*;
pub use transparent::Transparent;

/// A location in the circuit source.
///
/// Wrapped in a [`Transparent`] so that it never influences comparisons:
/// two programs that differ only by their spans are equal.
pub type Span = Transparent<proc_macro2::Span>;

/// Generate an internal error message: something that should never happen
/// happened, and this is a bug of the compiler rather than of the circuit.
#[macro_export]
macro_rules! abort {
    ($($err:tt)*) => {{
        std::panic!("

~~~~~~~~ Internal error of the dda compiler ~~~~~~~~
{}
~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~
This error occured in {}:{}:{}

If you are seeing this error, this is a bug in dda.
Please report the circuit that triggered it along with the message above.
",
            format!($($err)*),
            file!(),
            line!(),
            column!(),
        )
    }};
}

/// Abort with a message if the condition does not hold.
#[macro_export]
macro_rules! consistency {
    ($cond:expr, $($msg:tt)*) => {
        if !$cond {
            $crate::abort!($($msg)*);
        }
    };
}

/// Abort for a construct that earlier passes should have made impossible.
#[macro_export]
macro_rules! malformed {
    () => {{
        $crate::abort!("Entered unreachable code");
    }};
}

/// Category of a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    /// The circuit text does not follow the grammar.
    Syntax,
    /// A computing element received the wrong number of arguments.
    Arity,
    /// A name refers to nothing: unknown variable, element, or writer field.
    Reference,
    /// A variable is defined more than once.
    Redefinition,
    /// A step or initial value does not reduce to a constant.
    Constant,
    /// The requested integration scheme does not exist.
    Scheme,
    /// A generation option is unknown, duplicated or malformed.
    Option,
    /// Auxiliaries depend on each other circularly.
    Cycle,
    /// A value is read before it is computed in the current evaluation.
    StaleRead,
    /// A floating-point exception was raised during simulation.
    RuntimeTrap,
}

impl Kind {
    /// Whether diagnostics of this kind are reported without aborting.
    #[must_use]
    pub fn is_warning(self) -> bool {
        matches!(self, Self::Cycle | Self::StaleRead)
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Syntax => "syntax error",
            Self::Arity => "arity error",
            Self::Reference => "reference error",
            Self::Redefinition => "redefinition error",
            Self::Constant => "constant error",
            Self::Scheme => "scheme error",
            Self::Option => "option error",
            Self::Cycle => "cycle warning",
            Self::StaleRead => "stale read warning",
            Self::RuntimeTrap => "runtime trap",
        };
        write!(f, "{s}")
    }
}

/// One complete diagnostic: its category and its message lines.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    /// Category.
    pub kind: Kind,
    /// Messages and their locations, the first one being the headline.
    pub lines: Error,
}

impl Diagnostic {
    /// Build from a prebuilt message.
    pub fn new(e: impl IntoError) -> Self {
        let kind = e.kind();
        Self {
            kind,
            lines: e.into_err(),
        }
    }

    /// First line of the message.
    #[must_use]
    pub fn headline(&self) -> &str {
        self.lines.first().map_or("", |(msg, _)| msg.as_str())
    }

    /// Location of the first line that has one.
    #[must_use]
    pub fn span(&self) -> Option<Span> {
        self.lines.iter().find_map(|(_, span)| *span)
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.lines.is_empty() {
            return write!(f, "{}", self.kind);
        }
        for (i, (msg, span)) in self.lines.iter().enumerate() {
            let loc = span.and_then(|s| s.location());
            if i > 0 {
                writeln!(f)?;
            }
            match (i, loc) {
                (0, Some((line, col))) => write!(f, "{line}:{col}: {}: {msg}", self.kind)?,
                (0, None) => write!(f, "{}: {msg}", self.kind)?,
                (_, Some((line, col))) => write!(f, "  {line}:{col}: note: {msg}")?,
                (_, None) => write!(f, "  note: {msg}")?,
            }
        }
        Ok(())
    }
}

/// Error accumulator.
///
/// Passes push errors and warnings here instead of returning early on
/// the first problem, so that one run reports as much as possible.
#[derive(Debug, Default)]
pub struct EAccum {
    /// Fatal diagnostics.
    errs: Vec<Diagnostic>,
    /// Non-fatal diagnostics.
    warns: Vec<Diagnostic>,
}

impl EAccum {
    /// Record a fatal error. Always returns `None` so that the caller
    /// can write `eaccum.error(...)?`.
    pub fn error<T>(&mut self, e: impl IntoError) -> Option<T> {
        let d = Diagnostic::new(e);
        tracing::debug!(kind = %d.kind, "{}", d.headline());
        self.errs.push(d);
        None
    }

    /// Record a non-fatal diagnostic.
    pub fn warning(&mut self, e: impl IntoError) {
        let d = Diagnostic::new(e);
        tracing::warn!(kind = %d.kind, "{}", d.headline());
        self.warns.push(d);
    }

    /// Whether at least one error was recorded.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        !self.errs.is_empty()
    }

    /// Number of errors recorded so far, to be passed to `check_since`.
    #[must_use]
    pub fn error_count(&self) -> usize {
        self.errs.len()
    }

    /// `None` if new errors were recorded since the count was taken.
    /// This lets a pass report several errors before aborting.
    #[must_use]
    pub fn check_since(&self, count: usize) -> Option<()> {
        (self.errs.len() == count).then_some(())
    }

    /// Errors recorded so far.
    #[must_use]
    pub fn errors(&self) -> &[Diagnostic] {
        &self.errs
    }

    /// Warnings recorded so far.
    #[must_use]
    pub fn warnings(&self) -> &[Diagnostic] {
        &self.warns
    }

    /// Extract the errors and warnings.
    #[must_use]
    pub fn fetch(self) -> (Vec<Diagnostic>, Vec<Diagnostic>) {
        (self.errs, self.warns)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn error_aborts_warning_does_not() {
        let mut eaccum = EAccum::default();
        eaccum.warning(Cycle {
            head: "a",
            items: ["b"],
            site: Option::<Span>::None,
        });
        assert!(!eaccum.is_fatal());
        let count = eaccum.error_count();
        assert_eq!(eaccum.check_since(count), Some(()));
        let res: Option<()> = eaccum.error(UndeclaredVariable {
            var: "x",
            site: Option::<Span>::None,
            user: "y",
            suggest: Suggest { available: ["a", "b"] },
        });
        assert_eq!(res, None);
        assert!(eaccum.is_fatal());
        assert_eq!(eaccum.check_since(count), None);
        let (errs, warns) = eaccum.fetch();
        assert_eq!(errs.len(), 1);
        assert_eq!(warns.len(), 1);
        assert_eq!(errs[0].kind, Kind::Reference);
        assert_eq!(warns[0].kind, Kind::Cycle);
    }

    #[test]
    fn display_without_locations() {
        let d = Diagnostic::new(UndeclaredVariable {
            var: "x",
            site: Option::<Span>::None,
            user: "y",
            suggest: Suggest { available: ["b", "a"] },
        });
        assert_eq!(
            d.to_string(),
            "reference error: Variable `x` is used in the definition of `y` but is never defined
  note: Defined variables are: a, b"
        );
    }

    #[test]
    fn forged_spans_have_no_location() {
        let span = Span::forge("test");
        assert_eq!(span.location(), None);
    }
}
