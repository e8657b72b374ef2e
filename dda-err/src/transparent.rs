//! A wrapper for data that is only relevant to diagnostics.

use std::fmt;
use std::hash::{Hash, Hasher};

/// A type that transparently implements `PartialEq` and `Hash`, to be used
/// in structs that carry additional data that should not be relevant in comparisons.
///
/// It additionally supports creating dummy values and they will also compare
/// equal to all other and hash identically.
///
/// The use of a `Transparent<_>` as a field of a struct should be understood
/// to convey the following intent: this field is useful only for diagnostics
/// and is never relevant for decisions.
/// This makes `Transparent::forge` suitable for programs built by hand
/// (in unit tests or through the programmatic API) where no source
/// location exists and we still want the computation to be unaffected.
#[derive(Clone, Copy)]
pub struct Transparent<T> {
    /// Payload.
    inner: Result<T, &'static str>,
}

impl<T> fmt::Debug for Transparent<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "_")
    }
}

impl<T> Transparent<T> {
    /// Wrap in a transparent.
    pub fn from(inner: T) -> Self {
        Self { inner: Ok(inner) }
    }

    /// Create a dummy value.
    ///
    /// `loc` should identify where the value was forged, it shows up in
    /// internal error messages if the value is ever unwrapped.
    #[must_use]
    pub fn forge(loc: &'static str) -> Self {
        Self { inner: Err(loc) }
    }

    /// Assert that the value was not forged and get its contents.
    /// # Panics
    /// fails if `self` was obtained by `Transparent::forge()`.
    pub fn unwrap(self) -> T {
        match self.inner {
            Ok(x) => x,
            Err(l) => crate::abort!(
                "Attempted to read a forged transparent value. Forged at {}",
                l
            ),
        }
    }
}

impl<T> PartialEq for Transparent<T> {
    /// Trivial equality. All `Transparent` are indistinguishable
    /// from each other.
    fn eq(&self, _: &Self) -> bool {
        true
    }
}

impl<T> Eq for Transparent<T> {}

impl<T> Hash for Transparent<T> {
    // Trivial hash. All `Transparent` are transparent to hashing.
    fn hash<H: Hasher>(&self, _: &mut H) {}
}

impl Transparent<proc_macro2::Span> {
    /// Map `join` to the inner `span`s.
    ///
    /// Joining is best effort: outside of a nightly compiler the
    /// procedural macro spans cannot be joined, and we keep `self`.
    #[must_use]
    pub fn join(self, other: Self) -> Self {
        let (Ok(v1), Ok(v2)) = (self.inner, other.inner) else {
            return self;
        };
        Self {
            inner: Ok(v1.join(v2).unwrap_or(v1)),
        }
    }

    /// The real span, or the macro call site for forged values.
    #[must_use]
    pub fn or_call_site(self) -> proc_macro2::Span {
        self.inner.unwrap_or_else(|_| proc_macro2::Span::call_site())
    }

    /// Line (starting at 1) and column (starting at 1) of the beginning
    /// of the span, when known.
    #[must_use]
    pub fn location(&self) -> Option<(usize, usize)> {
        let start = self.inner.as_ref().ok()?.start();
        (start.line > 0).then_some((start.line, start.column + 1))
    }
}
