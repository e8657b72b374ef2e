//! A mostly transparent wrapper around any type to indicate that it carries
//! a `Span` with it.
//!
//! Spans only serve diagnostics: `Sp<T>` compares and hashes like `T`,
//! and values built by hand rather than parsed carry a forged span
//! (see `Sp::forged`).

use std::fmt;

use dda_err::{self as err, Transparent};
pub use err::Span;

/// Span wrapper.
///
/// `Sp` is mostly used through `map`, `new`, and it also implements
/// many traits by projecting into its `.t` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Sp<T> {
    /// A payload.
    pub t: T,
    /// The span associated with the payload.
    pub span: Span,
}

impl<T> err::TrySpan for Sp<T> {
    /// `Sp` always has a span, so `TrySpan` is guaranteed to succeed.
    fn try_span(&self) -> Option<Span> {
        Some(self.span)
    }
}

impl<T> Sp<T> {
    /// Attach a span.
    pub fn new(t: T, span: Span) -> Self {
        Self { t, span }
    }

    /// Wrap a value that does not come from source text.
    pub fn forged(t: T) -> Self {
        Self {
            t,
            span: Transparent::forge("built without source"),
        }
    }

    /// Apply a transformation to the payload while preserving the same span.
    ///
    /// This lets us track the same portion of the source code from beginning
    /// to end through translations into different ASTs.
    pub fn map<U, F>(self, f: F) -> Sp<U>
    where
        F: FnOnce(Span, T) -> U,
    {
        Sp {
            t: f(self.span, self.t),
            span: self.span,
        }
    }
}

impl<T: Clone> Sp<&T> {
    /// Clone the inner
    #[must_use]
    pub fn cloned(self) -> Sp<T> {
        self.map(|_, t| t.clone())
    }
}

/// `SpanEnd` is the way that `Sp` has of computing its own span:
/// upon parsing it will record the beginning of the span to use as its
/// own, but ideally it also wants to eventually know the end of the Span,
/// and for that it asks `T`.
///
/// `SpanEnd` should be implemented for all types `T` for which you want to
/// be able to parse a `Sp<T>`
pub trait SpanEnd {
    /// Where this object ends.
    ///
    /// Types may return `None` if they do not know their extent,
    /// in which case the span covers only the first token.
    fn span_end(&self) -> Option<Span>;
}

/// `Punctuated` projects to its last element, and is the reason
/// that `span_end` may return `None` at all.
impl<T: SpanEnd, P> SpanEnd for syn::punctuated::Punctuated<T, P> {
    fn span_end(&self) -> Option<Span> {
        self.last().and_then(SpanEnd::span_end)
    }
}

/// Parsing `Sp<T>` invoques `SpanEnd` to know where the parsing ended.
impl<T> syn::parse::Parse for Sp<T>
where
    T: syn::parse::Parse + SpanEnd,
{
    fn parse(input: syn::parse::ParseStream) -> syn::Result<Self> {
        let begin = Span::from(input.span());
        let t: T = input.parse()?;
        let end = t.span_end().unwrap_or(begin);
        Ok(Self {
            t,
            span: begin.join(end),
        })
    }
}

impl<T> SpanEnd for Sp<T> {
    fn span_end(&self) -> Option<Span> {
        Some(self.span)
    }
}

/// `Sp` is transparently displayable.
impl<T: fmt::Display> fmt::Display for Sp<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.t)
    }
}

/// Implement `SpanEnd` from `syn::Spanned`.
/// Only recommended for items whose `span` is trivial, others should
/// be wrapped in a `Sp<_>` to alleviate the computation.
macro_rules! span_end_from_spanned {
    ( $($ty:tt)* ) => {
        impl SpanEnd for $($ty)* {
            fn span_end(&self) -> Option<Span> {
                Some(Transparent::from(self.span()))
            }
        }
    }
}

span_end_from_spanned!(syn::Ident);
impl SpanEnd for syn::token::Paren {
    fn span_end(&self) -> Option<Span> {
        Some(Span::from(self.span.join()))
    }
}
