//! Parsing AST of a circuit.
//!
//! Every node that will need a location in diagnostics is wrapped in a
//! `Sp`, which computes its extent from `SpanEnd`.

use std::fmt;

use dda_san::sp::{Sp, Span, SpanEnd};
use syn::ext::IdentExt;
use syn::parse::{Parse, ParseStream, Result};
use syn::punctuated::Punctuated;
use syn::token::Paren;
use syn::{Attribute, Ident, Lit, LitBool, Token};

macro_rules! span_end_on_field {
    ($ty:ident . $field:ident) => {
        impl SpanEnd for $ty {
            fn span_end(&self) -> Option<Span> {
                self.$field.span_end()
            }
        }
    };
}

macro_rules! span_end_by_match {
    ( $ty:ident . $( $variant:ident ( $field:ident ) => $select:ident ; )* ) => {
        impl SpanEnd for $ty {
            fn span_end(&self) -> Option<Span> {
                match self {
                    $( Self::$variant ( $field ) => $select.span_end(), )*
                }
            }
        }
    }
}

/// A variable or element name.
///
/// Any identifier is accepted, including Rust keywords such as `const`
/// (which is also the name of an element), with the exception of those
/// that cannot be used even as raw identifiers.
#[derive(Clone)]
pub struct Name {
    /// Identifier, raw or not.
    pub inner: Ident,
}

impl Parse for Name {
    fn parse(input: ParseStream) -> Result<Self> {
        let inner = input.fork().call(Ident::parse_any)?;
        match inner.to_string().as_str() {
            "self" | "Self" | "super" | "crate" => Err(syn::Error::new(
                inner.span(),
                "expected identifier, found keyword reserved by Rust",
            )),
            _ => {
                input.call(Ident::parse_any)?;
                Ok(Self { inner })
            }
        }
    }
}

impl Name {
    /// Whether the next tokens form a name.
    fn peek(input: ParseStream) -> bool {
        Self::parse(&input.fork()).is_ok()
    }
}

/// Prints without the `r#` of raw identifiers.
impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.inner.unraw())
    }
}

span_end_on_field!(Name.inner);

/// Numeric literal, possibly negative.
///
/// Literals follow the Rust lexer (`1`, `0.5`, `1e-3`, `2.`) but may not
/// carry a type suffix.
#[derive(Clone)]
pub struct Number {
    /// Leading `-`.
    pub minus: Option<Token![-]>,
    /// Absolute value.
    pub lit: Lit,
}

impl Parse for Number {
    fn parse(input: ParseStream) -> Result<Self> {
        let minus: Option<Token![-]> = input.parse()?;
        let lit: Lit = input.parse()?;
        let suffix = match &lit {
            Lit::Int(i) => i.suffix(),
            Lit::Float(f) => f.suffix(),
            _ => return Err(syn::Error::new(lit.span(), "expected a number")),
        };
        if !suffix.is_empty() {
            return Err(syn::Error::new(
                lit.span(),
                format!("numeric literals cannot have a suffix (found `{suffix}`)"),
            ));
        }
        Ok(Self { minus, lit })
    }
}

impl Number {
    /// Whether the next token starts a number.
    fn hint(input: ParseStream) -> bool {
        input.peek(Token![-]) || (input.peek(Lit) && !input.peek(LitBool))
    }

    /// Value as a float.
    ///
    /// # Errors
    /// For an integer literal too large for `f64` (which does not happen
    /// in practice, overflowing floats parse as infinity).
    pub fn value(&self) -> Result<f64> {
        let abs: f64 = match &self.lit {
            Lit::Int(i) => i.base10_digits().parse().map_err(|e| syn::Error::new(i.span(), e))?,
            Lit::Float(f) => f.base10_parse()?,
            other => return Err(syn::Error::new(other.span(), "expected a number")),
        };
        Ok(if self.minus.is_some() { -abs } else { abs })
    }

    /// Value as a count, if it is a nonnegative integer literal.
    #[must_use]
    pub fn count(&self) -> Option<usize> {
        match (&self.minus, &self.lit) {
            (None, Lit::Int(i)) => i.base10_parse().ok(),
            _ => None,
        }
    }
}

/// As written, without the sign if positive.
impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let digits = match &self.lit {
            Lit::Int(i) => i.base10_digits(),
            Lit::Float(x) => x.base10_digits(),
            _ => "?",
        };
        let sign = if self.minus.is_some() { "-" } else { "" };
        write!(f, "{sign}{digits}")
    }
}

impl SpanEnd for Number {
    fn span_end(&self) -> Option<Span> {
        Some(Span::from(self.lit.span()))
    }
}

/// `head(arg, ...)`
#[derive(Clone, syn_derive::Parse)]
pub struct Call {
    /// Name of the computing element.
    pub head: Sp<Name>,
    /// Delimiter of the arguments.
    #[syn(parenthesized)]
    pub paren: Paren,
    /// Arguments, a trailing comma is allowed.
    #[syn(in = paren)]
    #[parse(Punctuated::parse_terminated)]
    pub args: Punctuated<Sp<Arg>, Token![,]>,
}
span_end_on_field!(Call.paren);

impl Call {
    /// A name directly followed by parentheses.
    fn hint(input: ParseStream) -> bool {
        let ahead = input.fork();
        ahead.parse::<Name>().is_ok() && ahead.peek(Paren)
    }
}

/// Argument of an application, or right-hand side of a definition.
#[derive(Clone, syn_derive::Parse)]
pub enum Arg {
    /// `head(arg, ...)`
    #[parse(peek_func = Call::hint)]
    Call(Sp<Call>),
    /// `-1.5`
    #[parse(peek_func = Number::hint)]
    Lit(Sp<Number>),
    /// `x`
    Var(Sp<Name>),
}
span_end_by_match! {
    Arg.
        Call(c) => c;
        Lit(l) => l;
        Var(v) => v;
}

/// `name = arg`, optionally followed by `;`.
#[derive(Clone, syn_derive::Parse)]
pub struct Def {
    /// Defined variable.
    pub name: Sp<Name>,
    /// `=`
    _eq: Token![=],
    /// Definition.
    pub value: Sp<Arg>,
    /// `;`
    _semi: Option<Token![;]>,
}
span_end_on_field!(Def.value);

/// A complete circuit: attributes then definitions.
#[derive(Clone)]
pub struct Circuit {
    /// Generation options.
    pub attrs: Vec<Attribute>,
    /// All definitions, in the order they were written.
    pub defs: Vec<Sp<Def>>,
}

impl Parse for Circuit {
    fn parse(input: ParseStream) -> Result<Self> {
        let attrs = input.call(Attribute::parse_outer)?;
        let mut defs = Vec::new();
        while !input.is_empty() {
            if !Name::peek(input) {
                return Err(input.error("expected a definition `name = ...`"));
            }
            defs.push(input.parse()?);
        }
        Ok(Self { attrs, defs })
    }
}

/// Argument of an option attribute: `#[writer(x, y)]`, `#[trap_fp(false)]`.
#[derive(Clone, syn_derive::Parse)]
pub enum AttrArg {
    /// `true` or `false`
    #[parse(peek = LitBool)]
    Bool(LitBool),
    /// A number.
    #[parse(peek_func = Number::hint)]
    Num(Sp<Number>),
    /// A variable name.
    Name(Sp<Name>),
}
