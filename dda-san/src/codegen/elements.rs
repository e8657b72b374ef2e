//! Rust definitions of the computing elements.
//!
//! These must compute exactly what `Element::eval` computes.

use proc_macro2::{Ident, Span, TokenStream};
use quote::quote;

use dda_sem::Element;

/// Operator that folds the arguments of a variadic element.
pub fn infix(e: Element) -> Option<TokenStream> {
    match e {
        Element::Add | Element::Sum => Some(quote!(+)),
        Element::Mult => Some(quote!(*)),
        _ => None,
    }
}

/// Name of the generated function.
pub fn ident(e: Element) -> Ident {
    Ident::new(e.name(), Span::call_site())
}

/// `pub fn name(args) -> f64 { body }`, for elements that are not
/// inlined.
pub fn definition(e: Element) -> Option<TokenStream> {
    use Element as E;
    let (args, body) = match e {
        E::Const | E::Int | E::Add | E::Sum | E::Mult => return None,
        E::Neg => (quote!(x: f64), quote!(-x)),
        E::Div => (quote!(a: f64, b: f64), quote!(a / b)),
        E::Sqrt => (quote!(x: f64), quote!(x.sqrt())),
        E::Abs => (quote!(x: f64), quote!(x.abs())),
        E::Exp => (quote!(x: f64), quote!(x.exp())),
        E::Sin => (quote!(x: f64), quote!(x.sin())),
        E::Cos => (quote!(x: f64), quote!(x.cos())),
        E::Floor => (quote!(x: f64), quote!(x.floor())),
        E::Min => (quote!(a: f64, b: f64), quote!(a.min(b))),
        E::Max => (quote!(a: f64, b: f64), quote!(a.max(b))),
        E::Lt | E::Le | E::Gt | E::Ge => {
            let cmp = match e {
                E::Lt => quote!(<),
                E::Le => quote!(<=),
                E::Gt => quote!(>),
                _ => quote!(>=),
            };
            (
                quote!(a: f64, b: f64, c: f64, d: f64),
                quote!(if a #cmp b { c } else { d }),
            )
        }
        E::DeadUpper => (
            quote!(a: f64, b: f64),
            quote!(if a > b { a - b } else { 0.0 }),
        ),
        E::DeadLower => (
            quote!(a: f64, b: f64),
            quote!(if a < -b { a + b } else { 0.0 }),
        ),
    };
    let name = ident(e);
    let doc = format!(" `{e}` ({} argument(s))", e.arity());
    Some(quote! {
        #[doc = #doc]
        #[inline]
        #[must_use]
        pub fn #name(#args) -> f64 {
            #body
        }
    })
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn every_fixed_arity_element_has_a_definition() {
        for e in Element::ALL {
            assert_eq!(
                definition(*e).is_some(),
                !e.is_variadic() && *e != Element::Const,
                "{e}"
            );
        }
        assert!(infix(Element::Sum).is_some());
        assert!(infix(Element::Div).is_none());
    }

    #[test]
    fn comparison() {
        let def = definition(Element::Ge).map(|t| t.to_string());
        assert!(def.is_some_and(|d| d.contains("if a >= b { c } else { d }")));
    }
}
