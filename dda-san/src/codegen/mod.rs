//! Generate a standalone Rust simulation from a `Plan`.
//!
//! The output is a sequence of items meant to be placed at module level:
//!
//! ```skip
//! pub mod elements { /* the computing elements used */ }
//! pub struct State { pub x: f64, pub y: f64 }
//! pub struct Aux { pub a: f64 }
//! // + - * / on State
//! pub fn f(state: &State, aux: &mut Aux) -> State { /* the four phases */ }
//! pub const INITIAL: State = ...;
//! pub const DT: State = ...;
//! pub fn simulate(initial: State, max_iterations: usize,
//!                 modulo_write: usize, rk_order: u32) -> State { ... }
//! pub fn main() { ... } // if requested
//! ```
//!
//! Every formula is printed so that it performs exactly the same
//! floating-point operations in the same order as the interpreter.

use proc_macro2::{Ident, Literal, TokenStream};
use quote::{format_ident, quote, ToTokens};

use dda_sem::schemes::{is_one, Increment};
use dda_sem::{RkOrder, Trap};

use crate::plan::{Phase, Plan, Slot, Value};
use crate::sp::Sp;

mod elements;
pub mod options;

use options::{FnMain, FpTraps};

/// Print a float such that it is parsed back to the same value.
#[must_use]
pub fn float(x: f64) -> TokenStream {
    if x.is_nan() {
        quote!(f64::NAN)
    } else if x.is_infinite() {
        if x > 0.0 {
            quote!(f64::INFINITY)
        } else {
            quote!(f64::NEG_INFINITY)
        }
    } else if x.is_sign_negative() {
        let lit = Literal::f64_unsuffixed(-x);
        quote!((-#lit))
    } else {
        Literal::f64_unsuffixed(x).into_token_stream()
    }
}

/// Field of the generated records for this variable.
///
/// Names that are Rust keywords become raw identifiers.
fn field(name: &Sp<String>) -> Ident {
    let span = name.span.or_call_site();
    let mut id = syn::parse_str::<Ident>(&name.t).unwrap_or_else(|_| Ident::new_raw(&name.t, span));
    id.set_span(span);
    id
}

/// `state.x` or `aux.a`.
fn read(plan: &Plan, slot: Slot) -> TokenStream {
    let f = field(plan.name(slot));
    match slot {
        Slot::State(_) => quote!(state.#f),
        Slot::Aux(_) => quote!(aux.#f),
    }
}

/// An expression, with variadic elements folded inline from left to
/// right and the others calls to `elements::*`.
fn value(plan: &Plan, v: &Value) -> TokenStream {
    match v {
        Value::Lit(x) => float(*x),
        Value::Read(slot) => read(plan, *slot),
        Value::Call(elem, args) => {
            let mut args = args.iter().map(|a| value(plan, a));
            if let Some(op) = elements::infix(*elem) {
                let first = args.next();
                quote!( ( #first #( #op #args )* ) )
            } else {
                let name = elements::ident(*elem);
                quote!( elements::#name( #( #args ),* ) )
            }
        }
    }
}

/// Argument of `f` or final update of one increment, over `state`,
/// `DT` and the slopes `k1, k2, ...`.
fn increment(inc: &Increment) -> TokenStream {
    let slope = |k: usize| format_ident!("k{}", k + 1);
    match inc {
        Increment::Weighted { terms, divisor } => {
            let terms = terms
                .iter()
                .map(|t| {
                    let k = slope(t.k);
                    if is_one(t.weight) {
                        quote!(#k)
                    } else {
                        let w = float(t.weight);
                        quote!(#k * #w)
                    }
                })
                .collect::<Vec<_>>();
            let sum = match terms.as_slice() {
                [] => return quote!(state),
                [single] => single.clone(),
                _ => quote!( ( #( #terms )+* ) ),
            };
            if is_one(*divisor) {
                quote!(state + DT * #sum)
            } else {
                let d = float(*divisor);
                quote!(state + DT * #sum / #d)
            }
        }
        Increment::Chained { terms } => {
            let mut toks = quote!(state);
            for t in *terms {
                let k = slope(t.k);
                if t.is_negated() {
                    toks.extend(quote!(- DT * #k));
                } else if is_one(t.weight) {
                    toks.extend(quote!(+ DT * #k));
                } else {
                    let w = float(t.weight);
                    toks.extend(quote!(+ DT * #k * #w));
                }
            }
            toks
        }
    }
}

/// `n => { let k1 = ...; ...; new_state }` for the scheme of order `n`.
fn scheme_arm(order: RkOrder) -> TokenStream {
    let scheme = order.scheme();
    let n = Literal::u32_unsuffixed(order.get());
    let stages = scheme.stages.iter().enumerate().map(|(i, stage)| {
        let k = format_ident!("k{}", i + 2);
        let arg = increment(stage);
        quote!( let #k = f(&(#arg), &mut aux); )
    });
    let update = increment(&scheme.update);
    quote! {
        #n => {
            let k1 = f(&state, &mut aux);
            #( #stages )*
            #update
        }
    }
}

impl ToTokens for Plan {
    #[expect(clippy::too_many_lines, reason = "one block per generated item")]
    fn to_tokens(&self, toks: &mut TokenStream) {
        let state_fields = self.state.iter().map(field).collect::<Vec<_>>();
        let aux_fields = self.aux.iter().map(field).collect::<Vec<_>>();
        let state_docs = self.state.iter().map(|v| format!(" State variable `{v}`."));
        let aux_docs = self.aux.iter().map(|v| format!(" Auxiliary variable `{v}`."));

        // Computing elements.
        let elements = self.elements().into_iter().filter_map(elements::definition);
        toks.extend(quote! {
            /// Computing elements of the circuit.
            #[allow(dead_code)]
            pub mod elements {
                #( #elements )*
            }
        });

        // Records.
        toks.extend(quote! {
            /// Integrated variables, also the layout of their derivatives.
            #[derive(Debug, Clone, Copy, Default, PartialEq)]
            #[allow(non_snake_case, dead_code)]
            pub struct State {
                #( #[doc = #state_docs] pub #state_fields: f64, )*
            }

            /// Variables recomputed at each evaluation of the derivatives.
            #[derive(Debug, Clone, Copy, Default, PartialEq)]
            #[allow(non_snake_case, dead_code)]
            pub struct Aux {
                #( #[doc = #aux_docs] pub #aux_fields: f64, )*
            }
        });

        // Element-wise arithmetic on the state.
        // (trait, method, operator, whether the right operand is a State)
        let ops = [
            (quote!(Add), quote!(add), quote!(+), true),
            (quote!(Sub), quote!(sub), quote!(-), true),
            (quote!(Mul), quote!(mul), quote!(*), true),
            (quote!(Mul), quote!(mul), quote!(*), false),
            (quote!(Div), quote!(div), quote!(/), false),
        ];
        for (tr, method, op, elementwise) in ops {
            let rhs_ty = if elementwise { quote!(State) } else { quote!(f64) };
            let rhs_fields = state_fields.iter().map(|f| {
                if elementwise {
                    quote!(rhs.#f)
                } else {
                    quote!(rhs)
                }
            });
            toks.extend(quote! {
                impl ::std::ops::#tr<#rhs_ty> for State {
                    type Output = State;
                    #[allow(unused_variables)]
                    fn #method(self, rhs: #rhs_ty) -> State {
                        State {
                            #( #state_fields: self.#state_fields #op #rhs_fields, )*
                        }
                    }
                }
            });
        }

        // The derivative function, in four phases.
        let poison = if self.options.trap_fp && !self.aux.is_empty() {
            let bits = Literal::u64_suffixed(Trap::POISON_BITS);
            quote! {
                // Signalling NaN: reading an auxiliary before it is
                // computed traps.
                let nan = f64::from_bits(#bits);
                *aux = Aux { #( #aux_fields: nan, )* };
            }
        } else {
            quote!()
        };
        let assign = |phase: Phase| {
            self.phase(phase)
                .map(|eq| {
                    let target = read(self, eq.target);
                    let v = value(self, &eq.value);
                    quote!( #target = #v; )
                })
                .collect::<Vec<_>>()
        };
        let sorted = assign(Phase::Sorted);
        let cyclic = assign(Phase::Cyclic);
        let isolated = assign(Phase::Isolated);
        let derivatives = self.phase(Phase::Derivative).map(|eq| {
            let target = field(self.name(eq.target));
            let v = value(self, &eq.value);
            quote!( #target: #v, )
        });
        toks.extend(quote! {
            /// Derivatives of the state variables.
            ///
            /// Also leaves the value of every auxiliary in `aux`.
            #[allow(unused_variables, clippy::all)]
            pub fn f(state: &State, aux: &mut Aux) -> State {
                #poison
                // 1. Auxiliaries in dependency order.
                #( #sorted )*
                // 2. Auxiliaries part of a cycle.
                #( #cyclic )*
                // 3. Derivatives.
                let dqdt = State { #( #derivatives )* };
                // 4. Isolated auxiliaries.
                #( #isolated )*
                dqdt
            }
        });

        // Constants.
        let initial = self.initial.iter().map(|x| float(*x));
        let step = self.step.iter().map(|x| float(*x));
        let header = self.header();
        let max_iterations = Literal::usize_unsuffixed(self.options.max_iterations);
        let modulo_write = Literal::usize_unsuffixed(self.options.modulo_write);
        let rk_order = Literal::u32_unsuffixed(self.order.get());
        toks.extend(quote! {
            /// Initial state.
            pub const INITIAL: State = State { #( #state_fields: #initial, )* };
            /// Integration step of each state variable.
            pub const DT: State = State { #( #state_fields: #step, )* };
            /// Names of the reported variables.
            pub const HEADER: &str = #header;
            /// Number of integration steps.
            pub const MAX_ITERATIONS: usize = #max_iterations;
            /// Report every `MODULO_WRITE` steps.
            pub const MODULO_WRITE: usize = #modulo_write;
            /// Order of the integration scheme.
            pub const RK_ORDER: u32 = #rk_order;
        });

        // Simulation loop.
        let arms = RkOrder::all().map(scheme_arm);
        let row_fmt = vec!["{:.6}"; self.writer.len()].join(" ");
        let row = self.writer.iter().map(|s| read(self, *s));
        toks.extend(quote! {
            /// Integrate from `initial` for `max_iterations` steps with the
            /// Runge-Kutta scheme of order `rk_order` (1 to 4), and print
            /// the reported variables after every `modulo_write` steps.
            ///
            /// Exits the process with status 42 if the order is not supported.
            #[allow(unused_variables, unused_mut, clippy::all)]
            pub fn simulate(
                initial: State,
                max_iterations: usize,
                modulo_write: usize,
                rk_order: u32,
            ) -> State {
                let mut state = initial;
                let mut aux = Aux::default();
                for iter in 0..max_iterations {
                    state = match rk_order {
                        #( #arms )*
                        _ => ::std::process::exit(42),
                    };
                    if iter % modulo_write == 0 {
                        println!(#row_fmt, #( #row ),*);
                    }
                }
                state
            }
        });

        toks.extend(self.options.fp_traps());
        toks.extend(self.options.fn_main(FpTraps::fetch(&self.options)));
    }
}
