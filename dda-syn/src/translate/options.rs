//! Generation options given as attributes of a circuit.
//!
//! ```skip
//! #[rk_order(4)]
//! #[max_iterations(1000)]
//! #[modulo_write(10)]
//! #[writer(x, y)]
//! #[trap_fp(false)]
//! #[main]
//! x = ...
//! ```
//! Each attribute may be given at most once. Attributes that are absent
//! leave the corresponding option to the value chosen by the caller.

use dda_err::{self as err, EAccum};
use dda_san::options::{Options, WriterFields};
use dda_san::sp::{Sp, Span};
use dda_sem::RkOrder;
use syn::punctuated::Punctuated;
use syn::spanned::Spanned;
use syn::{Attribute, Meta, Token};

use crate::ast::AttrArg;
use crate::translate::SpanTranslate;

/// The main helper to set options.
///
/// `SetOpt` distinguishes between an option that was never set, which
/// leaves the caller's default unchanged, and one that was set, in which
/// case setting it a second time is an error.
#[must_use]
#[derive(Debug, Clone)]
struct SetOpt<T> {
    /// Value and location of the attribute that set it.
    value: Option<Sp<T>>,
    /// Name of the attribute.
    name: &'static str,
}

impl<T> SetOpt<T> {
    /// An unset option.
    fn create(name: &'static str) -> Self {
        Self { value: None, name }
    }

    /// Assign a value, unless one was already assigned.
    fn set(&mut self, t: T, span: Span, eaccum: &mut EAccum) {
        if let Some(prior) = &self.value {
            eaccum.error::<()>(err::OptionTwice {
                name: self.name,
                new_site: span,
                prior_site: prior.span,
            });
            return;
        }
        self.value = Some(Sp::new(t, span));
    }

    /// Overwrite `target` if the option was set.
    fn apply(self, target: &mut T) {
        if let Some(v) = self.value {
            *target = v.t;
        }
    }
}

/// Options collected from the attributes.
#[derive(Debug, Clone)]
pub struct Attrs {
    /// `#[rk_order(n)]`
    rk_order: SetOpt<u32>,
    /// `#[max_iterations(n)]`
    max_iterations: SetOpt<usize>,
    /// `#[modulo_write(n)]`
    modulo_write: SetOpt<usize>,
    /// `#[writer(x, ...)]`
    writer: SetOpt<WriterFields>,
    /// `#[trap_fp]`, `#[trap_fp(false)]`
    trap_fp: SetOpt<bool>,
    /// `#[main]`
    main: SetOpt<bool>,
}

impl Default for Attrs {
    fn default() -> Self {
        Self {
            rk_order: SetOpt::create("rk_order"),
            max_iterations: SetOpt::create("max_iterations"),
            modulo_write: SetOpt::create("modulo_write"),
            writer: SetOpt::create("writer"),
            trap_fp: SetOpt::create("trap_fp"),
            main: SetOpt::create("main"),
        }
    }
}

/// Name of an attribute, as written.
fn attr_name(attr: &Attribute) -> String {
    let path = attr.path();
    path.get_ident().map_or_else(
        || {
            path.segments
                .iter()
                .map(|s| s.ident.to_string())
                .collect::<Vec<_>>()
                .join("::")
        },
        ToString::to_string,
    )
}

impl Attrs {
    /// Read all attributes, reporting every invalid one.
    pub fn collect(attrs: &[Attribute], eaccum: &mut EAccum) -> Option<Self> {
        let count = eaccum.error_count();
        let mut this = Self::default();
        for attr in attrs {
            this.with(attr, eaccum);
        }
        eaccum.check_since(count)?;
        Some(this)
    }

    /// Update the current options with a new attribute.
    fn with(&mut self, attr: &Attribute, eaccum: &mut EAccum) {
        let site = Span::from(attr.span());
        let name = attr_name(attr);
        let args: Vec<AttrArg> = match &attr.meta {
            Meta::Path(_) => Vec::new(),
            Meta::List(list) => {
                match list.parse_args_with(Punctuated::<AttrArg, Token![,]>::parse_terminated) {
                    Ok(args) => args.into_iter().collect(),
                    Err(e) => {
                        crate::syntax_error::<()>(&e, eaccum);
                        return;
                    }
                }
            }
            Meta::NameValue(_) => {
                eaccum.error::<()>(err::UnknownOption { name: &name, site });
                return;
            }
        };
        match (name.as_str(), args.as_slice()) {
            ("rk_order", [AttrArg::Num(n)]) => {
                let order = n.t.count().and_then(|c| u32::try_from(c).ok());
                match order {
                    Some(o) if RkOrder::new(o).is_some() => self.rk_order.set(o, site, eaccum),
                    _ => {
                        eaccum.error::<()>(err::UnsupportedScheme {
                            order: n,
                            site: n.span,
                        });
                    }
                }
            }
            ("max_iterations", [AttrArg::Num(n)]) => match n.t.count() {
                Some(c) => self.max_iterations.set(c, site, eaccum),
                None => {
                    eaccum.error::<()>(err::OptionValue {
                        name: &name,
                        site: n.span,
                        expect: "a nonnegative integer",
                    });
                }
            },
            ("modulo_write", [AttrArg::Num(n)]) => match n.t.count() {
                Some(c) if c > 0 => self.modulo_write.set(c, site, eaccum),
                _ => {
                    eaccum.error::<()>(err::OptionValue {
                        name: &name,
                        site: n.span,
                        expect: "a positive number of iterations",
                    });
                }
            },
            ("writer", fields) if !fields.is_empty() => {
                let mut names = Vec::new();
                for f in fields {
                    if let AttrArg::Name(n) = f {
                        if let Some(n) = n.clone().translate(eaccum) {
                            names.push(n);
                        }
                    } else {
                        eaccum.error::<()>(err::OptionValue {
                            name: &name,
                            site,
                            expect: "a list of variable names",
                        });
                        return;
                    }
                }
                self.writer.set(WriterFields::Only(names), site, eaccum);
            }
            ("trap_fp", []) => self.trap_fp.set(true, site, eaccum),
            ("trap_fp", [AttrArg::Bool(b)]) => self.trap_fp.set(b.value, site, eaccum),
            ("main", []) => self.main.set(true, site, eaccum),
            _ => {
                eaccum.error::<()>(err::UnknownOption { name: &name, site });
            }
        }
    }

    /// Override the options that were set by an attribute.
    #[must_use]
    pub fn apply(self, mut options: Options) -> Options {
        let Self {
            rk_order,
            max_iterations,
            modulo_write,
            writer,
            trap_fp,
            main,
        } = self;
        rk_order.apply(&mut options.rk_order);
        max_iterations.apply(&mut options.max_iterations);
        modulo_write.apply(&mut options.modulo_write);
        writer.apply(&mut options.writer_fields);
        trap_fp.apply(&mut options.trap_fp);
        main.apply(&mut options.emit_main);
        options
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use dda_err::Kind;

    fn options(text: &str, base: Options) -> (Option<Options>, EAccum) {
        let mut eaccum = EAccum::default();
        let Ok(circuit) = syn::parse_str::<crate::Circuit>(text) else {
            panic!("failed to parse {text:?}")
        };
        let opts = Attrs::collect(&circuit.attrs, &mut eaccum).map(|a| a.apply(base));
        (opts, eaccum)
    }

    #[test]
    fn unset_options_are_kept() {
        let base = Options::default().with_max_iterations(7).with_main(false);
        let (opts, _) = options("x = 1", base.clone());
        assert_eq!(opts, Some(base));
    }

    #[test]
    fn all_attributes() {
        let (opts, eaccum) = options(
            "
            #[rk_order(4)]
            #[max_iterations(100)]
            #[modulo_write(10)]
            #[writer(y, x)]
            #[trap_fp(false)]
            #[main]
            x = 1
            y = x
            ",
            Options::default().with_main(false),
        );
        assert!(!eaccum.is_fatal());
        let expected = Options::default()
            .with_rk_order(4)
            .with_max_iterations(100)
            .with_modulo_write(10)
            .with_writer_fields(["y", "x"])
            .with_trap_fp(false)
            .with_main(true);
        assert_eq!(opts, Some(expected));
    }

    #[test]
    fn every_error_is_reported() {
        let (opts, eaccum) = options(
            "
            #[rk_order(5)]
            #[modulo_write(0)]
            #[main]
            #[main]
            #[inline]
            #[writer(1)]
            x = 1
            ",
            Options::default(),
        );
        assert!(opts.is_none());
        let kinds: Vec<Kind> = eaccum.errors().iter().map(|e| e.kind).collect();
        assert_eq!(
            kinds,
            [Kind::Scheme, Kind::Option, Kind::Option, Kind::Option, Kind::Option]
        );
        assert_eq!(
            eaccum.errors()[2].headline(),
            "Attribute `main` is given more than once"
        );
        assert_eq!(
            eaccum.errors()[3].headline(),
            "Unknown or malformed attribute `inline`"
        );
    }
}
