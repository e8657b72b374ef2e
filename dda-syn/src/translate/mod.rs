//! Translator from the parsing AST to the Program Model.
//!
//! The two are very close: the parsing AST distinguishes calls, literals
//! and variables exactly like `dda_san::ast::Expr` does. What the
//! translation adds is the check that no variable is defined twice,
//! which the parser cannot see because definitions may appear in any
//! order. Every duplicate is reported before the translation fails.
//!
//! Attributes are translated separately (see [`options`]) because they
//! do not describe the circuit but the generated program.

use dda_err::{self as err, EAccum};
use dda_san::ast::{Expr, Program};
use dda_san::sp::{Sp, Span};

use crate::ast as src;

pub mod options;

/// Translate from the parsing AST to the Program Model.
pub trait Translate {
    /// Corresponding item in the Program Model.
    type Output;

    /// Perform the translation, recording every error. `span` is the
    /// location of `self`.
    fn translate(self, span: Span, eaccum: &mut EAccum) -> Option<Self::Output>;
}

/// Helper trait to translate a spanned item.
/// Only `Sp<T>` is expected to implement this trait.
#[expect(
    clippy::module_name_repetitions,
    reason = "False positive: we want the name to match the `Translate` trait."
)]
pub trait SpanTranslate {
    /// Corresponding item in the Program Model, without span.
    type Output;

    /// Translate and keep the span.
    fn translate(self, eaccum: &mut EAccum) -> Option<Sp<Self::Output>>;
}

impl<T: Translate> SpanTranslate for Sp<T> {
    type Output = T::Output;

    fn translate(self, eaccum: &mut EAccum) -> Option<Sp<T::Output>> {
        let Sp { t, span } = self;
        let t = t.translate(span, eaccum)?;
        Some(Sp::new(t, span))
    }
}

impl Translate for src::Name {
    type Output = String;

    fn translate(self, _span: Span, _eaccum: &mut EAccum) -> Option<String> {
        Some(self.to_string())
    }
}

impl Translate for src::Arg {
    type Output = Expr;

    fn translate(self, _span: Span, eaccum: &mut EAccum) -> Option<Expr> {
        Some(match self {
            Self::Var(v) => Expr::Var(v.t.to_string()),
            Self::Lit(l) => l.t.translate(l.span, eaccum)?,
            Self::Call(c) => c.t.translate(c.span, eaccum)?,
        })
    }
}

impl Translate for src::Number {
    type Output = Expr;

    fn translate(self, span: Span, eaccum: &mut EAccum) -> Option<Expr> {
        match self.value() {
            Ok(x) => Some(Expr::Lit(x)),
            Err(e) => eaccum.error(err::SyntaxError {
                msg: e.to_string(),
                site: span,
            }),
        }
    }
}

impl Translate for src::Call {
    type Output = Expr;

    fn translate(self, _span: Span, eaccum: &mut EAccum) -> Option<Expr> {
        let head = self.head.translate(eaccum)?;
        let args = self
            .args
            .into_iter()
            .map(|a| a.translate(eaccum))
            .collect::<Option<Vec<_>>>()?;
        Some(Expr::Apply { head, args })
    }
}

impl Translate for src::Circuit {
    type Output = Program;

    fn translate(self, _span: Span, eaccum: &mut EAccum) -> Option<Program> {
        let count = eaccum.error_count();
        let mut program = Program::default();
        for def in self.defs {
            let src::Def { name, value, .. } = def.t;
            let Some(name) = name.translate(eaccum) else {
                continue;
            };
            let Some(value) = value.translate(eaccum) else {
                continue;
            };
            let site = name.span;
            if let Err(prior) = program.insert(name.clone(), value) {
                eaccum.error::<()>(err::DefinedTwice {
                    var: &name,
                    new_site: site,
                    prior_site: prior.name.span,
                });
            }
        }
        eaccum.check_since(count)?;
        tracing::debug!(definitions = program.len(), "translation done");
        Some(program)
    }
}

impl src::Circuit {
    /// Translate the definitions into a `Program`.
    ///
    /// Attributes are ignored, see `options::Attrs`.
    pub fn into_program(self, eaccum: &mut EAccum) -> Option<Program> {
        let span = self
            .defs
            .first()
            .map_or_else(|| Span::forge("empty circuit"), |d| d.span);
        self.translate(span, eaccum)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use dda_err::Kind;

    fn program(text: &str) -> (Option<Program>, EAccum) {
        let mut eaccum = EAccum::default();
        let Ok(circuit) = crate::text::parse_text(text) else {
            panic!("failed to parse {text:?}")
        };
        (circuit.into_program(&mut eaccum), eaccum)
    }

    #[test]
    fn canonical() {
        let (p, _) = program(
            "
            y = int(neg(y), dt, y0)  # decay
            dt = const(0.01); y0 = const(-1)
            z = add(y, 1e-3, 2,)
            ",
        );
        let Some(p) = p else { panic!("translation failed") };
        assert_eq!(
            p.to_string(),
            "dt = const(0.01)\ny = int(neg(y), dt, y0)\ny0 = const(-1)\nz = add(y, 0.001, 2)\n"
        );
    }

    #[test]
    fn keywords_are_names() {
        let (p, _) = program("type = const(1) loop = add(type, 1)");
        let Some(p) = p else { panic!("translation failed") };
        assert!(p.contains("type"));
        assert!(p.contains("loop"));
    }

    #[test]
    fn raw_identifiers_are_unraw() {
        // Only macro input can spell raw identifiers, `#` is a comment in text.
        let Ok(circuit) = syn::parse_str::<src::Circuit>("r#loop = const(1) x = add(r#loop, 1)") else {
            panic!("failed to parse raw identifiers")
        };
        let mut eaccum = EAccum::default();
        let Some(p) = circuit.into_program(&mut eaccum) else {
            panic!("translation failed")
        };
        assert!(p.contains("loop"));
        assert_eq!(p.get("x").map(|d| d.value.to_string()), Some("add(loop, 1)".to_owned()));
    }

    #[test]
    fn every_redefinition_is_reported() {
        let (p, eaccum) = program("x = 1\ny = 2\nx = 3\ny = x\nx = 4");
        assert!(p.is_none());
        let errs = eaccum.errors();
        assert_eq!(errs.len(), 3);
        assert!(errs.iter().all(|e| e.kind == Kind::Redefinition));
        assert_eq!(errs[0].headline(), "Variable `x` is defined more than once");
        assert_eq!(errs[0].span().and_then(|s| s.location()), Some((3, 1)));
        assert_eq!(errs[0].lines[1].1.and_then(|s| s.location()), Some((1, 1)));
    }
}
