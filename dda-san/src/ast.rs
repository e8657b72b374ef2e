//! The symbolic representation of a circuit.
//!
//! A [`Program`] maps each variable name to the [`Expr`] that defines it.
//! Expressions are value trees: a numeric literal, a reference to a
//! variable, or the application of a computing element to arguments.
//! Nothing here is ever mutated in place: every transformation consumes
//! a `Program` and builds a new one.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use dda_err::{self as err, EAccum};

use crate::sp::{Sp, Span};

/// The definition of a variable.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Numeric literal.
    Lit(f64),
    /// Reference to a variable, resolved against the definitions of
    /// the program once all of them are known.
    Var(String),
    /// Application of a computing element.
    Apply {
        /// Name of the element (not checked until classification).
        head: Sp<String>,
        /// Ordered arguments.
        args: Vec<Sp<Expr>>,
    },
}

impl Expr {
    /// A literal without source location.
    #[must_use]
    pub fn lit(x: f64) -> Sp<Self> {
        Sp::forged(Self::Lit(x))
    }

    /// A reference without source location.
    #[must_use]
    pub fn var(name: &str) -> Sp<Self> {
        Sp::forged(Self::Var(name.to_owned()))
    }

    /// An application without source location.
    pub fn apply<I>(head: &str, args: I) -> Sp<Self>
    where
        I: IntoIterator<Item = Sp<Self>>,
    {
        Sp::forged(Self::Apply {
            head: Sp::forged(head.to_owned()),
            args: args.into_iter().collect(),
        })
    }

    /// Whether this is a bare variable reference.
    #[must_use]
    pub fn is_var(&self) -> bool {
        matches!(self, Self::Var(_))
    }

    /// Name of the referenced variable.
    #[must_use]
    pub fn as_var(&self) -> Option<&str> {
        match self {
            Self::Var(v) => Some(v),
            _ => None,
        }
    }

    /// Name of the computing element.
    #[must_use]
    pub fn head(&self) -> Option<&str> {
        match self {
            Self::Apply { head, .. } => Some(&head.t),
            _ => None,
        }
    }

    /// All the variables referenced, recursively.
    #[must_use]
    pub fn variables(&self) -> BTreeSet<String> {
        let mut vars = BTreeSet::new();
        self.collect_variables(&mut vars);
        vars
    }

    /// Helper for `variables`.
    fn collect_variables(&self, vars: &mut BTreeSet<String>) {
        match self {
            Self::Lit(_) => {}
            Self::Var(v) => {
                vars.insert(v.clone());
            }
            Self::Apply { args, .. } => {
                for a in args {
                    a.t.collect_variables(vars);
                }
            }
        }
    }
}

impl Sp<Expr> {
    /// Rewrite bottom-up: the arguments of an application are rewritten
    /// before the application itself is passed to `f`.
    #[must_use]
    pub fn rewrite<F>(self, f: &mut F) -> Self
    where
        F: FnMut(Sp<Expr>) -> Sp<Expr>,
    {
        let node = self.rewrite_args(f);
        f(node)
    }

    /// Rewrite only the arguments of the root, leaving the root itself
    /// untouched.
    #[must_use]
    pub fn rewrite_args<F>(self, f: &mut F) -> Self
    where
        F: FnMut(Sp<Expr>) -> Sp<Expr>,
    {
        self.map(|_, e| match e {
            Expr::Apply { head, args } => Expr::Apply {
                head,
                args: args.into_iter().map(|a| a.rewrite(f)).collect(),
            },
            other => other,
        })
    }

    /// Every variable reference with its location, in order of appearance.
    pub fn references(&self, refs: &mut Vec<Sp<String>>) {
        match &self.t {
            Expr::Lit(_) => {}
            Expr::Var(v) => refs.push(Sp::new(v.clone(), self.span)),
            Expr::Apply { args, .. } => {
                for a in args {
                    a.references(refs);
                }
            }
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lit(x) => write!(f, "{x}"),
            Self::Var(v) => write!(f, "{v}"),
            Self::Apply { head, args } => {
                write!(f, "{head}(")?;
                for (i, a) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{a}")?;
                }
                write!(f, ")")
            }
        }
    }
}

/// `name = value`
#[derive(Debug, Clone, PartialEq)]
pub struct Definition {
    /// Defined variable.
    pub name: Sp<String>,
    /// Its definition.
    pub value: Sp<Expr>,
}

/// A circuit: a set of definitions with unique names.
///
/// Definitions are kept sorted by name, the order in which they were
/// written is not meaningful.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Program {
    /// Definitions by name.
    defs: BTreeMap<String, Definition>,
}

impl Program {
    /// Add a definition.
    ///
    /// # Errors
    /// If the name is already defined, the program is unchanged and the
    /// existing definition is returned.
    pub fn insert(&mut self, name: Sp<String>, value: Sp<Expr>) -> Result<(), &Definition> {
        use std::collections::btree_map::Entry;
        match self.defs.entry(name.t.clone()) {
            Entry::Occupied(prior) => Err(&*prior.into_mut()),
            Entry::Vacant(slot) => {
                slot.insert(Definition { name, value });
                Ok(())
            }
        }
    }

    /// Builder-style definition without source location, replacing any
    /// previous definition of the same name.
    #[must_use]
    pub fn with(mut self, name: &str, value: Sp<Expr>) -> Self {
        self.defs.insert(
            name.to_owned(),
            Definition {
                name: Sp::forged(name.to_owned()),
                value,
            },
        );
        self
    }

    /// Definition of a variable.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Definition> {
        self.defs.get(name)
    }

    /// Whether the variable is defined.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.defs.contains_key(name)
    }

    /// Number of definitions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.defs.len()
    }

    /// Whether there are no definitions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }

    /// Definitions, sorted by name.
    pub fn iter(&self) -> impl Iterator<Item = &Definition> {
        self.defs.values()
    }

    /// Names of the defined variables, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> + Clone {
        self.defs.keys().map(String::as_str)
    }

    /// Rewrite every expression of the program bottom-up.
    #[must_use]
    pub fn map<F>(self, mut f: F) -> Self
    where
        F: FnMut(Sp<Expr>) -> Sp<Expr>,
    {
        Self {
            defs: self
                .defs
                .into_iter()
                .map(|(k, Definition { name, value })| {
                    let value = value.rewrite(&mut f);
                    (k, Definition { name, value })
                })
                .collect(),
        }
    }

    /// Variables defined or referenced anywhere in the program.
    #[must_use]
    pub fn all_variables(&self) -> BTreeSet<String> {
        let mut vars: BTreeSet<String> = self.defs.keys().cloned().collect();
        for def in self.defs.values() {
            def.value.t.collect_variables(&mut vars);
        }
        vars
    }

    /// Report every reference to a variable that has no definition.
    pub fn check_references(&self, eaccum: &mut EAccum) -> Option<()> {
        let count = eaccum.error_count();
        for def in self.iter() {
            let mut refs = Vec::new();
            def.value.references(&mut refs);
            for r in refs {
                if !self.contains(&r.t) {
                    eaccum.error::<()>(err::UndeclaredVariable {
                        var: &r,
                        site: r.span,
                        user: &def.name,
                        suggest: err::Suggest {
                            available: self.names(),
                        },
                    });
                }
            }
        }
        eaccum.check_since(count)
    }
}

/// Consume the program into its definitions, sorted by name.
impl IntoIterator for Program {
    type Item = Definition;
    type IntoIter = std::collections::btree_map::IntoValues<String, Definition>;
    fn into_iter(self) -> Self::IntoIter {
        self.defs.into_values()
    }
}

/// Canonical text of the program: one `name = value` line per
/// definition, sorted by name.
impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for def in self.defs.values() {
            writeln!(f, "{} = {}", def.name, def.value)?;
        }
        Ok(())
    }
}

impl Definition {
    /// Location of the definition.
    #[must_use]
    pub fn site(&self) -> Span {
        self.name.span
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn sample() -> Program {
        Program::default()
            .with(
                "y",
                Expr::apply(
                    "int",
                    [
                        Expr::apply("mult", [Expr::var("y"), Expr::var("k")]),
                        Expr::var("dt"),
                        Expr::apply("const", [Expr::lit(1.0)]),
                    ],
                ),
            )
            .with("dt", Expr::apply("const", [Expr::lit(0.5)]))
    }

    #[test]
    fn canonical_text() {
        assert_eq!(
            sample().to_string(),
            "dt = const(0.5)\ny = int(mult(y, k), dt, const(1))\n"
        );
    }

    #[test]
    fn variables() {
        let p = sample();
        let expected: BTreeSet<String> = ["dt", "k", "y"].into_iter().map(String::from).collect();
        let y = p.get("y").map(|d| d.value.t.variables());
        assert_eq!(y.as_ref(), Some(&expected));
        assert_eq!(p.all_variables(), expected);
        assert!(Expr::var("a").t.is_var());
        assert!(!Expr::lit(1.0).t.is_var());
    }

    #[test]
    fn map_is_bottom_up() {
        // Rename every `mult` into `add`, and observe the order of visits.
        let mut visited = Vec::new();
        let p = sample().map(|e| {
            visited.push(e.t.head().unwrap_or("-").to_owned());
            if e.t.head() == Some("mult") {
                e.map(|_, e| match e {
                    Expr::Apply { args, .. } => Expr::Apply {
                        head: Sp::forged("add".to_owned()),
                        args,
                    },
                    other => other,
                })
            } else {
                e
            }
        });
        assert_eq!(
            p.get("y").map(|d| d.value.to_string()),
            Some("int(add(y, k), dt, const(1))".to_owned())
        );
        // dt: const(0.5) then y: int(mult(y, k), dt, const(1))
        assert_eq!(
            visited,
            ["-", "const", "-", "-", "mult", "-", "-", "const", "int"]
        );
    }

    #[test]
    fn redefinition_is_refused() {
        let mut p = Program::default();
        assert!(p.insert(Sp::forged("a".to_owned()), Expr::lit(1.0)).is_ok());
        let prior = p.insert(Sp::forged("a".to_owned()), Expr::lit(2.0));
        assert_eq!(prior.map_err(|d| d.value.to_string()), Err("1".to_owned()));
        assert_eq!(p.len(), 1);
    }

    #[test]
    fn undeclared_references() {
        let mut eaccum = EAccum::default();
        assert_eq!(sample().check_references(&mut eaccum), None);
        let (errs, _) = eaccum.fetch();
        assert_eq!(errs.len(), 1);
        assert_eq!(errs[0].kind, dda_err::Kind::Reference);
        assert!(errs[0].headline().contains("`k`"));
    }
}
