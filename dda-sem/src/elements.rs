//! The closed set of computing elements a circuit is made of.

use std::fmt;

/// How many arguments an element accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    /// Fixed number of arguments.
    Exactly(usize),
    /// Variadic, with a lower bound.
    AtLeast(usize),
}

impl Arity {
    /// Whether `n` arguments are acceptable.
    #[must_use]
    pub fn accepts(self, n: usize) -> bool {
        match self {
            Self::Exactly(m) => n == m,
            Self::AtLeast(m) => n >= m,
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exactly(n) => write!(f, "exactly {n}"),
            Self::AtLeast(n) => write!(f, "at least {n}"),
        }
    }
}

/// Declare the elements along with their name in circuits and their arity.
macro_rules! elements {
    ( $( $(#[$doc:meta])* $variant:ident = $name:literal ( $arity:expr ), )* ) => {
        /// A computing element, i.e. the head of a function application
        /// in the circuit.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum Element {
            $( $(#[$doc])* $variant, )*
        }

        impl Element {
            /// Every element, in declaration order.
            pub const ALL: &'static [Element] = &[ $( Self::$variant, )* ];

            /// Name of the element in circuit text.
            #[must_use]
            pub fn name(self) -> &'static str {
                match self {
                    $( Self::$variant => $name, )*
                }
            }

            /// Number of arguments accepted.
            #[must_use]
            pub fn arity(self) -> Arity {
                match self {
                    $( Self::$variant => $arity, )*
                }
            }
        }
    };
}

elements! {
    /// `const(x)`: marks a literal, removed during classification.
    Const = "const" (Arity::Exactly(1)),
    /// `neg(x)`: `-x`.
    Neg = "neg" (Arity::Exactly(1)),
    /// `add(a, ...)`: left-to-right sum.
    Add = "add" (Arity::AtLeast(1)),
    /// `sum(a, ...)`: same as `add`.
    Sum = "sum" (Arity::AtLeast(1)),
    /// `mult(a, ...)`: left-to-right product.
    Mult = "mult" (Arity::AtLeast(1)),
    /// `div(a, b)`: `a / b`.
    Div = "div" (Arity::Exactly(2)),
    /// `sqrt(x)`.
    Sqrt = "sqrt" (Arity::Exactly(1)),
    /// `abs(x)`.
    Abs = "abs" (Arity::Exactly(1)),
    /// `exp(x)`.
    Exp = "exp" (Arity::Exactly(1)),
    /// `sin(x)`.
    Sin = "sin" (Arity::Exactly(1)),
    /// `cos(x)`.
    Cos = "cos" (Arity::Exactly(1)),
    /// `floor(x)`.
    Floor = "floor" (Arity::Exactly(1)),
    /// `min(a, b)`.
    Min = "min" (Arity::Exactly(2)),
    /// `max(a, b)`.
    Max = "max" (Arity::Exactly(2)),
    /// `lt(a, b, c, d)`: `c` if `a < b` else `d`.
    Lt = "lt" (Arity::Exactly(4)),
    /// `le(a, b, c, d)`: `c` if `a <= b` else `d`.
    Le = "le" (Arity::Exactly(4)),
    /// `gt(a, b, c, d)`: `c` if `a > b` else `d`.
    Gt = "gt" (Arity::Exactly(4)),
    /// `ge(a, b, c, d)`: `c` if `a >= b` else `d`.
    Ge = "ge" (Arity::Exactly(4)),
    /// `dead_upper(a, b)`: `a - b` above the threshold `b`, `0` below.
    DeadUpper = "dead_upper" (Arity::Exactly(2)),
    /// `dead_lower(a, b)`: `a + b` below the threshold `-b`, `0` above.
    DeadLower = "dead_lower" (Arity::Exactly(2)),
    /// `int(i1, ..., in, step, initial)`: the integrator. Its derivative
    /// is the sum of the integrands (non-inverting).
    Int = "int" (Arity::AtLeast(3)),
}

impl Element {
    /// Find an element by its name in circuit text.
    #[must_use]
    pub fn lookup(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|e| e.name() == name)
    }

    /// Elements whose arguments are folded by an infix operator.
    #[must_use]
    pub fn is_variadic(self) -> bool {
        matches!(self.arity(), Arity::AtLeast(_))
    }

    /// Apply the element.
    ///
    /// Returns `None` if the number of arguments does not match the arity,
    /// and for the integrator which has no instantaneous value.
    #[must_use]
    pub fn eval(self, args: &[f64]) -> Option<f64> {
        use Element as E;
        let cmp = |c: &f64, d: &f64, b: bool| if b { *c } else { *d };
        Some(match (self, args) {
            (E::Const, [x]) => *x,
            (E::Neg, [x]) => -x,
            (E::Add | E::Sum, [first, rest @ ..]) => rest.iter().fold(*first, |acc, x| acc + x),
            (E::Mult, [first, rest @ ..]) => rest.iter().fold(*first, |acc, x| acc * x),
            (E::Div, [a, b]) => a / b,
            (E::Sqrt, [x]) => x.sqrt(),
            (E::Abs, [x]) => x.abs(),
            (E::Exp, [x]) => x.exp(),
            (E::Sin, [x]) => x.sin(),
            (E::Cos, [x]) => x.cos(),
            (E::Floor, [x]) => x.floor(),
            (E::Min, [a, b]) => a.min(*b),
            (E::Max, [a, b]) => a.max(*b),
            (E::Lt, [a, b, c, d]) => cmp(c, d, a < b),
            (E::Le, [a, b, c, d]) => cmp(c, d, a <= b),
            (E::Gt, [a, b, c, d]) => cmp(c, d, a > b),
            (E::Ge, [a, b, c, d]) => cmp(c, d, a >= b),
            (E::DeadUpper, [a, b]) => {
                if a > b {
                    a - b
                } else {
                    0.0
                }
            }
            (E::DeadLower, [a, b]) => {
                if *a < -b {
                    a + b
                } else {
                    0.0
                }
            }
            _ => return None,
        })
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn lookup_by_name() {
        assert_eq!(Element::lookup("dead_upper"), Some(Element::DeadUpper));
        assert_eq!(Element::lookup("int"), Some(Element::Int));
        assert_eq!(Element::lookup("integrate"), None);
        for e in Element::ALL {
            assert_eq!(Element::lookup(e.name()), Some(*e));
        }
    }

    #[test]
    fn arity() {
        assert!(Element::Int.arity().accepts(3));
        assert!(Element::Int.arity().accepts(5));
        assert!(!Element::Int.arity().accepts(2));
        assert!(!Element::Div.arity().accepts(3));
        assert_eq!(Element::Lt.arity().to_string(), "exactly 4");
        assert_eq!(Element::Mult.arity().to_string(), "at least 1");
    }

    #[test]
    fn semantics() {
        assert_eq!(Element::Add.eval(&[1.0, 2.0, 3.5]), Some(6.5));
        assert_eq!(Element::Sum.eval(&[4.0]), Some(4.0));
        assert_eq!(Element::Mult.eval(&[2.0, -3.0, 0.5]), Some(-3.0));
        assert_eq!(Element::Neg.eval(&[2.0]), Some(-2.0));
        assert_eq!(Element::Div.eval(&[1.0, 4.0]), Some(0.25));
        assert_eq!(Element::Lt.eval(&[1.0, 2.0, 10.0, 20.0]), Some(10.0));
        assert_eq!(Element::Ge.eval(&[1.0, 2.0, 10.0, 20.0]), Some(20.0));
        assert_eq!(Element::DeadUpper.eval(&[3.0, 1.0]), Some(2.0));
        assert_eq!(Element::DeadUpper.eval(&[0.5, 1.0]), Some(0.0));
        assert_eq!(Element::DeadLower.eval(&[-3.0, 1.0]), Some(-2.0));
        assert_eq!(Element::DeadLower.eval(&[0.0, 1.0]), Some(0.0));
        assert_eq!(Element::Floor.eval(&[-0.5]), Some(-1.0));
    }

    #[test]
    fn no_value() {
        assert_eq!(Element::Div.eval(&[1.0]), None);
        assert_eq!(Element::Add.eval(&[]), None);
        assert_eq!(Element::Int.eval(&[1.0, 0.1, 0.0]), None);
    }
}
