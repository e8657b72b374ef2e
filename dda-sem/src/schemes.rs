//! Explicit Runge-Kutta schemes, described as data.
//!
//! A scheme evaluates the derivative function once per stage. The first
//! slope is always `k1 = f(s)`, every further stage `i` evaluates `f` at
//! a state obtained by an [`Increment`] of the previous slopes, and the
//! final update is itself an [`Increment`].
//!
//! Both the interpreter (through [`Increment::apply`]) and the code
//! generator (which prints the same terms as operator expressions) read
//! these tables, so the operation order below is the operation order of
//! the generated code:
//! - `Weighted` computes `s + (h * (w1*k1 + w2*k2 + ...)) / d`, with the
//!   sum folded left to right, unit weights not multiplied and a unit
//!   divisor not divided;
//! - `Chained` computes `((s + h*k1*w1) + h*k2*w2) ...`, where a weight of
//!   `-1` is a subtraction.

use std::fmt;

/// One term `weight * k` of a combination of slopes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Term {
    /// Index of the slope (`0` is `k1`).
    pub k: usize,
    /// Coefficient.
    pub weight: f64,
}

/// Whether a weight or divisor is exactly one, in which case the
/// multiplication or division is not performed.
#[must_use]
#[expect(clippy::float_cmp, reason = "weights are small exact integers")]
pub fn is_one(x: f64) -> bool {
    x == 1.0
}

/// Shorthand for the tables below.
const fn t(k: usize, weight: f64) -> Term {
    Term { k, weight }
}

impl Term {
    /// Multiply by the weight, skipping the multiplication by one.
    #[must_use]
    pub fn scale(self, x: f64) -> f64 {
        if is_one(self.weight) {
            x
        } else {
            x * self.weight
        }
    }

    /// Whether this term is a plain subtraction.
    #[must_use]
    #[expect(clippy::float_cmp, reason = "weights are small exact integers")]
    pub fn is_negated(self) -> bool {
        self.weight == -1.0
    }
}

/// How a state is built from the current state and previous slopes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Increment {
    /// `s + h * (sum of terms) / divisor`
    Weighted {
        /// Terms of the sum, in order.
        terms: &'static [Term],
        /// Common divisor.
        divisor: f64,
    },
    /// `s + sum of (h * k * weight)`, accumulated term by term.
    Chained {
        /// Terms of the sum, in order.
        terms: &'static [Term],
    },
}

impl Increment {
    /// Compute one component of the new state, `k(i)` being the
    /// same component of the slope `i`.
    pub fn apply(&self, s: f64, h: f64, k: impl Fn(usize) -> f64) -> f64 {
        match self {
            Self::Weighted { terms, divisor } => {
                let mut sum = None;
                for term in *terms {
                    let v = term.scale(k(term.k));
                    sum = Some(match sum {
                        None => v,
                        Some(acc) => acc + v,
                    });
                }
                let inc = h * sum.unwrap_or(0.0);
                if is_one(*divisor) {
                    s + inc
                } else {
                    s + inc / divisor
                }
            }
            Self::Chained { terms } => terms.iter().fold(s, |acc, term| {
                let hk = h * k(term.k);
                if term.is_negated() {
                    acc - hk
                } else {
                    acc + term.scale(hk)
                }
            }),
        }
    }

    /// Apply to every component of a state vector.
    #[must_use]
    pub fn apply_all(&self, state: &[f64], h: &[f64], ks: &[Vec<f64>]) -> Vec<f64> {
        state
            .iter()
            .zip(h)
            .enumerate()
            .map(|(j, (&s, &h))| {
                self.apply(s, h, |i| {
                    ks.get(i).and_then(|k| k.get(j)).copied().unwrap_or(f64::NAN)
                })
            })
            .collect()
    }
}

/// An explicit integration scheme.
#[derive(Debug)]
pub struct Scheme {
    /// Human-readable name.
    pub name: &'static str,
    /// Arguments of `f` for the slopes `k2`, `k3`, ...
    pub stages: &'static [Increment],
    /// Final combination.
    pub update: Increment,
}

/// `s' = s + h*k1`
pub static EULER: Scheme = Scheme {
    name: "Explicit Euler",
    stages: &[],
    update: Increment::Weighted {
        terms: &[t(0, 1.0)],
        divisor: 1.0,
    },
};

/// `k2 = f(s + h*k1)`, `s' = s + h*(k1 + k2)/2`
pub static RK2: Scheme = Scheme {
    name: "Second order Runge-Kutta",
    stages: &[Increment::Weighted {
        terms: &[t(0, 1.0)],
        divisor: 1.0,
    }],
    update: Increment::Weighted {
        terms: &[t(0, 1.0), t(1, 1.0)],
        divisor: 2.0,
    },
};

/// `k2 = f(s + h*k1/2)`, `k3 = f(s - h*k1 + 2h*k2)`,
/// `s' = s + h*(k1 + 4*k2 + k3)/6`
pub static RK3: Scheme = Scheme {
    name: "Kutta's third order",
    stages: &[
        Increment::Weighted {
            terms: &[t(0, 1.0)],
            divisor: 2.0,
        },
        Increment::Chained {
            terms: &[t(0, -1.0), t(1, 2.0)],
        },
    ],
    update: Increment::Weighted {
        terms: &[t(0, 1.0), t(1, 4.0), t(2, 1.0)],
        divisor: 6.0,
    },
};

/// `k2 = f(s + h*k1/2)`, `k3 = f(s + h*k2/2)`, `k4 = f(s + h*k3)`,
/// `s' = s + h*(k1 + 2*k2 + 2*k3 + k4)/6`
pub static RK4: Scheme = Scheme {
    name: "Classical Runge-Kutta",
    stages: &[
        Increment::Weighted {
            terms: &[t(0, 1.0)],
            divisor: 2.0,
        },
        Increment::Weighted {
            terms: &[t(1, 1.0)],
            divisor: 2.0,
        },
        Increment::Weighted {
            terms: &[t(2, 1.0)],
            divisor: 1.0,
        },
    ],
    update: Increment::Weighted {
        terms: &[t(0, 1.0), t(1, 2.0), t(2, 2.0), t(3, 1.0)],
        divisor: 6.0,
    },
};

impl Scheme {
    /// Number of evaluations of `f` per step.
    #[must_use]
    pub fn nb_slopes(&self) -> usize {
        self.stages.len() + 1
    }

    /// Advance `state` by one step of size `h` (per component).
    ///
    /// # Errors
    /// Whatever `f` fails with.
    pub fn step<E, F>(&self, state: &[f64], h: &[f64], mut f: F) -> Result<Vec<f64>, E>
    where
        F: FnMut(&[f64]) -> Result<Vec<f64>, E>,
    {
        let mut ks = Vec::with_capacity(self.nb_slopes());
        ks.push(f(state)?);
        for stage in self.stages {
            let arg = stage.apply_all(state, h, &ks);
            ks.push(f(&arg)?);
        }
        Ok(self.update.apply_all(state, h, &ks))
    }
}

/// Order of the Runge-Kutta scheme, between 1 and 4.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RkOrder(u8);

impl RkOrder {
    /// Explicit Euler.
    pub const EULER: Self = Self(1);
    /// Classical fourth order.
    pub const RK4: Self = Self(4);

    /// Validate an order.
    #[must_use]
    pub fn new(order: u32) -> Option<Self> {
        u8::try_from(order)
            .ok()
            .filter(|o| (1..=4).contains(o))
            .map(Self)
    }

    /// Numeric value.
    #[must_use]
    pub fn get(self) -> u32 {
        u32::from(self.0)
    }

    /// The scheme of this order.
    #[must_use]
    pub fn scheme(self) -> &'static Scheme {
        match self.0 {
            1 => &EULER,
            2 => &RK2,
            3 => &RK3,
            _ => &RK4,
        }
    }

    /// All valid orders.
    pub fn all() -> impl Iterator<Item = Self> {
        (1..=4).map(Self)
    }
}

impl Default for RkOrder {
    fn default() -> Self {
        Self::EULER
    }
}

impl fmt::Display for RkOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    /// `y' = -y` on one component.
    fn decay(s: &[f64]) -> Result<Vec<f64>, ()> {
        Ok(s.iter().map(|y| -y).collect())
    }

    #[test]
    fn order_bounds() {
        assert_eq!(RkOrder::new(0), None);
        assert_eq!(RkOrder::new(5), None);
        assert_eq!(RkOrder::new(300), None);
        assert_eq!(RkOrder::new(3).map(RkOrder::get), Some(3));
        assert_eq!(RkOrder::default(), RkOrder::EULER);
        assert_eq!(RkOrder::all().count(), 4);
    }

    #[test]
    fn euler_step() {
        let s = RkOrder::EULER.scheme().step(&[1.0], &[0.5], decay);
        assert_eq!(s, Ok(vec![0.5]));
    }

    #[test]
    fn rk4_matches_formula() {
        let (y, h) = (1.0_f64, 0.1_f64);
        let k1 = -y;
        let k2 = -(y + h * k1 / 2.0);
        let k3 = -(y + h * k2 / 2.0);
        let k4 = -(y + h * k3);
        let expected = y + h * (k1 + k2 * 2.0 + k3 * 2.0 + k4) / 6.0;
        let s = RkOrder::RK4.scheme().step(&[y], &[h], decay);
        assert_eq!(s, Ok(vec![expected]));
    }

    #[test]
    fn rk3_matches_formula() {
        let (y, h) = (2.0_f64, 0.25_f64);
        let k1 = -y;
        let k2 = -(y + h * k1 / 2.0);
        let k3 = -(y - h * k1 + h * k2 * 2.0);
        let expected = y + h * (k1 + k2 * 4.0 + k3) / 6.0;
        let s = RK3.step(&[y], &[h], decay);
        assert_eq!(s, Ok(vec![expected]));
    }

    #[test]
    fn steps_are_per_component() {
        let s = RK2.step(&[1.0, 1.0], &[0.1, 0.2], decay);
        let Ok(s) = s else { panic!("decay cannot fail") };
        assert!(s[0] > s[1]);
    }

    #[test]
    fn errors_are_propagated() {
        let s = RK4.step(&[1.0], &[0.1], |_| Err::<Vec<f64>, _>("boom"));
        assert_eq!(s, Err("boom"));
    }
}
