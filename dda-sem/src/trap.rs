//! Emulation of the floating-point exceptions trapped by generated
//! simulations.
//!
//! A generated program enables hardware traps for division by zero,
//! invalid operations and overflow, and poisons its auxiliaries with a
//! signalling NaN before each evaluation. The reference interpreter cannot
//! rely on hardware traps, so it asks this module after each element
//! whether the hardware would have stopped the program.

use std::fmt;

use crate::Element;

/// The trapped floating-point exceptions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Trap {
    /// A finite nonzero value divided by zero.
    DivByZero,
    /// An operation without a meaningful result, or an operation that
    /// consumed a signalling NaN.
    Invalid,
    /// A result too large to be represented.
    Overflow,
}

impl fmt::Display for Trap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DivByZero => write!(f, "division by zero"),
            Self::Invalid => write!(f, "invalid operation"),
            Self::Overflow => write!(f, "overflow"),
        }
    }
}

impl Trap {
    /// The signalling NaN that poisons auxiliaries before they are computed.
    pub const POISON_BITS: u64 = 0x7ff4_0000_0000_0000;

    /// Value of a poisoned auxiliary.
    #[must_use]
    pub fn poison() -> f64 {
        f64::from_bits(Self::POISON_BITS)
    }

    /// Exception raised when `element` computes `result` from `args`.
    ///
    /// NaN operands can only be poisoned auxiliaries (any other NaN would
    /// have trapped when it was produced), so consuming one is invalid.
    /// Sign manipulations and plain copies do not inspect their operand
    /// and never trap.
    #[must_use]
    pub fn detect(element: Element, args: &[f64], result: f64) -> Option<Self> {
        let inspected = match element {
            Element::Const | Element::Neg | Element::Abs => &[][..],
            Element::Lt | Element::Le | Element::Gt | Element::Ge => args.get(..2).unwrap_or(args),
            _ => args,
        };
        if inspected.iter().any(|x| x.is_nan()) {
            return Some(Self::Invalid);
        }
        if !args.iter().all(|x| x.is_finite()) {
            return None;
        }
        if result.is_nan() {
            Some(Self::Invalid)
        } else if result.is_infinite() {
            if element == Element::Div && args.get(1) == Some(&0.0) {
                Some(Self::DivByZero)
            } else {
                Some(Self::Overflow)
            }
        } else {
            None
        }
    }

    /// Exception raised by a state update that produced `result`.
    #[must_use]
    pub fn detect_update(before: f64, result: f64) -> Option<Self> {
        if before.is_nan() || result.is_nan() {
            Some(Self::Invalid)
        } else if before.is_finite() && result.is_infinite() {
            Some(Self::Overflow)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn poison_is_signalling() {
        let p = Trap::poison();
        assert!(p.is_nan());
        // Quiet bit is clear.
        assert_eq!(p.to_bits() & 0x0008_0000_0000_0000, 0);
    }

    #[test]
    fn detection() {
        assert_eq!(Trap::detect(Element::Div, &[1.0, 0.0], f64::INFINITY), Some(Trap::DivByZero));
        assert_eq!(Trap::detect(Element::Sqrt, &[-1.0], f64::NAN), Some(Trap::Invalid));
        assert_eq!(Trap::detect(Element::Exp, &[1000.0], f64::INFINITY), Some(Trap::Overflow));
        assert_eq!(Trap::detect(Element::Add, &[1.0, Trap::poison()], f64::NAN), Some(Trap::Invalid));
        assert_eq!(Trap::detect(Element::Neg, &[Trap::poison()], f64::NAN), None);
        assert_eq!(Trap::detect(Element::Lt, &[0.0, 1.0, Trap::poison(), 2.0], f64::NAN), None);
        assert_eq!(Trap::detect(Element::Mult, &[2.0, 3.0], 6.0), None);
    }

    #[test]
    fn update_detection() {
        assert_eq!(Trap::detect_update(1.0, 2.0), None);
        assert_eq!(Trap::detect_update(f64::MAX, f64::INFINITY), Some(Trap::Overflow));
        assert_eq!(Trap::detect_update(1.0, f64::NAN), Some(Trap::Invalid));
    }
}
