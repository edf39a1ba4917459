//! Exact rational arithmetic for `real`/`time` literals and solver-boundary
//! values (§4.1, §6). Backed by `num-rational` rather than floats so that
//! `13.275` stays `531/40` through elaboration instead of drifting.

use num_rational::Ratio;
use std::fmt;

pub type Rational = Ratio<i64>;

/// Parses a real literal already split by the lexer into its integer and
/// fractional digit runs (`"13", "275"` for `13.275`, `"", "5"` for `.5`)
/// into `numerator / 10^len(frac)`, per §4.1.
pub fn parse_real_literal(int_digits: &str, frac_digits: &str) -> Rational {
    let denom: i64 = 10i64.pow(frac_digits.len() as u32);
    let int_part: i64 = if int_digits.is_empty() {
        0
    } else {
        int_digits.parse().expect("lexer only emits ASCII digits")
    };
    let frac_part: i64 = if frac_digits.is_empty() {
        0
    } else {
        frac_digits.parse().expect("lexer only emits ASCII digits")
    };
    Rational::new(int_part * denom + frac_part, denom)
}

/// A rational value paired with an infinitesimal offset. The solver
/// boundary (§6 `arithmetic_value`) needs this to distinguish `x < 5` from
/// `x <= 5` without resorting to floating point epsilons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct EpsRational {
    pub value: Rational,
    pub eps: i64,
}

impl EpsRational {
    pub fn exact(value: Rational) -> Self {
        Self { value, eps: 0 }
    }
}

impl fmt::Display for EpsRational {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.eps == 0 {
            write!(f, "{}", self.value)
        } else {
            write!(f, "{} + {}ε", self.value, self.eps)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn half() {
        assert_eq!(parse_real_literal("", "5"), Rational::new(1, 2));
    }

    #[test]
    fn two_and_a_half() {
        assert_eq!(parse_real_literal("2", "5"), Rational::new(5, 2));
    }

    #[test]
    fn thirteen_point_two_seven_five() {
        assert_eq!(parse_real_literal("13", "275"), Rational::new(531, 40));
    }

    #[test]
    fn eps_rational_exact_has_zero_eps() {
        let r = EpsRational::exact(Rational::new(3, 1));
        assert_eq!(r.eps, 0);
        assert_eq!(format!("{}", r), "3");
    }

    #[test]
    fn eps_rational_display_shows_epsilon() {
        let r = EpsRational { value: Rational::new(5, 1), eps: 1 };
        assert_eq!(format!("{}", r), "5 + 1ε");
    }
}
