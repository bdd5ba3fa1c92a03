use std::cmp::Ordering;
use std::fmt;

/// Numeric value. Integer arithmetic falls back to floats on overflow.
#[derive(Debug, Clone, Copy)]
pub enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    pub fn as_f64(self) -> f64 {
        match self {
            Self::Int(value) => value as f64,
            Self::Float(value) => value,
        }
    }

    pub fn is_zero(self) -> bool {
        match self {
            Self::Int(value) => value == 0,
            Self::Float(value) => value == 0.0,
        }
    }

    pub fn add(self, other: Self) -> Self {
        match (self, other) {
            (Self::Int(a), Self::Int(b)) => a
                .checked_add(b)
                .map_or(Self::Float(a as f64 + b as f64), Self::Int),
            (a, b) => Self::Float(a.as_f64() + b.as_f64()),
        }
    }

    pub fn sub(self, other: Self) -> Self {
        match (self, other) {
            (Self::Int(a), Self::Int(b)) => a
                .checked_sub(b)
                .map_or(Self::Float(a as f64 - b as f64), Self::Int),
            (a, b) => Self::Float(a.as_f64() - b.as_f64()),
        }
    }

    pub fn mul(self, other: Self) -> Self {
        match (self, other) {
            (Self::Int(a), Self::Int(b)) => a
                .checked_mul(b)
                .map_or(Self::Float(a as f64 * b as f64), Self::Int),
            (a, b) => Self::Float(a.as_f64() * b.as_f64()),
        }
    }

    /// True division; always a float. `None` for a zero divisor.
    pub fn div(self, other: Self) -> Option<Self> {
        if other.is_zero() {
            return None;
        }
        Some(Self::Float(self.as_f64() / other.as_f64()))
    }

    /// Floored modulo: the result takes the sign of the divisor.
    pub fn rem(self, other: Self) -> Option<Self> {
        if other.is_zero() {
            return None;
        }
        match (self, other) {
            (Self::Int(a), Self::Int(b)) => {
                let remainder = a.wrapping_rem(b);
                if remainder != 0 && (remainder < 0) != (b < 0) {
                    Some(Self::Int(remainder + b))
                } else {
                    Some(Self::Int(remainder))
                }
            }
            (a, b) => {
                let (a, b) = (a.as_f64(), b.as_f64());
                let remainder = a % b;
                if remainder != 0.0 && (remainder < 0.0) != (b < 0.0) {
                    Some(Self::Float(remainder + b))
                } else {
                    Some(Self::Float(remainder))
                }
            }
        }
    }

    pub fn neg(self) -> Self {
        match self {
            Self::Int(value) => value
                .checked_neg()
                .map_or(Self::Float(-(value as f64)), Self::Int),
            Self::Float(value) => Self::Float(-value),
        }
    }

    pub fn compare(self, other: Self) -> Option<Ordering> {
        match (self, other) {
            (Self::Int(a), Self::Int(b)) => Some(a.cmp(&b)),
            (a, b) => a.as_f64().partial_cmp(&b.as_f64()),
        }
    }
}

impl PartialEq for Number {
    fn eq(&self, other: &Self) -> bool {
        self.compare(*other) == Some(Ordering::Equal)
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(value) => write!(f, "{value}"),
            Self::Float(value) => f.write_str(&format_float(*value)),
        }
    }
}

/// Renders floats the way the language prints them: integral values keep a
/// trailing `.0`, very large or very small magnitudes use exponent notation.
fn format_float(value: f64) -> String {
    if !value.is_finite() {
        return if value.is_nan() {
            "nan".to_string()
        } else if value > 0.0 {
            "inf".to_string()
        } else {
            "-inf".to_string()
        };
    }
    let magnitude = value.abs();
    if magnitude != 0.0 && !(1e-4..1e16).contains(&magnitude) {
        let rendered = format!("{value:e}");
        return match rendered.split_once('e') {
            Some((mantissa, exponent)) => {
                let (sign, digits) = match exponent.strip_prefix('-') {
                    Some(digits) => ('-', digits),
                    None => ('+', exponent),
                };
                format!("{mantissa}e{sign}{digits:0>2}")
            }
            None => rendered,
        };
    }
    if value.fract() == 0.0 {
        format!("{value:.1}")
    } else {
        format!("{value}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_arithmetic_stays_integral() {
        assert!(matches!(Number::Int(2).add(Number::Int(3)), Number::Int(5)));
        assert!(matches!(Number::Int(2).mul(Number::Int(-3)), Number::Int(-6)));
        assert!(matches!(Number::Int(2).sub(Number::Float(0.5)), Number::Float(v) if v == 1.5));
    }

    #[test]
    fn overflow_promotes_to_float() {
        assert!(matches!(Number::Int(i64::MAX).add(Number::Int(1)), Number::Float(_)));
    }

    #[test]
    fn division_is_true_division_and_rejects_zero() {
        assert!(matches!(Number::Int(10).div(Number::Int(4)), Some(Number::Float(v)) if v == 2.5));
        assert!(Number::Int(10).div(Number::Int(0)).is_none());
        assert!(Number::Int(10).div(Number::Float(0.0)).is_none());
    }

    #[test]
    fn modulo_follows_divisor_sign() {
        assert_eq!(Number::Int(-7).rem(Number::Int(3)), Some(Number::Int(2)));
        assert_eq!(Number::Int(7).rem(Number::Int(-3)), Some(Number::Int(-2)));
        assert_eq!(Number::Int(7).rem(Number::Int(3)), Some(Number::Int(1)));
        assert_eq!(Number::Float(5.5).rem(Number::Int(2)), Some(Number::Float(1.5)));
        assert!(Number::Int(1).rem(Number::Int(0)).is_none());
    }

    #[test]
    fn mixed_comparison_and_equality() {
        assert_eq!(Number::Int(1), Number::Float(1.0));
        assert_eq!(
            Number::Int(1).compare(Number::Float(1.5)),
            Some(Ordering::Less)
        );
    }

    #[test]
    fn formats_like_the_language_prints() {
        assert_eq!(Number::Float(5.0).to_string(), "5.0");
        assert_eq!(Number::Float(2.5).to_string(), "2.5");
        assert_eq!(Number::Float(0.1 + 0.2).to_string(), "0.30000000000000004");
        assert_eq!(Number::Float(1e20).to_string(), "1e+20");
        assert_eq!(Number::Float(1.5e-5).to_string(), "1.5e-05");
        assert_eq!(Number::Int(-3).to_string(), "-3");
    }
}
