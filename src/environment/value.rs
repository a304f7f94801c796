//! Runtime value representation
//!
//! [`Value`] is the closed set of things a Respawn variable, array element or
//! struct field can hold. Two variants have no counterpart in the surface
//! type system:
//!
//! - [`Value::Dead`]: the explicit "uninitialized" state. Only a
//!   redeclaration brings the name back; reading or assigning it is an error.
//! - [`Value::Pending`]: a numeric value that only exists during the dry
//!   pass, standing in for input that has not been read yet. The
//!   [`NumericHint`] narrows what it may turn into.

use crate::parser::ast::ScalarType;
use std::fmt;

/// What a pending value is known to be so far
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumericHint {
    /// Either `hp` or `xp`
    Any,
    Hp,
    Xp,
}

impl NumericHint {
    /// Narrow two hints; `None` when they cannot agree
    pub fn unify(self, other: NumericHint) -> Option<NumericHint> {
        match (self, other) {
            (NumericHint::Any, hint) | (hint, NumericHint::Any) => Some(hint),
            (a, b) if a == b => Some(a),
            _ => None,
        }
    }

    pub fn for_type(ty: ScalarType) -> Option<NumericHint> {
        match ty {
            ScalarType::Hp => Some(NumericHint::Hp),
            ScalarType::Xp => Some(NumericHint::Xp),
            _ => None,
        }
    }
}

/// Runtime values in the interpreter
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    Hp(i64),
    Xp(f64),
    Comms(String),
    Flag(bool),
    #[default]
    Dead,
    Pending(NumericHint),
}

impl Value {
    /// The value a declaration without an initializer starts with
    pub fn default_for(ty: ScalarType) -> Value {
        match ty {
            ScalarType::Hp => Value::Hp(0),
            ScalarType::Xp => Value::Xp(0.0),
            ScalarType::Comms => Value::Comms(String::new()),
            ScalarType::Flag => Value::Flag(false),
        }
    }

    /// Concrete scalar type, if the value has one
    pub fn scalar_type(&self) -> Option<ScalarType> {
        match self {
            Value::Hp(_) | Value::Pending(NumericHint::Hp) => Some(ScalarType::Hp),
            Value::Xp(_) | Value::Pending(NumericHint::Xp) => Some(ScalarType::Xp),
            Value::Comms(_) => Some(ScalarType::Comms),
            Value::Flag(_) => Some(ScalarType::Flag),
            Value::Dead | Value::Pending(NumericHint::Any) => None,
        }
    }

    /// Name used in diagnostics
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Hp(_) => "hp",
            Value::Xp(_) => "xp",
            Value::Comms(_) => "comms",
            Value::Flag(_) => "flag",
            Value::Dead => "dead",
            Value::Pending(_) => "pending numeric",
        }
    }

    pub fn is_dead(&self) -> bool {
        matches!(self, Value::Dead)
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, Value::Pending(_))
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Value::Hp(_) | Value::Xp(_) | Value::Pending(_))
    }

    pub fn as_hp(&self) -> Option<i64> {
        match self {
            Value::Hp(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_flag(&self) -> Option<bool> {
        match self {
            Value::Flag(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_comms(&self) -> Option<&str> {
        match self {
            Value::Comms(s) => Some(s),
            _ => None,
        }
    }

    /// Numeric view used by comparisons; pending values read as zero
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Hp(n) => Some(*n as f64),
            Value::Xp(x) => Some(*x),
            Value::Pending(_) => Some(0.0),
            _ => None,
        }
    }
}

/// Render an `xp` value with at least one fractional digit
pub fn format_xp(x: f64) -> String {
    if x.is_finite() && x.fract() == 0.0 {
        format!("{:.1}", x)
    } else {
        format!("{}", x)
    }
}

/// Render a number with exactly `digits` fractional digits (the `.Nf` suffix)
pub fn format_fixed(x: f64, digits: usize) -> String {
    format!("{:.*}", digits, x)
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Hp(n) => write!(f, "{}", n),
            Value::Xp(x) => f.write_str(&format_xp(*x)),
            Value::Comms(s) => f.write_str(s),
            Value::Flag(b) => write!(f, "{}", b),
            Value::Dead => f.write_str("dead"),
            Value::Pending(_) => f.write_str("?"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_xp_keeps_a_fractional_digit() {
        assert_eq!(Value::Xp(2.0).to_string(), "2.0");
        assert_eq!(Value::Xp(1.5).to_string(), "1.5");
        assert_eq!(Value::Xp(-0.25).to_string(), "-0.25");
    }

    #[test]
    fn test_defaults_per_type() {
        assert_eq!(Value::default_for(ScalarType::Hp), Value::Hp(0));
        assert_eq!(Value::default_for(ScalarType::Comms).to_string(), "");
        assert_eq!(Value::default_for(ScalarType::Flag).to_string(), "false");
        assert_eq!(Value::default().to_string(), "dead");
    }

    #[test]
    fn test_hint_unification() {
        assert_eq!(
            NumericHint::Any.unify(NumericHint::Xp),
            Some(NumericHint::Xp)
        );
        assert_eq!(NumericHint::Hp.unify(NumericHint::Hp), Some(NumericHint::Hp));
        assert_eq!(NumericHint::Hp.unify(NumericHint::Xp), None);
    }

    #[test]
    fn test_fixed_format() {
        assert_eq!(format_fixed(3.14159, 2), "3.14");
        assert_eq!(format_fixed(2.0, 0), "2");
    }
}
