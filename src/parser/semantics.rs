//! Static types and the typing rules the parser enforces
//!
//! Every expression the parser builds comes back as a [`Typed`] pair. The
//! rules here mirror the runtime rules in `interpreter::type_system`; they
//! only fire when both sides are known, so anything involving function
//! results or parameters is left for the interpreter to check.

use super::ast::{BinOp, Expr, ScalarType, UnOp};
use std::fmt;

/// What the parser knows about an expression's type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StaticType {
    Hp,
    Xp,
    Comms,
    Flag,
    /// `hp` or `xp`, decided at runtime (`loadNum`, `hp ^ hp`)
    Numeric,
    /// Function results and parameters
    Unknown,
    /// A `dead` literal or a variable known to be dead
    Dead,
    /// A call to a function whose `recall` yields nothing
    Void,
    /// A call yielding this many values (more than one)
    Multi(usize),
    /// A whole row taken from a 2-D array
    Row(ScalarType),
}

impl StaticType {
    pub fn from_scalar(ty: ScalarType) -> Self {
        match ty {
            ScalarType::Hp => StaticType::Hp,
            ScalarType::Xp => StaticType::Xp,
            ScalarType::Comms => StaticType::Comms,
            ScalarType::Flag => StaticType::Flag,
        }
    }

    pub fn is_numeric(self) -> bool {
        matches!(self, StaticType::Hp | StaticType::Xp | StaticType::Numeric)
    }

    /// Unknown types pass every check
    pub fn is_known(self) -> bool {
        !matches!(self, StaticType::Unknown)
    }

    /// Whether this can appear where a single value is expected
    pub fn is_single_value(self) -> bool {
        !matches!(
            self,
            StaticType::Void | StaticType::Multi(_) | StaticType::Row(_)
        )
    }
}

impl fmt::Display for StaticType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StaticType::Hp => f.write_str("hp"),
            StaticType::Xp => f.write_str("xp"),
            StaticType::Comms => f.write_str("comms"),
            StaticType::Flag => f.write_str("flag"),
            StaticType::Numeric => f.write_str("hp or xp"),
            StaticType::Unknown => f.write_str("unknown"),
            StaticType::Dead => f.write_str("dead"),
            StaticType::Void => f.write_str("no value"),
            StaticType::Multi(n) => write!(f, "{} values", n),
            StaticType::Row(ty) => write!(f, "{} row", ty),
        }
    }
}

/// An expression together with its static type
#[derive(Debug, Clone)]
pub struct Typed {
    pub expr: Expr,
    pub ty: StaticType,
}

impl Typed {
    pub fn new(expr: Expr, ty: StaticType) -> Self {
        Typed { expr, ty }
    }
}

/// Result type of `left op right`, or the reason it is rejected
pub fn binary_type(op: BinOp, left: StaticType, right: StaticType) -> Result<StaticType, String> {
    if left == StaticType::Dead || right == StaticType::Dead {
        return Err(format!(
            "'dead' value used as an operand of '{}'",
            op.symbol()
        ));
    }

    if op.is_arithmetic() {
        return arithmetic_type(op, left, right);
    }

    if !left.is_known() || !right.is_known() {
        return Ok(StaticType::Flag);
    }

    match op {
        BinOp::And | BinOp::Or => {
            if left == StaticType::Flag && right == StaticType::Flag {
                Ok(StaticType::Flag)
            } else {
                Err(format!(
                    "'{}' needs flag operands, found {} and {}",
                    op.symbol(),
                    left,
                    right
                ))
            }
        }
        _ if op.is_equality() => {
            let comparable = (left.is_numeric() && right.is_numeric())
                || (left == StaticType::Comms && right == StaticType::Comms)
                || (left == StaticType::Flag && right == StaticType::Flag);
            if comparable {
                Ok(StaticType::Flag)
            } else {
                Err(format!("cannot compare {} with {}", left, right))
            }
        }
        _ => {
            if left.is_numeric() && right.is_numeric() {
                Ok(StaticType::Flag)
            } else if left == StaticType::Comms && right == StaticType::Comms {
                Err(format!(
                    "comms values only support '==' and '!=', not '{}'",
                    op.symbol()
                ))
            } else {
                Err(format!(
                    "'{}' needs numeric operands, found {} and {}",
                    op.symbol(),
                    left,
                    right
                ))
            }
        }
    }
}

fn arithmetic_type(op: BinOp, left: StaticType, right: StaticType) -> Result<StaticType, String> {
    use StaticType::*;

    if !left.is_known() || !right.is_known() {
        let other = if left.is_known() { left } else { right };
        return match other {
            Flag => Err(format!("'{}' cannot be applied to flag", op.symbol())),
            Comms if op != BinOp::Add => Err(format!(
                "'{}' cannot be applied to comms",
                op.symbol()
            )),
            _ => Ok(Unknown),
        };
    }

    match (left, right) {
        (Comms, Comms) if op == BinOp::Add => Ok(Comms),
        (Comms, Comms) => Err(format!(
            "'{}' cannot be applied to comms; only '+' joins comms",
            op.symbol()
        )),
        (l, r) if !l.is_numeric() || !r.is_numeric() => Err(format!(
            "'{}' cannot combine {} with {}",
            op.symbol(),
            l,
            r
        )),
        (l, r) if op == BinOp::Mod => {
            if l == Xp || r == Xp {
                Err("'%' needs hp operands".to_string())
            } else {
                Ok(Hp)
            }
        }
        (Hp, Hp) if op == BinOp::Pow => Ok(Numeric),
        (Hp, Hp) => Ok(Hp),
        (Xp, _) | (_, Xp) => Ok(Xp),
        _ => Ok(Numeric),
    }
}

pub fn unary_type(op: UnOp, operand: StaticType) -> Result<StaticType, String> {
    match (op, operand) {
        (_, StaticType::Dead) => Err("'dead' value used as an operand".to_string()),
        (_, StaticType::Unknown) => Ok(if op == UnOp::Not {
            StaticType::Flag
        } else {
            StaticType::Unknown
        }),
        (UnOp::Neg, ty) if ty.is_numeric() => Ok(ty),
        (UnOp::Neg, ty) => Err(format!("cannot negate {}", ty)),
        (UnOp::Not, StaticType::Flag) => Ok(StaticType::Flag),
        (UnOp::Not, ty) => Err(format!("'!' needs a flag operand, found {}", ty)),
    }
}

/// Whether a value of type `value` may be stored in a slot of type `target`
pub fn assignable(target: ScalarType, value: StaticType) -> bool {
    match value {
        StaticType::Unknown | StaticType::Dead => true,
        StaticType::Numeric => target.is_numeric(),
        StaticType::Hp => target.is_numeric(),
        StaticType::Xp => target == ScalarType::Xp,
        StaticType::Comms => target == ScalarType::Comms,
        StaticType::Flag => target == ScalarType::Flag,
        StaticType::Void | StaticType::Multi(_) | StaticType::Row(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_promotion() {
        assert_eq!(
            binary_type(BinOp::Add, StaticType::Hp, StaticType::Hp),
            Ok(StaticType::Hp)
        );
        assert_eq!(
            binary_type(BinOp::Div, StaticType::Hp, StaticType::Xp),
            Ok(StaticType::Xp)
        );
        assert_eq!(
            binary_type(BinOp::Pow, StaticType::Hp, StaticType::Hp),
            Ok(StaticType::Numeric)
        );
        assert!(binary_type(BinOp::Mod, StaticType::Xp, StaticType::Hp).is_err());
    }

    #[test]
    fn test_comms_rules() {
        assert_eq!(
            binary_type(BinOp::Add, StaticType::Comms, StaticType::Comms),
            Ok(StaticType::Comms)
        );
        assert!(binary_type(BinOp::Sub, StaticType::Comms, StaticType::Comms).is_err());
        assert!(binary_type(BinOp::Lt, StaticType::Comms, StaticType::Comms).is_err());
        assert!(binary_type(BinOp::Add, StaticType::Comms, StaticType::Hp).is_err());
        assert_eq!(
            binary_type(BinOp::Ne, StaticType::Comms, StaticType::Comms),
            Ok(StaticType::Flag)
        );
    }

    #[test]
    fn test_unknown_defers_checks() {
        assert_eq!(
            binary_type(BinOp::Mul, StaticType::Unknown, StaticType::Xp),
            Ok(StaticType::Unknown)
        );
        assert_eq!(
            binary_type(BinOp::Lt, StaticType::Unknown, StaticType::Comms),
            Ok(StaticType::Flag)
        );
    }

    #[test]
    fn test_dead_operand_is_rejected() {
        assert!(binary_type(BinOp::Add, StaticType::Dead, StaticType::Hp).is_err());
        assert!(unary_type(UnOp::Not, StaticType::Dead).is_err());
    }

    #[test]
    fn test_assignability() {
        assert!(assignable(ScalarType::Xp, StaticType::Hp));
        assert!(!assignable(ScalarType::Hp, StaticType::Xp));
        assert!(assignable(ScalarType::Hp, StaticType::Numeric));
        assert!(!assignable(ScalarType::Flag, StaticType::Comms));
        assert!(!assignable(ScalarType::Hp, StaticType::Multi(2)));
    }
}
