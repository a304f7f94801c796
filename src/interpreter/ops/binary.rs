use crate::environment::{NumericHint, Value};
use crate::interpreter::engine::Interpreter;
use crate::interpreter::errors::RuntimeError;
use crate::parser::ast::{BinOp, SourceSpan};
use std::cmp::Ordering;

/// Numeric kind of an operand, pending values included
#[derive(Clone, Copy, PartialEq, Eq)]
enum NumKind {
    Hp,
    Xp,
    Unknown,
}

fn num_kind(value: &Value) -> Option<NumKind> {
    match value {
        Value::Hp(_) | Value::Pending(NumericHint::Hp) => Some(NumKind::Hp),
        Value::Xp(_) | Value::Pending(NumericHint::Xp) => Some(NumKind::Xp),
        Value::Pending(NumericHint::Any) => Some(NumKind::Unknown),
        _ => None,
    }
}

impl Interpreter<'_> {
    /// Apply a binary operator to two evaluated operands
    pub(crate) fn evaluate_binary_op(
        &self,
        op: BinOp,
        left: &Value,
        right: &Value,
        span: SourceSpan,
    ) -> Result<Value, RuntimeError> {
        if left.is_dead() || right.is_dead() {
            return Err(RuntimeError::dead(
                format!("dead value used as an operand of '{}'", op.symbol()),
                span,
            ));
        }

        match op {
            BinOp::And | BinOp::Or => match (left, right) {
                (Value::Flag(a), Value::Flag(b)) => Ok(Value::Flag(if op == BinOp::And {
                    *a && *b
                } else {
                    *a || *b
                })),
                _ => Err(Self::operand_mismatch(op, left, right, span)),
            },

            _ if op.is_relational() => self.compare_values(op, left, right, span),

            _ => self.arithmetic(op, left, right, span),
        }
    }

    fn operand_mismatch(op: BinOp, left: &Value, right: &Value, span: SourceSpan) -> RuntimeError {
        RuntimeError::type_mismatch(
            format!(
                "'{}' cannot combine {} and {}",
                op.symbol(),
                left.type_name(),
                right.type_name()
            ),
            span,
        )
    }

    /// `== != < <= > >=`; pending operands compare as zero
    fn compare_values(
        &self,
        op: BinOp,
        left: &Value,
        right: &Value,
        span: SourceSpan,
    ) -> Result<Value, RuntimeError> {
        let ordering = match (left, right) {
            (Value::Hp(a), Value::Hp(b)) => a.partial_cmp(b),
            (l, r) if l.is_numeric() && r.is_numeric() => {
                let (a, b) = (l.as_f64().unwrap_or(0.0), r.as_f64().unwrap_or(0.0));
                a.partial_cmp(&b)
            }
            (Value::Comms(a), Value::Comms(b)) if op.is_equality() => a.partial_cmp(b),
            (Value::Flag(a), Value::Flag(b)) if op.is_equality() => a.partial_cmp(b),
            (Value::Comms(_), Value::Comms(_)) | (Value::Flag(_), Value::Flag(_)) => {
                return Err(RuntimeError::type_mismatch(
                    format!(
                        "'{}' is not defined for {}; only '==' and '!=' are",
                        op.symbol(),
                        left.type_name()
                    ),
                    span,
                ));
            }
            _ => return Err(Self::operand_mismatch(op, left, right, span)),
        };

        // NaN compares unequal to everything
        let result = match (op, ordering) {
            (BinOp::Ne, None) => true,
            (_, None) => false,
            (BinOp::Eq, Some(o)) => o == Ordering::Equal,
            (BinOp::Ne, Some(o)) => o != Ordering::Equal,
            (BinOp::Lt, Some(o)) => o == Ordering::Less,
            (BinOp::Le, Some(o)) => o != Ordering::Greater,
            (BinOp::Gt, Some(o)) => o == Ordering::Greater,
            (BinOp::Ge, Some(o)) => o != Ordering::Less,
            _ => false,
        };
        Ok(Value::Flag(result))
    }

    /// `+ - * / % ^`
    fn arithmetic(
        &self,
        op: BinOp,
        left: &Value,
        right: &Value,
        span: SourceSpan,
    ) -> Result<Value, RuntimeError> {
        if let (Value::Comms(a), Value::Comms(b)) = (left, right) {
            if op == BinOp::Add {
                return Ok(Value::Comms(format!("{}{}", a, b)));
            }
            return Err(RuntimeError::type_mismatch(
                format!("'{}' is not defined for comms", op.symbol()),
                span,
            ));
        }

        let (Some(lk), Some(rk)) = (num_kind(left), num_kind(right)) else {
            return Err(Self::operand_mismatch(op, left, right, span));
        };

        if op == BinOp::Mod && (lk == NumKind::Xp || rk == NumKind::Xp) {
            return Err(RuntimeError::type_mismatch(
                "'%' requires hp operands",
                span,
            ));
        }

        // a concrete zero divisor is an error even next to a pending dividend
        match (op, right) {
            (BinOp::Div, Value::Hp(0)) => return Err(RuntimeError::DivisionByZero { span }),
            (BinOp::Div, Value::Xp(x)) if *x == 0.0 => {
                return Err(RuntimeError::DivisionByZero { span })
            }
            (BinOp::Mod, Value::Hp(0)) => return Err(RuntimeError::ModuloByZero { span }),
            _ => {}
        }

        if left.is_pending() || right.is_pending() {
            return Ok(Value::Pending(Self::pending_result_hint(op, lk, rk)));
        }

        match (left, right) {
            (Value::Hp(a), Value::Hp(b)) => Self::hp_arithmetic(op, *a, *b, span),
            _ => {
                let (a, b) = (left.as_f64().unwrap_or(0.0), right.as_f64().unwrap_or(0.0));
                Self::xp_arithmetic(op, a, b, span)
            }
        }
    }

    /// What an arithmetic result with a pending operand will turn into
    fn pending_result_hint(op: BinOp, left: NumKind, right: NumKind) -> NumericHint {
        if left == NumKind::Xp || right == NumKind::Xp {
            return NumericHint::Xp;
        }
        match op {
            // hp ^ negative hp is xp
            BinOp::Pow => NumericHint::Any,
            BinOp::Mod => NumericHint::Hp,
            _ if left == NumKind::Unknown && right == NumKind::Unknown => NumericHint::Any,
            _ => NumericHint::Hp,
        }
    }

    fn hp_arithmetic(op: BinOp, a: i64, b: i64, span: SourceSpan) -> Result<Value, RuntimeError> {
        let overflow = || RuntimeError::Overflow {
            operation: format!("{} {} {}", a, op.symbol(), b),
            span,
        };

        let result = match op {
            BinOp::Add => a.checked_add(b),
            BinOp::Sub => a.checked_sub(b),
            BinOp::Mul => a.checked_mul(b),
            BinOp::Div => a.checked_div(b),
            BinOp::Mod => a.checked_rem(b),
            BinOp::Pow if b < 0 => {
                if a == 0 {
                    return Err(RuntimeError::DivisionByZero { span });
                }
                return Self::xp_arithmetic(BinOp::Pow, a as f64, b as f64, span);
            }
            BinOp::Pow => u32::try_from(b).ok().and_then(|exp| a.checked_pow(exp)),
            _ => None,
        };

        result.map(Value::Hp).ok_or_else(overflow)
    }

    fn xp_arithmetic(op: BinOp, a: f64, b: f64, span: SourceSpan) -> Result<Value, RuntimeError> {
        let result = match op {
            BinOp::Add => a + b,
            BinOp::Sub => a - b,
            BinOp::Mul => a * b,
            BinOp::Div => a / b,
            BinOp::Pow => a.powf(b),
            _ => {
                return Err(RuntimeError::type_mismatch(
                    format!("'{}' requires hp operands", op.symbol()),
                    span,
                ))
            }
        };

        if !result.is_finite() {
            return Err(RuntimeError::Overflow {
                operation: format!("{} {} {}", a, op.symbol(), b),
                span,
            });
        }
        Ok(Value::Xp(result))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::NullHost;
    use crate::interpreter::engine::RunMode;
    use crate::parser::ast::SourceLocation;
    use pretty_assertions::assert_eq;

    fn span() -> SourceSpan {
        SourceSpan::point(SourceLocation::new(1, 1))
    }

    fn eval(op: BinOp, left: Value, right: Value) -> Result<Value, RuntimeError> {
        let mut host = NullHost;
        let interp = Interpreter::new(&mut host, RunMode::Live);
        interp.evaluate_binary_op(op, &left, &right, span())
    }

    #[test]
    fn test_hp_division_truncates() {
        assert_eq!(eval(BinOp::Div, Value::Hp(7), Value::Hp(2)), Ok(Value::Hp(3)));
        assert_eq!(eval(BinOp::Div, Value::Hp(-7), Value::Hp(2)), Ok(Value::Hp(-3)));
    }

    #[test]
    fn test_xp_promotes() {
        assert_eq!(
            eval(BinOp::Add, Value::Hp(1), Value::Xp(0.5)),
            Ok(Value::Xp(1.5))
        );
        assert_eq!(
            eval(BinOp::Pow, Value::Hp(2), Value::Hp(-1)),
            Ok(Value::Xp(0.5))
        );
    }

    #[test]
    fn test_zero_divisors() {
        assert!(matches!(
            eval(BinOp::Div, Value::Hp(5), Value::Hp(0)),
            Err(RuntimeError::DivisionByZero { .. })
        ));
        assert!(matches!(
            eval(BinOp::Mod, Value::Hp(5), Value::Hp(0)),
            Err(RuntimeError::ModuloByZero { .. })
        ));
        assert!(matches!(
            eval(BinOp::Div, Value::Xp(5.0), Value::Xp(0.0)),
            Err(RuntimeError::DivisionByZero { .. })
        ));
        assert!(matches!(
            eval(BinOp::Mod, Value::Xp(5.0), Value::Hp(2)),
            Err(RuntimeError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_hp_overflow_is_reported() {
        assert!(matches!(
            eval(BinOp::Add, Value::Hp(i64::MAX), Value::Hp(1)),
            Err(RuntimeError::Overflow { .. })
        ));
    }

    #[test]
    fn test_comms_operators() {
        assert_eq!(
            eval(
                BinOp::Add,
                Value::Comms("re".into()),
                Value::Comms("spawn".into())
            ),
            Ok(Value::Comms("respawn".into()))
        );
        assert_eq!(
            eval(BinOp::Ne, Value::Comms("a".into()), Value::Comms("b".into())),
            Ok(Value::Flag(true))
        );
        assert!(eval(BinOp::Lt, Value::Comms("a".into()), Value::Comms("b".into())).is_err());
        assert!(eval(BinOp::Add, Value::Comms("a".into()), Value::Hp(1)).is_err());
    }

    #[test]
    fn test_dead_operand_is_rejected() {
        assert!(matches!(
            eval(BinOp::Add, Value::Dead, Value::Hp(1)),
            Err(RuntimeError::DeadValue { .. })
        ));
    }

    #[test]
    fn test_pending_operands() {
        let any = Value::Pending(NumericHint::Any);
        assert_eq!(eval(BinOp::Add, any.clone(), any.clone()), Ok(any.clone()));
        assert_eq!(
            eval(BinOp::Mul, any.clone(), Value::Xp(2.0)),
            Ok(Value::Pending(NumericHint::Xp))
        );
        assert_eq!(
            eval(BinOp::Sub, Value::Hp(1), any.clone()),
            Ok(Value::Pending(NumericHint::Hp))
        );
        // pending compares as zero
        assert_eq!(eval(BinOp::Lt, any.clone(), Value::Hp(1)), Ok(Value::Flag(true)));
        assert_eq!(eval(BinOp::Div, Value::Hp(1), any), Ok(Value::Pending(NumericHint::Hp)));
    }
}
