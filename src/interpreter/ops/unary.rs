use crate::environment::Value;
use crate::interpreter::engine::Interpreter;
use crate::interpreter::errors::RuntimeError;
use crate::parser::ast::{SourceSpan, UnOp};

impl Interpreter<'_> {
    pub(crate) fn evaluate_unary_op(
        &self,
        op: UnOp,
        value: Value,
        span: SourceSpan,
    ) -> Result<Value, RuntimeError> {
        match (op, value) {
            (_, Value::Dead) => Err(RuntimeError::dead("dead value used as an operand", span)),

            (UnOp::Neg, Value::Hp(n)) => {
                n.checked_neg()
                    .map(Value::Hp)
                    .ok_or_else(|| RuntimeError::Overflow {
                        operation: format!("-{}", n),
                        span,
                    })
            }
            (UnOp::Neg, Value::Xp(x)) => Ok(Value::Xp(-x)),
            (UnOp::Neg, pending @ Value::Pending(_)) => Ok(pending),

            (UnOp::Not, Value::Flag(b)) => Ok(Value::Flag(!b)),

            (UnOp::Neg, other) => Err(RuntimeError::type_mismatch(
                format!("cannot negate {}", other.type_name()),
                span,
            )),
            (UnOp::Not, other) => Err(RuntimeError::type_mismatch(
                format!("'!' requires flag, found {}", other.type_name()),
                span,
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::NullHost;
    use crate::interpreter::engine::RunMode;
    use crate::parser::ast::SourceLocation;

    #[test]
    fn test_unary_operators() {
        let mut host = NullHost;
        let interp = Interpreter::new(&mut host, RunMode::Live);
        let span = SourceSpan::point(SourceLocation::new(1, 1));

        assert_eq!(
            interp.evaluate_unary_op(UnOp::Neg, Value::Hp(4), span),
            Ok(Value::Hp(-4))
        );
        assert_eq!(
            interp.evaluate_unary_op(UnOp::Not, Value::Flag(false), span),
            Ok(Value::Flag(true))
        );
        assert!(interp
            .evaluate_unary_op(UnOp::Neg, Value::Hp(i64::MIN), span)
            .is_err());
        assert!(interp
            .evaluate_unary_op(UnOp::Not, Value::Comms("x".into()), span)
            .is_err());
    }
}
