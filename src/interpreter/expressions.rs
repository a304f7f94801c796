//! Expression evaluation implementation
//!
//! This module handles evaluation of every Respawn expression form:
//!
//! - Literals (`hp`, `xp`, `comms`, `flag`, `dead`)
//! - Variables, indexing (arrays and comms characters) and struct fields
//! - Unary, binary and chained relational operators
//! - Function calls used as values
//! - Built-ins that produce a value (`rounds`, `seek`, `drop`, conversions,
//!   the `.Nf` display suffix)
//!
//! # Safety
//!
//! All `hp` arithmetic uses checked math and reports overflow as a runtime
//! error rather than wrapping.

use crate::environment::Value;
use crate::interpreter::builtins::Dropped;
use crate::interpreter::engine::Interpreter;
use crate::interpreter::errors::RuntimeError;
use crate::parser::ast::*;

impl Interpreter<'_> {
    /// Evaluate an expression and return its value
    pub(crate) fn evaluate_expr(&mut self, expr: &Expr) -> Result<Value, RuntimeError> {
        match expr {
            Expr::HpLiteral(n, _) => Ok(Value::Hp(*n)),
            Expr::XpLiteral(x, _) => Ok(Value::Xp(*x)),
            Expr::CommsLiteral(s, _) => Ok(Value::Comms(s.clone())),
            Expr::FlagLiteral(b, _) => Ok(Value::Flag(*b)),
            Expr::Dead(_) => Ok(Value::Dead),

            Expr::Variable { name, span } => self.read_variable(name, *span),

            Expr::Index {
                name,
                indices,
                span,
            } => self.read_index(name, indices, *span),

            Expr::Field {
                instance,
                field,
                span,
            } => self.read_field(instance, field, *span),

            Expr::Unary { op, operand, span } => {
                let value = self.evaluate_expr(operand)?;
                self.evaluate_unary_op(*op, value, *span)
            }

            Expr::Binary {
                op,
                left,
                right,
                span,
            } => {
                // both sides are always evaluated; AND/OR do not short-circuit
                let left_val = self.evaluate_expr(left)?;
                let right_val = self.evaluate_expr(right)?;
                self.evaluate_binary_op(*op, &left_val, &right_val, *span)
            }

            Expr::Chain {
                operands,
                ops,
                span,
            } => self.evaluate_chain(operands, ops, *span),

            Expr::Call { name, args, span } => self.evaluate_call_value(name, args, *span),

            Expr::Convert {
                conversion,
                operand,
                span,
            } => {
                let value = self.evaluate_expr(operand)?;
                self.evaluate_conversion(*conversion, value, *span)
            }

            Expr::Format {
                operand,
                digits,
                span,
            } => {
                let value = self.evaluate_expr(operand)?;
                Self::evaluate_format(value, *digits, *span)
            }

            Expr::Rounds { target, span } => self.evaluate_rounds(target, *span),

            Expr::Seek {
                array,
                needle,
                span,
            } => self.evaluate_seek(array, needle, *span),

            Expr::Drop { array, index, span } => {
                match self.evaluate_drop(array, index.as_deref(), *span)? {
                    Dropped::Value(value) => Ok(value),
                    Dropped::Row(_) => Err(RuntimeError::type_mismatch(
                        "a dropped row can only initialize an array",
                        *span,
                    )),
                }
            }
        }
    }

    /// `a < b <= c`: each operand is evaluated once, then every adjacent
    /// pair is compared
    fn evaluate_chain(
        &mut self,
        operands: &[Expr],
        ops: &[BinOp],
        span: SourceSpan,
    ) -> Result<Value, RuntimeError> {
        let values = operands
            .iter()
            .map(|operand| self.evaluate_expr(operand))
            .collect::<Result<Vec<_>, _>>()?;

        let mut holds = true;
        for (op, pair) in ops.iter().zip(values.windows(2)) {
            let result = self.evaluate_binary_op(*op, &pair[0], &pair[1], span)?;
            holds &= Self::value_to_flag(&result, span)?;
        }
        Ok(Value::Flag(holds))
    }

    /// A call used as a value must recall exactly one value
    fn evaluate_call_value(
        &mut self,
        name: &str,
        args: &[Expr],
        span: SourceSpan,
    ) -> Result<Value, RuntimeError> {
        let mut values = self.call_function(name, args, span)?;
        if values.len() != 1 {
            return Err(RuntimeError::RecallArity {
                message: format!(
                    "function '{}' recalled {} value(s) where exactly one is needed",
                    name,
                    values.len()
                ),
                span,
            });
        }
        Ok(values.remove(0))
    }

    /// Evaluate a statement-level expression for its effect
    pub(crate) fn execute_expression_statement(&mut self, expr: &Expr) -> Result<(), RuntimeError> {
        match expr {
            Expr::Call { name, args, span } => {
                self.call_function(name, args, *span)?;
            }
            Expr::Drop { array, index, span } => {
                self.evaluate_drop(array, index.as_deref(), *span)?;
            }
            other => {
                self.evaluate_expr(other)?;
            }
        }
        Ok(())
    }

    /// All values of a declaration's right-hand side; only a call can
    /// produce more than one
    pub(crate) fn evaluate_rhs_values(&mut self, rhs: &Rhs) -> Result<Vec<Value>, RuntimeError> {
        match rhs {
            Rhs::Expr(Expr::Call { name, args, span }) => self.call_function(name, args, *span),
            other => Ok(vec![self.evaluate_rhs(other)?]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::NullHost;
    use crate::interpreter::engine::RunMode;
    use pretty_assertions::assert_eq;

    fn span() -> SourceSpan {
        SourceSpan::point(SourceLocation::new(1, 1))
    }

    fn hp(n: i64) -> Expr {
        Expr::HpLiteral(n, span())
    }

    fn chain(values: [i64; 3], ops: [BinOp; 2]) -> Expr {
        Expr::Chain {
            operands: values.into_iter().map(hp).collect(),
            ops: ops.to_vec(),
            span: span(),
        }
    }

    #[test]
    fn test_chained_relational_is_pairwise() {
        let mut host = NullHost;
        let mut interp = Interpreter::new(&mut host, RunMode::Live);

        let rising = chain([1, 2, 3], [BinOp::Lt, BinOp::Lt]);
        assert_eq!(interp.evaluate_expr(&rising), Ok(Value::Flag(true)));

        let falling = chain([3, 2, 1], [BinOp::Lt, BinOp::Lt]);
        assert_eq!(interp.evaluate_expr(&falling), Ok(Value::Flag(false)));

        // 3 > 2 holds, 2 < 5 holds; no transitive 3 < 5 involved
        let mixed = chain([3, 2, 5], [BinOp::Gt, BinOp::Lt]);
        assert_eq!(interp.evaluate_expr(&mixed), Ok(Value::Flag(true)));
    }

    #[test]
    fn test_logical_operators_evaluate_both_sides() {
        let mut host = NullHost;
        let mut interp = Interpreter::new(&mut host, RunMode::Live);

        let expr = Expr::Binary {
            op: BinOp::Or,
            left: Box::new(Expr::FlagLiteral(true, span())),
            right: Box::new(Expr::Binary {
                op: BinOp::Div,
                left: Box::new(hp(1)),
                right: Box::new(hp(0)),
                span: span(),
            }),
            span: span(),
        };
        assert!(matches!(
            interp.evaluate_expr(&expr),
            Err(RuntimeError::DivisionByZero { .. })
        ));
    }
}
