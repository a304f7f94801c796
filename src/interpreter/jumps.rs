//! Branching and calls: `flank`, `recall` and user function calls

use crate::environment::{Binding, Function, Value, Variable};
use crate::interpreter::engine::{ControlFlow, Interpreter, MAX_CALL_DEPTH};
use crate::interpreter::errors::RuntimeError;
use crate::parser::ast::{ChoiceArm, Expr, Param, SourceSpan, Stmt};
use std::rc::Rc;

/// Equality used by `flank` and `seek`; values of different kinds never match
pub(crate) fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Hp(x), Value::Hp(y)) => x == y,
        (Value::Comms(x), Value::Comms(y)) => x == y,
        (Value::Flag(x), Value::Flag(y)) => x == y,
        (x, y) if x.is_numeric() && y.is_numeric() => x.as_f64() == y.as_f64(),
        _ => false,
    }
}

impl Interpreter<'_> {
    /// Run the first arm whose choice list contains the subject, else `backup`
    ///
    /// Arms do not fall through, and `checkpoint` inside an arm is left for
    /// the enclosing loop.
    pub(crate) fn execute_flank(
        &mut self,
        subject: &Expr,
        arms: &[ChoiceArm],
        backup: &[Stmt],
    ) -> Result<ControlFlow, RuntimeError> {
        let subject_value = self.evaluate_expr(subject)?;
        if subject_value.is_dead() {
            return Err(RuntimeError::dead("flank subject is dead", subject.span()));
        }

        for arm in arms {
            for choice in &arm.values {
                let choice_value = self.evaluate_expr(choice)?;
                if values_equal(&subject_value, &choice_value) {
                    return self.execute_scoped("choice", &arm.body);
                }
            }
        }
        self.execute_scoped("backup", backup)
    }

    pub(crate) fn execute_recall(&mut self, values: &[Expr]) -> Result<ControlFlow, RuntimeError> {
        let values = values
            .iter()
            .map(|expr| self.evaluate_expr(expr))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ControlFlow::Return(values))
    }

    /// Bind a function definition in the current (global) frame
    pub(crate) fn define_function(
        &mut self,
        name: &str,
        params: &[Param],
        body: &Rc<Vec<Stmt>>,
        span: SourceSpan,
    ) -> Result<(), RuntimeError> {
        let function = Function {
            params: params.to_vec(),
            body: Rc::clone(body),
            arity: None,
        };
        self.declare(name, Binding::Function(function), span)
    }

    /// Call a user function and collect the values of its `recall`
    ///
    /// Arguments are evaluated in the caller's scope. The callee then runs on
    /// a stack holding only the global frame and its own frame; defaults of
    /// omitted parameters are evaluated there, after the earlier parameters
    /// are bound.
    pub(crate) fn call_function(
        &mut self,
        name: &str,
        args: &[Expr],
        span: SourceSpan,
    ) -> Result<Vec<Value>, RuntimeError> {
        let function = match self.lookup(name, span)? {
            Binding::Function(function) => function.clone(),
            other => {
                return Err(RuntimeError::type_mismatch(
                    format!("'{}' is a {}, not a function", name, other.kind_name()),
                    span,
                ))
            }
        };

        let required = function.required_params();
        let total = function.params.len();
        if args.len() < required || args.len() > total {
            return Err(RuntimeError::ArgumentCount {
                function: name.to_string(),
                expected: if required == total {
                    total.to_string()
                } else {
                    format!("{} to {}", required, total)
                },
                found: args.len(),
                span,
            });
        }

        if self.call_depth >= MAX_CALL_DEPTH {
            return Err(RuntimeError::CallDepth {
                limit: MAX_CALL_DEPTH,
                span,
            });
        }

        let arg_values = args
            .iter()
            .map(|arg| self.evaluate_expr(arg))
            .collect::<Result<Vec<_>, _>>()?;

        tracing::trace!(function = name, args = arg_values.len(), "call");
        let saved = self.env.enter_function(name);
        self.call_depth += 1;
        let result = self.run_function_body(&function, arg_values, span);
        self.call_depth -= 1;
        self.env.exit_function(saved);

        result
    }

    fn run_function_body(
        &mut self,
        function: &Function,
        mut arg_values: Vec<Value>,
        span: SourceSpan,
    ) -> Result<Vec<Value>, RuntimeError> {
        arg_values.reverse();
        for param in &function.params {
            let value = match (arg_values.pop(), &param.default) {
                (Some(value), _) => value,
                (None, Some(default)) => self.evaluate_expr(default)?,
                (None, None) => Value::Dead,
            };
            let var = Variable::new(Self::param_type_for(&value), value, false);
            self.declare(&param.name, Binding::Variable(var), span)?;
        }

        match self.execute_block(&function.body)? {
            ControlFlow::Return(values) => Ok(values),
            _ => Ok(Vec::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::NumericHint;

    #[test]
    fn test_values_equal_across_kinds() {
        assert!(values_equal(&Value::Hp(2), &Value::Xp(2.0)));
        assert!(values_equal(
            &Value::Comms("gg".into()),
            &Value::Comms("gg".into())
        ));
        assert!(!values_equal(&Value::Hp(1), &Value::Flag(true)));
        assert!(!values_equal(&Value::Comms("1".into()), &Value::Hp(1)));
        assert!(values_equal(&Value::Pending(NumericHint::Any), &Value::Hp(0)));
    }
}
