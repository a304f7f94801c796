//! Runtime type compatibility
//!
//! The parser already rejects every mismatch it can see statically. What is
//! left for the runtime are values that were unknown during parsing: results
//! of user functions, untyped parameters, and the pending values of the dry
//! pass.
//!
//! # Storage Rules
//!
//! - An `xp` slot promotes an `hp` value; an `hp` slot rejects `xp`
//! - A pending value narrows to the slot's numeric type
//! - `dead` may be stored anywhere that is not immutable

use crate::environment::{NumericHint, Value, VarType};
use crate::interpreter::engine::Interpreter;
use crate::interpreter::errors::RuntimeError;
use crate::parser::ast::{ScalarType, SourceSpan};

impl Interpreter<'_> {
    /// Convert `value` for storage in a slot of type `target`
    pub(crate) fn coerce_value(
        &self,
        target: ScalarType,
        value: Value,
        span: SourceSpan,
    ) -> Result<Value, RuntimeError> {
        let mismatch = |found: &Value| {
            RuntimeError::type_mismatch(
                format!("cannot store {} in a {} slot", found.type_name(), target),
                span,
            )
        };

        match (target, value) {
            (_, Value::Dead) => Ok(Value::Dead),

            (ScalarType::Hp, Value::Hp(n)) => Ok(Value::Hp(n)),
            (ScalarType::Xp, Value::Xp(x)) => Ok(Value::Xp(x)),
            (ScalarType::Xp, Value::Hp(n)) => Ok(Value::Xp(n as f64)),
            (ScalarType::Comms, Value::Comms(s)) => Ok(Value::Comms(s)),
            (ScalarType::Flag, Value::Flag(b)) => Ok(Value::Flag(b)),

            (ScalarType::Hp, Value::Pending(hint)) => match hint.unify(NumericHint::Hp) {
                Some(narrowed) => Ok(Value::Pending(narrowed)),
                None => Err(mismatch(&Value::Pending(hint))),
            },
            (ScalarType::Xp, Value::Pending(_)) => Ok(Value::Pending(NumericHint::Xp)),

            (_, other) => Err(mismatch(&other)),
        }
    }

    /// Convert `value` for storage in a variable of declared type `var_type`
    pub(crate) fn coerce_for_variable(
        &self,
        var_type: VarType,
        value: Value,
        span: SourceSpan,
    ) -> Result<Value, RuntimeError> {
        match var_type {
            VarType::Scalar(ty) => self.coerce_value(ty, value, span),
            VarType::Numeric if value.is_numeric() || value.is_dead() => Ok(value),
            VarType::Numeric => Err(RuntimeError::type_mismatch(
                format!("cannot store {} in a numeric slot", value.type_name()),
                span,
            )),
            VarType::Untyped => Ok(value),
        }
    }

    /// Declared type for a parameter, taken from the value it receives
    pub(crate) fn param_type_for(value: &Value) -> VarType {
        match value {
            Value::Pending(_) => VarType::Numeric,
            other => other
                .scalar_type()
                .map(VarType::Scalar)
                .unwrap_or(VarType::Untyped),
        }
    }

    /// Truth value of a condition
    pub(crate) fn value_to_flag(value: &Value, span: SourceSpan) -> Result<bool, RuntimeError> {
        match value {
            Value::Flag(b) => Ok(*b),
            Value::Dead => Err(RuntimeError::dead("condition is dead", span)),
            other => Err(RuntimeError::type_mismatch(
                format!("condition must be flag, found {}", other.type_name()),
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
    use pretty_assertions::assert_eq;

    fn span() -> SourceSpan {
        SourceSpan::point(SourceLocation::new(1, 1))
    }

    #[test]
    fn test_hp_promotes_into_xp() {
        let mut host = NullHost;
        let interp = Interpreter::new(&mut host, RunMode::Live);
        assert_eq!(
            interp.coerce_value(ScalarType::Xp, Value::Hp(3), span()),
            Ok(Value::Xp(3.0))
        );
        assert!(matches!(
            interp.coerce_value(ScalarType::Hp, Value::Xp(3.5), span()),
            Err(RuntimeError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_pending_narrows_to_slot() {
        let mut host = NullHost;
        let interp = Interpreter::new(&mut host, RunMode::Dry);
        assert_eq!(
            interp.coerce_value(ScalarType::Hp, Value::Pending(NumericHint::Any), span()),
            Ok(Value::Pending(NumericHint::Hp))
        );
        assert!(interp
            .coerce_value(ScalarType::Hp, Value::Pending(NumericHint::Xp), span())
            .is_err());
        assert!(interp
            .coerce_value(ScalarType::Comms, Value::Pending(NumericHint::Any), span())
            .is_err());
    }

    #[test]
    fn test_condition_requires_flag() {
        assert_eq!(Interpreter::value_to_flag(&Value::Flag(true), span()), Ok(true));
        assert!(matches!(
            Interpreter::value_to_flag(&Value::Hp(1), span()),
            Err(RuntimeError::TypeMismatch { .. })
        ));
        assert!(matches!(
            Interpreter::value_to_flag(&Value::Dead, span()),
            Err(RuntimeError::DeadValue { .. })
        ));
    }
}
