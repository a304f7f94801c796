//! Built-in functions
//!
//! Array built-ins (`join`, `drop`, `seek`, `rounds`), the scalar
//! conversions and the `.Nf` display suffix. Input (`load`, `loadNum`) lives
//! in [`super::input`] and output (`shoot`) with the other statements.

use crate::environment::value::format_fixed;
use crate::environment::{ArrayElements, NumericHint, Value};
use crate::interpreter::engine::Interpreter;
use crate::interpreter::errors::RuntimeError;
use crate::interpreter::jumps::values_equal;
use crate::interpreter::ops::access::placeholder_for;
use crate::parser::ast::*;

/// What `drop` removed
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Dropped {
    Value(Value),
    Row(Vec<Value>),
}

/// Optionally signed run of digits
fn is_integer_text(text: &str) -> bool {
    let digits = text.strip_prefix(['+', '-']).unwrap_or(text);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

/// Optionally signed decimal: digits with at most one interior or leading point
pub(crate) fn is_decimal_text(text: &str) -> bool {
    let body = text.strip_prefix(['+', '-']).unwrap_or(text);
    let (whole, fraction) = match body.split_once('.') {
        Some((whole, fraction)) => (whole, Some(fraction)),
        None => (body, None),
    };
    let all_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    match fraction {
        None => !whole.is_empty() && all_digits(whole),
        Some(fraction) => !fraction.is_empty() && all_digits(whole) && all_digits(fraction),
    }
}

impl Interpreter<'_> {
    /// `arr.join(v)`, `m.join([..])`, `m[i].join(v)`
    pub(crate) fn execute_join(
        &mut self,
        array: &ArrayRef,
        value: &JoinValue,
        span: SourceSpan,
    ) -> Result<(), RuntimeError> {
        let row = self.evaluate_row_selector(array)?;
        let values = match value {
            JoinValue::Scalar(expr) => vec![self.evaluate_expr(expr)?],
            JoinValue::Row(exprs) => exprs
                .iter()
                .map(|expr| self.evaluate_expr(expr))
                .collect::<Result<Vec<_>, _>>()?,
        };

        let binding = self.array_binding(&array.name, span)?;
        if binding.immutable {
            return Err(RuntimeError::Immutable {
                name: array.name.clone(),
                span,
            });
        }
        let element_type = binding.element_type;
        let len = Self::live_elements(binding, &array.name, span)?.len();
        let row = match &row {
            Some(index) => match self.resolve_index(index, len, span)? {
                Some(row) => Some(row),
                // unknown row during the dry pass
                None => return Ok(()),
            },
            None => None,
        };
        let values = values
            .into_iter()
            .map(|v| self.coerce_value(element_type, v, span))
            .collect::<Result<Vec<_>, _>>()?;

        let elements = self
            .array_binding_mut(&array.name, span)?
            .elements
            .as_mut()
            .ok_or_else(|| RuntimeError::dead(format!("array '{}' is dead", array.name), span))?;

        match (elements, row, value) {
            (ArrayElements::Flat(items), None, JoinValue::Scalar(_)) => items.extend(values),
            (ArrayElements::Nested(rows), None, JoinValue::Row(_)) => rows.push(values),
            (ArrayElements::Nested(rows), Some(row), JoinValue::Scalar(_)) => {
                rows[row].extend(values)
            }
            _ => {
                return Err(RuntimeError::DimensionMismatch {
                    message: format!("join does not match the shape of array '{}'", array.name),
                    span,
                })
            }
        }
        Ok(())
    }

    /// `arr.drop()`, `arr.drop(i)`, `m.drop()`, `m[i].drop()`
    pub(crate) fn evaluate_drop(
        &mut self,
        array: &ArrayRef,
        index: Option<&Expr>,
        span: SourceSpan,
    ) -> Result<Dropped, RuntimeError> {
        let row = self.evaluate_row_selector(array)?;
        let index = index.map(|expr| self.evaluate_expr(expr)).transpose()?;

        let binding = self.array_binding(&array.name, span)?;
        if binding.immutable {
            return Err(RuntimeError::Immutable {
                name: array.name.clone(),
                span,
            });
        }
        let placeholder = placeholder_for(binding.element_type);
        let elements = Self::live_elements(binding, &array.name, span)?;

        // length of the sequence being dropped from
        let (row, len) = match (elements, &row) {
            (ArrayElements::Nested(rows), Some(selector)) => {
                match self.resolve_index(selector, rows.len(), span)? {
                    Some(r) => (Some(r), rows[r].len()),
                    None => return Ok(Dropped::Value(placeholder)),
                }
            }
            (ArrayElements::Flat(_), Some(_)) => {
                return Err(RuntimeError::DimensionMismatch {
                    message: format!("array '{}' has no rows", array.name),
                    span,
                })
            }
            (elements, None) => (None, elements.len()),
        };
        let grid = matches!(elements, ArrayElements::Nested(_)) && row.is_none();

        if len == 0 {
            return Err(RuntimeError::EmptyArray {
                name: array.name.clone(),
                span,
            });
        }
        let position = match &index {
            Some(index) => match self.resolve_index(index, len, span)? {
                Some(position) => position,
                None if grid => return Ok(Dropped::Row(Vec::new())),
                None => return Ok(Dropped::Value(placeholder)),
            },
            None => len - 1,
        };

        let elements = self
            .array_binding_mut(&array.name, span)?
            .elements
            .as_mut()
            .ok_or_else(|| RuntimeError::dead(format!("array '{}' is dead", array.name), span))?;

        Ok(match (elements, row) {
            (ArrayElements::Flat(items), _) => Dropped::Value(items.remove(position)),
            (ArrayElements::Nested(rows), Some(row)) => {
                Dropped::Value(rows[row].remove(position))
            }
            (ArrayElements::Nested(rows), None) => Dropped::Row(rows.remove(position)),
        })
    }

    /// `arr.seek(v)`, `m.seek([..])`, `m[i].seek(v)`: first matching index or -1
    pub(crate) fn evaluate_seek(
        &mut self,
        array: &ArrayRef,
        needle: &SeekNeedle,
        span: SourceSpan,
    ) -> Result<Value, RuntimeError> {
        let row = self.evaluate_row_selector(array)?;
        let needle = match needle {
            SeekNeedle::Value(expr) => vec![self.evaluate_expr(expr)?],
            SeekNeedle::Row(exprs) => exprs
                .iter()
                .map(|expr| self.evaluate_expr(expr))
                .collect::<Result<Vec<_>, _>>()?,
        };
        if needle.iter().any(Value::is_pending) {
            return Ok(Value::Pending(NumericHint::Hp));
        }
        if needle.iter().any(Value::is_dead) {
            return Err(RuntimeError::dead("cannot seek a dead value", span));
        }

        let binding = self.array_binding(&array.name, span)?;
        let elements = Self::live_elements(binding, &array.name, span)?;

        let position = match (elements, &row, needle.as_slice()) {
            (ArrayElements::Flat(items), None, [value]) => {
                items.iter().position(|item| values_equal(item, value))
            }
            (ArrayElements::Nested(rows), Some(selector), [value]) => {
                match self.resolve_index(selector, rows.len(), span)? {
                    Some(r) => rows[r].iter().position(|item| values_equal(item, value)),
                    None => return Ok(Value::Pending(NumericHint::Hp)),
                }
            }
            (ArrayElements::Nested(rows), None, _) => rows.iter().position(|candidate| {
                candidate.len() == needle.len()
                    && candidate.iter().zip(&needle).all(|(a, b)| values_equal(a, b))
            }),
            _ => {
                return Err(RuntimeError::DimensionMismatch {
                    message: format!("seek does not match the shape of array '{}'", array.name),
                    span,
                })
            }
        };

        Ok(Value::Hp(position.map_or(-1, |p| p as i64)))
    }

    /// `rounds(x)`: length of a comms value, an array, or one row
    pub(crate) fn evaluate_rounds(
        &mut self,
        target: &RoundsTarget,
        span: SourceSpan,
    ) -> Result<Value, RuntimeError> {
        match target {
            RoundsTarget::Value(expr) => match self.evaluate_expr(expr)? {
                Value::Comms(text) => Ok(Value::Hp(text.chars().count() as i64)),
                Value::Dead => Err(RuntimeError::dead("'rounds' of a dead value", span)),
                other => Err(RuntimeError::type_mismatch(
                    format!("'rounds' needs comms or an array, found {}", other.type_name()),
                    span,
                )),
            },
            RoundsTarget::Array(array) => {
                let row = self.evaluate_row_selector(array)?;
                let binding = self.array_binding(&array.name, span)?;
                let elements = Self::live_elements(binding, &array.name, span)?;
                match (elements, &row) {
                    (elements, None) => Ok(Value::Hp(elements.len() as i64)),
                    (ArrayElements::Nested(rows), Some(selector)) => {
                        match self.resolve_index(selector, rows.len(), span)? {
                            Some(r) => Ok(Value::Hp(rows[r].len() as i64)),
                            None => Ok(Value::Pending(NumericHint::Hp)),
                        }
                    }
                    (ArrayElements::Flat(_), Some(_)) => Err(RuntimeError::DimensionMismatch {
                        message: format!("array '{}' has no rows", array.name),
                        span,
                    }),
                }
            }
        }
    }

    /// `toHp`, `toXp`, `toComms`, `levelUp`, `levelDown`
    pub(crate) fn evaluate_conversion(
        &self,
        conversion: Conversion,
        value: Value,
        span: SourceSpan,
    ) -> Result<Value, RuntimeError> {
        if value.is_dead() {
            return Err(RuntimeError::type_mismatch(
                format!("'{}' cannot convert a dead value", conversion.name()),
                span,
            ));
        }

        let unconvertible = |text: &str, target: &str| -> Result<Value, RuntimeError> {
            if self.is_live() {
                Err(RuntimeError::Conversion {
                    message: format!("cannot convert \"{}\" to {}", text, target),
                    span,
                })
            } else {
                // input-derived text is not known during the dry pass
                Ok(Value::Pending(if target == "hp" {
                    NumericHint::Hp
                } else {
                    NumericHint::Xp
                }))
            }
        };

        match (conversion, value) {
            (Conversion::ToHp, Value::Hp(n)) => Ok(Value::Hp(n)),
            (Conversion::ToHp, Value::Xp(x)) => {
                let truncated = x.trunc();
                if !truncated.is_finite() || truncated < i64::MIN as f64 || truncated >= i64::MAX as f64 {
                    return Err(RuntimeError::Overflow {
                        operation: format!("toHp({})", x),
                        span,
                    });
                }
                Ok(Value::Hp(truncated as i64))
            }
            (Conversion::ToHp, Value::Flag(b)) => Ok(Value::Hp(i64::from(b))),
            (Conversion::ToHp, Value::Comms(text)) => {
                if !is_integer_text(&text) {
                    return unconvertible(&text, "hp");
                }
                match text.parse::<i64>() {
                    Ok(n) => Ok(Value::Hp(n)),
                    Err(_) => Err(RuntimeError::Overflow {
                        operation: format!("toHp(\"{}\")", text),
                        span,
                    }),
                }
            }
            (Conversion::ToHp, Value::Pending(_)) => Ok(Value::Pending(NumericHint::Hp)),

            (Conversion::ToXp, Value::Hp(n)) => Ok(Value::Xp(n as f64)),
            (Conversion::ToXp, Value::Xp(x)) => Ok(Value::Xp(x)),
            (Conversion::ToXp, Value::Flag(b)) => Ok(Value::Xp(if b { 1.0 } else { 0.0 })),
            (Conversion::ToXp, Value::Comms(text)) => {
                if !is_decimal_text(&text) {
                    return unconvertible(&text, "xp");
                }
                text.parse::<f64>()
                    .map(Value::Xp)
                    .or_else(|_| unconvertible(&text, "xp"))
            }
            (Conversion::ToXp, Value::Pending(_)) => Ok(Value::Pending(NumericHint::Xp)),

            (Conversion::ToComms, Value::Pending(_)) => Ok(Value::Comms(String::new())),
            (Conversion::ToComms, value) => Ok(Value::Comms(value.to_string())),

            (Conversion::LevelUp, Value::Comms(text)) => Ok(Value::Comms(text.to_uppercase())),
            (Conversion::LevelDown, Value::Comms(text)) => Ok(Value::Comms(text.to_lowercase())),

            (conversion, other) => Err(RuntimeError::type_mismatch(
                format!("'{}' cannot convert {}", conversion.name(), other.type_name()),
                span,
            )),
        }
    }

    /// `expr.Nf`
    pub(crate) fn evaluate_format(
        value: Value,
        digits: usize,
        span: SourceSpan,
    ) -> Result<Value, RuntimeError> {
        match value {
            Value::Xp(x) => Ok(Value::Comms(format_fixed(x, digits))),
            Value::Hp(n) => Ok(Value::Comms(format_fixed(n as f64, digits))),
            Value::Pending(_) => Ok(Value::Comms(String::new())),
            Value::Dead => Err(RuntimeError::dead("cannot format a dead value", span)),
            other => Err(RuntimeError::type_mismatch(
                format!("'.{}f' needs xp, found {}", digits, other.type_name()),
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
    use pretty_assertions::assert_eq;

    fn span() -> SourceSpan {
        SourceSpan::point(SourceLocation::new(1, 1))
    }

    fn convert(mode: RunMode, conversion: Conversion, value: Value) -> Result<Value, RuntimeError> {
        let mut host = NullHost;
        let interp = Interpreter::new(&mut host, mode);
        interp.evaluate_conversion(conversion, value, span())
    }

    #[test]
    fn test_number_text_shapes() {
        assert!(is_integer_text("-42"));
        assert!(!is_integer_text("4.2"));
        assert!(!is_integer_text("+"));
        assert!(is_decimal_text("3.25"));
        assert!(is_decimal_text(".5"));
        assert!(!is_decimal_text("3."));
        assert!(!is_decimal_text("1e5"));
    }

    #[test]
    fn test_to_hp_rules() {
        let live = RunMode::Live;
        assert_eq!(convert(live, Conversion::ToHp, Value::Xp(-2.9)), Ok(Value::Hp(-2)));
        assert_eq!(convert(live, Conversion::ToHp, Value::Flag(true)), Ok(Value::Hp(1)));
        assert_eq!(
            convert(live, Conversion::ToHp, Value::Comms("-17".into())),
            Ok(Value::Hp(-17))
        );
        assert!(matches!(
            convert(live, Conversion::ToHp, Value::Comms("12a".into())),
            Err(RuntimeError::Conversion { .. })
        ));
        assert!(matches!(
            convert(live, Conversion::ToHp, Value::Dead),
            Err(RuntimeError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_unknown_text_is_pending_in_dry_pass() {
        assert_eq!(
            convert(RunMode::Dry, Conversion::ToHp, Value::Comms(String::new())),
            Ok(Value::Pending(NumericHint::Hp))
        );
        assert_eq!(
            convert(RunMode::Dry, Conversion::ToXp, Value::Comms("x".into())),
            Ok(Value::Pending(NumericHint::Xp))
        );
    }

    #[test]
    fn test_case_and_text_conversions() {
        let live = RunMode::Live;
        assert_eq!(
            convert(live, Conversion::LevelUp, Value::Comms("gg".into())),
            Ok(Value::Comms("GG".into()))
        );
        assert_eq!(
            convert(live, Conversion::ToComms, Value::Xp(2.0)),
            Ok(Value::Comms("2.0".into()))
        );
        assert!(convert(live, Conversion::LevelDown, Value::Hp(1)).is_err());
    }

    #[test]
    fn test_format_suffix() {
        assert_eq!(
            Interpreter::evaluate_format(Value::Xp(3.14159), 2, span()),
            Ok(Value::Comms("3.14".into()))
        );
        assert!(Interpreter::evaluate_format(Value::Flag(true), 1, span()).is_err());
    }
}
