//! Reads through names: variables, array elements, comms characters and
//! struct fields
//!
//! Every index is checked for type (`hp`), bound and dimension count before
//! it is used. During the dry pass a pending index cannot be checked; the
//! read then yields a placeholder of the element's type instead.

use crate::environment::{ArrayBinding, ArrayElements, Binding, NumericHint, Value};
use crate::interpreter::engine::Interpreter;
use crate::interpreter::errors::RuntimeError;
use crate::parser::ast::{ArrayRef, Expr, ScalarType, SourceSpan};

/// Placeholder for an element whose index is not known yet
pub(crate) fn placeholder_for(ty: ScalarType) -> Value {
    match NumericHint::for_type(ty) {
        Some(hint) => Value::Pending(hint),
        None => Value::default_for(ty),
    }
}

impl Interpreter<'_> {
    pub(crate) fn read_variable(&self, name: &str, span: SourceSpan) -> Result<Value, RuntimeError> {
        match self.lookup(name, span)? {
            Binding::Variable(var) => Ok(var.value.clone()),
            other => Err(RuntimeError::type_mismatch(
                format!("'{}' is a {}, not a variable", name, other.kind_name()),
                span,
            )),
        }
    }

    /// Check an evaluated index against `len`; `None` for a pending index
    pub(crate) fn resolve_index(
        &self,
        index: &Value,
        len: usize,
        span: SourceSpan,
    ) -> Result<Option<usize>, RuntimeError> {
        match index {
            Value::Hp(i) => {
                if *i < 0 || *i as u64 >= len as u64 {
                    return Err(RuntimeError::IndexOutOfBounds {
                        index: *i,
                        len,
                        span,
                    });
                }
                Ok(Some(*i as usize))
            }
            Value::Pending(NumericHint::Any | NumericHint::Hp) => Ok(None),
            Value::Dead => Err(RuntimeError::dead("index is dead", span)),
            other => Err(RuntimeError::type_mismatch(
                format!("index must be hp, found {}", other.type_name()),
                span,
            )),
        }
    }

    pub(crate) fn evaluate_indices(&mut self, indices: &[Expr]) -> Result<Vec<Value>, RuntimeError> {
        indices.iter().map(|index| self.evaluate_expr(index)).collect()
    }

    /// The array bound to `name`
    pub(crate) fn array_binding(
        &self,
        name: &str,
        span: SourceSpan,
    ) -> Result<&ArrayBinding, RuntimeError> {
        match self.lookup(name, span)? {
            Binding::Array(array) => Ok(array),
            other => Err(RuntimeError::type_mismatch(
                format!("'{}' is a {}, not an array", name, other.kind_name()),
                span,
            )),
        }
    }

    pub(crate) fn array_binding_mut(
        &mut self,
        name: &str,
        span: SourceSpan,
    ) -> Result<&mut ArrayBinding, RuntimeError> {
        match self.lookup_mut(name, span)? {
            Binding::Array(array) => Ok(array),
            other => Err(RuntimeError::type_mismatch(
                format!("'{}' is a {}, not an array", name, other.kind_name()),
                span,
            )),
        }
    }

    /// Elements of a live array, or a dead-value error
    pub(crate) fn live_elements<'a>(
        array: &'a ArrayBinding,
        name: &str,
        span: SourceSpan,
    ) -> Result<&'a ArrayElements, RuntimeError> {
        array
            .elements
            .as_ref()
            .ok_or_else(|| RuntimeError::dead(format!("array '{}' is dead", name), span))
    }

    /// `a[i]`, `m[i][j]` or `s[i]`
    pub(crate) fn read_index(
        &mut self,
        name: &str,
        indices: &[Expr],
        span: SourceSpan,
    ) -> Result<Value, RuntimeError> {
        let index_values = self.evaluate_indices(indices)?;

        if let Binding::Variable(_) = self.lookup(name, span)? {
            let text = match self.read_variable(name, span)? {
                Value::Comms(text) => text,
                Value::Dead => {
                    return Err(RuntimeError::dead(format!("'{}' is dead", name), span))
                }
                other => {
                    return Err(RuntimeError::type_mismatch(
                        format!("cannot index into {}", other.type_name()),
                        span,
                    ))
                }
            };
            let [index] = index_values.as_slice() else {
                return Err(RuntimeError::DimensionMismatch {
                    message: format!("comms '{}' takes exactly one index", name),
                    span,
                });
            };
            let chars: Vec<char> = text.chars().collect();
            return Ok(match self.resolve_index(index, chars.len(), span)? {
                Some(i) => Value::Comms(chars[i].to_string()),
                None => Value::Comms(String::new()),
            });
        }

        let array = self.array_binding(name, span)?;
        if index_values.len() != array.rank() {
            return Err(RuntimeError::DimensionMismatch {
                message: format!(
                    "array '{}' has {} dimension(s) but {} index(es) were given",
                    name,
                    array.rank(),
                    index_values.len()
                ),
                span,
            });
        }
        let placeholder = placeholder_for(array.element_type);

        match (Self::live_elements(array, name, span)?, index_values.as_slice()) {
            (ArrayElements::Flat(items), [i]) => {
                Ok(match self.resolve_index(i, items.len(), span)? {
                    Some(i) => items[i].clone(),
                    None => placeholder,
                })
            }
            (ArrayElements::Nested(rows), [r, c]) => {
                let Some(r) = self.resolve_index(r, rows.len(), span)? else {
                    return Ok(placeholder);
                };
                let row = &rows[r];
                Ok(match self.resolve_index(c, row.len(), span)? {
                    Some(c) => row[c].clone(),
                    None => placeholder,
                })
            }
            _ => Err(RuntimeError::DimensionMismatch {
                message: format!("array '{}' does not match its declared rank", name),
                span,
            }),
        }
    }

    /// `p.x`
    pub(crate) fn read_field(
        &self,
        instance: &str,
        field: &str,
        span: SourceSpan,
    ) -> Result<Value, RuntimeError> {
        match self.lookup(instance, span)? {
            Binding::StructInstance(inst) => inst.get(field).cloned().ok_or_else(|| {
                RuntimeError::type_mismatch(
                    format!("struct '{}' has no field '{}'", inst.parent, field),
                    span,
                )
            }),
            other => Err(RuntimeError::type_mismatch(
                format!("'{}' is a {}, not a struct instance", instance, other.kind_name()),
                span,
            )),
        }
    }

    /// Evaluate the row selector of an array reference
    pub(crate) fn evaluate_row_selector(
        &mut self,
        array: &ArrayRef,
    ) -> Result<Option<Value>, RuntimeError> {
        array
            .row
            .as_deref()
            .map(|row| self.evaluate_expr(row))
            .transpose()
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
        SourceSpan::point(SourceLocation::new(2, 5))
    }

    #[test]
    fn test_resolve_index_bounds() {
        let mut host = NullHost;
        let interp = Interpreter::new(&mut host, RunMode::Live);

        assert_eq!(interp.resolve_index(&Value::Hp(2), 3, span()), Ok(Some(2)));
        assert_eq!(
            interp.resolve_index(&Value::Hp(3), 3, span()),
            Err(RuntimeError::IndexOutOfBounds {
                index: 3,
                len: 3,
                span: span()
            })
        );
        assert!(interp.resolve_index(&Value::Hp(-1), 3, span()).is_err());
        assert!(interp.resolve_index(&Value::Xp(1.0), 3, span()).is_err());
        assert_eq!(
            interp.resolve_index(&Value::Pending(NumericHint::Any), 0, span()),
            Ok(None)
        );
    }

    #[test]
    fn test_placeholder_matches_element_type() {
        assert_eq!(placeholder_for(ScalarType::Xp), Value::Pending(NumericHint::Xp));
        assert_eq!(placeholder_for(ScalarType::Flag), Value::Flag(false));
    }
}
