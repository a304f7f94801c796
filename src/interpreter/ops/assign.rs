//! Assignment execution
//!
//! Handles `:` and the compound operators for all four target shapes.
//! A compound assignment reads the current value, combines it through the
//! binary operator rules and stores the result under the slot's type.

use crate::environment::{ArrayElements, Binding, Value};
use crate::interpreter::engine::Interpreter;
use crate::interpreter::errors::RuntimeError;
use crate::parser::ast::{AssignOp, AssignTarget, Expr, Rhs, SourceSpan};

impl Interpreter<'_> {
    pub(crate) fn execute_assignment(
        &mut self,
        target: &AssignTarget,
        op: AssignOp,
        rhs: &Rhs,
        span: SourceSpan,
    ) -> Result<(), RuntimeError> {
        let value = self.evaluate_rhs(rhs)?;

        match target {
            AssignTarget::Variable(name) => self.assign_variable(name, op, value, span),
            AssignTarget::Element { name, indices } => {
                self.assign_element(name, indices, op, value, span)
            }
            AssignTarget::Field { instance, field } => {
                self.assign_field(instance, field, op, value, span)
            }
            AssignTarget::CommsChar { name, index } => {
                self.assign_comms_char(name, index, value, span)
            }
        }
    }

    /// Single value of a right-hand side
    pub(crate) fn evaluate_rhs(&mut self, rhs: &Rhs) -> Result<Value, RuntimeError> {
        match rhs {
            Rhs::Expr(expr) => self.evaluate_expr(expr),
            Rhs::Input { kind, prompt, span } => self.read_input(*kind, prompt, *span),
        }
    }

    /// New slot content for `current <op> value`
    fn combine(
        &self,
        op: AssignOp,
        current: &Value,
        value: Value,
        span: SourceSpan,
    ) -> Result<Value, RuntimeError> {
        match op.binary_op() {
            Some(bin) => self.evaluate_binary_op(bin, current, &value, span),
            None => Ok(value),
        }
    }

    fn assign_variable(
        &mut self,
        name: &str,
        op: AssignOp,
        value: Value,
        span: SourceSpan,
    ) -> Result<(), RuntimeError> {
        let (var_type, current) = match self.lookup(name, span)? {
            Binding::Variable(var) if var.immutable => {
                return Err(RuntimeError::Immutable {
                    name: name.to_string(),
                    span,
                })
            }
            Binding::Variable(var) if var.value.is_dead() => {
                return Err(RuntimeError::dead(
                    format!("'{}' is dead; redeclare it before assigning to it", name),
                    span,
                ))
            }
            Binding::Variable(var) => (var.ty, var.value.clone()),
            other => {
                return Err(RuntimeError::type_mismatch(
                    format!("cannot assign to {} '{}'", other.kind_name(), name),
                    span,
                ))
            }
        };

        let combined = self.combine(op, &current, value, span)?;
        let stored = self.coerce_for_variable(var_type, combined, span)?;

        if let Binding::Variable(var) = self.lookup_mut(name, span)? {
            var.value = stored;
        }
        Ok(())
    }

    fn assign_element(
        &mut self,
        name: &str,
        indices: &[Expr],
        op: AssignOp,
        value: Value,
        span: SourceSpan,
    ) -> Result<(), RuntimeError> {
        let index_values = self.evaluate_indices(indices)?;

        let array = self.array_binding(name, span)?;
        if array.immutable {
            return Err(RuntimeError::Immutable {
                name: name.to_string(),
                span,
            });
        }
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
        let element_type = array.element_type;

        // locate the slot; a pending index leaves nothing to write
        let position = match (Self::live_elements(array, name, span)?, index_values.as_slice()) {
            (ArrayElements::Flat(items), [i]) => self
                .resolve_index(i, items.len(), span)?
                .map(|i| (i, None)),
            (ArrayElements::Nested(rows), [r, c]) => match self.resolve_index(r, rows.len(), span)? {
                Some(r) => self
                    .resolve_index(c, rows[r].len(), span)?
                    .map(|c| (r, Some(c))),
                None => None,
            },
            _ => {
                return Err(RuntimeError::DimensionMismatch {
                    message: format!("array '{}' does not match its declared rank", name),
                    span,
                })
            }
        };
        let Some((outer, inner)) = position else {
            return Ok(());
        };

        let current = match (Self::live_elements(array, name, span)?, inner) {
            (ArrayElements::Flat(items), None) => items[outer].clone(),
            (ArrayElements::Nested(rows), Some(inner)) => rows[outer][inner].clone(),
            _ => Value::Dead,
        };
        let combined = self.combine(op, &current, value, span)?;
        let stored = self.coerce_value(element_type, combined, span)?;

        match (&mut self.array_binding_mut(name, span)?.elements, inner) {
            (Some(ArrayElements::Flat(items)), None) => items[outer] = stored,
            (Some(ArrayElements::Nested(rows)), Some(inner)) => rows[outer][inner] = stored,
            _ => {}
        }
        Ok(())
    }

    fn assign_field(
        &mut self,
        instance: &str,
        field: &str,
        op: AssignOp,
        value: Value,
        span: SourceSpan,
    ) -> Result<(), RuntimeError> {
        let parent = match self.lookup(instance, span)? {
            Binding::StructInstance(inst) if inst.immutable => {
                return Err(RuntimeError::Immutable {
                    name: instance.to_string(),
                    span,
                })
            }
            Binding::StructInstance(inst) => inst.parent.clone(),
            other => {
                return Err(RuntimeError::type_mismatch(
                    format!("'{}' is a {}, not a struct instance", instance, other.kind_name()),
                    span,
                ))
            }
        };

        let field_type = match self.lookup(&parent, span)? {
            Binding::StructDef(def) => def.field(field).map(|f| f.ty),
            _ => None,
        }
        .ok_or_else(|| {
            RuntimeError::type_mismatch(
                format!("struct '{}' has no field '{}'", parent, field),
                span,
            )
        })?;

        let current = self.read_field(instance, field, span)?;
        let combined = self.combine(op, &current, value, span)?;
        let stored = self.coerce_value(field_type, combined, span)?;

        if let Binding::StructInstance(inst) = self.lookup_mut(instance, span)? {
            if let Some(slot) = inst.get_mut(field) {
                *slot = stored;
            }
        }
        Ok(())
    }

    /// `s[i]: "c"` replaces one character
    fn assign_comms_char(
        &mut self,
        name: &str,
        index: &Expr,
        value: Value,
        span: SourceSpan,
    ) -> Result<(), RuntimeError> {
        let index = self.evaluate_expr(index)?;

        let replacement = match &value {
            Value::Comms(s) if s.chars().count() == 1 => s.chars().next(),
            // input-derived text is empty during the dry pass
            Value::Comms(s) if s.is_empty() && !self.is_live() => None,
            other => {
                return Err(RuntimeError::type_mismatch(
                    format!(
                        "a comms character must be a one-character comms, found {}",
                        match other {
                            Value::Comms(s) => format!("\"{}\"", s),
                            v => v.type_name().to_string(),
                        }
                    ),
                    span,
                ))
            }
        };

        let text = match self.lookup(name, span)? {
            Binding::Variable(var) if var.immutable => {
                return Err(RuntimeError::Immutable {
                    name: name.to_string(),
                    span,
                })
            }
            Binding::Variable(var) => match &var.value {
                Value::Comms(text) => text.clone(),
                Value::Dead => {
                    return Err(RuntimeError::dead(format!("'{}' is dead", name), span))
                }
                other => {
                    return Err(RuntimeError::type_mismatch(
                        format!("cannot index into {}", other.type_name()),
                        span,
                    ))
                }
            },
            other => {
                return Err(RuntimeError::type_mismatch(
                    format!("cannot assign a character to {} '{}'", other.kind_name(), name),
                    span,
                ))
            }
        };

        let mut chars: Vec<char> = text.chars().collect();
        let Some(position) = self.resolve_index(&index, chars.len(), span)? else {
            return Ok(());
        };
        let Some(replacement) = replacement else {
            return Ok(());
        };
        chars[position] = replacement;

        if let Binding::Variable(var) = self.lookup_mut(name, span)? {
            var.value = Value::Comms(chars.into_iter().collect());
        }
        Ok(())
    }
}
