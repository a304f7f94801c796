//! Statement execution implementation
//!
//! Declarations, `if` and `shoot`. Loops live in [`super::loops`], `flank`
//! and calls in [`super::jumps`], assignments in [`super::ops::assign`].

use crate::environment::{
    ArrayBinding, ArrayElements, Binding, FieldDef, StructDef, StructInstance, Value, VarType,
    Variable,
};
use crate::interpreter::builtins::Dropped;
use crate::interpreter::engine::{ControlFlow, Interpreter};
use crate::interpreter::errors::RuntimeError;
use crate::parser::ast::*;

impl Interpreter<'_> {
    pub(crate) fn execute_var_decl(
        &mut self,
        var_type: ScalarType,
        names: &[String],
        init: &VarInit,
        immutable: bool,
        span: SourceSpan,
    ) -> Result<(), RuntimeError> {
        let values = match init {
            VarInit::Default => vec![Value::default_for(var_type); names.len()],
            VarInit::Dead => vec![Value::Dead; names.len()],
            VarInit::Each(exprs) => exprs
                .iter()
                .map(|expr| self.evaluate_expr(expr))
                .collect::<Result<Vec<_>, _>>()?,
            VarInit::Shared(rhs) => {
                let values = self.evaluate_rhs_values(rhs)?;
                Self::distribute(values, names.len(), span)?
            }
        };

        for (name, value) in names.iter().zip(values) {
            let value = self.coerce_value(var_type, value, span)?;
            if immutable && value.is_dead() {
                return Err(RuntimeError::dead(
                    format!("immutable '{}' cannot be dead", name),
                    span,
                ));
            }
            let var = Variable::new(VarType::Scalar(var_type), value, immutable);
            self.declare(name, Binding::Variable(var), span)?;
        }
        Ok(())
    }

    /// Spread a shared initializer over `count` names
    fn distribute(values: Vec<Value>, count: usize, span: SourceSpan) -> Result<Vec<Value>, RuntimeError> {
        match values.len() {
            1 => Ok(vec![values[0].clone(); count]),
            n if n == count => Ok(values),
            n => Err(RuntimeError::RecallArity {
                message: format!(
                    "{} name(s) declared but the initializer produced {} value(s)",
                    count, n
                ),
                span,
            }),
        }
    }

    /// Concrete size of one dimension; `None` when unsized or still unknown
    fn resolve_dim(&self, dim: &DimSize) -> Result<Option<usize>, RuntimeError> {
        match dim {
            DimSize::Unsized => Ok(None),
            DimSize::Fixed(n) => Ok(Some(*n)),
            DimSize::Named(name, span) => match self.read_variable(name, *span)? {
                Value::Hp(n) if n >= 0 => Ok(Some(n as usize)),
                Value::Hp(n) => Err(RuntimeError::DimensionMismatch {
                    message: format!("array size '{}' is negative ({})", name, n),
                    span: *span,
                }),
                Value::Pending(_) => Ok(None),
                other => Err(RuntimeError::type_mismatch(
                    format!("array size '{}' must be hp, found {}", name, other.type_name()),
                    *span,
                )),
            },
        }
    }

    fn check_length(
        name: &str,
        declared: Option<usize>,
        found: usize,
        span: SourceSpan,
    ) -> Result<(), RuntimeError> {
        match declared {
            Some(n) if n != found => Err(RuntimeError::InitializerLength {
                message: format!(
                    "array '{}' declared with size {} but initialized with {} element(s)",
                    name, n, found
                ),
                span,
            }),
            _ => Ok(()),
        }
    }

    fn evaluate_row(
        &mut self,
        element_type: ScalarType,
        exprs: &[Expr],
        span: SourceSpan,
    ) -> Result<Vec<Value>, RuntimeError> {
        exprs
            .iter()
            .map(|expr| {
                let value = self.evaluate_expr(expr)?;
                self.coerce_value(element_type, value, span)
            })
            .collect()
    }

    pub(crate) fn execute_array_decl(
        &mut self,
        element_type: ScalarType,
        name: &str,
        dims: &[DimSize],
        init: &ArrayInit,
        immutable: bool,
        span: SourceSpan,
    ) -> Result<(), RuntimeError> {
        let dims = dims
            .iter()
            .map(|dim| self.resolve_dim(dim))
            .collect::<Result<Vec<_>, _>>()?;
        let outer = dims.first().copied().flatten();
        let inner = dims.get(1).copied().flatten();

        let elements = match init {
            ArrayInit::Default => Some(ArrayElements::defaults(element_type, &dims)),
            ArrayInit::Dead => None,

            ArrayInit::Literal(ArrayLiteral::Flat(exprs)) => {
                Self::check_length(name, outer, exprs.len(), span)?;
                Some(ArrayElements::Flat(self.evaluate_row(element_type, exprs, span)?))
            }

            ArrayInit::Literal(ArrayLiteral::Nested(rows)) => {
                Self::check_length(name, outer, rows.len(), span)?;
                let mut grid = Vec::with_capacity(rows.len());
                for row in rows {
                    Self::check_length(name, inner, row.len(), span)?;
                    grid.push(self.evaluate_row(element_type, row, span)?);
                }
                Some(ArrayElements::Nested(grid))
            }

            ArrayInit::Copy(source) => {
                let source_binding = self.array_binding(source, span)?;
                let copied = Self::live_elements(source_binding, source, span)?.clone();
                if source_binding.element_type != element_type || copied.rank() != dims.len() {
                    return Err(RuntimeError::type_mismatch(
                        format!("array '{}' cannot be copied into '{}'", source, name),
                        span,
                    ));
                }
                Self::check_length(name, outer, copied.len(), span)?;
                Some(copied)
            }

            ArrayInit::DropRow { array, index } => {
                match self.evaluate_drop(array, index.as_deref(), span)? {
                    Dropped::Row(row) => {
                        // an unknown row index leaves an empty placeholder row
                        if self.is_live() || !row.is_empty() {
                            Self::check_length(name, outer, row.len(), span)?;
                        }
                        Some(ArrayElements::Flat(row))
                    }
                    Dropped::Value(_) => {
                        return Err(RuntimeError::DimensionMismatch {
                            message: format!("'{}' must be initialized with a row", name),
                            span,
                        })
                    }
                }
            }
        };

        if immutable && elements.is_none() {
            return Err(RuntimeError::dead(
                format!("immutable array '{}' cannot be dead", name),
                span,
            ));
        }

        let array = ArrayBinding {
            element_type,
            dims,
            elements,
            immutable,
        };
        self.declare(name, Binding::Array(array), span)
    }

    /// `build`: field defaults are evaluated once, here
    pub(crate) fn execute_struct_def(
        &mut self,
        name: &str,
        fields: &[FieldDecl],
        span: SourceSpan,
    ) -> Result<(), RuntimeError> {
        let mut defs = Vec::with_capacity(fields.len());
        for field in fields {
            let default = match &field.default {
                Some(expr) => {
                    let value = self.evaluate_expr(expr)?;
                    self.coerce_value(field.field_type, value, field.span)?
                }
                None => Value::default_for(field.field_type),
            };
            defs.push(FieldDef {
                name: field.name.clone(),
                ty: field.field_type,
                default,
            });
        }
        self.declare(name, Binding::StructDef(StructDef { fields: defs }), span)
    }

    /// `access`: initializers fill fields in order, the rest keep their defaults
    pub(crate) fn execute_struct_instance(
        &mut self,
        struct_name: &str,
        name: &str,
        args: &[Expr],
        immutable: bool,
        span: SourceSpan,
    ) -> Result<(), RuntimeError> {
        let def = match self.lookup(struct_name, span)? {
            Binding::StructDef(def) => def.clone(),
            other => {
                return Err(RuntimeError::type_mismatch(
                    format!("'{}' is a {}, not a struct type", struct_name, other.kind_name()),
                    span,
                ))
            }
        };

        if args.len() > def.fields.len() {
            return Err(RuntimeError::InitializerLength {
                message: format!(
                    "struct '{}' has {} field(s) but {} initializer(s) were given",
                    struct_name,
                    def.fields.len(),
                    args.len()
                ),
                span,
            });
        }

        let mut fields = Vec::with_capacity(def.fields.len());
        for (i, field) in def.fields.iter().enumerate() {
            let value = match args.get(i) {
                Some(arg) => {
                    let value = self.evaluate_expr(arg)?;
                    self.coerce_value(field.ty, value, arg.span())?
                }
                None => field.default.clone(),
            };
            fields.push((field.name.clone(), value));
        }

        let instance = StructInstance {
            parent: struct_name.to_string(),
            fields,
            immutable,
        };
        self.declare(name, Binding::StructInstance(instance), span)
    }

    pub(crate) fn execute_if(
        &mut self,
        branches: &[(Expr, Vec<Stmt>)],
        else_branch: Option<&[Stmt]>,
    ) -> Result<ControlFlow, RuntimeError> {
        for (condition, body) in branches {
            if self.evaluate_condition(condition)? {
                return self.execute_scoped("if", body);
            }
        }
        match else_branch {
            Some(body) => self.execute_scoped("else", body),
            None => Ok(ControlFlow::Normal),
        }
    }

    /// `shoot` / `shootNxt`; the dry pass evaluates but emits nothing
    pub(crate) fn execute_shoot(
        &mut self,
        value: &Expr,
        newline: bool,
    ) -> Result<(), RuntimeError> {
        let value = self.evaluate_expr(value)?;
        if !self.is_live() {
            return Ok(());
        }
        let mut text = value.to_string();
        if newline {
            text.push('\n');
        }
        self.host.emit(&text);
        Ok(())
    }
}
