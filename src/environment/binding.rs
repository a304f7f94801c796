//! Typed bindings held in scope frames
//!
//! Every name in a frame maps to exactly one [`Binding`] variant; code that
//! reads a binding matches on the variant instead of probing its shape.

use super::value::Value;
use crate::parser::ast::{Param, ScalarType, Stmt};
use std::fmt;
use std::rc::Rc;

/// Declared type of a scalar variable
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VarType {
    Scalar(ScalarType),
    /// `hp` or `xp`, settled by the first concrete assignment
    Numeric,
    /// Function parameters before the parser knows what is passed
    Untyped,
}

impl VarType {
    pub fn scalar(self) -> Option<ScalarType> {
        match self {
            VarType::Scalar(ty) => Some(ty),
            _ => None,
        }
    }
}

impl fmt::Display for VarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VarType::Scalar(ty) => write!(f, "{}", ty),
            VarType::Numeric => f.write_str("hp or xp"),
            VarType::Untyped => f.write_str("untyped"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    pub ty: VarType,
    pub value: Value,
    pub immutable: bool,
}

impl Variable {
    pub fn new(ty: VarType, value: Value, immutable: bool) -> Self {
        Variable {
            ty,
            value,
            immutable,
        }
    }
}

/// Array storage of rank 1 or 2
#[derive(Debug, Clone, PartialEq)]
pub enum ArrayElements {
    Flat(Vec<Value>),
    Nested(Vec<Vec<Value>>),
}

impl ArrayElements {
    /// Elements for a declaration without initializer: sized dimensions are
    /// filled with the type default, unsized ones start empty
    pub fn defaults(element_type: ScalarType, dims: &[Option<usize>]) -> Self {
        let fill = Value::default_for(element_type);
        match dims {
            [rows, cols] => {
                let cols = cols.unwrap_or(0);
                ArrayElements::Nested(vec![vec![fill; cols]; rows.unwrap_or(0)])
            }
            [len, ..] => ArrayElements::Flat(vec![fill; len.unwrap_or(0)]),
            [] => ArrayElements::Flat(Vec::new()),
        }
    }

    pub fn rank(&self) -> usize {
        match self {
            ArrayElements::Flat(_) => 1,
            ArrayElements::Nested(_) => 2,
        }
    }

    /// Outer length: elements of a 1-D array, rows of a 2-D array
    pub fn len(&self) -> usize {
        match self {
            ArrayElements::Flat(items) => items.len(),
            ArrayElements::Nested(rows) => rows.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ArrayBinding {
    pub element_type: ScalarType,
    /// Declared size per dimension; `None` for `[]`
    pub dims: Vec<Option<usize>>,
    /// `None` while the array is dead
    pub elements: Option<ArrayElements>,
    pub immutable: bool,
}

impl ArrayBinding {
    pub fn rank(&self) -> usize {
        self.dims.len()
    }

    pub fn is_dead(&self) -> bool {
        self.elements.is_none()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldDef {
    pub name: String,
    pub ty: ScalarType,
    pub default: Value,
}

/// A `build` type: ordered fields with their defaults
#[derive(Debug, Clone, PartialEq)]
pub struct StructDef {
    pub fields: Vec<FieldDef>,
}

impl StructDef {
    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StructInstance {
    /// Name of the `build` type this was created from
    pub parent: String,
    pub fields: Vec<(String, Value)>,
    pub immutable: bool,
}

impl StructInstance {
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, value)| value)
    }

    pub fn get_mut(&mut self, field: &str) -> Option<&mut Value> {
        self.fields
            .iter_mut()
            .find(|(name, _)| name == field)
            .map(|(_, value)| value)
    }
}

#[derive(Debug, Clone)]
pub struct Function {
    pub params: Vec<Param>,
    pub body: Rc<Vec<Stmt>>,
    /// Number of values every `recall` yields; `None` until one is seen
    pub arity: Option<usize>,
}

impl Function {
    /// Parameters that must be passed explicitly
    pub fn required_params(&self) -> usize {
        self.params.iter().filter(|p| p.default.is_none()).count()
    }
}

/// A name's meaning in one frame
#[derive(Debug, Clone)]
pub enum Binding {
    Variable(Variable),
    Array(ArrayBinding),
    StructDef(StructDef),
    StructInstance(StructInstance),
    Function(Function),
}

impl Binding {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Binding::Variable(_) => "variable",
            Binding::Array(_) => "array",
            Binding::StructDef(_) => "struct type",
            Binding::StructInstance(_) => "struct instance",
            Binding::Function(_) => "function",
        }
    }

    /// Whether a same-frame redeclaration of this binding with `replacement` is allowed
    pub fn accepts_redeclaration(&self, replacement: &Binding) -> bool {
        match (self, replacement) {
            (Binding::Variable(old), Binding::Variable(new)) => {
                old.value.is_dead() && old.ty == new.ty
            }
            (Binding::Array(old), Binding::Array(new)) => {
                old.is_dead() && old.element_type == new.element_type && old.rank() == new.rank()
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_elements_follow_dims() {
        let flat = ArrayElements::defaults(ScalarType::Hp, &[Some(3)]);
        assert_eq!(flat, ArrayElements::Flat(vec![Value::Hp(0); 3]));

        let grid = ArrayElements::defaults(ScalarType::Flag, &[Some(2), Some(2)]);
        assert_eq!(grid.rank(), 2);
        assert_eq!(grid.len(), 2);

        assert!(ArrayElements::defaults(ScalarType::Comms, &[None]).is_empty());
    }

    #[test]
    fn test_only_dead_bindings_accept_redeclaration() {
        let dead = Binding::Variable(Variable::new(
            VarType::Scalar(ScalarType::Hp),
            Value::Dead,
            false,
        ));
        let live = Binding::Variable(Variable::new(
            VarType::Scalar(ScalarType::Hp),
            Value::Hp(1),
            false,
        ));
        let other_type = Binding::Variable(Variable::new(
            VarType::Scalar(ScalarType::Xp),
            Value::Xp(1.0),
            false,
        ));
        assert!(dead.accepts_redeclaration(&live));
        assert!(!dead.accepts_redeclaration(&other_type));
        assert!(!live.accepts_redeclaration(&live));
    }
}
