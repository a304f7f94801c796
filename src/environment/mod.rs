//! Environment: scoped symbol table shared by the parser and the interpreter
//!
//! - [`value`]: Runtime values, including `dead` and the dry-pass pending value
//! - [`binding`]: The five binding kinds a name can refer to
//! - [`scope`]: The frame stack with enter/exit/restore and call save/restore
//!
//! The parser fills the same structure with placeholder values so that
//! visibility rules are checked exactly the way they are enforced at runtime.

pub mod binding;
pub mod scope;
pub mod value;

pub use binding::{
    ArrayBinding, ArrayElements, Binding, FieldDef, Function, StructDef, StructInstance, VarType,
    Variable,
};
pub use scope::{EnvError, Environment, Frame, SavedFrames};
pub use value::{NumericHint, Value};
