//! Respawn execution engine
//!
//! This module provides the tree-walking evaluator:
//! - [`engine`]: The [`Interpreter`], statement dispatch and block scoping
//! - [`errors`]: Runtime error types
//! - [`ops`]: Operators, reads through names and assignments
//!
//! # Execution Model
//!
//! A checked program runs twice. The dry pass uses a host that discards
//! output and gives `loadNum` a pending value, so runtime errors that do not
//! depend on input surface before the user is asked for anything. The live
//! pass then runs against the real host.
//!
//! Every statement returns a [`ControlFlow`]; `checkpoint`, `resume` and
//! `recall` travel back up through those results to the loop or call that
//! consumes them.

pub mod builtins;
pub mod engine;
pub mod errors;
pub mod expressions;
pub mod input;
pub mod jumps;
pub mod loops;
pub mod ops;
pub mod statements;
pub mod type_system;

pub use engine::{ControlFlow, Interpreter, RunMode, DRY_LOOP_LIMIT, MAX_CALL_DEPTH};
pub use errors::RuntimeError;
