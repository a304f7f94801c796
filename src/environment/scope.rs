//! Scope stack
//!
//! Frames are pushed for every block, loop iteration and function call and
//! popped in strict LIFO order. Frame 0 holds the globals and is never popped.
//! A name is declared at most once per frame; lookup walks from the innermost
//! frame outwards and stops at the first match, so inner declarations shadow
//! outer ones.
//!
//! Writes go straight to the frame that owns the binding, so a block body
//! always starts from the latest outer state without any copying.

use super::binding::Binding;
use rustc_hash::FxHashMap;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EnvError {
    #[error("'{0}' is not declared")]
    NotDeclared(String),

    #[error("'{0}' is already declared in this scope")]
    Redeclared(String),
}

/// One level of the scope stack
#[derive(Debug, Clone, Default)]
pub struct Frame {
    bindings: FxHashMap<String, Binding>,
    order: Vec<String>, // declaration order, for display
    pub label: String,
}

impl Frame {
    pub fn new(label: impl Into<String>) -> Self {
        Frame {
            bindings: FxHashMap::default(),
            order: Vec::new(),
            label: label.into(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Binding> {
        self.bindings.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.bindings.contains_key(name)
    }

    /// Bindings in declaration order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Binding)> {
        self.order
            .iter()
            .filter_map(|name| self.bindings.get(name).map(|b| (name.as_str(), b)))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// Frames a function call set aside, restored when the call returns
#[derive(Debug)]
pub struct SavedFrames(Vec<Frame>);

/// The scope stack shared by the parser (placeholder values) and the
/// interpreter (live values)
#[derive(Debug, Clone)]
pub struct Environment {
    frames: Vec<Frame>,
}

impl Environment {
    pub fn new() -> Self {
        Environment {
            frames: vec![Frame::new("global")],
        }
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn is_global_scope(&self) -> bool {
        self.frames.len() == 1
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn global(&self) -> &Frame {
        &self.frames[0]
    }

    pub fn enter_scope(&mut self, label: &str) {
        tracing::trace!(depth = self.frames.len(), label, "enter scope");
        self.frames.push(Frame::new(label));
    }

    /// Pop the innermost frame. With `discard` the frame is dropped, otherwise
    /// it is handed back to the caller. The global frame is never popped.
    pub fn exit_scope(&mut self, discard: bool) -> Option<Frame> {
        if self.frames.len() <= 1 {
            return None;
        }
        let frame = self.frames.pop()?;
        tracing::trace!(depth = self.frames.len(), label = %frame.label, "exit scope");
        if discard {
            None
        } else {
            Some(frame)
        }
    }

    /// Trim the stack back to `depth` frames (never below the global frame)
    pub fn restore_scope(&mut self, depth: usize) {
        self.frames.truncate(depth.max(1));
    }

    /// Set aside every frame above the globals and open the callee's frame
    pub fn enter_function(&mut self, name: &str) -> SavedFrames {
        let saved = self.frames.split_off(1);
        tracing::trace!(function = name, saved = saved.len(), "enter function");
        self.frames.push(Frame::new(name));
        SavedFrames(saved)
    }

    /// Drop the callee's frames and bring back the caller's view
    pub fn exit_function(&mut self, saved: SavedFrames) {
        self.frames.truncate(1);
        self.frames.extend(saved.0);
    }

    /// Declare `name` in the innermost frame
    pub fn declare(&mut self, name: &str, binding: Binding) -> Result<(), EnvError> {
        let frame = self
            .frames
            .last_mut()
            .ok_or_else(|| EnvError::NotDeclared(name.to_string()))?;

        match frame.bindings.get(name) {
            Some(existing) if !existing.accepts_redeclaration(&binding) => {
                return Err(EnvError::Redeclared(name.to_string()));
            }
            Some(_) => {}
            None => frame.order.push(name.to_string()),
        }
        frame.bindings.insert(name.to_string(), binding);
        Ok(())
    }

    /// Replace an existing binding wherever it lives
    pub fn replace(&mut self, name: &str, binding: Binding) -> Result<(), EnvError> {
        let slot = self.lookup_mut(name)?;
        *slot = binding;
        Ok(())
    }

    pub fn lookup(&self, name: &str) -> Result<&Binding, EnvError> {
        self.frames
            .iter()
            .rev()
            .find_map(|frame| frame.bindings.get(name))
            .ok_or_else(|| EnvError::NotDeclared(name.to_string()))
    }

    pub fn lookup_mut(&mut self, name: &str) -> Result<&mut Binding, EnvError> {
        self.frames
            .iter_mut()
            .rev()
            .find_map(|frame| frame.bindings.get_mut(name))
            .ok_or_else(|| EnvError::NotDeclared(name.to_string()))
    }

    pub fn is_declared(&self, name: &str) -> bool {
        self.lookup(name).is_ok()
    }

    /// Whether `name` is declared in the innermost frame itself
    pub fn declared_here(&self, name: &str) -> bool {
        self.frames.last().is_some_and(|f| f.contains(name))
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::binding::{VarType, Variable};
    use crate::environment::value::Value;
    use crate::parser::ast::ScalarType;

    fn hp(n: i64) -> Binding {
        Binding::Variable(Variable::new(
            VarType::Scalar(ScalarType::Hp),
            Value::Hp(n),
            false,
        ))
    }

    fn value_of(env: &Environment, name: &str) -> Value {
        match env.lookup(name) {
            Ok(Binding::Variable(var)) => var.value.clone(),
            other => panic!("unexpected binding {:?}", other),
        }
    }

    #[test]
    fn test_shadowing_and_exit() {
        let mut env = Environment::new();
        env.declare("x", hp(1)).unwrap();
        env.enter_scope("block");
        env.declare("x", hp(2)).unwrap();
        assert_eq!(value_of(&env, "x"), Value::Hp(2));
        env.exit_scope(true);
        assert_eq!(value_of(&env, "x"), Value::Hp(1));
    }

    #[test]
    fn test_redeclaration_in_same_frame_is_rejected() {
        let mut env = Environment::new();
        env.declare("x", hp(1)).unwrap();
        assert_eq!(
            env.declare("x", hp(2)),
            Err(EnvError::Redeclared("x".to_string()))
        );
    }

    #[test]
    fn test_global_frame_is_never_popped() {
        let mut env = Environment::new();
        assert!(env.exit_scope(false).is_none());
        env.restore_scope(0);
        assert_eq!(env.depth(), 1);
    }

    #[test]
    fn test_kept_frame_is_returned() {
        let mut env = Environment::new();
        env.enter_scope("play");
        env.declare("score", hp(7)).unwrap();
        let frame = env.exit_scope(false).unwrap();
        assert_eq!(frame.label, "play");
        assert_eq!(frame.iter().map(|(n, _)| n).collect::<Vec<_>>(), ["score"]);
    }

    #[test]
    fn test_function_sees_only_globals() {
        let mut env = Environment::new();
        env.declare("g", hp(1)).unwrap();
        env.enter_scope("play");
        env.declare("local", hp(2)).unwrap();

        let saved = env.enter_function("f");
        assert!(env.is_declared("g"));
        assert!(!env.is_declared("local"));

        // writes to globals survive the call
        if let Binding::Variable(var) = env.lookup_mut("g").unwrap() {
            var.value = Value::Hp(10);
        }
        env.exit_function(saved);

        assert_eq!(value_of(&env, "local"), Value::Hp(2));
        assert_eq!(value_of(&env, "g"), Value::Hp(10));
    }

    #[test]
    fn test_outer_writes_are_visible_after_restore() {
        let mut env = Environment::new();
        env.declare("n", hp(0)).unwrap();
        let depth = env.depth();
        for i in 1..=3 {
            env.enter_scope("iteration");
            if let Binding::Variable(var) = env.lookup_mut("n").unwrap() {
                var.value = Value::Hp(i);
            }
            env.restore_scope(depth);
        }
        assert_eq!(value_of(&env, "n"), Value::Hp(3));
    }
}
