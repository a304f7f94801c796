//! Loop statement execution (`while`, `grind ... while`, `for`).
//!
//! Adds `impl Interpreter` methods for the three loop forms. Every iteration
//! runs its body in a fresh frame; `checkpoint` and `resume` come back as
//! [`LoopBodyResult`] so the loop driver can react without inspecting the
//! raw [`ControlFlow`].
//!
//! A `recall` inside a loop body is returned as [`LoopBodyResult::Exit`],
//! which makes the loop unwind immediately and hand the signal to the
//! function call that is executing it.

use crate::environment::{Binding, VarType, Variable};
use crate::interpreter::engine::{ControlFlow, Interpreter};
use crate::interpreter::errors::RuntimeError;
use crate::parser::ast::{Expr, ScalarType, SourceSpan, Stmt};

/// How one execution of a loop body ended
pub(crate) enum LoopBodyResult {
    /// Ran to completion or hit `resume`: iterate again
    Continue,
    /// `checkpoint`: leave the loop
    Break,
    /// `recall`: unwind and propagate
    Exit(ControlFlow),
}

impl Interpreter<'_> {
    /// Executes all statements in `body` inside a fresh scope.
    pub(crate) fn execute_loop_body(
        &mut self,
        label: &str,
        body: &[Stmt],
    ) -> Result<LoopBodyResult, RuntimeError> {
        Ok(match self.execute_scoped(label, body)? {
            ControlFlow::Normal | ControlFlow::Continue => LoopBodyResult::Continue,
            ControlFlow::Break => LoopBodyResult::Break,
            exit @ ControlFlow::Return(_) => LoopBodyResult::Exit(exit),
        })
    }

    pub(crate) fn evaluate_condition(&mut self, condition: &Expr) -> Result<bool, RuntimeError> {
        let value = self.evaluate_expr(condition)?;
        Self::value_to_flag(&value, condition.span())
    }

    /// `while cond { body }`: the condition is tested before every iteration
    pub(crate) fn execute_while(
        &mut self,
        condition: &Expr,
        body: &[Stmt],
        span: SourceSpan,
    ) -> Result<ControlFlow, RuntimeError> {
        let mut iterations = 0;
        while self.evaluate_condition(condition)? {
            if !self.loop_tick(&mut iterations, span)? {
                break;
            }
            match self.execute_loop_body("while", body)? {
                LoopBodyResult::Continue => {}
                LoopBodyResult::Break => break,
                LoopBodyResult::Exit(flow) => return Ok(flow),
            }
        }
        Ok(ControlFlow::Normal)
    }

    /// `grind { body } while cond`: the body runs at least once
    pub(crate) fn execute_grind(
        &mut self,
        body: &[Stmt],
        condition: &Expr,
        span: SourceSpan,
    ) -> Result<ControlFlow, RuntimeError> {
        let mut iterations = 0;
        loop {
            if !self.loop_tick(&mut iterations, span)? {
                break;
            }
            match self.execute_loop_body("grind", body)? {
                LoopBodyResult::Continue => {}
                LoopBodyResult::Break => break,
                LoopBodyResult::Exit(flow) => return Ok(flow),
            }
            if !self.evaluate_condition(condition)? {
                break;
            }
        }
        Ok(ControlFlow::Normal)
    }

    /// `for i: start, cond, update { body }`
    ///
    /// The counter lives in a frame of its own around the loop, so it is
    /// gone once the loop ends. `resume` still runs the update.
    pub(crate) fn execute_for(
        &mut self,
        counter: &str,
        start: &Expr,
        condition: &Expr,
        update: &Stmt,
        body: &[Stmt],
        span: SourceSpan,
    ) -> Result<ControlFlow, RuntimeError> {
        let depth = self.env.depth();
        self.env.enter_scope("for");
        let result = self.run_for(counter, start, condition, update, body, span);
        self.env.restore_scope(depth);
        result
    }

    fn run_for(
        &mut self,
        counter: &str,
        start: &Expr,
        condition: &Expr,
        update: &Stmt,
        body: &[Stmt],
        span: SourceSpan,
    ) -> Result<ControlFlow, RuntimeError> {
        let start_value = self.evaluate_expr(start)?;
        let start_value = self.coerce_value(ScalarType::Hp, start_value, start.span())?;
        let var = Variable::new(VarType::Scalar(ScalarType::Hp), start_value, false);
        self.declare(counter, Binding::Variable(var), span)?;

        let mut iterations = 0;
        while self.evaluate_condition(condition)? {
            if !self.loop_tick(&mut iterations, span)? {
                break;
            }
            match self.execute_loop_body("for body", body)? {
                LoopBodyResult::Continue => {}
                LoopBodyResult::Break => break,
                LoopBodyResult::Exit(flow) => return Ok(flow),
            }
            self.execute_statement(update)?;
        }
        Ok(ControlFlow::Normal)
    }
}
