//! Execution engine for the Respawn interpreter
//!
//! Statements report how they finished through [`ControlFlow`]. Loops count
//! their iterations through `loop_tick`: the dry pass caps them, the live
//! pass yields to the host so a restart can cancel a runaway loop. A closed
//! input channel is not a failure for a loop that reads nothing.

use crate::environment::{Binding, EnvError, Environment, Frame, Value};
use crate::host::{Host, HostError, RunToken};
use crate::interpreter::errors::RuntimeError;
use crate::parser::ast::*;

/// Deepest nesting of user function calls before the run is aborted
pub const MAX_CALL_DEPTH: usize = 256;

/// Iterations a single loop may run during the dry pass before it is cut short
pub const DRY_LOOP_LIMIT: usize = 1_000;

/// Live loops yield to the host every this many iterations
pub(crate) const LIVE_YIELD_INTERVAL: usize = 4_096;

/// Which of the two passes a run performs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// No output, input is symbolic
    Dry,
    /// Real output and input through the host
    Live,
}

/// How a statement finished
#[derive(Debug, Clone, PartialEq)]
pub enum ControlFlow {
    Normal,
    /// `checkpoint`
    Break,
    /// `resume`
    Continue,
    /// `recall` with its values
    Return(Vec<Value>),
}

/// The tree-walking interpreter for one run of a program
pub struct Interpreter<'h> {
    /// Live scope stack
    pub(crate) env: Environment,

    /// Output sink and input channel
    pub(crate) host: &'h mut dyn Host,

    pub(crate) mode: RunMode,

    /// Token of the run this interpreter belongs to, if any
    pub(crate) token: Option<RunToken>,

    /// Current depth of user function calls
    pub(crate) call_depth: usize,

    /// The `play` frame as it was when the block finished
    play_frame: Option<Frame>,

    /// Span of the statement being executed
    pub(crate) current_span: Option<SourceSpan>,

    /// Set once the dry pass has cut a loop short
    loop_cut: bool,
}

impl<'h> Interpreter<'h> {
    pub fn new(host: &'h mut dyn Host, mode: RunMode) -> Self {
        Interpreter {
            env: Environment::new(),
            host,
            mode,
            token: None,
            call_depth: 0,
            play_frame: None,
            current_span: None,
            loop_cut: false,
        }
    }

    /// Tie this run to a session token so a restart can cancel it
    pub fn with_token(mut self, token: RunToken) -> Self {
        self.token = Some(token);
        self
    }

    /// Run every global item in order, ending with `play`
    #[tracing::instrument(level = "debug", skip_all, fields(mode = ?self.mode))]
    pub fn run(&mut self, program: &Program) -> Result<(), RuntimeError> {
        for item in &program.items {
            self.execute_statement(item)?;
        }
        tracing::debug!("run finished");
        Ok(())
    }

    pub fn is_live(&self) -> bool {
        self.mode == RunMode::Live
    }

    pub fn environment(&self) -> &Environment {
        &self.env
    }

    /// Bindings of the `play` block after it ran
    pub fn play_frame(&self) -> Option<&Frame> {
        self.play_frame.as_ref()
    }

    pub fn current_span(&self) -> Option<SourceSpan> {
        self.current_span
    }

    /// Whether a dry-pass loop stopped before its condition did.
    ///
    /// State written after that point no longer matches the live run, so an
    /// error raised on it says nothing about the program.
    pub fn loop_cut_short(&self) -> bool {
        self.loop_cut
    }

    /// Look a variable up in `play` first, then in the globals
    pub fn final_value(&self, name: &str) -> Option<&Value> {
        let binding = self
            .play_frame
            .as_ref()
            .and_then(|frame| frame.get(name))
            .or_else(|| self.env.global().get(name))?;
        match binding {
            Binding::Variable(var) => Some(&var.value),
            _ => None,
        }
    }

    /// Execute a single statement
    pub(crate) fn execute_statement(&mut self, stmt: &Stmt) -> Result<ControlFlow, RuntimeError> {
        self.current_span = Some(stmt.span());

        match stmt {
            Stmt::VarDecl {
                var_type,
                names,
                init,
                immutable,
                span,
            } => {
                self.execute_var_decl(*var_type, names, init, *immutable, *span)?;
                Ok(ControlFlow::Normal)
            }

            Stmt::ArrayDecl {
                element_type,
                name,
                dims,
                init,
                immutable,
                span,
            } => {
                self.execute_array_decl(*element_type, name, dims, init, *immutable, *span)?;
                Ok(ControlFlow::Normal)
            }

            Stmt::StructDef { name, fields, span } => {
                self.execute_struct_def(name, fields, *span)?;
                Ok(ControlFlow::Normal)
            }

            Stmt::StructInstance {
                struct_name,
                name,
                args,
                immutable,
                span,
            } => {
                self.execute_struct_instance(struct_name, name, args, *immutable, *span)?;
                Ok(ControlFlow::Normal)
            }

            Stmt::FunctionDef {
                name,
                params,
                body,
                span,
            } => {
                self.define_function(name, params, body, *span)?;
                Ok(ControlFlow::Normal)
            }

            Stmt::Play { body, .. } => {
                self.execute_play(body)?;
                Ok(ControlFlow::Normal)
            }

            Stmt::Assign {
                target,
                op,
                value,
                span,
            } => {
                self.execute_assignment(target, *op, value, *span)?;
                Ok(ControlFlow::Normal)
            }

            Stmt::If {
                branches,
                else_branch,
                ..
            } => self.execute_if(branches, else_branch.as_deref()),

            Stmt::Flank {
                subject,
                arms,
                backup,
                ..
            } => self.execute_flank(subject, arms, backup),

            Stmt::For {
                counter,
                start,
                condition,
                update,
                body,
                span,
            } => self.execute_for(counter, start, condition, update, body, *span),

            Stmt::While {
                condition,
                body,
                span,
            } => self.execute_while(condition, body, *span),

            Stmt::Grind {
                body,
                condition,
                span,
            } => self.execute_grind(body, condition, *span),

            Stmt::Checkpoint(_) => Ok(ControlFlow::Break),
            Stmt::Resume(_) => Ok(ControlFlow::Continue),

            Stmt::Recall { values, .. } => self.execute_recall(values),

            Stmt::Shoot { value, newline, .. } => {
                self.execute_shoot(value, *newline)?;
                Ok(ControlFlow::Normal)
            }

            Stmt::Join { array, value, span } => {
                self.execute_join(array, value, *span)?;
                Ok(ControlFlow::Normal)
            }

            Stmt::Expr(expr) => {
                self.execute_expression_statement(expr)?;
                Ok(ControlFlow::Normal)
            }
        }
    }

    /// Run statements in the current frame until one leaves abnormally
    pub(crate) fn execute_block(&mut self, body: &[Stmt]) -> Result<ControlFlow, RuntimeError> {
        for stmt in body {
            let flow = self.execute_statement(stmt)?;
            if flow != ControlFlow::Normal {
                return Ok(flow);
            }
        }
        Ok(ControlFlow::Normal)
    }

    /// Run statements in a fresh frame, trimming back to the current depth afterwards
    pub(crate) fn execute_scoped(
        &mut self,
        label: &str,
        body: &[Stmt],
    ) -> Result<ControlFlow, RuntimeError> {
        let depth = self.env.depth();
        self.env.enter_scope(label);
        let flow = self.execute_block(body);
        self.env.restore_scope(depth);
        flow
    }

    fn execute_play(&mut self, body: &[Stmt]) -> Result<(), RuntimeError> {
        self.env.enter_scope("play");
        self.execute_block(body)?;
        self.play_frame = self.env.exit_scope(false);
        Ok(())
    }

    /// Turn a scope-stack failure into a positioned runtime error
    pub(crate) fn env_error(err: EnvError, span: SourceSpan) -> RuntimeError {
        RuntimeError::Environment {
            message: err.to_string(),
            span,
        }
    }

    pub(crate) fn lookup(&self, name: &str, span: SourceSpan) -> Result<&Binding, RuntimeError> {
        self.env.lookup(name).map_err(|err| Self::env_error(err, span))
    }

    pub(crate) fn lookup_mut(
        &mut self,
        name: &str,
        span: SourceSpan,
    ) -> Result<&mut Binding, RuntimeError> {
        self.env
            .lookup_mut(name)
            .map_err(|err| Self::env_error(err, span))
    }

    pub(crate) fn declare(
        &mut self,
        name: &str,
        binding: Binding,
        span: SourceSpan,
    ) -> Result<(), RuntimeError> {
        self.env
            .declare(name, binding)
            .map_err(|err| Self::env_error(err, span))
    }

    /// Count one loop iteration; `false` means the loop must stop here
    pub(crate) fn loop_tick(
        &mut self,
        iterations: &mut usize,
        span: SourceSpan,
    ) -> Result<bool, RuntimeError> {
        *iterations += 1;
        match self.mode {
            RunMode::Dry => {
                if *iterations > DRY_LOOP_LIMIT {
                    tracing::debug!(line = span.start.line, "dry pass cut a loop short");
                    self.loop_cut = true;
                    return Ok(false);
                }
            }
            RunMode::Live => {
                if *iterations % LIVE_YIELD_INTERVAL == 0 {
                    match self.host.idle() {
                        Ok(()) | Err(HostError::Closed) => {}
                        Err(err) => {
                            return Err(RuntimeError::Host {
                                message: err.to_string(),
                                span,
                            })
                        }
                    }
                    self.check_cancelled(span)?;
                }
            }
        }
        Ok(true)
    }

    pub(crate) fn check_cancelled(&self, span: SourceSpan) -> Result<(), RuntimeError> {
        match &self.token {
            Some(token) if !token.is_current() => Err(RuntimeError::Cancelled { span }),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::BufferedHost;
    use crate::pipeline;
    use pretty_assertions::assert_eq;

    /// Host whose every yield fails: an I/O error when `broken`, else closed input
    struct FailingIdle {
        broken: bool,
        yields: usize,
    }

    impl Host for FailingIdle {
        fn emit(&mut self, _text: &str) {}

        fn request_input(&mut self, _prompt: &str, _line: usize) {}

        fn poll_input(&mut self) -> Option<String> {
            None
        }

        fn idle(&mut self) -> Result<(), HostError> {
            self.yields += 1;
            if self.broken {
                Err(HostError::Io(std::io::Error::other("terminal gone")))
            } else {
                Err(HostError::Closed)
            }
        }
    }

    const BUSY: &str = "play() {\n\thp n: 0\n\tfor i: 0, i < 5000, i += 1 {\n\t\tn += 1\n\t}\n}";

    #[test]
    fn test_busy_loop_ignores_closed_input() {
        let program = pipeline::parse(BUSY).unwrap();
        let mut host = FailingIdle {
            broken: false,
            yields: 0,
        };
        Interpreter::new(&mut host, RunMode::Live)
            .run(&program)
            .unwrap();
        assert_eq!(host.yields, 1);
    }

    #[test]
    fn test_busy_loop_reports_host_io_failure() {
        let program = pipeline::parse(BUSY).unwrap();
        let mut host = FailingIdle {
            broken: true,
            yields: 0,
        };
        let err = Interpreter::new(&mut host, RunMode::Live)
            .run(&program)
            .unwrap_err();
        assert!(matches!(err, RuntimeError::Host { ref message, .. } if message.contains("terminal gone")));
    }

    #[test]
    fn test_dry_pass_marks_cut_loops() {
        let program = pipeline::parse(BUSY).unwrap();
        let mut host = BufferedHost::new();
        let mut dry = Interpreter::new(&mut host, RunMode::Dry);
        dry.run(&program).unwrap();
        assert!(dry.loop_cut_short());

        let short = pipeline::parse("play() {\n\tfor i: 0, i < 3, i += 1 {\n\t\thp y: i\n\t}\n}").unwrap();
        let mut host = BufferedHost::new();
        let mut dry = Interpreter::new(&mut host, RunMode::Dry);
        dry.run(&short).unwrap();
        assert!(!dry.loop_cut_short());
    }
}
