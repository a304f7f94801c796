//! The three pipeline stages and the error that can stop each of them
//!
//! ```text
//! source → analyze (tokens + lexical diagnostics)
//!        → parse   (checked AST, first error aborts)
//!        → run     (dry pass, then live pass)
//! ```
//!
//! Each stage gates the next: any lexical diagnostic blocks parsing, and a
//! parse error blocks execution.

use crate::diagnostic;
use crate::host::{Host, NullHost, RunToken};
use crate::interpreter::{Interpreter, RunMode, RuntimeError};
use crate::parser::ast::Program;
use crate::parser::{parse_and_check, tokenize, LexError, LexOutput, ParseError};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PipelineError {
    /// Every diagnostic the scan produced
    #[error("{} lexical diagnostic(s)", .0.len())]
    Lex(Vec<LexError>),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}

impl PipelineError {
    /// Human-readable report; parse and runtime errors carry a source excerpt
    pub fn render(&self, source: &str) -> String {
        match self {
            PipelineError::Lex(errors) => errors
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("\n"),
            PipelineError::Parse(err) => {
                diagnostic::render(source, err.kind.category(), &err.message, err.span)
            }
            PipelineError::Runtime(err) => {
                diagnostic::render(source, err.category(), &err.to_string(), err.span())
            }
        }
    }
}

/// Scan `source`; diagnostics never stop the scan
#[tracing::instrument(level = "debug", skip_all, fields(bytes = source.len()))]
pub fn analyze(source: &str) -> LexOutput {
    let output = tokenize(source);
    tracing::debug!(
        tokens = output.tokens.len(),
        diagnostics = output.diagnostics.len(),
        "analysis finished"
    );
    output
}

/// Scan and check `source`
#[tracing::instrument(level = "debug", skip_all)]
pub fn parse(source: &str) -> Result<Program, PipelineError> {
    let output = analyze(source);
    if !output.is_clean() {
        return Err(PipelineError::Lex(output.diagnostics));
    }
    let program = parse_and_check(output.tokens)?;
    tracing::debug!(items = program.items.len(), "parse finished");
    Ok(program)
}

/// Run a checked program: first a dry pass with no output and symbolic
/// input, then the live pass against `host`
///
/// An error the dry pass hits after cutting a loop short is not reported;
/// the live pass decides.
#[tracing::instrument(level = "debug", skip_all)]
pub fn run(
    program: &Program,
    host: &mut dyn Host,
    token: Option<RunToken>,
) -> Result<(), PipelineError> {
    let mut null = NullHost;
    let mut dry = Interpreter::new(&mut null, RunMode::Dry);
    match dry.run(program) {
        Ok(()) => tracing::debug!("dry pass clean"),
        Err(err) if dry.loop_cut_short() => {
            tracing::debug!(error = %err, "dry pass indeterminate after a cut loop");
        }
        Err(err) => return Err(err.into()),
    }

    let mut live = Interpreter::new(host, RunMode::Live);
    if let Some(token) = token {
        live = live.with_token(token);
    }
    live.run(program)?;
    Ok(())
}

/// Parse and run `source` in one call
pub fn execute(source: &str, host: &mut dyn Host) -> Result<(), PipelineError> {
    let program = parse(source)?;
    run(&program, host, None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::BufferedHost;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_lexical_errors_block_parsing() {
        let err = parse("play() {\n    hp x: 5 $\n}").unwrap_err();
        assert!(matches!(err, PipelineError::Lex(ref errors) if !errors.is_empty()));
    }

    #[test]
    fn test_dry_pass_catches_errors_before_any_output() {
        let source = "play() {\n    shootNxt(\"ready\")\n    hp x: 5 / 0\n}";
        let mut host = BufferedHost::new();
        let err = execute(source, &mut host).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Runtime(RuntimeError::DivisionByZero { .. })
        ));
        assert_eq!(host.output(), "");
    }

    #[test]
    fn test_runtime_error_renders_excerpt() {
        let source = "play() {\n    hp x: 5 % 0\n}";
        let mut host = BufferedHost::new();
        let err = execute(source, &mut host).unwrap_err();
        let report = err.render(source);
        assert!(report.starts_with("Runtime Error: modulo by zero at line 2"));
        assert!(report.contains("2 |     hp x: 5 % 0"));
        assert!(report.ends_with('^'));
    }

    #[test]
    fn test_errors_before_a_cut_loop_still_stop_the_run() {
        let source = "play() {\n    shootNxt(\"ready\")\n    hp x: 5 / 0\n    for i: 0, i < 2000, i += 1 {\n        hp y: i\n    }\n}";
        let mut host = BufferedHost::new();
        let err = execute(source, &mut host).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Runtime(RuntimeError::DivisionByZero { .. })
        ));
        assert_eq!(host.output(), "");
    }
}
