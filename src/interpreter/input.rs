//! `load` and `loadNum`
//!
//! Input is the only place a run suspends. The live pass asks the host for a
//! line and then polls, yielding through [`Host::idle`] between polls. After
//! every yield the run token is checked so that a restart abandons the wait
//! instead of consuming input meant for the next run.
//!
//! [`Host::idle`]: crate::host::Host::idle

use crate::environment::{NumericHint, Value};
use crate::interpreter::builtins::is_decimal_text;
use crate::interpreter::engine::{Interpreter, RunMode};
use crate::interpreter::errors::RuntimeError;
use crate::parser::ast::{Expr, InputKind, SourceSpan};

/// Parse a `loadNum` reply: integers become `hp`, decimals `xp`
pub(crate) fn parse_number(line: &str, span: SourceSpan) -> Result<Value, RuntimeError> {
    let text = line.trim();
    if let Ok(n) = text.parse::<i64>() {
        return Ok(Value::Hp(n));
    }
    if is_decimal_text(text) {
        if let Ok(x) = text.parse::<f64>() {
            return Ok(Value::Xp(x));
        }
    }
    Err(RuntimeError::InvalidNumber {
        input: text.to_string(),
        span,
    })
}

impl Interpreter<'_> {
    pub(crate) fn read_input(
        &mut self,
        kind: InputKind,
        prompt: &Expr,
        span: SourceSpan,
    ) -> Result<Value, RuntimeError> {
        let prompt = match self.evaluate_expr(prompt)? {
            Value::Comms(text) => text,
            other => other.to_string(),
        };

        match self.mode {
            RunMode::Dry => Ok(match kind {
                InputKind::Load => Value::Comms(String::new()),
                InputKind::LoadNum => Value::Pending(NumericHint::Any),
            }),
            RunMode::Live => {
                let line = self.wait_for_input(&prompt, span)?;
                match kind {
                    InputKind::Load => Ok(Value::Comms(line)),
                    InputKind::LoadNum => parse_number(&line, span),
                }
            }
        }
    }

    fn wait_for_input(&mut self, prompt: &str, span: SourceSpan) -> Result<String, RuntimeError> {
        tracing::debug!(prompt, line = span.start.line, "waiting for input");
        self.host.request_input(prompt, span.start.line);

        loop {
            self.check_cancelled(span)?;
            if let Some(line) = self.host.poll_input() {
                tracing::debug!(len = line.len(), "input received");
                return Ok(line);
            }
            self.host.idle().map_err(|err| RuntimeError::Host {
                message: err.to_string(),
                span,
            })?;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{BufferedHost, Session};
    use crate::parser::ast::SourceLocation;
    use pretty_assertions::assert_eq;

    fn span() -> SourceSpan {
        SourceSpan::point(SourceLocation::new(4, 9))
    }

    fn prompt() -> Expr {
        Expr::CommsLiteral("level? ".into(), span())
    }

    #[test]
    fn test_parse_number_kinds() {
        assert_eq!(parse_number(" 12 ", span()), Ok(Value::Hp(12)));
        assert_eq!(parse_number("-0.5", span()), Ok(Value::Xp(-0.5)));
        assert!(matches!(
            parse_number("ten", span()),
            Err(RuntimeError::InvalidNumber { .. })
        ));
    }

    #[test]
    fn test_dry_pass_never_asks_the_host() {
        let mut host = BufferedHost::new();
        {
            let mut interp = Interpreter::new(&mut host, RunMode::Dry);
            assert_eq!(
                interp.read_input(InputKind::LoadNum, &prompt(), span()),
                Ok(Value::Pending(NumericHint::Any))
            );
            assert_eq!(
                interp.read_input(InputKind::Load, &prompt(), span()),
                Ok(Value::Comms(String::new()))
            );
        }
        assert!(host.prompts().is_empty());
    }

    #[test]
    fn test_live_pass_reads_from_host() {
        let mut host = BufferedHost::with_inputs(["3.5"]);
        {
            let mut interp = Interpreter::new(&mut host, RunMode::Live);
            assert_eq!(
                interp.read_input(InputKind::LoadNum, &prompt(), span()),
                Ok(Value::Xp(3.5))
            );
        }
        assert_eq!(host.prompts(), ["level? "]);
    }

    #[test]
    fn test_stale_token_cancels_the_wait() {
        let session = Session::new();
        let stale = session.begin_run();
        session.begin_run();

        let mut host = BufferedHost::with_inputs(["1"]);
        let mut interp = Interpreter::new(&mut host, RunMode::Live).with_token(stale);
        assert_eq!(
            interp.read_input(InputKind::Load, &prompt(), span()),
            Err(RuntimeError::Cancelled { span: span() })
        );
    }

    #[test]
    fn test_closed_input_is_a_host_error() {
        let mut host = BufferedHost::new();
        let mut interp = Interpreter::new(&mut host, RunMode::Live);
        assert!(matches!(
            interp.read_input(InputKind::Load, &prompt(), span()),
            Err(RuntimeError::Host { .. })
        ));
    }
}
