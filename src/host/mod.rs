//! The boundary between the interpreter and whatever runs it
//!
//! The interpreter never touches the console itself. Output goes through
//! [`Host::emit`] and input through a request/poll pair, so the same engine
//! drives the terminal UI, the plain stdio mode and the tests.
//!
//! # Run control
//!
//! A [`Session`] hands out a [`RunToken`] per run. Starting a new run bumps
//! the shared counter, which turns every older token stale; an interpreter
//! blocked in an input wait notices on its next `idle()` and aborts.

pub mod stdio;
pub mod transcript;

use std::cell::Cell;
use std::collections::VecDeque;
use std::rc::Rc;
use thiserror::Error;

pub use stdio::StdioHost;
pub use transcript::{Transcript, TranscriptLine};

/// Host-level failures that abort a run
#[derive(Debug, Error)]
pub enum HostError {
    /// No more input will ever arrive
    #[error("input channel closed")]
    Closed,

    #[error("terminal I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Output sink and input channel used by the interpreter
pub trait Host {
    /// Append text to the program output
    fn emit(&mut self, text: &str);

    /// Ask for one line of input, shown with `prompt`; `line` is the source
    /// line of the `load`
    fn request_input(&mut self, prompt: &str, line: usize);

    /// The requested line, once it has arrived
    fn poll_input(&mut self) -> Option<String>;

    /// Cooperative yield while waiting for input
    fn idle(&mut self) -> Result<(), HostError>;
}

/// Monotonic run counter shared between a session and its tokens
#[derive(Debug, Clone, Default)]
pub struct RunCounter(Rc<Cell<u64>>);

impl RunCounter {
    pub fn current(&self) -> u64 {
        self.0.get()
    }

    fn bump(&self) -> u64 {
        let next = self.0.get() + 1;
        self.0.set(next);
        next
    }
}

/// Identifies one run; stale once a newer run has begun
#[derive(Debug, Clone)]
pub struct RunToken {
    id: u64,
    counter: RunCounter,
}

impl RunToken {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn is_current(&self) -> bool {
        self.counter.current() == self.id
    }
}

/// Owns the run counter for one loaded program
#[derive(Debug, Default)]
pub struct Session {
    counter: RunCounter,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new run, cancelling any run still in progress
    pub fn begin_run(&self) -> RunToken {
        let id = self.counter.bump();
        tracing::debug!(run = id, "begin run");
        RunToken {
            id,
            counter: self.counter.clone(),
        }
    }

    pub fn counter(&self) -> RunCounter {
        self.counter.clone()
    }
}

/// Host with a scripted input queue and an in-memory transcript
#[derive(Debug, Default)]
pub struct BufferedHost {
    inputs: VecDeque<String>,
    transcript: Transcript,
    prompts: Vec<String>,
    waiting: bool,
}

impl BufferedHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_inputs<I, S>(inputs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        BufferedHost {
            inputs: inputs.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn push_input(&mut self, line: impl Into<String>) {
        self.inputs.push_back(line.into());
    }

    /// Everything emitted so far
    pub fn output(&self) -> String {
        self.transcript.text()
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    /// Prompts in the order they were requested
    pub fn prompts(&self) -> &[String] {
        &self.prompts
    }
}

impl Host for BufferedHost {
    fn emit(&mut self, text: &str) {
        self.transcript.print(text);
    }

    fn request_input(&mut self, prompt: &str, _line: usize) {
        self.prompts.push(prompt.to_string());
        self.waiting = true;
    }

    fn poll_input(&mut self) -> Option<String> {
        if !self.waiting {
            return None;
        }
        let line = self.inputs.pop_front()?;
        self.waiting = false;
        Some(line)
    }

    fn idle(&mut self) -> Result<(), HostError> {
        if self.waiting && self.inputs.is_empty() {
            return Err(HostError::Closed);
        }
        Ok(())
    }
}

/// Host for the dry pass: output is discarded and input is never requested
#[derive(Debug, Default, Clone, Copy)]
pub struct NullHost;

impl Host for NullHost {
    fn emit(&mut self, _text: &str) {}

    fn request_input(&mut self, _prompt: &str, _line: usize) {}

    fn poll_input(&mut self) -> Option<String> {
        None
    }

    fn idle(&mut self) -> Result<(), HostError> {
        Err(HostError::Closed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_run_makes_old_token_stale() {
        let session = Session::new();
        let first = session.begin_run();
        assert!(first.is_current());

        let second = session.begin_run();
        assert!(!first.is_current());
        assert!(second.is_current());
        assert!(second.id() > first.id());
    }

    #[test]
    fn test_buffered_host_answers_requests_in_order() {
        let mut host = BufferedHost::with_inputs(["7", "eight"]);
        assert_eq!(host.poll_input(), None);

        host.request_input("a?", 1);
        assert_eq!(host.poll_input().as_deref(), Some("7"));
        host.request_input("b?", 1);
        assert_eq!(host.poll_input().as_deref(), Some("eight"));

        host.request_input("c?", 1);
        assert!(matches!(host.idle(), Err(HostError::Closed)));
        assert_eq!(host.prompts(), ["a?", "b?", "c?"]);
    }
}
