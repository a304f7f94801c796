//! Main TUI application state and logic
//!
//! A run is driven from inside [`App::start_run`]. The live interpreter
//! talks to a [`TerminalHost`], which redraws the screen and reads keys
//! every time the run yields, so the UI stays responsive both while a
//! `load` waits for input and while a long loop is spinning.
//!
//! Restarting (Ctrl-R) and quitting both begin a new run on the
//! [`Session`], which turns the running interpreter's token stale; the
//! interpreter notices on its next check and unwinds with
//! [`RuntimeError::Cancelled`].
//!
//! [`RuntimeError::Cancelled`]: crate::interpreter::RuntimeError::Cancelled

use crate::host::{Host, HostError, Session, Transcript};
use crate::parser::ast::Program;
use crate::pipeline::{self, PipelineError};
use crate::ui::panes::{
    render_source_pane, render_status_bar, render_terminal_pane, InputLine, LineMark, RunState,
};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{
    backend::Backend,
    layout::{Constraint, Direction, Layout},
    Frame, Terminal,
};
use std::io;
use std::time::Duration;

const INPUT_POLL: Duration = Duration::from_millis(50);

/// Which pane is currently focused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusedPane {
    Source,
    Output,
}

impl FocusedPane {
    pub fn next(self) -> Self {
        match self {
            FocusedPane::Source => FocusedPane::Output,
            FocusedPane::Output => FocusedPane::Source,
        }
    }
}

/// Everything the screen shows, shared between the app and its host
#[derive(Debug)]
pub struct UiState {
    pub transcript: Transcript,
    pub focused_pane: FocusedPane,
    pub source_scroll: usize,
    pub output_scroll: usize,
    pub status_message: String,
    pub run_state: RunState,
    /// Set while a `load` is waiting
    pub input: Option<InputLine>,
    /// A line entered but not yet picked up by the interpreter
    submitted: Option<String>,
    pub mark: Option<(usize, LineMark)>,
    pub restart_requested: bool,
    pub should_quit: bool,
}

impl Default for UiState {
    fn default() -> Self {
        UiState {
            transcript: Transcript::new(),
            focused_pane: FocusedPane::Output,
            source_scroll: 0,
            output_scroll: 0,
            status_message: String::from("Ready!"),
            run_state: RunState::Running,
            input: None,
            submitted: None,
            mark: None,
            restart_requested: false,
            should_quit: false,
        }
    }
}

impl UiState {
    pub fn new() -> Self {
        Self::default()
    }

    fn reset_for_run(&mut self) {
        self.transcript.clear();
        self.output_scroll = 0;
        self.input = None;
        self.submitted = None;
        self.mark = None;
        self.restart_requested = false;
        self.run_state = RunState::Running;
        self.status_message = String::from("Running...");
    }

    /// Handle keyboard events
    pub fn handle_key_event(&mut self, key: KeyEvent) {
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            match key.code {
                KeyCode::Char('r') | KeyCode::Char('R') => self.restart_requested = true,
                KeyCode::Char('c') => self.should_quit = true,
                _ => {}
            }
            return;
        }

        match key.code {
            KeyCode::Esc => self.should_quit = true,
            KeyCode::Tab => self.focused_pane = self.focused_pane.next(),
            KeyCode::Up => match self.focused_pane {
                FocusedPane::Source => self.source_scroll = self.source_scroll.saturating_sub(1),
                FocusedPane::Output => self.output_scroll = self.output_scroll.saturating_sub(1),
            },
            KeyCode::Down => match self.focused_pane {
                FocusedPane::Source => self.source_scroll = self.source_scroll.saturating_add(1),
                FocusedPane::Output => self.output_scroll = self.output_scroll.saturating_add(1),
            },
            KeyCode::Enter => self.submit(),
            KeyCode::Backspace => {
                if let Some(input) = self.input.as_mut() {
                    input.buffer.pop();
                }
            }
            KeyCode::Char(c) => match self.input.as_mut() {
                Some(input) => input.buffer.push(c),
                None if c == 'q' || c == 'Q' => self.should_quit = true,
                None => {}
            },
            _ => {}
        }
    }

    /// Hand the typed line to the waiting `load` and echo it into the output
    fn submit(&mut self) {
        let Some(input) = self.input.take() else {
            return;
        };
        self.transcript
            .print(&format!("{} {}\n", input.prompt, input.buffer));
        self.output_scroll = usize::MAX;
        self.submitted = Some(input.buffer);
        self.mark = None;
        self.run_state = RunState::Running;
        self.status_message = String::from("Running...");
    }

    fn finish_run(&mut self, source: &str, result: Result<(), PipelineError>) {
        self.input = None;
        match result {
            Ok(()) => {
                self.run_state = RunState::Finished;
                self.mark = None;
                self.status_message = String::from("Run finished, Ctrl-R to respawn");
            }
            // abandoned on purpose; the next run or the exit takes over
            Err(_) if self.restart_requested || self.should_quit => {}
            Err(err) => {
                tracing::debug!(error = %err, "run failed");
                if let PipelineError::Runtime(runtime) = &err {
                    self.mark = Some((runtime.span().start.line, LineMark::Error));
                }
                if !self.transcript.is_empty() {
                    self.transcript.print("\n");
                }
                self.transcript.print(&err.render(source));
                self.output_scroll = usize::MAX;
                self.run_state = RunState::Failed;
                self.status_message = err.to_string();
            }
        }
    }
}

/// [`Host`] that draws the UI and feeds it key presses whenever the run
/// yields
pub struct TerminalHost<'a, B: Backend> {
    terminal: &'a mut Terminal<B>,
    state: &'a mut UiState,
    session: &'a Session,
    source: &'a str,
}

impl<'a, B: Backend> TerminalHost<'a, B> {
    pub fn new(
        terminal: &'a mut Terminal<B>,
        state: &'a mut UiState,
        session: &'a Session,
        source: &'a str,
    ) -> Self {
        TerminalHost {
            terminal,
            state,
            session,
            source,
        }
    }
}

impl<B: Backend> Host for TerminalHost<'_, B> {
    fn emit(&mut self, text: &str) {
        self.state.transcript.print(text);
        self.state.output_scroll = usize::MAX;
    }

    fn request_input(&mut self, prompt: &str, line: usize) {
        self.state.input = Some(InputLine {
            prompt: prompt.to_string(),
            buffer: String::new(),
        });
        self.state.mark = Some((line, LineMark::Input));
        self.state.run_state = RunState::Waiting;
        self.state.status_message = format!("Waiting for input (line {})", line);
    }

    fn poll_input(&mut self) -> Option<String> {
        self.state.submitted.take()
    }

    fn idle(&mut self) -> Result<(), HostError> {
        self.terminal
            .draw(|frame| render(frame, self.source, self.state))?;

        let timeout = if self.state.input.is_some() {
            INPUT_POLL
        } else {
            Duration::ZERO
        };
        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    self.state.handle_key_event(key);
                }
            }
        }

        if self.state.restart_requested || self.state.should_quit {
            // stale the running token
            self.session.begin_run();
        }
        if self.state.should_quit {
            return Err(HostError::Closed);
        }
        Ok(())
    }
}

/// The main application state
pub struct App {
    source_code: String,
    program: Program,
    session: Session,
    state: UiState,
}

impl App {
    /// Create an app for a program that already passed analysis
    pub fn new(source_code: String, program: Program) -> Self {
        App {
            source_code,
            program,
            session: Session::new(),
            state: UiState::new(),
        }
    }

    pub fn state(&self) -> &UiState {
        &self.state
    }

    /// Run the TUI application
    pub fn run<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> io::Result<()> {
        self.start_run(terminal);

        while !self.state.should_quit {
            if self.state.restart_requested {
                self.start_run(terminal);
                continue;
            }

            terminal.draw(|frame| render(frame, &self.source_code, &mut self.state))?;

            if event::poll(INPUT_POLL)? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.state.handle_key_event(key);
                    }
                }
            }
        }

        Ok(())
    }

    /// Run the program from the top; returns when it ends, fails, or is
    /// abandoned
    pub fn start_run<B: Backend>(&mut self, terminal: &mut Terminal<B>) {
        self.state.reset_for_run();
        let token = self.session.begin_run();
        tracing::debug!(run = token.id(), "starting run");

        let result = {
            let mut host =
                TerminalHost::new(terminal, &mut self.state, &self.session, &self.source_code);
            pipeline::run(&self.program, &mut host, Some(token))
        };
        self.state.finish_run(&self.source_code, result);
    }
}

/// Render the UI
fn render(frame: &mut Frame, source: &str, state: &mut UiState) {
    let size = frame.area();

    let main_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(1)])
        .split(size);

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(main_chunks[0]);

    render_source_pane(
        frame,
        columns[0],
        source,
        state.mark,
        state.focused_pane == FocusedPane::Source,
        &mut state.source_scroll,
    );

    render_terminal_pane(
        frame,
        columns[1],
        &state.transcript,
        state.input.as_ref(),
        state.focused_pane == FocusedPane::Output,
        &mut state.output_scroll,
    );

    render_status_bar(
        frame,
        main_chunks[1],
        &state.status_message,
        state.run_state,
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpreter::RuntimeError;
    use crate::parser::ast::{SourceLocation, SourceSpan};
    use pretty_assertions::assert_eq;
    use ratatui::backend::TestBackend;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn screen_text(terminal: &Terminal<TestBackend>) -> String {
        terminal
            .backend()
            .buffer()
            .content
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    #[test]
    fn test_typing_and_submitting_input() {
        let mut state = UiState::new();
        state.input = Some(InputLine {
            prompt: "Name?".into(),
            buffer: String::new(),
        });
        for c in "Anaa".chars() {
            state.handle_key_event(press(KeyCode::Char(c)));
        }
        state.handle_key_event(press(KeyCode::Backspace));
        // 'q' while typing is text, not quit
        state.handle_key_event(press(KeyCode::Char('q')));
        state.handle_key_event(press(KeyCode::Enter));

        assert!(!state.should_quit);
        assert!(state.input.is_none());
        assert_eq!(state.submitted.as_deref(), Some("Anaq"));
        assert_eq!(state.transcript.text(), "Name? Anaq\n");
    }

    #[test]
    fn test_control_keys() {
        let mut state = UiState::new();
        state.handle_key_event(KeyEvent::new(KeyCode::Char('r'), KeyModifiers::CONTROL));
        assert!(state.restart_requested);

        state.handle_key_event(press(KeyCode::Tab));
        assert_eq!(state.focused_pane, FocusedPane::Source);

        state.handle_key_event(press(KeyCode::Char('q')));
        assert!(state.should_quit);
    }

    #[test]
    fn test_host_routes_output_and_input() {
        let mut terminal = Terminal::new(TestBackend::new(80, 20)).unwrap();
        let mut state = UiState::new();
        let session = Session::new();
        let mut host = TerminalHost::new(&mut terminal, &mut state, &session, "");

        host.emit("hello\n");
        host.request_input("Level?", 3);
        assert_eq!(host.poll_input(), None);
        host.state.input.as_mut().unwrap().buffer.push('7');
        host.state.submit();
        assert_eq!(host.poll_input().as_deref(), Some("7"));

        assert_eq!(state.transcript.get_output(), vec!["hello", "Level? 7"]);
    }

    #[test]
    fn test_failed_run_marks_error_line() {
        let source = "play() {\n    hp x: 1 / 0\n}";
        let mut state = UiState::new();
        let span = SourceSpan::new(SourceLocation::new(2, 11), SourceLocation::new(2, 16));
        state.finish_run(
            source,
            Err(PipelineError::Runtime(RuntimeError::DivisionByZero { span })),
        );

        assert_eq!(state.run_state, RunState::Failed);
        assert_eq!(state.mark, Some((2, LineMark::Error)));
        assert!(state.transcript.text().starts_with("Runtime Error: division by zero"));

        let mut terminal = Terminal::new(TestBackend::new(100, 20)).unwrap();
        terminal
            .draw(|frame| render(frame, source, &mut state))
            .unwrap();
        let text = screen_text(&terminal);
        assert!(text.contains("hp x: 1 / 0"));
        assert!(text.contains("ERROR"));
    }
}
