//! Line-oriented host for `--plain` runs

use super::{Host, HostError};
use std::collections::VecDeque;
use std::io::{self, BufRead, Write};

/// Writes output straight through and reads input a line at a time
///
/// Scripted lines are answered first and echoed after their prompt, so a
/// scripted run reads like an interactive one.
pub struct StdioHost<R, W> {
    scripted: VecDeque<String>,
    reader: R,
    writer: W,
    waiting: bool,
    closed: bool,
    error: Option<io::Error>,
}

impl<R: BufRead, W: Write> StdioHost<R, W> {
    pub fn new(scripted: Vec<String>, reader: R, writer: W) -> Self {
        StdioHost {
            scripted: scripted.into(),
            reader,
            writer,
            waiting: false,
            closed: false,
            error: None,
        }
    }

    pub fn into_writer(self) -> W {
        self.writer
    }

    fn write(&mut self, text: &str) {
        if self.error.is_some() {
            return;
        }
        let result = self
            .writer
            .write_all(text.as_bytes())
            .and_then(|()| self.writer.flush());
        if let Err(err) = result {
            self.error = Some(err);
        }
    }
}

impl<R: BufRead, W: Write> Host for StdioHost<R, W> {
    fn emit(&mut self, text: &str) {
        self.write(text);
    }

    fn request_input(&mut self, prompt: &str, _line: usize) {
        self.write(&format!("{} ", prompt));
        self.waiting = true;
    }

    fn poll_input(&mut self) -> Option<String> {
        if !self.waiting {
            return None;
        }
        if let Some(line) = self.scripted.pop_front() {
            self.write(&format!("{}\n", line));
            self.waiting = false;
            return Some(line);
        }

        let mut line = String::new();
        match self.reader.read_line(&mut line) {
            Ok(0) => {
                self.closed = true;
                None
            }
            Ok(_) => {
                let len = line.trim_end_matches(['\n', '\r']).len();
                line.truncate(len);
                self.waiting = false;
                Some(line)
            }
            Err(err) => {
                self.error = Some(err);
                None
            }
        }
    }

    fn idle(&mut self) -> Result<(), HostError> {
        if let Some(err) = self.error.take() {
            return Err(HostError::Io(err));
        }
        if self.waiting && self.closed {
            return Err(HostError::Closed);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_scripted_lines_come_before_reader() {
        let mut host = StdioHost::new(vec!["Ana".into()], "42\r\n".as_bytes(), Vec::new());

        host.request_input("Name?", 1);
        assert_eq!(host.poll_input().as_deref(), Some("Ana"));
        host.emit("hi Ana\n");
        host.request_input("Age?", 2);
        assert_eq!(host.poll_input().as_deref(), Some("42"));

        host.request_input("More?", 3);
        assert_eq!(host.poll_input(), None);
        assert!(matches!(host.idle(), Err(HostError::Closed)));

        let written = String::from_utf8(host.into_writer()).unwrap();
        assert_eq!(written, "Name? Ana\nhi Ana\nAge? More? ");
    }
}
