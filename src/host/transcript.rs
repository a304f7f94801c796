/// Captured program output, split into lines
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    pub lines: Vec<TranscriptLine>,
    /// Whether the last line was closed by a newline
    closed: bool,
}

/// One line of output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptLine {
    pub text: String,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append text; embedded newlines start new lines
    pub fn print(&mut self, text: &str) {
        for (i, piece) in text.split('\n').enumerate() {
            if i > 0 {
                // a newline with no open line leaves a blank one behind
                if self.closed || self.lines.is_empty() {
                    self.lines.push(TranscriptLine {
                        text: String::new(),
                    });
                }
                self.closed = true;
            }
            if piece.is_empty() {
                continue;
            }
            match self.lines.last_mut() {
                Some(last) if !self.closed => last.text.push_str(piece),
                _ => self.lines.push(TranscriptLine {
                    text: piece.to_string(),
                }),
            }
            self.closed = false;
        }
    }

    /// All lines as plain strings
    pub fn get_output(&self) -> Vec<String> {
        self.lines.iter().map(|line| line.text.clone()).collect()
    }

    /// The full output with newlines restored
    pub fn text(&self) -> String {
        let mut out = self.get_output().join("\n");
        if self.closed && !self.lines.is_empty() {
            out.push('\n');
        }
        out
    }

    pub fn clear(&mut self) {
        self.lines.clear();
        self.closed = false;
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_print_joins_until_newline() {
        let mut transcript = Transcript::new();
        transcript.print("score: ");
        transcript.print("10");
        transcript.print("\n");
        transcript.print("done\n");
        assert_eq!(transcript.get_output(), vec!["score: 10", "done"]);
        assert_eq!(transcript.text(), "score: 10\ndone\n");
    }

    #[test]
    fn test_blank_lines_are_kept() {
        let mut transcript = Transcript::new();
        transcript.print("a\n\nb");
        assert_eq!(transcript.get_output(), vec!["a", "", "b"]);
        assert_eq!(transcript.text(), "a\n\nb");
    }
}
