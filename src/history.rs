use std::collections::VecDeque;
use std::io::Write;

use crate::config::{MAX_HISTORY, bounded_command_text};

/// The last [`MAX_HISTORY`] input lines, oldest first.
#[derive(Debug, Default)]
pub struct History {
    lines: VecDeque<String>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, line: &str) {
        if self.lines.len() == MAX_HISTORY {
            self.lines.pop_front();
        }
        self.lines.push_back(bounded_command_text(line));
    }

    pub fn print(&self, stdout: &mut dyn Write) {
        if self.lines.is_empty() {
            let _ = writeln!(stdout, "No commands in history.");
            return;
        }
        for (i, line) in self.lines.iter().enumerate() {
            let _ = writeln!(stdout, "{:4}  {line}", i + 1);
        }
    }
}
