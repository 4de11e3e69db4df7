use std::io::Write;

use crate::builtins::{self, BuiltinAction};
use crate::executor;
use crate::expander;
use crate::history::History;
use crate::jobs::JobTable;
use crate::parser;
use crate::process::{Os, ProcessControl};
use crate::reaper;

/// Interpreter state that lives across input lines.
pub struct Shell {
    pub jobs: JobTable,
    pub history: History,
    /// Status of the last command: exit code, or `128 + signal`.
    pub last_status: i32,
    pub procs: Box<dyn ProcessControl>,
}

impl Default for Shell {
    fn default() -> Self {
        Self::new(Box::new(Os))
    }
}

impl Shell {
    pub fn new(procs: Box<dyn ProcessControl>) -> Self {
        Self {
            jobs: JobTable::new(),
            history: History::new(),
            last_status: 0,
            procs,
        }
    }

    /// Run one input line. Returns `Some(code)` when the shell should exit.
    pub fn run_line(
        &mut self,
        line: &str,
        stdout: &mut dyn Write,
        stderr: &mut dyn Write,
    ) -> Option<i32> {
        let parsed = match parser::parse_line(line) {
            Ok(Some(parsed)) => parsed,
            Ok(None) => return None,
            Err(msg) => {
                let _ = writeln!(stderr, "{msg}");
                self.last_status = 2;
                return None;
            }
        };

        let pipeline = match expander::expand_line(&parsed, self.last_status) {
            Ok(pipeline) => pipeline,
            Err(msg) => {
                let _ = writeln!(stderr, "{msg}");
                self.last_status = 1;
                return None;
            }
        };

        // Builtins only run as a lone command; the background marker is
        // ignored for them.
        if let [stage] = pipeline.stages.as_slice() {
            if builtins::is_builtin(&stage.program) {
                match builtins::execute(&stage.program, &stage.args, self, stdout, stderr) {
                    BuiltinAction::Continue(status) => self.last_status = status,
                    BuiltinAction::Exit(code) => return Some(code),
                }
                let _ = stdout.flush();
                return None;
            }
        }

        self.last_status = executor::execute(
            &pipeline,
            &mut self.jobs,
            self.procs.as_mut(),
            stdout,
            stderr,
        );
        None
    }

    /// Fold pending child state changes into the job table and print the
    /// resulting notices.
    pub fn reap_and_report(&mut self, stdout: &mut dyn Write) {
        reaper::reap_and_report(&mut self.jobs, self.procs.as_mut(), stdout);
    }
}
