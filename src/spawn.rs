use std::io;
use std::os::fd::AsRawFd;
use std::os::unix::process::CommandExt;
use std::process::Command;

use os_pipe::{PipeReader, PipeWriter};

use crate::process::Pid;

/// Exit status of a child whose program could not be executed.
pub const EXIT_NOT_FOUND: i32 = 127;

const NOT_FOUND_NOTICE: &[u8] = b"mini-shell>Command not found--Did you mean something else?\n";

/// Everything a child needs before it replaces its image: what to run, which
/// pipe ends become stdin/stdout, and which signals go back to their default
/// disposition.
///
/// Pipe ends are created close-on-exec, so any descriptor not bound here is
/// closed when the program starts.
#[derive(Debug)]
pub struct SpawnConfig {
    pub program: String,
    pub args: Vec<String>,
    pub stdin: Option<PipeReader>,
    pub stdout: Option<PipeWriter>,
    pub default_signals: Vec<libc::c_int>,
}

impl SpawnConfig {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            stdin: None,
            stdout: None,
            // The shell ignores or intercepts these; the program must not.
            default_signals: vec![libc::SIGINT, libc::SIGTSTP, libc::SIGPIPE],
        }
    }

    pub fn stdin(mut self, reader: PipeReader) -> Self {
        self.stdin = Some(reader);
        self
    }

    pub fn stdout(mut self, writer: PipeWriter) -> Self {
        self.stdout = Some(writer);
        self
    }

    /// Runs in the forked child only.
    fn exec_child(self, mut command: Command) -> ! {
        for &signal in &self.default_signals {
            unsafe { libc::signal(signal, libc::SIG_DFL) };
        }

        if let Some(reader) = &self.stdin {
            unsafe { libc::dup2(reader.as_raw_fd(), libc::STDIN_FILENO) };
        }
        if let Some(writer) = &self.stdout {
            unsafe { libc::dup2(writer.as_raw_fd(), libc::STDOUT_FILENO) };
        }

        // Only returns on failure.
        let _ = command.exec();

        unsafe {
            libc::write(
                libc::STDERR_FILENO,
                NOT_FOUND_NOTICE.as_ptr().cast(),
                NOT_FOUND_NOTICE.len(),
            );
            libc::_exit(EXIT_NOT_FOUND)
        }
    }
}

/// Fork a child that runs `config`, returning its pid to the parent.
///
/// The parent's copies of the bound pipe ends are closed when `config` is
/// dropped on return.
pub fn spawn(config: SpawnConfig) -> io::Result<Pid> {
    // Built before forking so the child does as little as possible.
    let mut command = Command::new(&config.program);
    command.args(&config.args);

    let pid = unsafe { libc::fork() };
    if pid < 0 {
        return Err(io::Error::last_os_error());
    }
    if pid == 0 {
        config.exec_child(command);
    }

    log::debug!("spawned {} as pid {pid}", config.program);
    Ok(pid)
}
