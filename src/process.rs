use std::io;

pub type Pid = libc::pid_t;

/// A child state change, as reported by `waitpid`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    Exited(i32),
    Signaled(i32),
    Stopped(i32),
    Continued,
}

impl WaitOutcome {
    pub fn from_raw(raw_status: libc::c_int) -> Option<Self> {
        if libc::WIFEXITED(raw_status) {
            return Some(Self::Exited(libc::WEXITSTATUS(raw_status)));
        }
        if libc::WIFSIGNALED(raw_status) {
            return Some(Self::Signaled(libc::WTERMSIG(raw_status)));
        }
        if libc::WIFSTOPPED(raw_status) {
            return Some(Self::Stopped(libc::WSTOPSIG(raw_status)));
        }
        if libc::WIFCONTINUED(raw_status) {
            return Some(Self::Continued);
        }
        None
    }

    /// Shell-style status: the exit code, or `128 + signal` for a process
    /// that was killed or stopped by a signal.
    pub fn status_code(self) -> i32 {
        match self {
            Self::Exited(code) => code,
            Self::Signaled(signal) | Self::Stopped(signal) => 128 + signal,
            Self::Continued => 0,
        }
    }
}

/// The OS operations the job-control code needs. The real implementation is
/// [`Os`]; tests substitute a scripted source of status changes.
pub trait ProcessControl {
    /// Block until `pid` exits, is killed, or stops.
    fn wait_for(&mut self, pid: Pid) -> io::Result<WaitOutcome>;

    /// Return the next pending state change of any child, without blocking.
    fn poll_any(&mut self) -> io::Result<Option<(Pid, WaitOutcome)>>;

    fn send_signal(&mut self, pid: Pid, signal: libc::c_int) -> io::Result<()>;
}

/// Talks to the kernel directly.
#[derive(Debug, Default, Clone, Copy)]
pub struct Os;

impl ProcessControl for Os {
    fn wait_for(&mut self, pid: Pid) -> io::Result<WaitOutcome> {
        let mut raw_status: libc::c_int = 0;

        loop {
            let rc = unsafe { libc::waitpid(pid, &mut raw_status, libc::WUNTRACED) };
            if rc < 0 {
                let err = io::Error::last_os_error();
                if err.raw_os_error() == Some(libc::EINTR) {
                    continue;
                }
                return Err(err);
            }

            match WaitOutcome::from_raw(raw_status) {
                Some(outcome) if outcome != WaitOutcome::Continued => return Ok(outcome),
                _ => continue,
            }
        }
    }

    fn poll_any(&mut self) -> io::Result<Option<(Pid, WaitOutcome)>> {
        let mut raw_status: libc::c_int = 0;
        let flags = libc::WNOHANG | libc::WUNTRACED | libc::WCONTINUED;

        loop {
            let rc = unsafe { libc::waitpid(-1, &mut raw_status, flags) };
            if rc == 0 {
                return Ok(None);
            }
            if rc < 0 {
                let err = io::Error::last_os_error();
                match err.raw_os_error() {
                    Some(code) if code == libc::EINTR => continue,
                    // No children left at all.
                    Some(code) if code == libc::ECHILD => return Ok(None),
                    _ => return Err(err),
                }
            }

            if let Some(outcome) = WaitOutcome::from_raw(raw_status) {
                return Ok(Some((rc, outcome)));
            }
        }
    }

    fn send_signal(&mut self, pid: Pid, signal: libc::c_int) -> io::Result<()> {
        if pid <= 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "invalid process id",
            ));
        }

        loop {
            let rc = unsafe { libc::kill(pid, signal) };
            if rc == 0 {
                return Ok(());
            }

            let err = io::Error::last_os_error();
            if err.raw_os_error() == Some(libc::EINTR) {
                continue;
            }
            return Err(err);
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn status_codes_follow_shell_convention() {
        assert_eq!(WaitOutcome::Exited(0).status_code(), 0);
        assert_eq!(WaitOutcome::Exited(7).status_code(), 7);
        assert_eq!(WaitOutcome::Signaled(libc::SIGINT).status_code(), 130);
        assert_eq!(WaitOutcome::Stopped(libc::SIGTSTP).status_code(), 128 + libc::SIGTSTP);
    }

    #[test]
    fn waits_for_real_exit_status() {
        let child = std::process::Command::new("sh")
            .args(["-c", "exit 42"])
            .spawn()
            .unwrap();

        let outcome = Os.wait_for(child.id() as Pid).unwrap();
        assert_eq!(outcome, WaitOutcome::Exited(42));
    }

    #[test]
    fn reports_stop_then_kill() {
        let child = std::process::Command::new("sleep")
            .arg("5")
            .spawn()
            .unwrap();
        let pid = child.id() as Pid;

        Os.send_signal(pid, libc::SIGSTOP).unwrap();
        assert_eq!(Os.wait_for(pid).unwrap(), WaitOutcome::Stopped(libc::SIGSTOP));

        Os.send_signal(pid, libc::SIGKILL).unwrap();
        assert_eq!(Os.wait_for(pid).unwrap(), WaitOutcome::Signaled(libc::SIGKILL));
    }

    #[test]
    fn rejects_non_positive_pid() {
        let err = Os.send_signal(0, libc::SIGTERM).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }
}
