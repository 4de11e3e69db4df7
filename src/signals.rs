//! The signal relay.
//!
//! Everything here is reachable from asynchronous context, so the shared state
//! is limited to atomics: the pending-reap flag, the foreground slot and a
//! fixed array of tracked pids mirrored from the job table.

use std::io;
use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};

use crate::config::MAX_JOBS;
use crate::error::{Result, ShellError};
use crate::process::Pid;

static PENDING_REAP: AtomicBool = AtomicBool::new(false);
static FOREGROUND_PID: AtomicI32 = AtomicI32::new(0);
static TRACKED_PIDS: [AtomicI32; MAX_JOBS] = [const { AtomicI32::new(0) }; MAX_JOBS];

const SHUTDOWN_NOTICE: &[u8] = b"\nmini-shell terminated\n";

/// Signals that must never suspend the shell itself.
const IGNORED: [libc::c_int; 3] = [libc::SIGTTOU, libc::SIGTTIN, libc::SIGTSTP];

/// Install the shell's signal policy. Call once, before the first fork.
pub fn install() -> Result<()> {
    for signal in IGNORED {
        ignore(signal).map_err(|err| ShellError::Install(err.to_string()))?;
    }

    install_child_handler().map_err(|err| ShellError::Install(err.to_string()))?;

    ctrlc::set_handler(|| {
        emergency_shutdown();
    })
    .map_err(|err| ShellError::Install(err.to_string()))
}

fn ignore(signal: libc::c_int) -> io::Result<()> {
    let previous = unsafe { libc::signal(signal, libc::SIG_IGN) };
    if previous == libc::SIG_ERR {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

extern "C" fn on_child_changed(_signal: libc::c_int) {
    PENDING_REAP.store(true, Ordering::SeqCst);
}

fn install_child_handler() -> io::Result<()> {
    unsafe {
        let mut action: libc::sigaction = std::mem::zeroed();
        action.sa_sigaction = on_child_changed as extern "C" fn(libc::c_int) as libc::sighandler_t;
        action.sa_flags = libc::SA_RESTART;
        libc::sigemptyset(&mut action.sa_mask);

        if libc::sigaction(libc::SIGCHLD, &action, std::ptr::null_mut()) != 0 {
            return Err(io::Error::last_os_error());
        }
    }
    Ok(())
}

/// Consume the pending-reap flag. Any number of notifications since the last
/// call collapse into a single `true`.
pub fn take_pending_reap() -> bool {
    PENDING_REAP.swap(false, Ordering::SeqCst)
}

/// Mirror the job table's live pids for [`emergency_shutdown`].
pub fn publish_tracked(pids: impl IntoIterator<Item = Pid>) {
    let mut pids = pids.into_iter();
    for slot in &TRACKED_PIDS {
        slot.store(pids.next().unwrap_or(0), Ordering::SeqCst);
    }
}

#[cfg(test)]
fn foreground_pid() -> Option<Pid> {
    match FOREGROUND_PID.load(Ordering::SeqCst) {
        0 => None,
        pid => Some(pid),
    }
}

/// Occupies the foreground slot until dropped.
pub struct ForegroundSlot {
    _private: (),
}

impl ForegroundSlot {
    pub fn occupy(pid: Pid) -> Self {
        FOREGROUND_PID.store(pid, Ordering::SeqCst);
        Self { _private: () }
    }
}

impl Drop for ForegroundSlot {
    fn drop(&mut self) {
        FOREGROUND_PID.store(0, Ordering::SeqCst);
    }
}

/// Ctrl-C policy: terminate the foreground process and every tracked job,
/// then end the shell without returning.
///
/// Uses only `kill`, `write` and `_exit`.
fn emergency_shutdown() -> ! {
    let foreground = FOREGROUND_PID.load(Ordering::SeqCst);
    if foreground > 0 {
        unsafe { libc::kill(foreground, libc::SIGTERM) };
    }

    for slot in &TRACKED_PIDS {
        let pid = slot.load(Ordering::SeqCst);
        if pid > 0 {
            unsafe { libc::kill(pid, libc::SIGTERM) };
        }
    }

    unsafe {
        libc::write(
            libc::STDOUT_FILENO,
            SHUTDOWN_NOTICE.as_ptr().cast(),
            SHUTDOWN_NOTICE.len(),
        );
        libc::_exit(0)
    }
}

/// One-shot wall-clock limit on the whole shell. `0` leaves it unarmed.
pub fn arm_alarm(secs: u32) {
    if secs > 0 {
        unsafe { libc::alarm(secs) };
    }
}

/// Serializes tests that touch the process-wide foreground slot.
#[cfg(test)]
pub static FOREGROUND_TEST_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());
