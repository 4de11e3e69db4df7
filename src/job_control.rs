use std::io::Write;

use crate::error::{Result, ShellError};
use crate::jobs::{JobState, JobTable};
use crate::process::{ProcessControl, WaitOutcome};
use crate::reaper::notice;
use crate::signals::ForegroundSlot;

/// `jobs`: list every entry that has not finished.
pub fn jobs(table: &JobTable, stdout: &mut dyn Write) -> i32 {
    for job in table.iter().filter(|job| job.state != JobState::Done) {
        let _ = writeln!(stdout, "[{}]+ {:<20} {}", job.id, job.state.label(), job.command);
    }
    0
}

/// `fg [id]`: resume a job in the foreground and wait for it. Returns the
/// job's resulting status.
pub fn fg(
    args: &[String],
    table: &mut JobTable,
    procs: &mut dyn ProcessControl,
    stdout: &mut dyn Write,
    stderr: &mut dyn Write,
) -> i32 {
    match foreground(args.first(), table, procs, stdout) {
        Ok(status) => status,
        Err(err) => {
            let _ = writeln!(stderr, "fg: {err}");
            1
        }
    }
}

fn foreground(
    arg: Option<&String>,
    table: &mut JobTable,
    procs: &mut dyn ProcessControl,
    stdout: &mut dyn Write,
) -> Result<i32> {
    let id = match arg {
        Some(text) => parse_job_id(text)?,
        None => table.most_recent_non_done().ok_or(ShellError::NoCurrentJob)?,
    };
    let (pid, state, command) = table
        .find_by_id(id)
        .map(|job| (job.pid, job.state, job.command.clone()))
        .ok_or(ShellError::JobNotFound(id))?;
    let index = table.index_of(id).ok_or(ShellError::JobNotFound(id))?;
    if state == JobState::Done {
        return Err(ShellError::AlreadyDone(id));
    }

    let _slot = ForegroundSlot::occupy(pid);

    if state == JobState::Stopped {
        log::debug!("continuing job {id} (pid {pid})");
        procs
            .send_signal(pid, libc::SIGCONT)
            .map_err(ShellError::Signal)?;
    }
    table.set_state(index, JobState::Running)?;

    let _ = writeln!(stdout, "{command}");
    let _ = stdout.flush();

    let outcome = match procs.wait_for(pid) {
        Ok(outcome) => outcome,
        Err(err) => {
            // Nothing left to wait for: the process is gone.
            if err.raw_os_error() == Some(libc::ECHILD) {
                table.set_state(index, JobState::Done)?;
            }
            return Err(ShellError::Wait(err));
        }
    };

    match outcome {
        WaitOutcome::Stopped(_) => {
            table.set_state(index, JobState::Stopped)?;
            let _ = writeln!(stdout, "{}", notice(id, JobState::Stopped, &command));
        }
        WaitOutcome::Exited(_) | WaitOutcome::Signaled(_) => {
            table.set_state(index, JobState::Done)?;
        }
        WaitOutcome::Continued => {}
    }

    Ok(outcome.status_code())
}

/// `bg [id]`: resume a stopped job without waiting for it.
pub fn bg(
    args: &[String],
    table: &mut JobTable,
    procs: &mut dyn ProcessControl,
    stdout: &mut dyn Write,
    stderr: &mut dyn Write,
) -> i32 {
    match background(args.first(), table, procs, stdout) {
        Ok(()) => 0,
        Err(err) => {
            let _ = writeln!(stderr, "bg: {err}");
            1
        }
    }
}

fn background(
    arg: Option<&String>,
    table: &mut JobTable,
    procs: &mut dyn ProcessControl,
    stdout: &mut dyn Write,
) -> Result<()> {
    let id = match arg {
        Some(text) => parse_job_id(text)?,
        None => table.most_recent_stopped().ok_or(ShellError::NoStoppedJob)?,
    };
    let job = table.find_by_id(id).ok_or(ShellError::JobNotFound(id))?;
    if job.state != JobState::Stopped {
        return Err(ShellError::NotStopped(id));
    }
    let pid = job.pid;
    let index = table.index_of(id).ok_or(ShellError::JobNotFound(id))?;

    log::debug!("continuing job {id} (pid {pid}) in the background");
    procs
        .send_signal(pid, libc::SIGCONT)
        .map_err(ShellError::Signal)?;
    table.set_state(index, JobState::Running)?;

    if let Some(job) = table.get(index) {
        let _ = writeln!(stdout, "[{}] {} &", job.id, job.command);
        let _ = stdout.flush();
    }
    Ok(())
}

/// Parse a job id given as `N` or `%N`.
fn parse_job_id(text: &str) -> Result<u32> {
    text.trim_start_matches('%')
        .parse::<u32>()
        .map_err(|_| ShellError::InvalidJobId(text.to_string()))
}
