use std::io::Write;

use crate::jobs::{JobState, JobTable};
use crate::process::{ProcessControl, WaitOutcome};
use crate::signals;

/// One-line transition notice, e.g. `[1]+ Done                    sleep 5`.
pub fn notice(id: u32, state: JobState, command: &str) -> String {
    format!("[{id}]+ {:<24}{command}", state.label())
}

/// Called once per loop iteration, before the prompt. Does nothing unless a
/// child has changed state since the last call.
pub fn reap_and_report(
    jobs: &mut JobTable,
    procs: &mut dyn ProcessControl,
    stdout: &mut dyn Write,
) {
    if signals::take_pending_reap() {
        drain(jobs, procs, stdout);
    }
}

/// Consume every pending child state change and fold it into the job table.
pub fn drain(jobs: &mut JobTable, procs: &mut dyn ProcessControl, stdout: &mut dyn Write) {
    loop {
        let (pid, outcome) = match procs.poll_any() {
            Ok(Some(change)) => change,
            Ok(None) => break,
            Err(err) => {
                log::warn!("reaping children failed: {err}");
                break;
            }
        };
        log::debug!("pid {pid} changed state: {outcome:?}");

        let Some(index) = jobs.find_by_pid(pid) else {
            log::debug!("pid {pid} is not tracked, discarding");
            continue;
        };
        // A recycled pid can still point at a finished entry.
        if jobs.get(index).is_some_and(|job| job.state == JobState::Done) {
            log::debug!("pid {pid} belongs to a finished job, discarding");
            continue;
        }

        let next = match outcome {
            WaitOutcome::Exited(_) | WaitOutcome::Signaled(_) => JobState::Done,
            WaitOutcome::Stopped(_) => JobState::Stopped,
            WaitOutcome::Continued => JobState::Running,
        };

        if let Err(err) = jobs.set_state(index, next) {
            log::warn!("{err}");
            continue;
        }

        // Resumes are always something the user just asked for.
        if next != JobState::Running {
            if let Some(job) = jobs.get(index) {
                let _ = writeln!(stdout, "{}", notice(job.id, next, &job.command));
            }
        }
    }
    let _ = stdout.flush();
}
