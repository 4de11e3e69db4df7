use std::io::Write;

use os_pipe::{PipeReader, PipeWriter};

use crate::ast::Pipeline;
use crate::error::ShellError;
use crate::jobs::{JobState, JobTable};
use crate::process::{Pid, ProcessControl, WaitOutcome};
use crate::reaper::notice;
use crate::signals::ForegroundSlot;
use crate::spawn::{SpawnConfig, spawn};

/// Run a pipeline of external programs and return the shell status.
///
/// Foreground pipelines block until every stage has exited or stopped; only a
/// stage that stops is entered into the job table. Background pipelines are
/// registered as one job keyed by the last stage's pid.
pub fn execute(
    pipeline: &Pipeline,
    jobs: &mut JobTable,
    procs: &mut dyn ProcessControl,
    stdout: &mut dyn Write,
    stderr: &mut dyn Write,
) -> i32 {
    log::debug!("running `{}`", pipeline.text);
    let pids = match launch(pipeline) {
        Ok(pids) => pids,
        Err(err) => {
            let _ = writeln!(stderr, "mini-shell: {err}");
            return 1;
        }
    };

    if pipeline.background {
        track_background(pipeline, &pids, jobs, stdout);
        return 0;
    }

    let mut status = 0;
    for (stage, &pid) in pipeline.stages.iter().zip(&pids) {
        let waited = {
            let _slot = ForegroundSlot::occupy(pid);
            procs.wait_for(pid)
        };

        status = match waited {
            Ok(outcome) => settle_foreground(outcome, pid, &stage.text, jobs, stdout),
            Err(err) => {
                let _ = writeln!(stderr, "mini-shell: {}", ShellError::Wait(err));
                1
            }
        };
    }
    status
}

/// Create the pipes, then fork one child per stage. Returns the pids in stage
/// order.
///
/// A failure part-way leaves the already forked stages to run on their own;
/// they see end-of-file or a broken pipe once the parent's pipe ends close.
fn launch(pipeline: &Pipeline) -> Result<Vec<Pid>, ShellError> {
    let stage_count = pipeline.stages.len();

    // inputs[i] / outputs[i] are stage i's stdin / stdout bindings.
    let mut inputs: Vec<Option<PipeReader>> = Vec::with_capacity(stage_count);
    let mut outputs: Vec<Option<PipeWriter>> = Vec::with_capacity(stage_count);
    inputs.push(None);
    for _ in 1..stage_count {
        let (reader, writer) = os_pipe::pipe().map_err(ShellError::Pipe)?;
        inputs.push(Some(reader));
        outputs.push(Some(writer));
    }
    outputs.push(None);

    let mut pids = Vec::with_capacity(stage_count);
    for ((stage, input), output) in pipeline.stages.iter().zip(inputs).zip(outputs) {
        let mut config = SpawnConfig::new(&stage.program, stage.args.clone());
        if let Some(reader) = input {
            config = config.stdin(reader);
        }
        if let Some(writer) = output {
            config = config.stdout(writer);
        }
        // The parent's copies of this stage's pipe ends close when `spawn`
        // drops the config.
        pids.push(spawn(config).map_err(ShellError::Fork)?);
    }

    Ok(pids)
}

fn track_background(
    pipeline: &Pipeline,
    pids: &[Pid],
    jobs: &mut JobTable,
    stdout: &mut dyn Write,
) {
    let Some(&last) = pids.last() else {
        return;
    };

    if let Some(id) = jobs.register(last, &pipeline.display_text(), JobState::Running) {
        let _ = writeln!(stdout, "[{id}] {last}");
        let _ = stdout.flush();
    }
}

/// Map a foreground wait result to a shell status. A stopped process becomes
/// a new `Stopped` job.
fn settle_foreground(
    outcome: WaitOutcome,
    pid: Pid,
    command: &str,
    jobs: &mut JobTable,
    stdout: &mut dyn Write,
) -> i32 {
    if let WaitOutcome::Stopped(_) = outcome {
        if let Some(id) = jobs.register(pid, command, JobState::Stopped) {
            let _ = writeln!(stdout, "{}", notice(id, JobState::Stopped, command));
            let _ = stdout.flush();
        }
    }
    outcome.status_code()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Stage;
    use crate::process::Os;
    use crate::signals::FOREGROUND_TEST_LOCK;
    use pretty_assertions::assert_eq;

    fn pipeline(stages: &[&[&str]], background: bool) -> Pipeline {
        let stages: Vec<Stage> = stages
            .iter()
            .map(|argv| Stage {
                program: argv[0].to_string(),
                args: argv[1..].iter().map(|s| s.to_string()).collect(),
                text: argv.join(" "),
            })
            .collect();
        let text = stages
            .iter()
            .map(|s| s.text.clone())
            .collect::<Vec<_>>()
            .join(" | ");
        Pipeline {
            stages,
            background,
            text,
        }
    }

    fn run(pipeline: &Pipeline, jobs: &mut JobTable) -> (i32, String, String) {
        let _lock = FOREGROUND_TEST_LOCK
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        let mut out = Vec::new();
        let mut err = Vec::new();
        let status = execute(pipeline, jobs, &mut Os, &mut out, &mut err);
        (
            status,
            String::from_utf8(out).unwrap(),
            String::from_utf8(err).unwrap(),
        )
    }

    #[test]
    fn foreground_status_is_last_stage() {
        let mut jobs = JobTable::new();
        let (status, _, _) = run(&pipeline(&[&["true"], &["false"]], false), &mut jobs);
        assert_eq!(status, 1);

        let (status, _, _) = run(&pipeline(&[&["false"], &["true"]], false), &mut jobs);
        assert_eq!(status, 0);
        assert_eq!(jobs.iter().count(), 0);
    }

    #[test]
    fn missing_program_reports_127() {
        let mut jobs = JobTable::new();
        let (status, _, _) = run(&pipeline(&[&["mini-shell-no-such-program"]], false), &mut jobs);
        assert_eq!(status, 127);
    }

    #[test]
    fn signal_death_maps_to_128_plus_signal() {
        let mut jobs = JobTable::new();
        let (status, _, _) = run(&pipeline(&[&["sh", "-c", "kill -TERM $$"]], false), &mut jobs);
        assert_eq!(status, 128 + libc::SIGTERM);
    }

    #[test]
    fn stopped_foreground_stage_becomes_job() {
        let mut jobs = JobTable::new();
        let (status, out, _) = run(&pipeline(&[&["sh", "-c", "kill -STOP $$"]], false), &mut jobs);

        assert_eq!(status, 128 + libc::SIGSTOP);
        assert_eq!(out, "[1]+ Stopped                 sh -c kill -STOP $$\n");
        let job = jobs.find_by_id(1).unwrap();
        assert_eq!(job.state, JobState::Stopped);

        Os.send_signal(job.pid, libc::SIGKILL).unwrap();
        Os.wait_for(job.pid).unwrap();
    }

    #[test]
    fn background_pipeline_tracks_last_stage() {
        let mut jobs = JobTable::new();
        let (status, out, _) = run(&pipeline(&[&["sleep", "0"], &["cat"]], true), &mut jobs);
        assert_eq!(status, 0);

        let job = jobs.find_by_id(1).unwrap();
        assert_eq!(job.command, "sleep 0 | cat");
        assert_eq!(job.state, JobState::Running);
        assert_eq!(out, format!("[1] {}\n", job.pid));

        assert_eq!(Os.wait_for(job.pid).unwrap(), WaitOutcome::Exited(0));
    }
}
