use std::fmt;

use crate::config::{MAX_JOBS, bounded_command_text};
use crate::error::{Result, ShellError};
use crate::process::Pid;
use crate::signals;

/// The lifecycle state of a tracked job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Running,
    Stopped,
    Done,
}

impl JobState {
    pub fn label(self) -> &'static str {
        match self {
            JobState::Running => "Running",
            JobState::Stopped => "Stopped",
            JobState::Done => "Done",
        }
    }

    /// `Done` is terminal; every other move between states is allowed.
    fn can_become(self, next: JobState) -> bool {
        self != JobState::Done || next == JobState::Done
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A single command or pipeline launched by the user.
#[derive(Debug, Clone, PartialEq)]
pub struct Job {
    pub id: u32,
    /// Representative process; the last stage for a pipeline.
    pub pid: Pid,
    pub command: String,
    pub state: JobState,
}

/// Bounded job registry.
///
/// Entries are kept in registration order. Slot indices shift when `Done`
/// entries are compacted away, so callers hold on to the pid or the job id,
/// never to an index across a `register` call.
#[derive(Debug)]
pub struct JobTable {
    jobs: Vec<Job>,
    next_id: u32,
}

impl Default for JobTable {
    fn default() -> Self {
        Self::new()
    }
}

impl JobTable {
    pub fn new() -> Self {
        Self {
            jobs: Vec::with_capacity(MAX_JOBS),
            next_id: 1,
        }
    }

    /// Track a freshly forked job and return its id.
    ///
    /// A full table first drops its `Done` entries. If it is still full the
    /// job goes untracked and `None` is returned.
    pub fn register(&mut self, pid: Pid, command: &str, state: JobState) -> Option<u32> {
        if self.jobs.len() >= MAX_JOBS {
            self.compact();
        }

        if self.jobs.len() >= MAX_JOBS {
            log::warn!("job table full, not tracking pid {pid}");
            return None;
        }

        let id = self.next_id;
        self.next_id += 1;
        self.jobs.push(Job {
            id,
            pid,
            command: bounded_command_text(command),
            state,
        });
        self.publish();
        Some(id)
    }

    fn compact(&mut self) {
        let before = self.jobs.len();
        self.jobs.retain(|job| job.state != JobState::Done);
        log::debug!("compacted {} done job(s)", before - self.jobs.len());
    }

    pub fn find_by_id(&self, id: u32) -> Option<&Job> {
        self.jobs.iter().find(|job| job.id == id)
    }

    /// Slot index of the entry tracking `pid`. The newest entry wins, since
    /// a recycled pid may still sit in an older `Done` entry.
    pub fn find_by_pid(&self, pid: Pid) -> Option<usize> {
        self.jobs.iter().rposition(|job| job.pid == pid)
    }

    pub fn index_of(&self, id: u32) -> Option<usize> {
        self.jobs.iter().position(|job| job.id == id)
    }

    pub fn get(&self, index: usize) -> Option<&Job> {
        self.jobs.get(index)
    }

    /// Newest entry that is not `Done`; the implicit `fg` target.
    pub fn most_recent_non_done(&self) -> Option<u32> {
        self.jobs
            .iter()
            .rev()
            .find(|job| job.state != JobState::Done)
            .map(|job| job.id)
    }

    /// Newest `Stopped` entry; the implicit `bg` target.
    pub fn most_recent_stopped(&self) -> Option<u32> {
        self.jobs
            .iter()
            .rev()
            .find(|job| job.state == JobState::Stopped)
            .map(|job| job.id)
    }

    pub fn set_state(&mut self, index: usize, state: JobState) -> Result<()> {
        let Some(job) = self.jobs.get_mut(index) else {
            return Err(ShellError::NoSuchSlot(index));
        };

        if !job.state.can_become(state) {
            return Err(ShellError::IllegalTransition {
                id: job.id,
                from: job.state,
                to: state,
            });
        }

        job.state = state;
        self.publish();
        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Job> {
        self.jobs.iter()
    }

    /// Hand the live pids to the signal relay for emergency teardown.
    fn publish(&self) {
        signals::publish_tracked(
            self.jobs
                .iter()
                .filter(|job| job.state != JobState::Done)
                .map(|job| job.pid),
        );
    }
}
