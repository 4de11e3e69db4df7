use std::io;

use thiserror::Error;

use crate::jobs::JobState;

#[derive(Error, Debug)]
pub enum ShellError {
    #[error("pipe: {0}")]
    Pipe(#[source] io::Error),

    #[error("fork: {0}")]
    Fork(#[source] io::Error),

    #[error("wait: {0}")]
    Wait(#[source] io::Error),

    #[error("kill: {0}")]
    Signal(#[source] io::Error),

    #[error("cannot install signal handler: {0}")]
    Install(String),

    #[error("no current job")]
    NoCurrentJob,

    #[error("no stopped job")]
    NoStoppedJob,

    #[error("job {0} not found")]
    JobNotFound(u32),

    #[error("no job in slot {0}")]
    NoSuchSlot(usize),

    #[error("job {0} is not stopped")]
    NotStopped(u32),

    #[error("job {0} has already completed")]
    AlreadyDone(u32),

    #[error("{0}: invalid job id")]
    InvalidJobId(String),

    #[error("job {id}: cannot move from {from} to {to}")]
    IllegalTransition { id: u32, from: JobState, to: JobState },
}

pub type Result<T> = std::result::Result<T, ShellError>;
