use std::io::Write;

use log::{LevelFilter, Log};

const PREFIX: &str = "mini-shell: ";

/// Writes every enabled record as one line on the wrapped stream.
pub struct StderrLogger<W: Send + Sync>
where
    for<'a> &'a W: Write,
{
    target: W,
}

impl<W: Send + Sync> Log for StderrLogger<W>
where
    for<'a> &'a W: Write,
{
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        metadata.level() <= log::max_level() && metadata.level() <= log::STATIC_MAX_LEVEL
    }

    fn log(&self, record: &log::Record) {
        if self.enabled(record.metadata()) {
            let _ = writeln!(
                &self.target,
                "{PREFIX}{} {}: {}",
                record.level(),
                record.target(),
                record.args()
            );
        }
    }

    fn flush(&self) {
        let _ = (&self.target).flush();
    }
}

impl Default for StderrLogger<std::io::Stderr> {
    fn default() -> Self {
        Self::new()
    }
}

impl StderrLogger<std::io::Stderr> {
    pub fn new() -> Self {
        Self {
            target: std::io::stderr(),
        }
    }
}

/// Install the stderr logger as the global `log` backend.
///
/// A second call is a no-op; the first installed level wins.
pub fn init(level: LevelFilter) {
    if log::set_boxed_logger(Box::new(StderrLogger::new())).is_ok() {
        log::set_max_level(level);
    }
}
