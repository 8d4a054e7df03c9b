//! Pipeline orchestration: historical tail read, then optional live follow.
//!
//! States: `Idle → HistoricalRead → (Following) → Stopped`. The transport
//! precondition is checked before any filesystem access; a missing log file
//! is an expected state, not a failure. All sink writes happen on the
//! calling thread, so historical lines are fully flushed before the first
//! followed line.

use crate::config::LoggingConfig;
use crate::error::PipelineError;
use crate::record::{FormattedRecord, LogLine};
use crate::tail;
use crate::watcher::FollowSession;
use std::io::Write;
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::debug;

pub const DEFAULT_LINE_COUNT: usize = 20;

/// Immutable input to a pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub file: PathBuf,
    pub line_count: usize,
    pub follow: bool,
}

impl PipelineConfig {
    pub fn new(file: impl Into<PathBuf>) -> Self {
        Self {
            file: file.into(),
            line_count: DEFAULT_LINE_COUNT,
            follow: false,
        }
    }

    pub fn line_count(mut self, count: usize) -> Self {
        self.line_count = count;
        self
    }

    pub fn follow(mut self, follow: bool) -> Self {
        self.follow = follow;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Idle,
    HistoricalRead,
    Following,
    Stopped,
}

/// Outcome of a completed (or cancelled) run.
#[derive(Debug, Default)]
pub struct RunSummary {
    pub historical_lines: usize,
    pub followed_lines: usize,
    /// Non-fatal notice, e.g. follow requested on a file that does not
    /// exist yet.
    pub warning: Option<String>,
}

/// Drives one invocation: tail read → formatter → sink, then optionally
/// watcher → formatter → sink until cancelled.
pub struct Pipeline {
    config: PipelineConfig,
    logging: LoggingConfig,
    cancel: Arc<AtomicBool>,
    state: State,
}

impl Pipeline {
    pub fn new(config: PipelineConfig, logging: LoggingConfig) -> Self {
        Self {
            config,
            logging,
            cancel: Arc::new(AtomicBool::new(false)),
            state: State::Idle,
        }
    }

    /// Shared cancellation flag. Setting it true stops an in-progress
    /// follow within one poll interval.
    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    pub fn state(&self) -> State {
        self.state
    }

    /// Run the pipeline to completion, writing formatted lines to `sink`.
    ///
    /// With `follow` set this blocks until the cancellation flag is raised
    /// or the watcher fails; without it, it returns after the historical
    /// lines are written. The pipeline ends in `Stopped` regardless of
    /// outcome.
    pub fn run(&mut self, sink: &mut dyn Write) -> Result<RunSummary, PipelineError> {
        let result = self.run_inner(sink);
        self.state = State::Stopped;
        result
    }

    fn run_inner(&mut self, sink: &mut dyn Write) -> Result<RunSummary, PipelineError> {
        if !self.logging.file_enabled() {
            return Err(PipelineError::TransportDisabled {
                transports: self.logging.transports.clone(),
            });
        }

        let mut summary = RunSummary::default();

        if !self.config.file.exists() {
            // A not-yet-created log file is expected, not a failure
            if self.config.follow {
                let msg = format!(
                    "log file {} has not been created yet; --follow only works on existing files",
                    self.config.file.display()
                );
                debug!("{}", msg);
                summary.warning = Some(msg);
            }
            return Ok(summary);
        }

        self.state = State::HistoricalRead;
        let lines = tail::read_last_lines(&self.config.file, self.config.line_count)
            .map_err(|e| PipelineError::io(&self.config.file, e))?;
        debug!(
            path = %self.config.file.display(),
            requested = self.config.line_count,
            returned = lines.len(),
            "historical read complete"
        );
        for text in lines {
            self.emit(&LogLine::historical(text), sink)?;
            summary.historical_lines += 1;
        }
        sink.flush().map_err(PipelineError::sink)?;

        if !self.config.follow {
            return Ok(summary);
        }

        // Watch from the current end of file
        let offset = std::fs::metadata(&self.config.file)
            .map_err(|e| PipelineError::io(&self.config.file, e))?
            .len();
        let session = FollowSession::start(&self.config.file, offset, Arc::clone(&self.cancel))
            .map_err(|e| PipelineError::io(&self.config.file, e))?;

        self.state = State::Following;
        for item in session {
            let text = item.map_err(|e| PipelineError::io(&self.config.file, e))?;
            self.emit(&LogLine::live(text), sink)?;
            summary.followed_lines += 1;
        }

        Ok(summary)
    }

    fn emit(&self, line: &LogLine, sink: &mut dyn Write) -> Result<(), PipelineError> {
        let rendered = FormattedRecord::from_line(&line.text).render();
        debug!(origin = ?line.origin, "emit line");
        writeln!(sink, "{}", rendered).map_err(PipelineError::sink)
    }
}
