//! Error types for the log pipeline.
//!
//! Formatting failures never appear here — a line that does not parse as a
//! structured record degrades to raw passthrough inside the formatter.

use std::fmt;
use std::path::PathBuf;

/// Error terminating a pipeline run.
#[derive(Debug)]
pub enum PipelineError {
    /// The file logging transport is not enabled for the target app.
    /// Raised before any filesystem access.
    TransportDisabled { transports: Vec<String> },

    /// The log file could not be opened or read, or the watcher hit an
    /// unrecoverable I/O failure after startup.
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Writing a formatted line to the output sink failed, e.g. a broken
    /// pipe on stdout.
    Sink { source: std::io::Error },
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineError::TransportDisabled { transports } => {
                write!(
                    f,
                    "file logging is disabled for this target (configured transports: {}). \
                     Add \"file\" to logging.transports to use this command",
                    if transports.is_empty() {
                        "none".to_string()
                    } else {
                        transports.join(", ")
                    }
                )
            }
            PipelineError::Io { path, source } => {
                write!(f, "cannot read log file {}: {}", path.display(), source)
            }
            PipelineError::Sink { source } => {
                write!(f, "cannot write log output: {}", source)
            }
        }
    }
}

impl std::error::Error for PipelineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PipelineError::Io { source, .. } => Some(source),
            PipelineError::Sink { source } => Some(source),
            _ => None,
        }
    }
}

impl PipelineError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PipelineError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn sink(source: std::io::Error) -> Self {
        PipelineError::Sink { source }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_disabled_message_lists_transports() {
        let err = PipelineError::TransportDisabled {
            transports: vec!["stdout".to_string(), "gelf".to_string()],
        };
        let msg = err.to_string();
        assert!(msg.contains("stdout, gelf"));
        assert!(msg.contains("logging.transports"));
    }

    #[test]
    fn test_transport_disabled_message_with_empty_list() {
        let err = PipelineError::TransportDisabled { transports: vec![] };
        assert!(err.to_string().contains("none"));
    }

    #[test]
    fn test_io_error_names_the_file() {
        let err = PipelineError::io(
            "/var/log/app.log",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        let msg = err.to_string();
        assert!(msg.contains("/var/log/app.log"));
        assert!(msg.contains("denied"));
    }

    #[test]
    fn test_sink_error_does_not_blame_the_log_file() {
        let err = PipelineError::sink(std::io::Error::new(
            std::io::ErrorKind::BrokenPipe,
            "broken pipe",
        ));
        let msg = err.to_string();
        assert!(msg.contains("cannot write log output"));
        assert!(msg.contains("broken pipe"));
        assert!(!msg.contains("read log file"));
    }
}
