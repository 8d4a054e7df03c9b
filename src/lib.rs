// Library interface for tailpipe
// Exposes the pipeline core for the CLI binary and integration tests

pub mod config;
pub mod error;
pub mod pipeline;
pub mod record;
pub mod signal;
pub mod tail;
pub mod watcher;
