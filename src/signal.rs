//! Signal handling for cooperative shutdown of a follow in progress.
//!
//! Flag-based, using `signal-hook::flag`: the first SIGINT/SIGTERM raises
//! the pipeline's cancellation flag so the follow loop can wind down within
//! one poll interval; a second signal exits immediately with code 1.

use signal_hook::consts::TERM_SIGNALS;
use signal_hook::flag;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

/// Wire termination signals to an existing cancellation flag.
pub fn register_shutdown(cancel: &Arc<AtomicBool>) -> Result<(), std::io::Error> {
    for sig in TERM_SIGNALS {
        // Order matters: the conditional shutdown only fires once the flag
        // is already true, i.e. on the second signal.
        flag::register_conditional_shutdown(*sig, 1, Arc::clone(cancel))?;
        flag::register(*sig, Arc::clone(cancel))?;
    }
    Ok(())
}
