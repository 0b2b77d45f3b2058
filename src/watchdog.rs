//! Bound how long a check may take
//!
//! The job runs on its own thread and the caller waits on a channel for at
//! most the deadline. A job that overruns is abandoned, not cancelled: the
//! caller is expected to report and exit.

use std::sync::mpsc::{channel, RecvTimeoutError};
use std::thread;
use std::time::Duration;

use tracing::warn;

use crate::error::DeadlineError;

/// Run `job`, giving up after `deadline`
pub fn with_deadline<T, F>(deadline: Duration, job: F) -> Result<T, DeadlineError>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    let (tx, rx) = channel();
    let spawned = thread::Builder::new()
        .name("check".to_owned())
        .spawn(move || {
            // the receiver is gone if we already timed out
            let _ = tx.send(job());
        });
    if let Err(e) = spawned {
        warn!("unable to start the check thread: {}", e);
        return Err(DeadlineError::Aborted);
    }

    match rx.recv_timeout(deadline) {
        Ok(result) => Ok(result),
        Err(RecvTimeoutError::Timeout) => Err(DeadlineError::Expired(deadline)),
        Err(RecvTimeoutError::Disconnected) => Err(DeadlineError::Aborted),
    }
}
