//! Everything that can go wrong while checking a logfile
//!
//! Not every error is a failure: a logfile that cannot be opened is reported
//! as `OK`, and a state file that cannot be written still reports what the
//! scan found. `EventsError::status` knows which is which.

use std::fmt;
use std::io;
use std::path::PathBuf;
use std::result::Result as StdResult;
use std::time::Duration;

use derive_more::From;

use crate::Status;

/// Errors from checking a logfile
///
/// Every error in this crate can be converted into an `EventsError`
#[derive(Debug, From)]
pub enum EventsError {
    /// The down or up pattern was not a valid regex
    Pattern(PatternError),
    /// The logfile could not be opened
    TargetUnavailable(TargetUnavailable),
    /// Neither the saved offset nor the start of the file could be seeked to
    Seek(SeekError),
    /// The state file could not be written
    Persist(PersistError),
    /// The check did not finish in time
    Deadline(DeadlineError),
}

impl EventsError {
    /// The status a check reports when it runs into this error
    pub fn status(&self) -> Status {
        match *self {
            EventsError::TargetUnavailable(_) => Status::Ok,
            _ => Status::Unknown,
        }
    }
}

impl fmt::Display for EventsError {
    fn fmt(&self, f: &mut fmt::Formatter) -> StdResult<(), fmt::Error> {
        match self {
            EventsError::Pattern(e) => write!(f, "{}", e),
            EventsError::TargetUnavailable(e) => write!(f, "{}", e),
            EventsError::Seek(e) => write!(f, "{}", e),
            EventsError::Persist(e) => write!(f, "{}", e),
            EventsError::Deadline(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for EventsError {}

/// Which of the two patterns a `PatternError` is about
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternKind {
    Down,
    Up,
}

impl fmt::Display for PatternKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            PatternKind::Down => write!(f, "down"),
            PatternKind::Up => write!(f, "up"),
        }
    }
}

#[derive(Debug)]
pub struct PatternError {
    pub kind: PatternKind,
    pub pattern: String,
    pub source: regex::Error,
}

impl fmt::Display for PatternError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "invalid {} pattern {:?}: {}",
            self.kind, self.pattern, self.source
        )
    }
}

#[derive(Debug)]
pub struct TargetUnavailable {
    pub path: PathBuf,
    pub source: io::Error,
}

impl fmt::Display for TargetUnavailable {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "could not open {}: {}", self.path.display(), self.source)
    }
}

#[derive(Debug)]
pub struct SeekError {
    pub path: PathBuf,
    pub offset: u64,
    pub source: io::Error,
}

impl fmt::Display for SeekError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "could not seek to {} (or to the start) in {}: {}",
            self.offset,
            self.path.display(),
            self.source
        )
    }
}

#[derive(Debug)]
pub struct PersistError {
    pub path: PathBuf,
    pub source: io::Error,
}

impl fmt::Display for PersistError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "unable to write state file {}: {}",
            self.path.display(),
            self.source
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeadlineError {
    /// The job was still running when the deadline passed
    Expired(Duration),
    /// The job died without producing a result
    Aborted,
}

impl fmt::Display for DeadlineError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            DeadlineError::Expired(after) => {
                write!(f, "timed out after {} seconds", after.as_secs())
            }
            DeadlineError::Aborted => write!(f, "check aborted before producing a result"),
        }
    }
}

pub type Result<T> = StdResult<T, EventsError>;
