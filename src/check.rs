//! One complete run of the logfile event check

use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

use tracing::{debug, info, warn};

use crate::error::{EventsError, PersistError, Result, TargetUnavailable};
use crate::events::{EventScanner, ScanMode, Severity};
use crate::matcher::Patterns;
use crate::state::{FileIdentity, PersistedState, StateFile};
use crate::{Outcome, Status};

/// Where the state of a check lives
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateLocation {
    /// Exactly this file
    File(PathBuf),
    /// A file in this directory named after the logfile and patterns
    Dir(PathBuf),
}

/// Everything needed to check one logfile
#[derive(Debug, Clone)]
pub struct CheckConfig {
    pub logfile: PathBuf,
    pub down_pattern: String,
    pub up_pattern: String,
    pub state: StateLocation,
    pub mode: ScanMode,
    pub severity: Severity,
    /// Reported instead of the matching line for down events
    pub message: Option<String>,
}

impl CheckConfig {
    pub fn state_file(&self) -> StateFile {
        match self.state {
            StateLocation::File(ref path) => StateFile::at(path.clone()),
            StateLocation::Dir(ref dir) => {
                StateFile::derive(dir, &self.logfile, &self.down_pattern, &self.up_pattern)
            }
        }
    }
}

/// Run the check, turning every error into the outcome it should report
pub fn run(config: &CheckConfig) -> Outcome {
    match check(config) {
        Ok(outcome) => outcome,
        Err(e) => Outcome::new(e.status(), e.to_string()),
    }
}

/// Compile, open, scan and persist
///
/// A failure to save the state still reports what was found, but as
/// `UNKNOWN` so that someone notices.
pub fn check(config: &CheckConfig) -> Result<Outcome> {
    let patterns = Patterns::compile(&config.down_pattern, &config.up_pattern)?;

    let fh = File::open(&config.logfile).map_err(|source| TargetUnavailable {
        path: config.logfile.clone(),
        source,
    })?;
    let (file_size, identity) = match fh.metadata() {
        Ok(metadata) => (metadata.len(), FileIdentity::of(&metadata)),
        Err(e) => {
            warn!("unable to stat {}: {}", config.logfile.display(), e);
            (0, None)
        }
    };

    let store = config.state_file();
    let prior = match store.load() {
        Ok(Some(state)) => state,
        Ok(None) => {
            info!("no state in {}, first run", store.path().display());
            PersistedState::default()
        }
        Err(e) => {
            warn!(
                "unable to read state file {}, starting over: {}",
                store.path().display(),
                e
            );
            PersistedState::default()
        }
    };
    debug!("previous state: {:?}", prior);

    let scanner =
        EventScanner::new(&patterns, config.mode).with_message(config.message.as_deref());
    let mut reader = BufReader::new(fh);
    let result = scanner.scan(&config.logfile, &mut reader, &prior, file_size, identity)?;
    let (status, text) = result.resolve(&prior, config.severity);
    if status != prior.status {
        info!("status changed from {} to {}", prior.status, status);
    }

    let next = result.next_state(status, &text);
    debug!("saving state to {}: {:?}", store.path().display(), next);
    if let Err(source) = store.save(&next) {
        let err: EventsError = PersistError {
            path: store.path().to_owned(),
            source,
        }
        .into();
        return Ok(Outcome::new(Status::Unknown, format!("{} ({})", text, err)));
    }
    Ok(Outcome::new(status, text))
}
