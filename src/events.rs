//! Scan a logfile for down and up events
//!
//! A scan reads everything appended to the logfile since the previous run,
//! remembers the last event it saw, and reconciles that with what the
//! previous run reported:
//!
//! * no down or up line since last time: report exactly what was reported
//!   before, so a down event stays down until an up event is seen.
//! * the last event was a down line: report it with the configured severity.
//! * the last event was an up line: report OK.
//!
//! In glitch mode a down line is reported even if an up line came after it in
//! the same scan, and the next scan starts again right after that down line.
//! This makes a short outage visible for at least one run.
//!
//! If the logfile was replaced (different inode) or shrank, the scan starts
//! over from the beginning.

use std::fmt;
use std::io::{BufRead, Seek, SeekFrom};
use std::path::Path;
use std::str::FromStr;

use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::error::SeekError;
use crate::matcher::{LineKind, LineMatcher, Patterns};
use crate::state::{FileIdentity, PersistedState};
use crate::Status;

/// Reported when the most recent event was an up line
pub const NO_EVENT: &str = "no event found";

/// How to treat a down line that is followed by an up line in the same scan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanMode {
    /// The up line wins
    Default,
    /// The down line is reported, and the next scan resumes right after it
    Glitch,
}

impl Default for ScanMode {
    fn default() -> ScanMode {
        ScanMode::Default
    }
}

impl FromStr for ScanMode {
    type Err = String;

    fn from_str(s: &str) -> Result<ScanMode, String> {
        match s.to_lowercase().as_ref() {
            "default" => Ok(ScanMode::Default),
            "glitch" => Ok(ScanMode::Glitch),
            _ => Err(format!(
                "Unexpected mode '{}', expected one of: default, glitch",
                s
            )),
        }
    }
}

impl fmt::Display for ScanMode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            ScanMode::Default => write!(f, "default"),
            ScanMode::Glitch => write!(f, "glitch"),
        }
    }
}

/// The status to report for a down event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Critical,
}

impl Default for Severity {
    fn default() -> Severity {
        Severity::Warning
    }
}

impl From<Severity> for Status {
    fn from(severity: Severity) -> Status {
        match severity {
            Severity::Warning => Status::Warning,
            Severity::Critical => Status::Critical,
        }
    }
}

impl FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Severity, String> {
        match s.to_lowercase().as_ref() {
            "warn" | "warning" => Ok(Severity::Warning),
            "crit" | "critical" => Ok(Severity::Critical),
            _ => Err(format!(
                "Unexpected severity '{}', expected one of: warning, critical",
                s
            )),
        }
    }
}

/// A down line, and where the line after it starts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownEvent {
    pub offset: u64,
    pub text: String,
}

/// What the scan has to report
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Emitted {
    Down(String),
    NoEvent,
}

/// Everything learned from one pass over the logfile
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanResult {
    /// Whether any down line was seen, even if an up line followed it
    pub found_down: bool,
    /// The last down line of the scan
    pub last_down: Option<DownEvent>,
    /// Whether any down or up line was seen
    pub saw_state_change: bool,
    pub emitted: Emitted,
    /// Where the next scan should start
    pub final_offset: u64,
    pub file_size: u64,
    pub identity: Option<FileIdentity>,
}

impl ScanResult {
    /// Decide the status and message, carrying the previous ones over if
    /// nothing happened
    ///
    /// An empty previous message (first run, legacy state) is reported as
    /// `NO_EVENT` rather than verbatim.
    pub fn resolve(&self, prior: &PersistedState, severity: Severity) -> (Status, String) {
        if !self.saw_state_change {
            let text = if prior.text.is_empty() {
                NO_EVENT.to_owned()
            } else {
                prior.text.clone()
            };
            return (prior.status, text);
        }
        match self.emitted {
            Emitted::Down(ref text) => (severity.into(), text.clone()),
            Emitted::NoEvent => (Status::Ok, NO_EVENT.to_owned()),
        }
    }

    /// The state to save after reporting `status` and `text`
    pub fn next_state(&self, status: Status, text: &str) -> PersistedState {
        PersistedState {
            offset: self.final_offset,
            file_size: self.file_size,
            identity: self.identity,
            status,
            text: text.to_owned(),
        }
    }
}

/// Where to start reading, given what the previous run saw
///
/// Starts over from the beginning if the file was replaced or shrank.
pub fn start_offset(
    prior: &PersistedState,
    file_size: u64,
    identity: Option<FileIdentity>,
) -> u64 {
    if let (Some(before), Some(now)) = (prior.identity, identity) {
        if before != now {
            info!("logfile identity changed ({} -> {}), rescanning", before, now);
            return 0;
        }
    }
    if prior.file_size > file_size {
        info!(
            "logfile shrank ({} -> {} bytes), rescanning",
            prior.file_size, file_size
        );
        return 0;
    }
    if file_size < prior.offset {
        info!(
            "logfile is smaller than the saved offset ({} < {}), rescanning",
            file_size, prior.offset
        );
        return 0;
    }
    prior.offset
}

/// Scans one logfile with a pair of patterns
pub struct EventScanner<'a, M> {
    pub patterns: &'a Patterns<M>,
    pub mode: ScanMode,
    /// Report this instead of the matching line for down events
    pub message: Option<&'a str>,
}

impl<'a, M: LineMatcher> EventScanner<'a, M> {
    pub fn new(patterns: &'a Patterns<M>, mode: ScanMode) -> EventScanner<'a, M> {
        EventScanner {
            patterns,
            mode,
            message: None,
        }
    }

    pub fn with_message(mut self, message: Option<&'a str>) -> EventScanner<'a, M> {
        self.message = message;
        self
    }

    /// Read `reader` from where the previous run stopped until the end
    ///
    /// `path` is only used for error messages.
    pub fn scan<R: BufRead + Seek>(
        &self,
        path: &Path,
        reader: &mut R,
        prior: &PersistedState,
        file_size: u64,
        identity: Option<FileIdentity>,
    ) -> Result<ScanResult, SeekError> {
        let wanted = start_offset(prior, file_size, identity);
        let mut offset = match reader.seek(SeekFrom::Start(wanted)) {
            Ok(pos) => pos,
            Err(e) => {
                warn!("unable to seek to {} in {}: {}", wanted, path.display(), e);
                reader
                    .seek(SeekFrom::Start(0))
                    .map_err(|source| SeekError {
                        path: path.to_owned(),
                        offset: wanted,
                        source,
                    })?
            }
        };
        debug!("scanning {} from offset {}", path.display(), offset);

        let mut result = ScanResult {
            found_down: false,
            last_down: None,
            saw_state_change: false,
            emitted: Emitted::NoEvent,
            final_offset: offset,
            file_size,
            identity,
        };

        let mut buf = Vec::new();
        loop {
            buf.clear();
            let read = match reader.read_until(b'\n', &mut buf) {
                Ok(0) => break,
                Ok(read) => read,
                Err(e) => {
                    warn!(
                        "error reading {} at offset {}, stopping: {}",
                        path.display(),
                        offset,
                        e
                    );
                    break;
                }
            };
            offset += read as u64;
            let line = String::from_utf8_lossy(&buf);
            let line = chomp(&line);

            match self.patterns.classify(line) {
                LineKind::Down => {
                    debug!("down event at offset {}: {}", offset, line);
                    let text = self.message.unwrap_or(line).to_owned();
                    result.found_down = true;
                    result.saw_state_change = true;
                    result.emitted = Emitted::Down(text.clone());
                    result.last_down = Some(DownEvent { offset, text });
                }
                LineKind::Up => {
                    debug!("up event at offset {}: {}", offset, line);
                    result.saw_state_change = true;
                    result.emitted = Emitted::NoEvent;
                }
                LineKind::Other => {}
            }
        }
        result.final_offset = offset;

        if self.mode == ScanMode::Glitch && result.found_down {
            if let Some(ref down) = result.last_down {
                result.emitted = Emitted::Down(down.text.clone());
                result.final_offset = down.offset;
            }
        }
        Ok(result)
    }
}

fn chomp(line: &str) -> &str {
    let line = line.strip_suffix('\n').unwrap_or(line);
    line.strip_suffix('\r').unwrap_or(line)
}
