//! The sidecar state file that remembers where the last scan stopped
//!
//! The file format is shared with older deployments of this check, so it is
//! deliberately simple: the last message, followed by tagged fields.
//!
//! ```plain
//! eth0: link down
//! #param# pos=1024
//! #param# state=1
//! #param# fsize=1024
//! #param# inode=393231
//! ```
//!
//! Any line that is not a `#param#` field is part of the message. Unknown
//! fields are ignored, and missing ones default to zero.

use std::fmt;
use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use md5::{Digest, Md5};
use tracing::debug;

use crate::Status;

/// Where derived state files live unless told otherwise
pub const DEFAULT_STATE_DIR: &str = "/var/tmp/check_events";

const PARAM_TAG: &str = "#param#";

/// A stable token that tells a file apart from a same-named replacement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FileIdentity(pub u64);

impl FileIdentity {
    #[cfg(unix)]
    pub fn of(metadata: &fs::Metadata) -> Option<FileIdentity> {
        use std::os::unix::fs::MetadataExt;
        Some(FileIdentity(metadata.ino()))
    }

    #[cfg(not(unix))]
    pub fn of(_metadata: &fs::Metadata) -> Option<FileIdentity> {
        None
    }
}

impl fmt::Display for FileIdentity {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for FileIdentity {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<FileIdentity, Self::Err> {
        s.parse().map(FileIdentity)
    }
}

/// Everything one run of a check leaves behind for the next one
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PersistedState {
    /// Bytes of the logfile that have been scanned
    pub offset: u64,
    /// Size of the logfile when `offset` was recorded
    pub file_size: u64,
    /// Identity of the logfile when `offset` was recorded
    pub identity: Option<FileIdentity>,
    /// The last reported status
    pub status: Status,
    /// The last reported message
    pub text: String,
}

impl PersistedState {
    /// Parse a state file, tolerating anything an old or damaged file contains
    pub fn parse(contents: &str) -> PersistedState {
        let mut state = PersistedState::default();
        for line in contents.lines() {
            match param(line) {
                Some(("pos", value)) => state.offset = number(value),
                Some(("fsize", value)) => state.file_size = number(value),
                Some(("state", value)) => {
                    state.status = value
                        .parse()
                        .ok()
                        .and_then(Status::from_code)
                        .unwrap_or_default()
                }
                Some(("inode", value)) => state.identity = value.parse().ok(),
                Some((key, _)) => debug!("ignoring unknown state field {:?}", key),
                None => state.text.push_str(line),
            }
        }
        state
    }

    /// Render the state in the on-disk format
    pub fn render(&self) -> String {
        let inode = self
            .identity
            .map(|identity| identity.to_string())
            .unwrap_or_default();
        format!(
            "{text}\n\
             {tag} pos={pos}\n\
             {tag} state={state}\n\
             {tag} fsize={fsize}\n\
             {tag} inode={inode}\n",
            text = self.text,
            tag = PARAM_TAG,
            pos = self.offset,
            state = self.status.code(),
            fsize = self.file_size,
            inode = inode,
        )
    }
}

/// Split a `#param# key=value` line, or `None` if it is message text
fn param(line: &str) -> Option<(&str, &str)> {
    let rest = line.strip_prefix(PARAM_TAG)?;
    if !rest.starts_with(char::is_whitespace) {
        return None;
    }
    let (key, value) = rest.trim().split_once('=')?;
    if key.is_empty() || !key.chars().all(|c| c.is_alphanumeric() || c == '_') {
        return None;
    }
    Some((key, value.trim()))
}

fn number(value: &str) -> u64 {
    value.parse().unwrap_or(0)
}

/// The state file of one (logfile, down pattern, up pattern) triple
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateFile {
    path: PathBuf,
}

impl StateFile {
    /// Use exactly this path
    pub fn at<P: Into<PathBuf>>(path: P) -> StateFile {
        StateFile { path: path.into() }
    }

    /// Derive a path in `dir` that is unique to the logfile and patterns
    ///
    /// The same triple always maps to the same file, and two checks on the
    /// same logfile with different patterns never share one.
    pub fn derive(dir: &Path, target: &Path, down: &str, up: &str) -> StateFile {
        let target = target.to_string_lossy();
        let sanitized: String = target
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
            .collect();

        let mut hasher = Md5::new();
        hasher.update(target.as_bytes());
        hasher.update(down.as_bytes());
        hasher.update(up.as_bytes());
        let name = format!("{}_{:x}", sanitized, hasher.finalize());

        StateFile {
            path: dir.join(name),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the saved state
    ///
    /// A state file that does not exist yet is `Ok(None)`, that is just the
    /// first run.
    pub fn load(&self) -> Result<Option<PersistedState>, io::Error> {
        let mut fh = match File::open(&self.path) {
            Ok(fh) => fh,
            Err(ref e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e),
        };
        let mut bytes = Vec::new();
        fh.read_to_end(&mut bytes)?;
        Ok(Some(PersistedState::parse(&String::from_utf8_lossy(&bytes))))
    }

    /// Replace the saved state
    ///
    /// Writes a sibling file and renames it into place, creating the
    /// directory first if needed.
    pub fn save(&self, state: &PersistedState) -> Result<(), io::Error> {
        if let Some(dir) = self.path.parent() {
            if !dir.as_os_str().is_empty() && !dir.is_dir() {
                fs::create_dir_all(dir)?;
            }
        }
        let mut tmp_name = self.path.clone().into_os_string();
        tmp_name.push(".tmp");
        let tmp_path = PathBuf::from(tmp_name);

        let written = File::create(&tmp_path)
            .and_then(|mut fh| {
                fh.write_all(state.render().as_bytes())?;
                fh.flush()
            })
            .and_then(|()| fs::rename(&tmp_path, &self.path));
        if written.is_err() {
            let _ = fs::remove_file(&tmp_path);
        }
        written
    }
}

#[cfg(test)]
mod unit {
    use std::fs;
    use std::path::Path;

    use tempfile::tempdir;

    use super::*;

    fn down_state() -> PersistedState {
        PersistedState {
            offset: 1024,
            file_size: 2048,
            identity: Some(FileIdentity(393231)),
            status: Status::Critical,
            text: "Jan 12 10:01:02 sw1 %LINK-3-UPDOWN: Interface Gi0/1, changed state to down"
                .to_owned(),
        }
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempdir().unwrap();
        let store = StateFile::at(dir.path().join("state"));
        let state = down_state();
        store.save(&state).unwrap();
        assert_eq!(store.load().unwrap(), Some(state));

        let unknown_identity = PersistedState {
            identity: None,
            ..down_state()
        };
        store.save(&unknown_identity).unwrap();
        assert_eq!(store.load().unwrap(), Some(unknown_identity));
    }

    #[test]
    fn renders_the_legacy_format() {
        assert_eq!(
            down_state().render(),
            "Jan 12 10:01:02 sw1 %LINK-3-UPDOWN: Interface Gi0/1, changed state to down\n\
             #param# pos=1024\n\
             #param# state=2\n\
             #param# fsize=2048\n\
             #param# inode=393231\n"
        );
    }

    #[test]
    fn missing_file_is_not_an_error() {
        let dir = tempdir().unwrap();
        let store = StateFile::at(dir.path().join("never-written"));
        assert_eq!(store.load().unwrap(), None);
    }

    #[test]
    fn tolerates_malformed_files() {
        let state = PersistedState::parse(
            "first part\nsecond part\n#param# pos=12\n#param# colour=blue\n\
             #param# state=7\n#param# fsize=lots\n#param# inode=\n",
        );
        assert_eq!(
            state,
            PersistedState {
                offset: 12,
                file_size: 0,
                identity: None,
                status: Status::Ok,
                text: "first partsecond part".to_owned(),
            }
        );

        assert_eq!(PersistedState::parse(""), PersistedState::default());
        assert_eq!(
            PersistedState::parse("garbage without fields").offset,
            0
        );
    }

    #[test]
    fn derived_paths_are_stable_and_distinct() {
        let dir = Path::new("/var/tmp/check_events");
        let log = Path::new("/var/log/messages");
        let first = StateFile::derive(dir, log, "down", "up");
        assert_eq!(first, StateFile::derive(dir, log, "down", "up"));
        assert_ne!(first, StateFile::derive(dir, log, "down", "recovered"));

        let name = first.path().file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("_var_log_messages_"), "{}", name);
        assert_eq!(name.len(), "_var_log_messages_".len() + 32);
        assert_eq!(first.path().parent(), Some(dir));
    }

    #[test]
    fn save_creates_the_state_directory() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("check_events");
        let store = StateFile::derive(&nested, Path::new("/var/log/syslog"), "a", "b");
        store.save(&down_state()).unwrap();
        assert!(nested.is_dir());
        assert_eq!(fs::read_dir(&nested).unwrap().count(), 1);
    }

    #[test]
    fn failed_save_leaves_no_temp_file() {
        let dir = tempdir().unwrap();
        // renaming a file over a directory fails after the temp file is written
        let store = StateFile::at(dir.path().join("occupied"));
        fs::create_dir(store.path()).unwrap();
        fs::write(store.path().join("keep"), b"").unwrap();
        assert!(store.save(&down_state()).is_err());
        let names: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("occupied")]);
    }

    #[test]
    fn save_failure_is_reported() {
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        fs::write(&blocker, b"").unwrap();
        let store = StateFile::at(blocker.join("state"));
        assert!(store.save(&down_state()).is_err());
    }
}
