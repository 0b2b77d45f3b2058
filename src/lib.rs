//! Eventwatch plugins: strongly typed checks for logfile events
//!
//! Each check is a binary in `src/bin` that prints a single summary line and
//! exits with the status code that Nagios and Sensu expect. This library holds
//! the pieces those binaries share: the `Status` classification, the logfile
//! event scanner and the sidecar state file it uses to remember where it left
//! off.
//!
//! See the [scripts](scripts/index.html) module for the documentation of the
//! shipped checks.

use std::fmt;
use std::process;
use std::str::FromStr;

use serde::Deserialize;

pub mod check;
pub mod error;
pub mod events;
pub mod logging;
pub mod matcher;
pub mod scripts;
pub mod state;
pub mod watchdog;

/// All possible exit statuses for a check
///
/// Ordered by severity, so `max` of two statuses is the one to report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Ok,
    Warning,
    Critical,
    Unknown,
}

impl Status {
    /// Exit with a return code that indicates the state of the system
    pub fn exit(self) -> ! {
        process::exit(self.code())
    }

    /// The process exit code, which is also the code stored in state files
    pub fn code(self) -> i32 {
        match self {
            Status::Ok => 0,
            Status::Warning => 1,
            Status::Critical => 2,
            Status::Unknown => 3,
        }
    }

    pub fn from_code(code: i64) -> Option<Status> {
        match code {
            0 => Some(Status::Ok),
            1 => Some(Status::Warning),
            2 => Some(Status::Critical),
            3 => Some(Status::Unknown),
            _ => None,
        }
    }

    pub fn str_values() -> [&'static str; 4] {
        ["ok", "warning", "critical", "unknown"]
    }
}

impl Default for Status {
    fn default() -> Status {
        Status::Ok
    }
}

impl FromStr for Status {
    type Err = String;

    fn from_str(s: &str) -> Result<Status, String> {
        match s.to_lowercase().as_ref() {
            "ok" => Ok(Status::Ok),
            "warn" | "warning" => Ok(Status::Warning),
            "crit" | "critical" => Ok(Status::Critical),
            "unknown" => Ok(Status::Unknown),
            _ => Err(format!(
                "Unexpected status '{}', expected one of: {}",
                s,
                Status::str_values().join(", ")
            )),
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let msg = match *self {
            Status::Ok => "OK",
            Status::Warning => "WARNING",
            Status::Critical => "CRITICAL",
            Status::Unknown => "UNKNOWN",
        };
        write!(f, "{}", msg)
    }
}

/// What a check has to say: a status and the one line that explains it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub status: Status,
    pub message: String,
}

impl Outcome {
    pub fn new<S: Into<String>>(status: Status, message: S) -> Outcome {
        Outcome {
            status,
            message: message.into(),
        }
    }

    /// Print the summary line and exit with the matching code
    pub fn exit(self) -> ! {
        println!("{}", self);
        self.status.exit()
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}: {}", self.status, self.message)
    }
}

#[cfg(test)]
mod test {
    use std::cmp::max;

    use super::{Outcome, Status};

    #[test]
    fn statuses_order_by_severity() {
        assert_eq!(max(Status::Ok, Status::Warning), Status::Warning);
        assert_eq!(max(Status::Critical, Status::Warning), Status::Critical);
        assert_eq!(max(Status::Critical, Status::Unknown), Status::Unknown);
    }

    #[test]
    fn codes_match_the_plugin_convention() {
        for (code, status) in [
            Status::Ok,
            Status::Warning,
            Status::Critical,
            Status::Unknown,
        ]
        .iter()
        .enumerate()
        {
            assert_eq!(status.code(), code as i32);
            assert_eq!(Status::from_code(code as i64), Some(*status));
        }
        assert_eq!(Status::from_code(4), None);
        assert_eq!(Status::from_code(-1), None);
    }

    #[test]
    fn parse_accepts_short_names() {
        assert_eq!("warn".parse::<Status>().unwrap(), Status::Warning);
        assert_eq!("CRITICAL".parse::<Status>().unwrap(), Status::Critical);
        assert!("bad".parse::<Status>().is_err());
    }

    #[test]
    fn outcome_summary_line() {
        let outcome = Outcome::new(Status::Critical, "link down on eth0");
        assert_eq!(outcome.to_string(), "CRITICAL: link down on eth0");
    }
}
