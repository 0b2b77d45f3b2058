//! Check a logfile for down and up events

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;
use structopt::StructOpt;
use tracing::debug;

use eventwatch_plugins::check::{self, CheckConfig, StateLocation};
use eventwatch_plugins::error::EventsError;
use eventwatch_plugins::events::{ScanMode, Severity};
use eventwatch_plugins::watchdog::with_deadline;
use eventwatch_plugins::{logging, Outcome};

/// Watch a logfile for lines that say something went down, or came back up.
///
/// Every run reads what was appended since the last run. If the most recent
/// event is a down line the check warns (or goes critical) with that line,
/// and stays that way on later runs until an up line is seen.
#[derive(StructOpt, Debug, Deserialize)]
#[structopt(
    name = "check-events (part of eventwatch-plugins)",
    setting = structopt::clap::AppSettings::ColoredHelp,
    after_help = "Examples:

    Warn when a switch port goes down, until it comes back up:

        check-events /var/log/switch 'changed state to down' 'changed state to up'

    Go critical on any NIC flap, even if the link recovered before the check ran:

        check-events --critical --glitch /var/log/messages 'NIC Link is Down' 'NIC Link is Up'

State:

    The position in the logfile and the last result are kept in a small state
    file. Unless --state-file is given it lives in --state-dir, named after the
    logfile and a hash of the logfile and both patterns. If the logfile is
    replaced or truncated it is scanned again from the start."
)]
struct Args {
    #[structopt(help = "The logfile to scan", parse(from_os_str))]
    logfile: PathBuf,
    #[structopt(help = "Regex matching lines that announce a failure")]
    down_pattern: String,
    #[structopt(help = "Regex matching lines that announce a recovery")]
    up_pattern: String,

    #[structopt(
        short = "s",
        long = "state-file",
        parse(from_os_str),
        help = "Use this state file instead of deriving one"
    )]
    state_file: Option<PathBuf>,
    #[structopt(
        long = "state-dir",
        parse(from_os_str),
        default_value = "/var/tmp/check_events",
        help = "Directory for derived state files, created if missing"
    )]
    state_dir: PathBuf,

    #[structopt(
        long = "severity",
        default_value = "warning",
        help = "Status to report for a down event. Choices: warning critical"
    )]
    severity: Severity,
    #[structopt(short = "c", long = "critical", help = "Same as --severity critical")]
    critical: bool,

    #[structopt(
        long = "mode",
        default_value = "default",
        help = "default: an up line cancels an earlier down line. glitch: report the \
                last down line even if an up line followed, and rescan from there \
                next time"
    )]
    mode: ScanMode,
    #[structopt(short = "g", long = "glitch", help = "Same as --mode glitch")]
    glitch: bool,

    #[structopt(
        short = "m",
        long = "message",
        help = "Report this instead of the matching line for down events"
    )]
    message: Option<String>,
    #[structopt(
        short = "t",
        long = "timeout",
        default_value = "30",
        help = "Give up with UNKNOWN after this many seconds, 0 to never give up"
    )]
    timeout: u64,
    #[structopt(
        short = "v",
        long = "verbose",
        parse(from_occurrences),
        help = "Log more to stderr, up to three times"
    )]
    verbose: u8,
}

impl Args {
    fn into_config(self) -> CheckConfig {
        let state = match self.state_file {
            Some(path) => StateLocation::File(path),
            None => StateLocation::Dir(self.state_dir),
        };
        CheckConfig {
            logfile: self.logfile,
            down_pattern: self.down_pattern,
            up_pattern: self.up_pattern,
            state,
            mode: if self.glitch { ScanMode::Glitch } else { self.mode },
            severity: if self.critical {
                Severity::Critical
            } else {
                self.severity
            },
            message: self.message,
        }
    }
}

fn outcome_within(timeout: u64, config: CheckConfig) -> Outcome {
    if timeout == 0 {
        return check::run(&config);
    }
    match with_deadline(Duration::from_secs(timeout), move || check::run(&config)) {
        Ok(outcome) => outcome,
        Err(e) => {
            let err = EventsError::from(e);
            Outcome::new(err.status(), err.to_string())
        }
    }
}

#[cfg_attr(test, allow(dead_code))]
fn main() {
    let args = Args::from_args();
    logging::init(args.verbose);
    debug!("{:?}", args);

    let timeout = args.timeout;
    outcome_within(timeout, args.into_config()).exit();
}
