//! Documentation about the various scripts contained herein
//!
//! - [check-events](#check-events)
//!
//! # check-events
//!
//! Cross platform, only requires read access to the logfile and write access
//! to the state directory. File identity (rotation detection) is Unix only.
//!
//! ```plain
//! $ check-events --help
//! check-events (part of eventwatch-plugins) 0.1.0
//! Brandon W Maister <quodlibetor@gmail.com>
//! Watch a logfile for lines that say something went down, or came back up.
//!
//! Every run reads what was appended since the last run. If the most recent event is a down line the check warns (or goes
//! critical) with that line, and stays that way on later runs until an up line is seen.
//!
//! USAGE:
//!     check-events [FLAGS] [OPTIONS] <logfile> <down-pattern> <up-pattern>
//!
//! FLAGS:
//!     -c, --critical    Same as --severity critical
//!     -g, --glitch      Same as --mode glitch
//!     -h, --help        Prints help information
//!     -V, --version     Prints version information
//!     -v, --verbose     Log more to stderr, up to three times
//!
//! OPTIONS:
//!     -m, --message <message>          Report this instead of the matching line for down events
//!         --mode <mode>                default: an up line cancels an earlier down line. glitch: report the last down line
//!                                      even if an up line followed, and rescan from there next time [default: default]
//!         --severity <severity>        Status to report for a down event. Choices: warning critical [default: warning]
//!         --state-dir <state-dir>      Directory for derived state files, created if missing [default:
//!                                      /var/tmp/check_events]
//!     -s, --state-file <state-file>    Use this state file instead of deriving one
//!     -t, --timeout <timeout>          Give up with UNKNOWN after this many seconds, 0 to never give up [default: 30]
//!
//! ARGS:
//!     <logfile>         The logfile to scan
//!     <down-pattern>    Regex matching lines that announce a failure
//!     <up-pattern>      Regex matching lines that announce a recovery
//!
//! Examples:
//!
//!     Warn when a switch port goes down, until it comes back up:
//!
//!         check-events /var/log/switch 'changed state to down' 'changed state to up'
//!
//!     Go critical on any NIC flap, even if the link recovered before the check ran:
//!
//!         check-events --critical --glitch /var/log/messages 'NIC Link is Down' 'NIC Link is Up'
//!
//! State:
//!
//!     The position in the logfile and the last result are kept in a small state
//!     file. Unless --state-file is given it lives in --state-dir, named after the
//!     logfile and a hash of the logfile and both patterns. If the logfile is
//!     replaced or truncated it is scanned again from the start.
//! ```
