//! Regenerate `src/scripts.rs` from the `--help` output of each check
//!
//! Run from the repository root after `cargo build`:
//!
//! ```plain
//! cargo run -p make-docs > src/scripts.rs
//! ```

use std::process::{self, Command};

struct Check {
    name: &'static str,
    about: &'static str,
}

const CHECKS: &[Check] = &[Check {
    name: "check-events",
    about: "Cross platform, only requires read access to the logfile and write access\n\
            to the state directory. File identity (rotation detection) is Unix only.",
}];

fn main() {
    let preamble = "Documentation about the various scripts contained herein\n";

    let mut out: String = cp(preamble.split('\n'));
    out.push('\n');
    out.push_str(&cp(CHECKS.iter().map(|c| format!("- [{0}](#{0})", c.name))));
    out.push('\n');
    for check in CHECKS {
        let help = match help_text(check.name) {
            Ok(help) => help,
            Err(e) => {
                eprintln!("{}", e);
                process::exit(1);
            }
        };
        out.push_str("//!\n");
        out.push_str(&cp(format!("# {}", check.name).split('\n')));
        out.push_str("\n//!\n");
        out.push_str(&cp(check.about.split('\n')));
        out.push_str("\n//!\n");
        out.push_str(&cp(
            ["```plain".to_owned(), format!("$ {} --help", check.name)].iter(),
        ));
        out.push('\n');
        out.push_str(&cp(help.trim_end().split('\n')));
        out.push_str("\n//! ```\n");
    }
    print!("{}", out);
}

fn help_text(name: &str) -> Result<String, String> {
    let output = Command::new(format!("target/debug/{}", name))
        .arg("--help")
        .output()
        .map_err(|e| format!("Couldn't execute command {}: {}", name, e))?;
    String::from_utf8(output.stdout)
        .map_err(|e| format!("Couldn't convert command {} help to utf8: {}", name, e))
}

/// Comment each line in the iterator
fn cp<S: AsRef<str>, I: Iterator<Item = S>>(s: I) -> String {
    s.map(|s| format!("//! {}", s.as_ref()))
        .map(|s| s.trim_end().into())
        .collect::<Vec<String>>()
        .join("\n")
}
