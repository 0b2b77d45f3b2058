//! Deciding whether a line is a down event, an up event, or neither

use regex::Regex;

use crate::error::{PatternError, PatternKind};

/// Anything that can say yes or no to a single line of a logfile
pub trait LineMatcher {
    fn is_match(&self, line: &str) -> bool;
}

impl LineMatcher for Regex {
    fn is_match(&self, line: &str) -> bool {
        Regex::is_match(self, line)
    }
}

/// The kind of event a line announces
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Down,
    Up,
    Other,
}

/// The pair of patterns a check watches for
#[derive(Debug)]
pub struct Patterns<M = Regex> {
    pub down: M,
    pub up: M,
}

impl Patterns<Regex> {
    /// Compile both patterns, the down pattern first
    pub fn compile(down: &str, up: &str) -> Result<Patterns<Regex>, PatternError> {
        Ok(Patterns {
            down: compile_one(PatternKind::Down, down)?,
            up: compile_one(PatternKind::Up, up)?,
        })
    }
}

impl<M: LineMatcher> Patterns<M> {
    /// Classify a line; a line matching both patterns is a down event
    pub fn classify(&self, line: &str) -> LineKind {
        if self.down.is_match(line) {
            LineKind::Down
        } else if self.up.is_match(line) {
            LineKind::Up
        } else {
            LineKind::Other
        }
    }
}

fn compile_one(kind: PatternKind, pattern: &str) -> Result<Regex, PatternError> {
    Regex::new(pattern).map_err(|source| PatternError {
        kind,
        pattern: pattern.to_owned(),
        source,
    })
}

#[cfg(test)]
mod unit {
    use super::*;

    #[test]
    fn down_wins_when_both_match() {
        let patterns = Patterns::compile("link (down|up)", "up").unwrap();
        assert_eq!(patterns.classify("eth0: link up"), LineKind::Down);
        assert_eq!(patterns.classify("eth0: carrier up"), LineKind::Up);
        assert_eq!(patterns.classify("eth0: carrier lost"), LineKind::Other);
    }

    #[test]
    fn bad_pattern_names_the_culprit() {
        let err = Patterns::compile("fine", "(unclosed").unwrap_err();
        assert_eq!(err.kind, PatternKind::Up);
        assert_eq!(err.pattern, "(unclosed");
        assert!(err.to_string().starts_with("invalid up pattern \"(unclosed\""));

        let err = Patterns::compile("[", "(unclosed").unwrap_err();
        assert_eq!(err.kind, PatternKind::Down);
    }

    struct Contains(&'static str);

    impl LineMatcher for Contains {
        fn is_match(&self, line: &str) -> bool {
            line.contains(self.0)
        }
    }

    #[test]
    fn any_matcher_can_classify() {
        let patterns = Patterns {
            down: Contains("DOWN"),
            up: Contains("UP"),
        };
        assert_eq!(patterns.classify("port 3 DOWN"), LineKind::Down);
        assert_eq!(patterns.classify("port 3 UP"), LineKind::Up);
    }
}
