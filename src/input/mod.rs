//! Candidate list parsing
//!
//! The list is line oriented: `address[:port] # label`. Blank lines and lines
//! starting with `#` or `-` are ignored, anything else that does not match
//! the pattern is reported and skipped.

use crate::{
    error::{AppError, Result},
    models::Candidate,
};
use regex::Regex;
use std::net::Ipv4Addr;
use std::path::Path;

#[cfg(test)]
mod comprehensive_tests;

/// `address[:port] # label` with a dotted-quad address
pub const CANDIDATE_PATTERN: &str = r"^(\d{1,3}\.\d{1,3}\.\d{1,3}\.\d{1,3})(?::(\d+))?\s*#(.*)$";

/// Classification of a single input line
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedLine {
    Candidate(Candidate),
    /// Blank, comment or separator line
    Ignored,
    /// Significant line that could not be parsed
    Invalid(InvalidLine),
}

/// A skipped line and the reason it was skipped
#[derive(Debug, Clone, PartialEq)]
pub struct InvalidLine {
    pub line_number: usize,
    pub content: String,
    pub reason: String,
}

/// Everything read from one candidate list
#[derive(Debug, Clone, Default)]
pub struct CandidateList {
    pub candidates: Vec<Candidate>,
    pub invalid: Vec<InvalidLine>,
    /// Lines that were neither blank nor comments
    pub significant_lines: usize,
}

impl CandidateList {
    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }
}

/// Line parser for candidate lists
pub struct CandidateParser {
    pattern: Regex,
    default_port: u16,
}

impl CandidateParser {
    /// Create a parser that fills in `default_port` for lines without one
    pub fn new(default_port: u16) -> Result<Self> {
        Ok(Self {
            pattern: Regex::new(CANDIDATE_PATTERN)?,
            default_port,
        })
    }

    /// Classify one raw line; `line_number` is 1-based
    pub fn parse_line(&self, raw: &str, line_number: usize) -> ParsedLine {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with('-') {
            return ParsedLine::Ignored;
        }

        let invalid = |reason: String| {
            ParsedLine::Invalid(InvalidLine {
                line_number,
                content: line.to_string(),
                reason,
            })
        };

        let Some(captures) = self.pattern.captures(line) else {
            return invalid("expected 'address[:port] # label'".to_string());
        };

        let ip: Ipv4Addr = match captures[1].parse() {
            Ok(ip) => ip,
            Err(_) => return invalid(format!("'{}' is not a valid IPv4 address", &captures[1])),
        };

        let (port, port_explicit) = match captures.get(2) {
            Some(port) => match port.as_str().parse::<u16>() {
                Ok(p) if p > 0 => (p, true),
                _ => return invalid(format!("'{}' is not a valid port", port.as_str())),
            },
            None => (self.default_port, false),
        };

        ParsedLine::Candidate(Candidate {
            ip,
            port,
            port_explicit,
            label: captures[3].trim().to_string(),
            line_number,
        })
    }

    /// Parse a whole list held in memory
    pub fn parse_str(&self, content: &str) -> CandidateList {
        let mut list = CandidateList::default();

        for (index, raw) in content.lines().enumerate() {
            match self.parse_line(raw, index + 1) {
                ParsedLine::Candidate(candidate) => {
                    list.significant_lines += 1;
                    list.candidates.push(candidate);
                }
                ParsedLine::Invalid(line) => {
                    list.significant_lines += 1;
                    list.invalid.push(line);
                }
                ParsedLine::Ignored => {}
            }
        }

        list
    }
}

/// Read and parse the candidate list at `path`.
///
/// A missing file or one without any significant line is an
/// [`AppError::Input`]; unparseable lines are returned in
/// [`CandidateList::invalid`] and never fail the read.
pub fn read_candidates(path: &Path, default_port: u16) -> Result<CandidateList> {
    if !path.exists() {
        return Err(AppError::input(format!("{} does not exist", path.display())));
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| AppError::input(format!("Failed to read {}: {}", path.display(), e)))?;

    let list = CandidateParser::new(default_port)?.parse_str(&content);

    if list.significant_lines == 0 {
        return Err(AppError::input(format!("{} contains no candidate addresses", path.display())));
    }

    Ok(list)
}
