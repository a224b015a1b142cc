//! Type definitions and aliases

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// Re-export commonly used types
pub use crate::error::{AppError, Result};

/// Outcome classification for a single throughput probe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProbeStatus {
    /// Transfer completed and reported a positive rate
    Success,
    /// Transfer finished but fewer bytes than required arrived
    Incomplete,
    /// Transfer tool exited non-zero or could not be started
    Failed,
    /// Transfer tool exceeded the hard wall-clock limit
    Timeout,
}

impl ProbeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProbeStatus::Success => "success",
            ProbeStatus::Incomplete => "incomplete",
            ProbeStatus::Failed => "failed",
            ProbeStatus::Timeout => "timeout",
        }
    }
}

impl fmt::Display for ProbeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Language used for location labels in the report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Language {
    /// Country names translated to Chinese
    #[default]
    Chinese,
    /// Country names as returned by the provider
    English,
}

impl Language {
    /// Placeholder label used when no provider could locate an address
    pub fn unknown_label(&self) -> &'static str {
        match self {
            Language::Chinese => "未知",
            Language::English => "Unknown",
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Language::Chinese => "zh",
            Language::English => "en",
        }
    }
}

impl FromStr for Language {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "zh" | "cn" | "chinese" => Ok(Language::Chinese),
            "en" | "english" => Ok(Language::English),
            other => Err(AppError::parse(format!("Unsupported language: {}", other))),
        }
    }
}

/// Separator placed between location and speed in report lines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ReportStyle {
    /// `1.2.3.4:8443#美国 12.3MB/s`
    #[default]
    Space,
    /// `1.2.3.4:8443#美国+12.3MB/s`
    Plus,
}

impl ReportStyle {
    pub fn separator(&self) -> char {
        match self {
            ReportStyle::Space => ' ',
            ReportStyle::Plus => '+',
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_parsing() {
        assert_eq!("zh".parse::<Language>().unwrap(), Language::Chinese);
        assert_eq!("CN".parse::<Language>().unwrap(), Language::Chinese);
        assert_eq!(" en ".parse::<Language>().unwrap(), Language::English);
        assert!("fr".parse::<Language>().is_err());
    }

    #[test]
    fn test_unknown_labels() {
        assert_eq!(Language::Chinese.unknown_label(), "未知");
        assert_eq!(Language::English.unknown_label(), "Unknown");
    }

    #[test]
    fn test_report_separator() {
        assert_eq!(ReportStyle::Space.separator(), ' ');
        assert_eq!(ReportStyle::Plus.separator(), '+');
    }
}
