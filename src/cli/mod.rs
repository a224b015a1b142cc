//! Command-line interface

use crate::logging::LogFormat;
use crate::types::Language;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Location language accepted on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LangArg {
    Zh,
    En,
}

impl From<LangArg> for Language {
    fn from(arg: LangArg) -> Self {
        match arg {
            LangArg::Zh => Language::Chinese,
            LangArg::En => Language::English,
        }
    }
}

/// Diagnostic log format accepted on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormatArg {
    Console,
    Json,
    Compact,
}

impl From<LogFormatArg> for LogFormat {
    fn from(arg: LogFormatArg) -> Self {
        match arg {
            LogFormatArg::Console => LogFormat::Console,
            LogFormatArg::Json => LogFormat::Json,
            LogFormatArg::Compact => LogFormat::Compact,
        }
    }
}

/// IP Speed Tester - rank candidate IP addresses by measured download throughput
///
/// Options left unset fall back to environment variables (or a `.env` file),
/// then to built-in defaults.
#[derive(Parser, Debug, Clone)]
#[command(name = "ipst")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Candidate list, one `address[:port] # label` per line [default: ip.txt]
    #[arg(short, long, value_name = "FILE")]
    pub input: Option<PathBuf>,

    /// Report file [default: speed_ip.txt]
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Speed test URL; its host and port are pinned to each candidate
    #[arg(long, value_name = "URL")]
    pub url: Option<String>,

    /// Bytes to download from the test URL
    #[arg(long, value_name = "N", value_parser = parse_positive_u64)]
    pub bytes: Option<u64>,

    /// Transfer tool time limit in seconds
    #[arg(long, value_name = "SECS", value_parser = parse_duration)]
    pub max_time: Option<u64>,

    /// Transfer tool connect timeout in seconds
    #[arg(long, value_name = "SECS", value_parser = parse_duration)]
    pub connect_timeout: Option<u64>,

    /// Pause between candidates in milliseconds
    #[arg(long, value_name = "MS")]
    pub delay_ms: Option<u64>,

    /// Retries after a non-zero transfer tool exit (0 or 1)
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u32).range(0..=1))]
    pub retries: Option<u32>,

    /// Port reported for lines without one
    #[arg(long, value_name = "PORT", value_parser = clap::value_parser!(u16).range(1..))]
    pub default_port: Option<u16>,

    /// Transfer tool binary
    #[arg(long, value_name = "PATH")]
    pub curl: Option<String>,

    /// Location language
    #[arg(long, value_enum)]
    pub lang: Option<LangArg>,

    /// Skip geolocation; every address gets the placeholder location
    #[arg(long)]
    pub no_geo: bool,

    /// Append region and city to the country
    #[arg(long, conflicts_with = "no_geo")]
    pub geo_detail: bool,

    /// Prepend comment lines describing the run to the report
    #[arg(long)]
    pub header: bool,

    /// Separate location and speed with `+` instead of a space
    #[arg(long)]
    pub plus_separator: bool,

    /// Force colored output
    #[arg(long)]
    pub color: bool,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,

    /// Diagnostic log format
    #[arg(long, value_enum)]
    pub log_format: Option<LogFormatArg>,

    /// Enable verbose output
    #[arg(long)]
    pub verbose: bool,

    /// Enable debug output
    #[arg(long)]
    pub debug: bool,
}

impl Cli {
    /// Validate CLI arguments for conflicts
    pub fn validate(&self) -> Result<(), String> {
        if self.color && self.no_color {
            return Err("Cannot specify both --color and --no-color".to_string());
        }

        if let (Some(max_time), Some(connect)) = (self.max_time, self.connect_timeout) {
            if connect > max_time {
                return Err(format!(
                    "--connect-timeout ({}s) cannot exceed --max-time ({}s)",
                    connect, max_time
                ));
            }
        }

        if let Some(curl) = &self.curl {
            if curl.trim().is_empty() {
                return Err("--curl cannot be empty".to_string());
            }
        }

        Ok(())
    }

    /// Color decision from the flags alone; `None` leaves it to configuration
    pub fn color_override(&self) -> Option<bool> {
        if self.color {
            Some(true)
        } else if self.no_color {
            Some(false)
        } else {
            None
        }
    }

    /// Check if colors should be enabled
    pub fn use_colors(&self) -> bool {
        self.color_override().unwrap_or_else(supports_color)
    }
}

/// Parse duration from seconds string
fn parse_duration(s: &str) -> Result<u64, String> {
    if s.starts_with('+') || s.starts_with("0x") || s.starts_with("0X") {
        return Err(format!("Invalid duration: {}", s));
    }

    s.parse::<u64>()
        .map_err(|_| format!("Invalid duration: {}", s))
        .and_then(|secs| {
            if secs == 0 {
                Err("Duration must be greater than 0".to_string())
            } else if secs > 300 {
                Err("Duration cannot exceed 300 seconds".to_string())
            } else {
                Ok(secs)
            }
        })
}

fn parse_positive_u64(s: &str) -> Result<u64, String> {
    match s.parse::<u64>() {
        Ok(0) => Err("Value must be greater than 0".to_string()),
        Ok(n) => Ok(n),
        Err(_) => Err(format!("Invalid number: {}", s)),
    }
}

/// Check if the terminal supports color output
pub fn supports_color() -> bool {
    if let Ok(term) = std::env::var("TERM") {
        if term == "dumb" {
            return false;
        }
    }

    if std::env::var("NO_COLOR").is_ok() {
        return false;
    }

    if std::env::var("FORCE_COLOR").is_ok() {
        return true;
    }

    #[cfg(target_os = "windows")]
    {
        if std::env::var("ANSICON").is_ok() || std::env::var("ConEmuANSI").is_ok() {
            return true;
        }
    }

    #[cfg(unix)]
    {
        true
    }
    #[cfg(not(unix))]
    {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing_defaults() {
        let cli = Cli::parse_from(["ipst"]);
        assert!(cli.input.is_none());
        assert!(cli.output.is_none());
        assert!(cli.retries.is_none());
        assert!(!cli.no_geo);
        assert!(!cli.verbose);
        assert_eq!(cli.color_override(), None);
        assert!(cli.validate().is_ok());
    }

    #[test]
    fn test_cli_parsing_all_options() {
        let cli = Cli::parse_from([
            "ipst",
            "-i", "candidates.txt",
            "-o", "ranked.txt",
            "--url", "https://example.com/__down",
            "--bytes", "1048576",
            "--max-time", "20",
            "--connect-timeout", "5",
            "--delay-ms", "0",
            "--retries", "0",
            "--default-port", "2053",
            "--curl", "/usr/local/bin/curl",
            "--lang", "en",
            "--geo-detail",
            "--header",
            "--plus-separator",
            "--no-color",
            "--log-format", "json",
            "--verbose",
            "--debug",
        ]);

        assert_eq!(cli.input, Some(PathBuf::from("candidates.txt")));
        assert_eq!(cli.output, Some(PathBuf::from("ranked.txt")));
        assert_eq!(cli.url.as_deref(), Some("https://example.com/__down"));
        assert_eq!(cli.bytes, Some(1_048_576));
        assert_eq!(cli.max_time, Some(20));
        assert_eq!(cli.connect_timeout, Some(5));
        assert_eq!(cli.delay_ms, Some(0));
        assert_eq!(cli.retries, Some(0));
        assert_eq!(cli.default_port, Some(2053));
        assert_eq!(cli.curl.as_deref(), Some("/usr/local/bin/curl"));
        assert_eq!(cli.lang, Some(LangArg::En));
        assert!(cli.geo_detail);
        assert!(cli.header);
        assert!(cli.plus_separator);
        assert_eq!(cli.color_override(), Some(false));
        assert_eq!(cli.log_format, Some(LogFormatArg::Json));
        assert!(cli.verbose);
        assert!(cli.debug);
    }

    #[test]
    fn test_rejected_values() {
        assert!(Cli::try_parse_from(["ipst", "--retries", "2"]).is_err());
        assert!(Cli::try_parse_from(["ipst", "--default-port", "0"]).is_err());
        assert!(Cli::try_parse_from(["ipst", "--max-time", "0"]).is_err());
        assert!(Cli::try_parse_from(["ipst", "--bytes", "0"]).is_err());
        assert!(Cli::try_parse_from(["ipst", "--lang", "fr"]).is_err());
        assert!(Cli::try_parse_from(["ipst", "--no-geo", "--geo-detail"]).is_err());
    }

    #[test]
    fn test_validate_conflicts() {
        let cli = Cli::parse_from(["ipst", "--color", "--no-color"]);
        assert!(cli.validate().is_err());

        let cli = Cli::parse_from(["ipst", "--max-time", "5", "--connect-timeout", "10"]);
        assert!(cli.validate().unwrap_err().contains("--connect-timeout"));
    }

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("30"), Ok(30));
        assert!(parse_duration("+30").is_err());
        assert!(parse_duration("0x1e").is_err());
        assert!(parse_duration("301").is_err());
    }

    #[test]
    fn test_language_conversion() {
        assert_eq!(Language::from(LangArg::Zh), Language::Chinese);
        assert_eq!(Language::from(LangArg::En), Language::English);
        assert_eq!(LogFormat::from(LogFormatArg::Compact), LogFormat::Compact);
    }
}
