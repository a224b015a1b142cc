//! Environment variable handling and .env file management

use crate::error::{AppError, Result};
use crate::types::Language;
use std::path::Path;

/// Environment variable configuration manager
pub struct EnvManager;

impl EnvManager {
    /// Load .env file if it exists. Variables already set in the process win.
    pub fn load_env_file(debug: bool) -> Result<()> {
        Self::load_env_file_from(Path::new(".env"), debug)
    }

    pub fn load_env_file_from(path: &Path, debug: bool) -> Result<()> {
        if path.exists() {
            dotenv::from_path(path)
                .map_err(|e| AppError::config(format!("Failed to load {}: {}", path.display(), e)))?;

            if debug {
                println!("Loaded configuration from {}", path.display());
            }
        } else if debug {
            println!("No .env file found, using defaults and CLI arguments");
        }

        Ok(())
    }

    /// Create example .env file content
    pub fn create_example_env_content() -> String {
        let mut content = String::from(
            "# IP Speed Tester Configuration\n\
             #\n\
             # Values here are used when the matching command-line option is not given.\n\n",
        );

        for (var, description, example) in Self::get_supported_env_vars() {
            content.push_str(&format!("# {}\n# {}={}\n\n", description, var, example));
        }

        content
    }

    /// Save example .env file to disk
    pub fn save_example_env_file(path: &Path) -> Result<()> {
        std::fs::write(path, Self::create_example_env_content())
            .map_err(|e| AppError::config(format!("Failed to write example .env file: {}", e)))
    }

    /// Validate environment variable format before parsing
    pub fn validate_env_var(key: &str, value: &str) -> Result<()> {
        let value = value.trim();

        let number = |min: u64, max: u64| -> Result<()> {
            let n: u64 = value.parse()
                .map_err(|e| AppError::config(format!("Invalid {} value '{}': {}", key, value, e)))?;
            if n < min || n > max {
                return Err(AppError::config(format!("{} must be between {} and {}, got: {}", key, min, max, n)));
            }
            Ok(())
        };

        match key {
            "INPUT_FILE" | "OUTPUT_FILE" | "CURL_PATH" => {
                if value.is_empty() {
                    return Err(AppError::config(format!("{} cannot be empty", key)));
                }
            }
            "SPEED_TEST_URL" | "GEO_PRIMARY_URL" | "GEO_FALLBACK_URL" => {
                let parsed = url::Url::parse(value)
                    .map_err(|e| AppError::config(format!("Invalid {} '{}': {}", key, value, e)))?;
                if parsed.scheme() != "http" && parsed.scheme() != "https" {
                    return Err(AppError::config(format!("{} must use HTTP or HTTPS: {}", key, value)));
                }
            }
            "DOWNLOAD_BYTES" => number(1, u64::MAX)?,
            "MAX_TIME_SECONDS" => number(1, 300)?,
            "CONNECT_TIMEOUT_SECONDS" => number(1, 300)?,
            "PROBE_DELAY_MS" => number(0, 600_000)?,
            "PROBE_RETRIES" => number(0, 1)?,
            "DEFAULT_PORT" => number(1, u16::MAX as u64)?,
            "GEO_TIMEOUT_SECONDS" => number(1, 60)?,
            "LANGUAGE" => {
                value.parse::<Language>()
                    .map_err(|e| AppError::config(format!("Invalid LANGUAGE value '{}': {}", value, e)))?;
            }
            "LOG_FORMAT" => {
                value.parse::<crate::logging::LogFormat>()
                    .map_err(|e| AppError::config(format!("Invalid LOG_FORMAT value '{}': {}", value, e)))?;
            }
            "ENABLE_COLOR" => {
                value.parse::<bool>()
                    .map_err(|e| AppError::config(format!("Invalid ENABLE_COLOR value '{}': {}", value, e)))?;
            }
            _ => {
                // Unknown environment variable, ignore
            }
        }

        Ok(())
    }

    /// Get list of all supported environment variables with descriptions
    pub fn get_supported_env_vars() -> Vec<(&'static str, &'static str, &'static str)> {
        vec![
            ("INPUT_FILE", "Candidate list", "ip.txt"),
            ("OUTPUT_FILE", "Report file", "speed_ip.txt"),
            ("SPEED_TEST_URL", "Speed test URL (bytes parameter is added)", "https://speed.cloudflare.com/__down"),
            ("DOWNLOAD_BYTES", "Bytes to download and expect", "10485760"),
            ("MAX_TIME_SECONDS", "Transfer tool time limit (1-300)", "30"),
            ("CONNECT_TIMEOUT_SECONDS", "Transfer tool connect timeout", "10"),
            ("PROBE_DELAY_MS", "Pause between candidates in milliseconds", "1000"),
            ("PROBE_RETRIES", "Retries after a non-zero exit (0-1)", "1"),
            ("DEFAULT_PORT", "Port reported for lines without one", "8443"),
            ("CURL_PATH", "Transfer tool binary", "curl"),
            ("GEO_PRIMARY_URL", "Primary geolocation service (JSON)", "https://ip-api.com"),
            ("GEO_FALLBACK_URL", "Fallback geolocation service (plain text)", "https://ipapi.co"),
            ("GEO_TIMEOUT_SECONDS", "Geolocation request timeout (1-60)", "10"),
            ("LANGUAGE", "Location language (zh/en)", "zh"),
            ("LOG_FORMAT", "Diagnostic log format (console/json/compact)", "console"),
            ("ENABLE_COLOR", "Enable colored output", "true"),
        ]
    }

    /// Display environment variable help
    pub fn display_env_help() -> String {
        let mut help = String::new();
        help.push_str("Supported Environment Variables:\n\n");

        for (var, description, example) in Self::get_supported_env_vars() {
            help.push_str(&format!("  {:<24} {}\n", var, description));
            help.push_str(&format!("  {:<24} Example: {}\n\n", "", example));
        }

        help.push_str("Configuration Priority (highest to lowest):\n");
        help.push_str("  1. Command-line arguments\n");
        help.push_str("  2. Environment variables\n");
        help.push_str("  3. .env file values\n");
        help.push_str("  4. Default values\n");

        help
    }

    /// Validate all currently set environment variables
    pub fn validate_current_env() -> Vec<String> {
        Self::get_supported_env_vars()
            .into_iter()
            .filter_map(|(name, _, _)| {
                let value = std::env::var(name).ok()?;
                Self::validate_env_var(name, &value).err().map(|e| format!("Warning: {}", e))
            })
            .collect()
    }

    /// Check if the .env file at `path` exists and validate its contents
    pub fn check_env_file(path: &Path) -> Result<Option<Vec<String>>> {
        if !path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| AppError::config(format!("Failed to read {}: {}", path.display(), e)))?;

        let mut warnings = Vec::new();

        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            if let Some((key, value)) = line.split_once('=') {
                let value = value.trim().trim_matches('"');
                if let Err(e) = Self::validate_env_var(key.trim(), value) {
                    warnings.push(format!("Line '{}': {}", line, e));
                }
            }
        }

        Ok(Some(warnings))
    }
}
