//! Configuration data model and validation

use crate::logging::LogFormat;
use crate::types::{AppError, Language, ReportStyle, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Candidate list to read
    #[serde(default = "default_input_file")]
    pub input_file: PathBuf,

    /// Report file to write
    #[serde(default = "default_output_file")]
    pub output_file: PathBuf,

    /// Speed test endpoint without the `bytes` query parameter
    #[serde(default = "default_speed_test_url")]
    pub speed_test_url: String,

    /// Bytes requested from and expected back from the endpoint
    #[serde(default = "default_download_bytes")]
    pub download_bytes: u64,

    /// Transfer tool `--max-time`
    #[serde(default = "default_max_time_secs")]
    pub max_time_seconds: u64,

    /// Transfer tool `--connect-timeout`
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_seconds: u64,

    /// Pause after each candidate
    #[serde(default = "default_probe_delay_ms")]
    pub probe_delay_ms: u64,

    /// Extra attempts after a non-zero exit
    #[serde(default = "default_probe_retries")]
    pub probe_retries: u32,

    /// Port reported for candidates listed without one
    #[serde(default = "default_candidate_port")]
    pub default_port: u16,

    /// Transfer tool binary
    #[serde(default = "default_curl_path")]
    pub curl_path: String,

    /// Primary geolocation provider base URL (ip-api.com protocol)
    #[serde(default = "default_geo_primary_url")]
    pub geo_primary_url: String,

    /// Fallback geolocation provider base URL (ipapi.co protocol)
    #[serde(default = "default_geo_fallback_url")]
    pub geo_fallback_url: String,

    #[serde(default = "default_geo_timeout_secs")]
    pub geo_timeout_seconds: u64,

    /// Look up locations; when off every address gets the placeholder
    #[serde(default = "default_geo_lookup")]
    pub geo_lookup: bool,

    /// Append region and city to the country
    #[serde(default)]
    pub geo_detail: bool,

    #[serde(default)]
    pub language: Language,

    #[serde(default)]
    pub report_style: ReportStyle,

    /// Prepend comment lines to the report
    #[serde(default)]
    pub report_header: bool,

    /// Enable colored terminal output
    #[serde(default = "default_enable_color")]
    pub enable_color: bool,

    /// Diagnostic log rendering
    #[serde(default)]
    pub log_format: LogFormat,

    /// Enable verbose output
    #[serde(default)]
    pub verbose: bool,

    /// Enable debug output
    #[serde(default)]
    pub debug: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            input_file: default_input_file(),
            output_file: default_output_file(),
            speed_test_url: default_speed_test_url(),
            download_bytes: default_download_bytes(),
            max_time_seconds: default_max_time_secs(),
            connect_timeout_seconds: default_connect_timeout_secs(),
            probe_delay_ms: default_probe_delay_ms(),
            probe_retries: default_probe_retries(),
            default_port: default_candidate_port(),
            curl_path: default_curl_path(),
            geo_primary_url: default_geo_primary_url(),
            geo_fallback_url: default_geo_fallback_url(),
            geo_timeout_seconds: default_geo_timeout_secs(),
            geo_lookup: true,
            geo_detail: false,
            language: Language::default(),
            report_style: ReportStyle::default(),
            report_header: false,
            enable_color: default_enable_color(),
            log_format: LogFormat::default(),
            verbose: false,
            debug: false,
        }
    }
}

impl Config {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    pub fn probe_delay(&self) -> Duration {
        Duration::from_millis(self.probe_delay_ms)
    }

    pub fn geo_timeout(&self) -> Duration {
        Duration::from_secs(self.geo_timeout_seconds)
    }

    /// Hard wall-clock limit for one transfer tool invocation
    pub fn process_timeout(&self) -> Duration {
        Duration::from_secs(self.max_time_seconds) + crate::defaults::PROCESS_TIMEOUT_GRACE
    }

    /// Full test URL with the `bytes` parameter applied
    pub fn test_url(&self) -> Result<Url> {
        let mut url = Url::parse(&self.speed_test_url)
            .map_err(|e| AppError::config(format!("Invalid speed test URL '{}': {}", self.speed_test_url, e)))?;

        let retained: Vec<(String, String)> = url
            .query_pairs()
            .filter(|(k, _)| k != "bytes")
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();

        url.query_pairs_mut()
            .clear()
            .extend_pairs(retained)
            .append_pair("bytes", &self.download_bytes.to_string());

        Ok(url)
    }

    /// Host and port the transfer tool must pin to the candidate address
    pub fn resolve_target(&self) -> Result<(String, u16)> {
        let url = self.test_url()?;
        let host = url
            .host_str()
            .ok_or_else(|| AppError::config(format!("Speed test URL has no host: {}", url)))?
            .to_string();
        let port = url
            .port_or_known_default()
            .ok_or_else(|| AppError::config(format!("Speed test URL has no port: {}", url)))?;
        Ok((host, port))
    }

    /// Validate the configuration and return any errors
    pub fn validate(&self) -> Result<()> {
        if self.input_file.as_os_str().is_empty() {
            return Err(AppError::config("Input file cannot be empty"));
        }

        if self.output_file.as_os_str().is_empty() {
            return Err(AppError::config("Output file cannot be empty"));
        }

        match Url::parse(&self.speed_test_url) {
            Ok(parsed) => {
                if parsed.scheme() != "https" && parsed.scheme() != "http" {
                    return Err(AppError::config(format!("Speed test URL must use HTTP or HTTPS: {}", self.speed_test_url)));
                }
                if parsed.host_str().is_none() {
                    return Err(AppError::config(format!("Speed test URL has no host: {}", self.speed_test_url)));
                }
            }
            Err(e) => {
                return Err(AppError::config(format!("Invalid speed test URL '{}': {}", self.speed_test_url, e)));
            }
        }

        for (name, value) in [("primary", &self.geo_primary_url), ("fallback", &self.geo_fallback_url)] {
            if let Err(e) = Url::parse(value) {
                return Err(AppError::config(format!("Invalid {} geolocation URL '{}': {}", name, value, e)));
            }
        }

        if self.download_bytes == 0 {
            return Err(AppError::config("Download size must be greater than 0"));
        }

        if self.max_time_seconds == 0 || self.max_time_seconds > 300 {
            return Err(AppError::config("Max time must be between 1 and 300 seconds"));
        }

        if self.connect_timeout_seconds == 0 || self.connect_timeout_seconds > self.max_time_seconds {
            return Err(AppError::config("Connect timeout must be between 1 second and the max time"));
        }

        if self.probe_retries > 1 {
            return Err(AppError::config("Probe retries cannot exceed 1"));
        }

        if self.default_port == 0 {
            return Err(AppError::config("Default port must be greater than 0"));
        }

        if self.curl_path.trim().is_empty() {
            return Err(AppError::config("Transfer tool path cannot be empty"));
        }

        if self.geo_timeout_seconds == 0 || self.geo_timeout_seconds > 60 {
            return Err(AppError::config("Geolocation timeout must be between 1 and 60 seconds"));
        }

        Ok(())
    }

    /// Merge environment variables into this configuration
    pub fn merge_from_env(&mut self) -> Result<()> {
        if let Ok(value) = std::env::var("INPUT_FILE") {
            self.input_file = PathBuf::from(value.trim());
        }

        if let Ok(value) = std::env::var("OUTPUT_FILE") {
            self.output_file = PathBuf::from(value.trim());
        }

        if let Ok(value) = std::env::var("SPEED_TEST_URL") {
            self.speed_test_url = value.trim().to_string();
        }

        if let Ok(value) = std::env::var("DOWNLOAD_BYTES") {
            self.download_bytes = value.trim().parse()
                .map_err(|e| AppError::config(format!("Invalid DOWNLOAD_BYTES value '{}': {}", value, e)))?;
        }

        if let Ok(value) = std::env::var("MAX_TIME_SECONDS") {
            self.max_time_seconds = value.trim().parse()
                .map_err(|e| AppError::config(format!("Invalid MAX_TIME_SECONDS value '{}': {}", value, e)))?;
        }

        if let Ok(value) = std::env::var("CONNECT_TIMEOUT_SECONDS") {
            self.connect_timeout_seconds = value.trim().parse()
                .map_err(|e| AppError::config(format!("Invalid CONNECT_TIMEOUT_SECONDS value '{}': {}", value, e)))?;
        }

        if let Ok(value) = std::env::var("PROBE_DELAY_MS") {
            self.probe_delay_ms = value.trim().parse()
                .map_err(|e| AppError::config(format!("Invalid PROBE_DELAY_MS value '{}': {}", value, e)))?;
        }

        if let Ok(value) = std::env::var("PROBE_RETRIES") {
            self.probe_retries = value.trim().parse()
                .map_err(|e| AppError::config(format!("Invalid PROBE_RETRIES value '{}': {}", value, e)))?;
        }

        if let Ok(value) = std::env::var("DEFAULT_PORT") {
            self.default_port = value.trim().parse()
                .map_err(|e| AppError::config(format!("Invalid DEFAULT_PORT value '{}': {}", value, e)))?;
        }

        if let Ok(value) = std::env::var("CURL_PATH") {
            self.curl_path = value.trim().to_string();
        }

        if let Ok(value) = std::env::var("GEO_PRIMARY_URL") {
            self.geo_primary_url = value.trim().to_string();
        }

        if let Ok(value) = std::env::var("GEO_FALLBACK_URL") {
            self.geo_fallback_url = value.trim().to_string();
        }

        if let Ok(value) = std::env::var("GEO_TIMEOUT_SECONDS") {
            self.geo_timeout_seconds = value.trim().parse()
                .map_err(|e| AppError::config(format!("Invalid GEO_TIMEOUT_SECONDS value '{}': {}", value, e)))?;
        }

        if let Ok(value) = std::env::var("LANGUAGE") {
            self.language = value.parse()
                .map_err(|e| AppError::config(format!("Invalid LANGUAGE value '{}': {}", value, e)))?;
        }

        if let Ok(value) = std::env::var("LOG_FORMAT") {
            self.log_format = value.trim().parse()
                .map_err(|e| AppError::config(format!("Invalid LOG_FORMAT value '{}': {}", value, e)))?;
        }

        if let Ok(value) = std::env::var("ENABLE_COLOR") {
            self.enable_color = value.trim().parse()
                .map_err(|e| AppError::config(format!("Invalid ENABLE_COLOR value '{}': {}", value, e)))?;
        }

        Ok(())
    }
}

// Default value functions for serde
fn default_input_file() -> PathBuf {
    PathBuf::from(crate::defaults::DEFAULT_INPUT_FILE)
}

fn default_output_file() -> PathBuf {
    PathBuf::from(crate::defaults::DEFAULT_OUTPUT_FILE)
}

fn default_speed_test_url() -> String {
    crate::defaults::DEFAULT_SPEED_TEST_URL.to_string()
}

fn default_download_bytes() -> u64 {
    crate::defaults::DEFAULT_DOWNLOAD_BYTES
}

fn default_max_time_secs() -> u64 {
    crate::defaults::DEFAULT_MAX_TIME_SECS
}

fn default_connect_timeout_secs() -> u64 {
    crate::defaults::DEFAULT_CONNECT_TIMEOUT_SECS
}

fn default_probe_delay_ms() -> u64 {
    crate::defaults::DEFAULT_PROBE_DELAY_MS
}

fn default_probe_retries() -> u32 {
    crate::defaults::DEFAULT_PROBE_RETRIES
}

fn default_candidate_port() -> u16 {
    crate::defaults::DEFAULT_CANDIDATE_PORT
}

fn default_curl_path() -> String {
    crate::defaults::DEFAULT_CURL_PATH.to_string()
}

fn default_geo_primary_url() -> String {
    crate::defaults::DEFAULT_GEO_PRIMARY_URL.to_string()
}

fn default_geo_fallback_url() -> String {
    crate::defaults::DEFAULT_GEO_FALLBACK_URL.to_string()
}

fn default_geo_timeout_secs() -> u64 {
    crate::defaults::DEFAULT_GEO_TIMEOUT.as_secs()
}

fn default_geo_lookup() -> bool {
    true
}

fn default_enable_color() -> bool {
    crate::defaults::DEFAULT_ENABLE_COLOR
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert!(config.geo_lookup);
        assert_eq!(config.process_timeout(), Duration::from_secs(40));
    }

    #[test]
    fn test_default_test_url_and_target() {
        let config = Config::default();
        assert_eq!(
            config.test_url().unwrap().as_str(),
            "https://speed.cloudflare.com/__down?bytes=10485760"
        );
        assert_eq!(
            config.resolve_target().unwrap(),
            ("speed.cloudflare.com".to_string(), 443)
        );
    }

    #[test]
    fn test_test_url_replaces_existing_bytes_param() {
        let config = Config {
            speed_test_url: "http://mirror.example:8080/dl?bytes=1&x=y".to_string(),
            download_bytes: 2048,
            ..Default::default()
        };
        assert_eq!(config.test_url().unwrap().as_str(), "http://mirror.example:8080/dl?x=y&bytes=2048");
        assert_eq!(config.resolve_target().unwrap(), ("mirror.example".to_string(), 8080));
    }

    #[test]
    fn test_invalid_speed_test_url() {
        let mut config = Config::default();
        config.speed_test_url = "not-a-url".to_string();
        assert!(config.validate().is_err());

        config.speed_test_url = "ftp://example.com/file".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_numeric_bounds() {
        let mut config = Config::default();
        config.download_bytes = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.max_time_seconds = 301;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.connect_timeout_seconds = 31;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.probe_retries = 2;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.default_port = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_paths_invalid() {
        let mut config = Config::default();
        config.output_file = PathBuf::new();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.curl_path = "  ".to_string();
        assert!(config.validate().is_err());
    }
}
