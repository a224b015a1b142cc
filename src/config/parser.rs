//! Configuration parsing from CLI arguments and environment variables

use crate::{
    cli::Cli,
    config::env::EnvManager,
    error::{AppError, Result},
    models::Config,
    types::ReportStyle,
};

/// Configuration parser that combines CLI arguments with environment variables
pub struct ConfigParser {
    cli: Cli,
}

impl ConfigParser {
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Build the configuration: defaults, `.env`, environment, then CLI
    pub fn parse(&self) -> Result<Config> {
        self.cli.validate().map_err(AppError::config)?;

        let mut config = Config::default();

        EnvManager::load_env_file(self.cli.debug)?;
        config.merge_from_env()?;

        self.apply_cli_overrides(&mut config);

        config.validate()?;

        Ok(config)
    }

    /// Apply CLI argument overrides to configuration
    fn apply_cli_overrides(&self, config: &mut Config) {
        let cli = &self.cli;

        if let Some(input) = &cli.input {
            config.input_file = input.clone();
        }
        if let Some(output) = &cli.output {
            config.output_file = output.clone();
        }
        if let Some(url) = &cli.url {
            config.speed_test_url = url.clone();
        }
        if let Some(bytes) = cli.bytes {
            config.download_bytes = bytes;
        }
        if let Some(max_time) = cli.max_time {
            config.max_time_seconds = max_time;
        }
        if let Some(connect_timeout) = cli.connect_timeout {
            config.connect_timeout_seconds = connect_timeout;
        }
        if let Some(delay_ms) = cli.delay_ms {
            config.probe_delay_ms = delay_ms;
        }
        if let Some(retries) = cli.retries {
            config.probe_retries = retries;
        }
        if let Some(port) = cli.default_port {
            config.default_port = port;
        }
        if let Some(curl) = &cli.curl {
            config.curl_path = curl.clone();
        }
        if let Some(lang) = cli.lang {
            config.language = lang.into();
        }
        if let Some(format) = cli.log_format {
            config.log_format = format.into();
        }

        if cli.no_geo {
            config.geo_lookup = false;
        }
        if cli.geo_detail {
            config.geo_detail = true;
        }
        if cli.header {
            config.report_header = true;
        }
        if cli.plus_separator {
            config.report_style = ReportStyle::Plus;
        }

        // NO_COLOR and dumb terminals only matter when no flag decides
        config.enable_color = match cli.color_override() {
            Some(forced) => forced,
            None => config.enable_color && crate::cli::supports_color(),
        };

        config.verbose = cli.verbose || cli.debug;
        config.debug = cli.debug;
    }
}

/// Convenience function to load complete configuration from CLI arguments
pub fn load_config(cli: Cli) -> Result<Config> {
    ConfigParser::new(cli).parse()
}

/// Display configuration summary for debug purposes
pub fn display_config_summary(config: &Config) -> String {
    let test_url = config
        .test_url()
        .map(|u| u.to_string())
        .unwrap_or_else(|_| config.speed_test_url.clone());

    let summary = [
        format!("Input File: {}", config.input_file.display()),
        format!("Output File: {}", config.output_file.display()),
        format!("Test URL: {}", test_url),
        format!("Expected Bytes: {}", config.download_bytes),
        format!("Max Time: {}s (connect {}s)", config.max_time_seconds, config.connect_timeout_seconds),
        format!("Probe Retries: {}", config.probe_retries),
        format!("Probe Delay: {}ms", config.probe_delay_ms),
        format!("Default Port: {}", config.default_port),
        format!("Transfer Tool: {}", config.curl_path),
        format!(
            "Geolocation: {}",
            if config.geo_lookup {
                format!("{} -> {} ({}s)", config.geo_primary_url, config.geo_fallback_url, config.geo_timeout_seconds)
            } else {
                "disabled".to_string()
            }
        ),
        format!("Language: {}", config.language.code()),
        format!("Report Style: {:?}{}", config.report_style, if config.report_header { " with header" } else { "" }),
        format!("Color Output: {}", config.enable_color),
        format!("Verbose: {}", config.verbose),
        format!("Debug: {}", config.debug),
    ];

    summary.join("\n")
}
