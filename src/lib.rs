//! IP Speed Tester
//!
//! Measures download bandwidth to a list of candidate CDN addresses by
//! forcing an HTTPS transfer through each address with an external transfer
//! tool, annotates every address with its geographic location, and writes a
//! report of reachable addresses sorted by measured throughput.

pub mod cli;
pub mod config;
pub mod error;
pub mod executor;
pub mod geo;
pub mod input;
pub mod logging;
pub mod models;
pub mod output;
pub mod probe;
pub mod types;

// Re-export commonly used types
pub use error::{AppError, Result};
pub use models::{Candidate, Config, ProbeOutcome, SpeedResult, TransferStats};
pub use executor::{ExecutionResults, SpeedTestRunner};
pub use geo::GeoLocator;
pub use probe::{CurlTool, TransferTool};
pub use output::{OutputFormatter, ColoredFormatter, PlainFormatter, OutputFormatterFactory, ReportWriter};

/// Application version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const PKG_NAME: &str = env!("CARGO_PKG_NAME");
pub const PKG_DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");

/// Default configuration values
pub mod defaults {
    use std::time::Duration;

    pub const DEFAULT_INPUT_FILE: &str = "ip.txt";
    pub const DEFAULT_OUTPUT_FILE: &str = "speed_ip.txt";

    /// Cloudflare's bandwidth endpoint, serves `bytes` of random data
    pub const DEFAULT_SPEED_TEST_URL: &str = "https://speed.cloudflare.com/__down";
    pub const DEFAULT_DOWNLOAD_BYTES: u64 = 10_485_760;

    /// Minimum fraction of the expected body that must arrive
    pub const COMPLETENESS_RATIO: f64 = 0.9;

    /// Port reported for candidates listed without one
    pub const DEFAULT_CANDIDATE_PORT: u16 = 8443;

    pub const DEFAULT_MAX_TIME_SECS: u64 = 30;
    pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
    /// Grace added on top of the transfer tool's own `--max-time`
    pub const PROCESS_TIMEOUT_GRACE: Duration = Duration::from_secs(10);
    pub const DEFAULT_PROBE_RETRIES: u32 = 1;
    pub const RETRY_DELAY: Duration = Duration::from_secs(2);
    pub const DEFAULT_PROBE_DELAY_MS: u64 = 1000;

    pub const DEFAULT_CURL_PATH: &str = "curl";

    pub const DEFAULT_GEO_PRIMARY_URL: &str = "https://ip-api.com";
    pub const DEFAULT_GEO_FALLBACK_URL: &str = "https://ipapi.co";
    pub const DEFAULT_GEO_TIMEOUT: Duration = Duration::from_secs(10);

    /// Browser user agent, the free geolocation tiers reject obvious bots
    pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

    pub const DEFAULT_ENABLE_COLOR: bool = true;
}
