//! Report file persistence
//!
//! One reachable candidate per line, `address:port#location speedMB/s`,
//! fastest first. Optional leading `#` comment lines describe the run.

use crate::{
    error::{AppError, Result},
    models::SpeedResult,
    types::ReportStyle,
};
use chrono::Local;
use std::fmt::Write as _;
use std::net::Ipv4Addr;
use std::path::Path;

/// A report line read back from disk
#[derive(Debug, Clone, PartialEq)]
pub struct ReportEntry {
    pub ip: Ipv4Addr,
    pub port: u16,
    pub location: String,
    pub speed_mbps: f64,
}

/// Renders and writes the ranked report
#[derive(Debug, Clone, Default)]
pub struct ReportWriter {
    style: ReportStyle,
    header: bool,
}

impl ReportWriter {
    pub fn new(style: ReportStyle, header: bool) -> Self {
        Self { style, header }
    }

    pub fn from_config(config: &crate::models::Config) -> Self {
        Self::new(config.report_style, config.report_header)
    }

    /// Report contents for `results`, which must already be sorted
    pub fn render(&self, results: &[SpeedResult]) -> Result<String> {
        let mut output = String::new();

        if self.header {
            writeln!(output, "# {} {} report", crate::PKG_NAME, crate::VERSION)?;
            writeln!(output, "# generated {}", Local::now().format("%Y-%m-%d %H:%M:%S %z"))?;
            writeln!(output, "# {} reachable candidate(s), sorted by speed, fastest first", results.len())?;
        }

        for result in results {
            writeln!(output, "{}", result.format_line(self.style))?;
        }

        Ok(output)
    }

    /// Write the report to `path`, replacing any previous report.
    ///
    /// An empty result list still produces a file.
    pub async fn write(&self, path: &Path, results: &[SpeedResult]) -> Result<()> {
        let content = self.render(results)?;
        tokio::fs::write(path, content)
            .await
            .map_err(|e| AppError::io(format!("Failed to write report {}: {}", path.display(), e)))
    }

    /// Parse one report line. Both separator styles are accepted.
    pub fn parse_line(line: &str) -> Result<ReportEntry> {
        let line = line.trim();
        let invalid = |reason: &str| AppError::parse(format!("Invalid report line '{}': {}", line, reason));

        let (address, rest) = line.split_once('#').ok_or_else(|| invalid("missing '#'"))?;
        let (ip, port) = address.rsplit_once(':').ok_or_else(|| invalid("missing port"))?;
        let ip: Ipv4Addr = ip.parse().map_err(|_| invalid("bad address"))?;
        let port: u16 = port.parse().map_err(|_| invalid("bad port"))?;

        let rest = rest.strip_suffix("MB/s").ok_or_else(|| invalid("missing 'MB/s'"))?;
        let split = rest.rfind([' ', '+']).ok_or_else(|| invalid("missing separator"))?;
        let speed_mbps: f64 = rest[split + 1..].parse().map_err(|_| invalid("bad speed"))?;

        Ok(ReportEntry {
            ip,
            port,
            location: rest[..split].to_string(),
            speed_mbps,
        })
    }

    /// Read a report, skipping comments and blank lines
    pub async fn read(path: &Path) -> Result<Vec<ReportEntry>> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| AppError::io(format!("Failed to read report {}: {}", path.display(), e)))?;

        content
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty() && !l.starts_with('#'))
            .map(Self::parse_line)
            .collect()
    }
}
