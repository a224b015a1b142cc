//! Throughput measurement and result data models

use crate::models::Candidate;
use crate::types::{ProbeStatus, ReportStyle};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

const BYTES_PER_MB: f64 = 1_048_576.0;

/// Transfer statistics reported by the external transfer tool
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TransferStats {
    /// Average download rate in bytes per second (`%{speed_download}`)
    pub speed_bytes_per_sec: f64,
    /// Body bytes received (`%{size_download}`)
    pub size_download: f64,
}

impl TransferStats {
    /// Parse the `-w` output block.
    ///
    /// Expects `speed_download:<float>` and `size:<float>` lines in any
    /// order; other lines are ignored, missing values read as zero.
    pub fn parse(output: &str) -> Self {
        let mut stats = Self::default();

        for line in output.lines() {
            let line = line.trim();
            if let Some(value) = line.strip_prefix("speed_download:") {
                stats.speed_bytes_per_sec = value.trim().parse().unwrap_or(0.0);
            } else if let Some(value) = line.strip_prefix("size:") {
                stats.size_download = value.trim().parse().unwrap_or(0.0);
            }
        }

        stats
    }

    pub fn speed_mbps(&self) -> f64 {
        self.speed_bytes_per_sec / BYTES_PER_MB
    }

    pub fn downloaded_mb(&self) -> f64 {
        self.size_download / BYTES_PER_MB
    }

    /// Whether at least `ratio` of `expected_bytes` arrived
    pub fn is_complete(&self, expected_bytes: u64, ratio: f64) -> bool {
        self.size_download >= expected_bytes as f64 * ratio
    }
}

/// Result of probing a single candidate
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeOutcome {
    pub status: ProbeStatus,
    /// Throughput in MB/s rounded to one decimal, zero unless successful
    pub speed_mbps: f64,
    /// Raw statistics from the last attempt, if the tool produced any
    pub stats: Option<TransferStats>,
    /// Number of transfer tool invocations
    pub attempts: u32,
    /// Failure detail for logs
    pub message: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl ProbeOutcome {
    /// Successful measurement
    pub fn success(stats: TransferStats, attempts: u32) -> Self {
        Self {
            status: ProbeStatus::Success,
            speed_mbps: round_one_decimal(stats.speed_mbps()),
            stats: Some(stats),
            attempts,
            message: None,
            timestamp: Utc::now(),
        }
    }

    /// Transfer ended short of the completeness threshold
    pub fn incomplete(stats: TransferStats, attempts: u32) -> Self {
        Self {
            status: ProbeStatus::Incomplete,
            speed_mbps: 0.0,
            stats: Some(stats),
            attempts,
            message: Some(format!("incomplete download: {:.1}MB", stats.downloaded_mb())),
            timestamp: Utc::now(),
        }
    }

    pub fn failed(message: impl Into<String>, attempts: u32) -> Self {
        Self {
            status: ProbeStatus::Failed,
            speed_mbps: 0.0,
            stats: None,
            attempts,
            message: Some(message.into()),
            timestamp: Utc::now(),
        }
    }

    pub fn timeout(limit_secs: u64, attempts: u32) -> Self {
        Self {
            status: ProbeStatus::Timeout,
            speed_mbps: 0.0,
            stats: None,
            attempts,
            message: Some(format!("transfer tool timed out after {}s", limit_secs)),
            timestamp: Utc::now(),
        }
    }

    /// A candidate is reported only when it measured a positive speed
    pub fn is_reportable(&self) -> bool {
        self.status == ProbeStatus::Success && self.speed_mbps > 0.0
    }
}

/// A reachable candidate with its location and measured throughput
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeedResult {
    pub candidate: Candidate,
    pub location: String,
    pub speed_mbps: f64,
}

impl SpeedResult {
    pub fn new(candidate: Candidate, location: impl Into<String>, speed_mbps: f64) -> Self {
        Self {
            candidate,
            location: location.into(),
            speed_mbps,
        }
    }

    /// Render the report line, e.g. `1.2.3.4:8443#美国 12.3MB/s`
    pub fn format_line(&self, style: ReportStyle) -> String {
        format!(
            "{}#{}{}{:.1}MB/s",
            self.candidate.ip_port(),
            self.location,
            style.separator(),
            self.speed_mbps
        )
    }
}

/// Sort results by speed, fastest first; equal speeds keep their order
pub fn sort_by_speed_desc(results: &mut [SpeedResult]) {
    results.sort_by(|a, b| b.speed_mbps.total_cmp(&a.speed_mbps));
}

pub(crate) fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    fn result(last_octet: u8, speed: f64) -> SpeedResult {
        SpeedResult::new(
            Candidate::new(Ipv4Addr::new(104, 16, 0, last_octet), 8443, ""),
            "美国",
            speed,
        )
    }

    #[test]
    fn test_parse_transfer_stats() {
        let stats = TransferStats::parse("speed_download:2097152.000\nsize:10485760\n");
        assert_eq!(stats.speed_bytes_per_sec, 2_097_152.0);
        assert_eq!(stats.size_download, 10_485_760.0);
        assert_eq!(stats.speed_mbps(), 2.0);
        assert_eq!(stats.downloaded_mb(), 10.0);
    }

    #[test]
    fn test_parse_transfer_stats_tolerates_noise() {
        let stats = TransferStats::parse("  size:512 \nwarning: something\nspeed_download:abc\n");
        assert_eq!(stats.size_download, 512.0);
        assert_eq!(stats.speed_bytes_per_sec, 0.0);

        assert_eq!(TransferStats::parse(""), TransferStats::default());
    }

    #[test]
    fn test_completeness_threshold() {
        let stats = TransferStats { speed_bytes_per_sec: 1.0, size_download: 9_437_184.0 };
        assert!(stats.is_complete(10_485_760, 0.9));

        let short = TransferStats { speed_bytes_per_sec: 1.0, size_download: 9_437_183.0 };
        assert!(!short.is_complete(10_485_760, 0.9));
    }

    #[test]
    fn test_outcome_speed_rounding() {
        let stats = TransferStats { speed_bytes_per_sec: 13_002_342.4, size_download: 10_485_760.0 };
        let outcome = ProbeOutcome::success(stats, 1);
        assert_eq!(outcome.speed_mbps, 12.4);
        assert!(outcome.is_reportable());
    }

    #[test]
    fn test_failed_outcomes_have_zero_speed() {
        let stats = TransferStats { speed_bytes_per_sec: 5_000_000.0, size_download: 100.0 };
        let incomplete = ProbeOutcome::incomplete(stats, 1);
        assert_eq!(incomplete.speed_mbps, 0.0);
        assert!(!incomplete.is_reportable());

        assert_eq!(ProbeOutcome::failed("exit 7", 2).speed_mbps, 0.0);
        assert_eq!(ProbeOutcome::timeout(40, 1).speed_mbps, 0.0);
        assert!(ProbeOutcome::timeout(40, 1).message.unwrap().contains("40s"));
    }

    #[test]
    fn test_tiny_speed_rounds_to_zero_and_is_not_reportable() {
        let stats = TransferStats { speed_bytes_per_sec: 1000.0, size_download: 10_485_760.0 };
        let outcome = ProbeOutcome::success(stats, 1);
        assert_eq!(outcome.speed_mbps, 0.0);
        assert!(!outcome.is_reportable());
    }

    #[test]
    fn test_format_line() {
        let r = result(1, 12.34);
        assert_eq!(r.format_line(ReportStyle::Space), "104.16.0.1:8443#美国 12.3MB/s");
        assert_eq!(r.format_line(ReportStyle::Plus), "104.16.0.1:8443#美国+12.3MB/s");
        assert_eq!(result(2, 5.0).format_line(ReportStyle::Space), "104.16.0.2:8443#美国 5.0MB/s");
    }

    #[test]
    fn test_sort_by_speed_desc_is_stable() {
        let mut results = vec![result(1, 3.0), result(2, 10.5), result(3, 3.0), result(4, 0.4)];
        sort_by_speed_desc(&mut results);

        let order: Vec<u8> = results.iter().map(|r| r.candidate.ip.octets()[3]).collect();
        assert_eq!(order, vec![2, 1, 3, 4]);
    }
}
