//! Core formatting trait and the plain text implementation

use crate::{
    error::Result,
    executor::ExecutionSummary,
    input::InvalidLine,
    models::{Candidate, Config, ProbeOutcome, SpeedResult},
    types::ProbeStatus,
};
use std::fmt::Write as _;
use std::time::Duration;

/// Console rendering of a batch
pub trait OutputFormatter {
    /// Format a header section
    fn format_header(&self, title: &str) -> Result<String>;

    /// Settings and candidate counts shown before probing starts
    fn format_run_plan(&self, config: &Config, candidates: usize, skipped: usize) -> Result<String>;

    /// An input line that was skipped
    fn format_invalid_line(&self, line: &InvalidLine) -> Result<String>;

    /// Progress line printed before a candidate is probed
    fn format_candidate_start(&self, index: usize, total: usize, candidate: &Candidate) -> Result<String>;

    /// Location and outcome of one probe
    fn format_probe_result(&self, location: &str, outcome: &ProbeOutcome) -> Result<String>;

    fn format_execution_summary(&self, summary: &ExecutionSummary) -> Result<String>;

    /// Ranked results, fastest first
    fn format_results_table(&self, results: &[SpeedResult]) -> Result<String>;

    fn format_error(&self, error: &str) -> Result<String>;

    fn format_warning(&self, warning: &str) -> Result<String>;

    fn format_success(&self, message: &str) -> Result<String>;
}

/// Configuration options for formatting
#[derive(Debug, Clone)]
pub struct FormattingOptions {
    pub enable_color: bool,
    /// Show attempt counts and failure details
    pub verbose_mode: bool,
    /// Rows shown by [`OutputFormatter::format_results_table`]; 0 shows all
    pub max_table_rows: usize,
    pub max_width: usize,
}

impl Default for FormattingOptions {
    fn default() -> Self {
        Self {
            enable_color: true,
            verbose_mode: false,
            max_table_rows: 10,
            max_width: 100,
        }
    }
}

/// Human-readable duration, e.g. `850ms`, `12.3s`, `2m5.0s`
pub fn format_duration(duration: Duration) -> String {
    let ms = duration.as_secs_f64() * 1000.0;
    if ms < 1000.0 {
        format!("{:.0}ms", ms)
    } else if ms < 60_000.0 {
        format!("{:.1}s", ms / 1000.0)
    } else {
        let minutes = (ms / 60_000.0) as u64;
        format!("{}m{:.1}s", minutes, (ms % 60_000.0) / 1000.0)
    }
}

/// Plain text formatter implementation
pub struct PlainFormatter {
    options: FormattingOptions,
}

impl PlainFormatter {
    pub fn new(options: FormattingOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &FormattingOptions {
        &self.options
    }

    pub(super) fn outcome_text(&self, outcome: &ProbeOutcome) -> String {
        let mut text = match outcome.status {
            ProbeStatus::Success => format!("{:.1}MB/s", outcome.speed_mbps),
            ProbeStatus::Incomplete => "incomplete".to_string(),
            ProbeStatus::Failed => "failed".to_string(),
            ProbeStatus::Timeout => "timeout".to_string(),
        };

        if self.options.verbose_mode {
            if let Some(message) = &outcome.message {
                let _ = write!(text, " ({})", message);
            }
            if outcome.attempts > 1 {
                let _ = write!(text, " [{} attempts]", outcome.attempts);
            }
        }

        text
    }

    pub(super) fn visible_rows<'a>(&self, results: &'a [SpeedResult]) -> &'a [SpeedResult] {
        match self.options.max_table_rows {
            0 => results,
            limit => &results[..results.len().min(limit)],
        }
    }
}

impl OutputFormatter for PlainFormatter {
    fn format_header(&self, title: &str) -> Result<String> {
        let width = title.chars().count().max(20).min(self.options.max_width);
        Ok(format!("{}\n{}", title, "=".repeat(width)))
    }

    fn format_run_plan(&self, config: &Config, candidates: usize, skipped: usize) -> Result<String> {
        let mut output = String::new();
        writeln!(output, "Input:       {}", config.input_file.display())?;
        writeln!(output, "Output:      {}", config.output_file.display())?;
        writeln!(output, "Test URL:    {}", config.test_url()?)?;
        writeln!(output, "Candidates:  {}", candidates)?;
        if skipped > 0 {
            writeln!(output, "Skipped:     {} invalid line(s)", skipped)?;
        }
        write!(output, "Geolocation: {}", if config.geo_lookup { config.language.code() } else { "off" })?;
        Ok(output)
    }

    fn format_invalid_line(&self, line: &InvalidLine) -> Result<String> {
        Ok(format!("WARNING: skipping line {}: {} ({})", line.line_number, line.content, line.reason))
    }

    fn format_candidate_start(&self, index: usize, total: usize, candidate: &Candidate) -> Result<String> {
        Ok(format!("[{}/{}] {}", index, total, candidate))
    }

    fn format_probe_result(&self, location: &str, outcome: &ProbeOutcome) -> Result<String> {
        Ok(format!("      {} -> {}", location, self.outcome_text(outcome)))
    }

    fn format_execution_summary(&self, summary: &ExecutionSummary) -> Result<String> {
        let mut output = String::new();
        writeln!(output, "Summary")?;
        writeln!(output, "-------")?;
        writeln!(output, "Probed:      {}", summary.total_candidates)?;
        writeln!(output, "Reachable:   {} ({:.1}%)", summary.successful, summary.success_rate)?;
        writeln!(output, "Failed:      {}", summary.failed)?;
        writeln!(output, "Timed out:   {}", summary.timeouts)?;
        writeln!(output, "Incomplete:  {}", summary.incomplete)?;
        if summary.skipped_lines > 0 {
            writeln!(output, "Skipped:     {}", summary.skipped_lines)?;
        }
        if let Some(fastest) = summary.fastest_mbps {
            writeln!(output, "Fastest:     {:.1}MB/s", fastest)?;
        }
        write!(output, "Duration:    {}", format_duration(summary.total_duration))?;
        Ok(output)
    }

    fn format_results_table(&self, results: &[SpeedResult]) -> Result<String> {
        if results.is_empty() {
            return Ok("No reachable candidates".to_string());
        }

        let rows = self.visible_rows(results);
        let addr_width = rows.iter().map(|r| r.candidate.ip_port().len()).max().unwrap_or(0).max(7);

        let mut output = String::new();
        writeln!(output, "{:>4}  {:<addr_width$}  {:>10}  Location", "Rank", "Address", "Speed")?;
        for (rank, result) in rows.iter().enumerate() {
            writeln!(
                output,
                "{:>4}  {:<addr_width$}  {:>10}  {}",
                rank + 1,
                result.candidate.ip_port(),
                format!("{:.1}MB/s", result.speed_mbps),
                result.location
            )?;
        }
        if rows.len() < results.len() {
            writeln!(output, "      ... {} more in the report", results.len() - rows.len())?;
        }

        Ok(output.trim_end().to_string())
    }

    fn format_error(&self, error: &str) -> Result<String> {
        Ok(format!("ERROR: {}", error))
    }

    fn format_warning(&self, warning: &str) -> Result<String> {
        Ok(format!("WARNING: {}", warning))
    }

    fn format_success(&self, message: &str) -> Result<String> {
        Ok(format!("OK: {}", message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TransferStats;
    use std::net::Ipv4Addr;

    fn formatter(verbose: bool) -> PlainFormatter {
        PlainFormatter::new(FormattingOptions {
            enable_color: false,
            verbose_mode: verbose,
            max_table_rows: 2,
            ..Default::default()
        })
    }

    fn result(last_octet: u8, speed: f64) -> SpeedResult {
        SpeedResult::new(Candidate::new(Ipv4Addr::new(1, 1, 1, last_octet), 443, ""), "美国", speed)
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_millis(850)), "850ms");
        assert_eq!(format_duration(Duration::from_millis(12_340)), "12.3s");
        assert_eq!(format_duration(Duration::from_secs(125)), "2m5.0s");
    }

    #[test]
    fn test_probe_result_text() {
        let success = ProbeOutcome::success(
            TransferStats { speed_bytes_per_sec: 2_097_152.0, size_download: 10_485_760.0 },
            1,
        );
        assert_eq!(formatter(false).format_probe_result("日本", &success).unwrap().trim(), "日本 -> 2.0MB/s");

        let timeout = ProbeOutcome::timeout(40, 1);
        assert!(formatter(false).format_probe_result("x", &timeout).unwrap().ends_with("timeout"));
        assert!(formatter(true).format_probe_result("x", &timeout).unwrap().contains("40s"));

        let failed = ProbeOutcome::failed("exit 7", 2);
        assert!(formatter(true).format_probe_result("x", &failed).unwrap().contains("[2 attempts]"));
    }

    #[test]
    fn test_results_table_truncates() {
        let results = vec![result(1, 9.0), result(2, 5.5), result(3, 1.0)];
        let table = formatter(false).format_results_table(&results).unwrap();

        assert!(table.contains("1.1.1.1:443"));
        assert!(table.contains("5.5MB/s"));
        assert!(!table.contains("1.1.1.3:443"));
        assert!(table.contains("1 more"));
    }

    #[test]
    fn test_empty_results_table() {
        assert_eq!(formatter(false).format_results_table(&[]).unwrap(), "No reachable candidates");
    }

    #[test]
    fn test_run_plan_mentions_counts() {
        let plan = formatter(false).format_run_plan(&Config::default(), 4, 1).unwrap();
        assert!(plan.contains("Candidates:  4"));
        assert!(plan.contains("1 invalid line"));
        assert!(plan.contains("bytes=10485760"));
    }
}
