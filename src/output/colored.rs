//! Colored formatter implementation with terminal color support

use super::formatter::{format_duration, FormattingOptions, OutputFormatter, PlainFormatter};
use crate::{
    error::Result,
    executor::ExecutionSummary,
    input::InvalidLine,
    models::{Candidate, Config, ProbeOutcome, SpeedResult},
    types::ProbeStatus,
};
use colored::*;
use std::fmt::Write as _;

/// Throughput classification for color coding
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SpeedLevel {
    Excellent,  // >= 20 MB/s
    Good,       // 10-20 MB/s
    Fair,       // 3-10 MB/s
    Poor,       // < 3 MB/s
}

impl SpeedLevel {
    pub fn from_mbps(mbps: f64) -> Self {
        if mbps >= 20.0 {
            Self::Excellent
        } else if mbps >= 10.0 {
            Self::Good
        } else if mbps >= 3.0 {
            Self::Fair
        } else {
            Self::Poor
        }
    }

    pub fn color(&self) -> Color {
        match self {
            Self::Excellent => Color::Green,
            Self::Good => Color::Cyan,
            Self::Fair => Color::Yellow,
            Self::Poor => Color::Magenta,
        }
    }
}

/// Color scheme configuration
#[derive(Debug, Clone)]
pub struct ColorScheme {
    pub header: Color,
    pub success: Color,
    pub warning: Color,
    pub error: Color,
    pub info: Color,
    pub muted: Color,
}

impl Default for ColorScheme {
    fn default() -> Self {
        Self {
            header: Color::Blue,
            success: Color::Green,
            warning: Color::Yellow,
            error: Color::Red,
            info: Color::Cyan,
            muted: Color::BrightBlack,
        }
    }
}

/// Colored formatter implementation
pub struct ColoredFormatter {
    plain: PlainFormatter,
    options: FormattingOptions,
    color_scheme: ColorScheme,
}

impl ColoredFormatter {
    pub fn new(options: FormattingOptions) -> Self {
        Self {
            plain: PlainFormatter::new(options.clone()),
            options,
            color_scheme: ColorScheme::default(),
        }
    }

    pub fn with_color_scheme(options: FormattingOptions, color_scheme: ColorScheme) -> Self {
        Self {
            plain: PlainFormatter::new(options.clone()),
            options,
            color_scheme,
        }
    }

    /// Apply color to text if colors are enabled
    fn colorize(&self, text: &str, color: Color) -> ColoredString {
        if self.options.enable_color {
            text.color(color)
        } else {
            text.normal()
        }
    }

    fn bold(&self, text: &str) -> ColoredString {
        if self.options.enable_color {
            text.bold()
        } else {
            text.normal()
        }
    }

    fn dimmed(&self, text: &str) -> ColoredString {
        if self.options.enable_color {
            text.dimmed()
        } else {
            text.normal()
        }
    }

    fn heading(&self, text: &str) -> ColoredString {
        if self.options.enable_color {
            text.bold().color(self.color_scheme.header)
        } else {
            text.normal()
        }
    }

    fn speed(&self, mbps: f64) -> ColoredString {
        self.colorize(&format!("{:.1}MB/s", mbps), SpeedLevel::from_mbps(mbps).color())
    }

    fn status_color(&self, status: ProbeStatus) -> Color {
        match status {
            ProbeStatus::Success => self.color_scheme.success,
            ProbeStatus::Incomplete | ProbeStatus::Timeout => self.color_scheme.warning,
            ProbeStatus::Failed => self.color_scheme.error,
        }
    }
}

impl OutputFormatter for ColoredFormatter {
    fn format_header(&self, title: &str) -> Result<String> {
        let width = title.chars().count().max(20).min(self.options.max_width);
        Ok(format!(
            "{}\n{}",
            self.heading(title),
            self.colorize(&"=".repeat(width), self.color_scheme.muted)
        ))
    }

    fn format_run_plan(&self, config: &Config, candidates: usize, skipped: usize) -> Result<String> {
        let label = |text: &str| self.dimmed(text).to_string();
        let mut output = String::new();
        writeln!(output, "{} {}", label("Input:      "), config.input_file.display())?;
        writeln!(output, "{} {}", label("Output:     "), config.output_file.display())?;
        writeln!(output, "{} {}", label("Test URL:   "), config.test_url()?)?;
        writeln!(output, "{} {}", label("Candidates: "), self.bold(&candidates.to_string()))?;
        if skipped > 0 {
            writeln!(
                output,
                "{} {}",
                label("Skipped:    "),
                self.colorize(&format!("{} invalid line(s)", skipped), self.color_scheme.warning)
            )?;
        }
        let geo = if config.geo_lookup { config.language.code() } else { "off" };
        write!(output, "{} {}", label("Geolocation:"), geo)?;
        Ok(output)
    }

    fn format_invalid_line(&self, line: &InvalidLine) -> Result<String> {
        Ok(format!(
            "{} line {}: {} {}",
            self.colorize("skip", self.color_scheme.warning),
            line.line_number,
            line.content,
            self.dimmed(&format!("({})", line.reason))
        ))
    }

    fn format_candidate_start(&self, index: usize, total: usize, candidate: &Candidate) -> Result<String> {
        let label = if candidate.label.is_empty() {
            String::new()
        } else {
            format!(" {}", self.dimmed(&candidate.label))
        };
        Ok(format!(
            "{} {}{}",
            self.colorize(&format!("[{}/{}]", index, total), self.color_scheme.info),
            self.bold(&candidate.ip_port()),
            label
        ))
    }

    fn format_probe_result(&self, location: &str, outcome: &ProbeOutcome) -> Result<String> {
        let result = if outcome.is_reportable() {
            self.speed(outcome.speed_mbps).to_string()
        } else {
            self.colorize(&self.plain.outcome_text(outcome), self.status_color(outcome.status)).to_string()
        };
        Ok(format!("      {} {} {}", location, self.dimmed("->"), result))
    }

    fn format_execution_summary(&self, summary: &ExecutionSummary) -> Result<String> {
        let rate_color = if summary.success_rate >= 50.0 {
            self.color_scheme.success
        } else if summary.success_rate > 0.0 {
            self.color_scheme.warning
        } else {
            self.color_scheme.error
        };

        let mut output = String::new();
        writeln!(output, "{}", self.heading("Summary"))?;
        writeln!(output, "  Probed:     {}", summary.total_candidates)?;
        writeln!(
            output,
            "  Reachable:  {} {}",
            summary.successful,
            self.colorize(&format!("({:.1}%)", summary.success_rate), rate_color)
        )?;

        let failures = [
            ("Failed:    ", summary.failed, self.color_scheme.error),
            ("Timed out: ", summary.timeouts, self.color_scheme.warning),
            ("Incomplete:", summary.incomplete, self.color_scheme.warning),
            ("Skipped:   ", summary.skipped_lines, self.color_scheme.muted),
        ];
        for (label, count, color) in failures {
            if count > 0 || self.options.verbose_mode {
                writeln!(output, "  {} {}", label, self.colorize(&count.to_string(), color))?;
            }
        }

        if let Some(fastest) = summary.fastest_mbps {
            writeln!(output, "  Fastest:    {}", self.speed(fastest))?;
        }
        write!(output, "  Duration:   {}", format_duration(summary.total_duration))?;
        Ok(output)
    }

    fn format_results_table(&self, results: &[SpeedResult]) -> Result<String> {
        if results.is_empty() {
            return Ok(self.colorize("No reachable candidates", self.color_scheme.warning).to_string());
        }

        let rows = self.plain.visible_rows(results);
        let addr_width = rows.iter().map(|r| r.candidate.ip_port().len()).max().unwrap_or(0).max(7);

        let mut output = String::new();
        let header = format!("{:>4}  {:<addr_width$}  {:>10}  Location", "Rank", "Address", "Speed");
        writeln!(output, "{}", self.bold(&header))?;
        for (rank, result) in rows.iter().enumerate() {
            // Pad before coloring so escape codes do not skew the columns
            let speed = format!("{:>10}", format!("{:.1}MB/s", result.speed_mbps));
            writeln!(
                output,
                "{:>4}  {:<addr_width$}  {}  {}",
                rank + 1,
                result.candidate.ip_port(),
                self.colorize(&speed, SpeedLevel::from_mbps(result.speed_mbps).color()),
                result.location
            )?;
        }
        if rows.len() < results.len() {
            writeln!(output, "      {}", self.dimmed(&format!("... {} more in the report", results.len() - rows.len())))?;
        }

        Ok(output.trim_end().to_string())
    }

    fn format_error(&self, error: &str) -> Result<String> {
        Ok(format!("{} {}", self.colorize("✗", self.color_scheme.error), error))
    }

    fn format_warning(&self, warning: &str) -> Result<String> {
        Ok(format!("{} {}", self.colorize("!", self.color_scheme.warning), warning))
    }

    fn format_success(&self, message: &str) -> Result<String> {
        Ok(format!("{} {}", self.colorize("✓", self.color_scheme.success), message))
    }
}
