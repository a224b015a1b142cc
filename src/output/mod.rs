//! Console output and report persistence
//!
//! Console rendering goes through [`OutputFormatter`], with colored and plain
//! implementations picked by [`OutputFormatterFactory`]. The ranked report
//! file is written by [`ReportWriter`].

mod colored;
mod formatter;
mod report;

pub use colored::{ColorScheme, ColoredFormatter, SpeedLevel};
pub use formatter::{format_duration, FormattingOptions, OutputFormatter, PlainFormatter};
pub use report::{ReportEntry, ReportWriter};

use crate::models::Config;

/// Output formatting factory for creating appropriate formatters
pub struct OutputFormatterFactory;

impl OutputFormatterFactory {
    /// Create a formatter based on color support and preferences
    pub fn create_formatter(enable_color: bool, verbose: bool) -> Box<dyn OutputFormatter> {
        let options = FormattingOptions {
            enable_color,
            verbose_mode: verbose,
            max_table_rows: if verbose { 0 } else { 10 },
            ..Default::default()
        };

        if enable_color {
            Box::new(ColoredFormatter::new(options))
        } else {
            Box::new(PlainFormatter::new(options))
        }
    }

    pub fn from_config(config: &Config) -> Box<dyn OutputFormatter> {
        Self::create_formatter(config.enable_color, config.verbose)
    }

    /// Create a plain text formatter for scripts/logs
    pub fn create_plain_formatter() -> Box<dyn OutputFormatter> {
        Self::create_formatter(false, true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Candidate, SpeedResult};
    use crate::types::ReportStyle;
    use std::net::Ipv4Addr;

    fn sorted_results() -> Vec<SpeedResult> {
        let mut results = vec![
            SpeedResult::new(Candidate::new(Ipv4Addr::new(8, 8, 4, 4), 443, ""), "美国", 2.5),
            SpeedResult::new(Candidate::new(Ipv4Addr::new(1, 0, 0, 1), 2053, ""), "澳大利亚", 17.1),
            SpeedResult::new(Candidate::new(Ipv4Addr::new(9, 9, 9, 9), 8443, ""), "未知", 6.0),
        ];
        crate::models::measurement::sort_by_speed_desc(&mut results);
        results
    }

    #[test]
    fn test_factory_selects_formatter() {
        let plain = OutputFormatterFactory::create_formatter(false, false);
        assert_eq!(plain.format_success("saved").unwrap(), "OK: saved");

        let plain = OutputFormatterFactory::create_plain_formatter();
        assert!(plain.format_warning("careful").unwrap().starts_with("WARNING"));
    }

    #[test]
    fn test_written_report_is_sorted_descending() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("speed_ip.txt");
        let writer = ReportWriter::new(ReportStyle::Space, true);

        tokio_test::block_on(writer.write(&path, &sorted_results())).unwrap();
        let entries = tokio_test::block_on(ReportWriter::read(&path)).unwrap();

        let speeds: Vec<f64> = entries.iter().map(|e| e.speed_mbps).collect();
        assert_eq!(speeds, vec![17.1, 6.0, 2.5]);
        assert_eq!(entries[0].port, 2053);
        assert_eq!(entries[0].location, "澳大利亚");
    }

    #[test]
    fn test_empty_report_is_still_written() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("speed_ip.txt");

        tokio_test::block_on(ReportWriter::default().write(&path, &[])).unwrap();

        assert!(path.exists());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "");
    }

    #[test]
    fn test_write_to_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("speed_ip.txt");

        let err = tokio_test::block_on(ReportWriter::default().write(&path, &[])).unwrap_err();
        assert_eq!(err.category(), "IO");
    }
}
