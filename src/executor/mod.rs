//! Sequential speed test runner
//!
//! Candidates are processed one at a time in input order: location lookup,
//! throughput probe, then a pause before the next candidate. Per-candidate
//! failures are absorbed here; only reachable candidates end up in
//! [`ExecutionResults::results`].

use crate::{
    error::Result,
    geo::GeoLocator,
    input::CandidateList,
    logging::{Logger, LoggerFactory},
    models::{measurement::sort_by_speed_desc, Candidate, Config, ProbeOutcome, SpeedResult},
    output::OutputFormatter,
    probe::{CurlTool, TransferTool},
    types::ProbeStatus,
};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// A candidate that produced no usable measurement
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailedProbe {
    pub candidate: Candidate,
    pub location: String,
    pub outcome: ProbeOutcome,
}

/// Summary of one batch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionSummary {
    pub total_duration: Duration,
    /// Candidates probed
    pub total_candidates: usize,
    pub successful: usize,
    /// Non-zero exits and spawn failures
    pub failed: usize,
    pub timeouts: usize,
    pub incomplete: usize,
    /// Input lines that could not be parsed
    pub skipped_lines: usize,
    /// Percentage of probed candidates that produced a result
    pub success_rate: f64,
    pub fastest_mbps: Option<f64>,
}

/// Everything a batch produced
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExecutionResults {
    /// Reachable candidates, fastest first
    pub results: Vec<SpeedResult>,
    pub failed: Vec<FailedProbe>,
    pub skipped_lines: usize,
    pub total_candidates: usize,
    pub total_duration: Duration,
}

impl ExecutionResults {
    pub fn summary(&self) -> ExecutionSummary {
        let count = |status: ProbeStatus| {
            self.failed.iter().filter(|f| f.outcome.status == status).count()
        };

        let success_rate = if self.total_candidates > 0 {
            self.results.len() as f64 / self.total_candidates as f64 * 100.0
        } else {
            0.0
        };

        ExecutionSummary {
            total_duration: self.total_duration,
            total_candidates: self.total_candidates,
            successful: self.results.len(),
            failed: count(ProbeStatus::Failed),
            timeouts: count(ProbeStatus::Timeout),
            // Success with a zero rate counts with the short transfers
            incomplete: count(ProbeStatus::Incomplete) + count(ProbeStatus::Success),
            skipped_lines: self.skipped_lines,
            success_rate,
            fastest_mbps: self.fastest().map(|r| r.speed_mbps),
        }
    }

    pub fn fastest(&self) -> Option<&SpeedResult> {
        self.results.first()
    }

    pub fn has_failures(&self) -> bool {
        !self.failed.is_empty()
    }
}

/// Drives location lookup and probing over a candidate list
pub struct SpeedTestRunner {
    geo: GeoLocator,
    tool: Box<dyn TransferTool>,
    delay: Duration,
    formatter: Option<Box<dyn OutputFormatter>>,
    logger: Logger,
}

impl SpeedTestRunner {
    pub fn new(geo: GeoLocator, tool: Box<dyn TransferTool>, delay: Duration, logger: Logger) -> Self {
        Self {
            geo,
            tool,
            delay,
            formatter: None,
            logger,
        }
    }

    /// Build the production runner (HTTP geolocation, curl probes)
    pub async fn from_config(config: &Config, loggers: &LoggerFactory) -> Result<Self> {
        let geo = if config.geo_lookup {
            GeoLocator::new(config, loggers.create_probe_logger().await)?
        } else {
            GeoLocator::disabled(config.language, loggers.create_probe_logger().await)
        };
        let tool = CurlTool::new(config, loggers.create_probe_logger().await)?;

        Ok(Self::new(
            geo,
            Box::new(tool),
            config.probe_delay(),
            loggers.create_logger("RUNNER").await,
        ))
    }

    /// Print per-candidate progress through `formatter`
    pub fn with_formatter(mut self, formatter: Box<dyn OutputFormatter>) -> Self {
        self.formatter = Some(formatter);
        self
    }

    /// Probe every candidate in `list` and collect the results, fastest first
    pub async fn run(&self, list: &CandidateList) -> Result<ExecutionResults> {
        let started = Instant::now();
        let total = list.candidates.len();
        let mut results = Vec::with_capacity(total);
        let mut failed = Vec::new();

        self.logger.info(&format!("Starting batch of {} candidates", total))
            .field("candidates", total)
            .field("skipped_lines", list.invalid.len())
            .field("geo_enabled", self.geo.is_enabled())
            .log()
            .await;

        for (index, candidate) in list.candidates.iter().enumerate() {
            if let Some(formatter) = &self.formatter {
                println!("{}", formatter.format_candidate_start(index + 1, total, candidate)?);
            }

            let location = self.geo.locate(candidate.ip).await;
            let outcome = self.tool.measure(candidate).await;

            if let Some(formatter) = &self.formatter {
                println!("{}", formatter.format_probe_result(&location, &outcome)?);
            }

            if outcome.is_reportable() {
                results.push(SpeedResult::new(candidate.clone(), location, outcome.speed_mbps));
            } else {
                failed.push(FailedProbe {
                    candidate: candidate.clone(),
                    location,
                    outcome,
                });
            }

            if index + 1 < total && !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
        }

        sort_by_speed_desc(&mut results);

        let execution = ExecutionResults {
            results,
            failed,
            skipped_lines: list.invalid.len(),
            total_candidates: total,
            total_duration: started.elapsed(),
        };

        self.logger.info(&format!("Batch finished: {} of {} candidates reachable",
                execution.results.len(), total))
            .field("reachable", execution.results.len())
            .field("failed", execution.failed.len())
            .field("duration_ms", execution.total_duration.as_millis() as u64)
            .log()
            .await;

        Ok(execution)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::CandidateParser;
    use crate::logging::ProbeLogger;
    use crate::models::TransferStats;
    use crate::types::Language;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::net::Ipv4Addr;
    use std::sync::Mutex;

    /// Replays canned outcomes keyed by address and records probe order
    struct FakeTool {
        outcomes: HashMap<Ipv4Addr, ProbeOutcome>,
        calls: Mutex<Vec<Ipv4Addr>>,
    }

    impl FakeTool {
        fn new(outcomes: Vec<(Ipv4Addr, ProbeOutcome)>) -> Self {
            Self {
                outcomes: outcomes.into_iter().collect(),
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl TransferTool for FakeTool {
        async fn measure(&self, candidate: &Candidate) -> ProbeOutcome {
            self.calls.lock().unwrap().push(candidate.ip);
            self.outcomes
                .get(&candidate.ip)
                .cloned()
                .unwrap_or_else(|| ProbeOutcome::failed("no canned outcome", 1))
        }
    }

    fn success(mbps: f64) -> ProbeOutcome {
        ProbeOutcome::success(
            TransferStats {
                speed_bytes_per_sec: mbps * 1_048_576.0,
                size_download: 10_485_760.0,
            },
            1,
        )
    }

    fn runner(tool: FakeTool, delay: Duration) -> SpeedTestRunner {
        let config = Config::default();
        SpeedTestRunner::new(
            GeoLocator::disabled(Language::Chinese, ProbeLogger::new(&config)),
            Box::new(tool),
            delay,
            Logger::with_config("RUNNER".to_string(), &config),
        )
    }

    fn list(content: &str) -> CandidateList {
        CandidateParser::new(8443).unwrap().parse_str(content)
    }

    #[tokio::test]
    async fn test_results_sorted_and_failures_excluded() {
        let input = "1.0.0.1:443 # a\n1.0.0.2 # b\nbroken line\n1.0.0.3:2053 # c\n1.0.0.4 # d\n";
        let tool = FakeTool::new(vec![
            (Ipv4Addr::new(1, 0, 0, 1), success(3.2)),
            (Ipv4Addr::new(1, 0, 0, 2), ProbeOutcome::timeout(40, 1)),
            (Ipv4Addr::new(1, 0, 0, 3), success(11.5)),
            (
                Ipv4Addr::new(1, 0, 0, 4),
                ProbeOutcome::incomplete(TransferStats { speed_bytes_per_sec: 9e6, size_download: 1e6 }, 1),
            ),
        ]);

        let execution = runner(tool, Duration::ZERO).run(&list(input)).await.unwrap();

        let lines: Vec<String> = execution.results.iter()
            .map(|r| r.format_line(Default::default()))
            .collect();
        assert_eq!(lines, vec!["1.0.0.3:2053#未知 11.5MB/s", "1.0.0.1:443#未知 3.2MB/s"]);

        let summary = execution.summary();
        assert_eq!(summary.total_candidates, 4);
        assert_eq!(summary.successful, 2);
        assert_eq!(summary.timeouts, 1);
        assert_eq!(summary.incomplete, 1);
        assert_eq!(summary.skipped_lines, 1);
        assert_eq!(summary.success_rate, 50.0);
        assert_eq!(summary.fastest_mbps, Some(11.5));
        assert!(execution.has_failures());
    }

    #[tokio::test]
    async fn test_candidates_probed_in_input_order() {
        let input = "9.9.9.9 # x\n1.1.1.1 # y\n8.8.8.8 # z\n";
        let tool = std::sync::Arc::new(FakeTool::new(vec![]));

        struct Shared(std::sync::Arc<FakeTool>);

        #[async_trait]
        impl TransferTool for Shared {
            async fn measure(&self, candidate: &Candidate) -> ProbeOutcome {
                self.0.measure(candidate).await
            }
        }

        let execution = runner_with(Box::new(Shared(tool.clone()))).run(&list(input)).await.unwrap();

        assert!(execution.results.is_empty());
        assert_eq!(execution.failed.len(), 3);
        assert_eq!(
            *tool.calls.lock().unwrap(),
            vec![Ipv4Addr::new(9, 9, 9, 9), Ipv4Addr::new(1, 1, 1, 1), Ipv4Addr::new(8, 8, 8, 8)]
        );
    }

    fn runner_with(tool: Box<dyn TransferTool>) -> SpeedTestRunner {
        let config = Config::default();
        SpeedTestRunner::new(
            GeoLocator::disabled(Language::English, ProbeLogger::new(&config)),
            tool,
            Duration::ZERO,
            Logger::with_config("RUNNER".to_string(), &config),
        )
    }

    #[tokio::test]
    async fn test_equal_speeds_keep_input_order() {
        let input = "2.0.0.1 # a\n2.0.0.2 # b\n2.0.0.3 # c\n";
        let tool = FakeTool::new(vec![
            (Ipv4Addr::new(2, 0, 0, 1), success(4.0)),
            (Ipv4Addr::new(2, 0, 0, 2), success(7.0)),
            (Ipv4Addr::new(2, 0, 0, 3), success(4.0)),
        ]);

        let execution = runner(tool, Duration::ZERO).run(&list(input)).await.unwrap();
        let order: Vec<Ipv4Addr> = execution.results.iter().map(|r| r.candidate.ip).collect();

        assert_eq!(order, vec![
            Ipv4Addr::new(2, 0, 0, 2),
            Ipv4Addr::new(2, 0, 0, 1),
            Ipv4Addr::new(2, 0, 0, 3),
        ]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_delay_between_candidates_only() {
        let input = "3.0.0.1 # a\n3.0.0.2 # b\n3.0.0.3 # c\n";
        let tool = FakeTool::new(vec![]);

        let started = tokio::time::Instant::now();
        runner(tool, Duration::from_secs(1)).run(&list(input)).await.unwrap();

        // Two pauses for three candidates
        assert_eq!(started.elapsed().as_secs(), 2);
    }

    #[tokio::test]
    async fn test_empty_candidate_list() {
        let execution = runner(FakeTool::new(vec![]), Duration::from_secs(5))
            .run(&list("garbage\n"))
            .await
            .unwrap();

        assert_eq!(execution.total_candidates, 0);
        assert_eq!(execution.skipped_lines, 1);
        assert!(execution.fastest().is_none());
        assert_eq!(execution.summary().success_rate, 0.0);
    }
}
