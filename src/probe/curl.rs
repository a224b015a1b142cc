//! curl-backed transfer tool

use super::{evaluate, TransferTool};
use crate::{
    defaults::RETRY_DELAY,
    error::Result,
    logging::ProbeLogger,
    models::{Candidate, Config, ProbeOutcome, TransferStats},
};
use async_trait::async_trait;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

/// `-w` template; parsed by [`TransferStats::parse`]
pub const WRITE_OUT_FORMAT: &str = "speed_download:%{speed_download}\nsize:%{size_download}\n";

#[cfg(windows)]
pub const NULL_DEVICE: &str = "NUL";
#[cfg(not(windows))]
pub const NULL_DEVICE: &str = "/dev/null";

/// How a single invocation ended
enum Invocation {
    Finished(TransferStats),
    NonZeroExit,
    SpawnFailed(String),
    TimedOut,
}

/// Runs `curl` with the test host pinned to the candidate address
pub struct CurlTool {
    program: String,
    url: String,
    host: String,
    port: u16,
    expected_bytes: u64,
    max_time_seconds: u64,
    connect_timeout_seconds: u64,
    process_timeout: Duration,
    retries: u32,
    retry_delay: Duration,
    logger: ProbeLogger,
}

impl CurlTool {
    pub fn new(config: &Config, logger: ProbeLogger) -> Result<Self> {
        let url = config.test_url()?;
        let (host, port) = config.resolve_target()?;

        Ok(Self {
            program: config.curl_path.clone(),
            url: url.to_string(),
            host,
            port,
            expected_bytes: config.download_bytes,
            max_time_seconds: config.max_time_seconds,
            connect_timeout_seconds: config.connect_timeout_seconds,
            process_timeout: config.process_timeout(),
            retries: config.probe_retries,
            retry_delay: RETRY_DELAY,
            logger,
        })
    }

    /// Override the pause before a retry
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// Override the hard wall-clock limit on one invocation
    pub fn with_process_timeout(mut self, timeout: Duration) -> Self {
        self.process_timeout = timeout;
        self
    }

    /// Arguments passed to the tool for `candidate`
    pub fn build_args(&self, candidate: &Candidate) -> Vec<String> {
        vec![
            "-s".to_string(),
            "--resolve".to_string(),
            format!("{}:{}:{}", self.host, self.port, candidate.ip),
            self.url.clone(),
            "-o".to_string(),
            NULL_DEVICE.to_string(),
            "-w".to_string(),
            WRITE_OUT_FORMAT.to_string(),
            "--max-time".to_string(),
            self.max_time_seconds.to_string(),
            "--connect-timeout".to_string(),
            self.connect_timeout_seconds.to_string(),
            "--retry".to_string(),
            "1".to_string(),
            "--insecure".to_string(),
        ]
    }

    fn command_line(&self, args: &[String]) -> String {
        let mut line = self.program.clone();
        for arg in args {
            line.push(' ');
            if arg.contains(char::is_whitespace) {
                line.push_str(&format!("{:?}", arg));
            } else {
                line.push_str(arg);
            }
        }
        line
    }

    async fn invoke(&self, candidate: &Candidate, attempt: u32) -> Invocation {
        let args = self.build_args(candidate);
        self.logger.log_invocation(candidate, attempt, &self.command_line(&args)).await;

        let child = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn();

        let child = match child {
            Ok(child) => child,
            Err(e) => return Invocation::SpawnFailed(format!("failed to start {}: {}", self.program, e)),
        };

        match tokio::time::timeout(self.process_timeout, child.wait_with_output()).await {
            Err(_) => Invocation::TimedOut,
            Ok(Err(e)) => Invocation::SpawnFailed(format!("failed to wait for {}: {}", self.program, e)),
            Ok(Ok(output)) if output.status.success() => {
                Invocation::Finished(TransferStats::parse(&String::from_utf8_lossy(&output.stdout)))
            }
            Ok(Ok(output)) => {
                let stderr = String::from_utf8_lossy(&output.stderr);
                self.logger.log_tool_exit(candidate, attempt, output.status.code(), &stderr).await;
                Invocation::NonZeroExit
            }
        }
    }
}

#[async_trait]
impl TransferTool for CurlTool {
    async fn measure(&self, candidate: &Candidate) -> ProbeOutcome {
        let max_attempts = self.retries + 1;
        let mut attempt = 1;

        let outcome = loop {
            match self.invoke(candidate, attempt).await {
                Invocation::Finished(stats) => break evaluate(stats, self.expected_bytes, attempt),
                Invocation::SpawnFailed(message) => break ProbeOutcome::failed(message, attempt),
                Invocation::TimedOut => break ProbeOutcome::timeout(self.process_timeout.as_secs(), attempt),
                Invocation::NonZeroExit if attempt < max_attempts => {
                    tokio::time::sleep(self.retry_delay).await;
                    attempt += 1;
                }
                Invocation::NonZeroExit => {
                    break ProbeOutcome::failed("transfer tool exited with an error", attempt);
                }
            }
        };

        self.logger.log_outcome(candidate, &outcome).await;
        outcome
    }
}
