//! Data models and structures for the IP speed tester

pub mod candidate;
pub mod config;
pub mod measurement;

// Re-export main model types
pub use candidate::Candidate;
pub use config::Config;
pub use measurement::{TransferStats, ProbeOutcome, SpeedResult};
