//! Candidate endpoint model

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::Ipv4Addr;

/// A network address listed in the input file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    /// IPv4 address the transfer is forced through
    pub ip: Ipv4Addr,
    /// Port carried into the report label
    pub port: u16,
    /// Whether the port came from the input line rather than the default
    pub port_explicit: bool,
    /// Free text after `#`, trimmed
    pub label: String,
    /// 1-based line number in the source file
    pub line_number: usize,
}

impl Candidate {
    pub fn new(ip: Ipv4Addr, port: u16, label: impl Into<String>) -> Self {
        Self {
            ip,
            port,
            port_explicit: true,
            label: label.into(),
            line_number: 0,
        }
    }

    /// `ip:port` as written to the report
    pub fn ip_port(&self) -> String {
        format!("{}:{}", self.ip, self.port)
    }
}

impl fmt::Display for Candidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.label.is_empty() {
            write!(f, "{}", self.ip_port())
        } else {
            write!(f, "{} ({})", self.ip_port(), self.label)
        }
    }
}
