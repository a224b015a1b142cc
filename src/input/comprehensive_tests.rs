//! Property-based tests for candidate line parsing

use super::{CandidateParser, ParsedLine};
use proptest::prelude::*;
use std::net::Ipv4Addr;

mod generators {
    use super::*;

    pub fn address() -> impl Strategy<Value = Ipv4Addr> {
        any::<[u8; 4]>().prop_map(Ipv4Addr::from)
    }

    pub fn port() -> impl Strategy<Value = Option<u16>> {
        prop::option::of(1u16..=65535)
    }

    /// Labels never start a new candidate on their own
    pub fn label() -> impl Strategy<Value = String> {
        "[A-Za-z0-9 _|.\u{4e00}-\u{9fa5}-]{0,24}"
    }

    pub fn padding() -> impl Strategy<Value = String> {
        "[ \t]{0,4}"
    }
}

fn parse(line: &str) -> ParsedLine {
    CandidateParser::new(8443).unwrap().parse_line(line, 1)
}

proptest! {
    /// The address survives any port / label / whitespace combination
    #[test]
    fn address_is_independent_of_port_and_label(
        ip in generators::address(),
        port in generators::port(),
        label in generators::label(),
        gap in generators::padding(),
        trailing in generators::padding(),
    ) {
        let port_part = port.map(|p| format!(":{}", p)).unwrap_or_default();
        let line = format!("{}{}{}#{}{}", ip, port_part, gap, label, trailing);

        match parse(&line) {
            ParsedLine::Candidate(candidate) => {
                prop_assert_eq!(candidate.ip, ip);
                prop_assert_eq!(candidate.port, port.unwrap_or(8443));
                prop_assert_eq!(candidate.label, label.trim().to_string());
            }
            other => prop_assert!(false, "line {:?} parsed as {:?}", line, other),
        }
    }

    /// Same address with and without a port yields the same address
    #[test]
    fn port_does_not_change_address(ip in generators::address(), port in 1u16..=65535, label in generators::label()) {
        let with_port = parse(&format!("{}:{} # {}", ip, port, label));
        let without_port = parse(&format!("{} # {}", ip, label));

        match (with_port, without_port) {
            (ParsedLine::Candidate(a), ParsedLine::Candidate(b)) => prop_assert_eq!(a.ip, b.ip),
            other => prop_assert!(false, "unexpected parse {:?}", other),
        }
    }

    /// Arbitrary text never panics the parser
    #[test]
    fn arbitrary_lines_never_panic(line in ".{0,80}") {
        let _ = parse(&line);
    }

    /// Lines without a `#` are never accepted
    #[test]
    fn lines_without_hash_are_rejected(ip in generators::address(), port in generators::port()) {
        let line = match port {
            Some(p) => format!("{}:{}", ip, p),
            None => ip.to_string(),
        };
        prop_assert!(matches!(parse(&line), ParsedLine::Invalid(_)));
    }
}
