//! Rule grammar, parsing, and validation.
//!
//! Accepts exactly three iptables-style shapes:
//!
//! ```text
//! -A FORWARD -s <ip-or-cidr> -j DROP
//! -A FORWARD -d <ip-or-cidr> -p <proto> -j DROP
//! -A FORWARD -d <ip-or-cidr> -p <proto> --dport <port> -j DROP
//! ```

use nirs_core::{Error, Result};
use serde::{Deserialize, Serialize};

const VALID_OPTIONS: &[&str] = &["-A"];
const VALID_TABLES: &[&str] = &["FORWARD"];
const VALID_PROTOCOLS: &[&str] = &["tcp", "udp", "icmp", "hopopt"];
const VALID_PROTOCOLS_WITH_PORTS: &[&str] = &["tcp", "udp"];
const VALID_JUMPS: &[&str] = &["DROP"];

const ANY: &str = "any";

/// A validated iptables-style rule. Every field is either `"any"` or a
/// concrete value; the `raw` form is kept for duplicate-detection and
/// round-tripping.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Rule {
    pub option: String,
    pub table: String,
    pub src_ip: String,
    pub dst_ip: String,
    pub protocol: String,
    pub src_port: String,
    pub dst_port: String,
    pub jump: String,
    pub raw: String,
}

impl Rule {
    /// Parse and validate a rule string, in one pass (as the reference
    /// parser does: a malformed dict never escapes this function).
    pub fn parse(raw: &str) -> Result<Rule> {
        let mut option: Option<String> = None;
        let mut table: Option<String> = None;
        let mut src_ip = ANY.to_string();
        let mut dst_ip = ANY.to_string();
        let mut protocol = ANY.to_string();
        let mut src_port = ANY.to_string();
        let mut dst_port = ANY.to_string();
        let mut jump: Option<String> = None;

        let mut tokens: std::collections::VecDeque<&str> = raw.split_whitespace().collect();

        while let Some(token) = tokens.pop_front() {
            if VALID_OPTIONS.contains(&token) {
                option = Some(token.to_string());
                let t = tokens
                    .pop_front()
                    .ok_or_else(|| Error::InvalidRule(format!("missing table after {token}")))?;
                table = Some(t.to_string());
                continue;
            }
            match token {
                "-s" => {
                    let v = tokens
                        .pop_front()
                        .ok_or_else(|| Error::InvalidRule("missing argument for -s".into()))?;
                    src_ip = v.strip_suffix("/32").unwrap_or(v).to_string();
                }
                "-d" => {
                    let v = tokens
                        .pop_front()
                        .ok_or_else(|| Error::InvalidRule("missing argument for -d".into()))?;
                    dst_ip = v.strip_suffix("/32").unwrap_or(v).to_string();
                }
                "-p" => {
                    let v = tokens
                        .pop_front()
                        .ok_or_else(|| Error::InvalidRule("missing argument for -p".into()))?;
                    protocol = v.to_string();
                }
                "--dport" => {
                    let v = tokens.pop_front().ok_or_else(|| {
                        Error::InvalidRule("missing argument for --dport".into())
                    })?;
                    dst_port = v.to_string();
                }
                "-j" => {
                    let v = tokens
                        .pop_front()
                        .ok_or_else(|| Error::InvalidRule("missing argument for -j".into()))?;
                    jump = Some(v.to_string());
                }
                _ => {}
            }
        }

        let rule = Rule {
            option: option.unwrap_or_default(),
            table: table.unwrap_or_default(),
            src_ip,
            dst_ip,
            protocol,
            src_port,
            dst_port,
            jump: jump.unwrap_or_default(),
            raw: raw.to_string(),
        };

        rule.validate()?;
        Ok(rule)
    }

    fn validate(&self) -> Result<()> {
        if !VALID_OPTIONS.contains(&self.option.as_str()) {
            return Err(Error::InvalidRule("invalid or missing option".into()));
        }
        if !VALID_TABLES.contains(&self.table.as_str()) {
            return Err(Error::InvalidRule("invalid or missing table".into()));
        }
        if self.src_ip != ANY && !is_valid_ip_or_network(&self.src_ip) {
            return Err(Error::InvalidRule(format!(
                "source IP '{}' is not valid",
                self.src_ip
            )));
        }
        if self.dst_ip != ANY && !is_valid_ip_or_network(&self.dst_ip) {
            return Err(Error::InvalidRule(format!(
                "destination IP '{}' is not valid",
                self.dst_ip
            )));
        }
        if self.protocol != ANY && !VALID_PROTOCOLS.contains(&self.protocol.as_str()) {
            return Err(Error::InvalidRule(format!(
                "protocol '{}' is not valid",
                self.protocol
            )));
        }
        if self.src_port != ANY {
            if !VALID_PROTOCOLS_WITH_PORTS.contains(&self.protocol.as_str()) {
                return Err(Error::InvalidRule(
                    "source port cannot be specified without a port-bearing protocol".into(),
                ));
            }
            if self.src_port.parse::<u32>().is_err() {
                return Err(Error::InvalidRule(format!(
                    "source port '{}' is not valid",
                    self.src_port
                )));
            }
        }
        if self.dst_port != ANY {
            if !VALID_PROTOCOLS_WITH_PORTS.contains(&self.protocol.as_str()) {
                return Err(Error::InvalidRule(
                    "destination port cannot be specified without a port-bearing protocol".into(),
                ));
            }
            if self.dst_port.parse::<u32>().is_err() {
                return Err(Error::InvalidRule(format!(
                    "destination port '{}' is not valid",
                    self.dst_port
                )));
            }
        }
        if !VALID_JUMPS.contains(&self.jump.as_str()) {
            return Err(Error::InvalidRule("invalid or missing jump".into()));
        }
        Ok(())
    }

    /// Build the canonical `-s <ip> -j DROP` form for a heuristic-style
    /// block-by-source rule.
    pub fn block_source(ip: &str) -> Rule {
        let raw = format!("-A FORWARD -s {ip} -j DROP");
        Rule::parse(&raw).expect("synthesized source-block rule is always well formed")
    }

    /// The textual form is the duplicate-detection key.
    pub fn canonical_text(&self) -> &str {
        &self.raw
    }
}

fn is_valid_ip_or_network(value: &str) -> bool {
    if value.contains('/') {
        value.parse::<ipnetwork::IpNetwork>().is_ok()
    } else {
        value.parse::<std::net::IpAddr>().is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_host_drop_rule() {
        let rule = Rule::parse("-A FORWARD -d 192.168.0.1/32 -p tcp -j DROP").unwrap();
        assert_eq!(rule.src_ip, "any");
        assert_eq!(rule.dst_ip, "192.168.0.1");
        assert_eq!(rule.protocol, "tcp");
        assert_eq!(rule.src_port, "any");
        assert_eq!(rule.dst_port, "any");
        assert_eq!(rule.jump, "DROP");
    }

    #[test]
    fn round_trips_through_parse() {
        let raw = "-A FORWARD -s 10.0.0.0/24 -j DROP";
        let rule = Rule::parse(raw).unwrap();
        let reparsed = Rule::parse(rule.canonical_text()).unwrap();
        assert_eq!(rule, reparsed);
    }

    #[test]
    fn rejects_wrong_table() {
        assert!(Rule::parse("-A INPUT -s 10.0.0.1 -j DROP").is_err());
    }

    #[test]
    fn rejects_port_without_protocol() {
        assert!(Rule::parse("-A FORWARD -d 10.0.0.1 --dport 80 -j DROP").is_err());
    }

    #[test]
    fn rejects_unknown_jump() {
        assert!(Rule::parse("-A FORWARD -s 10.0.0.1 -j ACCEPT").is_err());
    }
}
