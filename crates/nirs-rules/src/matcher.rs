//! Flow-table matching semantics for a single rule.
//!
//! Each non-`any` constraint on the rule narrows the candidate set
//! further (a logical AND across constraints), mirroring the sequential
//! `.filter()` chain of the reference matcher rather than a single
//! combined boolean expression.

use ipnetwork::IpNetwork;
use nirs_core::Flow;
use std::net::IpAddr;
use std::str::FromStr;

use crate::rule::Rule;

fn ip_matches(value: &str, candidate: &str) -> bool {
    if value.contains('/') {
        let Ok(network) = IpNetwork::from_str(value) else {
            return false;
        };
        let Ok(addr) = IpAddr::from_str(candidate) else {
            return false;
        };
        network.contains(addr)
    } else {
        value == candidate
    }
}

fn port_matches(value: &str, port: u16) -> bool {
    value.parse::<u16>().map(|p| p == port).unwrap_or(false)
}

/// Returns the ordered set of flow `idx` matched by `rule`, restricted
/// to the flows present in `flows` (callers pass the full remaining
/// table, per the scheduler's contract).
pub fn match_flows(rule: &Rule, flows: &[Flow]) -> Vec<u64> {
    let mut candidates: Vec<&Flow> = flows.iter().collect();

    if rule.protocol != "any" {
        candidates.retain(|f| f.protocol == rule.protocol);
    }

    if rule.src_ip != "any" {
        candidates.retain(|f| {
            (ip_matches(&rule.src_ip, &f.src_ip) && f.src_data > 0)
                || (ip_matches(&rule.src_ip, &f.dst_ip) && f.dst_data > 0)
        });
    }

    if rule.dst_ip != "any" && rule.src_port == "any" && rule.dst_port == "any" {
        candidates.retain(|f| {
            (ip_matches(&rule.dst_ip, &f.dst_ip) && f.src_data > 0)
                || (ip_matches(&rule.dst_ip, &f.src_ip) && f.dst_data > 0)
        });
    } else if rule.dst_ip != "any" && rule.src_port == "any" && rule.dst_port != "any" {
        candidates.retain(|f| {
            (ip_matches(&rule.dst_ip, &f.src_ip)
                && port_matches(&rule.dst_port, f.src_port)
                && f.src_data > 0)
                || (ip_matches(&rule.dst_ip, &f.dst_ip)
                    && port_matches(&rule.dst_port, f.dst_port)
                    && f.dst_data > 0)
        });
    }

    candidates.iter().map(|f| f.idx).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::Rule;

    fn flow(
        idx: u64,
        src_ip: &str,
        dst_ip: &str,
        src_port: u16,
        dst_port: u16,
        src_data: u64,
        dst_data: u64,
    ) -> Flow {
        Flow {
            idx,
            timestamp: 0,
            src_ip: src_ip.to_string(),
            dst_ip: dst_ip.to_string(),
            src_port,
            dst_port,
            protocol: "tcp".to_string(),
            src_data,
            dst_data,
            inter_subnet: true,
            label: 1,
            nids_pred: 1.0,
            is_alert: true,
            is_blocked: false,
        }
    }

    #[test]
    fn bidirectional_host_rule_matches_scenario() {
        let flows = vec![
            flow(0, "1.1.1.1", "2.2.2.2", 80, 80, 1, 2),
            flow(1, "3.3.3.3", "4.4.4.4", 1000, 3000, 3, 4),
            flow(2, "172.16.0.1", "172.16.0.2", 22, 22, 5, 6),
            flow(3, "172.16.0.3", "172.16.0.4", 22, 22, 7, 8),
        ];

        let dport_rule =
            Rule::parse("-A FORWARD -d 172.16.0.1/32 -p tcp --dport 22 -j DROP").unwrap();
        assert_eq!(match_flows(&dport_rule, &flows), vec![2]);

        let subnet_rule = Rule::parse("-A FORWARD -d 172.16.0.1/16 -p tcp -j DROP").unwrap();
        let mut matched = match_flows(&subnet_rule, &flows);
        matched.sort();
        assert_eq!(matched, vec![2, 3]);
    }

    #[test]
    fn zero_data_direction_is_excluded() {
        let flows = vec![flow(0, "1.2.3.4", "5.6.7.8", 1, 2, 0, 9)];
        let rule = Rule::parse("-A FORWARD -s 1.2.3.4 -j DROP").unwrap();
        assert!(match_flows(&rule, &flows).is_empty());
    }
}
