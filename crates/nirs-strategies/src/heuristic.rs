//! Frequency-based heuristic synthesis strategy.

use std::collections::HashMap;

use nirs_core::WindowRow;
use nirs_engine::{AlertWindow, BenignWindow, SynthesisStrategy};
use nirs_rules::{match_flows, Rule, Ruleset};

/// Mirrors the reference heuristic's real positional signature
/// (`ruleset, alert_window, benign_window, max_rules, frac_benign_tolerance`)
/// rather than the misleadingly-named parameters its caller was wired up
/// with — see the workspace design notes for why.
#[derive(Debug, Clone)]
pub struct HeuristicStrategy {
    pub frac_benign_tolerance: f64,
}

impl HeuristicStrategy {
    pub fn new(frac_benign_tolerance: f64) -> Self {
        Self {
            frac_benign_tolerance,
        }
    }
}

/// `WindowRow` has no `nirs_core::Flow::idx`-adjacent `is_alert`/`is_blocked`
/// fields, so the ruleset filter here works directly against the window's
/// own `idx`, matching the reference's re-indexed alert/benign frames.
fn window_row_as_flow(row: &WindowRow) -> nirs_core::Flow {
    nirs_core::Flow {
        idx: row.idx,
        timestamp: row.timestamp,
        src_ip: row.src_ip.clone(),
        dst_ip: row.dst_ip.clone(),
        src_port: row.src_port,
        dst_port: row.dst_port,
        protocol: row.protocol.clone(),
        src_data: row.src_data,
        dst_data: row.dst_data,
        inter_subnet: true,
        label: 0,
        nids_pred: 0.0,
        is_alert: true,
        is_blocked: false,
    }
}

fn remove_already_matched(rows: &[WindowRow], ruleset: &Ruleset) -> Vec<WindowRow> {
    let flows: Vec<nirs_core::Flow> = rows.iter().map(window_row_as_flow).collect();
    let mut blocked: std::collections::HashSet<u64> = std::collections::HashSet::new();
    for rule in ruleset.iter() {
        for idx in match_flows(rule, &flows) {
            blocked.insert(idx);
        }
    }
    rows.iter()
        .filter(|r| !blocked.contains(&r.idx))
        .cloned()
        .collect()
}

/// Frequency table over `src_ip` then `dst_ip`, in that concatenation
/// order, with ties broken by first-seen position — a deterministic
/// stand-in for the reference's `value_counts()` walk order.
fn ip_frequency_order(rows: &[WindowRow]) -> Vec<String> {
    let ips: Vec<&str> = rows
        .iter()
        .map(|r| r.src_ip.as_str())
        .chain(rows.iter().map(|r| r.dst_ip.as_str()))
        .collect();

    let mut counts: HashMap<&str, usize> = HashMap::new();
    let mut first_seen: HashMap<&str, usize> = HashMap::new();
    for (pos, ip) in ips.iter().enumerate() {
        *counts.entry(ip).or_insert(0) += 1;
        first_seen.entry(ip).or_insert(pos);
    }

    let mut unique: Vec<&str> = counts.keys().copied().collect();
    unique.sort_by(|a, b| {
        counts[b]
            .cmp(&counts[a])
            .then_with(|| first_seen[a].cmp(&first_seen[b]))
    });
    unique.into_iter().map(|s| s.to_string()).collect()
}

impl SynthesisStrategy for HeuristicStrategy {
    fn synthesize(
        &mut self,
        ruleset: &Ruleset,
        alert_window: &AlertWindow,
        benign_window: &BenignWindow,
    ) -> Option<Rule> {
        let alert_rows = remove_already_matched(alert_window.rows(), ruleset);
        let benign_rows = remove_already_matched(benign_window.rows(), ruleset);

        let alert_ips = ip_frequency_order(&alert_rows);

        let mut benign_counts: HashMap<String, usize> = HashMap::new();
        for ip in benign_rows
            .iter()
            .map(|r| r.src_ip.clone())
            .chain(benign_rows.iter().map(|r| r.dst_ip.clone()))
        {
            *benign_counts.entry(ip).or_insert(0) += 1;
        }

        let tolerance = self.frac_benign_tolerance * benign_rows.len() as f64;

        for ip in alert_ips {
            let benign_count = *benign_counts.get(&ip).unwrap_or(&0);
            if (benign_count as f64) > tolerance {
                continue;
            }
            return Some(Rule::block_source(&ip));
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(src: &str, dst: &str) -> WindowRow {
        WindowRow {
            idx: 0,
            timestamp: 0,
            src_ip: src.to_string(),
            src_port: 1,
            dst_ip: dst.to_string(),
            dst_port: 2,
            src_data: 1,
            dst_data: 1,
            protocol: "tcp".to_string(),
        }
    }

    #[test]
    fn picks_ip_within_benign_tolerance() {
        let mut alert_window = AlertWindow::new(1_000_000, 1_000_000);
        let alert_rows: Vec<WindowRow> = (0..10)
            .map(|_| row("A", "other"))
            .chain((0..5).map(|_| row("B", "other")))
            .enumerate()
            .map(|(i, mut r)| {
                r.idx = i as u64;
                r
            })
            .collect();
        alert_window.ingest(&alert_rows);

        let mut benign_window = BenignWindow::new(1_000_000);
        let mut benign_rows: Vec<WindowRow> = (0..20)
            .map(|_| row("A", "x"))
            .chain((0..3).map(|_| row("B", "x")))
            .chain((0..77).map(|_| row("other", "other")))
            .enumerate()
            .map(|(i, mut r)| {
                r.idx = i as u64;
                r
            })
            .collect();
        benign_rows.truncate(100);
        benign_window.ingest(&benign_rows, None);

        let ruleset = Ruleset::new(10);
        let mut strategy = HeuristicStrategy::new(0.1);
        let rule = strategy
            .synthesize(&ruleset, &alert_window, &benign_window)
            .expect("B should be selected");
        assert_eq!(rule.src_ip, "B");
    }
}
