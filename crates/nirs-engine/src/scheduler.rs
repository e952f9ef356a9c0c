//! Deterministic, time-windowed replay loop.

use nirs_core::Flow;
use tracing::{debug, info};

use crate::core::NirsCore;

#[derive(Debug, Clone, Copy, Default)]
pub struct ReplaySummary {
    pub steps: u64,
    pub blocked_flows: u64,
    pub cbr: f64,
    pub wbr: f64,
}

/// One row of the persisted result file.
#[derive(Debug, Clone, Copy)]
pub struct ReplayResultRow {
    pub timestamp: i64,
    pub is_blocked: bool,
}

pub struct ReplayScheduler {
    update_time_ms: i64,
}

impl ReplayScheduler {
    pub fn new(update_time_ms: i64) -> Self {
        Self { update_time_ms }
    }

    /// `flows` must already be sorted by `timestamp` ascending; this is
    /// a precondition, not something the scheduler enforces.
    pub fn run(&self, flows: &mut [Flow], core: &mut NirsCore) -> ReplaySummary {
        let delta = self.update_time_ms;
        let mut t_cur = flows.iter().map(|f| f.timestamp).min().unwrap_or(0);
        let mut steps = 0u64;

        loop {
            let any_alert_ahead = flows
                .iter()
                .any(|f| f.timestamp > t_cur && f.is_alert);
            if !any_alert_ahead {
                break;
            }

            let in_step = |ts: i64| ts >= t_cur && ts <= t_cur + delta;

            if !flows.iter().any(|f| in_step(f.timestamp)) {
                t_cur += delta;
                steps += 1;
                continue;
            }

            let blocked_idx = core.apply_rules(flows);

            for flow in flows.iter_mut() {
                if blocked_idx.binary_search(&flow.idx).is_ok()
                    && in_step(flow.timestamp)
                    && flow.inter_subnet
                {
                    flow.is_blocked = true;
                }
            }

            let fresh_window: Vec<Flow> = flows
                .iter()
                .filter(|f| {
                    in_step(f.timestamp)
                        && f.inter_subnet
                        && (f.src_data > 0 || f.dst_data > 0)
                        && blocked_idx.binary_search(&f.idx).is_err()
                })
                .cloned()
                .collect();

            let any_alert_unblocked = fresh_window.iter().any(|f| f.is_alert);
            if !any_alert_unblocked {
                t_cur += delta;
                steps += 1;
                continue;
            }

            debug!(step = steps, t_cur, fresh = fresh_window.len(), "updating NIRS core");
            core.update(&fresh_window);

            t_cur += delta;
            steps += 1;
        }

        let blocked_flows = flows.iter().filter(|f| f.is_blocked).count() as u64;
        let malicious_total = flows.iter().filter(|f| f.label == 1).count();
        let benign_total = flows.iter().filter(|f| f.label == 0).count();
        let malicious_blocked = flows.iter().filter(|f| f.label == 1 && f.is_blocked).count();
        let benign_blocked = flows.iter().filter(|f| f.label == 0 && f.is_blocked).count();

        let cbr = if malicious_total == 0 {
            0.0
        } else {
            malicious_blocked as f64 / malicious_total as f64
        };
        let wbr = if benign_total == 0 {
            0.0
        } else {
            benign_blocked as f64 / benign_total as f64
        };

        info!(steps, blocked_flows, cbr, wbr, "replay complete");

        ReplaySummary {
            steps,
            blocked_flows,
            cbr,
            wbr,
        }
    }

    pub fn result_rows(flows: &[Flow]) -> Vec<ReplayResultRow> {
        flows
            .iter()
            .map(|f| ReplayResultRow {
                timestamp: f.timestamp,
                is_blocked: f.is_blocked,
            })
            .collect()
    }
}
