//! Threshold gate: turns per-flow NIDS scores into a binary alert flag.

use nirs_core::Flow;
use statrs::statistics::{Data, OrderStatistics};

/// `theta = quantile(scores where label == 0 and score >= 0, 1 - alpha)`.
/// Flows with a negative score are training flows and are excluded both
/// from the quantile computation and from ever being marked alert.
pub fn apply_quantile_threshold(flows: &mut [Flow], alpha: f64) -> f64 {
    let mut benign_scores: Vec<f64> = flows
        .iter()
        .filter(|f| f.label == 0 && f.nids_pred >= 0.0)
        .map(|f| f.nids_pred)
        .collect();

    let mut data = Data::new(std::mem::take(&mut benign_scores));
    let theta = if data.len() == 0 {
        0.0
    } else {
        data.quantile(1.0 - alpha)
    };

    for flow in flows.iter_mut() {
        flow.is_alert = flow.nids_pred > theta;
    }

    theta
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flow(label: u8, score: f64) -> Flow {
        Flow {
            idx: 0,
            timestamp: 0,
            src_ip: "1.1.1.1".into(),
            dst_ip: "2.2.2.2".into(),
            src_port: 1,
            dst_port: 2,
            protocol: "tcp".into(),
            src_data: 1,
            dst_data: 1,
            inter_subnet: true,
            label,
            nids_pred: score,
            is_alert: false,
            is_blocked: false,
        }
    }

    #[test]
    fn excludes_training_flows_from_quantile_and_alerts() {
        let mut flows = vec![flow(0, -1.0), flow(0, 0.1), flow(0, 0.9), flow(1, 0.5)];
        apply_quantile_threshold(&mut flows, 0.5);
        assert!(!flows[0].is_alert, "training flow must never alert");
    }

    #[test]
    fn higher_scores_become_alerts() {
        let mut flows: Vec<Flow> = (0..10).map(|i| flow(0, i as f64)).collect();
        apply_quantile_threshold(&mut flows, 0.1);
        assert!(flows.last().unwrap().is_alert);
        assert!(!flows.first().unwrap().is_alert);
    }
}
