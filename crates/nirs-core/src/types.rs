//! Core type definitions shared across the workspace

use serde::{Deserialize, Serialize};

/// One record per network connection, as it flows through the replay
/// scheduler. All fields are immutable after ingest except `is_blocked`,
/// which only ever transitions 0 -> 1.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Flow {
    pub idx: u64,
    pub timestamp: i64,
    pub src_ip: String,
    pub dst_ip: String,
    pub src_port: u16,
    pub dst_port: u16,
    pub protocol: String,
    pub src_data: u64,
    pub dst_data: u64,
    pub inter_subnet: bool,
    pub label: u8,
    pub nids_pred: f64,
    pub is_alert: bool,
    pub is_blocked: bool,
}

impl Flow {
    /// A training flow carries a sentinel negative score and is never a
    /// candidate for alerting, regardless of the threshold gate.
    pub fn is_training(&self) -> bool {
        self.nids_pred < 0.0
    }
}

/// Projection of a `Flow` onto the eight columns the sliding windows
/// retain. Kept separate from `Flow` so the windows never need to
/// reason about `label`/`is_blocked`/`nids_pred`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WindowRow {
    pub idx: u64,
    pub timestamp: i64,
    pub src_ip: String,
    pub src_port: u16,
    pub dst_ip: String,
    pub dst_port: u16,
    pub src_data: u64,
    pub dst_data: u64,
    pub protocol: String,
}

impl From<&Flow> for WindowRow {
    fn from(flow: &Flow) -> Self {
        Self {
            idx: flow.idx,
            timestamp: flow.timestamp,
            src_ip: flow.src_ip.clone(),
            src_port: flow.src_port,
            dst_ip: flow.dst_ip.clone(),
            dst_port: flow.dst_port,
            src_data: flow.src_data,
            dst_data: flow.dst_data,
            protocol: flow.protocol.clone(),
        }
    }
}
