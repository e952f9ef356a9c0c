//! Minimal CSV ingestion: loads a flow table already shaped to the
//! column schema the rest of the workspace expects. This is not a
//! general-purpose ingestion framework — there is no column remapping,
//! no type coercion beyond what `csv`/`serde` do for us, and no support
//! for hex-encoded ports. Callers are expected to pre-clean their data.

use nirs_core::network::is_inter_subnet;
use nirs_core::{Error, Flow, Result};
use serde::Deserialize;
use std::path::Path;

/// One row as it appears in the NIDS prediction CSV: the flow's own
/// identifying fields plus the score this run is replaying against.
#[derive(Debug, Deserialize)]
struct FlowRecord {
    timestamp: i64,
    src_ip: String,
    dst_ip: String,
    src_port: u16,
    dst_port: u16,
    protocol: String,
    src_data: u64,
    dst_data: u64,
    label: u8,
    nids_pred: f64,
}

/// Reads `path`, sorts rows by `timestamp` — the replay scheduler's one
/// precondition on its input — and only then assigns `idx` in that
/// sorted order, matching the reference's `np.arange(len(df))` over the
/// already-sorted frame.
pub fn load_flows(path: &Path) -> Result<Vec<Flow>> {
    let mut reader = csv::Reader::from_path(path)?;

    let mut records: Vec<FlowRecord> = reader
        .deserialize::<FlowRecord>()
        .collect::<std::result::Result<Vec<_>, csv::Error>>()?;

    if records.is_empty() {
        return Err(Error::Configuration(format!(
            "{} contains no flow rows",
            path.display()
        )));
    }

    records.sort_by_key(|r| r.timestamp);

    let flows = records
        .into_iter()
        .enumerate()
        .map(|(idx, record)| {
            let inter_subnet = is_inter_subnet(&record.src_ip, &record.dst_ip);
            Flow {
                idx: idx as u64,
                timestamp: record.timestamp,
                src_ip: record.src_ip,
                dst_ip: record.dst_ip,
                src_port: record.src_port,
                dst_port: record.dst_port,
                protocol: record.protocol,
                src_data: record.src_data,
                dst_data: record.dst_data,
                inter_subnet,
                label: record.label,
                nids_pred: record.nids_pred,
                is_alert: false,
                is_blocked: false,
            }
        })
        .collect();

    Ok(flows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn loads_and_sorts_by_timestamp() {
        let mut file = tempfile_with_header();
        writeln!(file, "200,10.0.0.2,10.0.1.2,1,2,tcp,5,5,0,0.1").unwrap();
        writeln!(file, "100,10.0.0.1,10.0.1.1,1,2,tcp,5,5,1,0.9").unwrap();
        let path = file.into_temp_path();

        let flows = load_flows(&path).unwrap();
        assert_eq!(flows.len(), 2);
        // row with ts=100 was written second but sorts first, so it
        // gets idx 0 — idx tracks sorted position, not file order.
        assert_eq!(flows[0].timestamp, 100);
        assert_eq!(flows[0].idx, 0);
        assert_eq!(flows[1].timestamp, 200);
        assert_eq!(flows[1].idx, 1);
        assert!(flows[0].inter_subnet);
    }

    fn tempfile_with_header() -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "timestamp,src_ip,dst_ip,src_port,dst_port,protocol,src_data,dst_data,label,nids_pred"
        )
        .unwrap();
        file
    }
}
