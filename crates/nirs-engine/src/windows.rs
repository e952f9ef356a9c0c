//! Sliding-window evidence buffers.
//!
//! `AlertWindow` and `BenignWindow` both project flows onto the eight
//! shared columns (`nirs_core::WindowRow`) and keep only the contents
//! that their respective ingest/eviction policy admits.

use nirs_core::WindowRow;

/// Recent alert traffic. Resets instead of appending when the gap
/// between the current window's max timestamp and the new slice's
/// minimum exceeds `max_idle_ms`; always bounded to `max_len_ms`.
#[derive(Debug, Clone)]
pub struct AlertWindow {
    rows: Vec<WindowRow>,
    max_idle_ms: i64,
    max_len_ms: i64,
}

impl AlertWindow {
    pub fn new(max_idle_ms: i64, max_len_ms: i64) -> Self {
        Self {
            rows: Vec::new(),
            max_idle_ms,
            max_len_ms,
        }
    }

    pub fn rows(&self) -> &[WindowRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn max_timestamp(&self) -> Option<i64> {
        self.rows.iter().map(|r| r.timestamp).max()
    }

    /// `slice` must already carry `is_alert = true` flows only; the
    /// split happens one layer up in `NirsCore::update`.
    pub fn ingest(&mut self, slice: &[WindowRow]) {
        if slice.is_empty() {
            return;
        }

        if self.rows.is_empty() {
            self.rows = slice.to_vec();
            return;
        }

        // Captured once, before the reset/append branch: both the idle
        // test and the eviction horizon use this pre-ingest max, not
        // whatever the window's max becomes after mutating `self.rows`.
        let t_cur_max = self.max_timestamp().unwrap_or(i64::MAX);
        let t_min = slice.iter().map(|r| r.timestamp).min().unwrap_or(0);

        if t_cur_max - t_min > self.max_idle_ms {
            self.rows = slice.to_vec();
        } else {
            self.rows.extend_from_slice(slice);
        }

        let horizon = t_cur_max - self.max_len_ms;
        self.rows.retain(|r| r.timestamp > horizon);
    }
}

/// Recent benign traffic. Appends unconditionally; the eviction horizon
/// tracks the *alert* window's max timestamp, not wall clock, so benign
/// traffic is only ever as fresh as the alerts it is being compared to.
#[derive(Debug, Clone)]
pub struct BenignWindow {
    rows: Vec<WindowRow>,
    window_len_ms: i64,
}

impl BenignWindow {
    pub fn new(window_len_ms: i64) -> Self {
        Self {
            rows: Vec::new(),
            window_len_ms,
        }
    }

    pub fn rows(&self) -> &[WindowRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn ingest(&mut self, slice: &[WindowRow], alert_window_max_timestamp: Option<i64>) {
        self.rows.extend_from_slice(slice);
        if self.rows.is_empty() {
            return;
        }
        let t_max = alert_window_max_timestamp.unwrap_or(i64::MAX);
        let horizon = t_max - self.window_len_ms;
        self.rows.retain(|r| r.timestamp > horizon);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(ts: i64) -> WindowRow {
        WindowRow {
            idx: ts as u64,
            timestamp: ts,
            src_ip: "1.1.1.1".into(),
            src_port: 1,
            dst_ip: "2.2.2.2".into(),
            dst_port: 2,
            src_data: 1,
            dst_data: 1,
            protocol: "tcp".into(),
        }
    }

    #[test]
    fn alert_window_resets_on_idle_gap() {
        let mut w = AlertWindow::new(1000, 100_000);
        // first ingest always assigns (empty-window branch)
        w.ingest(&[row(5000)]);
        assert_eq!(w.len(), 1);
        // t_cur_max(5000) - t_new_min(100) = 4900 > max_idle_ms(1000) => reset
        w.ingest(&[row(100)]);
        assert_eq!(w.len(), 1);
        assert_eq!(w.rows()[0].timestamp, 100);
    }

    #[test]
    fn alert_window_appends_within_idle() {
        let mut w = AlertWindow::new(1000, 100_000);
        w.ingest(&[row(0)]);
        w.ingest(&[row(500)]);
        assert_eq!(w.len(), 2);
    }

    #[test]
    fn alert_window_skips_eviction_on_first_ingest() {
        // the reference's `ingest_alert_df` early-returns on the
        // empty-window branch with no eviction, even though the slice's
        // own span already exceeds max_len_ms.
        let mut w = AlertWindow::new(10_000, 1_000);
        w.ingest(&[row(0), row(500), row(3_000)]);
        assert_eq!(w.len(), 3);
    }

    #[test]
    fn alert_window_evicts_using_pre_ingest_max() {
        let mut w = AlertWindow::new(10_000, 1_000);
        w.ingest(&[row(0)]);
        w.ingest(&[row(1_500)]);
        assert_eq!(w.len(), 2);
        // horizon must use the max *before* this ingest (1_500), not the
        // post-append max (5_000): horizon = 1_500 - 1_000 = 500, so
        // row(0) is evicted but row(1_500) survives.
        w.ingest(&[row(5_000)]);
        let mut timestamps: Vec<i64> = w.rows().iter().map(|r| r.timestamp).collect();
        timestamps.sort();
        assert_eq!(timestamps, vec![1_500, 5_000]);
    }

    #[test]
    fn benign_window_tracks_alert_horizon() {
        let mut w = BenignWindow::new(500);
        w.ingest(&[row(0), row(400)], Some(1000));
        // horizon = 1000 - 500 = 500; row(0) evicted, row(400) kept
        assert_eq!(w.len(), 1);
        assert_eq!(w.rows()[0].timestamp, 400);
    }
}
