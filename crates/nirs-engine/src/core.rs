//! Owns the ruleset and the two sliding windows; the only place a rule
//! is ever actually inserted into the ruleset.

use nirs_core::{Flow, WindowRow};
use nirs_rules::{match_flows, Ruleset};
use tracing::debug;

use crate::strategy::SynthesisStrategy;
use crate::windows::{AlertWindow, BenignWindow};

pub struct NirsCore {
    pub ruleset: Ruleset,
    pub alert_window: AlertWindow,
    pub benign_window: BenignWindow,
    strategy: Box<dyn SynthesisStrategy>,
}

impl NirsCore {
    pub fn new(
        ruleset: Ruleset,
        alert_window: AlertWindow,
        benign_window: BenignWindow,
        strategy: Box<dyn SynthesisStrategy>,
    ) -> Self {
        Self {
            ruleset,
            alert_window,
            benign_window,
            strategy,
        }
    }

    /// Union of per-rule matches against the full remaining flow table.
    pub fn apply_rules(&self, flows: &[Flow]) -> Vec<u64> {
        let mut blocked: Vec<u64> = self
            .ruleset
            .iter()
            .flat_map(|rule| match_flows(rule, flows))
            .collect();
        blocked.sort_unstable();
        blocked.dedup();
        blocked
    }

    /// Splits `slice` by `is_alert`, ingests both windows, then (if the
    /// alert slice is non-empty and meets the strategy's minimum size)
    /// invokes the strategy and appends at most one rule.
    pub fn update(&mut self, slice: &[Flow]) {
        let benign_rows: Vec<WindowRow> = slice
            .iter()
            .filter(|f| !f.is_alert)
            .map(WindowRow::from)
            .collect();
        let alert_rows: Vec<WindowRow> = slice
            .iter()
            .filter(|f| f.is_alert)
            .map(WindowRow::from)
            .collect();

        self.benign_window
            .ingest(&benign_rows, self.alert_window.max_timestamp());

        if alert_rows.is_empty() {
            return;
        }

        self.alert_window.ingest(&alert_rows);

        if self.alert_window.len() < self.strategy.min_alert_window_len() {
            debug!(
                len = self.alert_window.len(),
                "alert window below strategy minimum, skipping synthesis"
            );
            return;
        }

        if let Some(rule) = self
            .strategy
            .synthesize(&self.ruleset, &self.alert_window, &self.benign_window)
        {
            self.ruleset.insert(rule);
        }
    }
}
