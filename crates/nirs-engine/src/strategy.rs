//! The pluggable rule-synthesis capability shared by the heuristic,
//! LLM, and agent strategies.

use nirs_rules::{Rule, Ruleset};

use crate::windows::{AlertWindow, BenignWindow};

/// Produces at most one candidate rule per invocation, given the two
/// evidence windows and the ruleset as it stood at the start of this
/// update cycle. Implementations never mutate their inputs; the caller
/// (`NirsCore`) is the only place a rule is actually inserted.
pub trait SynthesisStrategy {
    fn synthesize(
        &mut self,
        ruleset: &Ruleset,
        alert_window: &AlertWindow,
        benign_window: &BenignWindow,
    ) -> Option<Rule>;

    /// The agent strategy only runs once the alert window exceeds a
    /// minimum size; the other strategies run on any non-empty slice.
    fn min_alert_window_len(&self) -> usize {
        0
    }
}

/// A strategy that never proposes a rule. Used as the CLI's `base`
/// strategy (i.e. "no automated response") and as a safe default.
#[derive(Debug, Default)]
pub struct NoopStrategy;

impl SynthesisStrategy for NoopStrategy {
    fn synthesize(
        &mut self,
        _ruleset: &Ruleset,
        _alert_window: &AlertWindow,
        _benign_window: &BenignWindow,
    ) -> Option<Rule> {
        None
    }
}
