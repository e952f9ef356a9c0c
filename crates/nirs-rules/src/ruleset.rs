//! Bounded, deduplicated, FIFO-evicting sequence of rules.

use crate::rule::Rule;
use std::collections::VecDeque;
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub struct Ruleset {
    rules: VecDeque<Rule>,
    max_rules: usize,
}

impl Ruleset {
    pub fn new(max_rules: usize) -> Self {
        Self {
            rules: VecDeque::new(),
            max_rules,
        }
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Rule> {
        self.rules.iter()
    }

    pub fn contains_text(&self, raw: &str) -> bool {
        self.rules.iter().any(|r| r.canonical_text() == raw)
    }

    /// Appends `rule` unless it duplicates an existing rule's textual
    /// form, in which case it is silently dropped. Evicts the oldest
    /// rule first if the ruleset is at capacity. Returns `true` iff the
    /// rule was actually added.
    pub fn insert(&mut self, rule: Rule) -> bool {
        if self.contains_text(rule.canonical_text()) {
            debug!(rule = rule.canonical_text(), "duplicate rule, not added");
            return false;
        }
        if self.rules.len() >= self.max_rules {
            if let Some(evicted) = self.rules.pop_front() {
                info!(rule = evicted.canonical_text(), "evicted oldest rule");
            }
        }
        info!(rule = rule.canonical_text(), "added rule");
        self.rules.push_back(rule);
        true
    }

    /// Textual status for the LLM strategy's prompt: `[Empty]` when no
    /// rules are present, one rule per line otherwise.
    pub fn status_text(&self) -> String {
        if self.rules.is_empty() {
            return "[Empty]".to_string();
        }
        self.rules
            .iter()
            .map(|r| r.canonical_text())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(raw: &str) -> Rule {
        Rule::parse(raw).unwrap()
    }

    #[test]
    fn enforces_cap_with_fifo_eviction() {
        let mut rs = Ruleset::new(2);
        assert!(rs.insert(rule("-A FORWARD -s 1.1.1.1 -j DROP")));
        assert!(rs.insert(rule("-A FORWARD -s 2.2.2.2 -j DROP")));
        assert!(rs.insert(rule("-A FORWARD -s 3.3.3.3 -j DROP")));
        assert_eq!(rs.len(), 2);
        assert!(!rs.contains_text("-A FORWARD -s 1.1.1.1 -j DROP"));
        assert!(rs.contains_text("-A FORWARD -s 3.3.3.3 -j DROP"));
    }

    #[test]
    fn rejects_textual_duplicates() {
        let mut rs = Ruleset::new(10);
        assert!(rs.insert(rule("-A FORWARD -s 1.1.1.1 -j DROP")));
        assert!(!rs.insert(rule("-A FORWARD -s 1.1.1.1 -j DROP")));
        assert_eq!(rs.len(), 1);
    }

    #[test]
    fn empty_status_text() {
        let rs = Ruleset::new(5);
        assert_eq!(rs.status_text(), "[Empty]");
    }
}
