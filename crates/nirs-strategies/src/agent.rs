//! Iterative agent synthesis strategy: a bounded {propose -> evaluate
//! -> critique} loop around a chat model with one tool, `evaluate_rule`.
//!
//! The reference implementation expresses this as a LangGraph
//! `StateGraph` with a thread-local runtime carrier; here it is an
//! explicit loop over a small state enum, and `evaluate_rule` takes the
//! windows as ordinary arguments instead of reaching into ambient state.

use ipnetwork::IpNetwork;
use nirs_core::WindowRow;
use nirs_engine::{AlertWindow, BenignWindow, SynthesisStrategy};
use nirs_rules::{match_flows, Rule, Ruleset};
use tracing::{debug, info};

use crate::ollama::{extract_rule, ChatMessage, OllamaClient};

pub const DEFAULT_TARGET_CBR: f64 = 0.30;
pub const DEFAULT_TARGET_WBR: f64 = 1.00;
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;
/// The agent only runs once the alert window strictly exceeds this size.
pub const MIN_ALERT_WINDOW_LEN: usize = 10;

fn default_critical_subnets() -> Vec<IpNetwork> {
    vec![
        "59.166.0.0/24".parse().expect("valid literal"),
        "149.171.126.0/24".parse().expect("valid literal"),
    ]
}

#[derive(Debug, Clone, PartialEq)]
pub enum AgentState {
    Propose,
    End,
    GiveUp,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub status: String,
    pub cbr: f64,
    pub wbr: f64,
}

impl Evaluation {
    fn invalid(status: impl Into<String>) -> Self {
        Self {
            status: status.into(),
            cbr: 0.0,
            wbr: 1.0,
        }
    }
}

fn row_matches(rows: &[WindowRow], rule: &Rule) -> usize {
    if rows.is_empty() {
        return 0;
    }
    let flows: Vec<nirs_core::Flow> = rows
        .iter()
        .map(|r| nirs_core::Flow {
            idx: r.idx,
            timestamp: r.timestamp,
            src_ip: r.src_ip.clone(),
            dst_ip: r.dst_ip.clone(),
            src_port: r.src_port,
            dst_port: r.dst_port,
            protocol: r.protocol.clone(),
            src_data: r.src_data,
            dst_data: r.dst_data,
            inter_subnet: true,
            label: 0,
            nids_pred: 0.0,
            is_alert: true,
            is_blocked: false,
        })
        .collect();
    match_flows(rule, &flows).len()
}

fn rule_network(rule_text: &str, flag: &str) -> Option<IpNetwork> {
    let mut tokens = rule_text.split_whitespace().peekable();
    while let Some(tok) = tokens.next() {
        if tok == flag {
            let value = tokens.next()?;
            if let Ok(network) = value.parse::<IpNetwork>() {
                return Some(network);
            }
            return value.parse::<std::net::IpAddr>().ok().and_then(|addr| {
                let prefix = if addr.is_ipv4() { 32 } else { 128 };
                IpNetwork::new(addr, prefix).ok()
            });
        }
    }
    None
}

fn blocks_critical_subnet(rule_text: &str, critical_subnets: &[IpNetwork]) -> bool {
    for flag in ["-s", "-d"] {
        if let Some(network) = rule_network(rule_text, flag) {
            if critical_subnets.iter().any(|c| c.overlaps(network)) {
                return true;
            }
        }
    }
    false
}

/// Pure function over (rule, windows, critical subnets): validity and
/// critical-subnet checks first, then CBR/WBR against the two windows.
pub fn evaluate_rule(
    rule_text: &str,
    alert_window: &AlertWindow,
    benign_window: &BenignWindow,
    critical_subnets: &[IpNetwork],
) -> Evaluation {
    if rule_text.trim().eq_ignore_ascii_case("none") {
        return Evaluation::invalid("INVALID: rule is 'none'");
    }
    if blocks_critical_subnet(rule_text, critical_subnets) {
        return Evaluation::invalid("INVALID: rule blocks a critical subnet");
    }

    let rule = match Rule::parse(rule_text) {
        Ok(rule) => rule,
        Err(_) => return Evaluation::invalid("INVALID: rule syntax could not be parsed"),
    };

    let alert_rows = alert_window.rows();
    let benign_rows = benign_window.rows();

    let alert_matched = row_matches(alert_rows, &rule);
    let benign_matched = row_matches(benign_rows, &rule);

    let cbr = if alert_rows.is_empty() {
        0.0
    } else {
        alert_matched as f64 / alert_rows.len() as f64
    };
    let wbr = if benign_rows.is_empty() {
        0.0
    } else {
        benign_matched as f64 / benign_rows.len() as f64
    };

    Evaluation {
        status: "VALID: rule passed checks".to_string(),
        cbr,
        wbr,
    }
}

const AGENT_PROMPT_TEMPLATE: &str = r#"You are a network security engineer. Your task is to write a single iptables rule to block malicious traffic while allowing benign traffic, then evaluate it.

Output exactly one iptables DROP rule to append to the FORWARD table, enclosed within <rule></rule> tags. Do not produce multiple rules. Keep your response short.

IMPORTANT:
- Never block the subnet {critical_subnets}, even if it appears in the malicious flows above.
- If you find no safe DROP rule to generate, output:
  <rule>none</rule>
- Prefer blocking entire source IPs or subnets rather than specifying protocols, ports, or destination ports unless absolutely necessary.

Valid formats include:
-A FORWARD -s <src_ip>/<subnet> -j DROP
-A FORWARD -d <dst_ip>/<subnet> -j DROP
-A FORWARD -d <dst_ip>/<subnet> -p <protocol> -j DROP
-A FORWARD -d <dst_ip>/<subnet> -p <protocol> --dport <dst_port> -j DROP

Malicious flows:
{malicious_csv}

Benign flows:
{benign_csv}
"#;

fn rows_to_csv(rows: &[WindowRow]) -> String {
    let mut out = String::from("src_ip,dst_ip,protocol,src_port,dst_port,src_data,dst_data\n");
    for r in rows {
        out.push_str(&format!(
            "{},{},{},{},{},{},{}\n",
            r.src_ip, r.dst_ip, r.protocol, r.src_port, r.dst_port, r.src_data, r.dst_data
        ));
    }
    out
}

pub struct AgentStrategy {
    client: OllamaClient,
    num_examples: usize,
    target_cbr: f64,
    target_wbr: f64,
    max_attempts: u32,
    critical_subnets: Vec<IpNetwork>,
}

impl AgentStrategy {
    pub fn new(client: OllamaClient, num_examples: usize) -> Self {
        Self {
            client,
            num_examples,
            target_cbr: DEFAULT_TARGET_CBR,
            target_wbr: DEFAULT_TARGET_WBR,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            critical_subnets: default_critical_subnets(),
        }
    }

    pub fn with_targets(mut self, target_cbr: f64, target_wbr: f64) -> Self {
        self.target_cbr = target_cbr;
        self.target_wbr = target_wbr;
        self
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn with_critical_subnets(mut self, subnets: Vec<IpNetwork>) -> Self {
        self.critical_subnets = subnets;
        self
    }

    fn tail(rows: &[WindowRow], n: usize) -> Vec<WindowRow> {
        let start = rows.len().saturating_sub(n);
        rows[start..].to_vec()
    }

    fn seed_prompt(&self, alert_window: &AlertWindow, benign_window: &BenignWindow) -> String {
        let critical = self
            .critical_subnets
            .iter()
            .map(|s| s.to_string())
            .collect::<Vec<_>>()
            .join(" and ");
        AGENT_PROMPT_TEMPLATE
            .replace("{critical_subnets}", &critical)
            .replace(
                "{malicious_csv}",
                &rows_to_csv(&Self::tail(alert_window.rows(), self.num_examples)),
            )
            .replace(
                "{benign_csv}",
                &rows_to_csv(&Self::tail(benign_window.rows(), self.num_examples)),
            )
    }
}

impl SynthesisStrategy for AgentStrategy {
    fn min_alert_window_len(&self) -> usize {
        MIN_ALERT_WINDOW_LEN
    }

    fn synthesize(
        &mut self,
        _ruleset: &Ruleset,
        alert_window: &AlertWindow,
        benign_window: &BenignWindow,
    ) -> Option<Rule> {
        let mut transcript = vec![ChatMessage::user(self.seed_prompt(alert_window, benign_window))];
        let mut state = AgentState::Propose;
        let mut attempts = 0u32;

        loop {
            match state {
                AgentState::Propose => {
                    if attempts > 0 {
                        transcript.push(ChatMessage::user(
                            "Generate an iptables rule following the same instructions as before."
                                .to_string(),
                        ));
                    }
                    attempts += 1;

                    let answer = match self.client.chat(&transcript) {
                        Ok(answer) => answer,
                        Err(e) => {
                            debug!(error = %e, attempt = attempts, "llm transport failed this attempt");
                            if attempts >= self.max_attempts {
                                state = AgentState::GiveUp;
                            }
                            continue;
                        }
                    };
                    transcript.push(ChatMessage::assistant(answer.clone()));

                    let rule_text = extract_rule(&answer).unwrap_or_else(|| "none".to_string());
                    let evaluation = evaluate_rule(
                        &rule_text,
                        alert_window,
                        benign_window,
                        &self.critical_subnets,
                    );

                    let meets_targets =
                        evaluation.cbr >= self.target_cbr && evaluation.wbr <= self.target_wbr;

                    if meets_targets {
                        info!(attempts, cbr = evaluation.cbr, wbr = evaluation.wbr, "agent rule accepted");
                        return Rule::parse(&rule_text).ok();
                    }

                    if attempts >= self.max_attempts {
                        state = AgentState::GiveUp;
                        continue;
                    }

                    let critique = if evaluation.status.contains("INVALID") {
                        format!("EVALUATION\n- Status: {}\nGuidance: generate a different valid rule.", evaluation.status)
                    } else if evaluation.cbr < self.target_cbr {
                        format!(
                            "EVALUATION\n- Status: {}\nGuidance: too low correct block rate (CBR={:.3}, target >= {:.2}). Generate a different rule.",
                            evaluation.status, evaluation.cbr, self.target_cbr
                        )
                    } else {
                        format!(
                            "EVALUATION\n- Status: {}\nGuidance: too high wrong block rate (WBR={:.3}, target <= {:.2}). Generate a different rule.",
                            evaluation.status, evaluation.wbr, self.target_wbr
                        )
                    };
                    transcript.push(ChatMessage::user(critique));
                    state = AgentState::Propose;
                }
                AgentState::End => unreachable!("End is returned from directly"),
                AgentState::GiveUp => {
                    info!(attempts, "agent exhausted max attempts, emitting no rule");
                    return None;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn evaluate_rejects_literal_none() {
        let aw = AlertWindow::new(1_000_000, 1_000_000);
        let bw = BenignWindow::new(1_000_000);
        let ev = evaluate_rule("none", &aw, &bw, &default_critical_subnets());
        assert!(ev.status.contains("INVALID"));
    }

    #[test]
    fn evaluate_rejects_critical_subnet_overlap() {
        let aw = AlertWindow::new(1_000_000, 1_000_000);
        let bw = BenignWindow::new(1_000_000);
        let ev = evaluate_rule(
            "-A FORWARD -s 59.166.0.5 -j DROP",
            &aw,
            &bw,
            &default_critical_subnets(),
        );
        assert!(ev.status.contains("critical"));
    }

    #[test]
    fn empty_windows_yield_zero_rates() {
        let aw = AlertWindow::new(1_000_000, 1_000_000);
        let bw = BenignWindow::new(1_000_000);
        let ev = evaluate_rule(
            "-A FORWARD -s 10.0.0.1 -j DROP",
            &aw,
            &bw,
            &default_critical_subnets(),
        );
        assert_eq!(ev.cbr, 0.0);
        assert_eq!(ev.wbr, 0.0);
    }
}
