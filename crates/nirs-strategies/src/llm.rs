//! Single-shot LLM synthesis strategy.

use nirs_core::WindowRow;
use nirs_engine::{AlertWindow, BenignWindow, SynthesisStrategy};
use nirs_rules::{Rule, Ruleset};
use tracing::warn;

use crate::ollama::{extract_rule, ChatMessage, OllamaClient};

const ACCEPTED_FORMATS: &[&str] = &[
    "-A FORWARD -s <src_ip>/<subnet> -j DROP",
    "-A FORWARD -d <dst_ip>/<subnet> -j DROP",
    "-A FORWARD -d <dst_ip>/<subnet> -p <protocol> -j DROP",
    "-A FORWARD -d <dst_ip>/<subnet> -p <protocol> --dport <dst_port> -j DROP",
];

const FEW_SHOT_RULES: &[&str] = &[
    "-A FORWARD -s 10.25.0.41 -j DROP",
    "-A FORWARD -s 172.21.0.1/24 -j DROP",
    "-A FORWARD -d 208.42.13.2 -j DROP",
    "-A FORWARD -d 113.0.201.5 -p icmp",
    "-A FORWARD -d 32.153.41.11 -p tcp --dport 22",
];

fn system_prompt() -> String {
    let formats = ACCEPTED_FORMATS
        .iter()
        .map(|f| format!("<rule>{f}</rule>"))
        .collect::<Vec<_>>()
        .join("\n");
    let examples = FEW_SHOT_RULES
        .iter()
        .map(|r| format!("<rule>{r}</rule>"))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "You are a network security engineer. You are tasked with monitoring incoming \
         malicious and benign traffic, and writing one iptables rule accordingly.\n\
         You will observe examples of benign flows and malicious flows. You will also \
         have access to the current iptables status.\n\
         Based on this information, you will write one single iptables rule, which \
         should be enclosed within <rule></rule> tags.\n\n\
         Valid formats for the rule include:\n{formats}\n\n\
         The /<subnet> is optional.\n\n\
         Examples of valid rules:\n{examples}\n"
    )
}

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

fn user_prompt(malicious: &[WindowRow], benign: &[WindowRow], ruleset_status: &str) -> String {
    format!(
        "Malicious flows:\n{}\n\nBenign flows:\n{}\n\nIptables status:\n{}\n\n\
         Output only one iptables DROP rule to append to the FORWARD table, enclosed \
         within <rule></rule> tags.\nThe rule must block most of the malicious flows \
         and must not block most of the benign flows.\nKeep your response short.",
        rows_to_csv(malicious),
        rows_to_csv(benign),
        ruleset_status,
    )
}

pub struct LlmStrategy {
    client: OllamaClient,
    num_examples: usize,
}

impl LlmStrategy {
    pub fn new(client: OllamaClient, num_examples: usize) -> Self {
        Self {
            client,
            num_examples,
        }
    }

    fn tail(rows: &[WindowRow], n: usize) -> Vec<WindowRow> {
        let start = rows.len().saturating_sub(n);
        rows[start..].to_vec()
    }
}

impl SynthesisStrategy for LlmStrategy {
    fn synthesize(
        &mut self,
        ruleset: &Ruleset,
        alert_window: &AlertWindow,
        benign_window: &BenignWindow,
    ) -> Option<Rule> {
        let malicious = Self::tail(alert_window.rows(), self.num_examples);
        let benign = Self::tail(benign_window.rows(), self.num_examples);

        let messages = [
            ChatMessage::system(system_prompt()),
            ChatMessage::user(user_prompt(&malicious, &benign, &ruleset.status_text())),
        ];

        let answer = match self.client.chat(&messages) {
            Ok(answer) => answer,
            Err(e) => {
                warn!(error = %e, "llm transport failed, abstaining this step");
                return None;
            }
        };

        let rule_text = extract_rule(&answer)?;
        match Rule::parse(&rule_text) {
            Ok(rule) => Some(rule),
            Err(e) => {
                warn!(error = %e, rule = rule_text, "llm produced an invalid rule, abstaining");
                None
            }
        }
    }
}
