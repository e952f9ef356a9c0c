//! Command-line surface: which dataset/NIDS scores to replay, which
//! rule-synthesis strategy to run, and that strategy's knobs.

use clap::{Parser, ValueEnum};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Strategy {
    /// Never synthesizes a rule; useful as a do-nothing baseline.
    Base,
    Heuristic,
    Llm,
    Agent,
}

#[derive(Debug, Parser)]
#[command(name = "nirs-cli", about = "Replay a NIDS prediction stream through a NIRS strategy")]
pub struct Cli {
    /// Dataset identifier, used only for labeling the output file.
    #[arg(long, default_value = "nb15")]
    pub dataset: String,

    /// NIDS identifier the prediction CSV came from, also used only for labeling.
    #[arg(long, default_value = "rf")]
    pub nids: String,

    /// Path to the NIDS prediction CSV to replay.
    #[arg(long)]
    pub input: std::path::PathBuf,

    /// Directory results are written to.
    #[arg(long, default_value = "results")]
    pub out_dir: std::path::PathBuf,

    /// Which rule-synthesis strategy to run.
    #[arg(long, value_enum, default_value_t = Strategy::Heuristic)]
    pub nirs: Strategy,

    /// Target false positive rate for the quantile threshold gate.
    #[arg(long, default_value_t = 0.1)]
    pub fpr: f64,

    /// Benign-traffic tolerance fraction for the heuristic strategy.
    #[arg(long, default_value_t = 0.01)]
    pub eps: f64,

    /// Number of example rows included in LLM/agent prompts.
    #[arg(long, default_value_t = 10)]
    pub k_prompt: usize,

    /// Target correct-block rate the agent strategy must meet to accept a rule.
    #[arg(long, default_value_t = nirs_strategies::agent::DEFAULT_TARGET_CBR)]
    pub target_cbr: f64,

    /// Target wrong-block rate ceiling the agent strategy must not exceed.
    #[arg(long, default_value_t = nirs_strategies::agent::DEFAULT_TARGET_WBR)]
    pub target_wbr: f64,

    /// Maximum propose/evaluate/critique iterations per agent invocation.
    #[arg(long, default_value_t = nirs_strategies::agent::DEFAULT_MAX_ATTEMPTS)]
    pub max_attempts: u32,

    /// Replay step size, in milliseconds.
    #[arg(long, default_value_t = 1_800_000)]
    pub update_time_ms: i64,

    /// Maximum number of rules the ruleset retains before FIFO eviction.
    #[arg(long, default_value_t = 50)]
    pub max_rules: usize,

    /// Seed passed through to the Ollama chat request for determinism.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Base URL of the Ollama server, for the llm/agent strategies.
    #[arg(long, default_value = "http://localhost:11434")]
    pub ollama_address: String,

    /// Model name to request from Ollama, for the llm/agent strategies.
    #[arg(long, default_value = "llama3")]
    pub ollama_model: String,
}
