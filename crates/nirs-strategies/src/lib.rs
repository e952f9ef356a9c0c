//! The three interchangeable rule-synthesis strategies: heuristic,
//! single-shot LLM, and iterative agent.

pub mod agent;
pub mod heuristic;
pub mod llm;
pub mod ollama;

pub use agent::AgentStrategy;
pub use heuristic::HeuristicStrategy;
pub use llm::LlmStrategy;
pub use ollama::OllamaClient;
