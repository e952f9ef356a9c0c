//! Rule parsing, validation, flow-table matching, and bounded ruleset
//! management.

pub mod matcher;
pub mod rule;
pub mod ruleset;

pub use matcher::match_flows;
pub use rule::Rule;
pub use ruleset::Ruleset;
