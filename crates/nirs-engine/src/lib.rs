//! Sliding-window memory, the NIRS core, the replay scheduler, and the
//! threshold gate that feeds it.

pub mod core;
pub mod scheduler;
pub mod strategy;
pub mod threshold;
pub mod windows;

pub use crate::core::NirsCore;
pub use scheduler::{ReplayResultRow, ReplayScheduler, ReplaySummary};
pub use strategy::{NoopStrategy, SynthesisStrategy};
pub use threshold::apply_quantile_threshold;
pub use windows::{AlertWindow, BenignWindow};
