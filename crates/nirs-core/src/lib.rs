//! Shared types and error machinery for the network intrusion response
//! workspace.

pub mod error;
pub mod network;
pub mod types;

pub use error::{Error, Result};
pub use types::{Flow, WindowRow};
