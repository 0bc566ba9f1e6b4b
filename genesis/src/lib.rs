//! Genesis document support: the chain-bootstrap configuration applied once
//! at node startup, before any block is ingested.

pub mod config;
pub mod types;

pub use crate::config::Genesis;
pub use crate::types::GenesisError;
