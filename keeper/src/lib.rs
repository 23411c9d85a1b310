//! poolbook-keeper: operator tooling around a poolbook pool.
//!
//! Builds a pool from a TOML config, applies a JSON script of operations,
//! records every outcome in a JSONL audit trail, and saves or replays the
//! pool's event log.

pub mod audit;
pub mod config;
pub mod error;
pub mod script;
pub mod session;
