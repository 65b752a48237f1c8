//! Pure domain logic for the resale pipeline.
//!
//! This crate has zero internal dependencies so it can be used by the
//! repository layer, the orchestration crate, and any worker or CLI
//! tooling. Everything here is deterministic: no I/O, no clocks, no
//! global state. Callers pass in config values, timestamps, and prior
//! state; they get back computed results and verdicts.

pub mod audit;
pub mod candidate_state;
pub mod cash_gate;
pub mod config_keys;
pub mod error;
pub mod hashing;
pub mod money;
pub mod order_state;
pub mod pricing;
pub mod retry;
pub mod rules;
pub mod shipping;
pub mod sku;
pub mod types;
