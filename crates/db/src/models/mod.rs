//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` + `Serialize` entity struct matching the database row
//! - A `Deserialize` create DTO for inserts
//! - Update DTOs (all `Option` fields) where partial updates exist

pub mod candidate;
pub mod config;
pub mod draft;
pub mod ledger;
pub mod order;
pub mod pricing;
pub mod transition;
