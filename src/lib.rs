//! covrecon core library.
//!
//! Reconciles defects reported by a remote static-analysis service against
//! a local source tree and maps every surviving defect onto an active
//! quality rule.
//!
//! High-level modules:
//! - `cli`: CLI argument parsing (binary uses this).
//! - `config`: Discovery and effective configuration resolution.
//! - `events`: Representative event selection.
//! - `paths`: Remote-to-local path resolution with per-pass cache.
//! - `rules`: Table-driven active-rule fallback chain and TOML profiles.
//! - `message`: Issue message and defect URL composition.
//! - `reconcile`: The reconciliation pass.
//! - `service`: Remote defect service trait and snapshot-backed client.
//! - `tree`: Local source tree trait and disk scanner.
//! - `models`: Defect records, issues, counters and measures.
//! - `output`: Human/JSON printers.
//! - `utils`: Console prefixes for the binary.
pub mod cli;
pub mod config;
pub mod events;
pub mod message;
pub mod models;
pub mod output;
pub mod paths;
pub mod reconcile;
pub mod rules;
pub mod service;
pub mod tree;
pub mod utils;

pub use reconcile::{run_pass, PassError, PassSettings, Reconciler};
