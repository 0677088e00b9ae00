//! lineage-hook: Post-execution column lineage capture.
//!
//! Builds the lineage graph for each finished query, fans the edges out to
//! the configured sinks, and enforces the run-SQL policy.

pub mod config;
pub mod error;
pub mod hook;
pub mod jsonl;
pub mod registry;

use std::fs;
use std::io::Read;

use lineage_core::QueryLineage;

pub use hook::{HookOutcome, LineageHook, SkipReason};
pub use registry::{dispatch, DispatchReport, SinkRegistry};

/// Read a query lineage JSON document from a file, or stdin for `-`.
pub fn read_query(input: &str) -> error::Result<QueryLineage> {
    let raw = if input == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        buf
    } else {
        fs::read_to_string(input)?
    };
    Ok(serde_json::from_str(&raw)?)
}
