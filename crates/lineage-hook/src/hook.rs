//! The post-execution entry point.
//!
//! Called once per finished query on the thread that ran it. Lineage capture
//! never fails the query: every problem ends up in the log and in the
//! returned [`HookOutcome`]. The only error surfaced to the caller is the
//! explicit `lineage.runsql.enable = false` policy abort.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use lineage_core::{EdgeStore, GraphBuilder, LineageConfig, LineageError, QueryLineage};

use crate::registry::{dispatch, SinkRegistry};

/// Why no lineage was recorded for a query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// `lineage.enable` is false.
    Disabled,
    /// The operation does not produce lineage, or the query was an EXPLAIN.
    NotApplicable,
    /// The build produced no edges.
    NoEdges,
    /// Graph construction blew up; the message is for the log.
    BuildFailed(String),
}

/// Result of running the hook for one query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HookOutcome {
    /// Edges were built and handed to the sinks.
    Recorded {
        edges: usize,
        sinks_succeeded: usize,
        sinks_failed: usize,
    },
    Skipped(SkipReason),
    /// Lineage was attempted but the query itself must not run.
    PolicyAbort { lineage: Box<HookOutcome> },
}

impl HookOutcome {
    /// `Err(PolicyAbort)` for a policy abort, `Ok(self)` otherwise.
    pub fn into_result(self) -> Result<HookOutcome, LineageError> {
        match self {
            Self::PolicyAbort { .. } => Err(LineageError::PolicyAbort),
            other => Ok(other),
        }
    }
}

pub struct LineageHook {
    config: LineageConfig,
    sinks: Vec<Arc<dyn EdgeStore>>,
}

impl LineageHook {
    pub fn new(config: LineageConfig, sinks: Vec<Arc<dyn EdgeStore>>) -> Self {
        Self { config, sinks }
    }

    /// Resolve the configured sinks once and keep them for every query.
    pub fn from_config(config: LineageConfig, registry: &SinkRegistry) -> Self {
        let sinks = if config.enable {
            registry.resolve(&config)
        } else {
            Vec::new()
        };
        Self::new(config, sinks)
    }

    pub fn config(&self) -> &LineageConfig {
        &self.config
    }

    pub fn sinks(&self) -> &[Arc<dyn EdgeStore>] {
        &self.sinks
    }

    pub fn run(&self, query: &QueryLineage) -> HookOutcome {
        if !self.config.enable {
            return HookOutcome::Skipped(SkipReason::Disabled);
        }

        let lineage = self.capture(query);

        if !self.config.runsql.enable {
            tracing::warn!("lineage.runsql.enable is false, job not run");
            return HookOutcome::PolicyAbort {
                lineage: Box::new(lineage),
            };
        }
        lineage
    }

    fn capture(&self, query: &QueryLineage) -> HookOutcome {
        if query.explain || !query.operation.produces_lineage() {
            tracing::debug!(
                operation = ?query.operation,
                explain = query.explain,
                "No lineage for query"
            );
            return HookOutcome::Skipped(SkipReason::NotApplicable);
        }

        let sql_id = self.config.sql_id.as_str();
        let built = catch_unwind(AssertUnwindSafe(|| GraphBuilder::new(sql_id).build(query)));

        let edges = match built {
            Ok(edges) => edges,
            Err(panic) => {
                let msg = panic_message(panic.as_ref());
                tracing::error!(
                    sql_id,
                    error = %msg,
                    "Failed to build lineage graph, query is not affected"
                );
                return HookOutcome::Skipped(SkipReason::BuildFailed(msg));
            }
        };

        if edges.is_empty() {
            return HookOutcome::Skipped(SkipReason::NoEdges);
        }

        let report = dispatch(&self.sinks, &edges);
        tracing::info!(
            sql_id,
            edges = edges.len(),
            sinks_succeeded = report.succeeded,
            sinks_failed = report.failed,
            "Lineage recorded"
        );

        HookOutcome::Recorded {
            edges: edges.len(),
            sinks_succeeded: report.succeeded,
            sinks_failed: report.failed,
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
