//! Edge sink writing PROJECTION lineage to the graph database.

use std::sync::Arc;

use lineage_core::{Edge, EdgeStore, LineageConfig, StoreError};

use crate::client::{shared_client, CypherClient, GraphError};
use crate::statements::edge_statements;

/// Counts from one `store` call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreSummary {
    pub executed: usize,
    pub failed: usize,
}

/// Graph database sink.
///
/// Statements are sent one by one and a failed statement never stops the
/// ones after it, so a partially written edge is possible.
pub struct Neo4jEdgeStore {
    client: Arc<CypherClient>,
}

impl Neo4jEdgeStore {
    pub const NAME: &'static str = "neo4j";

    /// Sink over the process-wide shared client.
    pub fn from_config(config: &LineageConfig) -> Result<Self, GraphError> {
        Ok(Self {
            client: shared_client(&config.neo4j)?,
        })
    }

    /// Sink over a caller-provided client.
    pub fn with_client(client: Arc<CypherClient>) -> Self {
        Self { client }
    }

    /// Send every statement for `edges`, logging and counting failures.
    pub fn write_edges(&self, edges: &[Edge]) -> StoreSummary {
        let mut summary = StoreSummary::default();

        for stmt in edges.iter().flat_map(edge_statements) {
            match self.client.run(&stmt) {
                Ok(()) => summary.executed += 1,
                Err(e) => {
                    summary.failed += 1;
                    tracing::error!(
                        error = %e,
                        query = stmt.query,
                        params = ?stmt.params,
                        "Cypher statement failed"
                    );
                }
            }
        }

        summary
    }
}

impl EdgeStore for Neo4jEdgeStore {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn store(&self, edges: &[Edge]) -> Result<(), StoreError> {
        let summary = self.write_edges(edges);
        if summary.failed > 0 {
            tracing::warn!(
                executed = summary.executed,
                failed = summary.failed,
                "Lineage partially written to graph"
            );
        } else {
            tracing::info!(executed = summary.executed, "Lineage written to graph");
        }
        Ok(())
    }
}
