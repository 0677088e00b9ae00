//! Lineage Graph — graph database sink for column lineage.
//!
//! Expands lineage edges into idempotent Cypher upserts and sends them, one
//! request per statement, to the database's HTTP Cypher endpoint.

pub mod client;
pub mod statements;
pub mod store;

pub use client::{shared_client, CypherClient, CypherTransport, GraphError, HttpTransport};
pub use statements::Statement;
pub use store::{Neo4jEdgeStore, StoreSummary};
