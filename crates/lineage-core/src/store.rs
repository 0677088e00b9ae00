//! The contract every lineage sink implements.

use crate::error::StoreError;
use crate::types::Edge;

/// A destination for one query's edge list.
///
/// Implementations are constructed and initialized once, then shared by
/// every query for the life of the process, so `store` takes `&self`.
/// Failures are returned to the dispatcher, which logs them and moves on to
/// the next sink.
pub trait EdgeStore: Send + Sync {
    /// Identifier used in logs.
    fn name(&self) -> &str;

    /// Persist the edges of one query.
    fn store(&self, edges: &[Edge]) -> Result<(), StoreError>;
}
