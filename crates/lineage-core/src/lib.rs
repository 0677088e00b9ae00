//! lineage-core: Column lineage graph model and builder.
//!
//! This crate provides the pieces shared by every lineage component:
//! - Vertex and edge types for the lineage graph
//! - The per-query input handed over by the query engine
//! - The graph builder (vertex cache, edge merging, target naming)
//! - The `EdgeStore` sink contract
//! - Configuration and error types

pub mod builder;
pub mod cache;
pub mod config;
pub mod error;
pub mod input;
pub mod store;
pub mod types;

pub use builder::{target_field_name, GraphBuilder, LocationSkip};
pub use cache::VertexCache;
pub use config::LineageConfig;
pub use error::{LineageError, StoreError};
pub use input::QueryLineage;
pub use store::EdgeStore;
pub use types::{Edge, EdgeKind, Vertex, VertexKind, VertexSet};
