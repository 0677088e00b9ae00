//! Sink registry and fan-out.
//!
//! Sinks are looked up by identifier in an explicit table of constructors.
//! Resolution and dispatch are both best-effort: a sink that cannot be
//! built, or that fails to store, is logged and skipped.

use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use lineage_core::{Edge, EdgeStore, LineageConfig, LineageError, StoreError};
use lineage_graph::Neo4jEdgeStore;

use crate::jsonl::JsonLinesEdgeStore;

/// Builds and initializes a sink from configuration.
pub type StoreConstructor = fn(&LineageConfig) -> Result<Box<dyn EdgeStore>, StoreError>;

/// Class name the graph sink was historically configured under.
pub const LEGACY_NEO4J_CLASS: &str = "org.github.luikia.hive.lineage.store.Neo4JLineageEdgeStore";

fn neo4j_store(config: &LineageConfig) -> Result<Box<dyn EdgeStore>, StoreError> {
    let store =
        Neo4jEdgeStore::from_config(config).map_err(|e| StoreError::Init(e.to_string()))?;
    Ok(Box::new(store))
}

fn jsonl_store(config: &LineageConfig) -> Result<Box<dyn EdgeStore>, StoreError> {
    Ok(Box::new(JsonLinesEdgeStore::from_config(config)?))
}

/// Identifier → constructor table.
pub struct SinkRegistry {
    constructors: HashMap<String, StoreConstructor>,
}

impl Default for SinkRegistry {
    /// Registry with the built-in `neo4j` and `jsonl` sinks.
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register(Neo4jEdgeStore::NAME, neo4j_store);
        registry.register(LEGACY_NEO4J_CLASS, neo4j_store);
        registry.register(JsonLinesEdgeStore::NAME, jsonl_store);
        registry
    }
}

impl SinkRegistry {
    pub fn empty() -> Self {
        Self {
            constructors: HashMap::new(),
        }
    }

    /// Add or replace the constructor for `id`.
    pub fn register(&mut self, id: impl Into<String>, constructor: StoreConstructor) {
        self.constructors.insert(id.into(), constructor);
    }

    pub fn contains(&self, id: &str) -> bool {
        self.constructors.contains_key(id)
    }

    /// Build one sink.
    pub fn create(
        &self,
        id: &str,
        config: &LineageConfig,
    ) -> Result<Box<dyn EdgeStore>, LineageError> {
        let constructor = self
            .constructors
            .get(id)
            .ok_or_else(|| LineageError::UnknownSink(id.to_string()))?;
        constructor(config).map_err(|source| LineageError::Sink {
            sink: id.to_string(),
            source,
        })
    }

    /// Build every sink listed in `lineage.store.classes`, in order.
    ///
    /// Unknown identifiers and failing or panicking constructors are logged
    /// and left out.
    pub fn resolve(&self, config: &LineageConfig) -> Vec<Arc<dyn EdgeStore>> {
        let mut sinks: Vec<Arc<dyn EdgeStore>> = Vec::new();
        for id in config.store.identifiers() {
            match catch_unwind(AssertUnwindSafe(|| self.create(id, config))) {
                Ok(Ok(sink)) => {
                    tracing::info!(sink = id, "Lineage sink initialized");
                    sinks.push(Arc::from(sink));
                }
                Ok(Err(e)) => tracing::error!(sink = id, error = %e, "Lineage sink unavailable"),
                Err(_) => {
                    tracing::error!(sink = id, "Lineage sink panicked during initialization")
                }
            }
        }
        sinks
    }
}

/// Outcome of fanning one edge list out to every sink.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchReport {
    pub succeeded: usize,
    pub failed: usize,
}

/// Hand `edges` to every sink. Each sink is called regardless of what the
/// previous ones did; errors and panics are logged and counted.
pub fn dispatch(sinks: &[Arc<dyn EdgeStore>], edges: &[Edge]) -> DispatchReport {
    let mut report = DispatchReport::default();

    for sink in sinks {
        match catch_unwind(AssertUnwindSafe(|| sink.store(edges))) {
            Ok(Ok(())) => report.succeeded += 1,
            Ok(Err(e)) => {
                report.failed += 1;
                tracing::error!(sink = sink.name(), error = %e, "Lineage sink failed");
            }
            Err(_) => {
                report.failed += 1;
                tracing::error!(sink = sink.name(), "Lineage sink panicked");
            }
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use lineage_core::config::StoreSettings;

    use super::*;

    struct Named(&'static str);

    impl EdgeStore for Named {
        fn name(&self) -> &str {
            self.0
        }

        fn store(&self, _edges: &[Edge]) -> Result<(), StoreError> {
            Ok(())
        }
    }

    fn alpha(_: &LineageConfig) -> Result<Box<dyn EdgeStore>, StoreError> {
        Ok(Box::new(Named("alpha")))
    }

    fn beta(_: &LineageConfig) -> Result<Box<dyn EdgeStore>, StoreError> {
        Ok(Box::new(Named("beta")))
    }

    fn broken(_: &LineageConfig) -> Result<Box<dyn EdgeStore>, StoreError> {
        Err(StoreError::Init("no backend".into()))
    }

    fn exploding(_: &LineageConfig) -> Result<Box<dyn EdgeStore>, StoreError> {
        panic!("client built inside a runtime");
    }

    fn config_with(classes: &str) -> LineageConfig {
        LineageConfig {
            store: StoreSettings {
                classes: classes.to_string(),
            },
            ..Default::default()
        }
    }

    #[test]
    fn builtins_are_registered() {
        let registry = SinkRegistry::default();
        assert!(registry.contains("neo4j"));
        assert!(registry.contains("jsonl"));
        assert!(registry.contains(LEGACY_NEO4J_CLASS));
    }

    #[test]
    fn resolve_keeps_configured_order() {
        let mut registry = SinkRegistry::empty();
        registry.register("alpha", alpha);
        registry.register("beta", beta);

        let sinks = registry.resolve(&config_with("beta, alpha"));
        let names: Vec<&str> = sinks.iter().map(|s| s.name()).collect();
        assert_eq!(names, vec!["beta", "alpha"]);
    }

    #[test]
    fn resolve_drops_unknown_and_failing_sinks() {
        let mut registry = SinkRegistry::empty();
        registry.register("alpha", alpha);
        registry.register("broken", broken);

        let sinks = registry.resolve(&config_with("missing,broken,alpha"));
        assert_eq!(sinks.len(), 1);
        assert_eq!(sinks[0].name(), "alpha");
    }

    #[test]
    fn resolve_survives_panicking_constructor() {
        let mut registry = SinkRegistry::empty();
        registry.register("exploding", exploding);
        registry.register("alpha", alpha);

        let sinks = registry.resolve(&config_with("exploding,alpha"));
        assert_eq!(sinks.len(), 1);
        assert_eq!(sinks[0].name(), "alpha");
    }

    #[test]
    fn create_reports_unknown_sink() {
        let registry = SinkRegistry::empty();
        let err = registry.create("nope", &LineageConfig::default()).err().unwrap();
        assert!(matches!(err, LineageError::UnknownSink(id) if id == "nope"));
    }

    #[test]
    fn create_wraps_constructor_failure() {
        let mut registry = SinkRegistry::empty();
        registry.register("broken", broken);
        let err = registry.create("broken", &LineageConfig::default()).err().unwrap();
        assert!(matches!(err, LineageError::Sink { sink, .. } if sink == "broken"));
    }

    #[test]
    fn empty_classes_resolve_to_no_sinks() {
        let registry = SinkRegistry::default();
        assert!(registry.resolve(&config_with("")).is_empty());
    }
}
