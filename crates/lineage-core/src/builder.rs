//! Turns one query's dependency records into a deduplicated edge list.
//!
//! For every output location the builder resolves the destination name and
//! field list, reconciles dynamic partition columns, then emits one
//! PROJECTION edge per output field and one PREDICATE edge per filter.
//! Edges sharing kind, expression, query id and source set are merged by
//! unioning their targets.

use std::collections::HashMap;
use std::sync::Arc;

use crate::cache::VertexCache;
use crate::input::{BaseColumn, FieldSchema, OutputLocation, QueryLineage};
use crate::types::{normalize_expr, Edge, EdgeKind, Vertex, VertexKind, VertexSet};

/// Identity used to merge edges: kind, expression, query id and the
/// canonical (sorted) source labels.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct EdgeKey {
    kind: EdgeKind,
    expr: String,
    hql: String,
    sources: Vec<(String, VertexKind)>,
}

/// Why an output location produced no edges.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocationSkip {
    /// More dependencies than fields, and not enough partition keys to
    /// account for the difference.
    MissingPartitionKeys { needed: usize, available: usize },
    /// Dependency count does not match field count.
    FieldCountMismatch { fields: usize, dependencies: usize },
}

/// Builds the edge list for a single query.
///
/// A builder holds the vertex cache and edge index for one pass; create a
/// fresh one per query.
#[derive(Debug)]
pub struct GraphBuilder {
    hql: String,
    cache: VertexCache,
    edges: Vec<Edge>,
    index: HashMap<EdgeKey, usize>,
    skipped: Vec<(usize, LocationSkip)>,
}

impl GraphBuilder {
    /// `hql` is the query id attached to every edge.
    pub fn new(hql: impl Into<String>) -> Self {
        Self {
            hql: hql.into().trim().to_string(),
            cache: VertexCache::new(),
            edges: Vec::new(),
            index: HashMap::new(),
            skipped: Vec::new(),
        }
    }

    /// Build all edges for `query`, consuming the builder.
    pub fn build(self, query: &QueryLineage) -> Vec<Edge> {
        self.build_with_report(query).0
    }

    /// Same as [`build`](Self::build) but also returns the locations that
    /// were skipped and why.
    pub fn build_with_report(
        mut self,
        query: &QueryLineage,
    ) -> (Vec<Edge>, Vec<(usize, LocationSkip)>) {
        for (i, location) in query.locations.iter().enumerate() {
            if let Err(skip) = self.add_location(query, location) {
                tracing::warn!(location = i, reason = ?skip, "Skipping output location");
                self.skipped.push((i, skip));
            }
        }
        (self.edges, self.skipped)
    }

    fn add_location(
        &mut self,
        query: &QueryLineage,
        location: &OutputLocation,
    ) -> Result<(), LocationSkip> {
        let mut fields: Vec<FieldSchema> = query.result_schema.clone();
        let mut col_names: Option<Vec<String>> = None;

        let table = match &location.table {
            Some(t) => {
                // Declared columns carry the real names; the result schema
                // may only have internal aliases.
                fields = t.columns.clone();
                Some(t)
            }
            None => {
                let written = query.written_table();
                if let Some(t) = written {
                    if !t.columns.is_empty() {
                        col_names = Some(t.column_names());
                    }
                }
                written
            }
        };
        let dest = table.map(|t| t.qualified_name());

        let dependencies = location.dependencies.as_deref().unwrap_or_default();

        if let Some(t) = table {
            if dependencies.len() > fields.len() {
                // Trailing dependencies belong to dynamic partition columns.
                let needed = dependencies.len() - fields.len();
                let available = t.partition_keys.len();
                if needed > available {
                    return Err(LocationSkip::MissingPartitionKeys { needed, available });
                }
                for key in &t.partition_keys[available - needed..] {
                    fields.push(key.clone());
                    if let Some(names) = col_names.as_mut() {
                        names.push(key.name.clone());
                    }
                }
            }
        }

        if dependencies.is_empty() || dependencies.len() != fields.len() {
            return Err(LocationSkip::FieldCountMismatch {
                fields: fields.len(),
                dependencies: dependencies.len(),
            });
        }

        let mut targets = VertexSet::new();
        for (i, dep) in dependencies.iter().enumerate() {
            let name = target_field_name(i, dest.as_deref(), col_names.as_deref(), &fields);
            let comment = fields[i].comment.as_deref();
            let target = self.cache.get_or_create(&name, VertexKind::Column, comment);
            targets.insert(target.clone());

            let single: VertexSet = std::iter::once(target).collect();
            self.add_edge(&dep.base_columns, single, dep.expr.as_deref(), EdgeKind::Projection);
        }

        for predicate in &location.predicates {
            self.add_edge(
                &predicate.base_columns,
                targets.clone(),
                predicate.expr.as_deref(),
                EdgeKind::Predicate,
            );
        }

        tracing::debug!(
            destination = dest.as_deref().unwrap_or("<ad-hoc>"),
            fields = fields.len(),
            predicates = location.predicates.len(),
            "Output location processed"
        );
        Ok(())
    }

    /// Create an edge or merge `targets` into an existing one with the same
    /// kind, expression, query id and source set.
    fn add_edge(
        &mut self,
        base_columns: &[BaseColumn],
        targets: VertexSet,
        expr: Option<&str>,
        kind: EdgeKind,
    ) {
        let sources = self.source_vertices(base_columns);
        let key = EdgeKey {
            kind,
            expr: normalize_expr(expr),
            hql: self.hql.clone(),
            sources: sources.canonical_key(),
        };

        match self.index.get(&key) {
            Some(&i) => self.edges[i].merge_targets(&targets),
            None => {
                self.index.insert(key, self.edges.len());
                self.edges
                    .push(Edge::new(sources, targets, expr, Some(self.hql.as_str()), kind));
            }
        }
    }

    /// Resolve base columns to cached vertices, dropping temporary tables.
    fn source_vertices(&mut self, base_columns: &[BaseColumn]) -> VertexSet {
        let mut sources = VertexSet::new();
        for col in base_columns {
            if col.table.temporary {
                continue;
            }
            let table_name = col.table.qualified_name();
            let vertex: Arc<Vertex> = match &col.column {
                Some(field) => self.cache.get_or_create(
                    &format!("{table_name}.{}", field.name),
                    VertexKind::Column,
                    field.comment.as_deref(),
                ),
                None => self.cache.get_or_create(&table_name, VertexKind::Table, None),
            };
            sources.insert(vertex);
        }
        sources
    }
}

/// Normalized name of the target column at `index`.
///
/// With a destination table the result is `dest.column`, where the column is
/// the last dotted segment of the field name unless `col_names` is given and
/// does not contain it, in which case the name at the same position in
/// `col_names` is used. Without a destination, an engine-internal `_uN.col`
/// alias is reduced to `col` and anything else is returned unchanged.
pub fn target_field_name(
    index: usize,
    dest: Option<&str>,
    col_names: Option<&[String]>,
    fields: &[FieldSchema],
) -> String {
    let field_name = fields.get(index).map(|f| f.name.as_str()).unwrap_or_default();
    let parts: Vec<&str> = field_name.split('.').filter(|p| !p.is_empty()).collect();
    let last = parts.last().copied().unwrap_or(field_name);

    if let Some(dest) = dest {
        let col = match col_names {
            Some(names) if !names.iter().any(|n| n == last) => {
                names.get(index).map(String::as_str).unwrap_or(last)
            }
            _ => last,
        };
        if col.is_empty() {
            tracing::debug!(destination = dest, index, "Output field has no name");
        }
        return format!("{dest}.{col}");
    }

    if parts.len() == 2 && parts[0].starts_with("_u") {
        return parts[1].to_string();
    }
    field_name.to_string()
}
