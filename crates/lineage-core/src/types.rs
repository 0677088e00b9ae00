//! Core domain types for the lineage graph.
//!
//! A lineage graph is made of table and column vertices connected by
//! set-to-set edges. Both live only for the duration of one query's
//! graph-build pass; sinks derive whatever persistent identity they need
//! from the vertex label fields.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

// ── Vertices ──────────────────────────────────────────────────────

/// Kind of a lineage vertex.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VertexKind {
    Column,
    Table,
}

impl fmt::Display for VertexKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Column => write!(f, "COLUMN"),
            Self::Table => write!(f, "TABLE"),
        }
    }
}

/// A table (`db.table`) or column (`db.table.column`) in the lineage graph.
///
/// Equality and hashing only look at `label` and `kind`. The name parts are
/// derived from the label at construction and stay `None` when the label
/// does not have the arity its kind expects.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vertex {
    kind: VertexKind,
    label: String,
    database: Option<String>,
    table: Option<String>,
    column: Option<String>,
    comment: Option<String>,
}

impl Vertex {
    pub fn new(label: impl Into<String>, kind: VertexKind, comment: Option<String>) -> Self {
        let label = label.into();
        let parts: Vec<&str> = label.split('.').filter(|p| !p.is_empty()).collect();

        let (database, table, column) = match (kind, parts.as_slice()) {
            (VertexKind::Column, [db, tbl, col]) => (
                Some(db.to_string()),
                Some(tbl.to_string()),
                Some(col.to_string()),
            ),
            (VertexKind::Table, [db, tbl]) => {
                (Some(db.to_string()), Some(tbl.to_string()), Some(String::new()))
            }
            _ => (None, None, None),
        };

        Self {
            kind,
            label,
            database,
            table,
            column,
            comment,
        }
    }

    pub fn column(label: impl Into<String>, comment: Option<String>) -> Self {
        Self::new(label, VertexKind::Column, comment)
    }

    pub fn table(label: impl Into<String>) -> Self {
        Self::new(label, VertexKind::Table, None)
    }

    pub fn kind(&self) -> VertexKind {
        self.kind
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn database(&self) -> Option<&str> {
        self.database.as_deref()
    }

    pub fn table_name(&self) -> Option<&str> {
        self.table.as_deref()
    }

    pub fn column_name(&self) -> Option<&str> {
        self.column.as_deref()
    }

    /// The description attached at creation, or `""`.
    pub fn comment(&self) -> &str {
        self.comment.as_deref().unwrap_or_default()
    }

    pub fn is_column(&self) -> bool {
        self.kind == VertexKind::Column
    }
}

impl PartialEq for Vertex {
    fn eq(&self, other: &Self) -> bool {
        self.label == other.label && self.kind == other.kind
    }
}

impl Eq for Vertex {}

impl Hash for Vertex {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.label.hash(state);
        self.kind.hash(state);
    }
}

impl fmt::Display for Vertex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.kind, self.label)
    }
}

/// An insertion-ordered set of shared vertices.
///
/// Vertex sets inside one edge are tiny, so membership is a linear scan;
/// what matters is that iteration order is the order of first insertion.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VertexSet(Vec<Arc<Vertex>>);

impl VertexSet {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Insert a vertex; returns `false` if an equal vertex was already present.
    pub fn insert(&mut self, vertex: Arc<Vertex>) -> bool {
        if self.contains(&vertex) {
            return false;
        }
        self.0.push(vertex);
        true
    }

    pub fn extend<I: IntoIterator<Item = Arc<Vertex>>>(&mut self, vertices: I) {
        for v in vertices {
            self.insert(v);
        }
    }

    pub fn contains(&self, vertex: &Vertex) -> bool {
        self.0.iter().any(|v| v.as_ref() == vertex)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<Vertex>> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Order-independent identity of the set: sorted `(label, kind)` pairs.
    pub fn canonical_key(&self) -> Vec<(String, VertexKind)> {
        let mut key: Vec<(String, VertexKind)> = self
            .0
            .iter()
            .map(|v| (v.label.clone(), v.kind))
            .collect();
        key.sort();
        key
    }
}

impl PartialEq for VertexSet {
    /// Set equality, ignoring insertion order.
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.0.iter().all(|v| other.contains(v))
    }
}

impl Eq for VertexSet {}

impl FromIterator<Arc<Vertex>> for VertexSet {
    fn from_iter<I: IntoIterator<Item = Arc<Vertex>>>(iter: I) -> Self {
        let mut set = Self::new();
        set.extend(iter);
        set
    }
}

impl<'a> IntoIterator for &'a VertexSet {
    type Item = &'a Arc<Vertex>;
    type IntoIter = std::slice::Iter<'a, Arc<Vertex>>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

// ── Edges ─────────────────────────────────────────────────────────

/// How the sources of an edge relate to its targets.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EdgeKind {
    /// Sources are computed into the targets.
    Projection,
    /// Sources filter which rows reach the targets.
    Predicate,
}

impl fmt::Display for EdgeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Projection => write!(f, "PROJECTION"),
            Self::Predicate => write!(f, "PREDICATE"),
        }
    }
}

/// A directed dependency from a set of source vertices to a set of targets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Edge {
    sources: VertexSet,
    targets: VertexSet,
    expr: String,
    hql: String,
    kind: EdgeKind,
}

impl Edge {
    /// Build an edge. Single quotes are stripped from `expr` and `hql` is
    /// trimmed; absent values become empty strings.
    pub fn new(
        sources: VertexSet,
        targets: VertexSet,
        expr: Option<&str>,
        hql: Option<&str>,
        kind: EdgeKind,
    ) -> Self {
        Self {
            sources,
            targets,
            expr: normalize_expr(expr),
            hql: hql.map(str::trim).unwrap_or_default().to_string(),
            kind,
        }
    }

    pub fn sources(&self) -> &VertexSet {
        &self.sources
    }

    pub fn targets(&self) -> &VertexSet {
        &self.targets
    }

    pub fn expr(&self) -> &str {
        &self.expr
    }

    pub fn hql(&self) -> &str {
        &self.hql
    }

    pub fn kind(&self) -> EdgeKind {
        self.kind
    }

    /// Union more targets into this edge. Only used while an edge list is
    /// being built.
    pub(crate) fn merge_targets<'a, I>(&mut self, targets: I)
    where
        I: IntoIterator<Item = &'a Arc<Vertex>>,
    {
        self.targets.extend(targets.into_iter().cloned());
    }
}

/// Remove every single quote from an expression.
pub fn normalize_expr(expr: Option<&str>) -> String {
    expr.map(|e| e.replace('\'', "")).unwrap_or_default()
}
