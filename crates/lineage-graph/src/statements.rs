//! Cypher upserts for the lineage graph.
//!
//! All statements use MERGE with create-or-touch semantics: `ctime` and
//! `mtime` are set when a node or relationship is created, only `mtime` is
//! refreshed when it already exists. Databases are keyed by name, tables by
//! (db, name), columns by label, and DEP relationships by (expr, hql).

use std::collections::BTreeMap;

use lineage_core::{Edge, EdgeKind, Vertex};

/// Ensure the database and table nodes and the HAVE_TABLE link between them.
pub const TABLE_UPSERT: &str = "MERGE (d:DATABASE{name:$db}) \
ON CREATE SET d+={name:$db,ctime:timestamp(),mtime:timestamp()} \
ON MATCH SET d+={mtime:timestamp()} \
MERGE (t:TABLE{name:$table,db:$db}) \
ON CREATE SET t+={name:$table,db:$db,ctime:timestamp(),mtime:timestamp()} \
ON MATCH SET t+={mtime:timestamp()} \
WITH d,t MERGE (d)-[r:HAVE_TABLE]->(t) \
ON CREATE SET r+={ctime:timestamp(),mtime:timestamp()} \
ON MATCH SET r+={mtime:timestamp()}";

/// Ensure the column node and the HAVE_COLUMN link from its table.
pub const COLUMN_UPSERT: &str = "MERGE (c:COLUMN{label:$label}) \
ON CREATE SET c+={label:$label,name:$col,table:$table,db:$db,comment:$comment,ctime:timestamp(),mtime:timestamp()} \
ON MATCH SET c+={mtime:timestamp()} \
MERGE (t:TABLE{name:$table,db:$db}) \
WITH c,t MERGE (t)-[r:HAVE_COLUMN]->(c) \
ON CREATE SET r+={ctime:timestamp(),mtime:timestamp()} \
ON MATCH SET r+={mtime:timestamp()}";

/// Ensure a DEP relationship from a source column to a target column.
pub const COLUMN_DEP_COLUMN: &str = "MATCH (cs:COLUMN{label:$slabel}) \
MATCH (ct:COLUMN{label:$tlabel}) \
WITH cs,ct MERGE (cs)-[r:DEP{expr:$expr,hql:$hql}]->(ct) \
ON CREATE SET r+={expr:$expr,hql:$hql,ctime:timestamp(),mtime:timestamp()} \
ON MATCH SET r+={mtime:timestamp()}";

/// Ensure a DEP relationship from a source column to a target table.
pub const COLUMN_DEP_TABLE: &str = "MATCH (cs:COLUMN{label:$slabel}) \
MATCH (ct:TABLE{db:$tdb,name:$ttable}) \
WITH cs,ct MERGE (cs)-[r:DEP{expr:$expr,hql:$hql}]->(ct) \
ON CREATE SET r+={expr:$expr,hql:$hql,ctime:timestamp(),mtime:timestamp()} \
ON MATCH SET r+={mtime:timestamp()}";

/// A Cypher template with its bound parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    pub query: &'static str,
    pub params: BTreeMap<&'static str, String>,
}

impl Statement {
    fn new(query: &'static str) -> Self {
        Self {
            query,
            params: BTreeMap::new(),
        }
    }

    fn param(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.params.insert(name, value.into());
        self
    }

    /// Request body for the Cypher endpoint.
    pub fn to_body(&self) -> serde_json::Value {
        serde_json::json!({
            "query": self.query,
            "params": self.params,
        })
    }
}

/// Statements ensuring a vertex exists: its table always, its column node
/// too when it is a column.
pub fn vertex_statements(vertex: &Vertex) -> Vec<Statement> {
    let db = vertex.database().unwrap_or_default();
    let table = vertex.table_name().unwrap_or_default();

    let mut out = vec![Statement::new(TABLE_UPSERT)
        .param("db", db)
        .param("table", table)];

    if vertex.is_column() {
        out.push(
            Statement::new(COLUMN_UPSERT)
                .param("label", vertex.label())
                .param("col", vertex.column_name().unwrap_or_default())
                .param("table", table)
                .param("db", db)
                .param("comment", vertex.comment()),
        );
    }
    out
}

/// Every statement needed to persist one edge, in execution order: vertex
/// upserts for all sources then all targets, then for each source its DEP
/// links to column targets followed by its DEP links to table targets.
///
/// Predicate edges produce nothing.
pub fn edge_statements(edge: &Edge) -> Vec<Statement> {
    if edge.kind() != EdgeKind::Projection {
        return Vec::new();
    }

    let sources = edge.sources();
    let targets = edge.targets();
    let mut out = Vec::with_capacity(
        2 * (sources.len() + targets.len()) + sources.len() * targets.len(),
    );

    for v in sources.iter().chain(targets.iter()) {
        out.extend(vertex_statements(v));
    }

    for s in sources {
        for t in targets.iter().filter(|t| t.is_column()) {
            out.push(
                Statement::new(COLUMN_DEP_COLUMN)
                    .param("slabel", s.label())
                    .param("tlabel", t.label())
                    .param("expr", edge.expr())
                    .param("hql", edge.hql()),
            );
        }
        for t in targets.iter().filter(|t| !t.is_column()) {
            out.push(
                Statement::new(COLUMN_DEP_TABLE)
                    .param("slabel", s.label())
                    .param("tdb", t.database().unwrap_or_default())
                    .param("ttable", t.table_name().unwrap_or_default())
                    .param("expr", edge.expr().trim())
                    .param("hql", edge.hql().trim()),
            );
        }
    }

    out
}
