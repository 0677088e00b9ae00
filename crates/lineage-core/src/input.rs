//! What the query engine hands over after a query finishes.
//!
//! The engine has already resolved, per output column, which base columns
//! and which expression produced it. These types only carry that result;
//! they are plain serde structs so a captured query can be replayed from
//! JSON.

use serde::{Deserialize, Serialize};

/// A named field of a schema (result column, table column or partition key).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct FieldSchema {
    pub name: String,
    #[serde(default)]
    pub comment: Option<String>,
}

impl FieldSchema {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            comment: None,
        }
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }
}

/// A table known to the metastore.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TableDesc {
    pub database: String,
    pub name: String,
    /// Declared data columns, in order.
    #[serde(default)]
    pub columns: Vec<FieldSchema>,
    /// Declared partition keys, in order.
    #[serde(default)]
    pub partition_keys: Vec<FieldSchema>,
    /// Session-scoped temporary table. Lineage through these is not tracked.
    #[serde(default)]
    pub temporary: bool,
}

impl TableDesc {
    pub fn new(database: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns = columns.into_iter().map(FieldSchema::new).collect();
        self
    }

    pub fn with_partition_keys<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.partition_keys = keys.into_iter().map(FieldSchema::new).collect();
        self
    }

    pub fn temporary(mut self) -> Self {
        self.temporary = true;
        self
    }

    /// `db.table`
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.database, self.name)
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }
}

/// A column (or a whole table, when `column` is absent) read by the query.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BaseColumn {
    pub table: TableDesc,
    #[serde(default)]
    pub column: Option<FieldSchema>,
}

impl BaseColumn {
    pub fn column(table: TableDesc, column: impl Into<String>) -> Self {
        Self {
            table,
            column: Some(FieldSchema::new(column)),
        }
    }

    pub fn whole_table(table: TableDesc) -> Self {
        Self {
            table,
            column: None,
        }
    }
}

/// The base columns an output column (or predicate) depends on, and the
/// expression combining them.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Dependency {
    #[serde(default)]
    pub base_columns: Vec<BaseColumn>,
    #[serde(default)]
    pub expr: Option<String>,
}

impl Dependency {
    pub fn new(base_columns: Vec<BaseColumn>, expr: impl Into<String>) -> Self {
        Self {
            base_columns,
            expr: Some(expr.into()),
        }
    }
}

/// One final projection of the query and where it is written.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct OutputLocation {
    /// Destination table, absent for ad-hoc result sets.
    #[serde(default)]
    pub table: Option<TableDesc>,
    /// Dependency of each output field, by field position.
    #[serde(default)]
    pub dependencies: Option<Vec<Dependency>>,
    /// Filters that gated every row of this output.
    #[serde(default)]
    pub predicates: Vec<Dependency>,
}

/// Kind of entity written by the query.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WriteEntityKind {
    Table,
    Partition,
    Other,
}

/// An entity the query writes to.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WriteEntity {
    pub kind: WriteEntityKind,
    #[serde(default)]
    pub table: Option<TableDesc>,
}

/// Operation the query performed.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum QueryOperation {
    #[default]
    Query,
    CreateTableAsSelect,
    AlterViewAs,
    CreateView,
    Other(String),
}

impl QueryOperation {
    /// Whether this operation produces column lineage.
    pub fn produces_lineage(&self) -> bool {
        !matches!(self, Self::Other(_))
    }
}

/// Everything captured for one finished query.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct QueryLineage {
    #[serde(default)]
    pub operation: QueryOperation,
    /// EXPLAIN statements never run and never produce lineage.
    #[serde(default)]
    pub explain: bool,
    #[serde(default)]
    pub result_schema: Vec<FieldSchema>,
    #[serde(default)]
    pub outputs: Vec<WriteEntity>,
    #[serde(default)]
    pub locations: Vec<OutputLocation>,
}

impl QueryLineage {
    /// First table written by the query, used when a location does not
    /// name its own destination.
    pub fn written_table(&self) -> Option<&TableDesc> {
        self.outputs
            .iter()
            .filter(|o| matches!(o.kind, WriteEntityKind::Table | WriteEntityKind::Partition))
            .find_map(|o| o.table.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserialize_minimal_query() {
        let json = r#"{
            "result_schema": [{"name": "amt"}],
            "locations": [{
                "table": {"database": "db", "name": "sales", "columns": [{"name": "amt"}]},
                "dependencies": [{
                    "base_columns": [{
                        "table": {"database": "db", "name": "orders"},
                        "column": {"name": "amount", "comment": "gross"}
                    }],
                    "expr": "amount*1.1"
                }]
            }]
        }"#;

        let q: QueryLineage = serde_json::from_str(json).unwrap();
        assert_eq!(q.operation, QueryOperation::Query);
        assert!(!q.explain);
        let loc = &q.locations[0];
        assert_eq!(loc.table.as_ref().unwrap().qualified_name(), "db.sales");
        let dep = &loc.dependencies.as_ref().unwrap()[0];
        assert_eq!(dep.expr.as_deref(), Some("amount*1.1"));
        assert!(!dep.base_columns[0].table.temporary);
    }

    #[test]
    fn other_operations_do_not_produce_lineage() {
        assert!(QueryOperation::CreateTableAsSelect.produces_lineage());
        assert!(QueryOperation::CreateView.produces_lineage());
        assert!(!QueryOperation::Other("DROPTABLE".into()).produces_lineage());
    }

    #[test]
    fn written_table_skips_non_table_outputs() {
        let q = QueryLineage {
            outputs: vec![
                WriteEntity {
                    kind: WriteEntityKind::Other,
                    table: Some(TableDesc::new("tmp", "dir")),
                },
                WriteEntity {
                    kind: WriteEntityKind::Partition,
                    table: Some(TableDesc::new("db", "events")),
                },
            ],
            ..Default::default()
        };
        assert_eq!(q.written_table().unwrap().qualified_name(), "db.events");
    }
}
