//! Integration tests for lineage-graph.
//!
//! Most tests drive `Neo4jEdgeStore` through a recording transport. The
//! live test needs a graph database exposing the legacy Cypher endpoint:
//! cargo test --package lineage-graph --test integration -- --ignored

use std::sync::{Arc, Mutex};

use lineage_core::config::Neo4jSettings;
use lineage_core::input::{BaseColumn, Dependency, OutputLocation, QueryLineage, TableDesc};
use lineage_core::{Edge, EdgeStore, GraphBuilder};
use lineage_graph::client::TransportResponse;
use lineage_graph::statements::{COLUMN_DEP_COLUMN, COLUMN_UPSERT, TABLE_UPSERT};
use lineage_graph::{CypherClient, CypherTransport, GraphError, Neo4jEdgeStore};

#[derive(Debug, Clone)]
struct Request {
    url: String,
    authorization: String,
    body: serde_json::Value,
}

/// Records every request; answers with `statuses` in order, then 200.
#[derive(Default)]
struct RecordingTransport {
    requests: Arc<Mutex<Vec<Request>>>,
    statuses: Mutex<Vec<Result<u16, String>>>,
}

impl RecordingTransport {
    fn with_responses(statuses: Vec<Result<u16, String>>) -> Self {
        Self {
            requests: Arc::default(),
            statuses: Mutex::new(statuses.into_iter().rev().collect()),
        }
    }
}

impl CypherTransport for RecordingTransport {
    fn post(
        &self,
        url: &str,
        authorization: &str,
        body: &serde_json::Value,
    ) -> Result<TransportResponse, GraphError> {
        self.requests.lock().unwrap().push(Request {
            url: url.to_string(),
            authorization: authorization.to_string(),
            body: body.clone(),
        });
        match self.statuses.lock().unwrap().pop() {
            Some(Ok(status)) => Ok(TransportResponse {
                status,
                body: "{\"errors\":[\"boom\"]}".to_string(),
            }),
            Some(Err(msg)) => Err(GraphError::Connection(msg)),
            None => Ok(TransportResponse {
                status: 200,
                body: String::new(),
            }),
        }
    }
}

fn recording_store(
    statuses: Vec<Result<u16, String>>,
) -> (Neo4jEdgeStore, Arc<Mutex<Vec<Request>>>) {
    let transport = RecordingTransport::with_responses(statuses);
    let requests = transport.requests.clone();
    let client = CypherClient::with_transport(
        "http://graph:7474",
        "neo4j",
        "secret",
        Box::new(transport),
    );
    (Neo4jEdgeStore::with_client(Arc::new(client)), requests)
}

fn sales_query() -> QueryLineage {
    let orders = TableDesc::new("db", "orders");
    let sales = TableDesc::new("db", "sales").with_columns(["amt"]);
    QueryLineage {
        locations: vec![OutputLocation {
            table: Some(sales),
            dependencies: Some(vec![Dependency::new(
                vec![BaseColumn::column(orders.clone(), "amount")],
                "amount*1.1",
            )]),
            predicates: vec![Dependency::new(
                vec![BaseColumn::column(orders, "status")],
                "(status = 'paid')",
            )],
        }],
        ..Default::default()
    }
}

fn built_edges() -> Vec<Edge> {
    GraphBuilder::new("etl-1").build(&sales_query())
}

#[test]
fn test_store_sends_statements_in_order() {
    let (store, requests) = recording_store(vec![]);
    let edges = built_edges();
    assert_eq!(edges.len(), 2);

    store.store(&edges).unwrap();

    let requests = requests.lock().unwrap();
    // Predicate edge is skipped: 2 vertices x 2 statements + 1 DEP.
    assert_eq!(requests.len(), 5);

    let queries: Vec<&str> = requests
        .iter()
        .map(|r| r.body["query"].as_str().unwrap())
        .collect();
    assert_eq!(
        queries,
        vec![
            TABLE_UPSERT,
            COLUMN_UPSERT,
            TABLE_UPSERT,
            COLUMN_UPSERT,
            COLUMN_DEP_COLUMN
        ]
    );

    let dep = &requests[4];
    assert_eq!(dep.url, "http://graph:7474/db/data/cypher");
    assert_eq!(dep.authorization, "Basic bmVvNGo6c2VjcmV0");
    assert_eq!(dep.body["params"]["slabel"], "db.orders.amount");
    assert_eq!(dep.body["params"]["tlabel"], "db.sales.amt");
    assert_eq!(dep.body["params"]["expr"], "amount*1.1");
    assert_eq!(dep.body["params"]["hql"], "etl-1");
}

#[test]
fn test_failed_statement_does_not_stop_the_rest() {
    let (store, requests) = recording_store(vec![
        Ok(200),
        Err("connection reset".to_string()),
        Ok(500),
    ]);

    let summary = store.write_edges(&built_edges());

    assert_eq!(summary.executed, 3);
    assert_eq!(summary.failed, 2);
    assert_eq!(requests.lock().unwrap().len(), 5);
}

#[test]
fn test_store_is_best_effort() {
    let (store, _requests) = recording_store(vec![Ok(400), Ok(401), Ok(500), Ok(503), Ok(500)]);
    assert!(store.store(&built_edges()).is_ok());
}

#[test]
fn test_empty_edge_list_sends_nothing() {
    let (store, requests) = recording_store(vec![]);
    store.store(&[]).unwrap();
    assert!(requests.lock().unwrap().is_empty());
}

#[test]
#[ignore = "requires a live graph database with the /db/data/cypher endpoint"]
fn test_live_upsert_is_idempotent() {
    let settings = Neo4jSettings {
        url: std::env::var("LINEAGE_NEO4J_URL").unwrap_or_else(|_| "http://localhost:7474".into()),
        password: std::env::var("LINEAGE_NEO4J_PASSWORD").unwrap_or_default(),
        ..Default::default()
    };
    let client = match CypherClient::connect(&settings) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Skipping live test: {e}");
            return;
        }
    };
    let store = Neo4jEdgeStore::with_client(Arc::new(client));
    let edges = built_edges();

    let first = store.write_edges(&edges);
    let second = store.write_edges(&edges);
    assert_eq!(first.failed, 0);
    assert_eq!(second.failed, 0);
    assert_eq!(first.executed, second.executed);
}
