//! HTTP connection to the graph database's Cypher endpoint.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};

use lineage_core::config::Neo4jSettings;

use crate::statements::Statement;

/// Path of the legacy Cypher endpoint, relative to the configured URL.
pub const CYPHER_PATH: &str = "/db/data/cypher";

/// Errors from graph operations.
#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    #[error("Graph client error: {0}")]
    Connection(String),

    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Cypher endpoint returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Raw response of one POST.
#[derive(Debug, Clone)]
pub struct TransportResponse {
    pub status: u16,
    pub body: String,
}

/// Sends one JSON body to the Cypher endpoint and waits for the response.
pub trait CypherTransport: Send + Sync {
    fn post(
        &self,
        url: &str,
        authorization: &str,
        body: &serde_json::Value,
    ) -> Result<TransportResponse, GraphError>;
}

/// Blocking reqwest transport.
pub struct HttpTransport {
    client: reqwest::blocking::Client,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> Result<Self, GraphError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GraphError::Connection(e.to_string()))?;
        Ok(Self { client })
    }
}

impl CypherTransport for HttpTransport {
    fn post(
        &self,
        url: &str,
        authorization: &str,
        body: &serde_json::Value,
    ) -> Result<TransportResponse, GraphError> {
        let resp = self
            .client
            .post(url)
            .header(AUTHORIZATION, authorization)
            .header(CONTENT_TYPE, "application/json")
            .body(serde_json::to_vec(body)?)
            .send()?;

        let status = resp.status().as_u16();
        let body = resp.text().unwrap_or_default();
        Ok(TransportResponse { status, body })
    }
}

/// Client for the graph database's Cypher HTTP endpoint.
///
/// Every statement is a separate synchronous POST; there is no batching and
/// no transaction spanning statements.
pub struct CypherClient {
    endpoint: String,
    authorization: String,
    transport: Box<dyn CypherTransport>,
}

impl CypherClient {
    /// Build a client backed by a blocking HTTP transport.
    pub fn connect(settings: &Neo4jSettings) -> Result<Self, GraphError> {
        let transport = HttpTransport::new(Duration::from_secs(settings.timeout_secs))?;
        let client = Self::with_transport(
            &settings.url,
            &settings.username,
            &settings.password,
            Box::new(transport),
        );
        tracing::info!(endpoint = %client.endpoint, "Graph client ready");
        Ok(client)
    }

    /// Build a client over any transport.
    pub fn with_transport(
        url: &str,
        username: &str,
        password: &str,
        transport: Box<dyn CypherTransport>,
    ) -> Self {
        Self {
            endpoint: format!("{}{CYPHER_PATH}", url.trim().trim_end_matches('/')),
            authorization: basic_auth(username, password),
            transport,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Execute one statement. Anything but a 200 is an error.
    pub fn run(&self, statement: &Statement) -> Result<(), GraphError> {
        let resp = self
            .transport
            .post(&self.endpoint, &self.authorization, &statement.to_body())?;

        if resp.status != 200 {
            return Err(GraphError::Status {
                status: resp.status,
                body: resp.body,
            });
        }
        Ok(())
    }
}

/// `Basic base64(username:password)`
pub fn basic_auth(username: &str, password: &str) -> String {
    format!("Basic {}", STANDARD.encode(format!("{username}:{password}")))
}

static SHARED_CLIENT: Mutex<Option<Arc<CypherClient>>> = Mutex::new(None);

/// Process-wide client, built on first use and kept for the life of the
/// process.
///
/// Only the settings of the first successful call are used; later calls get
/// the same client back whatever they pass.
pub fn shared_client(settings: &Neo4jSettings) -> Result<Arc<CypherClient>, GraphError> {
    let mut guard = SHARED_CLIENT
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());

    if let Some(client) = guard.as_ref() {
        return Ok(client.clone());
    }

    let client = Arc::new(CypherClient::connect(settings)?);
    *guard = Some(client.clone());
    Ok(client)
}
