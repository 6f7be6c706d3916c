//! REST client for the SCADA backend.

use crate::error::ClientError;
use crate::metrics;
use crate::protocol::{self, Ack, AssignRequest, SetValueRequest};
use crate::tls;
use reqwest::{Method, RequestBuilder};
use scada_core::{
    BackupEntry, FlatTag, HealthReport, OpcSlot, Statistics, SystemStatus, TagDefinition,
    Validated, ValidationReport,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant, SystemTime};
use tracing::{debug, info, warn};
use url::Url;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8080";

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    /// `None` keeps the HTTP client's default (no overall timeout).
    pub timeout: Option<Duration>,
    /// Extra PEM trust roots for HTTPS backends.
    pub ca_cert: Option<PathBuf>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: None,
            ca_cert: None,
        }
    }
}

/// Reachability as last observed by any request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionStatus {
    pub online: bool,
    pub last_check: Option<SystemTime>,
}

#[derive(Debug, Default)]
struct Connection {
    online: AtomicBool,
    last_check: Mutex<Option<SystemTime>>,
}

/// Cheap to clone; clones share the connection state.
#[derive(Debug, Clone)]
pub struct ScadaClient {
    http: reqwest::Client,
    base_url: Url,
    connection: Arc<Connection>,
}

impl ScadaClient {
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        let base_url = Url::parse(config.base_url.trim())
            .map_err(|e| ClientError::InvalidUrl(format!("{}: {e}", config.base_url)))?;
        if base_url.cannot_be_a_base() {
            return Err(ClientError::InvalidUrl(config.base_url.clone()));
        }

        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        if let Some(path) = &config.ca_cert {
            for cert in tls::load_ca_certificates(path)? {
                builder = builder.add_root_certificate(cert);
            }
            info!(ca = %path.display(), "added backend trust roots");
        }
        let http = builder
            .build()
            .map_err(|e| ClientError::Build(e.to_string()))?;

        Ok(Self {
            http,
            base_url,
            connection: Arc::new(Connection::default()),
        })
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    pub fn connection_status(&self) -> ConnectionStatus {
        ConnectionStatus {
            online: self.connection.online.load(Ordering::Acquire),
            last_check: self
                .connection
                .last_check
                .lock()
                .map(|guard| *guard)
                .unwrap_or(None),
        }
    }

    pub fn is_online(&self) -> bool {
        self.connection.online.load(Ordering::Acquire)
    }

    // ------------------------------------------------------------------
    // System
    // ------------------------------------------------------------------

    pub async fn health(&self) -> Result<HealthReport, ClientError> {
        self.get_typed(&["health"]).await
    }

    pub async fn status(&self) -> Result<SystemStatus, ClientError> {
        self.get_typed(&["status"]).await
    }

    pub async fn statistics(&self) -> Result<Statistics, ClientError> {
        self.get_typed(&["statistics"]).await
    }

    // ------------------------------------------------------------------
    // Tags and templates
    // ------------------------------------------------------------------

    pub async fn tags(&self) -> Result<Vec<FlatTag>, ClientError> {
        self.get_collection(&["tags"], "tags").await
    }

    pub async fn tag(&self, name: &str) -> Result<Value, ClientError> {
        Ok(self.get(&["tag", name]).await?.payload)
    }

    /// Only validated definitions reach the backend.
    pub async fn create_tag(&self, definition: &TagDefinition<Validated>) -> Result<Ack, ClientError> {
        self.send(Method::POST, &["tags"], definition).await
    }

    pub async fn update_tag<B: Serialize + ?Sized>(
        &self,
        name: &str,
        document: &B,
    ) -> Result<Ack, ClientError> {
        self.send(Method::PUT, &["tag", name], document).await
    }

    /// Accepts parent names and `<parent>.<variable>` full names alike.
    pub async fn delete_tag(&self, name: &str) -> Result<Ack, ClientError> {
        let request = self.http.delete(self.endpoint(&["tag", name])?);
        self.execute(request, "DELETE", &path_of(&["tag", name])).await
    }

    pub async fn templates(&self) -> Result<Vec<Value>, ClientError> {
        self.get_collection(&["templates"], "templates").await
    }

    pub async fn template(&self, name: &str) -> Result<Value, ClientError> {
        Ok(self.get(&["template", name]).await?.payload)
    }

    // ------------------------------------------------------------------
    // OPC UA table
    // ------------------------------------------------------------------

    pub async fn opcua_table(&self) -> Result<Vec<OpcSlot>, ClientError> {
        self.get_collection(&["opcua-table"], "table").await
    }

    pub async fn set_opcua_value(&self, index: u32, value: f64) -> Result<Ack, ClientError> {
        let index = index.to_string();
        let segments = ["opcua-table", index.as_str()];
        self.send(Method::PUT, &segments, &SetValueRequest { value })
            .await
    }

    /// An empty `tag_name` clears the slot.
    pub async fn assign_opcua(&self, tag_name: &str, index: u32) -> Result<Ack, ClientError> {
        let body = AssignRequest {
            tag_name: tag_name.to_string(),
            index,
        };
        self.send(Method::POST, &["opcua-assign"], &body).await
    }

    // ------------------------------------------------------------------
    // Backups and configuration
    // ------------------------------------------------------------------

    pub async fn create_backup(&self) -> Result<Ack, ClientError> {
        let request = self.http.post(self.endpoint(&["backup"])?);
        self.execute(request, "POST", "/backup").await
    }

    pub async fn backups(&self) -> Result<Vec<BackupEntry>, ClientError> {
        self.get_collection(&["backups"], "backups").await
    }

    pub async fn restore_backup(&self, filename: &str) -> Result<Ack, ClientError> {
        let segments = ["backup", filename, "restore"];
        let request = self.http.post(self.endpoint(&segments)?);
        self.execute(request, "POST", &path_of(&segments)).await
    }

    /// Raw archive bytes; the body is not an envelope.
    pub async fn download_backup(&self, filename: &str) -> Result<Vec<u8>, ClientError> {
        let segments = ["backup", filename, "download"];
        let request = self.http.get(self.endpoint(&segments)?);
        self.fetch_bytes(request, "GET", &path_of(&segments)).await
    }

    pub async fn validate_config(&self) -> Result<ValidationReport, ClientError> {
        self.get_typed(&["validate-config"]).await
    }

    pub async fn config(&self) -> Result<Value, ClientError> {
        Ok(self.get(&["config"]).await?.payload)
    }

    pub async fn update_config(&self, config: &Value) -> Result<Ack, ClientError> {
        self.send(Method::PUT, &["config"], config).await
    }

    // ------------------------------------------------------------------
    // Plumbing
    // ------------------------------------------------------------------

    fn endpoint(&self, segments: &[&str]) -> Result<Url, ClientError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ClientError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get(&self, segments: &[&str]) -> Result<Ack, ClientError> {
        let request = self.http.get(self.endpoint(segments)?);
        self.execute(request, "GET", &path_of(segments)).await
    }

    async fn get_typed<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T, ClientError> {
        let path = path_of(segments);
        let ack = self.get(segments).await?;
        protocol::decode(&path, ack.payload)
    }

    async fn get_collection<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        key: &str,
    ) -> Result<Vec<T>, ClientError> {
        let path = path_of(segments);
        let ack = self.get(segments).await?;
        protocol::collection(&path, ack.payload, key)
    }

    async fn send<B: Serialize + ?Sized>(
        &self,
        method: Method,
        segments: &[&str],
        body: &B,
    ) -> Result<Ack, ClientError> {
        let label = method.to_string();
        let request = self.http.request(method, self.endpoint(segments)?).json(body);
        self.execute(request, &label, &path_of(segments)).await
    }

    async fn execute(
        &self,
        request: RequestBuilder,
        method: &str,
        path: &str,
    ) -> Result<Ack, ClientError> {
        let bytes = self.fetch_bytes(request, method, path).await?;
        let body = protocol::parse_body(path, &bytes)?;
        protocol::unwrap_envelope(path, body).inspect_err(|e| {
            if matches!(e, ClientError::Application { .. }) {
                metrics::APPLICATION_ERRORS.inc();
                warn!(method, endpoint = %path, error = %e, "backend rejected request");
            }
        })
    }

    async fn fetch_bytes(
        &self,
        request: RequestBuilder,
        method: &str,
        path: &str,
    ) -> Result<Vec<u8>, ClientError> {
        metrics::REQUESTS_TOTAL.inc();
        debug!(method, endpoint = %path, "backend request");
        let started = Instant::now();

        let response = match request.send().await {
            Ok(response) => response,
            Err(source) => {
                self.record_reachability(false);
                metrics::NETWORK_ERRORS.inc();
                warn!(method, endpoint = %path, error = %source, "backend unreachable");
                return Err(ClientError::Network {
                    endpoint: path.to_string(),
                    source,
                });
            }
        };
        metrics::REQUEST_DURATION_SECONDS.observe(started.elapsed().as_secs_f64());

        // Any HTTP status proves the backend is up.
        self.record_reachability(true);

        let status = response.status();
        if !status.is_success() {
            metrics::HTTP_ERRORS.inc();
            warn!(method, endpoint = %path, status = status.as_u16(), "backend returned error status");
            return Err(ClientError::Http {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or_default().to_string(),
            });
        }

        let bytes = response.bytes().await.map_err(|e| ClientError::Decode {
            endpoint: path.to_string(),
            detail: format!("failed to read body: {e}"),
        })?;
        debug!(method, endpoint = %path, status = status.as_u16(), bytes = bytes.len(), "backend response");
        Ok(bytes.to_vec())
    }

    fn record_reachability(&self, online: bool) {
        let was_online = self.connection.online.swap(online, Ordering::AcqRel);
        if let Ok(mut last_check) = self.connection.last_check.lock() {
            *last_check = Some(SystemTime::now());
        }
        metrics::BACKEND_ONLINE.set(i64::from(online));
        if was_online != online {
            debug!(online, "backend reachability changed");
        }
    }
}

/// Log label for an endpoint, unencoded.
fn path_of(segments: &[&str]) -> String {
    let mut path = String::new();
    for segment in segments {
        path.push('/');
        path.push_str(segment);
    }
    path
}
