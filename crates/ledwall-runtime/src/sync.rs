#![forbid(unsafe_code)]

//! Remote persistence.
//!
//! The editor never talks to the network directly; it holds an
//! `Arc<dyn RemoteSync>` and calls it from background tasks. Every call is
//! best-effort: the caller turns an error into a transient notice and does
//! not retry.
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────┐
//! │                 RemoteSync                 │
//! │  fetch_topology / fetch_config             │
//! │  push_position / push_layer / push_order   │
//! │  save_config                               │
//! └────────────────────────────────────────────┘
//!            │                       │
//!            ▼                       ▼
//!       MemorySync               HttpSync
//!   (canned documents,     (blocking reqwest,
//!    request journal)       feature = "http")
//! ```
//!
//! # Wire bodies
//!
//! | Call | Body |
//! |------|------|
//! | `push_position` | `{ "id": "3", "x": 55, "y": 105 }` |
//! | `push_layer` | `{ "name": "logo", "id": 2 }` |
//! | `push_order` | `{ "layer_list": ["bg", "logo"] }` |
//! | `save_config` | `{ "config": { "settings": {..}, "elements": {..} } }` |

use std::fmt;
use std::sync::RwLock;
use std::time::Duration;

use ledwall_core::geometry::WallPoint;
use ledwall_core::topology::TopologyDocument;
use ledwall_layers::{ConfigDocument, LayerChange, LayerId};
use serde::{Deserialize, Serialize};

// ─────────────────────────────────────────────────────────────────────────────
// Error Types
// ─────────────────────────────────────────────────────────────────────────────

/// Failures talking to the back end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// Connection, DNS, or timeout failure.
    Network(String),
    /// The server answered with a non-2xx status.
    Status { endpoint: String, status: u16 },
    /// The response body could not be decoded.
    Decode(String),
    /// The backend has nothing to serve for this request.
    Unavailable(String),
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Network(msg) => write!(f, "network error: {msg}"),
            Self::Status { endpoint, status } => {
                write!(f, "{endpoint} returned HTTP {status}")
            }
            Self::Decode(msg) => write!(f, "invalid response: {msg}"),
            Self::Unavailable(msg) => write!(f, "unavailable: {msg}"),
        }
    }
}

impl std::error::Error for TransportError {}

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, TransportError>;

// ─────────────────────────────────────────────────────────────────────────────
// Wire bodies
// ─────────────────────────────────────────────────────────────────────────────

/// New wall position of one element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionUpdate {
    /// Layer id, as a string.
    pub id: String,
    pub x: i32,
    pub y: i32,
}

impl PositionUpdate {
    #[must_use]
    pub fn new(layer: LayerId, wall: WallPoint) -> Self {
        Self {
            id: layer.to_string(),
            x: wall.x,
            y: wall.y,
        }
    }
}

/// New layer id of one element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerUpdate {
    pub name: String,
    pub id: u32,
}

impl From<&LayerChange> for LayerUpdate {
    fn from(change: &LayerChange) -> Self {
        Self {
            name: change.name.clone(),
            id: change.new.get(),
        }
    }
}

/// Full back-to-front order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerOrder {
    pub layer_list: Vec<String>,
}

/// Envelope for a full save.
#[derive(Debug, Serialize)]
pub struct SaveRequest<'a> {
    pub config: &'a ConfigDocument,
}

// ─────────────────────────────────────────────────────────────────────────────
// Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Endpoint layout of the back end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncConfig {
    /// Scheme, host and port, without a trailing slash.
    pub base_url: String,
    pub timeout: Duration,
    pub topology_path: String,
    pub config_path: String,
    pub position_path: String,
    pub save_path: String,
    pub order_path: String,
    pub layer_path: String,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:5000".to_string(),
            timeout: DEFAULT_TIMEOUT,
            topology_path: "/api/get-matrix-config".to_string(),
            config_path: "/api/get-yaml-config".to_string(),
            position_path: "/api/send-location".to_string(),
            save_path: "/set_yaml_Config".to_string(),
            order_path: "/api/set-layer-order".to_string(),
            layer_path: "/api/set-layer".to_string(),
        }
    }
}

impl SyncConfig {
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        self.base_url = base_url;
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Absolute URL for an endpoint path.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Trait
// ─────────────────────────────────────────────────────────────────────────────

/// Back-end persistence channel.
///
/// Implementations must be `Send + Sync`: calls happen from task threads.
pub trait RemoteSync: Send + Sync {
    /// Human-readable name for logging.
    fn name(&self) -> &str;

    fn fetch_topology(&self) -> SyncResult<TopologyDocument>;

    fn fetch_config(&self) -> SyncResult<ConfigDocument>;

    fn push_position(&self, update: &PositionUpdate) -> SyncResult<()>;

    fn save_config(&self, config: &ConfigDocument) -> SyncResult<()>;

    fn push_order(&self, order: &LayerOrder) -> SyncResult<()>;

    fn push_layer(&self, update: &LayerUpdate) -> SyncResult<()>;
}

// ─────────────────────────────────────────────────────────────────────────────
// Memory Sync (always available)
// ─────────────────────────────────────────────────────────────────────────────

/// One call recorded by [`MemorySync`].
#[derive(Debug, Clone, PartialEq)]
pub enum SyncRequest {
    FetchTopology,
    FetchConfig,
    Position(PositionUpdate),
    Save(ConfigDocument),
    Order(LayerOrder),
    Layer(LayerUpdate),
}

#[derive(Debug, Default)]
struct MemoryState {
    topology: Option<TopologyDocument>,
    config: Option<ConfigDocument>,
    failure: Option<TransportError>,
    journal: Vec<SyncRequest>,
}

/// In-process back end for tests and offline use.
///
/// Serves canned documents, remembers every request, and can be told to
/// fail. A successful `save_config` replaces the served configuration.
#[derive(Debug, Default)]
pub struct MemorySync {
    state: RwLock<MemoryState>,
}

impl MemorySync {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_topology(self, topology: TopologyDocument) -> Self {
        self.set_topology(topology);
        self
    }

    #[must_use]
    pub fn with_config(self, config: ConfigDocument) -> Self {
        self.set_config(config);
        self
    }

    pub fn set_topology(&self, topology: TopologyDocument) {
        if let Ok(mut state) = self.state.write() {
            state.topology = Some(topology);
        }
    }

    pub fn set_config(&self, config: ConfigDocument) {
        if let Ok(mut state) = self.state.write() {
            state.config = Some(config);
        }
    }

    /// Make every following call fail with `error` (`None` to recover).
    pub fn set_failure(&self, error: Option<TransportError>) {
        if let Ok(mut state) = self.state.write() {
            state.failure = error;
        }
    }

    /// Requests received so far, oldest first.
    #[must_use]
    pub fn requests(&self) -> Vec<SyncRequest> {
        self.state
            .read()
            .map(|s| s.journal.clone())
            .unwrap_or_default()
    }

    pub fn clear_requests(&self) {
        if let Ok(mut state) = self.state.write() {
            state.journal.clear();
        }
    }

    /// Configuration as last served or saved.
    #[must_use]
    pub fn config(&self) -> Option<ConfigDocument> {
        self.state.read().ok().and_then(|s| s.config.clone())
    }

    fn record<T>(
        &self,
        request: SyncRequest,
        respond: impl FnOnce(&mut MemoryState) -> SyncResult<T>,
    ) -> SyncResult<T> {
        let mut state = self
            .state
            .write()
            .map_err(|_| TransportError::Unavailable("lock poisoned".into()))?;
        state.journal.push(request);
        if let Some(error) = &state.failure {
            return Err(error.clone());
        }
        respond(&mut *state)
    }
}

impl RemoteSync for MemorySync {
    fn name(&self) -> &str {
        "MemorySync"
    }

    fn fetch_topology(&self) -> SyncResult<TopologyDocument> {
        self.record(SyncRequest::FetchTopology, |s| {
            s.topology
                .clone()
                .ok_or_else(|| TransportError::Unavailable("no topology loaded".into()))
        })
    }

    fn fetch_config(&self) -> SyncResult<ConfigDocument> {
        self.record(SyncRequest::FetchConfig, |s| {
            s.config
                .clone()
                .ok_or_else(|| TransportError::Unavailable("no configuration loaded".into()))
        })
    }

    fn push_position(&self, update: &PositionUpdate) -> SyncResult<()> {
        self.record(SyncRequest::Position(update.clone()), |_| Ok(()))
    }

    fn save_config(&self, config: &ConfigDocument) -> SyncResult<()> {
        self.record(SyncRequest::Save(config.clone()), |s| {
            s.config = Some(config.clone());
            Ok(())
        })
    }

    fn push_order(&self, order: &LayerOrder) -> SyncResult<()> {
        self.record(SyncRequest::Order(order.clone()), |_| Ok(()))
    }

    fn push_layer(&self, update: &LayerUpdate) -> SyncResult<()> {
        self.record(SyncRequest::Layer(update.clone()), |_| Ok(()))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// HTTP Sync (requires http feature)
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(feature = "http")]
mod http_sync {
    use super::*;
    use reqwest::blocking::{Client, Response};
    use serde::de::DeserializeOwned;
    use tracing::debug;

    /// Blocking HTTP client for the editor back end.
    #[derive(Debug, Clone)]
    pub struct HttpSync {
        client: Client,
        config: SyncConfig,
    }

    impl HttpSync {
        pub fn new(config: SyncConfig) -> SyncResult<Self> {
            let client = Client::builder()
                .timeout(config.timeout)
                .build()
                .map_err(|e| TransportError::Network(format!("http client init failed: {e}")))?;
            Ok(Self { client, config })
        }

        #[must_use]
        pub fn config(&self) -> &SyncConfig {
            &self.config
        }

        fn check(&self, path: &str, response: Response) -> SyncResult<Response> {
            let status = response.status();
            if !status.is_success() {
                return Err(TransportError::Status {
                    endpoint: path.to_string(),
                    status: status.as_u16(),
                });
            }
            Ok(response)
        }

        fn get_json<T: DeserializeOwned>(&self, path: &str) -> SyncResult<T> {
            let url = self.config.url(path);
            debug!(%url, "GET");
            let response = self
                .client
                .get(&url)
                .send()
                .map_err(|e| TransportError::Network(e.to_string()))?;
            self.check(path, response)?
                .json::<T>()
                .map_err(|e| TransportError::Decode(e.to_string()))
        }

        fn post_json<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> SyncResult<()> {
            let url = self.config.url(path);
            debug!(%url, "POST");
            let response = self
                .client
                .post(&url)
                .json(body)
                .send()
                .map_err(|e| TransportError::Network(e.to_string()))?;
            self.check(path, response).map(drop)
        }
    }

    impl RemoteSync for HttpSync {
        fn name(&self) -> &str {
            "HttpSync"
        }

        fn fetch_topology(&self) -> SyncResult<TopologyDocument> {
            self.get_json(&self.config.topology_path)
        }

        fn fetch_config(&self) -> SyncResult<ConfigDocument> {
            let value: serde_json::Value = self.get_json(&self.config.config_path)?;
            ConfigDocument::from_value(value).map_err(|e| TransportError::Decode(e.to_string()))
        }

        fn push_position(&self, update: &PositionUpdate) -> SyncResult<()> {
            self.post_json(&self.config.position_path, update)
        }

        fn save_config(&self, config: &ConfigDocument) -> SyncResult<()> {
            self.post_json(&self.config.save_path, &SaveRequest { config })
        }

        fn push_order(&self, order: &LayerOrder) -> SyncResult<()> {
            self.post_json(&self.config.order_path, order)
        }

        fn push_layer(&self, update: &LayerUpdate) -> SyncResult<()> {
            self.post_json(&self.config.layer_path, update)
        }
    }
}

#[cfg(feature = "http")]
pub use http_sync::HttpSync;
