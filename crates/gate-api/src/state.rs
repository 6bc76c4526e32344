//! # Application State
//!
//! AppState holds:
//! - **Config**: port and schema input locations, read from the environment.
//! - **Schema gate**: the readiness slot for the [`ValidationSession`]. The
//!   server starts listening before the schema store is loaded; the slot is
//!   filled exactly once by the bootstrap loader.
//! - **Users**: in-memory records behind the demo users API.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use axum::extract::FromRef;
use gate_schema::ValidationSession;
use parking_lot::RwLock;
use tokio::sync::{Notify, OnceCell};
use uuid::Uuid;

use crate::routes::users::UserView;

// -- Generic In-Memory Store --------------------------------------------------

/// Thread-safe, cloneable in-memory key-value store.
///
/// The lock is `parking_lot`, not `tokio::sync`: it is never held across an
/// `.await`.
#[derive(Debug)]
pub struct Store<T: Clone + Send + Sync> {
    data: Arc<RwLock<HashMap<Uuid, T>>>,
}

impl<T: Clone + Send + Sync> Clone for Store<T> {
    fn clone(&self) -> Self {
        Self {
            data: Arc::clone(&self.data),
        }
    }
}

impl<T: Clone + Send + Sync> Store<T> {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            data: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Insert a record, returning the previous value if the key existed.
    pub fn insert(&self, id: Uuid, value: T) -> Option<T> {
        self.data.write().insert(id, value)
    }

    /// Retrieve a record by ID.
    pub fn get(&self, id: &Uuid) -> Option<T> {
        self.data.read().get(id).cloned()
    }

    /// List all records.
    pub fn list(&self) -> Vec<T> {
        self.data.read().values().cloned().collect()
    }

    /// Return the number of records.
    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T: Clone + Send + Sync> Default for Store<T> {
    fn default() -> Self {
        Self::new()
    }
}

// -- Schema Gate --------------------------------------------------------------

#[derive(Debug, Default)]
struct GateInner {
    slot: OnceCell<ValidationSession>,
    installed: Notify,
}

/// Readiness slot for the validation session.
///
/// Empty until [`install`](Self::install) is called. Extractors and the
/// response middleware read it with [`session`](Self::session) and reject
/// with 503 while it is empty; [`wait_ready`](Self::wait_ready) blocks
/// instead. Validation never runs against a partially built store: the
/// session is installed whole or not at all.
#[derive(Debug, Clone, Default)]
pub struct SchemaGate {
    inner: Arc<GateInner>,
}

impl SchemaGate {
    /// An empty gate.
    pub fn new() -> Self {
        Self::default()
    }

    /// A gate that is ready from the start.
    pub fn ready(session: ValidationSession) -> Self {
        let gate = Self::new();
        gate.install(session);
        gate
    }

    /// Fill the slot. Returns false if a session was already installed; the
    /// first one stays.
    pub fn install(&self, session: ValidationSession) -> bool {
        let installed = self.inner.slot.set(session).is_ok();
        if installed {
            self.inner.installed.notify_waiters();
        } else {
            tracing::warn!("schema gate already installed; ignoring second session");
        }
        installed
    }

    /// The installed session, if any.
    pub fn session(&self) -> Option<&ValidationSession> {
        self.inner.slot.get()
    }

    /// Whether a session is installed.
    pub fn is_ready(&self) -> bool {
        self.inner.slot.initialized()
    }

    /// Wait until a session is installed.
    pub async fn wait_ready(&self) -> ValidationSession {
        loop {
            let notified = self.inner.installed.notified();
            if let Some(session) = self.inner.slot.get() {
                return session.clone();
            }
            notified.await;
        }
    }
}

// -- Configuration ------------------------------------------------------------

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Port to bind the HTTP server to.
    pub port: u16,
    /// OpenAPI document to validate against. `None` uses the document
    /// generated from this crate's own routes.
    pub schema_document: Option<PathBuf>,
    /// Optional field-metadata table.
    pub field_metadata: Option<PathBuf>,
    /// Type names opted out of validation.
    pub exclude: Vec<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            schema_document: None,
            field_metadata: None,
            exclude: Vec::new(),
        }
    }
}

impl AppConfig {
    /// Read `PORT`, `GATE_SCHEMA_DOCUMENT`, `GATE_FIELD_METADATA` and
    /// `GATE_EXCLUDE` (comma-separated) from the environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let port = lookup("PORT").and_then(|p| p.parse().ok()).unwrap_or(8080);
        let path = |key: &str| lookup(key).filter(|v| !v.trim().is_empty()).map(PathBuf::from);
        let exclude = lookup("GATE_EXCLUDE")
            .map(|list| {
                list.split(',')
                    .map(str::trim)
                    .filter(|name| !name.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();
        Self {
            port,
            schema_document: path("GATE_SCHEMA_DOCUMENT"),
            field_metadata: path("GATE_FIELD_METADATA"),
            exclude,
        }
    }
}

// -- AppState -----------------------------------------------------------------

/// Shared state of every handler.
#[derive(Debug, Clone, Default)]
pub struct AppState {
    pub config: AppConfig,
    pub gate: SchemaGate,
    pub users: Store<UserView>,
}

impl AppState {
    /// State with an empty schema gate; requests that need validation get
    /// 503 until the bootstrap loader installs a session.
    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            gate: SchemaGate::new(),
            users: Store::new(),
        }
    }

    /// State whose gate is ready from the start.
    pub fn with_session(config: AppConfig, session: ValidationSession) -> Self {
        Self {
            config,
            gate: SchemaGate::ready(session),
            users: Store::new(),
        }
    }
}

impl FromRef<AppState> for SchemaGate {
    fn from_ref(state: &AppState) -> Self {
        state.gate.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gate_schema::{SchemaDocument, SchemaStore};
    use serde_json::json;
    use std::time::Duration;

    fn session() -> ValidationSession {
        let document = SchemaDocument::from_value(&json!({ "Empty": { "type": "object" } })).unwrap();
        ValidationSession::new(SchemaStore::builder().document(document).build())
    }

    #[test]
    fn config_defaults() {
        let config = AppConfig::from_lookup(|_| None);
        assert_eq!(config.port, 8080);
        assert!(config.schema_document.is_none());
        assert!(config.exclude.is_empty());
    }

    #[test]
    fn config_reads_exclusions_and_paths() {
        let config = AppConfig::from_lookup(|key| match key {
            "PORT" => Some("9090".into()),
            "GATE_SCHEMA_DOCUMENT" => Some("/etc/gate/openapi.yaml".into()),
            "GATE_FIELD_METADATA" => Some("  ".into()),
            "GATE_EXCLUDE" => Some(" LegacyBlob, ,Archive ".into()),
            _ => None,
        });
        assert_eq!(config.port, 9090);
        assert_eq!(config.schema_document, Some(PathBuf::from("/etc/gate/openapi.yaml")));
        assert!(config.field_metadata.is_none());
        assert_eq!(config.exclude, vec!["LegacyBlob", "Archive"]);
    }

    #[test]
    fn invalid_port_falls_back() {
        let config = AppConfig::from_lookup(|key| (key == "PORT").then(|| "http".to_string()));
        assert_eq!(config.port, 8080);
    }

    #[test]
    fn gate_installs_once() {
        let gate = SchemaGate::new();
        assert!(!gate.is_ready());
        assert!(gate.session().is_none());
        assert!(gate.install(session()));
        assert!(!gate.install(session()));
        assert!(gate.is_ready());
    }

    #[test]
    fn clones_share_the_slot() {
        let gate = SchemaGate::new();
        let clone = gate.clone();
        gate.install(session());
        assert!(clone.is_ready());
    }

    #[tokio::test]
    async fn wait_ready_unblocks_on_install() {
        let gate = SchemaGate::new();
        let waiter = {
            let gate = gate.clone();
            tokio::spawn(async move { gate.wait_ready().await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(!waiter.is_finished());
        gate.install(session());
        let session = tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(session.store().type_names().len(), 1);
    }

    #[test]
    fn store_insert_and_get() {
        let store: Store<String> = Store::new();
        let id = Uuid::new_v4();
        assert!(store.is_empty());
        store.insert(id, "a".into());
        assert_eq!(store.get(&id), Some("a".to_string()));
        assert_eq!(store.list().len(), 1);
    }
}
