//! Shared test utilities for Babel Core integration tests.

use std::net::SocketAddr;
use std::sync::Arc;

use babel_core::{Config, TranslationService, server};
use tempfile::TempDir;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

/// Catalog used by the integration tests.
pub const CATALOG: &str = r#"{
    "heb": {
        "arb": { "model_name": "opus-mt-he-ar", "special_tok": "ara" },
        "eng": { "model_name": "opus-mt-he-en" }
    },
    "arb": {
        "heb": { "model_name": "opus-mt-ar-he", "special_tok": "heb" }
    }
}"#;

/// A server running on an ephemeral port.
pub struct TestServer {
    /// Address the server listens on.
    pub addr: SocketAddr,
    /// The service behind the server.
    pub service: Arc<TranslationService>,
    shutdown_tx: oneshot::Sender<()>,
    handle: JoinHandle<()>,
    _catalog_dir: TempDir,
}

impl TestServer {
    /// Base URL of the server.
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Signal shutdown and wait for the server to stop.
    pub async fn stop(self) {
        let _ = self.shutdown_tx.send(());
        self.handle.await.expect("Server task panicked");
    }
}

/// Starts a mock-backed server with [`CATALOG`] written to a temporary file.
///
/// # Panics
/// Panics if the catalog cannot be written or the listener cannot bind.
pub async fn start_test_server() -> TestServer {
    let catalog_dir = TempDir::new().expect("Failed to create temp dir");
    let catalog_path = catalog_dir.path().join("translator_config.json");
    std::fs::write(&catalog_path, CATALOG).expect("Failed to write catalog");

    let mut config = Config::default();
    config.models.catalog_path = catalog_path;

    let service = Arc::new(TranslationService::from_config(&config).expect("Failed to build service"));
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("Failed to bind to port 0");
    let addr = listener.local_addr().unwrap();

    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
    let server_service = Arc::clone(&service);
    let handle = tokio::spawn(async move {
        server::serve(listener, server_service, async {
            let _ = shutdown_rx.await;
        })
        .await
        .expect("Server failed to run");
    });

    TestServer { addr, service, shutdown_tx, handle, _catalog_dir: catalog_dir }
}
