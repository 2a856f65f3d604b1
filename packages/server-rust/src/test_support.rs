//! Shared helpers for unit tests.

use std::io;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use axum::body::to_bytes;
use axum::response::Response;
use axum::Router;
use serde_json::Value;
use tokio::net::TcpListener;
use tracing::subscriber::DefaultGuard;

use crate::clients::{UpstreamClients, UpstreamConfig};
use crate::context::ContextStore;
use crate::network::{AppState, NetworkConfig, ShutdownController};

/// `AppState` with default configuration and clients pointing at the
/// default (unreachable in tests) upstream URLs.
pub(crate) fn test_state() -> AppState {
    test_state_with(|_| {})
}

/// Like [`test_state`], with the network configuration adjusted first.
pub(crate) fn test_state_with(configure: impl FnOnce(&mut NetworkConfig)) -> AppState {
    let mut config = NetworkConfig::default();
    configure(&mut config);
    AppState {
        contexts: Arc::new(ContextStore::new()),
        shutdown: Arc::new(ShutdownController::new()),
        clients: Arc::new(
            UpstreamClients::new(&UpstreamConfig::default()).expect("default clients build"),
        ),
        config: Arc::new(config),
        start_time: Instant::now(),
    }
}

/// Collects a response body and parses it as JSON.
pub(crate) async fn read_json(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body should be readable");
    serde_json::from_slice(&bytes).expect("body should be JSON")
}

/// Serves `router` on an ephemeral local port and returns its base URL.
pub(crate) async fn spawn_stub(router: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind stub listener");
    let addr = listener.local_addr().expect("stub address");
    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });
    format!("http://{addr}")
}

/// Base URL of a local port that nothing is listening on.
pub(crate) async fn unused_local_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind throwaway listener");
    let addr = listener.local_addr().expect("throwaway address");
    drop(listener);
    format!("http://{addr}")
}

/// In-memory sink for JSON log lines emitted on the current thread.
#[derive(Clone, Default)]
pub(crate) struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    /// Installs a JSON subscriber writing here as the thread default.
    ///
    /// Only covers code running on this thread, which under
    /// `#[tokio::test]` includes every spawned task.
    pub(crate) fn install(&self) -> DefaultGuard {
        let sink = self.clone();
        let subscriber = tracing_subscriber::fmt()
            .json()
            .with_max_level(tracing::Level::INFO)
            .with_writer(move || sink.clone())
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    /// Parsed log lines, oldest first.
    pub(crate) fn lines(&self) -> Vec<Value> {
        let bytes = self.0.lock().expect("log buffer lock").clone();
        String::from_utf8_lossy(&bytes)
            .lines()
            .filter_map(|line| serde_json::from_str(line).ok())
            .collect()
    }
}

impl io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().expect("log buffer lock").extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
