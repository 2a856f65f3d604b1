//! Network module with deferred startup lifecycle.
//!
//! `new()` creates shared resources, `start()` binds the TCP listener, and
//! `serve()` accepts connections until the shutdown future resolves.

use std::future::{Future, IntoFuture};
use std::sync::Arc;
use std::time::Instant;

use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use tracing::{info, warn};

use super::config::NetworkConfig;
use super::handlers::{
    health_handler, liveness_handler, readiness_handler, transactions_handler, AppState,
};
use super::middleware::{build_http_layers, track_in_flight};
use super::shutdown::ShutdownController;
use crate::clients::UpstreamClients;
use crate::context::{request_context, ContextStore};

/// Manages the HTTP server lifecycle.
///
/// 1. `new()` -- allocates shared state (context store, shutdown controller)
/// 2. `start()` -- binds TCP listener to the configured address
/// 3. `serve()` -- accepts connections until shutdown is signalled
pub struct NetworkModule {
    config: NetworkConfig,
    listener: Option<TcpListener>,
    state: AppState,
}

impl NetworkModule {
    /// Creates a new network module without binding any port.
    #[must_use]
    pub fn new(config: NetworkConfig, clients: UpstreamClients) -> Self {
        let state = AppState {
            contexts: Arc::new(ContextStore::new()),
            shutdown: Arc::new(ShutdownController::new()),
            clients: Arc::new(clients),
            config: Arc::new(config.clone()),
            start_time: Instant::now(),
        };
        Self {
            config,
            listener: None,
            state,
        }
    }

    /// Shared correlation context store.
    #[must_use]
    pub fn contexts(&self) -> Arc<ContextStore> {
        Arc::clone(&self.state.contexts)
    }

    #[must_use]
    pub fn shutdown_controller(&self) -> Arc<ShutdownController> {
        Arc::clone(&self.state.shutdown)
    }

    /// Assembles the router with all routes and middleware.
    #[must_use]
    pub fn build_router(&self) -> Router {
        build_router(self.state.clone())
    }

    /// Binds the TCP listener to the configured host and port.
    ///
    /// Returns the bound port, which differs from the configured one when
    /// port 0 is used.
    ///
    /// # Errors
    ///
    /// Returns an error if the address cannot be bound.
    pub async fn start(&mut self) -> anyhow::Result<u16> {
        let addr = format!("{}:{}", self.config.host, self.config.port);
        let listener = TcpListener::bind(&addr).await?;
        let port = listener.local_addr()?.port();

        info!("TCP listener bound to {}:{}", self.config.host, port);

        self.listener = Some(listener);
        Ok(port)
    }

    /// Serves connections until `shutdown` resolves, then drains.
    ///
    /// Once the signal fires the health state is `Draining` (readiness
    /// answers 503) while open connections finish. When they have all closed
    /// the state becomes `Stopped`; connections still open after
    /// `drain_timeout` are abandoned.
    ///
    /// # Errors
    ///
    /// Returns an error if `start()` was not called or the server hits a
    /// fatal I/O error.
    pub async fn serve(self, shutdown: impl Future<Output = ()> + Send + 'static) -> anyhow::Result<()> {
        let Some(listener) = self.listener else {
            anyhow::bail!("start() must be called before serve()");
        };
        let router = build_router(self.state.clone());
        let controller = Arc::clone(&self.state.shutdown);
        let mut signalled = controller.shutdown_receiver();

        let signal_controller = Arc::clone(&controller);
        let server = axum::serve(listener, router)
            .with_graceful_shutdown(async move {
                shutdown.await;
                info!(
                    in_flight = signal_controller.in_flight_count(),
                    "Shutdown signal received, draining connections"
                );
                signal_controller.trigger_shutdown();
            })
            .into_future();

        controller.set_ready();
        info!("Serving HTTP connections");

        let drain_timeout = self.config.drain_timeout;
        let drain_deadline = async move {
            if signalled.wait_for(|&stopping| stopping).await.is_err() {
                std::future::pending::<()>().await;
            }
            tokio::time::sleep(drain_timeout).await;
        };

        tokio::select! {
            result = server => {
                result?;
                controller.mark_stopped();
                info!("All connections drained");
            }
            () = drain_deadline => {
                warn!(
                    in_flight = controller.in_flight_count(),
                    active_contexts = self.state.contexts.len(),
                    "Drain timeout expired, abandoning open connections"
                );
            }
        }
        Ok(())
    }
}

/// Routes:
/// - `GET /health`, `/health/live`, `/health/ready`
/// - `GET /api/accounts/{account_id}/transactions`
///
/// Layers, outermost first: in-flight tracking, request context, then the
/// transport stack from [`build_http_layers`].
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/health/live", get(liveness_handler))
        .route("/health/ready", get(readiness_handler))
        .route(
            "/api/accounts/{account_id}/transactions",
            get(transactions_handler),
        )
        .layer(build_http_layers(&state.config))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            request_context,
        ))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            track_in_flight,
        ))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::time::Duration;

    use axum::body::Body;
    use axum::extract::Query;
    use axum::http::{HeaderMap, Request, StatusCode};
    use axum::{Extension, Json};
    use selfservice_core::AuthenticatedUser;
    use serde_json::{json, Value};
    use tokio::sync::{oneshot, Notify};
    use tower::ServiceExt;

    use super::*;
    use crate::network::HealthState;
    use crate::clients::UpstreamConfig;
    use crate::test_support::{read_json, spawn_stub};

    /// What the stub ledger saw on each call.
    #[derive(Debug, Clone)]
    struct LedgerCall {
        x_request_id: Option<String>,
        query: HashMap<String, String>,
    }

    type Calls = Arc<Mutex<Vec<LedgerCall>>>;

    async fn stub_ledger(calls: Calls, total: u64) -> String {
        let router = Router::new().route(
            "/v1/transaction",
            get(move |headers: HeaderMap, Query(query): Query<HashMap<String, String>>| {
                let calls = Arc::clone(&calls);
                async move {
                    calls.lock().unwrap().push(LedgerCall {
                        x_request_id: headers
                            .get("x-request-id")
                            .and_then(|v| v.to_str().ok())
                            .map(ToString::to_string),
                        query,
                    });
                    Json(json!({
                        "total": total,
                        "count": 1,
                        "page": 1,
                        "results": [{
                            "transaction_id": "t-1",
                            "reference": "REF-1",
                            "amount": 1000,
                            "state": { "status": "success", "finished": true },
                            "created_date": "2026-10-01T10:00:00.000Z"
                        }]
                    }))
                }
            }),
        );
        spawn_stub(router).await
    }

    fn module_with_ledger(ledger_url: String) -> NetworkModule {
        let upstream = UpstreamConfig {
            ledger_url,
            ..UpstreamConfig::default()
        };
        NetworkModule::new(
            NetworkConfig::default(),
            UpstreamClients::new(&upstream).unwrap(),
        )
    }

    fn transactions_request(id: Option<&str>, query: &str) -> Request<Body> {
        let mut builder =
            Request::builder().uri(format!("/api/accounts/42/transactions{query}"));
        if let Some(id) = id {
            builder = builder.header("x-request-id", id);
        }
        builder.body(Body::empty()).unwrap()
    }

    fn user() -> AuthenticatedUser {
        AuthenticatedUser {
            external_id: "user-1".to_string(),
            email: "user@example.com".to_string(),
            features: vec!["f1".to_string()],
        }
    }

    #[test]
    fn new_creates_module_without_binding() {
        let module = NetworkModule::new(
            NetworkConfig::default(),
            UpstreamClients::new(&UpstreamConfig::default()).unwrap(),
        );
        assert!(module.listener.is_none());
        assert!(Arc::ptr_eq(&module.contexts(), &module.contexts()));
    }

    #[tokio::test]
    async fn start_binds_to_os_assigned_port() {
        let mut module = module_with_ledger("http://127.0.0.1:1".to_string());
        let port = module.start().await.expect("start should succeed");
        assert!(port > 0, "OS-assigned port should be > 0");
        assert!(module.listener.is_some());
    }

    #[tokio::test]
    async fn serve_without_start_is_an_error() {
        let module = module_with_ledger("http://127.0.0.1:1".to_string());
        let err = module.serve(std::future::ready(())).await.unwrap_err();
        assert!(err.to_string().contains("start()"));
    }

    #[tokio::test]
    async fn inbound_id_reaches_upstream_and_is_cleared_afterwards() {
        let calls = Calls::default();
        let module = module_with_ledger(stub_ledger(Arc::clone(&calls), 1).await);
        let contexts = module.contexts();
        let app = module.build_router().layer(Extension(user()));

        let response = app
            .oneshot(transactions_request(Some("abc123"), ""))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["x-request-id"], "abc123");
        let calls = calls.lock().unwrap().clone();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].x_request_id.as_deref(), Some("abc123"));
        assert_eq!(calls[0].query["account_id"], "42");
        assert!(contexts.is_empty());
    }

    #[tokio::test]
    async fn request_without_id_calls_upstream_without_header() {
        let calls = Calls::default();
        let module = module_with_ledger(stub_ledger(Arc::clone(&calls), 1).await);
        let contexts = module.contexts();

        let response = module
            .build_router()
            .oneshot(transactions_request(None, ""))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().get("x-request-id").is_none());
        assert!(calls.lock().unwrap()[0].x_request_id.is_none());
        assert!(contexts.is_empty());
    }

    #[tokio::test]
    async fn generated_id_is_sent_upstream_and_echoed() {
        let calls = Calls::default();
        let ledger = stub_ledger(Arc::clone(&calls), 1).await;
        let upstream = UpstreamConfig {
            ledger_url: ledger,
            ..UpstreamConfig::default()
        };
        let mut config = NetworkConfig::default();
        config.context.generate_missing = true;
        let module = NetworkModule::new(config, UpstreamClients::new(&upstream).unwrap());

        let response = module
            .build_router()
            .oneshot(transactions_request(None, ""))
            .await
            .unwrap();

        let echoed = response.headers()["x-request-id"].to_str().unwrap().to_string();
        assert_eq!(calls.lock().unwrap()[0].x_request_id.as_deref(), Some(echoed.as_str()));
    }

    #[tokio::test]
    async fn transactions_are_paginated() {
        let calls = Calls::default();
        let module = module_with_ledger(stub_ledger(Arc::clone(&calls), 450).await);

        let response = module
            .build_router()
            .oneshot(transactions_request(Some("req-2"), "?page=2&display_size=200"))
            .await
            .unwrap();
        let body: Value = read_json(response).await;

        assert_eq!(body["total"], 450);
        assert_eq!(body["page"], 2);
        assert_eq!(body["last_page"], 3);
        assert_eq!(body["page_size"], 200);
        assert_eq!(body["show_display_sizes"], true);
        assert_eq!(body["results"][0]["transaction_id"], "t-1");
        let call = calls.lock().unwrap()[0].clone();
        assert_eq!(call.query["page"], "2");
        assert_eq!(call.query["display_size"], "200");
    }

    #[tokio::test]
    async fn page_past_the_end_fetches_the_last_page() {
        let calls = Calls::default();
        let module = module_with_ledger(stub_ledger(Arc::clone(&calls), 250).await);

        let response = module
            .build_router()
            .oneshot(transactions_request(Some("req-3"), "?page=9"))
            .await
            .unwrap();
        let body: Value = read_json(response).await;

        assert_eq!(body["page"], 3);
        assert_eq!(body["last_page"], 3);
        let pages: Vec<String> = calls
            .lock()
            .unwrap()
            .iter()
            .map(|call| call.query["page"].clone())
            .collect();
        assert_eq!(pages, vec!["9", "3"]);
    }

    #[tokio::test]
    async fn non_numeric_account_is_rejected_without_upstream_call() {
        let calls = Calls::default();
        let module = module_with_ledger(stub_ledger(Arc::clone(&calls), 1).await);

        let request = Request::builder()
            .uri("/api/accounts/abc/transactions")
            .body(Body::empty())
            .unwrap();
        let response = module.build_router().oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn unreachable_ledger_is_bad_gateway() {
        let module = module_with_ledger(crate::test_support::unused_local_url().await);
        let response = module
            .build_router()
            .oneshot(transactions_request(Some("abc123"), ""))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        assert!(module.contexts().is_empty());
    }

    #[tokio::test]
    async fn serve_answers_health_and_drains() {
        let mut module = module_with_ledger("http://127.0.0.1:1".to_string());
        module.config.host = "127.0.0.1".to_string();
        let port = module.start().await.unwrap();
        let controller = module.shutdown_controller();

        let (tx, rx) = oneshot::channel::<()>();
        let server = tokio::spawn(module.serve(async move {
            let _ = rx.await;
        }));

        let body: Value = reqwest::get(format!("http://127.0.0.1:{port}/health"))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(body["state"], "ready");

        tx.send(()).unwrap();
        server.await.unwrap().unwrap();
        assert_eq!(controller.health_state(), HealthState::Stopped);
    }

    /// Ledger whose search blocks until `release` is notified.
    async fn blocking_ledger(entered: Arc<Notify>, release: Arc<Notify>) -> String {
        let router = Router::new().route(
            "/v1/transaction",
            get(move || {
                let entered = Arc::clone(&entered);
                let release = Arc::clone(&release);
                async move {
                    entered.notify_one();
                    release.notified().await;
                    Json(json!({ "total": 0, "count": 0, "page": 1, "results": [] }))
                }
            }),
        );
        spawn_stub(router).await
    }

    async fn wait_for_state(controller: &ShutdownController, expected: HealthState) {
        tokio::time::timeout(Duration::from_secs(5), async {
            while controller.health_state() != expected {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("health state never changed");
    }

    /// A module being served in the background with a blocking ledger.
    struct Served {
        port: u16,
        app: Router,
        controller: Arc<ShutdownController>,
        signal: oneshot::Sender<()>,
        server: tokio::task::JoinHandle<anyhow::Result<()>>,
        entered: Arc<Notify>,
        release: Arc<Notify>,
    }

    async fn serve_with_blocking_ledger(drain_timeout: Duration) -> Served {
        let entered = Arc::new(Notify::new());
        let release = Arc::new(Notify::new());
        let ledger = blocking_ledger(Arc::clone(&entered), Arc::clone(&release)).await;
        let mut module = module_with_ledger(ledger);
        module.config.host = "127.0.0.1".to_string();
        module.config.drain_timeout = drain_timeout;
        let port = module.start().await.unwrap();
        let controller = module.shutdown_controller();
        let app = module.build_router();

        let (tx, rx) = oneshot::channel::<()>();
        let server = tokio::spawn(module.serve(async move {
            let _ = rx.await;
        }));
        Served {
            port,
            app,
            controller,
            signal: tx,
            server,
            entered,
            release,
        }
    }

    #[tokio::test]
    async fn readiness_fails_while_in_flight_requests_drain() {
        let Served {
            port,
            app,
            controller,
            signal: tx,
            server,
            entered,
            release,
        } = serve_with_blocking_ledger(Duration::from_secs(30)).await;
        let pending = tokio::spawn(reqwest::get(format!(
            "http://127.0.0.1:{port}/api/accounts/42/transactions"
        )));
        entered.notified().await;

        tx.send(()).unwrap();
        wait_for_state(&controller, HealthState::Draining).await;
        assert_eq!(controller.in_flight_count(), 1);

        let ready = app
            .oneshot(Request::builder().uri("/health/ready").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(ready.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert!(!server.is_finished());

        release.notify_one();
        let response = pending.await.unwrap().unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        server.await.unwrap().unwrap();
        assert_eq!(controller.health_state(), HealthState::Stopped);
        assert_eq!(controller.in_flight_count(), 0);
    }

    #[tokio::test]
    async fn drain_timeout_abandons_stuck_connections() {
        let Served {
            port,
            controller,
            signal: tx,
            server,
            entered,
            ..
        } = serve_with_blocking_ledger(Duration::from_millis(100)).await;
        let pending = tokio::spawn(reqwest::get(format!(
            "http://127.0.0.1:{port}/api/accounts/42/transactions"
        )));
        entered.notified().await;

        tx.send(()).unwrap();
        tokio::time::timeout(Duration::from_secs(5), server)
            .await
            .expect("serve should return after the drain timeout")
            .unwrap()
            .unwrap();
        assert_eq!(controller.health_state(), HealthState::Draining);
        pending.abort();
    }
}
