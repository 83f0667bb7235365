//! Mock API server lifecycle.
//!
//! bind → spawn background task → return handle with shutdown channel.
//! Binds loopback on an ephemeral port unless told otherwise.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;

use tokio::sync::oneshot;

use crate::api::router::build_router;
use crate::api::types::ApiContext;
use crate::backend::MockBackend;

/// Handle to a running mock server. Dropping it stops the server.
pub struct MockServer {
    pub addr: SocketAddr,
    pub started_at: chrono::DateTime<chrono::Utc>,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl MockServer {
    /// Base URL to hand to `ClientConfig`, including the `/api` prefix.
    pub fn base_url(&self) -> String {
        format!("http://{}/api", self.addr)
    }

    /// Shut down the server gracefully.
    pub fn shutdown(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
            tracing::info!(addr = %self.addr, "Mock API server shutdown signal sent");
        }
    }
}

impl Drop for MockServer {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Start the mock server on `127.0.0.1` with an ephemeral port.
pub async fn start_mock_server(
    backend: Arc<MockBackend>,
    required_token: Option<&str>,
) -> Result<MockServer, String> {
    start_mock_server_on(backend, required_token, IpAddr::V4(Ipv4Addr::LOCALHOST), 0).await
}

pub async fn start_mock_server_on(
    backend: Arc<MockBackend>,
    required_token: Option<&str>,
    ip: IpAddr,
    port: u16,
) -> Result<MockServer, String> {
    let listener = tokio::net::TcpListener::bind(SocketAddr::new(ip, port))
        .await
        .map_err(|e| format!("Failed to bind mock API server: {e}"))?;

    let addr = listener
        .local_addr()
        .map_err(|e| format!("Failed to get server address: {e}"))?;

    let mut ctx = ApiContext::new(backend);
    if let Some(token) = required_token {
        ctx = ctx.with_required_token(token);
    }
    let app = build_router(ctx);

    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

    tokio::spawn(async move {
        let shutdown_signal = async move {
            let _ = shutdown_rx.await;
        };

        tracing::info!(%addr, "Mock API server started");

        if let Err(e) = axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal)
            .await
        {
            tracing::error!("Mock API server error: {e}");
        }

        tracing::info!(%addr, "Mock API server stopped");
    });

    Ok(MockServer {
        addr,
        started_at: chrono::Utc::now(),
        shutdown_tx: Some(shutdown_tx),
    })
}

// ═══════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::backend::{fetch_all, Backend, BackendError, HttpBackend, Resource};
    use crate::config::ClientConfig;
    use crate::models::{Department, Doctor};

    #[tokio::test]
    async fn start_and_stop_server() {
        let mut server = start_mock_server(Arc::new(MockBackend::new()), None)
            .await
            .expect("server should start");
        assert!(server.addr.port() > 0);

        let url = format!("{}/health", server.base_url());
        let resp = reqwest::get(&url).await.unwrap();
        assert!(resp.status().is_success());

        server.shutdown();
        tokio::time::sleep(Duration::from_millis(50)).await;
    }

    // The blocking client must run outside the async runtime, so these
    // tests own a runtime and drive the server from it.
    fn runtime() -> tokio::runtime::Runtime {
        tokio::runtime::Runtime::new().unwrap()
    }

    fn client_for(server: &MockServer) -> HttpBackend {
        HttpBackend::new(&ClientConfig::new(&server.base_url(), Duration::from_secs(5))).unwrap()
    }

    #[test]
    fn http_backend_reads_envelope_lists() {
        let rt = runtime();
        let backend = Arc::new(MockBackend::new());
        let server = rt.block_on(start_mock_server(backend, None)).unwrap();

        let client = client_for(&server);
        let doctors: Vec<Doctor> = fetch_all(&client, Resource::Doctors).unwrap();
        assert_eq!(doctors.len(), crate::backend::sample::doctors().len());

        let stats = client.stats().unwrap();
        assert_eq!(stats.total_doctors as usize, doctors.len());
    }

    #[test]
    fn http_backend_crud_round_trip() {
        let rt = runtime();
        let backend = Arc::new(MockBackend::empty());
        let server = rt.block_on(start_mock_server(backend.clone(), None)).unwrap();
        let client = client_for(&server);

        let department = Department {
            id: "DEP9".into(),
            name: "Neurology".into(),
            head: None,
            beds: 4,
        };
        let created: Department =
            crate::backend::create_record(&client, Resource::Departments, &department).unwrap();
        assert_eq!(created, department);

        let patched = client
            .patch(Resource::Departments, "DEP9", &serde_json::json!({"beds": 5}))
            .unwrap();
        assert_eq!(patched["beds"], 5);

        client.delete(Resource::Departments, "DEP9").unwrap();
        assert!(backend.list(Resource::Departments).unwrap().is_empty());

        let err = client.delete(Resource::Departments, "DEP9").unwrap_err();
        assert!(matches!(err, BackendError::NotFound(_)));
    }

    #[test]
    fn http_backend_forwards_bearer_token() {
        let rt = runtime();
        let server = rt
            .block_on(start_mock_server(Arc::new(MockBackend::new()), Some("tok-1")))
            .unwrap();

        let anonymous = client_for(&server);
        let err = anonymous.list(Resource::Users).unwrap_err();
        assert!(matches!(err, BackendError::Status { status: 401, .. }));

        let authed = client_for(&server).with_token("tok-1");
        assert!(!authed.list(Resource::Users).unwrap().is_empty());
    }

    #[test]
    fn offline_mock_surfaces_as_status_error() {
        let rt = runtime();
        let backend = Arc::new(MockBackend::new());
        let server = rt.block_on(start_mock_server(backend.clone(), None)).unwrap();
        backend.set_offline(true);

        let err = client_for(&server).list(Resource::Alerts).unwrap_err();
        assert!(matches!(err, BackendError::Status { status: 503, .. }));
    }
}
