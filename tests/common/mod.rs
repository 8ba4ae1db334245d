//! Test helpers for integration tests.
//!
//! Provides a TestServer running a real RPC server on a loopback port with a
//! temporary storage root.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;
use tokio::sync::oneshot;
use tonic::transport::Channel;

use filedock::config::LimitsConfig;
use filedock::proto::file_service_client::FileServiceClient;
use filedock::{
    AdmissionController, FileClient, FileServer, FileStorage, FileTransferService,
    DEFAULT_CHUNK_SIZE,
};

/// Default timeout for test operations.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// A running server plus the handles tests need to inspect it.
pub struct TestServer {
    addr: SocketAddr,
    service: FileTransferService,
    root: PathBuf,
    shutdown: Option<oneshot::Sender<()>>,
    _temp_dir: TempDir,
}

impl TestServer {
    /// Start a server with the default admission limits.
    pub async fn start() -> Self {
        Self::start_with(LimitsConfig::default()).await
    }

    /// Start a server with custom admission limits.
    pub async fn start_with(limits: LimitsConfig) -> Self {
        Self::start_configured(limits, DEFAULT_CHUNK_SIZE).await
    }

    /// Start a server that streams downloads in `chunk_size` frames.
    pub async fn start_with_chunk_size(chunk_size: usize) -> Self {
        Self::start_configured(LimitsConfig::default(), chunk_size).await
    }

    async fn start_configured(limits: LimitsConfig, chunk_size: usize) -> Self {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().join("uploads");
        let storage = Arc::new(FileStorage::new(&root).unwrap());
        let admission = Arc::new(AdmissionController::from_config(&limits));
        let service = FileTransferService::new(storage, admission).with_chunk_size(chunk_size);

        let server = FileServer::bind_addr("127.0.0.1:0", service.clone())
            .await
            .unwrap();
        let addr = server.local_addr().unwrap();

        let (tx, rx) = oneshot::channel::<()>();
        tokio::spawn(server.run_until(async {
            let _ = rx.await;
        }));

        Self {
            addr,
            service,
            root,
            shutdown: Some(tx),
            _temp_dir: temp_dir,
        }
    }

    pub fn endpoint(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Connect a new driver client.
    pub async fn client(&self) -> FileClient {
        FileClient::connect(self.endpoint()).await.unwrap()
    }

    /// Connect a generated client for frame-level tests.
    pub async fn raw_client(&self) -> FileServiceClient<Channel> {
        FileServiceClient::connect(self.endpoint()).await.unwrap()
    }

    pub fn admission(&self) -> &AdmissionController {
        self.service.admission()
    }

    pub fn storage_root(&self) -> &Path {
        &self.root
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}

/// Poll `condition` until it holds, panicking after [`DEFAULT_TIMEOUT`].
pub async fn wait_until<F: Fn() -> bool>(condition: F, what: &str) {
    let deadline = tokio::time::Instant::now() + DEFAULT_TIMEOUT;
    while !condition() {
        if tokio::time::Instant::now() >= deadline {
            panic!("timed out waiting for {what}");
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

/// Deterministic non-repeating test payload.
pub fn payload(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8).collect()
}
