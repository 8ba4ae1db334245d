//! TCP listener for the RPC server.

use std::future::Future;
use std::net::SocketAddr;

use tokio::net::TcpListener;
use tokio_stream::wrappers::TcpListenerStream;
use tonic::transport::Server;
use tracing::info;

use crate::admission::OperationClass;
use crate::config::Config;
use crate::service::FileTransferService;
use crate::Result;

/// RPC server that serves a [`FileTransferService`] on a bound TCP listener.
///
/// Each accepted call runs on its own tokio task.
pub struct FileServer {
    listener: TcpListener,
    service: FileTransferService,
}

impl FileServer {
    /// Create a new FileServer bound to the configured listen address.
    pub async fn bind(config: &Config, service: FileTransferService) -> Result<Self> {
        Self::bind_addr(&config.listen_addr(), service).await
    }

    /// Create a new FileServer bound to `addr` (`host:port`).
    pub async fn bind_addr(addr: &str, service: FileTransferService) -> Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        let local_addr = listener.local_addr()?;

        info!(
            addr = %local_addr,
            storage = %service.storage().root().display(),
            "file server listening"
        );

        Ok(Self { listener, service })
    }

    /// Get the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub fn service(&self) -> &FileTransferService {
        &self.service
    }

    /// Serve until `shutdown` resolves, then stop accepting calls and let the
    /// in-flight ones finish.
    pub async fn run_until<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send,
    {
        let admission = std::sync::Arc::clone(self.service.admission());
        info!(
            uploads = admission.capacity(OperationClass::Upload),
            downloads = admission.capacity(OperationClass::Download),
            listings = admission.capacity(OperationClass::List),
            "admission limits"
        );

        let incoming = TcpListenerStream::new(self.listener);

        Server::builder()
            .add_service(self.service.into_server())
            .serve_with_incoming_shutdown(incoming, shutdown)
            .await?;

        info!("file server stopped");
        Ok(())
    }
}
