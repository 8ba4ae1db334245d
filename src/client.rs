//! Client driver for the file transfer service.
//!
//! Speaks the same framing as the server: uploads send an info frame followed
//! by chunk frames, downloads are reassembled with [`DownloadAssembler`].

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tonic::transport::Channel;
use tonic::Request;
use tracing::{debug, warn};

use crate::file::FileMetadata;
use crate::proto::file_service_client::FileServiceClient;
use crate::proto::{DownloadRequest, ListRequest};
use crate::transfer::{upload_frames, DownloadAssembler, DownloadedFile, DEFAULT_CHUNK_SIZE};
use crate::{FiledockError, Result};

/// Server acknowledgement of a completed upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadOutcome {
    pub filename: String,
    pub size: u64,
    pub message: String,
}

/// Handle to a filedock server.
///
/// Cloning is cheap and clones share the underlying channel, so one client
/// can drive many calls concurrently.
#[derive(Debug, Clone)]
pub struct FileClient {
    inner: FileServiceClient<Channel>,
    chunk_size: usize,
}

impl FileClient {
    /// Connect to the server at `endpoint` (e.g. `http://localhost:50051`).
    pub async fn connect(endpoint: impl Into<String>) -> Result<Self> {
        let inner = FileServiceClient::connect(endpoint.into()).await?;
        Ok(Self::from_client(inner))
    }

    /// Build a client over an existing channel.
    pub fn new(channel: Channel) -> Self {
        Self::from_client(FileServiceClient::new(channel))
    }

    fn from_client(inner: FileServiceClient<Channel>) -> Self {
        // Download frames are as large as the server's configured chunk size
        Self {
            inner: inner.max_decoding_message_size(usize::MAX),
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }

    /// Set the size of the chunk frames uploads are split into.
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    /// Upload `data` under `filename`, replacing any existing file.
    pub async fn upload_bytes(&self, filename: &str, data: &[u8]) -> Result<UploadOutcome> {
        let frames = upload_frames(filename, data, self.chunk_size);
        debug!(filename, size = data.len(), frames = frames.len(), "uploading");

        let response = self
            .inner
            .clone()
            .upload_file(tokio_stream::iter(frames))
            .await?
            .into_inner();

        Ok(UploadOutcome {
            filename: response.filename,
            size: response.size,
            message: response.message,
        })
    }

    /// Upload a local file, stored under its final path component.
    pub async fn upload_path(&self, path: &Path) -> Result<UploadOutcome> {
        let filename = path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| {
                FiledockError::InvalidArgument(format!(
                    "{} has no usable file name",
                    path.display()
                ))
            })?;
        let data = tokio::fs::read(path).await?;

        self.upload_bytes(filename, &data).await
    }

    /// Upload many local files with at most `max_in_flight` calls running at
    /// once.
    ///
    /// Unlike the server's admission gate this waits for a free slot instead
    /// of failing. Results are in completion order.
    pub async fn upload_batch(
        &self,
        paths: Vec<PathBuf>,
        max_in_flight: usize,
    ) -> Vec<(PathBuf, Result<UploadOutcome>)> {
        let slots = Arc::new(Semaphore::new(max_in_flight.max(1)));
        let mut tasks = JoinSet::new();

        for path in paths {
            let Ok(permit) = Arc::clone(&slots).acquire_owned().await else {
                break;
            };
            let client = self.clone();
            tasks.spawn(async move {
                let _permit = permit;
                let result = client.upload_path(&path).await;
                (path, result)
            });
        }

        let mut results = Vec::with_capacity(tasks.len());
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(result) => results.push(result),
                Err(e) => warn!(error = %e, "upload task panicked"),
            }
        }
        results
    }

    /// List every stored file.
    ///
    /// The deadline is sent to the server with the request and enforced
    /// locally; on expiry the call is abandoned, which cancels it server-side.
    pub async fn list_files(&self, timeout: Duration) -> Result<Vec<FileMetadata>> {
        let mut request = Request::new(ListRequest {});
        request.set_timeout(timeout);

        let mut client = self.inner.clone();
        let response = tokio::time::timeout(timeout, client.list_files(request))
            .await
            .map_err(|_| FiledockError::Timeout(format!("listing exceeded {timeout:?}")))??;

        Ok(response
            .into_inner()
            .files
            .into_iter()
            .map(FileMetadata::from)
            .collect())
    }

    /// Download `filename` into memory.
    pub async fn download(&self, filename: &str) -> Result<DownloadedFile> {
        let mut stream = self
            .inner
            .clone()
            .download_file(DownloadRequest {
                filename: filename.to_string(),
            })
            .await?
            .into_inner();

        let mut assembler = DownloadAssembler::new();
        while let Some(frame) = stream.message().await? {
            assembler.push(frame)?;
        }
        assembler.finish()
    }

    /// Download `filename` and write it to `dest`, creating parent
    /// directories as needed.
    pub async fn download_to(&self, filename: &str, dest: &Path) -> Result<DownloadedFile> {
        let file = self.download(filename).await?;

        if let Some(parent) = dest.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        tokio::fs::write(dest, &file.data).await?;

        Ok(file)
    }
}
