//! RPC implementation of the file transfer service.
//!
//! Every call takes an admission permit for its operation class before it
//! touches storage, and holds it until the call is over:
//! - `UploadFile` for the whole receive-and-save sequence
//! - `DownloadFile` inside the task that streams the response
//! - `ListFiles` for the directory scan

mod upload;

pub use upload::{UploadSession, UploadState};

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tonic::{Request, Response, Status, Streaming};
use tracing::{debug, error, info, warn};

use crate::admission::{AdmissionController, AdmissionPermit, OperationClass};
use crate::config::Config;
use crate::file::{validate_filename, FileStorage};
use crate::proto::file_service_server::{FileService, FileServiceServer};
use crate::proto::{
    self, DownloadRequest, DownloadResponse, ListRequest, ListResponse, UploadRequest,
    UploadResponse,
};
use crate::transfer::DEFAULT_CHUNK_SIZE;
use crate::{FiledockError, Result};

/// Message returned with every successful upload.
pub const UPLOAD_SUCCESS_MESSAGE: &str = "File uploaded successfully";

const DEFAULT_STREAM_BUFFER: usize = 4;

type FrameSender = mpsc::Sender<std::result::Result<DownloadResponse, Status>>;

/// Upload, download and listing over a shared [`FileStorage`].
///
/// Cloning is cheap; clones share the storage and the admission pools.
#[derive(Debug, Clone)]
pub struct FileTransferService {
    storage: Arc<FileStorage>,
    admission: Arc<AdmissionController>,
    chunk_size: usize,
    stream_buffer: usize,
}

impl FileTransferService {
    /// Create a new service with the default chunk size.
    pub fn new(storage: Arc<FileStorage>, admission: Arc<AdmissionController>) -> Self {
        Self {
            storage,
            admission,
            chunk_size: DEFAULT_CHUNK_SIZE,
            stream_buffer: DEFAULT_STREAM_BUFFER,
        }
    }

    /// Build a service from configuration, creating the storage root.
    pub fn from_config(config: &Config) -> Result<Self> {
        let storage = FileStorage::new(&config.storage.path)?;
        let admission = AdmissionController::from_config(&config.limits);
        Ok(Self::new(Arc::new(storage), Arc::new(admission))
            .with_chunk_size(config.transfer.chunk_size)
            .with_stream_buffer(config.transfer.stream_buffer))
    }

    /// Set the size of the chunk frames downloads are split into.
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    /// Set how many frames a download may buffer ahead of the transport.
    pub fn with_stream_buffer(mut self, frames: usize) -> Self {
        self.stream_buffer = frames.max(1);
        self
    }

    pub fn storage(&self) -> &Arc<FileStorage> {
        &self.storage
    }

    pub fn admission(&self) -> &Arc<AdmissionController> {
        &self.admission
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Wrap the service for registration with a tonic server.
    ///
    /// Upload frames may be any size, so the decode limit is lifted.
    pub fn into_server(self) -> FileServiceServer<Self> {
        FileServiceServer::new(self).max_decoding_message_size(usize::MAX)
    }

    fn admit(&self, class: OperationClass) -> std::result::Result<AdmissionPermit, Status> {
        self.admission.try_acquire(class).ok_or_else(|| {
            warn!(
                operation = %class,
                capacity = self.admission.capacity(class),
                "admission pool full, rejecting"
            );
            FiledockError::ResourceExhausted(format!("too many {class} requests")).into()
        })
    }
}

#[tonic::async_trait]
impl FileService for FileTransferService {
    async fn upload_file(
        &self,
        request: Request<Streaming<UploadRequest>>,
    ) -> std::result::Result<Response<UploadResponse>, Status> {
        let _permit = self.admit(OperationClass::Upload)?;
        let mut stream = request.into_inner();
        let mut session = UploadSession::new();

        loop {
            match stream.message().await {
                Ok(Some(frame)) => {
                    if let Err(e) = session.accept(frame) {
                        warn!(filename = ?session.filename(), error = %e, "rejecting upload");
                        return Err(e.into());
                    }
                }
                Ok(None) => break,
                Err(status) => {
                    warn!(
                        filename = ?session.filename(),
                        received = session.len(),
                        error = %status.message(),
                        "upload stream failed, discarding buffered data"
                    );
                    return Err(Status::internal(format!(
                        "failed to receive chunk: {}",
                        status.message()
                    )));
                }
            }
        }

        let chunks = session.chunks();
        let (filename, data) = session.finish()?;
        let size = data.len() as u64;
        debug!(filename = %filename, size, chunks, "finalizing upload");

        if let Err(e) = self.storage.save(&filename, &data).await {
            error!(filename = %filename, error = %e, "failed to save upload");
            return Err(Status::internal(format!("failed to save file: {e}")));
        }

        info!(filename = %filename, size, "upload complete");

        Ok(Response::new(UploadResponse {
            filename,
            size,
            message: UPLOAD_SUCCESS_MESSAGE.to_string(),
        }))
    }

    type DownloadFileStream = ReceiverStream<std::result::Result<DownloadResponse, Status>>;

    async fn download_file(
        &self,
        request: Request<DownloadRequest>,
    ) -> std::result::Result<Response<Self::DownloadFileStream>, Status> {
        let permit = self.admit(OperationClass::Download)?;
        let filename = request.into_inner().filename;
        validate_filename(&filename)?;

        let (tx, rx) = mpsc::channel(self.stream_buffer);
        let storage = Arc::clone(&self.storage);
        let chunk_size = self.chunk_size;

        tokio::spawn(stream_file(storage, filename, chunk_size, tx, permit));

        Ok(Response::new(ReceiverStream::new(rx)))
    }

    async fn list_files(
        &self,
        _request: Request<ListRequest>,
    ) -> std::result::Result<Response<ListResponse>, Status> {
        let _permit = self.admit(OperationClass::List)?;

        let files = self.storage.list().await.map_err(|e| {
            error!(error = %e, "failed to list files");
            Status::internal(format!("failed to list files: {e}"))
        })?;

        debug!(count = files.len(), "listed files");

        Ok(Response::new(ListResponse {
            files: files.iter().map(proto::FileMetadata::from).collect(),
        }))
    }
}

/// Send the info frame, then the file's bytes as chunk frames.
///
/// The permit lives as long as this task. The task ends when the last chunk
/// is queued, when storage fails, or when the receiver is gone because the
/// client hung up.
async fn stream_file(
    storage: Arc<FileStorage>,
    filename: String,
    chunk_size: usize,
    tx: FrameSender,
    _permit: AdmissionPermit,
) {
    if tx.send(Ok(DownloadResponse::info(&filename))).await.is_err() {
        debug!(filename = %filename, "client went away before info frame");
        return;
    }

    let data = match storage.load(&filename).await {
        Ok(data) => data,
        Err(FiledockError::NotFound(_)) => {
            warn!(filename = %filename, "download of missing file");
            let _ = tx
                .send(Err(Status::not_found(format!("file not found: {filename}"))))
                .await;
            return;
        }
        Err(e) => {
            error!(filename = %filename, error = %e, "failed to read file");
            let _ = tx
                .send(Err(Status::internal(format!("failed to read file: {e}"))))
                .await;
            return;
        }
    };

    let mut sent = 0usize;
    for chunk in data.chunks(chunk_size) {
        if tx.send(Ok(DownloadResponse::chunk(chunk))).await.is_err() {
            debug!(filename = %filename, sent, "client went away mid-download");
            return;
        }
        sent += 1;
    }

    info!(filename = %filename, size = data.len(), chunks = sent, "download complete");
}
