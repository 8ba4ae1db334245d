//! Chunk framing shared by the server and the client.
//!
//! Both directions of a transfer use the same frame sequence: one info frame
//! naming the file, then zero or more chunk frames carrying consecutive slices
//! of its bytes. Chunk size is a sender-side choice; receivers accept frames
//! of any size.

use crate::proto::{download_response, DownloadResponse, UploadRequest};
use crate::{FiledockError, Result};

/// Default chunk size: 64KB.
pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

/// Number of chunk frames `len` bytes are split into.
pub fn chunk_count(len: usize, chunk_size: usize) -> usize {
    len.div_ceil(chunk_size.max(1))
}

/// Frame `data` as an upload stream: the info frame followed by its chunks.
pub fn upload_frames(filename: &str, data: &[u8], chunk_size: usize) -> Vec<UploadRequest> {
    let mut frames = Vec::with_capacity(1 + chunk_count(data.len(), chunk_size));
    frames.push(UploadRequest::info(filename));
    frames.extend(data.chunks(chunk_size.max(1)).map(UploadRequest::chunk));
    frames
}

/// A file reassembled from a download stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadedFile {
    /// Filename echoed by the server's info frame.
    pub filename: String,
    /// File content.
    pub data: Vec<u8>,
    /// Number of chunk frames received.
    pub chunks: usize,
}

/// Reassembles a download stream, enforcing that the info frame comes first
/// and only once.
#[derive(Debug, Default)]
pub struct DownloadAssembler {
    filename: Option<String>,
    data: Vec<u8>,
    chunks: usize,
}

impl DownloadAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed the next frame of the stream.
    pub fn push(&mut self, frame: DownloadResponse) -> Result<()> {
        match frame.data {
            Some(download_response::Data::Info(info)) => {
                if self.filename.is_some() {
                    return Err(FiledockError::Protocol(
                        "duplicate file info frame".to_string(),
                    ));
                }
                self.filename = Some(info.filename);
            }
            Some(download_response::Data::ChunkData(bytes)) => {
                if self.filename.is_none() {
                    return Err(FiledockError::Protocol(
                        "chunk data before file info".to_string(),
                    ));
                }
                self.data.extend_from_slice(&bytes);
                self.chunks += 1;
            }
            None => {
                return Err(FiledockError::Protocol("empty download frame".to_string()));
            }
        }
        Ok(())
    }

    /// Finish the stream and return the assembled file.
    pub fn finish(self) -> Result<DownloadedFile> {
        let filename = self
            .filename
            .ok_or_else(|| FiledockError::Protocol("stream ended without file info".to_string()))?;
        Ok(DownloadedFile {
            filename,
            data: self.data,
            chunks: self.chunks,
        })
    }
}
