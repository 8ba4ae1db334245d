//! Receive-side state of one upload stream.

use crate::file::validate_filename;
use crate::proto::{upload_request, UploadRequest};
use crate::{FiledockError, Result};

/// Where an upload stream is in its frame sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadState {
    /// No frame received yet; the next one must carry the filename.
    AwaitingInfo,
    /// Filename known; chunk frames are appended until end of input.
    Accumulating,
}

/// Accumulates one upload: the filename from the leading info frame and the
/// bytes of every chunk frame after it, in arrival order.
///
/// Nothing is persisted here. The buffer is handed to storage in one piece
/// by [`UploadSession::finish`], or dropped with the session if the stream
/// fails.
#[derive(Debug)]
pub struct UploadSession {
    filename: Option<String>,
    buffer: Vec<u8>,
    chunks: usize,
}

impl UploadSession {
    pub fn new() -> Self {
        Self {
            filename: None,
            buffer: Vec::new(),
            chunks: 0,
        }
    }

    pub fn state(&self) -> UploadState {
        if self.filename.is_some() {
            UploadState::Accumulating
        } else {
            UploadState::AwaitingInfo
        }
    }

    pub fn filename(&self) -> Option<&str> {
        self.filename.as_deref()
    }

    /// Bytes accumulated so far.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Chunk frames accepted so far.
    pub fn chunks(&self) -> usize {
        self.chunks
    }

    /// Apply the next frame of the stream.
    ///
    /// Fails with `InvalidArgument` if the first frame is not an info frame,
    /// if a second info frame arrives, if the frame is empty, or if the
    /// filename is not a valid storage key.
    pub fn accept(&mut self, frame: UploadRequest) -> Result<()> {
        match (self.state(), frame.data) {
            (UploadState::AwaitingInfo, Some(upload_request::Data::Info(info))) => {
                validate_filename(&info.filename)?;
                self.filename = Some(info.filename);
                Ok(())
            }
            (UploadState::AwaitingInfo, Some(upload_request::Data::ChunkData(_))) => {
                Err(FiledockError::InvalidArgument(
                    "file info must precede chunk data".to_string(),
                ))
            }
            (UploadState::Accumulating, Some(upload_request::Data::ChunkData(bytes))) => {
                self.buffer.extend_from_slice(&bytes);
                self.chunks += 1;
                Ok(())
            }
            (UploadState::Accumulating, Some(upload_request::Data::Info(_))) => Err(
                FiledockError::InvalidArgument("file info sent more than once".to_string()),
            ),
            (_, None) => Err(FiledockError::InvalidArgument(
                "upload frame carries no data".to_string(),
            )),
        }
    }

    /// End of input: yield the filename and the complete payload.
    pub fn finish(self) -> Result<(String, Vec<u8>)> {
        match self.filename {
            Some(filename) => Ok((filename, self.buffer)),
            None => Err(FiledockError::InvalidArgument(
                "filename is required".to_string(),
            )),
        }
    }
}

impl Default for UploadSession {
    fn default() -> Self {
        Self::new()
    }
}
