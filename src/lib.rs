//! filedock - remote file store over gRPC.
//!
//! Clients upload files as a stream of chunks, list what is stored, and
//! download files back as a stream of chunks. Concurrent calls are bounded
//! per operation class by a fail-fast admission gate, and the flat on-disk
//! store is guarded by a single read-write lock.

pub mod admission;
pub mod client;
pub mod config;
pub mod error;
pub mod file;
pub mod logging;
pub mod proto;
pub mod server;
pub mod service;
pub mod transfer;

pub use admission::{AdmissionController, AdmissionPermit, OperationClass};
pub use client::{FileClient, UploadOutcome};
pub use config::Config;
pub use error::{FiledockError, Result};
pub use file::{validate_filename, FileMetadata, FileStorage};
pub use server::FileServer;
pub use service::{FileTransferService, UploadSession, UploadState};
pub use transfer::{DownloadAssembler, DownloadedFile, DEFAULT_CHUNK_SIZE};
