//! Listing metadata for stored files.

use std::time::SystemTime;

use chrono::{DateTime, Utc};

use crate::proto;

/// Metadata for a stored file, derived from the filesystem.
///
/// No separate metadata store exists, so `created_at` and `updated_at` both
/// carry the file's modification time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileMetadata {
    /// Storage key.
    pub filename: String,
    /// File size in bytes.
    pub size: u64,
    /// When the file was created.
    pub created_at: DateTime<Utc>,
    /// When the file was last written.
    pub updated_at: DateTime<Utc>,
}

impl FileMetadata {
    /// Build metadata from a file's size and modification time.
    pub fn from_modified(filename: impl Into<String>, size: u64, modified: SystemTime) -> Self {
        let modified = DateTime::<Utc>::from(modified);
        Self {
            filename: filename.into(),
            size,
            created_at: modified,
            updated_at: modified,
        }
    }
}

fn to_timestamp(dt: &DateTime<Utc>) -> prost_types::Timestamp {
    prost_types::Timestamp {
        seconds: dt.timestamp(),
        nanos: dt.timestamp_subsec_nanos() as i32,
    }
}

fn from_timestamp(ts: Option<prost_types::Timestamp>) -> DateTime<Utc> {
    ts.and_then(|ts| DateTime::from_timestamp(ts.seconds, ts.nanos.max(0) as u32))
        .unwrap_or_default()
}

impl From<&FileMetadata> for proto::FileMetadata {
    fn from(m: &FileMetadata) -> Self {
        Self {
            filename: m.filename.clone(),
            created_at: Some(to_timestamp(&m.created_at)),
            updated_at: Some(to_timestamp(&m.updated_at)),
            size: m.size,
        }
    }
}

impl From<proto::FileMetadata> for FileMetadata {
    fn from(m: proto::FileMetadata) -> Self {
        Self {
            filename: m.filename,
            size: m.size,
            created_at: from_timestamp(m.created_at),
            updated_at: from_timestamp(m.updated_at),
        }
    }
}
