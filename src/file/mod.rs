//! File storage module for filedock.
//!
//! This module provides the flat, filename-keyed store behind the RPCs:
//! - Whole-file atomic saves under one exclusive lock
//! - Shared-lock reads and directory-scan listings
//! - Filename validation for keys used as path components

mod metadata;
mod storage;

pub use metadata::FileMetadata;
pub use storage::FileStorage;

use crate::{FiledockError, Result};

/// Maximum length for a filename, in bytes.
pub const MAX_FILENAME_LENGTH: usize = 255;

/// Prefix of the temporary files an in-progress save writes into the root.
pub(crate) const TEMP_PREFIX: &str = ".filedock-";

/// Suffix of the temporary files an in-progress save writes into the root.
pub(crate) const TEMP_SUFFIX: &str = ".tmp";

/// Check that `filename` is usable as a single path component of the
/// storage root.
///
/// Rejects empty names, `.` and `..`, path separators, NUL bytes, names over
/// [`MAX_FILENAME_LENGTH`] bytes and names reserved for temporary files.
pub fn validate_filename(filename: &str) -> Result<()> {
    if filename.is_empty() {
        return Err(FiledockError::InvalidArgument(
            "filename is required".to_string(),
        ));
    }
    if filename.len() > MAX_FILENAME_LENGTH {
        return Err(FiledockError::InvalidArgument(format!(
            "filename exceeds {MAX_FILENAME_LENGTH} bytes"
        )));
    }
    if filename == "." || filename == ".." {
        return Err(FiledockError::InvalidArgument(format!(
            "filename {filename:?} is not a file name"
        )));
    }
    if filename.contains(['/', '\\', '\0']) {
        return Err(FiledockError::InvalidArgument(format!(
            "filename {filename:?} must not contain path separators"
        )));
    }
    if is_temp_name(filename) {
        return Err(FiledockError::InvalidArgument(format!(
            "filename {filename:?} is reserved"
        )));
    }
    Ok(())
}

pub(crate) fn is_temp_name(name: &str) -> bool {
    name.starts_with(TEMP_PREFIX) && name.ends_with(TEMP_SUFFIX)
}
