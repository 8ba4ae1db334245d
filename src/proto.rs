//! Wire types for the `file_service.FileService` RPC surface.
//!
//! The schema is documented in `proto/file_service.proto`. The service client
//! and server modules are generated by `build.rs`.

/// Metadata frame carried at the head of an upload or download stream.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct FileInfo {
    #[prost(string, tag = "1")]
    pub filename: ::prost::alloc::string::String,
}

/// One frame of the client-streaming `UploadFile` call.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct UploadRequest {
    #[prost(oneof = "upload_request::Data", tags = "1, 2")]
    pub data: ::core::option::Option<upload_request::Data>,
}

pub mod upload_request {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Data {
        #[prost(message, tag = "1")]
        Info(super::FileInfo),
        #[prost(bytes, tag = "2")]
        ChunkData(::prost::alloc::vec::Vec<u8>),
    }
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct UploadResponse {
    #[prost(string, tag = "1")]
    pub filename: ::prost::alloc::string::String,
    #[prost(uint64, tag = "2")]
    pub size: u64,
    #[prost(string, tag = "3")]
    pub message: ::prost::alloc::string::String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct DownloadRequest {
    #[prost(string, tag = "1")]
    pub filename: ::prost::alloc::string::String,
}

/// One frame of the server-streaming `DownloadFile` call.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct DownloadResponse {
    #[prost(oneof = "download_response::Data", tags = "1, 2")]
    pub data: ::core::option::Option<download_response::Data>,
}

pub mod download_response {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Data {
        #[prost(message, tag = "1")]
        Info(super::FileInfo),
        #[prost(bytes, tag = "2")]
        ChunkData(::prost::alloc::vec::Vec<u8>),
    }
}

#[derive(Clone, Copy, PartialEq, ::prost::Message)]
pub struct ListRequest {}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct FileMetadata {
    #[prost(string, tag = "1")]
    pub filename: ::prost::alloc::string::String,
    #[prost(message, optional, tag = "2")]
    pub created_at: ::core::option::Option<::prost_types::Timestamp>,
    #[prost(message, optional, tag = "3")]
    pub updated_at: ::core::option::Option<::prost_types::Timestamp>,
    #[prost(uint64, tag = "4")]
    pub size: u64,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ListResponse {
    #[prost(message, repeated, tag = "1")]
    pub files: ::prost::alloc::vec::Vec<FileMetadata>,
}

include!(concat!(env!("OUT_DIR"), "/file_service.FileService.rs"));

impl UploadRequest {
    /// Build the leading info frame of an upload.
    pub fn info(filename: impl Into<String>) -> Self {
        Self {
            data: Some(upload_request::Data::Info(FileInfo {
                filename: filename.into(),
            })),
        }
    }

    /// Build a chunk frame of an upload.
    pub fn chunk(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            data: Some(upload_request::Data::ChunkData(bytes.into())),
        }
    }
}

impl DownloadResponse {
    pub fn info(filename: impl Into<String>) -> Self {
        Self {
            data: Some(download_response::Data::Info(FileInfo {
                filename: filename.into(),
            })),
        }
    }

    pub fn chunk(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            data: Some(download_response::Data::ChunkData(bytes.into())),
        }
    }
}
