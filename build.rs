//! Generates the FileService client and server stubs.
//!
//! Message types are hand-written `prost` structs in `src/proto.rs`, so only
//! the service glue is generated here and no `protoc` binary is required.

use tonic_build::manual::{Builder, Method, Service};

const CODEC: &str = "tonic::codec::ProstCodec";

fn main() {
    let service = Service::builder()
        .name("FileService")
        .package("file_service")
        .method(
            Method::builder()
                .name("upload_file")
                .route_name("UploadFile")
                .input_type("crate::proto::UploadRequest")
                .output_type("crate::proto::UploadResponse")
                .codec_path(CODEC)
                .client_streaming()
                .build(),
        )
        .method(
            Method::builder()
                .name("download_file")
                .route_name("DownloadFile")
                .input_type("crate::proto::DownloadRequest")
                .output_type("crate::proto::DownloadResponse")
                .codec_path(CODEC)
                .server_streaming()
                .build(),
        )
        .method(
            Method::builder()
                .name("list_files")
                .route_name("ListFiles")
                .input_type("crate::proto::ListRequest")
                .output_type("crate::proto::ListResponse")
                .codec_path(CODEC)
                .build(),
        )
        .build();

    Builder::new().compile(&[service]);

    println!("cargo:rerun-if-changed=build.rs");
}
