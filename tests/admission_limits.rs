//! Admission control tests against a running server.
//!
//! These tests verify that a full pool rejects the next call immediately and
//! that permits come back however a call ends.

mod common;

use std::time::{Duration, Instant};

use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tonic::Code;

use common::{wait_until, TestServer, DEFAULT_TIMEOUT};
use filedock::config::LimitsConfig;
use filedock::proto::UploadRequest;
use filedock::OperationClass;

#[tokio::test]
async fn test_upload_over_capacity_fails_fast() {
    let server = TestServer::start().await;
    let capacity = server.admission().capacity(OperationClass::Upload);
    assert_eq!(capacity, 10);

    // Open `capacity` uploads and keep their request streams open
    let mut senders = Vec::new();
    let mut calls = Vec::new();
    for i in 0..capacity {
        let (tx, rx) = mpsc::channel(4);
        tx.send(UploadRequest::info(format!("held-{i}.bin"))).await.unwrap();
        let mut raw = server.raw_client().await;
        calls.push(tokio::spawn(async move {
            raw.upload_file(ReceiverStream::new(rx)).await
        }));
        senders.push(tx);
    }

    wait_until(
        || server.admission().in_flight(OperationClass::Upload) == capacity,
        "all uploads to be admitted",
    )
    .await;

    // The next upload is turned away without waiting for a slot
    let client = server.client().await;
    let started = Instant::now();
    let result = tokio::time::timeout(DEFAULT_TIMEOUT, client.upload_bytes("extra.bin", b"x"))
        .await
        .expect("rejection must not block");
    let err = result.unwrap_err();
    assert_eq!(err.code(), Code::ResourceExhausted);
    assert!(started.elapsed() < DEFAULT_TIMEOUT);
    assert!(!server.storage_root().join("extra.bin").exists());

    // Closing the held streams completes those uploads and frees the pool
    for tx in &senders {
        tx.send(UploadRequest::chunk(b"payload".to_vec())).await.unwrap();
    }
    drop(senders);
    for call in calls {
        let response = call.await.unwrap().unwrap().into_inner();
        assert_eq!(response.size, 7);
    }

    wait_until(
        || server.admission().in_flight(OperationClass::Upload) == 0,
        "upload permits to be released",
    )
    .await;

    client.upload_bytes("extra.bin", b"x").await.unwrap();
}

#[tokio::test]
async fn test_failed_uploads_release_permits() {
    let server = TestServer::start_with(LimitsConfig {
        max_concurrent_uploads: 1,
        ..LimitsConfig::default()
    })
    .await;
    let client = server.client().await;

    for _ in 0..3 {
        let err = client.upload_bytes("", b"data").await.unwrap_err();
        assert_eq!(err.code(), Code::InvalidArgument);
    }

    wait_until(
        || server.admission().in_flight(OperationClass::Upload) == 0,
        "upload permit to be released",
    )
    .await;
    client.upload_bytes("ok.bin", b"data").await.unwrap();
}

#[tokio::test]
async fn test_aborted_upload_releases_permit() {
    let server = TestServer::start_with(LimitsConfig {
        max_concurrent_uploads: 1,
        ..LimitsConfig::default()
    })
    .await;

    let (tx, rx) = mpsc::channel(4);
    tx.send(UploadRequest::info("abandoned.bin")).await.unwrap();
    tx.send(UploadRequest::chunk(vec![1u8; 1024])).await.unwrap();
    let mut raw = server.raw_client().await;
    let call = tokio::spawn(async move { raw.upload_file(ReceiverStream::new(rx)).await });

    wait_until(
        || server.admission().in_flight(OperationClass::Upload) == 1,
        "upload to be admitted",
    )
    .await;

    // Drop the call mid-stream, as a crashing client would
    call.abort();
    assert!(call.await.unwrap_err().is_cancelled());
    drop(tx);

    wait_until(
        || server.admission().in_flight(OperationClass::Upload) == 0,
        "upload permit to be released",
    )
    .await;
    assert!(!server.storage_root().join("abandoned.bin").exists());
}

#[tokio::test]
async fn test_download_and_list_pools_are_independent_of_uploads() {
    let server = TestServer::start_with(LimitsConfig {
        max_concurrent_uploads: 1,
        ..LimitsConfig::default()
    })
    .await;
    let client = server.client().await;
    client.upload_bytes("shared.bin", b"abc").await.unwrap();

    let (tx, rx) = mpsc::channel(4);
    tx.send(UploadRequest::info("held.bin")).await.unwrap();
    let mut raw = server.raw_client().await;
    let call = tokio::spawn(async move { raw.upload_file(ReceiverStream::new(rx)).await });
    wait_until(
        || server.admission().in_flight(OperationClass::Upload) == 1,
        "upload to be admitted",
    )
    .await;

    // A full upload pool does not affect the other operation classes
    assert_eq!(client.download("shared.bin").await.unwrap().data, b"abc");
    assert!(!client.list_files(Duration::from_secs(5)).await.unwrap().is_empty());

    drop(tx);
    call.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_download_permit_released_after_stream() {
    let server = TestServer::start_with(LimitsConfig {
        max_concurrent_downloads: 1,
        ..LimitsConfig::default()
    })
    .await;
    let client = server.client().await;
    client.upload_bytes("d.bin", &common::payload(200_000)).await.unwrap();

    for _ in 0..3 {
        client.download("d.bin").await.unwrap();
        wait_until(
            || server.admission().in_flight(OperationClass::Download) == 0,
            "download permit to be released",
        )
        .await;
    }

    let err = client.download("missing.bin").await.unwrap_err();
    assert_eq!(err.code(), Code::NotFound);
    wait_until(
        || server.admission().in_flight(OperationClass::Download) == 0,
        "download permit to be released after NotFound",
    )
    .await;
}
