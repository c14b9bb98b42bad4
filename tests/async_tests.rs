//! Integration tests for the async view facade.
//!
//! These tests exercise [`AsyncView`] on a Tokio runtime, including the rule
//! that a second save fails fast instead of queueing.

#![cfg(feature = "async")]

use std::sync::mpsc;

use hexlay::{AsyncView, Config, Endian, Error, SearchQuery};
use tokio::sync::oneshot;

mod common;

use common::{create_file, read_back};

#[tokio::test]
async fn test_open_edit_save() {
    let (_dir, path) = create_file(&[0; 64]);
    let view = AsyncView::open(&path, Config::default()).await.unwrap();

    assert_eq!(view.size().await.unwrap(), 64);
    view.edit(0, 0x7F).await.unwrap();
    view.edit_fill(10, 13, 0xEE).await.unwrap();
    view.edit_bytes(20, b"abc".to_vec()).await.unwrap();
    assert!(view.has_edits().await.unwrap());

    let result = view.save(true).await.unwrap();
    assert_eq!(result.edits_applied, 8);
    assert!(!view.has_edits().await.unwrap());
    assert!(!view.is_saving());

    let disk = read_back(&path);
    assert_eq!(disk[0], 0x7F);
    assert_eq!(&disk[10..14], &[0xEE; 4]);
    assert_eq!(&disk[20..23], b"abc");
}

#[tokio::test]
async fn test_open_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let result = AsyncView::open(dir.path().join("missing.bin"), Config::default()).await;
    assert!(matches!(result, Err(Error::Open { .. })));
}

#[tokio::test]
async fn test_load_view_returns_window() {
    let data: Vec<u8> = (0..100).collect();
    let (_dir, path) = create_file(&data);
    let view = AsyncView::open(&path, Config::default().window_size(16))
        .await
        .unwrap();

    view.set_position(40).await;
    view.edit(41, 0xFF).await.unwrap();
    let window = view.load_view(false).await.unwrap();

    assert_eq!(window.len(), 16);
    assert_eq!(window.as_slice()[0], 40);
    assert_eq!(window.as_slice()[1], 0xFF);
    assert_eq!(view.read(41, 1).await.unwrap(), vec![0xFF]);
}

#[tokio::test]
async fn test_search_and_inspect() {
    let (_dir, path) = create_file(b"..needle..needle");
    let view = AsyncView::open(&path, Config::default()).await.unwrap();

    let found = view.search_all(SearchQuery::text("needle")).await.unwrap();
    assert_eq!(found, vec![(2, 7), (10, 15)]);

    let values = view.inspect(2, Endian::Little).await.unwrap();
    assert_eq!(values.u8, Some(b'n'));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_second_save_fails_fast() {
    let (_dir, path) = create_file(&[0; 32]);
    let view = AsyncView::open(&path, Config::default()).await.unwrap();
    view.edit(3, 3).await.unwrap();

    // Park the view behind a blocking call so the first save has to wait.
    let (started_tx, started_rx) = oneshot::channel();
    let (release_tx, release_rx) = mpsc::channel::<()>();
    let holder = {
        let view = view.clone();
        tokio::spawn(async move {
            view.with(move |_| {
                let _ = started_tx.send(());
                let _ = release_rx.recv();
                Ok(())
            })
            .await
        })
    };
    started_rx.await.unwrap();

    let first = {
        let view = view.clone();
        tokio::spawn(async move { view.save(false).await })
    };
    while !view.is_saving() {
        tokio::task::yield_now().await;
    }

    assert!(matches!(view.save(false).await, Err(Error::AlreadySaving)));

    release_tx.send(()).unwrap();
    holder.await.unwrap().unwrap();
    let result = first.await.unwrap().unwrap();
    assert_eq!(result.edits_applied, 1);
    assert!(!view.is_saving());
    assert_eq!(read_back(&path)[3], 3);
}
