//! Integration tests for pattern search.

use hexlay::{Config, Error, SearchQuery, View};

mod common;

use common::{create_file, open_view};

fn file_with(len: usize, placements: &[(usize, &[u8])]) -> Vec<u8> {
    let mut data = vec![0u8; len];
    for (offset, bytes) in placements {
        data[*offset..*offset + bytes.len()].copy_from_slice(bytes);
    }
    data
}

#[test]
fn test_finds_byte_pattern() {
    let data = file_with(40, &[(5, &[0xAA, 0xBB]), (20, &[0xAA, 0xBB])]);
    let (_dir, _path, view) = open_view(&data, Config::default());

    let found = view
        .search_all(&SearchQuery::bytes(vec![0xAA, 0xBB]))
        .unwrap();
    assert_eq!(found, vec![(5, 6), (20, 21)]);
}

#[test]
fn test_match_spanning_chunk_boundary() {
    // Pattern of 4 bytes scans 256-byte chunks; place one across the seam.
    let pattern: [u8; 4] = [0xDE, 0xAD, 0xBE, 0xEF];
    let data = file_with(1000, &[(254, &pattern), (600, &pattern), (996, &pattern)]);
    let (_dir, _path, view) = open_view(&data, Config::default());

    let found = view.search_all(&SearchQuery::bytes(pattern)).unwrap();
    assert_eq!(found, vec![(254, 257), (600, 603), (996, 999)]);
}

#[test]
fn test_small_chunk_cap() {
    let data = file_with(100, &[(7, b"abc"), (8 + 9, b"abc"), (97, b"abc")]);
    let config = Config::new().max_chunk_size(8).window_size(8);
    let (_dir, _path, view) = open_view(&data, config);

    let found = view.search_all(&SearchQuery::text("abc")).unwrap();
    assert_eq!(found, vec![(7, 9), (17, 19), (97, 99)]);
}

#[test]
fn test_overlapping_matches() {
    let (_dir, _path, view) = open_view(b"aaaa", Config::default());
    let found = view.search_all(&SearchQuery::text("aa")).unwrap();
    assert_eq!(found, vec![(0, 1), (1, 2), (2, 3)]);
}

#[test]
fn test_case_insensitive_text() {
    let (_dir, _path, view) = open_view(b"Hello, HELLO, hello", Config::default());
    let sensitive = view.search_all(&SearchQuery::text("hello")).unwrap();
    assert_eq!(sensitive, vec![(14, 18)]);

    let folded = view
        .search_all(&SearchQuery::text_insensitive("hello"))
        .unwrap();
    assert_eq!(folded, vec![(0, 4), (7, 11), (14, 18)]);
}

#[test]
fn test_search_observes_pending_edits() {
    let data = file_with(64, &[(10, b"xyz")]);
    let (_dir, path, mut view) = open_view(&data, Config::default());

    view.edit(11, b'Y').unwrap();
    view.edit_range(40, 42, &b"xyz"[..]).unwrap();

    let found = view.search_all(&SearchQuery::text("xyz")).unwrap();
    assert_eq!(found, vec![(40, 42)]);
    // Searching never drains.
    assert!(view.has_edits().unwrap());
    assert_eq!(std::fs::read(path).unwrap()[11], b'y');
}

#[test]
fn test_iterator_is_lazy_and_restartable() {
    let data = file_with(300, &[(1, &[0x42]), (150, &[0x42]), (299, &[0x42])]);
    let (_dir, _path, view) = open_view(&data, Config::default());

    let mut matches = view.search(&SearchQuery::bytes(vec![0x42])).unwrap();
    let replay = matches.clone();
    assert_eq!(matches.next().unwrap().unwrap(), (1, 1));
    assert_eq!(matches.by_ref().count(), 2);
    assert!(matches.next().is_none());

    matches.restart();
    assert_eq!(matches.count(), 3);
    assert_eq!(replay.count(), 3);
}

#[test]
fn test_empty_pattern_and_empty_file() {
    let (_dir, _path, view) = open_view(&[1, 2, 3], Config::default());
    assert!(view.search_all(&SearchQuery::bytes(Vec::new())).unwrap().is_empty());

    let (_dir2, _path2, empty) = open_view(&[], Config::default());
    assert!(empty.search_all(&SearchQuery::text("a")).unwrap().is_empty());
}

#[test]
fn test_pattern_longer_than_file() {
    let (_dir, _path, view) = open_view(b"ab", Config::default());
    assert!(view.search_all(&SearchQuery::text("abc")).unwrap().is_empty());
}

#[test]
fn test_pattern_longer_than_chunk_cap() {
    let config = Config::new().max_chunk_size(4).window_size(4);
    let (_dir, _path, view) = open_view(&[0; 16], config);
    assert!(matches!(
        view.search(&SearchQuery::bytes(vec![0; 5])),
        Err(Error::InvalidPattern(_))
    ));
}

#[test]
fn test_search_requires_init() {
    let (_dir, path) = create_file(&[0; 4]);
    let view = View::new(&path, Config::default());
    assert!(matches!(
        view.search(&SearchQuery::text("a")),
        Err(Error::NotInitialized)
    ));
}
