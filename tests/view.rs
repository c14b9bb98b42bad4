//! Integration tests for windows, edits and inspection through a View.

use std::sync::{Arc, Mutex};

use hexlay::{
    Config, EditOverlay, Endian, Error, Lookup, MapOverlay, OverlayKind, RangeOrder, Values, View,
    ViewObserver, ViewState,
};

mod common;

use common::{create_file, open_view, patterned, read_back};

// =============================================================================
// Windows
// =============================================================================

#[test]
fn test_window_walks_file() {
    let data = patterned(200);
    let (_dir, _path, mut view) = open_view(&data, Config::default().window_size(64));

    let mut seen = Vec::new();
    let mut position = 0u64;
    loop {
        view.set_position(position);
        view.load_view(false).unwrap();
        let window = view.window().unwrap();
        if window.is_empty() {
            break;
        }
        seen.extend_from_slice(window.as_slice());
        position += window.len() as u64;
    }
    assert_eq!(seen, data);
}

#[test]
fn test_window_typed_reads_follow_endian() {
    let (_dir, _path, mut view) = open_view(&[0x12, 0x34, 0x56, 0x78], Config::default());
    view.load_view(false).unwrap();
    let window = view.window().unwrap();
    assert_eq!(window.endian(), Endian::Big);
    assert_eq!(window.read_u32(0, window.endian()).unwrap(), 0x1234_5678);

    view.set_endian(Endian::Little);
    let window = view.window().unwrap();
    assert_eq!(window.read_u32(0, window.endian()).unwrap(), 0x7856_3412);
    assert!(matches!(
        window.read_u64(0, Endian::Big),
        Err(Error::OutOfBounds { offset: 0, size: 8, capacity: 4 })
    ));
}

#[test]
fn test_window_reflects_range_edits_without_draining() {
    let (_dir, path, mut view) = open_view(&[0; 32], Config::default().window_size(32));
    view.edit_range(8, 11, &[1u8, 2, 3, 4][..]).unwrap();
    view.load_view(false).unwrap();
    view.load_view(true).unwrap();

    assert_eq!(&view.window().unwrap().as_slice()[8..12], &[1, 2, 3, 4]);
    assert_eq!(view.pending(9).unwrap(), Lookup::Present(2));
    assert_eq!(read_back(&path), vec![0; 32]);
}

// =============================================================================
// Range ordering
// =============================================================================

#[test]
fn test_strict_ranges_through_view() {
    let config = Config::default().strict_ranges(true);
    let (_dir, _path, mut view) = open_view(&[0; 16], config);

    assert!(matches!(
        view.edit_range(9, 3, 0xFFu8),
        Err(Error::RangeError { start: 9, end: 3 })
    ));
    assert!(!view.has_edits().unwrap());

    view.edit_range(3, 9, 0xFFu8).unwrap();
    assert_eq!(view.overlay().len(), 7);
}

#[test]
fn test_lenient_ranges_through_view() {
    let (_dir, path, mut view) = open_view(&[0; 16], Config::default());
    view.edit_range(9, 3, 0xFFu8).unwrap();
    view.save(false).unwrap();
    let saved = read_back(&path);
    assert_eq!(&saved[3..10], &[0xFF; 7]);
    assert_eq!(saved[2], 0);
    assert_eq!(saved[10], 0);
}

// =============================================================================
// Overlay selection
// =============================================================================

#[test]
fn test_config_selects_overlay() {
    for kind in [OverlayKind::Log, OverlayKind::Map] {
        let (_dir, _path, view) = open_view(&[0; 4], Config::default().overlay(kind));
        assert_eq!(view.overlay().name(), kind.name());
    }
}

#[test]
fn test_custom_overlay_injection() {
    let (_dir, path) = create_file(&[0; 8]);
    let mut overlay = MapOverlay::new(RangeOrder::Lenient);
    overlay.store_offset(3, 0x33).unwrap();

    let mut view = View::with_overlay(&path, Config::default(), Box::new(overlay));
    view.init().unwrap();
    assert_eq!(view.read(0, 8).unwrap()[3], 0x33);

    view.save(false).unwrap();
    assert_eq!(read_back(&path)[3], 0x33);
}

#[test]
fn test_edit_offsets_by_offset_map() {
    let (_dir, _path, mut view) = open_view(&[0; 16], Config::default());
    let mut values = std::collections::BTreeMap::new();
    values.insert(2u64, 0x22u8);
    values.insert(12, 0xCC);
    view.edit_offsets(&[2, 7, 12], Values::ByOffset(&values))
        .unwrap();

    assert_eq!(view.pending(2).unwrap(), Lookup::Present(0x22));
    assert_eq!(view.pending(7).unwrap(), Lookup::NotPresent);
    assert_eq!(view.pending(12).unwrap(), Lookup::Present(0xCC));
}

// =============================================================================
// Inspection
// =============================================================================

#[test]
fn test_inspect_sees_edits() {
    let (_dir, _path, mut view) = open_view(&[0; 16], Config::default());
    view.edit_range(4, 7, &[0x3Fu8, 0x80, 0x00, 0x00][..]).unwrap();

    let big = view.inspect(4, Endian::Big).unwrap();
    assert_eq!(big.f32, Some(1.0));
    assert_eq!(big.u8, Some(0x3F));
    assert_eq!(big.u64, Some(0x3F80_0000_0000_0000));

    let little = view.inspect(4, Endian::Little).unwrap();
    assert_eq!(little.u16, Some(0x803F));
}

#[test]
fn test_line_from_window() {
    let (_dir, _path, mut view) = open_view(b"Hello\x00\x01World", Config::default());
    view.set_position(2);
    view.load_view(false).unwrap();

    let line = view.line(0, 8).unwrap();
    assert_eq!(line.offset, 2);
    assert_eq!(line.render_text('.'), "llo..Wor");
    assert_eq!(view.file_offset(5), Some(7));
}

// =============================================================================
// Lifecycle
// =============================================================================

#[test]
fn test_failed_then_retry() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("later.bin");
    let mut view = View::new(&path, Config::default());

    assert!(view.init().is_err());
    assert_eq!(view.state(), ViewState::Failed);

    std::fs::write(&path, [1, 2, 3]).unwrap();
    view.init().unwrap();
    assert_eq!(view.state(), ViewState::Ready);
    assert!(view.failure().is_none());
    assert_eq!(view.size().unwrap(), 3);
}

#[test]
fn test_save_progress_reaches_total() {
    #[derive(Clone, Default)]
    struct Progress(Arc<Mutex<Vec<(u64, u64)>>>);

    impl ViewObserver for Progress {
        fn on_save_progress(&mut self, done: u64, total: u64) {
            self.0.lock().unwrap().push((done, total));
        }
    }

    let config = Config::new().max_chunk_size(10).window_size(10);
    let (_dir, _path, mut view) = open_view(&[0; 35], config);
    let progress = Progress::default();
    view.set_observer(progress.clone());

    view.edit(34, 1).unwrap();
    view.save(false).unwrap();

    let steps = progress.0.lock().unwrap().clone();
    assert_eq!(steps, vec![(10, 35), (20, 35), (30, 35), (35, 35)]);
}
