//! Fuzz target driving both overlay strategies with the same operations.
//!
//! Each 4-byte group of input decodes to one operation. After every operation
//! the log and map overlays must agree on every offset in the small address
//! space the operations touch.
//!
//! Run with: cargo +nightly fuzz run overlay_ops

#![no_main]

use hexlay::{EditOverlay, LogOverlay, MapOverlay, RangeOrder, Values};
use libfuzzer_sys::fuzz_target;

const SPACE: u64 = 64;

fuzz_target!(|data: &[u8]| {
    let mut log = LogOverlay::new(RangeOrder::Lenient);
    let mut map = MapOverlay::new(RangeOrder::Lenient);

    for op in data.chunks_exact(4) {
        let a = u64::from(op[1]) % SPACE;
        let b = u64::from(op[2]) % SPACE;
        let value = op[3];

        match op[0] % 6 {
            0 => {
                log.store_offset(a, value).unwrap();
                map.store_offset(a, value).unwrap();
            }
            1 => {
                log.store_offset_range(a, b, Values::Fill(value)).unwrap();
                map.store_offset_range(a, b, Values::Fill(value)).unwrap();
            }
            2 => {
                let seq = [value, value.wrapping_add(1), value.wrapping_add(2)];
                log.store_offset_range(a, b, Values::Sequence(&seq)).unwrap();
                map.store_offset_range(a, b, Values::Sequence(&seq)).unwrap();
            }
            3 => assert_eq!(log.take(a).unwrap(), map.take(a).unwrap()),
            4 => assert_eq!(
                log.get_offset_range(a, b, true).unwrap(),
                map.get_offset_range(a, b, true).unwrap()
            ),
            _ => log.optimize().unwrap(),
        }

        assert_eq!(
            log.peek_range(0, SPACE - 1).unwrap(),
            map.peek_range(0, SPACE - 1).unwrap()
        );
        assert_eq!(log.has_edits().unwrap(), map.has_edits().unwrap());

        let mut via_log = [0u8; 16];
        let mut via_map = [0u8; 16];
        let start = u64::from(value) % SPACE;
        log.overlay_buffer(start, &mut via_log).unwrap();
        map.overlay_buffer(start, &mut via_map).unwrap();
        assert_eq!(via_log, via_map);
    }
});
