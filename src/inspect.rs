//! Typed interpretations of bytes at an offset, and display lines.

use crate::buffer::{ByteBuffer, Endian};

/// Number of bytes read to decode [`OffsetValues`].
pub const INSPECT_WIDTH: usize = 8;

/// The bytes at a file offset decoded as every fixed-width numeric type.
///
/// A field is `None` when fewer bytes than its width remain before the end
/// of the file.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OffsetValues {
    /// File offset the values were read from.
    pub offset: u64,
    /// Byte order used for multi-byte fields.
    pub endian: Endian,
    /// Number of bytes available at the offset, at most [`INSPECT_WIDTH`].
    pub available: usize,
    /// Signed 8-bit value.
    pub i8: Option<i8>,
    /// Unsigned 8-bit value.
    pub u8: Option<u8>,
    /// Signed 16-bit value.
    pub i16: Option<i16>,
    /// Unsigned 16-bit value.
    pub u16: Option<u16>,
    /// Signed 32-bit value.
    pub i32: Option<i32>,
    /// Unsigned 32-bit value.
    pub u32: Option<u32>,
    /// Signed 64-bit value.
    pub i64: Option<i64>,
    /// Unsigned 64-bit value.
    pub u64: Option<u64>,
    /// IEEE 754 single precision value.
    pub f32: Option<f32>,
    /// IEEE 754 double precision value.
    pub f64: Option<f64>,
}

impl OffsetValues {
    /// Decodes up to [`INSPECT_WIDTH`] bytes that start at `offset`.
    pub fn decode(offset: u64, bytes: &[u8], endian: Endian) -> Self {
        let available = bytes.len().min(INSPECT_WIDTH);
        let buf = ByteBuffer::from(&bytes[..available]).with_endian(endian);

        Self {
            offset,
            endian,
            available,
            i8: buf.read_i8(0).ok(),
            u8: buf.read_u8(0).ok(),
            i16: buf.read_i16(0, endian).ok(),
            u16: buf.read_u16(0, endian).ok(),
            i32: buf.read_i32(0, endian).ok(),
            u32: buf.read_u32(0, endian).ok(),
            i64: buf.read_i64(0, endian).ok(),
            u64: buf.read_u64(0, endian).ok(),
            f32: buf.read_f32(0, endian).ok(),
            f64: buf.read_f64(0, endian).ok(),
        }
    }
}

/// One row of a hex display, taken from a loaded window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    /// File offset of the first byte.
    pub offset: u64,
    /// Raw bytes of the row, with pending edits applied.
    pub bytes: Vec<u8>,
    /// Printable character per byte, `None` where the byte has no
    /// displayable glyph.
    pub text: Vec<Option<char>>,
}

impl Line {
    /// Builds a line from bytes at a file offset.
    pub fn new(offset: u64, bytes: &[u8]) -> Self {
        Self {
            offset,
            bytes: bytes.to_vec(),
            text: bytes.iter().map(|&b| displayable_char(b)).collect(),
        }
    }

    /// Renders the text column, substituting `placeholder` for bytes without
    /// a glyph.
    pub fn render_text(&self, placeholder: char) -> String {
        self.text.iter().map(|c| c.unwrap_or(placeholder)).collect()
    }

    /// Renders the bytes as space separated upper-case hex pairs.
    pub fn render_hex(&self) -> String {
        self.bytes
            .iter()
            .map(|b| format!("{:02X}", b))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Returns true if `byte` maps to a printable Latin-1 glyph.
pub fn is_displayable(byte: u8) -> bool {
    matches!(byte, 32..=127 | 161..=255)
}

/// Returns the Latin-1 character for `byte` if it is displayable.
pub fn displayable_char(byte: u8) -> Option<char> {
    is_displayable(byte).then(|| char::from(byte))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_full_width() {
        let bytes = [0x80, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07];
        let values = OffsetValues::decode(16, &bytes, Endian::Big);
        assert_eq!(values.offset, 16);
        assert_eq!(values.available, 8);
        assert_eq!(values.i8, Some(-128));
        assert_eq!(values.u8, Some(0x80));
        assert_eq!(values.u16, Some(0x8001));
        assert_eq!(values.i16, Some(0x8001u16 as i16));
        assert_eq!(values.u32, Some(0x8001_0203));
        assert_eq!(values.u64, Some(0x8001_0203_0405_0607));
    }

    #[test]
    fn test_decode_little_endian() {
        let bytes = [0x00, 0x00, 0x80, 0x3F];
        let values = OffsetValues::decode(0, &bytes, Endian::Little);
        assert_eq!(values.f32, Some(1.0));
        assert_eq!(values.u16, Some(0));
        assert_eq!(values.u64, None);
        assert_eq!(values.f64, None);
    }

    #[test]
    fn test_decode_near_eof() {
        let values = OffsetValues::decode(99, &[0xFE], Endian::Big);
        assert_eq!(values.available, 1);
        assert_eq!(values.i8, Some(-2));
        assert_eq!(values.u16, None);

        let none = OffsetValues::decode(100, &[], Endian::Big);
        assert_eq!(none.u8, None);
    }

    #[test]
    fn test_decode_ignores_extra_bytes() {
        let bytes = [1u8; 12];
        let values = OffsetValues::decode(0, &bytes, Endian::Big);
        assert_eq!(values.available, INSPECT_WIDTH);
    }

    #[test]
    fn test_displayable_ranges() {
        assert!(!is_displayable(31));
        assert!(is_displayable(b' '));
        assert!(is_displayable(127));
        assert!(!is_displayable(128));
        assert!(!is_displayable(160));
        assert!(is_displayable(161));
        assert!(is_displayable(255));
        assert_eq!(displayable_char(0xE9), Some('é'));
    }

    #[test]
    fn test_line_render() {
        let line = Line::new(0x40, &[b'H', b'i', 0x00, 0xFF]);
        assert_eq!(line.render_hex(), "48 69 00 FF");
        assert_eq!(line.render_text('.'), "Hi.ÿ");
        assert_eq!(line.text[2], None);
    }
}
