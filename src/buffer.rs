//! Owned byte buffer with endian-aware typed accessors.
//!
//! [`ByteBuffer`] backs the materialized window of a [`View`](crate::View)
//! and doubles as scratch storage when decoding values at an offset. Every
//! accessor checks `offset + size` against the buffer length and fails with
//! [`Error::OutOfBounds`] instead of panicking.
//!
//! # Example
//!
//! ```rust
//! use hexlay::buffer::{ByteBuffer, Endian};
//!
//! let mut buf = ByteBuffer::zeroed(8);
//! buf.write_u32(0, 0xDEAD_BEEF, Endian::Big)?;
//! assert_eq!(buf.read_u8(0)?, 0xDE);
//! assert_eq!(buf.read_u32(0, Endian::Little)?, 0xEFBE_ADDE);
//! # Ok::<(), hexlay::Error>(())
//! ```

use crate::{Error, Result};

/// Byte order of a multi-byte value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Endian {
    /// Most significant byte first.
    #[default]
    Big,
    /// Least significant byte first.
    Little,
}

impl std::str::FromStr for Endian {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "big" | "be" => Ok(Endian::Big),
            "little" | "le" => Ok(Endian::Little),
            other => Err(Error::InvalidConfig(format!("unknown endianness '{}'", other))),
        }
    }
}

/// Text encodings accepted by [`ByteBuffer::write_string`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Encoding {
    /// UTF-8.
    #[default]
    Utf8,
    /// One byte per character; characters above U+00FF are rejected.
    Latin1,
}

impl Encoding {
    /// Encodes `text` into bytes.
    pub fn encode(self, text: &str) -> Result<Vec<u8>> {
        match self {
            Encoding::Utf8 => Ok(text.as_bytes().to_vec()),
            Encoding::Latin1 => text
                .chars()
                .map(|c| {
                    u8::try_from(u32::from(c)).map_err(|_| Error::UnsupportedEncoding {
                        character: c,
                        encoding: "latin-1",
                    })
                })
                .collect(),
        }
    }
}

macro_rules! typed_accessors {
    ($($ty:ty => $read:ident, $write:ident);* $(;)?) => {
        $(
            #[doc = concat!("Reads a `", stringify!($ty), "` at `offset` in the given byte order.")]
            pub fn $read(&self, offset: usize, endian: Endian) -> Result<$ty> {
                let bytes = self.array::<{ std::mem::size_of::<$ty>() }>(offset)?;
                Ok(match endian {
                    Endian::Big => <$ty>::from_be_bytes(bytes),
                    Endian::Little => <$ty>::from_le_bytes(bytes),
                })
            }

            #[doc = concat!("Writes a `", stringify!($ty), "` at `offset` in the given byte order.")]
            pub fn $write(&mut self, offset: usize, value: $ty, endian: Endian) -> Result<()> {
                let bytes = match endian {
                    Endian::Big => value.to_be_bytes(),
                    Endian::Little => value.to_le_bytes(),
                };
                self.put(offset, &bytes)
            }
        )*
    };
}

/// Fixed-width values readable in the buffer's default byte order through
/// [`ByteBuffer::get`] and [`ByteBuffer::set`].
pub trait Scalar: Copy {
    /// Reads a value at `offset`.
    fn read_from(buf: &ByteBuffer, offset: usize, endian: Endian) -> Result<Self>;

    /// Writes the value at `offset`.
    fn write_to(self, buf: &mut ByteBuffer, offset: usize, endian: Endian) -> Result<()>;
}

macro_rules! scalar_impls {
    ($($ty:ty => $read:ident, $write:ident);* $(;)?) => {
        $(
            impl Scalar for $ty {
                fn read_from(buf: &ByteBuffer, offset: usize, endian: Endian) -> Result<Self> {
                    buf.$read(offset, endian)
                }

                fn write_to(self, buf: &mut ByteBuffer, offset: usize, endian: Endian) -> Result<()> {
                    buf.$write(offset, self, endian)
                }
            }
        )*
    };
}

scalar_impls! {
    u16 => read_u16, write_u16;
    i16 => read_i16, write_i16;
    u32 => read_u32, write_u32;
    i32 => read_i32, write_i32;
    u64 => read_u64, write_u64;
    i64 => read_i64, write_i64;
    u128 => read_u128, write_u128;
    i128 => read_i128, write_i128;
    f32 => read_f32, write_f32;
    f64 => read_f64, write_f64;
}

impl Scalar for u8 {
    fn read_from(buf: &ByteBuffer, offset: usize, _: Endian) -> Result<Self> {
        buf.read_u8(offset)
    }

    fn write_to(self, buf: &mut ByteBuffer, offset: usize, _: Endian) -> Result<()> {
        buf.write_u8(offset, self)
    }
}

impl Scalar for i8 {
    fn read_from(buf: &ByteBuffer, offset: usize, _: Endian) -> Result<Self> {
        buf.read_i8(offset)
    }

    fn write_to(self, buf: &mut ByteBuffer, offset: usize, _: Endian) -> Result<()> {
        buf.write_i8(offset, self)
    }
}

/// An owned, resizable byte region with typed accessors.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ByteBuffer {
    data: Vec<u8>,
    endian: Endian,
}

impl ByteBuffer {
    /// Creates an empty buffer with big-endian default byte order.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a zero-filled buffer of `len` bytes.
    pub fn zeroed(len: usize) -> Self {
        Self {
            data: vec![0; len],
            endian: Endian::Big,
        }
    }

    /// Sets the default byte order reported by [`endian`](Self::endian).
    pub fn with_endian(mut self, endian: Endian) -> Self {
        self.endian = endian;
        self
    }

    /// Returns the default byte order of this buffer.
    pub fn endian(&self) -> Endian {
        self.endian
    }

    /// Changes the default byte order of this buffer.
    pub fn set_endian(&mut self, endian: Endian) {
        self.endian = endian;
    }

    /// Returns the buffer length in bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns true if the buffer holds no bytes.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns the contents as a slice.
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    /// Returns the contents as a mutable slice.
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Consumes the buffer and returns its bytes.
    pub fn into_vec(self) -> Vec<u8> {
        self.data
    }

    /// Replaces the contents wholesale, returning the previous bytes.
    pub fn swap_buffer(&mut self, data: Vec<u8>) -> Vec<u8> {
        std::mem::replace(&mut self.data, data)
    }

    /// Resizes the buffer, zero-filling any new bytes.
    pub fn resize(&mut self, len: usize) {
        self.data.resize(len, 0);
    }

    /// Zero-fills the buffer in place.
    pub fn clear(&mut self) {
        self.data.fill(0);
    }

    /// Returns an independent copy of `start..end`.
    pub fn slice(&self, start: usize, end: usize) -> Result<ByteBuffer> {
        if start > end {
            return Err(Error::OutOfBounds {
                offset: start,
                size: 0,
                capacity: self.data.len(),
            });
        }
        let bytes = self.range(start, end - start)?;
        Ok(ByteBuffer {
            data: bytes.to_vec(),
            endian: self.endian,
        })
    }

    /// Returns a lazy iterator over the bytes.
    ///
    /// The iterator is finite and can be restarted by cloning it before use.
    pub fn values(&self) -> impl Iterator<Item = u8> + Clone + '_ {
        self.data.iter().copied()
    }

    /// Reads a single unsigned byte.
    pub fn read_u8(&self, offset: usize) -> Result<u8> {
        Ok(self.array::<1>(offset)?[0])
    }

    /// Reads a single signed byte.
    pub fn read_i8(&self, offset: usize) -> Result<i8> {
        Ok(i8::from_be_bytes(self.array::<1>(offset)?))
    }

    /// Writes a single unsigned byte.
    pub fn write_u8(&mut self, offset: usize, value: u8) -> Result<()> {
        self.put(offset, &[value])
    }

    /// Writes a single signed byte.
    pub fn write_i8(&mut self, offset: usize, value: i8) -> Result<()> {
        self.put(offset, &value.to_be_bytes())
    }

    typed_accessors! {
        u16 => read_u16, write_u16;
        i16 => read_i16, write_i16;
        u32 => read_u32, write_u32;
        i32 => read_i32, write_i32;
        u64 => read_u64, write_u64;
        i64 => read_i64, write_i64;
        u128 => read_u128, write_u128;
        i128 => read_i128, write_i128;
        f32 => read_f32, write_f32;
        f64 => read_f64, write_f64;
    }

    /// Reads a value at `offset` in the buffer's default byte order.
    pub fn get<T: Scalar>(&self, offset: usize) -> Result<T> {
        T::read_from(self, offset, self.endian)
    }

    /// Writes a value at `offset` in the buffer's default byte order.
    pub fn set<T: Scalar>(&mut self, offset: usize, value: T) -> Result<()> {
        let endian = self.endian;
        value.write_to(self, offset, endian)
    }

    /// Writes `text` at `offset` in the given encoding.
    ///
    /// Returns the number of bytes written. Fails without writing anything if
    /// the encoded text does not fit.
    pub fn write_string(&mut self, text: &str, offset: usize, encoding: Encoding) -> Result<usize> {
        let bytes = encoding.encode(text)?;
        self.put(offset, &bytes)?;
        Ok(bytes.len())
    }

    /// Copies `bytes` into the buffer at `offset`.
    pub fn put(&mut self, offset: usize, bytes: &[u8]) -> Result<()> {
        let capacity = self.data.len();
        let end = offset
            .checked_add(bytes.len())
            .filter(|&end| end <= capacity)
            .ok_or(Error::OutOfBounds {
                offset,
                size: bytes.len(),
                capacity,
            })?;
        self.data[offset..end].copy_from_slice(bytes);
        Ok(())
    }

    fn range(&self, offset: usize, size: usize) -> Result<&[u8]> {
        let capacity = self.data.len();
        offset
            .checked_add(size)
            .filter(|&end| end <= capacity)
            .map(|end| &self.data[offset..end])
            .ok_or(Error::OutOfBounds {
                offset,
                size,
                capacity,
            })
    }

    fn array<const N: usize>(&self, offset: usize) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.range(offset, N)?);
        Ok(out)
    }
}

impl From<Vec<u8>> for ByteBuffer {
    fn from(data: Vec<u8>) -> Self {
        Self {
            data,
            endian: Endian::Big,
        }
    }
}

impl From<&[u8]> for ByteBuffer {
    fn from(data: &[u8]) -> Self {
        Self::from(data.to_vec())
    }
}

impl AsRef<[u8]> for ByteBuffer {
    fn as_ref(&self) -> &[u8] {
        &self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_u16_both_endians() {
        let mut buf = ByteBuffer::zeroed(2);
        buf.write_u16(0, 0x1234, Endian::Big).unwrap();
        assert_eq!(buf.as_slice(), &[0x12, 0x34]);
        buf.write_u16(0, 0x1234, Endian::Little).unwrap();
        assert_eq!(buf.as_slice(), &[0x34, 0x12]);
    }

    // Writes MIN and MAX of each width at an unaligned offset that ends
    // flush with the buffer, then checks the raw bytes and the read-back.
    macro_rules! assert_extremes {
        ($t:ty, $read:ident, $write:ident) => {
            for value in [<$t>::MIN, <$t>::MAX] {
                let offset = 3;
                let mut buf = ByteBuffer::zeroed(offset + std::mem::size_of::<$t>());
                buf.$write(offset, value).unwrap();
                assert_eq!(&buf.as_slice()[offset..], &value.to_ne_bytes()[..]);
                assert_eq!(buf.$read(offset).unwrap(), value);
            }
        };
        ($t:ty, $read:ident, $write:ident, endian) => {
            for endian in [Endian::Big, Endian::Little] {
                for value in [<$t>::MIN, <$t>::MAX] {
                    let offset = 3;
                    let mut buf = ByteBuffer::zeroed(offset + std::mem::size_of::<$t>());
                    buf.$write(offset, value, endian).unwrap();
                    let expected = match endian {
                        Endian::Big => value.to_be_bytes(),
                        Endian::Little => value.to_le_bytes(),
                    };
                    assert_eq!(&buf.as_slice()[offset..], &expected[..], "{:?}", endian);
                    let back = buf.$read(offset, endian).unwrap();
                    assert_eq!(back.to_ne_bytes(), value.to_ne_bytes(), "{:?}", endian);
                }
            }
        };
    }

    #[test]
    fn test_extremes_every_width() {
        assert_extremes!(u8, read_u8, write_u8);
        assert_extremes!(i8, read_i8, write_i8);
        assert_extremes!(u16, read_u16, write_u16, endian);
        assert_extremes!(i16, read_i16, write_i16, endian);
        assert_extremes!(u32, read_u32, write_u32, endian);
        assert_extremes!(i32, read_i32, write_i32, endian);
        assert_extremes!(u64, read_u64, write_u64, endian);
        assert_extremes!(i64, read_i64, write_i64, endian);
        assert_extremes!(u128, read_u128, write_u128, endian);
        assert_extremes!(i128, read_i128, write_i128, endian);
        assert_extremes!(f32, read_f32, write_f32, endian);
        assert_extremes!(f64, read_f64, write_f64, endian);
    }

    #[test]
    fn test_signed_reinterpretation() {
        let buf = ByteBuffer::from(vec![0xFF, 0xFE]);
        assert_eq!(buf.read_i8(0).unwrap(), -1);
        assert_eq!(buf.read_u8(0).unwrap(), 255);
        assert_eq!(buf.read_i16(0, Endian::Big).unwrap(), -2);
        assert_eq!(buf.read_i16(0, Endian::Little).unwrap(), -257);
    }

    #[test]
    fn test_floats() {
        let mut buf = ByteBuffer::zeroed(8);
        buf.write_f32(0, 1.5, Endian::Big).unwrap();
        assert_eq!(&buf.as_slice()[..4], &[0x3F, 0xC0, 0x00, 0x00]);
        assert_eq!(buf.read_f32(0, Endian::Big).unwrap(), 1.5);

        buf.write_f64(0, -2.25, Endian::Little).unwrap();
        assert_eq!(buf.read_f64(0, Endian::Little).unwrap(), -2.25);
    }

    #[test]
    fn test_out_of_bounds() {
        let mut buf = ByteBuffer::zeroed(4);
        assert!(matches!(
            buf.read_u32(1, Endian::Big),
            Err(Error::OutOfBounds {
                offset: 1,
                size: 4,
                capacity: 4
            })
        ));
        assert!(buf.read_u8(4).is_err());
        assert!(buf.write_u16(3, 1, Endian::Big).is_err());
        assert!(buf.read_u8(usize::MAX).is_err());
        // Failed writes leave the buffer untouched
        assert_eq!(buf.as_slice(), &[0, 0, 0, 0]);
    }

    #[test]
    fn test_write_string() {
        let mut buf = ByteBuffer::zeroed(6);
        assert_eq!(buf.write_string("héy", 1, Encoding::Utf8).unwrap(), 4);
        assert_eq!(buf.as_slice(), &[0, b'h', 0xC3, 0xA9, b'y', 0]);

        assert_eq!(buf.write_string("hé", 0, Encoding::Latin1).unwrap(), 2);
        assert_eq!(&buf.as_slice()[..2], &[b'h', 0xE9]);

        assert!(matches!(
            buf.write_string("€", 0, Encoding::Latin1),
            Err(Error::UnsupportedEncoding { character: '€', .. })
        ));
        assert!(buf.write_string("too long", 0, Encoding::Utf8).is_err());
    }

    #[test]
    fn test_slice_is_independent() {
        let mut buf = ByteBuffer::from(vec![1, 2, 3, 4, 5]);
        let part = buf.slice(1, 4).unwrap();
        assert_eq!(part.as_slice(), &[2, 3, 4]);
        buf.clear();
        assert_eq!(part.as_slice(), &[2, 3, 4]);
        assert_eq!(buf.as_slice(), &[0, 0, 0, 0, 0]);
        assert!(buf.slice(3, 2).is_err());
        assert!(buf.slice(0, 6).is_err());
    }

    #[test]
    fn test_values_restartable() {
        let buf = ByteBuffer::from(vec![7, 8, 9]);
        let iter = buf.values();
        let again = iter.clone();
        assert_eq!(iter.collect::<Vec<_>>(), vec![7, 8, 9]);
        assert_eq!(again.sum::<u8>(), 24);
    }

    #[test]
    fn test_swap_and_resize() {
        let mut buf = ByteBuffer::new().with_endian(Endian::Little);
        assert!(buf.is_empty());
        let old = buf.swap_buffer(vec![1, 2]);
        assert!(old.is_empty());
        buf.resize(4);
        assert_eq!(buf.as_slice(), &[1, 2, 0, 0]);
        assert_eq!(buf.endian(), Endian::Little);
    }

    #[test]
    fn test_default_endian_accessors() {
        let mut buf = ByteBuffer::zeroed(4);
        buf.set(0, 0x0102_0304u32).unwrap();
        assert_eq!(buf.as_slice(), &[1, 2, 3, 4]);
        assert_eq!(buf.get::<u16>(2).unwrap(), 0x0304);

        buf.set_endian(Endian::Little);
        assert_eq!(buf.get::<u16>(2).unwrap(), 0x0403);
        buf.set(0, -1i8).unwrap();
        assert_eq!(buf.get::<u8>(0).unwrap(), 0xFF);
        assert!(buf.get::<u64>(0).is_err());
    }

    #[test]
    fn test_endian_from_str() {
        assert_eq!("LE".parse::<Endian>().unwrap(), Endian::Little);
        assert_eq!("big".parse::<Endian>().unwrap(), Endian::Big);
        assert!("middle".parse::<Endian>().is_err());
    }
}
