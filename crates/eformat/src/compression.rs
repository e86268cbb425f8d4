//! Payload compression adapter, grounded in the low-bandwidth transport
//! codec's threshold/ratio design (`transport/lowbw/compress.rs` in the
//! teacher) but adapted to this format's fixed per-fragment compression
//! type rather than a per-message skip/accept decision.

use std::io::{Read, Write};

use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;

use crate::Error;

/// Compression applied to a fragment's payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum CompressionType {
    None = 0x0,
    Zlib = 0x1,
    #[cfg(feature = "zstd")]
    Zstd = 0x2,
    Reserved = 0xff,
}

impl CompressionType {
    pub fn from_u32(v: u32) -> Result<Self, Error> {
        match v {
            0x0 => Ok(CompressionType::None),
            0x1 => Ok(CompressionType::Zlib),
            #[cfg(feature = "zstd")]
            0x2 => Ok(CompressionType::Zstd),
            0xff => Ok(CompressionType::Reserved),
            other => Err(Error::UnknownCompressionType(other)),
        }
    }

    pub fn code(self) -> u32 {
        self as u32
    }
}

/// A growable output buffer, matching the original library's split between
/// a destructive resize (`realloc`) and a content-preserving one (`grow`).
pub trait Buffer {
    /// Resizes to exactly `new_size` bytes, discarding any prior content.
    fn realloc(&mut self, new_size: usize);
    /// Grows to at least `new_size` bytes, preserving existing content.
    fn grow(&mut self, new_size: usize);
    fn as_mut_slice(&mut self) -> &mut [u8];
    fn as_slice(&self) -> &[u8];
    fn len(&self) -> usize;
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Buffer for Vec<u8> {
    fn realloc(&mut self, new_size: usize) {
        self.clear();
        self.resize(new_size, 0);
    }

    fn grow(&mut self, new_size: usize) {
        if new_size > self.len() {
            self.resize(new_size, 0);
        }
    }

    fn as_mut_slice(&mut self) -> &mut [u8] {
        self
    }

    fn as_slice(&self) -> &[u8] {
        self
    }

    fn len(&self) -> usize {
        Vec::len(self)
    }
}

/// Compresses `src` into `out`, at the given zlib level (1-9, clamped).
///
/// `out` is `realloc`'d to the exact compressed size.
pub fn compress(kind: CompressionType, src: &[u8], level: u32, out: &mut impl Buffer) -> Result<(), Error> {
    match kind {
        CompressionType::None => {
            out.realloc(src.len());
            out.as_mut_slice().copy_from_slice(src);
            Ok(())
        }
        CompressionType::Zlib => {
            let level = level.clamp(0, 9);
            let mut encoder = ZlibEncoder::new(Vec::new(), Compression::new(level));
            encoder
                .write_all(src)
                .map_err(|e| Error::CompressionFailure(e.to_string()))?;
            let compressed = encoder
                .finish()
                .map_err(|e| Error::CompressionFailure(e.to_string()))?;
            out.realloc(compressed.len());
            out.as_mut_slice().copy_from_slice(&compressed);
            Ok(())
        }
        #[cfg(feature = "zstd")]
        CompressionType::Zstd => {
            let compressed = zstd::encode_all(src, level as i32)
                .map_err(|e| Error::CompressionFailure(e.to_string()))?;
            out.realloc(compressed.len());
            out.as_mut_slice().copy_from_slice(&compressed);
            Ok(())
        }
        CompressionType::Reserved => Err(Error::UnknownCompressionType(CompressionType::Reserved.code())),
    }
}

/// Decompresses `src` (compressed with `kind`) into `out`, expecting exactly
/// `expected_size` output bytes.
///
/// On failure, `src` is copied verbatim into `out` so the caller still has
/// *something* to look at, and the error is returned rather than swallowed;
/// callers must check the `Result`, not just `out`'s contents.
pub fn uncompress(
    kind: CompressionType,
    src: &[u8],
    expected_size: usize,
    out: &mut impl Buffer,
) -> Result<(), Error> {
    let result = match kind {
        CompressionType::None => {
            out.realloc(src.len());
            out.as_mut_slice().copy_from_slice(src);
            return Ok(());
        }
        CompressionType::Zlib => {
            let mut decoder = ZlibDecoder::new(src);
            let mut buf = Vec::with_capacity(expected_size);
            decoder
                .read_to_end(&mut buf)
                .map_err(|e| Error::CompressionFailure(e.to_string()))
                .map(|_| buf)
        }
        #[cfg(feature = "zstd")]
        CompressionType::Zstd => {
            zstd::decode_all(src).map_err(|e| Error::CompressionFailure(e.to_string()))
        }
        CompressionType::Reserved => Err(Error::UnknownCompressionType(CompressionType::Reserved.code())),
    };

    match result {
        Ok(buf) if buf.len() == expected_size => {
            out.realloc(buf.len());
            out.as_mut_slice().copy_from_slice(&buf);
            Ok(())
        }
        Ok(buf) => {
            out.realloc(src.len());
            out.as_mut_slice().copy_from_slice(src);
            Err(Error::WrongUncompressedSize {
                expected: expected_size as u32,
                got: buf.len() as u32,
            })
        }
        Err(e) => {
            out.realloc(src.len());
            out.as_mut_slice().copy_from_slice(src);
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn none_is_a_plain_copy() {
        let src = b"hello world".to_vec();
        let mut out = Vec::new();
        compress(CompressionType::None, &src, 0, &mut out).unwrap();
        assert_eq!(out, src);
        let mut back = Vec::new();
        uncompress(CompressionType::None, &out, src.len(), &mut back).unwrap();
        assert_eq!(back, src);
    }

    #[test]
    fn zlib_roundtrip() {
        let src: Vec<u8> = (0..4096u32).map(|i| (i % 251) as u8).collect();
        let mut compressed = Vec::new();
        compress(CompressionType::Zlib, &src, 6, &mut compressed).unwrap();
        assert!(compressed.len() < src.len());
        let mut decompressed = Vec::new();
        uncompress(CompressionType::Zlib, &compressed, src.len(), &mut decompressed).unwrap();
        assert_eq!(decompressed, src);
    }

    #[test]
    fn decompression_failure_preserves_compressed_bytes() {
        let bogus = vec![0xffu8; 16];
        let mut out = vec![9u8; 4];
        let err = uncompress(CompressionType::Zlib, &bogus, 100, &mut out).unwrap_err();
        assert!(matches!(err, Error::CompressionFailure(_)));
        assert_eq!(out, bogus);
    }

    #[test]
    fn wrong_size_is_reported_not_swallowed() {
        let src: Vec<u8> = (0..64u8).collect();
        let mut compressed = Vec::new();
        compress(CompressionType::Zlib, &src, 6, &mut compressed).unwrap();
        let mut out = Vec::new();
        let err = uncompress(CompressionType::Zlib, &compressed, src.len() + 1, &mut out).unwrap_err();
        assert!(matches!(err, Error::WrongUncompressedSize { .. }));
        assert_eq!(out, compressed);
    }

    #[test]
    fn from_u32_rejects_unknown_codes() {
        assert!(CompressionType::from_u32(0x42).is_err());
        assert_eq!(CompressionType::from_u32(0x0).unwrap(), CompressionType::None);
    }

    #[test]
    fn buffer_grow_preserves_content_realloc_does_not() {
        let mut buf = vec![1u8, 2, 3];
        buf.grow(5);
        assert_eq!(&buf[..3], &[1, 2, 3]);
        assert_eq!(buf.len(), 5);
        buf.realloc(2);
        assert_eq!(buf.len(), 2);
        assert_eq!(buf, vec![0, 0]);
    }
}
