//! Length-prefixed event records: a 3-word header, the payload, then padding
//! up to the next 32-bit boundary, matching the on-disk layout the reader
//! and writer agree on.

use std::io::{Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::error::{Error, Result};

pub const RECORD_MARKER: u32 = 0xfeed_1234;
/// Marks the end-of-file trailer record, distinguishing it from an ordinary
/// event record so a sequential reader knows to stop asking for more events.
pub const TRAILER_MARKER: u32 = 0xfeed_face;
pub const RECORD_HEADER_BYTES: usize = 12;

/// Rounds `n` up to the next multiple of 4.
pub fn pad_to_word(n: usize) -> usize {
    (n + 3) & !3
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordHeader {
    pub marker: u32,
    pub size_bytes: u32,
    pub reserved: u32,
}

impl RecordHeader {
    pub fn for_payload(size_bytes: u32) -> Self {
        Self { marker: RECORD_MARKER, size_bytes, reserved: 0 }
    }

    pub fn write<W: Write>(&self, w: &mut W) -> std::io::Result<()> {
        w.write_u32::<LittleEndian>(self.marker)?;
        w.write_u32::<LittleEndian>(self.size_bytes)?;
        w.write_u32::<LittleEndian>(self.reserved)
    }

    pub fn read<R: Read>(r: &mut R) -> std::io::Result<Self> {
        Ok(Self {
            marker: r.read_u32::<LittleEndian>()?,
            size_bytes: r.read_u32::<LittleEndian>()?,
            reserved: r.read_u32::<LittleEndian>()?,
        })
    }
}

/// Writes one record (header, payload, padding) to `w`, returning the total
/// number of bytes written.
pub fn write_record<W: Write>(w: &mut W, payload: &[u8]) -> std::io::Result<u64> {
    let header = RecordHeader::for_payload(payload.len() as u32);
    header.write(w)?;
    w.write_all(payload)?;
    let pad = pad_to_word(payload.len()) - payload.len();
    if pad > 0 {
        w.write_all(&[0u8; 3][..pad])?;
    }
    Ok((RECORD_HEADER_BYTES + pad_to_word(payload.len())) as u64)
}

/// Reads one record's payload, given its already-read header.
pub fn read_record_body<R: Read>(r: &mut R, header: &RecordHeader) -> Result<Vec<u8>> {
    let mut payload = vec![0u8; header.size_bytes as usize];
    r.read_exact(&mut payload)?;
    let pad = pad_to_word(payload.len()) - payload.len();
    if pad > 0 {
        let mut skip = [0u8; 3];
        r.read_exact(&mut skip[..pad])?;
    }
    Ok(payload)
}

/// Reads one record's header and payload from `r`, skipping the trailing
/// pad. Rejects anything other than an ordinary event record; callers that
/// also need to recognize the trailer should read the header themselves and
/// dispatch on [`RecordHeader::marker`].
pub fn read_record<R: Read>(r: &mut R) -> Result<(RecordHeader, Vec<u8>)> {
    let header = RecordHeader::read(r)?;
    if header.marker != RECORD_MARKER {
        return Err(Error::InternalError(format!(
            "expected record marker {RECORD_MARKER:#010x}, found {:#010x}",
            header.marker
        )));
    }
    let payload = read_record_body(r, &header)?;
    Ok((header, payload))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pads_to_the_next_word_boundary() {
        assert_eq!(pad_to_word(0), 0);
        assert_eq!(pad_to_word(1), 4);
        assert_eq!(pad_to_word(4), 4);
        assert_eq!(pad_to_word(5), 8);
    }

    #[test]
    fn roundtrips_an_unaligned_payload() {
        let payload = b"hello".to_vec();
        let mut buf = Vec::new();
        let written = write_record(&mut buf, &payload).unwrap();
        assert_eq!(written as usize, buf.len());
        let (header, back) = read_record(&mut buf.as_slice()).unwrap();
        assert_eq!(header.size_bytes as usize, payload.len());
        assert_eq!(back, payload);
    }

    #[test]
    fn rejects_a_bad_marker() {
        let mut buf = Vec::new();
        buf.write_u32::<LittleEndian>(0xdead_beef).unwrap();
        buf.write_u32::<LittleEndian>(0).unwrap();
        buf.write_u32::<LittleEndian>(0).unwrap();
        assert!(read_record(&mut buf.as_slice()).is_err());
    }
}
