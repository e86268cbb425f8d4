//! End-of-file trailer: written once, after the last event record, so a
//! reader can recover per-file and per-sequence summary counters without
//! rescanning every record.

use std::io::{Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::error::{Error, Result};
use crate::record::{pad_to_word, RecordHeader, TRAILER_MARKER};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EndOfFileRecord {
    pub end_date: u32,
    pub end_time: u32,
    pub events_in_file: u32,
    pub data_mb_in_file: u32,
    pub events_in_file_sequence: u32,
    pub data_mb_in_file_sequence: u32,
    pub adler32: u32,
}

impl EndOfFileRecord {
    pub fn write<W: Write>(&self, w: &mut W) -> std::io::Result<()> {
        w.write_u32::<LittleEndian>(self.end_date)?;
        w.write_u32::<LittleEndian>(self.end_time)?;
        w.write_u32::<LittleEndian>(self.events_in_file)?;
        w.write_u32::<LittleEndian>(self.data_mb_in_file)?;
        w.write_u32::<LittleEndian>(self.events_in_file_sequence)?;
        w.write_u32::<LittleEndian>(self.data_mb_in_file_sequence)?;
        w.write_u32::<LittleEndian>(self.adler32)
    }

    pub fn read<R: Read>(r: &mut R) -> std::io::Result<Self> {
        Ok(Self {
            end_date: r.read_u32::<LittleEndian>()?,
            end_time: r.read_u32::<LittleEndian>()?,
            events_in_file: r.read_u32::<LittleEndian>()?,
            data_mb_in_file: r.read_u32::<LittleEndian>()?,
            events_in_file_sequence: r.read_u32::<LittleEndian>()?,
            data_mb_in_file_sequence: r.read_u32::<LittleEndian>()?,
            adler32: r.read_u32::<LittleEndian>()?,
        })
    }

    pub const ENCODED_BYTES: usize = 28;

    /// Writes the trailer wrapped in a record header carrying
    /// [`TRAILER_MARKER`], so a sequential reader can tell it apart from an
    /// ordinary event record without knowing the file's event count ahead of
    /// time.
    pub fn write_as_record<W: Write>(&self, w: &mut W) -> std::io::Result<()> {
        let mut body = Vec::with_capacity(Self::ENCODED_BYTES);
        self.write(&mut body)?;
        RecordHeader { marker: TRAILER_MARKER, size_bytes: body.len() as u32, reserved: 0 }.write(w)?;
        w.write_all(&body)?;
        let pad = pad_to_word(body.len()) - body.len();
        if pad > 0 {
            w.write_all(&[0u8; 3][..pad])?;
        }
        Ok(())
    }

    /// Reads a trailer previously written with [`Self::write_as_record`],
    /// given the already-read record header.
    pub fn read_from_record<R: Read>(r: &mut R, header: &RecordHeader) -> Result<Self> {
        if header.marker != TRAILER_MARKER {
            return Err(Error::InternalError(format!(
                "expected trailer marker {TRAILER_MARKER:#010x}, found {:#010x}",
                header.marker
            )));
        }
        let trailer = Self::read(r)?;
        let pad = pad_to_word(header.size_bytes as usize) - header.size_bytes as usize;
        if pad > 0 {
            let mut skip = [0u8; 3];
            r.read_exact(&mut skip[..pad])?;
        }
        Ok(trailer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrips_through_bytes() {
        let trailer = EndOfFileRecord {
            end_date: 26072026,
            end_time: 130501,
            events_in_file: 1000,
            data_mb_in_file: 42,
            events_in_file_sequence: 3000,
            data_mb_in_file_sequence: 126,
            adler32: 0x1234_5678,
        };
        let mut buf = Vec::new();
        trailer.write(&mut buf).unwrap();
        assert_eq!(buf.len(), EndOfFileRecord::ENCODED_BYTES);
        let back = EndOfFileRecord::read(&mut buf.as_slice()).unwrap();
        assert_eq!(back, trailer);
    }

    #[test]
    fn record_wrapped_roundtrip_is_distinguishable_from_an_event_record() {
        let trailer = EndOfFileRecord {
            end_date: 1,
            end_time: 2,
            events_in_file: 3,
            data_mb_in_file: 4,
            events_in_file_sequence: 5,
            data_mb_in_file_sequence: 6,
            adler32: 7,
        };
        let mut buf = Vec::new();
        trailer.write_as_record(&mut buf).unwrap();

        let mut cursor = buf.as_slice();
        let header = RecordHeader::read(&mut cursor).unwrap();
        assert_eq!(header.marker, TRAILER_MARKER);
        assert_ne!(header.marker, crate::record::RECORD_MARKER);
        let back = EndOfFileRecord::read_from_record(&mut cursor, &header).unwrap();
        assert_eq!(back, trailer);
    }
}
