//! Stream tags: routing metadata packed into a 32-bit-word-aligned byte block
//! inside a [`crate::read::FullEventView`]'s header.

use std::collections::BTreeSet;

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::source_id::SubDetector;
use crate::Error;

/// Stream-tag type bit flags (not a sequential index — each carries its own bit).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum TagType {
    Physics = 0x1,
    Calibration = 0x2,
    /// Undocumented semantics upstream; preserved verbatim on round-trip.
    Reserved = 0x4,
    Debug = 0x8,
    Unknown = 0x10,
    Express = 0x20,
    Monitoring = 0x40,
}

impl TagType {
    pub fn from_u32(v: u32) -> Self {
        match v {
            0x1 => TagType::Physics,
            0x2 => TagType::Calibration,
            0x4 => TagType::Reserved,
            0x8 => TagType::Debug,
            0x20 => TagType::Express,
            0x40 => TagType::Monitoring,
            _ => TagType::Unknown,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TagType::Physics => "physics",
            TagType::Calibration => "calibration",
            TagType::Reserved => "reserved",
            TagType::Debug => "debug",
            TagType::Unknown => "unknown",
            TagType::Express => "express",
            TagType::Monitoring => "monitoring",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s {
            "physics" => TagType::Physics,
            "calibration" => TagType::Calibration,
            "reserved" => TagType::Reserved,
            "debug" => TagType::Debug,
            "express" => TagType::Express,
            "monitoring" => TagType::Monitoring,
            _ => TagType::Unknown,
        }
    }
}

/// One routing tag attached to an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamTag {
    pub name: String,
    pub tag_type: TagType,
    pub obeys_lumiblock: bool,
    pub robs: BTreeSet<u32>,
    pub dets: BTreeSet<u8>,
}

impl StreamTag {
    pub fn new(name: impl Into<String>, tag_type: TagType, obeys_lumiblock: bool) -> Self {
        Self {
            name: name.into(),
            tag_type,
            obeys_lumiblock,
            robs: BTreeSet::new(),
            dets: BTreeSet::new(),
        }
    }

    pub fn with_robs(mut self, robs: impl IntoIterator<Item = u32>) -> Self {
        self.robs = robs.into_iter().collect();
        self
    }

    pub fn with_dets(mut self, dets: impl IntoIterator<Item = SubDetector>) -> Self {
        self.dets = dets.into_iter().map(|d| d.code()).collect();
        self
    }

    fn name_block_len(&self) -> usize {
        // name + NUL + type_string + NUL
        self.name.len() + 1 + self.tag_type.as_str().len() + 1
    }

    /// Total size of this tag's encoded record, in 32-bit words.
    pub fn size_word(&self) -> u32 {
        let fixed = 3 + self.robs.len() + 1 + self.dets.len(); // record_size | bits | nrobs | robs | ndets | dets
        let strings_words = self.name_block_len().div_ceil(4);
        (fixed + strings_words) as u32
    }
}

/// Total size, in 32-bit words, of the encoded block for a vector of tags.
pub fn size_word(tags: &[StreamTag]) -> u32 {
    tags.iter().map(StreamTag::size_word).sum()
}

/// Encodes `tags` into a freshly allocated, word-aligned byte block.
pub fn encode(tags: &[StreamTag]) -> Vec<u8> {
    let mut out = Vec::with_capacity(size_word(tags) as usize * 4);
    for tag in tags {
        let record_size = tag.size_word();
        out.write_u32::<LittleEndian>(record_size).unwrap();
        let bits = ((tag.tag_type as u32) << 24) | if tag.obeys_lumiblock { 0x10000 } else { 0 };
        out.write_u32::<LittleEndian>(bits).unwrap();
        out.write_u32::<LittleEndian>(tag.robs.len() as u32).unwrap();
        for r in &tag.robs {
            out.write_u32::<LittleEndian>(*r).unwrap();
        }
        out.write_u32::<LittleEndian>(tag.dets.len() as u32).unwrap();
        for d in &tag.dets {
            out.write_u32::<LittleEndian>(*d as u32).unwrap();
        }
        out.extend_from_slice(tag.name.as_bytes());
        out.push(0);
        out.extend_from_slice(tag.tag_type.as_str().as_bytes());
        out.push(0);
        while !out.len().is_multiple_of(4) {
            out.push(0);
        }
    }
    out
}

/// Decodes a word-aligned byte block back into a vector of tags, tolerating
/// trailing NUL padding up to the 32-bit boundary.
pub fn decode(bytes: &[u8]) -> Result<Vec<StreamTag>, Error> {
    let mut tags = Vec::new();
    let mut cursor = bytes;
    while !cursor.is_empty() {
        if cursor.len() < 12 {
            return Err(Error::BlockSizeTooSmall { have: cursor.len() as u32 / 4, need: 3 });
        }
        let record_size = read_u32_at(cursor, 0)?;
        if record_size == 0 {
            break;
        }
        let record_bytes = record_size as usize * 4;
        if record_bytes > cursor.len() || record_bytes < 12 {
            return Err(Error::TooBigCount { count: record_size });
        }
        let record = &cursor[..record_bytes];

        let bits = read_u32_at(record, 4)?;
        let tag_type = TagType::from_u32(bits >> 24);
        let obeys_lumiblock = bits & 0x10000 != 0;

        let nrobs = read_u32_at(record, 8)? as usize;
        let mut pos = 12;
        if pos + nrobs * 4 > record.len() {
            return Err(Error::TooBigCount { count: nrobs as u32 });
        }
        let mut robs = BTreeSet::new();
        for i in 0..nrobs {
            robs.insert(read_u32_at(record, pos + i * 4)?);
        }
        pos += nrobs * 4;

        let ndets = read_u32_at(record, pos)? as usize;
        pos += 4;
        if pos + ndets * 4 > record.len() {
            return Err(Error::TooBigCount { count: ndets as u32 });
        }
        let mut dets = BTreeSet::new();
        for i in 0..ndets {
            dets.insert(read_u32_at(record, pos + i * 4)? as u8);
        }
        pos += ndets * 4;

        let (name, rest) = read_cstr(&record[pos..])?;
        let (type_string, _) = read_cstr(rest)?;
        let tag_type = if type_string.is_empty() { tag_type } else { TagType::from_str(&type_string) };

        tags.push(StreamTag { name, tag_type, obeys_lumiblock, robs, dets });
        cursor = &cursor[record_bytes..];
    }
    Ok(tags)
}

fn read_u32_at(buf: &[u8], offset: usize) -> Result<u32, Error> {
    buf.get(offset..offset + 4)
        .and_then(|mut s| s.read_u32::<LittleEndian>().ok())
        .ok_or(Error::BlockSizeTooSmall { have: (buf.len() / 4) as u32, need: (offset / 4 + 1) as u32 })
}

fn read_cstr(buf: &[u8]) -> Result<(String, &[u8]), Error> {
    let nul = buf.iter().position(|&b| b == 0).unwrap_or(buf.len());
    let s = String::from_utf8_lossy(&buf[..nul]).into_owned();
    let rest = if nul < buf.len() { &buf[nul + 1..] } else { &buf[nul..] };
    Ok((s, rest))
}

/// Number of tags in `v` whose type bit is set in `type_mask`.
pub fn contains_type(tags: &[StreamTag], type_mask: u32) -> u32 {
    tags.iter().filter(|t| (t.tag_type as u32) & type_mask != 0).count() as u32
}
