//! Full-event fragment read view: the root of a fragment tree, owning the
//! compression type, the trigger-info string bags, and the ROB children.

use std::cell::OnceCell;

use crate::compression::{self, CompressionType};
use crate::detector_mask::DetectorMask;
use crate::marker::HeaderMarker;
use crate::problem::FragmentProblem;
use crate::stream_tag::{self, StreamTag};
use crate::version::Version;
use crate::{Error, Result};

use super::rob::RobView;
use super::{check_common, Header, COMMON_HEADER_WORDS};

/// `bc_time_sec, bc_time_ns, global_id_lo, global_id_hi, run_type, run_number,
/// lumi_block, lvl1_id, bc_id, lvl1_trigger_type, det_mask_lo, det_mask_hi,
/// compression_type, readable_payload_size_word`.
pub(crate) const FIXED_FIELD_WORDS: usize = 14;

struct Offsets {
    nstatus: usize,
    status: usize,
    fixed: usize,
    l1: (usize, usize),
    l2: (usize, usize),
    ef: (usize, usize),
    hlt: (usize, usize),
    stream_tag: (usize, usize),
    header_words: usize,
}

fn parse_offsets(words: &[u32]) -> Result<Offsets> {
    let mut pos = COMMON_HEADER_WORDS;
    let nstatus = *words.get(pos).ok_or(Error::OutOfBounds { offset: pos, len: words.len() })? as usize;
    let status = pos + 1;
    pos = status + nstatus;
    let fixed = pos;
    pos += FIXED_FIELD_WORDS;

    let mut read_bag = |pos: &mut usize| -> Result<(usize, usize)> {
        let len = *words.get(*pos).ok_or(Error::OutOfBounds { offset: *pos, len: words.len() })? as usize;
        let start = *pos + 1;
        *pos = start + len;
        Ok((start, len))
    };
    let l1 = read_bag(&mut pos)?;
    let l2 = read_bag(&mut pos)?;
    let ef = read_bag(&mut pos)?;
    let hlt = read_bag(&mut pos)?;
    let stream_tag = read_bag(&mut pos)?;

    if pos > words.len() {
        return Err(Error::OutOfBounds { offset: pos, len: words.len() });
    }

    Ok(Offsets { nstatus, status, fixed, l1, l2, ef, hlt, stream_tag, header_words: pos })
}

/// A non-owning view over a full-event fragment's words.
pub struct FullEventView<'a> {
    words: &'a [u32],
    off: Offsets,
    decompressed: OnceCell<Vec<u32>>,
}

impl<'a> FullEventView<'a> {
    pub fn new(words: &'a [u32]) -> Result<Self> {
        let _ = Header::new(words, HeaderMarker::FullEvent)?;
        let off = parse_offsets(words)?;
        Ok(Self { words, off, decompressed: OnceCell::new() })
    }

    pub fn marker(&self) -> HeaderMarker {
        HeaderMarker::FullEvent
    }

    pub fn header_size_word(&self) -> u32 {
        self.words[super::OFF_HEADER_SIZE]
    }

    pub fn fragment_size_word(&self) -> u32 {
        self.words[super::OFF_FRAGMENT_SIZE]
    }

    pub fn version(&self) -> Version {
        Version::from_code(self.words[super::OFF_VERSION])
    }

    pub fn source_id(&self) -> u32 {
        self.words[super::OFF_SOURCE_ID]
    }

    pub fn nstatus(&self) -> u32 {
        self.off.nstatus as u32
    }

    pub fn status(&self) -> &'a [u32] {
        &self.words[self.off.status..self.off.status + self.off.nstatus]
    }

    fn fixed(&self, i: usize) -> u32 {
        self.words[self.off.fixed + i]
    }

    pub fn bc_time_seconds(&self) -> u32 {
        self.fixed(0)
    }

    pub fn bc_time_nanoseconds(&self) -> u32 {
        self.fixed(1)
    }

    pub fn global_id(&self) -> u64 {
        self.fixed(2) as u64 | ((self.fixed(3) as u64) << 32)
    }

    pub fn run_type(&self) -> u32 {
        self.fixed(4)
    }

    pub fn run_number(&self) -> u32 {
        self.fixed(5)
    }

    pub fn lumi_block(&self) -> u32 {
        self.fixed(6)
    }

    pub fn lvl1_id(&self) -> u32 {
        self.fixed(7)
    }

    pub fn bc_id(&self) -> u32 {
        self.fixed(8)
    }

    pub fn lvl1_trigger_type(&self) -> u32 {
        self.fixed(9)
    }

    pub fn detector_mask(&self) -> DetectorMask {
        DetectorMask::from_parts(self.fixed(10) as u64, self.fixed(11) as u64)
    }

    pub fn compression_type(&self) -> Result<CompressionType> {
        CompressionType::from_u32(self.fixed(12))
    }

    pub fn readable_payload_size_word(&self) -> u32 {
        self.fixed(13)
    }

    fn bag(&self, (start, len): (usize, usize)) -> &'a [u32] {
        &self.words[start..start + len]
    }

    pub fn lvl1_trigger_info(&self) -> &'a [u32] {
        self.bag(self.off.l1)
    }

    pub fn lvl2_trigger_info(&self) -> &'a [u32] {
        self.bag(self.off.l2)
    }

    pub fn event_filter_info(&self) -> &'a [u32] {
        self.bag(self.off.ef)
    }

    pub fn hlt_info(&self) -> &'a [u32] {
        self.bag(self.off.hlt)
    }

    fn stream_tag_words(&self) -> &'a [u32] {
        self.bag(self.off.stream_tag)
    }

    /// Decodes the packed stream-tag byte block.
    pub fn stream_tags(&self) -> Result<Vec<StreamTag>> {
        let words = self.stream_tag_words();
        let mut bytes = Vec::with_capacity(words.len() * 4);
        for w in words {
            bytes.extend_from_slice(&w.to_le_bytes());
        }
        stream_tag::decode(&bytes)
    }

    /// On-disk payload, still compressed if `compression_type() != None`.
    fn raw_payload(&self) -> &'a [u32] {
        let header = self.header_size_word() as usize;
        let total = (self.fragment_size_word() as usize).min(self.words.len());
        if header >= total {
            return &[];
        }
        &self.words[header..total]
    }

    /// The (decompressed) payload, materializing and caching on first call.
    pub fn readable_payload(&self) -> Result<&[u32]> {
        if let Some(cached) = self.decompressed.get() {
            return Ok(cached);
        }
        let kind = self.compression_type()?;
        let words = if matches!(kind, CompressionType::None) {
            self.raw_payload().to_vec()
        } else {
            let raw = self.raw_payload();
            let mut raw_bytes = Vec::with_capacity(raw.len() * 4);
            for w in raw {
                raw_bytes.extend_from_slice(&w.to_le_bytes());
            }
            let expected_bytes = self.readable_payload_size_word() as usize * 4;
            let mut out_bytes: Vec<u8> = Vec::new();
            compression::uncompress(kind, &raw_bytes, expected_bytes, &mut out_bytes)?;
            out_bytes
                .chunks_exact(4)
                .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
                .collect()
        };
        // Single-threaded per this crate's contract, so losing a `set()` race
        // (and recomputing) can't happen; `get_or_init`-style fallback is
        // still correct if it somehow did.
        let _ = self.decompressed.set(words);
        Ok(self.decompressed.get().expect("just set"))
    }

    /// Iterates the ROB children found in the (decompressed) payload,
    /// stopping at the first word that is not a valid ROB marker.
    pub fn child_iter(&self) -> Result<Vec<RobView<'_>>> {
        let payload = self.readable_payload()?;
        let mut out = Vec::new();
        let mut pos = 0usize;
        while pos < payload.len() {
            if payload[pos] != HeaderMarker::Rob.code() {
                break;
            }
            let size = *payload.get(pos + super::OFF_FRAGMENT_SIZE).unwrap_or(&0) as usize;
            if size == 0 || pos + size > payload.len() {
                break;
            }
            out.push(RobView::new(&payload[pos..pos + size])?);
            pos += size;
        }
        Ok(out)
    }

    pub fn nchildren(&self) -> Result<usize> {
        Ok(self.child_iter()?.len())
    }

    pub fn problems(&self) -> Vec<FragmentProblem> {
        let mut out = Vec::new();
        check_common(self.words, HeaderMarker::FullEvent, crate::version::MAJOR_DEFAULT_VERSION, &mut out);
        out
    }

    pub fn check(&self, expected_major: u16) -> Result<()> {
        let mut problems = Vec::new();
        check_common(self.words, HeaderMarker::FullEvent, expected_major, &mut problems);
        if let Some(p) = problems.first() {
            return Err(match p {
                FragmentProblem::WrongMarker => Error::WrongMarker {
                    expected: HeaderMarker::FullEvent.code(),
                    found: self.words[super::OFF_MARKER],
                },
                FragmentProblem::UnsupportedVersion => Error::BadVersion {
                    expected: expected_major,
                    found: self.version().major_version(),
                },
                _ => Error::WrongSize { size: self.fragment_size_word() },
            });
        }
        Ok(())
    }

    pub fn check_tree(&self, expected_major: u16) -> Result<()> {
        self.check(expected_major)?;
        for rob in self.child_iter()? {
            rob.check_tree(expected_major)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::write::{FullEventBuilder, RobBuilder, RodBuilder};

    #[test]
    fn roundtrip_minimal_full_event() {
        let rod = RodBuilder::new(0x0071_0001, 100, 5, 7, 0x81)
            .with_data(vec![0xaaaa, 0xbbbb])
            .bind();
        let rob = RobBuilder::new(0x0071_0001).with_rod(rod).bind();
        let fe = FullEventBuilder::new(0x0041_0001, 100, 5, 7, 0x81)
            .with_global_id(0x1122_3344_5566_7788)
            .with_robs(vec![rob])
            .bind();

        let view = FullEventView::new(&fe).unwrap();
        assert_eq!(view.run_number(), 100);
        assert_eq!(view.lvl1_id(), 5);
        assert_eq!(view.bc_id(), 7);
        assert_eq!(view.global_id(), 0x1122_3344_5566_7788);
        assert!(view.check(crate::version::MAJOR_DEFAULT_VERSION).is_ok());
        let children = view.child_iter().unwrap();
        assert_eq!(children.len(), 1);
        assert_eq!(children[0].rod_data(), &[0xaaaa, 0xbbbb]);
    }

    #[test]
    fn wrong_marker_is_rejected() {
        let words = vec![0xdeadbeefu32; 20];
        assert!(FullEventView::new(&words).is_err());
    }
}
