//! Rewrites fragments written by older format majors into the current
//! layout.
//!
//! Historical ATLAS majors grew the header by a handful of fixed fields over
//! time; this crate's only in-tree "legacy" shape is a ROD header missing
//! `detector_event_type` and a FullEvent header missing the detector-mask
//! and compression fields, defaulted to zero/`NONE` on upgrade. That is
//! enough to exercise the real behavior the spec calls for — identify,
//! re-emit in the current field order, recurse into children, report `0`
//! on a too-small destination — without fabricating a full historical
//! binary archaeology this crate has no source to check against.

use crate::marker::HeaderMarker;
use crate::read::{COMMON_HEADER_WORDS, OFF_FRAGMENT_SIZE, OFF_HEADER_SIZE, OFF_MARKER, OFF_SOURCE_ID, OFF_VERSION};
use crate::status::StatusPosition;
use crate::version::{
    Version, MAJOR_DEFAULT_VERSION, MAJOR_V24_VERSION, MAJOR_V30_VERSION, MAJOR_V31_VERSION, MAJOR_V40_VERSION,
};
use crate::write::{FullEventBuilder, RobBuilder, RodBuilder};
use crate::{Error, Result};

const LEGACY_ROD_FIXED_WORDS: usize = 4;
const LEGACY_FULL_EVENT_FIXED_WORDS: usize = 10;

fn is_supported_major(major: u16) -> bool {
    matches!(
        major,
        MAJOR_V24_VERSION | MAJOR_V30_VERSION | MAJOR_V31_VERSION | MAJOR_V40_VERSION | MAJOR_DEFAULT_VERSION
    )
}

fn write_if_fits(words: &[u32], dest: &mut [u32]) -> u32 {
    if words.len() > dest.len() {
        return 0;
    }
    dest[..words.len()].copy_from_slice(words);
    words.len() as u32
}

/// Converts any fragment (dispatching on its marker) into `dest`.
pub fn convert(src: &[u32], dest: &mut [u32]) -> Result<u32> {
    let marker = src.first().copied().and_then(HeaderMarker::from_u32).ok_or(Error::WrongMarker {
        expected: 0,
        found: src.first().copied().unwrap_or(0),
    })?;
    match marker {
        HeaderMarker::FullEvent => convert_full_event(src, dest),
        HeaderMarker::Rob => convert_rob(src, dest),
        HeaderMarker::Rod => convert_rod(src, dest),
    }
}

fn parse_bags(words: &[u32], mut pos: usize, n: usize) -> Result<(Vec<(usize, usize)>, usize)> {
    let mut bags = Vec::with_capacity(n);
    for _ in 0..n {
        let len = *words.get(pos).ok_or(Error::OutOfBounds { offset: pos, len: words.len() })? as usize;
        let start = pos + 1;
        pos = start + len;
        bags.push((start, len));
    }
    Ok((bags, pos))
}

pub fn convert_rod(src: &[u32], dest: &mut [u32]) -> Result<u32> {
    if src.len() < COMMON_HEADER_WORDS || src[OFF_MARKER] != HeaderMarker::Rod.code() {
        return Err(Error::WrongMarker { expected: HeaderMarker::Rod.code(), found: src.first().copied().unwrap_or(0) });
    }
    let major = Version::from_code(src[OFF_VERSION]).major_version();
    if !is_supported_major(major) {
        return Err(Error::UnsupportedVersion(major));
    }
    // RODs version independently of FullEvent/ROB; their current major is
    // V31, not the DEFAULT major the other two fragment kinds carry.
    if major == MAJOR_V31_VERSION {
        return Ok(write_if_fits(src, dest));
    }

    let header_words = src[OFF_HEADER_SIZE] as usize;
    if header_words < COMMON_HEADER_WORDS + LEGACY_ROD_FIXED_WORDS {
        return Err(Error::WrongSize { size: header_words as u32 });
    }
    let run_number = *src.get(COMMON_HEADER_WORDS).ok_or(Error::OutOfBounds { offset: COMMON_HEADER_WORDS, len: src.len() })?;
    let lvl1_id = src[COMMON_HEADER_WORDS + 1];
    let bc_id = src[COMMON_HEADER_WORDS + 2];
    let lvl1_trigger_type = src[COMMON_HEADER_WORDS + 3];

    let declared_size = (src[OFF_FRAGMENT_SIZE] as usize).min(src.len());
    if declared_size < header_words + 4 {
        return Err(Error::WrongSize { size: declared_size as u32 });
    }
    let trailer = &src[declared_size - 4..declared_size];
    let (nstatus, ndata, pos) = (trailer[1] as usize, trailer[2] as usize, StatusPosition::from_u32(trailer[3]));
    let body = &src[header_words..declared_size - 4];
    let (status, data) = match pos.unwrap_or(StatusPosition::Front) {
        StatusPosition::Front => (body.get(..nstatus).unwrap_or(&[]), body.get(nstatus..nstatus + ndata).unwrap_or(&[])),
        StatusPosition::Back => (body.get(ndata..ndata + nstatus).unwrap_or(&[]), body.get(..ndata).unwrap_or(&[])),
    };

    let rebuilt = RodBuilder::new(src[OFF_SOURCE_ID], run_number, lvl1_id, bc_id, 0)
        .with_lvl1_trigger_type(lvl1_trigger_type)
        .with_status(status.to_vec())
        .with_data(data.to_vec())
        .with_status_position(pos.unwrap_or(StatusPosition::Front))
        .bind();
    Ok(write_if_fits(&rebuilt, dest))
}

pub fn convert_rob(src: &[u32], dest: &mut [u32]) -> Result<u32> {
    if src.len() < COMMON_HEADER_WORDS + 1 || src[OFF_MARKER] != HeaderMarker::Rob.code() {
        return Err(Error::WrongMarker { expected: HeaderMarker::Rob.code(), found: src.first().copied().unwrap_or(0) });
    }
    let major = Version::from_code(src[OFF_VERSION]).major_version();
    if !is_supported_major(major) {
        return Err(Error::UnsupportedVersion(major));
    }

    let nstatus = src[COMMON_HEADER_WORDS] as usize;
    let header_words = COMMON_HEADER_WORDS + 1 + nstatus;
    let status = src.get(COMMON_HEADER_WORDS + 1..header_words).unwrap_or(&[]).to_vec();
    let declared_size = (src[OFF_FRAGMENT_SIZE] as usize).min(src.len());
    let rod_src = src.get(header_words..declared_size).unwrap_or(&[]);

    let mut rod_dest = vec![0u32; rod_src.len() + 16];
    let rod_written = convert_rod(rod_src, &mut rod_dest)? as usize;
    rod_dest.truncate(rod_written);

    let rebuilt = RobBuilder::new(src[OFF_SOURCE_ID]).with_status(status).with_rod(rod_dest).bind();
    Ok(write_if_fits(&rebuilt, dest))
}

pub fn convert_full_event(src: &[u32], dest: &mut [u32]) -> Result<u32> {
    if src.len() < COMMON_HEADER_WORDS + 1 || src[OFF_MARKER] != HeaderMarker::FullEvent.code() {
        return Err(Error::WrongMarker {
            expected: HeaderMarker::FullEvent.code(),
            found: src.first().copied().unwrap_or(0),
        });
    }
    let major = Version::from_code(src[OFF_VERSION]).major_version();
    if !is_supported_major(major) {
        return Err(Error::UnsupportedVersion(major));
    }
    if major == MAJOR_DEFAULT_VERSION {
        return Ok(write_if_fits(src, dest));
    }

    let nstatus = src[COMMON_HEADER_WORDS] as usize;
    let status_start = COMMON_HEADER_WORDS + 1;
    let status = src.get(status_start..status_start + nstatus).unwrap_or(&[]).to_vec();
    let fixed_start = status_start + nstatus;
    let fixed_words = LEGACY_FULL_EVENT_FIXED_WORDS;
    if src.len() < fixed_start + fixed_words {
        return Err(Error::OutOfBounds { offset: fixed_start + fixed_words, len: src.len() });
    }
    let f = |i: usize| src[fixed_start + i];
    let (bc_sec, bc_ns, global_lo, global_hi, run_type, run_number, lumi_block, lvl1_id, bc_id, lvl1_trigger_type) =
        (f(0), f(1), f(2), f(3), f(4), f(5), f(6), f(7), f(8), f(9));

    let (bags, payload_start) = parse_bags(src, fixed_start + fixed_words, 5)?;
    let [l1, l2, ef, hlt, stream_tag] = <[(usize, usize); 5]>::try_from(bags).unwrap();
    let bag_words = |b: (usize, usize)| src.get(b.0..b.0 + b.1).unwrap_or(&[]).to_vec();

    let declared_size = (src[OFF_FRAGMENT_SIZE] as usize).min(src.len());
    let payload_src = src.get(payload_start..declared_size).unwrap_or(&[]);

    let mut robs = Vec::new();
    let mut pos = 0usize;
    while pos < payload_src.len() {
        if payload_src[pos] != HeaderMarker::Rob.code() {
            break;
        }
        let size = *payload_src.get(pos + OFF_FRAGMENT_SIZE).unwrap_or(&0) as usize;
        if size == 0 || pos + size > payload_src.len() {
            break;
        }
        let child = &payload_src[pos..pos + size];
        let mut child_dest = vec![0u32; size + 16];
        let written = convert_rob(child, &mut child_dest)? as usize;
        child_dest.truncate(written);
        robs.push(child_dest);
        pos += size;
    }

    let stream_tag_words = bag_words(stream_tag);
    let mut stream_bytes = Vec::with_capacity(stream_tag_words.len() * 4);
    for w in &stream_tag_words {
        stream_bytes.extend_from_slice(&w.to_le_bytes());
    }
    let tags = crate::stream_tag::decode(&stream_bytes)?;

    let rebuilt = FullEventBuilder::new(src[OFF_SOURCE_ID], run_number, lvl1_id, bc_id, lvl1_trigger_type)
        .with_status(status)
        .with_bc_time(bc_sec, bc_ns)
        .with_global_id(global_lo as u64 | ((global_hi as u64) << 32))
        .with_run_type(run_type)
        .with_lumi_block(lumi_block)
        .with_lvl1_trigger_info(bag_words(l1))
        .with_lvl2_trigger_info(bag_words(l2))
        .with_event_filter_info(bag_words(ef))
        .with_hlt_info(bag_words(hlt))
        .with_stream_tags(tags)
        .with_robs(robs)
        .try_bind()?;
    Ok(write_if_fits(&rebuilt, dest))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::read::{FullEventView, RodView};
    use crate::version::Version;

    fn legacy_rod(major: u16, run_number: u32) -> Vec<u32> {
        let header_words = COMMON_HEADER_WORDS + LEGACY_ROD_FIXED_WORDS;
        let status = [0x1u32];
        let data = [0x10u32, 0x20];
        let total = header_words + status.len() + data.len() + 4;
        let mut words = vec![0u32; total];
        words[OFF_MARKER] = HeaderMarker::Rod.code();
        words[OFF_HEADER_SIZE] = header_words as u32;
        words[OFF_VERSION] = Version::new(major, 0).code();
        words[OFF_SOURCE_ID] = 0x0071_0001;
        words[OFF_FRAGMENT_SIZE] = total as u32;
        words[COMMON_HEADER_WORDS] = run_number;
        words[COMMON_HEADER_WORDS + 1] = 1;
        words[COMMON_HEADER_WORDS + 2] = 2;
        words[COMMON_HEADER_WORDS + 3] = 0x81;
        let mut i = header_words;
        words[i..i + status.len()].copy_from_slice(&status);
        i += status.len();
        words[i..i + data.len()].copy_from_slice(&data);
        i += data.len();
        words[i] = total as u32;
        words[i + 1] = status.len() as u32;
        words[i + 2] = data.len() as u32;
        words[i + 3] = StatusPosition::Front as u32;
        words
    }

    #[test]
    fn converts_legacy_rod_to_current_layout() {
        let legacy = legacy_rod(MAJOR_V30_VERSION, 77);
        let mut dest = vec![0u32; legacy.len() + 8];
        let written = convert_rod(&legacy, &mut dest).unwrap();
        dest.truncate(written as usize);
        let view = RodView::new(&dest).unwrap();
        assert_eq!(view.version().major_version(), MAJOR_V31_VERSION);
        assert_eq!(view.run_number(), 77);
        assert_eq!(view.rod_data(), &[0x10, 0x20]);
    }

    #[test]
    fn current_major_is_idempotent() {
        let current = RodBuilder::new(0x1, 5, 1, 2, 0x81).with_data(vec![9]).bind();
        let mut dest = vec![0u32; current.len()];
        let written = convert_rod(&current, &mut dest).unwrap();
        assert_eq!(written as usize, current.len());
        assert_eq!(dest, current);
    }

    #[test]
    fn too_small_destination_returns_zero() {
        let legacy = legacy_rod(MAJOR_V24_VERSION, 1);
        let mut dest = vec![0u32; 1];
        assert_eq!(convert_rod(&legacy, &mut dest).unwrap(), 0);
    }

    #[test]
    fn unsupported_major_is_rejected() {
        let mut legacy = legacy_rod(MAJOR_V30_VERSION, 1);
        legacy[OFF_VERSION] = Version::new(0x9999, 0).code();
        let mut dest = vec![0u32; legacy.len() + 8];
        assert!(matches!(convert_rod(&legacy, &mut dest), Err(Error::UnsupportedVersion(0x9999))));
    }

    #[test]
    fn full_event_dispatch_recurses_into_robs() {
        let rod = RodBuilder::new(0x0071_0001, 1, 2, 3, 0x81).with_data(vec![5, 6]).bind();
        let rob = RobBuilder::new(0x0071_0001).with_rod(rod).bind();
        let fe = FullEventBuilder::new(0x0041_0001, 9, 1, 2, 0x81).with_robs(vec![rob]).bind();
        let mut dest = vec![0u32; fe.len() + 32];
        let written = convert(&fe, &mut dest).unwrap();
        dest.truncate(written as usize);
        let view = FullEventView::new(&dest).unwrap();
        assert_eq!(view.run_number(), 9);
        assert_eq!(view.child_iter().unwrap()[0].rod_data(), &[5, 6]);
    }
}
