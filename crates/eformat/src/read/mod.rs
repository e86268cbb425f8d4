//! Non-owning read views over fragment buffers.
//!
//! A view never copies the underlying words; it only interprets them. The
//! wire layout implemented here (word offsets below) is this crate's own —
//! the original format's field order is preserved where the specification
//! pins it down (trailer-last ROD, `…1234…` marker, little-endian globals)
//! and filled in consistently elsewhere.

mod full_event;
mod rob;
mod rod;

pub use full_event::FullEventView;
pub use rob::RobView;
pub use rod::RodView;

use crate::marker::HeaderMarker;
use crate::problem::FragmentProblem;
use crate::version::Version;
use crate::{Error, Result};

/// Index of the `marker` word, common to every fragment kind.
pub(crate) const OFF_MARKER: usize = 0;
/// Index of `header_size_word`.
pub(crate) const OFF_HEADER_SIZE: usize = 1;
/// Index of `format_version`.
pub(crate) const OFF_VERSION: usize = 2;
/// Index of `source_id`.
pub(crate) const OFF_SOURCE_ID: usize = 3;
/// Index of `fragment_size_word`.
pub(crate) const OFF_FRAGMENT_SIZE: usize = 4;
/// Common prefix length, in words, shared by every fragment kind.
pub(crate) const COMMON_HEADER_WORDS: usize = 5;

/// Minimum `header_size_word` accepted for each fragment kind (common prefix
/// plus the type's own fixed fields, before any variable-length sections).
pub(crate) fn min_header_words(marker: HeaderMarker) -> u32 {
    match marker {
        HeaderMarker::FullEvent => (COMMON_HEADER_WORDS + 1 + full_event::FIXED_FIELD_WORDS) as u32,
        HeaderMarker::Rob => (COMMON_HEADER_WORDS + 1) as u32,
        HeaderMarker::Rod => (COMMON_HEADER_WORDS + rod::FIXED_FIELD_WORDS) as u32,
    }
}

/// Shared accessors every fragment view exposes over its common prefix.
pub(crate) struct Header<'a> {
    words: &'a [u32],
}

impl<'a> Header<'a> {
    fn new(words: &'a [u32], marker: HeaderMarker) -> Result<Self> {
        if words.len() < COMMON_HEADER_WORDS {
            return Err(Error::OutOfBounds { offset: COMMON_HEADER_WORDS, len: words.len() });
        }
        let found = words[OFF_MARKER];
        let expected = marker.code();
        if found != expected {
            return Err(Error::WrongMarker { expected, found });
        }
        Ok(Self { words })
    }

    fn marker_word(&self) -> u32 {
        self.words[OFF_MARKER]
    }

    fn header_size_word(&self) -> u32 {
        self.words[OFF_HEADER_SIZE]
    }

    fn version(&self) -> Version {
        Version::from_code(self.words[OFF_VERSION])
    }

    fn source_id(&self) -> u32 {
        self.words[OFF_SOURCE_ID]
    }

    fn fragment_size_word(&self) -> u32 {
        self.words[OFF_FRAGMENT_SIZE]
    }
}

/// Runs the generic structural checks common to every fragment kind,
/// appending any problems found rather than stopping at the first one.
pub(crate) fn check_common(
    words: &[u32],
    marker: HeaderMarker,
    expected_major: u16,
    problems: &mut Vec<FragmentProblem>,
) {
    if words.is_empty() || words[OFF_MARKER] != marker.code() {
        problems.push(FragmentProblem::WrongMarker);
        return;
    }
    let version = Version::from_code(words[OFF_VERSION]);
    if version.major_version() != expected_major {
        problems.push(FragmentProblem::UnsupportedVersion);
    }
    let header_size = words[OFF_HEADER_SIZE];
    let fragment_size = words[OFF_FRAGMENT_SIZE];
    if header_size < min_header_words(marker) || fragment_size < header_size {
        problems.push(FragmentProblem::WrongFragmentSize);
    }
    if fragment_size as usize > words.len() {
        problems.push(FragmentProblem::WrongFragmentSize);
    }
}
