//! Header markers: the 32-bit sentinel word every fragment opens with.
//!
//! The `1234` in the middle of each constant self-identifies byte order; a
//! byte-swapped marker never matches and is rejected as [`crate::Error::WrongMarker`].

use std::fmt;

/// One of the three fragment kinds, encoded as the fragment's first word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum HeaderMarker {
    Rod = 0xee1234ee,
    Rob = 0xdd1234dd,
    FullEvent = 0xaa1234aa,
}

impl HeaderMarker {
    /// Maps a raw word to a marker, if it is one of the three known values.
    pub fn from_u32(v: u32) -> Option<Self> {
        match v {
            0xee1234ee => Some(HeaderMarker::Rod),
            0xdd1234dd => Some(HeaderMarker::Rob),
            0xaa1234aa => Some(HeaderMarker::FullEvent),
            _ => None,
        }
    }

    pub fn code(self) -> u32 {
        self as u32
    }

    /// The marker a well-formed child of this fragment must carry.
    ///
    /// `Rod` has no children; a `FullEvent`'s children are `Rob`s and a
    /// `Rob`'s only child is the embedded `Rod`.
    pub fn child_marker(self) -> Option<HeaderMarker> {
        match self {
            HeaderMarker::FullEvent => Some(HeaderMarker::Rob),
            HeaderMarker::Rob => Some(HeaderMarker::Rod),
            HeaderMarker::Rod => None,
        }
    }
}

impl fmt::Display for HeaderMarker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            HeaderMarker::Rod => "ROD",
            HeaderMarker::Rob => "ROB",
            HeaderMarker::FullEvent => "FULL_EVENT",
        };
        f.write_str(s)
    }
}
