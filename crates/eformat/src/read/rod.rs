//! ROD (Read-Out Driver) fragment read view.
//!
//! Unlike `FullEvent`/`ROB`, a ROD's status/data counts live in a 4-word
//! trailer at the very end of the fragment (hardware-readout convention),
//! not in the header.

use crate::marker::HeaderMarker;
use crate::problem::FragmentProblem;
use crate::status::StatusPosition;
use crate::version::Version;
use crate::{Error, Result};

use super::{Header, COMMON_HEADER_WORDS, OFF_FRAGMENT_SIZE};

/// `run_number | lvl1_id | bc_id | lvl1_trigger_type | detector_event_type`.
pub(crate) const FIXED_FIELD_WORDS: usize = 5;
const TRAILER_WORDS: usize = 4;

const OFF_RUN_NUMBER: usize = COMMON_HEADER_WORDS;
const OFF_LVL1_ID: usize = COMMON_HEADER_WORDS + 1;
const OFF_BC_ID: usize = COMMON_HEADER_WORDS + 2;
const OFF_LVL1_TRIGGER_TYPE: usize = COMMON_HEADER_WORDS + 3;
const OFF_DETECTOR_EVENT_TYPE: usize = COMMON_HEADER_WORDS + 4;

/// A non-owning view over a ROD fragment's words.
#[derive(Clone, Copy)]
pub struct RodView<'a> {
    words: &'a [u32],
}

impl<'a> RodView<'a> {
    pub fn new(words: &'a [u32]) -> Result<Self> {
        let _ = Header::new(words, HeaderMarker::Rod)?;
        if words.len() < COMMON_HEADER_WORDS + FIXED_FIELD_WORDS + TRAILER_WORDS {
            return Err(Error::OutOfBounds { offset: COMMON_HEADER_WORDS + FIXED_FIELD_WORDS, len: words.len() });
        }
        Ok(Self { words })
    }

    pub fn marker(&self) -> HeaderMarker {
        HeaderMarker::Rod
    }

    pub fn header_size_word(&self) -> u32 {
        self.words[super::OFF_HEADER_SIZE]
    }

    pub fn version(&self) -> Version {
        Version::from_code(self.words[super::OFF_VERSION])
    }

    pub fn source_id(&self) -> u32 {
        self.words[super::OFF_SOURCE_ID]
    }

    /// Declared `fragment_size_word`, straight from the header (may exceed
    /// what is actually present if the buffer was truncated).
    pub fn declared_fragment_size_word(&self) -> u32 {
        self.words[OFF_FRAGMENT_SIZE]
    }

    /// Size actually usable in this buffer: `min(declared, words present)`.
    pub fn fragment_size_word(&self) -> u32 {
        self.declared_fragment_size_word().min(self.words.len() as u32)
    }

    pub fn run_number(&self) -> u32 {
        self.words[OFF_RUN_NUMBER]
    }

    pub fn lvl1_id(&self) -> u32 {
        self.words[OFF_LVL1_ID]
    }

    pub fn bc_id(&self) -> u32 {
        self.words[OFF_BC_ID]
    }

    pub fn lvl1_trigger_type(&self) -> u32 {
        self.words[OFF_LVL1_TRIGGER_TYPE]
    }

    pub fn detector_event_type(&self) -> u32 {
        self.words[OFF_DETECTOR_EVENT_TYPE]
    }

    fn is_truncated(&self) -> bool {
        (self.declared_fragment_size_word() as usize) > self.words.len()
    }

    /// Trailer words as actually present (last four words of the usable
    /// region), or `None` if truncation left fewer than four words total.
    fn trailer(&self) -> Option<(u32, u32, u32, Option<StatusPosition>)> {
        let usable = self.fragment_size_word() as usize;
        if usable < TRAILER_WORDS {
            return None;
        }
        let t = &self.words[usable - TRAILER_WORDS..usable];
        Some((t[0], t[1], t[2], StatusPosition::from_u32(t[3])))
    }

    /// Number of status words; `0` if the fragment was truncated before the
    /// trailer could be trusted.
    pub fn rod_nstatus(&self) -> u32 {
        if self.is_truncated() {
            return 0;
        }
        self.trailer().map(|(_, n, _, _)| n).unwrap_or(0)
    }

    /// Number of data words actually present, tolerating truncation.
    pub fn rod_ndata(&self) -> u32 {
        match self.trailer() {
            Some((_, nstatus, ndata, _)) if !self.is_truncated() => {
                let header_words = self.header_size_word() as usize;
                let available = (self.fragment_size_word() as usize)
                    .saturating_sub(header_words)
                    .saturating_sub(TRAILER_WORDS)
                    .saturating_sub(nstatus as usize);
                ndata.min(available as u32)
            }
            _ => {
                // Truncated: whatever is left after the header is payload.
                let header_words = self.header_size_word() as usize;
                (self.words.len().saturating_sub(header_words).saturating_sub(TRAILER_WORDS)) as u32
            }
        }
    }

    pub fn status_position(&self) -> Option<StatusPosition> {
        self.trailer().and_then(|(_, _, _, pos)| pos)
    }

    pub fn rod_status(&self) -> &'a [u32] {
        let nstatus = self.rod_nstatus() as usize;
        if nstatus == 0 {
            return &[];
        }
        let header = self.header_size_word() as usize;
        match self.status_position() {
            Some(StatusPosition::Front) | None => &self.words[header..header + nstatus],
            Some(StatusPosition::Back) => {
                let ndata = self.rod_ndata() as usize;
                &self.words[header + ndata..header + ndata + nstatus]
            }
        }
    }

    pub fn rod_data(&self) -> &'a [u32] {
        let ndata = self.rod_ndata() as usize;
        if ndata == 0 {
            return &[];
        }
        let header = self.header_size_word() as usize;
        match self.status_position() {
            Some(StatusPosition::Back) => &self.words[header..header + ndata],
            Some(StatusPosition::Front) | None => {
                let nstatus = self.rod_nstatus() as usize;
                &self.words[header + nstatus..header + nstatus + ndata]
            }
        }
    }

    pub fn problems(&self) -> Vec<FragmentProblem> {
        let mut out = Vec::new();
        if self.words[super::OFF_MARKER] != HeaderMarker::Rod.code() {
            out.push(FragmentProblem::WrongRodMarker);
            return out;
        }
        if self.header_size_word() < (COMMON_HEADER_WORDS + FIXED_FIELD_WORDS) as u32 {
            out.push(FragmentProblem::WrongRodHeaderSize);
        }
        if self.is_truncated() {
            out.push(FragmentProblem::WrongRodFragmentSize);
        }
        out
    }
}
