//! ROB (Read-Out Buffer) fragment read view: a thin header wrapping one
//! embedded ROD fragment.

use crate::marker::HeaderMarker;
use crate::problem::FragmentProblem;
use crate::version::Version;
use crate::{Error, Result};

use super::rod::RodView;
use super::{check_common, Header, COMMON_HEADER_WORDS};

/// A non-owning view over a ROB fragment's words.
pub struct RobView<'a> {
    words: &'a [u32],
    nstatus: usize,
}

impl<'a> RobView<'a> {
    pub fn new(words: &'a [u32]) -> Result<Self> {
        let _ = Header::new(words, HeaderMarker::Rob)?;
        let nstatus = *words
            .get(COMMON_HEADER_WORDS)
            .ok_or(Error::OutOfBounds { offset: COMMON_HEADER_WORDS, len: words.len() })? as usize;
        Ok(Self { words, nstatus })
    }

    pub fn marker(&self) -> HeaderMarker {
        HeaderMarker::Rob
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
        self.nstatus as u32
    }

    pub fn status(&self) -> &'a [u32] {
        let start = COMMON_HEADER_WORDS + 1;
        &self.words[start..start + self.nstatus]
    }

    /// Start of the embedded ROD fragment's words.
    pub fn rod_start(&self) -> &'a [u32] {
        let start = self.header_size_word() as usize;
        let end = (self.fragment_size_word() as usize).min(self.words.len());
        if start >= end {
            &[]
        } else {
            &self.words[start..end]
        }
    }

    pub fn rod(&self) -> Result<RodView<'a>> {
        RodView::new(self.rod_start())
    }

    pub fn rod_data(&self) -> &'a [u32] {
        self.rod().map(|r| r.rod_data()).unwrap_or(&[])
    }

    pub fn rod_status(&self) -> &'a [u32] {
        self.rod().map(|r| r.rod_status()).unwrap_or(&[])
    }

    pub fn rod_run_number(&self) -> Option<u32> {
        self.rod().ok().map(|r| r.run_number())
    }

    /// Fails with `RodSizeCheck` if the embedded ROD's declared size does
    /// not match the space the ROB reserved for it.
    pub fn check_rod_size(&self) -> Result<()> {
        let rod = self.rod()?;
        let rob_payload = (self.fragment_size_word().min(self.words.len() as u32))
            .saturating_sub(self.header_size_word());
        if rod.declared_fragment_size_word() != rob_payload {
            return Err(Error::RodSizeCheck { rod_size: rod.declared_fragment_size_word(), rob_payload });
        }
        Ok(())
    }

    pub fn problems(&self) -> Vec<FragmentProblem> {
        let mut out = Vec::new();
        check_common(self.words, HeaderMarker::Rob, crate::version::MAJOR_DEFAULT_VERSION, &mut out);
        if let Ok(rod) = self.rod() {
            out.extend(rod.problems());
        }
        out
    }

    pub fn check(&self, expected_major: u16) -> Result<()> {
        let mut problems = Vec::new();
        check_common(self.words, HeaderMarker::Rob, expected_major, &mut problems);
        if let Some(p) = problems.first() {
            return Err(match p {
                FragmentProblem::WrongMarker => {
                    Error::WrongMarker { expected: HeaderMarker::Rob.code(), found: self.words[super::OFF_MARKER] }
                }
                FragmentProblem::UnsupportedVersion => {
                    Error::BadVersion { expected: expected_major, found: self.version().major_version() }
                }
                _ => Error::WrongSize { size: self.fragment_size_word() },
            });
        }
        self.check_rod_size()
    }

    pub fn check_tree(&self, expected_major: u16) -> Result<()> {
        self.check(expected_major)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::write::{RobBuilder, RodBuilder};

    #[test]
    fn wraps_embedded_rod() {
        let rod = RodBuilder::new(0x0071_0001, 10, 1, 2, 0x81).with_data(vec![1, 2, 3]).bind();
        let rob = RobBuilder::new(0x0071_0001).with_rod(rod).bind();
        let view = RobView::new(&rob).unwrap();
        assert_eq!(view.rod_data(), &[1, 2, 3]);
        assert!(view.check_rod_size().is_ok());
    }
}
