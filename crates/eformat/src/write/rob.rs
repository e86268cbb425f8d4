//! ROB fragment builder: a thin header wrapping one embedded ROD.

use crate::marker::HeaderMarker;
use crate::read::{COMMON_HEADER_WORDS, OFF_FRAGMENT_SIZE};
use crate::version::{Version, DEFAULT_VERSION};

use super::NodeList;

/// Builds a ROB fragment around an already-bound ROD word buffer.
#[derive(Debug, Clone)]
pub struct RobBuilder {
    source_id: u32,
    version: Version,
    status: Vec<u32>,
    rod: Vec<u32>,
}

impl RobBuilder {
    pub fn new(source_id: u32) -> Self {
        Self { source_id, version: Version::from_code(DEFAULT_VERSION), status: Vec::new(), rod: Vec::new() }
    }

    pub fn with_status(mut self, status: Vec<u32>) -> Self {
        self.status = status;
        self
    }

    pub fn with_rod(mut self, rod: Vec<u32>) -> Self {
        self.rod = rod;
        self
    }

    pub fn bind_nodes(&self) -> NodeList {
        let header_words = COMMON_HEADER_WORDS + 1 + self.status.len();
        let total = header_words + self.rod.len();

        let mut header = vec![0u32; header_words];
        header[crate::read::OFF_MARKER] = HeaderMarker::Rob.code();
        header[crate::read::OFF_HEADER_SIZE] = header_words as u32;
        header[crate::read::OFF_VERSION] = self.version.code();
        header[crate::read::OFF_SOURCE_ID] = self.source_id;
        header[OFF_FRAGMENT_SIZE] = total as u32;
        header[COMMON_HEADER_WORDS] = self.status.len() as u32;
        header[COMMON_HEADER_WORDS + 1..].copy_from_slice(&self.status);

        let mut list = NodeList::new();
        list.push(header);
        list.push(self.rod.clone());
        list
    }

    pub fn bind(&self) -> Vec<u32> {
        self.bind_nodes().copy()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::read::RobView;
    use crate::write::RodBuilder;

    #[test]
    fn wraps_a_rod_fragment() {
        let rod = RodBuilder::new(0x0071_0001, 1, 2, 3, 0x81).with_data(vec![9, 8, 7]).bind();
        let words = RobBuilder::new(0x0071_0001).with_status(vec![0x1]).with_rod(rod).bind();
        let view = RobView::new(&words).unwrap();
        assert_eq!(view.status(), &[0x1]);
        assert_eq!(view.rod_data(), &[9, 8, 7]);
        assert!(view.check_rod_size().is_ok());
    }
}
