//! ROD fragment builder.

use crate::marker::HeaderMarker;
use crate::read::{COMMON_HEADER_WORDS, OFF_FRAGMENT_SIZE};
use crate::status::StatusPosition;
use crate::version::{Version, DEFAULT_ROD_VERSION};

use super::NodeList;

const FIXED_FIELD_WORDS: usize = 5;
const HEADER_WORDS: usize = COMMON_HEADER_WORDS + FIXED_FIELD_WORDS;

/// Builds a ROD fragment's words from scattered fields.
#[derive(Debug, Clone)]
pub struct RodBuilder {
    source_id: u32,
    version: Version,
    run_number: u32,
    lvl1_id: u32,
    bc_id: u32,
    lvl1_trigger_type: u32,
    detector_event_type: u32,
    status: Vec<u32>,
    data: Vec<u32>,
    status_position: StatusPosition,
}

impl RodBuilder {
    pub fn new(source_id: u32, run_number: u32, lvl1_id: u32, bc_id: u32, detector_event_type: u32) -> Self {
        Self {
            source_id,
            version: Version::from_code(DEFAULT_ROD_VERSION),
            run_number,
            lvl1_id,
            bc_id,
            lvl1_trigger_type: 0,
            detector_event_type,
            status: Vec::new(),
            data: Vec::new(),
            status_position: StatusPosition::Front,
        }
    }

    pub fn with_lvl1_trigger_type(mut self, v: u32) -> Self {
        self.lvl1_trigger_type = v;
        self
    }

    pub fn with_status(mut self, status: Vec<u32>) -> Self {
        self.status = status;
        self
    }

    pub fn with_data(mut self, data: Vec<u32>) -> Self {
        self.data = data;
        self
    }

    pub fn with_status_position(mut self, pos: StatusPosition) -> Self {
        self.status_position = pos;
        self
    }

    /// Builds the node list: `[header, status|data, data|status, trailer]`.
    pub fn bind_nodes(&self) -> NodeList {
        let total = HEADER_WORDS + self.status.len() + self.data.len() + 4;

        let mut header = vec![0u32; HEADER_WORDS];
        header[crate::read::OFF_MARKER] = HeaderMarker::Rod.code();
        header[crate::read::OFF_HEADER_SIZE] = HEADER_WORDS as u32;
        header[crate::read::OFF_VERSION] = self.version.code();
        header[crate::read::OFF_SOURCE_ID] = self.source_id;
        header[OFF_FRAGMENT_SIZE] = total as u32;
        header[COMMON_HEADER_WORDS] = self.run_number;
        header[COMMON_HEADER_WORDS + 1] = self.lvl1_id;
        header[COMMON_HEADER_WORDS + 2] = self.bc_id;
        header[COMMON_HEADER_WORDS + 3] = self.lvl1_trigger_type;
        header[COMMON_HEADER_WORDS + 4] = self.detector_event_type;

        let mut list = NodeList::new();
        list.push(header);
        match self.status_position {
            StatusPosition::Front => {
                list.push(self.status.clone());
                list.push(self.data.clone());
            }
            StatusPosition::Back => {
                list.push(self.data.clone());
                list.push(self.status.clone());
            }
        }
        list.push(vec![total as u32, self.status.len() as u32, self.data.len() as u32, self.status_position as u32]);
        list
    }

    /// Builds and flattens into one contiguous buffer.
    pub fn bind(&self) -> Vec<u32> {
        self.bind_nodes().copy()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::read::RodView;

    #[test]
    fn builds_a_well_formed_fragment() {
        let words = RodBuilder::new(0x0071_0001, 10, 1, 2, 0x81)
            .with_status(vec![0xdead])
            .with_data(vec![1, 2, 3])
            .bind();
        let view = RodView::new(&words).unwrap();
        assert_eq!(view.rod_status(), &[0xdead]);
        assert_eq!(view.rod_data(), &[1, 2, 3]);
        assert_eq!(view.run_number(), 10);
        assert!(view.problems().is_empty());
    }
}
