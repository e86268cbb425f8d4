//! Full-event fragment builder.

use crate::compression::{self, CompressionType};
use crate::marker::HeaderMarker;
use crate::read::{COMMON_HEADER_WORDS, OFF_FRAGMENT_SIZE};
use crate::stream_tag::{self, StreamTag};
use crate::version::{Version, DEFAULT_VERSION};
use crate::Result;

use super::NodeList;

const FIXED_FIELD_WORDS: usize = 14;

/// Builds a full-event fragment around a set of already-bound ROB buffers.
#[derive(Debug, Clone)]
pub struct FullEventBuilder {
    source_id: u32,
    version: Version,
    status: Vec<u32>,
    bc_time_seconds: u32,
    bc_time_nanoseconds: u32,
    global_id: u64,
    run_type: u32,
    run_number: u32,
    lumi_block: u32,
    lvl1_id: u32,
    bc_id: u32,
    lvl1_trigger_type: u32,
    detector_mask: (u64, u64),
    compression: Option<(CompressionType, u32)>,
    lvl1_trigger_info: Vec<u32>,
    lvl2_trigger_info: Vec<u32>,
    event_filter_info: Vec<u32>,
    hlt_info: Vec<u32>,
    stream_tags: Vec<StreamTag>,
    robs: Vec<Vec<u32>>,
}

impl FullEventBuilder {
    pub fn new(source_id: u32, run_number: u32, lvl1_id: u32, bc_id: u32, lvl1_trigger_type: u32) -> Self {
        Self {
            source_id,
            version: Version::from_code(DEFAULT_VERSION),
            status: Vec::new(),
            bc_time_seconds: 0,
            bc_time_nanoseconds: 0,
            global_id: 0,
            run_type: 0,
            run_number,
            lumi_block: 0,
            lvl1_id,
            bc_id,
            lvl1_trigger_type,
            detector_mask: (0, 0),
            compression: None,
            lvl1_trigger_info: Vec::new(),
            lvl2_trigger_info: Vec::new(),
            event_filter_info: Vec::new(),
            hlt_info: Vec::new(),
            stream_tags: Vec::new(),
            robs: Vec::new(),
        }
    }

    pub fn with_status(mut self, status: Vec<u32>) -> Self {
        self.status = status;
        self
    }

    pub fn with_bc_time(mut self, seconds: u32, nanoseconds: u32) -> Self {
        self.bc_time_seconds = seconds;
        self.bc_time_nanoseconds = nanoseconds;
        self
    }

    pub fn with_global_id(mut self, id: u64) -> Self {
        self.global_id = id;
        self
    }

    pub fn with_run_type(mut self, run_type: u32) -> Self {
        self.run_type = run_type;
        self
    }

    pub fn with_lumi_block(mut self, lumi_block: u32) -> Self {
        self.lumi_block = lumi_block;
        self
    }

    pub fn with_detector_mask(mut self, lsb: u64, msb: u64) -> Self {
        self.detector_mask = (lsb, msb);
        self
    }

    pub fn with_compression(mut self, kind: CompressionType, level: u32) -> Self {
        self.compression = Some((kind, level));
        self
    }

    pub fn with_lvl1_trigger_info(mut self, v: Vec<u32>) -> Self {
        self.lvl1_trigger_info = v;
        self
    }

    pub fn with_lvl2_trigger_info(mut self, v: Vec<u32>) -> Self {
        self.lvl2_trigger_info = v;
        self
    }

    pub fn with_event_filter_info(mut self, v: Vec<u32>) -> Self {
        self.event_filter_info = v;
        self
    }

    pub fn with_hlt_info(mut self, v: Vec<u32>) -> Self {
        self.hlt_info = v;
        self
    }

    pub fn with_stream_tags(mut self, tags: Vec<StreamTag>) -> Self {
        self.stream_tags = tags;
        self
    }

    pub fn with_robs(mut self, robs: Vec<Vec<u32>>) -> Self {
        self.robs = robs;
        self
    }

    fn bag_node(len_words: &mut Vec<u32>, data: &[u32]) {
        len_words.push(data.len() as u32);
        len_words.extend_from_slice(data);
    }

    /// Builds the node list: `[header, payload...]`.
    pub fn bind_nodes(&self) -> Result<NodeList> {
        let mut header = Vec::with_capacity(64);
        header.resize(COMMON_HEADER_WORDS, 0);

        // header_size_word and fragment_size_word are filled in once the
        // final lengths are known; the slots already exist from `resize`.
        header[crate::read::OFF_MARKER] = HeaderMarker::FullEvent.code();
        header[crate::read::OFF_VERSION] = self.version.code();
        header[crate::read::OFF_SOURCE_ID] = self.source_id;

        header.push(self.status.len() as u32);
        header.extend_from_slice(&self.status);

        header.push(self.bc_time_seconds);
        header.push(self.bc_time_nanoseconds);
        header.push(self.global_id as u32);
        header.push((self.global_id >> 32) as u32);
        header.push(self.run_type);
        header.push(self.run_number);
        header.push(self.lumi_block);
        header.push(self.lvl1_id);
        header.push(self.bc_id);
        header.push(self.lvl1_trigger_type);
        header.push(self.detector_mask.0 as u32);
        header.push(self.detector_mask.1 as u32);
        let compression_kind = self.compression.map(|(k, _)| k).unwrap_or(CompressionType::None);
        header.push(compression_kind.code());
        debug_assert_eq!(header.len(), COMMON_HEADER_WORDS + 1 + self.status.len() + FIXED_FIELD_WORDS - 1);
        // readable_payload_size_word filled in once the payload is known.
        header.push(0);

        Self::bag_node(&mut header, &self.lvl1_trigger_info);
        Self::bag_node(&mut header, &self.lvl2_trigger_info);
        Self::bag_node(&mut header, &self.event_filter_info);
        Self::bag_node(&mut header, &self.hlt_info);

        let tag_bytes = stream_tag::encode(&self.stream_tags);
        let tag_words: Vec<u32> =
            tag_bytes.chunks_exact(4).map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]])).collect();
        Self::bag_node(&mut header, &tag_words);

        let header_words = header.len();
        header[crate::read::OFF_HEADER_SIZE] = header_words as u32;

        let readable_payload_size_off = COMMON_HEADER_WORDS + 1 + self.status.len() + FIXED_FIELD_WORDS - 1;

        let mut uncompressed_payload = Vec::new();
        for rob in &self.robs {
            uncompressed_payload.extend_from_slice(rob);
        }
        header[readable_payload_size_off] = uncompressed_payload.len() as u32;

        let payload_words = match self.compression {
            None | Some((CompressionType::None, _)) => uncompressed_payload,
            Some((kind, level)) => {
                let mut bytes = Vec::with_capacity(uncompressed_payload.len() * 4);
                for w in &uncompressed_payload {
                    bytes.extend_from_slice(&w.to_le_bytes());
                }
                let mut compressed = Vec::new();
                compression::compress(kind, &bytes, level, &mut compressed)?;
                while !compressed.len().is_multiple_of(4) {
                    compressed.push(0);
                }
                compressed.chunks_exact(4).map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]])).collect()
            }
        };

        let total = header_words + payload_words.len();
        header[OFF_FRAGMENT_SIZE] = total as u32;

        let mut list = NodeList::new();
        list.push(header);
        list.push(payload_words);
        Ok(list)
    }

    pub fn bind(&self) -> Vec<u32> {
        self.bind_nodes().expect("compression never fails for these inputs").copy()
    }

    pub fn try_bind(&self) -> Result<Vec<u32>> {
        Ok(self.bind_nodes()?.copy())
    }
}
