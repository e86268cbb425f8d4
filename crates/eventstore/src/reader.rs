//! Sequenced event-storage reader. Metadata is parsed once at `open()` and
//! cached; event records are read forward from [`Self::get_position`], with
//! optional jump-to-sequence support when the file is part of a numbered
//! run.

use std::io::{self, Read};
use std::path::{Path, PathBuf};

use eformat::compression::CompressionType;

use crate::error::{Error, Result};
use crate::filename::RawFileName;
use crate::guid::Guid;
use crate::header::FileHeader;
use crate::record::{self, RecordHeader, RECORD_HEADER_BYTES, RECORD_MARKER, TRAILER_MARKER};
use crate::source::{ByteSource, LocalFileSource};
use crate::trailer::EndOfFileRecord;

/// Outcome of [`StorageReader::get_data`]. `NOOK` (a fatal read error) is
/// reported through `Result::Err` instead of a variant here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadStatus {
    /// A record was read successfully.
    Ok,
    /// End of the current (still-open, `.writing`) file; more data may
    /// arrive later.
    Wait,
    /// End of the file sequence: sequence reading is enabled but the next
    /// file does not exist yet.
    NoSeq,
    /// End of this file and sequence reading is not enabled.
    Woff,
}

impl Read for LocalFileSource {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.read_bytes(buf).map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
        Ok(n)
    }
}

pub struct StorageReader<S: ByteSource + Read = LocalFileSource> {
    source: S,
    path: PathBuf,
    header: FileHeader,
    records_start: u64,
    position: u64,
    sequence_enabled: bool,
    end_of_file: bool,
    end_of_sequence: bool,
    open_for_writing: bool,
}

impl<S: ByteSource + Read> StorageReader<S> {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let mut source = S::open(&path)?;
        let header = FileHeader::read(&mut source)?;
        let records_start = source.tell()?;
        let open_for_writing = path.extension().and_then(|e| e.to_str()) == Some("writing");
        Ok(StorageReader {
            source,
            path,
            header,
            records_start,
            position: 0,
            sequence_enabled: false,
            end_of_file: false,
            end_of_sequence: false,
            open_for_writing,
        })
    }

    pub fn enable_sequence_reading(&mut self) {
        self.sequence_enabled = true;
    }

    pub fn good(&self) -> bool {
        !self.end_of_file || (self.sequence_enabled && !self.end_of_sequence)
    }

    pub fn end_of_file(&self) -> bool {
        self.end_of_file
    }

    pub fn end_of_file_sequence(&self) -> bool {
        self.end_of_sequence
    }

    pub fn get_position(&self) -> u64 {
        self.position
    }

    /// Reads the next record, or the record at `pos` (relative to the start
    /// of the event-record area) if given.
    pub fn get_data(&mut self, pos: Option<u64>) -> Result<(ReadStatus, Option<Vec<u8>>)> {
        if let Some(p) = pos {
            self.source.seek_abs(self.records_start + p)?;
            self.position = p;
        }

        let header = match RecordHeader::read(&mut self.source) {
            Ok(h) => h,
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
                return self.handle_truncated_tail();
            }
            Err(e) => return Err(e.into()),
        };

        match header.marker {
            RECORD_MARKER => {
                let payload = record::read_record_body(&mut self.source, &header)?;
                self.position += (RECORD_HEADER_BYTES + record::pad_to_word(payload.len())) as u64;
                Ok((ReadStatus::Ok, Some(payload)))
            }
            TRAILER_MARKER => {
                EndOfFileRecord::read_from_record(&mut self.source, &header)?;
                self.end_of_file = true;
                self.advance_past_end_of_file()
            }
            other => Err(Error::InternalError(format!("unrecognized record marker {other:#010x}"))),
        }
    }

    fn handle_truncated_tail(&mut self) -> Result<(ReadStatus, Option<Vec<u8>>)> {
        self.end_of_file = true;
        if self.open_for_writing {
            return Ok((ReadStatus::Wait, None));
        }
        Err(Error::NoEndOfFileRecord(self.path.clone()))
    }

    fn advance_past_end_of_file(&mut self) -> Result<(ReadStatus, Option<Vec<u8>>)> {
        if !self.sequence_enabled {
            return Ok((ReadStatus::Woff, None));
        }
        let name = RawFileName::parse(&self.path.to_string_lossy())?;
        let next_path =
            self.path.parent().unwrap_or_else(|| Path::new(".")).join(name.next_sequence().to_string());
        if !S::file_exists(&next_path) {
            self.end_of_sequence = true;
            return Ok((ReadStatus::NoSeq, None));
        }

        let next = StorageReader::<S>::open(&next_path)?;
        self.source = next.source;
        self.path = next.path;
        self.header = next.header;
        self.records_start = next.records_start;
        self.position = 0;
        self.end_of_file = false;
        self.open_for_writing = next.open_for_writing;
        self.get_data(None)
    }

    // Metadata, cached from the header at `open()`.
    pub fn run_number(&self) -> u32 {
        self.header.run_parameters.run_number
    }
    pub fn max_events(&self) -> u32 {
        self.header.run_parameters.max_events
    }
    pub fn rec_enable(&self) -> bool {
        self.header.run_parameters.rec_enable
    }
    pub fn trigger_type(&self) -> u32 {
        self.header.run_parameters.trigger_type
    }
    pub fn detector_mask(&self) -> (u64, u64) {
        (self.header.run_parameters.detector_mask_lsb, self.header.run_parameters.detector_mask_msb)
    }
    pub fn beam_type(&self) -> u32 {
        self.header.run_parameters.beam_type
    }
    pub fn beam_energy(&self) -> u32 {
        self.header.run_parameters.beam_energy
    }
    pub fn project(&self) -> &str {
        &self.header.project
    }
    pub fn stream_type(&self) -> &str {
        &self.header.stream_type
    }
    pub fn stream_name(&self) -> &str {
        &self.header.stream_name
    }
    pub fn lumi_block(&self) -> u32 {
        self.header.lumi_block
    }
    pub fn compression(&self) -> CompressionType {
        self.header.compression
    }
    pub fn free_metadata(&self) -> &[String] {
        &self.header.free_metadata
    }
    pub fn start_date(&self) -> u32 {
        self.header.start_date
    }
    pub fn start_time(&self) -> u32 {
        self.header.start_time
    }
    pub fn guid(&self) -> Guid {
        self.header.guid
    }

    fn read_trailer_with_restore(&mut self) -> Result<EndOfFileRecord> {
        let saved = self.source.tell()?;
        let trailer_span = (RECORD_HEADER_BYTES + EndOfFileRecord::ENCODED_BYTES) as i64;
        self.source.seek_from_end(trailer_span)?;
        let header = RecordHeader::read(&mut self.source)?;
        let trailer = EndOfFileRecord::read_from_record(&mut self.source, &header)?;
        self.source.seek_abs(saved)?;
        Ok(trailer)
    }

    pub fn end_date(&mut self) -> Result<u32> {
        self.read_trailer_with_restore().map(|t| t.end_date)
    }
    pub fn end_time(&mut self) -> Result<u32> {
        self.read_trailer_with_restore().map(|t| t.end_time)
    }
    pub fn events_in_file(&mut self) -> Result<u32> {
        self.read_trailer_with_restore().map(|t| t.events_in_file)
    }
    pub fn data_mb_in_file(&mut self) -> Result<u32> {
        self.read_trailer_with_restore().map(|t| t.data_mb_in_file)
    }
    pub fn events_in_file_sequence(&mut self) -> Result<u32> {
        self.read_trailer_with_restore().map(|t| t.events_in_file_sequence)
    }
    pub fn data_mb_in_file_sequence(&mut self) -> Result<u32> {
        self.read_trailer_with_restore().map(|t| t.data_mb_in_file_sequence)
    }
}
