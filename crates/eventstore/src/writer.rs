//! Sequenced event-storage writer: `IDLE -> OPEN(".writing") -> WRITING ->
//! [TRANSITION] -> CLOSED(".data")`, one file at a time, rolling over on
//! size/event-count thresholds.

use std::fs::{self, File};
use std::io::{BufWriter, Seek, Write};
use std::path::{Path, PathBuf};

use chrono::{Datelike, Local, Timelike};
use eformat::compression::{self, CompressionType};

use crate::error::Result;
use crate::filename::FileNameCallback;
use crate::guid::Guid;
use crate::header::{FileHeader, RunParameters};
use crate::record::write_record;
use crate::trailer::EndOfFileRecord;

/// Per-run metadata a writer stamps into every file it opens. Everything
/// here is constant across a run except `file_sequence`, which the writer
/// bumps itself.
#[derive(Debug, Clone)]
pub struct WriterMetadata {
    pub run_parameters: RunParameters,
    pub project: String,
    pub stream_type: String,
    pub stream_name: String,
    pub prod_step: String,
    pub data_type: String,
    pub lumi_block: u32,
    pub app_name: String,
    pub free_metadata: Vec<String>,
}

#[derive(Debug, Clone, Copy)]
pub struct WriterLimits {
    pub max_file_mb: u32,
    pub max_file_events: u32,
}

impl Default for WriterLimits {
    fn default() -> Self {
        Self { max_file_mb: 10_000, max_file_events: 0 }
    }
}

/// Callback fired once a file has been renamed to its final `.data` name.
pub trait FileWasClosed {
    fn file_was_closed(&mut self, path: &Path);
}

struct OpenFile {
    writer: BufWriter<File>,
    writing_path: PathBuf,
    final_path: PathBuf,
    bytes_written: u64,
    events_written: u32,
    payload_adler: u32,
    payload_bytes: u64,
}

/// The state machine itself. `N` supplies the next file name on open and on
/// every rollover; `put_data`/`next_file`/`close_file` drive the rest.
pub struct StorageWriter<N: FileNameCallback> {
    name_source: N,
    metadata: WriterMetadata,
    limits: WriterLimits,
    compression: CompressionType,
    compression_level: u32,
    guid_override: Option<Guid>,
    pending_dir: Option<PathBuf>,
    current: Option<OpenFile>,
    sequence: u32,
    events_in_sequence: u64,
    mb_in_sequence: f64,
    callbacks: Vec<Box<dyn FileWasClosed>>,
}

fn date_as_ddmmyyyy() -> u32 {
    let now = Local::now();
    now.day() * 1_000_000 + now.month() * 10_000 + now.year() as u32
}

fn time_as_hhmmss() -> u32 {
    let now = Local::now();
    now.hour() * 10_000 + now.minute() * 100 + now.second()
}

impl<N: FileNameCallback> StorageWriter<N> {
    pub fn new(name_source: N, metadata: WriterMetadata, limits: WriterLimits) -> Self {
        Self {
            name_source,
            metadata,
            limits,
            compression: CompressionType::None,
            compression_level: 6,
            guid_override: None,
            pending_dir: None,
            current: None,
            sequence: 0,
            events_in_sequence: 0,
            mb_in_sequence: 0.0,
            callbacks: Vec::new(),
        }
    }

    pub fn with_compression(mut self, kind: CompressionType, level: u32) -> Self {
        self.compression = kind;
        self.compression_level = level;
        self
    }

    /// Overrides the GUID of the *next* file opened.
    pub fn set_guid(&mut self, guid: Guid) {
        self.guid_override = Some(guid);
    }

    /// Changes the directory the next rollover writes into. Takes effect at
    /// the next `open_new_file`, not immediately.
    pub fn cd(&mut self, dir: impl Into<PathBuf>) {
        self.pending_dir = Some(dir.into());
    }

    /// True between a call to [`Self::cd`] and the rollover that applies it.
    pub fn in_transition(&self) -> bool {
        self.pending_dir.is_some()
    }

    pub fn register_callback(&mut self, callback: Box<dyn FileWasClosed>) {
        self.callbacks.push(callback);
    }

    fn ensure_open(&mut self) -> Result<()> {
        if self.current.is_none() {
            self.open_new_file()?;
        }
        Ok(())
    }

    fn open_new_file(&mut self) -> Result<()> {
        self.sequence += 1;
        let mut writing_path = self.name_source.next_file_name()?;
        if let Some(dir) = self.pending_dir.take() {
            if let Some(file_name) = writing_path.file_name() {
                writing_path = dir.join(file_name);
            }
        }
        if let Some(parent) = writing_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let final_path = writing_path.with_extension("data");

        let header = FileHeader {
            run_parameters: self.metadata.run_parameters,
            project: self.metadata.project.clone(),
            stream_type: self.metadata.stream_type.clone(),
            stream_name: self.metadata.stream_name.clone(),
            prod_step: self.metadata.prod_step.clone(),
            data_type: self.metadata.data_type.clone(),
            lumi_block: self.metadata.lumi_block,
            app_name: self.metadata.app_name.clone(),
            file_name_core: final_path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or_default()
                .to_string(),
            free_metadata: self.metadata.free_metadata.clone(),
            compression: self.compression,
            start_date: date_as_ddmmyyyy(),
            start_time: time_as_hhmmss(),
            max_file_events: self.limits.max_file_events,
            max_file_mb: self.limits.max_file_mb,
            file_sequence: self.sequence,
            guid: self.guid_override.take().unwrap_or_else(Guid::generate),
        };

        let mut writer = BufWriter::new(File::create(&writing_path)?);
        header.write(&mut writer)?;
        let bytes_written = writer.stream_position()?;

        self.current = Some(OpenFile {
            writer,
            writing_path,
            final_path,
            bytes_written,
            events_written: 0,
            payload_adler: 1,
            payload_bytes: 0,
        });
        Ok(())
    }

    fn should_roll(&self, incoming_bytes: u64) -> bool {
        let Some(open) = &self.current else { return false };
        if open.events_written == 0 {
            return false;
        }
        let max_bytes = self.limits.max_file_mb as u64 * 1024 * 1024;
        let over_size = max_bytes > 0 && open.bytes_written + incoming_bytes > max_bytes;
        let over_events =
            self.limits.max_file_events > 0 && open.events_written >= self.limits.max_file_events;
        over_size || over_events
    }

    fn put_bytes(&mut self, payload: &[u8]) -> Result<()> {
        let record_bytes = crate::record::RECORD_HEADER_BYTES + crate::record::pad_to_word(payload.len());
        if self.pending_dir.is_some() || self.should_roll(record_bytes as u64) {
            self.next_file()?;
        } else {
            self.ensure_open()?;
        }

        let open = self.current.as_mut().expect("ensure_open just opened a file");
        let written = write_record(&mut open.writer, payload)?;
        open.bytes_written += written;
        open.events_written += 1;
        open.payload_adler = crate::checksum::adler32_init(open.payload_adler, payload);
        open.payload_bytes += payload.len() as u64;
        self.events_in_sequence += 1;
        self.mb_in_sequence += payload.len() as f64 / (1024.0 * 1024.0);
        log::trace!("wrote record of {} bytes to {:?}", payload.len(), open.writing_path);
        Ok(())
    }

    /// Compresses `bytes` per the writer's configured compression and
    /// appends it as one record, rolling over first if needed.
    pub fn put_data(&mut self, bytes: &[u8]) -> Result<()> {
        let payload = match self.compression {
            CompressionType::None => bytes.to_vec(),
            kind => {
                let mut out = Vec::new();
                compression::compress(kind, bytes, self.compression_level, &mut out)?;
                out
            }
        };
        self.put_bytes(&payload)
    }

    /// Appends `bytes` verbatim, bypassing compression (the caller has
    /// already compressed it, e.g. a fragment carrying its own compression).
    pub fn put_precompressed_data(&mut self, bytes: &[u8]) -> Result<()> {
        self.put_bytes(bytes)
    }

    /// Finalizes the current file: writes the trailer, renames
    /// `.writing` -> `.data`, and fires the close callbacks.
    pub fn close_file(&mut self) -> Result<()> {
        let Some(mut open) = self.current.take() else { return Ok(()) };

        let trailer = EndOfFileRecord {
            end_date: date_as_ddmmyyyy(),
            end_time: time_as_hhmmss(),
            events_in_file: open.events_written,
            data_mb_in_file: (open.payload_bytes / (1024 * 1024)) as u32,
            events_in_file_sequence: self.events_in_sequence as u32,
            data_mb_in_file_sequence: self.mb_in_sequence as u32,
            adler32: open.payload_adler,
        };
        trailer.write_as_record(&mut open.writer)?;
        open.writer.flush()?;
        drop(open.writer);

        fs::rename(&open.writing_path, &open.final_path)?;
        log::debug!("closed {:?} ({} events)", open.final_path, open.events_written);
        for callback in &mut self.callbacks {
            callback.file_was_closed(&open.final_path);
        }
        Ok(())
    }

    /// Closes the current file (if any) and immediately opens the next one.
    pub fn next_file(&mut self) -> Result<()> {
        self.close_file()?;
        self.open_new_file()
    }

    /// Finalizes whatever file is open. Call this instead of relying on
    /// `Drop` when the close outcome needs to be checked.
    pub fn finalize(mut self) -> Result<()> {
        self.close_file()
    }
}

impl<N: FileNameCallback> Drop for StorageWriter<N> {
    fn drop(&mut self) {
        if self.current.is_some() {
            if let Err(e) = self.close_file() {
                log::warn!("failed to close storage file on drop: {e}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filename::{RawFileName, RawFileNameCallback};

    fn metadata() -> WriterMetadata {
        WriterMetadata {
            run_parameters: RunParameters {
                run_number: 7,
                max_events: 0,
                rec_enable: true,
                trigger_type: 1,
                detector_mask_lsb: 2,
                detector_mask_msb: 0,
                beam_type: 1,
                beam_energy: 6500,
            },
            project: "data_test".into(),
            stream_type: "physics".into(),
            stream_name: "Main".into(),
            prod_step: "daq".into(),
            data_type: "RAW".into(),
            lumi_block: 0,
            app_name: "SFO-1".into(),
            free_metadata: Vec::new(),
        }
    }

    #[test]
    fn writes_events_and_closes_to_dot_data() {
        let dir = tempfile::tempdir().unwrap();
        let template = RawFileName::new("data_test", 7, "physics", "Main", "daq", "RAW", 0, "SFO-1");
        let callback = RawFileNameCallback::new(dir.path(), template);
        let mut writer = StorageWriter::new(callback, metadata(), WriterLimits::default());

        writer.put_data(b"event-one").unwrap();
        writer.put_data(b"event-two-longer").unwrap();
        writer.finalize().unwrap();

        let entries: Vec<_> = fs::read_dir(dir.path()).unwrap().map(|e| e.unwrap().path()).collect();
        assert_eq!(entries.len(), 1);
        assert!(entries[0].to_str().unwrap().ends_with(".data"));
    }

    #[test]
    fn rolls_over_on_event_count_limit() {
        let dir = tempfile::tempdir().unwrap();
        let template = RawFileName::new("data_test", 7, "physics", "Main", "daq", "RAW", 0, "SFO-1");
        let callback = RawFileNameCallback::new(dir.path(), template);
        let limits = WriterLimits { max_file_mb: 10_000, max_file_events: 1 };
        let mut writer = StorageWriter::new(callback, metadata(), limits);

        writer.put_data(b"first").unwrap();
        writer.put_data(b"second").unwrap();
        writer.put_data(b"third").unwrap();
        writer.finalize().unwrap();

        let mut names: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        assert_eq!(names.len(), 3);
        assert!(names[0].ends_with("0001.data"));
        assert!(names[2].ends_with("0003.data"));
    }

    #[test]
    fn cd_takes_effect_on_the_next_rollover() {
        let dir = tempfile::tempdir().unwrap();
        let subdir = dir.path().join("sub");
        let template = RawFileName::new("data_test", 7, "physics", "Main", "daq", "RAW", 0, "SFO-1");
        let callback = RawFileNameCallback::new(dir.path(), template);
        let mut writer = StorageWriter::new(callback, metadata(), WriterLimits::default());

        writer.put_data(b"first").unwrap();
        writer.cd(&subdir);
        assert!(writer.in_transition());
        writer.put_data(b"second").unwrap();
        assert!(!writer.in_transition());
        writer.finalize().unwrap();

        assert!(subdir.exists());
        assert_eq!(fs::read_dir(&subdir).unwrap().count(), 1);
    }
}
