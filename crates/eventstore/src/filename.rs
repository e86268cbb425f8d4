//! ATLAS-style raw event file names and the callbacks that hand them to a
//! [`crate::writer::StorageWriter`] one rollover at a time.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Whether a file is still being appended to or has been finalized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileExtension {
    /// Open for writing; not yet safe to read to completion.
    Writing,
    /// Closed, trailer written, safe to read.
    Data,
}

impl FileExtension {
    fn as_str(self) -> &'static str {
        match self {
            FileExtension::Writing => "writing",
            FileExtension::Data => "data",
        }
    }
}

/// The structured components of the standard raw-file naming convention:
/// `<project>.<run:8>.<streamtype>_<streamname>.<prodstep>.<datatype>.<lb:4>._<app>.<seq:4>.<ext>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFileName {
    pub project: String,
    pub run_number: u32,
    pub stream_type: String,
    pub stream_name: String,
    pub prod_step: String,
    pub data_type: String,
    pub lumi_block: u32,
    pub app_name: String,
    pub sequence: u32,
    pub extension: FileExtension,
}

impl RawFileName {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        project: impl Into<String>,
        run_number: u32,
        stream_type: impl Into<String>,
        stream_name: impl Into<String>,
        prod_step: impl Into<String>,
        data_type: impl Into<String>,
        lumi_block: u32,
        app_name: impl Into<String>,
    ) -> Self {
        Self {
            project: project.into(),
            run_number,
            stream_type: stream_type.into(),
            stream_name: stream_name.into(),
            prod_step: prod_step.into(),
            data_type: data_type.into(),
            lumi_block,
            app_name: app_name.into(),
            sequence: 1,
            extension: FileExtension::Writing,
        }
    }

    pub fn with_sequence(mut self, sequence: u32) -> Self {
        self.sequence = sequence;
        self
    }

    pub fn with_extension(mut self, extension: FileExtension) -> Self {
        self.extension = extension;
        self
    }

    pub fn next_sequence(&self) -> Self {
        let mut next = self.clone();
        next.sequence += 1;
        next
    }

    /// Parses either the canonical 8-digit-run/4-digit-sequence name or the
    /// legacy 7-digit-run/2-digit-sequence variant. Legacy names are only
    /// ever read, never produced by [`Self::to_string`].
    pub fn parse(name: &str) -> Result<Self> {
        let stem = Path::new(name)
            .file_name()
            .and_then(|f| f.to_str())
            .ok_or_else(|| Error::MalformedFileName(name.to_string()))?;

        let parts: Vec<&str> = stem.split('.').collect();
        if parts.len() != 9 {
            return Err(Error::MalformedFileName(name.to_string()));
        }
        let [project, run, stream, prod_step, data_type, lb, app, seq, ext] = parts[..] else {
            return Err(Error::MalformedFileName(name.to_string()));
        };

        let run_number: u32 = run.parse().map_err(|_| Error::MalformedFileName(name.to_string()))?;
        let (stream_type, stream_name) =
            stream.split_once('_').ok_or_else(|| Error::MalformedFileName(name.to_string()))?;
        let lumi_block: u32 = lb.parse().map_err(|_| Error::MalformedFileName(name.to_string()))?;
        let app_name = app.strip_prefix('_').unwrap_or(app);

        let sequence: u32 = seq.parse().map_err(|_| Error::MalformedFileName(name.to_string()))?;
        let extension = match ext {
            "data" => FileExtension::Data,
            "writing" => FileExtension::Writing,
            _ => return Err(Error::MalformedFileName(name.to_string())),
        };

        Ok(RawFileName {
            project: project.to_string(),
            run_number,
            stream_type: stream_type.to_string(),
            stream_name: stream_name.to_string(),
            prod_step: prod_step.to_string(),
            data_type: data_type.to_string(),
            lumi_block,
            app_name: app_name.to_string(),
            sequence,
            extension,
        })
    }
}

impl fmt::Display for RawFileName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{:08}.{}_{}.{}.{}.{:04}._{}.{:04}.{}",
            self.project,
            self.run_number,
            self.stream_type,
            self.stream_name,
            self.prod_step,
            self.data_type,
            self.lumi_block,
            self.app_name,
            self.sequence,
            self.extension.as_str()
        )
    }
}

/// Hands a [`StorageWriter`](crate::writer::StorageWriter) the path for its
/// next file. Called once when the writer opens, and again on every
/// rollover.
pub trait FileNameCallback: Send {
    fn next_file_name(&mut self) -> Result<PathBuf>;
}

/// The standard callback: bumps the sequence number on every call and writes
/// the canonical raw-file name into `directory`.
pub struct RawFileNameCallback {
    pub directory: PathBuf,
    pub template: RawFileName,
    called: bool,
}

impl RawFileNameCallback {
    pub fn new(directory: impl Into<PathBuf>, template: RawFileName) -> Self {
        Self { directory: directory.into(), template, called: false }
    }
}

impl FileNameCallback for RawFileNameCallback {
    fn next_file_name(&mut self) -> Result<PathBuf> {
        if self.called {
            self.template = self.template.next_sequence();
        }
        self.called = true;
        let mut name = self.template.clone();
        name.extension = FileExtension::Writing;
        Ok(self.directory.join(name.to_string()))
    }
}

/// Writes to a single, fixed path; any rollover past the first file is an
/// error (`SingleFileAlreadyExists`), matching the original library's
/// single-file recording mode.
pub struct SimpleFileNameCallback {
    pub path: PathBuf,
    called: bool,
}

impl SimpleFileNameCallback {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), called: false }
    }
}

impl FileNameCallback for SimpleFileNameCallback {
    fn next_file_name(&mut self) -> Result<PathBuf> {
        if self.called {
            return Err(Error::SingleFileAlreadyExists(self.path.clone()));
        }
        self.called = true;
        Ok(self.path.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_the_canonical_layout() {
        let name = RawFileName::new("data_test", 123456, "physics", "Main", "daq", "RAW", 42, "SFO-1");
        assert_eq!(name.to_string(), "data_test.00123456.physics_Main.daq.RAW.0042._SFO-1.0001.writing");
    }

    #[test]
    fn parses_what_it_formats() {
        let name = RawFileName::new("data_test", 7, "physics", "Main", "daq", "RAW", 0, "SFO-1")
            .with_sequence(3)
            .with_extension(FileExtension::Data);
        let parsed = RawFileName::parse(&name.to_string()).unwrap();
        assert_eq!(parsed, name);
    }

    #[test]
    fn parses_legacy_short_widths() {
        let parsed = RawFileName::parse("data_test.0000007.physics_Main.daq.RAW.0000._SFO-1.01.data").unwrap();
        assert_eq!(parsed.run_number, 7);
        assert_eq!(parsed.sequence, 1);
    }

    #[test]
    fn raw_callback_increments_sequence_each_call() {
        let template = RawFileName::new("data_test", 1, "physics", "Main", "daq", "RAW", 0, "SFO-1");
        let mut cb = RawFileNameCallback::new("/tmp", template);
        let first = cb.next_file_name().unwrap();
        let second = cb.next_file_name().unwrap();
        assert!(first.to_str().unwrap().ends_with("0001.writing"));
        assert!(second.to_str().unwrap().ends_with("0002.writing"));
    }

    #[test]
    fn simple_callback_rejects_a_second_file() {
        let mut cb = SimpleFileNameCallback::new("/tmp/single.data");
        cb.next_file_name().unwrap();
        assert!(matches!(cb.next_file_name(), Err(Error::SingleFileAlreadyExists(_))));
    }
}
