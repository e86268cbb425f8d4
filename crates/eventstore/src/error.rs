use std::path::PathBuf;

use thiserror::Error;

/// Fatal storage-reader/writer errors.
///
/// Non-fatal reader outcomes (end of sequence, a file not yet written to
/// disk) are reported through [`crate::reader::ReadStatus`] instead of this
/// enum; `Error` is reserved for conditions the caller cannot recover from by
/// simply waiting or trying the next file.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Fragment(#[from] eformat::Error),

    #[error("{0} is not a recognized event-storage file (bad magic or header)")]
    WrongFileFormat(PathBuf),

    #[error("no event found at the requested position")]
    NoEventFound,

    #[error("record declares {declared} bytes but only {available} are available")]
    WrongEventSize { declared: u32, available: u32 },

    #[error("{0} has no end-of-file trailer record")]
    NoEndOfFileRecord(PathBuf),

    #[error("buffer of {have} bytes is too small for a record of {need} bytes")]
    AllocatedMemoryTooLittle { need: usize, have: usize },

    #[error("failed to allocate {0} bytes for a record")]
    AllocatingMemoryFailed(usize),

    #[error("sequence reading is enabled but the next file {0} does not exist")]
    SequenceNextFileMissing(PathBuf),

    #[error("{0} already exists and the writer was configured for a single output file")]
    SingleFileAlreadyExists(PathBuf),

    #[error("byte source scheme {0:?} has no local implementation")]
    UnsupportedByteSource(String),

    #[error("malformed raw file name {0:?}")]
    MalformedFileName(String),

    #[error("malformed GUID {0:?}")]
    MalformedGuid(String),

    #[error("{0}")]
    InternalError(String),
}

pub type Result<T> = std::result::Result<T, Error>;
