//! `eventstore`: sequenced raw-event container files on top of `eformat`
//! fragments. A [`writer::StorageWriter`] appends length-prefixed records to
//! a rolling sequence of `.writing` -> `.data` files; a
//! [`reader::StorageReader`] reads them back, optionally following the
//! sequence across file boundaries.

pub mod checksum;
pub mod error;
pub mod filename;
pub mod guid;
pub mod header;
pub mod reader;
pub mod record;
pub mod source;
pub mod trailer;
pub mod writer;

pub use error::{Error, Result};
pub use filename::{FileExtension, FileNameCallback, RawFileName, RawFileNameCallback, SimpleFileNameCallback};
pub use guid::Guid;
pub use header::{FileHeader, RunParameters};
pub use reader::{ReadStatus, StorageReader};
pub use source::{pick_data_reader, ByteSource, LocalFileSource};
pub use writer::{FileWasClosed, StorageWriter, WriterLimits, WriterMetadata};
