//! Pluggable byte sources for the reader. Only a local-file implementation
//! ships here; `rfio:`/`dcap:` URLs are recognized and rejected with a clear
//! error rather than silently falling back to the local path.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// A seekable, readable byte source a [`crate::reader::StorageReader`] pulls
/// file content from.
pub trait ByteSource: Sized {
    fn open(path: &Path) -> Result<Self>;
    fn file_exists(path: &Path) -> bool;
    fn is_open(&self) -> bool;
    fn is_eof(&self) -> bool;
    fn read_bytes(&mut self, buf: &mut [u8]) -> Result<usize>;
    fn tell(&mut self) -> Result<u64>;
    fn seek_abs(&mut self, pos: u64) -> Result<()>;
    fn seek_from_end(&mut self, back: i64) -> Result<()>;
}

pub struct LocalFileSource {
    file: File,
    eof: bool,
}

impl LocalFileSource {
    pub fn open_path(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self { file: File::open(path)?, eof: false })
    }
}

impl ByteSource for LocalFileSource {
    fn open(path: &Path) -> Result<Self> {
        Self::open_path(path)
    }

    fn file_exists(path: &Path) -> bool {
        path.is_file()
    }

    fn is_open(&self) -> bool {
        true
    }

    fn is_eof(&self) -> bool {
        self.eof
    }

    fn read_bytes(&mut self, buf: &mut [u8]) -> Result<usize> {
        let mut read_total = 0;
        while read_total < buf.len() {
            match self.file.read(&mut buf[read_total..])? {
                0 => {
                    self.eof = true;
                    break;
                }
                n => read_total += n,
            }
        }
        Ok(read_total)
    }

    fn tell(&mut self) -> Result<u64> {
        Ok(self.file.stream_position()?)
    }

    fn seek_abs(&mut self, pos: u64) -> Result<()> {
        self.file.seek(SeekFrom::Start(pos))?;
        self.eof = false;
        Ok(())
    }

    fn seek_from_end(&mut self, back: i64) -> Result<()> {
        self.file.seek(SeekFrom::End(-back))?;
        self.eof = false;
        Ok(())
    }
}

/// Dispatches a file name to a [`ByteSource`] by URL scheme. Only plain
/// local paths are supported; `rfio:`/`dcap:` are recognized so the error
/// names the missing plugin rather than failing with a confusing I/O error.
pub fn pick_data_reader(name: &str) -> Result<LocalFileSource> {
    for scheme in ["rfio:", "dcap:", "castor:"] {
        if name.starts_with(scheme) {
            return Err(Error::UnsupportedByteSource(scheme.to_string()));
        }
    }
    LocalFileSource::open_path(PathBuf::from(name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn reads_and_seeks_a_local_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.bin");
        std::fs::File::create(&path).unwrap().write_all(b"0123456789").unwrap();

        let mut source = LocalFileSource::open_path(&path).unwrap();
        let mut buf = [0u8; 4];
        assert_eq!(source.read_bytes(&mut buf).unwrap(), 4);
        assert_eq!(&buf, b"0123");

        source.seek_from_end(3).unwrap();
        let mut tail = [0u8; 3];
        assert_eq!(source.read_bytes(&mut tail).unwrap(), 3);
        assert_eq!(&tail, b"789");
    }

    #[test]
    fn rejects_unsupported_schemes() {
        assert!(matches!(pick_data_reader("rfio:/some/path"), Err(Error::UnsupportedByteSource(_))));
    }
}
