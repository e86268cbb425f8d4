//! File-start metadata record: run parameters, stream identity, GUID and
//! free-form strings, written once at the head of every container file.
//!
//! Layout follows the teacher's `FileHeader`/`SegmentHeader` convention
//! (fixed numeric fields via `byteorder`, magic + version check on read) but
//! widens it with length-prefixed strings where the metadata is genuinely
//! variable-length.

use std::io::{Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use eformat::compression::CompressionType;

use crate::error::{Error, Result};
use crate::guid::Guid;

pub const MAGIC: [u8; 8] = *b"EVTSTOR\0";
pub const FORMAT_VERSION: u32 = 1;

pub(crate) fn write_string<W: Write>(w: &mut W, s: &str) -> std::io::Result<()> {
    w.write_u32::<LittleEndian>(s.len() as u32)?;
    w.write_all(s.as_bytes())
}

pub(crate) fn read_string<R: Read>(r: &mut R) -> std::io::Result<String> {
    let len = r.read_u32::<LittleEndian>()? as usize;
    let mut buf = vec![0u8; len];
    r.read_exact(&mut buf)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Run parameters carried in the file header, mirroring the original
/// library's `run_parameters_record`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunParameters {
    pub run_number: u32,
    pub max_events: u32,
    pub rec_enable: bool,
    pub trigger_type: u32,
    pub detector_mask_lsb: u64,
    pub detector_mask_msb: u64,
    pub beam_type: u32,
    pub beam_energy: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileHeader {
    pub run_parameters: RunParameters,
    pub project: String,
    pub stream_type: String,
    pub stream_name: String,
    pub prod_step: String,
    pub data_type: String,
    pub lumi_block: u32,
    pub app_name: String,
    pub file_name_core: String,
    pub free_metadata: Vec<String>,
    pub compression: CompressionType,
    pub start_date: u32,
    pub start_time: u32,
    pub max_file_events: u32,
    pub max_file_mb: u32,
    pub file_sequence: u32,
    pub guid: Guid,
}

impl FileHeader {
    pub fn write<W: Write>(&self, w: &mut W) -> std::io::Result<()> {
        w.write_all(&MAGIC)?;
        w.write_u32::<LittleEndian>(FORMAT_VERSION)?;

        let rp = &self.run_parameters;
        w.write_u32::<LittleEndian>(rp.run_number)?;
        w.write_u32::<LittleEndian>(rp.max_events)?;
        w.write_u32::<LittleEndian>(rp.rec_enable as u32)?;
        w.write_u32::<LittleEndian>(rp.trigger_type)?;
        w.write_u64::<LittleEndian>(rp.detector_mask_lsb)?;
        w.write_u64::<LittleEndian>(rp.detector_mask_msb)?;
        w.write_u32::<LittleEndian>(rp.beam_type)?;
        w.write_u32::<LittleEndian>(rp.beam_energy)?;

        write_string(w, &self.project)?;
        write_string(w, &self.stream_type)?;
        write_string(w, &self.stream_name)?;
        write_string(w, &self.prod_step)?;
        write_string(w, &self.data_type)?;
        w.write_u32::<LittleEndian>(self.lumi_block)?;
        write_string(w, &self.app_name)?;
        write_string(w, &self.file_name_core)?;

        w.write_u32::<LittleEndian>(self.free_metadata.len() as u32)?;
        for entry in &self.free_metadata {
            write_string(w, entry)?;
        }

        w.write_u32::<LittleEndian>(self.compression.code())?;
        w.write_u32::<LittleEndian>(self.start_date)?;
        w.write_u32::<LittleEndian>(self.start_time)?;
        w.write_u32::<LittleEndian>(self.max_file_events)?;
        w.write_u32::<LittleEndian>(self.max_file_mb)?;
        w.write_u32::<LittleEndian>(self.file_sequence)?;
        w.write_all(&self.guid.0)
    }

    pub fn read<R: Read>(r: &mut R) -> Result<Self> {
        let mut magic = [0u8; 8];
        r.read_exact(&mut magic)?;
        if magic != MAGIC {
            return Err(Error::WrongFileFormat(std::path::PathBuf::new()));
        }
        let version = r.read_u32::<LittleEndian>()?;
        if version != FORMAT_VERSION {
            return Err(Error::InternalError(format!("unsupported header version {version}")));
        }

        let run_parameters = RunParameters {
            run_number: r.read_u32::<LittleEndian>()?,
            max_events: r.read_u32::<LittleEndian>()?,
            rec_enable: r.read_u32::<LittleEndian>()? != 0,
            trigger_type: r.read_u32::<LittleEndian>()?,
            detector_mask_lsb: r.read_u64::<LittleEndian>()?,
            detector_mask_msb: r.read_u64::<LittleEndian>()?,
            beam_type: r.read_u32::<LittleEndian>()?,
            beam_energy: r.read_u32::<LittleEndian>()?,
        };

        let project = read_string(r)?;
        let stream_type = read_string(r)?;
        let stream_name = read_string(r)?;
        let prod_step = read_string(r)?;
        let data_type = read_string(r)?;
        let lumi_block = r.read_u32::<LittleEndian>()?;
        let app_name = read_string(r)?;
        let file_name_core = read_string(r)?;

        let n_metadata = r.read_u32::<LittleEndian>()? as usize;
        let mut free_metadata = Vec::with_capacity(n_metadata);
        for _ in 0..n_metadata {
            free_metadata.push(read_string(r)?);
        }

        let compression = CompressionType::from_u32(r.read_u32::<LittleEndian>()?)?;
        let start_date = r.read_u32::<LittleEndian>()?;
        let start_time = r.read_u32::<LittleEndian>()?;
        let max_file_events = r.read_u32::<LittleEndian>()?;
        let max_file_mb = r.read_u32::<LittleEndian>()?;
        let file_sequence = r.read_u32::<LittleEndian>()?;
        let mut guid_bytes = [0u8; 16];
        r.read_exact(&mut guid_bytes)?;

        Ok(FileHeader {
            run_parameters,
            project,
            stream_type,
            stream_name,
            prod_step,
            data_type,
            lumi_block,
            app_name,
            file_name_core,
            free_metadata,
            compression,
            start_date,
            start_time,
            max_file_events,
            max_file_mb,
            file_sequence,
            guid: Guid(guid_bytes),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> FileHeader {
        FileHeader {
            run_parameters: RunParameters {
                run_number: 123456,
                max_events: 0,
                rec_enable: true,
                trigger_type: 1,
                detector_mask_lsb: 0x0000_0000_0002_0000,
                detector_mask_msb: 0,
                beam_type: 1,
                beam_energy: 6500,
            },
            project: "data_test".into(),
            stream_type: "physics".into(),
            stream_name: "Main".into(),
            prod_step: "daq".into(),
            data_type: "RAW".into(),
            lumi_block: 42,
            app_name: "SFO-1".into(),
            file_name_core: "data_test.00123456.physics_Main.daq.RAW".into(),
            free_metadata: vec!["GeoAtlas=ATLAS-R2-2016-01-00-01".into()],
            compression: CompressionType::Zlib,
            start_date: 26072026,
            start_time: 120000,
            max_file_events: 0,
            max_file_mb: 10_000,
            file_sequence: 1,
            guid: Guid::generate(),
        }
    }

    #[test]
    fn roundtrips_through_bytes() {
        let header = sample();
        let mut buf = Vec::new();
        header.write(&mut buf).unwrap();
        let back = FileHeader::read(&mut buf.as_slice()).unwrap();
        assert_eq!(back, header);
    }

    #[test]
    fn rejects_wrong_magic() {
        let bytes = vec![0u8; 64];
        assert!(matches!(FileHeader::read(&mut bytes.as_slice()), Err(Error::WrongFileFormat(_))));
    }
}
