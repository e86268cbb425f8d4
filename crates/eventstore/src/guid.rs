//! 128-bit file identifiers, formatted the way the file-header record wants
//! them: uppercase hex, grouped `8-4-4-4-12` with dashes.

use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::{Error, Result};

static COUNTER: AtomicU32 = AtomicU32::new(0);

/// A file GUID: 16 bytes, printed as `XXXXXXXX-XXXX-XXXX-XXXX-XXXXXXXXXXXX`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Guid(pub [u8; 16]);

impl Guid {
    /// Generates a fresh GUID from the wall clock, process id and an
    /// in-process counter. Not cryptographically random, only unique enough
    /// to tell files apart; matches the original library's use of GUIDs as
    /// file labels rather than security tokens.
    pub fn generate() -> Self {
        let nanos = SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_nanos()).unwrap_or(0);
        let pid = std::process::id();
        let seq = COUNTER.fetch_add(1, Ordering::Relaxed);

        let mut bytes = [0u8; 16];
        bytes[0..8].copy_from_slice(&(nanos as u64).to_be_bytes());
        bytes[8..12].copy_from_slice(&pid.to_be_bytes());
        bytes[12..16].copy_from_slice(&seq.to_be_bytes());
        Guid(bytes)
    }

    pub fn parse(s: &str) -> Result<Self> {
        let hex: String = s.chars().filter(|c| *c != '-').collect();
        if hex.len() != 32 {
            return Err(Error::MalformedGuid(s.to_string()));
        }
        let mut bytes = [0u8; 16];
        for (i, byte) in bytes.iter_mut().enumerate() {
            let pair = &hex[i * 2..i * 2 + 2];
            *byte = u8::from_str_radix(pair, 16).map_err(|_| Error::MalformedGuid(s.to_string()))?;
        }
        Ok(Guid(bytes))
    }
}

impl fmt::Display for Guid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let b = &self.0;
        write!(
            f,
            "{:02X}{:02X}{:02X}{:02X}-{:02X}{:02X}-{:02X}{:02X}-{:02X}{:02X}-{:02X}{:02X}{:02X}{:02X}{:02X}{:02X}",
            b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7], b[8], b[9], b[10], b[11], b[12], b[13], b[14], b[15]
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrips_through_display_and_parse() {
        let guid = Guid::generate();
        let text = guid.to_string();
        assert_eq!(text.len(), 36);
        assert_eq!(Guid::parse(&text).unwrap(), guid);
    }

    #[test]
    fn successive_guids_differ() {
        assert_ne!(Guid::generate(), Guid::generate());
    }

    #[test]
    fn parse_rejects_wrong_length() {
        assert!(Guid::parse("not-a-guid").is_err());
    }
}
