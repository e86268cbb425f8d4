//! Checksum algorithms used by fragment and storage trailers.

mod adler32;
mod crc16;

pub use adler32::{adler32, adler32_init, adler32_mt, Adler32Config};
pub use crc16::{crc16_ccitt, crc16_ccitt_init};

/// Which checksum, if any, a fragment or storage trailer carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum CheckSum {
    None = 0x0,
    Crc16Ccitt = 0x1,
    Adler32 = 0x2,
}

impl CheckSum {
    pub fn from_u32(v: u32) -> Option<Self> {
        match v {
            0x0 => Some(CheckSum::None),
            0x1 => Some(CheckSum::Crc16Ccitt),
            0x2 => Some(CheckSum::Adler32),
            _ => None,
        }
    }
}

/// Computes `type`'s checksum over `data`, resuming from `init`.
///
/// `NO_CHECKSUM` always returns `init` unchanged, matching the original
/// library's convention of treating it as a no-op rather than an error.
pub fn checksum(kind: CheckSum, init: u32, data: &[u32]) -> u32 {
    match kind {
        CheckSum::None => init,
        CheckSum::Crc16Ccitt => crc16_ccitt_init(init as u16, data) as u32,
        CheckSum::Adler32 => adler32_init(init, data),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_checksum_is_identity() {
        assert_eq!(checksum(CheckSum::None, 0xdead_beef, &[1, 2, 3]), 0xdead_beef);
    }

    #[test]
    fn dispatch_matches_direct_call() {
        let data = [1u32, 2, 3, 4];
        assert_eq!(checksum(CheckSum::Adler32, 1, &data), adler32(&data));
        assert_eq!(checksum(CheckSum::Crc16Ccitt, 0xffff, &data), crc16_ccitt(&data));
    }
}
