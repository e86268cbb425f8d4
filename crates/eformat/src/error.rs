use thiserror::Error;

/// Fatal fragment-codec errors.
///
/// Read views additionally expose non-throwing equivalents (`check_noex`,
/// `problems`) that report [`crate::FragmentProblem`]s instead of returning
/// `Err`; this enum is for callers that opted into the throwing path, and for
/// conditions ([`Error::Compression`], version conversion failures) that have
/// no non-throwing counterpart.
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum Error {
    #[error("expected marker {expected:#010x}, found {found:#010x}")]
    WrongMarker { expected: u32, found: u32 },

    #[error("fragment size {size} words is inconsistent with header/children")]
    WrongSize { size: u32 },

    #[error("offset {offset} exceeds buffer of {len} words")]
    OutOfBounds { offset: usize, len: usize },

    #[error("buffer is not aligned to a 32-bit word boundary")]
    NotAligned,

    #[error("no child at index {index} (fragment has {nchildren})")]
    NoSuchChild { index: usize, nchildren: usize },

    #[error("fragment_size_word ({fragment_size}) < header_size_word ({header_size})")]
    SizeCheck { fragment_size: u32, header_size: u32 },

    #[error("ROD fragment_size_word ({rod_size}) != ROB payload length ({rob_payload})")]
    RodSizeCheck { rod_size: u32, rob_payload: u32 },

    #[error("declared count {count} exceeds the remaining buffer")]
    TooBigCount { count: u32 },

    #[error("block of {have} words is smaller than the minimum {need}")]
    BlockSizeTooSmall { have: u32, need: u32 },

    #[error("unsupported major version {found:#06x} (expected {expected:#06x})")]
    BadVersion { expected: u16, found: u16 },

    #[error("unsupported ROD major version {found:#06x} (expected {expected:#06x})")]
    BadRodVersion { expected: u16, found: u16 },

    #[error("unsupported version conversion source major {0:#06x}")]
    UnsupportedVersion(u16),

    #[error("operation not supported: {0}")]
    UnsupportedOperation(String),

    #[error("compression failure: {0}")]
    CompressionFailure(String),

    #[error("unknown compression type {0}")]
    UnknownCompressionType(u32),

    #[error("decompressed {got} words, expected {expected}")]
    WrongUncompressedSize { expected: u32, got: u32 },

    #[error("unknown subdetector identifier {0:#04x}")]
    UnknownSubdetectorIdentifier(u8),

    #[error("unsupported subdetector identifier {0:#04x}")]
    UnsupportedSubdetectorIdentifier(u8),

    #[error("cannot decode detector mask from {0:?}")]
    CannotDecodeMask(String),
}

pub type Result<T> = std::result::Result<T, Error>;
