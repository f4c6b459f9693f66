use thiserror::Error;

/// Errors raised while decoding a skeleton or animation dump.
///
/// Any of these aborts decoding of the current file; a partially decoded record is never returned.
#[derive(Error, Debug)]
pub enum DecodeError {
    /// Fewer bytes remain than the field requires.
    #[error("truncated input at offset {offset}: needed {needed} bytes, {remaining} remaining")]
    Truncated {
        offset: usize,
        needed: usize,
        remaining: usize,
    },
    /// A string field contains a byte outside the ASCII range.
    #[error("non-ASCII byte {byte:#04X} in string at offset {offset}")]
    InvalidEncoding { offset: usize, byte: u8 },
    /// The version tag does not match the supported dump version.
    #[error("unsupported version tag {found:#010X} (expected {expected:#010X})")]
    VersionMismatch { expected: u32, found: u32 },
    /// The embedded skeleton count is wrong for the kind of file being decoded.
    #[error("unexpected embedded skeleton count {0}")]
    UnexpectedSkeleton(i32),
    /// The embedded animation count is wrong for the kind of file being decoded.
    #[error("unexpected embedded animation count {0}")]
    UnexpectedAnimationCount(i32),
    /// An array length prefix is negative or larger than the remaining input could hold.
    #[error("implausible {field} count {count} with {remaining} bytes remaining")]
    UnexpectedCount {
        field: &'static str,
        count: i64,
        remaining: usize,
    },
    /// A repeated array count disagrees with the array it must line up with.
    #[error("{field} count {found} does not match bone count {expected}")]
    CountMismatch {
        field: &'static str,
        expected: usize,
        found: usize,
    },
    #[error("bone {bone} has invalid parent index {parent}")]
    InvalidParent { bone: usize, parent: i16 },
    #[error("parent chain of bone {bone} never reaches a root")]
    CyclicHierarchy { bone: usize },
    #[error(transparent)]
    Binary(#[from] binrw::Error),
}
