use std::path::PathBuf;

use crate::format::Tag;

/// Failures surfaced by [`ByteFile`](crate::ByteFile) and the chunk layer.
///
/// Every operation reports to its direct caller; nothing is retried.
#[derive(Debug, thiserror::Error)]
pub enum ChunkFileError {
    /// An operation needed an open handle but the file is closed.
    #[error("file is not open")]
    NotOpen,

    /// `open` was called on a handle that already owns a file.
    #[error("file is already open: {}", path.display())]
    AlreadyOpen { path: PathBuf },

    /// The path (or its parent directory) does not exist.
    #[error("path not found: {}", path.display())]
    NotFound { path: PathBuf },

    /// Underlying filesystem failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Fewer bytes lie between the cursor and the end of the file than were requested.
    /// No data is consumed when this is returned.
    #[error("short read at offset {offset}: requested {requested} bytes, {available} available")]
    ShortRead {
        offset: u64,
        requested: u64,
        available: u64,
    },

    /// A relative seek would move the cursor before offset 0 or past `u64::MAX`.
    #[error("invalid seek by {delta} from offset {from}")]
    InvalidSeek { from: u64, delta: i64 },

    /// The header declares fewer payload bytes than the variant's fixed fields occupy.
    #[error("chunk {tag} declares {declared} payload bytes but its fixed fields need {required}")]
    PayloadTooShort {
        tag: Tag,
        declared: u32,
        required: u32,
    },

    /// The encoded payload does not fit the 32-bit length field.
    #[error("chunk {tag} payload of {len} bytes exceeds the u32 length field")]
    PayloadTooLarge { tag: Tag, len: u64 },

    /// A fixed-tag variant was asked to decode a record carrying another tag.
    #[error("expected chunk {expected}, found {found}")]
    TagMismatch { expected: Tag, found: Tag },
}

pub type Result<T> = std::result::Result<T, ChunkFileError>;
