use std::fmt;
use std::str::FromStr;

use crate::buffer::FixedByteBuffer;
use crate::bytefile::ByteFile;
use crate::error::{ChunkFileError, Result};

/// Width of the type tag in bytes.
pub const TAG_SIZE: u64 = 4;

/// Width of the payload length field in bytes (u32, little-endian).
pub const LENGTH_FIELD_SIZE: u64 = 4;

/// Every record starts with this many header bytes:
///   tag[4] + payload_length:u32 LE
pub const HEADER_SIZE: u64 = TAG_SIZE + LENGTH_FIELD_SIZE;

// ── Tag ────────────────────────────────────────────────────────────────────

/// Four opaque bytes naming a record's variant. Conventionally ASCII, e.g. `b"BLOB"`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Tag([u8; 4]);

impl Tag {
    pub const fn new(bytes: [u8; 4]) -> Self {
        Self(bytes)
    }

    pub const fn from_bytes(bytes: &[u8; 4]) -> Self {
        Self(*bytes)
    }

    pub const fn as_bytes(&self) -> &[u8; 4] {
        &self.0
    }
}

impl From<[u8; 4]> for Tag {
    fn from(bytes: [u8; 4]) -> Self {
        Self(bytes)
    }
}

impl PartialEq<[u8; 4]> for Tag {
    fn eq(&self, other: &[u8; 4]) -> bool {
        &self.0 == other
    }
}

impl PartialEq<&[u8; 4]> for Tag {
    fn eq(&self, other: &&[u8; 4]) -> bool {
        &self.0 == *other
    }
}

/// Error returned when a string is not exactly four bytes long.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("tag must be exactly 4 bytes, got {0}")]
pub struct InvalidTagLength(pub usize);

impl FromStr for Tag {
    type Err = InvalidTagLength;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let bytes: [u8; 4] = s
            .as_bytes()
            .try_into()
            .map_err(|_| InvalidTagLength(s.len()))?;
        Ok(Self(bytes))
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &b in &self.0 {
            if b.is_ascii_graphic() || b == b' ' {
                write!(f, "{}", b as char)?;
            } else {
                write!(f, "\\x{b:02x}")?;
            }
        }
        Ok(())
    }
}

impl fmt::Debug for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Tag(\"{self}\")")
    }
}

// ── Header ─────────────────────────────────────────────────────────────────

/// Prologue of every record.
///
/// ```text
/// offset ──► [ tag: 4 bytes ][ payload_length: u32 LE ][ payload ... ]
/// ```
/// `offset` is not stored on disk; it is where the header was read from (or written to).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkHeader {
    pub tag: Tag,
    /// Bytes of fields following the header, header excluded.
    pub payload_length: u32,
    /// File position of the first tag byte.
    pub offset: u64,
}

impl ChunkHeader {
    /// Read a header at the file's cursor. The cursor ends on the first payload byte.
    pub fn read(file: &mut ByteFile) -> Result<Self> {
        let offset = file.position()?;
        let mut raw = [0u8; HEADER_SIZE as usize];
        file.read_bytes_into(&mut raw)?;

        let mut tag = [0u8; TAG_SIZE as usize];
        tag.copy_from_slice(&raw[..TAG_SIZE as usize]);
        let mut length = FixedByteBuffer::<{ LENGTH_FIELD_SIZE as usize }>::zeroed();
        length.as_bytes_mut().copy_from_slice(&raw[TAG_SIZE as usize..]);

        Ok(Self {
            tag: Tag(tag),
            payload_length: length.as_uint() as u32,
            offset,
        })
    }

    /// Write `tag` followed by a zero length at the cursor.
    ///
    /// Returns the header as written (length 0) and the offset of its length field, which
    /// [`patch_length`](Self::patch_length) fills in once the payload is known.
    pub fn write_placeholder(file: &mut ByteFile, tag: Tag) -> Result<(Self, u64)> {
        let offset = file.position()?;
        file.write_bytes(tag.as_bytes())?;
        let length_offset = file.position()?;
        file.write_buffer(&FixedByteBuffer::<{ LENGTH_FIELD_SIZE as usize }>::zeroed())?;
        Ok((
            Self {
                tag,
                payload_length: 0,
                offset,
            },
            length_offset,
        ))
    }

    /// Overwrite the length field at `length_offset` with `actual_length`, then leave the cursor
    /// just past the payload: `length_offset + LENGTH_FIELD_SIZE + actual_length`.
    pub fn patch_length(file: &mut ByteFile, length_offset: u64, actual_length: u32) -> Result<()> {
        file.seek(length_offset)?;
        file.write_buffer(&FixedByteBuffer::<{ LENGTH_FIELD_SIZE as usize }>::from_uint(
            actual_length as u64,
        ))?;
        file.seek(length_offset + LENGTH_FIELD_SIZE + actual_length as u64)?;
        Ok(())
    }

    /// Serialize to exactly `HEADER_SIZE` bytes.
    pub fn to_bytes(&self) -> [u8; HEADER_SIZE as usize] {
        let mut buf = [0u8; HEADER_SIZE as usize];
        buf[..4].copy_from_slice(self.tag.as_bytes());
        buf[4..8].copy_from_slice(&self.payload_length.to_le_bytes());
        buf
    }

    /// First payload byte.
    pub fn payload_offset(&self) -> u64 {
        self.offset + HEADER_SIZE
    }

    /// One past the last payload byte; where the next record starts.
    pub fn end_offset(&self) -> u64 {
        self.payload_offset() + self.payload_length as u64
    }

    /// Length of a trailing variable field that follows `fixed_width` bytes of fixed fields.
    pub fn variable_len(&self, fixed_width: u32) -> Result<usize> {
        self.payload_length
            .checked_sub(fixed_width)
            .map(|len| len as usize)
            .ok_or(ChunkFileError::PayloadTooShort {
                tag: self.tag,
                declared: self.payload_length,
                required: fixed_width,
            })
    }
}
