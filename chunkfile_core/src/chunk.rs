use tracing::{debug, trace};

use crate::bytefile::ByteFile;
use crate::error::ChunkFileError;
use crate::format::{ChunkHeader, Tag, LENGTH_FIELD_SIZE};

/// A record variant: a tag plus its own ordered payload fields.
///
/// Implementors only describe their fields. [`write`](Chunk::write) handles the header and the
/// length bookkeeping, so `payload_length` on disk always equals what `write_fields` emitted.
///
/// # Decoding contract
/// `read_fields` is called with the cursor on the first payload byte and must consume exactly
/// `header.payload_length` bytes. Fixed fields are read in declared order; a trailing
/// variable-length field takes whatever is left, see [`ChunkHeader::variable_len`]. The budget
/// is not enforced at runtime outside debug builds: a decoder that over- or under-reads is a bug
/// in that decoder. Over-reading past the end of the file still fails with `ShortRead`.
///
/// The error type is the variant's own, so decoders can surface domain failures (a malformed
/// document, say) alongside storage errors.
pub trait Chunk: Sized {
    type Error: From<ChunkFileError>;

    /// Tag written in front of this record.
    fn tag(&self) -> Tag;

    /// Append the payload fields at the cursor.
    fn write_fields(&self, file: &mut ByteFile) -> Result<(), Self::Error>;

    /// Decode the payload fields of the record described by `header`.
    fn read_fields(header: &ChunkHeader, file: &mut ByteFile) -> Result<Self, Self::Error>;

    /// Write the complete record at the cursor and return its header.
    ///
    /// # Write sequence
    /// ```text
    /// [tag][00 00 00 00]        ← placeholder, length offset remembered
    /// [fields ...]              ← write_fields
    /// seek back, patch length, seek to the end of the payload
    /// ```
    /// The cursor ends exactly after the record.
    fn write(&self, file: &mut ByteFile) -> Result<ChunkHeader, Self::Error> {
        let (mut header, length_offset) = ChunkHeader::write_placeholder(file, self.tag())?;
        self.write_fields(file)?;

        let payload_start = length_offset + LENGTH_FIELD_SIZE;
        let written = file.position()?.saturating_sub(payload_start);
        let actual_length = u32::try_from(written).map_err(|_| ChunkFileError::PayloadTooLarge {
            tag: header.tag,
            len: written,
        })?;
        ChunkHeader::patch_length(file, length_offset, actual_length)?;

        header.payload_length = actual_length;
        trace!(tag = %header.tag, offset = header.offset, len = actual_length, "wrote chunk");
        Ok(header)
    }

    /// Decode the record whose header was already read.
    ///
    /// The cursor is moved to the payload first, so this works whether or not anything was read
    /// since the header. On failure the cursor is put back on the first payload byte and the
    /// decoder's error is returned.
    fn read(header: &ChunkHeader, file: &mut ByteFile) -> Result<Self, Self::Error> {
        let payload_start = header.payload_offset();
        file.seek(payload_start)?;
        match Self::read_fields(header, file) {
            Ok(chunk) => {
                debug_assert_eq!(
                    file.position().ok(),
                    Some(header.end_offset()),
                    "decoder for chunk {} did not consume exactly its payload",
                    header.tag
                );
                Ok(chunk)
            }
            Err(e) => {
                if let Err(rewind) = file.seek(payload_start) {
                    debug!(tag = %header.tag, error = %rewind, "could not rewind after failed decode");
                }
                Err(e)
            }
        }
    }
}

/// A variant bound to a single tag.
pub trait TaggedChunk: Chunk {
    const TAG: Tag;

    /// Like [`Chunk::read`], but refuses records carrying another tag.
    fn read_expecting(header: &ChunkHeader, file: &mut ByteFile) -> Result<Self, Self::Error> {
        if header.tag != Self::TAG {
            return Err(ChunkFileError::TagMismatch {
                expected: Self::TAG,
                found: header.tag,
            }
            .into());
        }
        Self::read(header, file)
    }
}
