mod blob;
mod document;
mod error;
mod raw;

pub use blob::{BlobChunk, BLOB_ID_SIZE};
pub use document::DocumentChunk;
pub use error::{RecordError, Result};
pub use raw::RawChunk;

use chunkfile_core::{ByteFile, Chunk, ChunkHeader, Tag, TaggedChunk};
use tracing::trace;

/// Every record variant this crate knows, plus a raw fallback for the rest.
#[derive(Debug, Clone, PartialEq)]
pub enum Record {
    Blob(BlobChunk),
    Document(DocumentChunk),
    Raw(RawChunk),
}

impl Record {
    pub fn tag(&self) -> Tag {
        match self {
            Record::Blob(c) => c.tag(),
            Record::Document(c) => c.tag(),
            Record::Raw(c) => c.tag(),
        }
    }

    /// Write the wrapped variant at the cursor.
    pub fn write(&self, file: &mut ByteFile) -> Result<ChunkHeader> {
        match self {
            Record::Blob(c) => Ok(c.write(file)?),
            Record::Document(c) => c.write(file),
            Record::Raw(c) => Ok(c.write(file)?),
        }
    }
}

/// Resolve a record from its on-disk tag and decode it.
///
/// This is the tag → variant table for the bundled variants; tags it does not recognise come
/// back as [`Record::Raw`] so callers can still copy or inspect them.
pub fn decode_record(header: &ChunkHeader, file: &mut ByteFile) -> Result<Record> {
    trace!(tag = %header.tag, offset = header.offset, "decoding record");
    match header.tag {
        tag if tag == BlobChunk::TAG => Ok(Record::Blob(BlobChunk::read(header, file)?)),
        tag if tag == DocumentChunk::TAG => Ok(Record::Document(DocumentChunk::read(header, file)?)),
        _ => Ok(Record::Raw(RawChunk::read(header, file)?)),
    }
}
