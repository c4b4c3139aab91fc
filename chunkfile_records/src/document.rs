use chunkfile_core::{ByteFile, Chunk, ChunkHeader, Tag, TaggedChunk};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::error::{RecordError, Result};

/// A structured document stored as UTF-8 JSON.
///
/// The chunk layer only sees the serialized bytes; turning typed values into documents and back
/// is serde's job, through [`from_value`](Self::from_value) and [`to_value`](Self::to_value).
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentChunk {
    pub document: Value,
}

impl DocumentChunk {
    pub fn new(document: Value) -> Self {
        Self { document }
    }

    /// Serialize any `T: Serialize` into a document.
    pub fn from_value<T: Serialize>(value: &T) -> Result<Self> {
        Ok(Self {
            document: serde_json::to_value(value)?,
        })
    }

    /// Deserialize the document into `T`.
    pub fn to_value<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(T::deserialize(&self.document)?)
    }
}

impl Chunk for DocumentChunk {
    type Error = RecordError;

    fn tag(&self) -> Tag {
        Self::TAG
    }

    fn write_fields(&self, file: &mut ByteFile) -> Result<()> {
        let encoded = serde_json::to_vec(&self.document)?;
        file.write_bytes(&encoded)?;
        Ok(())
    }

    fn read_fields(header: &ChunkHeader, file: &mut ByteFile) -> Result<Self> {
        let encoded = file.read_bytes(header.payload_length as usize)?;
        Ok(Self {
            document: serde_json::from_slice(&encoded)?,
        })
    }
}

impl TaggedChunk for DocumentChunk {
    const TAG: Tag = Tag::from_bytes(b"JSON");
}
