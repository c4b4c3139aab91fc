use chunkfile_core::{ByteFile, Chunk, ChunkFileError, ChunkHeader, FixedByteBuffer, Tag, TaggedChunk};

/// Width of the fixed `id` field that precedes the blob bytes.
pub const BLOB_ID_SIZE: u32 = 4;

/// Opaque bytes labelled with a caller-chosen 32-bit id.
///
/// ```text
/// [BLOB][len][id: u32 LE][data: len - 4 bytes]
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobChunk {
    pub id: FixedByteBuffer<{ BLOB_ID_SIZE as usize }>,
    pub data: Vec<u8>,
}

impl BlobChunk {
    pub fn new(id: u32, data: Vec<u8>) -> Self {
        Self {
            id: FixedByteBuffer::from_uint(id as u64),
            data,
        }
    }

    pub fn id(&self) -> u32 {
        self.id.as_uint() as u32
    }
}

impl Chunk for BlobChunk {
    type Error = ChunkFileError;

    fn tag(&self) -> Tag {
        Self::TAG
    }

    fn write_fields(&self, file: &mut ByteFile) -> Result<(), Self::Error> {
        file.write_buffer(&self.id)?;
        file.write_bytes(&self.data)
    }

    fn read_fields(header: &ChunkHeader, file: &mut ByteFile) -> Result<Self, Self::Error> {
        let data_len = header.variable_len(BLOB_ID_SIZE)?;
        let id = file.read_buffer()?;
        let data = file.read_bytes(data_len)?;
        Ok(Self { id, data })
    }
}

impl TaggedChunk for BlobChunk {
    const TAG: Tag = Tag::from_bytes(b"BLOB");
}
