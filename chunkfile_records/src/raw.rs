use chunkfile_core::{ByteFile, Chunk, ChunkFileError, ChunkHeader, Tag};

/// Any record kept as its tag and undecoded payload.
///
/// Used for tags the application does not know, and for copying records verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawChunk {
    pub tag: Tag,
    pub payload: Vec<u8>,
}

impl RawChunk {
    pub fn new(tag: Tag, payload: Vec<u8>) -> Self {
        Self { tag, payload }
    }
}

impl Chunk for RawChunk {
    type Error = ChunkFileError;

    fn tag(&self) -> Tag {
        self.tag
    }

    fn write_fields(&self, file: &mut ByteFile) -> Result<(), Self::Error> {
        file.write_bytes(&self.payload)
    }

    fn read_fields(header: &ChunkHeader, file: &mut ByteFile) -> Result<Self, Self::Error> {
        Ok(Self {
            tag: header.tag,
            payload: file.read_bytes(header.payload_length as usize)?,
        })
    }
}
