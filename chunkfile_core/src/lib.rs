pub mod buffer;
pub mod bytefile;
pub mod chunk;
pub mod error;
pub mod format;
pub mod scanner;

pub use buffer::FixedByteBuffer;
pub use bytefile::ByteFile;
pub use chunk::{Chunk, TaggedChunk};
pub use error::{ChunkFileError, Result};
pub use format::{ChunkHeader, Tag, HEADER_SIZE, LENGTH_FIELD_SIZE, TAG_SIZE};
pub use scanner::{collect_headers, find_chunk, for_chunks_in_range};
