use chunkfile_core::ChunkFileError;

/// Failures decoding or encoding one of the bundled record variants.
#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    #[error(transparent)]
    Chunk(#[from] ChunkFileError),

    /// A `JSON` record whose payload is not a valid document, or a value serde cannot map.
    #[error("document error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, RecordError>;
