use tracing::{debug, trace, warn};

use crate::bytefile::ByteFile;
use crate::error::{ChunkFileError, Result};
use crate::format::{ChunkHeader, Tag};

/// Walk the records whose headers start in `[start, min(end, size))`, calling `visitor` for each.
///
/// # Scan rules
/// - An `end` past the end of the file is clamped; it is never an error.
/// - `start >= end` or `start >= size` visits nothing and succeeds.
/// - The visitor receives the header with the cursor on the first payload byte. It may decode
///   the payload (e.g. via [`Chunk::read`](crate::Chunk::read)) or ignore it; either way the
///   scanner moves to `header.end_offset()` before the next iteration.
/// - A record whose declared payload runs past the end of the file stops the scan without being
///   visited. The cursor is left on that record's header.
/// - A record that starts before `end` but runs past it is still visited, as long as it fits in
///   the file; the scan stops after it. `end` bounds where headers may start, while the file
///   size bounds where payloads may end.
/// - A header cut short by the end of the file is a [`ChunkFileError::ShortRead`].
/// - The first visitor error stops the scan and is returned as is.
///
/// Returns the number of records visited.
pub fn for_chunks_in_range<F, E>(
    file: &mut ByteFile,
    start: u64,
    end: u64,
    mut visitor: F,
) -> std::result::Result<usize, E>
where
    F: FnMut(&ChunkHeader, &mut ByteFile) -> std::result::Result<(), E>,
    E: From<ChunkFileError>,
{
    file.seek(start)?;
    let mut position = start;
    let mut visited = 0usize;

    loop {
        let size = file.size()?;
        if position >= end.min(size) {
            break;
        }

        let header = ChunkHeader::read(file)?;
        let next = header.end_offset();
        if next > size {
            warn!(
                tag = %header.tag,
                offset = header.offset,
                declared = header.payload_length,
                size,
                "chunk payload runs past end of file; stopping scan"
            );
            file.seek(header.offset)?;
            break;
        }

        trace!(tag = %header.tag, offset = header.offset, len = header.payload_length, "visiting chunk");
        visitor(&header, file)?;
        visited += 1;

        file.seek(next)?;
        position = next;
    }

    debug!(start, end, visited, "chunk scan finished");
    Ok(visited)
}

/// Headers of every record in `[start, end)`, in file order.
pub fn collect_headers(file: &mut ByteFile, start: u64, end: u64) -> Result<Vec<ChunkHeader>> {
    let mut headers = Vec::new();
    for_chunks_in_range(file, start, end, |header, _| {
        headers.push(*header);
        Ok::<_, ChunkFileError>(())
    })?;
    Ok(headers)
}

/// First record tagged `tag`, scanning the whole file.
pub fn find_chunk(file: &mut ByteFile, tag: Tag) -> Result<Option<ChunkHeader>> {
    let size = file.size()?;
    let mut found = None;
    for_chunks_in_range(file, 0, size, |header, _| {
        if found.is_none() && header.tag == tag {
            found = Some(*header);
        }
        Ok::<_, ChunkFileError>(())
    })?;
    Ok(found)
}

impl ByteFile {
    /// See [`for_chunks_in_range`](crate::scanner::for_chunks_in_range).
    pub fn for_chunks_in_range<F, E>(
        &mut self,
        start: u64,
        end: u64,
        visitor: F,
    ) -> std::result::Result<usize, E>
    where
        F: FnMut(&ChunkHeader, &mut ByteFile) -> std::result::Result<(), E>,
        E: From<ChunkFileError>,
    {
        for_chunks_in_range(self, start, end, visitor)
    }
}
