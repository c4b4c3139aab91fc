use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;
use xxhash_rust::xxh3::xxh3_64;

use chunkfile_core::{collect_headers, ByteFile, Chunk, ChunkHeader, Tag};
use chunkfile_records::{decode_record, BlobChunk, DocumentChunk, Record, RecordError};

// ── CLI definition ─────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "chunkfile",
    about = "Inspect, append to, and extract records from tagged chunk files",
    version
)]
struct Cli {
    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the records in a byte range
    Inspect {
        /// Chunk file to inspect
        file: PathBuf,
        /// First byte of the range (must be a record boundary)
        #[arg(long, default_value_t = 0)]
        start: u64,
        /// End of the range; clamped to the file size
        #[arg(long)]
        end: Option<u64>,
        /// Print an xxh3-64 digest of each payload
        #[arg(long)]
        digest: bool,
    },
    /// Append a BLOB record holding the bytes of a file
    AppendBlob {
        /// Chunk file to append to (created if missing)
        file: PathBuf,
        /// Source of the blob bytes
        input: PathBuf,
        /// 32-bit id stored in front of the data
        #[arg(long, default_value_t = 0)]
        id: u32,
    },
    /// Append a JSON record holding a parsed document
    AppendDoc {
        /// Chunk file to append to (created if missing)
        file: PathBuf,
        /// JSON document to store
        input: PathBuf,
    },
    /// Write out the payload of one record
    Extract {
        /// Chunk file
        file: PathBuf,
        /// Zero-based record index, in file order
        #[arg(short, long)]
        index: usize,
        /// Write raw payload bytes to a file instead of printing a hex dump
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Decode every record and report counts per tag
    Verify {
        /// Chunk file
        file: PathBuf,
    },
}

// ── Helpers ────────────────────────────────────────────────────────────────

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn open_file(path: &Path) -> anyhow::Result<ByteFile> {
    ByteFile::open_path(path).with_context(|| format!("opening chunk file {:?}", path))
}

fn human_bytes(n: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    let mut v = n as f64;
    let mut unit = 0;
    while v >= 1024.0 && unit < UNITS.len() - 1 {
        v /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} B", n)
    } else {
        format!("{:.2} {}", v, UNITS[unit])
    }
}

fn print_hex_dump(bytes: &[u8]) {
    for (i, row) in bytes.chunks(16).enumerate() {
        print!("  {:04x}  ", i * 16);
        for b in row {
            print!("{:02x} ", b);
        }
        for _ in row.len()..16 {
            print!("   ");
        }
        print!("  |");
        for b in row {
            if b.is_ascii_graphic() || *b == b' ' {
                print!("{}", *b as char);
            } else {
                print!(".");
            }
        }
        println!("|");
    }
}

/// Append `record` after the last byte of the file.
fn append_record(path: &Path, record: &Record) -> anyhow::Result<ChunkHeader> {
    let mut file = open_file(path)?;
    let end = file.size()?;
    file.seek(end)?;
    let header = record.write(&mut file)?;
    file.close()?;
    Ok(header)
}

// ── Subcommand implementations ─────────────────────────────────────────────

fn run_inspect(path: PathBuf, start: u64, end: Option<u64>, digest: bool) -> anyhow::Result<()> {
    let mut file = open_file(&path)?;
    let size = file.size()?;
    let end = end.unwrap_or(size);

    println!("=== Chunk file: {:?} ===", path);
    println!();
    println!("  file size      : {}", human_bytes(size));
    println!("  range          : {}..{}", start, end.min(size));
    println!();
    println!(
        "  {:>6}  {:>12}  {:>6}  {:>12}  {:>16}",
        "index", "offset", "tag", "payload", if digest { "xxh3" } else { "" }
    );
    println!("  {}", "-".repeat(60));

    let mut index = 0usize;
    let mut payload_total = 0u64;
    file.for_chunks_in_range(start, end, |header, f| {
        let digest_col = if digest {
            let payload = f.read_bytes(header.payload_length as usize)?;
            format!("{:016x}", xxh3_64(&payload))
        } else {
            String::new()
        };
        println!(
            "  {:>6}  {:>12}  {:>6}  {:>12}  {:>16}",
            index,
            header.offset,
            header.tag.to_string(),
            human_bytes(header.payload_length as u64),
            digest_col
        );
        index += 1;
        payload_total += header.payload_length as u64;
        Ok::<_, anyhow::Error>(())
    })?;

    println!();
    println!("  records        : {}", index);
    println!("  payload bytes  : {}", human_bytes(payload_total));
    Ok(())
}

fn run_append_blob(path: PathBuf, input: PathBuf, id: u32) -> anyhow::Result<()> {
    let data = std::fs::read(&input).with_context(|| format!("reading input file {:?}", input))?;
    let header = append_record(&path, &Record::Blob(BlobChunk::new(id, data)))?;
    eprintln!(
        "  appended {} record at offset {} ({})",
        header.tag,
        header.offset,
        human_bytes(header.payload_length as u64)
    );
    Ok(())
}

fn run_append_doc(path: PathBuf, input: PathBuf) -> anyhow::Result<()> {
    let text = std::fs::read(&input).with_context(|| format!("reading input file {:?}", input))?;
    let document: serde_json::Value = serde_json::from_slice(&text)
        .with_context(|| format!("parsing JSON document {:?}", input))?;
    let header = append_record(&path, &Record::Document(DocumentChunk::new(document)))?;
    eprintln!(
        "  appended {} record at offset {} ({})",
        header.tag,
        header.offset,
        human_bytes(header.payload_length as u64)
    );
    Ok(())
}

fn run_extract(path: PathBuf, index: usize, output: Option<PathBuf>) -> anyhow::Result<()> {
    let mut file = open_file(&path)?;
    let size = file.size()?;
    let headers = collect_headers(&mut file, 0, size)?;
    let header = headers
        .get(index)
        .ok_or_else(|| anyhow::anyhow!("record index {} out of range (total {})", index, headers.len()))?;

    debug!(tag = %header.tag, offset = header.offset, "extracting record");
    let payload = chunkfile_records::RawChunk::read(header, &mut file)?.payload;

    match output {
        Some(out) => {
            std::fs::write(&out, &payload)?;
            eprintln!("  written {} to {:?}", human_bytes(payload.len() as u64), out);
        }
        None => {
            let preview = &payload[..payload.len().min(256)];
            println!(
                "--- record {} [{}] at offset {} ({} bytes, first {} shown) ---",
                index,
                header.tag,
                header.offset,
                payload.len(),
                preview.len()
            );
            print_hex_dump(preview);
            if payload.len() > 256 {
                println!("  ... ({} bytes remaining not shown)", payload.len() - 256);
            }
        }
    }
    Ok(())
}

fn run_verify(path: PathBuf) -> anyhow::Result<()> {
    let mut file = open_file(&path)?;
    let size = file.size()?;
    let t0 = Instant::now();

    let mut counts: BTreeMap<Tag, (usize, u64)> = BTreeMap::new();
    let mut known = 0usize;
    let visited = file
        .for_chunks_in_range(0, size, |header, f| {
            let record = decode_record(header, f)?;
            if !matches!(record, Record::Raw(_)) {
                known += 1;
            }
            let entry = counts.entry(header.tag).or_default();
            entry.0 += 1;
            entry.1 += header.payload_length as u64;
            Ok::<_, RecordError>(())
        })
        .with_context(|| format!("verifying {:?}", path))?;

    let end = file.position()?;
    let elapsed = t0.elapsed();

    println!("  {:>6}  {:>8}  {:>12}", "tag", "records", "payload");
    for (tag, (n, bytes)) in &counts {
        println!("  {:>6}  {:>8}  {:>12}", tag.to_string(), n, human_bytes(*bytes));
    }
    println!();
    println!("  records      : {} ({} with a known decoder)", visited, known);
    println!("  scanned      : {} of {}", human_bytes(end), human_bytes(size));
    println!("  elapsed      : {:.3}s", elapsed.as_secs_f64());

    if end < size {
        anyhow::bail!(
            "trailing record at offset {} runs past the end of the file ({} bytes unscanned)",
            end,
            size - end
        );
    }
    Ok(())
}

// ── Entry point ────────────────────────────────────────────────────────────

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match cli.command {
        Commands::Inspect {
            file,
            start,
            end,
            digest,
        } => run_inspect(file, start, end, digest),
        Commands::AppendBlob { file, input, id } => run_append_blob(file, input, id),
        Commands::AppendDoc { file, input } => run_append_doc(file, input),
        Commands::Extract {
            file,
            index,
            output,
        } => run_extract(file, index, output),
        Commands::Verify { file } => run_verify(file),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chunkfile_records::RawChunk;

    fn scratch() -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cli.chunks");
        (dir, path)
    }

    fn blob(id: u32, len: usize) -> Record {
        Record::Blob(BlobChunk::new(id, (0..len).map(|i| i as u8).collect()))
    }

    #[test]
    fn append_lands_after_existing_records() {
        let (_dir, path) = scratch();
        let first = append_record(&path, &blob(1, 10)).unwrap();
        let second = append_record(&path, &blob(2, 3)).unwrap();

        assert_eq!(first.offset, 0);
        assert_eq!(second.offset, first.end_offset());
        assert_eq!(std::fs::metadata(&path).unwrap().len(), second.end_offset());
    }

    #[test]
    fn verify_accepts_well_formed_file() {
        let (_dir, path) = scratch();
        append_record(&path, &blob(1, 40)).unwrap();
        let doc = DocumentChunk::new(serde_json::json!({ "name": "kick", "gain": -3 }));
        append_record(&path, &Record::Document(doc)).unwrap();
        append_record(&path, &Record::Raw(RawChunk::new(Tag::from_bytes(b"Xtra"), vec![5; 7])))
            .unwrap();

        run_verify(path).unwrap();
    }

    #[test]
    fn verify_rejects_dangling_trailing_record() {
        let (_dir, path) = scratch();
        append_record(&path, &blob(1, 16)).unwrap();

        let mut file = ByteFile::open_path(&path).unwrap();
        let end = file.size().unwrap();
        file.seek(end).unwrap();
        file.write_bytes(b"Chu2").unwrap();
        file.write_bytes(&100u32.to_le_bytes()).unwrap();
        file.write_bytes(&[0; 10]).unwrap();
        file.close().unwrap();

        let err = run_verify(path).unwrap_err();
        assert!(err.to_string().contains("trailing record"), "{err}");
    }

    #[test]
    fn extract_rejects_index_past_last_record() {
        let (_dir, path) = scratch();
        append_record(&path, &blob(1, 4)).unwrap();
        append_record(&path, &blob(2, 4)).unwrap();

        let err = run_extract(path, 2, None).unwrap_err();
        assert!(err.to_string().contains("out of range (total 2)"), "{err}");
    }

    #[test]
    fn extract_writes_exact_payload() {
        let (dir, path) = scratch();
        append_record(&path, &blob(1, 4)).unwrap();
        append_record(&path, &blob(0x0403_0201, 5)).unwrap();

        let out = dir.path().join("payload.bin");
        run_extract(path, 1, Some(out.clone())).unwrap();
        assert_eq!(
            std::fs::read(&out).unwrap(),
            vec![0x01, 0x02, 0x03, 0x04, 0, 1, 2, 3, 4]
        );
    }
}
