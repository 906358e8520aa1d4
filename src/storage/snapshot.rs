//! Snapshot codec: gzip compression and the snapshot naming scheme
//!
//! Wire format of the store: `backup_<YYYYMMDD_HHMMSS>.db.gz`, gzip-compressed
//! raw bytes of the source database file. Existing backups in the bucket use
//! exactly this shape, so both sides of the codec must preserve it.

use chrono::{DateTime, Utc};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::fs::File;
use std::io;
use std::path::Path;

use crate::core::error::BackupError;

/// Suffix shared by every snapshot object
pub const SNAPSHOT_SUFFIX: &str = ".db.gz";

/// Builds the snapshot object key for a capture timestamp.
///
/// The timestamp portion is zero-padded and fixed-width, which keeps the
/// names lexically sortable for humans; authoritative ordering still comes
/// from the store's object metadata. Two captures within the same second
/// produce the same name — a known limitation of the second-resolution
/// scheme, acceptable at a one-hour backup interval.
pub fn snapshot_name(now: DateTime<Utc>) -> String {
    format!("backup_{}{}", now.format("%Y%m%d_%H%M%S"), SNAPSHOT_SUFFIX)
}

/// Compresses the source file into a gzip blob at `blob_path`.
///
/// Streams the file through the encoder rather than reading it fully into
/// memory. The source is read without any lock; if the live bot is writing
/// at the same moment the capture may be torn (SQLite tolerates concurrent
/// readers, so a quiescent database always snapshots cleanly).
///
/// # Errors
///
/// * `BackupError::SourceMissing` - source file does not exist at call time
/// * `BackupError::Io` - any read/write failure mid-stream
pub fn compress(source_path: &Path, blob_path: &Path) -> Result<(), BackupError> {
    if !source_path.exists() {
        return Err(BackupError::SourceMissing(source_path.to_path_buf()));
    }

    let mut input = File::open(source_path)?;
    let output = File::create(blob_path)?;
    let mut encoder = GzEncoder::new(output, Compression::default());
    io::copy(&mut input, &mut encoder)?;
    encoder.finish()?;

    Ok(())
}

/// Decompresses a snapshot blob back into a plain file.
///
/// Overwrites `destination_path` unconditionally.
pub fn decompress(blob_path: &Path, destination_path: &Path) -> Result<(), BackupError> {
    let input = File::open(blob_path)?;
    let mut decoder = GzDecoder::new(input);
    let mut output = File::create(destination_path)?;
    io::copy(&mut decoder, &mut output)?;

    Ok(())
}
