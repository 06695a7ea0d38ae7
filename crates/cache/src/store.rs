//! Gzip-compressed JSON files, written atomically.

use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use flate2::{Compression as GzCompression, read::GzDecoder, write::GzEncoder};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs::File;
use std::io::{BufReader, BufWriter, ErrorKind as IoErrorKind, Write};
use std::path::Path;
use tempfile::NamedTempFile;

// Cache files are rewritten on every walk; favour speed over size.
const GZIP_LEVEL: GzCompression = GzCompression::fast();

/// Decode a cache file. Missing files are a silent miss; anything unreadable
/// is logged and also treated as a miss.
pub(crate) fn read<T: DeserializeOwned>(path: &Path) -> Option<T> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(err) if err.kind() == IoErrorKind::NotFound => return None,
        Err(err) => {
            tracing::warn!(path = %path.display(), error = %err, "could not open cache file");
            return None;
        },
    };
    match serde_json::from_reader(GzDecoder::new(BufReader::new(file))) {
        Ok(value) => Some(value),
        Err(err) => {
            tracing::warn!(path = %path.display(), error = %err, "cache file is corrupt, ignoring it");
            None
        },
    }
}

/// Encode `value` next to `path`, then move it into place.
pub(crate) fn write<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let dir = path.parent().unwrap_or(Path::new("."));
    let temp = NamedTempFile::new_in(dir).or_raise(|| ErrorKind::Write(path.to_path_buf()))?;
    let mut encoder = GzEncoder::new(BufWriter::new(temp), GZIP_LEVEL);
    serde_json::to_writer(&mut encoder, value).or_raise(|| ErrorKind::Encode)?;
    let mut writer = encoder.finish().or_raise(|| ErrorKind::Write(path.to_path_buf()))?;
    writer.flush().or_raise(|| ErrorKind::Write(path.to_path_buf()))?;
    let temp = writer.into_inner().map_err(|err| err.into_error()).or_raise(|| ErrorKind::Write(path.to_path_buf()))?;
    temp.persist(path).or_raise(|| ErrorKind::Write(path.to_path_buf()))?;
    Ok(())
}
