use crate::error::{ErrorKind, Result};
use exn::{OptionExt, ResultExt};
use pickr_sequence::Filter;
use std::fs::{self, File};
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};
use tracing::instrument;
use zip::ZipArchive;
use zip::result::ZipError;

fn open(path: &Path) -> Result<ZipArchive<BufReader<File>>> {
    let file = File::open(path).or_raise(|| ErrorKind::Unreadable(path.to_path_buf()))?;
    ZipArchive::new(BufReader::new(file)).or_raise(|| ErrorKind::InvalidData(path.to_path_buf()))
}

/// Whether any directory above the member starts with a dot.
fn in_hidden_directory(name: &str) -> bool {
    let mut parts: Vec<&str> = name.split('/').collect();
    parts.pop();
    parts.iter().any(|part| part.starts_with('.'))
}

fn basename(name: &str) -> &str {
    name.rsplit('/').next().unwrap_or(name)
}

/// Names of the files inside a ZIP archive that pass the filter.
///
/// Directories and anything under a hidden directory are skipped. The filter
/// is applied to each member's base name, not its full path inside the
/// archive.
#[instrument(skip_all, fields(archive = %archive.display()))]
pub fn list_entries(archive: &Path, filter: &Filter) -> Result<Vec<String>> {
    let mut zip = open(archive)?;
    let mut names = Vec::new();
    for i in 0..zip.len() {
        let member = zip.by_index_raw(i).or_raise(|| ErrorKind::InvalidData(archive.to_path_buf()))?;
        if member.is_dir() {
            continue;
        }
        let name = member.name();
        if in_hidden_directory(name) || !filter.accepts(basename(name)) {
            continue;
        }
        names.push(name.to_string());
    }
    tracing::debug!(entries = names.len(), "listed archive entries");
    Ok(names)
}

/// Extract a single member into `destination`, keeping its relative path.
///
/// Returns the path of the extracted file. Members whose names would escape
/// the destination directory are refused.
#[instrument(skip_all, fields(archive = %archive.display(), entry = name))]
pub fn extract_entry(archive: &Path, name: &str, destination: &Path) -> Result<PathBuf> {
    let mut zip = open(archive)?;
    let mut member = match zip.by_name(name) {
        Ok(member) => member,
        Err(ZipError::FileNotFound) => exn::bail!(ErrorKind::MissingEntry(name.to_string())),
        Err(err) => Err(err).or_raise(|| ErrorKind::InvalidData(archive.to_path_buf()))?,
    };
    let relative = member.enclosed_name().ok_or_raise(|| ErrorKind::UnsafeEntry(name.to_string()))?;
    let target = destination.join(relative);
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent).or_raise(|| ErrorKind::Extract(parent.to_path_buf()))?;
    }
    let mut output = File::create(&target).or_raise(|| ErrorKind::Extract(target.clone()))?;
    io::copy(&mut member, &mut output).or_raise(|| ErrorKind::Extract(target.clone()))?;
    tracing::debug!(path = %target.display(), "extracted archive entry");
    Ok(target)
}
