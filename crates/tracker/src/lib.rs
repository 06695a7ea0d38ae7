//! Persistent record of consumed files.
//!
//! The state is a JSON object mapping each folder to the names of the files
//! already read inside it:
//!
//! ```json
//! {
//!   "/comics/Batman": ["Batman #1.cbz", "Batman #2.cbz"]
//! }
//! ```
//!
//! Nothing is read from disk until the first query, and every change is
//! written back immediately through a temporary file that is renamed into
//! place. There is no locking: two processes sharing one state file race, and
//! the last writer wins.

pub mod error;

use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use pickr_sequence::ReadLog;
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::instrument;

/// Folder path to the names of the files read inside it, in the order they
/// were read.
pub type ReadState = BTreeMap<String, Vec<String>>;

fn split(path: &Path) -> Option<(String, String)> {
    let folder = path.parent()?.to_string_lossy().into_owned();
    let name = path.file_name()?.to_string_lossy().into_owned();
    Some((folder, name))
}

fn load(path: &Path) -> ReadState {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return ReadState::new(),
        Err(err) => {
            tracing::warn!(path = %path.display(), error = %err, "could not read tracker state, starting empty");
            return ReadState::new();
        },
    };
    serde_json::from_slice(&bytes).unwrap_or_else(|err| {
        tracing::warn!(path = %path.display(), error = %err, "tracker state is corrupt, starting empty");
        ReadState::new()
    })
}

/// Tracks which files have been read, persisted to a single JSON file.
#[derive(Debug)]
pub struct Tracker {
    path: PathBuf,
    state: Option<ReadState>,
}
impl Tracker {
    /// Use the state file at `path`. It does not need to exist yet.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), state: None }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn state(&mut self) -> &mut ReadState {
        let path = &self.path;
        self.state.get_or_insert_with(|| load(path))
    }

    fn save(&mut self) -> Result<()> {
        let path = self.path.clone();
        let state = self.state();
        let json = serde_json::to_vec_pretty(state).or_raise(|| ErrorKind::Encode)?;
        let dir = match path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir).or_raise(|| ErrorKind::Save(path.clone()))?;
        let mut file = NamedTempFile::new_in(dir).or_raise(|| ErrorKind::Save(path.clone()))?;
        file.write_all(&json).or_raise(|| ErrorKind::Save(path.clone()))?;
        file.persist(&path).or_raise(|| ErrorKind::Save(path.clone()))?;
        Ok(())
    }

    /// Record a file as read. Marking an already-read file changes nothing
    /// and does not touch the disk.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn mark_as_read(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let Some((folder, name)) = split(path.as_ref()) else {
            return Ok(());
        };
        let names = self.state().entry(folder.clone()).or_default();
        if names.contains(&name) {
            return Ok(());
        }
        names.push(name.clone());
        if let Err(err) = self.save() {
            // Only what reached the disk counts as read.
            let state = self.state();
            if let Some(names) = state.get_mut(&folder) {
                names.retain(|read| read != &name);
                if names.is_empty() {
                    state.remove(&folder);
                }
            }
            return Err(err);
        }
        tracing::debug!("marked as read");
        Ok(())
    }

    pub fn is_read(&mut self, path: impl AsRef<Path>) -> bool {
        let Some((folder, name)) = split(path.as_ref()) else {
            return false;
        };
        self.state().get(&folder).is_some_and(|names| names.contains(&name))
    }

    /// Names of the files read in `folder`, oldest first.
    pub fn read_files(&mut self, folder: impl AsRef<Path>) -> Vec<String> {
        let folder = folder.as_ref().to_string_lossy();
        self.state().get(&*folder).cloned().unwrap_or_default()
    }

    /// Forget everything read in `folder`.
    #[instrument(skip_all, fields(folder = %folder.as_ref().display()))]
    pub fn reset_folder(&mut self, folder: impl AsRef<Path>) -> Result<()> {
        let folder = folder.as_ref().to_string_lossy().into_owned();
        let removed = self.state().remove(&folder);
        if let Err(err) = self.save() {
            if let Some(names) = removed {
                self.state().insert(folder, names);
            }
            return Err(err);
        }
        tracing::info!("read history cleared");
        Ok(())
    }
}

impl ReadLog for Tracker {
    fn is_read(&mut self, path: &Path) -> bool {
        Tracker::is_read(self, path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};
    use tempfile::TempDir;

    struct Scratch {
        dir: TempDir,
    }
    impl Scratch {
        fn state_file(&self) -> PathBuf {
            self.dir.path().join("state").join("read_files.json")
        }
    }

    #[fixture]
    fn scratch() -> Scratch {
        Scratch { dir: TempDir::new().unwrap() }
    }

    #[rstest]
    fn test_open_is_lazy(scratch: Scratch) {
        let tracker = Tracker::open(scratch.state_file());
        assert!(tracker.state.is_none());
        assert!(!scratch.state_file().exists());
    }

    #[rstest]
    fn test_mark_and_query(scratch: Scratch) {
        let mut tracker = Tracker::open(scratch.state_file());
        assert!(!tracker.is_read("/comics/Batman/Batman #1.cbz"));
        tracker.mark_as_read("/comics/Batman/Batman #1.cbz").unwrap();
        assert!(tracker.is_read("/comics/Batman/Batman #1.cbz"));
        assert!(!tracker.is_read("/comics/Batman/Batman #2.cbz"));
        assert!(!tracker.is_read("/comics/Superman/Batman #1.cbz"));
    }

    #[rstest]
    fn test_mark_is_idempotent(scratch: Scratch) {
        let mut tracker = Tracker::open(scratch.state_file());
        tracker.mark_as_read("/comics/Batman #1.cbz").unwrap();
        let written = fs::read(scratch.state_file()).unwrap();
        // Remove the file: a second mark must not write it again.
        fs::remove_file(scratch.state_file()).unwrap();
        tracker.mark_as_read("/comics/Batman #1.cbz").unwrap();
        assert!(!scratch.state_file().exists());
        assert_eq!(tracker.read_files("/comics"), ["Batman #1.cbz"]);
        assert!(!written.is_empty());
    }

    #[rstest]
    fn test_state_survives_reopen(scratch: Scratch) {
        let mut tracker = Tracker::open(scratch.state_file());
        tracker.mark_as_read("/comics/Batman #2.cbz").unwrap();
        tracker.mark_as_read("/comics/Batman #1.cbz").unwrap();
        drop(tracker);

        let mut tracker = Tracker::open(scratch.state_file());
        assert!(tracker.is_read("/comics/Batman #1.cbz"));
        assert_eq!(tracker.read_files("/comics"), ["Batman #2.cbz", "Batman #1.cbz"]);
    }

    #[rstest]
    fn test_reset_folder(scratch: Scratch) {
        let mut tracker = Tracker::open(scratch.state_file());
        tracker.mark_as_read("/comics/Batman #1.cbz").unwrap();
        tracker.mark_as_read("/books/Dune 1.epub").unwrap();
        tracker.reset_folder("/comics").unwrap();
        assert!(!tracker.is_read("/comics/Batman #1.cbz"));
        assert!(tracker.is_read("/books/Dune 1.epub"));

        let mut reopened = Tracker::open(scratch.state_file());
        assert!(reopened.read_files("/comics").is_empty());
    }

    #[rstest]
    fn test_failed_save_is_not_read(scratch: Scratch) {
        // A regular file where the state directory should be.
        fs::write(scratch.dir.path().join("state"), "").unwrap();
        let mut tracker = Tracker::open(scratch.state_file());
        let err = tracker.mark_as_read("/comics/Batman #1.cbz").unwrap_err();
        assert!(matches!(&*err, ErrorKind::Save(_)));
        assert!(!tracker.is_read("/comics/Batman #1.cbz"));
        assert!(tracker.read_files("/comics").is_empty());
        assert!(tracker.mark_as_read("/comics/Batman #1.cbz").is_err());
    }

    #[rstest]
    fn test_failed_reset_keeps_history(scratch: Scratch) {
        let mut tracker = Tracker::open(scratch.state_file());
        tracker.mark_as_read("/comics/Batman #1.cbz").unwrap();
        let state_dir = scratch.dir.path().join("state");
        fs::remove_dir_all(&state_dir).unwrap();
        fs::write(&state_dir, "").unwrap();
        assert!(tracker.reset_folder("/comics").is_err());
        assert!(tracker.is_read("/comics/Batman #1.cbz"));
    }

    #[rstest]
    #[case(b"not json at all".as_slice())]
    #[case(b"[1, 2, 3]".as_slice())]
    #[case(b"".as_slice())]
    fn test_corrupt_state_is_empty(scratch: Scratch, #[case] contents: &[u8]) {
        fs::create_dir_all(scratch.state_file().parent().unwrap()).unwrap();
        fs::write(scratch.state_file(), contents).unwrap();
        let mut tracker = Tracker::open(scratch.state_file());
        assert!(!tracker.is_read("/comics/Batman #1.cbz"));
        tracker.mark_as_read("/comics/Batman #1.cbz").unwrap();
        assert!(Tracker::open(scratch.state_file()).is_read("/comics/Batman #1.cbz"));
    }

    #[rstest]
    fn test_reads_list_format(scratch: Scratch) {
        fs::create_dir_all(scratch.state_file().parent().unwrap()).unwrap();
        fs::write(scratch.state_file(), r#"{"/comics": ["Batman #1.cbz", "Batman #2.cbz"]}"#).unwrap();
        let mut tracker = Tracker::open(scratch.state_file());
        assert!(tracker.is_read("/comics/Batman #2.cbz"));
        assert!(ReadLog::is_read(&mut tracker, Path::new("/comics/Batman #1.cbz")));
    }
}
