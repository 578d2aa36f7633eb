use std::fs;
use std::path::{Path, PathBuf};

use snafu::ResultExt;

use crate::errors::{CustomResult, SnapshotFileSnafu};

pub struct SnapshotsHelper {}

impl SnapshotsHelper {
    /// # load captured snapshots
    /// load every file in a directory as a snapshot of the timing page,
    /// ordered by file name
    ///
    /// ## Arguments
    /// * `dir` - the directory holding the captured pages
    ///
    /// ## Returns
    /// * `Vec<(PathBuf, String)>` - the path and contents of every snapshot
    pub fn load_snapshots_from_dir(dir: &Path) -> CustomResult<Vec<(PathBuf, String)>> {
        let path = dir.display().to_string();
        let mut files: Vec<PathBuf> = fs::read_dir(dir)
            .context(SnapshotFileSnafu { path: path.as_str() })?
            .filter_map(|entry| entry.ok().map(|entry| entry.path()))
            .filter(|path| path.is_file())
            .collect();
        files.sort();

        let mut snapshots = Vec::with_capacity(files.len());
        for file in files {
            let bytes = fs::read(&file).context(SnapshotFileSnafu { path: file.display().to_string() })?;
            snapshots.push((file, String::from_utf8_lossy(&bytes).into_owned()));
        }

        Ok(snapshots)
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::tempdir;

    use super::SnapshotsHelper;
    use crate::errors::Error;

    #[test]
    fn loads_files_in_name_order() {
        let dir = tempdir().expect("Failed to create temp dir");
        fs::write(dir.path().join("002.html"), "second").unwrap();
        fs::write(dir.path().join("001.html"), "first").unwrap();
        fs::create_dir(dir.path().join("000_nested")).unwrap();

        let snapshots = SnapshotsHelper::load_snapshots_from_dir(dir.path()).unwrap();
        let contents: Vec<&str> = snapshots.iter().map(|(_, page)| page.as_str()).collect();
        assert_eq!(contents, vec!["first", "second"]);
    }

    #[test]
    fn missing_directory_is_an_error() {
        let dir = tempdir().expect("Failed to create temp dir");
        let missing = dir.path().join("not_captured");

        let err = SnapshotsHelper::load_snapshots_from_dir(&missing).unwrap_err();
        assert!(matches!(err, Error::SnapshotFileError { .. }));
    }
}
