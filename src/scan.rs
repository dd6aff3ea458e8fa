use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::Error;

/// A directory that contains a `.git` folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Repository {
    path: PathBuf,
    name: String,
}

impl Repository {
    /// Wraps `path`, using its final segment as the display name.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self { path, name }
    }

    /// The repository's working directory as found by the scan.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The final path segment, shown in the preview and status lines.
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Returns `true` if `dir` has a `.git` subdirectory.
fn has_git_dir(dir: &Path) -> bool {
    dir.join(".git").is_dir()
}

/// Lists the immediate subdirectories of `directory` that look like git
/// repositories, sorted by name.
///
/// Only the presence of a `.git` directory is checked here; stricter
/// validation happens when the remotes are read.
///
/// # Errors
///
/// Returns [`Error::Scan`] if `directory` cannot be listed.
pub fn scan_repositories(directory: &Path) -> Result<Vec<Repository>, Error> {
    let scan_err = |source| Error::Scan {
        path: directory.to_path_buf(),
        source,
    };

    let mut repos = Vec::new();
    for entry in fs::read_dir(directory).map_err(scan_err)? {
        let path = entry.map_err(scan_err)?.path();
        if path.is_dir() && has_git_dir(&path) {
            repos.push(Repository::new(path));
        } else {
            debug!(path = %path.display(), "not a repository, skipping");
        }
    }

    repos.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(repos)
}

#[cfg(test)]
mod tests {
    use super::{Repository, scan_repositories};
    use crate::error::Error;
    use std::fs;

    #[test]
    fn finds_only_directories_with_git_folder() {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let root = dir.path();
        fs::create_dir_all(root.join("beta/.git")).expect("mkdir failed");
        fs::create_dir_all(root.join("alpha/.git")).expect("mkdir failed");
        fs::create_dir_all(root.join("empty")).expect("mkdir failed");
        fs::create_dir_all(root.join("worktree")).expect("mkdir failed");
        fs::write(root.join("worktree/.git"), "gitdir: elsewhere").expect("write failed");
        fs::write(root.join("notes.txt"), "hello").expect("write failed");

        let repos = scan_repositories(root).expect("scan failed");
        let names: Vec<&str> = repos.iter().map(Repository::name).collect();
        assert_eq!(names, vec!["alpha", "beta"]);
    }

    #[test]
    fn empty_directory_yields_nothing() {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        fs::create_dir_all(dir.path().join("plain")).expect("mkdir failed");
        let repos = scan_repositories(dir.path()).expect("scan failed");
        assert!(repos.is_empty());
    }

    #[test]
    fn missing_directory_is_an_error() {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let res = scan_repositories(&dir.path().join("does-not-exist"));
        assert!(matches!(res, Err(Error::Scan { .. })));
    }

    #[test]
    fn repository_name_is_last_path_segment() {
        let repo = Repository::new("/home/me/src/my-service");
        assert_eq!(repo.name(), "my-service");
    }
}
