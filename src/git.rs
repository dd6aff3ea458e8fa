use std::fs;
use std::path::Path;
use std::process::{Command, Stdio};

use thiserror::Error;
use tracing::debug;

/// Errors returned by the git layer.
///
/// These never abort a run: the transform turns them into an empty mapping and
/// the apply loop prints them next to the repository that failed.
#[derive(Debug, Error)]
pub enum GitError {
    /// The `git` process could not be started.
    #[error("cannot run git: {0}")]
    Spawn(#[from] std::io::Error),

    /// `git` exited non-zero; carries its trimmed standard error.
    #[error("{stderr}")]
    Command { stderr: String },

    /// The URL expected to be replaced is no longer configured on the remote.
    #[error("no such URL: {url}")]
    NoSuchUrl { url: String },

    /// The new URL uses a transport that can run arbitrary commands.
    #[error("refusing unsafe transport `{transport}::` in {url}")]
    UnsafeTransport { transport: String, url: String },
}

/// Read and write access to the remotes of repositories on disk.
///
/// Everything the migration needs from version control goes through this
/// trait so the transform and apply logic can be driven by an in-memory store
/// in tests.
pub trait RemoteStore {
    /// Returns `true` if `path` is the root of a valid work tree.
    fn is_repository(&self, path: &Path) -> bool;

    /// Lists the names of all configured remotes.
    fn remotes(&self, path: &Path) -> Result<Vec<String>, GitError>;

    /// Lists every URL configured for `remote`, in configuration order.
    fn remote_urls(&self, path: &Path, remote: &str) -> Result<Vec<String>, GitError>;

    /// Replaces `old_url` with `new_url` on `remote`.
    ///
    /// Fails without changing anything when the remote does not exist or
    /// `old_url` is not currently one of its URLs.
    fn set_remote_url(
        &self,
        path: &Path,
        remote: &str,
        old_url: &str,
        new_url: &str,
    ) -> Result<(), GitError>;
}

/// [`RemoteStore`] backed by the `git` executable found on `PATH`.
#[derive(Debug, Default, Clone, Copy)]
pub struct GitCli;

/// Builds a `git -C <path>` command with captured output and no stdin.
fn git_in(path: &Path) -> Command {
    let mut cmd = Command::new("git");
    cmd.arg("-C").arg(path);
    cmd.stdin(Stdio::null());
    cmd.stdout(Stdio::piped());
    cmd.stderr(Stdio::piped());
    cmd
}

/// Runs a command and returns its trimmed standard output on success,
/// or its trimmed standard error as [`GitError::Command`] on failure.
///
/// When git fails without writing anything to stderr, the exit status is
/// used as the message instead.
fn run_output(mut cmd: Command) -> Result<String, GitError> {
    debug!(command = ?cmd, "running git");
    let out = cmd.output()?;

    if out.status.success() {
        Ok(String::from_utf8_lossy(&out.stdout).trim().to_string())
    } else {
        let stderr = String::from_utf8_lossy(&out.stderr).trim().to_string();
        let stderr = if stderr.is_empty() {
            format!("git exited with {}", out.status)
        } else {
            stderr
        };
        debug!(%stderr, "git failed");
        Err(GitError::Command { stderr })
    }
}

/// Splits command output into its non-empty lines.
fn output_lines(output: &str) -> Vec<String> {
    output
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect()
}

/// Transports that make git execute a command instead of contacting a host.
const UNSAFE_TRANSPORTS: &[&str] = &["ext"];

/// Returns the transport name if `url` uses one of [`UNSAFE_TRANSPORTS`].
///
/// Only the `<transport>::<address>` form is considered, so scp-like and
/// `scheme://` URLs never match.
pub(crate) fn unsafe_transport(url: &str) -> Option<&str> {
    let (transport, address) = url.split_once("::")?;
    if address.is_empty() {
        return None;
    }
    UNSAFE_TRANSPORTS
        .iter()
        .find(|t| **t == transport)
        .map(|_| transport)
}

/// Builds a POSIX extended regex that matches `url` and nothing else.
///
/// `git remote set-url <name> <new> <old>` interprets `<old>` as a regex, so
/// the URL is escaped and anchored to replace exactly that entry.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(exact_url_pattern("a.b"), "^a\\.b$");
/// ```
pub(crate) fn exact_url_pattern(url: &str) -> String {
    let mut pattern = String::with_capacity(url.len() + 2);
    pattern.push('^');
    for c in url.chars() {
        if matches!(
            c,
            '\\' | '.' | '[' | '$' | '(' | ')' | '|' | '*' | '+' | '?' | '{' | '^'
        ) {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('$');
    pattern
}

impl RemoteStore for GitCli {
    /// Runs `git rev-parse --show-toplevel` and checks that git resolves `path`
    /// to itself.
    ///
    /// A directory with a broken `.git` folder nested inside another work tree
    /// would otherwise be resolved to the parent repository.
    fn is_repository(&self, path: &Path) -> bool {
        let mut cmd = git_in(path);
        cmd.arg("rev-parse").arg("--show-toplevel");

        let toplevel = match run_output(cmd) {
            Ok(s) => s,
            Err(_) => return false,
        };

        match (fs::canonicalize(&toplevel), fs::canonicalize(path)) {
            (Ok(top), Ok(own)) => top == own,
            _ => false,
        }
    }

    /// Runs `git remote`.
    fn remotes(&self, path: &Path) -> Result<Vec<String>, GitError> {
        let mut cmd = git_in(path);
        cmd.arg("remote");
        run_output(cmd).map(|s| output_lines(&s))
    }

    /// Runs `git remote get-url --all <remote>`.
    fn remote_urls(&self, path: &Path, remote: &str) -> Result<Vec<String>, GitError> {
        let mut cmd = git_in(path);
        cmd.arg("remote")
            .arg("get-url")
            .arg("--all")
            .arg("--")
            .arg(remote);
        run_output(cmd).map(|s| output_lines(&s))
    }

    /// Checks `old_url` is still configured, then runs
    /// `git remote set-url -- <remote> <new_url> ^<old_url>$`.
    ///
    /// The `--` keeps a replacement that starts with `-` from being read as an
    /// option. New URLs using the `ext::` transport are rejected before git
    /// is called.
    fn set_remote_url(
        &self,
        path: &Path,
        remote: &str,
        old_url: &str,
        new_url: &str,
    ) -> Result<(), GitError> {
        if let Some(transport) = unsafe_transport(new_url) {
            return Err(GitError::UnsafeTransport {
                transport: transport.to_string(),
                url: new_url.to_string(),
            });
        }

        let current = self.remote_urls(path, remote)?;
        if !current.iter().any(|u| u == old_url) {
            return Err(GitError::NoSuchUrl {
                url: old_url.to_string(),
            });
        }

        let mut cmd = git_in(path);
        cmd.arg("remote")
            .arg("set-url")
            .arg("--")
            .arg(remote)
            .arg(new_url)
            .arg(exact_url_pattern(old_url));
        run_output(cmd).map(|_| ())
    }
}

#[cfg(test)]
pub(crate) mod mock {
    use super::{GitError, RemoteStore};
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::path::{Path, PathBuf};

    /// A recorded `set_remote_url` call: (path, remote, old, new).
    pub(crate) type Update = (PathBuf, String, String, String);

    #[derive(Default)]
    struct MockRepo {
        remotes: Vec<(String, Vec<String>)>,
        fail_with: Option<String>,
    }

    /// In-memory [`RemoteStore`] that records every update attempt.
    #[derive(Default)]
    pub(crate) struct MockStore {
        repos: RefCell<HashMap<PathBuf, MockRepo>>,
        pub(crate) updates: RefCell<Vec<Update>>,
    }

    impl MockStore {
        pub(crate) fn with_remote(self, path: &str, remote: &str, urls: &[&str]) -> Self {
            self.repos
                .borrow_mut()
                .entry(PathBuf::from(path))
                .or_default()
                .remotes
                .push((
                    remote.to_string(),
                    urls.iter().map(|u| u.to_string()).collect(),
                ));
            self
        }

        pub(crate) fn failing(self, path: &str, message: &str) -> Self {
            self.repos
                .borrow_mut()
                .entry(PathBuf::from(path))
                .or_default()
                .fail_with = Some(message.to_string());
            self
        }

        /// Replaces the URLs of an existing remote, as if edited by hand.
        pub(crate) fn replace_urls(&self, path: &str, remote: &str, urls: &[&str]) {
            let mut repos = self.repos.borrow_mut();
            if let Some((_, current)) = repos
                .get_mut(Path::new(path))
                .and_then(|r| r.remotes.iter_mut().find(|(n, _)| n == remote))
            {
                *current = urls.iter().map(|u| u.to_string()).collect();
            }
        }

        /// Deletes a remote, as `git remote remove` would.
        pub(crate) fn remove_remote(&self, path: &str, remote: &str) {
            if let Some(repo) = self.repos.borrow_mut().get_mut(Path::new(path)) {
                repo.remotes.retain(|(n, _)| n != remote);
            }
        }

        pub(crate) fn urls(&self, path: &str, remote: &str) -> Vec<String> {
            self.remote_urls(Path::new(path), remote).unwrap_or_default()
        }
    }

    impl RemoteStore for MockStore {
        fn is_repository(&self, path: &Path) -> bool {
            self.repos.borrow().contains_key(path)
        }

        fn remotes(&self, path: &Path) -> Result<Vec<String>, GitError> {
            let repos = self.repos.borrow();
            let repo = repos.get(path).ok_or_else(|| GitError::Command {
                stderr: "fatal: not a git repository".to_string(),
            })?;
            Ok(repo.remotes.iter().map(|(n, _)| n.clone()).collect())
        }

        fn remote_urls(&self, path: &Path, remote: &str) -> Result<Vec<String>, GitError> {
            let repos = self.repos.borrow();
            repos
                .get(path)
                .and_then(|r| r.remotes.iter().find(|(n, _)| n == remote))
                .map(|(_, urls)| urls.clone())
                .ok_or_else(|| GitError::Command {
                    stderr: format!("error: No such remote '{remote}'"),
                })
        }

        fn set_remote_url(
            &self,
            path: &Path,
            remote: &str,
            old_url: &str,
            new_url: &str,
        ) -> Result<(), GitError> {
            self.updates.borrow_mut().push((
                path.to_path_buf(),
                remote.to_string(),
                old_url.to_string(),
                new_url.to_string(),
            ));

            let mut repos = self.repos.borrow_mut();
            let repo = repos.get_mut(path).ok_or_else(|| GitError::Command {
                stderr: "fatal: not a git repository".to_string(),
            })?;
            if let Some(message) = &repo.fail_with {
                return Err(GitError::Command {
                    stderr: message.clone(),
                });
            }
            let urls = repo
                .remotes
                .iter_mut()
                .find(|(n, _)| n == remote)
                .map(|(_, urls)| urls)
                .ok_or_else(|| GitError::Command {
                    stderr: format!("error: No such remote '{remote}'"),
                })?;
            let slot = urls
                .iter_mut()
                .find(|u| u.as_str() == old_url)
                .ok_or_else(|| GitError::NoSuchUrl {
                    url: old_url.to_string(),
                })?;
            *slot = new_url.to_string();
            Ok(())
        }
    }
}
