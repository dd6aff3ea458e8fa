use std::borrow::Cow;

use regex::{Regex, RegexBuilder};
use tracing::debug;

use crate::git::RemoteStore;
use crate::scan::Repository;

/// A compiled, case-insensitive search pattern plus its replacement template.
#[derive(Debug, Clone)]
pub struct Substitution {
    pattern: Regex,
    replacement: String,
}

impl Substitution {
    /// Compiles `pattern` case-insensitively.
    ///
    /// The replacement may use `$1`, `${1}` and `${name}` group references.
    /// The `\1` and `\g<name>` forms are accepted as well and rewritten to
    /// their `${..}` equivalents. Write `$$` for a literal dollar sign.
    pub fn new(pattern: &str, replacement: &str) -> Result<Self, regex::Error> {
        let pattern = RegexBuilder::new(pattern).case_insensitive(true).build()?;
        Ok(Self {
            pattern,
            replacement: normalize_replacement(replacement),
        })
    }

    /// The pattern as it was given, before case-insensitive compilation.
    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }

    /// The replacement template after `\N` references were rewritten to `${N}`.
    pub fn replacement(&self) -> &str {
        &self.replacement
    }

    /// Replaces every match of the pattern in `url`.
    pub fn apply(&self, url: &str) -> UrlChange {
        let (replaced, matched) = match self.pattern.replace_all(url, self.replacement.as_str()) {
            Cow::Borrowed(s) => (s.to_string(), false),
            Cow::Owned(s) => (s, true),
        };
        UrlChange {
            original: url.to_string(),
            replaced,
            matched,
        }
    }
}

/// Rewrites `\N` and `\g<name>` group references into `${N}` and `${name}`.
///
/// `\\` becomes a single backslash; any other backslash is kept as is. A
/// reference starting with `0` is not a group, so `\0` stays literal text.
fn normalize_replacement(replacement: &str) -> String {
    let mut out = String::with_capacity(replacement.len());
    let mut rest = replacement;

    while let Some(pos) = rest.find('\\') {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos + 1..];
        let digits = tail.bytes().take_while(u8::is_ascii_digit).count();

        if digits > 0 && !tail.starts_with('0') {
            out.push_str(&format!("${{{}}}", &tail[..digits]));
            rest = &tail[digits..];
        } else if let Some((name, after)) = tail
            .strip_prefix("g<")
            .and_then(|t| t.split_once('>'))
        {
            out.push_str(&format!("${{{name}}}"));
            rest = after;
        } else if let Some(after) = tail.strip_prefix('\\') {
            out.push('\\');
            rest = after;
        } else {
            out.push('\\');
            rest = tail;
        }
    }

    out.push_str(rest);
    out
}

/// One URL before and after substitution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlChange {
    pub original: String,
    pub replaced: String,
    /// Whether the pattern matched at all. A match can still produce the
    /// original text, so this is not the same as `!is_unchanged()`.
    pub matched: bool,
}

impl UrlChange {
    /// Returns `true` when the substitution left the URL as it was.
    pub fn is_unchanged(&self) -> bool {
        self.original == self.replaced
    }
}

/// The URLs of one remote of one repository, in configuration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UrlMapping {
    /// The remote the URLs were read from. Updates are written back to it.
    pub remote: String,
    pub changes: Vec<UrlChange>,
}

impl UrlMapping {
    /// Returns `true` when there is nothing to preview or apply.
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }
}

/// Picks the remote to migrate when none was named on the command line:
/// `origin` if it exists, otherwise the only remote.
pub fn pick_primary_remote(remotes: &[String]) -> Option<&str> {
    if remotes.iter().any(|r| r == "origin") {
        return Some("origin");
    }
    match remotes {
        [only] => Some(only.as_str()),
        _ => None,
    }
}

/// Computes the new remote URLs of a single repository.
///
/// Holds no state of its own; every call to
/// [`compute_mapping`](RemoteTransform::compute_mapping) reads the remote
/// configuration again.
pub struct RemoteTransform<'a, S: RemoteStore> {
    repository: Repository,
    substitution: &'a Substitution,
    remote: Option<&'a str>,
    store: &'a S,
}

impl<'a, S: RemoteStore> RemoteTransform<'a, S> {
    /// Binds a repository to the shared substitution and store.
    ///
    /// # Parameters
    ///
    /// * `repository` – The scanned directory to migrate.
    /// * `substitution` – The compiled pattern and replacement.
    /// * `remote` – An explicit remote name, or `None` for the primary remote.
    /// * `store` – Where remote URLs are read from and written to.
    pub fn new(
        repository: Repository,
        substitution: &'a Substitution,
        remote: Option<&'a str>,
        store: &'a S,
    ) -> Self {
        Self {
            repository,
            substitution,
            remote,
            store,
        }
    }

    /// The repository this transform reads from.
    pub fn repository(&self) -> &Repository {
        &self.repository
    }

    pub(crate) fn store(&self) -> &S {
        self.store
    }

    /// Reads the remote's URLs and substitutes each one.
    ///
    /// Returns an empty mapping when the directory is not a valid repository,
    /// when no remote can be resolved, or when its URLs cannot be read.
    pub fn compute_mapping(&self) -> UrlMapping {
        let path = self.repository.path();

        if !self.store.is_repository(path) {
            debug!(repo = %path.display(), "not a valid repository, skipping");
            return UrlMapping::default();
        }

        let Some(remote) = self.resolve_remote() else {
            debug!(repo = %path.display(), "no primary remote, skipping");
            return UrlMapping::default();
        };

        let urls = match self.store.remote_urls(path, &remote) {
            Ok(urls) => urls,
            Err(e) => {
                debug!(repo = %path.display(), %remote, error = %e, "cannot read remote URLs");
                return UrlMapping::default();
            }
        };

        UrlMapping {
            changes: urls.iter().map(|u| self.substitution.apply(u)).collect(),
            remote,
        }
    }

    fn resolve_remote(&self) -> Option<String> {
        if let Some(name) = self.remote {
            return Some(name.to_string());
        }
        match self.store.remotes(self.repository.path()) {
            Ok(remotes) => pick_primary_remote(&remotes).map(str::to_string),
            Err(e) => {
                debug!(repo = %self.repository.path().display(), error = %e, "cannot list remotes");
                None
            }
        }
    }
}

/// Builds one transform per repository, preserving discovery order.
pub fn prepare_transforms<'a, S: RemoteStore>(
    repositories: Vec<Repository>,
    substitution: &'a Substitution,
    remote: Option<&'a str>,
    store: &'a S,
) -> Vec<RemoteTransform<'a, S>> {
    repositories
        .into_iter()
        .map(|repo| RemoteTransform::new(repo, substitution, remote, store))
        .collect()
}
