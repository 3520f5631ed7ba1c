//! Repository references resolved from the request path.

use crate::oid::Oid;
use std::fmt;

/// Maximum length of an org or repository name.
pub const MAX_NAME_LEN: usize = 100;

/// Suffix git appends to repository URLs.
const GIT_SUFFIX: &str = ".git";

/// An `{org}/{repo}` pair taken from the batch URL.
///
/// Traversal sequences such as `../` are normally collapsed by the HTTP
/// layer before routing, so they never reach this type. The name rules here
/// are a second line of defence, not the primary one.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct RepositoryRef {
    org: String,
    repo: String,
}

impl RepositoryRef {
    /// Resolve a repository reference from the `{org}` and `{repo}` path
    /// segments. A trailing `.git` on the repo segment is stripped.
    pub fn resolve(org: &str, repo_segment: &str) -> crate::Result<Self> {
        let repo = repo_segment
            .strip_suffix(GIT_SUFFIX)
            .unwrap_or(repo_segment);

        validate_name("org", org)?;
        validate_name("repo", repo)?;

        Ok(Self {
            org: org.to_string(),
            repo: repo.to_string(),
        })
    }

    /// Get the org name as given in the URL.
    pub fn org(&self) -> &str {
        &self.org
    }

    /// Get the repository name without the `.git` suffix.
    pub fn repo(&self) -> &str {
        &self.repo
    }

    /// Storage key for an object in this repository.
    ///
    /// Layout: `{org}/{repo}/{oid[0..2]}/{oid[2..4]}/{oid}`, with org and repo
    /// lowercased since hosted git names are case-insensitive.
    pub fn object_key(&self, oid: &Oid) -> String {
        let (a, b) = oid.shard();
        format!(
            "{}/{}/{}/{}/{}",
            self.org.to_ascii_lowercase(),
            self.repo.to_ascii_lowercase(),
            a,
            b,
            oid
        )
    }
}

fn validate_name(kind: &str, name: &str) -> crate::Result<()> {
    if name.is_empty() {
        return Err(crate::Error::InvalidRepositoryName(format!(
            "{kind} name cannot be empty"
        )));
    }
    if name.len() > MAX_NAME_LEN {
        return Err(crate::Error::InvalidRepositoryName(format!(
            "{kind} name exceeds {MAX_NAME_LEN} characters"
        )));
    }
    if name.starts_with('.') {
        return Err(crate::Error::InvalidRepositoryName(format!(
            "{kind} name cannot start with '.'"
        )));
    }
    if name.contains("..") {
        return Err(crate::Error::InvalidRepositoryName(format!(
            "{kind} name cannot contain '..'"
        )));
    }
    for c in name.chars() {
        if !matches!(c, 'a'..='z' | 'A'..='Z' | '0'..='9' | '-' | '_' | '.') {
            return Err(crate::Error::InvalidRepositoryName(format!(
                "invalid character in {kind} name: {c:?}"
            )));
        }
    }
    Ok(())
}

impl fmt::Debug for RepositoryRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RepositoryRef({self})")
    }
}

impl fmt::Display for RepositoryRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.org, self.repo)
    }
}
