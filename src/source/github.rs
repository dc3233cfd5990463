//! GitHub sources: `github:owner/repo@ref`.
//!
//! A ref is resolved against the remote before anything is cloned:
//!
//! - `latest` picks the highest version tag, falling back to the remote `HEAD`
//! - a tag or branch name is matched exactly
//! - anything else that looks like a commit hash is used as-is
//!
//! Checkouts are cached under `<cache>/<owner>/<repo>/<ref>`. Named refs are
//! shallow-cloned with `--branch`; commits cannot be targeted that way, so a
//! failed clone falls back to `init` + `fetch <commit>` + `checkout`.

use std::path::{Path, PathBuf};

use super::git::{parse_ls_remote, Git};
use super::tags;
use crate::error::{ComposeError, Result};

pub const GITHUB_PREFIX: &str = "github:";
pub const LATEST: &str = "latest";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GithubSource {
    pub owner: String,
    pub repo: String,
    pub git_ref: String,
    pub url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefKind {
    Tag,
    Branch,
    /// Remote `HEAD`, used when `latest` finds no version tag.
    Head,
    /// A raw commit hash that did not match any tag or branch.
    Commit,
}

/// A ref pinned against the remote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRef {
    /// Name used for the cache key, clone and attribution.
    pub name: String,
    pub commit: String,
    pub kind: RefKind,
}

impl GithubSource {
    pub fn parse(source: &str) -> Result<Self> {
        let spec = source
            .strip_prefix(GITHUB_PREFIX)
            .ok_or_else(|| invalid(source, "expected github:owner/repo@ref"))?;

        let (path, git_ref) = match spec.split_once('@') {
            Some((path, r)) => (path, r),
            None => (spec, LATEST),
        };
        if git_ref.is_empty() {
            return Err(invalid(source, "ref after '@' is empty"));
        }

        let (owner, repo) = path
            .split_once('/')
            .ok_or_else(|| invalid(source, "expected owner/repo"))?;
        if owner.is_empty() || repo.is_empty() || repo.contains('/') {
            return Err(invalid(source, "expected owner/repo"));
        }

        Ok(Self {
            owner: owner.to_string(),
            repo: repo.to_string(),
            git_ref: git_ref.to_string(),
            url: format!("https://github.com/{}/{}.git", owner, repo),
        })
    }

    /// Attribution prefix for files drawn from this source.
    pub fn describe(&self, resolved: &ResolvedRef) -> String {
        format!(
            "{}{}/{}@{}",
            GITHUB_PREFIX, self.owner, self.repo, resolved.name
        )
    }

    /// Pin the configured ref to a commit using `git ls-remote`.
    pub fn resolve_ref(&self, git: &dyn Git) -> Result<ResolvedRef> {
        if self.git_ref == LATEST {
            return self.resolve_latest(git);
        }

        let listing = git.run(&["ls-remote", "--tags", "--heads", &self.url], None)?;
        let refs = parse_ls_remote(&listing);

        if let Some(tag) = tags::tags(&refs)
            .into_iter()
            .find(|t| t.name == self.git_ref)
        {
            return Ok(ResolvedRef {
                name: tag.name,
                commit: tag.commit,
                kind: RefKind::Tag,
            });
        }
        if let Some(head) = tags::branch(&refs, &self.git_ref) {
            return Ok(ResolvedRef {
                name: self.git_ref.clone(),
                commit: head.hash.clone(),
                kind: RefKind::Branch,
            });
        }
        if tags::looks_like_commit(&self.git_ref) {
            return Ok(ResolvedRef {
                name: self.git_ref.clone(),
                commit: self.git_ref.clone(),
                kind: RefKind::Commit,
            });
        }

        Err(ComposeError::SourceUnresolvable(format!(
            "ref '{}' not found in {}",
            self.git_ref, self.url
        )))
    }

    fn resolve_latest(&self, git: &dyn Git) -> Result<ResolvedRef> {
        let listing = git.run(&["ls-remote", "--tags", &self.url], None)?;
        let all = tags::tags(&parse_ls_remote(&listing));
        if let Some(tag) = tags::latest(&all) {
            tracing::debug!("latest tag of {} is {}", self.url, tag.name);
            return Ok(ResolvedRef {
                name: tag.name.clone(),
                commit: tag.commit.clone(),
                kind: RefKind::Tag,
            });
        }

        let listing = git.run(&["ls-remote", &self.url, "HEAD"], None)?;
        let head = parse_ls_remote(&listing)
            .into_iter()
            .find(|r| r.name == "HEAD")
            .ok_or_else(|| {
                ComposeError::SourceUnresolvable(format!(
                    "{} has no version tags and no HEAD",
                    self.url
                ))
            })?;
        tracing::debug!("{} has no version tags, using HEAD {}", self.url, head.hash);
        Ok(ResolvedRef {
            name: head.hash.clone(),
            commit: head.hash,
            kind: RefKind::Head,
        })
    }

    /// Cache directory for a resolved ref.
    pub fn cache_dir(&self, cache_root: &Path, resolved: &ResolvedRef) -> PathBuf {
        cache_root
            .join(&self.owner)
            .join(&self.repo)
            .join(sanitize(&resolved.name))
    }

    /// Make sure a checkout of `resolved` exists in the cache and return it.
    pub fn checkout(
        &self,
        git: &dyn Git,
        cache_root: &Path,
        resolved: &ResolvedRef,
        refresh: bool,
    ) -> Result<PathBuf> {
        let dir = self.cache_dir(cache_root, resolved);

        if refresh && dir.exists() {
            tracing::debug!("refresh: removing {}", dir.display());
            remove_dir(&dir)?;
        }
        if dir.exists() {
            tracing::debug!("cache hit {}", dir.display());
            return Ok(dir);
        }

        if let Some(parent) = dir.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ComposeError::io(parent, e))?;
        }

        let dir_arg = dir.to_string_lossy().into_owned();
        let cloned = git.run(
            &[
                "clone",
                "--depth",
                "1",
                "--branch",
                &resolved.name,
                &self.url,
                &dir_arg,
            ],
            None,
        );
        if let Err(e) = cloned {
            tracing::debug!("shallow clone failed, fetching commit instead: {}", e);
            if dir.exists() {
                remove_dir(&dir)?;
            }
            if let Err(e) = self.fetch_commit(git, &dir, &resolved.commit) {
                if dir.exists() {
                    remove_dir(&dir)?;
                }
                return Err(e);
            }
        }

        tracing::info!("cached {} at {}", self.describe(resolved), dir.display());
        Ok(dir)
    }

    fn fetch_commit(&self, git: &dyn Git, dir: &Path, commit: &str) -> Result<()> {
        std::fs::create_dir_all(dir).map_err(|e| ComposeError::io(dir, e))?;
        git.run(&["init", "--quiet"], Some(dir))?;
        git.run(&["remote", "add", "origin", &self.url], Some(dir))?;
        git.run(&["fetch", "--depth", "1", "origin", commit], Some(dir))?;
        git.run(&["checkout", "--quiet", "--detach", "FETCH_HEAD"], Some(dir))?;
        Ok(())
    }

    /// Full clone used for editing rules, checked out at `branch` if given.
    pub fn clone_workspace(&self, git: &dyn Git, dir: &Path, branch: Option<&str>) -> Result<()> {
        if let Some(parent) = dir.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ComposeError::io(parent, e))?;
        }
        let dir_arg = dir.to_string_lossy().into_owned();
        git.run(&["clone", &self.url, &dir_arg], None)?;
        if let Some(branch) = branch {
            git.run(&["checkout", branch], Some(dir))?;
        }
        Ok(())
    }
}

/// Make a ref usable as a single path segment.
pub fn sanitize(name: &str) -> String {
    name.replace(['/', '\\'], "__")
}

fn remove_dir(dir: &Path) -> Result<()> {
    std::fs::remove_dir_all(dir).map_err(|e| ComposeError::io(dir, e))
}

fn invalid(source: &str, why: &str) -> ComposeError {
    ComposeError::SourceUnresolvable(format!("invalid source '{}': {}", source, why))
}
