//! Rule sources: where `global/` and `domains/` come from.

mod git;
mod github;
mod tags;

pub use git::{parse_ls_remote, Git, RemoteRef, SystemGit};
pub use github::{sanitize, GithubSource, RefKind, ResolvedRef, GITHUB_PREFIX, LATEST};
pub use tags::{looks_like_commit, Tag, TagVersion};

use std::path::{Path, PathBuf};

use crate::error::{ComposeError, Result};

const RULES_DIR: &str = "rules";
const APP_NAME: &str = "compose-agentsmd";

/// Environment override for the checkout cache.
pub const CACHE_DIR_ENV: &str = "AGENTSMD_CACHE_DIR";
/// Environment override for `edit-rules` workspaces.
pub const WORKSPACE_DIR_ENV: &str = "AGENTSMD_WORKSPACE_DIR";

/// A parsed `source` value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleSource {
    Local(String),
    Github(GithubSource),
}

/// Where rules were found.
#[derive(Debug, Clone)]
pub struct ResolvedSource {
    /// Directory containing `global/` and `domains/`.
    pub rules_root: PathBuf,
    pub origin: Origin,
}

#[derive(Debug, Clone)]
pub enum Origin {
    Local,
    Github {
        source: GithubSource,
        resolved: ResolvedRef,
        /// Root of the cached checkout; attribution paths are relative to it.
        checkout: PathBuf,
    },
}

impl RuleSource {
    pub fn parse(source: &str) -> Result<Self> {
        if source.starts_with(GITHUB_PREFIX) {
            Ok(Self::Github(GithubSource::parse(source)?))
        } else {
            Ok(Self::Local(source.to_string()))
        }
    }
}

/// Directories used for remote checkouts.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub cache_root: PathBuf,
    pub workspace_root: PathBuf,
}

impl CacheConfig {
    /// Load from `AGENTSMD_CACHE_DIR` / `AGENTSMD_WORKSPACE_DIR`, falling back
    /// to the platform cache and data directories.
    pub fn from_env() -> Result<Self> {
        let dirs = directories::ProjectDirs::from("", "", APP_NAME);

        let cache_root = match std::env::var_os(CACHE_DIR_ENV) {
            Some(dir) => PathBuf::from(dir),
            None => dirs
                .as_ref()
                .map(|d| d.cache_dir().to_path_buf())
                .ok_or(ComposeError::NoCacheDir {
                    kind: "cache",
                    env: CACHE_DIR_ENV,
                })?,
        };
        let workspace_root = match std::env::var_os(WORKSPACE_DIR_ENV) {
            Some(dir) => PathBuf::from(dir),
            None => dirs
                .as_ref()
                .map(|d| d.data_dir().join("workspaces"))
                .ok_or(ComposeError::NoCacheDir {
                    kind: "workspace",
                    env: WORKSPACE_DIR_ENV,
                })?,
        };

        Ok(Self {
            cache_root,
            workspace_root,
        })
    }

    pub fn workspace_dir(&self, source: &GithubSource) -> PathBuf {
        self.workspace_root.join(&source.owner).join(&source.repo)
    }

    /// Remove every cached checkout.
    pub fn clear(&self) -> Result<()> {
        if self.cache_root.exists() {
            tracing::info!("clearing cache {}", self.cache_root.display());
            std::fs::remove_dir_all(&self.cache_root)
                .map_err(|e| ComposeError::io(&self.cache_root, e))?;
        }
        Ok(())
    }
}

/// Resolve `source` to a rules root. Local paths are relative to `base`.
pub fn resolve(
    source: &RuleSource,
    base: &Path,
    cache: &CacheConfig,
    git: &dyn Git,
    refresh: bool,
) -> Result<ResolvedSource> {
    match source {
        RuleSource::Local(path) => resolve_local(path, base),
        RuleSource::Github(gh) => resolve_github(gh, &cache.cache_root, git, refresh),
    }
}

pub fn resolve_local(path: &str, base: &Path) -> Result<ResolvedSource> {
    Ok(ResolvedSource {
        rules_root: local_rules_root(path, base)?,
        origin: Origin::Local,
    })
}

/// Resolve the ref and make sure a checkout of it exists under `cache_root`.
pub fn resolve_github(
    gh: &GithubSource,
    cache_root: &Path,
    git: &dyn Git,
    refresh: bool,
) -> Result<ResolvedSource> {
    let resolved = gh.resolve_ref(git)?;
    let checkout = gh.checkout(git, cache_root, &resolved, refresh)?;
    let rules_root = checkout.join(RULES_DIR);
    if !rules_root.is_dir() {
        return Err(ComposeError::SourceUnresolvable(format!(
            "{} has no {}/ directory",
            gh.describe(&resolved),
            RULES_DIR
        )));
    }
    Ok(ResolvedSource {
        rules_root,
        origin: Origin::Github {
            source: gh.clone(),
            resolved,
            checkout,
        },
    })
}

/// Local rules directory: `<path>` if it is already named `rules`, else `<path>/rules`.
pub fn local_rules_root(path: &str, base: &Path) -> Result<PathBuf> {
    let dir = base.join(expand_home(path));
    let dir = if dir.file_name().is_some_and(|name| name == RULES_DIR) {
        dir
    } else {
        dir.join(RULES_DIR)
    };
    if !dir.is_dir() {
        return Err(ComposeError::SourceUnresolvable(format!(
            "local rules directory {} does not exist",
            dir.display()
        )));
    }
    Ok(dir)
}

fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}
