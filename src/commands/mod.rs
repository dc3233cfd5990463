//! CLI operations on top of the library stages.

mod init;
mod report;
mod workspace;

pub use init::{init, render_starter, InitOptions, InitReport, DEFAULT_SOURCE};
pub use report::{format_apply, format_compose, format_edit, format_init, OutputMode};
pub use workspace::{apply_rules, edit_rules, ApplyReport, EditReport};

use std::cell::OnceCell;
use std::path::Path;

use crate::compose::{self, ComposeReport};
use crate::error::Result;
use crate::ruleset::{self, ProjectRuleset, SchemaValidator};
use crate::source::{self, CacheConfig, Git, RuleSource};

/// Everything a command needs besides its arguments.
///
/// Cache directories are only looked up once a remote source needs them, so
/// local-only runs work without a home directory.
pub struct App {
    pub validator: SchemaValidator,
    pub git: Box<dyn Git>,
    cache: OnceCell<CacheConfig>,
    load_cache: fn() -> Result<CacheConfig>,
}

impl App {
    /// An app whose cache directories come from the environment on first use.
    pub fn new(git: Box<dyn Git>) -> anyhow::Result<Self> {
        Self::with_cache_loader(CacheConfig::from_env, git)
    }

    pub fn with_cache(cache: CacheConfig, git: Box<dyn Git>) -> anyhow::Result<Self> {
        let app = Self::new(git)?;
        let _ = app.cache.set(cache);
        Ok(app)
    }

    pub fn with_cache_loader(
        load_cache: fn() -> Result<CacheConfig>,
        git: Box<dyn Git>,
    ) -> anyhow::Result<Self> {
        Ok(Self {
            validator: SchemaValidator::new()?,
            git,
            cache: OnceCell::new(),
            load_cache,
        })
    }

    /// Cache and workspace directories, resolved on first call.
    pub fn cache(&self) -> Result<&CacheConfig> {
        if let Some(cache) = self.cache.get() {
            return Ok(cache);
        }
        let cache = (self.load_cache)()?;
        Ok(self.cache.get_or_init(|| cache))
    }

    /// Load the ruleset at `path`.
    pub fn load_ruleset(&self, path: &Path) -> Result<ProjectRuleset> {
        ruleset::load(path, &self.validator)
    }

    /// Resolve the ruleset's source and compose it.
    pub fn compose(
        &self,
        ruleset: &ProjectRuleset,
        refresh: bool,
        dry_run: bool,
    ) -> Result<ComposeReport> {
        let resolved = match RuleSource::parse(&ruleset.source)? {
            RuleSource::Local(path) => source::resolve_local(&path, &ruleset.root)?,
            RuleSource::Github(gh) => source::resolve_github(
                &gh,
                &self.cache()?.cache_root,
                self.git.as_ref(),
                refresh,
            )?,
        };
        compose::compose(ruleset, &resolved, dry_run)
    }
}
