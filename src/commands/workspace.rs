//! `edit-rules` and `apply-rules`: editing the shared rules source.

use std::path::PathBuf;

use anyhow::{bail, Result};
use serde::Serialize;

use super::App;
use crate::compose::ComposeReport;
use crate::ruleset::ProjectRuleset;
use crate::source::{local_rules_root, RefKind, RuleSource};

#[derive(Debug, Clone, Serialize)]
pub struct EditReport {
    pub source: String,
    /// Directory to edit.
    pub workspace: PathBuf,
    /// A fresh clone was created (or would be, on a dry run).
    pub cloned: bool,
    pub dry_run: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ApplyReport {
    pub workspace: Option<PathBuf>,
    /// `git status --porcelain` lines found in the workspace.
    pub pending: Vec<String>,
    /// Pending changes were committed and pushed.
    pub published: bool,
    pub compose: ComposeReport,
}

/// Prepare a writable copy of the rules source.
///
/// Local sources are edited in place. GitHub sources get a full clone in the
/// workspace directory, on the configured branch when the ref is one.
pub fn edit_rules(app: &App, ruleset: &ProjectRuleset, dry_run: bool) -> Result<EditReport> {
    let gh = match RuleSource::parse(&ruleset.source)? {
        RuleSource::Local(path) => {
            return Ok(EditReport {
                source: ruleset.source.clone(),
                workspace: local_rules_root(&path, &ruleset.root)?,
                cloned: false,
                dry_run,
            });
        }
        RuleSource::Github(gh) => gh,
    };

    let dir = app.cache()?.workspace_dir(&gh);
    if dir.exists() {
        tracing::debug!("workspace {} already exists", dir.display());
        return Ok(EditReport {
            source: ruleset.source.clone(),
            workspace: dir,
            cloned: false,
            dry_run,
        });
    }

    if !dry_run {
        let resolved = gh.resolve_ref(app.git.as_ref())?;
        let branch = (resolved.kind == RefKind::Branch).then_some(resolved.name.as_str());
        gh.clone_workspace(app.git.as_ref(), &dir, branch)?;
        tracing::info!("cloned {} into {}", gh.url, dir.display());
    }

    Ok(EditReport {
        source: ruleset.source.clone(),
        workspace: dir,
        cloned: true,
        dry_run,
    })
}

/// Publish workspace edits, then recompose from a refreshed source.
pub fn apply_rules(
    app: &App,
    ruleset: &ProjectRuleset,
    message: &str,
    yes: bool,
    dry_run: bool,
    confirm: &mut dyn FnMut(&str) -> bool,
) -> Result<ApplyReport> {
    let gh = match RuleSource::parse(&ruleset.source)? {
        RuleSource::Local(_) => {
            let compose = app.compose(ruleset, false, dry_run)?;
            return Ok(ApplyReport {
                workspace: None,
                pending: Vec::new(),
                published: false,
                compose,
            });
        }
        RuleSource::Github(gh) => gh,
    };

    let dir = app.cache()?.workspace_dir(&gh);
    if !dir.is_dir() {
        bail!(
            "No workspace for {} at {} (run edit-rules first)",
            ruleset.source,
            dir.display()
        );
    }

    let git = app.git.as_ref();
    let status = git.run(&["status", "--porcelain"], Some(&dir))?;
    let pending: Vec<String> = status
        .lines()
        .filter(|l| !l.trim().is_empty())
        .map(str::to_string)
        .collect();

    let mut published = false;
    if !pending.is_empty() && !dry_run {
        let prompt = format!(
            "Commit and push {} change(s) in {}?",
            pending.len(),
            dir.display()
        );
        if !yes && !confirm(&prompt) {
            bail!("Aborted");
        }
        git.run(&["add", "-A"], Some(&dir))?;
        git.run(&["commit", "-m", message], Some(&dir))?;
        git.run(&["push"], Some(&dir))?;
        published = true;
        tracing::info!("pushed rule changes from {}", dir.display());
    }

    let compose = app.compose(ruleset, !dry_run, dry_run)?;

    Ok(ApplyReport {
        workspace: Some(dir),
        pending,
        published,
        compose,
    })
}
