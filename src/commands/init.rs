use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::Serialize;

use super::App;
use crate::ruleset::{self, DEFAULT_CLAUDE_OUTPUT, DEFAULT_OUTPUT};

pub const DEFAULT_SOURCE: &str = "github:metyatech/agent-rules@latest";

#[derive(Debug, Clone)]
pub struct InitOptions {
    pub source: String,
    pub global: bool,
    pub domains: Vec<String>,
    pub extra: Vec<String>,
    pub output: String,
    pub claude: bool,
    pub force: bool,
    pub yes: bool,
    pub dry_run: bool,
}

impl Default for InitOptions {
    fn default() -> Self {
        Self {
            source: DEFAULT_SOURCE.to_string(),
            global: true,
            domains: Vec::new(),
            extra: Vec::new(),
            output: DEFAULT_OUTPUT.to_string(),
            claude: true,
            force: false,
            yes: false,
            dry_run: false,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct InitReport {
    pub path: PathBuf,
    pub written: bool,
    pub overwritten: bool,
    pub dry_run: bool,
    pub content: String,
}

/// Starter ruleset with a comment on each field.
pub fn render_starter(opts: &InitOptions) -> String {
    format!(
        r#"{{
  // "github:owner/repo@ref" (ref defaults to latest) or a local rules directory.
  "source": {source},
  // Include rules/global.
  "global": {global},
  // Folders under rules/domains, composed in this order.
  "domains": {domains},
  // Local markdown files or folders, composed last in this order.
  "extra": {extra},
  "output": {output},
  // Companion file that imports the output.
  "claude": {{
    "enabled": {claude},
    "output": {claude_output}
  }}
}}
"#,
        source = json(&opts.source),
        global = opts.global,
        domains = json(&opts.domains),
        extra = json(&opts.extra),
        output = json(&opts.output),
        claude = opts.claude,
        claude_output = json(DEFAULT_CLAUDE_OUTPUT),
    )
}

/// JSON literal for a string or list of strings.
fn json<T: Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_default()
}

/// Write a starter ruleset to `path`.
///
/// An existing file is only replaced with `force`, and then only after
/// `confirm` agrees (skipped with `yes`).
pub fn init(
    app: &App,
    path: &Path,
    opts: &InitOptions,
    confirm: &mut dyn FnMut(&str) -> bool,
) -> Result<InitReport> {
    let content = render_starter(opts);
    ruleset::parse(&content, path, &app.validator)
        .context("Generated ruleset does not validate")?;

    let exists = path.exists();
    if exists && !opts.force {
        bail!(
            "{} already exists (use --force to overwrite)",
            path.display()
        );
    }

    let report = |written| InitReport {
        path: path.to_path_buf(),
        written,
        overwritten: written && exists,
        dry_run: opts.dry_run,
        content: content.clone(),
    };

    if opts.dry_run {
        return Ok(report(false));
    }

    if exists && !opts.yes && !confirm(&format!("Overwrite {}?", path.display())) {
        return Ok(report(false));
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    tracing::info!("wrote {}", path.display());

    Ok(report(true))
}
