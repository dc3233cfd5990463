//! Project ruleset: which fragments to compose and where to write them.

mod jsonc;
mod schema;

pub use jsonc::strip_comments;
pub use schema::{SchemaValidator, RULESET_SCHEMA};

use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_json::Value;

use crate::collect::normalize;
use crate::error::{ComposeError, Result};

/// File name looked up in the project root when no ruleset path is given.
pub const DEFAULT_RULESET_NAME: &str = "agent-ruleset.json";
pub const DEFAULT_OUTPUT: &str = "AGENTS.md";
pub const DEFAULT_CLAUDE_OUTPUT: &str = "CLAUDE.md";

/// A validated ruleset with every optional field defaulted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectRuleset {
    /// `github:owner/repo@ref` or a local path.
    pub source: String,
    pub global: bool,
    pub domains: Vec<String>,
    pub extra: Vec<String>,
    pub output: String,
    pub claude: ClaudeSettings,
    /// Where the ruleset was read from.
    pub path: PathBuf,
    /// Directory containing the ruleset; relative paths resolve against it.
    pub root: PathBuf,
}

/// Companion file settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaudeSettings {
    pub enabled: bool,
    pub output: String,
}

impl Default for ClaudeSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            output: DEFAULT_CLAUDE_OUTPUT.to_string(),
        }
    }
}

/// On-disk shape. Only ever deserialized after schema validation.
#[derive(Debug, Deserialize)]
struct RulesetFile {
    source: String,
    global: Option<bool>,
    #[serde(default)]
    domains: Vec<String>,
    #[serde(default)]
    extra: Vec<String>,
    output: Option<String>,
    claude: Option<ClaudeFile>,
}

#[derive(Debug, Deserialize)]
struct ClaudeFile {
    enabled: Option<bool>,
    output: Option<String>,
}

impl ProjectRuleset {
    /// Output path with `.` and `..` resolved, so aliases compare equal.
    pub fn output_path(&self) -> PathBuf {
        normalize(&self.root.join(&self.output))
    }

    /// Companion path, if the companion file is enabled.
    pub fn companion_path(&self) -> Option<PathBuf> {
        self.claude
            .enabled
            .then(|| normalize(&self.root.join(&self.claude.output)))
    }
}

/// Pick the ruleset path: an explicit path wins, else `<root>/agent-ruleset.json`.
pub fn find(root: &Path, explicit: Option<&Path>) -> PathBuf {
    match explicit {
        Some(path) => path.to_path_buf(),
        None => root.join(DEFAULT_RULESET_NAME),
    }
}

/// Read, validate and default a ruleset.
pub fn load(path: &Path, validator: &SchemaValidator) -> Result<ProjectRuleset> {
    if !path.is_file() {
        return Err(ComposeError::RulesetNotFound(path.to_path_buf()));
    }
    let raw = std::fs::read_to_string(path).map_err(|e| ComposeError::io(path, e))?;
    parse(&raw, path, validator)
}

/// Parse ruleset text as if it had been read from `path`.
pub fn parse(raw: &str, path: &Path, validator: &SchemaValidator) -> Result<ProjectRuleset> {
    let doc: Value =
        serde_json::from_str(&strip_comments(raw)).map_err(|e| ComposeError::InvalidJson {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

    let violations = validator.violations(&doc);
    if !violations.is_empty() {
        return Err(ComposeError::Schema {
            path: path.to_path_buf(),
            violations,
        });
    }

    let file: RulesetFile =
        serde_json::from_value(doc).map_err(|e| ComposeError::InvalidJson {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

    let path = absolute(path)?;
    let root = path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));

    let defaults = ClaudeSettings::default();
    let claude = match file.claude {
        Some(c) => ClaudeSettings {
            enabled: c.enabled.unwrap_or(defaults.enabled),
            output: c.output.unwrap_or(defaults.output),
        },
        None => defaults,
    };

    tracing::debug!("Loaded ruleset {}", path.display());

    Ok(ProjectRuleset {
        source: file.source,
        global: file.global.unwrap_or(true),
        domains: file.domains,
        extra: file.extra,
        output: file.output.unwrap_or_else(|| DEFAULT_OUTPUT.to_string()),
        claude,
        path,
        root,
    })
}

/// Absolute form of `path`, canonical when the file exists.
fn absolute(path: &Path) -> Result<PathBuf> {
    if let Ok(canonical) = path.canonicalize() {
        return Ok(canonical);
    }
    let cwd = std::env::current_dir().map_err(|e| ComposeError::io(path, e))?;
    Ok(cwd.join(path))
}
