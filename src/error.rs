//! Error type shared by every stage of a compose run.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ComposeError>;

/// A single schema violation, addressed by JSON pointer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaViolation {
    /// JSON pointer into the ruleset (`/` for the document root).
    pub pointer: String,
    pub message: String,
}

impl fmt::Display for SchemaViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.pointer, self.message)
    }
}

#[derive(Debug, Error)]
pub enum ComposeError {
    #[error("Ruleset not found: {}", .0.display())]
    RulesetNotFound(PathBuf),

    #[error("Invalid JSON in {}: {message}", .path.display())]
    InvalidJson { path: PathBuf, message: String },

    #[error("Invalid ruleset {}:\n{}", .path.display(), format_violations(.violations))]
    Schema {
        path: PathBuf,
        violations: Vec<SchemaViolation>,
    },

    #[error("Cannot resolve source: {0}")]
    SourceUnresolvable(String),

    #[error("git {} failed ({status}): {stderr}", .args.join(" "))]
    Git {
        args: Vec<String>,
        status: String,
        stderr: String,
    },

    #[error("Could not determine the {kind} directory (set {env})")]
    NoCacheDir {
        kind: &'static str,
        env: &'static str,
    },

    #[error("Not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ComposeError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

fn format_violations(violations: &[SchemaViolation]) -> String {
    violations
        .iter()
        .map(|v| format!("  - {}", v))
        .collect::<Vec<_>>()
        .join("\n")
}
