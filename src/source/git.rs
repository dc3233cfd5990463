//! Thin wrapper over the system `git` binary.

use std::path::Path;
use std::process::Command;

use crate::error::{ComposeError, Result};

/// Runs git commands. Implemented by [`SystemGit`] and by test fakes.
pub trait Git {
    /// Run `git <args>` in `cwd` (or the current directory) and return stdout.
    fn run(&self, args: &[&str], cwd: Option<&Path>) -> Result<String>;
}

/// The `git` executable on `PATH`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemGit;

impl Git for SystemGit {
    fn run(&self, args: &[&str], cwd: Option<&Path>) -> Result<String> {
        tracing::debug!("git {}", args.join(" "));

        let mut cmd = Command::new("git");
        cmd.args(args);
        if let Some(dir) = cwd {
            cmd.current_dir(dir);
        }

        let output = cmd.output().map_err(|e| ComposeError::Git {
            args: to_owned(args),
            status: "not started".to_string(),
            stderr: e.to_string(),
        })?;

        if !output.status.success() {
            return Err(ComposeError::Git {
                args: to_owned(args),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

fn to_owned(args: &[&str]) -> Vec<String> {
    args.iter().map(|a| a.to_string()).collect()
}

/// One line of `git ls-remote` output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteRef {
    pub hash: String,
    pub name: String,
}

/// Parse `git ls-remote` output (`<hash>\t<refname>` per line).
pub fn parse_ls_remote(output: &str) -> Vec<RemoteRef> {
    output
        .lines()
        .filter_map(|line| {
            let (hash, name) = line.split_once('\t')?;
            let hash = hash.trim();
            let name = name.trim();
            if hash.is_empty() || name.is_empty() {
                return None;
            }
            Some(RemoteRef {
                hash: hash.to_string(),
                name: name.to_string(),
            })
        })
        .collect()
}
