//! Markdown discovery and the ordered, de-duplicated rule list.

use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};

use crate::error::{ComposeError, Result};

/// All `.md` files under `dir`, sorted by their `/`-joined relative path.
pub fn collect_markdown(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(ComposeError::NotFound(dir.to_path_buf()));
    }

    let mut found: Vec<(String, PathBuf)> = Vec::new();
    let mut stack = vec![dir.to_path_buf()];

    while let Some(current) = stack.pop() {
        let entries = std::fs::read_dir(&current).map_err(|e| ComposeError::io(&current, e))?;
        for entry in entries {
            let entry = entry.map_err(|e| ComposeError::io(&current, e))?;
            let path = entry.path();
            if path.is_dir() {
                stack.push(path);
            } else if is_markdown(&path) {
                let rel = to_posix(path.strip_prefix(dir).unwrap_or(&path));
                found.push((rel, path));
            }
        }
    }

    found.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(found.into_iter().map(|(_, path)| path).collect())
}

fn is_markdown(path: &Path) -> bool {
    path.is_file()
        && path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("md"))
}

/// Rule files in inclusion order. A file reachable through two routes is kept
/// at its first position only.
#[derive(Debug, Default)]
pub struct RuleList {
    files: Vec<PathBuf>,
    seen: HashSet<PathBuf>,
}

impl RuleList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file. Returns `false` if it was already included.
    pub fn push(&mut self, path: &Path) -> Result<bool> {
        let canonical = path
            .canonicalize()
            .map_err(|_| ComposeError::NotFound(path.to_path_buf()))?;
        if !self.seen.insert(canonical.clone()) {
            tracing::debug!("skipping duplicate {}", canonical.display());
            return Ok(false);
        }
        self.files.push(canonical);
        Ok(true)
    }

    pub fn extend(&mut self, paths: &[PathBuf]) -> Result<()> {
        for path in paths {
            self.push(path)?;
        }
        Ok(())
    }

    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    pub fn into_files(self) -> Vec<PathBuf> {
        self.files
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// `path` with `/` separators.
pub fn to_posix(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Resolve `.` and `..` components without touching the filesystem.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => out.push(".."),
            },
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// `target` relative to the directory `base`, using `..` where needed.
/// Both paths are expected to be absolute.
pub fn relative_path(base: &Path, target: &Path) -> PathBuf {
    let base: Vec<Component> = base.components().collect();
    let target: Vec<Component> = target.components().collect();

    let common = base
        .iter()
        .zip(&target)
        .take_while(|(a, b)| a == b)
        .count();

    let mut rel = PathBuf::new();
    for _ in common..base.len() {
        rel.push("..");
    }
    for part in &target[common..] {
        rel.push(part.as_os_str());
    }
    rel
}
