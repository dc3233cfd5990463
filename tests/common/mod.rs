//! Shared helpers for the integration specs.
#![allow(dead_code)]

use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use compose_agentsmd::commands::App;
use compose_agentsmd::source::{CacheConfig, Git};
use compose_agentsmd::{ComposeError, Result};

/// In-memory stand-in for the `git` binary.
///
/// `ls-remote` answers from canned listings, `clone --branch` only succeeds for
/// refs present in those listings, and successful clones/fetches materialize
/// `files` in the target directory.
#[derive(Clone, Default)]
pub struct FakeGit {
    pub tags: String,
    pub heads: String,
    pub head: String,
    pub status: String,
    pub files: Vec<(String, String)>,
    pub fail_fetch: bool,
    pub calls: Rc<RefCell<Vec<Vec<String>>>>,
}

impl FakeGit {
    pub fn with_files(files: &[(&str, &str)]) -> Self {
        Self {
            files: files
                .iter()
                .map(|(p, c)| (p.to_string(), c.to_string()))
                .collect(),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<Vec<String>> {
        self.calls.borrow().clone()
    }

    /// Calls whose first argument is `cmd`.
    pub fn calls_to(&self, cmd: &str) -> Vec<Vec<String>> {
        self.calls()
            .into_iter()
            .filter(|c| c.first().map(String::as_str) == Some(cmd))
            .collect()
    }

    fn knows_ref(&self, name: &str) -> bool {
        let tag = format!("refs/tags/{}", name);
        let head = format!("refs/heads/{}", name);
        self.tags
            .lines()
            .chain(self.heads.lines())
            .filter_map(|l| l.split_once('\t'))
            .any(|(_, r)| r == tag || r == head)
    }

    fn materialize(&self, dir: &Path) {
        for (rel, content) in &self.files {
            let path = dir.join(rel);
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(path, content).unwrap();
        }
    }

    fn fail(args: &[&str]) -> ComposeError {
        ComposeError::Git {
            args: args.iter().map(|a| a.to_string()).collect(),
            status: "exit status: 128".to_string(),
            stderr: "fatal: simulated failure".to_string(),
        }
    }
}

impl Git for FakeGit {
    fn run(&self, args: &[&str], cwd: Option<&Path>) -> Result<String> {
        self.calls
            .borrow_mut()
            .push(args.iter().map(|a| a.to_string()).collect());

        match args.first().copied() {
            Some("ls-remote") => {
                if args.contains(&"HEAD") {
                    Ok(self.head.clone())
                } else if args.contains(&"--heads") {
                    Ok(format!("{}{}", self.tags, self.heads))
                } else {
                    Ok(self.tags.clone())
                }
            }
            Some("clone") => {
                let dir = PathBuf::from(args[args.len() - 1]);
                if let Some(i) = args.iter().position(|a| *a == "--branch") {
                    if !self.knows_ref(args[i + 1]) {
                        return Err(Self::fail(args));
                    }
                }
                self.materialize(&dir);
                Ok(String::new())
            }
            Some("fetch") => {
                if self.fail_fetch {
                    return Err(Self::fail(args));
                }
                self.materialize(cwd.expect("fetch runs inside the checkout"));
                Ok(String::new())
            }
            Some("status") => Ok(self.status.clone()),
            _ => Ok(String::new()),
        }
    }
}

/// A temporary project with its own cache and workspace directories.
pub struct Project {
    _tmp: tempfile::TempDir,
    pub root: PathBuf,
    pub cache: CacheConfig,
}

impl Project {
    pub fn new() -> Self {
        let tmp = tempfile::tempdir().expect("Failed to create temp dir");
        let base = tmp.path().canonicalize().unwrap();
        let root = base.join("project");
        std::fs::create_dir_all(&root).unwrap();
        Self {
            cache: CacheConfig {
                cache_root: base.join("cache"),
                workspace_root: base.join("workspaces"),
            },
            root,
            _tmp: tmp,
        }
    }

    pub fn write(&self, rel: &str, content: &str) -> PathBuf {
        let path = self.root.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, content).unwrap();
        path
    }

    pub fn read(&self, rel: &str) -> String {
        std::fs::read_to_string(self.root.join(rel)).expect("Failed to read output")
    }

    pub fn exists(&self, rel: &str) -> bool {
        self.root.join(rel).exists()
    }

    pub fn ruleset_path(&self) -> PathBuf {
        self.root.join("agent-ruleset.json")
    }

    pub fn app(&self, git: FakeGit) -> App {
        App::with_cache(self.cache.clone(), Box::new(git)).expect("Failed to build app")
    }
}
