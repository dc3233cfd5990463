//! Builds the composed document and writes it with its companion file.

mod tool_rules;

pub use tool_rules::{LINT_HEADER, TOOL_RULES};

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::collect::{collect_markdown, relative_path, to_posix, RuleList};
use crate::error::{ComposeError, Result};
use crate::ruleset::ProjectRuleset;
use crate::source::{Origin, ResolvedSource};

const GLOBAL_DIR: &str = "global";
const DOMAINS_DIR: &str = "domains";

/// One rule fragment in output order.
#[derive(Debug, Clone, Serialize)]
pub struct Section {
    /// Attribution written on the `Source:` line.
    pub source: String,
    #[serde(skip)]
    pub path: PathBuf,
}

/// Outcome for one output file.
#[derive(Debug, Clone, Serialize)]
pub struct FileOutcome {
    pub path: PathBuf,
    /// Content differs from what is on disk (or the file is missing).
    pub changed: bool,
    /// The file was actually written.
    pub written: bool,
}

/// Result of a compose run, printed as text or JSON.
#[derive(Debug, Clone, Serialize)]
pub struct ComposeReport {
    pub ruleset: PathBuf,
    pub rules: Vec<Section>,
    pub output: FileOutcome,
    pub companion: Option<FileOutcome>,
    pub dry_run: bool,
}

/// Rule files in inclusion order: global, each domain, each extra entry.
pub fn collect_rules(ruleset: &ProjectRuleset, source: &ResolvedSource) -> Result<Vec<PathBuf>> {
    let mut list = RuleList::new();

    if ruleset.global {
        list.extend(&collect_markdown(&source.rules_root.join(GLOBAL_DIR))?)?;
    }

    for domain in &ruleset.domains {
        let dir = source.rules_root.join(DOMAINS_DIR).join(domain);
        list.extend(&collect_markdown(&dir)?)?;
    }

    for extra in &ruleset.extra {
        let path = ruleset.root.join(extra);
        if path.is_dir() {
            list.extend(&collect_markdown(&path)?)?;
        } else if path.is_file() {
            list.push(&path)?;
        } else {
            return Err(ComposeError::NotFound(path));
        }
    }

    Ok(list.into_files())
}

/// Attribution for a rule file: a `github:` reference for remote files,
/// otherwise the path relative to the project root.
pub fn describe(path: &Path, ruleset: &ProjectRuleset, source: &ResolvedSource) -> String {
    if let Origin::Github {
        source: gh,
        resolved,
        checkout,
    } = &source.origin
    {
        let checkout = checkout.canonicalize().unwrap_or_else(|_| checkout.clone());
        if let Ok(rel) = path.strip_prefix(&checkout) {
            return format!("{}/{}", gh.describe(resolved), to_posix(rel));
        }
    }
    to_posix(&relative_path(&ruleset.root, path))
}

/// Render the full document.
pub fn render(sections: &[(String, String)]) -> String {
    let mut parts = vec![LINT_HEADER.to_string(), TOOL_RULES.trim_end().to_string()];
    for (source, body) in sections {
        parts.push(format!("Source: {}\n\n{}", source, body.trim_end()));
    }
    let mut out = parts.join("\n\n");
    out.push('\n');
    out
}

/// Companion file content: an import of the primary output.
pub fn companion_content(companion: &Path, output: &Path) -> String {
    let dir = companion.parent().unwrap_or_else(|| Path::new(""));
    format!("@{}\n", to_posix(&relative_path(dir, output)))
}

/// Compose `ruleset` from an already resolved source. Nothing is written until
/// every fragment has been read, and nothing at all when `dry_run` is set.
pub fn compose(
    ruleset: &ProjectRuleset,
    source: &ResolvedSource,
    dry_run: bool,
) -> Result<ComposeReport> {
    let files = collect_rules(ruleset, source)?;

    let mut sections = Vec::with_capacity(files.len());
    let mut bodies = Vec::with_capacity(files.len());
    for path in files {
        let body = std::fs::read_to_string(&path).map_err(|e| ComposeError::io(&path, e))?;
        let desc = describe(&path, ruleset, source);
        bodies.push((desc.clone(), body));
        sections.push(Section { source: desc, path });
    }
    let content = render(&bodies);

    let output_path = ruleset.output_path();
    let companion = match ruleset.companion_path() {
        Some(path) if path == output_path => {
            tracing::debug!("companion path equals output, skipping");
            None
        }
        Some(path) => {
            let text = companion_content(&path, &output_path);
            Some((path, text))
        }
        None => None,
    };

    if !dry_run {
        create_parent(&output_path)?;
        if let Some((path, _)) = &companion {
            create_parent(path)?;
        }
    }

    let output = write_file(&output_path, &content, dry_run)?;
    let companion = companion
        .map(|(path, text)| write_file(&path, &text, dry_run))
        .transpose()?;

    Ok(ComposeReport {
        ruleset: ruleset.path.clone(),
        rules: sections,
        output,
        companion,
        dry_run,
    })
}

fn create_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| ComposeError::io(parent, e))?;
    }
    Ok(())
}

fn write_file(path: &Path, content: &str, dry_run: bool) -> Result<FileOutcome> {
    let changed = match std::fs::read_to_string(path) {
        Ok(existing) => existing != content,
        Err(_) => true,
    };

    if dry_run {
        return Ok(FileOutcome {
            path: path.to_path_buf(),
            changed,
            written: false,
        });
    }

    std::fs::write(path, content).map_err(|e| ComposeError::io(path, e))?;
    tracing::info!("wrote {}", path.display());

    Ok(FileOutcome {
        path: path.to_path_buf(),
        changed,
        written: true,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_places_header_tool_rules_then_sections() {
        let doc = render(&[
            ("rules/global/a.md".into(), "# A\n\n".into()),
            ("rules/domains/node/b.md".into(), "B  \n".into()),
        ]);
        let expected = format!(
            "{}\n\n{}\n\nSource: rules/global/a.md\n\n# A\n\nSource: rules/domains/node/b.md\n\nB\n",
            LINT_HEADER,
            TOOL_RULES.trim_end()
        );
        assert_eq!(doc, expected);
    }

    #[test]
    fn render_without_sections() {
        let doc = render(&[]);
        assert!(doc.starts_with(LINT_HEADER));
        assert!(doc.ends_with(&format!("{}\n", TOOL_RULES.trim_end())));
    }

    #[test]
    fn companion_points_at_output() {
        assert_eq!(
            companion_content(Path::new("/p/CLAUDE.md"), Path::new("/p/AGENTS.md")),
            "@AGENTS.md\n"
        );
        assert_eq!(
            companion_content(Path::new("/p/.claude/CLAUDE.md"), Path::new("/p/AGENTS.md")),
            "@../AGENTS.md\n"
        );
    }
}
