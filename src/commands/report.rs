//! Human-readable and JSON rendering of command results.

use std::path::Path;

use serde::Serialize;

use super::{ApplyReport, EditReport, InitReport};
use crate::compose::{ComposeReport, FileOutcome};

/// How results are printed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OutputMode {
    pub quiet: bool,
    pub json: bool,
    pub verbose: bool,
}

impl OutputMode {
    /// Print a report to stdout. JSON wins over `quiet`.
    pub fn print<T: Serialize>(&self, report: &T, text: impl FnOnce() -> String) {
        if self.json {
            match serde_json::to_string_pretty(report) {
                Ok(json) => println!("{}", json),
                Err(e) => tracing::error!("Failed to serialize report: {}", e),
            }
        } else if !self.quiet {
            print!("{}", text());
        }
    }
}

fn file_line(outcome: &FileOutcome, dry_run: bool) -> String {
    let path = outcome.path.display();
    match (dry_run, outcome.changed) {
        (true, true) => format!("Would write {}\n", path),
        (true, false) => format!("{} is up to date\n", path),
        (false, true) => format!("Wrote {}\n", path),
        (false, false) => format!("{} unchanged\n", path),
    }
}

pub fn format_compose(report: &ComposeReport, verbose: bool) -> String {
    let mut out = String::new();
    if verbose {
        out.push_str(&format!("Ruleset: {}\n", report.ruleset.display()));
        for section in &report.rules {
            out.push_str(&format!("  {}\n", section.source));
        }
    }
    out.push_str(&format!(
        "Composed {} rule file(s)\n",
        report.rules.len()
    ));
    out.push_str(&file_line(&report.output, report.dry_run));
    if let Some(companion) = &report.companion {
        out.push_str(&file_line(companion, report.dry_run));
    }
    out
}

pub fn format_init(report: &InitReport) -> String {
    if report.dry_run {
        return format!("Would write {}:\n{}", report.path.display(), report.content);
    }
    if report.written {
        let verb = if report.overwritten { "Overwrote" } else { "Created" };
        format!("{} {}\n", verb, report.path.display())
    } else {
        format!("Kept existing {}\n", report.path.display())
    }
}

pub fn format_edit(report: &EditReport) -> String {
    let dir = report.workspace.display();
    let mut out = if report.cloned && report.dry_run {
        format!("Would clone {} into {}\n", report.source, dir)
    } else if report.cloned {
        format!("Cloned {} into {}\n", report.source, dir)
    } else {
        format!("Edit rules in {}\n", dir)
    };
    out.push_str("Run `compose-agentsmd apply-rules` when done.\n");
    out
}

pub fn format_apply(report: &ApplyReport, verbose: bool) -> String {
    let mut out = String::new();
    if let Some(dir) = &report.workspace {
        out.push_str(&pending_line(dir, report));
        if verbose {
            for line in &report.pending {
                out.push_str(&format!("  {}\n", line));
            }
        }
    }
    out.push_str(&format_compose(&report.compose, verbose));
    out
}

fn pending_line(dir: &Path, report: &ApplyReport) -> String {
    if report.pending.is_empty() {
        format!("No pending changes in {}\n", dir.display())
    } else if report.published {
        format!("Published {} change(s) from {}\n", report.pending.len(), dir.display())
    } else {
        format!("{} pending change(s) in {}\n", report.pending.len(), dir.display())
    }
}
