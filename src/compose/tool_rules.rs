/// First line of every composed document. Fragments each start with their own
/// top-level heading, so MD025 (single H1) is disabled for the file.
pub const LINT_HEADER: &str = "<!-- markdownlint-disable MD025 -->";

/// Instructions for agents about the composed file itself.
pub const TOOL_RULES: &str = "\
# Tool Rules (compose-agentsmd)

- This file is generated by `compose-agentsmd` from modular rule fragments. Do not edit it by hand; \
changes are overwritten by the next compose.
- Project-specific selection lives in `agent-ruleset.json` (`source`, `global`, `domains`, `extra`, \
`output`). Edit it and run `compose-agentsmd` to regenerate this file.
- To change shared rules, run `compose-agentsmd edit-rules`, edit the fragments in the printed \
workspace, then run `compose-agentsmd apply-rules` to publish them and regenerate this file.
- Each section below starts with a `Source:` line naming the fragment it came from. Cite that \
fragment when a rule needs to change.
- After this file is regenerated, re-read it before continuing work.
";
