use jsonschema::{Draft, Validator};
use serde_json::Value;

use crate::error::SchemaViolation;

/// The ruleset schema, also shipped next to the crate for editor support.
pub const RULESET_SCHEMA: &str = include_str!("../../schema/agent-ruleset.schema.json");

/// Compiled ruleset schema.
///
/// Build one per process and pass it to [`super::load`].
pub struct SchemaValidator {
    validator: Validator,
}

impl SchemaValidator {
    pub fn new() -> anyhow::Result<Self> {
        let schema: Value = serde_json::from_str(RULESET_SCHEMA)?;
        let validator = jsonschema::options()
            .with_draft(Draft::Draft202012)
            .build(&schema)
            .map_err(|e| anyhow::anyhow!("Failed to compile ruleset schema: {}", e))?;
        Ok(Self { validator })
    }

    /// Every violation in `doc`, in the order the validator reports them.
    pub fn violations(&self, doc: &Value) -> Vec<SchemaViolation> {
        self.validator
            .iter_errors(doc)
            .map(|err| {
                let pointer = err.instance_path.to_string();
                SchemaViolation {
                    pointer: if pointer.is_empty() {
                        "/".to_string()
                    } else {
                        pointer
                    },
                    message: err.to_string(),
                }
            })
            .collect()
    }
}
