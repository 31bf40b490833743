//! Partial-update merging.
//!
//! A patch replaces whole top-level fields of the stored graph. Arrays such
//! as `nodes` and `edges` are replaced wholesale, never merged per element.
//! The merged value goes back through validation, and metrics are then
//! derived from the merged document, never from the raw patch.

use serde_json::{Map, Value};

use crate::model::{Graph, GraphDocument};
use crate::validate::{parse_graph, ValidationError};

/// Fields owned by the server; a patch cannot overwrite them.
pub const SERVER_OWNED_FIELDS: [&str; 4] = ["_id", "createdAt", "updatedAt", "metrics"];

/// Overlay `patch` on the wire form of `current`.
pub fn merge_patch(current: &Graph, patch: &Map<String, Value>) -> Result<Value, serde_json::Error> {
    let mut merged = serde_json::to_value(current)?;
    if let Value::Object(fields) = &mut merged {
        for (key, value) in patch {
            if SERVER_OWNED_FIELDS.contains(&key.as_str()) {
                continue;
            }
            fields.insert(key.clone(), value.clone());
        }
    }
    Ok(merged)
}

/// Merge `patch` into `current` and validate the result.
pub fn apply_patch(current: &Graph, patch: &Value) -> Result<GraphDocument, ValidationError> {
    let Value::Object(fields) = patch else {
        return Err(ValidationError::single("update body must be a JSON object"));
    };
    let merged = merge_patch(current, fields)
        .map_err(|e| ValidationError::single(format!("cannot merge update: {e}")))?;
    parse_graph(merged)
}
