//! Shape check applied to every provider response before it is accepted.
//!
//! Only the top level is inspected: `roles` and `database_schema` must be
//! arrays, but their entries are taken as-is.

use serde_json::Value;
use thiserror::Error;

use crate::models::ArchitectureBlueprint;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SchemaError {
    #[error("response is not a JSON object")]
    NotAnObject,
    #[error("missing or invalid {0}")]
    InvalidField(&'static str),
    #[error("blueprint could not be converted: {0}")]
    Malformed(String),
}

const ARRAY_FIELDS: [&str; 4] = ["mvp_features", "future_features", "roles", "database_schema"];

/// Returns `Ok(())` when `value` has the blueprint's top-level shape.
pub fn check_shape(value: &Value) -> Result<(), SchemaError> {
    let obj = value.as_object().ok_or(SchemaError::NotAnObject)?;

    match obj.get("project_summary").and_then(Value::as_str) {
        Some(s) if !s.is_empty() => {}
        _ => return Err(SchemaError::InvalidField("project_summary")),
    }

    for field in ARRAY_FIELDS {
        if !obj.get(field).is_some_and(Value::is_array) {
            return Err(SchemaError::InvalidField(field));
        }
    }

    let folders = obj.get("folder_structure").and_then(Value::as_object);
    let folders_ok = folders.is_some_and(|f| {
        f.get("frontend").is_some_and(Value::is_array) && f.get("backend").is_some_and(Value::is_array)
    });
    if !folders_ok {
        return Err(SchemaError::InvalidField("folder_structure"));
    }

    Ok(())
}

/// Shape check followed by conversion into the typed blueprint. Nothing
/// partially valid gets through: any failure rejects the whole value.
pub fn validate_blueprint(value: Value) -> Result<ArchitectureBlueprint, SchemaError> {
    check_shape(&value)?;
    serde_json::from_value(value).map_err(|e| SchemaError::Malformed(e.to_string()))
}
