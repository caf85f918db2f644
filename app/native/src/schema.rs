//! JSON Schema generation for the Aegis configuration file.

use crate::config::AegisConfig;

/// Published location of the schema, referenced from user config files.
pub const SCHEMA_ID: &str =
    "https://raw.githubusercontent.com/aegis-bar/aegis/main/aegis.schema.json";

/// Generates a JSON Schema for the Aegis configuration.
///
/// The schema includes all configuration options with their types,
/// descriptions, and default values.
#[must_use]
pub fn generate_schema() -> schemars::Schema {
    let mut schema = schemars::schema_for!(AegisConfig);

    if let Some(obj) = schema.as_object_mut() {
        obj.insert("$id".to_string(), serde_json::json!(SCHEMA_ID));
    }

    schema
}

/// Returns the schema as a pretty-printed JSON string.
#[must_use]
pub fn print_schema() -> String {
    serde_json::to_string_pretty(&generate_schema()).unwrap_or_default()
}
