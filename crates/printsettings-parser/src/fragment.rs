use printsettings_core::{AppenderError, Fragment, Result};
use serde_json::Value;
use std::path::Path;

/// Read and parse one fragment file.
pub fn load_fragment(path: &Path, plugin: &str) -> Result<Fragment> {
    let content = std::fs::read_to_string(path).map_err(|source| AppenderError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;
    parse_fragment(path, plugin, &content)
}

/// Parse fragment text; the document must be a JSON object of categories.
pub fn parse_fragment(path: &Path, plugin: &str, content: &str) -> Result<Fragment> {
    let value: Value = serde_json::from_str(content).map_err(|source| AppenderError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    match value {
        Value::Object(categories) => Ok(Fragment::new(path.to_path_buf(), plugin, categories)),
        other => Err(AppenderError::InvalidFragment {
            path: path.to_path_buf(),
            reason: format!("expected an object of categories, found {}", json_kind(&other)),
        }),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
