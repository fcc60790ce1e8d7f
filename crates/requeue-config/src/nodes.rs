// Helper functions for extracting values from KDL nodes

use kdl::{KdlNode, KdlValue};

use crate::{ConfigError, ConfigResult};

pub(crate) fn first_string_arg(node: &KdlNode) -> Option<String> {
    node.entries()
        .iter()
        .find(|e| e.name().is_none())
        .and_then(|e| e.value().as_string())
        .map(|s| s.to_string())
}

pub(crate) fn first_arg(node: &KdlNode) -> Option<&KdlValue> {
    node.entries()
        .iter()
        .find(|e| e.name().is_none())
        .map(|e| e.value())
}

pub(crate) fn all_string_args(node: &KdlNode) -> Vec<String> {
    node.entries()
        .iter()
        .filter(|e| e.name().is_none())
        .filter_map(|e| e.value().as_string())
        .map(|s| s.to_string())
        .collect()
}

pub(crate) fn string_prop(node: &KdlNode, name: &str) -> Option<String> {
    node.get(name)
        .and_then(|v| v.as_string())
        .map(|s| s.to_string())
}

/// Accepts `#true`/`#false` as well as the strings "true"/"false".
pub(crate) fn bool_value(value: &KdlValue, field: &str) -> ConfigResult<bool> {
    if let Some(b) = value.as_bool() {
        return Ok(b);
    }
    match value.as_string() {
        Some("true") => Ok(true),
        Some("false") => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            field: field.to_string(),
            message: format!("expected a boolean, got {}", value),
        }),
    }
}

pub(crate) fn u64_value(value: &KdlValue, field: &str) -> ConfigResult<u64> {
    value
        .as_integer()
        .and_then(|i| u64::try_from(i).ok())
        .ok_or_else(|| ConfigError::InvalidValue {
            field: field.to_string(),
            message: format!("expected a non-negative integer, got {}", value),
        })
}

pub(crate) fn string_list_prop(node: &KdlNode, name: &str) -> Vec<String> {
    let mut result = Vec::new();

    // Repeated attributes like needs="a" needs="b"
    for entry in node.entries() {
        if let Some(entry_name) = entry.name() {
            if entry_name.value() == name {
                if let Some(s) = entry.value().as_string() {
                    result.push(s.to_string());
                }
            }
        }
    }

    if !result.is_empty() {
        return result;
    }

    // Block syntax: `needs "a" "b"` as a child node
    if let Some(children) = node.children() {
        for child in children.nodes() {
            if child.name().value() == name {
                return all_string_args(child);
            }
        }
    }

    Vec::new()
}
