//! Conversions between DynamoDB attribute maps and string attributes.
//!
//! Pure functions, testable without DynamoDB access.

use aws_sdk_dynamodb::types::AttributeValue;
use std::collections::HashMap;
use tracing::{debug, warn};

use super::{Attribute, ReplaceableAttribute, SelectedItem};

/// Renders a stored value as a string, if it has a string form.
pub(super) fn value_to_string(value: &AttributeValue) -> Option<String> {
    match value {
        AttributeValue::S(s) => Some(s.clone()),
        AttributeValue::N(n) => Some(n.clone()),
        AttributeValue::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Converts a raw item into attributes, dropping the key attribute.
pub(super) fn item_to_attributes(
    item: HashMap<String, AttributeValue>,
    key_attribute: &str,
) -> Vec<Attribute> {
    item.into_iter()
        .filter(|(name, _)| name != key_attribute)
        .filter_map(|(name, value)| match value_to_string(&value) {
            Some(value) => Some(Attribute { name, value }),
            None => {
                warn!("Skipping attribute '{name}' with non-scalar value");
                None
            }
        })
        .collect()
}

/// Whether a stored row holds nothing but its key.
pub(super) fn is_key_only(
    item: &HashMap<String, AttributeValue>,
    key_attribute: &str,
) -> bool {
    item.keys().all(|name| name == key_attribute)
}

/// Converts a listing row.
///
/// Rows without a string key are skipped, and so are rows left with no
/// attributes besides the key: those count as nonexistent.
pub(super) fn item_to_selected(
    mut item: HashMap<String, AttributeValue>,
    key_attribute: &str,
) -> Option<SelectedItem> {
    let name = match item.remove(key_attribute) {
        Some(AttributeValue::S(name)) => name,
        _ => {
            warn!("Skipping selected row without a '{key_attribute}' key");
            return None;
        }
    };
    let attributes = item_to_attributes(item, key_attribute);
    if attributes.is_empty() {
        debug!("Skipping selected row '{name}' without attributes");
        return None;
    }
    Some(SelectedItem { name, attributes })
}

/// `SET` clause with placeholders for a batch of attribute writes.
#[derive(Debug, Default)]
pub(super) struct UpdateParts {
    pub expression: String,
    pub names: HashMap<String, String>,
    pub values: HashMap<String, AttributeValue>,
}

/// Later writes to the same attribute win; each attribute gets one clause.
pub(super) fn set_expression(attributes: Vec<ReplaceableAttribute>) -> UpdateParts {
    let mut parts = UpdateParts::default();

    let mut positions: HashMap<String, usize> = HashMap::new();
    let mut writes: Vec<ReplaceableAttribute> = Vec::with_capacity(attributes.len());
    for attr in attributes {
        match positions.get(&attr.name) {
            Some(&at) => writes[at] = attr,
            None => {
                positions.insert(attr.name.clone(), writes.len());
                writes.push(attr);
            }
        }
    }

    let mut clauses = Vec::with_capacity(writes.len());
    for (i, attr) in writes.into_iter().enumerate() {
        let placeholder = format!("#attr{}", i);
        let value_placeholder = format!(":val{}", i);

        clauses.push(if attr.replace {
            format!("{} = {}", placeholder, value_placeholder)
        } else {
            format!(
                "{} = if_not_exists({}, {})",
                placeholder, placeholder, value_placeholder
            )
        });

        parts.names.insert(placeholder, attr.name);
        parts
            .values
            .insert(value_placeholder, AttributeValue::S(attr.value));
    }

    parts.expression = format!("SET {}", clauses.join(", "));
    parts
}

/// `REMOVE` clause for the named attributes. The key placeholder is `#key`.
pub(super) fn remove_expression(names: Vec<String>, key_attribute: &str) -> UpdateParts {
    let mut parts = UpdateParts::default();
    let mut placeholders = Vec::with_capacity(names.len());

    for (i, name) in names.into_iter().enumerate() {
        let placeholder = format!("#attr{}", i);
        placeholders.push(placeholder.clone());
        parts.names.insert(placeholder, name);
    }
    parts
        .names
        .insert("#key".to_string(), key_attribute.to_string());

    parts.expression = format!("REMOVE {}", placeholders.join(", "));
    parts
}
