//! Conversions from file metadata into [`gtmpl::Value`]s for templating.

use crate::file::{File, Metadata};
use gtmpl::Value;
use serde_yaml::Value as Yaml;
use std::collections::HashMap;

/// Converts a YAML metadata value into a template value. Mapping keys that
/// aren't strings are rendered as YAML text.
pub fn from_yaml(yaml: &Yaml) -> Value {
    match yaml {
        Yaml::Null => Value::Nil,
        Yaml::Bool(b) => Value::Bool(*b),
        Yaml::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::from(i)
            } else if let Some(u) = n.as_u64() {
                Value::from(u)
            } else {
                Value::from(n.as_f64().unwrap_or(f64::NAN))
            }
        }
        Yaml::String(s) => Value::String(s.clone()),
        Yaml::Sequence(items) => Value::Array(items.iter().map(from_yaml).collect()),
        Yaml::Mapping(m) => Value::Object(
            m.iter()
                .map(|(k, v)| (key_text(k), from_yaml(v)))
                .collect(),
        ),
        Yaml::Tagged(tagged) => from_yaml(&tagged.value),
    }
}

fn key_text(key: &Yaml) -> String {
    match key {
        Yaml::String(s) => s.clone(),
        other => serde_yaml::to_string(other)
            .map(|s| s.trim_end().to_owned())
            .unwrap_or_default(),
    }
}

/// Converts a metadata map into a template object.
pub fn from_metadata(metadata: &Metadata) -> HashMap<String, Value> {
    metadata
        .iter()
        .map(|(k, v)| (k.clone(), from_yaml(v)))
        .collect()
}

/// Converts a [`File`] into a template object holding its metadata plus its
/// contents (as text) under `contents`.
pub fn from_file(file: &File) -> Value {
    let mut m = from_metadata(&file.metadata);
    m.insert("contents".to_owned(), Value::String(file.text().into_owned()));
    Value::Object(m)
}
