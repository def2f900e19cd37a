//! Layer merging for project configuration
//!
//! Each layer is folded into the accumulated settings in place. Tables merge
//! key by key; arrays and scalars from the later layer replace the earlier
//! value, so `source_patterns = ["*.cc"]` replaces the default pattern list
//! instead of extending it.

use serde_json::Value;

/// Fold `layer` into `settings`.
pub fn deep_merge(settings: &mut Value, layer: Value) {
    match (settings, layer) {
        (Value::Object(table), Value::Object(entries)) => {
            for (key, value) in entries {
                match table.get_mut(&key) {
                    Some(existing) => deep_merge(existing, value),
                    None => {
                        table.insert(key, value);
                    }
                }
            }
        }
        (slot, value) => *slot = value,
    }
}

/// Fold layers in order: built-in defaults, project file, CLI flags.
pub fn merge_layers(layers: impl IntoIterator<Item = Value>) -> Value {
    let mut settings = Value::Null;
    for layer in layers {
        deep_merge(&mut settings, layer);
    }
    settings
}
