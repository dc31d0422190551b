//! Config validation - warns about unknown fields

use serde_json::Value;
use std::collections::{HashMap, HashSet};
use tracing::warn;

/// Validate JSON config and warn about unknown fields.
pub fn warn_unknown_fields(content: &str, config_name: &str) {
    for path in unknown_fields(content) {
        warn!("Unknown config field in {config_name}: {path}");
    }
}

/// Paths like "scan.unknownField" for keys the config does not define.
fn unknown_fields(content: &str) -> Vec<String> {
    let Ok(value) = serde_json::from_str::<Value>(content) else {
        return Vec::new();
    };

    find_unknown_keys(&value, &expected_config_keys(), "")
}

fn find_unknown_keys(value: &Value, expected: &ExpectedKeys, prefix: &str) -> Vec<String> {
    let mut unknowns = Vec::new();

    let Value::Object(obj) = value else {
        return unknowns;
    };

    for (key, child) in obj {
        let path = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}.{key}")
        };

        if let Some(nested) = expected.nested.get(key.as_str()) {
            unknowns.extend(find_unknown_keys(child, nested, &path));
        } else if !expected.fields.contains(key.as_str()) {
            unknowns.push(path);
        }
    }

    unknowns
}

/// Expected keys for a config section.
/// `fields` are leaf fields, `nested` are nested objects with their own expected keys.
struct ExpectedKeys {
    fields: HashSet<&'static str>,
    nested: HashMap<&'static str, ExpectedKeys>,
}

impl ExpectedKeys {
    fn new(fields: &[&'static str]) -> Self {
        Self {
            fields: fields.iter().copied().collect(),
            nested: HashMap::new(),
        }
    }

    fn with_nested(mut self, key: &'static str, nested: ExpectedKeys) -> Self {
        self.nested.insert(key, nested);
        self
    }
}

/// Expected keys for `Config` (settings.rs)
fn expected_config_keys() -> ExpectedKeys {
    let target_keys = ExpectedKeys::new(&["namePattern", "commandKeywords", "matchMode"]);

    let scan_keys = ExpectedKeys::new(&[
        "idleIntervalMs",
        "activeIntervalMs",
        "resolveDeadlineMs",
        "resolvePollMs",
        "sentinelTitle",
    ]);

    let launch_keys = ExpectedKeys::new(&[
        "program",
        "args",
        "workingDir",
        "scriptDir",
        "totalSteps",
        "durationMs",
        "spawnThreshold",
        "closeOnComplete",
    ]);

    ExpectedKeys::new(&["startupCheck"])
        .with_nested("target", target_keys)
        .with_nested("scan", scan_keys)
        .with_nested("launch", launch_keys)
}
