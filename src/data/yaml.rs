//! YAML rendering of reports.
//!
//! Commit messages are often multi-line, so terminal output goes through the
//! yaml-rust emitter with block scalars enabled. Saved report files use
//! `serde_yaml` directly, whose quoting keeps messages byte-for-byte.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{de::DeserializeOwned, Serialize};
use yaml_rust_davvid::{Yaml, YamlEmitter};

/// Renders `data` as YAML with multi-line strings as block scalars.
pub fn to_yaml<T: Serialize>(data: &T) -> Result<String> {
    let value = serde_yaml::to_value(data).context("Failed to serialize report")?;
    let yaml = to_emitter_value(&value);

    let mut output = String::new();
    let mut emitter = YamlEmitter::new(&mut output);
    emitter.multiline_strings(true);
    emitter.dump(&yaml).context("Failed to emit YAML")?;

    Ok(output)
}

fn to_emitter_value(value: &serde_yaml::Value) -> Yaml {
    match value {
        serde_yaml::Value::Null => Yaml::Null,
        serde_yaml::Value::Bool(b) => Yaml::Boolean(*b),
        serde_yaml::Value::Number(n) => match (n.as_i64(), n.as_f64()) {
            (Some(i), _) => Yaml::Integer(i),
            (None, Some(f)) => Yaml::Real(f.to_string()),
            (None, None) => Yaml::String(n.to_string()),
        },
        serde_yaml::Value::String(s) => Yaml::String(s.clone()),
        serde_yaml::Value::Sequence(seq) => Yaml::Array(seq.iter().map(to_emitter_value).collect()),
        serde_yaml::Value::Mapping(map) => {
            let mut hash = yaml_rust_davvid::yaml::Hash::new();
            for (k, v) in map {
                hash.insert(to_emitter_value(k), to_emitter_value(v));
            }
            Yaml::Hash(hash)
        }
        serde_yaml::Value::Tagged(tagged) => to_emitter_value(&tagged.value),
    }
}

/// Parses a YAML document.
pub fn from_yaml<T: DeserializeOwned>(yaml: &str) -> Result<T> {
    serde_yaml::from_str(yaml).context("Failed to deserialize YAML")
}

/// Reads and parses a YAML file, such as a saved scan report.
pub fn read_yaml_file<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<T> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read file: {}", path.display()))?;
    from_yaml(&content).with_context(|| format!("Failed to parse file: {}", path.display()))
}

/// Writes `data` to a YAML file that [`read_yaml_file`] reads back unchanged.
pub fn write_yaml_file<T: Serialize>(data: &T, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let content = serde_yaml::to_string(data).context("Failed to serialize report")?;
    fs::write(path, content).with_context(|| format!("Failed to write file: {}", path.display()))
}
