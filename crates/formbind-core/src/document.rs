// JSON document helpers for the CLI and file-backed models.
// - `load_json` / `write_json`: read and pretty-write a document.
// - `backup_file`: timestamped copy next to the original before in-place edits.
// - `list_children`: one-level listing of a mapping or sequence.
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::Value;

use crate::container::{Container, NodeKind};
use crate::error::FormbindError;

pub fn load_json(path: &Path) -> Result<Value, FormbindError> {
    let data = fs::read(path)?;
    if data.iter().all(|b| b.is_ascii_whitespace()) {
        return Err(FormbindError::EmptyFile(path.display().to_string()));
    }
    Ok(serde_json::from_slice(&data)?)
}

pub fn write_json(path: &Path, value: &Value) -> Result<(), FormbindError> {
    let s = serde_json::to_string_pretty(value)?;
    fs::write(path, s)?;
    Ok(())
}

// Copy `file` to `<file>.<YYYYmmdd-HHMMSS>.bak` in the same directory
pub fn backup_file(file: &Path) -> io::Result<PathBuf> {
    if !file.is_file() {
        return Err(io::Error::new(io::ErrorKind::InvalidInput, "not a file"));
    }
    let name = file.file_name().and_then(|s| s.to_str()).unwrap_or("document");
    let ts = chrono::Local::now().format("%Y%m%d-%H%M%S");
    let dest = file.with_file_name(format!("{}.{}.bak", name, ts));
    fs::copy(file, &dest)?;
    Ok(dest)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChildInfo {
    pub key_or_index: String,
    #[serde(serialize_with = "kind_name")]
    pub kind: NodeKind,
    pub len: Option<usize>,
}

fn kind_name<S: serde::Serializer>(kind: &NodeKind, s: S) -> Result<S::Ok, S::Error> {
    s.collect_str(kind)
}

fn container_len(v: &Value) -> Option<usize> {
    match v {
        Value::Array(a) => Some(a.len()),
        Value::Object(m) => Some(m.len()),
        _ => None,
    }
}

// Scalars have no children
pub fn list_children(node: &Value) -> Vec<ChildInfo> {
    match node {
        Value::Object(map) => map
            .iter()
            .map(|(k, v)| ChildInfo {
                key_or_index: k.clone(),
                kind: v.kind(),
                len: container_len(v),
            })
            .collect(),
        Value::Array(arr) => arr
            .iter()
            .enumerate()
            .map(|(i, v)| ChildInfo {
                key_or_index: i.to_string(),
                kind: v.kind(),
                len: container_len(v),
            })
            .collect(),
        _ => Vec::new(),
    }
}
