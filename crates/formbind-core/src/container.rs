//! Capability trait over tree-shaped data.
//!
//! The resolver never inspects concrete value types; it only asks a node for
//! its [`NodeKind`] and goes through the operations below. `serde_json::Value`
//! is the stock implementation.

use std::fmt;

use serde_json::{Map, Value};

use crate::path::Conditions;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Null,
    Bool,
    Number,
    String,
    Mapping,
    Sequence,
}

impl NodeKind {
    pub fn is_container(self) -> bool {
        matches!(self, NodeKind::Mapping | NodeKind::Sequence)
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            NodeKind::Null => "null",
            NodeKind::Bool => "bool",
            NodeKind::Number => "number",
            NodeKind::String => "string",
            NodeKind::Mapping => "mapping",
            NodeKind::Sequence => "sequence",
        })
    }
}

/// Mapping/sequence operations needed to walk and materialize a path.
///
/// Mutating operations report `None`/`false` when the node has the wrong
/// shape instead of panicking; callers check [`Container::kind`] first.
pub trait Container: Clone {
    fn kind(&self) -> NodeKind;

    fn empty_mapping() -> Self;
    fn empty_sequence() -> Self;
    fn null() -> Self;
    /// Builds the element appended when no sequence element matches.
    fn from_conditions(conditions: &Conditions) -> Self;

    fn child(&self, key: &str) -> Option<&Self>;
    fn child_mut(&mut self, key: &str) -> Option<&mut Self>;
    /// Inserts or replaces `key`. Returns false if `self` is not a mapping.
    fn insert_child(&mut self, key: &str, value: Self) -> bool;

    fn element(&self, index: usize) -> Option<&Self>;
    fn element_mut(&mut self, index: usize) -> Option<&mut Self>;
    /// Appends to a sequence and returns the new element's index.
    fn push_element(&mut self, value: Self) -> Option<usize>;
    /// Number of elements of a sequence.
    fn sequence_len(&self) -> Option<usize>;
    /// Index of the first element whose fields equal every condition.
    fn position_matching(&self, conditions: &Conditions) -> Option<usize>;
}

impl Container for Value {
    fn kind(&self) -> NodeKind {
        match self {
            Value::Null => NodeKind::Null,
            Value::Bool(_) => NodeKind::Bool,
            Value::Number(_) => NodeKind::Number,
            Value::String(_) => NodeKind::String,
            Value::Object(_) => NodeKind::Mapping,
            Value::Array(_) => NodeKind::Sequence,
        }
    }

    fn empty_mapping() -> Self {
        Value::Object(Map::new())
    }

    fn empty_sequence() -> Self {
        Value::Array(Vec::new())
    }

    fn null() -> Self {
        Value::Null
    }

    fn from_conditions(conditions: &Conditions) -> Self {
        Value::Object(
            conditions
                .iter()
                .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                .collect(),
        )
    }

    fn child(&self, key: &str) -> Option<&Self> {
        self.as_object()?.get(key)
    }

    fn child_mut(&mut self, key: &str) -> Option<&mut Self> {
        self.as_object_mut()?.get_mut(key)
    }

    fn insert_child(&mut self, key: &str, value: Self) -> bool {
        match self.as_object_mut() {
            Some(map) => {
                map.insert(key.to_owned(), value);
                true
            }
            None => false,
        }
    }

    fn element(&self, index: usize) -> Option<&Self> {
        self.as_array()?.get(index)
    }

    fn element_mut(&mut self, index: usize) -> Option<&mut Self> {
        self.as_array_mut()?.get_mut(index)
    }

    fn push_element(&mut self, value: Self) -> Option<usize> {
        let items = self.as_array_mut()?;
        items.push(value);
        Some(items.len() - 1)
    }

    fn sequence_len(&self) -> Option<usize> {
        self.as_array().map(Vec::len)
    }

    fn position_matching(&self, conditions: &Conditions) -> Option<usize> {
        self.as_array()?.iter().position(|item| {
            item.is_object()
                && conditions
                    .iter()
                    .all(|(k, v)| item.get(k).and_then(Value::as_str) == Some(v.as_str()))
        })
    }
}
