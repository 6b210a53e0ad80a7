//! Normalized paths produced by resolution.

use std::fmt;

use serde::{Serialize, Serializer};

use crate::container::{Container, NodeKind};
use crate::error::{PathError, PathResult};

/// One concrete step: a mapping key or a sequence index.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Step {
    Key(String),
    Index(usize),
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::Key(k) => write!(f, ".{k}"),
            Step::Index(i) => write!(f, "[{i}]"),
        }
    }
}

/// A selector-free path, rendered as `.icons[0].uri`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct ResolvedPath(Vec<Step>);

impl ResolvedPath {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn from_steps(steps: Vec<Step>) -> Self {
        Self(steps)
    }

    pub fn push_key(&mut self, key: impl Into<String>) {
        self.0.push(Step::Key(key.into()));
    }

    pub fn push_index(&mut self, index: usize) {
        self.0.push(Step::Index(index));
    }

    /// Copy of this path extended by one key.
    pub fn join_key(&self, key: impl Into<String>) -> Self {
        let mut out = self.clone();
        out.push_key(key);
        out
    }

    pub fn steps(&self) -> &[Step] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn parent(&self) -> Option<ResolvedPath> {
        let (_, parent) = self.0.split_last()?;
        Some(Self(parent.to_vec()))
    }

    pub fn ends_with_index(&self) -> bool {
        matches!(self.0.last(), Some(Step::Index(_)))
    }

    /// Index-free form used to key validation rules: `icons[].uri`.
    pub fn shape(&self) -> String {
        let mut out = String::new();
        for step in &self.0 {
            match step {
                Step::Key(k) => {
                    if !out.is_empty() {
                        out.push('.');
                    }
                    out.push_str(k);
                }
                Step::Index(_) => out.push_str("[]"),
            }
        }
        out
    }

    pub fn lookup<'a, C: Container>(&self, root: &'a C) -> Option<&'a C> {
        self.0.iter().try_fold(root, |node, step| match step {
            Step::Key(k) => node.child(k),
            Step::Index(i) => node.element(*i),
        })
    }

    /// Stores `value` at this path.
    ///
    /// Missing (or `null`) mapping keys along the way are created; an index
    /// equal to the sequence length appends.
    pub fn assign<C: Container>(&self, root: &mut C, value: C) -> PathResult<()> {
        let Some((last, parents)) = self.0.split_last() else {
            *root = value;
            return Ok(());
        };

        let mut cursor = root;
        let mut at = ResolvedPath::new();
        for (pos, step) in parents.iter().enumerate() {
            let fresh = || match parents.get(pos + 1).unwrap_or(last) {
                Step::Key(_) => C::empty_mapping(),
                Step::Index(_) => C::empty_sequence(),
            };
            match step {
                Step::Key(k) => {
                    expect(cursor, NodeKind::Mapping, &at, self)?;
                    if cursor.child(k).is_none_or(|c| c.kind() == NodeKind::Null) {
                        cursor.insert_child(k, fresh());
                    }
                    cursor = cursor
                        .child_mut(k)
                        .ok_or_else(|| mismatch(&at, self, NodeKind::Mapping, NodeKind::Null))?;
                }
                Step::Index(i) => {
                    expect(cursor, NodeKind::Sequence, &at, self)?;
                    let len = cursor.sequence_len().unwrap_or(0);
                    if *i == len {
                        cursor.push_element(fresh());
                    }
                    cursor = cursor.element_mut(*i).ok_or_else(|| PathError::IndexOutOfBounds {
                        at: at.to_string(),
                        index: *i,
                        len,
                    })?;
                }
            }
            at.0.push(step.clone());
        }

        match last {
            Step::Key(k) => {
                expect(cursor, NodeKind::Mapping, &at, self)?;
                cursor.insert_child(k, value);
            }
            Step::Index(i) => {
                expect(cursor, NodeKind::Sequence, &at, self)?;
                let len = cursor.sequence_len().unwrap_or(0);
                if *i == len {
                    cursor.push_element(value);
                } else {
                    let slot = cursor.element_mut(*i).ok_or_else(|| PathError::IndexOutOfBounds {
                        at: at.to_string(),
                        index: *i,
                        len,
                    })?;
                    *slot = value;
                }
            }
        }
        Ok(())
    }
}

fn expect<C: Container>(node: &C, kind: NodeKind, at: &ResolvedPath, path: &ResolvedPath) -> PathResult<()> {
    if node.kind() == kind {
        Ok(())
    } else {
        Err(mismatch(at, path, kind, node.kind()))
    }
}

fn mismatch(at: &ResolvedPath, path: &ResolvedPath, expected: NodeKind, found: NodeKind) -> PathError {
    PathError::type_mismatch(path.to_string(), at.to_string(), expected, found)
}

impl fmt::Display for ResolvedPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.iter().try_for_each(|step| write!(f, "{step}"))
    }
}

impl Serialize for ResolvedPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl From<Vec<Step>> for ResolvedPath {
    fn from(steps: Vec<Step>) -> Self {
        Self(steps)
    }
}
