//! Path resolver: locate a value, materializing missing structure on write.

use std::sync::Arc;

use tracing::{debug, trace};

use crate::cache::PathCache;
use crate::container::{Container, NodeKind};
use crate::error::{PathError, PathResult};
use crate::path::Segment;
use crate::resolved::ResolvedPath;

/// Outcome of resolving one path against a root.
///
/// `boundary` is the normalized path down to the first sequence element that
/// had to be appended (or to its sequence, when that element is the addressed
/// location). When nothing was appended it equals `path`, and the write is a
/// plain leaf patch. Otherwise `boundary_value` is the whole new subtree,
/// which the caller stores as one unit.
///
/// When `boundary == path`, `boundary_value` is the value at the addressed
/// location: the written value on writes, the current value (or null) on
/// reads.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution<C> {
    /// Value at the addressed location (the written value on writes).
    pub value: C,
    pub path: ResolvedPath,
    pub boundary: ResolvedPath,
    pub boundary_value: C,
}

impl<C> Resolution<C> {
    /// True when no sequence element was appended, so `value` can be stored
    /// as a plain leaf patch. Creating missing mapping keys still counts as a
    /// leaf patch: `read(&{}, "missing.deep")` reports true.
    pub fn is_leaf_patch(&self) -> bool {
        self.path == self.boundary
    }

    /// `(value, path, boundary path, boundary value)` with rendered paths.
    pub fn into_tuple(self) -> (C, String, String, C) {
        (
            self.value,
            self.path.to_string(),
            self.boundary.to_string(),
            self.boundary_value,
        )
    }
}

/// Resolves path strings through a shared [`PathCache`].
#[derive(Debug, Clone, Default)]
pub struct Resolver {
    cache: Arc<PathCache>,
}

impl Resolver {
    pub fn new(cache: Arc<PathCache>) -> Self {
        Self { cache }
    }

    pub fn cache(&self) -> &Arc<PathCache> {
        &self.cache
    }

    pub fn compile(&self, path: &str) -> PathResult<Vec<Segment>> {
        self.cache.compile(path)
    }

    /// Writes `value` at `path`, creating whatever is missing on the way.
    ///
    /// The walk runs on a copy of `root` which replaces it only on success,
    /// so a failed write leaves `root` as it was.
    pub fn write<C: Container>(&self, root: &mut C, path: &str, value: C) -> PathResult<Resolution<C>> {
        let segments = self.cache.compile(path)?;
        let mut scratch = root.clone();
        let resolution = walk(&mut scratch, path, &segments, Some(value))?;
        *root = scratch;
        Ok(resolution)
    }

    /// Resolves without writing. `root` is never modified; missing parts are
    /// materialized on a scratch copy (a missing leaf reads as null).
    pub fn read<C: Container>(&self, root: &C, path: &str) -> PathResult<Resolution<C>> {
        let segments = self.cache.compile(path)?;
        let mut scratch = root.clone();
        walk(&mut scratch, path, &segments, None)
    }

    /// Plain lookup: `None` as soon as a key or matching element is missing.
    pub fn get<'a, C: Container>(&self, root: &'a C, path: &str) -> PathResult<Option<&'a C>> {
        let segments = self.cache.compile(path)?;
        let mut cursor = root;
        let mut at = ResolvedPath::new();
        for segment in &segments {
            if cursor.kind() == NodeKind::Null {
                return Ok(None);
            }
            let next = match segment {
                Segment::Key(name) => {
                    expect(cursor, NodeKind::Mapping, path, &at)?;
                    at.push_key(name.as_str());
                    cursor.child(name)
                }
                Segment::Selector { conditions, .. } => {
                    expect(cursor, NodeKind::Sequence, path, &at)?;
                    cursor.position_matching(conditions).and_then(|index| {
                        at.push_index(index);
                        cursor.element(index)
                    })
                }
            };
            match next {
                Some(node) => cursor = node,
                None => return Ok(None),
            }
        }
        Ok(Some(cursor))
    }
}

fn expect<C: Container>(node: &C, kind: NodeKind, path: &str, at: &ResolvedPath) -> PathResult<()> {
    if node.kind() == kind {
        Ok(())
    } else {
        debug!(path, at = %at, expected = %kind, found = %node.kind(), "segment type mismatch");
        Err(PathError::type_mismatch(path, at.to_string(), kind, node.kind()))
    }
}

fn walk<C: Container>(root: &mut C, source: &str, segments: &[Segment], mut value: Option<C>) -> PathResult<Resolution<C>> {
    let last = segments.len().saturating_sub(1);
    let mut cursor = &mut *root;
    let mut path = ResolvedPath::new();
    let mut boundary: Option<ResolvedPath> = None;

    for (pos, segment) in segments.iter().enumerate() {
        let is_last = pos == last;
        match segment {
            Segment::Key(name) => {
                expect(cursor, NodeKind::Mapping, source, &path)?;
                let current = cursor.child(name).map(Container::kind);
                if is_last {
                    match value.take() {
                        Some(v) => {
                            trace!(path = source, at = %path, key = %name, "writing leaf");
                            cursor.insert_child(name, v);
                        }
                        None if current.is_none() => {
                            cursor.insert_child(name, C::null());
                        }
                        None => {}
                    }
                } else if current.is_none_or(|kind| kind == NodeKind::Null) {
                    let fresh = match segments[pos + 1] {
                        Segment::Key(_) => C::empty_mapping(),
                        Segment::Selector { .. } => C::empty_sequence(),
                    };
                    debug!(path = source, at = %path, key = %name, "materializing container");
                    cursor.insert_child(name, fresh);
                }
                cursor = cursor
                    .child_mut(name)
                    .ok_or_else(|| PathError::type_mismatch(source, path.to_string(), NodeKind::Mapping, NodeKind::Null))?;
                path.push_key(name.as_str());
            }
            Segment::Selector { conditions, .. } => {
                expect(cursor, NodeKind::Sequence, source, &path)?;
                let index = match cursor.position_matching(conditions) {
                    Some(index) => index,
                    None => {
                        let index = cursor
                            .push_element(C::from_conditions(conditions))
                            .ok_or_else(|| PathError::type_mismatch(source, path.to_string(), NodeKind::Sequence, NodeKind::Null))?;
                        debug!(path = source, at = %path, index, "appended sequence element");
                        boundary.get_or_insert_with(|| {
                            let mut b = path.clone();
                            b.push_index(index);
                            b
                        });
                        index
                    }
                };
                cursor = cursor
                    .element_mut(index)
                    .ok_or_else(|| PathError::type_mismatch(source, path.to_string(), NodeKind::Sequence, NodeKind::Null))?;
                if is_last && let Some(v) = value.take() {
                    *cursor = v;
                }
                path.push_index(index);
            }
        }
    }

    let located = cursor.clone();
    let boundary = match boundary {
        // the addressed element itself was appended: the sequence is the
        // deepest pre-existing container
        Some(b) if b == path => b.parent().unwrap_or_default(),
        Some(b) => b,
        None => path.clone(),
    };
    let boundary_value = if boundary == path {
        located.clone()
    } else {
        boundary.lookup(&*root).cloned().unwrap_or_else(C::null)
    };

    Ok(Resolution {
        value: located,
        path,
        boundary,
        boundary_value,
    })
}
