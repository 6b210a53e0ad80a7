//! Memoized path compilation.

use std::collections::HashMap;

use parking_lot::Mutex;
use tracing::{debug, trace};

use crate::error::PathResult;
use crate::path::{self, Segment, Syntax};

/// Compile cache keyed by the exact path string.
///
/// Path strings come from form templates, so the set of keys stays small and
/// the cache is never evicted. Failed compilations are not stored. Every
/// lookup hands out a fresh `Vec`, callers may mutate it freely.
#[derive(Debug, Default)]
pub struct PathCache {
    syntax: Syntax,
    compiled: Mutex<HashMap<String, Vec<Segment>>>,
}

impl PathCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_syntax(syntax: Syntax) -> Self {
        Self {
            syntax,
            compiled: Mutex::default(),
        }
    }

    pub fn syntax(&self) -> Syntax {
        self.syntax
    }

    pub fn compile(&self, source: &str) -> PathResult<Vec<Segment>> {
        if let Some(hit) = self.compiled.lock().get(source) {
            trace!(path = source, "path cache hit");
            return Ok(hit.clone());
        }
        // compiled outside the lock; a racing miss just compiles twice
        let segments = path::compile(source, self.syntax)?;
        debug!(path = source, segments = segments.len(), "compiled path");
        self.compiled
            .lock()
            .entry(source.to_owned())
            .or_insert_with(|| segments.clone());
        Ok(segments)
    }

    pub fn len(&self) -> usize {
        self.compiled.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.compiled.lock().is_empty()
    }
}
