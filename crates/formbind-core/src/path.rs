//! Path compiler: turns `icons[name=ipad152x152].uri` into segments.
//!
//! Grammar:
//!
//! ```text
//! path      := segment ('.' segment)*
//! segment   := identifier ('[' condition ']')*
//! condition := key '=' value
//! ```
//!
//! A bracketed token compiles to a [`Segment::Key`] for the collection
//! followed by one [`Segment::Selector`] holding the conditions of every
//! bracket group on that token.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{Malformed, PathError, PathResult};

/// Field/value equality conditions of a selector.
pub type Conditions = BTreeMap<String, String>;

/// One parsed unit of a path.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Segment {
    /// Mapping property access.
    Key(String),
    /// First element of a sequence matching all conditions.
    Selector { key: String, conditions: Conditions },
}

impl Segment {
    #[inline]
    pub fn key(name: impl Into<String>) -> Self {
        Segment::Key(name.into())
    }

    pub fn selector<K, V>(key: impl Into<String>, conditions: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Segment::Selector {
            key: key.into(),
            conditions: conditions
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    #[inline]
    pub fn is_key(&self) -> bool {
        matches!(self, Segment::Key(_))
    }

    #[inline]
    pub fn is_selector(&self) -> bool {
        matches!(self, Segment::Selector { .. })
    }
}

/// How strictly path strings are checked.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Syntax {
    /// Reject anything outside the grammar.
    #[default]
    Strict,
    /// Never reject: the last character of a bracket group is dropped and
    /// conditions without a key or `=` are ignored.
    Lenient,
}

/// Compiles a path string into segments.
pub fn compile(source: &str, syntax: Syntax) -> PathResult<Vec<Segment>> {
    let strict = syntax == Syntax::Strict;
    let fail = |reason| PathError::malformed(source, reason);
    let mut segments = Vec::new();

    for token in source.split('.') {
        let Some((name, groups)) = token.split_once('[') else {
            if strict {
                if token.is_empty() {
                    return Err(fail(Malformed::EmptyIdentifier));
                }
                if token.contains(']') {
                    return Err(fail(Malformed::UnbalancedBrackets));
                }
            }
            segments.push(Segment::Key(token.to_owned()));
            continue;
        };

        if strict && name.is_empty() {
            return Err(fail(Malformed::EmptyIdentifier));
        }
        let mut conditions = Conditions::new();
        for group in groups.split('[') {
            let body = if strict {
                match group.strip_suffix(']') {
                    Some(body) if !body.contains(']') => body,
                    _ => return Err(fail(Malformed::UnbalancedBrackets)),
                }
            } else {
                let mut chars = group.chars();
                chars.next_back();
                chars.as_str()
            };
            match body.split_once('=') {
                Some((k, v)) if !k.is_empty() => {
                    if strict && v.contains('=') {
                        return Err(fail(Malformed::ExtraEquals));
                    }
                    conditions.insert(k.to_owned(), v.to_owned());
                }
                // `[]` carries no condition
                _ if !strict || body.is_empty() => {}
                Some(_) => return Err(fail(Malformed::EmptyConditionKey)),
                None => return Err(fail(Malformed::MissingEquals)),
            }
        }
        segments.push(Segment::Key(name.to_owned()));
        segments.push(Segment::Selector {
            key: name.to_owned(),
            conditions,
        });
    }

    Ok(segments)
}
