//! Models a form binds to, and the patches written into them.

use std::collections::BTreeMap;

use regex::Regex;
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

use crate::error::{FormbindError, PathResult};
use crate::resolved::ResolvedPath;

/// Validation messages keyed by rendered path (`.icons[0].uri`).
pub type Errors = BTreeMap<String, String>;

/// Ordered set of writes, each at a normalized path.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Patch(Vec<(ResolvedPath, Value)>);

impl Patch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(path: ResolvedPath, value: Value) -> Self {
        Self(vec![(path, value)])
    }

    /// One entry per top-level field of `doc`.
    pub fn from_fields(doc: &Value) -> Self {
        doc.as_object()
            .map(|fields| {
                fields
                    .iter()
                    .map(|(k, v)| (ResolvedPath::new().join_key(k.as_str()), v.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn push(&mut self, path: ResolvedPath, value: Value) {
        self.0.push((path, value));
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ResolvedPath, &Value)> {
        self.0.iter().map(|(p, v)| (p, v))
    }

    pub fn keys(&self) -> impl Iterator<Item = String> + '_ {
        self.0.iter().map(|(p, _)| p.to_string())
    }

    pub fn get(&self, path: &str) -> Option<&Value> {
        self.0.iter().find(|(p, _)| p.to_string() == path).map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(ResolvedPath, Value)> for Patch {
    fn from_iter<I: IntoIterator<Item = (ResolvedPath, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl Serialize for Patch {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (path, value) in &self.0 {
            map.serialize_entry(&path.to_string(), value)?;
        }
        map.end()
    }
}

/// The mutable model behind a form.
pub trait Model {
    /// Snapshot of the model's data.
    fn to_json(&self) -> Value;
    fn apply(&mut self, patch: &Patch) -> PathResult<()>;
    /// Errors for the patched attributes and anything nested in them; an
    /// empty map means valid.
    fn pre_validate(&self, attrs: &Patch) -> Errors;

    /// Errors for the whole model.
    fn validate_all(&self) -> Errors {
        self.pre_validate(&Patch::from_fields(&self.to_json()))
    }
}

/// Declarative check for one field shape.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Rule {
    pub required: bool,
    pub pattern: Option<String>,
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
    /// Replaces the generated message.
    pub message: Option<String>,
}

#[derive(Debug)]
struct CompiledRule {
    rule: Rule,
    pattern: Option<Regex>,
}

impl CompiledRule {
    fn check(&self, value: &Value) -> Option<String> {
        let text = match value {
            Value::Null => None,
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        };
        let failure = match text.as_deref() {
            None | Some("") if self.rule.required => Some("is required".to_owned()),
            None | Some("") => None,
            Some(s) => {
                let len = s.chars().count();
                if let Some(min) = self.rule.min_length
                    && len < min
                {
                    Some(format!("must be at least {min} characters"))
                } else if let Some(max) = self.rule.max_length
                    && len > max
                {
                    Some(format!("must be at most {max} characters"))
                } else if self.pattern.as_ref().is_some_and(|re| !re.is_match(s)) {
                    Some("has an invalid format".to_owned())
                } else {
                    None
                }
            }
        };
        failure.map(|f| self.rule.message.clone().unwrap_or(f))
    }
}

/// A [`Model`] holding plain JSON, validated by per-field [`Rule`]s.
///
/// Rules are keyed by field shape: keys joined with `.`, sequence indices
/// written as `[]`, e.g. `icons[].uri`.
#[derive(Debug, Default)]
pub struct JsonModel {
    data: Value,
    rules: BTreeMap<String, CompiledRule>,
}

impl JsonModel {
    pub fn new(data: Value) -> Self {
        Self {
            data,
            rules: BTreeMap::new(),
        }
    }

    pub fn with_rules(data: Value, rules: BTreeMap<String, Rule>) -> Result<Self, FormbindError> {
        let rules = rules
            .into_iter()
            .map(|(shape, rule)| -> Result<_, FormbindError> {
                let pattern = rule.pattern.as_deref().map(Regex::new).transpose()?;
                Ok((shape, CompiledRule { rule, pattern }))
            })
            .collect::<Result<_, FormbindError>>()?;
        Ok(Self { data, rules })
    }

    pub fn data(&self) -> &Value {
        &self.data
    }

    pub fn into_data(self) -> Value {
        self.data
    }
}

impl Model for JsonModel {
    fn to_json(&self) -> Value {
        self.data.clone()
    }

    fn apply(&mut self, patch: &Patch) -> PathResult<()> {
        for (path, value) in patch.iter() {
            path.assign(&mut self.data, value.clone())?;
        }
        Ok(())
    }

    fn pre_validate(&self, attrs: &Patch) -> Errors {
        let mut errors = Errors::new();
        for (path, value) in attrs.iter() {
            self.check_tree(path, value, &mut errors);
        }
        errors
    }

    fn validate_all(&self) -> Errors {
        let mut errors = Errors::new();
        self.check_tree(&ResolvedPath::new(), &self.data, &mut errors);
        errors
    }
}

impl JsonModel {
    /// Checks `value` and everything below it. Required fields missing from
    /// a mapping are reported under the path they would have.
    fn check_tree(&self, path: &ResolvedPath, value: &Value, errors: &mut Errors) {
        let shape = path.shape();
        if let Some(msg) = self.rules.get(&shape).and_then(|rule| rule.check(value)) {
            errors.insert(path.to_string(), msg);
        }
        match value {
            Value::Object(fields) => {
                for (rule_shape, rule) in &self.rules {
                    if !rule.rule.required {
                        continue;
                    }
                    let Some(key) = field_of(rule_shape, &shape) else {
                        continue;
                    };
                    if !fields.contains_key(key)
                        && let Some(msg) = rule.check(&Value::Null)
                    {
                        errors.insert(path.join_key(key).to_string(), msg);
                    }
                }
                for (key, child) in fields {
                    self.check_tree(&path.join_key(key.as_str()), child, errors);
                }
            }
            Value::Array(items) => {
                for (index, item) in items.iter().enumerate() {
                    let mut at = path.clone();
                    at.push_index(index);
                    self.check_tree(&at, item, errors);
                }
            }
            _ => {}
        }
    }
}

/// Field name of `rule_shape` when it names a direct field of a mapping with
/// shape `parent` (`icons[].uri` under `icons[]` is `uri`).
fn field_of<'a>(rule_shape: &'a str, parent: &str) -> Option<&'a str> {
    let (head, key) = match rule_shape.rsplit_once('.') {
        Some((head, key)) => (head, key),
        None => ("", rule_shape),
    };
    (head == parent && !key.is_empty() && !key.contains('[')).then_some(key)
}
