//! Form binding over a [`Model`]: values, change handling, validation state
//! and CSS state classes.
//!
//! ```text
//! form.value("icons[name=ipad152x152].uri")
//! form.on_change("icons[name=ipad152x152].uri", json!("/img/a.png"))
//! form.input_class_name("name", true)   // "" until something is validated
//! ```

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::document::load_json;
use crate::error::{FormbindError, PathResult};
use crate::model::{Errors, Model, Patch};
use crate::resolve::Resolver;

/// Naming of a form and its state classes. Empty class names fall back to
/// `{name}-label-error`, `{name}-label-success`, `{name}-input-error` and
/// `{name}-input-success`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FormConfig {
    pub name: String,
    pub label_error_class_name: String,
    pub label_success_class_name: String,
    pub input_error_class_name: String,
    pub input_success_class_name: String,
}

impl Default for FormConfig {
    fn default() -> Self {
        Self {
            name: "form".to_owned(),
            label_error_class_name: String::new(),
            label_success_class_name: String::new(),
            input_error_class_name: String::new(),
            input_success_class_name: String::new(),
        }
    }
}

impl FormConfig {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn from_json_file(path: &Path) -> Result<Self, FormbindError> {
        Ok(serde_json::from_value(load_json(path)?)?)
    }

    fn class(&self, configured: &str, suffix: &str) -> String {
        if configured.is_empty() {
            format!("{}-{}", self.name, suffix)
        } else {
            configured.to_owned()
        }
    }

    pub fn label_error_class(&self) -> String {
        self.class(&self.label_error_class_name, "label-error")
    }

    pub fn label_success_class(&self) -> String {
        self.class(&self.label_success_class_name, "label-success")
    }

    pub fn input_error_class(&self) -> String {
        self.class(&self.input_error_class_name, "input-error")
    }

    pub fn input_success_class(&self) -> String {
        self.class(&self.input_success_class_name, "input-success")
    }
}

/// What an input needs to render one attribute.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Binding {
    pub value: Option<Value>,
    pub class_name: String,
}

type ClassMapper = Box<dyn Fn(&str) -> String + Send + Sync>;

pub struct Form<M> {
    config: FormConfig,
    model: M,
    resolver: Resolver,
    /// `None` until the first validation.
    errors: Option<Errors>,
    class_mapper: Option<ClassMapper>,
}

impl<M: fmt::Debug> fmt::Debug for Form<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Form")
            .field("config", &self.config)
            .field("model", &self.model)
            .field("errors", &self.errors)
            .finish_non_exhaustive()
    }
}

impl<M: Model> Form<M> {
    pub fn new(config: FormConfig, model: M, resolver: Resolver) -> Self {
        Self {
            config,
            model,
            resolver,
            errors: None,
            class_mapper: None,
        }
    }

    /// Post-processes every class name, e.g. to map onto scoped CSS modules.
    pub fn with_class_mapper(mut self, mapper: impl Fn(&str) -> String + Send + Sync + 'static) -> Self {
        self.class_mapper = Some(Box::new(mapper));
        self
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn config(&self) -> &FormConfig {
        &self.config
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn into_model(self) -> M {
        self.model
    }

    pub fn to_json(&self) -> Value {
        self.model.to_json()
    }

    pub fn value(&self, path: &str) -> PathResult<Option<Value>> {
        let snapshot = self.model.to_json();
        Ok(self.resolver.get(&snapshot, path)?.cloned())
    }

    /// Writes `value` at `path` into the model and validates what changed.
    ///
    /// When the write had to append a sequence element, the new element is
    /// sent field by field under its normalized path; otherwise the patch is
    /// the single boundary entry.
    pub fn on_change(&mut self, path: &str, value: Value) -> PathResult<Patch> {
        let mut snapshot = self.model.to_json();
        let resolution = self.resolver.write(&mut snapshot, path, value)?;

        let patch: Patch = match resolution.boundary_value {
            Value::Object(fields) if resolution.boundary.ends_with_index() => fields
                .into_iter()
                .map(|(k, v)| (resolution.boundary.join_key(k), v))
                .collect(),
            other => Patch::single(resolution.boundary, other),
        };
        debug!(form = %self.config.name, path, entries = patch.len(), "applying change");

        self.model.apply(&patch)?;
        self.validate(&patch);
        Ok(patch)
    }

    /// Validates `attrs` and merges the outcome into the error state.
    ///
    /// Errors at or below a patched path are replaced by the new findings.
    pub fn validate(&mut self, attrs: &Patch) {
        let found = self.model.pre_validate(attrs);
        let patched: Vec<String> = attrs.keys().collect();
        let errors = self.errors.get_or_insert_with(Errors::new);
        errors.retain(|key, _| !patched.iter().any(|p| covers(p, key)));
        errors.extend(found);
    }

    /// Validates the whole model, replacing the error state.
    pub fn validate_model(&mut self) -> &Errors {
        self.errors.insert(self.model.validate_all())
    }

    pub fn is_valid(&self) -> bool {
        self.model.validate_all().is_empty()
    }

    pub fn errors(&self) -> Errors {
        self.errors.clone().unwrap_or_default()
    }

    /// Error for an attribute, given as a source path (`icons[name=x].uri`)
    /// or an already normalized one (`.icons[0].uri`).
    pub fn error(&self, attribute: &str) -> Option<&str> {
        let errors = self.errors.as_ref()?;
        errors
            .get(attribute)
            .or_else(|| errors.get(&self.error_key(attribute)))
            .map(String::as_str)
    }

    pub fn label_class_name(&self, attribute: &str, empty_by_default: bool) -> String {
        self.state_class(
            attribute,
            empty_by_default,
            self.config.label_error_class(),
            self.config.label_success_class(),
        )
    }

    pub fn input_class_name(&self, attribute: &str, empty_by_default: bool) -> String {
        self.state_class(
            attribute,
            empty_by_default,
            self.config.input_error_class(),
            self.config.input_success_class(),
        )
    }

    /// Value and input class for `path`.
    pub fn attribute(&self, path: &str) -> PathResult<Binding> {
        Ok(Binding {
            value: self.value(path)?,
            class_name: self.input_class_name(path, true),
        })
    }

    /// Normalized form of `attribute` as used in the error state. Paths that
    /// do not resolve are used verbatim.
    fn error_key(&self, attribute: &str) -> String {
        self.resolver
            .read(&self.model.to_json(), attribute)
            .map(|r| r.path.to_string())
            .unwrap_or_else(|_| attribute.to_owned())
    }

    fn state_class(&self, attribute: &str, empty_by_default: bool, error: String, success: String) -> String {
        let class = match &self.errors {
            None if empty_by_default => String::new(),
            Some(errors) if errors.contains_key(attribute) || errors.contains_key(&self.error_key(attribute)) => error,
            _ => success,
        };
        match &self.class_mapper {
            Some(mapper) => mapper(&class),
            None => class,
        }
    }
}

/// Whether the rendered path `key` is `attr` itself or lies below it.
fn covers(attr: &str, key: &str) -> bool {
    key.strip_prefix(attr)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('.') || rest.starts_with('['))
}
