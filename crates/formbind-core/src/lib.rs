//! formbind-core: nested path addressing and form binding over JSON models
//!
//! The crate is built around a small path language,
//! `icons[name=ipad152x152].uri`:
//! - `path` compiles path strings into key/selector segments, `cache` memoizes that
//! - `resolve` walks a tree along a path, creating missing structure on write and
//!   reporting where the pre-existing part ends
//! - `form` / `model` bind a model to form inputs (values, patches, validation
//!   state, CSS state classes)
//! - `document` has the JSON file helpers used by the CLI
//!
pub mod cache;
pub mod container;
pub mod document;
pub mod error;
pub mod form;
pub mod model;
pub mod path;
pub mod resolve;
pub mod resolved;

pub use cache::PathCache;
pub use container::{Container, NodeKind};
pub use document::{ChildInfo, backup_file, list_children, load_json, write_json};
pub use error::{FormbindError, Malformed, PathError, PathResult};
pub use form::{Binding, Form, FormConfig};
pub use model::{Errors, JsonModel, Model, Patch, Rule};
pub use path::{Conditions, Segment, Syntax, compile};
pub use resolve::{Resolution, Resolver};
pub use resolved::{ResolvedPath, Step};
