//! Template references over JSON scopes.
//!
//! `tilde-template` turns strings such as `~.user.name` or `~~>items.0` into absolute
//! data paths and evaluates them against a pair of live scopes.
//!
//! # Core Concepts
//!
//! - **Reference**: a string in the `~` grammar; anything else is a literal
//! - **Scope**: a data tree plus the absolute path it lives at (local and global)
//! - **resolve**: reference to absolute path, without reading data
//! - **Evaluator**: reference to data, with depth-controlled recursion
//!
//! # Quick Start
//!
//! ```
//! use serde_json::json;
//! use tilde_template::{evaluate_collection, resolve, Scope};
//!
//! let data = json!({"items": [{"label": "a"}, {"label": "b"}], "title": "List"});
//! let item = data["items"][1].clone();
//!
//! let global = Scope::root(&data);
//! let local = Scope::new(&item, "data.items.1");
//!
//! let path = resolve("~.label", local.path(), &local, &global).unwrap();
//! assert_eq!(path, "data.items.1.label");
//!
//! let view = json!({"label": "~.label", "heading": "~~.title"});
//! let evaluated = evaluate_collection(&view, &local, &global, 1).unwrap();
//! assert_eq!(evaluated, Some(json!({"label": "b", "heading": "List"})));
//! ```

mod config;
mod error;
mod evaluate;
mod reference;
mod resolve;
mod scope;
mod truthy;

pub use config::TemplateConfig;
pub use error::{TemplateError, TemplateResult};
pub use evaluate::{evaluate_collection, evaluate_scalar, lookup, Evaluator};
pub use reference::{as_reference, is_reference, AncestorSearch, Reference};
pub use resolve::resolve;
pub use scope::{OwnedScope, Scope, ROOT_PATH};
pub use truthy::{is_truthy, string_to_boolean};
