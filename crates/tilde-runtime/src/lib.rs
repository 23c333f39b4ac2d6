//! Reactions, data mapping and network-bound actions over tilde stores.
//!
//! # Core Concepts
//!
//! - **BindingContext**: the local and global scopes a reaction is evaluated in
//! - **Reaction**: `setData`, `addData`, `removeData` and `moveData` descriptors
//! - **Runtime**: the transport, session latch and processors used by actions
//! - **Actions**: `fetch_data` and `submit_data`, one in flight per [`Session`]
//! - **Data mapping**: processors (built-in `simpleMapping`) dispatching a response to
//!   several locations
//! - **Document**: the application payload, with additional data sources
//!
//! # Quick Start
//!
//! ```
//! use serde_json::json;
//! use tilde_runtime::{dispatch_reactions, BindingContext, Reaction};
//! use tilde_state::StoreHandle;
//! use tilde_template::Evaluator;
//!
//! let store = StoreHandle::from_value(json!({"todo": []}));
//! let ctx = BindingContext::from_target(&store).unwrap();
//!
//! let reactions: Vec<Reaction> = serde_json::from_value(json!([
//!     {"what": "addData", "path": "~~.todo", "value": "write docs"},
//!     {"what": "setData", "path": "~~.count", "value": 1}
//! ]))
//! .unwrap();
//! dispatch_reactions(&reactions, &ctx, &store, &Evaluator::default());
//!
//! assert_eq!(
//!     *store.snapshot().unwrap(),
//!     json!({"todo": ["write docs"], "count": 1})
//! );
//! ```

mod action;
mod config;
mod context;
mod document;
mod error;
mod mapping;
mod processor;
mod reaction;
mod runtime;
mod session;
mod source;
mod transport;

pub use action::{fetch_data, submit_data, ActionOutcome, HttpActionArgs};
pub use config::EngineConfig;
pub use context::BindingContext;
pub use document::{Document, LoadedDocument};
pub use error::{RuntimeError, RuntimeResult};
pub use mapping::{
    apply_data_mapping, MappingProcessor, MappingRegistry, MappingRegistryError, SimpleMapping,
    SIMPLE_MAPPING,
};
pub use processor::{alter_data, DataProcessor, ProcessorInput, RequestContext, ResponseContext};
pub use reaction::{
    add_data, dispatch_reactions, move_data, remove_data, set_data, AddDataArgs, MoveDataArgs,
    Reaction, RemoveDataArgs, SetDataArgs,
};
pub use runtime::Runtime;
pub use session::{Session, SubmissionGuard};
pub use source::{load_additional_sources, merge_data_source_result, AdditionalDataSource};
pub use transport::{FetchRequest, FetchResponse, Transport};
