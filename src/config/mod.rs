// src/config/mod.rs

//! Flow definition loading, validation and group expansion.
//!
//! - [`model`] is the serde mapping of the TOML flow document.
//! - [`loader`] reads and parses the document.
//! - [`validate`] rejects malformed graphs before anything is spawned.
//! - [`expand`] flattens task groups into the flat ordered task list the
//!   rest of the system operates on.

pub mod expand;
pub mod loader;
pub mod model;
pub mod validate;

pub use expand::{expand_groups, substitute_run_dir};
pub use loader::{default_flow_path, load_and_validate, load_from_path};
pub use model::{FlowFile, RunDefaults, TaskSpec};
pub use validate::validate_flow;
