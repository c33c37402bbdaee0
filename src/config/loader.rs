// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::config::model::FlowFile;
use crate::config::validate::validate_flow;
use crate::errors::Result;

/// Load a flow definition from a given path and return the raw `FlowFile`.
///
/// This only performs TOML deserialization; it does **not** perform semantic
/// validation (graph correctness, etc.). Use [`load_and_validate`] for that.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<FlowFile> {
    let path = path.as_ref();
    let contents =
        fs::read_to_string(path).with_context(|| format!("reading flow file at {:?}", path))?;

    let flow: FlowFile = toml::from_str(&contents)?;

    Ok(flow)
}

/// Load a flow definition from path and run full validation.
///
/// This is the recommended entry point for the rest of the application:
///
/// - Reads TOML.
/// - Applies defaults (handled by `serde` + `Default` impls).
/// - Checks for:
///   - duplicate task names,
///   - self-dependencies,
///   - unknown `depends_on` / `any_of` / child references,
///   - graph cycles.
///
/// All problems are collected and reported together; any problem aborts the
/// run before a single process is spawned.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<FlowFile> {
    let flow = load_from_path(&path)?;
    validate_flow(&flow)?;
    Ok(flow)
}

/// Helper to resolve a default flow path.
///
/// Currently this just returns `Flowdag.toml` in the current working
/// directory; the function exists so flow discovery (env var, search paths)
/// has a single place to grow.
pub fn default_flow_path() -> PathBuf {
    PathBuf::from("Flowdag.toml")
}
