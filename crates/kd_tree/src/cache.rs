//! Side-car persistence of flattened trees.
//!
//! A mesh at `scene/model.obj` caches its tree at `scene/model.obj.tree` as
//! a JSON document with `nodes`, `leaves`, `triangle_indices` and `boxes`.
//! A cache is trusted when it parses, passes [`FlattenedTree::validate`]
//! and only references triangles the mesh has. Nothing ties it to the mesh
//! contents, so editing a mesh in place requires deleting its `.tree` file.

use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::build::build;
use crate::config::BuildConfig;
use crate::error::{LayoutError, Result};
use crate::flatten::FlattenedTree;
use crate::types::Triangle;

/// Extension appended to the mesh path.
pub const CACHE_EXTENSION: &str = "tree";

#[derive(Debug, Error)]
pub enum CacheError {
  #[error("cache i/o failed: {0}")]
  Io(#[from] io::Error),

  #[error("cache is not a valid tree document: {0}")]
  Parse(#[from] serde_json::Error),

  #[error("cache is structurally invalid: {0}")]
  Malformed(#[from] LayoutError),
}

/// How [`load_or_build`] obtained its tree.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CacheOutcome {
  Hit,
  /// The cache was missing or unusable; `reason` says why.
  Rebuilt { reason: String },
}

/// `<mesh path>.tree`, keeping the mesh's own extension.
pub fn cache_path(mesh_path: &Path) -> PathBuf {
  let mut path = OsString::from(mesh_path.as_os_str());
  path.push(".");
  path.push(CACHE_EXTENSION);
  PathBuf::from(path)
}

pub fn encode(tree: &FlattenedTree) -> std::result::Result<String, CacheError> {
  Ok(serde_json::to_string_pretty(tree)?)
}

/// Parse and structurally validate a cache document.
pub fn decode(text: &str) -> std::result::Result<FlattenedTree, CacheError> {
  let tree: FlattenedTree = serde_json::from_str(text)?;
  tree.validate()?;
  Ok(tree)
}

#[tracing::instrument(skip_all, name = "cache::load", fields(path = %path.display()))]
pub fn load(path: &Path) -> std::result::Result<FlattenedTree, CacheError> {
  decode(&fs::read_to_string(path)?)
}

#[tracing::instrument(skip_all, name = "cache::store", fields(path = %path.display()))]
pub fn store(path: &Path, tree: &FlattenedTree) -> std::result::Result<(), CacheError> {
  fs::write(path, encode(tree)?)?;
  Ok(())
}

/// Load the cached tree for `mesh_path`, or build it from `triangles` and
/// write the cache.
///
/// Cache problems never fail the call: an unreadable, malformed or
/// out-of-range cache is rebuilt, and a failed write is only logged.
///
/// # Errors
///
/// Only build and flatten errors are returned.
pub fn load_or_build(
  mesh_path: &Path,
  triangles: &[Triangle],
  config: &BuildConfig,
) -> Result<(FlattenedTree, CacheOutcome)> {
  let path = cache_path(mesh_path);

  let reason = match load(&path) {
    Ok(tree) => match tree.check_triangle_count(triangles.len()) {
      Ok(()) => {
        tracing::info!(path = %path.display(), nodes = tree.node_count(), "kd-tree cache hit");
        return Ok((tree, CacheOutcome::Hit));
      }
      Err(err) => {
        tracing::warn!(path = %path.display(), %err, "stale kd-tree cache, rebuilding");
        err.to_string()
      }
    },
    Err(CacheError::Io(err)) if err.kind() == io::ErrorKind::NotFound => {
      tracing::info!(path = %path.display(), "no kd-tree cache, building");
      "no cache file".to_string()
    }
    Err(err) => {
      tracing::warn!(path = %path.display(), %err, "unusable kd-tree cache, rebuilding");
      err.to_string()
    }
  };

  let tree = build(triangles, config)?.flatten()?;
  if let Err(err) = store(&path, &tree) {
    tracing::warn!(path = %path.display(), %err, "failed to write kd-tree cache");
  }
  Ok((tree, CacheOutcome::Rebuilt { reason }))
}

#[cfg(test)]
#[path = "cache_test.rs"]
mod cache_test;
