//! Error types for tree construction and flattened-layout validation.
//!
//! Cache failures live in [`crate::cache::CacheError`]; they are recovered
//! by rebuilding and never reach callers of `load_or_build`.

use thiserror::Error;

/// Errors surfaced by `build` and `flatten`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KdTreeError {
  /// No triangles: the root box would never be bounded.
  #[error("cannot build a kd-tree from an empty mesh")]
  EmptyMesh,

  /// NaN or infinite coordinates would poison every box test.
  #[error("triangle {triangle} has a non-finite vertex")]
  NonFiniteVertex { triangle: usize },

  /// A tree needs at least one level.
  #[error("max_depth must be at least 1, got {max_depth}")]
  InvalidDepth { max_depth: u32 },

  /// More elements than the 32-bit signed id space of the GPU layout allows.
  #[error("{count} elements exceed the 32-bit id space")]
  IdOverflow { count: usize },

  /// Cancellation observed on the serial build path.
  #[error("build cancelled")]
  Cancelled,

  /// A parallel subtree task did not complete. Reported after every task
  /// has joined.
  #[error("subtree task {subtree} failed: {reason}")]
  TaskFailure { subtree: usize, reason: String },
}

/// Structural defects of a [`crate::FlattenedTree`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LayoutError {
  #[error("flattened tree has no root")]
  Empty,

  #[error("expected {expected} boxes, found {found}")]
  BoxCountMismatch { expected: usize, found: usize },

  #[error("{nodes} internal nodes need {} leaves, found {leaves}", .nodes + 1)]
  LeafCountMismatch { nodes: usize, leaves: usize },

  #[error("node at position {position} carries id {index}")]
  NodeIndexMismatch { position: usize, index: i32 },

  #[error("leaf at position {position} carries id {index}")]
  LeafIndexMismatch { position: usize, index: i32 },

  #[error("node {node} references invalid child {child}")]
  InvalidChild { node: i32, child: i32 },

  #[error("element {index} references invalid parent {parent}")]
  InvalidParent { index: i32, parent: i32 },

  #[error("triangle index {index} out of range for a mesh of {triangles} triangles")]
  TriangleIndexOutOfRange { index: u32, triangles: usize },

  #[error("leaf {leaf} range {start}+{length} exceeds {available} triangle indices")]
  LeafRangeOutOfBounds {
    leaf: i32,
    start: i32,
    length: i32,
    available: usize,
  },
}

/// Result type alias for tree operations.
pub type Result<T> = core::result::Result<T, KdTreeError>;
