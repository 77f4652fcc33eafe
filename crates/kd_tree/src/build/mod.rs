//! Tree construction.
//!
//! # Module Structure
//!
//! - [`arena`]: `BuildArena` / `NodeId` - handle-addressed node storage
//! - [`splitter`]: SAH node splitting and the subdivision loop
//! - [`parallel`]: serial top levels, one rayon task per depth-2 subtree
//!
//! # Depth Convention
//!
//! The root is depth 0. A serial build splits a node only while
//! `depth + 2 <= max_depth`, so a tree built with `max_depth = D` has at most
//! `D` levels and every leaf sits at depth `<= D - 1`.
//!
//! The parallel build gives each depth-2 subtree a budget of `D - 3` levels
//! counted from its root, so its leaves sit at depth `<= D - 2`.

pub mod arena;
pub mod parallel;
pub mod splitter;

pub use arena::{BuildArena, BuildNode, NodeId};
pub use splitter::BuildContext;

use web_time::Instant;

use crate::config::BuildConfig;
use crate::constants::{PARALLEL_MIN_DEPTH, ROOT_PADDING};
use crate::error::{KdTreeError, Result};
use crate::flatten::FlattenedTree;
use crate::stats::BuildStats;
use crate::types::{Aabb, Triangle};

/// A finished kd-tree in arena form. Immutable once built.
#[derive(Clone, Debug, PartialEq)]
pub struct KdTree {
  arena: BuildArena,
  max_depth: u32,
}

impl KdTree {
  #[inline]
  pub fn root(&self) -> &BuildNode {
    &self.arena[NodeId::ROOT]
  }

  #[inline]
  pub fn node(&self, id: NodeId) -> Option<&BuildNode> {
    self.arena.get(id)
  }

  /// Total number of nodes, internal and leaf.
  #[inline]
  pub fn len(&self) -> usize {
    self.arena.len()
  }

  /// Always false: a tree has at least its root.
  #[inline]
  pub fn is_empty(&self) -> bool {
    self.arena.is_empty()
  }

  #[inline]
  pub fn max_depth(&self) -> u32 {
    self.max_depth
  }

  #[inline]
  pub fn arena(&self) -> &BuildArena {
    &self.arena
  }

  pub fn leaves(&self) -> impl Iterator<Item = (NodeId, &BuildNode)> {
    self.arena.iter().filter(|(_, node)| node.is_leaf())
  }

  /// Breadth-first flattening into global-id arrays.
  pub fn flatten(&self) -> Result<FlattenedTree> {
    crate::flatten::flatten(self)
  }
}

fn validate_input(triangles: &[Triangle], config: &BuildConfig) -> Result<()> {
  if config.max_depth == 0 {
    return Err(KdTreeError::InvalidDepth {
      max_depth: config.max_depth,
    });
  }
  if triangles.is_empty() {
    return Err(KdTreeError::EmptyMesh);
  }
  if let Some(triangle) = triangles.iter().position(|t| !t.is_finite()) {
    return Err(KdTreeError::NonFiniteVertex { triangle });
  }
  if triangles.len() > i32::MAX as usize {
    return Err(KdTreeError::IdOverflow {
      count: triangles.len(),
    });
  }
  Ok(())
}

/// Build a kd-tree over `triangles`.
///
/// Runs the fork/join build when `config.parallel` is set and
/// `config.max_depth >= PARALLEL_MIN_DEPTH`, the serial build otherwise.
/// The two agree down to depth 2; below that the parallel subtrees stop one
/// level earlier.
///
/// # Errors
///
/// - [`KdTreeError::InvalidDepth`] for `max_depth == 0`
/// - [`KdTreeError::EmptyMesh`] / [`KdTreeError::NonFiniteVertex`] for bad input
/// - [`KdTreeError::Cancelled`] when cancelled on the calling thread
/// - [`KdTreeError::TaskFailure`] when a parallel subtree was cancelled or
///   panicked
#[tracing::instrument(skip_all, name = "kd_tree::build", fields(triangles = triangles.len()))]
pub fn build(triangles: &[Triangle], config: &BuildConfig) -> Result<KdTree> {
  validate_input(triangles, config)?;

  let root_box = Aabb::from_triangles(triangles).padded(ROOT_PADDING);
  let mut arena = BuildArena::with_root(root_box, (0..triangles.len() as u32).collect(), 0);
  let ctx = BuildContext::new(triangles, config);

  if config.parallel && config.max_depth >= PARALLEL_MIN_DEPTH {
    parallel::build_parallel(&ctx, &mut arena)?;
  } else {
    let _span = tracing::info_span!("serial_build").entered();
    splitter::split_until(&ctx, &mut arena, NodeId::ROOT, u32::MAX)?;
  }

  tracing::debug!(nodes = arena.len(), "kd-tree built");
  Ok(KdTree {
    arena,
    max_depth: config.max_depth,
  })
}

/// [`build`] plus timing and shape statistics.
pub fn build_timed(triangles: &[Triangle], config: &BuildConfig) -> Result<(KdTree, BuildStats)> {
  let start = Instant::now();
  let tree = build(triangles, config)?;
  let build_us = start.elapsed().as_micros() as u64;

  let stats = BuildStats::from_tree(&tree, build_us);
  Ok((tree, stats))
}
