//! Node splitting: SAH plane choice, child partitioning and the depth-first
//! subdivision loop shared by the serial and parallel builds.

use super::arena::{BuildArena, BuildNode, NodeId};
use crate::config::{BuildConfig, CancelFlag};
use crate::constants::MAX_LEAF_TRIANGLES;
use crate::error::{KdTreeError, Result};
use crate::intersect::triangle_intersects_aabb;
use crate::sah::best_split;
use crate::types::{Aabb, Triangle};

/// Read-only state shared by every split of one build.
///
/// `max_depth` is the depth budget counted from `base_depth`: the whole
/// tree starts at 0, a parallel subtree at the depth of its root.
#[derive(Clone, Copy, Debug)]
pub struct BuildContext<'a> {
  pub triangles: &'a [Triangle],
  pub max_depth: u32,
  pub base_depth: u32,
  pub cancel: Option<&'a CancelFlag>,
}

impl<'a> BuildContext<'a> {
  pub fn new(triangles: &'a [Triangle], config: &'a BuildConfig) -> Self {
    Self {
      triangles,
      max_depth: config.max_depth,
      base_depth: 0,
      cancel: config.cancel.as_ref(),
    }
  }

  /// Context for a subtree whose root sits at `root_depth`. The budget left
  /// is `max_depth - (root_depth + 1)` levels, counted from that root.
  pub fn subtree(&self, root_depth: u32) -> Self {
    Self {
      max_depth: self.max_depth.saturating_sub(root_depth.saturating_add(1)),
      base_depth: root_depth,
      ..*self
    }
  }

  /// Nodes deeper than `max_depth - 2` (relative to `base_depth`) are never
  /// split.
  #[inline]
  pub fn depth_allows_split(&self, depth: u32) -> bool {
    depth
      .saturating_sub(self.base_depth)
      .saturating_add(2)
      <= self.max_depth
  }

  #[inline]
  fn check_cancelled(&self) -> Result<()> {
    match self.cancel {
      Some(flag) if flag.is_cancelled() => Err(KdTreeError::Cancelled),
      _ => Ok(()),
    }
  }
}

/// More triangles than a leaf should hold.
#[inline]
pub fn needs_split(node: &BuildNode) -> bool {
  node.triangles.len() > MAX_LEAF_TRIANGLES
}

/// Triangles of `indices` that overlap `aabb`, in input order.
fn overlapping(triangles: &[Triangle], indices: &[u32], aabb: &Aabb) -> Vec<u32> {
  indices
    .iter()
    .copied()
    .filter(|&i| triangle_intersects_aabb(&triangles[i as usize], aabb))
    .collect()
}

/// Split one leaf at its cheapest SAH plane.
///
/// Returns `None` when the node is too deep to split. Triangles straddling
/// the plane are referenced by both children.
pub fn split_node(
  ctx: &BuildContext<'_>,
  arena: &mut BuildArena,
  id: NodeId,
) -> Result<Option<[NodeId; 2]>> {
  ctx.check_cancelled()?;

  let node = &arena[id];
  if !ctx.depth_allows_split(node.depth) {
    return Ok(None);
  }

  let plane = best_split(&node.aabb, ctx.triangles, &node.triangles);
  let (left_box, right_box) = node.aabb.split(plane.axis, plane.position);
  let left = overlapping(ctx.triangles, &node.triangles, &left_box);
  let right = overlapping(ctx.triangles, &node.triangles, &right_box);

  Ok(Some(arena.add_children(
    id,
    [(left_box, left), (right_box, right)],
  )))
}

/// Subdivide the subtree under `start` until every leaf holds at most
/// `MAX_LEAF_TRIANGLES` triangles or is too deep to split.
///
/// Nodes that reach `stop_depth` while still needing a split are left as
/// leaves and returned in visit order (left before right), so the caller can
/// finish them elsewhere. Pass `u32::MAX` to build the whole subtree.
///
/// Walks with an explicit stack so deep trees cannot overflow a worker
/// thread's stack.
pub fn split_until(
  ctx: &BuildContext<'_>,
  arena: &mut BuildArena,
  start: NodeId,
  stop_depth: u32,
) -> Result<Vec<NodeId>> {
  let mut deferred = Vec::new();
  let mut stack = Vec::new();
  if needs_split(&arena[start]) {
    stack.push(start);
  }

  while let Some(id) = stack.pop() {
    if arena[id].depth >= stop_depth {
      deferred.push(id);
      continue;
    }

    if let Some([left, right]) = split_node(ctx, arena, id)? {
      for child in [right, left] {
        if needs_split(&arena[child]) {
          stack.push(child);
        }
      }
    }
  }

  Ok(deferred)
}

#[cfg(test)]
#[path = "splitter_test.rs"]
mod splitter_test;
