//! Breadth-first flattening of a built tree into global-id arrays.
//!
//! # Id Layout
//!
//! ```text
//! global id:  0 .. N-1        N .. N+L-1
//!             internal nodes  leaves
//!             (BFS order)     (BFS order)
//!
//! boxes[id]   node box for id < N, leaf box for id >= N
//! ```
//!
//! The root is always id 0. Breadth-first numbering guarantees that every
//! child id is greater than its parent's, so array walks never cycle.

use std::collections::VecDeque;

use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};

use crate::build::{KdTree, NodeId};
use crate::constants::ROOT_PARENT;
use crate::error::{KdTreeError, LayoutError, Result};
use crate::types::Aabb;

/// Internal node record. Children and parent are global ids; `parent` is
/// `-1` for the root.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable, Serialize, Deserialize)]
pub struct FlatNode {
  pub left: i32,
  pub right: i32,
  pub parent: i32,
  pub index: i32,
}

/// Leaf record. Its triangles are
/// `triangle_indices[triangle_range_start..][..triangle_range_length]`.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable, Serialize, Deserialize)]
pub struct FlatLeaf {
  pub parent: i32,
  pub index: i32,
  pub triangle_range_start: i32,
  pub triangle_range_length: i32,
}

/// Dense, id-addressable form of a kd-tree.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FlattenedTree {
  /// Internal nodes sorted by id (`0..N`).
  pub nodes: Vec<FlatNode>,
  /// Leaves sorted by id (`N..N+L`).
  pub leaves: Vec<FlatLeaf>,
  /// Every leaf's triangle list, concatenated in leaf order.
  pub triangle_indices: Vec<u32>,
  /// Node boxes followed by leaf boxes.
  pub boxes: Vec<Aabb>,
}

impl FlattenedTree {
  #[inline]
  pub fn node_count(&self) -> usize {
    self.nodes.len()
  }

  #[inline]
  pub fn leaf_count(&self) -> usize {
    self.leaves.len()
  }

  /// Number of global ids in use.
  #[inline]
  pub fn element_count(&self) -> usize {
    self.nodes.len() + self.leaves.len()
  }

  #[inline]
  pub fn box_of(&self, id: i32) -> Option<&Aabb> {
    usize::try_from(id).ok().and_then(|i| self.boxes.get(i))
  }

  /// Triangle indices of `leaf`. Empty if its range is out of bounds.
  pub fn leaf_triangles(&self, leaf: &FlatLeaf) -> &[u32] {
    let (Ok(start), Ok(len)) = (
      usize::try_from(leaf.triangle_range_start),
      usize::try_from(leaf.triangle_range_length),
    ) else {
      return &[];
    };
    self
      .triangle_indices
      .get(start..start.saturating_add(len))
      .unwrap_or(&[])
  }

  /// Every referenced triangle exists in a mesh of `triangles` triangles.
  pub fn check_triangle_count(&self, triangles: usize) -> std::result::Result<(), LayoutError> {
    match self.triangle_indices.iter().find(|&&i| i as usize >= triangles) {
      Some(&index) => Err(LayoutError::TriangleIndexOutOfRange { index, triangles }),
      None => Ok(()),
    }
  }

  /// Parent id stored for element `id`, if `id` exists.
  fn parent_of(&self, id: i32) -> Option<i32> {
    let id = usize::try_from(id).ok()?;
    match id.checked_sub(self.nodes.len()) {
      None => self.nodes.get(id).map(|n| n.parent),
      Some(leaf) => self.leaves.get(leaf).map(|l| l.parent),
    }
  }

  fn check_parent(&self, index: i32, parent: i32) -> std::result::Result<(), LayoutError> {
    let valid = if index == 0 {
      parent == ROOT_PARENT
    } else {
      parent >= 0 && parent < index && (parent as usize) < self.nodes.len()
    };
    if valid {
      Ok(())
    } else {
      Err(LayoutError::InvalidParent { index, parent })
    }
  }

  /// Check every structural invariant of the layout.
  ///
  /// Holds for anything produced by [`flatten`]; used to vet trees read
  /// from disk.
  pub fn validate(&self) -> std::result::Result<(), LayoutError> {
    let n = self.nodes.len();
    let total = self.element_count();
    if total == 0 {
      return Err(LayoutError::Empty);
    }
    if self.leaves.len() != n + 1 {
      return Err(LayoutError::LeafCountMismatch {
        nodes: n,
        leaves: self.leaves.len(),
      });
    }
    if self.boxes.len() != total {
      return Err(LayoutError::BoxCountMismatch {
        expected: total,
        found: self.boxes.len(),
      });
    }

    for (position, node) in self.nodes.iter().enumerate() {
      if node.index != position as i32 {
        return Err(LayoutError::NodeIndexMismatch {
          position,
          index: node.index,
        });
      }
      self.check_parent(node.index, node.parent)?;
    }

    for (position, leaf) in self.leaves.iter().enumerate() {
      if leaf.index != (n + position) as i32 {
        return Err(LayoutError::LeafIndexMismatch {
          position,
          index: leaf.index,
        });
      }
      self.check_parent(leaf.index, leaf.parent)?;

      let in_bounds = leaf.triangle_range_start >= 0
        && leaf.triangle_range_length >= 0
        && (leaf.triangle_range_start as usize + leaf.triangle_range_length as usize)
          <= self.triangle_indices.len();
      if !in_bounds {
        return Err(LayoutError::LeafRangeOutOfBounds {
          leaf: leaf.index,
          start: leaf.triangle_range_start,
          length: leaf.triangle_range_length,
          available: self.triangle_indices.len(),
        });
      }
    }

    // With N + 1 leaves, 2N distinct child references that all point back
    // cover every non-root element exactly once.
    for node in &self.nodes {
      for child in [node.left, node.right] {
        if child <= node.index || child as usize >= total || node.left == node.right {
          return Err(LayoutError::InvalidChild {
            node: node.index,
            child,
          });
        }
        match self.parent_of(child) {
          Some(parent) if parent == node.index => {}
          parent => {
            return Err(LayoutError::InvalidParent {
              index: child,
              parent: parent.unwrap_or(ROOT_PARENT),
            })
          }
        }
      }
    }

    Ok(())
  }
}

/// Flatten `tree` breadth-first.
///
/// # Errors
///
/// [`KdTreeError::IdOverflow`] if the element count or the number of
/// triangle references does not fit an `i32` id.
#[tracing::instrument(skip_all, name = "kd_tree::flatten", fields(nodes = tree.len()))]
pub fn flatten(tree: &KdTree) -> Result<FlattenedTree> {
  let arena = tree.arena();

  let mut internal = Vec::new();
  let mut leaves = Vec::new();
  let mut queue = VecDeque::from([NodeId::ROOT]);
  while let Some(id) = queue.pop_front() {
    match arena[id].children {
      Some([left, right]) => {
        internal.push((id, [left, right]));
        queue.push_back(left);
        queue.push_back(right);
      }
      None => leaves.push(id),
    }
  }

  let total = internal.len() + leaves.len();
  let references: usize = leaves.iter().map(|&id| arena[id].triangles.len()).sum();
  let largest = total.max(references);
  if largest > i32::MAX as usize {
    return Err(KdTreeError::IdOverflow { count: largest });
  }

  // Arena handle -> global id.
  let mut global = vec![0i32; arena.len()];
  let ordered = || internal.iter().map(|&(id, _)| id).chain(leaves.iter().copied());
  for (gid, id) in ordered().enumerate() {
    global[id.index()] = gid as i32;
  }
  let parent_id = |id: NodeId| arena[id].parent.map_or(ROOT_PARENT, |p| global[p.index()]);

  let mut nodes: Vec<FlatNode> = internal
    .iter()
    .map(|&(id, [left, right])| FlatNode {
      left: global[left.index()],
      right: global[right.index()],
      parent: parent_id(id),
      index: global[id.index()],
    })
    .collect();

  let mut triangle_indices = Vec::with_capacity(references);
  let mut flat_leaves: Vec<FlatLeaf> = leaves
    .iter()
    .map(|&id| {
      let triangles = &arena[id].triangles;
      let start = triangle_indices.len() as i32;
      triangle_indices.extend_from_slice(triangles);
      FlatLeaf {
        parent: parent_id(id),
        index: global[id.index()],
        triangle_range_start: start,
        triangle_range_length: triangles.len() as i32,
      }
    })
    .collect();

  let boxes = ordered().map(|id| arena[id].aabb).collect();

  // Records are looked up positionally by global id.
  nodes.sort_unstable_by_key(|node| node.index);
  flat_leaves.sort_unstable_by_key(|leaf| leaf.index);

  Ok(FlattenedTree {
    nodes,
    leaves: flat_leaves,
    triangle_indices,
    boxes,
  })
}

#[cfg(test)]
#[path = "flatten_test.rs"]
mod flatten_test;
