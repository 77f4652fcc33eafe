//! Shape and timing statistics of a built tree.

use std::fmt;

use crate::build::KdTree;
use crate::flatten::FlattenedTree;

/// Statistics from one build (or one cache load).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BuildStats {
  /// Internal nodes.
  pub node_count: usize,
  pub leaf_count: usize,
  /// Sum of leaf triangle counts. Exceeds the mesh size by the number of
  /// extra references to straddling triangles.
  pub triangle_references: usize,
  pub max_leaf_triangles: usize,
  /// Depth of the deepest leaf (root = 0).
  pub max_leaf_depth: u32,
  /// Wall time in microseconds, 0 when not measured.
  pub build_us: u64,
}

impl BuildStats {
  pub fn from_tree(tree: &KdTree, build_us: u64) -> Self {
    let mut stats = Self {
      build_us,
      ..Self::default()
    };
    for (_, node) in tree.arena().iter() {
      if node.is_leaf() {
        stats.add_leaf(node.triangles.len(), node.depth);
      } else {
        stats.node_count += 1;
      }
    }
    stats
  }

  /// Same figures from the flattened form, deriving depths from parent
  /// links.
  pub fn from_flattened(tree: &FlattenedTree, build_us: u64) -> Self {
    // Parents always precede their children, so one forward pass suffices.
    let mut depths = vec![0u32; tree.element_count()];
    let mut depth_of = |index: i32, parent: i32| {
      let depth = usize::try_from(parent)
        .ok()
        .and_then(|p| depths.get(p))
        .map_or(0, |d| d + 1);
      if let Some(slot) = usize::try_from(index).ok().and_then(|i| depths.get_mut(i)) {
        *slot = depth;
      }
      depth
    };

    let mut stats = Self {
      node_count: tree.node_count(),
      build_us,
      ..Self::default()
    };
    for node in &tree.nodes {
      depth_of(node.index, node.parent);
    }
    for leaf in &tree.leaves {
      let depth = depth_of(leaf.index, leaf.parent);
      stats.add_leaf(tree.leaf_triangles(leaf).len(), depth);
    }
    stats
  }

  fn add_leaf(&mut self, triangles: usize, depth: u32) {
    self.leaf_count += 1;
    self.triangle_references += triangles;
    self.max_leaf_triangles = self.max_leaf_triangles.max(triangles);
    self.max_leaf_depth = self.max_leaf_depth.max(depth);
  }

  /// Mean triangles per leaf.
  pub fn average_leaf_triangles(&self) -> f64 {
    if self.leaf_count == 0 {
      0.0
    } else {
      self.triangle_references as f64 / self.leaf_count as f64
    }
  }
}

impl fmt::Display for BuildStats {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(
      f,
      "{} nodes, {} leaves, {} triangle refs (avg {:.2}, max {} per leaf), depth {}, {:.2} ms",
      self.node_count,
      self.leaf_count,
      self.triangle_references,
      self.average_leaf_triangles(),
      self.max_leaf_triangles,
      self.max_leaf_depth,
      self.build_us as f64 / 1000.0
    )
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::build::build;
  use crate::config::BuildConfig;
  use crate::test_utils::{scattered_triangles, unit_triangle};

  #[test]
  fn test_single_leaf() {
    let tree = build(&[unit_triangle()], &BuildConfig::default()).unwrap();
    let stats = BuildStats::from_tree(&tree, 0);
    assert_eq!(stats.node_count, 0);
    assert_eq!(stats.leaf_count, 1);
    assert_eq!(stats.triangle_references, 1);
    assert_eq!(stats.max_leaf_depth, 0);
  }

  #[test]
  fn test_flattened_matches_tree() {
    let triangles = scattered_triangles(200, 10.0, 1.0, 19);
    let tree = build(&triangles, &BuildConfig::default().with_max_depth(7)).unwrap();
    let flat = tree.flatten().unwrap();

    assert_eq!(
      BuildStats::from_tree(&tree, 42),
      BuildStats::from_flattened(&flat, 42)
    );
  }

  #[test]
  fn test_references_cover_mesh() {
    let triangles = scattered_triangles(200, 10.0, 1.0, 23);
    let tree = build(&triangles, &BuildConfig::default().with_max_depth(7)).unwrap();
    let stats = BuildStats::from_tree(&tree, 0);

    assert!(stats.triangle_references >= triangles.len());
    assert!(stats.max_leaf_depth <= 6);
    assert!(stats.average_leaf_triangles() > 0.0);
  }

  #[test]
  fn test_display() {
    let stats = BuildStats {
      node_count: 3,
      leaf_count: 4,
      triangle_references: 10,
      max_leaf_triangles: 4,
      max_leaf_depth: 2,
      build_us: 1500,
    };
    assert_eq!(
      stats.to_string(),
      "3 nodes, 4 leaves, 10 triangle refs (avg 2.50, max 4 per leaf), depth 2, 1.50 ms"
    );
  }
}
