//! Arena storage for a tree under construction.
//!
//! Nodes live in one `Vec` and refer to each other through dense
//! [`NodeId`] handles. Parent links are plain handles, so there are no
//! ownership cycles and a finished arena can be walked in any order.

use std::ops::Index;

use crate::types::Aabb;

/// Dense handle into a [`BuildArena`], assigned in creation order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
  /// Every arena is created around its root.
  pub const ROOT: NodeId = NodeId(0);

  #[inline]
  pub fn index(self) -> usize {
    self.0 as usize
  }
}

/// One node of the tree being built.
///
/// Internal nodes have both children and an empty triangle list; leaves have
/// no children and own their triangle indices.
#[derive(Clone, Debug, PartialEq)]
pub struct BuildNode {
  pub aabb: Aabb,
  pub triangles: Vec<u32>,
  pub children: Option<[NodeId; 2]>,
  pub parent: Option<NodeId>,
  pub depth: u32,
}

impl BuildNode {
  #[inline]
  pub fn is_leaf(&self) -> bool {
    self.children.is_none()
  }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct BuildArena {
  nodes: Vec<BuildNode>,
}

impl BuildArena {
  /// Arena holding a single root node at `depth`.
  pub fn with_root(aabb: Aabb, triangles: Vec<u32>, depth: u32) -> Self {
    Self {
      nodes: vec![BuildNode {
        aabb,
        triangles,
        children: None,
        parent: None,
        depth,
      }],
    }
  }

  #[inline]
  pub fn len(&self) -> usize {
    self.nodes.len()
  }

  #[inline]
  pub fn is_empty(&self) -> bool {
    self.nodes.is_empty()
  }

  #[inline]
  pub fn get(&self, id: NodeId) -> Option<&BuildNode> {
    self.nodes.get(id.index())
  }

  pub fn iter(&self) -> impl Iterator<Item = (NodeId, &BuildNode)> {
    self
      .nodes
      .iter()
      .enumerate()
      .map(|(i, node)| (NodeId(i as u32), node))
  }

  /// Turn leaf `parent` into an internal node with two new children.
  ///
  /// The parent's triangle list is released; the children sit one level
  /// deeper.
  pub fn add_children(&mut self, parent: NodeId, sides: [(Aabb, Vec<u32>); 2]) -> [NodeId; 2] {
    let depth = self.nodes[parent.index()].depth + 1;
    let first = self.nodes.len() as u32;
    let ids = [NodeId(first), NodeId(first + 1)];

    for (aabb, triangles) in sides {
      self.nodes.push(BuildNode {
        aabb,
        triangles,
        children: None,
        parent: Some(parent),
        depth,
      });
    }

    let node = &mut self.nodes[parent.index()];
    node.children = Some(ids);
    node.triangles = Vec::new();
    ids
  }

  /// Move node `id` out into a fresh arena of its own, keeping its box,
  /// depth and triangles. The node left behind is an empty leaf until
  /// [`graft`](Self::graft) puts the built subtree back.
  pub fn detach(&mut self, id: NodeId) -> BuildArena {
    let node = &mut self.nodes[id.index()];
    let triangles = std::mem::take(&mut node.triangles);
    BuildArena::with_root(node.aabb, triangles, node.depth)
  }

  /// Replace node `at` with the root of `subtree` and append the rest of
  /// `subtree`, remapping every handle.
  ///
  /// `at` keeps its own parent link; the subtree root's box and depth are
  /// expected to match `at`.
  pub fn graft(&mut self, at: NodeId, subtree: BuildArena) {
    let offset = self.nodes.len() as u32 - 1;
    let remap = |id: NodeId| {
      if id == NodeId::ROOT {
        at
      } else {
        NodeId(id.0 + offset)
      }
    };

    let mut nodes = subtree.nodes.into_iter();
    if let Some(root) = nodes.next() {
      let target = &mut self.nodes[at.index()];
      debug_assert_eq!(target.depth, root.depth, "graft depth mismatch");
      target.triangles = root.triangles;
      target.children = root.children.map(|c| c.map(remap));
    }

    for mut node in nodes {
      node.parent = node.parent.map(remap);
      node.children = node.children.map(|c| c.map(remap));
      self.nodes.push(node);
    }
  }
}

impl Index<NodeId> for BuildArena {
  type Output = BuildNode;

  #[inline]
  fn index(&self, id: NodeId) -> &BuildNode {
    &self.nodes[id.index()]
  }
}

#[cfg(test)]
#[path = "arena_test.rs"]
mod arena_test;
