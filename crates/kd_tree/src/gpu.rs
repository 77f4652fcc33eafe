//! Fixed-stride buffers for upload to a traversal shader.
//!
//! | buffer             | record                                        | stride |
//! |--------------------|-----------------------------------------------|--------|
//! | `nodes`            | `left, right, parent, index` (i32)            | 16     |
//! | `leaves`           | `parent, index, range_start, range_length`    | 16     |
//! | `triangle_indices` | i32                                           | 4      |
//! | `boxes`            | `min.xyz, max.xyz` (f32)                      | 24     |
//!
//! Byte views are in native byte order, which is little-endian on every
//! target with a GPU API.

use bytemuck::{Pod, Zeroable};

use crate::flatten::{FlatLeaf, FlatNode, FlattenedTree};
use crate::types::Aabb;

/// Tightly packed box, without the padding a `Vec3A` layout would add.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct GpuAabb {
  pub min: [f32; 3],
  pub max: [f32; 3],
}

impl From<&Aabb> for GpuAabb {
  fn from(aabb: &Aabb) -> Self {
    Self {
      min: aabb.min.to_array(),
      max: aabb.max.to_array(),
    }
  }
}

/// Flattened tree ready for buffer creation.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GpuBuffers {
  pub nodes: Vec<FlatNode>,
  pub leaves: Vec<FlatLeaf>,
  pub triangle_indices: Vec<i32>,
  pub boxes: Vec<GpuAabb>,
  /// Leaf ids start here; shaders use it to tell nodes from leaves.
  pub node_count: u32,
}

impl GpuBuffers {
  /// Copy `tree` into GPU records. Triangle indices of a built tree always
  /// fit an `i32`.
  pub fn from_tree(tree: &FlattenedTree) -> Self {
    Self {
      nodes: tree.nodes.clone(),
      leaves: tree.leaves.clone(),
      triangle_indices: tree.triangle_indices.iter().map(|&i| i as i32).collect(),
      boxes: tree.boxes.iter().map(GpuAabb::from).collect(),
      node_count: tree.nodes.len() as u32,
    }
  }

  pub fn nodes_bytes(&self) -> &[u8] {
    bytemuck::cast_slice(&self.nodes)
  }

  pub fn leaves_bytes(&self) -> &[u8] {
    bytemuck::cast_slice(&self.leaves)
  }

  pub fn triangle_indices_bytes(&self) -> &[u8] {
    bytemuck::cast_slice(&self.triangle_indices)
  }

  pub fn boxes_bytes(&self) -> &[u8] {
    bytemuck::cast_slice(&self.boxes)
  }
}
