//! kd_tree - SAH kd-tree construction for static triangle meshes
//!
//! Builds a binary kd-tree over a triangle soup and flattens it into dense,
//! id-addressable arrays that array-based traversal code (compute shaders)
//! can consume directly.
//!
//! # Features
//!
//! - **SAH splitting**: 15 sampled planes per node along the longest axis,
//!   scored with a half-surface-area heuristic
//! - **Exact overlap test**: triangle plane + box face planes; straddling
//!   triangles are referenced by both children, never clipped
//! - **Parallel build**: the top two levels are split serially, the four
//!   grandchild subtrees are built concurrently with rayon, each with the
//!   remaining `max_depth - 3` levels
//! - **Flattening**: breadth-first global ids, separate node/leaf arrays,
//!   one shared triangle-index array and a positional box array
//! - **Cache**: JSON side-car file next to the mesh, rebuilt when unreadable
//!
//! # Example
//!
//! ```ignore
//! use kd_tree::{build, BuildConfig, Triangle};
//! use glam::Vec3;
//!
//! let triangles = vec![Triangle::new(Vec3::ZERO, Vec3::X, Vec3::Y)];
//! let tree = build(&triangles, &BuildConfig::default().with_max_depth(12))?;
//! let flat = tree.flatten()?;
//!
//! let buffers = kd_tree::GpuBuffers::from_tree(&flat);
//! upload(buffers.nodes_bytes(), buffers.leaves_bytes(), buffers.node_count);
//! ```

pub mod constants;
pub mod error;
pub mod types;

pub use constants::{
  MAX_LEAF_TRIANGLES, PARALLEL_MIN_DEPTH, PARALLEL_SPLIT_DEPTH, PLANE_EPSILON, ROOT_PADDING,
  SAH_SAMPLES,
};
pub use error::{KdTreeError, LayoutError, Result};
pub use types::{Aabb, Axis, Triangle};

// Build parameters
pub mod config;
pub use config::{BuildConfig, CancelFlag};

// Geometry predicates and split scoring
pub mod intersect;
pub mod sah;
pub use intersect::triangle_intersects_aabb;
pub use sah::{best_split, sah_cost, split_axis, SplitPlane};

// Tree construction (serial splitter + parallel coordinator)
pub mod build;
pub use build::{build, build_timed, KdTree, NodeId};

// Flattened, id-addressable representation
pub mod flatten;
pub use flatten::{FlatLeaf, FlatNode, FlattenedTree};

// GPU buffer views
pub mod gpu;
pub use gpu::{GpuAabb, GpuBuffers};

// Side-car persistence
pub mod cache;
pub use cache::{CacheError, CacheOutcome};

pub mod stats;
pub use stats::BuildStats;

#[cfg(test)]
pub mod test_utils;
