//! Build constants shared by the splitter, the cost evaluator and the
//! parallel coordinator.
//!
//! # Depth Convention
//!
//! ```text
//! depth 0            root
//! depth 1            children          ┐ split serially
//! depth 2            grandchildren     ┘ (PARALLEL_SPLIT_DEPTH)
//! depth 3..          one rayon task per grandchild subtree
//! depth max_depth-2  deepest leaves of a parallel build
//! depth max_depth-1  deepest leaves of a serial build
//! ```
//!
//! A node at `depth` is split only while `depth <= max_depth - 2`, so a tree
//! built with `max_depth = D` never has more than `D` levels. Parallel
//! subtrees count their `D - 3` budget from the grandchild.

/// Number of SAH sample intervals. Candidate planes sit at `i / SAH_SAMPLES`
/// for `i = 1..SAH_SAMPLES`, i.e. 15 planes.
pub const SAH_SAMPLES: u32 = 16;

/// A child is split further only if it holds more triangles than this.
pub const MAX_LEAF_TRIANGLES: usize = 8;

/// Padding applied to every face of the mesh bounds to form the root box.
pub const ROOT_PADDING: f32 = 0.001;

/// Signed plane distances within `[-PLANE_EPSILON, PLANE_EPSILON]` count as
/// lying on the plane.
pub const PLANE_EPSILON: f32 = 1e-6;

/// Depth at which subtrees are handed to parallel tasks.
pub const PARALLEL_SPLIT_DEPTH: u32 = 2;

/// Smallest `max_depth` that takes the parallel path. The serial top levels
/// then always reach the grandchildren.
pub const PARALLEL_MIN_DEPTH: u32 = PARALLEL_SPLIT_DEPTH + 2;

/// Parent id stored for the root record.
pub const ROOT_PARENT: i32 = -1;

#[cfg(test)]
#[path = "constants_test.rs"]
mod constants_test;
