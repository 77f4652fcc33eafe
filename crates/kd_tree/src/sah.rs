//! Surface area heuristic for choosing kd-tree split planes.
//!
//! ```text
//! cost = left_area * left_count + right_area * right_count
//! ```
//!
//! `*_area` is the half surface area of the clipped child box and
//! `*_count` the number of triangles overlapping it (straddlers count on both
//! sides). Lower cost is better.

use glam::Vec3;

use crate::constants::SAH_SAMPLES;
use crate::intersect::triangle_intersects_aabb;
use crate::types::{Aabb, Axis, Triangle};

/// A scored candidate plane.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SplitPlane {
  pub axis: Axis,
  pub position: f32,
  pub cost: f32,
}

/// Axis with the largest extent.
///
/// X wins only when strictly greater than both Y and Z; otherwise Y wins
/// when strictly greater than Z; otherwise Z.
pub fn split_axis(aabb: &Aabb) -> Axis {
  let d = aabb.extent();
  if d.x > d.y && d.x > d.z {
    Axis::X
  } else if d.y > d.z {
    Axis::Y
  } else {
    Axis::Z
  }
}

/// Half surface area of a box with the given extents.
#[inline]
pub fn half_surface_area(extent: Vec3) -> f32 {
  extent.y * extent.z + extent.x * extent.y + extent.x * extent.z
}

/// Half surface areas of the two sides of a plane at `position` on `axis`.
///
/// The face perpendicular to the split axis is shared by both sides and is
/// not scaled; the two faces containing the split-axis extent are scaled by
/// the side's fraction of that extent.
pub fn side_areas(aabb: &Aabb, axis: Axis, position: f32) -> (f32, f32) {
  let d = aabb.extent();
  let a = axis.index();
  let along = d[a];
  let cap = d[(a + 1) % 3] * d[(a + 2) % 3];
  let sides = half_surface_area(d) - cap;

  let left_ratio = if along > 0.0 {
    (position - aabb.min[a]) / along
  } else {
    0.5
  };
  let right_ratio = 1.0 - left_ratio;

  (cap + sides * left_ratio, cap + sides * right_ratio)
}

/// SAH cost of splitting `aabb` (holding `indices`) at `position` on `axis`.
pub fn sah_cost(
  aabb: &Aabb,
  triangles: &[Triangle],
  indices: &[u32],
  axis: Axis,
  position: f32,
) -> f32 {
  let (left_area, right_area) = side_areas(aabb, axis, position);
  let (left_box, right_box) = aabb.split(axis, position);

  let (mut left_count, mut right_count) = (0u32, 0u32);
  for &index in indices {
    let triangle = &triangles[index as usize];
    if triangle_intersects_aabb(triangle, &left_box) {
      left_count += 1;
    }
    if triangle_intersects_aabb(triangle, &right_box) {
      right_count += 1;
    }
  }

  left_area * left_count as f32 + right_area * right_count as f32
}

/// Candidate plane positions: `min + extent * i / SAH_SAMPLES` for
/// `i = 1..SAH_SAMPLES`.
pub fn candidate_positions(aabb: &Aabb, axis: Axis) -> impl Iterator<Item = f32> {
  let a = axis.index();
  let (min, extent) = (aabb.min[a], aabb.extent()[a]);
  (1..SAH_SAMPLES).map(move |i| min + extent * (i as f32 / SAH_SAMPLES as f32))
}

/// Cheapest candidate plane for a node. The first candidate wins ties.
pub fn best_split(aabb: &Aabb, triangles: &[Triangle], indices: &[u32]) -> SplitPlane {
  let axis = split_axis(aabb);
  let mut best = SplitPlane {
    axis,
    position: aabb.min[axis.index()],
    cost: f32::INFINITY,
  };

  for position in candidate_positions(aabb, axis) {
    let cost = sah_cost(aabb, triangles, indices, axis, position);
    if cost < best.cost {
      best = SplitPlane {
        axis,
        position,
        cost,
      };
    }
  }

  best
}

#[cfg(test)]
#[path = "sah_test.rs"]
mod sah_test;
