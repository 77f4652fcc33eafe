//! Triangle / axis-aligned box overlap test.
//!
//! Two-stage plane test:
//!
//! 1. The box must straddle the triangle's plane: at least two corners on
//!    strictly opposite sides. Corners within [`PLANE_EPSILON`] of the plane
//!    count as "on the plane" and establish no side.
//! 2. No box face plane may separate the triangle: for each of the six faces,
//!    at least one vertex must lie on the inner side or on the plane.
//!
//! The nine edge-cross-edge axes of a full separating axis test are not
//! checked, so a triangle that only grazes a box edge or corner can be
//! reported as overlapping. Partitioning tolerates such false positives: the
//! triangle is merely referenced by one more leaf.
//!
//! Degenerate triangles (collinear or coincident vertices) have a zero
//! normal, so every corner lies "on the plane" and stage 1 rejects them.

use glam::Vec3;

use crate::constants::PLANE_EPSILON;
use crate::types::{Aabb, Triangle};

/// Box face described by three corner indices (see [`Aabb::corners`]) and a
/// corner on the opposite face, used to orient the plane.
struct BoxFace {
  points: [usize; 3],
  opposite: usize,
}

const BOX_FACES: [BoxFace; 6] = [
  BoxFace { points: [0, 1, 2], opposite: 4 }, // -Y
  BoxFace { points: [4, 5, 6], opposite: 0 }, // +Y
  BoxFace { points: [1, 2, 7], opposite: 0 }, // +X
  BoxFace { points: [2, 3, 4], opposite: 0 }, // +Z
  BoxFace { points: [0, 3, 4], opposite: 7 }, // -X
  BoxFace { points: [0, 1, 6], opposite: 7 }, // -Z
];

/// Side of a plane, or `None` when within epsilon of it.
#[inline]
fn side(distance: f32) -> Option<bool> {
  if distance.abs() <= PLANE_EPSILON {
    None
  } else {
    Some(distance > 0.0)
  }
}

/// Plane through three points as `(normal, d)` with `dot(normal, p) + d = 0`.
#[inline]
fn plane_through(a: Vec3, b: Vec3, c: Vec3) -> (Vec3, f32) {
  let normal = (a - b).cross(a - c);
  (normal, -normal.dot(a))
}

/// Stage 1: do the corners lie on both sides of the triangle's plane?
fn box_straddles_triangle_plane(triangle: &Triangle, corners: &[Vec3; 8]) -> bool {
  let [a, b, c] = triangle.vertices;
  let (normal, d) = plane_through(a, b, c);

  let mut first_side = None;
  for corner in corners {
    let Some(s) = side(normal.dot(*corner) + d) else {
      continue;
    };
    match first_side {
      None => first_side = Some(s),
      Some(f) if f != s => return true,
      Some(_) => {}
    }
  }
  false
}

/// Stage 2: does this face plane have every triangle vertex strictly outside?
fn face_separates(triangle: &Triangle, corners: &[Vec3; 8], face: &BoxFace) -> bool {
  let [p0, p1, p2] = face.points;
  let (normal, d) = plane_through(corners[p0], corners[p1], corners[p2]);

  let inside = normal.dot(corners[face.opposite]) + d > 0.0;
  triangle
    .vertices
    .iter()
    .all(|v| side(normal.dot(*v) + d) == Some(!inside))
}

/// Does the triangle's surface overlap the closed box volume?
pub fn triangle_intersects_aabb(triangle: &Triangle, aabb: &Aabb) -> bool {
  let corners = aabb.corners();

  if !box_straddles_triangle_plane(triangle, &corners) {
    return false;
  }

  !BOX_FACES
    .iter()
    .any(|face| face_separates(triangle, &corners, face))
}

#[cfg(test)]
#[path = "intersect_test.rs"]
mod intersect_test;
