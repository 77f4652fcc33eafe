//! Shared fixtures for unit tests.

use glam::Vec3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::types::Triangle;

/// Unit right triangle in the z = 0 plane.
pub fn unit_triangle() -> Triangle {
  Triangle::new(Vec3::ZERO, Vec3::X, Vec3::Y)
}

/// Deterministic scatter of `count` small triangles inside `[0, extent]^3`.
///
/// Each triangle spans at most `size` along every axis and is randomly
/// oriented, so the set exercises every split axis.
pub fn scattered_triangles(count: usize, extent: f32, size: f32, seed: u64) -> Vec<Triangle> {
  let mut rng = StdRng::seed_from_u64(seed);
  (0..count)
    .map(|_| {
      let origin = Vec3::new(
        rng.random_range(0.0..extent - size),
        rng.random_range(0.0..extent - size),
        rng.random_range(0.0..extent - size),
      );
      let mut offset = || {
        Vec3::new(
          rng.random_range(0.0..size),
          rng.random_range(0.0..size),
          rng.random_range(0.0..size),
        )
      };
      let b = origin + offset();
      let c = origin + offset();
      Triangle::new(origin, b, c)
    })
    .collect()
}

/// Axis-aligned unit right triangles, cycling through the XY, YZ and XZ
/// planes, scattered inside `[0, extent]^3`.
pub fn axis_aligned_triangles(count: usize, extent: f32, seed: u64) -> Vec<Triangle> {
  let mut rng = StdRng::seed_from_u64(seed);
  (0..count)
    .map(|i| {
      let o = Vec3::new(
        rng.random_range(0.0..extent - 1.0),
        rng.random_range(0.0..extent - 1.0),
        rng.random_range(0.0..extent - 1.0),
      );
      match i % 3 {
        0 => Triangle::new(o, o + Vec3::X, o + Vec3::Y),
        1 => Triangle::new(o, o + Vec3::Y, o + Vec3::Z),
        _ => Triangle::new(o, o + Vec3::X, o + Vec3::Z),
      }
    })
    .collect()
}
