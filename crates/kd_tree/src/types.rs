//! Core geometric types: triangles, boxes and split axes.

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Split axis of a kd-tree plane.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Axis {
  X,
  Y,
  Z,
}

impl Axis {
  /// Component index (0, 1 or 2).
  #[inline]
  pub fn index(self) -> usize {
    match self {
      Axis::X => 0,
      Axis::Y => 1,
      Axis::Z => 2,
    }
  }

  /// Unit normal of a plane perpendicular to this axis.
  #[inline]
  pub fn unit(self) -> Vec3 {
    match self {
      Axis::X => Vec3::X,
      Axis::Y => Vec3::Y,
      Axis::Z => Vec3::Z,
    }
  }
}

/// Mesh triangle. Immutable input; the tree refers to triangles by index only.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Triangle {
  pub vertices: [Vec3; 3],
}

impl Triangle {
  pub fn new(a: Vec3, b: Vec3, c: Vec3) -> Self {
    Self {
      vertices: [a, b, c],
    }
  }

  /// Unnormalized plane normal. Zero for degenerate triangles.
  #[inline]
  pub fn normal(&self) -> Vec3 {
    let [a, b, c] = self.vertices;
    (a - b).cross(a - c)
  }

  /// True when the vertices are collinear or coincident.
  #[inline]
  pub fn is_degenerate(&self) -> bool {
    self.normal() == Vec3::ZERO
  }

  #[inline]
  pub fn is_finite(&self) -> bool {
    self.vertices.iter().all(|v| v.is_finite())
  }

  /// Tight bounds of the three vertices.
  pub fn bounds(&self) -> Aabb {
    let [a, b, c] = self.vertices;
    Aabb {
      min: a.min(b).min(c),
      max: a.max(b).max(c),
    }
  }
}

/// Axis-aligned bounding box.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
  /// Minimum corner (inclusive).
  pub min: Vec3,
  /// Maximum corner (inclusive).
  pub max: Vec3,
}

impl Aabb {
  /// Create a new AABB from min and max corners.
  ///
  /// # Panics
  /// Debug-asserts that min <= max on all axes.
  pub fn new(min: Vec3, max: Vec3) -> Self {
    debug_assert!(
      min.x <= max.x && min.y <= max.y && min.z <= max.z,
      "AABB min must be <= max on all axes"
    );
    Self { min, max }
  }

  /// Inverted box, ready for `expand`.
  pub fn empty() -> Self {
    Self {
      min: Vec3::INFINITY,
      max: Vec3::NEG_INFINITY,
    }
  }

  /// Bounds of every vertex of `triangles`. Stays `empty()` for no input.
  pub fn from_triangles(triangles: &[Triangle]) -> Self {
    triangles.iter().fold(Self::empty(), |acc, tri| acc.union(&tri.bounds()))
  }

  #[inline]
  pub fn expand(&mut self, point: Vec3) {
    self.min = self.min.min(point);
    self.max = self.max.max(point);
  }

  #[inline]
  pub fn union(&self, other: &Aabb) -> Self {
    Self {
      min: self.min.min(other.min),
      max: self.max.max(other.max),
    }
  }

  /// Grow every face outwards by `amount`.
  #[inline]
  pub fn padded(&self, amount: f32) -> Self {
    Self {
      min: self.min - Vec3::splat(amount),
      max: self.max + Vec3::splat(amount),
    }
  }

  /// `min <= max` on all axes.
  #[inline]
  pub fn is_valid(&self) -> bool {
    self.min.cmple(self.max).all()
  }

  /// Box diagonal (max - min).
  #[inline]
  pub fn extent(&self) -> Vec3 {
    self.max - self.min
  }

  #[inline]
  pub fn contains_point(&self, point: Vec3) -> bool {
    point.cmpge(self.min).all() && point.cmple(self.max).all()
  }

  /// True if `other` lies entirely inside this box (boundaries included).
  #[inline]
  pub fn contains(&self, other: &Aabb) -> bool {
    other.min.cmpge(self.min).all() && other.max.cmple(self.max).all()
  }

  /// Two boxes overlap if they share any interior or boundary point.
  #[inline]
  pub fn overlaps(&self, other: &Aabb) -> bool {
    self.min.cmple(other.max).all() && self.max.cmpge(other.min).all()
  }

  /// Clip at an axis-aligned plane.
  ///
  /// The left box keeps `min` and takes `position` as its max on `axis`;
  /// the right box keeps `max` and takes `position` as its min.
  pub fn split(&self, axis: Axis, position: f32) -> (Aabb, Aabb) {
    let mut left = *self;
    let mut right = *self;
    left.max[axis.index()] = position;
    right.min[axis.index()] = position;
    (left, right)
  }

  /// The eight corners in face-walk order:
  ///
  /// ```text
  ///        5 ──────── 6          y
  ///       /|         /|          │
  ///      4 ──────── 7 |          └── x
  ///      | 0 ───────|─ 1        /
  ///      |/         |/         z
  ///      3 ──────── 2
  /// ```
  pub fn corners(&self) -> [Vec3; 8] {
    let (lo, hi) = (self.min, self.max);
    [
      lo,
      Vec3::new(hi.x, lo.y, lo.z),
      Vec3::new(hi.x, lo.y, hi.z),
      Vec3::new(lo.x, lo.y, hi.z),
      Vec3::new(lo.x, hi.y, hi.z),
      Vec3::new(lo.x, hi.y, lo.z),
      Vec3::new(hi.x, hi.y, lo.z),
      hi,
    ]
  }
}

impl Default for Aabb {
  fn default() -> Self {
    Self::empty()
  }
}

#[cfg(test)]
#[path = "types_test.rs"]
mod types_test;
