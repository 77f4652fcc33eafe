use glam::Vec3;

use super::*;
use crate::constants::ROOT_PADDING;
use crate::test_utils::{scattered_triangles, unit_triangle};

fn root_arena(triangles: &[Triangle]) -> BuildArena {
  let aabb = Aabb::from_triangles(triangles).padded(ROOT_PADDING);
  BuildArena::with_root(aabb, (0..triangles.len() as u32).collect(), 0)
}

fn build_serial(triangles: &[Triangle], max_depth: u32) -> BuildArena {
  let config = BuildConfig::default().with_max_depth(max_depth);
  let ctx = BuildContext::new(triangles, &config);
  let mut arena = root_arena(triangles);
  let deferred = split_until(&ctx, &mut arena, NodeId::ROOT, u32::MAX).unwrap();
  assert!(deferred.is_empty());
  arena
}

/// Twenty copies of one triangle can never be separated.
fn stacked(count: usize) -> Vec<Triangle> {
  vec![unit_triangle(); count]
}

#[test]
fn test_depth_allows_split() {
  let config = BuildConfig::default().with_max_depth(4);
  let ctx = BuildContext::new(&[], &config);
  assert!(ctx.depth_allows_split(0));
  assert!(ctx.depth_allows_split(2));
  assert!(!ctx.depth_allows_split(3));

  let config = BuildConfig::default().with_max_depth(1);
  let ctx = BuildContext::new(&[], &config);
  assert!(!ctx.depth_allows_split(0));
}

#[test]
fn test_small_root_stays_leaf() {
  let triangles = stacked(MAX_LEAF_TRIANGLES);
  let arena = build_serial(&triangles, 8);
  assert_eq!(arena.len(), 1);
  assert_eq!(arena[NodeId::ROOT].triangles.len(), MAX_LEAF_TRIANGLES);
}

#[test]
fn test_max_depth_one_never_splits() {
  let arena = build_serial(&stacked(20), 1);
  assert_eq!(arena.len(), 1);
}

#[test]
fn test_max_depth_two_splits_root_only() {
  let arena = build_serial(&stacked(20), 2);
  assert_eq!(arena.len(), 3);
  for (_, node) in arena.iter().skip(1) {
    assert!(node.is_leaf());
    assert_eq!(node.depth, 1);
  }
}

#[test]
fn test_inseparable_triangles_stop_at_depth_limit() {
  let max_depth = 5;
  let arena = build_serial(&stacked(20), max_depth);

  let deepest = arena.iter().map(|(_, n)| n.depth).max().unwrap();
  assert_eq!(deepest, max_depth - 1);
  for (_, node) in arena.iter().filter(|(_, n)| n.is_leaf()) {
    assert!(node.triangles.len() <= MAX_LEAF_TRIANGLES || node.depth == max_depth - 1);
  }
}

#[test]
fn test_leaves_respect_limit_or_depth() {
  let triangles = scattered_triangles(100, 10.0, 1.0, 42);
  let max_depth = 6;
  let arena = build_serial(&triangles, max_depth);

  assert!(arena.len() > 1);
  for (_, node) in arena.iter() {
    assert!(node.depth < max_depth);
    if node.is_leaf() {
      assert!(
        node.triangles.len() <= MAX_LEAF_TRIANGLES || node.depth == max_depth - 1,
        "leaf at depth {} holds {} triangles",
        node.depth,
        node.triangles.len()
      );
    } else {
      assert!(node.triangles.is_empty());
    }
  }
}

#[test]
fn test_children_nest_inside_parents() {
  let triangles = scattered_triangles(100, 10.0, 1.0, 3);
  let arena = build_serial(&triangles, 6);

  for (id, node) in arena.iter() {
    if let Some([left, right]) = node.children {
      for child in [left, right] {
        assert_eq!(arena[child].parent, Some(id));
        assert_eq!(arena[child].depth, node.depth + 1);
        assert!(node.aabb.contains(&arena[child].aabb));
      }
    }
  }
}

#[test]
fn test_every_triangle_reaches_a_leaf() {
  let triangles = scattered_triangles(100, 10.0, 1.0, 9);
  let arena = build_serial(&triangles, 6);

  let mut seen = vec![false; triangles.len()];
  for (_, leaf) in arena.iter().filter(|(_, n)| n.is_leaf()) {
    for &i in &leaf.triangles {
      assert!(triangle_intersects_aabb(&triangles[i as usize], &leaf.aabb));
      seen[i as usize] = true;
    }
  }
  assert!(seen.iter().all(|&s| s));
}

#[test]
fn test_stop_depth_defers_frontier() {
  let triangles = scattered_triangles(200, 10.0, 0.5, 5);
  let config = BuildConfig::default().with_max_depth(8);
  let ctx = BuildContext::new(&triangles, &config);
  let mut arena = root_arena(&triangles);

  let deferred = split_until(&ctx, &mut arena, NodeId::ROOT, 2).unwrap();

  assert!(!deferred.is_empty());
  assert!(deferred.len() <= 4);
  for id in &deferred {
    assert_eq!(arena[*id].depth, 2);
    assert!(arena[*id].is_leaf());
    assert!(needs_split(&arena[*id]));
  }
  assert!(arena.iter().all(|(_, n)| n.depth <= 2));
}

#[test]
fn test_split_is_deterministic() {
  let triangles = scattered_triangles(150, 10.0, 1.0, 17);
  assert_eq!(build_serial(&triangles, 7), build_serial(&triangles, 7));
}

#[test]
fn test_cancelled_before_split() {
  let triangles = stacked(20);
  let flag = CancelFlag::new();
  flag.cancel();
  let config = BuildConfig::default().with_cancel(flag);
  let ctx = BuildContext::new(&triangles, &config);
  let mut arena = root_arena(&triangles);

  let result = split_until(&ctx, &mut arena, NodeId::ROOT, u32::MAX);
  assert_eq!(result, Err(KdTreeError::Cancelled));
  assert_eq!(arena.len(), 1);
}

#[test]
fn test_split_node_straddler_goes_to_both_children() {
  let long = Triangle::new(
    Vec3::new(0.1, 0.5, 0.5),
    Vec3::new(9.9, 0.5, 0.5),
    Vec3::new(0.1, 0.5, 0.9),
  );
  let mut triangles = vec![long];
  for i in 0..9 {
    let x = 0.2 + i as f32 * 0.05;
    triangles.push(Triangle::new(
      Vec3::new(x, 0.1, 0.1),
      Vec3::new(x, 0.9, 0.1),
      Vec3::new(x, 0.1, 0.9),
    ));
  }
  let config = BuildConfig::default().with_max_depth(4);
  let ctx = BuildContext::new(&triangles, &config);
  let mut arena = root_arena(&triangles);

  let [left, right] = split_node(&ctx, &mut arena, NodeId::ROOT).unwrap().unwrap();
  assert!(arena[left].triangles.contains(&0));
  assert!(arena[right].triangles.contains(&0));
}
