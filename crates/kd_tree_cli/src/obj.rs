//! Minimal Wavefront OBJ reader: positions and faces only.
//!
//! - `v x y z [w]` - position, divided by `w` when present and non-zero
//! - `f a b c ...` - face; only the position index of each `v/vt/vn` group is
//!   used, negative indices count back from the latest vertex, polygons are
//!   fanned around their first vertex
//!
//! Every other statement is ignored. Faces may reference vertices declared
//! after them.

use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};
use glam::Vec3;
use kd_tree::Triangle;

/// Read and parse an OBJ file.
pub fn load_obj(path: &Path) -> Result<Vec<Triangle>> {
  let text = std::fs::read_to_string(path)
    .with_context(|| format!("Failed to read mesh: {}", path.display()))?;
  parse_obj(&text).with_context(|| format!("Failed to parse mesh: {}", path.display()))
}

pub fn parse_obj(text: &str) -> Result<Vec<Triangle>> {
  let mut vertices = Vec::new();
  // (line number, zero-based vertex indices)
  let mut faces: Vec<(usize, Vec<usize>)> = Vec::new();

  for (number, line) in text.lines().enumerate().map(|(i, l)| (i + 1, l)) {
    let mut tokens = line.split_whitespace();
    match tokens.next() {
      Some("v") => {
        let vertex = parse_vertex(tokens).with_context(|| format!("line {number}: bad vertex"))?;
        vertices.push(vertex);
      }
      Some("f") => {
        let indices = tokens
          .map(|group| parse_index(group, vertices.len()))
          .collect::<Result<Vec<_>>>()
          .with_context(|| format!("line {number}: bad face"))?;
        if indices.len() < 3 {
          bail!("line {number}: face needs at least 3 vertices, found {}", indices.len());
        }
        faces.push((number, indices));
      }
      _ => {}
    }
  }

  let mut triangles = Vec::with_capacity(faces.len());
  for (number, indices) in faces {
    let corner = |i: usize| {
      vertices
        .get(i)
        .copied()
        .ok_or_else(|| anyhow!("line {number}: vertex {} does not exist", i + 1))
    };
    let first = corner(indices[0])?;
    for pair in indices[1..].windows(2) {
      triangles.push(Triangle::new(first, corner(pair[0])?, corner(pair[1])?));
    }
  }

  Ok(triangles)
}

fn parse_vertex<'a>(mut tokens: impl Iterator<Item = &'a str>) -> Result<Vec3> {
  let mut next = || -> Result<f32> {
    let token = tokens.next().ok_or_else(|| anyhow!("missing coordinate"))?;
    token
      .parse()
      .with_context(|| format!("invalid coordinate {token:?}"))
  };
  let position = Vec3::new(next()?, next()?, next()?);
  let w = match tokens.next() {
    Some(token) => token
      .parse::<f32>()
      .with_context(|| format!("invalid w {token:?}"))?,
    None => 1.0,
  };
  Ok(if w != 0.0 { position / w } else { position })
}

/// Zero-based position index of one `v/vt/vn` group.
fn parse_index(group: &str, vertex_count: usize) -> Result<usize> {
  let token = group.split('/').next().unwrap_or(group);
  let index: i64 = token
    .parse()
    .with_context(|| format!("invalid index {token:?}"))?;
  match index {
    0 => bail!("index 0 is not valid in OBJ"),
    i if i > 0 => Ok(i as usize - 1),
    i => {
      let back = i.unsigned_abs() as usize;
      vertex_count
        .checked_sub(back)
        .ok_or_else(|| anyhow!("relative index {i} reaches before the first vertex"))
    }
  }
}
