//! kd-tree builder for OBJ meshes.
//!
//! Builds (or loads from the `<mesh>.tree` side-car cache) the SAH kd-tree of
//! a mesh, prints its statistics and optionally dumps the GPU buffers:
//!
//! - nodes.bin: FlatNode records, 4 x i32
//! - leaves.bin: FlatLeaf records, 4 x i32
//! - triangle_indices.bin: i32 per entry
//! - boxes.bin: min.xyz, max.xyz as 6 x f32

mod config;
mod obj;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use kd_tree::{build_timed, cache, BuildStats, CacheOutcome, FlattenedTree, GpuBuffers};
use tracing_subscriber::EnvFilter;
use web_time::Instant;

use config::Config;

/// SAH kd-tree builder.
#[derive(Parser, Debug)]
#[command(name = "build_kd_tree")]
#[command(about = "Builds an SAH kd-tree for an OBJ mesh and caches it next to the mesh")]
struct Args {
  /// OBJ mesh to build the tree for.
  #[arg(short, long)]
  mesh: PathBuf,

  /// Maximum tree depth (overrides the config file).
  #[arg(short, long)]
  depth: Option<u32>,

  /// Path to configuration TOML file.
  #[arg(short, long)]
  config: Option<PathBuf>,

  /// Always rebuild and leave the side-car cache untouched.
  #[arg(long)]
  no_cache: bool,

  /// Build on the calling thread only.
  #[arg(long)]
  serial: bool,

  /// Write the GPU buffers as .bin files into this directory.
  #[arg(long)]
  dump_buffers: Option<PathBuf>,
}

fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
    .init();

  let args = Args::parse();
  let (tree, stats) = run(&args)?;

  println!("{stats}");
  if let Some(dir) = &args.dump_buffers {
    dump_buffers(dir, &tree)?;
    println!("GPU buffers written to {}", dir.display());
  }
  Ok(())
}

fn resolve_config(args: &Args) -> Result<Config> {
  let mut config = match &args.config {
    Some(path) => Config::load(path)?,
    None => Config::default(),
  };
  if let Some(depth) = args.depth {
    anyhow::ensure!(depth > 0, "--depth must be at least 1");
    config.build.max_depth = depth;
  }
  if args.serial {
    config.build.parallel = false;
  }
  if args.no_cache {
    config.use_cache = false;
  }
  Ok(config)
}

fn run(args: &Args) -> Result<(FlattenedTree, BuildStats)> {
  let config = resolve_config(args)?;
  let triangles = obj::load_obj(&args.mesh)?;
  println!("Loaded {} triangles from {}", triangles.len(), args.mesh.display());

  if !config.use_cache {
    let (tree, stats) = build_timed(&triangles, &config.build).context("Building kd-tree")?;
    let flat = tree.flatten().context("Flattening kd-tree")?;
    return Ok((flat, stats));
  }

  let start = Instant::now();
  let (flat, outcome) = cache::load_or_build(&args.mesh, &triangles, &config.build)
    .context("Building kd-tree")?;
  let elapsed_us = start.elapsed().as_micros() as u64;

  match &outcome {
    CacheOutcome::Hit => println!("Loaded tree from {}", cache::cache_path(&args.mesh).display()),
    CacheOutcome::Rebuilt { reason } => println!("Built tree ({reason})"),
  }
  let stats = BuildStats::from_flattened(&flat, elapsed_us);
  Ok((flat, stats))
}

fn dump_buffers(dir: &Path, tree: &FlattenedTree) -> Result<()> {
  std::fs::create_dir_all(dir)
    .with_context(|| format!("Failed to create output dir: {}", dir.display()))?;

  let buffers = GpuBuffers::from_tree(tree);
  let files: [(&str, &[u8]); 4] = [
    ("nodes.bin", buffers.nodes_bytes()),
    ("leaves.bin", buffers.leaves_bytes()),
    ("triangle_indices.bin", buffers.triangle_indices_bytes()),
    ("boxes.bin", buffers.boxes_bytes()),
  ];
  for (name, bytes) in files {
    let path = dir.join(name);
    std::fs::write(&path, bytes).with_context(|| format!("Failed to write {}", path.display()))?;
  }
  tracing::info!(node_count = buffers.node_count, dir = %dir.display(), "dumped GPU buffers");
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  /// Ten unit cubes along X, 120 triangles.
  fn write_cube_row(path: &Path) {
    let mut text = String::new();
    for cube in 0..10 {
      let x = cube as f32 * 2.0;
      for corner in 0..8 {
        let (dx, dy, dz) = (corner & 1, (corner >> 1) & 1, (corner >> 2) & 1);
        text.push_str(&format!("v {} {} {}\n", x + dx as f32, dy, dz));
      }
      let base = cube * 8 + 1;
      for [a, b, c, d] in [[0, 1, 3, 2], [4, 6, 7, 5], [0, 4, 5, 1], [2, 3, 7, 6], [0, 2, 6, 4], [1, 5, 7, 3]] {
        text.push_str(&format!("f {} {} {} {}\n", base + a, base + b, base + c, base + d));
      }
    }
    std::fs::write(path, text).unwrap();
  }

  fn args(mesh: PathBuf) -> Args {
    Args {
      mesh,
      depth: Some(8),
      config: None,
      no_cache: false,
      serial: false,
      dump_buffers: None,
    }
  }

  #[test]
  fn test_cli_parses_flags() {
    let args = Args::try_parse_from([
      "build_kd_tree",
      "--mesh",
      "bunny.obj",
      "--depth",
      "12",
      "--serial",
      "--no-cache",
      "--dump-buffers",
      "out",
    ])
    .unwrap();
    assert_eq!(args.mesh, PathBuf::from("bunny.obj"));
    assert_eq!(args.depth, Some(12));
    assert!(args.serial && args.no_cache);
    assert_eq!(args.dump_buffers, Some(PathBuf::from("out")));
  }

  #[test]
  fn test_flags_override_config() {
    let mut a = args(PathBuf::from("mesh.obj"));
    a.serial = true;
    a.no_cache = true;
    let config = resolve_config(&a).unwrap();
    assert_eq!(config.build.max_depth, 8);
    assert!(!config.build.parallel);
    assert!(!config.use_cache);

    a.depth = Some(0);
    assert!(resolve_config(&a).is_err());
  }

  #[test]
  fn test_run_builds_then_hits_cache() {
    let dir = tempfile::tempdir().unwrap();
    let mesh = dir.path().join("cubes.obj");
    write_cube_row(&mesh);

    let (built, stats) = run(&args(mesh.clone())).unwrap();
    assert_eq!(stats.leaf_count, built.leaf_count());
    assert!(built.node_count() > 0);
    assert!(cache::cache_path(&mesh).exists());

    let (cached, _) = run(&args(mesh)).unwrap();
    assert_eq!(cached, built);
  }

  #[test]
  fn test_run_without_cache_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let mesh = dir.path().join("cubes.obj");
    write_cube_row(&mesh);

    let mut a = args(mesh.clone());
    a.no_cache = true;
    let (tree, stats) = run(&a).unwrap();
    assert_eq!(stats.node_count, tree.node_count());
    assert!(!cache::cache_path(&mesh).exists());
  }

  #[test]
  fn test_dump_buffers_sizes() {
    let dir = tempfile::tempdir().unwrap();
    let mesh = dir.path().join("cubes.obj");
    write_cube_row(&mesh);
    let (tree, _) = run(&args(mesh)).unwrap();

    let out = dir.path().join("buffers");
    dump_buffers(&out, &tree).unwrap();

    let size = |name: &str| std::fs::metadata(out.join(name)).unwrap().len() as usize;
    assert_eq!(size("nodes.bin"), tree.node_count() * 16);
    assert_eq!(size("leaves.bin"), tree.leaf_count() * 16);
    assert_eq!(size("triangle_indices.bin"), tree.triangle_indices.len() * 4);
    assert_eq!(size("boxes.bin"), tree.element_count() * 24);
  }
}
