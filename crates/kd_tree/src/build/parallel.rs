//! Fork/join build: split the top levels on the calling thread, then finish
//! each grandchild subtree on rayon's pool.
//!
//! ```text
//!   depth 0            root                 serial
//!   depth 1        ┌────┴────┐              serial
//!   depth 2      ┌─┴─┐     ┌─┴─┐            one rayon task each
//!               T0  T1    T2  T3
//! ```
//!
//! Every task builds into a private arena seeded with its grandchild and
//! gets the remaining budget of `max_depth - 3` levels, counted from the
//! grandchild. Task leaves therefore stop at depth `max_depth - 2`, one level
//! above where a serial build of the same mesh stops.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use rayon::prelude::*;

use super::arena::{BuildArena, NodeId};
use super::splitter::{split_until, BuildContext};
use crate::constants::PARALLEL_SPLIT_DEPTH;
use crate::error::{KdTreeError, Result};

/// Build the tree rooted at `NodeId::ROOT` of `arena` with one rayon task
/// per depth-2 subtree.
///
/// Every task is joined before any failure is reported; the first failure
/// in subtree order wins. On error `arena` is left partially built and must
/// be discarded.
pub fn build_parallel(ctx: &BuildContext<'_>, arena: &mut BuildArena) -> Result<()> {
  let frontier = {
    let _span = tracing::info_span!("serial_top").entered();
    split_until(ctx, arena, NodeId::ROOT, PARALLEL_SPLIT_DEPTH)?
  };
  if frontier.is_empty() {
    return Ok(());
  }

  let seeds: Vec<(usize, BuildArena)> = frontier
    .iter()
    .map(|&id| arena.detach(id))
    .enumerate()
    .collect();

  let results: Vec<Result<BuildArena>> = {
    let _span = tracing::info_span!("parallel_subtrees", tasks = seeds.len()).entered();
    seeds
      .into_par_iter()
      .map(|(subtree, seed)| build_subtree(ctx, subtree, seed))
      .collect()
  };

  let mut subtrees = Vec::with_capacity(results.len());
  for result in results {
    subtrees.push(result?);
  }

  for (id, subtree) in frontier.into_iter().zip(subtrees) {
    tracing::debug!(node = id.index(), nodes = subtree.len(), "grafting subtree");
    arena.graft(id, subtree);
  }
  Ok(())
}

/// One task: build `seed` to completion within its subtree budget, turning
/// cancellation, errors and panics into [`KdTreeError::TaskFailure`].
fn build_subtree(
  ctx: &BuildContext<'_>,
  subtree: usize,
  mut seed: BuildArena,
) -> Result<BuildArena> {
  let task_ctx = ctx.subtree(seed[NodeId::ROOT].depth);
  let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
    split_until(&task_ctx, &mut seed, NodeId::ROOT, u32::MAX)
  }));

  let reason = match outcome {
    Ok(Ok(_)) => return Ok(seed),
    Ok(Err(err)) => err.to_string(),
    Err(payload) => format!("panicked: {}", panic_message(&*payload)),
  };
  Err(KdTreeError::TaskFailure { subtree, reason })
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
  if let Some(msg) = payload.downcast_ref::<&str>() {
    msg
  } else if let Some(msg) = payload.downcast_ref::<String>() {
    msg
  } else {
    "unknown panic"
  }
}

#[cfg(test)]
#[path = "parallel_test.rs"]
mod parallel_test;
