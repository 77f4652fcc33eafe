//! BuildConfig - tree depth, parallelism and cooperative cancellation.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::Deserialize;

/// Shared cancellation flag, checked before every node split.
///
/// Clones observe the same flag, so a handle kept by the caller can stop
/// every subtree task of a running build.
#[derive(Clone, Debug, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
  pub fn new() -> Self {
    Self::default()
  }

  /// Request cancellation. Running builds fail at their next split.
  pub fn cancel(&self) {
    self.0.store(true, Ordering::Relaxed);
  }

  #[inline]
  pub fn is_cancelled(&self) -> bool {
    self.0.load(Ordering::Relaxed)
  }
}

/// Configuration for a single tree build.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
  /// Number of tree levels allowed. Nodes at `depth > max_depth - 2` are
  /// never split.
  pub max_depth: u32,

  /// Build the four grandchild subtrees on rayon's pool. When false, or when
  /// `max_depth < PARALLEL_MIN_DEPTH`, the whole tree is built on the
  /// calling thread. Parallel subtrees stop one level earlier than a
  /// serial build.
  pub parallel: bool,

  /// Optional cooperative cancellation.
  #[serde(skip)]
  pub cancel: Option<CancelFlag>,
}

impl BuildConfig {
  pub fn with_max_depth(mut self, max_depth: u32) -> Self {
    self.max_depth = max_depth;
    self
  }

  pub fn with_parallel(mut self, parallel: bool) -> Self {
    self.parallel = parallel;
    self
  }

  pub fn with_cancel(mut self, cancel: CancelFlag) -> Self {
    self.cancel = Some(cancel);
    self
  }

  /// True if the attached flag (if any) has been raised.
  #[inline]
  pub fn is_cancelled(&self) -> bool {
    self.cancel.as_ref().is_some_and(CancelFlag::is_cancelled)
  }
}

impl Default for BuildConfig {
  fn default() -> Self {
    Self {
      max_depth: 16,
      parallel: true,
      cancel: None,
    }
  }
}
