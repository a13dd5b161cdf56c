use std::sync::{
  atomic::{AtomicU64, Ordering},
  Arc,
};

use once_cell::sync::Lazy;
use uuid::Uuid;

pub const ID_PREFIX: &str = "json-treeview";

/// Source of DOM/accessibility ids for tree nodes.
pub trait IdGenerator: Send + Sync {
  fn next(&self) -> String;
}

/// Monotonic counter: `json-treeview-0`, `json-treeview-1`, ...
///
/// One instance per rendering context. The process-wide default is shared by
/// everything that does not inject its own, so it must not be used when
/// several server-side requests render concurrently.
#[derive(Debug, Default)]
pub struct SequentialIdGenerator {
  next_id: AtomicU64,
}

impl SequentialIdGenerator {
  pub fn new() -> Self {
    Self::default()
  }
}

impl IdGenerator for SequentialIdGenerator {
  fn next(&self) -> String {
    let n = self.next_id.fetch_add(1, Ordering::SeqCst);
    format!("{ID_PREFIX}-{n}")
  }
}

/// Per-request generator for server rendering: ids carry a request scope.
#[derive(Debug)]
pub struct RequestIdGenerator {
  scope: String,
  next_id: AtomicU64,
}

impl RequestIdGenerator {
  pub fn new() -> Self {
    Self::with_scope(Uuid::new_v4().simple().to_string()[..8].to_string())
  }

  pub fn with_scope(scope: impl Into<String>) -> Self {
    Self {
      scope: scope.into(),
      next_id: AtomicU64::new(0),
    }
  }

  pub fn scope(&self) -> &str {
    &self.scope
  }
}

impl Default for RequestIdGenerator {
  fn default() -> Self {
    Self::new()
  }
}

impl IdGenerator for RequestIdGenerator {
  fn next(&self) -> String {
    let n = self.next_id.fetch_add(1, Ordering::SeqCst);
    format!("{ID_PREFIX}-{}-{n}", self.scope)
  }
}

static DEFAULT_GENERATOR: Lazy<Arc<SequentialIdGenerator>> =
  Lazy::new(|| Arc::new(SequentialIdGenerator::new()));

/// The shared client-side generator.
pub fn default_id_generator() -> Arc<dyn IdGenerator> {
  let generator: Arc<SequentialIdGenerator> = Arc::clone(&DEFAULT_GENERATOR);
  generator
}
