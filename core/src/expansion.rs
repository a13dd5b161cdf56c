use std::collections::HashMap;

use crate::models::Segment;

/// Default expanded flag for a segment nobody toggled yet.
///
/// `depth_limit < 0` means unlimited.
pub fn auto_expand(expanded: bool, depth_limit: i32, current_depth: usize) -> bool {
  let beyond = depth_limit >= 0 && current_depth >= depth_limit as usize;
  expanded && !beyond
}

/// User expand/collapse overrides of one node, keyed by segment path.
///
/// Outlives re-derivations of the node's segments; the owning node clears it
/// when its depth configuration changes.
#[derive(Debug, Clone, Default)]
pub struct ExpansionStore {
  overrides: HashMap<String, bool>,
}

impl ExpansionStore {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn get(&self, path: &str) -> Option<bool> {
    self.overrides.get(path).copied()
  }

  /// Stored override for `path`, or `default`.
  pub fn resolve(&self, path: &str, default: bool) -> bool {
    self.get(path).unwrap_or(default)
  }

  /// Flip the segment's state. `None` (and no change) if it cannot expand.
  pub fn toggle(&mut self, segment: &Segment) -> Option<bool> {
    if !segment.is_expandable() {
      return None;
    }
    let next = !segment.expanded;
    self.overrides.insert(segment.path.clone(), next);
    Some(next)
  }

  pub fn clear(&mut self) {
    self.overrides.clear();
  }

  pub fn len(&self) -> usize {
    self.overrides.len()
  }

  pub fn is_empty(&self) -> bool {
    self.overrides.is_empty()
  }
}
