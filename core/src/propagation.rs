use std::sync::atomic::{AtomicBool, Ordering};

/// The click a host forwards to the tree (toggle or value click).
#[derive(Debug, Default)]
pub struct ClickEvent {
  propagation_stopped: AtomicBool,
}

impl ClickEvent {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn stop_propagation(&self) {
    self.propagation_stopped.store(true, Ordering::SeqCst);
  }

  pub fn is_propagation_stopped(&self) -> bool {
    self.propagation_stopped.load(Ordering::SeqCst)
  }
}

/// Keep the click from bubbling to enclosing host elements when `enabled`.
pub fn stop_click_propagation(enabled: bool, event: &ClickEvent) {
  if enabled {
    event.stop_propagation();
  }
}
