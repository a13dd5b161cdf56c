use std::sync::Arc;

use parking_lot::Mutex;

use crate::{models::Segment, propagation::ClickEvent, tree::TreeError};

/// One entry of the click dispatch chain.
pub trait ValueClickHandler: Send + Sync {
  /// `Err` is treated as "cannot handle".
  fn can_handle(&self, segment: &Segment) -> Result<bool, TreeError>;

  fn handle(&self, segment: &Segment, event: Option<&ClickEvent>) -> Result<(), TreeError>;
}

/// Legacy clickability predicate, paired with the value-click event.
pub type IsClickableValueFn = Arc<dyn Fn(&Segment) -> bool + Send + Sync>;

type CanHandleFn = dyn Fn(&Segment) -> Result<bool, TreeError> + Send + Sync;
type HandleFn = dyn Fn(&Segment, Option<&ClickEvent>) -> Result<(), TreeError> + Send + Sync;

/// Closure-backed handler.
#[derive(Clone)]
pub struct FnClickHandler {
  can_handle: Arc<CanHandleFn>,
  handle: Arc<HandleFn>,
}

impl FnClickHandler {
  pub fn new(
    can_handle: impl Fn(&Segment) -> Result<bool, TreeError> + Send + Sync + 'static,
    handle: impl Fn(&Segment, Option<&ClickEvent>) -> Result<(), TreeError> + Send + Sync + 'static,
  ) -> Self {
    Self {
      can_handle: Arc::new(can_handle),
      handle: Arc::new(handle),
    }
  }
}

impl ValueClickHandler for FnClickHandler {
  fn can_handle(&self, segment: &Segment) -> Result<bool, TreeError> {
    (self.can_handle)(segment)
  }

  fn handle(&self, segment: &Segment, event: Option<&ClickEvent>) -> Result<(), TreeError> {
    (self.handle)(segment, event)
  }
}

type Listener = Arc<dyn Fn(&Segment) + Send + Sync>;

/// Value-click event. Clones share their listeners, so a whole tree emits
/// through the emitter of its root node.
#[derive(Clone, Default)]
pub struct ValueClickEmitter {
  listeners: Arc<Mutex<Vec<Listener>>>,
}

impl ValueClickEmitter {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn subscribe(&self, listener: impl Fn(&Segment) + Send + Sync + 'static) {
    self.listeners.lock().push(Arc::new(listener));
  }

  pub fn emit(&self, segment: &Segment) {
    // Listeners may subscribe from inside a callback.
    let listeners = self.listeners.lock().clone();
    for listener in listeners {
      listener(segment);
    }
  }

  pub fn listener_count(&self) -> usize {
    self.listeners.lock().len()
  }
}

/// Adapts the predicate-only configuration into a chain entry whose action is
/// emitting the value-click event.
pub struct LegacyClickHandler {
  predicate: IsClickableValueFn,
  emitter: ValueClickEmitter,
}

impl LegacyClickHandler {
  pub fn new(predicate: IsClickableValueFn, emitter: ValueClickEmitter) -> Self {
    Self { predicate, emitter }
  }
}

impl ValueClickHandler for LegacyClickHandler {
  fn can_handle(&self, segment: &Segment) -> Result<bool, TreeError> {
    Ok((self.predicate)(segment))
  }

  fn handle(&self, segment: &Segment, _event: Option<&ClickEvent>) -> Result<(), TreeError> {
    self.emitter.emit(segment);
    Ok(())
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
  /// Clickable values are turned off; nothing was evaluated.
  Disabled,
  NoMatch,
  Handled { index: usize },
  /// The matching handler failed; no other handler was tried.
  Failed { index: usize, error: String },
}

/// Ordered handler list; the first handler that can handle a segment wins.
#[derive(Clone, Default)]
pub struct ClickChain {
  handlers: Vec<Arc<dyn ValueClickHandler>>,
}

impl ClickChain {
  pub fn new(handlers: Vec<Arc<dyn ValueClickHandler>>) -> Self {
    Self { handlers }
  }

  /// Legacy entry (if any) first, then the configured handlers or, when none
  /// are configured, the built-in set.
  pub fn assemble(
    legacy: Option<&IsClickableValueFn>,
    emitter: &ValueClickEmitter,
    configured: Option<&[Arc<dyn ValueClickHandler>]>,
  ) -> Self {
    let mut handlers: Vec<Arc<dyn ValueClickHandler>> = Vec::new();
    if let Some(predicate) = legacy {
      handlers.push(Arc::new(LegacyClickHandler::new(
        predicate.clone(),
        emitter.clone(),
      )));
    }
    match configured {
      Some(list) => handlers.extend(list.iter().cloned()),
      None => handlers.extend(crate::handlers::default_value_click_handlers()),
    }
    Self { handlers }
  }

  pub fn len(&self) -> usize {
    self.handlers.len()
  }

  pub fn is_empty(&self) -> bool {
    self.handlers.is_empty()
  }

  /// Whether any handler accepts the segment.
  pub fn can_handle(&self, segment: &Segment) -> bool {
    self
      .handlers
      .iter()
      .any(|h| h.can_handle(segment).unwrap_or(false))
  }

  pub fn dispatch(&self, segment: &Segment, event: Option<&ClickEvent>) -> DispatchOutcome {
    for (index, handler) in self.handlers.iter().enumerate() {
      match handler.can_handle(segment) {
        Ok(true) => {}
        Ok(false) => continue,
        Err(e) => {
          log::debug!("click handler {index} rejected {:?}: {e}", segment.path);
          continue;
        }
      }
      return match handler.handle(segment, event) {
        Ok(()) => DispatchOutcome::Handled { index },
        Err(e) => {
          log::error!("error executing click handler {index} for {:?}: {e}", segment.path);
          DispatchOutcome::Failed {
            index,
            error: e.to_string(),
          }
        }
      };
    }
    DispatchOutcome::NoMatch
  }
}
