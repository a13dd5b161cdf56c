use std::{collections::HashMap, fmt, sync::Arc};

use indexmap::IndexMap;
use thiserror::Error;

use crate::{
  decycle::decycle,
  dispatch::{ClickChain, DispatchOutcome, IsClickableValueFn, ValueClickEmitter, ValueClickHandler},
  expansion::{auto_expand, ExpansionStore},
  ids::{default_id_generator, IdGenerator},
  models::{ParentRef, Row, Segment, SegmentType},
  preview::PreviewOptions,
  propagation::{stop_click_propagation, ClickEvent},
  segment::{root_type, SegmentBuilder},
  value::Value,
};

#[derive(Debug, Error)]
pub enum TreeError {
  #[error("io error: {0}")]
  Io(#[from] std::io::Error),
  #[error("invalid settings: {0}")]
  Settings(#[from] serde_json::Error),
  #[error("invalid argument: {0}")]
  InvalidArg(String),
  #[error("no mounted segment at path {0:?}")]
  UnknownPath(String),
  #[error("click handler error: {0}")]
  Handler(String),
  #[error("open link error: {0}")]
  Open(String),
}

/// Inputs shared by a root node and every node nested under it.
#[derive(Clone)]
pub struct TreeOptions {
  /// Default state of expandable segments, bounded by `depth`.
  pub expanded: bool,
  /// Deepest node level expanded by default; `-1` means unlimited.
  pub depth: i32,
  pub enable_clickable_values: bool,
  /// `None` selects the built-in handlers.
  pub value_click_handlers: Option<Vec<Arc<dyn ValueClickHandler>>>,
  pub stop_click_propagation: bool,
  /// Deprecated predicate form; dispatched ahead of `value_click_handlers`
  /// and answered with the value-click event.
  pub is_clickable_value: Option<IsClickableValueFn>,
  pub preview: PreviewOptions,
  pub id_generator: Arc<dyn IdGenerator>,
}

impl Default for TreeOptions {
  fn default() -> Self {
    Self {
      expanded: true,
      depth: -1,
      enable_clickable_values: false,
      value_click_handlers: None,
      stop_click_propagation: true,
      is_clickable_value: None,
      preview: PreviewOptions::default(),
      id_generator: default_id_generator(),
    }
  }
}

impl fmt::Debug for TreeOptions {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("TreeOptions")
      .field("expanded", &self.expanded)
      .field("depth", &self.depth)
      .field("enable_clickable_values", &self.enable_clickable_values)
      .field(
        "value_click_handlers",
        &self.value_click_handlers.as_ref().map(|h| h.len()),
      )
      .field("stop_click_propagation", &self.stop_click_propagation)
      .field("is_clickable_value", &self.is_clickable_value.is_some())
      .field("preview", &self.preview)
      .finish_non_exhaustive()
  }
}

#[derive(Debug)]
struct Derived {
  segments: Vec<Segment>,
}

/// One level of the tree: the segments of a value plus the nested nodes of
/// its expanded segments.
///
/// Segments are derived lazily from the inputs and re-derived after any input
/// changes. Expansion overrides live in a per-node store keyed by path; the
/// store survives new `json` values and is cleared when `depth` changes.
///
/// Nested nodes are kept in segment order. A collapsed segment's node is
/// unmounted but parked by path, so its overrides (and those of its own
/// nested nodes) come back when the segment expands again.
pub struct TreeNode {
  id: String,
  json: Value,
  options: TreeOptions,
  parent: Option<ParentRef>,
  current_depth: usize,
  store: ExpansionStore,
  events: ValueClickEmitter,
  derived: Option<Derived>,
  children: IndexMap<String, TreeNode>,
  detached: HashMap<String, TreeNode>,
}

impl TreeNode {
  pub fn new(json: Value, options: TreeOptions) -> Self {
    Self::nested(json, options, None, 0, ValueClickEmitter::new())
  }

  fn nested(
    json: Value,
    options: TreeOptions,
    parent: Option<ParentRef>,
    current_depth: usize,
    events: ValueClickEmitter,
  ) -> Self {
    let id = options.id_generator.next();
    Self {
      id,
      json,
      options,
      parent,
      current_depth,
      store: ExpansionStore::new(),
      events,
      derived: None,
      children: IndexMap::new(),
      detached: HashMap::new(),
    }
  }

  pub fn id(&self) -> &str {
    &self.id
  }

  pub fn json(&self) -> &Value {
    &self.json
  }

  pub fn options(&self) -> &TreeOptions {
    &self.options
  }

  pub fn parent(&self) -> Option<&ParentRef> {
    self.parent.as_ref()
  }

  pub fn current_depth(&self) -> usize {
    self.current_depth
  }

  pub fn expansion_store(&self) -> &ExpansionStore {
    &self.store
  }

  /// Subscribe to value-click events of this node and its descendants.
  pub fn on_value_click(&self, listener: impl Fn(&Segment) + Send + Sync + 'static) {
    self.events.subscribe(listener);
  }

  // --- inputs ---

  pub fn set_json(&mut self, json: Value) {
    self.json = json;
    self.invalidate();
  }

  pub fn set_expanded(&mut self, expanded: bool) {
    let options = TreeOptions {
      expanded,
      ..self.options.clone()
    };
    self.set_options(options);
  }

  /// Changing the depth forgets every expansion override of this node (and,
  /// on the next read, of its nested nodes).
  pub fn set_depth(&mut self, depth: i32) {
    let options = TreeOptions {
      depth,
      ..self.options.clone()
    };
    self.set_options(options);
  }

  pub fn set_enable_clickable_values(&mut self, enabled: bool) {
    let options = TreeOptions {
      enable_clickable_values: enabled,
      ..self.options.clone()
    };
    self.set_options(options);
  }

  pub fn set_stop_click_propagation(&mut self, enabled: bool) {
    let options = TreeOptions {
      stop_click_propagation: enabled,
      ..self.options.clone()
    };
    self.set_options(options);
  }

  pub fn set_value_click_handlers(&mut self, handlers: Option<Vec<Arc<dyn ValueClickHandler>>>) {
    let options = TreeOptions {
      value_click_handlers: handlers,
      ..self.options.clone()
    };
    self.set_options(options);
  }

  pub fn set_is_clickable_value(&mut self, predicate: Option<IsClickableValueFn>) {
    let options = TreeOptions {
      is_clickable_value: predicate,
      ..self.options.clone()
    };
    self.set_options(options);
  }

  pub fn set_options(&mut self, options: TreeOptions) {
    if options.depth != self.options.depth {
      log::debug!(
        "depth {} -> {} on node {}: clearing {} expansion overrides",
        self.options.depth,
        options.depth,
        self.id,
        self.store.len()
      );
      self.store.clear();
    }
    self.options = options;
    self.invalidate();
  }

  fn invalidate(&mut self) {
    self.derived = None;
  }

  // --- derived data ---

  fn refresh(&mut self) {
    if self.derived.is_some() {
      return;
    }
    let resolved = decycle(&self.json);
    let default_expanded = auto_expand(self.options.expanded, self.options.depth, self.current_depth);
    let builder = SegmentBuilder::new(self.parent.as_ref(), self.options.preview);
    let store = &self.store;
    let segments: Vec<Segment> = resolved
      .entries()
      .unwrap_or_default()
      .into_iter()
      .map(|(key, value)| builder.build(&key, value, |path| store.resolve(path, default_expanded)))
      .collect();

    self.sync_children(&segments);
    self.derived = Some(Derived { segments });
  }

  /// Mount a nested node for every expanded, expandable segment, in segment
  /// order; reuse the nodes already mounted (or parked) at the same path and
  /// park the rest.
  fn sync_children(&mut self, segments: &[Segment]) {
    let mut previous = std::mem::take(&mut self.children);
    for segment in segments.iter().filter(|s| s.is_expandable() && s.expanded) {
      let child = match previous.shift_remove(&segment.path) {
        Some(mut child) => {
          child.rebind(segment, &self.options);
          child
        }
        None => self.mount_child(segment),
      };
      self.children.insert(segment.path.clone(), child);
    }
    for (path, child) in previous {
      self.detach(path, child);
    }
  }

  /// Node for a newly expanded segment: the parked one if there is one.
  fn mount_child(&mut self, segment: &Segment) -> TreeNode {
    if let Some(mut child) = self.detached.remove(&segment.path) {
      log::debug!("remount node at {:?}", segment.path);
      child.rebind(segment, &self.options);
      return child;
    }
    log::debug!("mount node at {:?} (depth {})", segment.path, self.current_depth + 1);
    TreeNode::nested(
      segment.value.clone(),
      self.options.clone(),
      Some(segment.parent_ref()),
      self.current_depth + 1,
      self.events.clone(),
    )
  }

  fn detach(&mut self, path: String, child: TreeNode) {
    log::debug!("unmount node at {path:?}");
    self.detached.insert(path, child);
  }

  fn rebind(&mut self, segment: &Segment, options: &TreeOptions) {
    self.parent = Some(segment.parent_ref());
    self.json = segment.value.clone();
    self.set_options(options.clone());
  }

  /// Key/value segments of this node, in key or index order.
  pub fn segments(&mut self) -> &[Segment] {
    self.refresh();
    self.derived.as_ref().map(|d| d.segments.as_slice()).unwrap_or(&[])
  }

  /// Root segment for a value without entries (number, string, date, ...).
  ///
  /// Its key is empty, its description is the JSON text of the value.
  pub fn primitive_segment(&self) -> Option<Segment> {
    if self.json.len().is_some() {
      return None;
    }
    let mut segment = SegmentBuilder::new(None, self.options.preview).build("", self.json.clone(), |_| false);
    segment.description = self.as_string();
    segment.path = self.parent.as_ref().map(|p| p.path.clone()).unwrap_or_default();
    segment.parent = self.parent.clone();
    Some(segment)
  }

  pub fn root_type(&self) -> Option<SegmentType> {
    root_type(&self.json)
  }

  pub fn is_array_element(&self) -> bool {
    self.root_type() == Some(SegmentType::Array)
  }

  pub fn opening_brace(&self) -> &'static str {
    if self.is_array_element() {
      "["
    } else {
      "{"
    }
  }

  pub fn closing_brace(&self) -> &'static str {
    if self.is_array_element() {
      "]"
    } else {
      "}"
    }
  }

  /// The whole value as indented JSON text, `undefined` if it has none.
  pub fn as_string(&self) -> String {
    match self.json.to_json() {
      Some(json) => serde_json::to_string_pretty(&json)
        .map(|s| s.trim().to_string())
        .unwrap_or_default(),
      None => "undefined".to_string(),
    }
  }

  pub fn is_expandable(&self, segment: &Segment) -> bool {
    segment.is_expandable()
  }

  pub fn is_empty(&self, segment: &Segment) -> bool {
    segment.is_empty()
  }

  /// Clickable values are enabled and some handler accepts the segment.
  pub fn is_clickable(&self, segment: &Segment) -> bool {
    self.options.enable_clickable_values && self.click_chain().can_handle(segment)
  }

  pub fn is_clickable_primitive(&self) -> bool {
    self
      .primitive_segment()
      .is_some_and(|segment| self.is_clickable(&segment))
  }

  pub fn click_chain(&self) -> ClickChain {
    ClickChain::assemble(
      self.options.is_clickable_value.as_ref(),
      &self.events,
      self.options.value_click_handlers.as_deref(),
    )
  }

  // --- nested nodes ---

  /// Mounted nested node for the segment at `path`, direct children only.
  pub fn child(&mut self, path: &str) -> Option<&mut TreeNode> {
    self.refresh();
    self.children.get_mut(path)
  }

  pub fn child_count(&mut self) -> usize {
    self.refresh();
    self.children.len()
  }

  fn owner_of(&mut self, path: &str) -> Option<&mut TreeNode> {
    self.refresh();
    let owns = self
      .derived
      .as_ref()
      .is_some_and(|d| d.segments.iter().any(|s| s.path == path));
    if owns {
      return Some(self);
    }
    self.children.values_mut().find_map(|child| child.owner_of(path))
  }

  fn local_segment(&self, path: &str) -> Option<&Segment> {
    self
      .derived
      .as_ref()
      .and_then(|d| d.segments.iter().find(|s| s.path == path))
  }

  /// Segment at `path` anywhere in the mounted tree.
  ///
  /// Keys containing `.` or brackets can make two segments share a path; the
  /// lookup then prefers the shallowest owner, and among nested nodes the
  /// one whose segment comes first.
  pub fn find_segment(&mut self, path: &str) -> Option<Segment> {
    self.owner_of(path).and_then(|node| node.local_segment(path).cloned())
  }

  /// Node that owns the segment at `path`, searched through mounted nodes.
  pub fn node_for(&mut self, path: &str) -> Option<&mut TreeNode> {
    self.owner_of(path)
  }

  // --- interaction ---

  /// Flip the segment at `path`; returns its new state.
  ///
  /// Only the owning node changes: its override store, the segment flag, and
  /// the nested node mounted under the segment.
  pub fn toggle(&mut self, path: &str) -> Result<bool, TreeError> {
    let owner = self
      .owner_of(path)
      .ok_or_else(|| TreeError::UnknownPath(path.to_string()))?;
    Ok(owner.toggle_local(path))
  }

  pub fn toggle_clicked(&mut self, path: &str, event: &ClickEvent) -> Result<bool, TreeError> {
    stop_click_propagation(self.options.stop_click_propagation, event);
    self.toggle(path)
  }

  fn toggle_local(&mut self, path: &str) -> bool {
    let Some(derived) = self.derived.as_mut() else {
      return false;
    };
    let Some(segment) = derived.segments.iter_mut().find(|s| s.path == path) else {
      return false;
    };
    let Some(next) = self.store.toggle(segment) else {
      return segment.expanded;
    };
    segment.expanded = next;
    let segment = segment.clone();

    if next {
      let child = self.mount_child(&segment);
      self.children.insert(segment.path, child);
      self.order_children();
    } else if let Some(child) = self.children.shift_remove(&segment.path) {
      self.detach(segment.path, child);
    }
    next
  }

  fn order_children(&mut self) {
    let Some(derived) = self.derived.as_ref() else {
      return;
    };
    let position: HashMap<&str, usize> = derived
      .segments
      .iter()
      .enumerate()
      .map(|(i, s)| (s.path.as_str(), i))
      .collect();
    self.children.sort_by(|a, _, b, _| {
      let pa = position.get(a.as_str()).copied().unwrap_or(usize::MAX);
      let pb = position.get(b.as_str()).copied().unwrap_or(usize::MAX);
      pa.cmp(&pb)
    });
  }

  /// Value click on the segment at `path`.
  pub fn click(&mut self, path: &str, event: Option<&ClickEvent>) -> Result<DispatchOutcome, TreeError> {
    let owner = self
      .owner_of(path)
      .ok_or_else(|| TreeError::UnknownPath(path.to_string()))?;
    let segment = owner
      .local_segment(path)
      .cloned()
      .ok_or_else(|| TreeError::UnknownPath(path.to_string()))?;
    Ok(owner.dispatch_click(&segment, event))
  }

  /// Value click on the root primitive segment.
  pub fn click_primitive(&self, event: Option<&ClickEvent>) -> DispatchOutcome {
    match self.primitive_segment() {
      Some(segment) => self.dispatch_click(&segment, event),
      None => DispatchOutcome::NoMatch,
    }
  }

  fn dispatch_click(&self, segment: &Segment, event: Option<&ClickEvent>) -> DispatchOutcome {
    if let Some(event) = event {
      stop_click_propagation(self.options.stop_click_propagation, event);
    }
    if !self.options.enable_clickable_values {
      return DispatchOutcome::Disabled;
    }
    self.click_chain().dispatch(segment, event)
  }

  /// Flattened view of the mounted tree, parents before their children.
  pub fn rows(&mut self) -> Vec<Row> {
    let mut out = Vec::new();
    self.collect_rows(&mut out);
    out
  }

  fn collect_rows(&mut self, out: &mut Vec<Row>) {
    if let Some(segment) = self.primitive_segment() {
      out.push(Row {
        depth: self.current_depth,
        expandable: false,
        empty: false,
        clickable: self.is_clickable(&segment),
        opening_brace: None,
        closing_brace: None,
        segment,
      });
      return;
    }

    self.refresh();
    let segments = self
      .derived
      .as_ref()
      .map(|d| d.segments.clone())
      .unwrap_or_default();
    for segment in segments {
      let path = segment.path.clone();
      out.push(Row {
        depth: self.current_depth,
        expandable: segment.is_expandable(),
        empty: segment.is_empty(),
        clickable: self.is_clickable(&segment),
        opening_brace: segment.opening_brace(),
        closing_brace: segment.closing_brace(),
        segment,
      });
      if let Some(child) = self.children.get_mut(&path) {
        child.collect_rows(out);
      }
    }
  }
}

impl fmt::Debug for TreeNode {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("TreeNode")
      .field("id", &self.id)
      .field("json", &self.json)
      .field("parent", &self.parent)
      .field("current_depth", &self.current_depth)
      .field("store", &self.store)
      .field("children", &self.children.len())
      .field("detached", &self.detached.len())
      .finish_non_exhaustive()
  }
}
