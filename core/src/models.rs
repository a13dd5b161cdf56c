use serde::{Deserialize, Serialize};

use crate::value::Value;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SegmentType {
  Number,
  Boolean,
  String,
  Undefined,
  Null,
  Array,
  Object,
  Date,
  Function,
}

impl SegmentType {
  pub fn as_str(&self) -> &'static str {
    match self {
      SegmentType::Number => "number",
      SegmentType::Boolean => "boolean",
      SegmentType::String => "string",
      SegmentType::Undefined => "undefined",
      SegmentType::Null => "null",
      SegmentType::Array => "array",
      SegmentType::Object => "object",
      SegmentType::Date => "date",
      SegmentType::Function => "function",
    }
  }
}

/// Non-owning link from a segment (or a nested node) to its enclosing segment.
///
/// Only what lookups need: the parent's key, path and type.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ParentRef {
  pub key: String,
  pub path: String,
  #[serde(rename = "type")]
  pub kind: Option<SegmentType>,
}

/// One labeled key/value pair (or root value) of the displayed tree.
#[derive(Debug, Clone, Serialize)]
pub struct Segment {
  /// Object key, stringified array index, or `(type)` for a root primitive.
  pub key: String,
  pub value: Value,
  /// `None` only for values of an unclassifiable kind.
  #[serde(rename = "type")]
  pub kind: Option<SegmentType>,
  pub description: String,
  pub expanded: bool,
  pub parent: Option<ParentRef>,
  /// Dot/bracket address, e.g. `settings.items[1].value`.
  pub path: String,
}

impl Segment {
  /// Non-empty object or array.
  pub fn is_expandable(&self) -> bool {
    match self.kind {
      Some(SegmentType::Object) | Some(SegmentType::Array) => self.value.len().unwrap_or(0) > 0,
      _ => false,
    }
  }

  /// Object without keys or array without elements.
  pub fn is_empty(&self) -> bool {
    match self.kind {
      Some(SegmentType::Object) | Some(SegmentType::Array) => self.value.len().unwrap_or(0) == 0,
      _ => false,
    }
  }

  pub fn opening_brace(&self) -> Option<&'static str> {
    match self.kind {
      Some(SegmentType::Array) => Some("["),
      Some(SegmentType::Object) => Some("{"),
      _ => None,
    }
  }

  pub fn closing_brace(&self) -> Option<&'static str> {
    match self.kind {
      Some(SegmentType::Array) => Some("]"),
      Some(SegmentType::Object) => Some("}"),
      _ => None,
    }
  }

  pub fn parent_ref(&self) -> ParentRef {
    ParentRef {
      key: self.key.clone(),
      path: self.path.clone(),
      kind: self.kind,
    }
  }
}

/// A segment as a host paints it: position plus the derived flags.
#[derive(Debug, Clone, Serialize)]
pub struct Row {
  /// Nesting level of the node that owns the segment (root node = 0).
  pub depth: usize,
  pub segment: Segment,
  pub expandable: bool,
  pub empty: bool,
  pub clickable: bool,
  /// Punctuation around the segment's children, for objects and arrays.
  pub opening_brace: Option<&'static str>,
  pub closing_brace: Option<&'static str>,
}
