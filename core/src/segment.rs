use crate::{
  models::{ParentRef, Segment, SegmentType},
  preview::{preview_with, PreviewOptions},
  value::{iso_timestamp, number_text, Value},
};

/// Classify a value; `None` for kinds without a rule.
///
/// Order: number, boolean, function, string, undefined, null, list, date,
/// then any other composite (maps and cycle markers) as a generic object.
pub fn classify(value: &Value) -> Option<SegmentType> {
  match value {
    Value::Number(_) => Some(SegmentType::Number),
    Value::Bool(_) => Some(SegmentType::Boolean),
    Value::Function(_) => Some(SegmentType::Function),
    Value::String(_) => Some(SegmentType::String),
    Value::Undefined => Some(SegmentType::Undefined),
    Value::Null => Some(SegmentType::Null),
    Value::List(_) => Some(SegmentType::Array),
    Value::Date(_) => Some(SegmentType::Date),
    Value::Map(_) | Value::Ref(_) => Some(SegmentType::Object),
    Value::Other(_) => None,
  }
}

/// Type of a whole root value, where dates count as plain objects.
pub fn root_type(value: &Value) -> Option<SegmentType> {
  match classify(value) {
    Some(SegmentType::Date) => Some(SegmentType::Object),
    other => other,
  }
}

/// Display text for a classified value.
pub fn describe(value: &Value, kind: SegmentType, preview: &PreviewOptions) -> String {
  match (kind, value) {
    (SegmentType::Number, Value::Number(n)) => number_text(*n),
    (SegmentType::Boolean, Value::Bool(b)) => b.to_string(),
    (SegmentType::Function, Value::Function(c)) => c.source_text(),
    (SegmentType::String, Value::String(s)) => json_quote(s),
    (SegmentType::Undefined, _) => "undefined".to_string(),
    (SegmentType::Null, _) => "null".to_string(),
    (SegmentType::Array, _) | (SegmentType::Object, _) => preview_with(value, preview),
    (SegmentType::Date, Value::Date(at)) => format!("\"{}\"", iso_timestamp(at)),
    (_, other) => fallback_text(other),
  }
}

/// Builds the segments of one node: every segment shares the same parent.
#[derive(Debug, Clone)]
pub struct SegmentBuilder<'a> {
  parent: Option<&'a ParentRef>,
  preview: PreviewOptions,
}

impl<'a> SegmentBuilder<'a> {
  pub fn new(parent: Option<&'a ParentRef>, preview: PreviewOptions) -> Self {
    Self { parent, preview }
  }

  /// `key` at the root, `parent[key]` under an array, `parent.key` otherwise.
  pub fn path_for(&self, key: &str) -> String {
    match self.parent {
      None => key.to_string(),
      Some(p) if p.kind == Some(SegmentType::Array) => format!("{}[{}]", p.path, key),
      Some(p) => format!("{}.{}", p.path, key),
    }
  }

  /// `expansion` maps the computed path to the segment's expanded flag.
  pub fn build(&self, key: &str, value: Value, expansion: impl Fn(&str) -> bool) -> Segment {
    let path = self.path_for(key);
    let expanded = expansion(&path);
    let kind = classify(&value);
    let description = match kind {
      Some(kind) => describe(&value, kind, &self.preview),
      None => {
        log::error!("unknown type parsing json key/value at {path:?}");
        fallback_text(&value)
      }
    };

    Segment {
      key: key.to_string(),
      value,
      kind,
      description,
      expanded,
      parent: self.parent.cloned(),
      path,
    }
  }
}

/// Segment for a root value that is not a composite, keyed `(<type>)`.
pub fn build_root(value: Value, preview: PreviewOptions) -> Segment {
  let key = format!(
    "({})",
    root_type(&value).map(|t| t.as_str()).unwrap_or("unknown")
  );
  SegmentBuilder::new(None, preview).build(&key, value, |_| false)
}

fn json_quote(s: &str) -> String {
  serde_json::to_string(s).unwrap_or_else(|_| format!("\"{}\"", s.replace('"', "\\\"")))
}

fn fallback_text(value: &Value) -> String {
  match value {
    Value::Other(o) => o.text.clone(),
    other => format!("{other:?}"),
  }
}
