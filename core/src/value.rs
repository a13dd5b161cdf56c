use std::{collections::HashSet, fmt, sync::Arc};

use chrono::{DateTime, SecondsFormat, Utc};
use indexmap::IndexMap;
use parking_lot::RwLock;
use serde::{Serialize, Serializer};
use serde_json::Value as Json;

use crate::tree::TreeError;

pub type SharedList = Arc<RwLock<Vec<Value>>>;
pub type SharedMap = Arc<RwLock<IndexMap<String, Value>>>;

/// Key under which a cycle marker exposes the path it points back to.
pub const REF_KEY: &str = "$ref";

type CallableFn = dyn Fn(&[Value]) -> Value + Send + Sync;

/// A function-like host value. Only its name is ever displayed.
#[derive(Clone)]
pub struct Callable {
  name: String,
  func: Arc<CallableFn>,
}

impl Callable {
  pub fn new(name: impl Into<String>, func: impl Fn(&[Value]) -> Value + Send + Sync + 'static) -> Self {
    Self {
      name: name.into(),
      func: Arc::new(func),
    }
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn call(&self, args: &[Value]) -> Value {
    (self.func)(args)
  }

  /// Source-like text used as the segment description.
  pub fn source_text(&self) -> String {
    if self.name.is_empty() {
      "function ()".to_string()
    } else {
      format!("function {}()", self.name)
    }
  }
}

impl fmt::Debug for Callable {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Callable").field("name", &self.name).finish()
  }
}

/// A host value of a kind the classifier has no rule for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Opaque {
  pub kind: String,
  pub text: String,
}

/// Live, possibly cyclic, JSON-like value.
///
/// Lists and maps are shared handles: cloning a `Value` never deep-copies a
/// composite, and the same composite may be reachable from several places
/// (including from inside itself). Identity is the handle, not the content.
/// Cyclic graphs keep themselves alive; break the cycle to free them.
#[derive(Clone)]
pub enum Value {
  Undefined,
  Null,
  Bool(bool),
  Number(f64),
  String(String),
  Date(DateTime<Utc>),
  Function(Callable),
  List(SharedList),
  Map(SharedMap),
  /// Back-reference produced by cycle resolution; reads as `{ "$ref": path }`.
  Ref(String),
  Other(Opaque),
}

impl Value {
  pub fn list(items: impl IntoIterator<Item = Value>) -> Self {
    Value::List(Arc::new(RwLock::new(items.into_iter().collect())))
  }

  pub fn map<K: Into<String>>(entries: impl IntoIterator<Item = (K, Value)>) -> Self {
    Value::Map(Arc::new(RwLock::new(
      entries.into_iter().map(|(k, v)| (k.into(), v)).collect(),
    )))
  }

  pub fn date(at: DateTime<Utc>) -> Self {
    Value::Date(at)
  }

  pub fn function(name: impl Into<String>, func: impl Fn(&[Value]) -> Value + Send + Sync + 'static) -> Self {
    Value::Function(Callable::new(name, func))
  }

  pub fn cycle_ref(path: impl Into<String>) -> Self {
    Value::Ref(path.into())
  }

  pub fn opaque(kind: impl Into<String>, text: impl Into<String>) -> Self {
    Value::Other(Opaque {
      kind: kind.into(),
      text: text.into(),
    })
  }

  /// Lists and maps: the only values the cycle resolver tracks by identity.
  pub fn is_composite(&self) -> bool {
    matches!(self, Value::List(_) | Value::Map(_))
  }

  /// Address of the shared composite, `None` for every other kind.
  pub fn identity(&self) -> Option<usize> {
    match self {
      Value::List(l) => Some(Arc::as_ptr(l) as *const () as usize),
      Value::Map(m) => Some(Arc::as_ptr(m) as *const () as usize),
      _ => None,
    }
  }

  pub fn ptr_eq(&self, other: &Value) -> bool {
    match (self.identity(), other.identity()) {
      (Some(a), Some(b)) => a == b,
      _ => false,
    }
  }

  /// Number of elements or keys; `None` for leaves.
  pub fn len(&self) -> Option<usize> {
    match self {
      Value::List(l) => Some(l.read().len()),
      Value::Map(m) => Some(m.read().len()),
      Value::Ref(_) => Some(1),
      _ => None,
    }
  }

  /// Snapshot of the direct children as `(key, value)` pairs.
  ///
  /// List keys are the stringified indices. The snapshot is taken under the
  /// lock and released before returning, so callers may recurse freely.
  pub fn entries(&self) -> Option<Vec<(String, Value)>> {
    match self {
      Value::List(l) => Some(
        l.read()
          .iter()
          .enumerate()
          .map(|(i, v)| (i.to_string(), v.clone()))
          .collect(),
      ),
      Value::Map(m) => Some(m.read().iter().map(|(k, v)| (k.clone(), v.clone())).collect()),
      Value::Ref(path) => Some(vec![(REF_KEY.to_string(), Value::String(path.clone()))]),
      _ => None,
    }
  }

  pub fn get(&self, key: &str) -> Option<Value> {
    match self {
      Value::List(l) => key.parse::<usize>().ok().and_then(|i| l.read().get(i).cloned()),
      Value::Map(m) => m.read().get(key).cloned(),
      Value::Ref(path) if key == REF_KEY => Some(Value::String(path.clone())),
      _ => None,
    }
  }

  pub fn push(&self, value: Value) -> Result<(), TreeError> {
    match self {
      Value::List(l) => {
        l.write().push(value);
        Ok(())
      }
      other => {
        log::warn!("push on a non-list value ({})", other.kind_label());
        Err(TreeError::InvalidArg(format!("cannot push into {}", other.kind_label())))
      }
    }
  }

  pub fn insert(&self, key: impl Into<String>, value: Value) -> Result<Option<Value>, TreeError> {
    match self {
      Value::Map(m) => Ok(m.write().insert(key.into(), value)),
      other => {
        log::warn!("insert on a non-map value ({})", other.kind_label());
        Err(TreeError::InvalidArg(format!("cannot insert into {}", other.kind_label())))
      }
    }
  }

  /// JSON form with `JSON.stringify` semantics; cycles are resolved first.
  ///
  /// `None` when the value itself has no JSON form (undefined, functions,
  /// unclassifiable kinds).
  pub fn to_json(&self) -> Option<Json> {
    crate::decycle::decycle(self).json_form()
  }

  fn json_form(&self) -> Option<Json> {
    match self {
      Value::Undefined | Value::Function(_) | Value::Other(_) => None,
      Value::Null => Some(Json::Null),
      Value::Bool(b) => Some(Json::Bool(*b)),
      Value::Number(n) => Some(number_json(*n)),
      Value::String(s) => Some(Json::String(s.clone())),
      Value::Date(at) => Some(Json::String(iso_timestamp(at))),
      Value::List(l) => {
        let items = l.read().clone();
        Some(Json::Array(
          items.iter().map(|v| v.json_form().unwrap_or(Json::Null)).collect(),
        ))
      }
      Value::Map(m) => {
        let entries: Vec<(String, Value)> = m.read().iter().map(|(k, v)| (k.clone(), v.clone())).collect();
        let mut out = serde_json::Map::new();
        for (k, v) in entries {
          if let Some(j) = v.json_form() {
            out.insert(k, j);
          }
        }
        Some(Json::Object(out))
      }
      Value::Ref(path) => {
        let mut out = serde_json::Map::new();
        out.insert(REF_KEY.to_string(), Json::String(path.clone()));
        Some(Json::Object(out))
      }
    }
  }

  fn kind_label(&self) -> &'static str {
    match self {
      Value::Undefined => "undefined",
      Value::Null => "null",
      Value::Bool(_) => "boolean",
      Value::Number(_) => "number",
      Value::String(_) => "string",
      Value::Date(_) => "date",
      Value::Function(_) => "function",
      Value::List(_) => "list",
      Value::Map(_) => "map",
      Value::Ref(_) => "ref",
      Value::Other(_) => "other",
    }
  }
}

/// ISO-8601 timestamp with millisecond precision, `Z` suffix.
pub fn iso_timestamp(at: &DateTime<Utc>) -> String {
  at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Canonical number text, the same digits the JSON form of the number has:
/// integers without a decimal point, shortest round-trip decimals, exponent
/// notation for very large or very small magnitudes (`1e21`, `1e-7`).
/// Non-finite numbers have no JSON form and print as `NaN`, `Infinity`,
/// `-Infinity`.
pub fn number_text(n: f64) -> String {
  if n.is_nan() {
    return "NaN".to_string();
  }
  if n.is_infinite() {
    let text = if n > 0.0 { "Infinity" } else { "-Infinity" };
    return text.to_string();
  }
  number_json(n).to_string()
}

fn number_json(n: f64) -> Json {
  const MAX_SAFE: f64 = 9_007_199_254_740_991.0;
  if n.is_finite() && n.fract() == 0.0 && n.abs() <= MAX_SAFE {
    return Json::from(n as i64);
  }
  serde_json::Number::from_f64(n).map(Json::Number).unwrap_or(Json::Null)
}

impl PartialEq for Value {
  /// Structural equality. Composite pairs already under comparison count as
  /// equal, so cyclic values compare without recursing forever.
  fn eq(&self, other: &Self) -> bool {
    structural_eq(self, other, &mut HashSet::new())
  }
}

fn structural_eq(a: &Value, b: &Value, seen: &mut HashSet<(usize, usize)>) -> bool {
  match (a, b) {
    (Value::Undefined, Value::Undefined) | (Value::Null, Value::Null) => true,
    (Value::Bool(x), Value::Bool(y)) => x == y,
    (Value::Number(x), Value::Number(y)) => x == y,
    (Value::String(x), Value::String(y)) => x == y,
    (Value::Date(x), Value::Date(y)) => x == y,
    (Value::Function(x), Value::Function(y)) => Arc::ptr_eq(&x.func, &y.func),
    (Value::Ref(x), Value::Ref(y)) => x == y,
    (Value::Other(x), Value::Other(y)) => x == y,
    (Value::List(x), Value::List(y)) => {
      if Arc::ptr_eq(x, y) || !seen.insert(pair(a, b)) {
        return true;
      }
      let (x, y) = (x.read().clone(), y.read().clone());
      x.len() == y.len() && x.iter().zip(y.iter()).all(|(vx, vy)| structural_eq(vx, vy, seen))
    }
    (Value::Map(x), Value::Map(y)) => {
      if Arc::ptr_eq(x, y) || !seen.insert(pair(a, b)) {
        return true;
      }
      let (x, y) = (x.read().clone(), y.read().clone());
      x.len() == y.len()
        && x
          .iter()
          .zip(y.iter())
          .all(|((kx, vx), (ky, vy))| kx == ky && structural_eq(vx, vy, seen))
    }
    _ => false,
  }
}

fn pair(a: &Value, b: &Value) -> (usize, usize) {
  (a.identity().unwrap_or(0), b.identity().unwrap_or(0))
}

impl fmt::Debug for Value {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Value::Undefined => f.write_str("undefined"),
      Value::Function(c) => f.write_str(&c.source_text()),
      Value::Other(o) => write!(f, "<{}> {}", o.kind, o.text),
      _ => match self.to_json() {
        Some(json) => write!(f, "{json}"),
        None => f.write_str("undefined"),
      },
    }
  }
}

impl Serialize for Value {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    self.to_json().serialize(serializer)
  }
}

impl From<Json> for Value {
  fn from(json: Json) -> Self {
    match json {
      Json::Null => Value::Null,
      Json::Bool(b) => Value::Bool(b),
      Json::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
      Json::String(s) => Value::String(s),
      Json::Array(items) => Value::list(items.into_iter().map(Value::from)),
      Json::Object(map) => Value::map(map.into_iter().map(|(k, v)| (k, Value::from(v)))),
    }
  }
}

impl From<bool> for Value {
  fn from(b: bool) -> Self {
    Value::Bool(b)
  }
}

impl From<f64> for Value {
  fn from(n: f64) -> Self {
    Value::Number(n)
  }
}

impl From<i64> for Value {
  fn from(n: i64) -> Self {
    Value::Number(n as f64)
  }
}

impl From<i32> for Value {
  fn from(n: i32) -> Self {
    Value::Number(n as f64)
  }
}

impl From<&str> for Value {
  fn from(s: &str) -> Self {
    Value::String(s.to_string())
  }
}

impl From<String> for Value {
  fn from(s: String) -> Self {
    Value::String(s)
  }
}

impl From<DateTime<Utc>> for Value {
  fn from(at: DateTime<Utc>) -> Self {
    Value::Date(at)
  }
}

impl From<Vec<Value>> for Value {
  fn from(items: Vec<Value>) -> Self {
    Value::list(items)
  }
}
