use std::collections::HashMap;

use crate::value::Value;

/// Path token of the value handed to [`decycle`].
pub const ROOT_PATH: &str = "$";

/// Produce an acyclic copy of `root`.
///
/// Every list and map is rebuilt. The first visit of a composite records its
/// path (`$`, `$[0]`, `$["key"]`, ...); any later visit of the same composite
/// (same handle, not equal content) becomes `Value::Ref(first_path)`. Leaves,
/// including dates, functions and existing refs, are returned as is.
pub fn decycle(root: &Value) -> Value {
  let mut seen: HashMap<usize, String> = HashMap::new();
  derez(root, ROOT_PATH.to_string(), &mut seen)
}

fn derez(value: &Value, path: String, seen: &mut HashMap<usize, String>) -> Value {
  let Some(id) = value.identity() else {
    return value.clone();
  };
  if let Some(first) = seen.get(&id) {
    return Value::Ref(first.clone());
  }
  seen.insert(id, path.clone());

  match value {
    Value::List(items) => {
      let items = items.read().clone();
      Value::list(
        items
          .iter()
          .enumerate()
          .map(|(i, v)| derez(v, format!("{path}[{i}]"), seen)),
      )
    }
    Value::Map(entries) => {
      let entries: Vec<(String, Value)> = entries
        .read()
        .iter()
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();
      Value::map(entries.into_iter().map(|(k, v)| {
        let child_path = format!("{path}[{}]", quote_key(&k));
        let resolved = derez(&v, child_path, seen);
        (k, resolved)
      }))
    }
    _ => value.clone(),
  }
}

fn quote_key(k: &str) -> String {
  serde_json::to_string(k).unwrap_or_else(|_| format!("\"{}\"", k.replace('"', "\\\"")))
}
