use serde::{Deserialize, Serialize};

use crate::value::{iso_timestamp, number_text, Value};

/// Appended once when a string or a whole preview is cut.
pub const ELLIPSIS: char = '…';

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreviewOptions {
  /// Hard cap on the preview length, in characters.
  pub limit: usize,
  /// Strings longer than this are cut inside their quotes.
  pub string_limit: usize,
}

impl Default for PreviewOptions {
  fn default() -> Self {
    Self {
      limit: 200,
      string_limit: 10,
    }
  }
}

#[derive(Default)]
struct Buf {
  text: String,
  chars: usize,
}

impl Buf {
  fn push(&mut self, s: &str) {
    self.text.push_str(s);
    self.chars += s.chars().count();
  }

  fn trim_separator(&mut self) {
    if self.text.ends_with(',') {
      self.text.pop();
      self.chars -= 1;
    }
  }
}

pub fn preview_with(value: &Value, opts: &PreviewOptions) -> String {
  preview(value, opts.limit, opts.string_limit)
}

/// Bounded, human-readable summary of `value`.
///
/// Lists render as `Array[n] [..]`, maps as `Object {"k":..}` (undefined
/// entries skipped). Nested values get the remaining budget
/// `limit - current_length`; once the output reaches `limit` no further items
/// are added, and the result is cut to `limit` characters plus `…`.
pub fn preview(value: &Value, limit: usize, string_limit: usize) -> String {
  let mut out = Buf::default();

  match value {
    Value::Null => out.push("null"),
    Value::Undefined => out.push("undefined"),
    Value::String(s) => out.push(&quote_capped(s, string_limit)),
    Value::Bool(b) => out.push(if *b { "true" } else { "false" }),
    Value::Number(n) => out.push(&number_text(*n)),
    Value::Date(at) => out.push(&format!("\"{}\"", iso_timestamp(at))),
    Value::List(_) => {
      let items = value.entries().unwrap_or_default();
      out.push(&format!("Array[{}] [", items.len()));
      for (_, item) in &items {
        if out.chars >= limit {
          break;
        }
        let nested = preview(item, limit - out.chars, string_limit);
        out.push(&nested);
        out.push(",");
      }
      out.trim_separator();
      out.push("]");
    }
    Value::Map(_) | Value::Ref(_) => {
      let entries = value.entries().unwrap_or_default();
      out.push("Object {");
      for (key, item) in &entries {
        if out.chars >= limit {
          break;
        }
        if matches!(item, Value::Undefined) {
          continue;
        }
        out.push(&format!("\"{key}\":"));
        let nested = preview(item, limit.saturating_sub(out.chars), string_limit);
        out.push(&nested);
        out.push(",");
      }
      out.trim_separator();
      out.push("}");
    }
    Value::Function(_) => out.push("Function"),
    Value::Other(_) => {}
  }

  if out.chars >= limit {
    let mut capped = take_chars(&out.text, limit);
    capped.push(ELLIPSIS);
    return capped;
  }
  out.text
}

fn quote_capped(s: &str, max: usize) -> String {
  if s.chars().count() > max {
    format!("\"{}{ELLIPSIS}\"", take_chars(s, max))
  } else {
    format!("\"{s}\"")
  }
}

fn take_chars(s: &str, max: usize) -> String {
  s.chars().take(max).collect()
}
