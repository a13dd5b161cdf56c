use std::path::PathBuf;

use jt_core::{build_root, TreeNode, TreeOptions, TreeSettings, Value};

fn main() -> Result<(), String> {
  let path = std::env::args()
    .nth(1)
    .ok_or_else(|| "usage: cargo run -p jt_core --example smoke_tree -- <path-to-json> [settings.json]".to_string())?;
  let path = PathBuf::from(path);

  let options = match std::env::args().nth(2) {
    Some(settings) => TreeSettings::load(settings)
      .map_err(|e| e.to_string())?
      .apply(TreeOptions::default()),
    None => TreeOptions::default(),
  };
  let preview = options.preview;

  let text = std::fs::read_to_string(&path).map_err(|e| e.to_string())?;
  let json: serde_json::Value = serde_json::from_str(&text).map_err(|e| e.to_string())?;
  let value = Value::from(json);

  let mut tree = TreeNode::new(value.clone(), options);
  println!("root={}", tree.id());

  if tree.primitive_segment().is_some() {
    let root = build_root(value, preview);
    println!("{}: {}", root.key, root.description);
    return Ok(());
  }

  println!("{}", tree.opening_brace());
  for row in tree.rows() {
    let marker = match (row.expandable, row.segment.expanded) {
      (true, true) => "v",
      (true, false) => ">",
      _ => " ",
    };
    println!(
      "{}{} {}: {}",
      "  ".repeat(row.depth + 1),
      marker,
      row.segment.key,
      row.segment.description
    );
  }
  println!("{}", tree.closing_brace());
  Ok(())
}
