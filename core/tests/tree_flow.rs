use std::sync::Arc;

use serde_json::json;

use jt_core::{
  ClickEvent, FnClickHandler, IsClickableValueFn, Segment, SegmentType, SequentialIdGenerator,
  TreeError, TreeNode, TreeOptions, Value, ValueClickHandler,
};

fn tree(json: serde_json::Value) -> TreeNode {
  TreeNode::new(Value::from(json), TreeOptions::default())
}

fn paths(node: &mut TreeNode) -> Vec<String> {
  node.rows().into_iter().map(|r| r.segment.path).collect()
}

#[test]
fn segments_keep_key_order_and_paths() {
  let mut t = tree(json!({ "b": 1, "a": { "c": [10, { "d": true }] }, "e": [] }));

  let keys: Vec<String> = t.segments().iter().map(|s| s.key.clone()).collect();
  assert_eq!(keys, vec!["b", "a", "e"]);

  assert_eq!(
    paths(&mut t),
    vec!["b", "a", "a.c", "a.c[0]", "a.c[1]", "a.c[1].d", "e"]
  );

  let rows = t.rows();
  let depths: Vec<usize> = rows.iter().map(|r| r.depth).collect();
  assert_eq!(depths, vec![0, 0, 1, 2, 2, 3, 0]);

  assert_eq!(rows[1].opening_brace, Some("{"));
  assert_eq!(rows[2].closing_brace, Some("]"));
  assert_eq!(rows[0].opening_brace, None);

  let d = t.find_segment("a.c[1].d").unwrap();
  assert_eq!(d.kind, Some(SegmentType::Boolean));
  assert_eq!(d.parent.as_ref().map(|p| p.path.as_str()), Some("a.c[1]"));
}

#[test]
fn recomputing_yields_identical_paths() {
  let mut t = tree(json!({ "x": [{ "y": 1 }, { "y": 2 }], "z": { "w": null } }));
  let first = paths(&mut t);
  t.set_json(Value::from(json!({ "x": [{ "y": 1 }, { "y": 2 }], "z": { "w": null } })));
  let second = paths(&mut t);
  assert_eq!(first, second);
}

#[test]
fn toggles_survive_new_data_and_reset_on_depth_change() {
  let mut t = tree(json!({ "a": { "b": { "c": 1 } } }));
  assert!(t.find_segment("a.b").unwrap().expanded);

  assert!(!t.toggle("a.b").unwrap());
  assert!(!t.find_segment("a.b").unwrap().expanded);
  assert!(t.find_segment("a.b.c").is_none());

  // Different data, same paths: the override stays.
  t.set_json(Value::from(json!({ "a": { "b": { "c": 2, "d": 3 } }, "n": 1 })));
  assert!(!t.find_segment("a.b").unwrap().expanded);
  assert!(t.find_segment("a").unwrap().expanded);

  // New depth: back to the computed default.
  t.set_depth(5);
  assert!(t.find_segment("a.b").unwrap().expanded);
  assert_eq!(t.find_segment("a.b.d").unwrap().description, "3");

  t.set_depth(1);
  assert!(t.find_segment("a").unwrap().expanded);
  assert!(!t.find_segment("a.b").unwrap().expanded);
}

#[test]
fn toggle_is_local_to_the_segment() {
  let mut t = tree(json!({ "p": { "x": 1 }, "q": { "y": 2 } }));
  assert!(!t.toggle("p").unwrap());
  assert!(!t.find_segment("p").unwrap().expanded);
  assert!(t.find_segment("q").unwrap().expanded);
  assert!(t.find_segment("q.y").is_some());
  assert!(t.find_segment("p.x").is_none());

  assert!(t.toggle("p").unwrap());
  assert_eq!(t.find_segment("p.x").unwrap().description, "1");
}

#[test]
fn empty_composites_never_expand() {
  let mut t = tree(json!({ "o": {}, "l": [] }));
  for row in t.rows() {
    assert!(row.empty);
    assert!(!row.expandable);
  }
  assert_eq!(t.child_count(), 0);

  let before = t.find_segment("o").unwrap().expanded;
  assert_eq!(t.toggle("o").unwrap(), before);
  assert!(t.expansion_store().is_empty());

  let mut collapsed = TreeNode::new(
    Value::from(json!({ "o": {} })),
    TreeOptions {
      expanded: false,
      ..TreeOptions::default()
    },
  );
  assert!(collapsed.rows().iter().all(|r| !r.expandable));
}

#[test]
fn depth_limits_default_expansion() {
  let mut t = TreeNode::new(
    Value::from(json!({ "a": { "b": { "c": 1 } } })),
    TreeOptions {
      depth: 1,
      ..TreeOptions::default()
    },
  );
  assert!(t.find_segment("a").unwrap().expanded);
  assert!(!t.find_segment("a.b").unwrap().expanded);
  assert!(t.find_segment("a.b.c").is_none());

  t.set_depth(0);
  assert!(!t.find_segment("a").unwrap().expanded);
  assert_eq!(t.child_count(), 0);

  t.set_expanded(true);
  t.set_depth(-1);
  assert_eq!(paths(&mut t), vec!["a", "a.b", "a.b.c"]);

  t.set_expanded(false);
  assert_eq!(paths(&mut t), vec!["a"]);
}

#[test]
fn primitive_root_exposes_single_segment() {
  let mut t = tree(json!(42));
  assert!(t.segments().is_empty());

  let seg = t.primitive_segment().unwrap();
  assert_eq!(seg.key, "");
  assert_eq!(seg.path, "");
  assert_eq!(seg.kind, Some(SegmentType::Number));
  assert_eq!(seg.description, "42");
  assert!(!seg.expanded);

  let mut s = tree(json!("hi"));
  assert_eq!(s.primitive_segment().unwrap().description, "\"hi\"");
  assert_eq!(s.rows().len(), 1);

  assert!(tree(json!({ "a": 1 })).primitive_segment().is_none());
}

#[test]
fn root_punctuation_and_text() {
  let t = tree(json!([1, 2]));
  assert_eq!((t.opening_brace(), t.closing_brace()), ("[", "]"));
  assert!(t.is_array_element());
  assert_eq!(t.as_string(), "[\n  1,\n  2\n]");

  let t = tree(json!({ "a": null }));
  assert_eq!((t.opening_brace(), t.closing_brace()), ("{", "}"));
  assert_eq!(t.root_type(), Some(SegmentType::Object));
  assert_eq!(t.as_string(), "{\n  \"a\": null\n}");

  let t = TreeNode::new(Value::Undefined, TreeOptions::default());
  assert_eq!(t.as_string(), "undefined");
}

#[test]
fn cyclic_input_renders_finitely() {
  let obj = Value::map([("a", Value::from(1))]);
  obj.insert("self", obj.clone()).unwrap();

  let mut t = TreeNode::new(obj.clone(), TreeOptions::default());
  let rows = t.rows();
  let paths: Vec<&str> = rows.iter().map(|r| r.segment.path.as_str()).collect();
  assert_eq!(paths, vec!["a", "self", "self.$ref"]);

  let marker = t.find_segment("self").unwrap();
  assert_eq!(marker.kind, Some(SegmentType::Object));
  assert_eq!(marker.description, "Object {\"$ref\":\"$\"}");
  assert_eq!(t.find_segment("self.$ref").unwrap().description, "\"$\"");

  let obj1 = Value::map([("a", Value::from(1))]);
  let obj2 = Value::map([("b", Value::from(2)), ("c", obj1.clone())]);
  obj1.insert("d", obj2).unwrap();
  let mut t = TreeNode::new(obj1, TreeOptions::default());
  assert_eq!(
    t.rows().into_iter().map(|r| r.segment.path).collect::<Vec<_>>(),
    vec!["a", "d", "d.b", "d.c", "d.c.$ref"]
  );
  assert_eq!(t.as_string(), "{\n  \"a\": 1,\n  \"d\": {\n    \"b\": 2,\n    \"c\": {\n      \"$ref\": \"$\"\n    }\n  }\n}");
}

#[test]
fn unknown_paths_are_reported() {
  let mut t = tree(json!({ "a": 1 }));
  assert!(matches!(t.toggle("nope"), Err(TreeError::UnknownPath(p)) if p == "nope"));
  assert!(matches!(t.click("nope", None), Err(TreeError::UnknownPath(_))));
}

#[test]
fn toggling_leaves_is_a_noop() {
  let mut t = tree(json!({ "a": 1 }));
  let before = t.find_segment("a").unwrap().expanded;
  assert_eq!(t.toggle("a").unwrap(), before);
  assert_eq!(t.toggle("a").unwrap(), before);
  assert!(t.expansion_store().is_empty());
}

#[test]
fn toggle_click_stops_propagation_when_configured() {
  let mut t = tree(json!({ "a": [1] }));
  let event = ClickEvent::new();
  assert!(!t.toggle_clicked("a", &event).unwrap());
  assert!(event.is_propagation_stopped());

  t.set_stop_click_propagation(false);
  let event = ClickEvent::new();
  assert!(t.toggle_clicked("a", &event).unwrap());
  assert!(!event.is_propagation_stopped());
}

#[test]
fn nodes_draw_ids_from_injected_generator() {
  let ids = Arc::new(SequentialIdGenerator::new());
  let mut t = TreeNode::new(
    Value::from(json!({ "a": { "b": 1 } })),
    TreeOptions {
      id_generator: ids,
      ..TreeOptions::default()
    },
  );
  assert_eq!(t.id(), "json-treeview-0");
  let child = t.child("a").unwrap();
  assert_eq!(child.id(), "json-treeview-1");
  assert_eq!(child.current_depth(), 1);
  assert_eq!(child.parent().map(|p| p.path.as_str()), Some("a"));

  // Re-deriving keeps the mounted node.
  t.set_json(Value::from(json!({ "a": { "b": 2 } })));
  assert_eq!(t.child("a").unwrap().id(), "json-treeview-1");
}

#[test]
fn nested_toggles_survive_ancestor_collapse() {
  let mut t = tree(json!({ "a": { "b": { "c": 1 } } }));
  assert!(!t.toggle("a.b").unwrap());

  assert!(!t.toggle("a").unwrap());
  assert!(t.find_segment("a.b").is_none());
  assert_eq!(t.child_count(), 0);

  assert!(t.toggle("a").unwrap());
  assert!(!t.find_segment("a.b").unwrap().expanded);
  assert!(t.find_segment("a.b.c").is_none());

  // A depth change still resets the parked node once it is remounted.
  assert!(!t.toggle("a").unwrap());
  t.set_depth(5);
  assert!(t.find_segment("a").unwrap().expanded);
  assert!(t.find_segment("a.b").unwrap().expanded);
  assert_eq!(t.find_segment("a.b.c").unwrap().description, "1");
}

#[test]
fn toggles_survive_click_configuration_changes() {
  let mut t = tree(json!({ "a": { "b": { "c": 1 } }, "d": [1] }));
  assert!(!t.toggle("a.b").unwrap());
  assert!(!t.toggle("d").unwrap());

  t.set_enable_clickable_values(true);
  let handler: Arc<dyn ValueClickHandler> = Arc::new(FnClickHandler::new(|_| Ok(true), |_, _| Ok(())));
  t.set_value_click_handlers(Some(vec![handler]));
  let predicate: IsClickableValueFn = Arc::new(|s: &Segment| s.key == "c");
  t.set_is_clickable_value(Some(predicate));
  t.set_stop_click_propagation(false);

  assert!(!t.find_segment("a.b").unwrap().expanded);
  assert!(!t.find_segment("d").unwrap().expanded);
  assert_eq!(t.expansion_store().get("d"), Some(false));
}

#[test]
fn shared_paths_resolve_deterministically() {
  // Both the key "b.c" under "a" and the key "c" under "a.b" address "a.b.c".
  let mut t = tree(json!({ "a": { "b.c": { "x": 1 } }, "a.b": { "c": { "y": 2 } } }));
  let rows = paths(&mut t);
  assert_eq!(rows, vec!["a", "a.b.c", "a.b.c.x", "a.b", "a.b.c", "a.b.c.y"]);

  for _ in 0..8 {
    let seg = t.find_segment("a.b.c").unwrap();
    assert_eq!(seg.key, "b.c");
    assert_eq!(seg.parent.as_ref().map(|p| p.key.as_str()), Some("a"));
  }

  // Remounted nodes keep their place in row order.
  assert!(!t.toggle("a").unwrap());
  assert!(t.toggle("a").unwrap());
  assert_eq!(paths(&mut t), rows);
  assert_eq!(t.find_segment("a.b.c").unwrap().key, "b.c");
}
