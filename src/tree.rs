//! Depth-first traversal over the export tree
//!
//! The tree is a plain [`serde_json::Value`]. Objects are visited before their
//! property values (in document order), arrays descend by index, scalars are
//! leaves. A script slot is any object whose `byteCode` field is a non-empty
//! string.

use std::fmt;

use serde_json::{Map, Value};

/// Field holding a script payload (or a file name in templates)
pub const BYTE_CODE_FIELD: &str = "byteCode";
/// Optional human-readable script name
pub const NAME_FIELD: &str = "name";

/// A JSON object node
pub type Object = Map<String, Value>;

/// One step from a container to a child
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    /// Object property
    Key(String),
    /// Array element
    Index(usize),
}

/// Location of a node in the tree, counted from the root
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct SlotPath {
    segments: Vec<Segment>,
}

impl SlotPath {
    /// The root path
    pub fn root() -> Self {
        Self::default()
    }

    /// Segments from the root
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Path of a child of this node
    pub fn child(&self, segment: Segment) -> Self {
        let mut path = self.clone();
        path.segments.push(segment);
        path
    }

    fn push(&mut self, segment: Segment) {
        self.segments.push(segment);
    }

    fn pop(&mut self) {
        self.segments.pop();
    }

    /// Render as an RFC 6901 JSON pointer
    pub fn pointer(&self) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            out.push('/');
            match segment {
                Segment::Key(key) => out.push_str(&key.replace('~', "~0").replace('/', "~1")),
                Segment::Index(i) => out.push_str(&i.to_string()),
            }
        }
        out
    }
}

impl fmt::Display for SlotPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            f.write_str("/")
        } else {
            f.write_str(&self.pointer())
        }
    }
}

/// Non-empty `byteCode` string of a node, if it is a script slot
pub fn script_payload(node: &Object) -> Option<&str> {
    match node.get(BYTE_CODE_FIELD) {
        Some(Value::String(s)) if !s.is_empty() => Some(s),
        _ => None,
    }
}

/// Non-empty `name` string of a node
pub fn declared_name(node: &Object) -> Option<&str> {
    match node.get(NAME_FIELD) {
        Some(Value::String(s)) if !s.is_empty() => Some(s),
        _ => None,
    }
}

/// Visit every object node in pre-order
pub fn walk<'a, F>(value: &'a Value, visit: &mut F)
where
    F: FnMut(&'a Object),
{
    match value {
        Value::Object(map) => {
            visit(map);
            for child in map.values() {
                walk(child, visit);
            }
        }
        Value::Array(items) => {
            for child in items {
                walk(child, visit);
            }
        }
        _ => {}
    }
}

/// Visit every object node in pre-order, along with its path
pub fn walk_with_path<'a, F>(value: &'a Value, visit: &mut F)
where
    F: FnMut(&SlotPath, &'a Object),
{
    let mut path = SlotPath::root();
    walk_path_inner(value, &mut path, visit);
}

fn walk_path_inner<'a, F>(value: &'a Value, path: &mut SlotPath, visit: &mut F)
where
    F: FnMut(&SlotPath, &'a Object),
{
    match value {
        Value::Object(map) => {
            visit(path, map);
            for (key, child) in map {
                path.push(Segment::Key(key.clone()));
                walk_path_inner(child, path, visit);
                path.pop();
            }
        }
        Value::Array(items) => {
            for (i, child) in items.iter().enumerate() {
                path.push(Segment::Index(i));
                walk_path_inner(child, path, visit);
                path.pop();
            }
        }
        _ => {}
    }
}

/// Mutable pre-order walk
///
/// `visit` runs before the node's children are walked, so anything it writes
/// into the node is itself traversed afterwards.
pub fn walk_mut<F>(value: &mut Value, visit: &mut F)
where
    F: FnMut(&mut Object),
{
    match value {
        Value::Object(map) => {
            visit(map);
            for child in map.values_mut() {
                walk_mut(child, visit);
            }
        }
        Value::Array(items) => {
            for child in items.iter_mut() {
                walk_mut(child, visit);
            }
        }
        _ => {}
    }
}

/// Mutable pre-order walk with paths
pub fn walk_mut_with_path<F>(value: &mut Value, visit: &mut F)
where
    F: FnMut(&SlotPath, &mut Object),
{
    let mut path = SlotPath::root();
    walk_mut_path_inner(value, &mut path, visit);
}

fn walk_mut_path_inner<F>(value: &mut Value, path: &mut SlotPath, visit: &mut F)
where
    F: FnMut(&SlotPath, &mut Object),
{
    match value {
        Value::Object(map) => {
            visit(path, map);
            for (key, child) in map.iter_mut() {
                path.push(Segment::Key(key.clone()));
                walk_mut_path_inner(child, path, visit);
                path.pop();
            }
        }
        Value::Array(items) => {
            for (i, child) in items.iter_mut().enumerate() {
                path.push(Segment::Index(i));
                walk_mut_path_inner(child, path, visit);
                path.pop();
            }
        }
        _ => {}
    }
}

/// All script slots in traversal order
pub fn script_slots(value: &Value) -> Vec<(SlotPath, &Object)> {
    let mut slots = Vec::new();
    walk_with_path(value, &mut |path, node| {
        if script_payload(node).is_some() {
            slots.push((path.clone(), node));
        }
    });
    slots
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_walk_pre_order() {
        let tree = json!({
            "id": "root",
            "children": [
                {"id": "a", "inner": {"id": "a1"}},
                {"id": "b"}
            ]
        });

        let mut seen = Vec::new();
        walk(&tree, &mut |node| {
            seen.push(node["id"].as_str().unwrap_or_default().to_string());
        });

        assert_eq!(seen, vec!["root", "a", "a1", "b"]);
    }

    #[test]
    fn test_walk_tolerates_scalars() {
        let mut count = 0;
        for value in [json!(null), json!(1), json!("x"), json!(true), json!([null, 2])] {
            walk(&value, &mut |_| count += 1);
        }
        assert_eq!(count, 0);
    }

    #[test]
    fn test_paths_and_pointer_escaping() {
        let tree = json!({"a/b": [{"byteCode": "eA=="}], "c~": {"byteCode": "eQ=="}});
        let paths: Vec<String> = script_slots(&tree)
            .into_iter()
            .map(|(path, _)| path.pointer())
            .collect();
        assert_eq!(paths, vec!["/a~1b/0", "/c~0"]);
        for pointer in &paths {
            assert!(tree.pointer(pointer).is_some());
        }
    }

    #[test]
    fn test_script_payload_requires_non_empty_string() {
        let tree = json!([
            {"byteCode": ""},
            {"byteCode": 5},
            {"byteCode": null},
            {"byteCode": "aGk="}
        ]);
        assert_eq!(script_slots(&tree).len(), 1);
    }

    #[test]
    fn test_walk_mut_with_path_rewrites() {
        let mut tree = json!({"list": [{"byteCode": "old"}, {"other": 1}]});
        walk_mut_with_path(&mut tree, &mut |path, node| {
            if script_payload(node).is_some() {
                node.insert(BYTE_CODE_FIELD.into(), Value::String(path.pointer()));
            }
        });
        assert_eq!(tree["list"][0]["byteCode"], "/list/0");
        assert_eq!(tree["list"][1], json!({"other": 1}));
    }

    #[test]
    fn test_root_path_display() {
        assert_eq!(SlotPath::root().to_string(), "/");
        let path = SlotPath::root()
            .child(Segment::Key("actions".into()))
            .child(Segment::Index(3));
        assert_eq!(path.to_string(), "/actions/3");
    }
}
