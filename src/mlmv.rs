// Multi-Level Map (MLM): a tree whose internal nodes are insertion-ordered
// maps keyed by typed scalars, and whose leaves are terminal typed values.
// Used both for per-record structured assignment (`$* = {...}`) and for
// the process-wide accumulator store (`@var[...]`).
//
// A node is either `Terminal` or `Map`, never both; `put` creates missing
// intermediate `Map` nodes and silently destroys whatever it replaces.

use std::rc::Rc;

use indexmap::IndexMap;

use crate::record::Record;
use crate::value::Value;

/// A hashable, totally-ordered-enough key for MLM nodes. Doubles are not
/// directly hashable, so a `Double` path key is canonicalised to its
/// string form -- the same thing that happens to it on record emission
/// anyway. See DESIGN.md.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum MapKey {
    Int(i64),
    Bool(bool),
    Str(Rc<str>),
}

impl MapKey {
    pub fn from_value(v: &Value) -> MapKey {
        match v {
            Value::Int(i) => MapKey::Int(*i),
            Value::Bool(b) => MapKey::Bool(*b),
            Value::Double(d) => MapKey::Str(Rc::from(d.to_string())),
            Value::String(s) => MapKey::Str(s.clone()),
            Value::Null => MapKey::Str(Rc::from("")),
            Value::Error => MapKey::Str(Rc::from("(error)")),
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            MapKey::Int(i) => Value::Int(*i),
            MapKey::Bool(b) => Value::Bool(*b),
            MapKey::Str(s) => Value::String(s.clone()),
        }
    }

    pub fn field_name(&self) -> String {
        match self {
            MapKey::Int(i) => i.to_string(),
            MapKey::Bool(b) => b.to_string(),
            MapKey::Str(s) => s.to_string(),
        }
    }
}

#[derive(Clone, Debug)]
pub enum Mlmv {
    Terminal(Value),
    Map(IndexMap<MapKey, Mlmv>),
}

impl Mlmv {
    pub fn empty_map() -> Mlmv {
        Mlmv::Map(IndexMap::new())
    }

    pub fn terminal(v: Value) -> Mlmv {
        Mlmv::Terminal(v)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Mlmv::Terminal(_))
    }

    /// Scalar-context lookup: distinguishes `TooDeep` (indexed past a
    /// terminal) from `TooShallow` (stopped at a non-terminal) from plain
    /// `NotFound`, per the contract tests in §8 of the spec.
    pub fn get(&self, path: &[Value]) -> GetResult<'_> {
        let mut node = self;
        for key in path {
            match node {
                Mlmv::Terminal(_) => return GetResult::TooDeep,
                Mlmv::Map(m) => {
                    let k = MapKey::from_value(key);
                    match m.get(&k) {
                        Some(child) => node = child,
                        None => return GetResult::NotFound,
                    }
                }
            }
        }
        match node {
            Mlmv::Terminal(v) => GetResult::Found(v),
            Mlmv::Map(_) => GetResult::TooShallow,
        }
    }

    /// Extended-context lookup: returns the subtree at `path`, terminal or
    /// not, or `None` if the path runs past a terminal or off the map.
    pub fn get_node(&self, path: &[Value]) -> Option<&Mlmv> {
        let mut node = self;
        for key in path {
            match node {
                Mlmv::Terminal(_) => return None,
                Mlmv::Map(m) => {
                    let k = MapKey::from_value(key);
                    node = m.get(&k)?;
                }
            }
        }
        Some(node)
    }

    pub fn put(&mut self, path: &[Value], value: Mlmv) {
        if path.is_empty() {
            *self = value;
            return;
        }
        if !matches!(self, Mlmv::Map(_)) {
            *self = Mlmv::empty_map();
        }
        if let Mlmv::Map(m) = self {
            let key = MapKey::from_value(&path[0]);
            let child = m.entry(key).or_insert_with(Mlmv::empty_map);
            child.put(&path[1..], value);
        }
    }

    pub fn put_value(&mut self, path: &[Value], v: Value) {
        self.put(path, Mlmv::Terminal(v));
    }

    /// Recursively destroys children, leaving an empty map node.
    pub fn clear_level(&mut self) {
        *self = Mlmv::empty_map();
    }

    pub fn iter(&self) -> Box<dyn Iterator<Item = (&MapKey, &Mlmv)> + '_> {
        match self {
            Mlmv::Map(m) => Box::new(m.iter()),
            Mlmv::Terminal(_) => Box::new(std::iter::empty()),
        }
    }

    /// Flattens this subtree into a single record: non-empty key names are
    /// colon-joined into composite field names (e.g. `"pan:1:count"`). A
    /// bare terminal at the root has no path segments to join, so it falls
    /// back to `leaf_name` (the emitting variable's own name).
    fn flatten_into(&self, rec: &mut Record, prefix: &[String], leaf_name: &str, ofmt: &str) {
        match self {
            Mlmv::Terminal(v) => {
                let key = if prefix.is_empty() { leaf_name.to_string() } else { prefix.join(":") };
                rec.put(key, v.format(ofmt));
            }
            Mlmv::Map(m) => {
                for (k, child) in m {
                    let mut p = prefix.to_vec();
                    p.push(k.field_name());
                    child.flatten_into(rec, &p, leaf_name, ofmt);
                }
            }
        }
    }

    /// One level of the subtree becomes a separate named field per entry
    /// in `key_names`; whatever remains below the last named level is
    /// flattened the same way `to_records` with no key names would.
    fn emit_keyed(
        &self,
        key_names: &[&str],
        leaf_name: &str,
        path_keys: &mut Vec<(String, String)>,
        out: &mut Vec<Record>,
        ofmt: &str,
    ) {
        match key_names.split_first() {
            None => {
                let mut rec = Record::new();
                for (k, v) in path_keys.iter() {
                    rec.put(k.clone(), v.clone());
                }
                self.flatten_into(&mut rec, &[], leaf_name, ofmt);
                out.push(rec);
            }
            Some((name, rest)) => match self {
                Mlmv::Terminal(_) => {
                    // Subtree is shallower than the requested key names:
                    // nothing to peel off, so there is no record to emit.
                }
                Mlmv::Map(m) => {
                    for (k, child) in m {
                        path_keys.push(((*name).to_string(), k.field_name()));
                        child.emit_keyed(rest, leaf_name, path_keys, out, ofmt);
                        path_keys.pop();
                    }
                }
            },
        }
    }

    /// Flattens the subtree into an ordered sequence of records. `leaf_name`
    /// is the field name used for a terminal value that has no key segment
    /// of its own to be named by -- typically the oosvar's own name, as in
    /// `emit @sum, "a"` where a terminal `@sum[pan]` becomes field `sum`.
    pub fn to_records(&self, key_names: &[&str], leaf_name: &str, ofmt: &str) -> Vec<Record> {
        let mut out = Vec::new();
        if key_names.is_empty() {
            let mut rec = Record::new();
            self.flatten_into(&mut rec, &[], leaf_name, ofmt);
            out.push(rec);
        } else {
            self.emit_keyed(key_names, leaf_name, &mut Vec::new(), &mut out, ofmt);
        }
        out
    }
}

#[derive(Debug, PartialEq)]
pub enum GetResult<'a> {
    Found(&'a Value),
    NotFound,
    TooDeep,
    TooShallow,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn int_path(ints: &[i64]) -> Vec<Value> {
        ints.iter().map(|i| Value::Int(*i)).collect()
    }

    #[test]
    fn put_then_get_roundtrip() {
        let mut m = Mlmv::empty_map();
        m.put_value(&int_path(&[1, 2, 3]), Value::Int(4));
        match m.get(&int_path(&[1, 2, 3])) {
            GetResult::Found(Value::Int(4)) => {}
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn overwrite_idempotence() {
        let mut m = Mlmv::empty_map();
        m.put_value(&int_path(&[1]), Value::Int(1));
        m.put_value(&int_path(&[1]), Value::Int(2));
        match m.get(&int_path(&[1])) {
            GetResult::Found(Value::Int(2)) => {}
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn depth_errors_distinguish() {
        let mut m = Mlmv::empty_map();
        m.put_value(&int_path(&[1, 2, 3]), Value::Int(4));
        assert!(matches!(m.get(&int_path(&[1, 2, 3, 4])), GetResult::TooDeep));
        assert!(matches!(m.get(&int_path(&[1, 2])), GetResult::TooShallow));
        assert!(matches!(m.get(&int_path(&[0, 2, 3])), GetResult::NotFound));
    }

    #[test]
    fn insertion_order_preserved_across_resize() {
        let mut m = Mlmv::empty_map();
        for i in 0..200 {
            m.put_value(&[Value::Int(i)], Value::Int(i));
        }
        let keys: Vec<i64> = m
            .iter()
            .map(|(k, _)| match k {
                MapKey::Int(i) => *i,
                _ => unreachable!(),
            })
            .collect();
        let expected: Vec<i64> = (0..200).collect();
        assert_eq!(keys, expected);
    }

    #[test]
    fn deep_clone_independence() {
        let mut a = Mlmv::empty_map();
        a.put_value(&int_path(&[1]), Value::Int(1));
        let b = a.clone();
        a.put_value(&int_path(&[1]), Value::Int(99));
        match b.get(&int_path(&[1])) {
            GetResult::Found(Value::Int(1)) => {}
            other => panic!("clone was not independent: {:?}", other),
        }
    }

    #[test]
    fn to_records_with_key_names() {
        let mut m = Mlmv::empty_map();
        m.put_value(&[Value::from_str("pan")], Value::Int(3));
        m.put_value(&[Value::from_str("eks")], Value::Int(3));
        let recs = m.to_records(&["a"], "s", "%lf");
        assert_eq!(recs.len(), 2);
        assert_eq!(recs[0].get("a"), Some("pan"));
    }
}
