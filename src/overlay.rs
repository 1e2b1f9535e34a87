// Typed Overlay (TO): a per-record key -> typed-value side table layered
// over a `Record` so arithmetic sees types instead of re-parsing strings
// on every read.

use std::collections::HashMap;

use crate::value::Value;

#[derive(Default)]
pub struct Overlay {
    typed: HashMap<String, Value>,
}

impl Overlay {
    pub fn new() -> Overlay {
        Overlay { typed: HashMap::new() }
    }

    pub fn put(&mut self, key: impl Into<String>, value: Value) {
        self.typed.insert(key.into(), value);
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.typed.get(key)
    }

    pub fn remove(&mut self, key: &str) {
        self.typed.remove(key);
    }

    pub fn clear(&mut self) {
        self.typed.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_then_get_preserves_type() {
        let mut to = Overlay::new();
        to.put("c", Value::Int(3));
        match to.get("c") {
            Some(Value::Int(3)) => {}
            other => panic!("unexpected {:?}", other),
        }
    }
}
