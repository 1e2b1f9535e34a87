// Ordered Record (OR): one input/output record as an insertion-ordered
// sequence of (key, value) string pairs.
//
// Backed by `indexmap::IndexMap`, whose open-addressing table preserves
// insertion order across growth by construction -- the same property the
// teacher's `Map<T>` / `Env<T>` types only get by accident of `HashMap`
// iteration order being unspecified. We rely on the crate's actual
// contract instead.

use indexmap::IndexMap;

#[derive(Clone, Debug, Default)]
pub struct Record {
    fields: IndexMap<String, String>,
}

impl Record {
    pub fn new() -> Record {
        Record { fields: IndexMap::new() }
    }

    /// Insert or, for a duplicate key, replace in place (preserving
    /// position) -- mirrors the teacher's `Env::insert` but without the
    /// free-flag bookkeeping the original C needed; owned `String`s make
    /// that machinery moot in Rust.
    pub fn put(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.fields.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.fields.shift_remove(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    pub fn clear(&mut self) {
        self.fields.clear();
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }
}

impl FromIterator<(String, String)> for Record {
    fn from_iter<T: IntoIterator<Item = (String, String)>>(iter: T) -> Self {
        Record { fields: iter.into_iter().collect() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insertion_order_preserved() {
        let mut r = Record::new();
        r.put("c", "3");
        r.put("a", "1");
        r.put("b", "2");
        let keys: Vec<_> = r.keys().collect();
        assert_eq!(keys, ["c", "a", "b"]);
    }

    #[test]
    fn duplicate_put_replaces_in_place() {
        let mut r = Record::new();
        r.put("a", "1");
        r.put("b", "2");
        r.put("a", "9");
        let keys: Vec<_> = r.keys().collect();
        assert_eq!(keys, ["a", "b"]);
        assert_eq!(r.get("a"), Some("9"));
    }
}
