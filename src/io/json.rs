// JSON-Lines reader/writer. Nested objects are flattened to colon-joined
// field names on ingest (`{"a":{"b":1}}` -> field `a:b` = `"1"`) so the
// rest of the pipeline only ever deals with flat records; the writer
// reverses the split on emission, mirroring how `Mlmv::to_records` builds
// composite field names for `emit`.

use std::io::{BufRead, Write};

use serde_json::{Map, Value as Json};

use crate::error::IoError;
use crate::record::Record;

use super::{RecordReader, RecordWriter};

fn flatten(prefix: &str, value: &Json, out: &mut Record) {
    match value {
        Json::Object(map) => {
            for (k, v) in map {
                let key = if prefix.is_empty() { k.clone() } else { format!("{}:{}", prefix, k) };
                flatten(&key, v, out);
            }
        }
        Json::Null => out.put(prefix.to_string(), String::new()),
        Json::String(s) => out.put(prefix.to_string(), s.clone()),
        other => out.put(prefix.to_string(), other.to_string()),
    }
}

fn unflatten(rec: &Record) -> Json {
    let mut root = Map::new();
    for (k, v) in rec.iter() {
        let parts: Vec<&str> = k.split(':').collect();
        insert_path(&mut root, &parts, v);
    }
    Json::Object(root)
}

fn insert_path(node: &mut Map<String, Json>, path: &[&str], value: &str) {
    match path {
        [] => {}
        [last] => {
            node.insert((*last).to_string(), Json::String(value.to_string()));
        }
        [head, rest @ ..] => {
            let child = node.entry((*head).to_string()).or_insert_with(|| Json::Object(Map::new()));
            if let Json::Object(m) = child {
                insert_path(m, rest, value);
            }
        }
    }
}

#[derive(Default)]
pub struct JsonReader;

impl RecordReader for JsonReader {
    fn read_all(&mut self, input: &mut dyn BufRead) -> Result<Vec<Record>, IoError> {
        let mut out = Vec::new();
        for line in input.lines() {
            let line = line.map_err(|e| IoError::Read { path: "<stdin>".to_string(), source: e })?;
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            let value: Json = serde_json::from_str(trimmed)?;
            let mut rec = Record::new();
            flatten("", &value, &mut rec);
            out.push(rec);
        }
        Ok(out)
    }
}

#[derive(Default)]
pub struct JsonWriter;

impl RecordWriter for JsonWriter {
    fn write_all(&mut self, output: &mut dyn Write, records: &[Record], _ofmt: &str) -> Result<(), IoError> {
        for rec in records {
            let value = unflatten(rec);
            writeln!(output, "{}", serde_json::to_string(&value)?)
                .map_err(|e| IoError::Write { path: "<stdout>".to_string(), source: e })?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_object_flattens_on_read() {
        let input = r#"{"a":{"b":1},"c":2}"#.to_string() + "\n";
        let mut reader = JsonReader;
        let recs = reader.read_all(&mut input.as_bytes()).unwrap();
        assert_eq!(recs[0].get("a:b"), Some("1"));
        assert_eq!(recs[0].get("c"), Some("2"));
    }

    #[test]
    fn flat_record_reinflates_on_write() {
        let mut rec = Record::new();
        rec.put("a:b", "1");
        rec.put("c", "2");
        let mut out = Vec::new();
        let mut writer = JsonWriter;
        writer.write_all(&mut out, &[rec], "%lf").unwrap();
        let text = String::from_utf8(out).unwrap();
        let value: Json = serde_json::from_str(text.trim()).unwrap();
        assert_eq!(value["a"]["b"], Json::String("1".to_string()));
    }
}
