// DKVP: one record per line, fields as `key=value` pairs separated by a
// comma -- Miller's native wire format and the simplest one to round-trip,
// so it is this crate's default.

use std::io::{BufRead, Write};

use crate::error::IoError;
use crate::record::Record;

use super::{RecordReader, RecordWriter};

#[derive(Default)]
pub struct DkvpReader {
    pub field_sep: char,
    pub pair_sep: char,
}

impl DkvpReader {
    pub fn new() -> DkvpReader {
        DkvpReader { field_sep: ',', pair_sep: '=' }
    }
}

impl RecordReader for DkvpReader {
    fn read_all(&mut self, input: &mut dyn BufRead) -> Result<Vec<Record>, IoError> {
        let mut out = Vec::new();
        for line in input.lines() {
            let line = line.map_err(|e| IoError::Read { path: "<stdin>".to_string(), source: e })?;
            if line.trim().is_empty() {
                continue;
            }
            let mut rec = Record::new();
            for pair in line.split(self.field_sep) {
                match pair.split_once(self.pair_sep) {
                    Some((k, v)) => rec.put(k.to_string(), v.to_string()),
                    None => rec.put(pair.to_string(), String::new()),
                }
            }
            out.push(rec);
        }
        Ok(out)
    }
}

#[derive(Default)]
pub struct DkvpWriter {
    pub field_sep: char,
    pub pair_sep: char,
}

impl DkvpWriter {
    pub fn new() -> DkvpWriter {
        DkvpWriter { field_sep: ',', pair_sep: '=' }
    }
}

impl RecordWriter for DkvpWriter {
    fn write_all(&mut self, output: &mut dyn Write, records: &[Record], _ofmt: &str) -> Result<(), IoError> {
        for rec in records {
            let line: Vec<String> =
                rec.iter().map(|(k, v)| format!("{}{}{}", k, self.pair_sep, v)).collect();
            writeln!(output, "{}", line.join(&self.field_sep.to_string()))
                .map_err(|e| IoError::Write { path: "<stdout>".to_string(), source: e })?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip() {
        let input = "a=1,b=2\nc=3,d=4\n";
        let mut reader = DkvpReader::new();
        let recs = reader.read_all(&mut input.as_bytes()).unwrap();
        assert_eq!(recs.len(), 2);
        assert_eq!(recs[0].get("a"), Some("1"));

        let mut out = Vec::new();
        let mut writer = DkvpWriter::new();
        writer.write_all(&mut out, &recs, "%lf").unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), input);
    }
}
