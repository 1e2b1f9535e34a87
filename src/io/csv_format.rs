// CSV/TSV reader and writer over `Record`, via the `csv` crate. The first
// row is always a header; later rows with fewer/more fields than the
// header are an I/O error rather than a silently ragged record, matching
// the `csv` crate's own default strictness.

use std::io::{BufRead, Write};

use crate::error::IoError;
use crate::record::Record;

use super::{RecordReader, RecordWriter};

pub struct CsvReader {
    pub delimiter: u8,
}

impl CsvReader {
    pub fn new() -> CsvReader {
        CsvReader { delimiter: b',' }
    }

    pub fn tsv() -> CsvReader {
        CsvReader { delimiter: b'\t' }
    }
}

impl Default for CsvReader {
    fn default() -> Self {
        CsvReader::new()
    }
}

impl RecordReader for CsvReader {
    fn read_all(&mut self, input: &mut dyn BufRead) -> Result<Vec<Record>, IoError> {
        let mut rdr = csv::ReaderBuilder::new().delimiter(self.delimiter).from_reader(input);
        let headers = rdr.headers()?.clone();
        let mut out = Vec::new();
        for result in rdr.records() {
            let row = result?;
            let rec: Record =
                headers.iter().zip(row.iter()).map(|(k, v)| (k.to_string(), v.to_string())).collect();
            out.push(rec);
        }
        Ok(out)
    }
}

pub struct CsvWriter {
    pub delimiter: u8,
}

impl CsvWriter {
    pub fn new() -> CsvWriter {
        CsvWriter { delimiter: b',' }
    }

    pub fn tsv() -> CsvWriter {
        CsvWriter { delimiter: b'\t' }
    }
}

impl Default for CsvWriter {
    fn default() -> Self {
        CsvWriter::new()
    }
}

impl RecordWriter for CsvWriter {
    fn write_all(&mut self, output: &mut dyn Write, records: &[Record], _ofmt: &str) -> Result<(), IoError> {
        let mut wtr = csv::WriterBuilder::new().delimiter(self.delimiter).from_writer(output);
        if let Some(first) = records.first() {
            let headers: Vec<&str> = first.keys().collect();
            wtr.write_record(&headers)?;
            for rec in records {
                let row: Vec<&str> = headers.iter().map(|k| rec.get(k).unwrap_or("")).collect();
                wtr.write_record(&row)?;
            }
        }
        wtr.flush().map_err(|e| IoError::Write { path: "<stdout>".to_string(), source: e.into() })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip() {
        let input = "a,b\n1,2\n3,4\n";
        let mut reader = CsvReader::new();
        let recs = reader.read_all(&mut input.as_bytes()).unwrap();
        assert_eq!(recs.len(), 2);
        assert_eq!(recs[1].get("b"), Some("4"));

        let mut out = Vec::new();
        let mut writer = CsvWriter::new();
        writer.write_all(&mut out, &recs, "%lf").unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), input);
    }
}
