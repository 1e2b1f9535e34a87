// Record stream I/O: readers turn a byte stream into a sequence of
// `Record`s; writers do the reverse. Three formats, chosen to cover the
// pack's dominant record shapes: DKVP (Miller's own native key=value,...
// line format), CSV/TSV, and JSON-Lines.

pub mod csv_format;
pub mod dkvp;
pub mod json;

use std::io::{BufRead, Write};

use crate::error::IoError;
use crate::record::Record;

pub trait RecordReader {
    fn read_all(&mut self, input: &mut dyn BufRead) -> Result<Vec<Record>, IoError>;
}

pub trait RecordWriter {
    fn write_all(&mut self, output: &mut dyn Write, records: &[Record], ofmt: &str) -> Result<(), IoError>;
}
