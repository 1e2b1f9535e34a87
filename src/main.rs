// fluent-records: a streaming record processor with an embedded put/filter DSL.
//
// Copyright (C) 2019  Brandon Lewis
//
// This program is free software: you can redistribute it and/or
// modify it under the terms of the GNU Lesser General Public License
// as published by the Free Software Foundation, either version 3 of
// the License, or (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the GNU
// Lesser General Public License for more details.
//
// You should have received a copy of the GNU Lesser General Public
// License along with this program.  If not, see
// <https://www.gnu.org/licenses/>.

use std::fs;
use std::io::{self, BufReader, Read as _, Write};

use clap::Parser;

use fluent_records::cli::{Cli, Commands, Format, VerbArgs};
use fluent_records::error::{CliError, IoError};
use fluent_records::interp::Interpreter;
use fluent_records::io::csv_format::{CsvReader, CsvWriter};
use fluent_records::io::dkvp::{DkvpReader, DkvpWriter};
use fluent_records::io::json::{JsonReader, JsonWriter};
use fluent_records::io::{RecordReader, RecordWriter};
use fluent_records::logging;
use fluent_records::parser;
use fluent_records::record::Record;

fn reader_for(format: Format) -> Box<dyn RecordReader> {
    match format {
        Format::Dkvp => Box::new(DkvpReader::new()),
        Format::Csv => Box::new(CsvReader::new()),
        Format::Json => Box::new(JsonReader),
    }
}

fn writer_for(format: Format) -> Box<dyn RecordWriter> {
    match format {
        Format::Dkvp => Box::new(DkvpWriter::new()),
        Format::Csv => Box::new(CsvWriter::new()),
        Format::Json => Box::new(JsonWriter),
    }
}

fn load_source(verb: &str, args: &VerbArgs) -> Result<String, CliError> {
    if let Some(expr) = &args.expression {
        return Ok(expr.clone());
    }
    if let Some(path) = &args.script {
        return fs::read_to_string(path).map_err(|e| {
            CliError::Io(IoError::Read { path: path.display().to_string(), source: e })
        });
    }
    Err(CliError::MissingExpression(verb.to_string()))
}

fn read_input(paths: &[std::path::PathBuf]) -> io::Result<Box<dyn io::BufRead>> {
    if paths.is_empty() || paths[0] == std::path::PathBuf::from("-") {
        Ok(Box::new(BufReader::new(io::stdin())))
    } else {
        let mut buf = String::new();
        for path in paths {
            fs::File::open(path)?.read_to_string(&mut buf)?;
        }
        Ok(Box::new(io::Cursor::new(buf.into_bytes())))
    }
}

fn run() -> anyhow::Result<()> {
    logging::init();
    let cli = Cli::parse();

    let (verb, args) = match &cli.command {
        Commands::Put(a) => ("put", a),
        Commands::Filter(a) => ("filter", a),
    };
    let source = load_source(verb, args)?;

    let program = if verb == "filter" {
        let expr = parser::parse_expr(&source)?;
        fluent_records::ast::Program {
            main: vec![fluent_records::ast::Statement::Filter(std::rc::Rc::new(expr))],
            end: Vec::new(),
            frame_size: 0,
        }
    } else {
        parser::parse_program(&source)?
    };

    let mut interp = Interpreter::new(program, cli.ofmt.clone());

    let mut input = read_input(&args.paths)?;
    let mut reader = reader_for(cli.input_format);
    let records = reader.read_all(&mut input).map_err(CliError::Io)?;

    let mut out_records: Vec<Record> = Vec::new();
    for record in records {
        let result = interp.process(record);
        if let Some(kept) = result.kept {
            out_records.push(kept);
        }
        out_records.extend(result.emitted);
    }
    out_records.extend(interp.finish());

    let stdout = io::stdout();
    let mut handle = stdout.lock();
    let mut writer = writer_for(cli.output_format);
    writer.write_all(&mut handle, &out_records, &cli.ofmt).map_err(CliError::Io)?;
    handle.flush()?;

    Ok(())
}

fn main() {
    if let Err(err) = run() {
        eprintln!("fluent-records: {err:#}");
        std::process::exit(1);
    }
}
