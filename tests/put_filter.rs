// End-to-end exercises of the public API: parse a program, run it through
// an `Interpreter` over records produced by the real I/O readers, and
// check the written-back bytes rather than just the in-memory `Record`s.

use fluent_records::interp::Interpreter;
use fluent_records::io::csv_format::{CsvReader, CsvWriter};
use fluent_records::io::dkvp::{DkvpReader, DkvpWriter};
use fluent_records::io::{RecordReader, RecordWriter};
use fluent_records::parser;

#[test]
fn put_computes_a_field_over_dkvp_input() {
    let input = "a=1,b=2\na=10,b=20\n";
    let mut reader = DkvpReader::new();
    let records = reader.read_all(&mut input.as_bytes()).unwrap();

    let program = parser::parse_program("$c = $a + $b;").unwrap();
    let mut interp = Interpreter::new(program, "%lf".to_string());

    let mut out = Vec::new();
    for rec in records {
        if let Some(kept) = interp.process(rec).kept {
            out.push(kept);
        }
    }

    let mut writer = DkvpWriter::new();
    let mut bytes = Vec::new();
    writer.write_all(&mut bytes, &out, "%lf").unwrap();
    assert_eq!(String::from_utf8(bytes).unwrap(), "a=1,b=2,c=3\na=10,b=20,c=30\n");
}

#[test]
fn filter_keeps_only_matching_records_over_csv_input() {
    let input = "name,score\nalice,10\nbob,90\ncarol,55\n";
    let mut reader = CsvReader::new();
    let records = reader.read_all(&mut input.as_bytes()).unwrap();

    let expr = parser::parse_expr("$score > 50").unwrap();
    let program = fluent_records::ast::Program {
        main: vec![fluent_records::ast::Statement::Filter(std::rc::Rc::new(expr))],
        end: Vec::new(),
        frame_size: 0,
    };
    let mut interp = Interpreter::new(program, "%lf".to_string());

    let mut out = Vec::new();
    for rec in records {
        if let Some(kept) = interp.process(rec).kept {
            out.push(kept);
        }
    }

    let mut writer = CsvWriter::new();
    let mut bytes = Vec::new();
    writer.write_all(&mut bytes, &out, "%lf").unwrap();
    assert_eq!(String::from_utf8(bytes).unwrap(), "name,score\nbob,90\ncarol,55\n");
}

#[test]
fn string_concat_and_conditional_over_dkvp() {
    let input = "first=Ada,last=Lovelace\n";
    let mut reader = DkvpReader::new();
    let records = reader.read_all(&mut input.as_bytes()).unwrap();

    let program = parser::parse_program(
        r#"$full = $first . " " . $last; $long = strlen($full) > 5 ? "yes" : "no";"#,
    )
    .unwrap();
    let mut interp = Interpreter::new(program, "%lf".to_string());

    let result = interp.process(records.into_iter().next().unwrap());
    let kept = result.kept.unwrap();
    assert_eq!(kept.get("full"), Some("Ada Lovelace"));
    assert_eq!(kept.get("long"), Some("yes"));
}

#[test]
fn program_loads_from_a_script_file() {
    use std::io::Write as _;

    let mut script = tempfile::NamedTempFile::new().unwrap();
    write!(script, "$c = $a * 2;").unwrap();
    let source = std::fs::read_to_string(script.path()).unwrap();

    let program = parser::parse_program(&source).unwrap();
    let mut interp = Interpreter::new(program, "%lf".to_string());
    let mut rec = fluent_records::record::Record::new();
    rec.put("a", "21");
    let kept = interp.process(rec).kept.unwrap();
    assert_eq!(kept.get("c"), Some("42"));
}

#[test]
fn accumulator_survives_across_records_and_emits_at_end() {
    let input = "site=pan,bytes=100\nsite=eks,bytes=200\nsite=pan,bytes=50\n";
    let mut reader = DkvpReader::new();
    let records = reader.read_all(&mut input.as_bytes()).unwrap();

    let program =
        parser::parse_program(r#"@total[$site] += $bytes; end { emit @total, "site"; }"#).unwrap();
    let mut interp = Interpreter::new(program, "%lf".to_string());

    for rec in records {
        interp.process(rec);
    }
    let emitted = interp.finish();
    assert_eq!(emitted.len(), 2);
    let pan = emitted.iter().find(|r| r.get("site") == Some("pan")).unwrap();
    assert_eq!(pan.get("total"), Some("150"));
}
