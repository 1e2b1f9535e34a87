// Interpreter: owns the compiled program and the process-wide accumulator
// store, and drives the per-record transaction the executor described in
// §4.7 expects -- enter record, reset overlay, run statements, emit
// record, discard overlay -- plus the end-of-stream pass over
// accumulators only.

use crate::ast::Program;
use crate::eval::EvalContext;
use crate::exec::{self, ExecOutcome};
use crate::frame::Frames;
use crate::mlmv::Mlmv;
use crate::overlay::Overlay;
use crate::record::Record;

pub struct Interpreter {
    program: Program,
    accum: Mlmv,
    ofmt: String,
}

pub struct RecordResult {
    pub kept: Option<Record>,
    pub emitted: Vec<Record>,
}

impl Interpreter {
    pub fn new(program: Program, ofmt: String) -> Interpreter {
        Interpreter { program, accum: Mlmv::empty_map(), ofmt }
    }

    pub fn process(&mut self, mut record: Record) -> RecordResult {
        let mut overlay = Overlay::new();
        let mut frames = Frames::new();
        if self.program.frame_size > 0 {
            frames.push_frame(self.program.frame_size);
        }
        let mut out = ExecOutcome::new();
        {
            let mut ctx = EvalContext {
                record: &mut record,
                overlay: &mut overlay,
                frames: &mut frames,
                accum: &mut self.accum,
                ofmt: &self.ofmt,
            };
            exec::run_statements(&self.program.main, &mut ctx, &mut out);
        }
        if out.keep {
            finalize(&mut record, &overlay, &self.ofmt);
        }
        RecordResult { kept: if out.keep { Some(record) } else { None }, emitted: out.emitted }
    }

    /// Runs the `end { ... }` block once, after the input stream is
    /// exhausted. There is no current record, so field/local references
    /// inside an end block only make sense against an empty placeholder.
    pub fn finish(&mut self) -> Vec<Record> {
        let mut record = Record::new();
        let mut overlay = Overlay::new();
        let mut frames = Frames::new();
        if self.program.frame_size > 0 {
            frames.push_frame(self.program.frame_size);
        }
        let mut out = ExecOutcome::new();
        let mut ctx = EvalContext {
            record: &mut record,
            overlay: &mut overlay,
            frames: &mut frames,
            accum: &mut self.accum,
            ofmt: &self.ofmt,
        };
        exec::run_statements(&self.program.end, &mut ctx, &mut out);
        out.emitted
    }
}

/// Replace every record field the overlay claims with its typed value's
/// formatted string -- the "materialise lazily at write-out" step.
fn finalize(record: &mut Record, overlay: &Overlay, ofmt: &str) {
    let keys: Vec<String> = record.keys().map(str::to_string).collect();
    for key in keys {
        if let Some(v) = overlay.get(&key) {
            record.put(key, v.format(ofmt));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser;

    #[test]
    fn put_adds_a_computed_field() {
        let program = parser::parse_program("$c = $a + $b;").unwrap();
        let mut interp = Interpreter::new(program, "%lf".to_string());
        let mut rec = Record::new();
        rec.put("a", "1");
        rec.put("b", "2");
        let result = interp.process(rec);
        let kept = result.kept.unwrap();
        assert_eq!(kept.get("c"), Some("3"));
    }

    #[test]
    fn filter_drops_nonmatching_records() {
        let program = parser::parse_program("filter $a > 1;").unwrap();
        let mut interp = Interpreter::new(program, "%lf".to_string());
        let mut rec = Record::new();
        rec.put("a", "1");
        assert!(interp.process(rec).kept.is_none());

        let mut rec2 = Record::new();
        rec2.put("a", "2");
        assert!(interp.process(rec2).kept.is_some());
    }

    #[test]
    fn accumulator_persists_and_emits_at_end() {
        let program = parser::parse_program(r#"@s[$a] += $x; end { emit @s, "a"; }"#).unwrap();
        let mut interp = Interpreter::new(program, "%lf".to_string());
        for (a, x) in [("pan", "3"), ("eks", "4"), ("pan", "5")] {
            let mut rec = Record::new();
            rec.put("a", a);
            rec.put("x", x);
            interp.process(rec);
        }
        let emitted = interp.finish();
        assert_eq!(emitted.len(), 2);
        let pan = emitted.iter().find(|r| r.get("a") == Some("pan")).unwrap();
        assert_eq!(pan.get("s"), Some("8"));
    }
}
