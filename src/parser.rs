// Parser entry points over the `lalrpop`-generated `grammar` module. The
// grammar threads a `SlotAllocator` through every rule (lalrpop's
// `grammar(slots: &mut SlotAllocator);` parameter) so that the first
// occurrence of a bare local-variable name assigns it a frame slot, and
// every later occurrence of the same name resolves to that same slot.

use std::collections::HashMap;

use crate::ast::{self, Program, Slot};
use crate::grammar;

#[derive(Default)]
pub struct SlotAllocator {
    slots: HashMap<String, usize>,
}

impl SlotAllocator {
    pub fn new() -> SlotAllocator {
        SlotAllocator::default()
    }

    pub fn slot_for(&mut self, name: &str) -> Slot {
        let next = self.slots.len();
        let idx = *self.slots.entry(name.to_string()).or_insert(next);
        Slot::Index(idx)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }
}

#[derive(thiserror::Error, Debug)]
#[error("parse error at line {line}, column {col}: {message}")]
pub struct ParseError {
    pub message: String,
    pub line: usize,
    pub col: usize,
}

fn locate(src: &str, byte_offset: usize) -> (usize, usize) {
    let mut line = 1;
    let mut col = 1;
    for ch in src[..byte_offset.min(src.len())].chars() {
        if ch == '\n' {
            line += 1;
            col = 1;
        } else {
            col += 1;
        }
    }
    (line, col)
}

/// Parse a complete `put`/`filter` program: statements, then an optional
/// `end { ... }` block.
pub fn parse_program(src: &str) -> Result<Program, ParseError> {
    let mut slots = SlotAllocator::new();
    grammar::ProgramParser::new().parse(&mut slots, src).map_err(|e| {
        let offset = offset_of(&e);
        let (line, col) = locate(src, offset);
        ParseError { message: e.to_string(), line, col }
    })
}

/// Parse a single expression, with no local-variable slots of interest to
/// the caller. Used by the `filter` verb's own top-level boolean
/// expression and by expression-focused tests.
pub fn parse_expr(src: &str) -> Result<ast::Expr, ParseError> {
    let mut slots = SlotAllocator::new();
    grammar::ExprParser::new().parse(&mut slots, src).map_err(|e| {
        let offset = offset_of(&e);
        let (line, col) = locate(src, offset);
        ParseError { message: e.to_string(), line, col }
    })
}

fn offset_of<T: std::fmt::Debug, E: std::fmt::Debug>(
    err: &lalrpop_util::ParseError<usize, T, E>,
) -> usize {
    use lalrpop_util::ParseError::*;
    match err {
        InvalidToken { location } => *location,
        UnrecognizedEof { location, .. } => *location,
        UnrecognizedToken { token, .. } => token.0,
        ExtraToken { token } => token.0,
        User { .. } => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Expr, Literal, Slot};
    use crate::value::BinOp;

    #[test]
    fn literals() {
        assert_eq!(parse_expr("42").unwrap(), Expr::Literal(Literal::Int(42)));
        assert_eq!(parse_expr("42.5").unwrap(), Expr::Literal(Literal::Double(42.5)));
        assert_eq!(parse_expr("(42)").unwrap(), Expr::Literal(Literal::Int(42)));
        assert_eq!(parse_expr(r#""hi""#).unwrap(), Expr::Literal(Literal::String("hi".to_string())));
    }

    #[test]
    fn precedence_climbs_correctly() {
        let got = parse_expr("3 + 4 < 3 * 4").unwrap();
        let expected = Expr::BinOp(
            BinOp::Lt,
            std::rc::Rc::new(Expr::BinOp(
                BinOp::Add,
                std::rc::Rc::new(Expr::Literal(Literal::Int(3))),
                std::rc::Rc::new(Expr::Literal(Literal::Int(4))),
            )),
            std::rc::Rc::new(Expr::BinOp(
                BinOp::Mul,
                std::rc::Rc::new(Expr::Literal(Literal::Int(3))),
                std::rc::Rc::new(Expr::Literal(Literal::Int(4))),
            )),
        );
        assert_eq!(got, expected);
    }

    #[test]
    fn field_and_oosvar_refs() {
        assert_eq!(parse_expr("$x").unwrap(), Expr::FieldRef("x".to_string()));
        assert_eq!(parse_expr("$*").unwrap(), Expr::FullRecord);
        assert_eq!(parse_expr("@sum").unwrap(), Expr::OosvarRef("sum".to_string()));
        assert_eq!(parse_expr("@*").unwrap(), Expr::FullOosvar);
    }

    #[test]
    fn same_local_name_reuses_slot() {
        let prog = parse_program("x = 1; y = x + 1;").unwrap();
        assert_eq!(prog.frame_size, 2);
        match &prog.main[1] {
            ast::Statement::AssignLocal(Slot::Index(1), rhs) => match rhs.as_ref() {
                Expr::BinOp(BinOp::Add, a, _) => {
                    assert_eq!(a.as_ref(), &Expr::LocalRef(Slot::Index(0)));
                }
                other => panic!("unexpected rhs {:?}", other),
            },
            other => panic!("unexpected statement {:?}", other),
        }
    }

    #[test]
    fn oosvar_indexed_assignment_and_emit() {
        let prog = parse_program(r#"@s[$a] += $x; emit @s, "a";"#).unwrap();
        assert_eq!(prog.main.len(), 2);
        assert!(matches!(prog.main[1], ast::Statement::Emit(_, _)));
    }

    #[test]
    fn if_elif_else_chain() {
        let prog = parse_program("if ($x > 0) { y = 1; } elif ($x < 0) { y = -1; } else { y = 0; }")
            .unwrap();
        match &prog.main[0] {
            ast::Statement::If(arms, else_branch) => {
                assert_eq!(arms.len(), 2);
                assert!(else_branch.is_some());
            }
            other => panic!("unexpected statement {:?}", other),
        }
    }

    #[test]
    fn reports_line_and_column_on_error() {
        let err = parse_program("x = ;").unwrap_err();
        assert_eq!(err.line, 1);
    }
}
