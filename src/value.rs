// Typed Value (TV): the polymorphic scalar that flows through every
// expression. Operators are implemented as 2-D (binary) or 1-D (unary)
// dispatch tables indexed by tag, in the manner of the teacher's
// `operator!` macro: declarative tables in source, not scattered
// conditionals.

use std::rc::Rc;

use chrono::{DateTime, NaiveDateTime, Utc};

pub const NUM_TAGS: usize = 6;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[repr(usize)]
pub enum Tag {
    Null = 0,
    Error = 1,
    Bool = 2,
    Int = 3,
    Double = 4,
    String = 5,
}

impl Tag {
    pub fn name(self) -> &'static str {
        match self {
            Tag::Null => "null",
            Tag::Error => "error",
            Tag::Bool => "boolean",
            Tag::Int => "int",
            Tag::Double => "double",
            Tag::String => "string",
        }
    }
}

/// A tagged scalar. `Null` and `Error` are sentinel, payload-free variants;
/// every other variant owns its data (strings are `Rc<str>` so cloning a
/// value out of a slot or overlay entry is cheap).
#[derive(Clone, Debug)]
pub enum Value {
    Null,
    Error,
    Bool(bool),
    Int(i64),
    Double(f64),
    String(Rc<str>),
}

impl Value {
    pub fn tag(&self) -> Tag {
        match self {
            Value::Null => Tag::Null,
            Value::Error => Tag::Error,
            Value::Bool(_) => Tag::Bool,
            Value::Int(_) => Tag::Int,
            Value::Double(_) => Tag::Double,
            Value::String(_) => Tag::String,
        }
    }

    pub fn is_present(&self) -> bool {
        !matches!(self, Value::Null)
    }

    pub fn from_str(s: &str) -> Value {
        Value::String(Rc::from(s))
    }

    pub fn string(s: impl Into<Rc<str>>) -> Value {
        Value::String(s.into())
    }

    /// Render a value the way a record writer would: the contract `mt_format_val`
    /// establishes in the original implementation. `ofmt` (e.g. `"%lf"`) is used
    /// only for the `Double` variant.
    pub fn format(&self, ofmt: &str) -> String {
        match self {
            Value::Null => String::new(),
            Value::Error => "(error)".to_string(),
            Value::Bool(b) => if *b { "true" } else { "false" }.to_string(),
            Value::Int(i) => i.to_string(),
            Value::Double(d) => format_double(*d, ofmt),
            Value::String(s) => s.to_string(),
        }
    }

    pub fn describe(&self) -> String {
        format!("[{}] {}", self.tag().name(), self.format("%lf"))
    }
}

/// A tiny printf-subset formatter, just enough for the `ofmt` values this
/// DSL actually accepts (`%lf`, `%.<n>f`, `%le`, `%lg` and plain `%f`).
fn format_double(d: f64, ofmt: &str) -> String {
    if let Some(rest) = ofmt.strip_prefix("%.").and_then(|r| r.strip_suffix('f')) {
        if let Ok(prec) = rest.parse::<usize>() {
            return format!("{:.*}", prec, d);
        }
    }
    match ofmt {
        "%lf" | "%f" => format!("{:.6}", d),
        "%le" | "%e" => format!("{:e}", d),
        "%lg" | "%g" => format!("{}", d),
        _ => format!("{:.6}", d),
    }
}

// ----------------------------------------------------------------
// Coercion

pub fn to_int(v: &Value) -> Value {
    match v {
        Value::Null => Value::Null,
        Value::Error => Value::Error,
        Value::Bool(b) => Value::Int(if *b { 1 } else { 0 }),
        Value::Int(i) => Value::Int(*i),
        Value::Double(d) => Value::Int(d.round() as i64),
        Value::String(s) => {
            if s.is_empty() {
                Value::Null
            } else {
                s.parse::<i64>().map(Value::Int).unwrap_or(Value::Error)
            }
        }
    }
}

pub fn to_float(v: &Value) -> Value {
    match v {
        Value::Null => Value::Null,
        Value::Error => Value::Error,
        Value::Bool(_) => Value::Error,
        Value::Int(i) => Value::Double(*i as f64),
        Value::Double(d) => Value::Double(*d),
        Value::String(s) => {
            if s.is_empty() {
                Value::Null
            } else {
                s.parse::<f64>().map(Value::Double).unwrap_or(Value::Error)
            }
        }
    }
}

pub fn to_bool(v: &Value) -> Value {
    match v {
        Value::Null => Value::Null,
        Value::Error => Value::Error,
        Value::Bool(b) => Value::Bool(*b),
        Value::Int(i) => Value::Bool(*i != 0),
        Value::Double(d) => Value::Bool(*d != 0.0),
        Value::String(s) => Value::Bool(s == "true" || s == "TRUE"),
    }
}

pub fn to_string_value(v: &Value, ofmt: &str) -> Value {
    match v {
        Value::Null => Value::Null,
        Value::Error => Value::Error,
        Value::String(s) => Value::String(s.clone()),
        other => Value::from_str(&other.format(ofmt)),
    }
}

// ----------------------------------------------------------------
// Binary operator dispatch

type BinFn = fn(&Value, &Value, &str) -> Value;

fn op_null(_: &Value, _: &Value, _: &str) -> Value {
    Value::Null
}
fn op_error(_: &Value, _: &Value, _: &str) -> Value {
    Value::Error
}

/// Explicit absorption rows: Error dominates Null; Null combined with
/// anything non-error is Null by default unless overridden below.
fn absorb(a: &Value, b: &Value) -> Option<Value> {
    match (a.tag(), b.tag()) {
        (Tag::Error, _) | (_, Tag::Error) => Some(Value::Error),
        (Tag::Null, _) | (_, Tag::Null) => Some(Value::Null),
        _ => None,
    }
}

macro_rules! arith_op {
    ($name:ident, $ii:expr, $ff:expr) => {
        pub fn $name(a: &Value, b: &Value, ofmt: &str) -> Value {
            if let Some(v) = absorb(a, b) {
                return v;
            }
            match (a, b) {
                (Value::Int(x), Value::Int(y)) => $ii(*x, *y),
                (Value::Int(x), Value::Double(y)) => $ff(*x as f64, *y),
                (Value::Double(x), Value::Int(y)) => $ff(*x, *y as f64),
                (Value::Double(x), Value::Double(y)) => $ff(*x, *y),
                _ => {
                    let _ = ofmt;
                    Value::Error
                }
            }
        }
    };
}

arith_op!(add, |x: i64, y: i64| Value::Int(x.wrapping_add(y)), |x: f64, y: f64| Value::Double(x + y));
arith_op!(sub, |x: i64, y: i64| Value::Int(x.wrapping_sub(y)), |x: f64, y: f64| Value::Double(x - y));
arith_op!(mul, |x: i64, y: i64| Value::Int(x.wrapping_mul(y)), |x: f64, y: f64| Value::Double(x * y));
arith_op!(div, |x: i64, y: i64| if y == 0 { Value::Error } else { Value::Int(x / y) }, |x: f64, y: f64| Value::Double(x / y));
arith_op!(modulo, |x: i64, y: i64| if y == 0 { Value::Error } else { Value::Int(x.rem_euclid(y)) }, |x: f64, y: f64| Value::Double(x.rem_euclid(y)));
arith_op!(pow, |x: i64, y: i64| if y >= 0 { Value::Int(x.pow(y as u32)) } else { Value::Double((x as f64).powf(y as f64)) }, |x: f64, y: f64| Value::Double(x.powf(y)));
arith_op!(min, |x: i64, y: i64| Value::Int(x.min(y)), |x: f64, y: f64| Value::Double(x.min(y)));
arith_op!(max, |x: i64, y: i64| Value::Int(x.max(y)), |x: f64, y: f64| Value::Double(x.max(y)));

fn bitand(a: &Value, b: &Value, _ofmt: &str) -> Value {
    if let Some(v) = absorb(a, b) {
        return v;
    }
    match (a, b) {
        (Value::Bool(x), Value::Bool(y)) => Value::Bool(*x && *y),
        (Value::Int(x), Value::Int(y)) => Value::Int(x & y),
        _ => Value::Error,
    }
}

fn bitor(a: &Value, b: &Value, _ofmt: &str) -> Value {
    if let Some(v) = absorb(a, b) {
        return v;
    }
    match (a, b) {
        (Value::Bool(x), Value::Bool(y)) => Value::Bool(*x || *y),
        (Value::Int(x), Value::Int(y)) => Value::Int(x | y),
        _ => Value::Error,
    }
}

fn bitxor(a: &Value, b: &Value, _ofmt: &str) -> Value {
    if let Some(v) = absorb(a, b) {
        return v;
    }
    match (a, b) {
        (Value::Bool(x), Value::Bool(y)) => Value::Bool(*x ^ *y),
        (Value::Int(x), Value::Int(y)) => Value::Int(x ^ y),
        _ => Value::Error,
    }
}

fn shl(a: &Value, b: &Value, _ofmt: &str) -> Value {
    if let Some(v) = absorb(a, b) {
        return v;
    }
    match (a, b) {
        (Value::Int(x), Value::Int(y)) => Value::Int(x << y),
        _ => Value::Error,
    }
}

fn shr(a: &Value, b: &Value, _ofmt: &str) -> Value {
    if let Some(v) = absorb(a, b) {
        return v;
    }
    match (a, b) {
        (Value::Int(x), Value::Int(y)) => Value::Int(x >> y),
        _ => Value::Error,
    }
}

/// `.`: string concatenation. Each operand is formatted with its own
/// length and contents (the original implementation computed the second
/// operand's length from the first operand's buffer -- a documented bug
/// this reimplementation does not reproduce, see DESIGN.md).
fn concat(a: &Value, b: &Value, ofmt: &str) -> Value {
    if let Some(v) = absorb(a, b) {
        return v;
    }
    let mut s = a.format(ofmt);
    s.push_str(&b.format(ofmt));
    Value::from_str(&s)
}

macro_rules! cmp_op {
    ($name:ident, $numcmp:expr, $boolcmp:expr, $strcmp:expr) => {
        pub fn $name(a: &Value, b: &Value, ofmt: &str) -> Value {
            match (a.tag(), b.tag()) {
                (Tag::Error, _) | (_, Tag::Error) => return Value::Error,
                (Tag::Null, Tag::Null) => return Value::Null,
                (Tag::Null, Tag::Int) | (Tag::Null, Tag::Double) => return Value::Null,
                (Tag::Int, Tag::Null) | (Tag::Double, Tag::Null) => return Value::Null,
                (Tag::Null, Tag::String) | (Tag::String, Tag::Null) => return Value::Null,
                (Tag::Null, _) | (_, Tag::Null) => return Value::Error,
                _ => {}
            }
            match (a, b) {
                (Value::Bool(x), Value::Bool(y)) => $boolcmp(*x, *y),
                (Value::Int(x), Value::Int(y)) => $numcmp(*x as f64, *y as f64),
                (Value::Int(x), Value::Double(y)) => $numcmp(*x as f64, *y),
                (Value::Double(x), Value::Int(y)) => $numcmp(*x, *y as f64),
                (Value::Double(x), Value::Double(y)) => $numcmp(*x, *y),
                (Value::String(x), Value::String(y)) => $strcmp(x.as_ref(), y.as_ref()),
                (Value::String(x), other) => $strcmp(x.as_ref(), other.format(ofmt).as_str()),
                (other, Value::String(y)) => $strcmp(other.format(ofmt).as_str(), y.as_ref()),
                _ => Value::Error,
            }
        }
    };
}

cmp_op!(eq, |x: f64, y: f64| Value::Bool(x == y), |x: bool, y: bool| Value::Bool(x == y), |x: &str, y: &str| Value::Bool(x == y));
cmp_op!(ne, |x: f64, y: f64| Value::Bool(x != y), |x: bool, y: bool| Value::Bool(x != y), |x: &str, y: &str| Value::Bool(x != y));

macro_rules! order_op {
    ($name:ident, $numcmp:expr, $strcmp:expr) => {
        pub fn $name(a: &Value, b: &Value, ofmt: &str) -> Value {
            match (a.tag(), b.tag()) {
                (Tag::Error, _) | (_, Tag::Error) => return Value::Error,
                (Tag::Null, Tag::Null) => return Value::Null,
                (Tag::Null, Tag::Int) | (Tag::Null, Tag::Double) => return Value::Null,
                (Tag::Int, Tag::Null) | (Tag::Double, Tag::Null) => return Value::Null,
                (Tag::Null, Tag::String) | (Tag::String, Tag::Null) => return Value::Null,
                (Tag::Null, _) | (_, Tag::Null) => return Value::Error,
                (Tag::Bool, Tag::Bool) => return Value::Error,
                _ => {}
            }
            match (a, b) {
                (Value::Int(x), Value::Int(y)) => $numcmp(*x as f64, *y as f64),
                (Value::Int(x), Value::Double(y)) => $numcmp(*x as f64, *y),
                (Value::Double(x), Value::Int(y)) => $numcmp(*x, *y as f64),
                (Value::Double(x), Value::Double(y)) => $numcmp(*x, *y),
                (Value::String(x), Value::String(y)) => $strcmp(x.as_ref(), y.as_ref()),
                (Value::String(x), other) => $strcmp(x.as_ref(), other.format(ofmt).as_str()),
                (other, Value::String(y)) => $strcmp(other.format(ofmt).as_str(), y.as_ref()),
                _ => Value::Error,
            }
        }
    };
}

order_op!(lt, |x: f64, y: f64| Value::Bool(x < y), |x: &str, y: &str| Value::Bool(x < y));
order_op!(gt, |x: f64, y: f64| Value::Bool(x > y), |x: &str, y: &str| Value::Bool(x > y));
order_op!(le, |x: f64, y: f64| Value::Bool(x <= y), |x: &str, y: &str| Value::Bool(x <= y));
order_op!(ge, |x: f64, y: f64| Value::Bool(x >= y), |x: &str, y: &str| Value::Bool(x >= y));

pub fn and(a: &Value, b: &Value, ofmt: &str) -> Value {
    bitand(a, b, ofmt)
}
pub fn or(a: &Value, b: &Value, ofmt: &str) -> Value {
    bitor(a, b, ofmt)
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
    And,
    Or,
    Xor,
    Shl,
    Shr,
    Dot,
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
    Min,
    Max,
}

impl BinOp {
    pub fn apply(self, a: &Value, b: &Value, ofmt: &str) -> Value {
        let f: BinFn = match self {
            BinOp::Add => add,
            BinOp::Sub => sub,
            BinOp::Mul => mul,
            BinOp::Div => div,
            BinOp::Mod => modulo,
            BinOp::Pow => pow,
            BinOp::And => and,
            BinOp::Or => or,
            BinOp::Xor => bitxor,
            BinOp::Shl => shl,
            BinOp::Shr => shr,
            BinOp::Dot => concat,
            BinOp::Eq => eq,
            BinOp::Ne => ne,
            BinOp::Lt => lt,
            BinOp::Gt => gt,
            BinOp::Le => le,
            BinOp::Ge => ge,
            BinOp::Min => min,
            BinOp::Max => max,
        };
        f(a, b, ofmt)
    }
}

// ----------------------------------------------------------------
// Unary operator dispatch

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum UnOp {
    Neg,
    Not,
    Abs,
}

impl UnOp {
    pub fn apply(self, v: &Value) -> Value {
        match self {
            UnOp::Neg => match v {
                Value::Null => Value::Null,
                Value::Error => Value::Error,
                Value::Int(i) => Value::Int(-i),
                Value::Double(d) => Value::Double(-d),
                _ => Value::Error,
            },
            UnOp::Not => match v {
                Value::Null => Value::Null,
                Value::Error => Value::Error,
                Value::Bool(b) => Value::Bool(!b),
                _ => Value::Error,
            },
            UnOp::Abs => match v {
                Value::Null => Value::Null,
                Value::Error => Value::Error,
                Value::Int(i) => Value::Int(i.abs()),
                Value::Double(d) => Value::Double(d.abs()),
                _ => Value::Error,
            },
        }
    }
}

// ----------------------------------------------------------------
// String built-in functions

/// `sub(haystack, needle, replacement)`: replace the first match only, or
/// return the haystack unchanged if the needle does not occur.
pub fn sub(haystack: &Value, needle: &Value, replacement: &Value) -> Value {
    match (haystack, needle, replacement) {
        (Value::String(h), Value::String(n), Value::String(r)) => match h.find(n.as_ref()) {
            Some(pos) => {
                let mut out = String::with_capacity(h.len() - n.len() + r.len());
                out.push_str(&h[..pos]);
                out.push_str(r);
                out.push_str(&h[pos + n.len()..]);
                Value::from_str(&out)
            }
            None => Value::String(h.clone()),
        },
        (Value::Error, _, _) | (_, Value::Error, _) | (_, _, Value::Error) => Value::Error,
        (Value::Null, _, _) | (_, Value::Null, _) | (_, _, Value::Null) => Value::Null,
        _ => Value::Error,
    }
}

pub fn strlen(v: &Value) -> Value {
    match v {
        Value::String(s) => Value::Int(s.chars().count() as i64),
        Value::Null => Value::Null,
        Value::Error => Value::Error,
        _ => Value::Error,
    }
}

pub fn to_lower(v: &Value) -> Value {
    match v {
        Value::String(s) => Value::from_str(&s.to_lowercase()),
        Value::Null => Value::Null,
        Value::Error => Value::Error,
        _ => Value::Error,
    }
}

pub fn to_upper(v: &Value) -> Value {
    match v {
        Value::String(s) => Value::from_str(&s.to_uppercase()),
        Value::Null => Value::Null,
        Value::Error => Value::Error,
        _ => Value::Error,
    }
}

/// `sec2gmt(epoch_seconds) -> "%Y-%m-%dT%H:%M:%SZ"` in UTC.
pub fn sec2gmt(v: &Value) -> Value {
    let secs = match to_float(v) {
        Value::Double(d) => d,
        Value::Null => return Value::Null,
        Value::Error => return Value::Error,
        _ => return Value::Error,
    };
    let whole = secs.floor() as i64;
    match DateTime::<Utc>::from_timestamp(whole, 0) {
        Some(dt) => Value::from_str(&dt.format("%Y-%m-%dT%H:%M:%SZ").to_string()),
        None => Value::Error,
    }
}

/// `gmt2sec("%Y-%m-%dT%H:%M:%SZ") -> epoch_seconds`.
pub fn gmt2sec(v: &Value) -> Value {
    match v {
        Value::String(s) => {
            if s.is_empty() {
                return Value::Null;
            }
            match NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%SZ") {
                Ok(naive) => Value::Int(naive.and_utc().timestamp()),
                Err(_) => Value::Error,
            }
        }
        Value::Null => Value::Null,
        Value::Error => Value::Error,
        _ => Value::Error,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_arithmetic() {
        let a = Value::Int(1);
        let b = Value::Int(2);
        match BinOp::Add.apply(&a, &b, "%lf") {
            Value::Int(3) => {}
            other => panic!("expected Int(3), got {:?}", other),
        }
    }

    #[test]
    fn numeric_promotion() {
        let a = Value::Int(1);
        let b = Value::Double(2.5);
        match BinOp::Add.apply(&a, &b, "%lf") {
            Value::Double(d) if (d - 3.5).abs() < 1e-9 => {}
            other => panic!("expected Double(3.5), got {:?}", other),
        }
    }

    #[test]
    fn string_comparison_coercion() {
        let x = Value::Int(10);
        let nine = Value::from_str("9");
        match BinOp::Gt.apply(&x, &nine, "%lf") {
            Value::Bool(b) => assert!(!b, "\"10\" should not be lexicographically > \"9\""),
            other => panic!("expected Bool, got {:?}", other),
        }
    }

    #[test]
    fn null_absorption() {
        assert!(matches!(BinOp::Add.apply(&Value::Null, &Value::Int(3), "%lf"), Value::Null));
        assert!(matches!(BinOp::Add.apply(&Value::Null, &Value::Error, "%lf"), Value::Error));
    }

    #[test]
    fn bool_arithmetic_is_error() {
        assert!(matches!(BinOp::Add.apply(&Value::Bool(true), &Value::Int(1), "%lf"), Value::Error));
    }

    #[test]
    fn sub_replaces_first_match_only() {
        let h = Value::from_str("ababab");
        let n = Value::from_str("ab");
        let r = Value::from_str("X");
        match sub(&h, &n, &r) {
            Value::String(s) => assert_eq!(s.as_ref(), "Xabab"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn sub_missing_needle_is_noop() {
        let h = Value::from_str("hello");
        let n = Value::from_str("xyz");
        let r = Value::from_str("X");
        match sub(&h, &n, &r) {
            Value::String(s) => assert_eq!(s.as_ref(), "hello"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn date_roundtrip() {
        let formatted = sec2gmt(&Value::Double(0.0));
        match &formatted {
            Value::String(s) => assert_eq!(s.as_ref(), "1970-01-01T00:00:00Z"),
            other => panic!("unexpected {:?}", other),
        }
        assert!(matches!(gmt2sec(&formatted), Value::Int(0)));
        assert!(matches!(gmt2sec(&Value::from_str("")), Value::Null));
    }

    #[test]
    fn dispatch_totality() {
        let values = [
            Value::Null,
            Value::Error,
            Value::Bool(true),
            Value::Int(1),
            Value::Double(1.0),
            Value::from_str("x"),
        ];
        for a in &values {
            for b in &values {
                // Must never panic for any tag pair.
                let _ = BinOp::Add.apply(a, b, "%lf");
                let _ = BinOp::Eq.apply(a, b, "%lf");
                let _ = BinOp::Lt.apply(a, b, "%lf");
            }
        }
    }
}
