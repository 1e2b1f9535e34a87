// Expression evaluator. Two shapes, per the DSL's own split between
// scalar-producing and subtree-producing expressions:
//
// - `eval_scalar` walks an `Expr` down to a `Value`.
// - `eval_extended` is only ever called on the handful of `Expr` shapes
//   that can denote a whole subtree at runtime (`$*`, `@*`, an oosvar or
//   local reference, indexed or not); everything else is a scalar.
//
// Rust's ownership already rules out the double-free class of bug the
// original's `ephemeral` flag guarded against (a `Value`/`Mlmv` dropped out
// from under a second owner). `ephemeral` survives here as a documentation
// field only: `true` marks a subtree this call just built and that has no
// other owner; `false` marks one cloned out of long-lived state. Both are
// safe to move immediately, because cloning already made them independent.

use crate::ast::{Expr, Literal, Slot};
use crate::mlmv::{GetResult, Mlmv};
use crate::overlay::Overlay;
use crate::record::Record;
use crate::value::{self, Value};

pub struct Extended {
    pub node: Mlmv,
    pub ephemeral: bool,
}

pub struct EvalContext<'a> {
    pub record: &'a mut Record,
    pub overlay: &'a mut Overlay,
    pub frames: &'a mut crate::frame::Frames,
    pub accum: &'a mut Mlmv,
    pub ofmt: &'a str,
}

/// Best-effort type inference for a freshly-read record field: the record
/// only ever stores strings, so a read that misses the overlay has to
/// guess a type the same way the DSL's literals would parse it.
pub fn infer_value(s: &str) -> Value {
    if s.is_empty() {
        return Value::Null;
    }
    if let Ok(i) = s.parse::<i64>() {
        return Value::Int(i);
    }
    if let Ok(f) = s.parse::<f64>() {
        return Value::Double(f);
    }
    Value::from_str(s)
}

fn read_field(ctx: &mut EvalContext, name: &str) -> Value {
    if let Some(v) = ctx.overlay.get(name) {
        return v.clone();
    }
    let v = match ctx.record.get(name) {
        Some(s) => infer_value(s),
        None => Value::Null,
    };
    ctx.overlay.put(name.to_string(), v.clone());
    v
}

fn eval_path(exprs: &[std::rc::Rc<Expr>], ctx: &mut EvalContext) -> Vec<Value> {
    exprs.iter().map(|e| eval_scalar(e, ctx)).collect()
}

pub fn eval_scalar(expr: &Expr, ctx: &mut EvalContext) -> Value {
    match expr {
        Expr::Literal(lit) => match lit {
            Literal::Null => Value::Null,
            Literal::Bool(b) => Value::Bool(*b),
            Literal::Int(i) => Value::Int(*i),
            Literal::Double(d) => Value::Double(*d),
            Literal::String(s) => Value::from_str(s),
        },
        Expr::FieldRef(name) => read_field(ctx, name),
        Expr::FullRecord => Value::Error,
        Expr::LocalRef(Slot::Index(i)) => ctx.frames.read_nonindexed(*i),
        Expr::LocalRef(Slot::Unused) => Value::Null,
        Expr::LocalIndexed(Slot::Index(i), path) => {
            let keys = eval_path(path, ctx);
            match ctx.frames.read_indexed(*i, &keys) {
                GetResult::Found(v) => v.clone(),
                GetResult::TooDeep | GetResult::TooShallow => Value::Error,
                GetResult::NotFound => Value::Null,
            }
        }
        Expr::LocalIndexed(Slot::Unused, _) => Value::Null,
        Expr::OosvarRef(name) => match ctx.accum.get_node(&[Value::from_str(name)]) {
            Some(Mlmv::Terminal(v)) => v.clone(),
            _ => Value::Null,
        },
        Expr::OosvarIndexed(name, path) => {
            let mut keys = vec![Value::from_str(name)];
            keys.extend(eval_path(path, ctx));
            match ctx.accum.get(&keys) {
                GetResult::Found(v) => v.clone(),
                GetResult::TooDeep | GetResult::TooShallow => Value::Error,
                GetResult::NotFound => Value::Null,
            }
        }
        Expr::FullOosvar => Value::Error,
        Expr::BinOp(op, a, b) => {
            let av = eval_scalar(a, ctx);
            let bv = eval_scalar(b, ctx);
            op.apply(&av, &bv, ctx.ofmt)
        }
        Expr::UnOp(op, e) => {
            let v = eval_scalar(e, ctx);
            op.apply(&v)
        }
        Expr::Call(name, args) => {
            let vals: Vec<Value> = args.iter().map(|a| eval_scalar(a, ctx)).collect();
            call_builtin(name, &vals, ctx.ofmt)
        }
        Expr::Ternary(c, t, f) => match eval_scalar(c, ctx) {
            Value::Bool(true) => eval_scalar(t, ctx),
            Value::Bool(false) => eval_scalar(f, ctx),
            Value::Null => Value::Null,
            _ => Value::Error,
        },
    }
}

fn call_builtin(name: &str, args: &[Value], ofmt: &str) -> Value {
    match (name, args) {
        ("strlen", [a]) => value::strlen(a),
        ("toupper", [a]) => value::to_upper(a),
        ("tolower", [a]) => value::to_lower(a),
        ("sec2gmt", [a]) => value::sec2gmt(a),
        ("gmt2sec", [a]) => value::gmt2sec(a),
        ("int", [a]) => value::to_int(a),
        ("float", [a]) => value::to_float(a),
        ("boolean", [a]) => value::to_bool(a),
        ("string", [a]) => value::to_string_value(a, ofmt),
        ("abs", [a]) => crate::value::UnOp::Abs.apply(a),
        ("sub", [h, n, r]) => value::sub(h, n, r),
        _ => Value::Error,
    }
}

/// Evaluate an expression known (by its shape and the statement it appears
/// in) to denote a subtree rather than a scalar.
pub fn eval_extended(expr: &Expr, ctx: &mut EvalContext) -> Extended {
    match expr {
        Expr::FullRecord => {
            let mut m = Mlmv::empty_map();
            for (k, v) in ctx.record.iter() {
                // A field the overlay already holds a typed value for (it was
                // read or assigned earlier this record) keeps that type;
                // anything else is wrapped as the plain string it is in the
                // record, per the assignment taxonomy's "wrap record string
                // as TV" rule -- never type-inferred here.
                let value = ctx.overlay.get(k).cloned().unwrap_or_else(|| Value::from_str(v));
                m.put_value(&[Value::from_str(k)], value);
            }
            Extended { node: m, ephemeral: true }
        }
        Expr::FullOosvar => Extended { node: ctx.accum.clone(), ephemeral: false },
        Expr::OosvarRef(name) => {
            let node = ctx
                .accum
                .get_node(&[Value::from_str(name)])
                .cloned()
                .unwrap_or_else(Mlmv::empty_map);
            Extended { node, ephemeral: false }
        }
        Expr::OosvarIndexed(name, path) => {
            let mut keys = vec![Value::from_str(name)];
            keys.extend(eval_path(path, ctx));
            let node = ctx.accum.get_node(&keys).cloned().unwrap_or_else(Mlmv::empty_map);
            Extended { node, ephemeral: false }
        }
        Expr::LocalRef(Slot::Index(i)) => {
            let node = ctx.frames.read_map_node(*i, &[]).cloned().unwrap_or_else(Mlmv::empty_map);
            Extended { node, ephemeral: false }
        }
        Expr::LocalIndexed(Slot::Index(i), path) => {
            let keys = eval_path(path, ctx);
            let node = ctx.frames.read_map_node(*i, &keys).cloned().unwrap_or_else(Mlmv::empty_map);
            Extended { node, ephemeral: false }
        }
        other => {
            let v = eval_scalar(other, ctx);
            Extended { node: Mlmv::terminal(v), ephemeral: true }
        }
    }
}

/// True when `expr`'s shape can, at runtime, name a map-typed subtree
/// rather than a plain scalar -- the executor uses this to decide which
/// evaluator to call for an assignment's RHS.
pub fn is_reference_shaped(expr: &Expr) -> bool {
    matches!(
        expr,
        Expr::FullRecord
            | Expr::FullOosvar
            | Expr::OosvarRef(_)
            | Expr::OosvarIndexed(_, _)
            | Expr::LocalRef(_)
            | Expr::LocalIndexed(_, _)
    )
}
