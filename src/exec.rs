// Statement executor: one handler per `ast::Statement` variant, driving
// the assignment taxonomy against the current record/overlay/frames/
// accumulator quadruple held by an `EvalContext`.
//
// Null-propagation policy (shared by every assignment kind): an RHS that
// evaluates to `Value::Null` is a silent no-op -- the LHS is left
// untouched. This is the one rule simple enough to hoist out of the
// per-row table and apply uniformly rather than repeat at each call site.

use crate::ast::{Expr, Slot, Statement};
use crate::eval::{self, EvalContext, Extended};
use crate::mlmv::{GetResult, Mlmv};
use crate::record::Record;
use crate::value::{BinOp, Value};

#[derive(Default)]
pub struct ExecOutcome {
    pub keep: bool,
    pub emitted: Vec<Record>,
}

impl ExecOutcome {
    pub fn new() -> ExecOutcome {
        ExecOutcome { keep: true, emitted: Vec::new() }
    }
}

pub fn run_statements(stmts: &[Statement], ctx: &mut EvalContext, out: &mut ExecOutcome) {
    for stmt in stmts {
        run_statement(stmt, ctx, out);
        if !out.keep {
            return;
        }
    }
}

fn run_statement(stmt: &Statement, ctx: &mut EvalContext, out: &mut ExecOutcome) {
    match stmt {
        Statement::Bare(e) => {
            eval::eval_scalar(e, ctx);
        }
        Statement::Filter(e) => {
            if !matches!(eval::eval_scalar(e, ctx), Value::Bool(true)) {
                out.keep = false;
            }
        }
        Statement::AssignFullRecord(rhs) => assign_full_record(rhs, ctx),
        Statement::AssignField(name, rhs) => assign_field(name, rhs, ctx),
        Statement::AssignLocal(slot, rhs) => assign_local(*slot, rhs, ctx),
        Statement::AssignLocalIndexed(slot, path, rhs) => assign_local_indexed(*slot, path, rhs, ctx),
        Statement::AssignOosvar(name, rhs) => assign_oosvar(name, rhs, ctx),
        Statement::AssignOosvarIndexed(name, path, rhs) => assign_oosvar_indexed(name, path, rhs, ctx),
        Statement::AssignFullOosvar(rhs) => assign_full_oosvar(rhs, ctx),
        Statement::CompoundAssignField(name, op, rhs) => compound_assign_field(name, *op, rhs, ctx),
        Statement::CompoundAssignLocal(slot, op, rhs) => compound_assign_local(*slot, *op, rhs, ctx),
        Statement::CompoundAssignLocalIndexed(slot, path, op, rhs) => {
            compound_assign_local_indexed(*slot, path, *op, rhs, ctx)
        }
        Statement::CompoundAssignOosvar(name, op, rhs) => compound_assign_oosvar(name, *op, rhs, ctx),
        Statement::CompoundAssignOosvarIndexed(name, path, op, rhs) => {
            compound_assign_oosvar_indexed(name, path, *op, rhs, ctx)
        }
        Statement::Emit(name, keys) => emit(name, keys, ctx, out),
        Statement::If(arms, else_branch) => run_if(arms, else_branch, ctx, out),
    }
}

/// Compound assignment: `target op= rhs`. A target that has never been
/// written reads back as `Value::Null`, which `BinOp::apply` would absorb
/// (`Null + x = Null`), permanently defeating the accumulator idiom
/// (`@sum[$k] += $x`). So a never-written target is given identity
/// treatment instead -- the RHS is stored as-is -- while an already-present
/// target combines with the RHS the normal way.
fn combine(current: Value, op: BinOp, rhs: Value, ofmt: &str) -> Value {
    if current.is_present() {
        op.apply(&current, &rhs, ofmt)
    } else {
        rhs
    }
}

fn compound_assign_field(name: &str, op: BinOp, rhs: &Expr, ctx: &mut EvalContext) {
    let current = eval::eval_scalar(&Expr::FieldRef(name.to_string()), ctx);
    let rhs_val = eval::eval_scalar(rhs, ctx);
    let v = combine(current, op, rhs_val, ctx.ofmt);
    if v.is_present() {
        ctx.overlay.put(name.to_string(), v.clone());
        ctx.record.put(name.to_string(), v.format(ctx.ofmt));
    }
}

fn compound_assign_local(slot: Slot, op: BinOp, rhs: &Expr, ctx: &mut EvalContext) {
    let Slot::Index(i) = slot else { return };
    let current = ctx.frames.read_nonindexed(i);
    let rhs_val = eval::eval_scalar(rhs, ctx);
    let v = combine(current, op, rhs_val, ctx.ofmt);
    if v.is_present() {
        ctx.frames.assign_nonindexed(i, v);
    }
}

fn compound_assign_local_indexed(
    slot: Slot,
    path: &[std::rc::Rc<Expr>],
    op: BinOp,
    rhs: &Expr,
    ctx: &mut EvalContext,
) {
    let Slot::Index(i) = slot else { return };
    let keys = eval_path_values(path, ctx);
    let current = match ctx.frames.read_indexed(i, &keys) {
        GetResult::Found(v) => v.clone(),
        GetResult::TooDeep | GetResult::TooShallow => Value::Error,
        GetResult::NotFound => Value::Null,
    };
    let rhs_val = eval::eval_scalar(rhs, ctx);
    let v = combine(current, op, rhs_val, ctx.ofmt);
    if v.is_present() {
        ctx.frames.assign_indexed(i, &keys, v);
    }
}

fn compound_assign_oosvar(name: &str, op: BinOp, rhs: &Expr, ctx: &mut EvalContext) {
    let current = match ctx.accum.get_node(&[Value::from_str(name)]) {
        Some(Mlmv::Terminal(v)) => v.clone(),
        _ => Value::Null,
    };
    let rhs_val = eval::eval_scalar(rhs, ctx);
    let v = combine(current, op, rhs_val, ctx.ofmt);
    if v.is_present() {
        ctx.accum.put_value(&[Value::from_str(name)], v);
    }
}

fn compound_assign_oosvar_indexed(
    name: &str,
    path: &[std::rc::Rc<Expr>],
    op: BinOp,
    rhs: &Expr,
    ctx: &mut EvalContext,
) {
    let mut keys = vec![Value::from_str(name)];
    keys.extend(eval_path_values(path, ctx));
    let current = match ctx.accum.get(&keys) {
        GetResult::Found(v) => v.clone(),
        GetResult::TooDeep | GetResult::TooShallow => Value::Error,
        GetResult::NotFound => Value::Null,
    };
    let rhs_val = eval::eval_scalar(rhs, ctx);
    let v = combine(current, op, rhs_val, ctx.ofmt);
    if v.is_present() {
        ctx.accum.put_value(&keys, v);
    }
}

fn eval_path_values(path: &[std::rc::Rc<Expr>], ctx: &mut EvalContext) -> Vec<Value> {
    path.iter().map(|e| eval::eval_scalar(e, ctx)).collect()
}

fn run_if(
    arms: &[(std::rc::Rc<Expr>, Vec<Statement>)],
    else_branch: &Option<Vec<Statement>>,
    ctx: &mut EvalContext,
    out: &mut ExecOutcome,
) {
    for (cond, body) in arms {
        if matches!(eval::eval_scalar(cond, ctx), Value::Bool(true)) {
            run_statements(body, ctx, out);
            return;
        }
    }
    if let Some(body) = else_branch {
        run_statements(body, ctx, out);
    }
}

fn assign_full_record(rhs: &Expr, ctx: &mut EvalContext) {
    if matches!(rhs, Expr::FullRecord) {
        return;
    }
    if !eval::is_reference_shaped(rhs) {
        log::warn!("$* assigned a scalar expression; ignoring");
        return;
    }
    let Extended { node, .. } = eval::eval_extended(rhs, ctx);
    if let Mlmv::Terminal(_) = node {
        log::warn!("$* assigned a non-map subtree; ignoring");
        return;
    }
    ctx.record.clear();
    ctx.overlay.clear();
    let ofmt = ctx.ofmt.to_string();
    for (key, child) in node.iter() {
        if let Mlmv::Terminal(v) = child {
            ctx.overlay.put(key.field_name(), v.clone());
            ctx.record.put(key.field_name(), v.format(&ofmt));
        }
    }
}

fn assign_field(name: &str, rhs: &Expr, ctx: &mut EvalContext) {
    let v = eval::eval_scalar(rhs, ctx);
    if !v.is_present() {
        return;
    }
    ctx.overlay.put(name.to_string(), v.clone());
    ctx.record.put(name.to_string(), v.format(ctx.ofmt));
}

fn assign_local(slot: Slot, rhs: &Expr, ctx: &mut EvalContext) {
    let Slot::Index(i) = slot else { return };
    if eval::is_reference_shaped(rhs) {
        let Extended { node, .. } = eval::eval_extended(rhs, ctx);
        match node {
            Mlmv::Terminal(v) => {
                if v.is_present() {
                    ctx.frames.assign_nonindexed(i, v);
                }
            }
            map => ctx.frames.assign_map(i, map),
        }
        return;
    }
    let v = eval::eval_scalar(rhs, ctx);
    if v.is_present() {
        ctx.frames.assign_nonindexed(i, v);
    }
}

fn assign_local_indexed(slot: Slot, path: &[std::rc::Rc<Expr>], rhs: &Expr, ctx: &mut EvalContext) {
    let Slot::Index(i) = slot else { return };
    let keys: Vec<Value> = path.iter().map(|e| eval::eval_scalar(e, ctx)).collect();
    if eval::is_reference_shaped(rhs) {
        let Extended { node, .. } = eval::eval_extended(rhs, ctx);
        match node {
            Mlmv::Terminal(v) => {
                if v.is_present() {
                    ctx.frames.assign_indexed(i, &keys, v);
                }
            }
            map => ctx.frames.assign_indexed_node(i, &keys, map),
        }
        return;
    }
    let v = eval::eval_scalar(rhs, ctx);
    if v.is_present() {
        ctx.frames.assign_indexed(i, &keys, v);
    }
}

fn assign_oosvar(name: &str, rhs: &Expr, ctx: &mut EvalContext) {
    if eval::is_reference_shaped(rhs) {
        let Extended { node, .. } = eval::eval_extended(rhs, ctx);
        match node {
            Mlmv::Terminal(v) => {
                if v.is_present() {
                    ctx.accum.put_value(&[Value::from_str(name)], v);
                }
            }
            map => ctx.accum.put(&[Value::from_str(name)], map),
        }
        return;
    }
    let v = eval::eval_scalar(rhs, ctx);
    if v.is_present() {
        ctx.accum.put_value(&[Value::from_str(name)], v);
    }
}

fn assign_oosvar_indexed(name: &str, path: &[std::rc::Rc<Expr>], rhs: &Expr, ctx: &mut EvalContext) {
    let mut keys = vec![Value::from_str(name)];
    keys.extend(path.iter().map(|e| eval::eval_scalar(e, ctx)));
    if eval::is_reference_shaped(rhs) {
        let Extended { node, .. } = eval::eval_extended(rhs, ctx);
        match node {
            Mlmv::Terminal(v) => {
                if v.is_present() {
                    ctx.accum.put_value(&keys, v);
                }
            }
            map => ctx.accum.put(&keys, map),
        }
        return;
    }
    let v = eval::eval_scalar(rhs, ctx);
    if v.is_present() {
        ctx.accum.put_value(&keys, v);
    }
}

fn assign_full_oosvar(rhs: &Expr, ctx: &mut EvalContext) {
    if matches!(rhs, Expr::FullOosvar) {
        return;
    }
    if !eval::is_reference_shaped(rhs) {
        log::warn!("@* assigned a scalar expression; ignoring");
        return;
    }
    let Extended { node, .. } = eval::eval_extended(rhs, ctx);
    if let Mlmv::Terminal(_) = node {
        log::warn!("@* assigned a non-map subtree; ignoring");
        return;
    }
    *ctx.accum = node;
}

fn emit(name: &str, keys: &[String], ctx: &mut EvalContext, out: &mut ExecOutcome) {
    let node = match ctx.accum.get_node(&[Value::from_str(name)]) {
        Some(n) => n.clone(),
        None => return,
    };
    let key_refs: Vec<&str> = keys.iter().map(String::as_str).collect();
    out.emitted.extend(node.to_records(&key_refs, name, ctx.ofmt));
}
