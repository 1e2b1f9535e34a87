// AST produced by the `lalrpop`-generated parser (src/grammar.lalrpop) and
// consumed by the evaluator (eval.rs) and statement executor (exec.rs).
// Variable nodes carry a frame-relative slot index assigned by the parser
// at parse time; `Slot::Unused` marks a node the compiler never resolved to
// a local (full-record and oosvar references don't use slots at all).

use std::rc::Rc;

use crate::value::{BinOp, UnOp};

pub type Node<T> = Rc<T>;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Slot {
    Unused,
    Index(usize),
}

/// A literal as written in source, before any coercion.
#[derive(Clone, Debug, PartialEq)]
pub enum Literal {
    Null,
    Bool(bool),
    Int(i64),
    Double(f64),
    String(String),
}

#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    Literal(Literal),

    /// `$field`
    FieldRef(String),
    /// `$*`
    FullRecord,

    /// `x` (non-indexed local, slot assigned by the parser)
    LocalRef(Slot),
    /// `x[k1][k2]...` (indexed local)
    LocalIndexed(Slot, Vec<Node<Expr>>),

    /// `@sum`
    OosvarRef(String),
    /// `@sum[k1][k2]...`
    OosvarIndexed(String, Vec<Node<Expr>>),
    /// `@*`
    FullOosvar,

    BinOp(BinOp, Node<Expr>, Node<Expr>),
    UnOp(UnOp, Node<Expr>),

    /// `f(a, b, c)` — built-in function call by name; user-defined
    /// functions are out of scope.
    Call(String, Vec<Node<Expr>>),

    /// `cond ? then : else`
    Ternary(Node<Expr>, Node<Expr>, Node<Expr>),
}

#[derive(Clone, Debug, PartialEq)]
pub enum Statement {
    /// `$* = rhs`
    AssignFullRecord(Node<Expr>),
    /// `$field = rhs`
    AssignField(String, Node<Expr>),

    /// `x = rhs` (non-indexed local)
    AssignLocal(Slot, Node<Expr>),
    /// `x[k1][k2] = rhs`
    AssignLocalIndexed(Slot, Vec<Node<Expr>>, Node<Expr>),

    /// `@sum = rhs`
    AssignOosvar(String, Node<Expr>),
    /// `@sum[k1][k2] = rhs`
    AssignOosvarIndexed(String, Vec<Node<Expr>>, Node<Expr>),
    /// `@* = rhs` — RHS must be a full-record-shaped extended expression.
    AssignFullOosvar(Node<Expr>),

    /// `$field += rhs` and friends. Kept distinct from a desugared
    /// `$field = $field + rhs` so the executor can give a never-written
    /// target identity-element treatment instead of generic Null
    /// absorption -- the accumulator idiom (`@sum[$k] += $x`) depends on
    /// this, and a plain `+` between two absent scalars must still yield
    /// Null per the dispatch table.
    CompoundAssignField(String, BinOp, Node<Expr>),
    CompoundAssignLocal(Slot, BinOp, Node<Expr>),
    CompoundAssignLocalIndexed(Slot, Vec<Node<Expr>>, BinOp, Node<Expr>),
    CompoundAssignOosvar(String, BinOp, Node<Expr>),
    CompoundAssignOosvarIndexed(String, Vec<Node<Expr>>, BinOp, Node<Expr>),

    /// `filter expr` — statement form used inside `put`, distinct from the
    /// `filter` verb's own top-level boolean expression.
    Filter(Node<Expr>),

    /// `emit @sum, "a", "b"` — flattens an oosvar subtree into records,
    /// peeling one named key level per listed name.
    Emit(String, Vec<String>),

    If(Vec<(Node<Expr>, Vec<Statement>)>, Option<Vec<Statement>>),
    Bare(Node<Expr>),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Program {
    pub main: Vec<Statement>,
    pub end: Vec<Statement>,
    /// Number of slots the root frame needs, computed by the parser while
    /// assigning `Slot::Index` values.
    pub frame_size: usize,
}
