// Local Frame Stack (LFS): lexically-scoped frames indexed by
// compile-time slot numbers. Each slot holds either a scalar `Value` or a
// map-typed local's `Mlmv` root. Grounded in the teacher's `Env<T>` scope
// chain (env.rs), generalised from name-keyed lookup to slot-indexed
// lookup and from a single value type to the scalar/map split the DSL
// needs.

use enumflags2::{bitflags, BitFlags};

use crate::mlmv::{GetResult, Mlmv};
use crate::value::{Tag, Value};

#[bitflags]
#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum TypeMask {
    Null = 0b000001,
    Error = 0b000010,
    Bool = 0b000100,
    Int = 0b001000,
    Double = 0b010000,
    String = 0b100000,
}

pub fn mask_for_tag(tag: Tag) -> BitFlags<TypeMask> {
    match tag {
        Tag::Null => TypeMask::Null.into(),
        Tag::Error => TypeMask::Error.into(),
        Tag::Bool => TypeMask::Bool.into(),
        Tag::Int => TypeMask::Int.into(),
        Tag::Double => TypeMask::Double.into(),
        Tag::String => TypeMask::String.into(),
    }
}

#[derive(Clone, Debug)]
enum Slot {
    Unbound,
    Scalar(Value),
    Map(Mlmv),
}

struct Frame {
    slots: Vec<Slot>,
    masks: Vec<BitFlags<TypeMask>>,
}

impl Frame {
    fn new(size: usize) -> Frame {
        Frame { slots: vec![Slot::Unbound; size], masks: vec![BitFlags::all(); size] }
    }

    fn ensure(&mut self, slot: usize) {
        if slot >= self.slots.len() {
            self.slots.resize(slot + 1, Slot::Unbound);
            self.masks.resize(slot + 1, BitFlags::all());
        }
    }
}

/// The stack of lexical frames live during evaluation of one record (plus
/// the end block). A fresh `Frames` starts with one root frame, matching
/// the teacher's `Env::root()`.
pub struct Frames {
    stack: Vec<Frame>,
}

impl Frames {
    pub fn new() -> Frames {
        Frames { stack: vec![Frame::new(0)] }
    }

    pub fn push_frame(&mut self, size: usize) {
        self.stack.push(Frame::new(size));
    }

    pub fn pop_frame(&mut self) {
        if self.stack.len() > 1 {
            self.stack.pop();
        }
    }

    /// Bind a slot for the first time in the *current* (innermost) frame,
    /// with an optional type-mask restriction on future assignment.
    pub fn define(&mut self, slot: usize, mask: BitFlags<TypeMask>, value: Value) {
        let frame = self.stack.last_mut().unwrap();
        frame.ensure(slot);
        frame.masks[slot] = mask;
        frame.slots[slot] = Slot::Scalar(value);
    }

    fn owning_frame_index(&self, slot: usize) -> Option<usize> {
        for (i, frame) in self.stack.iter().enumerate().rev() {
            if slot < frame.slots.len() && !matches!(frame.slots[slot], Slot::Unbound) {
                return Some(i);
            }
        }
        None
    }

    /// Overwrite a non-indexed local. Type-mask violations leave the slot
    /// untouched and report failure to the caller, which should surface a
    /// `Value::Error` at the call site rather than unwind.
    pub fn assign_nonindexed(&mut self, slot: usize, value: Value) -> bool {
        let idx = self.owning_frame_index(slot).unwrap_or(self.stack.len() - 1);
        let frame = &mut self.stack[idx];
        frame.ensure(slot);
        if !frame.masks[slot].contains(mask_for_tag(value.tag())) {
            return false;
        }
        frame.slots[slot] = Slot::Scalar(value);
        true
    }

    pub fn assign_indexed(&mut self, slot: usize, path: &[Value], value: Value) {
        let idx = self.owning_frame_index(slot).unwrap_or(self.stack.len() - 1);
        let frame = &mut self.stack[idx];
        frame.ensure(slot);
        if !matches!(frame.slots[slot], Slot::Map(_)) {
            frame.slots[slot] = Slot::Map(Mlmv::empty_map());
        }
        if let Slot::Map(m) = &mut frame.slots[slot] {
            m.put_value(path, value);
        }
    }

    pub fn assign_indexed_node(&mut self, slot: usize, path: &[Value], node: Mlmv) {
        let idx = self.owning_frame_index(slot).unwrap_or(self.stack.len() - 1);
        let frame = &mut self.stack[idx];
        frame.ensure(slot);
        if !matches!(frame.slots[slot], Slot::Map(_)) {
            frame.slots[slot] = Slot::Map(Mlmv::empty_map());
        }
        if let Slot::Map(m) = &mut frame.slots[slot] {
            m.put(path, node);
        }
    }

    pub fn assign_map(&mut self, slot: usize, node: Mlmv) {
        let idx = self.owning_frame_index(slot).unwrap_or(self.stack.len() - 1);
        let frame = &mut self.stack[idx];
        frame.ensure(slot);
        frame.slots[slot] = Slot::Map(node);
    }

    pub fn read_nonindexed(&self, slot: usize) -> Value {
        match self.owning_frame_index(slot) {
            Some(i) => match &self.stack[i].slots[slot] {
                Slot::Scalar(v) => v.clone(),
                Slot::Map(_) => Value::Error,
                Slot::Unbound => Value::Null,
            },
            None => Value::Null,
        }
    }

    pub fn read_indexed(&self, slot: usize, path: &[Value]) -> GetResult<'_> {
        match self.owning_frame_index(slot) {
            Some(i) => match &self.stack[i].slots[slot] {
                Slot::Map(m) => m.get(path),
                _ => GetResult::NotFound,
            },
            None => GetResult::NotFound,
        }
    }

    pub fn read_map_node(&self, slot: usize, path: &[Value]) -> Option<&Mlmv> {
        match self.owning_frame_index(slot) {
            Some(i) => match &self.stack[i].slots[slot] {
                Slot::Map(m) => m.get_node(path),
                _ => None,
            },
            None => None,
        }
    }
}

impl Default for Frames {
    fn default() -> Self {
        Frames::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn define_then_read() {
        let mut f = Frames::new();
        f.define(0, BitFlags::all(), Value::Int(5));
        assert!(matches!(f.read_nonindexed(0), Value::Int(5)));
    }

    #[test]
    fn type_mask_rejects_disallowed_tag() {
        let mut f = Frames::new();
        f.define(0, TypeMask::Int.into(), Value::Int(5));
        let ok = f.assign_nonindexed(0, Value::from_str("nope"));
        assert!(!ok);
        assert!(matches!(f.read_nonindexed(0), Value::Int(5)));
    }

    #[test]
    fn pop_frame_releases_inner_slots() {
        let mut f = Frames::new();
        f.define(0, BitFlags::all(), Value::Int(1));
        f.push_frame(1);
        f.define(0, BitFlags::all(), Value::Int(2));
        assert!(matches!(f.read_nonindexed(0), Value::Int(2)));
        f.pop_frame();
        assert!(matches!(f.read_nonindexed(0), Value::Int(1)));
    }

    #[test]
    fn indexed_local_put_get() {
        let mut f = Frames::new();
        f.assign_indexed(0, &[Value::Int(1)], Value::Int(9));
        match f.read_indexed(0, &[Value::Int(1)]) {
            GetResult::Found(Value::Int(9)) => {}
            other => panic!("unexpected {:?}", other),
        }
    }
}
