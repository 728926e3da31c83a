use std::rc::Rc;

use indexmap::IndexMap;

use crate::{environment::Environment, expressions::ExprRef, prepare::StructId, value::Value};

/// Index of a value stored in the [`Heap`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct HeapId(u32);

impl HeapId {
    fn new(index: usize) -> Self {
        Self(index.try_into().expect("heap exceeded u32 slots"))
    }

    fn index(self) -> usize {
        self.0 as usize
    }
}

/// Ordered field map of a struct instance, in declared order.
pub(crate) type FieldMap = IndexMap<Rc<str>, Value, ahash::RandomState>;

/// A live struct instance: its nominal type plus mutable fields.
///
/// Instances are aliased freely — every `Value::Struct` copy of the same
/// `HeapId` observes the same mutations — and may form cycles (linked lists);
/// equality stays on ids, never contents, so cycles cannot recurse.
#[derive(Debug)]
pub(crate) struct StructValue {
    pub ty: StructId,
    pub fields: FieldMap,
}

/// A suspended expression with its captured environment and memo slot (v4).
#[derive(Debug)]
pub(crate) struct ThunkCell {
    pub expr: ExprRef,
    /// Environment snapshot taken where the thunk was created. Consumed by
    /// the first force; `None` afterwards (and while forcing is in flight).
    pub captured: Option<Environment>,
    pub state: ThunkState,
}

/// Memo slot of a thunk. Once `Resolved` or `Raised` it never changes again:
/// re-forcing yields the cached value or re-raises the same tag.
#[derive(Debug, Clone)]
pub(crate) enum ThunkState {
    Pending,
    Resolved(Value),
    Raised(String),
}

#[derive(Debug)]
pub(crate) enum HeapData {
    Str(String),
    Struct(StructValue),
    Thunk(ThunkCell),
}

/// Arena for all heap-allocated runtime data of one run.
///
/// Slots are append-only: values live for the duration of the run, which is
/// bounded, so there is no collector and ids are never recycled.
#[derive(Debug, Default)]
pub(crate) struct Heap {
    slots: Vec<HeapData>,
}

impl Heap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alloc(&mut self, data: HeapData) -> HeapId {
        let id = HeapId::new(self.slots.len());
        self.slots.push(data);
        id
    }

    pub fn alloc_str(&mut self, s: impl Into<String>) -> HeapId {
        self.alloc(HeapData::Str(s.into()))
    }

    pub fn alloc_struct(&mut self, ty: StructId, fields: impl IntoIterator<Item = (Rc<str>, Value)>) -> HeapId {
        let fields: FieldMap = fields.into_iter().collect();
        self.alloc(HeapData::Struct(StructValue { ty, fields }))
    }

    pub fn alloc_thunk(&mut self, expr: ExprRef, captured: Environment) -> HeapId {
        self.alloc(HeapData::Thunk(ThunkCell {
            expr,
            captured: Some(captured),
            state: ThunkState::Pending,
        }))
    }

    pub fn str(&self, id: HeapId) -> &str {
        match &self.slots[id.index()] {
            HeapData::Str(s) => s,
            other => panic!("heap slot {id:?} is not a string: {other:?}"),
        }
    }

    pub fn struct_value(&self, id: HeapId) -> &StructValue {
        match &self.slots[id.index()] {
            HeapData::Struct(s) => s,
            other => panic!("heap slot {id:?} is not a struct: {other:?}"),
        }
    }

    pub fn struct_value_mut(&mut self, id: HeapId) -> &mut StructValue {
        match &mut self.slots[id.index()] {
            HeapData::Struct(s) => s,
            other => panic!("heap slot {id:?} is not a struct: {other:?}"),
        }
    }

    pub fn thunk(&self, id: HeapId) -> &ThunkCell {
        match &self.slots[id.index()] {
            HeapData::Thunk(t) => t,
            other => panic!("heap slot {id:?} is not a thunk: {other:?}"),
        }
    }

    pub fn thunk_mut(&mut self, id: HeapId) -> &mut ThunkCell {
        match &mut self.slots[id.index()] {
            HeapData::Thunk(t) => t,
            other => panic!("heap slot {id:?} is not a thunk: {other:?}"),
        }
    }
}
