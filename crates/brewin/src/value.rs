use crate::{
    heap::{Heap, HeapId},
    prepare::StructId,
};

/// Primary value type representing Brewin values at runtime.
///
/// Small immediate values are stored inline; strings, struct payloads and
/// thunk cells live in the [`Heap`] arena and are referenced by id. That keeps
/// `Value` `Copy`, so environment snapshots duplicate the frame spine while
/// every copy keeps aliasing the same heap object — exactly the sharing the
/// language needs for struct mutation and thunk memoization.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Value {
    Nil,
    /// The v3 "no value" result of void functions. Distinct from `Nil`: void
    /// may not be printed, compared, or assigned.
    Void,
    Bool(bool),
    Int(i64),
    /// An immutable string stored in the arena.
    Str(HeapId),
    /// A live struct instance; compares by identity.
    Struct(HeapId),
    /// A struct-typed slot currently holding nil (v3). Keeps its declared
    /// type so assignment checks still know what the slot accepts.
    StructNil(StructId),
    /// A deferred computation (v4). Never observable by the language: every
    /// operation that inspects a value forces it first.
    Thunk(HeapId),
}

/// Runtime type tag, used by operator checks and the v3 compatibility matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Type {
    Int,
    Bool,
    Str,
    Nil,
    Void,
    Struct(StructId),
}

impl Type {
    /// The declared-type universe of v3 (`int|bool|string|void`), excluding
    /// nil and struct types.
    pub fn is_primitive(self) -> bool {
        matches!(self, Self::Int | Self::Bool | Self::Str | Self::Void)
    }
}

impl Value {
    /// Returns the runtime type tag.
    ///
    /// # Panics
    /// Panics on an unforced thunk: forcing before inspection is an evaluator
    /// invariant, not something a program can reach.
    pub fn type_of(self, heap: &Heap) -> Type {
        match self {
            Self::Nil => Type::Nil,
            Self::Void => Type::Void,
            Self::Bool(_) => Type::Bool,
            Self::Int(_) => Type::Int,
            Self::Str(_) => Type::Str,
            Self::Struct(id) => Type::Struct(heap.struct_value(id).ty),
            Self::StructNil(ty) => Type::Struct(ty),
            Self::Thunk(_) => panic!("thunk must be forced before inspecting its type"),
        }
    }

    /// Nil literal or a nil-valued struct slot.
    pub fn is_nil(self) -> bool {
        matches!(self, Self::Nil | Self::StructNil(_))
    }

    /// Value equality for the untyped dialects (v1/v2/v4): same-type compares
    /// by value, struct values by identity, mismatched types are unequal.
    pub fn eq_untyped(self, other: Self, heap: &Heap) -> bool {
        match (self, other) {
            (Self::Nil, Self::Nil) | (Self::Void, Self::Void) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Str(a), Self::Str(b)) => a == b || heap.str(a) == heap.str(b),
            (Self::Struct(a), Self::Struct(b)) => a == b,
            (Self::StructNil(_), Self::StructNil(_) | Self::Nil) | (Self::Nil, Self::StructNil(_)) => true,
            _ => false,
        }
    }

    /// The v3 Int→Bool view: zero is false, anything else true. Other values
    /// pass through unchanged.
    pub fn coerce_int_to_bool(self) -> Self {
        if let Self::Int(i) = self { Self::Bool(i != 0) } else { self }
    }

    /// The printable form used by `print` and input prompts.
    ///
    /// Struct values (and unforced thunks) have none; the caller reports the
    /// type error.
    pub fn printable(self, heap: &Heap) -> Option<String> {
        match self {
            Self::Int(i) => Some(i.to_string()),
            Self::Str(id) => Some(heap.str(id).to_owned()),
            Self::Bool(true) => Some("true".to_owned()),
            Self::Bool(false) => Some("false".to_owned()),
            Self::Nil | Self::StructNil(_) => Some("nil".to_owned()),
            Self::Void => Some("void".to_owned()),
            Self::Struct(_) | Self::Thunk(_) => None,
        }
    }
}

/// The default value of a declared type: 0, false, "", void, or a nil-typed
/// struct slot.
pub(crate) fn default_value(ty: Type, heap: &mut Heap) -> Value {
    match ty {
        Type::Int => Value::Int(0),
        Type::Bool => Value::Bool(false),
        Type::Str => Value::Str(heap.alloc_str("")),
        Type::Nil => Value::Nil,
        Type::Void => Value::Void,
        Type::Struct(id) => Value::StructNil(id),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn untyped_equality_mismatched_types_is_false() {
        let heap = Heap::new();
        assert!(!Value::Int(0).eq_untyped(Value::Bool(false), &heap));
        assert!(!Value::Int(1).eq_untyped(Value::Nil, &heap));
        assert!(Value::Nil.eq_untyped(Value::Nil, &heap));
    }

    #[test]
    fn strings_compare_by_contents() {
        let mut heap = Heap::new();
        let a = Value::Str(heap.alloc_str("abc"));
        let b = Value::Str(heap.alloc_str("abc"));
        let c = Value::Str(heap.alloc_str("abd"));
        assert!(a.eq_untyped(b, &heap));
        assert!(!a.eq_untyped(c, &heap));
    }

    #[test]
    fn struct_values_compare_by_identity() {
        let mut heap = Heap::new();
        let ty = StructId::new(0);
        let no_fields = Vec::<(std::rc::Rc<str>, Value)>::new();
        let a = Value::Struct(heap.alloc_struct(ty, no_fields.clone()));
        let b = Value::Struct(heap.alloc_struct(ty, no_fields));
        assert!(a.eq_untyped(a, &heap));
        assert!(!a.eq_untyped(b, &heap));
    }
}
