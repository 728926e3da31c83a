use std::rc::Rc;

use ahash::AHashMap;

use crate::value::Value;

/// What pushed a frame onto the environment stack.
///
/// Only `Function` matters to lookup (the opacity rule below); the other
/// kinds exist so blocks discard their locals on exit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FrameKind {
    Function,
    If,
    For,
    Try,
    Catch,
}

/// One scope on the stack: a kind plus name→value bindings.
#[derive(Debug, Clone)]
pub(crate) struct Frame {
    kind: FrameKind,
    bindings: AHashMap<Rc<str>, Value>,
}

impl Frame {
    fn new(kind: FrameKind) -> Self {
        Self {
            kind,
            bindings: AHashMap::new(),
        }
    }
}

/// The lexically scoped variable store.
///
/// An ordered stack of frames; the bottom frame is the root function frame
/// (`main`'s caller) and can never be popped.
///
/// Lookup (`get`) applies the function-opacity rule: a name found in a
/// `Function` frame is visible only when that frame is the innermost function
/// frame on the stack. Non-function frames are transparent, so a callee can
/// see block-scoped names of its caller but never the caller's function
/// locals. `set` deliberately does NOT apply the rule and updates the first
/// frame holding the name, function boundaries included — callers rely on
/// this asymmetry, so neither half may be "fixed" in isolation.
///
/// `snapshot` copies the frame spine and binding maps while sharing every
/// heap-backed value (strings, struct payloads, thunk cells), which is what
/// lets a thunk forced through one snapshot stay resolved in all of them.
#[derive(Debug, Clone)]
pub(crate) struct Environment {
    frames: Vec<Frame>,
}

impl Environment {
    pub fn new() -> Self {
        Self {
            frames: vec![Frame::new(FrameKind::Function)],
        }
    }

    pub fn push(&mut self, kind: FrameKind) {
        self.frames.push(Frame::new(kind));
    }

    /// # Panics
    /// Panics on an attempt to pop the root function frame; pushes and pops
    /// are balanced by the executor, so that is an interpreter bug.
    pub fn pop(&mut self) {
        assert!(self.frames.len() > 1, "cannot pop the root function frame");
        self.frames.pop();
    }

    /// Inserts into the top frame. Returns false if the name already exists
    /// there (redefinition in the same scope).
    pub fn create(&mut self, name: &Rc<str>, value: Value) -> bool {
        let top = self.frames.last_mut().expect("environment has a root frame");
        if top.bindings.contains_key(&**name) {
            return false;
        }
        top.bindings.insert(Rc::clone(name), value);
        true
    }

    /// Lexical lookup from the top frame down, honoring function opacity.
    pub fn get(&self, name: &str) -> Option<Value> {
        let innermost_function = self
            .frames
            .iter()
            .rposition(|frame| frame.kind == FrameKind::Function)
            .unwrap_or(0);
        for (index, frame) in self.frames.iter().enumerate().rev() {
            if let Some(value) = frame.bindings.get(name) {
                if frame.kind == FrameKind::Function && index != innermost_function {
                    continue;
                }
                return Some(*value);
            }
        }
        None
    }

    /// Updates the innermost existing binding, searching through function
    /// boundaries. Returns false if the name is bound nowhere.
    pub fn set(&mut self, name: &str, value: Value) -> bool {
        for frame in self.frames.iter_mut().rev() {
            if let Some(slot) = frame.bindings.get_mut(name) {
                *slot = value;
                return true;
            }
        }
        false
    }

    /// Structural copy of the frame spine for thunk capture. Bindings are
    /// copied by value; heap-backed payloads stay shared.
    pub fn snapshot(&self) -> Self {
        self.clone()
    }
}
