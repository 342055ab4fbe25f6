use smallvec::SmallVec;

use crate::server::{Request, Response};

/// Handler arities up to this size are bound without heap allocation.
pub const MAX_INLINE_ARGS: usize = 8;

/// One positional handler argument.
#[derive(Debug, Clone, Copy, Default)]
pub enum Arg<'a> {
    /// No request parameter matched this position.
    #[default]
    Unbound,
    Value(&'a str),
    Request(&'a Request),
    Response(&'a Response),
}

/// Positional argument array handed to a handler method, sized to the
/// method's declared parameter count.
#[derive(Debug)]
pub struct Arguments<'a> {
    slots: SmallVec<[Arg<'a>; MAX_INLINE_ARGS]>,
    joined: SmallVec<[(usize, String); MAX_INLINE_ARGS]>,
}

impl<'a> Arguments<'a> {
    /// `len` unbound slots.
    #[must_use]
    pub fn with_len(len: usize) -> Self {
        Self {
            slots: SmallVec::from_elem(Arg::Unbound, len),
            joined: SmallVec::new(),
        }
    }

    /// Place an argument; out-of-range indices are ignored.
    pub fn set(&mut self, index: usize, arg: Arg<'a>) {
        if let Some(slot) = self.slots.get_mut(index) {
            *slot = arg;
            self.joined.retain(|(i, _)| *i != index);
        }
    }

    /// Place an owned string value (e.g. multi-valued parameters joined
    /// with `,`).
    pub fn set_owned(&mut self, index: usize, value: String) {
        if let Some(slot) = self.slots.get_mut(index) {
            *slot = Arg::Unbound;
            self.joined.retain(|(i, _)| *i != index);
            self.joined.push((index, value));
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Raw slot. Owned values show up as [`Arg::Value`] borrowing from `self`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<Arg<'_>> {
        if let Some(value) = self.owned(index) {
            return Some(Arg::Value(value));
        }
        self.slots.get(index).copied()
    }

    /// String value at `index`, if a request parameter was bound there.
    #[must_use]
    pub fn value(&self, index: usize) -> Option<&str> {
        match self.get(index)? {
            Arg::Value(v) => Some(v),
            _ => None,
        }
    }

    #[must_use]
    pub fn request(&self, index: usize) -> Option<&'a Request> {
        match self.slots.get(index)? {
            Arg::Request(r) => Some(r),
            _ => None,
        }
    }

    #[must_use]
    pub fn response(&self, index: usize) -> Option<&'a Response> {
        match self.slots.get(index)? {
            Arg::Response(r) => Some(r),
            _ => None,
        }
    }

    /// Whether nothing was bound at `index`.
    #[must_use]
    pub fn is_unbound(&self, index: usize) -> bool {
        matches!(self.get(index), Some(Arg::Unbound))
    }

    fn owned(&self, index: usize) -> Option<&str> {
        self.joined
            .iter()
            .find(|(i, _)| *i == index)
            .map(|(_, v)| v.as_str())
    }
}
