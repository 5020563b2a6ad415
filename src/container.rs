//! A mutable slot holding a rope.
//!
//! Strings that change over time are a [`RopeSlot`] whose rope gets swapped
//! for a new one. Ropes handed out by [`RopeSlot::get`] are never affected by
//! later swaps.

use std::sync::PoisonError;
use std::sync::RwLock;

use crate::error::Result;
use crate::node::Rope;

pub struct RopeSlot {
    slot: RwLock<Rope>,
}

impl RopeSlot {
    pub fn new(rope: Rope) -> RopeSlot {
        return RopeSlot { slot: RwLock::new(rope) };
    }

    /// The current rope.
    pub fn get(&self) -> Rope {
        return self.slot.read().unwrap_or_else(PoisonError::into_inner).clone();
    }

    /// Swap in `rope`, returning the previous one.
    pub fn replace(&self, rope: Rope) -> Rope {
        let mut slot = self.slot.write().unwrap_or_else(PoisonError::into_inner);
        return std::mem::replace(&mut *slot, rope);
    }

    /// Concatenate `suffix` onto the current rope. On error the slot is left
    /// as it was.
    pub fn append(&self, suffix: &Rope) -> Result<()> {
        return self.update(|current| current.concat(suffix));
    }

    /// Replace the rope with `f(current)` under the write lock, so no other
    /// update can interleave.
    pub fn update(&self, f: impl FnOnce(&Rope) -> Result<Rope>) -> Result<()> {
        let mut slot = self.slot.write().unwrap_or_else(PoisonError::into_inner);
        *slot = f(&slot)?;
        return Ok(());
    }

    pub fn byte_len(&self) -> usize {
        return self.slot.read().unwrap_or_else(PoisonError::into_inner).byte_len();
    }

    pub fn into_inner(self) -> Rope {
        return self.slot.into_inner().unwrap_or_else(PoisonError::into_inner);
    }
}

impl Default for RopeSlot {
    fn default() -> Self {
        return RopeSlot::new(Rope::empty(encodings::UTF_8));
    }
}

impl std::fmt::Debug for RopeSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        return f.debug_struct("RopeSlot").field("rope", &self.get()).finish();
    }
}
