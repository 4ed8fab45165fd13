//! Generation-checked resource handles.
//!
//! GPU objects are owned by a slot arena and referenced through small
//! copyable ids. A handle carries the generation of the slot it was
//! minted from, so a stale handle (deleted, or deleted-and-reused
//! slot) simply fails the lookup instead of touching another caller's
//! resource. `NONE` is the always-valid "absent" sentinel; deleting it
//! is a no-op.

use std::marker::PhantomData;

pub struct Handle<T> {
    index: u32,
    generation: u32,
    _marker: PhantomData<fn() -> T>,
}

// Manual impls so `T` doesn't need the bounds.
impl<T> Copy for Handle<T> {}
impl<T> Clone for Handle<T> {
    fn clone(&self) -> Self {
        *self
    }
}
impl<T> PartialEq for Handle<T> {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index && self.generation == other.generation
    }
}
impl<T> Eq for Handle<T> {}
impl<T> std::fmt::Debug for Handle<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_none() {
            write!(f, "Handle(NONE)")
        } else {
            write!(f, "Handle({}v{})", self.index, self.generation)
        }
    }
}

impl<T> Handle<T> {
    /// The absent sentinel. Generation 0 is never minted.
    pub const NONE: Handle<T> = Handle {
        index: u32::MAX,
        generation: 0,
        _marker: PhantomData,
    };

    pub fn is_none(&self) -> bool {
        self.generation == 0
    }

    pub fn is_some(&self) -> bool {
        !self.is_none()
    }
}

impl<T> Default for Handle<T> {
    fn default() -> Self {
        Handle::NONE
    }
}

struct Slot<T> {
    generation: u32,
    value: Option<T>,
}

/// Slot arena backing one resource class.
pub struct Arena<T> {
    slots: Vec<Slot<T>>,
    free: Vec<u32>,
}

impl<T> Arena<T> {
    pub fn new() -> Self {
        Arena {
            slots: Vec::new(),
            free: Vec::new(),
        }
    }

    pub fn insert(&mut self, value: T) -> Handle<T> {
        match self.free.pop() {
            Some(index) => {
                let slot = &mut self.slots[index as usize];
                slot.value = Some(value);
                Handle {
                    index,
                    generation: slot.generation,
                    _marker: PhantomData,
                }
            }
            None => {
                let index = self.slots.len() as u32;
                self.slots.push(Slot {
                    generation: 1,
                    value: Some(value),
                });
                Handle {
                    index,
                    generation: 1,
                    _marker: PhantomData,
                }
            }
        }
    }

    pub fn get(&self, handle: Handle<T>) -> Option<&T> {
        let slot = self.slots.get(handle.index as usize)?;
        if slot.generation != handle.generation {
            return None;
        }
        slot.value.as_ref()
    }

    pub fn get_mut(&mut self, handle: Handle<T>) -> Option<&mut T> {
        let slot = self.slots.get_mut(handle.index as usize)?;
        if slot.generation != handle.generation {
            return None;
        }
        slot.value.as_mut()
    }

    /// Removes the value behind `handle`. Stale and `NONE` handles
    /// return `None` without disturbing anything, so redundant
    /// teardown sequences are safe.
    pub fn remove(&mut self, handle: Handle<T>) -> Option<T> {
        let slot = self.slots.get_mut(handle.index as usize)?;
        if slot.generation != handle.generation {
            return None;
        }
        let value = slot.value.take()?;
        slot.generation += 1;
        self.free.push(handle.index);
        Some(value)
    }

    /// Drops every value while keeping the slots, bumping generations
    /// so all outstanding handles go stale rather than aliasing
    /// whatever is inserted next.
    pub fn clear(&mut self) {
        self.free.clear();
        for (index, slot) in self.slots.iter_mut().enumerate() {
            if slot.value.take().is_some() {
                slot.generation += 1;
            }
            self.free.push(index as u32);
        }
    }
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Arena::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_get_remove() {
        let mut arena = Arena::new();
        let a = arena.insert("a");
        let b = arena.insert("b");
        assert_eq!(arena.get(a), Some(&"a"));
        assert_eq!(arena.get(b), Some(&"b"));

        assert_eq!(arena.remove(a), Some("a"));
        assert_eq!(arena.get(a), None);
        assert_eq!(arena.get(b), Some(&"b"));
    }

    #[test]
    fn double_remove_is_noop() {
        let mut arena = Arena::new();
        let a = arena.insert(1);
        assert_eq!(arena.remove(a), Some(1));
        assert_eq!(arena.remove(a), None);
        assert_eq!(arena.remove(Handle::NONE), None);
    }

    #[test]
    fn stale_handle_does_not_alias_reused_slot() {
        let mut arena = Arena::new();
        let a = arena.insert(1);
        arena.remove(a);

        let b = arena.insert(2);
        // Slot is reused, but the old handle must not see the new value.
        assert_eq!(arena.get(a), None);
        assert_eq!(arena.get(b), Some(&2));
    }

    #[test]
    fn clear_stales_every_outstanding_handle() {
        let mut arena = Arena::new();
        let a = arena.insert(1);
        let b = arena.insert(2);
        arena.clear();

        assert_eq!(arena.get(a), None);
        assert_eq!(arena.get(b), None);

        let c = arena.insert(3);
        assert_eq!(arena.get(c), Some(&3));
        assert_eq!(arena.get(a), None);
        assert_eq!(arena.get(b), None);
    }

    #[test]
    fn none_sentinel() {
        let none: Handle<u32> = Handle::NONE;
        assert!(none.is_none());
        assert_eq!(none, Handle::default());
    }
}
