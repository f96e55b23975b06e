// SPDX-License-Identifier: EUPL-1.2 OR GPL-3.0-or-later
// Copyright Contributors to the sdb project.

//! Fixed-capacity pool of expression watchpoints.
//!
//! Every slot of the pool is, at all times, either on the free stack or on
//! the active list. The active list is kept in insertion order through index
//! links, which makes both allocation and deletion at any position `O(1)`.
//!
//! # Example
//!
//! ```rust
//! use sdb::watchpoint::{WatchpointId, WatchpointPool};
//!
//! let mut pool = WatchpointPool::new(2);
//! let x = pool.allocate("x").unwrap();
//! let y = pool.allocate("y").unwrap();
//! assert_eq!((x, y), (WatchpointId(0), WatchpointId(1)));
//! assert!(pool.allocate("z").is_err());
//!
//! pool.deallocate(x).unwrap();
//! let ids = pool.iter().map(|wp| wp.id).collect::<Vec<_>>();
//! assert_eq!(ids, [y]);
//! ```


/// Number of watchpoint slots when none is configured.
pub const DEFAULT_CAPACITY: usize = 32;

/// Longest accepted watchpoint expression, in bytes.
pub const MAX_EXPRESSION_LEN: usize = 128;

/// Stable identity of a watchpoint slot.
///
/// Assigned once when the pool is created and reused only after the slot is
/// freed again.
#[derive(Copy, Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[repr(transparent)]
pub struct WatchpointId(pub usize);

impl std::fmt::Display for WatchpointId {
    fn fmt(&self, fmt: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(fmt, "{}", self.0)
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum WatchpointError {
    /// Every slot is in use.
    PoolExhausted { capacity: usize },
    /// No active watchpoint has this id.
    NotFound(WatchpointId),
}

impl std::fmt::Display for WatchpointError {
    fn fmt(&self, fmt: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::PoolExhausted { capacity } => {
                write!(fmt, "watchpoint pool is full ({} in use)", capacity)
            }
            Self::NotFound(id) => write!(fmt, "no watchpoint number {}", id),
        }
    }
}

impl std::error::Error for WatchpointError {}

#[derive(Debug)]
struct Slot {
    id: WatchpointId,
    expression: String,
    last_value: u64,
    active: bool,
    prev: Option<usize>,
    next: Option<usize>,
}

impl Slot {
    const fn new(index: usize) -> Self {
        Self {
            id: WatchpointId(index),
            expression: String::new(),
            last_value: 0,
            active: false,
            prev: None,
            next: None,
        }
    }
}

/// Read-only view of an active watchpoint.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct WatchpointSnapshot<'a> {
    pub id: WatchpointId,
    pub expression: &'a str,
    pub last_value: u64,
}

/// Outcome of evaluating one watchpoint during a scan.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum WatchEvent<E> {
    /// The expression evaluated to a value different from the last one.
    Changed {
        id: WatchpointId,
        expression: String,
        new_value: u64,
        old_value: u64,
    },
    /// The expression could not be evaluated; its last value is kept.
    Invalid {
        id: WatchpointId,
        expression: String,
        error: E,
    },
}

/// Events produced by [`WatchpointPool::scan_for_changes`], in active-list
/// order.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ScanReport<E> {
    pub events: Vec<WatchEvent<E>>,
}

impl<E> ScanReport<E> {
    /// Whether execution must stop after this scan, i.e. at least one value
    /// changed.
    pub fn halt(&self) -> bool {
        self.events
            .iter()
            .any(|event| matches!(event, WatchEvent::Changed { .. }))
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

#[derive(Debug)]
pub struct WatchpointPool {
    slots: Box<[Slot]>,
    /// Free slot indices; the next allocation pops from the end.
    free: Vec<usize>,
    head: Option<usize>,
    tail: Option<usize>,
    len: usize,
}

impl Default for WatchpointPool {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl WatchpointPool {
    /// Creates a pool of `capacity` free slots with ids `0..capacity`.
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: (0..capacity).map(Slot::new).collect(),
            // Reversed so that slots are first handed out in index order.
            free: (0..capacity).rev().collect(),
            head: None,
            tail: None,
            len: 0,
        }
    }

    /// Discards every watchpoint and returns all slots to the free list.
    pub fn reset(&mut self) {
        log::debug!("Resetting watchpoint pool, dropping {} watchpoints", self.len);
        *self = Self::new(self.capacity());
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of active watchpoints.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Installs a watchpoint on `expression` at the end of the active list.
    ///
    /// The expression is not validated here; a malformed expression is
    /// reported by every scan instead.
    pub fn allocate(&mut self, expression: &str) -> Result<WatchpointId, WatchpointError> {
        let index = self.free.pop().ok_or(WatchpointError::PoolExhausted {
            capacity: self.capacity(),
        })?;
        let id = {
            let slot = &mut self.slots[index];
            debug_assert!(!slot.active);
            slot.expression.clear();
            slot.expression.push_str(expression);
            slot.last_value = 0;
            slot.active = true;
            slot.prev = self.tail;
            slot.next = None;
            slot.id
        };
        match self.tail {
            Some(tail) => self.slots[tail].next = Some(index),
            None => self.head = Some(index),
        }
        self.tail = Some(index);
        self.len += 1;
        log::debug!("Allocated watchpoint {} on {:?}", id, expression);
        Ok(id)
    }

    /// Removes the active watchpoint `id` and returns its slot to the free
    /// list.
    pub fn deallocate(&mut self, id: WatchpointId) -> Result<(), WatchpointError> {
        let index = id.0;
        let (prev, next) = match self.slots.get(index) {
            Some(slot) if slot.active => (slot.prev, slot.next),
            _ => return Err(WatchpointError::NotFound(id)),
        };
        match prev {
            Some(prev) => self.slots[prev].next = next,
            None => self.head = next,
        }
        match next {
            Some(next) => self.slots[next].prev = prev,
            None => self.tail = prev,
        }
        let slot = &mut self.slots[index];
        slot.active = false;
        slot.prev = None;
        slot.next = None;
        slot.expression.clear();
        self.free.push(index);
        self.len -= 1;
        log::debug!("Freed watchpoint {}", id);
        Ok(())
    }

    /// Returns the active watchpoint `id`, if any.
    pub fn get(&self, id: WatchpointId) -> Option<WatchpointSnapshot<'_>> {
        self.slots
            .get(id.0)
            .filter(|slot| slot.active)
            .map(Slot::snapshot)
    }

    /// Iterates over active watchpoints in creation order.
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            pool: self,
            cursor: self.head,
        }
    }

    /// Re-evaluates every active watchpoint with `evaluate` and records the
    /// ones whose value changed.
    ///
    /// All watchpoints are evaluated even if an earlier one changed or
    /// failed to evaluate.
    pub fn scan_for_changes<E>(
        &mut self,
        mut evaluate: impl FnMut(&str) -> Result<u64, E>,
    ) -> ScanReport<E> {
        let mut events = vec![];
        let mut cursor = self.head;
        while let Some(index) = cursor {
            let slot = &mut self.slots[index];
            cursor = slot.next;
            match evaluate(slot.expression.as_str()) {
                Ok(new_value) if new_value != slot.last_value => {
                    log::trace!(
                        "Watchpoint {} changed: {} -> {}",
                        slot.id,
                        slot.last_value,
                        new_value
                    );
                    events.push(WatchEvent::Changed {
                        id: slot.id,
                        expression: slot.expression.clone(),
                        new_value,
                        old_value: slot.last_value,
                    });
                    slot.last_value = new_value;
                }
                Ok(_) => {}
                Err(error) => events.push(WatchEvent::Invalid {
                    id: slot.id,
                    expression: slot.expression.clone(),
                    error,
                }),
            }
        }
        ScanReport { events }
    }
}

impl Slot {
    fn snapshot(&self) -> WatchpointSnapshot<'_> {
        WatchpointSnapshot {
            id: self.id,
            expression: &self.expression,
            last_value: self.last_value,
        }
    }
}

impl<'a> IntoIterator for &'a WatchpointPool {
    type Item = WatchpointSnapshot<'a>;
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over active watchpoints, see [`WatchpointPool::iter`].
#[derive(Clone, Debug)]
pub struct Iter<'a> {
    pool: &'a WatchpointPool,
    cursor: Option<usize>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = WatchpointSnapshot<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let slot = &self.pool.slots[self.cursor?];
        self.cursor = slot.next;
        Some(slot.snapshot())
    }
}
