use std::{cell::RefCell, collections::BTreeMap, rc::Rc};

use smallvec::SmallVec;

use crate::stream::{CompleteFn, ValueFn};

/// One registered subscriber. The completion side is `take`n on delivery, so a
/// subscriber's completion callback can only ever run once, no matter how many
/// completion turns reach the slot.
pub(crate) struct Slot<T> {
  pub(crate) on_value: ValueFn<T>,
  pub(crate) on_complete: Option<CompleteFn>,
}

/// Shared handle to a slot. Emission snapshots hold these, which is what lets
/// a subscriber removed between schedule time and fan-out still observe the
/// turn that was already scheduled for it.
pub(crate) type SlotRef<T> = Rc<RefCell<Slot<T>>>;

/// Subscriber registry keyed by a stable, monotonically increasing
/// subscription id. Ascending id order is registration order, which is the
/// fan-out order the hub guarantees; removal is by id only, never by callback
/// identity.
pub(crate) struct Registry<T> {
  next_id: usize,
  slots: BTreeMap<usize, SlotRef<T>>,
  closed: bool,
}

impl<T> Default for Registry<T> {
  fn default() -> Self { Registry { next_id: 0, slots: BTreeMap::new(), closed: false } }
}

impl<T> Registry<T> {
  pub(crate) fn add(&mut self, on_value: ValueFn<T>, on_complete: CompleteFn) -> usize {
    let id = self.next_id;
    self.next_id += 1;
    let slot = Slot { on_value, on_complete: Some(on_complete) };
    self.slots.insert(id, Rc::new(RefCell::new(slot)));
    id
  }

  pub(crate) fn remove(&mut self, id: usize) -> bool { self.slots.remove(&id).is_some() }

  /// Membership snapshot in registration order.
  pub(crate) fn snapshot(&self) -> SmallVec<[SlotRef<T>; 4]> {
    self.slots.values().cloned().collect()
  }

  /// Marks the hub completed. Returns `false` if it already was.
  pub(crate) fn close(&mut self) -> bool {
    let first = !self.closed;
    self.closed = true;
    first
  }

  pub(crate) fn is_closed(&self) -> bool { self.closed }

  pub(crate) fn len(&self) -> usize { self.slots.len() }
}
