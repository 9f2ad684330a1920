//! Pre-sized, write-once result slots.
//!
//! Workers finish in any order; each writes its result into the slot of the
//! index it processed, and the joining thread reads the slots back in index
//! order. That is the whole ordering mechanism.

use std::cell::UnsafeCell;

/// One slot per input index, each written at most once.
pub(crate) struct ResultSlots<R> {
    slots: Box<[UnsafeCell<Option<R>>]>,
}

// SAFETY: slots are only written through `write`, whose contract gives every
// index a single writer, and only read after `into_vec` takes ownership,
// which requires all writers to be joined. Values cross threads, hence
// `R: Send`.
unsafe impl<R: Send> Sync for ResultSlots<R> {}

impl<R> ResultSlots<R> {
    pub(crate) fn new(len: usize) -> Self {
        Self {
            slots: (0..len).map(|_| UnsafeCell::new(None)).collect(),
        }
    }

    /// Store the result for `index`.
    ///
    /// # Safety
    ///
    /// No other thread may access slot `index` while this runs, and each
    /// index may be written at most once per operation.
    pub(crate) unsafe fn write(&self, index: usize, value: R) {
        // SAFETY: exclusive access to this slot is guaranteed by the caller.
        unsafe {
            *self.slots[index].get() = Some(value);
        }
    }

    /// Read all slots in index order.
    ///
    /// Returns the first unwritten index if any slot is empty.
    pub(crate) fn into_vec(self) -> Result<Vec<R>, usize> {
        self.slots
            .into_vec()
            .into_iter()
            .enumerate()
            .map(|(index, slot)| slot.into_inner().ok_or(index))
            .collect()
    }
}
