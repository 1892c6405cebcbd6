//! Transient per-pass buffers: one slot per unit, one entry per sample.

use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::error::{check_in_range, check_len, Result};

/// Allocates `unit_count` zeroed slots of `batch_size` samples each.
pub fn zeroed(unit_count: usize, batch_size: usize) -> Vec<Vec<f64>> {
    vec![vec![0.0; batch_size]; unit_count]
}

/// Error slots shared by all units of a backward wave.
///
/// The only cross-unit writes in the engine go through here: a unit that
/// propagates further adds its contributions into upstream slots, which
/// siblings in the same wave may also be writing. All access is serialised
/// by one lock.
pub struct SharedErrors<'a> {
    slots: Mutex<&'a mut [Vec<f64>]>,
    len: usize,
}

impl<'a> SharedErrors<'a> {
    pub fn new(slots: &'a mut [Vec<f64>]) -> SharedErrors<'a> {
        let len = slots.len();
        SharedErrors { slots: Mutex::new(slots), len }
    }

    /// Number of unit slots.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    fn lock(&self) -> MutexGuard<'_, &'a mut [Vec<f64>]> {
        // A panicking writer cannot leave a slot half-merged in a way later
        // readers could detect, so poisoning is not propagated.
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Copy of one unit's slot.
    pub fn slot(&self, index: usize) -> Vec<f64> {
        self.lock()[index].clone()
    }

    /// Sets one unit's slot to all zeros.
    pub fn zero(&self, index: usize) {
        self.lock()[index].iter_mut().for_each(|e| *e = 0.0);
    }

    /// Adds `contribution` element-wise into slot `index`.
    pub fn accumulate(&self, index: usize, contribution: &[f64]) {
        let mut slots = self.lock();
        add_assign(&mut slots[index], contribution);
    }

    /// Merges every contribution and zeroes `consumed` in one critical
    /// section.
    pub(crate) fn commit(&self, consumed: usize, contributions: &[(usize, Vec<f64>)]) {
        let mut slots = self.lock();
        for (target, contribution) in contributions {
            add_assign(&mut slots[*target], contribution);
        }
        slots[consumed].iter_mut().for_each(|e| *e = 0.0);
    }

    /// Verifies that each index has a slot of exactly `batch_size` samples.
    pub(crate) fn check_slots<I>(&self, indices: I, batch_size: usize) -> Result<()>
    where
        I: IntoIterator<Item = usize>,
    {
        let slots = self.lock();
        for index in indices {
            check_in_range(index, slots.len())?;
            check_len("error slot", batch_size, slots[index].len())?;
        }
        Ok(())
    }

    pub fn into_inner(self) -> &'a mut [Vec<f64>] {
        self.slots.into_inner().unwrap_or_else(PoisonError::into_inner)
    }
}

fn add_assign(target: &mut [f64], source: &[f64]) {
    for (t, s) in target.iter_mut().zip(source) {
        *t += s;
    }
}
