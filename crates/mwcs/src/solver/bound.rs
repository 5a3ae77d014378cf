//! Shared best-known objective.

use std::sync::atomic::{AtomicU64, Ordering};

/// An `f64` that only ever goes up, shared by all workers as a pruning hint.
#[derive(Debug)]
pub struct AtomicBound(AtomicU64);

impl AtomicBound {
    pub fn new(value: f64) -> Self {
        Self(AtomicU64::new(value.to_bits()))
    }

    pub fn get(&self) -> f64 {
        f64::from_bits(self.0.load(Ordering::SeqCst))
    }

    /// Raise to `value` if larger; returns whether this call raised it.
    pub fn raise(&self, value: f64) -> bool {
        let mut current = self.0.load(Ordering::SeqCst);
        loop {
            if value.is_nan() || f64::from_bits(current) >= value {
                return false;
            }
            match self.0.compare_exchange(
                current,
                value.to_bits(),
                Ordering::SeqCst,
                Ordering::SeqCst,
            ) {
                Ok(_) => return true,
                Err(seen) => current = seen,
            }
        }
    }
}
