// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Counter cell shared between an interrupt handler and the control loop.
//!
//! Exactly one context writes (the edge interrupt) and exactly one reads (the control loop).
//! Only plain atomic loads and stores are used, so this also works on cores without
//! read-modify-write atomics.

use core::sync::atomic::{AtomicI32, Ordering};

/// Word-sized signed counter with a single-writer/single-reader access discipline.
pub struct SharedCount {
    value: AtomicI32,
}

impl SharedCount {
    pub const fn new(value: i32) -> Self {
        Self {
            value: AtomicI32::new(value),
        }
    }

    /// Read the latest published value.
    #[inline]
    pub fn fetch(&self) -> i32 {
        self.value.load(Ordering::Acquire)
    }

    /// Publish a new value. Only the owning writer context may call this.
    #[inline]
    pub fn store(&self, value: i32) {
        self.value.store(value, Ordering::Release);
    }
}

impl Default for SharedCount {
    fn default() -> Self {
        Self::new(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fetch_sees_store() {
        let c = SharedCount::new(7);
        assert_eq!(c.fetch(), 7);
        c.store(-3);
        assert_eq!(c.fetch(), -3);
    }

    #[test]
    fn usable_as_static() {
        static COUNT: SharedCount = SharedCount::new(0);
        COUNT.store(i32::MAX);
        assert_eq!(COUNT.fetch(), i32::MAX);
    }
}
