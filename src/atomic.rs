//! Lock-free scalars backing control ports.
//!
//! Every port getter/setter reads or writes one of these, so a control thread
//! and the audio thread can never observe a half-written value.

use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};
use std::sync::Arc;

use atomic_float::AtomicF32;

/// Cache-line aligned atomic f32.
#[derive(Debug)]
#[repr(align(64))]
pub struct AtomicParam {
    value: AtomicF32,
}

impl AtomicParam {
    pub fn new(value: f32) -> Self {
        Self {
            value: AtomicF32::new(value),
        }
    }

    #[inline]
    pub fn get(&self) -> f32 {
        self.value.load(Ordering::Acquire)
    }

    #[inline]
    pub fn set(&self, value: f32) {
        self.value.store(value, Ordering::Release);
    }

    #[inline]
    pub fn swap(&self, value: f32) -> f32 {
        self.value.swap(value, Ordering::AcqRel)
    }
}

impl Default for AtomicParam {
    fn default() -> Self {
        Self::new(0.0)
    }
}

/// Cache-line aligned atomic i32.
#[derive(Debug, Default)]
#[repr(align(64))]
pub struct AtomicInt {
    value: AtomicI32,
}

impl AtomicInt {
    pub fn new(value: i32) -> Self {
        Self {
            value: AtomicI32::new(value),
        }
    }

    #[inline]
    pub fn get(&self) -> i32 {
        self.value.load(Ordering::Acquire)
    }

    #[inline]
    pub fn set(&self, value: i32) {
        self.value.store(value, Ordering::Release);
    }
}

/// Cache-line aligned atomic bool.
#[derive(Debug, Default)]
#[repr(align(64))]
pub struct AtomicFlag {
    value: AtomicBool,
}

impl AtomicFlag {
    pub fn new(value: bool) -> Self {
        Self {
            value: AtomicBool::new(value),
        }
    }

    #[inline]
    pub fn get(&self) -> bool {
        self.value.load(Ordering::Acquire)
    }

    #[inline]
    pub fn set(&self, value: bool) {
        self.value.store(value, Ordering::Release);
    }
}

/// Shared constant feeding an unconnected unit input.
///
/// The engine reads it once per block; any thread may write it.
pub type ControlValue = Arc<AtomicParam>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn param_swap_returns_previous() {
        let p = AtomicParam::new(0.25);
        assert_eq!(p.swap(0.75), 0.25);
        assert_eq!(p.get(), 0.75);
    }

    #[test]
    fn shared_control_value_is_visible_across_clones() {
        let value: ControlValue = Arc::new(AtomicParam::new(1.0));
        let other = Arc::clone(&value);
        other.set(3.5);
        assert_eq!(value.get(), 3.5);
    }

    #[test]
    fn int_and_flag_round_trip() {
        let i = AtomicInt::new(2);
        i.set(-4);
        assert_eq!(i.get(), -4);

        let f = AtomicFlag::default();
        assert!(!f.get());
        f.set(true);
        assert!(f.get());
    }
}
