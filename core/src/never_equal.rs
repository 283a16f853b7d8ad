//! A wrapper that is never equal to anything
//!
//! Duplicate suppression compares state with `PartialEq`. Wrapping a field in
//! [`NeverEqual`] forces every emission through, which is how one-shot
//! signals (scroll to top, focus a field) travel through deduplicated state.

use std::ops::{Deref, DerefMut};

/// Value whose equality is always `false`
#[derive(Debug, Clone, Copy, Default)]
pub struct NeverEqual<T>(pub T);

impl<T> NeverEqual<T> {
    /// Wrap a value
    pub const fn new(value: T) -> Self {
        Self(value)
    }

    /// Unwrap the value
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> PartialEq for NeverEqual<T> {
    fn eq(&self, _other: &Self) -> bool {
        false
    }
}

impl<T> Deref for NeverEqual<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.0
    }
}

impl<T> DerefMut for NeverEqual<T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.0
    }
}

impl<T> From<T> for NeverEqual<T> {
    fn from(value: T) -> Self {
        Self(value)
    }
}
