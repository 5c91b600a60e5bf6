//! Per-property memoization cell.

/// A lazily computed value that is either set or explicitly invalid.
///
/// Unlike a sentinel float, an unset cell is never confused with a cached
/// zero. One cell belongs to exactly one state object and is not shared
/// across threads.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedValue<T> {
    value: Option<T>,
}

impl<T> Default for CachedValue<T> {
    fn default() -> Self {
        Self { value: None }
    }
}

impl<T> CachedValue<T> {
    /// Create an unset cell.
    pub const fn new() -> Self {
        Self { value: None }
    }

    pub fn is_set(&self) -> bool {
        self.value.is_some()
    }

    /// Store a value and mark the cell valid.
    pub fn set(&mut self, value: T) {
        self.value = Some(value);
    }

    /// Mark the cell invalid.
    pub fn invalidate(&mut self) {
        self.value = None;
    }

    /// Borrow the cached value, `None` when unset.
    pub fn as_ref(&self) -> Option<&T> {
        self.value.as_ref()
    }
}

impl<T: Copy> CachedValue<T> {
    /// The cached value, `None` when unset.
    pub fn get(&self) -> Option<T> {
        self.value
    }
}
