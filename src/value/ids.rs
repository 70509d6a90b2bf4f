//! Keys for controller collections and callback subscriptions.

use std::fmt;

/// Key of a constant value inside one controller.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct ConstantKey(pub u32);

/// Key of a dynamic value inside one controller.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct DynamicKey(pub u32);

/// Handle returned by a callback subscription, used to unsubscribe.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct CallbackId(pub u64);

impl fmt::Display for ConstantKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl fmt::Display for DynamicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Monotonic key allocator. Keys start at 1 and are never handed out twice,
/// even after the entries they named have been removed.
#[derive(Default, Debug)]
pub struct KeyAllocator {
    last_constant: u32,
    last_dynamic: u32,
}

impl KeyAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn alloc_constant(&mut self) -> ConstantKey {
        self.last_constant += 1;
        ConstantKey(self.last_constant)
    }

    #[inline]
    pub fn alloc_dynamic(&mut self) -> DynamicKey {
        self.last_dynamic += 1;
        DynamicKey(self.last_dynamic)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alloc_starts_at_one() {
        let mut alloc = KeyAllocator::new();
        assert_eq!(alloc.alloc_constant(), ConstantKey(1));
        assert_eq!(alloc.alloc_dynamic(), DynamicKey(1));
    }

    #[test]
    fn test_alloc_collections_are_independent() {
        let mut alloc = KeyAllocator::new();
        assert_eq!(alloc.alloc_constant(), ConstantKey(1));
        assert_eq!(alloc.alloc_constant(), ConstantKey(2));
        assert_eq!(alloc.alloc_dynamic(), DynamicKey(1));
        assert_eq!(alloc.alloc_constant(), ConstantKey(3));
        assert_eq!(alloc.alloc_dynamic(), DynamicKey(2));
    }

    #[test]
    fn test_key_display() {
        assert_eq!(DynamicKey(7).to_string(), "#7");
        assert_eq!(ConstantKey(12).to_string(), "#12");
    }
}
