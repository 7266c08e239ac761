//! Identifiers for classes and instances.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_CLASS_ID: AtomicU64 = AtomicU64::new(1);
static NEXT_INSTANCE_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of a class. Unique for the lifetime of the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClassId(u64);

impl ClassId {
    pub(crate) fn next() -> Self {
        Self(NEXT_CLASS_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Create a class ID from raw u64.
    pub const fn from_raw(id: u64) -> Self {
        Self(id)
    }

    /// Get the raw u64 value.
    pub const fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ClassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "class-{}", self.0)
    }
}

/// Identity of an instance, usable to namespace external listeners.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstanceId(u64);

impl InstanceId {
    pub(crate) fn next() -> Self {
        Self(NEXT_INSTANCE_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Create an instance ID from raw u64.
    pub const fn from_raw(id: u64) -> Self {
        Self(id)
    }

    /// Get the raw u64 value.
    pub const fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "widget-{}", self.0)
    }
}
