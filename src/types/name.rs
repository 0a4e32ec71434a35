// ABOUTME: Phantom-typed resource names for compile-time type safety.
// ABOUTME: Prevents passing a pod name where a workload name is expected.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

/// Marker types for phantom type parameters.
/// Empty enums cannot be instantiated and need no trait bounds.
pub enum WorkloadMarker {}
pub enum PodMarker {}

/// A cluster resource name tagged with the kind of resource it names.
///
/// An empty name is representable on purpose: a workload spec handed to the
/// updater without a name is a validation no-op, not a parse failure.
#[must_use = "names reference cluster resources and should not be ignored"]
pub struct Name<T> {
    value: String,
    _marker: PhantomData<T>,
}

impl<T> Name<T> {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            _marker: PhantomData,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.value
    }

    pub fn is_empty(&self) -> bool {
        self.value.trim().is_empty()
    }

    pub fn into_inner(self) -> String {
        self.value
    }
}

// Manual impls so that T (a phantom marker) needs no bounds.

impl<T> std::fmt::Debug for Name<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Name").field(&self.value).finish()
    }
}

impl<T> Clone for Name<T> {
    fn clone(&self) -> Self {
        Self::new(self.value.clone())
    }
}

impl<T> PartialEq for Name<T> {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl<T> Eq for Name<T> {}

impl<T> PartialOrd for Name<T> {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Name<T> {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.value.cmp(&other.value)
    }
}

impl<T> Hash for Name<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.value.hash(state);
    }
}

impl<T> Default for Name<T> {
    fn default() -> Self {
        Self::new(String::new())
    }
}

impl<T> std::fmt::Display for Name<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.value)
    }
}

impl<T> From<&str> for Name<T> {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl<T> Serialize for Name<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.value.serialize(serializer)
    }
}

impl<'de, T> Deserialize<'de> for Name<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        Ok(Self::new(value))
    }
}

pub type WorkloadName = Name<WorkloadMarker>;
pub type PodName = Name<PodMarker>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_names_are_empty() {
        assert!(WorkloadName::new("").is_empty());
        assert!(WorkloadName::new("   ").is_empty());
        assert!(!WorkloadName::new("web-v1").is_empty());
    }

    #[test]
    fn names_compare_by_value() {
        let a = PodName::new("web-v1-0");
        let b = PodName::from("web-v1-0");
        assert_eq!(a, b);
        assert!(PodName::new("web-v1-0") < PodName::new("web-v1-1"));
    }
}
