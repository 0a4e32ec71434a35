// ABOUTME: Label selectors used to enumerate the pods of a workload.
// ABOUTME: Validates label keys and values and matches them against pod labels.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SelectorError {
    #[error("label selector term cannot be empty")]
    EmptyTerm,

    #[error("label selector term '{0}' is missing '='")]
    MissingEquals(String),

    #[error("label key cannot be empty")]
    EmptyKey,

    #[error("label '{0}' exceeds maximum length of 63 characters")]
    TooLong(String),

    #[error("label '{0}' must start and end with an alphanumeric character")]
    BadEdge(String),

    #[error("invalid character in label '{label}': '{ch}'")]
    InvalidChar { label: String, ch: char },
}

/// Equality-based label selector (`app=web,version=v2`).
///
/// Terms are kept ordered so the same selector always renders the same way.
/// An empty selector is representable but selects nothing; the updater treats
/// it as a missing selector.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct LabelSelector(BTreeMap<String, String>);

impl LabelSelector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a selector from `(key, value)` pairs, validating each.
    pub fn from_pairs<K, V, I>(pairs: I) -> Result<Self, SelectorError>
    where
        K: Into<String>,
        V: Into<String>,
        I: IntoIterator<Item = (K, V)>,
    {
        let mut selector = Self::new();
        for (k, v) in pairs {
            selector.insert(k, v)?;
        }
        Ok(selector)
    }

    pub fn insert(
        &mut self,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<(), SelectorError> {
        let key = key.into();
        let value = value.into();
        if key.is_empty() {
            return Err(SelectorError::EmptyKey);
        }
        validate_label(&key, &['-', '_', '.', '/'])?;
        if !value.is_empty() {
            validate_label(&value, &['-', '_', '.'])?;
        }
        self.0.insert(key, value);
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// True if every term of the selector is present in `labels`.
    /// An empty selector matches nothing.
    pub fn matches(&self, labels: &BTreeMap<String, String>) -> bool {
        !self.is_empty() && self.0.iter().all(|(k, v)| labels.get(k) == Some(v))
    }

    /// True if one selector's terms are contained in the other's, so every pod
    /// matched by the narrower one is also matched by the wider one.
    pub fn overlaps(&self, other: &LabelSelector) -> bool {
        if self.is_empty() || other.is_empty() {
            return false;
        }
        self.matches(&other.0) || other.matches(&self.0)
    }

    /// The selector's terms as a label set, e.g. for labelling new pods.
    pub fn to_labels(&self) -> BTreeMap<String, String> {
        self.0.clone()
    }
}

fn validate_label(label: &str, extra: &[char]) -> Result<(), SelectorError> {
    if label.len() > 63 && !label.contains('/') {
        return Err(SelectorError::TooLong(label.to_string()));
    }

    let first = label.chars().next();
    let last = label.chars().last();
    if !first.is_some_and(|c| c.is_ascii_alphanumeric())
        || !last.is_some_and(|c| c.is_ascii_alphanumeric())
    {
        return Err(SelectorError::BadEdge(label.to_string()));
    }

    for ch in label.chars() {
        if !ch.is_ascii_alphanumeric() && !extra.contains(&ch) {
            return Err(SelectorError::InvalidChar {
                label: label.to_string(),
                ch,
            });
        }
    }

    Ok(())
}

impl FromStr for LabelSelector {
    type Err = SelectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut selector = Self::new();
        if s.trim().is_empty() {
            return Ok(selector);
        }
        for term in s.split(',') {
            let term = term.trim();
            if term.is_empty() {
                return Err(SelectorError::EmptyTerm);
            }
            let (k, v) = term
                .split_once('=')
                .ok_or_else(|| SelectorError::MissingEquals(term.to_string()))?;
            selector.insert(k.trim(), v.trim())?;
        }
        Ok(selector)
    }
}

impl fmt::Display for LabelSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (k, v) in &self.0 {
            if !first {
                f.write_str(",")?;
            }
            write!(f, "{k}={v}")?;
            first = false;
        }
        Ok(())
    }
}

/// Accepts either a map (`{app: web}`) or the string form (`"app=web"`).
impl<'de> Deserialize<'de> for LabelSelector {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Text(String),
            Map(BTreeMap<String, String>),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Text(s) => s.parse().map_err(serde::de::Error::custom),
            Repr::Map(map) => LabelSelector::from_pairs(map).map_err(serde::de::Error::custom),
        }
    }
}
