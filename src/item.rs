//! # Work Item & Result Module
//!
//! Strutture dati in ingresso e in uscita dalla pipeline.
//!
//! - `WorkItem`: payload da ottimizzare + label opzionale (non fa parte della chiave di cache)
//! - `MinifyResult`: report per item (output, warnings, errors, filtered)

use crate::error::MinifyError;

/// One payload handed to the pipeline
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkItem {
    pub input: Option<Vec<u8>>,
    /// Advisory label, usually the source file path
    pub path: Option<String>,
}

impl WorkItem {
    pub fn new(input: impl Into<Vec<u8>>, path: impl Into<String>) -> Self {
        Self {
            input: Some(input.into()),
            path: Some(path.into()),
        }
    }

    /// Item without a path label
    pub fn from_bytes(input: impl Into<Vec<u8>>) -> Self {
        Self {
            input: Some(input.into()),
            path: None,
        }
    }

    /// Item that carries no payload (reported as `EmptyInput`)
    pub fn empty() -> Self {
        Self::default()
    }
}

impl From<&str> for WorkItem {
    fn from(text: &str) -> Self {
        Self::from_bytes(text.as_bytes())
    }
}

impl From<Vec<u8>> for WorkItem {
    fn from(bytes: Vec<u8>) -> Self {
        Self::from_bytes(bytes)
    }
}

/// Per-item report, one per `WorkItem`, in input order
#[derive(Debug, Default)]
pub struct MinifyResult {
    pub input: Option<Vec<u8>>,
    pub path: Option<String>,
    pub output: Option<Vec<u8>>,
    pub warnings: Vec<MinifyError>,
    pub errors: Vec<MinifyError>,
    /// True only when the filter hook rejected the item
    pub filtered: bool,
}

impl MinifyResult {
    /// Record for an item that had no payload at all
    pub fn empty_input() -> Self {
        Self {
            errors: vec![MinifyError::EmptyInput],
            ..Default::default()
        }
    }

    /// Record for an item whose task died before producing a result
    pub(crate) fn aborted(path: Option<String>, reason: String) -> Self {
        Self {
            path,
            errors: vec![MinifyError::Optimization(reason)],
            ..Default::default()
        }
    }

    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    /// Output differs from input
    pub fn is_changed(&self) -> bool {
        match (&self.input, &self.output) {
            (Some(input), Some(output)) => input != output,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constructors() {
        let item = WorkItem::new(b"abc".to_vec(), "a.png");
        assert_eq!(item.path.as_deref(), Some("a.png"));
        assert_eq!(WorkItem::from("Foo").input.as_deref(), Some(&b"Foo"[..]));
        assert!(WorkItem::empty().input.is_none());
    }

    #[test]
    fn test_empty_input_record() {
        let result = MinifyResult::empty_input();
        assert_eq!(result.errors.len(), 1);
        assert!(matches!(result.errors[0], MinifyError::EmptyInput));
        assert!(result.input.is_none() && result.path.is_none() && result.output.is_none());
        assert!(!result.is_ok());
    }

    #[test]
    fn test_is_changed() {
        let result = MinifyResult {
            input: Some(b"abc".to_vec()),
            output: Some(b"ab".to_vec()),
            ..Default::default()
        };
        assert!(result.is_changed());
        assert!(!MinifyResult::default().is_changed());
    }
}
