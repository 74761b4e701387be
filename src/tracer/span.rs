//! Span type and its finished, immutable form.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::value::ThrownError;

/// A single traced unit of work.
///
/// Lives inside a [`Scope`](crate::tracer::Scope); mutable while the scope
/// is open, snapshotted into a [`FinishedSpan`] when the scope closes.
#[derive(Debug, Clone)]
pub struct Span {
    name: String,
    tags: BTreeMap<String, String>,
    error: bool,
}

impl Span {
    pub(crate) fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tags: BTreeMap::new(),
            error: false,
        }
    }

    /// The operation name this span was opened with.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Set a tag, overwriting any prior value for the key.
    pub fn set_tag(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.tags.insert(key.into(), value.into());
    }

    /// Read a tag back.
    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags.get(key).map(String::as_str)
    }

    /// Mark the span as errored and record the error's category, message,
    /// and stack as tags.
    pub fn tag_error(&mut self, err: &ThrownError) {
        self.error = true;
        self.tags.insert("error.kind".into(), err.kind.clone());
        self.tags.insert("error.message".into(), err.message.clone());
        if !err.stack.is_empty() {
            self.tags.insert("error.stack".into(), err.stack.join("\n"));
        }
    }

    /// Whether an error has been tagged on this span.
    pub fn is_error(&self) -> bool {
        self.error
    }

    pub(crate) fn finish(&self) -> FinishedSpan {
        FinishedSpan {
            name: self.name.clone(),
            tags: self.tags.clone(),
            error: self.error,
        }
    }
}

/// Immutable record of a closed span, as delivered to the tracer's sink.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FinishedSpan {
    pub name: String,
    pub tags: BTreeMap<String, String>,
    pub error: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_error_records_kind_message_stack() {
        let mut span = Span::new("web.request");
        let err = ThrownError::new("DbError", "connection refused")
            .with_stack(vec!["query()".into(), "handler()".into()]);
        span.tag_error(&err);

        assert!(span.is_error());
        assert_eq!(span.tag("error.kind"), Some("DbError"));
        assert_eq!(span.tag("error.message"), Some("connection refused"));
        assert_eq!(span.tag("error.stack"), Some("query()\nhandler()"));
    }

    #[test]
    fn test_empty_stack_omits_stack_tag() {
        let mut span = Span::new("op");
        span.tag_error(&ThrownError::new("E", "m"));
        assert_eq!(span.tag("error.stack"), None);
    }
}
