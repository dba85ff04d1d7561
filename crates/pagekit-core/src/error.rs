#![forbid(unsafe_code)]

//! Error types shared by the behavior engine and its hosts.

use std::fmt;

use crate::host::NodeId;

/// Errors surfaced by a [`PageHost`](crate::host::PageHost) or by the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageError {
    /// The handle does not refer to a node the host knows about.
    UnknownNode(NodeId),
    /// The node exists but is no longer attached to the document.
    Detached(NodeId),
    /// Reading local storage failed (storage disabled, quota, privacy mode).
    Storage(String),
    /// The host refused to navigate.
    Navigation(String),
    /// Any other host-side DOM failure.
    Host(String),
    /// Configuration could not be parsed or is inconsistent.
    Config(String),
}

impl fmt::Display for PageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownNode(node) => write!(f, "unknown node {node}"),
            Self::Detached(node) => write!(f, "node {node} is detached from the document"),
            Self::Storage(msg) => write!(f, "storage unavailable: {msg}"),
            Self::Navigation(msg) => write!(f, "navigation failed: {msg}"),
            Self::Host(msg) => write!(f, "host error: {msg}"),
            Self::Config(msg) => write!(f, "invalid config: {msg}"),
        }
    }
}

impl std::error::Error for PageError {}

/// Outcome of an asynchronous clipboard write reported back by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClipboardError {
    /// The host has no clipboard API at all.
    NotAvailable,
    /// The write promise rejected (permission denied, document not focused).
    Rejected(String),
}

impl fmt::Display for ClipboardError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotAvailable => write!(f, "clipboard not available"),
            Self::Rejected(msg) => write!(f, "clipboard write rejected: {msg}"),
        }
    }
}

impl std::error::Error for ClipboardError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_error_display() {
        assert_eq!(PageError::UnknownNode(NodeId(7)).to_string(), "unknown node #7");
        assert_eq!(
            PageError::Detached(NodeId(3)).to_string(),
            "node #3 is detached from the document"
        );
        assert_eq!(
            PageError::Config("empty class".into()).to_string(),
            "invalid config: empty class"
        );
    }

    #[test]
    fn clipboard_error_display() {
        assert_eq!(
            ClipboardError::Rejected("NotAllowedError".into()).to_string(),
            "clipboard write rejected: NotAllowedError"
        );
        assert_eq!(
            ClipboardError::NotAvailable.to_string(),
            "clipboard not available"
        );
    }
}
