//! Error type shared by every authoring and lifecycle call.

use thiserror::Error;

use crate::ids::{ScopeId, TimelineId};

/// Failures surfaced at the call that introduced them.
///
/// Configuration errors (media queries, positions, eases) and value-shape
/// mismatches are reported while authoring; nothing here is produced lazily
/// during a tick.
#[derive(Debug, Clone, PartialEq, Error)]
#[non_exhaustive]
pub enum AnimError {
    #[error("invalid media query '{query}': {reason}")]
    InvalidMediaQuery { query: String, reason: String },

    #[error("invalid position '{expr}': {reason}")]
    InvalidPosition { expr: String, reason: String },

    #[error("unknown timeline label '{0}'")]
    UnknownLabel(String),

    #[error("invalid value '{input}': {reason}")]
    InvalidValue { input: String, reason: String },

    #[error("value mismatch on '{property}' ({from} -> {to}): {reason}")]
    ValueMismatch {
        property: String,
        from: String,
        to: String,
        reason: String,
    },

    #[error("unknown ease '{0}'")]
    UnknownEase(String),

    #[error("no 'from' value for '{property}' on '{target}' and no earlier tween to inherit from")]
    MissingFrom { target: String, property: String },

    #[error("unknown scope {0}")]
    UnknownScope(ScopeId),

    #[error("unknown timeline {0}")]
    UnknownTimeline(TimelineId),

    #[error("unknown scope method '{0}'")]
    UnknownMethod(String),

    /// Raised by user constructors, teardowns and methods; passed through untouched.
    #[error("{0}")]
    Callback(String),
}

impl AnimError {
    /// Convenience for user callbacks that want to fail with a message.
    pub fn callback(message: impl Into<String>) -> Self {
        Self::Callback(message.into())
    }

    /// True for errors caused by malformed authoring input rather than stale ids.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::InvalidMediaQuery { .. }
                | Self::InvalidPosition { .. }
                | Self::UnknownLabel(_)
                | Self::InvalidValue { .. }
                | Self::ValueMismatch { .. }
                | Self::UnknownEase(_)
                | Self::MissingFrom { .. }
        )
    }
}
