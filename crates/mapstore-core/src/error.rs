use std::fmt;

use thiserror::Error;

use crate::ids::IdError;

/// Stable error codes shared by every layer and surfaced to HTTP clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    Internal,
    NotFound,
    Conflict,
    Invalid,
    EmptyValue,
    UnprocessableEntity,
    Unauthorized,
    Forbidden,
    MethodNotAllowed,
    TooManyRequests,
    Unavailable,
}

impl ErrorCode {
    /// Wire representation of the code.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Internal => "internal error",
            Self::NotFound => "not found",
            Self::Conflict => "conflict",
            Self::Invalid => "invalid",
            Self::EmptyValue => "empty value",
            Self::UnprocessableEntity => "unprocessable entity",
            Self::Unauthorized => "unauthorized",
            Self::Forbidden => "forbidden",
            Self::MethodNotAllowed => "method not allowed",
            Self::TooManyRequests => "too many requests",
            Self::Unavailable => "unavailable",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Boxed cause attached to internal errors.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Canonical error type for metadata operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Malformed input: bad ID, bad JSON, missing required filter field.
    #[error("{message}")]
    Invalid {
        /// Human-readable explanation.
        message: String,
    },

    /// No record exists for the requested key.
    #[error("{entity} `{id}` was not found")]
    NotFound {
        /// Entity type name (e.g. `"dbrp mapping"`).
        entity: &'static str,
        /// Identifier of the missing entity.
        id: String,
    },

    /// A record with the same identity already exists.
    #[error("{entity} `{id}` already exists")]
    AlreadyExists {
        /// Entity type name.
        entity: &'static str,
        /// Identifier that conflicts.
        id: String,
    },

    /// A uniqueness constraint other than the primary key was violated.
    #[error("{message}")]
    Conflict {
        /// Human-readable explanation.
        message: String,
    },

    /// The caller lacks a capability required by the operation.
    #[error("{message}")]
    Unauthorized {
        /// Human-readable denial.
        message: String,
        /// Underlying denial reason, when this error wraps another.
        #[source]
        source: Option<Box<CoreError>>,
    },

    /// The caller is identified but not allowed to act at all.
    #[error("{message}")]
    Forbidden {
        /// Human-readable explanation.
        message: String,
    },

    /// Store, transaction or encoding failure.
    #[error("internal error: {message}")]
    Internal {
        /// Details for diagnostics; never shown to HTTP clients.
        message: String,
        /// Underlying cause.
        #[source]
        source: Option<BoxError>,
    },
}

impl CoreError {
    /// Creates an `Invalid` variant.
    #[must_use]
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid {
            message: message.into(),
        }
    }

    /// Creates a `NotFound` variant.
    #[must_use]
    pub fn not_found(entity: &'static str, id: impl fmt::Display) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Creates an `AlreadyExists` variant.
    #[must_use]
    pub fn already_exists(entity: &'static str, id: impl fmt::Display) -> Self {
        Self::AlreadyExists {
            entity,
            id: id.to_string(),
        }
    }

    /// Creates a `Conflict` variant.
    #[must_use]
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    /// Creates a bare `Unauthorized` denial.
    #[must_use]
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized {
            message: message.into(),
            source: None,
        }
    }

    /// Wraps a denial produced by an authorization check.
    #[must_use]
    pub fn unauthorized_access(reason: CoreError) -> Self {
        Self::Unauthorized {
            message: format!("unauthorized access: {reason}"),
            source: Some(Box::new(reason)),
        }
    }

    /// Creates a `Forbidden` variant.
    #[must_use]
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden {
            message: message.into(),
        }
    }

    /// Creates an `Internal` variant without a cause.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
            source: None,
        }
    }

    /// Creates an `Internal` variant preserving the underlying cause.
    #[must_use]
    pub fn internal_with(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Internal {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Stable code for this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Invalid { .. } => ErrorCode::Invalid,
            Self::NotFound { .. } => ErrorCode::NotFound,
            Self::AlreadyExists { .. } | Self::Conflict { .. } => ErrorCode::Conflict,
            Self::Unauthorized { .. } => ErrorCode::Unauthorized,
            Self::Forbidden { .. } => ErrorCode::Forbidden,
            Self::Internal { .. } => ErrorCode::Internal,
        }
    }

    /// Returns `true` for `NotFound`.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

impl From<IdError> for CoreError {
    fn from(err: IdError) -> Self {
        Self::invalid(err.to_string())
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::internal_with("record encoding failed", err)
    }
}

/// Convenient result alias for core operations.
pub type CoreResult<T> = Result<T, CoreError>;
