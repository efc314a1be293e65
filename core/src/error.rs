//! Error types for the HR console client.
//!
//! # Design
//! Every failure the adapter can see collapses into `ApiError`, and every
//! `ApiError` can be viewed through the uniform `NormalizedError` shape that
//! stores keep and the presentation layer renders. Transport failures carry
//! their cause for logging but normalize to the generic "Server error".

use serde::Serialize;
use thiserror::Error;

use crate::types::EntityId;

/// Message shown when no response reached the client.
pub const SERVER_ERROR_MESSAGE: &str = "Server error";

/// Uniform `{status, message}` view of any failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NormalizedError {
    pub status: Option<u16>,
    pub message: String,
}

/// Raised by a `Transport` when the request never produced a response.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("transport failure: {cause}")]
pub struct TransportError {
    pub cause: String,
}

impl TransportError {
    pub fn new(cause: impl Into<String>) -> Self {
        Self { cause: cause.into() }
    }
}

/// Errors returned by `ApiClient` and the resource gateways.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// No response reached the client.
    #[error("Server error")]
    Transport { cause: String },

    /// The server answered with a non-2xx status.
    #[error("HTTP {status}: {body}")]
    HttpError { status: u16, body: String },

    /// The response body did not have the expected shape.
    #[error("deserialization failed: {0}")]
    DeserializationError(String),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    SerializationError(String),
}

impl ApiError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::HttpError { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(401)
    }

    pub fn normalized(&self) -> NormalizedError {
        let message = match self {
            ApiError::Transport { .. } => SERVER_ERROR_MESSAGE.to_string(),
            ApiError::HttpError { status, body } if body.trim().is_empty() => {
                format!("HTTP {status}")
            }
            ApiError::HttpError { body, .. } => body.clone(),
            other => other.to_string(),
        };
        NormalizedError {
            status: self.status(),
            message,
        }
    }
}

impl From<TransportError> for ApiError {
    fn from(err: TransportError) -> Self {
        ApiError::Transport { cause: err.cause }
    }
}

/// Errors surfaced by `ResourceStore` entry points and the `Editor`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error(transparent)]
    Api(#[from] ApiError),

    /// Another update or delete for the same id has not settled yet.
    #[error("{resource} {id} already has a request in flight")]
    Busy { resource: &'static str, id: EntityId },

    /// `Editor::submit` was called with no open draft.
    #[error("no draft is open")]
    NotEditing,
}

impl StoreError {
    pub fn normalized(&self) -> NormalizedError {
        match self {
            StoreError::Api(err) => err.normalized(),
            other => NormalizedError {
                status: None,
                message: other.to_string(),
            },
        }
    }
}
