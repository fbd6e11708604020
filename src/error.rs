use crate::argument::ArgumentKind;
use axum::http::{Method, StatusCode};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, BatonError>;

#[derive(Debug, Error)]
pub enum BatonError {
    #[error("Controller not found: {reason}")]
    ControllerNotFound { reason: NotFoundReason },

    #[error("Cannot resolve argument '{argument}' of controller '{controller}': {failure}")]
    ArgumentResolution {
        controller: String,
        argument: String,
        failure: ArgumentFailure,
    },

    #[error("Invalid controller '{name}': {message}")]
    InvalidController { name: String, message: String },

    #[error("Invalid route '{pattern}': {message}")]
    InvalidRoute { pattern: String, message: String },

    #[error("Dependency not found: {type_name}")]
    DependencyNotFound { type_name: String },

    #[error("Failed to downcast type: {type_name}")]
    DowncastFailed { type_name: String },

    #[error("Argument {index} is not a {expected}")]
    ArgumentAccess { index: usize, expected: &'static str },

    #[error("Invalid configuration value for {key}: {message}")]
    Config { key: String, message: String },

    #[error("Request body exceeds the limit of {limit} bytes")]
    PayloadTooLarge { limit: usize },

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Controller failed: {0}")]
    Handler(#[from] anyhow::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Why no controller could be determined for a request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NotFoundReason {
    #[error("no route matches {method} {path}")]
    NoRoute { method: Method, path: String },

    #[error("method {method} not allowed for {path}")]
    MethodNotAllowed {
        method: Method,
        path: String,
        allowed: Vec<Method>,
    },

    #[error("request has no '{attribute}' attribute")]
    MissingAttribute { attribute: String },

    #[error("no controller registered as '{name}'")]
    UnknownController { name: String },
}

/// Why a single controller argument could not be produced.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArgumentFailure {
    #[error("required value is missing")]
    Missing,

    #[error("cannot convert {value:?} to {expected}")]
    Unconvertible { expected: ArgumentKind, value: String },

    #[error("service {type_name} is not registered")]
    ServiceUnavailable { type_name: String },

    #[error("null is not accepted")]
    NotNullable,
}

impl BatonError {
    pub fn not_found(reason: NotFoundReason) -> Self {
        Self::ControllerNotFound { reason }
    }

    pub fn argument(
        controller: impl Into<String>,
        argument: impl Into<String>,
        failure: ArgumentFailure,
    ) -> Self {
        Self::ArgumentResolution {
            controller: controller.into(),
            argument: argument.into(),
            failure,
        }
    }

    pub fn invalid_controller(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidController {
            name: name.into(),
            message: message.into(),
        }
    }

    pub fn invalid_route(pattern: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidRoute {
            pattern: pattern.into(),
            message: message.into(),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            BatonError::ControllerNotFound {
                reason: NotFoundReason::MethodNotAllowed { .. },
            } => StatusCode::METHOD_NOT_ALLOWED,
            BatonError::ControllerNotFound { .. } => StatusCode::NOT_FOUND,
            BatonError::ArgumentResolution {
                failure: ArgumentFailure::ServiceUnavailable { .. },
                ..
            } => StatusCode::INTERNAL_SERVER_ERROR,
            BatonError::ArgumentResolution { .. } | BatonError::BadRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            BatonError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            BatonError::InvalidController { .. }
            | BatonError::InvalidRoute { .. }
            | BatonError::DependencyNotFound { .. }
            | BatonError::DowncastFailed { .. }
            | BatonError::ArgumentAccess { .. }
            | BatonError::Config { .. }
            | BatonError::Handler(_)
            | BatonError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable machine-readable code used in error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            BatonError::ControllerNotFound {
                reason: NotFoundReason::MethodNotAllowed { .. },
            } => "METHOD_NOT_ALLOWED",
            BatonError::ControllerNotFound { .. } => "CONTROLLER_NOT_FOUND",
            BatonError::ArgumentResolution { .. } => "ARGUMENT_RESOLUTION_FAILED",
            BatonError::InvalidController { .. } => "INVALID_CONTROLLER",
            BatonError::InvalidRoute { .. } => "INVALID_ROUTE",
            BatonError::DependencyNotFound { .. } => "DEPENDENCY_NOT_FOUND",
            BatonError::DowncastFailed { .. } => "DOWNCAST_FAILED",
            BatonError::ArgumentAccess { .. } => "ARGUMENT_ACCESS",
            BatonError::Config { .. } => "INVALID_CONFIG",
            BatonError::PayloadTooLarge { .. } => "PAYLOAD_TOO_LARGE",
            BatonError::BadRequest(_) => "BAD_REQUEST",
            BatonError::Handler(_) => "CONTROLLER_FAILED",
            BatonError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Methods to advertise in an `Allow` header, if any.
    pub fn allowed_methods(&self) -> Option<&[Method]> {
        match self {
            BatonError::ControllerNotFound {
                reason: NotFoundReason::MethodNotAllowed { allowed, .. },
            } => Some(allowed),
            _ => None,
        }
    }
}

impl axum::response::IntoResponse for BatonError {
    fn into_response(self) -> axum::response::Response {
        (self.status_code(), self.to_string()).into_response()
    }
}
