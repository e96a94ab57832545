use std::fmt;
use thiserror::Error;

/// The base error type for all EventPay errors.
///
/// Each crate defines its own error enum and converts into this one at the
/// HTTP boundary via `From<SpecificError> for EventPayError`.
#[derive(Error, Debug)]
pub enum EventPayError {
    /// Error occurred during an HTTP request
    #[error("HTTP request failed: {0}")]
    HttpError(String),

    /// Error occurred while parsing data
    #[error("Failed to parse data: {0}")]
    ParseError(String),

    /// Error occurred due to missing or invalid configuration
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Error occurred during authentication or signature verification
    #[error("Authentication error: {0}")]
    AuthError(String),

    /// Error occurred during validation
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Error occurred during external service call
    #[error("External service error: {service_name} - {message}")]
    ExternalServiceError {
        service_name: String,
        message: String,
    },

    /// The resource exists but is in a state that forbids the operation
    #[error("Conflict: {0}")]
    ConflictError(String),

    /// Error occurred due to a resource not being found
    #[error("Not found: {0}")]
    NotFoundError(String),

    /// Error occurred due to a timeout
    #[error("Timeout: {0}")]
    TimeoutError(String),

    /// A feature is switched off in the configuration
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    /// Error occurred due to an internal error
    #[error("Internal error: {0}")]
    InternalError(String),
}

/// A trait for converting errors to HTTP status codes.
pub trait HttpStatusCode {
    /// Returns the HTTP status code for this error.
    fn status_code(&self) -> u16;
}

impl HttpStatusCode for EventPayError {
    fn status_code(&self) -> u16 {
        match self {
            EventPayError::HttpError(_) => 500,
            EventPayError::ParseError(_) => 400,
            EventPayError::ConfigError(_) => 500,
            EventPayError::AuthError(_) => 401,
            EventPayError::ValidationError(_) => 400,
            EventPayError::ExternalServiceError { .. } => 502,
            EventPayError::ConflictError(_) => 409,
            EventPayError::NotFoundError(_) => 404,
            EventPayError::TimeoutError(_) => 504,
            EventPayError::ServiceUnavailable(_) => 503,
            EventPayError::InternalError(_) => 500,
        }
    }
}

/// A trait for adding context to errors.
pub trait Context<T, E> {
    /// Adds context to an error.
    fn context<C>(self, context: C) -> Result<T, EventPayError>
    where
        C: fmt::Display + Send + Sync + 'static;

    /// Adds context to an error with a lazy context provider.
    fn with_context<C, F>(self, f: F) -> Result<T, EventPayError>
    where
        C: fmt::Display + Send + Sync + 'static,
        F: FnOnce() -> C;
}

impl<T, E: std::error::Error + Send + Sync + 'static> Context<T, E> for Result<T, E> {
    fn context<C>(self, context: C) -> Result<T, EventPayError>
    where
        C: fmt::Display + Send + Sync + 'static,
    {
        self.map_err(|error| EventPayError::InternalError(format!("{}: {}", context, error)))
    }

    fn with_context<C, F>(self, f: F) -> Result<T, EventPayError>
    where
        C: fmt::Display + Send + Sync + 'static,
        F: FnOnce() -> C,
    {
        self.map_err(|error| EventPayError::InternalError(format!("{}: {}", f(), error)))
    }
}

impl From<reqwest::Error> for EventPayError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            EventPayError::TimeoutError(err.to_string())
        } else {
            EventPayError::HttpError(err.to_string())
        }
    }
}

impl From<serde_json::Error> for EventPayError {
    fn from(err: serde_json::Error) -> Self {
        EventPayError::ParseError(err.to_string())
    }
}

impl From<std::io::Error> for EventPayError {
    fn from(err: std::io::Error) -> Self {
        EventPayError::InternalError(err.to_string())
    }
}

impl From<crate::models::AmountError> for EventPayError {
    fn from(err: crate::models::AmountError) -> Self {
        EventPayError::ValidationError(err.to_string())
    }
}

// Utility functions for error handling
pub fn config_error<T: fmt::Display>(message: T) -> EventPayError {
    EventPayError::ConfigError(message.to_string())
}

pub fn validation_error<T: fmt::Display>(message: T) -> EventPayError {
    EventPayError::ValidationError(message.to_string())
}

pub fn not_found<T: fmt::Display>(message: T) -> EventPayError {
    EventPayError::NotFoundError(message.to_string())
}

pub fn conflict<T: fmt::Display>(message: T) -> EventPayError {
    EventPayError::ConflictError(message.to_string())
}

pub fn external_service_error<T: fmt::Display>(service_name: &str, message: T) -> EventPayError {
    EventPayError::ExternalServiceError {
        service_name: service_name.to_string(),
        message: message.to_string(),
    }
}

pub fn internal_error<T: fmt::Display>(message: T) -> EventPayError {
    EventPayError::InternalError(message.to_string())
}
