//! Error types and handling for the `EnviroSnap` application
//!
//! Provider failures never surface here: adapters turn them into
//! [`ProviderResult::Unavailable`](crate::providers::ProviderResult) values.
//! These errors cover the application shell around the engine.

use thiserror::Error;

/// Main error type for the `EnviroSnap` application
#[derive(Error, Debug)]
pub enum EnviroSnapError {
    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Input validation errors
    #[error("Invalid input: {message}")]
    Validation { message: String },

    /// Requested location is not in the catalog
    #[error("Unknown location: {id}")]
    UnknownLocation { id: String },

    /// I/O operation errors
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

impl EnviroSnapError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn unknown_location<S: Into<String>>(id: S) -> Self {
        Self::UnknownLocation { id: id.into() }
    }

    /// Get a user-friendly error message
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            EnviroSnapError::Config { .. } => {
                "Configuration error. Please check your config file and environment variables."
                    .to_string()
            }
            EnviroSnapError::Validation { message } => {
                format!("Invalid input: {message}")
            }
            EnviroSnapError::UnknownLocation { id } => {
                format!("Location '{id}' is not known. Run `envirosnap locations` to list them.")
            }
            EnviroSnapError::Io { .. } => {
                "File operation failed. Please check file permissions.".to_string()
            }
        }
    }
}
