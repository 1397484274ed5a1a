//! Error types for the Keyloom object model.

use thiserror::Error;

/// Errors that can occur during object operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ObjectError {
    /// The object ID is invalid or has been destroyed.
    #[error("Invalid or destroyed object ID")]
    InvalidObjectId,
    /// Attempted to set an object as its own parent/ancestor.
    #[error("Cannot set an object as its own parent or ancestor")]
    CircularParentage,
}

/// Errors raised by the class registry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClassError {
    /// No class with this name or id is registered.
    #[error("Unknown class: {0}")]
    UnknownClass(String),
    /// A class with this name already exists.
    #[error("A class named '{0}' is already registered")]
    DuplicateClass(String),
    /// The class already declares a signal with this name.
    #[error("Class '{class}' already declares signal '{signal}'")]
    DuplicateSignal {
        /// Class that owns the signal.
        class: String,
        /// Name of the signal.
        signal: String,
    },
}

/// Result type for object operations.
pub type ObjectResult<T> = std::result::Result<T, ObjectError>;

/// Result type for class registry operations.
pub type ClassResult<T> = std::result::Result<T, ClassError>;
