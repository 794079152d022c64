//! Error types for the binding layer.
//!
//! ## Error Hierarchy
//!
//! ```text
//! Error (top-level wrapper)
//! ├── ConversionError   - a value could not cross the boundary
//! ├── NativeError       - a native call failed (wraps ConversionError)
//! ├── RegistrationError - module/class/signature registration failed
//! └── RuntimeError      - lookup or dispatch failed inside the host runtime
//! ```
//!
//! Conversion errors are raised at the crossing point and propagate
//! synchronously. Inside a native call they become [`NativeError::Conversion`],
//! and the runtime reports the failed call as [`RuntimeError::Native`].

use thiserror::Error;

use crate::policy::Ownership;

// ============================================================================
// Conversion Errors
// ============================================================================

/// Errors raised while converting a value across the boundary.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConversionError {
    /// The slot holds a different kind of value.
    #[error("type mismatch: expected {expected}, got {actual}")]
    TypeMismatch {
        expected: &'static str,
        actual: &'static str,
    },

    /// Integer does not fit in the requested width.
    #[error("integer overflow: value {value} does not fit in {target_type}")]
    IntegerOverflow { value: i64, target_type: &'static str },

    /// Unsigned value above the runtime's integer range.
    #[error("integer overflow: value {value} does not fit in i64")]
    UnsignedOverflow { value: u64 },

    /// Null where a value was required.
    #[error("null value cannot be converted to {target_type}")]
    NullValue { target_type: &'static str },

    /// The heap object behind this handle has been collected.
    #[error("stale object handle: object at index {index} has been freed")]
    StaleHandle { index: u32 },

    /// A foreign object of another class was found.
    #[error("foreign type mismatch: expected {expected}, got {actual}")]
    ForeignTypeMismatch { expected: String, actual: String },

    /// The wrapper was created with a different ownership binding.
    #[error("ownership mismatch: expected {expected} ownership, wrapper is {actual}")]
    OwnershipMismatch {
        expected: Ownership,
        actual: Ownership,
    },

    /// The native type was pushed before its class was installed.
    #[error("class type not registered: {type_name}")]
    UnregisteredClass { type_name: &'static str },

    /// The payload is already mutably borrowed.
    #[error("foreign value {type_name} is already borrowed")]
    AlreadyBorrowed { type_name: &'static str },
}

// ============================================================================
// Native Call Errors
// ============================================================================

/// Errors that can occur during native function execution.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum NativeError {
    /// Error converting arguments or return values
    #[error("conversion error: {0}")]
    Conversion(#[from] ConversionError),

    /// Invalid `this` reference for method call
    #[error("invalid 'this' reference: {message}")]
    InvalidThis { message: String },

    /// Argument index out of bounds
    #[error("argument index {index} out of bounds (function has {count} arguments)")]
    ArgumentIndexOutOfBounds { index: usize, count: usize },

    /// Generic native error
    #[error("native error: {message}")]
    Other { message: String },
}

impl NativeError {
    /// Create an "invalid this" error with a message.
    pub fn invalid_this(message: impl Into<String>) -> Self {
        NativeError::InvalidThis {
            message: message.into(),
        }
    }

    /// Create a generic native error.
    pub fn other(message: impl Into<String>) -> Self {
        NativeError::Other {
            message: message.into(),
        }
    }
}

// ============================================================================
// Registration Errors
// ============================================================================

/// Errors that occur while registering modules and classes.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RegistrationError {
    /// A module with this name is already installed.
    #[error("duplicate module: {0}")]
    DuplicateModule(String),

    /// A class with this name already exists in the module.
    #[error("duplicate class: {class} in module {module}")]
    DuplicateClass {
        /// The module name.
        module: String,
        /// The class name.
        class: String,
    },

    /// The Rust type is already bound to another class.
    #[error("duplicate type: {type_name} already registered as {existing}")]
    DuplicateType {
        /// The Rust type name.
        type_name: &'static str,
        /// The class it is already bound to.
        existing: String,
    },

    /// The same member signature was registered twice on a class.
    #[error("duplicate signature: '{signature}' on class {class}")]
    DuplicateSignature {
        /// The class name.
        class: String,
        /// The signature string.
        signature: String,
    },
}

// ============================================================================
// Runtime Errors
// ============================================================================

/// Errors raised by the host runtime while resolving or dispatching calls.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RuntimeError {
    /// No module with this name is installed.
    #[error("module not found: {0}")]
    ModuleNotFound(String),

    /// The module has no variable with this name.
    #[error("variable not found: {name} in module {module}")]
    VariableNotFound { module: String, name: String },

    /// The receiver's class has no member with this signature.
    #[error("method not found: '{signature}' on {receiver}")]
    MethodNotFound { receiver: String, signature: String },

    /// The receiver is not a class or a foreign object.
    #[error("value of type {type_name} is not callable")]
    NotCallable { type_name: &'static str },

    /// A slot index past the end of the slot array.
    #[error("slot {index} out of range ({count} slots)")]
    SlotOutOfRange { index: usize, count: usize },

    /// A native call returned an error.
    #[error("native call '{signature}' failed: {source}")]
    Native {
        /// The member signature that was invoked.
        signature: String,
        /// The underlying failure.
        source: NativeError,
    },

    /// A value could not be converted outside of a native call.
    #[error(transparent)]
    Conversion(#[from] ConversionError),
}

// ============================================================================
// Unified Error Type
// ============================================================================

/// The unified error type for all binding operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// A conversion error.
    #[error(transparent)]
    Conversion(#[from] ConversionError),

    /// A native call error.
    #[error(transparent)]
    Native(#[from] NativeError),

    /// A registration error.
    #[error(transparent)]
    Registration(#[from] RegistrationError),

    /// A runtime error.
    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}

impl Error {
    /// Check if this is a conversion error.
    pub fn is_conversion(&self) -> bool {
        matches!(self, Error::Conversion(_))
    }

    /// Check if this is a native call error.
    pub fn is_native(&self) -> bool {
        matches!(self, Error::Native(_))
    }

    /// Check if this is a registration error.
    pub fn is_registration(&self) -> bool {
        matches!(self, Error::Registration(_))
    }

    /// Check if this is a runtime error.
    pub fn is_runtime(&self) -> bool {
        matches!(self, Error::Runtime(_))
    }
}

// ============================================================================
// Tests
// ============================================================================
