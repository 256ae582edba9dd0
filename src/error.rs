//! Error types for the indify rewriter

use thiserror::Error;

/// Main error type for indify
#[derive(Error, Debug)]
pub enum Error {
    /// The input cannot be parsed into a compiled unit (bad magic,
    /// inconsistent counts, truncated data, invalid UTF-8).
    #[error("malformed input at offset {offset}: {message}")]
    MalformedInput {
        /// Byte offset at which parsing failed
        offset: usize,
        message: String,
    },

    /// A method or call-instruction descriptor cannot be parsed.
    #[error("malformed descriptor {descriptor:?}: {message}")]
    MalformedDescriptor {
        /// The descriptor string as read from the input
        descriptor: String,
        message: String,
    },

    /// An instruction was visited outside the {Started, InBody} window.
    /// Internal consistency violation; never occurs on well-formed input.
    #[error("rewrite protocol violation: {0}")]
    Protocol(String),

    /// IO error
    #[error("io error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

impl Error {
    /// Build a `MalformedInput` error at the given offset.
    pub(crate) fn malformed_input(offset: usize, message: impl Into<String>) -> Self {
        Error::MalformedInput { offset, message: message.into() }
    }

    /// Build a `MalformedDescriptor` error for the given descriptor string.
    pub(crate) fn malformed_descriptor(
        descriptor: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Error::MalformedDescriptor {
            descriptor: descriptor.into(),
            message: message.into(),
        }
    }
}

/// Result type alias for indify
pub type Result<T> = std::result::Result<T, Error>;
