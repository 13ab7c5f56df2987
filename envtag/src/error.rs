//! Error types for parsing and unmarshalling environment values

/// Errors produced when a single string cannot be converted into a value.
///
/// The `kind` fields hold the display form of the target [`Kind`](crate::Kind),
/// e.g. `u8`, `Vec<i32>` or `Duration`.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    /// The input does not follow the grammar of the target kind.
    #[error("cannot parse '{input}' as {kind}: {reason}")]
    InvalidFormat {
        /// The rejected input
        input: String,
        /// Target kind
        kind: String,
        /// What the grammar expected
        reason: String,
    },

    /// The input is well formed but does not fit in the target width.
    #[error("value '{input}' overflows {kind}")]
    Overflow {
        /// The rejected input
        input: String,
        /// Target kind
        kind: String,
    },

    /// The parser has no rule for the target kind.
    #[error("cannot parse values of type {kind}")]
    UnsupportedType {
        /// Target kind
        kind: String,
    },

    /// An element of a comma-separated sequence failed to parse.
    #[error("invalid sequence element {index}: {source}")]
    Element {
        /// Zero-based position of the failing element
        index: usize,
        /// Why the element was rejected
        source: Box<ParseError>,
    },
}

impl ParseError {
    pub(crate) fn invalid(
        input: impl Into<String>,
        kind: impl std::fmt::Display,
        reason: impl std::fmt::Display,
    ) -> Self {
        Self::InvalidFormat {
            input: input.into(),
            kind: kind.to_string(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn overflow(input: impl Into<String>, kind: impl std::fmt::Display) -> Self {
        Self::Overflow {
            input: input.into(),
            kind: kind.to_string(),
        }
    }

    pub(crate) fn unsupported(kind: impl std::fmt::Display) -> Self {
        Self::UnsupportedType {
            kind: kind.to_string(),
        }
    }
}

/// Errors that can occur while unmarshalling a struct from an [`EnvReader`](crate::EnvReader).
///
/// Failures deep inside nested structs arrive wrapped in one [`Error::Field`]
/// per level, so the message reads from the outermost field inwards. Use
/// [`Error::innermost`] to get at the underlying cause.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A tagged field has no value in the reader.
    ///
    /// Every tagged field is required; there are no optional bindings.
    #[error("environment variable '{key}' is required but not set")]
    MissingKey {
        /// Fully composed key that was looked up
        key: String,
    },

    /// The key is unset and the file named by `{KEY}_FILE` could not be read.
    ///
    /// Reported instead of [`Error::MissingKey`] when reading through a
    /// [`FileFallback`](crate::FileFallback).
    #[error("failed to read file '{path}' for environment variable '{name}': {source}")]
    FileRead {
        /// Name of the path variable, e.g. `API_KEY_FILE`
        name: String,
        /// Path that failed to be read
        path: String,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// The target is neither a derived struct nor a custom unmarshaler.
    #[error("cannot unmarshal {type_name}: only structs and custom unmarshalers are supported")]
    NotStruct {
        /// Rust type name of the target
        type_name: &'static str,
    },

    /// The value of `key` could not be parsed into the field's type.
    #[error("failed to parse environment variable '{key}': {source}")]
    Parse {
        /// Key whose value was rejected
        key: String,
        /// Parser failure
        source: ParseError,
    },

    /// Context added for every field on the path to a failure.
    #[error("error unmarshaling field {field} ({key}): {source}")]
    Field {
        /// Rust name of the field
        field: &'static str,
        /// Key, or key prefix for struct fields, the field was bound to
        key: String,
        /// The failure inside the field
        source: Box<Error>,
    },

    /// A type's own `unmarshal_env` hook reported a failure.
    #[error("custom unmarshaler for {type_name} failed: {source}")]
    Custom {
        /// Rust type name of the custom type
        type_name: &'static str,
        /// Error returned by the hook
        source: anyhow::Error,
    },
}

impl Error {
    /// Create a missing key error (used by generated and hand-written impls)
    pub fn missing_key(key: impl Into<String>) -> Self {
        Self::MissingKey { key: key.into() }
    }

    /// Create a parse error for the value found under `key`
    pub fn parse(key: impl Into<String>, source: ParseError) -> Self {
        Self::Parse {
            key: key.into(),
            source,
        }
    }

    /// The failure with all [`Error::Field`] context stripped.
    pub fn innermost(&self) -> &Error {
        let mut current = self;
        while let Error::Field { source, .. } = current {
            current = &**source;
        }
        current
    }

    /// Dotted path of field names leading to the failure, e.g. `database.port`.
    ///
    /// Empty when the error did not occur inside a field.
    pub fn field_path(&self) -> String {
        let mut path = Vec::new();
        let mut current = self;
        while let Error::Field { field, source, .. } = current {
            path.push(*field);
            current = &**source;
        }
        path.join(".")
    }
}
