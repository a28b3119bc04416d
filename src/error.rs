use std::fmt;

/// An error raised by graph construction, evaluation, or the CLI.
///
/// Mirrors the `Error { kind, message }` shape used throughout graphrs, with
/// `Display`/`std::error::Error` added so callers at the CLI boundary can use
/// `?` across a `Box<dyn std::error::Error>`.
#[derive(Debug)]
pub struct Error {
    pub kind: ErrorKind,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Empty layer list, mismatched multilayer node sets, malformed JSON/DOT input.
    InputError,
    /// Strict-mode evaluation encountered a node absent from the supplied membership.
    MissingMembership,
    /// CLI received an option value it doesn't recognize.
    UnknownOption,
}

impl Error {
    pub fn input<S: Into<String>>(message: S) -> Error {
        Error {
            kind: ErrorKind::InputError,
            message: message.into(),
        }
    }

    pub fn missing_membership<S: Into<String>>(message: S) -> Error {
        Error {
            kind: ErrorKind::MissingMembership,
            message: message.into(),
        }
    }

    pub fn unknown_option<S: Into<String>>(message: S) -> Error {
        Error {
            kind: ErrorKind::UnknownOption,
            message: message.into(),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

impl std::error::Error for Error {}
