use std::fmt::{self, Display, Formatter};

/// The class of an [`Error`].
///
/// `None` is the "not an error" sentinel and is never produced by the codec.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Default)]
pub enum ErrorKind {
    #[default]
    None,
    DecodingError,
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            ErrorKind::None => write!(f, "no error"),
            ErrorKind::DecodingError => write!(f, "decoding error"),
        }
    }
}

/// The precise cause of a decoding failure.
#[derive(Debug, PartialEq, Eq, Clone, Copy, thiserror::Error)]
pub enum Reason {
    #[error("wrong end character of the integer element")]
    IntegerUnterminated,

    #[error("no characters between int delimiters")]
    IntegerEmpty,

    #[error("invalid integer format")]
    IntegerFormat,

    #[error("wrong integer")]
    IntegerOverflow,

    #[error("string delimiter not found")]
    LengthUnterminated,

    #[error("invalid string len format")]
    LengthFormat,

    #[error("wrong string len")]
    LengthOverflow,

    #[error("not enough bytes to read")]
    NotEnoughBytes,

    #[error("wrong key type")]
    KeyType,

    #[error("no value for dictionary key")]
    MissingValue,

    #[error("dictionary keys are not strictly ascending")]
    KeyOrder,

    #[error("wrong end delimiter")]
    UnmatchedEnd,

    #[error("unexpected element")]
    UnexpectedElement,

    #[error("nesting too deep")]
    DepthExceeded,

    #[error("inconsistent elements")]
    Inconsistent,
}

/// A decoding failure: an error kind plus a human-readable description.
///
/// The [`Reason`] and byte offset the description was built from are kept alongside so callers
/// can tell failures apart without matching on text.
#[derive(Debug, PartialEq, Eq, Clone, thiserror::Error)]
#[error("{kind}: {description}")]
pub struct Error {
    kind: ErrorKind,
    description: String,
    reason: Reason,
    offset: usize,
}

impl Error {
    pub fn decoding(reason: Reason, offset: usize) -> Self {
        Error {
            kind: ErrorKind::DecodingError,
            description: format!("{reason} at offset {offset}"),
            reason,
            offset,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn reason(&self) -> Reason {
        self.reason
    }

    /// Byte offset in the input of the token that failed.
    pub fn offset(&self) -> usize {
        self.offset
    }
}
