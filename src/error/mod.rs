//! Error types for tree construction, serialization, and tokenizer faults.
//!
//! Every fallible operation in this crate returns [`XmlError`]. Nothing is
//! retried or recovered: an error aborts the current operation and
//! propagates to the caller unchanged.

use std::fmt;

/// Source location within an XML document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SourceLocation {
    /// 1-based line number.
    pub line: u32,
    /// 1-based column number (in characters, not bytes).
    pub column: u32,
    /// 0-based byte offset from the start of the input.
    pub byte_offset: usize,
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// A malformed-input error raised by a tokenizer.
///
/// Reader implementations construct these; the tree-building code never
/// inspects or rewraps them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReaderFault {
    /// Human-readable description of the fault.
    pub message: String,
    /// Where in the source the fault occurred.
    pub location: SourceLocation,
}

impl ReaderFault {
    /// Creates a new fault at the given location.
    pub fn new(message: impl Into<String>, location: SourceLocation) -> Self {
        Self {
            message: message.into(),
            location,
        }
    }
}

impl fmt::Display for ReaderFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "parse error at {}: {}", self.location, self.message)
    }
}

impl std::error::Error for ReaderFault {}

/// The error type for all tree, reader, and writer operations.
#[derive(Debug, thiserror::Error)]
pub enum XmlError {
    /// An end tag does not match its start tag, or the current event is not
    /// the one a caller required.
    #[error("structural mismatch at {location}: expected {expected}, found {found}")]
    StructuralMismatch {
        /// Description of the expected event, e.g. `END_TAG {urn:a}item`.
        expected: String,
        /// Description of the event actually encountered.
        found: String,
        /// Where the mismatch was detected (default for in-memory sources).
        location: SourceLocation,
    },

    /// An argument violated a documented contract.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A positional accessor was called with an out-of-range index.
    #[error("index {index} out of range (length {len})")]
    IndexOutOfRange {
        /// The requested index.
        index: usize,
        /// The length of the sequence at the time of the call.
        len: usize,
    },

    /// The tokenizer rejected the input.
    #[error(transparent)]
    Reader(#[from] ReaderFault),

    /// The underlying output sink failed.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// The input bytes could not be decoded.
    #[error("encoding error: {0}")]
    Encoding(String),
}

impl XmlError {
    /// Returns `true` for [`XmlError::StructuralMismatch`].
    #[must_use]
    pub fn is_structural_mismatch(&self) -> bool {
        matches!(self, Self::StructuralMismatch { .. })
    }

    /// Returns the source location, if the error carries one.
    #[must_use]
    pub fn location(&self) -> Option<SourceLocation> {
        match self {
            Self::StructuralMismatch { location, .. } => Some(*location),
            Self::Reader(fault) => Some(fault.location),
            _ => None,
        }
    }
}

/// Checks `index` against `len`, producing [`XmlError::IndexOutOfRange`].
pub(crate) fn check_index(index: usize, len: usize) -> Result<(), XmlError> {
    if index < len {
        Ok(())
    } else {
        Err(XmlError::IndexOutOfRange { index, len })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_location_display() {
        let loc = SourceLocation {
            line: 10,
            column: 5,
            byte_offset: 42,
        };
        assert_eq!(loc.to_string(), "10:5");
    }

    #[test]
    fn test_reader_fault_display() {
        let fault = ReaderFault::new(
            "unexpected end of input",
            SourceLocation {
                line: 1,
                column: 15,
                byte_offset: 14,
            },
        );
        assert_eq!(
            fault.to_string(),
            "parse error at 1:15: unexpected end of input"
        );
    }

    #[test]
    fn test_reader_fault_is_transparent() {
        let fault = ReaderFault::new("bad name", SourceLocation::default());
        let err = XmlError::from(fault.clone());
        assert_eq!(err.to_string(), fault.to_string());
        assert_eq!(err.location(), Some(SourceLocation::default()));
    }

    #[test]
    fn test_structural_mismatch_display() {
        let err = XmlError::StructuralMismatch {
            expected: "END_TAG a".to_string(),
            found: "END_TAG b".to_string(),
            location: SourceLocation {
                line: 2,
                column: 3,
                byte_offset: 9,
            },
        };
        assert!(err.is_structural_mismatch());
        assert_eq!(
            err.to_string(),
            "structural mismatch at 2:3: expected END_TAG a, found END_TAG b"
        );
    }

    #[test]
    fn test_check_index() {
        assert!(check_index(0, 1).is_ok());
        assert!(matches!(
            check_index(3, 3),
            Err(XmlError::IndexOutOfRange { index: 3, len: 3 })
        ));
    }

    #[test]
    fn test_xml_error_is_error_trait() {
        let err = XmlError::InvalidArgument("test".to_string());
        let _: &dyn std::error::Error = &err;
    }
}
