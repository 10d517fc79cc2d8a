//! Pull-based, namespace-aware XML reading.
//!
//! The tree builder never touches bytes. It drives a cursor through the
//! [`PullReader`] trait: inspect the current event, copy what it needs, then
//! call [`PullReader::next_token`] to move on. [`XmlPullReader`] is the
//! tokenizer shipped with this crate; anything else that can answer the same
//! questions (a scripted event list in tests, a bridge to another parser)
//! works just as well.
//!
//! # Examples
//!
//! ```
//! use nsdom::reader::{EventType, PullReader, XmlPullReader};
//!
//! let mut reader = XmlPullReader::new("<root><child>Hello</child></root>");
//! let mut tags = Vec::new();
//!
//! while reader.next_token().unwrap() != EventType::EndDocument {
//!     if reader.event_type() == EventType::StartTag {
//!         tags.push(reader.name().unwrap_or_default().to_string());
//!     }
//! }
//!
//! assert_eq!(tags, vec!["root", "child"]);
//! ```

mod input;
mod namespace;
mod pull;

pub use pull::XmlPullReader;

use std::fmt;

use crate::error::{SourceLocation, XmlError};

/// The kind of event a [`PullReader`] is positioned on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventType {
    /// Before the first token has been read.
    StartDocument,
    /// All input has been consumed.
    EndDocument,
    /// An element start tag, e.g. `<a:item x="1">`.
    ///
    /// Self-closing tags report `StartTag` followed by a synthetic `EndTag`.
    StartTag,
    /// An element end tag.
    EndTag,
    /// Character data.
    Text,
    /// A CDATA section.
    CData,
    /// An entity reference the reader could not replace.
    EntityRef,
    /// Whitespace that is not element content (outside the root element).
    IgnorableWhitespace,
    /// A processing instruction; the text is `target data`.
    ProcessingInstruction,
    /// A comment; the text excludes the delimiters.
    Comment,
    /// A document type declaration; the text follows `<!DOCTYPE`.
    DocDecl,
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::StartDocument => "START_DOCUMENT",
            Self::EndDocument => "END_DOCUMENT",
            Self::StartTag => "START_TAG",
            Self::EndTag => "END_TAG",
            Self::Text => "TEXT",
            Self::CData => "CDSECT",
            Self::EntityRef => "ENTITY_REF",
            Self::IgnorableWhitespace => "IGNORABLE_WHITESPACE",
            Self::ProcessingInstruction => "PROCESSING_INSTRUCTION",
            Self::Comment => "COMMENT",
            Self::DocDecl => "DOCDECL",
        };
        f.write_str(label)
    }
}

/// Options controlling [`XmlPullReader`] behaviour and security limits.
///
/// ```
/// use nsdom::reader::ReaderOptions;
///
/// let opts = ReaderOptions::default()
///     .process_namespaces(false)
///     .max_depth(64);
/// assert!(!opts.process_namespaces);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReaderOptions {
    /// Resolve prefixes and report `xmlns` attributes as declarations
    /// (default: `true`). When off, names are reported verbatim with an empty
    /// namespace and `xmlns` attributes are ordinary attributes.
    pub process_namespaces: bool,
    /// Maximum element nesting depth (default: 256).
    pub max_depth: usize,
    /// Maximum number of attributes on one start tag (default: 256).
    pub max_attributes: usize,
    /// Maximum length in bytes of a tag or attribute name (default: 50,000).
    pub max_name_length: usize,
}

impl Default for ReaderOptions {
    fn default() -> Self {
        Self {
            process_namespaces: true,
            max_depth: 256,
            max_attributes: 256,
            max_name_length: 50_000,
        }
    }
}

impl ReaderOptions {
    /// Enables or disables namespace processing.
    #[must_use]
    pub fn process_namespaces(mut self, enabled: bool) -> Self {
        self.process_namespaces = enabled;
        self
    }

    /// Sets the maximum element nesting depth.
    #[must_use]
    pub fn max_depth(mut self, max: usize) -> Self {
        self.max_depth = max;
        self
    }

    /// Sets the maximum number of attributes on a single start tag.
    #[must_use]
    pub fn max_attributes(mut self, max: usize) -> Self {
        self.max_attributes = max;
        self
    }

    /// Sets the maximum tag or attribute name length.
    #[must_use]
    pub fn max_name_length(mut self, max: usize) -> Self {
        self.max_name_length = max;
        self
    }
}

/// A namespace-aware pull cursor over XML tokens.
///
/// Depth follows the pull-parser convention: 0 outside the root element, a
/// start tag reports its own depth (the root is 1), and the matching end tag
/// reports the same depth as its start tag.
///
/// Namespace declarations are numbered cumulatively:
/// `namespace_count(d)` is the number of declarations in scope at depth `d`,
/// so the declarations made by the tag at depth `d` are the indices
/// `namespace_count(d - 1)..namespace_count(d)`.
pub trait PullReader {
    /// Returns the kind of the current event.
    fn event_type(&self) -> EventType;

    /// Returns the element depth of the current event.
    fn depth(&self) -> usize;

    /// Returns the local name of the current tag, or the entity name of an
    /// [`EventType::EntityRef`].
    fn name(&self) -> Option<&str>;

    /// Returns the namespace URI of the current tag (`""` for none).
    fn namespace(&self) -> Option<&str>;

    /// Returns the text of a content event.
    fn text(&self) -> Option<&str>;

    /// Returns `true` if the current start tag was written as `<x/>`.
    fn is_empty_element_tag(&self) -> bool;

    /// Returns the number of attributes on the current start tag.
    fn attribute_count(&self) -> usize;

    /// Returns the namespace URI of the attribute at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`XmlError::IndexOutOfRange`] for a bad index.
    fn attribute_namespace(&self, index: usize) -> Result<&str, XmlError>;

    /// Returns the local name of the attribute at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`XmlError::IndexOutOfRange`] for a bad index.
    fn attribute_name(&self, index: usize) -> Result<&str, XmlError>;

    /// Returns the value of the attribute at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`XmlError::IndexOutOfRange`] for a bad index.
    fn attribute_value(&self, index: usize) -> Result<&str, XmlError>;

    /// Returns the cumulative number of namespace declarations at `depth`.
    fn namespace_count(&self, depth: usize) -> usize;

    /// Returns the prefix of declaration `index` (`None` for the default
    /// namespace).
    ///
    /// # Errors
    ///
    /// Returns [`XmlError::IndexOutOfRange`] for a bad index.
    fn namespace_prefix(&self, index: usize) -> Result<Option<&str>, XmlError>;

    /// Returns the namespace URI of declaration `index`.
    ///
    /// # Errors
    ///
    /// Returns [`XmlError::IndexOutOfRange`] for a bad index.
    fn namespace_uri(&self, index: usize) -> Result<&str, XmlError>;

    /// Advances to the next token and returns its kind.
    ///
    /// # Errors
    ///
    /// Returns [`XmlError::Reader`] for malformed input and
    /// [`XmlError::StructuralMismatch`] for an end tag that does not close
    /// the open element.
    fn next_token(&mut self) -> Result<EventType, XmlError>;

    /// Returns the position of the current event, if the reader tracks one.
    fn location(&self) -> SourceLocation {
        SourceLocation::default()
    }

    /// Returns the XML version from the declaration, if any.
    fn version(&self) -> Option<&str> {
        None
    }

    /// Returns the encoding the input was decoded from, if known.
    fn input_encoding(&self) -> Option<&str> {
        None
    }

    /// Returns the `standalone` flag from the declaration, if any.
    fn standalone(&self) -> Option<bool> {
        None
    }

    /// Fails unless the current event is `expected` and, where given, the
    /// current namespace and name match.
    ///
    /// # Errors
    ///
    /// Returns [`XmlError::StructuralMismatch`] describing both events.
    fn require(
        &self,
        expected: EventType,
        namespace: Option<&str>,
        name: Option<&str>,
    ) -> Result<(), XmlError> {
        let kind = self.event_type();
        let namespace_ok = namespace.map_or(true, |ns| self.namespace() == Some(ns));
        let name_ok = name.map_or(true, |n| self.name() == Some(n));
        if kind == expected && namespace_ok && name_ok {
            return Ok(());
        }
        Err(XmlError::StructuralMismatch {
            expected: describe_event(expected, namespace, name),
            found: describe_event(kind, self.namespace(), self.name()),
            location: self.location(),
        })
    }
}

/// Formats an event as `KIND {namespace}name` for diagnostics.
pub(crate) fn describe_event(kind: EventType, namespace: Option<&str>, name: Option<&str>) -> String {
    match (namespace, name) {
        (Some(ns), Some(n)) if !ns.is_empty() => format!("{kind} {{{ns}}}{n}"),
        (_, Some(n)) => format!("{kind} {n}"),
        _ => kind.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_event() {
        assert_eq!(
            describe_event(EventType::EndTag, Some("urn:x"), Some("a")),
            "END_TAG {urn:x}a"
        );
        assert_eq!(describe_event(EventType::EndTag, Some(""), Some("a")), "END_TAG a");
        assert_eq!(describe_event(EventType::Text, None, None), "TEXT");
    }

    #[test]
    fn test_reader_options_builder() {
        let opts = ReaderOptions::default()
            .max_depth(8)
            .max_attributes(2)
            .max_name_length(16);
        assert!(opts.process_namespaces);
        assert_eq!(opts.max_depth, 8);
        assert_eq!(opts.max_attributes, 2);
        assert_eq!(opts.max_name_length, 16);
    }
}
