//! Event-based XML writing.
//!
//! The tree emits itself through the [`EventWriter`] trait, one call per
//! token, leaving prefix choice and byte output to the writer.
//! [`XmlWriter`] is the serializer shipped with this crate.
//!
//! # Examples
//!
//! ```
//! use nsdom::writer::{EventWriter, XmlWriter, WriterOptions};
//!
//! let opts = WriterOptions::default().xml_declaration(false);
//! let mut writer = XmlWriter::with_options(Vec::new(), opts);
//! writer.set_prefix(Some("x"), "urn:x").unwrap();
//! writer.start_tag("urn:x", "item").unwrap();
//! writer.attribute("", "id", "7").unwrap();
//! writer.text("a < b").unwrap();
//! writer.end_tag("urn:x", "item").unwrap();
//! writer.end_document().unwrap();
//!
//! let xml = String::from_utf8(writer.into_inner()).unwrap();
//! assert_eq!(xml, r#"<x:item xmlns:x="urn:x" id="7">a &lt; b</x:item>"#);
//! ```

mod xml;

pub use xml::XmlWriter;

use crate::error::XmlError;

/// A sink for XML tokens.
///
/// Namespaces are passed as URIs (`""` for none). The writer decides which
/// prefix to print, honouring declarations queued with
/// [`set_prefix`](Self::set_prefix) and inventing new ones where needed.
pub trait EventWriter {
    /// Declares `prefix` (`None` for the default namespace) for `namespace`
    /// on the next start tag.
    ///
    /// # Errors
    ///
    /// Returns [`XmlError::Io`] if the sink fails.
    fn set_prefix(&mut self, prefix: Option<&str>, namespace: &str) -> Result<(), XmlError>;

    /// Opens an element.
    ///
    /// # Errors
    ///
    /// Returns [`XmlError::Io`] if the sink fails.
    fn start_tag(&mut self, namespace: &str, name: &str) -> Result<(), XmlError>;

    /// Adds an attribute to the start tag just opened.
    ///
    /// # Errors
    ///
    /// Returns [`XmlError::InvalidArgument`] when no start tag is open for
    /// attributes, and [`XmlError::Io`] if the sink fails.
    fn attribute(&mut self, namespace: &str, name: &str, value: &str) -> Result<(), XmlError>;

    /// Closes the innermost open element.
    ///
    /// # Errors
    ///
    /// Returns [`XmlError::StructuralMismatch`] if `namespace`/`name` do not
    /// match the open element.
    fn end_tag(&mut self, namespace: &str, name: &str) -> Result<(), XmlError>;

    /// Writes escaped character data.
    ///
    /// # Errors
    ///
    /// Returns [`XmlError::Io`] if the sink fails.
    fn text(&mut self, text: &str) -> Result<(), XmlError>;

    /// Writes a CDATA section.
    ///
    /// # Errors
    ///
    /// Returns [`XmlError::Io`] if the sink fails.
    fn cdsect(&mut self, text: &str) -> Result<(), XmlError>;

    /// Writes `&name;`.
    ///
    /// # Errors
    ///
    /// Returns [`XmlError::Io`] if the sink fails.
    fn entity_ref(&mut self, name: &str) -> Result<(), XmlError>;

    /// Writes whitespace that is not element content.
    ///
    /// # Errors
    ///
    /// Returns [`XmlError::Io`] if the sink fails.
    fn ignorable_whitespace(&mut self, text: &str) -> Result<(), XmlError>;

    /// Writes `<?text?>`.
    ///
    /// # Errors
    ///
    /// Returns [`XmlError::Io`] if the sink fails.
    fn processing_instruction(&mut self, text: &str) -> Result<(), XmlError>;

    /// Writes `<!--text-->`.
    ///
    /// # Errors
    ///
    /// Returns [`XmlError::Io`] if the sink fails.
    fn comment(&mut self, text: &str) -> Result<(), XmlError>;

    /// Writes `<!DOCTYPE` followed by `text` and `>`.
    ///
    /// # Errors
    ///
    /// Returns [`XmlError::Io`] if the sink fails.
    fn docdecl(&mut self, text: &str) -> Result<(), XmlError>;

    /// Begins a document.
    ///
    /// # Errors
    ///
    /// Returns [`XmlError::Io`] if the sink fails.
    fn start_document(&mut self, encoding: Option<&str>, standalone: Option<bool>) -> Result<(), XmlError>;

    /// Closes every open element and flushes the sink.
    ///
    /// # Errors
    ///
    /// Returns [`XmlError::Io`] if the sink fails.
    fn end_document(&mut self) -> Result<(), XmlError>;
}

/// Options controlling [`XmlWriter`] output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriterOptions {
    /// Write an XML declaration from [`EventWriter::start_document`]
    /// (default: `true`).
    pub xml_declaration: bool,
    /// Stem of invented prefixes; they are numbered from zero (default: `"n"`).
    pub generated_prefix: String,
}

impl Default for WriterOptions {
    fn default() -> Self {
        Self {
            xml_declaration: true,
            generated_prefix: "n".to_string(),
        }
    }
}

impl WriterOptions {
    /// Enables or disables the XML declaration.
    #[must_use]
    pub fn xml_declaration(mut self, enabled: bool) -> Self {
        self.xml_declaration = enabled;
        self
    }

    /// Sets the stem used for invented prefixes.
    #[must_use]
    pub fn generated_prefix(mut self, stem: &str) -> Self {
        self.generated_prefix = stem.to_string();
        self
    }
}
