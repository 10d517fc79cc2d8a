//! Replaying trees into an [`EventWriter`].

use super::{Document, NodeId, NodeKind};
use crate::error::XmlError;
use crate::writer::{EventWriter, WriterOptions, XmlWriter};

impl Document {
    /// Writes the whole document: `start_document`, every top-level node,
    /// then `end_document`.
    ///
    /// # Errors
    ///
    /// Propagates writer errors unchanged.
    pub fn write<W: EventWriter + ?Sized>(&self, writer: &mut W) -> Result<(), XmlError> {
        writer.start_document(self.encoding.as_deref(), self.standalone)?;
        self.write_children(self.root(), writer)?;
        writer.end_document()
    }

    /// Writes element `id`: its prefix declarations in stored order, the
    /// start tag, its attributes in stored order, its children, and the end
    /// tag. Nothing is reordered, merged or validated.
    ///
    /// # Errors
    ///
    /// Returns [`XmlError::InvalidArgument`] if `id` is not an element, and
    /// propagates writer errors unchanged.
    pub fn write_element<W: EventWriter + ?Sized>(&self, id: NodeId, writer: &mut W) -> Result<(), XmlError> {
        let element = self.expect_element(id)?;
        for decl in element.prefixes() {
            writer.set_prefix(decl.prefix.as_deref(), &decl.namespace)?;
        }
        writer.start_tag(element.namespace(), element.name())?;
        for attr in element.attributes() {
            writer.attribute(&attr.namespace, &attr.name, &attr.value)?;
        }
        self.write_children(id, writer)?;
        writer.end_tag(element.namespace(), element.name())
    }

    /// Writes every child of `parent` in order, dispatching on node kind.
    ///
    /// # Errors
    ///
    /// Propagates writer errors unchanged.
    pub fn write_children<W: EventWriter + ?Sized>(&self, parent: NodeId, writer: &mut W) -> Result<(), XmlError> {
        for child in self.children(parent) {
            match &self.node(child).kind {
                NodeKind::Element(_) => self.write_element(child, writer)?,
                NodeKind::Text { content } => writer.text(content)?,
                NodeKind::CData { content } => writer.cdsect(content)?,
                NodeKind::EntityRef { name } => writer.entity_ref(name)?,
                NodeKind::IgnorableWhitespace { content } => writer.ignorable_whitespace(content)?,
                NodeKind::ProcessingInstruction { content } => writer.processing_instruction(content)?,
                NodeKind::Comment { content } => writer.comment(content)?,
                NodeKind::DocDecl { content } => writer.docdecl(content)?,
                NodeKind::Document => {
                    return Err(XmlError::InvalidArgument(
                        "document node found inside the tree".into(),
                    ))
                }
            }
        }
        Ok(())
    }

    /// Serializes the document to a string with default [`WriterOptions`].
    ///
    /// # Errors
    ///
    /// Propagates writer errors unchanged.
    ///
    /// # Examples
    ///
    /// ```
    /// use nsdom::Document;
    ///
    /// let doc = Document::parse_str(r#"<a xmlns="urn:a"><b>x</b><c></c></a>"#).unwrap();
    /// assert_eq!(
    ///     doc.to_xml_string().unwrap(),
    ///     r#"<?xml version="1.0"?><a xmlns="urn:a"><b>x</b><c></c></a>"#
    /// );
    /// ```
    pub fn to_xml_string(&self) -> Result<String, XmlError> {
        self.to_xml_string_with_options(WriterOptions::default())
    }

    /// Serializes the document to a string.
    ///
    /// # Errors
    ///
    /// Propagates writer errors unchanged.
    pub fn to_xml_string_with_options(&self, options: WriterOptions) -> Result<String, XmlError> {
        let mut writer = XmlWriter::with_options(Vec::new(), options);
        self.write(&mut writer)?;
        into_string(writer.into_inner())
    }

    /// Serializes a single element (and its subtree) without a declaration.
    ///
    /// Prefixes the element uses but does not declare itself are invented
    /// by the writer.
    ///
    /// # Errors
    ///
    /// Returns [`XmlError::InvalidArgument`] if `id` is not an element.
    pub fn element_to_string(&self, id: NodeId) -> Result<String, XmlError> {
        let mut writer = XmlWriter::with_options(Vec::new(), WriterOptions::default().xml_declaration(false));
        self.write_element(id, &mut writer)?;
        writer.end_document()?;
        into_string(writer.into_inner())
    }
}

fn into_string(bytes: Vec<u8>) -> Result<String, XmlError> {
    String::from_utf8(bytes).map_err(|e| XmlError::Encoding(e.to_string()))
}
