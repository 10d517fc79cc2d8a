//! Building trees from a [`PullReader`].

use std::rc::Rc;

use super::{Document, ElementFactory, NodeId, NodeKind, NodeType};
use crate::encoding;
use crate::error::XmlError;
use crate::reader::{EventType, PullReader, ReaderOptions, XmlPullReader};

/// Maps a content event to the node type it produces.
fn content_type(event: EventType) -> Option<NodeType> {
    Some(match event {
        EventType::Text | EventType::EntityRef => NodeType::Text,
        EventType::CData => NodeType::CData,
        EventType::IgnorableWhitespace => NodeType::IgnorableWhitespace,
        EventType::ProcessingInstruction => NodeType::ProcessingInstruction,
        EventType::Comment => NodeType::Comment,
        EventType::DocDecl => NodeType::DocDecl,
        EventType::StartDocument
        | EventType::EndDocument
        | EventType::StartTag
        | EventType::EndTag => return None,
    })
}

impl Document {
    /// Parses a whole document from a reader positioned at
    /// [`EventType::StartDocument`].
    ///
    /// # Errors
    ///
    /// Propagates every reader error unchanged; a reader that is not at the
    /// start of the document, or that stops before its end, yields
    /// [`XmlError::StructuralMismatch`].
    pub fn parse<R: PullReader + ?Sized>(reader: &mut R) -> Result<Self, XmlError> {
        let mut doc = Self::new();
        doc.parse_into(reader)?;
        Ok(doc)
    }

    /// Parses a UTF-8 string with default [`ReaderOptions`].
    ///
    /// # Errors
    ///
    /// Returns an error if the input is not well-formed.
    ///
    /// # Examples
    ///
    /// ```
    /// use nsdom::Document;
    ///
    /// let doc = Document::parse_str("<root><child>Hello</child></root>").unwrap();
    /// let root = doc.root_element().unwrap();
    /// assert_eq!(doc.element(root).unwrap().name(), "root");
    /// ```
    pub fn parse_str(input: &str) -> Result<Self, XmlError> {
        Self::parse_with_options(input, ReaderOptions::default())
    }

    /// Parses a UTF-8 string with the given reader options.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is not well-formed.
    pub fn parse_with_options(input: &str, options: ReaderOptions) -> Result<Self, XmlError> {
        let mut reader = XmlPullReader::with_options(input, options);
        Self::parse(&mut reader)
    }

    /// Parses raw bytes, detecting the encoding from a byte order mark or
    /// the XML declaration.
    ///
    /// # Errors
    ///
    /// Returns [`XmlError::Encoding`] if the bytes cannot be decoded, or any
    /// parse error.
    ///
    /// # Examples
    ///
    /// ```
    /// use nsdom::Document;
    ///
    /// let doc = Document::parse_bytes(b"\xEF\xBB\xBF<root/>").unwrap();
    /// assert!(doc.root_element().is_some());
    /// ```
    pub fn parse_bytes(input: &[u8]) -> Result<Self, XmlError> {
        let decoded = encoding::decode(input)?;
        let mut doc = Self::parse_str(&decoded.text)?;
        if doc.encoding.is_none() {
            doc.encoding = Some(decoded.encoding.to_string());
        }
        Ok(doc)
    }

    /// Parses `input` into this (normally empty) document, keeping its
    /// factory.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is not well-formed.
    pub fn parse_into_str(&mut self, input: &str) -> Result<(), XmlError> {
        let mut reader = XmlPullReader::new(input);
        self.parse_into(&mut reader)
    }

    /// Parses a whole document into this one: requires
    /// [`EventType::StartDocument`], records the declaration properties,
    /// reads every top-level node, then requires [`EventType::EndDocument`].
    ///
    /// The document must not have any top-level nodes yet.
    ///
    /// # Errors
    ///
    /// Returns [`XmlError::InvalidArgument`] if the document already has
    /// content, and propagates every reader error unchanged.
    pub fn parse_into<R: PullReader + ?Sized>(&mut self, reader: &mut R) -> Result<(), XmlError> {
        let root = self.root();
        if self.first_child(root).is_some() {
            return Err(XmlError::InvalidArgument(
                "cannot parse into a document that already has content".into(),
            ));
        }
        reader.require(EventType::StartDocument, None, None)?;
        reader.next_token()?;

        self.version = reader.version().map(str::to_string);
        self.encoding = reader.input_encoding().map(str::to_string);
        self.standalone = reader.standalone();

        self.parse_children(root, reader)?;
        reader.require(EventType::EndDocument, None, None)?;

        tracing::debug!(nodes = self.node_count(), "parsed document");
        Ok(())
    }

    /// Creates an element for the start tag the reader is on, appends it to
    /// `parent`, and parses it. Returns the new element.
    ///
    /// On failure the element is detached from `parent` again.
    ///
    /// # Errors
    ///
    /// Propagates every reader error unchanged.
    pub fn parse_child_element<R: PullReader + ?Sized>(
        &mut self,
        parent: NodeId,
        reader: &mut R,
    ) -> Result<NodeId, XmlError> {
        reader.require(EventType::StartTag, None, None)?;
        let namespace = reader.namespace().unwrap_or_default().to_string();
        let name = reader.name().unwrap_or_default().to_string();

        let child = self.create_element(parent, &namespace, &name);
        self.add_child(parent, child)?;
        if let Err(err) = self.parse_element(child, reader) {
            self.detach(child);
            return Err(err);
        }
        Ok(child)
    }

    /// Reads content into `parent` until an end tag or the end of the
    /// document, leaving the reader on that event.
    ///
    /// Start tags become elements (created through the document factory and
    /// attached before they are parsed, so their namespace lookups see the
    /// enclosing elements). Text-bearing events become leaf nodes of the
    /// matching type; an entity reference that carries replacement text
    /// becomes text, one that carries only a name becomes an
    /// [`NodeKind::EntityRef`].
    ///
    /// # Errors
    ///
    /// Propagates every reader error unchanged.
    pub fn parse_children<R: PullReader + ?Sized>(
        &mut self,
        parent: NodeId,
        reader: &mut R,
    ) -> Result<(), XmlError> {
        loop {
            let event = reader.event_type();
            match event {
                EventType::EndTag | EventType::EndDocument => return Ok(()),
                EventType::StartTag => {
                    self.parse_child_element(parent, reader)?;
                    continue;
                }
                _ => {}
            }

            let leaf = match (reader.text(), content_type(event)) {
                (Some(text), Some(kind)) => NodeKind::leaf(kind, text),
                (None, _) if event == EventType::EntityRef => reader
                    .name()
                    .map(|name| NodeKind::EntityRef { name: name.to_string() }),
                _ => None,
            };
            if let Some(kind) = leaf {
                let child = self.create_node(kind);
                self.append_child(parent, child);
            }
            reader.next_token()?;
        }
    }

    /// Fills element `id` from the start tag the reader is on and consumes
    /// everything up to and including the matching end tag.
    ///
    /// The element takes the tag's name and namespace, the namespace
    /// declarations made on the tag itself, and its attributes in source
    /// order; then its init hook runs. A tag that is not self-closing but
    /// has no content gets a single empty
    /// [`NodeKind::IgnorableWhitespace`] child, so `<x></x>` and `<x/>`
    /// stay distinguishable.
    ///
    /// # Errors
    ///
    /// Returns [`XmlError::InvalidArgument`] if `id` is not an element,
    /// [`XmlError::StructuralMismatch`] if the reader is not on a start tag
    /// or the end tag does not match the element, and propagates every
    /// other reader error unchanged.
    pub fn parse_element<R: PullReader + ?Sized>(
        &mut self,
        id: NodeId,
        reader: &mut R,
    ) -> Result<(), XmlError> {
        reader.require(EventType::StartTag, None, None)?;
        let depth = reader.depth();

        let mut prefixes = Vec::new();
        for i in reader.namespace_count(depth.saturating_sub(1))..reader.namespace_count(depth) {
            prefixes.push((reader.namespace_prefix(i)?, reader.namespace_uri(i)?));
        }
        let mut attributes = Vec::with_capacity(reader.attribute_count());
        for i in 0..reader.attribute_count() {
            attributes.push((
                reader.attribute_namespace(i)?,
                reader.attribute_name(i)?,
                reader.attribute_value(i)?,
            ));
        }

        let element = self
            .element_mut(id)
            .ok_or_else(|| XmlError::InvalidArgument(format!("node {id:?} is not an element")))?;
        element.set_name(reader.name().unwrap_or_default());
        element.set_namespace(Some(reader.namespace().unwrap_or_default()))?;
        for (prefix, uri) in prefixes {
            element.set_prefix(prefix, uri);
        }
        for (namespace, name, value) in attributes {
            element.set_attribute(namespace, name, value);
        }
        element.run_init();
        tracing::trace!(name = element.name(), depth, "parsing element");

        let empty = reader.is_empty_element_tag();
        reader.next_token()?;
        if !empty {
            self.parse_children(id, reader)?;
            if self.child_count(id) == 0 {
                let placeholder = self.create_node(NodeKind::IgnorableWhitespace {
                    content: String::new(),
                });
                self.append_child(id, placeholder);
            }
        }

        let element = self.expect_element(id)?;
        reader.require(
            EventType::EndTag,
            Some(element.namespace()),
            Some(element.name()),
        )?;
        reader.next_token()?;
        Ok(())
    }

    /// Creates a document whose elements come from `factory` and parses
    /// `reader` into it.
    ///
    /// # Errors
    ///
    /// Propagates every reader error unchanged.
    pub fn parse_with_factory<R: PullReader + ?Sized>(
        reader: &mut R,
        factory: Rc<dyn ElementFactory>,
    ) -> Result<Self, XmlError> {
        let mut doc = Self::with_factory(factory);
        doc.parse_into(reader)?;
        Ok(doc)
    }
}
