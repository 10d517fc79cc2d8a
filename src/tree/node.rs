//! Node type definitions.
//!
//! The `NodeKind` enum represents every node that can appear in a tree. Each
//! variant carries the node-type-specific payload; navigation links live in
//! `NodeData`.

use super::Element;

/// The kind of a node and its associated data.
#[derive(Debug, Clone)]
pub enum NodeKind {
    /// The document node. There is exactly one per `Document`.
    Document,

    /// An element node.
    Element(Element),

    /// Character data.
    Text {
        /// The text content, with references already resolved.
        content: String,
    },

    /// A CDATA section.
    CData {
        /// The section content (no escaping applied).
        content: String,
    },

    /// An entity reference that was not replaced.
    EntityRef {
        /// The entity name (without `&` and `;`).
        name: String,
    },

    /// Whitespace that is not element content, and the synthetic empty
    /// child of an element written as `<x></x>`.
    IgnorableWhitespace {
        /// The whitespace (possibly empty).
        content: String,
    },

    /// A processing instruction, e.g. `<?target data?>`.
    ProcessingInstruction {
        /// `target`, or `target data`.
        content: String,
    },

    /// A comment (without the `<!--` and `-->` delimiters).
    Comment {
        /// The comment text.
        content: String,
    },

    /// A document type declaration.
    DocDecl {
        /// Everything between `<!DOCTYPE` and the closing `>`.
        content: String,
    },
}

/// The payload-free tag of a [`NodeKind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeType {
    /// See [`NodeKind::Document`].
    Document,
    /// See [`NodeKind::Element`].
    Element,
    /// See [`NodeKind::Text`].
    Text,
    /// See [`NodeKind::CData`].
    CData,
    /// See [`NodeKind::EntityRef`].
    EntityRef,
    /// See [`NodeKind::IgnorableWhitespace`].
    IgnorableWhitespace,
    /// See [`NodeKind::ProcessingInstruction`].
    ProcessingInstruction,
    /// See [`NodeKind::Comment`].
    Comment,
    /// See [`NodeKind::DocDecl`].
    DocDecl,
}

impl NodeType {
    /// Returns `true` for the character-data kinds: text, CDATA and
    /// ignorable whitespace.
    #[must_use]
    pub fn is_text(self) -> bool {
        matches!(self, Self::Text | Self::CData | Self::IgnorableWhitespace)
    }
}

impl NodeKind {
    /// Returns the payload-free tag of this node.
    #[must_use]
    pub fn node_type(&self) -> NodeType {
        match self {
            Self::Document => NodeType::Document,
            Self::Element(_) => NodeType::Element,
            Self::Text { .. } => NodeType::Text,
            Self::CData { .. } => NodeType::CData,
            Self::EntityRef { .. } => NodeType::EntityRef,
            Self::IgnorableWhitespace { .. } => NodeType::IgnorableWhitespace,
            Self::ProcessingInstruction { .. } => NodeType::ProcessingInstruction,
            Self::Comment { .. } => NodeType::Comment,
            Self::DocDecl { .. } => NodeType::DocDecl,
        }
    }

    /// Returns the string payload of a leaf node (the entity name for
    /// [`NodeKind::EntityRef`]), or `None` for documents and elements.
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Document | Self::Element(_) => None,
            Self::EntityRef { name } => Some(name),
            Self::Text { content }
            | Self::CData { content }
            | Self::IgnorableWhitespace { content }
            | Self::ProcessingInstruction { content }
            | Self::Comment { content }
            | Self::DocDecl { content } => Some(content),
        }
    }

    /// Builds a leaf node of the given type. Returns `None` for
    /// [`NodeType::Document`] and [`NodeType::Element`].
    #[must_use]
    pub fn leaf(kind: NodeType, content: impl Into<String>) -> Option<Self> {
        let content = content.into();
        Some(match kind {
            NodeType::Document | NodeType::Element => return None,
            NodeType::Text => Self::Text { content },
            NodeType::CData => Self::CData { content },
            NodeType::EntityRef => Self::EntityRef { name: content },
            NodeType::IgnorableWhitespace => Self::IgnorableWhitespace { content },
            NodeType::ProcessingInstruction => Self::ProcessingInstruction { content },
            NodeType::Comment => Self::Comment { content },
            NodeType::DocDecl => Self::DocDecl { content },
        })
    }

    /// Returns the element payload, if this is an element.
    #[must_use]
    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Self::Element(element) => Some(element),
            _ => None,
        }
    }
}
