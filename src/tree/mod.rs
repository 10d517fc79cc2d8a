//! Arena-based, namespace-aware XML tree.
//!
//! All nodes live in a contiguous `Vec<NodeData>` owned by the `Document`,
//! and are referenced by `NodeId`, a newtype over `NonZeroU32`. Navigation
//! links (parent, first\_child, last\_child, next\_sibling, prev\_sibling)
//! are arena indices, so the parent back-reference never owns anything and
//! dropping the `Document` frees every node at once.
//!
//! Element payloads ([`Element`]) hold the name, namespace, attributes and
//! local prefix declarations. Everything that needs the tree shape
//! (namespace resolution, factory forwarding, child-sequence access) is a
//! `Document` method taking a `NodeId`.
//!
//! Reading from a [`PullReader`](crate::reader::PullReader) is in
//! `build.rs`; writing to an [`EventWriter`](crate::writer::EventWriter) is
//! in `emit.rs`.

mod build;
mod element;
mod emit;
mod factory;
mod node;

pub use element::{Attribute, Element, InitHook, PrefixDecl};
pub use factory::{DefaultElementFactory, ElementFactory};
pub use node::{NodeKind, NodeType};

use std::fmt;
use std::num::NonZeroU32;
use std::rc::Rc;

use crate::error::XmlError;

/// A typed index into the document's node arena.
///
/// `NodeId` is a newtype over `NonZeroU32`, meaning it can never be zero
/// and `Option<NodeId>` has the same size as `NodeId`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct NodeId(NonZeroU32);

impl NodeId {
    /// Creates a `NodeId` from a raw arena index.
    ///
    /// # Panics
    ///
    /// Panics if `index` is 0.
    #[allow(clippy::expect_used, clippy::cast_possible_truncation)]
    fn from_index(index: usize) -> Self {
        Self(NonZeroU32::new(index as u32).expect("NodeId index must be non-zero"))
    }

    fn as_index(self) -> usize {
        self.0.get() as usize
    }
}

/// Storage for a single node in the document arena.
#[derive(Debug, Clone)]
pub struct NodeData {
    /// What kind of node this is and its payload.
    pub kind: NodeKind,
    /// Parent node, if any. The document node has no parent.
    pub parent: Option<NodeId>,
    /// First child node.
    pub first_child: Option<NodeId>,
    /// Last child node (for O(1) append).
    pub last_child: Option<NodeId>,
    /// Next sibling.
    pub next_sibling: Option<NodeId>,
    /// Previous sibling.
    pub prev_sibling: Option<NodeId>,
}

impl NodeData {
    fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            parent: None,
            first_child: None,
            last_child: None,
            next_sibling: None,
            prev_sibling: None,
        }
    }
}

/// An XML document: the node arena, the declaration properties, and the
/// element factory used for every element created in it.
///
/// # Examples
///
/// ```
/// use nsdom::Document;
///
/// let doc = Document::parse_str(r#"<a xmlns:x="urn:x"><x:b/></a>"#).unwrap();
/// let a = doc.root_element().unwrap();
/// let b = doc.child(a, 0).unwrap();
/// assert_eq!(doc.element(b).unwrap().namespace(), "urn:x");
/// assert_eq!(doc.resolve_namespace(b, Some("x")), Some("urn:x"));
/// ```
pub struct Document {
    /// The node arena. Index 0 is unused (placeholder for `NonZeroU32`).
    nodes: Vec<NodeData>,
    /// The document node id (not the root element).
    root: NodeId,
    /// XML version from the declaration, e.g. "1.0".
    pub version: Option<String>,
    /// Encoding reported by the reader.
    pub encoding: Option<String>,
    /// Standalone flag from the declaration.
    pub standalone: Option<bool>,
    factory: Rc<dyn ElementFactory>,
}

impl Document {
    /// Creates an empty document using [`DefaultElementFactory`].
    #[must_use]
    pub fn new() -> Self {
        Self::with_factory(Rc::new(DefaultElementFactory))
    }

    /// Creates an empty document whose elements come from `factory`.
    #[must_use]
    pub fn with_factory(factory: Rc<dyn ElementFactory>) -> Self {
        let mut nodes = Vec::with_capacity(64);
        // Index 0: placeholder (NodeId uses NonZeroU32)
        nodes.push(NodeData::new(NodeKind::Document));
        nodes.push(NodeData::new(NodeKind::Document));
        Self {
            nodes,
            root: NodeId::from_index(1),
            version: None,
            encoding: None,
            standalone: None,
            factory,
        }
    }

    /// Returns the element factory.
    #[must_use]
    pub fn factory(&self) -> &Rc<dyn ElementFactory> {
        &self.factory
    }

    /// Replaces the element factory. Existing elements are unaffected.
    pub fn set_factory(&mut self, factory: Rc<dyn ElementFactory>) {
        self.factory = factory;
    }

    /// Returns the document node id.
    #[must_use]
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Returns the first element child of the document node.
    #[must_use]
    pub fn root_element(&self) -> Option<NodeId> {
        self.children(self.root)
            .find(|&id| matches!(self.node(id).kind, NodeKind::Element(_)))
    }

    /// Returns a reference to the `NodeData` for the given node.
    ///
    /// # Panics
    ///
    /// Panics if `id` does not belong to this document.
    #[must_use]
    pub fn node(&self, id: NodeId) -> &NodeData {
        &self.nodes[id.as_index()]
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut NodeData {
        &mut self.nodes[id.as_index()]
    }

    /// Returns the payload-free type of a node.
    #[must_use]
    pub fn node_type(&self, id: NodeId) -> NodeType {
        self.node(id).kind.node_type()
    }

    /// Returns the element payload of `id`, or `None` if it is not an element.
    #[must_use]
    pub fn element(&self, id: NodeId) -> Option<&Element> {
        self.node(id).kind.as_element()
    }

    /// Returns the mutable element payload of `id`.
    pub fn element_mut(&mut self, id: NodeId) -> Option<&mut Element> {
        match &mut self.node_mut(id).kind {
            NodeKind::Element(element) => Some(element),
            _ => None,
        }
    }

    fn expect_element(&self, id: NodeId) -> Result<&Element, XmlError> {
        self.element(id)
            .ok_or_else(|| XmlError::InvalidArgument(format!("node {id:?} is not an element")))
    }

    fn is_container(&self, id: NodeId) -> bool {
        matches!(
            self.node(id).kind,
            NodeKind::Document | NodeKind::Element(_)
        )
    }

    // --- Navigation ---

    /// Returns the parent of a node.
    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    /// Returns the parent of a node if that parent is an element.
    #[must_use]
    pub fn parent_element(&self, id: NodeId) -> Option<NodeId> {
        self.parent(id).filter(|&p| self.element(p).is_some())
    }

    /// Returns the document node `id` is attached to, walking up through
    /// elements. Returns `None` for detached nodes.
    #[must_use]
    pub fn document_of(&self, id: NodeId) -> Option<NodeId> {
        self.ancestors(id)
            .skip(1)
            .find(|&a| self.element(a).is_none())
            .filter(|&a| matches!(self.node(a).kind, NodeKind::Document))
    }

    /// Returns the first child of a node.
    #[must_use]
    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).first_child
    }

    /// Returns the last child of a node.
    #[must_use]
    pub fn last_child(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).last_child
    }

    /// Returns the next sibling of a node.
    #[must_use]
    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).next_sibling
    }

    /// Returns the previous sibling of a node.
    #[must_use]
    pub fn prev_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).prev_sibling
    }

    /// Returns an iterator over the children of a node.
    pub fn children(&self, id: NodeId) -> Children<'_> {
        Children {
            doc: self,
            next: self.node(id).first_child,
        }
    }

    /// Returns an iterator over a node and its ancestors (walking up to root).
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        Ancestors {
            doc: self,
            next: Some(id),
        }
    }

    // --- Namespaces ---

    /// Resolves `prefix` (`None` for the default namespace) from the
    /// declarations of `id` and then of each ancestor element in turn.
    ///
    /// Returns `None` if no element up to the top of the element chain
    /// declares the prefix. Only explicit declarations count: neither `xml`
    /// nor an undeclared default namespace resolves.
    #[must_use]
    pub fn resolve_namespace(&self, id: NodeId, prefix: Option<&str>) -> Option<&str> {
        let mut current = Some(id);
        while let Some(node) = current {
            let element = self.element(node)?;
            if let Some(uri) = element.local_namespace(prefix) {
                return Some(uri);
            }
            current = self.parent_element(node);
        }
        None
    }

    // --- Creation ---

    /// Allocates a detached node.
    pub fn create_node(&mut self, kind: NodeKind) -> NodeId {
        let index = self.nodes.len();
        self.nodes.push(NodeData::new(kind));
        NodeId::from_index(index)
    }

    /// Creates a detached element on behalf of `context`.
    ///
    /// If `context` is attached to this document (or is the document node)
    /// the document's factory builds the element; otherwise
    /// [`DefaultElementFactory`] does.
    pub fn create_element(&mut self, context: NodeId, namespace: &str, name: &str) -> NodeId {
        let attached = self.ancestors(context).any(|a| a == self.root);
        let element = if attached {
            self.factory.create_element(namespace, name)
        } else {
            DefaultElementFactory.create_element(namespace, name)
        };
        self.create_node(NodeKind::Element(element))
    }

    /// Creates a detached leaf node of the given type.
    ///
    /// # Errors
    ///
    /// Returns [`XmlError::InvalidArgument`] for [`NodeType::Document`] and
    /// [`NodeType::Element`].
    pub fn create_text(&mut self, kind: NodeType, content: &str) -> Result<NodeId, XmlError> {
        let kind = NodeKind::leaf(kind, content).ok_or_else(|| {
            XmlError::InvalidArgument(format!("{kind:?} is not a leaf node type"))
        })?;
        Ok(self.create_node(kind))
    }

    // --- Child sequence ---

    /// Returns the number of children of a node.
    #[must_use]
    pub fn child_count(&self, parent: NodeId) -> usize {
        self.children(parent).count()
    }

    /// Returns child `index` of `parent`.
    ///
    /// # Errors
    ///
    /// Returns [`XmlError::IndexOutOfRange`] for a bad index.
    pub fn child(&self, parent: NodeId, index: usize) -> Result<NodeId, XmlError> {
        self.children(parent)
            .nth(index)
            .ok_or_else(|| XmlError::IndexOutOfRange {
                index,
                len: self.child_count(parent),
            })
    }

    /// Returns the type of child `index`.
    ///
    /// # Errors
    ///
    /// Returns [`XmlError::IndexOutOfRange`] for a bad index.
    pub fn child_kind(&self, parent: NodeId, index: usize) -> Result<NodeType, XmlError> {
        Ok(self.node_type(self.child(parent, index)?))
    }

    /// Returns `true` if child `index` is text, CDATA or ignorable whitespace.
    ///
    /// # Errors
    ///
    /// Returns [`XmlError::IndexOutOfRange`] for a bad index.
    pub fn is_text(&self, parent: NodeId, index: usize) -> Result<bool, XmlError> {
        Ok(self.child_kind(parent, index)?.is_text())
    }

    /// Returns the content of child `index` if it is a text-like node.
    ///
    /// # Errors
    ///
    /// Returns [`XmlError::IndexOutOfRange`] for a bad index.
    pub fn child_text(&self, parent: NodeId, index: usize) -> Result<Option<&str>, XmlError> {
        let child = self.child(parent, index)?;
        let kind = &self.node(child).kind;
        Ok(if kind.node_type().is_text() {
            kind.text()
        } else {
            None
        })
    }

    /// Returns child `index` if it is an element.
    ///
    /// # Errors
    ///
    /// Returns [`XmlError::IndexOutOfRange`] for a bad index.
    pub fn element_child(&self, parent: NodeId, index: usize) -> Result<Option<NodeId>, XmlError> {
        let child = self.child(parent, index)?;
        Ok(self.element(child).map(|_| child))
    }

    /// Returns the index of the first element child at or after `start`
    /// named `name` in `namespace` (`None` matches any namespace).
    #[must_use]
    pub fn index_of(
        &self,
        parent: NodeId,
        namespace: Option<&str>,
        name: &str,
        start: usize,
    ) -> Option<usize> {
        self.children(parent)
            .enumerate()
            .skip(start)
            .find(|&(_, child)| {
                self.element(child).is_some_and(|el| {
                    el.name() == name && namespace.map_or(true, |ns| el.namespace() == ns)
                })
            })
            .map(|(index, _)| index)
    }

    /// Returns the first element child named `name` in `namespace`.
    #[must_use]
    pub fn find_element(&self, parent: NodeId, namespace: Option<&str>, name: &str) -> Option<NodeId> {
        self.index_of(parent, namespace, name, 0)
            .and_then(|index| self.children(parent).nth(index))
    }

    /// Appends `child` to `parent`.
    ///
    /// # Errors
    ///
    /// See [`insert_child`](Self::insert_child).
    pub fn add_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), XmlError> {
        let len = self.child_count(parent);
        self.insert_child(parent, len, child)
    }

    /// Inserts `child` so that it becomes child `index` of `parent`.
    ///
    /// # Errors
    ///
    /// Returns [`XmlError::IndexOutOfRange`] if `index` exceeds the child
    /// count, and [`XmlError::InvalidArgument`] if `parent` cannot hold
    /// children, `child` is attached or is a document, or the insertion
    /// would make a node its own ancestor.
    pub fn insert_child(&mut self, parent: NodeId, index: usize, child: NodeId) -> Result<(), XmlError> {
        if !self.is_container(parent) {
            return Err(XmlError::InvalidArgument(format!(
                "node {parent:?} cannot have children"
            )));
        }
        if self.node(child).parent.is_some() {
            return Err(XmlError::InvalidArgument(format!(
                "node {child:?} already has a parent; remove it first"
            )));
        }
        if matches!(self.node(child).kind, NodeKind::Document) {
            return Err(XmlError::InvalidArgument(
                "a document cannot be a child".into(),
            ));
        }
        if self.ancestors(parent).any(|a| a == child) {
            return Err(XmlError::InvalidArgument(format!(
                "node {child:?} is an ancestor of {parent:?}"
            )));
        }

        let len = self.child_count(parent);
        if index > len {
            return Err(XmlError::IndexOutOfRange { index, len });
        }
        match self.children(parent).nth(index) {
            Some(reference) => self.insert_before(reference, child),
            None => self.append_child(parent, child),
        }
        Ok(())
    }

    /// Detaches child `index` of `parent` and returns it. The node stays
    /// allocated and can be attached again.
    ///
    /// # Errors
    ///
    /// Returns [`XmlError::IndexOutOfRange`] for a bad index.
    pub fn remove_child(&mut self, parent: NodeId, index: usize) -> Result<NodeId, XmlError> {
        let child = self.child(parent, index)?;
        self.detach(child);
        Ok(child)
    }

    /// Overwrites the parent link of `id` and nothing else.
    ///
    /// The sibling links and the old and new parents' child lists are left
    /// alone, so calling this on an attached node, or pointing a node at a
    /// parent that does not list it, leaves the tree inconsistent. Use
    /// [`add_child`](Self::add_child) and [`remove_child`](Self::remove_child)
    /// to move nodes.
    pub fn set_parent(&mut self, id: NodeId, parent: Option<NodeId>) {
        self.node_mut(id).parent = parent;
    }

    /// Removes every attribute and every child of `id`. Name, namespace,
    /// parent and prefix declarations are kept.
    pub fn clear(&mut self, id: NodeId) {
        while let Some(child) = self.first_child(id) {
            self.detach(child);
        }
        if let Some(element) = self.element_mut(id) {
            element.clear_attributes();
        }
    }

    pub(crate) fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.node_mut(child).parent = Some(parent);

        if let Some(last) = self.node(parent).last_child {
            self.node_mut(last).next_sibling = Some(child);
            self.node_mut(child).prev_sibling = Some(last);
            self.node_mut(parent).last_child = Some(child);
        } else {
            self.node_mut(parent).first_child = Some(child);
            self.node_mut(parent).last_child = Some(child);
        }
    }

    /// Links `new_child` in before `reference`, which must be attached.
    fn insert_before(&mut self, reference: NodeId, new_child: NodeId) {
        let Some(parent) = self.node(reference).parent else {
            return;
        };
        self.node_mut(new_child).parent = Some(parent);

        if let Some(prev) = self.node(reference).prev_sibling {
            self.node_mut(prev).next_sibling = Some(new_child);
            self.node_mut(new_child).prev_sibling = Some(prev);
        } else {
            self.node_mut(parent).first_child = Some(new_child);
        }

        self.node_mut(new_child).next_sibling = Some(reference);
        self.node_mut(reference).prev_sibling = Some(new_child);
    }

    /// Unlinks a node from its parent (but does not free it from the arena).
    pub(crate) fn detach(&mut self, id: NodeId) {
        let Some(parent) = self.node(id).parent else {
            return;
        };

        let prev = self.node(id).prev_sibling;
        let next = self.node(id).next_sibling;

        match prev {
            Some(p) => self.node_mut(p).next_sibling = next,
            None => self.node_mut(parent).first_child = next,
        }

        match next {
            Some(n) => self.node_mut(n).prev_sibling = prev,
            None => self.node_mut(parent).last_child = prev,
        }

        self.node_mut(id).parent = None;
        self.node_mut(id).prev_sibling = None;
        self.node_mut(id).next_sibling = None;
    }

    /// Returns the total number of nodes in the arena, detached ones included.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len() - 1 // subtract placeholder at index 0
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("nodes", &self.node_count())
            .field("version", &self.version)
            .field("encoding", &self.encoding)
            .field("standalone", &self.standalone)
            .finish_non_exhaustive()
    }
}

// --- Iterators ---

/// Iterator over the children of a node.
pub struct Children<'a> {
    doc: &'a Document,
    next: Option<NodeId>,
}

impl Iterator for Children<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = self.doc.node(current).next_sibling;
        Some(current)
    }
}

/// Iterator over a node and its ancestors.
pub struct Ancestors<'a> {
    doc: &'a Document,
    next: Option<NodeId>,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = self.doc.node(current).parent;
        Some(current)
    }
}
