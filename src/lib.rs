//! # nsdom
//!
//! A namespace-aware XML element tree. Trees are built by pulling tokens
//! from a [`reader::PullReader`] and written back by pushing events into a
//! [`writer::EventWriter`]; the tree itself never touches bytes.
//!
//! Elements keep exactly what the markup said: their local namespace
//! declarations, attributes in source order (duplicates included), and an
//! explicit marker child for `<x></x>` so it is not confused with `<x/>`.
//!
//! ## Quick Start
//!
//! ```
//! use nsdom::Document;
//!
//! let doc = Document::parse_str(r#"<root xmlns:xs="http://ns/x"><child/></root>"#).unwrap();
//! let root = doc.root_element().unwrap();
//! let child = doc.child(root, 0).unwrap();
//! assert_eq!(doc.resolve_namespace(child, Some("xs")), Some("http://ns/x"));
//! ```

pub mod encoding;
pub mod error;
pub mod reader;
pub mod tree;
pub mod util;
pub mod writer;

// Re-export primary types at the crate root for convenience.
pub use error::XmlError;
pub use tree::{
    Attribute, DefaultElementFactory, Document, Element, ElementFactory, InitHook, NodeId,
    NodeKind, NodeType, PrefixDecl,
};
