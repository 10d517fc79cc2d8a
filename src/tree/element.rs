//! The element payload: name, namespace, attributes and local prefix
//! declarations.
//!
//! An [`Element`] knows nothing about its place in the tree; parent and
//! child links live in the [`Document`](super::Document) arena, which is
//! where namespace resolution and the other tree-aware operations are.

use std::fmt;
use std::rc::Rc;

use crate::error::{check_index, XmlError};

/// An attribute as stored on an element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    /// Namespace URI (`""` for none).
    pub namespace: String,
    /// Local name.
    pub name: String,
    /// Value, with references resolved.
    pub value: String,
}

/// A namespace declaration made on an element itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrefixDecl {
    /// The declared prefix; `None` declares the default namespace.
    pub prefix: Option<String>,
    /// The namespace URI.
    pub namespace: String,
}

/// Post-construction hook installed by an [`ElementFactory`](super::ElementFactory).
///
/// It runs once per parsed element, after the name, namespace, attributes
/// and prefix declarations are populated and before any child is read.
pub type InitHook = Rc<dyn Fn(&mut Element)>;

/// A namespace-aware element.
///
/// Attributes and prefix declarations are append-only sequences:
/// [`set_attribute`](Self::set_attribute) never overwrites, and lookups
/// return the first match.
///
/// # Examples
///
/// ```
/// use nsdom::Element;
///
/// let mut el = Element::new("urn:x", "item");
/// el.set_attribute("", "id", "1");
/// el.set_attribute("", "id", "2");
/// assert_eq!(el.attribute_count(), 2);
/// assert_eq!(el.attribute_value(None, "id"), Some("1"));
/// ```
#[derive(Clone, Default)]
pub struct Element {
    namespace: String,
    name: String,
    attributes: Vec<Attribute>,
    prefixes: Vec<PrefixDecl>,
    init: Option<InitHook>,
}

impl Element {
    /// Creates an element with no attributes and no declarations.
    #[must_use]
    pub fn new(namespace: &str, name: &str) -> Self {
        Self {
            namespace: namespace.to_string(),
            name: name.to_string(),
            ..Self::default()
        }
    }

    /// Installs the hook run by [`run_init`](Self::run_init).
    #[must_use]
    pub fn with_init(mut self, hook: InitHook) -> Self {
        self.init = Some(hook);
        self
    }

    /// Returns `true` if an init hook is installed.
    #[must_use]
    pub fn has_init(&self) -> bool {
        self.init.is_some()
    }

    /// Runs the init hook, if any.
    pub fn run_init(&mut self) {
        if let Some(hook) = self.init.clone() {
            hook(self);
        }
    }

    // --- Identity ---

    /// Returns the local name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the namespace URI (`""` for none).
    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Replaces the local name.
    pub fn set_name(&mut self, name: &str) {
        self.name = name.to_string();
    }

    /// Replaces the namespace URI.
    ///
    /// # Errors
    ///
    /// Returns [`XmlError::InvalidArgument`] for `None`; pass `Some("")` for
    /// "no namespace".
    pub fn set_namespace(&mut self, namespace: Option<&str>) -> Result<(), XmlError> {
        let namespace = namespace.ok_or_else(|| {
            XmlError::InvalidArgument("namespace must not be absent; use \"\" for none".into())
        })?;
        self.namespace = namespace.to_string();
        Ok(())
    }

    // --- Attributes ---

    /// Returns the number of attributes.
    #[must_use]
    pub fn attribute_count(&self) -> usize {
        self.attributes.len()
    }

    /// Returns all attributes in insertion order.
    #[must_use]
    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    fn attribute_at(&self, index: usize) -> Result<&Attribute, XmlError> {
        check_index(index, self.attributes.len())?;
        Ok(&self.attributes[index])
    }

    /// Returns the namespace of attribute `index`.
    ///
    /// # Errors
    ///
    /// Returns [`XmlError::IndexOutOfRange`] for a bad index.
    pub fn attribute_namespace(&self, index: usize) -> Result<&str, XmlError> {
        Ok(&self.attribute_at(index)?.namespace)
    }

    /// Returns the local name of attribute `index`.
    ///
    /// # Errors
    ///
    /// Returns [`XmlError::IndexOutOfRange`] for a bad index.
    pub fn attribute_name(&self, index: usize) -> Result<&str, XmlError> {
        Ok(&self.attribute_at(index)?.name)
    }

    /// Returns the value of attribute `index`.
    ///
    /// # Errors
    ///
    /// Returns [`XmlError::IndexOutOfRange`] for a bad index.
    pub fn attribute_value_at(&self, index: usize) -> Result<&str, XmlError> {
        Ok(&self.attribute_at(index)?.value)
    }

    /// Returns the value of the first attribute named `name` in `namespace`.
    /// A `None` namespace matches any namespace.
    #[must_use]
    pub fn attribute_value(&self, namespace: Option<&str>, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.name == name && namespace.map_or(true, |ns| a.namespace == ns))
            .map(|a| a.value.as_str())
    }

    /// Appends an attribute. Existing attributes with the same name are kept.
    pub fn set_attribute(&mut self, namespace: &str, name: &str, value: &str) {
        self.attributes.push(Attribute {
            namespace: namespace.to_string(),
            name: name.to_string(),
            value: value.to_string(),
        });
    }

    /// Removes every attribute.
    pub fn clear_attributes(&mut self) {
        self.attributes.clear();
    }

    // --- Local namespace declarations ---

    /// Returns the number of namespace declarations made on this element.
    #[must_use]
    pub fn namespace_count(&self) -> usize {
        self.prefixes.len()
    }

    /// Returns the local declarations in insertion order.
    #[must_use]
    pub fn prefixes(&self) -> &[PrefixDecl] {
        &self.prefixes
    }

    /// Returns the prefix of declaration `index` (`None` for the default
    /// namespace).
    ///
    /// # Errors
    ///
    /// Returns [`XmlError::IndexOutOfRange`] for a bad index.
    pub fn namespace_prefix(&self, index: usize) -> Result<Option<&str>, XmlError> {
        check_index(index, self.prefixes.len())?;
        Ok(self.prefixes[index].prefix.as_deref())
    }

    /// Returns the URI of declaration `index`.
    ///
    /// # Errors
    ///
    /// Returns [`XmlError::IndexOutOfRange`] for a bad index.
    pub fn namespace_uri(&self, index: usize) -> Result<&str, XmlError> {
        check_index(index, self.prefixes.len())?;
        Ok(&self.prefixes[index].namespace)
    }

    /// Appends a declaration of `prefix` (`None` for the default namespace).
    pub fn set_prefix(&mut self, prefix: Option<&str>, namespace: &str) {
        self.prefixes.push(PrefixDecl {
            prefix: prefix.map(str::to_string),
            namespace: namespace.to_string(),
        });
    }

    /// Looks `prefix` up among this element's own declarations; the first
    /// one wins.
    #[must_use]
    pub fn local_namespace(&self, prefix: Option<&str>) -> Option<&str> {
        self.prefixes
            .iter()
            .find(|d| d.prefix.as_deref() == prefix)
            .map(|d| d.namespace.as_str())
    }
}

impl fmt::Debug for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Element")
            .field("namespace", &self.namespace)
            .field("name", &self.name)
            .field("attributes", &self.attributes)
            .field("prefixes", &self.prefixes)
            .field("init", &self.init.is_some())
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_attribute_lookup_empty() {
        let el = Element::new("", "a");
        assert_eq!(el.attribute_value(None, "x"), None);
        assert_eq!(el.attribute_value(Some(""), "x"), None);
    }

    #[test]
    fn test_attribute_first_match_wins() {
        let mut el = Element::new("", "a");
        el.set_attribute("urn:n", "x", "V1");
        el.set_attribute("urn:n", "x", "V2");
        assert_eq!(el.attribute_count(), 2);
        assert_eq!(el.attribute_value(Some("urn:n"), "x"), Some("V1"));
        assert_eq!(el.attribute_value_at(1).unwrap(), "V2");
    }

    #[test]
    fn test_attribute_namespace_filter() {
        let mut el = Element::new("", "a");
        el.set_attribute("urn:a", "x", "A");
        el.set_attribute("urn:b", "x", "B");
        assert_eq!(el.attribute_value(Some("urn:b"), "x"), Some("B"));
        assert_eq!(el.attribute_value(None, "x"), Some("A"));
        assert_eq!(el.attribute_value(Some(""), "x"), None);
    }

    #[test]
    fn test_positional_accessors_out_of_range() {
        let mut el = Element::new("", "a");
        el.set_attribute("", "x", "1");
        el.set_prefix(Some("p"), "urn:p");
        assert!(matches!(
            el.attribute_name(1),
            Err(XmlError::IndexOutOfRange { index: 1, len: 1 })
        ));
        assert!(el.attribute_namespace(5).is_err());
        assert!(el.namespace_prefix(1).is_err());
        assert!(el.namespace_uri(1).is_err());
    }

    #[test]
    fn test_set_namespace_contract() {
        let mut el = Element::new("urn:x", "a");
        assert!(matches!(
            el.set_namespace(None),
            Err(XmlError::InvalidArgument(_))
        ));
        assert_eq!(el.namespace(), "urn:x");
        el.set_namespace(Some("")).unwrap();
        assert_eq!(el.namespace(), "");
    }

    #[test]
    fn test_local_prefixes_append_only() {
        let mut el = Element::new("", "a");
        el.set_prefix(Some("p"), "urn:one");
        el.set_prefix(Some("p"), "urn:two");
        el.set_prefix(None, "urn:d");
        assert_eq!(el.namespace_count(), 3);
        assert_eq!(el.local_namespace(Some("p")), Some("urn:one"));
        assert_eq!(el.local_namespace(None), Some("urn:d"));
        assert_eq!(el.local_namespace(Some("q")), None);
        assert_eq!(el.namespace_prefix(2).unwrap(), None);
    }

    #[test]
    fn test_init_hook_runs() {
        let calls = Rc::new(Cell::new(0));
        let seen = Rc::clone(&calls);
        let mut el = Element::new("", "a").with_init(Rc::new(move |el: &mut Element| {
            seen.set(seen.get() + 1);
            el.set_attribute("", "init", "yes");
        }));
        assert!(el.has_init());
        el.run_init();
        assert_eq!(calls.get(), 1);
        assert_eq!(el.attribute_value(None, "init"), Some("yes"));
    }

    #[test]
    fn test_debug_hides_hook() {
        let el = Element::new("urn:x", "a").with_init(Rc::new(|_: &mut Element| {}));
        let debug = format!("{el:?}");
        assert!(debug.contains("\"urn:x\""));
        assert!(debug.contains("init: true"));
    }
}
