//! Pluggable element construction.

use super::Element;

/// Creates the elements of a [`Document`](super::Document).
///
/// The document holds one factory and every element created for a node
/// attached to that document goes through it, which lets a caller swap in
/// specialized elements across a whole tree. A factory usually customizes
/// elements by installing an [`InitHook`](super::InitHook).
///
/// Any `Fn(&str, &str) -> Element` closure is a factory.
///
/// # Examples
///
/// ```
/// use std::rc::Rc;
/// use nsdom::{Document, Element};
///
/// let factory = |ns: &str, name: &str| {
///     Element::new(ns, name).with_init(Rc::new(|el: &mut Element| {
///         el.set_attribute("", "seen", "1");
///     }))
/// };
/// let mut doc = Document::with_factory(Rc::new(factory));
/// doc.parse_into_str("<a><b/></a>").unwrap();
///
/// let a = doc.root_element().unwrap();
/// let b = doc.child(a, 0).unwrap();
/// assert_eq!(doc.element(b).unwrap().attribute_value(None, "seen"), Some("1"));
/// ```
pub trait ElementFactory {
    /// Creates an element named `name` in `namespace`.
    fn create_element(&self, namespace: &str, name: &str) -> Element;
}

/// Creates plain [`Element`]s with no init hook.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DefaultElementFactory;

impl ElementFactory for DefaultElementFactory {
    fn create_element(&self, namespace: &str, name: &str) -> Element {
        Element::new(namespace, name)
    }
}

impl<F> ElementFactory for F
where
    F: Fn(&str, &str) -> Element,
{
    fn create_element(&self, namespace: &str, name: &str) -> Element {
        self(namespace, name)
    }
}
