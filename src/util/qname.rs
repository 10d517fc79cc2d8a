//! `QName` (qualified name) handling.
//!
//! A `QName` is a name of the form `prefix:localname` or just `localname`.
//! The reader splits incoming tag and attribute names with [`split_qname`];
//! the writer joins a bound prefix back onto a local name with
//! [`join_qname`].
//!
//! See <https://www.w3.org/TR/xml-names/#NT-QName>

/// The namespace URI permanently bound to the `xml` prefix.
pub const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";

/// The namespace URI of `xmlns` declaration attributes.
pub const XMLNS_NAMESPACE: &str = "http://www.w3.org/2000/xmlns/";

/// Splits a `QName` into its prefix and local name parts.
///
/// Only the first colon separates; anything after it belongs to the local
/// part.
///
/// # Examples
///
/// ```
/// use nsdom::util::qname::split_qname;
///
/// assert_eq!(split_qname("svg:rect"), (Some("svg"), "rect"));
/// assert_eq!(split_qname("div"), (None, "div"));
/// ```
#[must_use]
pub fn split_qname(qname: &str) -> (Option<&str>, &str) {
    match qname.find(':') {
        Some(pos) => (Some(&qname[..pos]), &qname[pos + 1..]),
        None => (None, qname),
    }
}

/// Joins an optional prefix and a local name into a `QName`.
///
/// An empty prefix is treated like no prefix (the default namespace slot).
#[must_use]
pub fn join_qname(prefix: Option<&str>, local: &str) -> String {
    match prefix {
        Some(p) if !p.is_empty() => format!("{p}:{local}"),
        _ => local.to_string(),
    }
}

/// Returns `true` if `qname` has at most one colon and neither side of it
/// is empty.
#[must_use]
pub fn is_valid_qname(qname: &str) -> bool {
    match split_qname(qname) {
        (Some(prefix), local) => !prefix.is_empty() && !local.is_empty() && !local.contains(':'),
        (None, local) => !local.is_empty(),
    }
}
