//! Namespace-aware XML serializer.

use std::fmt::Write as _;
use std::io::Write;

use super::{EventWriter, WriterOptions};
use crate::error::{SourceLocation, XmlError};
use crate::reader::{describe_event, EventType};
use crate::util::qname::{join_qname, XML_NAMESPACE};

#[derive(Debug)]
struct OpenTag {
    namespace: String,
    name: String,
    qname: String,
    /// Length of the binding stack before this element's declarations.
    scope_start: usize,
}

/// Serializes [`EventWriter`] calls as XML text into any [`Write`] sink.
///
/// A start tag stays open until the next event, so an element with no
/// content at all is written as `<x/>` while an element that received any
/// content event (even empty text) is written as `<x></x>`.
///
/// Output is always UTF-8.
pub struct XmlWriter<W: Write> {
    out: W,
    options: WriterOptions,
    open: Vec<OpenTag>,
    /// Prefix bindings in scope, innermost last.
    bindings: Vec<(Option<String>, String)>,
    /// Declarations waiting for the next start tag.
    queued: Vec<(Option<String>, String)>,
    /// The last start tag has not been closed with `>` yet.
    pending: bool,
    next_generated: usize,
}

impl<W: Write> XmlWriter<W> {
    /// Creates a writer with default options.
    pub fn new(out: W) -> Self {
        Self::with_options(out, WriterOptions::default())
    }

    /// Creates a writer with the given options.
    pub fn with_options(out: W, options: WriterOptions) -> Self {
        Self {
            out,
            options,
            open: Vec::new(),
            bindings: Vec::new(),
            queued: Vec::new(),
            pending: false,
            next_generated: 0,
        }
    }

    /// Returns the number of open elements.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.open.len()
    }

    /// Returns a reference to the underlying sink.
    pub fn get_ref(&self) -> &W {
        &self.out
    }

    /// Consumes the writer and returns the sink.
    pub fn into_inner(self) -> W {
        self.out
    }

    fn put(&mut self, s: &str) -> Result<(), XmlError> {
        self.out.write_all(s.as_bytes())?;
        Ok(())
    }

    fn close_start_tag(&mut self) -> Result<(), XmlError> {
        if self.pending {
            self.pending = false;
            self.put(">")?;
        }
        Ok(())
    }

    /// Returns the namespace `prefix` is bound to in the current scope.
    fn lookup(&self, prefix: Option<&str>) -> Option<&str> {
        if prefix == Some("xml") {
            return Some(XML_NAMESPACE);
        }
        let found = self
            .bindings
            .iter()
            .rev()
            .find(|(p, _)| p.as_deref() == prefix)
            .map(|(_, uri)| uri.as_str());
        match (found, prefix) {
            (None, None) => Some(""),
            (found, _) => found,
        }
    }

    /// Finds a prefix currently bound to `namespace`.
    fn prefix_for(&self, namespace: &str, allow_default: bool) -> Option<Option<String>> {
        if namespace == XML_NAMESPACE {
            return Some(Some("xml".to_string()));
        }
        self.bindings
            .iter()
            .rev()
            .filter(|(p, uri)| uri == namespace && (allow_default || p.is_some()))
            .find(|(p, _)| self.lookup(p.as_deref()) == Some(namespace))
            .map(|(p, _)| p.clone())
    }

    fn generate_prefix(&mut self) -> String {
        loop {
            let candidate = format!("{}{}", self.options.generated_prefix, self.next_generated);
            self.next_generated += 1;
            if self.lookup(Some(&candidate)).is_none() {
                return candidate;
            }
        }
    }

    fn write_declaration(&mut self, prefix: Option<&str>, namespace: &str) -> Result<(), XmlError> {
        let mut out = String::from(" xmlns");
        if let Some(p) = prefix {
            out.push(':');
            out.push_str(p);
        }
        out.push_str("=\"");
        write_escaped_attr(&mut out, namespace);
        out.push('"');
        self.put(&out)
    }
}

impl<W: Write> EventWriter for XmlWriter<W> {
    fn set_prefix(&mut self, prefix: Option<&str>, namespace: &str) -> Result<(), XmlError> {
        self.close_start_tag()?;
        let prefix = prefix.filter(|p| !p.is_empty()).map(str::to_string);
        self.queued.retain(|(p, _)| *p != prefix);
        self.queued.push((prefix, namespace.to_string()));
        Ok(())
    }

    fn start_tag(&mut self, namespace: &str, name: &str) -> Result<(), XmlError> {
        self.close_start_tag()?;

        // An unqualified element needs the default namespace bound to "".
        if namespace.is_empty() {
            if let Some((_, uri)) = self.queued.iter().find(|(p, uri)| p.is_none() && !uri.is_empty()) {
                let err = XmlError::InvalidArgument(format!(
                    "element '{name}' has no namespace but declares default namespace '{uri}'"
                ));
                self.queued.clear();
                return Err(err);
            }
        }

        let scope_start = self.bindings.len();
        let mut declarations = std::mem::take(&mut self.queued);
        self.bindings.extend(declarations.iter().cloned());

        let prefix = if namespace.is_empty() {
            if self.lookup(None) != Some("") {
                declarations.push((None, String::new()));
                self.bindings.push((None, String::new()));
            }
            None
        } else if let Some(prefix) = self.prefix_for(namespace, true) {
            prefix
        } else {
            let generated = self.generate_prefix();
            declarations.push((Some(generated.clone()), namespace.to_string()));
            self.bindings.push((Some(generated.clone()), namespace.to_string()));
            Some(generated)
        };

        let qname = join_qname(prefix.as_deref(), name);
        self.put("<")?;
        self.put(&qname)?;
        for (p, uri) in &declarations {
            self.write_declaration(p.as_deref(), uri)?;
        }

        tracing::trace!(qname = %qname, depth = self.open.len() + 1, "start tag");
        self.open.push(OpenTag {
            namespace: namespace.to_string(),
            name: name.to_string(),
            qname,
            scope_start,
        });
        self.pending = true;
        Ok(())
    }

    fn attribute(&mut self, namespace: &str, name: &str, value: &str) -> Result<(), XmlError> {
        if !self.pending {
            return Err(XmlError::InvalidArgument(format!(
                "attribute '{name}' written outside a start tag"
            )));
        }

        let prefix = if namespace.is_empty() {
            None
        } else if let Some(prefix) = self.prefix_for(namespace, false) {
            prefix
        } else {
            let generated = self.generate_prefix();
            self.write_declaration(Some(&generated), namespace)?;
            self.bindings.push((Some(generated.clone()), namespace.to_string()));
            Some(generated)
        };

        let mut out = String::from(" ");
        out.push_str(&join_qname(prefix.as_deref(), name));
        out.push_str("=\"");
        write_escaped_attr(&mut out, value);
        out.push('"');
        self.put(&out)
    }

    fn end_tag(&mut self, namespace: &str, name: &str) -> Result<(), XmlError> {
        let Some(tag) = self.open.pop() else {
            return Err(XmlError::InvalidArgument(format!(
                "end tag '{name}' without an open element"
            )));
        };
        if tag.namespace != namespace || tag.name != name {
            let err = XmlError::StructuralMismatch {
                expected: describe_event(EventType::EndTag, Some(&tag.namespace), Some(&tag.name)),
                found: describe_event(EventType::EndTag, Some(namespace), Some(name)),
                location: SourceLocation::default(),
            };
            self.open.push(tag);
            return Err(err);
        }

        if self.pending {
            self.pending = false;
            self.put("/>")?;
        } else {
            self.put("</")?;
            self.put(&tag.qname)?;
            self.put(">")?;
        }
        self.bindings.truncate(tag.scope_start);
        Ok(())
    }

    fn text(&mut self, text: &str) -> Result<(), XmlError> {
        self.close_start_tag()?;
        let mut out = String::with_capacity(text.len());
        write_escaped_text(&mut out, text);
        self.put(&out)
    }

    fn cdsect(&mut self, text: &str) -> Result<(), XmlError> {
        self.close_start_tag()?;
        self.put("<![CDATA[")?;
        self.put(&text.replace("]]>", "]]]]><![CDATA[>"))?;
        self.put("]]>")
    }

    fn entity_ref(&mut self, name: &str) -> Result<(), XmlError> {
        self.close_start_tag()?;
        self.put("&")?;
        self.put(name)?;
        self.put(";")
    }

    fn ignorable_whitespace(&mut self, text: &str) -> Result<(), XmlError> {
        self.text(text)
    }

    fn processing_instruction(&mut self, text: &str) -> Result<(), XmlError> {
        if text.contains("?>") {
            return Err(XmlError::InvalidArgument(format!(
                "processing instruction '{text}' contains '?>'"
            )));
        }
        self.close_start_tag()?;
        self.put("<?")?;
        self.put(text)?;
        self.put("?>")
    }

    fn comment(&mut self, text: &str) -> Result<(), XmlError> {
        if text.contains("--") || text.ends_with('-') {
            return Err(XmlError::InvalidArgument(format!(
                "comment '{text}' contains '--' or ends with '-'"
            )));
        }
        self.close_start_tag()?;
        self.put("<!--")?;
        self.put(text)?;
        self.put("-->")
    }

    fn docdecl(&mut self, text: &str) -> Result<(), XmlError> {
        self.close_start_tag()?;
        self.put("<!DOCTYPE")?;
        self.put(text)?;
        self.put(">")
    }

    fn start_document(&mut self, encoding: Option<&str>, standalone: Option<bool>) -> Result<(), XmlError> {
        if !self.options.xml_declaration {
            return Ok(());
        }
        let mut out = String::from("<?xml version=\"1.0\"");
        // The sink always receives UTF-8, whatever the source was.
        if encoding.is_some() {
            out.push_str(" encoding=\"UTF-8\"");
        }
        if let Some(standalone) = standalone {
            out.push_str(" standalone=\"");
            out.push_str(if standalone { "yes" } else { "no" });
            out.push('"');
        }
        out.push_str("?>");
        self.put(&out)
    }

    fn end_document(&mut self) -> Result<(), XmlError> {
        while let Some(tag) = self.open.last() {
            let (namespace, name) = (tag.namespace.clone(), tag.name.clone());
            self.end_tag(&namespace, &name)?;
        }
        self.out.flush()?;
        tracing::debug!("document written");
        Ok(())
    }
}

/// Writes a hexadecimal character reference (`&#xHH;`) for a code point.
fn write_hex_char_ref(out: &mut String, ch: char) {
    let _ = write!(out, "&#x{:X};", ch as u32);
}

/// Escapes character data: markup characters, `\r`, and control
/// characters other than tab and newline.
fn write_escaped_text(out: &mut String, text: &str) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\r' => out.push_str("&#13;"),
            '\t' | '\n' => out.push(ch),
            c if (c as u32) < 0x20 => write_hex_char_ref(out, c),
            _ => out.push(ch),
        }
    }
}

/// Escapes a double-quoted attribute value. Whitespace other than the space
/// is written as a reference so it survives attribute-value normalization.
fn write_escaped_attr(out: &mut String, text: &str) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\t' => out.push_str("&#9;"),
            '\n' => out.push_str("&#10;"),
            '\r' => out.push_str("&#13;"),
            c if (c as u32) < 0x20 => write_hex_char_ref(out, c),
            _ => out.push(ch),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn render(events: impl FnOnce(&mut XmlWriter<Vec<u8>>) -> Result<(), XmlError>) -> String {
        let mut writer =
            XmlWriter::with_options(Vec::new(), WriterOptions::default().xml_declaration(false));
        events(&mut writer).unwrap();
        writer.end_document().unwrap();
        String::from_utf8(writer.into_inner()).unwrap()
    }

    #[test]
    fn test_empty_element_forms() {
        let empty = render(|w| {
            w.start_tag("", "a")?;
            w.end_tag("", "a")
        });
        assert_eq!(empty, "<a/>");

        let explicit = render(|w| {
            w.start_tag("", "a")?;
            w.ignorable_whitespace("")?;
            w.end_tag("", "a")
        });
        assert_eq!(explicit, "<a></a>");
    }

    #[test]
    fn test_default_namespace_declaration() {
        let xml = render(|w| {
            w.set_prefix(None, "urn:d")?;
            w.start_tag("urn:d", "a")?;
            w.start_tag("urn:d", "b")?;
            w.end_tag("urn:d", "b")?;
            w.end_tag("urn:d", "a")
        });
        assert_eq!(xml, r#"<a xmlns="urn:d"><b/></a>"#);
    }

    #[test]
    fn test_undeclares_default_namespace() {
        let xml = render(|w| {
            w.set_prefix(None, "urn:d")?;
            w.start_tag("urn:d", "a")?;
            w.start_tag("", "b")?;
            w.end_tag("", "b")?;
            w.end_tag("urn:d", "a")
        });
        assert_eq!(xml, r#"<a xmlns="urn:d"><b xmlns=""/></a>"#);
    }

    #[test]
    fn test_generated_prefixes() {
        let xml = render(|w| {
            w.start_tag("urn:a", "a")?;
            w.attribute("urn:b", "x", "1")?;
            w.attribute("urn:a", "y", "2")?;
            w.end_tag("urn:a", "a")
        });
        assert_eq!(
            xml,
            r#"<n0:a xmlns:n0="urn:a" xmlns:n1="urn:b" n1:x="1" n0:y="2"/>"#
        );
    }

    #[test]
    fn test_attribute_needs_non_default_prefix() {
        let xml = render(|w| {
            w.set_prefix(None, "urn:d")?;
            w.start_tag("urn:d", "a")?;
            w.attribute("urn:d", "x", "1")?;
            w.end_tag("urn:d", "a")
        });
        assert_eq!(xml, r#"<a xmlns="urn:d" xmlns:n0="urn:d" n0:x="1"/>"#);
    }

    #[test]
    fn test_xml_prefix_is_builtin() {
        let xml = render(|w| {
            w.start_tag("", "a")?;
            w.attribute(XML_NAMESPACE, "lang", "en")?;
            w.end_tag("", "a")
        });
        assert_eq!(xml, r#"<a xml:lang="en"/>"#);
    }

    #[test]
    fn test_scope_ends_with_element() {
        let xml = render(|w| {
            w.start_tag("", "r")?;
            w.set_prefix(Some("p"), "urn:p")?;
            w.start_tag("urn:p", "a")?;
            w.end_tag("urn:p", "a")?;
            w.start_tag("urn:p", "b")?;
            w.end_tag("urn:p", "b")?;
            w.end_tag("", "r")
        });
        assert_eq!(
            xml,
            r#"<r><p:a xmlns:p="urn:p"/><n0:b xmlns:n0="urn:p"/></r>"#
        );
    }

    #[test]
    fn test_escaping() {
        let xml = render(|w| {
            w.start_tag("", "a")?;
            w.attribute("", "v", "\"x\" & <y>\n")?;
            w.text("1 < 2 & 3 > 0\r")?;
            w.end_tag("", "a")
        });
        assert_eq!(
            xml,
            "<a v=\"&quot;x&quot; &amp; &lt;y&gt;&#10;\">1 &lt; 2 &amp; 3 &gt; 0&#13;</a>"
        );
    }

    #[test]
    fn test_cdata_splits_terminator() {
        let xml = render(|w| {
            w.start_tag("", "a")?;
            w.cdsect("x]]>y")?;
            w.end_tag("", "a")
        });
        assert_eq!(xml, "<a><![CDATA[x]]]]><![CDATA[>y]]></a>");
    }

    #[test]
    fn test_misc_content() {
        let xml = render(|w| {
            w.docdecl(" a")?;
            w.comment(" c ")?;
            w.start_tag("", "a")?;
            w.entity_ref("nbsp")?;
            w.processing_instruction("pi data")?;
            w.end_tag("", "a")
        });
        assert_eq!(xml, "<!DOCTYPE a><!-- c --><a>&nbsp;<?pi data?></a>");
    }

    #[test]
    fn test_end_tag_mismatch() {
        let mut writer = XmlWriter::new(Vec::new());
        writer.start_tag("", "a").unwrap();
        let err = writer.end_tag("", "b").unwrap_err();
        assert!(err.is_structural_mismatch());
        assert_eq!(writer.depth(), 1);
    }

    #[test]
    fn test_attribute_outside_start_tag() {
        let mut writer = XmlWriter::new(Vec::new());
        writer.start_tag("", "a").unwrap();
        writer.text("x").unwrap();
        assert!(matches!(
            writer.attribute("", "late", "1"),
            Err(XmlError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_unqualified_element_rejects_default_declaration() {
        let mut writer = XmlWriter::new(Vec::new());
        writer.set_prefix(None, "urn:d").unwrap();
        let err = writer.start_tag("", "a").unwrap_err();
        assert!(matches!(err, XmlError::InvalidArgument(ref m) if m.contains("urn:d")));
        assert_eq!(writer.depth(), 0);

        // The rejected declaration does not leak onto the next element.
        writer.start_tag("", "a").unwrap();
        writer.end_document().unwrap();
        assert_eq!(String::from_utf8(writer.into_inner()).unwrap(), "<a/>");
    }

    #[test]
    fn test_unqualified_element_accepts_empty_default() {
        let xml = render(|w| {
            w.set_prefix(None, "urn:d")?;
            w.start_tag("urn:d", "r")?;
            w.set_prefix(None, "")?;
            w.start_tag("", "a")?;
            w.end_tag("", "a")?;
            w.end_tag("urn:d", "r")
        });
        assert_eq!(xml, r#"<r xmlns="urn:d"><a xmlns=""/></r>"#);
    }

    #[test]
    fn test_comment_and_pi_content_checked() {
        let mut writer = XmlWriter::new(Vec::new());
        writer.start_tag("", "a").unwrap();
        for bad in ["x--y", "trailing-"] {
            assert!(matches!(writer.comment(bad), Err(XmlError::InvalidArgument(_))));
        }
        assert!(matches!(
            writer.processing_instruction("pi a?>b"),
            Err(XmlError::InvalidArgument(_))
        ));
        writer.comment("a - b").unwrap();
        writer.processing_instruction("pi a?b").unwrap();
        writer.end_document().unwrap();
        assert_eq!(
            String::from_utf8(writer.into_inner()).unwrap(),
            "<a><!--a - b--><?pi a?b?></a>"
        );
    }

    #[test]
    fn test_declaration_and_auto_close() {
        let mut writer = XmlWriter::new(Vec::new());
        writer.start_document(Some("ISO-8859-1"), Some(true)).unwrap();
        writer.start_tag("", "a").unwrap();
        writer.start_tag("", "b").unwrap();
        writer.end_document().unwrap();
        assert_eq!(
            String::from_utf8(writer.into_inner()).unwrap(),
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><a><b/></a>"#
        );
    }
}
