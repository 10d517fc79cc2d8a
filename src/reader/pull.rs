//! The bundled pull tokenizer.

use super::input::{Input, Reference};
use super::namespace::NamespaceStack;
use super::{EventType, PullReader, ReaderOptions};
use crate::error::{check_index, ReaderFault, SourceLocation, XmlError};
use crate::util::qname::{is_valid_qname, split_qname};

/// An attribute of the current start tag.
#[derive(Debug, Clone)]
struct ReaderAttribute {
    namespace: String,
    name: String,
    value: String,
}

/// A namespace-aware pull tokenizer over a string slice.
///
/// The reader starts on [`EventType::StartDocument`]; every call to
/// [`next_token`](PullReader::next_token) moves it one token forward until
/// [`EventType::EndDocument`]. The XML declaration is not a token: it is
/// consumed by the first advance and exposed through
/// [`version`](PullReader::version), [`input_encoding`](PullReader::input_encoding)
/// and [`standalone`](PullReader::standalone).
///
/// Only the five predefined entities and character references are
/// expanded; they are folded into the surrounding text. Any other entity
/// reference in content is reported as [`EventType::EntityRef`] with no
/// text.
///
/// # Examples
///
/// ```
/// use nsdom::reader::{EventType, PullReader, XmlPullReader};
///
/// let mut reader = XmlPullReader::new("<a xmlns:x='urn:x' x:id='7'/>");
/// assert_eq!(reader.next_token().unwrap(), EventType::StartTag);
/// assert_eq!(reader.depth(), 1);
/// assert!(reader.is_empty_element_tag());
/// assert_eq!(reader.namespace_count(1), 1);
/// assert_eq!(reader.attribute_namespace(0).unwrap(), "urn:x");
///
/// // Self-closing tags still produce an end tag.
/// assert_eq!(reader.next_token().unwrap(), EventType::EndTag);
/// assert_eq!(reader.next_token().unwrap(), EventType::EndDocument);
/// ```
pub struct XmlPullReader<'a> {
    input: Input<'a>,
    options: ReaderOptions,
    ns: NamespaceStack,

    event: EventType,
    depth: usize,
    name: Option<String>,
    namespace: Option<String>,
    text: Option<String>,
    empty_tag: bool,
    attributes: Vec<ReaderAttribute>,
    location: SourceLocation,

    /// Raw qualified names of the open elements, for end-tag matching.
    open: Vec<String>,
    /// The current start tag was self-closing; the next token is its end tag.
    synthetic_end: bool,
    /// The current event is an end tag; its scope closes on the next advance.
    leave_scope: bool,
    seen_root: bool,

    version: Option<String>,
    encoding: Option<String>,
    standalone: Option<bool>,
}

impl<'a> XmlPullReader<'a> {
    /// Creates a reader with default options.
    #[must_use]
    pub fn new(input: &'a str) -> Self {
        Self::with_options(input, ReaderOptions::default())
    }

    /// Creates a reader with the given options.
    #[must_use]
    pub fn with_options(input: &'a str, options: ReaderOptions) -> Self {
        let input = input.strip_prefix('\u{FEFF}').unwrap_or(input);
        Self {
            input: Input::new(input, options.max_name_length),
            options,
            ns: NamespaceStack::new(),
            event: EventType::StartDocument,
            depth: 0,
            name: None,
            namespace: None,
            text: None,
            empty_tag: false,
            attributes: Vec::new(),
            location: SourceLocation::default(),
            open: Vec::new(),
            synthetic_end: false,
            leave_scope: false,
            seen_root: false,
            version: None,
            encoding: None,
            standalone: None,
        }
    }

    /// Returns the options this reader was created with.
    #[must_use]
    pub fn options(&self) -> &ReaderOptions {
        &self.options
    }

    fn reset_event(&mut self) {
        self.name = None;
        self.namespace = None;
        self.text = None;
        self.empty_tag = false;
        self.attributes.clear();
        self.location = self.input.location();
    }

    fn read_token(&mut self) -> Result<EventType, XmlError> {
        if self.event == EventType::EndDocument {
            return Ok(EventType::EndDocument);
        }

        if self.synthetic_end {
            self.synthetic_end = false;
            self.leave_scope = true;
            self.empty_tag = false;
            self.attributes.clear();
            self.event = EventType::EndTag;
            return Ok(self.event);
        }

        if self.leave_scope {
            self.leave_scope = false;
            self.depth -= 1;
            self.ns.pop_to(self.depth);
        }

        if self.event == EventType::StartDocument
            && self.input.looking_at(b"<?xml")
            && matches!(self.input.peek_at(5), Some(b' ' | b'\t' | b'\r' | b'\n'))
        {
            self.parse_xml_decl()?;
        }

        self.reset_event();

        self.event = if self.input.at_end() {
            self.at_end_of_input()?
        } else if self.input.looking_at(b"<?") {
            self.parse_processing_instruction()?
        } else if self.input.looking_at(b"<!--") {
            self.parse_comment()?
        } else if self.input.looking_at(b"<![CDATA[") {
            self.parse_cdata()?
        } else if self.input.looking_at(b"<!DOCTYPE") {
            self.parse_doctype()?
        } else if self.input.looking_at(b"</") {
            self.parse_end_tag()?
        } else if self.input.peek() == Some(b'<') {
            self.parse_start_tag()?
        } else {
            self.parse_char_data()?
        };
        Ok(self.event)
    }

    fn at_end_of_input(&self) -> Result<EventType, XmlError> {
        if let Some(open) = self.open.last() {
            return Err(self
                .input
                .fault(format!("unexpected end of input: <{open}> is not closed"))
                .into());
        }
        if !self.seen_root {
            return Err(self.input.fault("missing root element").into());
        }
        Ok(EventType::EndDocument)
    }

    // === Prolog ===

    fn parse_xml_decl(&mut self) -> Result<(), XmlError> {
        self.input.expect_str(b"<?xml")?;
        self.input.skip_whitespace();

        let mut pseudo = Vec::new();
        while !self.input.looking_at(b"?>") {
            if self.input.at_end() {
                return Err(self.input.fault("unexpected end of input in XML declaration").into());
            }
            let name = self.input.parse_name()?;
            self.input.skip_whitespace();
            self.input.expect_byte(b'=')?;
            self.input.skip_whitespace();
            let value = self.input.parse_quoted_value()?;
            self.input.skip_whitespace();
            pseudo.push((name, value));
        }
        self.input.advance(2);

        for (name, value) in pseudo {
            match name.as_str() {
                "version" => self.version = Some(value),
                "encoding" => self.encoding = Some(value),
                "standalone" => {
                    self.standalone = Some(match value.as_str() {
                        "yes" => true,
                        "no" => false,
                        _ => {
                            return Err(self
                                .input
                                .fault("standalone must be 'yes' or 'no'")
                                .into())
                        }
                    });
                }
                other => {
                    return Err(self
                        .input
                        .fault(format!("unexpected '{other}' in XML declaration"))
                        .into())
                }
            }
        }
        if self.version.is_none() {
            return Err(self.input.fault("XML declaration without version").into());
        }
        Ok(())
    }

    fn parse_doctype(&mut self) -> Result<EventType, XmlError> {
        if self.depth > 0 || self.seen_root {
            return Err(self.input.fault("DOCTYPE must precede the root element").into());
        }
        self.input.expect_str(b"<!DOCTYPE")?;

        let mut text = String::new();
        let mut brackets = 0u32;
        let mut quote: Option<char> = None;
        loop {
            if self.input.at_end() {
                return Err(self.input.fault("unexpected end of input in DOCTYPE").into());
            }
            let ch = self.input.next_char()?;
            match (quote, ch) {
                (Some(q), c) if c == q => quote = None,
                (Some(_), _) => {}
                (None, '"' | '\'') => quote = Some(ch),
                (None, '[') => brackets += 1,
                (None, ']') => brackets = brackets.saturating_sub(1),
                (None, '>') if brackets == 0 => break,
                _ => {}
            }
            text.push(ch);
        }
        self.text = Some(text);
        Ok(EventType::DocDecl)
    }

    // === Markup ===

    fn parse_processing_instruction(&mut self) -> Result<EventType, XmlError> {
        self.input.expect_str(b"<?")?;
        let target = self.input.parse_name()?;
        if target.eq_ignore_ascii_case("xml") {
            return Err(self
                .input
                .fault("XML declaration allowed only at the start of the document")
                .into());
        }
        let text = if self.input.looking_at(b"?>") {
            self.input.advance(2);
            target
        } else {
            if !self.input.skip_whitespace() {
                return Err(self.input.fault("whitespace required after PI target").into());
            }
            let data = self.input.take_until(b"?>", "processing instruction")?;
            format!("{target} {data}")
        };
        self.text = Some(text);
        Ok(EventType::ProcessingInstruction)
    }

    fn parse_comment(&mut self) -> Result<EventType, XmlError> {
        self.input.expect_str(b"<!--")?;
        let content = self.input.take_until(b"-->", "comment")?;
        if content.contains("--") || content.ends_with('-') {
            return Err(self.input.fault("'--' not allowed inside comments").into());
        }
        self.text = Some(content);
        Ok(EventType::Comment)
    }

    fn parse_cdata(&mut self) -> Result<EventType, XmlError> {
        if self.depth == 0 {
            return Err(self.input.fault("CDATA section outside the root element").into());
        }
        self.input.expect_str(b"<![CDATA[")?;
        self.text = Some(self.input.take_until(b"]]>", "CDATA section")?);
        Ok(EventType::CData)
    }

    // === Tags ===

    fn parse_start_tag(&mut self) -> Result<EventType, XmlError> {
        if self.depth == 0 && self.seen_root {
            return Err(self.input.fault("content after the root element").into());
        }
        self.input.expect_byte(b'<')?;
        let qname = self.input.parse_name()?;

        let mut raw: Vec<(String, String)> = Vec::new();
        loop {
            let had_ws = self.input.skip_whitespace();
            if self.input.peek() == Some(b'>') || self.input.looking_at(b"/>") {
                break;
            }
            if !had_ws {
                return Err(self.input.fault("whitespace required between attributes").into());
            }
            let attr_name = self.input.parse_name()?;
            self.input.skip_whitespace();
            self.input.expect_byte(b'=')?;
            self.input.skip_whitespace();
            let value = self.input.parse_attribute_value()?;
            if raw.iter().any(|(n, _)| *n == attr_name) {
                return Err(self
                    .input
                    .fault(format!("duplicate attribute '{attr_name}'"))
                    .into());
            }
            raw.push((attr_name, value));
            if raw.len() > self.options.max_attributes {
                return Err(self
                    .input
                    .fault(format!(
                        "too many attributes (maximum {})",
                        self.options.max_attributes
                    ))
                    .into());
            }
        }

        let empty = self.input.looking_at(b"/>");
        self.input.advance(if empty { 2 } else { 1 });

        self.depth += 1;
        if self.depth > self.options.max_depth {
            return Err(self
                .input
                .fault(format!(
                    "maximum nesting depth exceeded ({})",
                    self.options.max_depth
                ))
                .into());
        }

        if self.options.process_namespaces {
            self.bind_namespaces(&qname, raw)?;
        } else {
            self.ns.push_scope(self.depth, Vec::new());
            self.name = Some(qname.clone());
            self.namespace = Some(String::new());
            self.attributes = raw
                .into_iter()
                .map(|(name, value)| ReaderAttribute {
                    namespace: String::new(),
                    name,
                    value,
                })
                .collect();
        }

        self.seen_root = true;
        self.empty_tag = empty;
        if empty {
            self.synthetic_end = true;
        } else {
            self.open.push(qname);
        }
        Ok(EventType::StartTag)
    }

    fn bind_namespaces(&mut self, qname: &str, raw: Vec<(String, String)>) -> Result<(), XmlError> {
        let mut declarations = Vec::new();
        let mut plain = Vec::new();
        for (name, value) in raw {
            if name == "xmlns" {
                declarations.push((None, value));
            } else if let Some(prefix) = name.strip_prefix("xmlns:") {
                if prefix == "xmlns" || value.is_empty() {
                    return Err(self
                        .input
                        .fault(format!("illegal namespace declaration '{name}'"))
                        .into());
                }
                declarations.push((Some(prefix.to_string()), value));
            } else {
                plain.push((name, value));
            }
        }
        self.ns.push_scope(self.depth, declarations);

        let (prefix, local) = self.resolve_qname(qname)?;
        let namespace = match self.ns.resolve(prefix) {
            Some(uri) => uri.to_string(),
            None => return Err(self.undefined_prefix(prefix).into()),
        };

        let mut attributes: Vec<ReaderAttribute> = Vec::with_capacity(plain.len());
        for (name, value) in plain {
            let (prefix, local) = self.resolve_qname(&name)?;
            let namespace = match prefix {
                None => String::new(),
                Some(_) => self
                    .ns
                    .resolve(prefix)
                    .map(str::to_string)
                    .ok_or_else(|| self.undefined_prefix(prefix))?,
            };
            if attributes
                .iter()
                .any(|a| a.name == local && a.namespace == namespace)
            {
                return Err(self
                    .input
                    .fault(format!("duplicate attribute '{{{namespace}}}{local}'"))
                    .into());
            }
            attributes.push(ReaderAttribute {
                namespace,
                name: local.to_string(),
                value,
            });
        }

        self.name = Some(local.to_string());
        self.namespace = Some(namespace);
        self.attributes = attributes;
        Ok(())
    }

    fn resolve_qname<'n>(&self, qname: &'n str) -> Result<(Option<&'n str>, &'n str), ReaderFault> {
        if !is_valid_qname(qname) {
            return Err(self.input.fault(format!("malformed qualified name '{qname}'")));
        }
        Ok(split_qname(qname))
    }

    fn undefined_prefix(&self, prefix: Option<&str>) -> ReaderFault {
        self.input
            .fault(format!("undefined prefix: {}", prefix.unwrap_or_default()))
    }

    fn parse_end_tag(&mut self) -> Result<EventType, XmlError> {
        let location = self.input.location();
        self.input.expect_str(b"</")?;
        let qname = self.input.parse_name()?;
        self.input.skip_whitespace();
        self.input.expect_byte(b'>')?;

        let Some(expected) = self.open.pop() else {
            return Err(self
                .input
                .fault(format!("unexpected end tag </{qname}>"))
                .into());
        };
        if expected != qname {
            return Err(XmlError::StructuralMismatch {
                expected: format!("</{expected}>"),
                found: format!("</{qname}>"),
                location,
            });
        }

        if self.options.process_namespaces {
            let (prefix, local) = split_qname(&qname);
            self.namespace = self.ns.resolve(prefix).map(str::to_string);
            self.name = Some(local.to_string());
        } else {
            self.namespace = Some(String::new());
            self.name = Some(qname);
        }
        self.leave_scope = true;
        Ok(EventType::EndTag)
    }

    // === Character data ===

    /// Returns `true` if the cursor is on a reference that will not be
    /// folded into text.
    fn at_unresolved_reference(&self) -> bool {
        const PREDEFINED: [&[u8]; 5] = [b"&amp;", b"&lt;", b"&gt;", b"&apos;", b"&quot;"];
        !self.input.looking_at(b"&#") && !PREDEFINED.iter().any(|p| self.input.looking_at(p))
    }

    fn parse_char_data(&mut self) -> Result<EventType, XmlError> {
        if self.depth == 0 {
            return self.parse_outside_root();
        }

        if self.input.peek() == Some(b'&') && self.at_unresolved_reference() {
            if let Reference::Unresolved(name) = self.input.parse_reference()? {
                self.name = Some(name);
                return Ok(EventType::EntityRef);
            }
        }

        let mut text = String::new();
        while let Some(b) = self.input.peek() {
            match b {
                b'<' => break,
                b'&' if self.at_unresolved_reference() => break,
                b'&' => {
                    if let Reference::Resolved(ch) = self.input.parse_reference()? {
                        text.push(ch);
                    }
                }
                b']' if self.input.looking_at(b"]]>") => {
                    return Err(self
                        .input
                        .fault("']]>' not allowed in character data")
                        .into());
                }
                _ => text.push(self.input.next_char()?),
            }
        }
        self.text = Some(text);
        Ok(EventType::Text)
    }

    fn parse_outside_root(&mut self) -> Result<EventType, XmlError> {
        let mut text = String::new();
        while let Some(b) = self.input.peek() {
            if b == b'<' {
                break;
            }
            let ch = self.input.next_char()?;
            if !matches!(ch, ' ' | '\t' | '\n') {
                return Err(self.input.fault("content outside the root element").into());
            }
            text.push(ch);
        }
        self.text = Some(text);
        Ok(EventType::IgnorableWhitespace)
    }
}

impl PullReader for XmlPullReader<'_> {
    fn event_type(&self) -> EventType {
        self.event
    }

    fn depth(&self) -> usize {
        self.depth
    }

    fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    fn is_empty_element_tag(&self) -> bool {
        self.empty_tag
    }

    fn attribute_count(&self) -> usize {
        self.attributes.len()
    }

    fn attribute_namespace(&self, index: usize) -> Result<&str, XmlError> {
        check_index(index, self.attributes.len())?;
        Ok(&self.attributes[index].namespace)
    }

    fn attribute_name(&self, index: usize) -> Result<&str, XmlError> {
        check_index(index, self.attributes.len())?;
        Ok(&self.attributes[index].name)
    }

    fn attribute_value(&self, index: usize) -> Result<&str, XmlError> {
        check_index(index, self.attributes.len())?;
        Ok(&self.attributes[index].value)
    }

    fn namespace_count(&self, depth: usize) -> usize {
        self.ns.count(depth.min(self.depth))
    }

    fn namespace_prefix(&self, index: usize) -> Result<Option<&str>, XmlError> {
        check_index(index, self.ns.len())?;
        Ok(self.ns.get(index).and_then(|(prefix, _)| prefix))
    }

    fn namespace_uri(&self, index: usize) -> Result<&str, XmlError> {
        check_index(index, self.ns.len())?;
        Ok(self.ns.get(index).map(|(_, uri)| uri).unwrap_or_default())
    }

    fn next_token(&mut self) -> Result<EventType, XmlError> {
        match self.read_token() {
            Ok(event) => {
                tracing::trace!(event = %event, depth = self.depth, "token");
                Ok(event)
            }
            Err(err) => {
                tracing::debug!(error = %err, "reader fault");
                Err(err)
            }
        }
    }

    fn location(&self) -> SourceLocation {
        self.location
    }

    fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    fn input_encoding(&self) -> Option<&str> {
        self.encoding.as_deref()
    }

    fn standalone(&self) -> Option<bool> {
        self.standalone
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn tokens(input: &str) -> Vec<(EventType, usize, String)> {
        let mut reader = XmlPullReader::new(input);
        let mut out = Vec::new();
        loop {
            let event = reader.next_token().unwrap();
            if event == EventType::EndDocument {
                return out;
            }
            let label = match event {
                EventType::StartTag | EventType::EndTag | EventType::EntityRef => {
                    reader.name().unwrap_or_default().to_string()
                }
                _ => reader.text().unwrap_or_default().to_string(),
            };
            out.push((event, reader.depth(), label));
        }
    }

    #[test]
    fn test_token_sequence_and_depth() {
        assert_eq!(
            tokens("<a>x<b/></a>"),
            vec![
                (EventType::StartTag, 1, "a".to_string()),
                (EventType::Text, 1, "x".to_string()),
                (EventType::StartTag, 2, "b".to_string()),
                (EventType::EndTag, 2, "b".to_string()),
                (EventType::EndTag, 1, "a".to_string()),
            ]
        );
    }

    #[test]
    fn test_prolog_tokens() {
        assert_eq!(
            tokens("<?xml version=\"1.0\"?>\n<!DOCTYPE a>\n<!--c--><?pi data?><a/>"),
            vec![
                (EventType::IgnorableWhitespace, 0, "\n".to_string()),
                (EventType::DocDecl, 0, " a".to_string()),
                (EventType::IgnorableWhitespace, 0, "\n".to_string()),
                (EventType::Comment, 0, "c".to_string()),
                (EventType::ProcessingInstruction, 0, "pi data".to_string()),
                (EventType::StartTag, 1, "a".to_string()),
                (EventType::EndTag, 1, "a".to_string()),
            ]
        );
    }

    #[test]
    fn test_xml_declaration_properties() {
        let mut reader =
            XmlPullReader::new("<?xml version='1.0' encoding='UTF-8' standalone='yes'?><a/>");
        reader.next_token().unwrap();
        assert_eq!(reader.version(), Some("1.0"));
        assert_eq!(reader.input_encoding(), Some("UTF-8"));
        assert_eq!(reader.standalone(), Some(true));
    }

    #[test]
    fn test_predefined_references_fold_into_text() {
        assert_eq!(
            tokens("<a>1 &lt; 2 &amp;&#x41;</a>")[1],
            (EventType::Text, 1, "1 < 2 &A".to_string())
        );
    }

    #[test]
    fn test_unknown_entity_is_entity_ref() {
        let toks = tokens("<a>x&nbsp;y</a>");
        assert_eq!(toks[1], (EventType::Text, 1, "x".to_string()));
        assert_eq!(toks[2], (EventType::EntityRef, 1, "nbsp".to_string()));
        assert_eq!(toks[3], (EventType::Text, 1, "y".to_string()));
    }

    #[test]
    fn test_cdata() {
        assert_eq!(
            tokens("<a><![CDATA[<b>]]></a>")[1],
            (EventType::CData, 1, "<b>".to_string())
        );
    }

    #[test]
    fn test_namespace_counts_per_depth() {
        let mut reader =
            XmlPullReader::new("<a xmlns='urn:d' xmlns:p='urn:p'><p:b xmlns:q='urn:q'/></a>");
        reader.next_token().unwrap();
        assert_eq!(reader.namespace(), Some("urn:d"));
        assert_eq!(reader.namespace_count(0), 0);
        assert_eq!(reader.namespace_count(1), 2);
        assert_eq!(reader.namespace_prefix(0).unwrap(), None);
        assert_eq!(reader.namespace_prefix(1).unwrap(), Some("p"));

        reader.next_token().unwrap();
        assert_eq!(reader.name(), Some("b"));
        assert_eq!(reader.namespace(), Some("urn:p"));
        assert_eq!(reader.namespace_count(1), 2);
        assert_eq!(reader.namespace_count(2), 3);
        assert_eq!(reader.namespace_uri(2).unwrap(), "urn:q");

        assert_eq!(reader.next_token().unwrap(), EventType::EndTag);
        assert_eq!(reader.namespace(), Some("urn:p"));
        assert_eq!(reader.next_token().unwrap(), EventType::EndTag);
        assert_eq!(reader.namespace_count(1), 2);
    }

    #[test]
    fn test_attribute_namespaces() {
        let mut reader =
            XmlPullReader::new("<a xmlns='urn:d' xmlns:p='urn:p' x='1' p:y='2' xml:lang='en'/>");
        reader.next_token().unwrap();
        assert_eq!(reader.attribute_count(), 3);
        assert_eq!(reader.attribute_namespace(0).unwrap(), "");
        assert_eq!(reader.attribute_namespace(1).unwrap(), "urn:p");
        assert_eq!(reader.attribute_name(1).unwrap(), "y");
        assert_eq!(
            reader.attribute_namespace(2).unwrap(),
            crate::util::qname::XML_NAMESPACE
        );
        assert!(matches!(
            reader.attribute_value(3),
            Err(XmlError::IndexOutOfRange { index: 3, len: 3 })
        ));
    }

    #[test]
    fn test_namespaces_disabled() {
        let opts = ReaderOptions::default().process_namespaces(false);
        let mut reader = XmlPullReader::with_options("<p:a xmlns:p='urn:p'/>", opts);
        reader.next_token().unwrap();
        assert_eq!(reader.name(), Some("p:a"));
        assert_eq!(reader.namespace(), Some(""));
        assert_eq!(reader.namespace_count(1), 0);
        assert_eq!(reader.attribute_name(0).unwrap(), "xmlns:p");
    }

    #[test]
    fn test_undefined_prefix_is_fault() {
        let mut reader = XmlPullReader::new("<p:a/>");
        assert!(matches!(reader.next_token(), Err(XmlError::Reader(_))));
    }

    #[test]
    fn test_mismatched_end_tag() {
        let mut reader = XmlPullReader::new("<a><b></a></b>");
        reader.next_token().unwrap();
        reader.next_token().unwrap();
        let err = reader.next_token().unwrap_err();
        assert!(err.is_structural_mismatch());
    }

    #[test]
    fn test_unclosed_element() {
        let mut reader = XmlPullReader::new("<a>");
        reader.next_token().unwrap();
        assert!(matches!(reader.next_token(), Err(XmlError::Reader(_))));
    }

    #[test]
    fn test_missing_root() {
        let mut reader = XmlPullReader::new("<!-- only -->");
        reader.next_token().unwrap();
        let err = reader.next_token().unwrap_err();
        assert!(err.to_string().contains("missing root element"));
    }

    #[test]
    fn test_second_root_rejected() {
        let mut reader = XmlPullReader::new("<a/><b/>");
        reader.next_token().unwrap();
        reader.next_token().unwrap();
        assert!(reader.next_token().is_err());
    }

    #[test]
    fn test_duplicate_attribute_rejected() {
        let mut reader = XmlPullReader::new("<a x='1' x='2'/>");
        assert!(reader.next_token().is_err());
    }

    #[test]
    fn test_depth_limit() {
        let opts = ReaderOptions::default().max_depth(2);
        let mut reader = XmlPullReader::with_options("<a><b><c/></b></a>", opts);
        reader.next_token().unwrap();
        reader.next_token().unwrap();
        let err = reader.next_token().unwrap_err();
        assert!(err.to_string().contains("maximum nesting depth"));
    }

    #[test]
    fn test_end_document_is_sticky() {
        let mut reader = XmlPullReader::new("<a/>");
        while reader.next_token().unwrap() != EventType::EndDocument {}
        assert_eq!(reader.next_token().unwrap(), EventType::EndDocument);
        assert_eq!(reader.depth(), 0);
    }

    #[test]
    fn test_require_uses_current_event() {
        let mut reader = XmlPullReader::new("<a xmlns='urn:a'/>");
        reader.next_token().unwrap();
        assert!(reader.require(EventType::StartTag, Some("urn:a"), Some("a")).is_ok());
        let err = reader
            .require(EventType::StartTag, Some(""), Some("a"))
            .unwrap_err();
        assert!(matches!(
            err,
            XmlError::StructuralMismatch { ref expected, ref found, .. }
                if expected == "START_TAG a" && found == "START_TAG {urn:a}a"
        ));
    }
}
