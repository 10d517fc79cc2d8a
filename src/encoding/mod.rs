//! Encoding detection and transcoding.
//!
//! Implements BOM sniffing and XML declaration encoding detection per
//! XML 1.0 Section 4.3.3 and Appendix F, bridging to `encoding_rs` for
//! everything that is not already UTF-8.
//!
//! # Detection order
//!
//! 1. A Byte Order Mark selects UTF-8, UTF-16BE or UTF-16LE and is skipped.
//! 2. Without a BOM, the `encoding=` pseudo-attribute of the XML declaration
//!    (scanned as ASCII) selects the encoding.
//! 3. Otherwise the input must be UTF-8.

use encoding_rs::Encoding;

use crate::error::XmlError;

/// The result of decoding a byte stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decoded {
    /// The document text, transcoded to UTF-8 with any BOM removed.
    pub text: String,
    /// The canonical name of the encoding the bytes were decoded from.
    pub encoding: &'static str,
}

/// Detects the encoding indicated by a Byte Order Mark.
///
/// Returns the encoding and the number of BOM bytes to skip, or `None` if
/// the input does not start with a BOM.
///
/// # Examples
///
/// ```
/// use nsdom::encoding::sniff_bom;
///
/// let (enc, skip) = sniff_bom(b"\xEF\xBB\xBF<a/>").unwrap();
/// assert_eq!(enc.name(), "UTF-8");
/// assert_eq!(skip, 3);
/// assert!(sniff_bom(b"<a/>").is_none());
/// ```
#[must_use]
pub fn sniff_bom(bytes: &[u8]) -> Option<(&'static Encoding, usize)> {
    Encoding::for_bom(bytes)
}

/// Extracts the `encoding` pseudo-attribute of an XML declaration by
/// scanning the leading bytes as ASCII.
fn declared_encoding(bytes: &[u8]) -> Option<String> {
    let scan = &bytes[..bytes.len().min(256)];
    if !scan.starts_with(b"<?xml") {
        return None;
    }
    let decl_end = scan.windows(2).position(|w| w == b"?>")?;
    let decl = &scan[..decl_end];

    let needle = b"encoding";
    let enc_pos = decl.windows(needle.len()).position(|w| w == needle)?;
    let rest = skip_ascii_whitespace(&decl[enc_pos + needle.len()..]);
    let rest = skip_ascii_whitespace(rest.strip_prefix(b"=")?);

    let quote = *rest.first()?;
    if quote != b'"' && quote != b'\'' {
        return None;
    }
    let value = &rest[1..];
    let end = value.iter().position(|&b| b == quote)?;
    let label = &value[..end];
    if label.is_empty() || !label.iter().all(u8::is_ascii) {
        return None;
    }
    Some(String::from_utf8_lossy(label).into_owned())
}

fn skip_ascii_whitespace(bytes: &[u8]) -> &[u8] {
    let skip = bytes
        .iter()
        .take_while(|&&b| matches!(b, b' ' | b'\t' | b'\r' | b'\n'))
        .count();
    &bytes[skip..]
}

/// Decodes raw XML bytes into UTF-8 text, detecting the encoding.
///
/// # Errors
///
/// Returns [`XmlError::Encoding`] if the declared encoding is unknown or the
/// bytes are malformed for the detected encoding.
///
/// # Examples
///
/// ```
/// use nsdom::encoding::decode;
///
/// let decoded = decode(b"<?xml version=\"1.0\" encoding=\"ISO-8859-1\"?><a>caf\xE9</a>").unwrap();
/// assert!(decoded.text.contains("caf\u{e9}"));
/// assert_eq!(decoded.encoding, "windows-1252");
/// ```
pub fn decode(bytes: &[u8]) -> Result<Decoded, XmlError> {
    let (encoding, skip) = match sniff_bom(bytes) {
        Some(found) => found,
        None => match declared_encoding(bytes) {
            Some(label) => {
                let encoding = Encoding::for_label(label.as_bytes())
                    .ok_or_else(|| XmlError::Encoding(format!("unsupported encoding: {label}")))?;
                (encoding, 0)
            }
            None => (encoding_rs::UTF_8, 0),
        },
    };

    let content = &bytes[skip..];
    let (text, had_errors) = encoding.decode_without_bom_handling(content);
    if had_errors {
        return Err(XmlError::Encoding(format!(
            "malformed byte sequence for encoding {}",
            encoding.name()
        )));
    }

    tracing::debug!(encoding = encoding.name(), bom = skip > 0, "decoded input");
    Ok(Decoded {
        text: text.into_owned(),
        encoding: encoding.name(),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_sniff_utf16le_bom() {
        let (enc, skip) = sniff_bom(b"\xFF\xFE<\x00a\x00").unwrap();
        assert_eq!(enc.name(), "UTF-16LE");
        assert_eq!(skip, 2);
    }

    #[test]
    fn test_sniff_utf16be_bom() {
        let (enc, skip) = sniff_bom(b"\xFE\xFF\x00<\x00a").unwrap();
        assert_eq!(enc.name(), "UTF-16BE");
        assert_eq!(skip, 2);
    }

    #[test]
    fn test_declared_encoding_single_quotes() {
        let enc = declared_encoding(b"<?xml version='1.0' encoding='UTF-8'?><a/>");
        assert_eq!(enc.as_deref(), Some("UTF-8"));
    }

    #[test]
    fn test_declared_encoding_absent() {
        assert_eq!(declared_encoding(b"<?xml version=\"1.0\"?><a/>"), None);
        assert_eq!(declared_encoding(b"<a/>"), None);
    }

    #[test]
    fn test_decode_plain_utf8() {
        let decoded = decode(b"<a>hello</a>").unwrap();
        assert_eq!(decoded.text, "<a>hello</a>");
        assert_eq!(decoded.encoding, "UTF-8");
    }

    #[test]
    fn test_decode_strips_utf8_bom() {
        let decoded = decode(b"\xEF\xBB\xBF<a/>").unwrap();
        assert_eq!(decoded.text, "<a/>");
    }

    #[test]
    fn test_decode_utf16le() {
        let decoded = decode(b"\xFF\xFE<\x00a\x00/\x00>\x00").unwrap();
        assert_eq!(decoded.text, "<a/>");
        assert_eq!(decoded.encoding, "UTF-16LE");
    }

    #[test]
    fn test_decode_unknown_label() {
        let err = decode(b"<?xml version=\"1.0\" encoding=\"X-NOPE-42\"?><a/>").unwrap_err();
        assert!(matches!(err, XmlError::Encoding(ref m) if m.contains("X-NOPE-42")));
    }

    #[test]
    fn test_decode_invalid_utf8() {
        assert!(matches!(
            decode(&[b'<', b'a', b'>', 0x80, 0x81]),
            Err(XmlError::Encoding(_))
        ));
    }
}
