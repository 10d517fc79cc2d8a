//! Depth-indexed namespace declaration stack.

use crate::util::qname::XML_NAMESPACE;

/// Namespace declarations in scope, numbered cumulatively by depth.
///
/// `counts[d]` is the number of declarations visible at depth `d`; the
/// declarations made by the tag at depth `d` occupy
/// `decls[counts[d - 1]..counts[d]]`. Depth 0 never declares anything.
#[derive(Debug, Clone)]
pub(crate) struct NamespaceStack {
    decls: Vec<(Option<String>, String)>,
    counts: Vec<usize>,
}

impl NamespaceStack {
    pub fn new() -> Self {
        Self {
            decls: Vec::new(),
            counts: vec![0],
        }
    }

    /// Opens the scope for depth `depth` with the given declarations.
    pub fn push_scope(&mut self, depth: usize, declarations: Vec<(Option<String>, String)>) {
        self.pop_to(depth.saturating_sub(1));
        self.decls.extend(declarations);
        self.counts.push(self.decls.len());
    }

    /// Discards every scope deeper than `depth`.
    pub fn pop_to(&mut self, depth: usize) {
        self.counts.truncate(depth + 1);
        let keep = self.counts.last().copied().unwrap_or(0);
        self.decls.truncate(keep);
    }

    pub fn count(&self, depth: usize) -> usize {
        match self.counts.get(depth) {
            Some(&count) => count,
            None => self.decls.len(),
        }
    }

    pub fn get(&self, index: usize) -> Option<(Option<&str>, &str)> {
        self.decls
            .get(index)
            .map(|(prefix, uri)| (prefix.as_deref(), uri.as_str()))
    }

    pub fn len(&self) -> usize {
        self.decls.len()
    }

    /// Resolves a prefix against every declaration in scope, innermost
    /// first. The default namespace resolves to `""` when undeclared.
    pub fn resolve(&self, prefix: Option<&str>) -> Option<&str> {
        if prefix == Some("xml") {
            return Some(XML_NAMESPACE);
        }
        let found = self
            .decls
            .iter()
            .rev()
            .find(|(p, _)| p.as_deref() == prefix)
            .map(|(_, uri)| uri.as_str());
        match (found, prefix) {
            (None, None) => Some(""),
            (found, _) => found,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn decl(prefix: Option<&str>, uri: &str) -> (Option<String>, String) {
        (prefix.map(String::from), uri.to_string())
    }

    #[test]
    fn test_counts_are_cumulative() {
        let mut ns = NamespaceStack::new();
        ns.push_scope(1, vec![decl(Some("a"), "urn:a"), decl(None, "urn:d")]);
        ns.push_scope(2, vec![]);
        ns.push_scope(3, vec![decl(Some("b"), "urn:b")]);

        assert_eq!(ns.count(0), 0);
        assert_eq!(ns.count(1), 2);
        assert_eq!(ns.count(2), 2);
        assert_eq!(ns.count(3), 3);
        assert_eq!(ns.get(2), Some((Some("b"), "urn:b")));
    }

    #[test]
    fn test_resolve_innermost_wins() {
        let mut ns = NamespaceStack::new();
        ns.push_scope(1, vec![decl(None, "urn:outer")]);
        ns.push_scope(2, vec![decl(None, "urn:inner")]);
        assert_eq!(ns.resolve(None), Some("urn:inner"));

        ns.pop_to(1);
        assert_eq!(ns.resolve(None), Some("urn:outer"));
    }

    #[test]
    fn test_resolve_builtin_and_missing() {
        let ns = NamespaceStack::new();
        assert_eq!(ns.resolve(Some("xml")), Some(XML_NAMESPACE));
        assert_eq!(ns.resolve(None), Some(""));
        assert_eq!(ns.resolve(Some("p")), None);
    }

    #[test]
    fn test_sibling_scope_replaces_previous() {
        let mut ns = NamespaceStack::new();
        ns.push_scope(1, vec![]);
        ns.push_scope(2, vec![decl(Some("a"), "urn:a")]);
        ns.push_scope(2, vec![decl(Some("b"), "urn:b")]);
        assert_eq!(ns.len(), 1);
        assert_eq!(ns.resolve(Some("a")), None);
        assert_eq!(ns.resolve(Some("b")), Some("urn:b"));
    }
}
