// Symbols and keywords shared by the reader and the runtime

use std::fmt;

// --- Symbol, Keyword ---

/// An identifier, optionally qualified with a namespace (`ns-name/local-name`).
///
/// Two symbols are equal iff their full qualified text is equal.
#[derive(Debug, PartialEq, Clone, Eq, Hash, PartialOrd, Ord)]
pub struct Symbol(pub String);

impl Symbol {
    pub fn new(s: &str) -> Self {
        Symbol(s.to_string())
    }

    /// Builds `ns/name`.
    pub fn qualified(namespace: &str, name: &str) -> Self {
        Symbol(format!("{}/{}", namespace, name))
    }

    fn split(&self) -> Option<(&str, &str)> {
        match self.0.split_once('/') {
            Some((ns, name)) if !ns.is_empty() && !name.is_empty() => Some((ns, name)),
            _ => None,
        }
    }

    /// The namespace part of a qualified symbol, if any.
    pub fn namespace(&self) -> Option<&str> {
        self.split().map(|(ns, _)| ns)
    }

    /// The local part of the symbol; the whole text when unqualified.
    pub fn name(&self) -> &str {
        self.split().map(|(_, name)| name).unwrap_or(&self.0)
    }

    pub fn is_qualified(&self) -> bool {
        self.split().is_some()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Symbol {
    fn from(s: &str) -> Self {
        Symbol::new(s)
    }
}

#[derive(Debug, PartialEq, Clone, Eq, Hash, PartialOrd, Ord)]
pub struct Keyword(pub String);

impl Keyword {
    pub fn new(s: &str) -> Self {
        Keyword(s.to_string())
    }
}

impl fmt::Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, ":{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn qualified_symbols_split_on_first_slash() {
        let sym = Symbol::new("user.spec/barge");
        assert_eq!(sym.namespace(), Some("user.spec"));
        assert_eq!(sym.name(), "barge");
        assert!(sym.is_qualified());
        assert_eq!(Symbol::qualified("user.spec", "barge"), sym);
    }

    #[test]
    fn bare_slash_is_unqualified() {
        let slash = Symbol::new("/");
        assert_eq!(slash.namespace(), None);
        assert_eq!(slash.name(), "/");

        let trailing = Symbol::new("ns/");
        assert!(!trailing.is_qualified());
    }
}
