//! Qualified Names and Namespaces
//!
//! A `Namespace` is a prefix/URI pair. A `QName` is a local name bound to a
//! namespace; equality ignores the prefix, matching XML namespace rules.

use std::borrow::Cow;
use std::fmt;
use std::hash::{Hash, Hasher};

/// A namespace binding (prefix -> URI)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Namespace {
    prefix: Cow<'static, str>,
    uri: Cow<'static, str>,
}

/// The `xml` prefix, bound everywhere
pub static XML_NAMESPACE: Namespace =
    Namespace::from_static("xml", super::namespace::ns::XML);

/// Explicitly unnamespaced: empty prefix, empty URI
/// The reserved `xmlns` binding
pub static XMLNS_NAMESPACE: Namespace =
    Namespace::from_static("xmlns", super::namespace::ns::XMLNS);

pub static NO_NAMESPACE: Namespace = Namespace::from_static("", "");

impl Namespace {
    /// Create a namespace binding
    pub fn new(prefix: impl Into<String>, uri: impl Into<String>) -> Self {
        Namespace {
            prefix: Cow::Owned(prefix.into()),
            uri: Cow::Owned(uri.into()),
        }
    }

    /// Const constructor for well-known bindings
    pub const fn from_static(prefix: &'static str, uri: &'static str) -> Self {
        Namespace {
            prefix: Cow::Borrowed(prefix),
            uri: Cow::Borrowed(uri),
        }
    }

    #[inline]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    #[inline]
    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// Whether this is the "no namespace" binding
    pub fn is_none(&self) -> bool {
        self.prefix.is_empty() && self.uri.is_empty()
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.prefix.is_empty() {
            write!(f, "xmlns=\"{}\"", self.uri)
        } else {
            write!(f, "xmlns:{}=\"{}\"", self.prefix, self.uri)
        }
    }
}

/// Qualified name: local part plus namespace binding
#[derive(Debug, Clone)]
pub struct QName {
    local: String,
    namespace: Namespace,
}

impl QName {
    /// Name without a namespace
    pub fn local(local: impl Into<String>) -> Self {
        QName {
            local: local.into(),
            namespace: NO_NAMESPACE.clone(),
        }
    }

    /// Name bound to `namespace`
    pub fn with_namespace(local: impl Into<String>, namespace: Namespace) -> Self {
        QName {
            local: local.into(),
            namespace,
        }
    }

    /// Local part (no prefix)
    #[inline]
    pub fn name(&self) -> &str {
        &self.local
    }

    #[inline]
    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    #[inline]
    pub fn prefix(&self) -> &str {
        self.namespace.prefix()
    }

    #[inline]
    pub fn uri(&self) -> &str {
        self.namespace.uri()
    }

    /// `prefix:local`, or just `local` without a prefix
    pub fn qualified_name(&self) -> Cow<'_, str> {
        if self.prefix().is_empty() {
            Cow::Borrowed(&self.local)
        } else {
            Cow::Owned(format!("{}:{}", self.prefix(), self.local))
        }
    }
}

impl PartialEq for QName {
    fn eq(&self, other: &Self) -> bool {
        self.local == other.local && self.uri() == other.uri()
    }
}

impl Eq for QName {}

impl Hash for QName {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.local.hash(state);
        self.uri().hash(state);
    }
}

impl fmt::Display for QName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.qualified_name())
    }
}

/// Split a name into prefix and local name at the colon
pub fn split_qualified(name: &str) -> (Option<&str>, &str) {
    match memchr::memchr(b':', name.as_bytes()) {
        Some(pos) => (Some(&name[..pos]), &name[pos + 1..]),
        None => (None, name),
    }
}
