//! Node Factory
//!
//! Construction context for a tree. Interns qualified names so every
//! element or attribute with the same name shares one `Arc<QName>`, and
//! builds detached nodes ready to be allocated in the arena.
//!
//! The intern table is an LRU cache: names that fall out of it are simply
//! re-created on next use, and existing nodes keep their `Arc`.

use std::num::NonZeroUsize;
use std::sync::Arc;

use lru::LruCache;

use super::node::{ElementData, NodeData, XmlNode};
use super::qname::{split_qualified, Namespace, QName};

/// Cache key: (local, prefix, uri)
type QNameKey = (String, String, String);

/// Name-interning construction context
pub struct NodeFactory {
    cache: LruCache<QNameKey, Arc<QName>>,
    hits: u64,
    misses: u64,
}

impl std::fmt::Debug for NodeFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeFactory")
            .field("cached", &self.cache.len())
            .field("capacity", &self.cache.cap())
            .field("hits", &self.hits)
            .field("misses", &self.misses)
            .finish()
    }
}

impl NodeFactory {
    /// Create a factory caching up to `capacity` distinct names
    pub fn new(capacity: NonZeroUsize) -> Self {
        NodeFactory {
            cache: LruCache::new(capacity),
            hits: 0,
            misses: 0,
        }
    }

    /// Interned name bound to `namespace`
    pub fn qname(&mut self, local: &str, namespace: &Namespace) -> Arc<QName> {
        let key = (
            local.to_string(),
            namespace.prefix().to_string(),
            namespace.uri().to_string(),
        );

        if let Some(existing) = self.cache.get(&key) {
            self.hits += 1;
            return Arc::clone(existing);
        }

        self.misses += 1;
        let qname = Arc::new(QName::with_namespace(local, namespace.clone()));
        self.cache.put(key, Arc::clone(&qname));
        qname
    }

    /// Interned name without a namespace
    pub fn local_qname(&mut self, local: &str) -> Arc<QName> {
        self.qname(local, &super::qname::NO_NAMESPACE)
    }

    /// Interned name from a `prefix:local` string and a URI
    pub fn qname_from_str(&mut self, qualified: &str, uri: &str) -> Arc<QName> {
        let (prefix, local) = split_qualified(qualified);
        let namespace = Namespace::new(prefix.unwrap_or(""), uri);
        self.qname(local, &namespace)
    }

    /// (hits, misses) of the intern cache
    pub fn cache_stats(&self) -> (u64, u64) {
        (self.hits, self.misses)
    }

    /// Number of names currently cached
    pub fn cached_names(&self) -> usize {
        self.cache.len()
    }

    // ========================================================================
    // Detached node constructors
    // ========================================================================

    pub fn element(&self, qname: Arc<QName>) -> XmlNode {
        XmlNode::new(NodeData::Element(ElementData::new(qname)))
    }

    /// Element whose attribute storage is sized for `attribute_count`
    pub fn element_with_attributes(&self, qname: Arc<QName>, attribute_count: usize) -> XmlNode {
        XmlNode::new(NodeData::Element(ElementData::with_attribute_capacity(
            qname,
            attribute_count,
        )))
    }

    pub fn attribute(&self, qname: Arc<QName>, value: Option<String>) -> XmlNode {
        XmlNode::new(NodeData::Attribute { qname, value })
    }

    pub fn text(&self, text: impl Into<String>) -> XmlNode {
        XmlNode::new(NodeData::Text(text.into()))
    }

    pub fn cdata(&self, text: impl Into<String>) -> XmlNode {
        XmlNode::new(NodeData::CData(text.into()))
    }

    pub fn comment(&self, text: impl Into<String>) -> XmlNode {
        XmlNode::new(NodeData::Comment(text.into()))
    }

    pub fn processing_instruction(
        &self,
        target: impl Into<String>,
        data: impl Into<String>,
    ) -> XmlNode {
        XmlNode::new(NodeData::ProcessingInstruction {
            target: target.into(),
            data: data.into(),
        })
    }

    pub fn namespace(&self, prefix: impl Into<String>, uri: impl Into<String>) -> XmlNode {
        XmlNode::new(NodeData::Namespace(Namespace::new(prefix, uri)))
    }

    pub fn entity(&self, name: impl Into<String>, text: impl Into<String>) -> XmlNode {
        XmlNode::new(NodeData::Entity {
            name: name.into(),
            text: text.into(),
        })
    }
}

impl Default for NodeFactory {
    fn default() -> Self {
        NodeFactory::new(crate::config::TreeConfig::default().qname_cache_capacity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interning_shares_names() {
        let mut factory = NodeFactory::default();
        let ns = Namespace::new("p", "urn:p");
        let a = factory.qname("item", &ns);
        let b = factory.qname("item", &ns);
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(factory.cache_stats(), (1, 1));
    }

    #[test]
    fn test_prefix_is_part_of_identity() {
        let mut factory = NodeFactory::default();
        let a = factory.qname("item", &Namespace::new("a", "urn:x"));
        let b = factory.qname("item", &Namespace::new("b", "urn:x"));
        assert!(!Arc::ptr_eq(&a, &b));
        // still equal as qualified names
        assert_eq!(a, b);
    }

    #[test]
    fn test_eviction() {
        let mut factory = NodeFactory::new(NonZeroUsize::new(2).unwrap());
        let first = factory.local_qname("a");
        factory.local_qname("b");
        factory.local_qname("c");
        assert_eq!(factory.cached_names(), 2);
        let again = factory.local_qname("a");
        assert!(!Arc::ptr_eq(&first, &again));
        assert_eq!(first, again);
    }

    #[test]
    fn test_qname_from_str() {
        let mut factory = NodeFactory::default();
        let q = factory.qname_from_str("svg:rect", "http://www.w3.org/2000/svg");
        assert_eq!(q.name(), "rect");
        assert_eq!(q.prefix(), "svg");
        assert_eq!(q.qualified_name(), "svg:rect");
    }
}
