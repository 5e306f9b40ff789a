//! Namespace Resolution
//!
//! Prefix and URI lookups over the element ancestor chain. Each element is
//! checked in the same order: its own name binding, then the namespace
//! declarations among its children, then its parent.

use super::node::{NodeId, XmlNode};
use super::qname::{Namespace, NO_NAMESPACE, XMLNS_NAMESPACE, XML_NAMESPACE};
use super::tree::{SlotKind, XmlTree};

/// Well-known namespace URIs
pub mod ns {
    pub const XML: &str = "http://www.w3.org/XML/1998/namespace";
    pub const XMLNS: &str = "http://www.w3.org/2000/xmlns/";
}

impl XmlTree {
    /// First namespace declaration among the element's own children that
    /// satisfies `matches`
    fn local_declaration<F>(&self, element: NodeId, matches: F) -> Option<&Namespace>
    where
        F: Fn(&Namespace) -> bool,
    {
        self.slot(element, SlotKind::Content)
            .iter()
            .filter_map(|id| self.get(id).and_then(XmlNode::as_namespace))
            .find(|&ns| matches(ns))
    }

    /// Namespace bound to `prefix` in scope at `element`.
    ///
    /// `xml` and `xmlns` are always bound. The empty prefix asks for the
    /// default namespace. An undeclared
    /// default namespace resolves to [`NO_NAMESPACE`]; any other unbound
    /// prefix is `None`.
    pub fn namespace_for_prefix(&self, element: NodeId, prefix: &str) -> Option<&Namespace> {
        let mut current = Some(element);

        while let Some(id) = current {
            let Some(data) = self.get(id).and_then(XmlNode::as_element) else {
                break;
            };

            if data.qname.prefix() == prefix {
                return Some(data.qname.namespace());
            }
            match prefix {
                "xml" => return Some(&XML_NAMESPACE),
                "xmlns" => return Some(&XMLNS_NAMESPACE),
                _ => {}
            }
            if let Some(found) = self.local_declaration(id, |ns| ns.prefix() == prefix) {
                return Some(found);
            }

            current = self.parent(id);
        }

        if prefix.is_empty() {
            Some(&NO_NAMESPACE)
        } else {
            None
        }
    }

    /// Namespace in scope at `element` whose URI is `uri`.
    ///
    /// The empty URI always resolves to [`NO_NAMESPACE`].
    pub fn namespace_for_uri(&self, element: NodeId, uri: &str) -> Option<&Namespace> {
        if uri.is_empty() {
            return Some(&NO_NAMESPACE);
        }

        let mut current = Some(element);
        while let Some(id) = current {
            let data = self.get(id).and_then(XmlNode::as_element)?;

            if data.qname.uri() == uri {
                return Some(data.qname.namespace());
            }
            if let Some(found) = self.local_declaration(id, |ns| ns.uri() == uri) {
                return Some(found);
            }

            current = self.parent(id);
        }
        None
    }

    /// Every binding visible at `element`, nearest first, one per prefix
    pub fn namespaces_in_scope(&self, element: NodeId) -> Vec<&Namespace> {
        let mut seen: Vec<&Namespace> = Vec::new();
        let mut current = Some(element);

        while let Some(id) = current {
            let Some(data) = self.get(id).and_then(XmlNode::as_element) else {
                break;
            };
            let own = std::iter::once(data.qname.namespace());
            let declared = self
                .slot(id, SlotKind::Content)
                .iter()
                .filter_map(|child| self.get(child).and_then(XmlNode::as_namespace));

            for ns in own.chain(declared) {
                if ns.is_none() {
                    continue;
                }
                if !seen.iter().any(|s| s.prefix() == ns.prefix()) {
                    seen.push(ns);
                }
            }
            current = self.parent(id);
        }
        seen
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A (default X) -> B (declares p -> Y) -> C (in X)
    fn nested() -> (XmlTree, NodeId, NodeId, NodeId) {
        let mut tree = XmlTree::new();
        let x = Namespace::new("", "urn:x");
        let a = tree.create_element_ns("a", &x);
        tree.add_namespace(a, "", "urn:x").unwrap();
        let b = tree.add_element_named(a, "b").unwrap();
        tree.add_namespace(b, "p", "urn:y").unwrap();
        let c = tree.add_element_named(b, "c").unwrap();
        (tree, a, b, c)
    }

    #[test]
    fn test_prefix_from_ancestor() {
        let (tree, _, _, c) = nested();
        assert_eq!(tree.namespace_for_prefix(c, "p").map(Namespace::uri), Some("urn:y"));
        assert_eq!(tree.namespace_for_prefix(c, "q"), None);
        assert_eq!(tree.namespace_for_prefix(c, "").map(Namespace::uri), Some("urn:x"));
    }

    #[test]
    fn test_children_inherit_default_namespace() {
        let (tree, _, b, c) = nested();
        assert_eq!(tree.namespace(b).map(Namespace::uri), Some("urn:x"));
        assert_eq!(tree.namespace(c).map(Namespace::uri), Some("urn:x"));
    }

    #[test]
    fn test_reserved_prefixes_are_predeclared() {
        let mut tree = XmlTree::new();
        let root = tree.create_element_named("root");
        let ns = tree.namespace_for_prefix(root, "xml").unwrap();
        assert_eq!(ns.uri(), ns::XML);
        let ns = tree.namespace_for_prefix(root, "xmlns").unwrap();
        assert_eq!(ns.uri(), ns::XMLNS);
    }

    #[test]
    fn test_empty_prefix_at_root() {
        let mut tree = XmlTree::new();
        let root = tree.create_element_ns("root", &Namespace::new("r", "urn:r"));
        // not declared anywhere, but explicitly unnamespaced
        assert_eq!(tree.namespace_for_prefix(root, ""), Some(&NO_NAMESPACE));
        assert_eq!(tree.namespace_for_prefix(root, "r").map(Namespace::uri), Some("urn:r"));
    }

    #[test]
    fn test_own_binding_wins_over_declaration() {
        let mut tree = XmlTree::new();
        let root = tree.create_element_ns("root", &Namespace::new("p", "urn:own"));
        tree.add_namespace(root, "p", "urn:declared").unwrap();
        assert_eq!(tree.namespace_for_prefix(root, "p").map(Namespace::uri), Some("urn:own"));
    }

    #[test]
    fn test_nearest_declaration_shadows() {
        let mut tree = XmlTree::new();
        let root = tree.create_element_named("root");
        tree.add_namespace(root, "p", "urn:outer").unwrap();
        let inner = tree.add_element_named(root, "inner").unwrap();
        tree.add_namespace(inner, "p", "urn:inner").unwrap();
        assert_eq!(tree.namespace_for_prefix(inner, "p").map(Namespace::uri), Some("urn:inner"));
        assert_eq!(tree.namespace_for_prefix(root, "p").map(Namespace::uri), Some("urn:outer"));
    }

    #[test]
    fn test_namespace_for_uri() {
        let (tree, a, _, c) = nested();
        assert_eq!(tree.namespace_for_uri(c, ""), Some(&NO_NAMESPACE));
        assert_eq!(tree.namespace_for_uri(c, "urn:y").map(Namespace::prefix), Some("p"));
        assert_eq!(tree.namespace_for_uri(c, "urn:x").map(Namespace::prefix), Some(""));
        assert_eq!(tree.namespace_for_uri(a, "urn:y"), None);
        assert_eq!(tree.namespace_for_uri(c, "urn:missing"), None);
    }

    #[test]
    fn test_non_element_start() {
        let mut tree = XmlTree::new();
        let text = tree.create_text("t");
        assert_eq!(tree.namespace_for_prefix(text, ""), Some(&NO_NAMESPACE));
        assert_eq!(tree.namespace_for_prefix(text, "p"), None);
        assert_eq!(tree.namespace_for_uri(text, "urn:x"), None);
    }

    #[test]
    fn test_namespaces_in_scope() {
        let (tree, _, _, c) = nested();
        let prefixes: Vec<&str> = tree.namespaces_in_scope(c).iter().map(|n| n.prefix()).collect();
        assert_eq!(prefixes, vec!["", "p"]);
    }
}
