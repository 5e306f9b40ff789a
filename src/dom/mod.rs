//! DOM Module - Mutable arena-based element tree
//!
//! - Arena allocation for nodes, addressed by `NodeId` (u32)
//! - Dual single-value/list storage for element content and attributes
//! - Interned qualified names through a per-tree `NodeFactory`
//! - Live list views that keep parent links consistent
//! - Namespace resolution over the ancestor chain

pub mod element;
pub mod factory;
pub mod namespace;
pub mod node;
pub mod qname;
pub mod slot;
pub mod tree;
pub mod view;

use std::borrow::Cow;

pub use element::ContentItem;
pub use factory::NodeFactory;
pub use node::{Branch, ElementData, NodeData, NodeId, NodeKind, XmlNode};
pub use qname::{Namespace, QName, NO_NAMESPACE, XMLNS_NAMESPACE, XML_NAMESPACE};
pub use slot::{DualSlot, SlotIter};
pub use tree::{HookEvent, SlotKind, XmlTree};
pub use view::ContentView;

/// Read-only traversal used by encoders and serializers
pub trait TreeAccess {
    /// Get root element ID
    fn root_element_id(&self) -> Option<NodeId>;

    /// Get a node by ID
    fn get_node(&self, id: NodeId) -> Option<&XmlNode>;

    /// Qualified name of elements and attributes, target of processing
    /// instructions, name of entities
    fn node_name(&self, id: NodeId) -> Option<Cow<'_, str>>;

    /// Own text of a leaf node
    fn text_content(&self, id: NodeId) -> Option<&str>;

    /// Children in document order
    fn children_vec(&self, id: NodeId) -> Vec<NodeId>;

    /// Attribute nodes in order
    fn attributes_vec(&self, id: NodeId) -> Vec<NodeId>;

    /// Get attribute value by local name
    fn attribute_value(&self, node_id: NodeId, name: &str) -> Option<&str>;

    /// All descendants in document order, excluding `id` itself
    fn descendants_vec(&self, id: NodeId) -> Vec<NodeId>;
}

impl TreeAccess for XmlTree {
    #[inline]
    fn root_element_id(&self) -> Option<NodeId> {
        self.root_element()
    }

    #[inline]
    fn get_node(&self, id: NodeId) -> Option<&XmlNode> {
        self.get(id)
    }

    fn node_name(&self, id: NodeId) -> Option<Cow<'_, str>> {
        self.get(id)?.name()
    }

    fn text_content(&self, id: NodeId) -> Option<&str> {
        self.get(id)?.own_text()
    }

    fn children_vec(&self, id: NodeId) -> Vec<NodeId> {
        self.node_iter(id).collect()
    }

    fn attributes_vec(&self, id: NodeId) -> Vec<NodeId> {
        self.attribute_iter(id).collect()
    }

    fn attribute_value(&self, node_id: NodeId, name: &str) -> Option<&str> {
        XmlTree::attribute_value(self, node_id, name)
    }

    fn descendants_vec(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.node_iter(id).rev().collect();
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self.node_iter(next).rev());
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Minimal serializer written purely against `TreeAccess`
    fn to_xml<D: TreeAccess>(doc: &D, id: NodeId, out: &mut String) {
        let Some(node) = doc.get_node(id) else {
            return;
        };
        match node.kind() {
            NodeKind::Element => {
                let name = doc.node_name(id).unwrap_or_default();
                out.push('<');
                out.push_str(&name);
                for attr in doc.attributes_vec(id) {
                    let attr_name = doc.node_name(attr).unwrap_or_default();
                    let value = doc.text_content(attr).unwrap_or("");
                    out.push_str(&format!(" {}=\"{}\"", attr_name, value));
                }
                let children = doc.children_vec(id);
                for child in &children {
                    if let Some(ns) = doc.get_node(*child).and_then(XmlNode::as_namespace) {
                        out.push(' ');
                        out.push_str(&ns.to_string());
                    }
                }
                out.push('>');
                for child in children {
                    to_xml(doc, child, out);
                }
                out.push_str(&format!("</{}>", name));
            }
            NodeKind::Text => out.push_str(doc.text_content(id).unwrap_or("")),
            NodeKind::CData => {
                out.push_str(&format!("<![CDATA[{}]]>", doc.text_content(id).unwrap_or("")));
            }
            NodeKind::Comment => {
                out.push_str(&format!("<!--{}-->", doc.text_content(id).unwrap_or("")));
            }
            NodeKind::ProcessingInstruction => {
                let target = doc.node_name(id).unwrap_or_default();
                out.push_str(&format!("<?{} {}?>", target, doc.text_content(id).unwrap_or("")));
            }
            NodeKind::Entity => {
                out.push_str(&format!("&{};", doc.node_name(id).unwrap_or_default()));
            }
            NodeKind::Attribute | NodeKind::Namespace => {}
        }
    }

    fn sample() -> (XmlTree, NodeId) {
        let mut tree = XmlTree::new();
        let root = tree.create_element_named("catalog");
        tree.set_root_element(root).unwrap();
        tree.add_namespace(root, "dc", "urn:dc").unwrap();
        let book = tree.add_element_named(root, "book").unwrap();
        tree.set_attribute(book, "id", Some("b1")).unwrap();
        let title = tree.add_element_named(book, "dc:title").unwrap();
        tree.add_text(title, "Rust").unwrap();
        tree.add_comment(root, "end").unwrap();
        (tree, root)
    }

    #[test]
    fn test_serialize_through_trait() {
        let (tree, root) = sample();
        let mut out = String::new();
        to_xml(&tree, root, &mut out);
        assert_eq!(
            out,
            "<catalog xmlns:dc=\"urn:dc\"><book id=\"b1\"><dc:title>Rust</dc:title></book><!--end--></catalog>"
        );
    }

    #[test]
    fn test_descendants_document_order() {
        let (tree, root) = sample();
        let names: Vec<String> = tree
            .descendants_vec(root)
            .into_iter()
            .filter(|id| tree.kind(*id) == Some(NodeKind::Element))
            .filter_map(|id| TreeAccess::node_name(&tree, id).map(Cow::into_owned))
            .collect();
        assert_eq!(names, vec!["book", "dc:title"]);
        assert_eq!(tree.descendants_vec(root).len(), 5);
    }

    #[test]
    fn test_trait_accessors() {
        let (tree, root) = sample();
        assert_eq!(tree.root_element_id(), Some(root));
        let book = tree.element(root, "book").unwrap();
        assert_eq!(TreeAccess::attribute_value(&tree, book, "id"), Some("b1"));
        assert_eq!(tree.attributes_vec(book).len(), 1);
        assert_eq!(tree.children_vec(root).len(), 3);
        assert_eq!(tree.text_content(book), None);
    }
}
