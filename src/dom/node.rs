//! XML Node representation
//!
//! Nodes live in the tree's arena and refer to each other by `NodeId`.
//! Parent links are plain ids, so a child never owns its parent.

use std::fmt;
use std::sync::Arc;

use super::qname::{Namespace, QName};
use super::slot::DualSlot;

/// Compact node identifier (index into arena)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    /// Wrap a raw arena index
    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        NodeId(raw)
    }

    /// Raw arena index
    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    #[inline]
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Type of XML node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// Element node
    Element,
    /// Attribute of an element
    Attribute,
    /// Text content
    Text,
    /// CDATA section
    CData,
    /// Comment
    Comment,
    /// Processing instruction
    ProcessingInstruction,
    /// Namespace declaration
    Namespace,
    /// Entity reference
    Entity,
}

impl NodeKind {
    /// Whether nodes of this kind track their parent.
    ///
    /// Namespace declarations are shared between elements and carry no
    /// parent link.
    #[inline]
    pub fn supports_parent(self) -> bool {
        !matches!(self, NodeKind::Namespace)
    }

    /// Display name used in error messages
    pub fn label(self) -> &'static str {
        match self {
            NodeKind::Element => "Element",
            NodeKind::Attribute => "Attribute",
            NodeKind::Text => "Text",
            NodeKind::CData => "CDATA",
            NodeKind::Comment => "Comment",
            NodeKind::ProcessingInstruction => "ProcessingInstruction",
            NodeKind::Namespace => "Namespace",
            NodeKind::Entity => "Entity",
        }
    }
}

/// Where a node hangs: under an element, or directly under the document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Branch {
    /// The document itself (root element only)
    Document,
    /// A parent element
    Element(NodeId),
}

/// Element-specific data
#[derive(Debug, Clone)]
pub struct ElementData {
    /// Qualified name, shared with every element using the same name
    pub qname: Arc<QName>,
    /// Ordered children
    pub content: DualSlot<NodeId>,
    /// Ordered attributes
    pub attributes: DualSlot<NodeId>,
}

impl ElementData {
    pub fn new(qname: Arc<QName>) -> Self {
        ElementData {
            qname,
            content: DualSlot::new(),
            attributes: DualSlot::new(),
        }
    }

    /// Element with room for `attribute_count` attributes up front
    pub fn with_attribute_capacity(qname: Arc<QName>, attribute_count: usize) -> Self {
        ElementData {
            qname,
            content: DualSlot::new(),
            attributes: DualSlot::with_capacity(attribute_count),
        }
    }
}

/// Node-specific data
#[derive(Debug, Clone)]
pub enum NodeData {
    Element(ElementData),
    /// A detached attribute may have no value; a parented one always has one
    Attribute {
        qname: Arc<QName>,
        value: Option<String>,
    },
    Text(String),
    CData(String),
    Comment(String),
    ProcessingInstruction {
        target: String,
        data: String,
    },
    Namespace(Namespace),
    Entity {
        name: String,
        text: String,
    },
}

/// An XML node in the arena
#[derive(Debug, Clone)]
pub struct XmlNode {
    /// Parent branch (None when detached)
    pub parent: Option<Branch>,
    /// Node-specific data
    pub data: NodeData,
}

impl XmlNode {
    pub fn new(data: NodeData) -> Self {
        XmlNode { parent: None, data }
    }

    /// Type of this node
    pub fn kind(&self) -> NodeKind {
        match &self.data {
            NodeData::Element(_) => NodeKind::Element,
            NodeData::Attribute { .. } => NodeKind::Attribute,
            NodeData::Text(_) => NodeKind::Text,
            NodeData::CData(_) => NodeKind::CData,
            NodeData::Comment(_) => NodeKind::Comment,
            NodeData::ProcessingInstruction { .. } => NodeKind::ProcessingInstruction,
            NodeData::Namespace(_) => NodeKind::Namespace,
            NodeData::Entity { .. } => NodeKind::Entity,
        }
    }

    /// Check if this is an element node
    #[inline]
    pub fn is_element(&self) -> bool {
        matches!(self.data, NodeData::Element(_))
    }

    #[inline]
    pub fn as_element(&self) -> Option<&ElementData> {
        match &self.data {
            NodeData::Element(e) => Some(e),
            _ => None,
        }
    }

    #[inline]
    pub fn as_element_mut(&mut self) -> Option<&mut ElementData> {
        match &mut self.data {
            NodeData::Element(e) => Some(e),
            _ => None,
        }
    }

    #[inline]
    pub fn as_namespace(&self) -> Option<&Namespace> {
        match &self.data {
            NodeData::Namespace(ns) => Some(ns),
            _ => None,
        }
    }

    /// Parent element id, ignoring a document parent
    #[inline]
    pub fn parent_element(&self) -> Option<NodeId> {
        match self.parent {
            Some(Branch::Element(id)) => Some(id),
            _ => None,
        }
    }

    /// Node name: qualified name for elements and attributes, target for
    /// processing instructions, entity name for entities
    pub fn name(&self) -> Option<std::borrow::Cow<'_, str>> {
        match &self.data {
            NodeData::Element(e) => Some(e.qname.qualified_name()),
            NodeData::Attribute { qname, .. } => Some(qname.qualified_name()),
            NodeData::ProcessingInstruction { target, .. } => Some(target.as_str().into()),
            NodeData::Entity { name, .. } => Some(name.as_str().into()),
            NodeData::Namespace(ns) => Some(ns.prefix().into()),
            _ => None,
        }
    }

    /// Text a node contributes to its parent's `text()`
    pub fn text_contribution(&self) -> &str {
        match &self.data {
            NodeData::Text(t) | NodeData::CData(t) => t,
            NodeData::Entity { text, .. } => text,
            _ => "",
        }
    }

    /// Own text of leaf nodes (comments, PI data and attribute values too)
    pub fn own_text(&self) -> Option<&str> {
        match &self.data {
            NodeData::Text(t) | NodeData::CData(t) | NodeData::Comment(t) => Some(t),
            NodeData::Entity { text, .. } => Some(text),
            NodeData::ProcessingInstruction { data, .. } => Some(data),
            NodeData::Attribute { value, .. } => value.as_deref(),
            NodeData::Namespace(ns) => Some(ns.uri()),
            NodeData::Element(_) => None,
        }
    }
}
