//! XML Tree - Arena-based mutable element tree
//!
//! All nodes of a tree live in one arena and are addressed by `NodeId`.
//! Parent links are ids, so the tree has a single owner (the arena) and no
//! reference cycles. Nodes are never freed individually; a detached node
//! simply stops being reachable from the root.
//!
//! Every attach and detach goes through the two lifecycle hooks,
//! `child_added` and `child_removed`, so parent back-references stay
//! correct whichever path performed the mutation.

use std::sync::Arc;

use super::factory::NodeFactory;
use super::node::{Branch, ElementData, NodeData, NodeId, NodeKind, XmlNode};
use super::qname::{Namespace, QName};
use super::slot::DualSlot;
use crate::config::TreeConfig;
use crate::error::{Result, TreeError};

/// Which of an element's two slots an operation targets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotKind {
    Content,
    Attributes,
}

/// A recorded hook invocation (see [`TreeConfig::record_hooks`]).
///
/// `len` is the length of the owner's slot for `node` at the moment the
/// hook ran, which pins down whether it ran before or after the
/// structural change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookEvent {
    ChildAdded { owner: NodeId, node: NodeId, len: usize },
    ChildRemoved { owner: NodeId, node: NodeId, len: usize },
}

pub(crate) static EMPTY_SLOT: DualSlot<NodeId> = DualSlot::Empty;

/// A mutable XML tree stored in arena format
#[derive(Debug)]
pub struct XmlTree {
    /// Arena of nodes
    pub(crate) nodes: Vec<XmlNode>,
    /// Construction context
    factory: NodeFactory,
    config: TreeConfig,
    /// Root element node ID (child of the document)
    root_element: Option<NodeId>,
    journal: Vec<HookEvent>,
}

impl Default for XmlTree {
    fn default() -> Self {
        XmlTree::new()
    }
}

impl XmlTree {
    /// Create an empty tree with default configuration
    pub fn new() -> Self {
        Self::with_config(TreeConfig::default())
    }

    /// Create an empty tree, sizing the factory from `config`
    pub fn with_config(config: TreeConfig) -> Self {
        let factory = NodeFactory::new(config.qname_cache_capacity);
        Self::with_factory(factory, config)
    }

    /// Create an empty tree around an existing construction context
    pub fn with_factory(factory: NodeFactory, config: TreeConfig) -> Self {
        XmlTree {
            nodes: Vec::with_capacity(64),
            factory,
            config,
            root_element: None,
            journal: Vec::new(),
        }
    }

    #[inline]
    pub fn config(&self) -> &TreeConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut TreeConfig {
        &mut self.config
    }

    #[inline]
    pub fn factory(&self) -> &NodeFactory {
        &self.factory
    }

    pub fn factory_mut(&mut self) -> &mut NodeFactory {
        &mut self.factory
    }

    /// Number of nodes ever allocated
    pub fn node_total(&self) -> usize {
        self.nodes.len()
    }

    /// Drain the hook journal
    pub fn take_hook_events(&mut self) -> Vec<HookEvent> {
        std::mem::take(&mut self.journal)
    }

    // ========================================================================
    // Arena access
    // ========================================================================

    /// Get a node by ID
    #[inline]
    pub fn get(&self, id: NodeId) -> Option<&XmlNode> {
        self.nodes.get(id.index())
    }

    /// Whether `id` belongs to this tree
    #[inline]
    pub fn contains_node(&self, id: NodeId) -> bool {
        id.index() < self.nodes.len()
    }

    pub(crate) fn node(&self, id: NodeId) -> Result<&XmlNode> {
        self.nodes.get(id.index()).ok_or(TreeError::UnknownNode(id))
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> Result<&mut XmlNode> {
        self.nodes.get_mut(id.index()).ok_or(TreeError::UnknownNode(id))
    }

    pub(crate) fn element_data(&self, id: NodeId) -> Result<&ElementData> {
        self.node(id)?.as_element().ok_or(TreeError::NotAnElement(id))
    }

    pub(crate) fn element_data_mut(&mut self, id: NodeId) -> Result<&mut ElementData> {
        self.node_mut(id)?
            .as_element_mut()
            .ok_or(TreeError::NotAnElement(id))
    }

    /// The selected slot of an element, or an empty slot for anything else
    pub(crate) fn slot(&self, id: NodeId, kind: SlotKind) -> &DualSlot<NodeId> {
        match self.get(id).and_then(XmlNode::as_element) {
            Some(element) => match kind {
                SlotKind::Content => &element.content,
                SlotKind::Attributes => &element.attributes,
            },
            None => &EMPTY_SLOT,
        }
    }

    pub(crate) fn slot_mut(&mut self, id: NodeId, kind: SlotKind) -> Result<&mut DualSlot<NodeId>> {
        let element = self.element_data_mut(id)?;
        Ok(match kind {
            SlotKind::Content => &mut element.content,
            SlotKind::Attributes => &mut element.attributes,
        })
    }

    /// Kind of a node
    pub fn kind(&self, id: NodeId) -> Option<NodeKind> {
        self.get(id).map(XmlNode::kind)
    }

    /// Store a detached node and return its id
    pub fn alloc(&mut self, mut node: XmlNode) -> NodeId {
        node.parent = None;
        let id = NodeId::from_raw(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    // ========================================================================
    // Node construction
    // ========================================================================

    pub fn create_element(&mut self, qname: Arc<QName>) -> NodeId {
        let node = self.factory.element(qname);
        self.alloc(node)
    }

    /// Element named `local` in no namespace
    pub fn create_element_named(&mut self, local: &str) -> NodeId {
        let qname = self.factory.local_qname(local);
        self.create_element(qname)
    }

    pub fn create_element_ns(&mut self, local: &str, namespace: &Namespace) -> NodeId {
        let qname = self.factory.qname(local, namespace);
        self.create_element(qname)
    }

    /// Element pre-sized for `attribute_count` attributes
    pub fn create_element_with_attributes(
        &mut self,
        qname: Arc<QName>,
        attribute_count: usize,
    ) -> NodeId {
        let node = self.factory.element_with_attributes(qname, attribute_count);
        self.alloc(node)
    }

    /// Detached attribute. A `None` value is allowed until it is attached.
    pub fn create_attribute(&mut self, qname: Arc<QName>, value: Option<&str>) -> NodeId {
        let node = self.factory.attribute(qname, value.map(str::to_string));
        self.alloc(node)
    }

    pub fn create_attribute_named(&mut self, local: &str, value: Option<&str>) -> NodeId {
        let qname = self.factory.local_qname(local);
        self.create_attribute(qname, value)
    }

    pub fn create_text(&mut self, text: &str) -> NodeId {
        let node = self.factory.text(text);
        self.alloc(node)
    }

    pub fn create_cdata(&mut self, text: &str) -> NodeId {
        let node = self.factory.cdata(text);
        self.alloc(node)
    }

    pub fn create_comment(&mut self, text: &str) -> NodeId {
        let node = self.factory.comment(text);
        self.alloc(node)
    }

    pub fn create_processing_instruction(&mut self, target: &str, data: &str) -> NodeId {
        let node = self.factory.processing_instruction(target, data);
        self.alloc(node)
    }

    pub fn create_namespace(&mut self, prefix: &str, uri: &str) -> NodeId {
        let node = self.factory.namespace(prefix, uri);
        self.alloc(node)
    }

    pub fn create_entity(&mut self, name: &str, text: &str) -> NodeId {
        let node = self.factory.entity(name, text);
        self.alloc(node)
    }

    // ========================================================================
    // Identity
    // ========================================================================

    /// Qualified name of an element or attribute
    pub fn qname(&self, id: NodeId) -> Option<&QName> {
        match &self.get(id)?.data {
            NodeData::Element(e) => Some(&e.qname),
            NodeData::Attribute { qname, .. } => Some(qname),
            _ => None,
        }
    }

    /// Replace an element's name
    pub fn set_qname(&mut self, element: NodeId, qname: Arc<QName>) -> Result<()> {
        self.element_data_mut(element)?.qname = qname;
        Ok(())
    }

    /// Local name of an element or attribute
    pub fn name(&self, id: NodeId) -> Option<&str> {
        self.qname(id).map(QName::name)
    }

    /// Namespace an element or attribute is bound to
    pub fn namespace(&self, id: NodeId) -> Option<&Namespace> {
        self.qname(id).map(QName::namespace)
    }

    /// `prefix:local`, or just `local` when unprefixed
    pub fn qualified_name(&self, id: NodeId) -> Option<std::borrow::Cow<'_, str>> {
        self.qname(id).map(QName::qualified_name)
    }

    pub fn namespace_prefix(&self, id: NodeId) -> Option<&str> {
        self.qname(id).map(QName::prefix)
    }

    pub fn namespace_uri(&self, id: NodeId) -> Option<&str> {
        self.qname(id).map(QName::uri)
    }

    // ========================================================================
    // Parent / document
    // ========================================================================

    /// Parent element (a document parent is not an element)
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id)?.parent_element()
    }

    /// Raw parent branch
    pub fn parent_branch(&self, id: NodeId) -> Option<Branch> {
        self.get(id)?.parent
    }

    /// The document's root element
    pub fn root_element(&self) -> Option<NodeId> {
        self.root_element
    }

    /// Make `element` the document's root element.
    ///
    /// The previous root is detached. A node that already has a parent is
    /// rejected.
    pub fn set_root_element(&mut self, element: NodeId) -> Result<()> {
        let node = self.node(element)?;
        if !node.is_element() {
            return Err(TreeError::NotAnElement(element));
        }
        if self.root_element == Some(element) {
            return Ok(());
        }
        if let Some(parent) = node.parent {
            return Err(self.illegal_add(element, parent));
        }

        if let Some(old) = self.root_element.take() {
            if let Ok(old_node) = self.node_mut(old) {
                old_node.parent = None;
            }
        }
        self.node_mut(element)?.parent = Some(Branch::Document);
        self.root_element = Some(element);
        Ok(())
    }

    /// Detach the root element from the document
    pub fn clear_root_element(&mut self) -> Option<NodeId> {
        let old = self.root_element.take()?;
        if let Ok(node) = self.node_mut(old) {
            node.parent = None;
        }
        Some(old)
    }

    /// Whether the node's ancestor chain reaches the document
    pub fn is_in_document(&self, id: NodeId) -> bool {
        let mut current = self.get(id).and_then(|n| n.parent);
        while let Some(branch) = current {
            match branch {
                Branch::Document => return true,
                Branch::Element(parent) => current = self.get(parent).and_then(|n| n.parent),
            }
        }
        false
    }

    /// Whether `ancestor` is `id` or one of its ancestors
    pub fn is_ancestor_or_self(&self, ancestor: NodeId, id: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(node) = current {
            if node == ancestor {
                return true;
            }
            current = self.parent(node);
        }
        false
    }

    fn describe_branch(&self, branch: Branch) -> String {
        match branch {
            Branch::Document => "#document".to_string(),
            Branch::Element(id) => self
                .qname(id)
                .map(|q| q.qualified_name().into_owned())
                .unwrap_or_default(),
        }
    }

    pub(crate) fn illegal_add(&self, node: NodeId, parent: Branch) -> TreeError {
        let kind = self.kind(node).map(NodeKind::label).unwrap_or("Node");
        tracing::debug!(node = %node, kind, "rejecting node that already has a parent");
        TreeError::IllegalAdd {
            node,
            kind,
            parent: self.describe_branch(parent),
        }
    }

    // ========================================================================
    // Lifecycle hooks
    // ========================================================================

    /// Check that `node` may be attached to `owner`'s slot. Pure.
    ///
    /// A node already attached to `owner` passes; one attached anywhere
    /// else is an illegal add.
    pub(crate) fn validate_child(&self, owner: NodeId, node: NodeId, slot: SlotKind) -> Result<()> {
        self.element_data(owner)?;
        let child = self.node(node)?;
        let kind = child.kind();

        match (slot, kind) {
            (SlotKind::Attributes, NodeKind::Attribute) => {
                if child.own_text().is_none() {
                    return Err(TreeError::WrongKind {
                        node,
                        expected: "attribute with a value",
                    });
                }
            }
            (SlotKind::Attributes, _) => {
                return Err(TreeError::WrongKind {
                    node,
                    expected: "attribute",
                });
            }
            (SlotKind::Content, NodeKind::Attribute) => {
                return Err(TreeError::WrongKind {
                    node,
                    expected: "content node",
                });
            }
            (SlotKind::Content, _) => {}
        }

        if !kind.supports_parent() {
            return Ok(());
        }

        match child.parent {
            Some(Branch::Element(parent)) if parent == owner => {}
            Some(parent) => return Err(self.illegal_add(node, parent)),
            None => {}
        }

        if kind == NodeKind::Element && self.is_ancestor_or_self(node, owner) {
            return Err(TreeError::Cycle { node, owner });
        }

        Ok(())
    }

    /// Point `node`'s parent at `owner` and record the hook
    pub(crate) fn mark_added(&mut self, owner: NodeId, node: NodeId) {
        if let Some(child) = self.nodes.get_mut(node.index()) {
            if child.kind().supports_parent() {
                child.parent = Some(Branch::Element(owner));
            }
        }
        tracing::trace!(owner = %owner, node = %node, "child added");
        if self.config.record_hooks {
            let len = self.hook_slot_len(owner, node);
            self.journal.push(HookEvent::ChildAdded { owner, node, len });
        }
    }

    /// Add hook: validate, then attach. Rejection leaves everything untouched.
    pub(crate) fn child_added(
        &mut self,
        owner: NodeId,
        node: NodeId,
        slot: SlotKind,
    ) -> Result<()> {
        self.validate_child(owner, node, slot)?;
        self.mark_added(owner, node);
        Ok(())
    }

    /// Remove hook: clear the node's parent link if it points at `owner`.
    ///
    /// The hook may fire for a node that is not a member of `owner`; a link
    /// to some other parent is left alone.
    pub(crate) fn child_removed(&mut self, owner: NodeId, node: NodeId) {
        if let Some(child) = self.nodes.get_mut(node.index()) {
            if child.parent == Some(Branch::Element(owner)) {
                child.parent = None;
            }
        }
        tracing::trace!(owner = %owner, node = %node, "child removed");
        if self.config.record_hooks {
            let len = self.hook_slot_len(owner, node);
            self.journal.push(HookEvent::ChildRemoved { owner, node, len });
        }
    }

    /// Length of the owner slot that holds nodes of `node`'s kind
    fn hook_slot_len(&self, owner: NodeId, node: NodeId) -> usize {
        let slot = match self.get(node).map(XmlNode::kind) {
            Some(NodeKind::Attribute) => SlotKind::Attributes,
            _ => SlotKind::Content,
        };
        self.slot(owner, slot).len()
    }

    // ========================================================================
    // Clone
    // ========================================================================

    /// Deep copy of a node, detached.
    ///
    /// Elements copy their name, then re-add cloned attributes and content
    /// through the normal add paths, so the copy never shares storage with
    /// the source. Namespace declarations carry no parent and are shared.
    pub fn clone_node(&mut self, id: NodeId) -> Result<NodeId> {
        let node = self.node(id)?;
        match &node.data {
            NodeData::Namespace(_) => Ok(id),
            NodeData::Element(element) => {
                let qname = Arc::clone(&element.qname);
                let attributes = element.attributes.to_vec();
                let content = element.content.to_vec();

                let copy = self.create_element(qname);
                for attribute in attributes {
                    let attribute_copy = self.clone_node(attribute)?;
                    self.add_attribute(copy, attribute_copy)?;
                }
                for child in content {
                    let child_copy = self.clone_node(child)?;
                    self.add_node(copy, child_copy)?;
                }
                tracing::debug!(source = %id, copy = %copy, "cloned element");
                Ok(copy)
            }
            _ => {
                let copy = node.clone();
                Ok(self.alloc(copy))
            }
        }
    }
}
