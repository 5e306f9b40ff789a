//! Element content and attribute operations
//!
//! Every query branches on slot cardinality the same way: an empty slot
//! answers immediately, a single value is inspected in place, and only a
//! list-backed slot is scanned.

use std::borrow::Cow;
use std::sync::Arc;

use super::node::{Branch, NodeData, NodeId, NodeKind, XmlNode};
use super::qname::{split_qualified, Namespace, QName};
use super::slot::{DualSlot, SlotIter};
use super::tree::{SlotKind, XmlTree};
use crate::error::{Result, TreeError};

/// A value offered to [`XmlTree::set_content`]: an existing node, or raw
/// text that becomes a new text node
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentItem {
    Node(NodeId),
    Text(String),
}

impl From<NodeId> for ContentItem {
    fn from(id: NodeId) -> Self {
        ContentItem::Node(id)
    }
}

impl From<String> for ContentItem {
    fn from(text: String) -> Self {
        ContentItem::Text(text)
    }
}

impl From<&str> for ContentItem {
    fn from(text: &str) -> Self {
        ContentItem::Text(text.to_string())
    }
}

impl XmlTree {
    // ========================================================================
    // Content
    // ========================================================================

    /// Append a node, rejecting one that already has a parent
    pub fn add_node(&mut self, element: NodeId, node: NodeId) -> Result<()> {
        if let Some(parent) = self.node(node)?.parent {
            return Err(self.illegal_add(node, parent));
        }
        self.add_new_node(element, node)
    }

    /// Append a node: Empty becomes One, One is promoted, Many appends.
    /// The add hook follows the structural change.
    pub(crate) fn add_new_node(&mut self, element: NodeId, node: NodeId) -> Result<()> {
        self.validate_child(element, node, SlotKind::Content)?;
        self.slot_mut(element, SlotKind::Content)?.push(node);
        self.mark_added(element, node);
        Ok(())
    }

    /// Remove a child, returning whether it was present
    pub fn remove_node(&mut self, element: NodeId, node: NodeId) -> bool {
        let removed = match self.slot_mut(element, SlotKind::Content) {
            Ok(slot) => slot.remove_value(node),
            Err(_) => false,
        };
        if removed {
            self.child_removed(element, node);
        }
        removed
    }

    /// Child at `index`
    pub fn node_at(&self, element: NodeId, index: usize) -> Option<NodeId> {
        self.slot(element, SlotKind::Content).get(index)
    }

    /// Position of a child
    pub fn index_of(&self, element: NodeId, node: NodeId) -> Option<usize> {
        self.slot(element, SlotKind::Content).position(node)
    }

    /// Number of children (0 for non-elements)
    pub fn node_count(&self, element: NodeId) -> usize {
        self.slot(element, SlotKind::Content).len()
    }

    /// Children in document order
    pub fn node_iter(&self, element: NodeId) -> SlotIter<'_, NodeId> {
        self.slot(element, SlotKind::Content).iter()
    }

    /// Whether the content slot has been promoted to list storage
    pub fn is_content_promoted(&self, element: NodeId) -> bool {
        self.slot(element, SlotKind::Content).is_promoted()
    }

    /// Whether the attribute slot has been promoted to list storage
    pub fn is_attributes_promoted(&self, element: NodeId) -> bool {
        self.slot(element, SlotKind::Attributes).is_promoted()
    }

    /// Detach every child and reset the slot to `Empty`
    pub fn clear_content(&mut self, element: NodeId) -> Result<()> {
        if self.element_data(element)?.content.is_empty() {
            return Ok(());
        }
        self.content_removed(element);
        self.slot_mut(element, SlotKind::Content)?.reset();
        Ok(())
    }

    /// Fire the remove hook for every current child, leaving the slot as is
    fn content_removed(&mut self, element: NodeId) {
        let children = self.slot(element, SlotKind::Content).to_vec();
        for child in children {
            self.child_removed(element, child);
        }
    }

    /// Replace all content.
    ///
    /// Current children are detached first. An incoming node attached to
    /// some other parent is deep-cloned and the clone is inserted; raw text
    /// becomes a new text node. The new content is always list-backed.
    pub fn set_content<I, T>(&mut self, element: NodeId, items: I) -> Result<()>
    where
        I: IntoIterator<Item = T>,
        T: Into<ContentItem>,
    {
        let items: Vec<ContentItem> = items.into_iter().map(Into::into).collect();

        self.element_data(element)?;
        for item in &items {
            if let ContentItem::Node(id) = *item {
                let node = self.node(id)?;
                if node.kind() == NodeKind::Attribute {
                    return Err(TreeError::WrongKind {
                        node: id,
                        expected: "content node",
                    });
                }
                let foreign = self.is_parented_elsewhere(element, id);
                if !foreign
                    && node.kind() == NodeKind::Element
                    && self.is_ancestor_or_self(id, element)
                {
                    return Err(TreeError::Cycle { node: id, owner: element });
                }
            }
        }

        self.content_removed(element);

        let mut content = Vec::with_capacity(items.len());
        for item in items {
            let node = match item {
                ContentItem::Node(id) => {
                    if self.is_parented_elsewhere(element, id) {
                        self.clone_node(id)?
                    } else {
                        id
                    }
                }
                ContentItem::Text(text) => self.create_text(&text),
            };
            content.push(node);
            self.mark_added(element, node);
        }

        tracing::debug!(element = %element, len = content.len(), "replaced content");
        *self.slot_mut(element, SlotKind::Content)? = DualSlot::Many(content);
        Ok(())
    }

    fn is_parented_elsewhere(&self, element: NodeId, node: NodeId) -> bool {
        match self.get(node).and_then(|n| n.parent) {
            None => false,
            Some(Branch::Element(parent)) => parent != element,
            Some(Branch::Document) => true,
        }
    }

    // ========================================================================
    // Content builders
    // ========================================================================

    /// Create and append a child element
    pub fn add_element(&mut self, element: NodeId, qname: Arc<QName>) -> Result<NodeId> {
        self.element_data(element)?;
        let child = self.create_element(qname);
        self.add_new_node(element, child)?;
        Ok(child)
    }

    /// Create and append a child element from a `prefix:local` name.
    ///
    /// The prefix (or the default namespace when there is none) is resolved
    /// in the parent's scope; an unbound prefix keeps an empty URI.
    pub fn add_element_named(&mut self, element: NodeId, qualified: &str) -> Result<NodeId> {
        self.element_data(element)?;
        let (prefix, local) = split_qualified(qualified);
        let prefix = prefix.unwrap_or("");
        let namespace = self
            .namespace_for_prefix(element, prefix)
            .cloned()
            .unwrap_or_else(|| Namespace::new(prefix, ""));
        let qname = self.factory_mut().qname(local, &namespace);
        self.add_element(element, qname)
    }

    pub fn add_text(&mut self, element: NodeId, text: &str) -> Result<NodeId> {
        self.element_data(element)?;
        let id = self.create_text(text);
        self.add_new_node(element, id)?;
        Ok(id)
    }

    pub fn add_cdata(&mut self, element: NodeId, text: &str) -> Result<NodeId> {
        self.element_data(element)?;
        let id = self.create_cdata(text);
        self.add_new_node(element, id)?;
        Ok(id)
    }

    pub fn add_comment(&mut self, element: NodeId, text: &str) -> Result<NodeId> {
        self.element_data(element)?;
        let id = self.create_comment(text);
        self.add_new_node(element, id)?;
        Ok(id)
    }

    pub fn add_entity(&mut self, element: NodeId, name: &str, text: &str) -> Result<NodeId> {
        self.element_data(element)?;
        let id = self.create_entity(name, text);
        self.add_new_node(element, id)?;
        Ok(id)
    }

    pub fn add_processing_instruction(
        &mut self,
        element: NodeId,
        target: &str,
        data: &str,
    ) -> Result<NodeId> {
        self.element_data(element)?;
        let id = self.create_processing_instruction(target, data);
        self.add_new_node(element, id)?;
        Ok(id)
    }

    /// Declare `prefix` -> `uri` on the element
    pub fn add_namespace(&mut self, element: NodeId, prefix: &str, uri: &str) -> Result<NodeId> {
        self.element_data(element)?;
        let id = self.create_namespace(prefix, uri);
        self.add_new_node(element, id)?;
        Ok(id)
    }

    // ========================================================================
    // Child lookups
    // ========================================================================

    /// First child matching `predicate`, in document order
    fn find_child<F>(&self, element: NodeId, predicate: F) -> Option<NodeId>
    where
        F: Fn(&XmlNode) -> bool,
    {
        match self.slot(element, SlotKind::Content) {
            DualSlot::Empty => None,
            DualSlot::One(id) => self.get(*id).filter(|n| predicate(n)).map(|_| *id),
            DualSlot::Many(list) => list
                .iter()
                .copied()
                .find(|id| self.get(*id).is_some_and(&predicate)),
        }
    }

    /// Every child matching `predicate`, in document order
    fn filter_children<F>(&self, element: NodeId, predicate: F) -> Vec<NodeId>
    where
        F: Fn(&XmlNode) -> bool,
    {
        self.node_iter(element)
            .filter(|id| self.get(*id).is_some_and(&predicate))
            .collect()
    }

    /// First child element with local name `name`
    pub fn element(&self, element: NodeId, name: &str) -> Option<NodeId> {
        self.find_child(element, |n| n.as_element().is_some_and(|e| e.qname.name() == name))
    }

    /// First child element with qualified name `qname`
    pub fn element_by_qname(&self, element: NodeId, qname: &QName) -> Option<NodeId> {
        self.find_child(element, |n| n.as_element().is_some_and(|e| *e.qname == *qname))
    }

    /// First child element named `name` in `namespace`
    pub fn element_ns(&self, element: NodeId, name: &str, namespace: &Namespace) -> Option<NodeId> {
        let qname = QName::with_namespace(name, namespace.clone());
        self.element_by_qname(element, &qname)
    }

    /// Child elements
    pub fn elements(&self, element: NodeId) -> Vec<NodeId> {
        self.filter_children(element, XmlNode::is_element)
    }

    /// Child elements with local name `name`
    pub fn elements_named(&self, element: NodeId, name: &str) -> Vec<NodeId> {
        self.filter_children(element, |n| n.as_element().is_some_and(|e| e.qname.name() == name))
    }

    // ========================================================================
    // Processing instructions
    // ========================================================================

    fn is_pi_with_target(node: &XmlNode, wanted: &str) -> bool {
        matches!(&node.data, NodeData::ProcessingInstruction { target, .. } if target == wanted)
    }

    pub fn processing_instructions(&self, element: NodeId) -> Vec<NodeId> {
        self.filter_children(element, |n| n.kind() == NodeKind::ProcessingInstruction)
    }

    pub fn processing_instructions_with_target(
        &self,
        element: NodeId,
        target: &str,
    ) -> Vec<NodeId> {
        self.filter_children(element, |n| Self::is_pi_with_target(n, target))
    }

    /// First processing instruction with `target`
    pub fn processing_instruction(&self, element: NodeId, target: &str) -> Option<NodeId> {
        self.find_child(element, |n| Self::is_pi_with_target(n, target))
    }

    /// Remove the first processing instruction with `target`
    pub fn remove_processing_instruction(&mut self, element: NodeId, target: &str) -> bool {
        match self.processing_instruction(element, target) {
            Some(pi) => self.remove_node(element, pi),
            None => false,
        }
    }

    // ========================================================================
    // Namespace declarations
    // ========================================================================

    /// Namespaces declared by the element's own content
    pub fn declared_namespaces(&self, element: NodeId) -> Vec<&Namespace> {
        self.node_iter(element)
            .filter_map(|id| self.get(id).and_then(XmlNode::as_namespace))
            .collect()
    }

    /// Declared namespaces other than the element's own
    pub fn additional_namespaces(&self, element: NodeId) -> Vec<&Namespace> {
        let own = self.namespace(element);
        self.declared_namespaces(element)
            .into_iter()
            .filter(|ns| Some(*ns) != own)
            .collect()
    }

    /// Declared namespaces whose URI is not `default_uri`
    pub fn additional_namespaces_except(
        &self,
        element: NodeId,
        default_uri: &str,
    ) -> Vec<&Namespace> {
        self.declared_namespaces(element)
            .into_iter()
            .filter(|ns| ns.uri() != default_uri)
            .collect()
    }

    // ========================================================================
    // Attributes
    // ========================================================================

    pub fn attribute_iter(&self, element: NodeId) -> SlotIter<'_, NodeId> {
        self.slot(element, SlotKind::Attributes).iter()
    }

    pub fn attribute_at(&self, element: NodeId, index: usize) -> Option<NodeId> {
        self.slot(element, SlotKind::Attributes).get(index)
    }

    pub fn attribute_count(&self, element: NodeId) -> usize {
        self.slot(element, SlotKind::Attributes).len()
    }

    fn find_attribute<F>(&self, element: NodeId, predicate: F) -> Option<NodeId>
    where
        F: Fn(&QName) -> bool,
    {
        let matches = |id: NodeId| match self.get(id).map(|n| &n.data) {
            Some(NodeData::Attribute { qname, .. }) => predicate(&**qname),
            _ => false,
        };
        match self.slot(element, SlotKind::Attributes) {
            DualSlot::Empty => None,
            DualSlot::One(id) => matches(*id).then_some(*id),
            DualSlot::Many(list) => list.iter().copied().find(|id| matches(*id)),
        }
    }

    /// Attribute with local name `name`
    pub fn attribute(&self, element: NodeId, name: &str) -> Option<NodeId> {
        self.find_attribute(element, |q| q.name() == name)
    }

    pub fn attribute_by_qname(&self, element: NodeId, qname: &QName) -> Option<NodeId> {
        self.find_attribute(element, |q| q == qname)
    }

    pub fn attribute_ns(
        &self,
        element: NodeId,
        name: &str,
        namespace: &Namespace,
    ) -> Option<NodeId> {
        self.find_attribute(element, |q| q.name() == name && q.uri() == namespace.uri())
    }

    /// Value of the attribute with local name `name`
    pub fn attribute_value(&self, element: NodeId, name: &str) -> Option<&str> {
        let id = self.attribute(element, name)?;
        self.get(id)?.own_text()
    }

    /// Attach an attribute.
    ///
    /// An attribute without a value removes any existing attribute with the
    /// same name instead of being inserted. An attribute that already has a
    /// parent is rejected, never re-parented or cloned.
    pub fn add_attribute(&mut self, element: NodeId, attribute: NodeId) -> Result<()> {
        self.element_data(element)?;
        let node = self.node(attribute)?;
        let NodeData::Attribute { qname, value } = &node.data else {
            return Err(TreeError::WrongKind {
                node: attribute,
                expected: "attribute",
            });
        };
        if let Some(parent) = node.parent {
            return Err(self.illegal_add(attribute, parent));
        }

        if value.is_none() {
            let qname = Arc::clone(qname);
            if let Some(old) = self.attribute_by_qname(element, &qname) {
                self.remove_attribute(element, old);
            }
            return Ok(());
        }

        self.slot_mut(element, SlotKind::Attributes)?.push(attribute);
        self.mark_added(element, attribute);
        Ok(())
    }

    /// Remove an attribute, or failing that an attribute with the same
    /// qualified name. The node actually removed gets the remove hook.
    pub fn remove_attribute(&mut self, element: NodeId, attribute: NodeId) -> bool {
        let target = if self.slot(element, SlotKind::Attributes).contains(attribute) {
            Some(attribute)
        } else {
            match self.qname(attribute).cloned() {
                Some(qname) => self.attribute_by_qname(element, &qname),
                None => None,
            }
        };

        let Some(target) = target else {
            return false;
        };
        let removed = match self.slot_mut(element, SlotKind::Attributes) {
            Ok(slot) => slot.remove_value(target),
            Err(_) => false,
        };
        if removed {
            self.child_removed(element, target);
        }
        removed
    }

    /// Set, replace or (with `None`) remove the attribute named `qname`.
    ///
    /// Returns the attribute now holding the value, if any.
    pub fn set_attribute_value(
        &mut self,
        element: NodeId,
        qname: Arc<QName>,
        value: Option<&str>,
    ) -> Result<Option<NodeId>> {
        self.element_data(element)?;
        let existing = self.attribute_by_qname(element, &qname);

        match (existing, value) {
            (Some(id), Some(value)) => {
                if let NodeData::Attribute { value: slot, .. } = &mut self.node_mut(id)?.data {
                    *slot = Some(value.to_string());
                }
                Ok(Some(id))
            }
            (Some(id), None) => {
                self.remove_attribute(element, id);
                Ok(None)
            }
            (None, Some(value)) => {
                let id = self.create_attribute(qname, Some(value));
                self.add_attribute(element, id)?;
                Ok(Some(id))
            }
            (None, None) => Ok(None),
        }
    }

    /// Set or remove an attribute by `prefix:local` name.
    ///
    /// A prefix is resolved in the element's scope; unprefixed attributes
    /// are in no namespace.
    pub fn set_attribute(
        &mut self,
        element: NodeId,
        qualified: &str,
        value: Option<&str>,
    ) -> Result<Option<NodeId>> {
        self.element_data(element)?;
        let (prefix, local) = split_qualified(qualified);
        let namespace = match prefix {
            Some(prefix) => self
                .namespace_for_prefix(element, prefix)
                .cloned()
                .unwrap_or_else(|| Namespace::new(prefix, "")),
            None => super::qname::NO_NAMESPACE.clone(),
        };
        let qname = self.factory_mut().qname(local, &namespace);
        self.set_attribute_value(element, qname, value)
    }

    /// Replace all attributes.
    ///
    /// Every incoming attribute must be unattached (or already on this
    /// element) and carry a value; otherwise nothing changes.
    pub fn set_attributes(&mut self, element: NodeId, attributes: Vec<NodeId>) -> Result<()> {
        for &attribute in &attributes {
            self.validate_child(element, attribute, SlotKind::Attributes)?;
        }

        let old = self.slot(element, SlotKind::Attributes).to_vec();
        for attribute in old {
            if !attributes.contains(&attribute) {
                self.child_removed(element, attribute);
            }
        }
        for &attribute in &attributes {
            self.mark_added(element, attribute);
        }
        *self.slot_mut(element, SlotKind::Attributes)? = DualSlot::Many(attributes);
        Ok(())
    }

    /// Set an attribute node's value. `None` on an attached attribute
    /// removes it from its element.
    pub fn set_value(&mut self, attribute: NodeId, value: Option<&str>) -> Result<()> {
        let node = self.node(attribute)?;
        if node.kind() != NodeKind::Attribute {
            return Err(TreeError::WrongKind {
                node: attribute,
                expected: "attribute",
            });
        }
        if value.is_none() {
            if let Some(parent) = node.parent_element() {
                self.remove_attribute(parent, attribute);
            }
        }
        if let NodeData::Attribute { value: slot, .. } = &mut self.node_mut(attribute)?.data {
            *slot = value.map(str::to_string);
        }
        Ok(())
    }

    // ========================================================================
    // Text
    // ========================================================================

    /// Concatenated text of the direct text, CDATA and entity children
    pub fn text(&self, element: NodeId) -> Cow<'_, str> {
        self.collect_content(element, |tree, id| {
            Cow::Borrowed(tree.get(id).map(XmlNode::text_contribution).unwrap_or(""))
        })
    }

    /// XPath-style string value: text of the whole subtree for elements,
    /// own text for everything else
    pub fn string_value(&self, id: NodeId) -> Cow<'_, str> {
        match self.get(id) {
            Some(node) if node.is_element() => self.collect_content(id, |tree, child| {
                match tree.get(child) {
                    Some(n) if n.is_element() => tree.string_value(child),
                    Some(n) => Cow::Borrowed(n.text_contribution()),
                    None => Cow::Borrowed(""),
                }
            }),
            Some(node) => Cow::Borrowed(node.own_text().unwrap_or("")),
            None => Cow::Borrowed(""),
        }
    }

    /// Shared cardinality branch for the text accessors. A single child is
    /// returned as is; several are joined, with a space between non-empty
    /// pieces when the separator is enabled.
    fn collect_content<'a, F>(&'a self, element: NodeId, contribution: F) -> Cow<'a, str>
    where
        F: Fn(&'a XmlTree, NodeId) -> Cow<'a, str>,
    {
        match self.slot(element, SlotKind::Content) {
            DualSlot::Empty => Cow::Borrowed(""),
            DualSlot::One(id) => contribution(self, *id),
            DualSlot::Many(list) => match list.as_slice() {
                [] => Cow::Borrowed(""),
                [only] => contribution(self, *only),
                many => {
                    let separator = self.config().string_value_separator;
                    let mut buffer = String::new();
                    for &id in many {
                        let piece = contribution(self, id);
                        if piece.is_empty() {
                            continue;
                        }
                        if separator && !buffer.is_empty() {
                            buffer.push(' ');
                        }
                        buffer.push_str(&piece);
                    }
                    Cow::Owned(buffer)
                }
            },
        }
    }
}
