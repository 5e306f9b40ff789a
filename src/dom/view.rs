//! Content View
//!
//! A live, list-shaped lens over one of an element's slots. Reads go
//! straight to the backing storage; every mutation runs the owner's
//! lifecycle hooks so parent links stay consistent with the list.
//!
//! Hook ordering per operation:
//!
//! | operation            | order                                       |
//! |----------------------|---------------------------------------------|
//! | `add` / `insert`     | bounds check, add hook, structural insert   |
//! | `set`                | bounds check, add hook, replace             |
//! | `remove`             | remove hook, structural removal             |
//! | `remove_at`          | structural removal, remove hook             |
//! | `clear`              | remove hook per element, clear              |
//! | `remove_all`         | remove hook per argument, removal           |
//!
//! Opening a view promotes the slot to list storage.

use super::node::NodeId;
use super::slot::SlotIter;
use super::tree::{SlotKind, XmlTree};
use crate::error::{Result, TreeError};

/// Mutable list view bound to an owner element and one of its slots
#[derive(Debug)]
pub struct ContentView<'t> {
    tree: &'t mut XmlTree,
    owner: NodeId,
    slot: SlotKind,
}

impl XmlTree {
    /// List view over an element's content
    pub fn content(&mut self, element: NodeId) -> Result<ContentView<'_>> {
        ContentView::open(self, element, SlotKind::Content)
    }

    /// List view over an element's attributes
    pub fn attributes(&mut self, element: NodeId) -> Result<ContentView<'_>> {
        ContentView::open(self, element, SlotKind::Attributes)
    }
}

impl<'t> ContentView<'t> {
    fn open(tree: &'t mut XmlTree, owner: NodeId, slot: SlotKind) -> Result<Self> {
        tree.slot_mut(owner, slot)?.as_vec_mut();
        Ok(ContentView { tree, owner, slot })
    }

    #[inline]
    pub fn owner(&self) -> NodeId {
        self.owner
    }

    #[inline]
    pub fn slot_kind(&self) -> SlotKind {
        self.slot
    }

    /// The tree behind the view
    pub fn tree(&self) -> &XmlTree {
        &*self.tree
    }

    pub fn tree_mut(&mut self) -> &mut XmlTree {
        &mut *self.tree
    }

    /// Raw backing sequence, for bulk replacement without re-wrapping
    pub fn backing_list(&self) -> &[NodeId] {
        self.tree.slot(self.owner, self.slot).as_slice()
    }

    // ========================================================================
    // Reads
    // ========================================================================

    pub fn len(&self) -> usize {
        self.backing_list().len()
    }

    pub fn is_empty(&self) -> bool {
        self.backing_list().is_empty()
    }

    pub fn get(&self, index: usize) -> Option<NodeId> {
        self.backing_list().get(index).copied()
    }

    pub fn contains(&self, node: NodeId) -> bool {
        self.backing_list().contains(&node)
    }

    pub fn contains_all(&self, nodes: &[NodeId]) -> bool {
        let list = self.backing_list();
        nodes.iter().all(|n| list.contains(n))
    }

    pub fn index_of(&self, node: NodeId) -> Option<usize> {
        self.backing_list().iter().position(|n| *n == node)
    }

    pub fn last_index_of(&self, node: NodeId) -> Option<usize> {
        self.backing_list().iter().rposition(|n| *n == node)
    }

    pub fn iter(&self) -> SlotIter<'_, NodeId> {
        self.tree.slot(self.owner, self.slot).iter()
    }

    pub fn to_vec(&self) -> Vec<NodeId> {
        self.backing_list().to_vec()
    }

    // ========================================================================
    // Mutations
    // ========================================================================

    fn check_insert_index(&self, index: usize) -> Result<()> {
        let len = self.len();
        if index > len {
            return Err(TreeError::IndexOutOfRange { index, len });
        }
        Ok(())
    }

    /// Append `node`. A rejected node leaves the list untouched.
    pub fn add(&mut self, node: NodeId) -> Result<bool> {
        self.tree.child_added(self.owner, node, self.slot)?;
        self.tree.slot_mut(self.owner, self.slot)?.push(node);
        Ok(true)
    }

    /// Insert `node` at `index`
    pub fn insert(&mut self, index: usize, node: NodeId) -> Result<()> {
        self.check_insert_index(index)?;
        self.tree.child_added(self.owner, node, self.slot)?;
        self.tree.slot_mut(self.owner, self.slot)?.insert(index, node)
    }

    /// Replace the node at `index`, returning the previous occupant.
    ///
    /// The previous occupant keeps its parent link.
    pub fn set(&mut self, index: usize, node: NodeId) -> Result<NodeId> {
        let len = self.len();
        if index >= len {
            return Err(TreeError::IndexOutOfRange { index, len });
        }
        self.tree.child_added(self.owner, node, self.slot)?;
        self.tree.slot_mut(self.owner, self.slot)?.set(index, node)
    }

    /// Remove the first occurrence of `node`.
    ///
    /// The remove hook fires for any node of this tree, member or not.
    pub fn remove(&mut self, node: NodeId) -> bool {
        if self.tree.contains_node(node) {
            self.tree.child_removed(self.owner, node);
        }
        match self.tree.slot_mut(self.owner, self.slot) {
            Ok(slot) => slot.remove_value(node),
            Err(_) => false,
        }
    }

    /// Remove and return the node at `index`
    pub fn remove_at(&mut self, index: usize) -> Option<NodeId> {
        let removed = self.tree.slot_mut(self.owner, self.slot).ok()?.remove_at(index)?;
        self.tree.child_removed(self.owner, removed);
        Some(removed)
    }

    /// Append every node in order.
    ///
    /// Returns whether the length changed. Nodes added before a rejection
    /// stay in place.
    pub fn add_all<I>(&mut self, nodes: I) -> Result<bool>
    where
        I: IntoIterator<Item = NodeId>,
    {
        let before = self.len();
        for node in nodes {
            self.add(node)?;
        }
        Ok(self.len() != before)
    }

    /// Insert every node starting at `index`, preserving their order
    pub fn insert_all<I>(&mut self, index: usize, nodes: I) -> Result<bool>
    where
        I: IntoIterator<Item = NodeId>,
    {
        let before = self.len();
        let mut at = index;
        for node in nodes {
            self.insert(at, node)?;
            at += 1;
        }
        Ok(self.len() != before)
    }

    /// Detach every member, then empty the list. Storage stays list-backed.
    pub fn clear(&mut self) {
        let members = self.to_vec();
        for node in members {
            self.tree.child_removed(self.owner, node);
        }
        if let Ok(slot) = self.tree.slot_mut(self.owner, self.slot) {
            slot.clear();
        }
    }

    /// Remove every occurrence of the given nodes.
    ///
    /// The remove hook fires once per argument that is a node of this tree,
    /// whether or not it is a member.
    pub fn remove_all(&mut self, nodes: &[NodeId]) -> bool {
        for &node in nodes {
            if self.tree.contains_node(node) {
                self.tree.child_removed(self.owner, node);
            }
        }
        match self.tree.slot_mut(self.owner, self.slot) {
            Ok(slot) => slot.remove_all(nodes),
            Err(_) => false,
        }
    }

    /// Replace the whole list through the owner's bulk setter
    pub fn replace_all(&mut self, nodes: Vec<NodeId>) -> Result<()> {
        match self.slot {
            SlotKind::Content => self.tree.set_content(self.owner, nodes),
            SlotKind::Attributes => self.tree.set_attributes(self.owner, nodes),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TreeConfig;
    use crate::dom::HookEvent;

    fn journaled() -> (XmlTree, NodeId) {
        let mut tree = XmlTree::with_config(TreeConfig::default().with_hook_journal(true));
        let root = tree.create_element_named("root");
        (tree, root)
    }

    #[test]
    fn test_view_promotes_slot() {
        let (mut tree, root) = journaled();
        tree.add_text(root, "only").unwrap();
        assert!(!tree.is_content_promoted(root));
        let view = tree.content(root).unwrap();
        assert_eq!(view.len(), 1);
        drop(view);
        assert!(tree.is_content_promoted(root));
    }

    #[test]
    fn test_view_on_non_element() {
        let (mut tree, _) = journaled();
        let text = tree.create_text("t");
        assert!(matches!(tree.content(text), Err(TreeError::NotAnElement(_))));
    }

    #[test]
    fn test_add_and_reads() {
        let (mut tree, root) = journaled();
        let a = tree.create_text("a");
        let b = tree.create_comment("b");
        let mut view = tree.content(root).unwrap();
        assert!(view.add(a).unwrap());
        assert!(view.add(b).unwrap());
        assert_eq!(view.len(), 2);
        assert_eq!(view.get(1), Some(b));
        assert_eq!(view.get(2), None);
        assert!(view.contains(a));
        assert!(view.contains_all(&[a, b]));
        assert_eq!(view.index_of(b), Some(1));
        assert_eq!(view.iter().collect::<Vec<_>>(), vec![a, b]);
        drop(view);
        assert_eq!(tree.parent(a), Some(root));
        assert_eq!(tree.parent(b), Some(root));
    }

    #[test]
    fn test_rejected_add_leaves_list_untouched() {
        let (mut tree, root) = journaled();
        let other = tree.create_element_named("other");
        let owned = tree.add_text(other, "owned").unwrap();
        tree.take_hook_events();

        let mut view = tree.content(root).unwrap();
        assert!(matches!(view.add(owned), Err(TreeError::IllegalAdd { .. })));
        assert!(view.is_empty());
        drop(view);
        assert!(tree.take_hook_events().is_empty());
        assert_eq!(tree.parent(owned), Some(other));
    }

    #[test]
    fn test_insert_out_of_range_runs_no_hook() {
        let (mut tree, root) = journaled();
        let a = tree.create_text("a");
        let mut view = tree.content(root).unwrap();
        assert_eq!(view.insert(1, a), Err(TreeError::IndexOutOfRange { index: 1, len: 0 }));
        drop(view);
        assert_eq!(tree.parent(a), None);
        assert!(tree.take_hook_events().is_empty());
    }

    #[test]
    fn test_insert_positions() {
        let (mut tree, root) = journaled();
        let a = tree.create_text("a");
        let b = tree.create_text("b");
        let c = tree.create_text("c");
        let mut view = tree.content(root).unwrap();
        view.insert(0, b).unwrap();
        view.insert(0, a).unwrap();
        view.insert(2, c).unwrap();
        assert_eq!(view.to_vec(), vec![a, b, c]);
    }

    #[test]
    fn test_set_keeps_old_parent() {
        let (mut tree, root) = journaled();
        let old = tree.add_text(root, "old").unwrap();
        let new = tree.create_text("new");
        let mut view = tree.content(root).unwrap();
        assert_eq!(view.set(0, new), Ok(old));
        assert_eq!(view.set(5, new), Err(TreeError::IndexOutOfRange { index: 5, len: 1 }));
        drop(view);
        assert_eq!(tree.node_at(root, 0), Some(new));
        assert_eq!(tree.parent(new), Some(root));
        // the displaced node still points at the owner
        assert_eq!(tree.parent(old), Some(root));
    }

    #[test]
    fn test_remove_hook_before_removal() {
        let (mut tree, root) = journaled();
        let a = tree.add_text(root, "a").unwrap();
        let stranger = tree.create_text("stranger");
        tree.take_hook_events();

        let mut view = tree.content(root).unwrap();
        assert!(view.remove(a));
        assert!(!view.remove(stranger));
        assert!(!view.remove(NodeId::from_raw(500)));
        drop(view);

        // `a` is still listed when its hook runs
        assert_eq!(
            tree.take_hook_events(),
            vec![
                HookEvent::ChildRemoved { owner: root, node: a, len: 1 },
                HookEvent::ChildRemoved { owner: root, node: stranger, len: 0 },
            ]
        );
        assert_eq!(tree.parent(a), None);
    }

    #[test]
    fn test_remove_at() {
        let (mut tree, root) = journaled();
        let a = tree.add_text(root, "a").unwrap();
        let b = tree.add_text(root, "b").unwrap();
        tree.take_hook_events();

        let mut view = tree.content(root).unwrap();
        assert_eq!(view.remove_at(0), Some(a));
        assert_eq!(view.remove_at(3), None);
        assert_eq!(view.to_vec(), vec![b]);
        drop(view);
        // hook runs once `a` is already gone
        assert_eq!(
            tree.take_hook_events(),
            vec![HookEvent::ChildRemoved { owner: root, node: a, len: 1 }]
        );
        assert_eq!(tree.parent(a), None);
    }

    #[test]
    fn test_add_hooks_run_before_insert() {
        let (mut tree, root) = journaled();
        let a = tree.create_text("a");
        let b = tree.create_text("b");
        let c = tree.create_text("c");
        let mut view = tree.content(root).unwrap();
        view.add(a).unwrap();
        view.insert(0, b).unwrap();
        view.set(1, c).unwrap();
        assert_eq!(view.to_vec(), vec![b, c]);
        drop(view);
        assert_eq!(
            tree.take_hook_events(),
            vec![
                HookEvent::ChildAdded { owner: root, node: a, len: 0 },
                HookEvent::ChildAdded { owner: root, node: b, len: 1 },
                HookEvent::ChildAdded { owner: root, node: c, len: 2 },
            ]
        );
    }

    #[test]
    fn test_remove_and_remove_at_hook_order_differs() {
        let (mut tree, root) = journaled();
        let a = tree.add_text(root, "a").unwrap();
        let b = tree.add_text(root, "b").unwrap();
        let c = tree.add_text(root, "c").unwrap();
        tree.take_hook_events();

        let mut view = tree.content(root).unwrap();
        assert!(view.remove(a));
        assert_eq!(view.remove_at(0), Some(b));
        assert_eq!(view.to_vec(), vec![c]);
        drop(view);
        assert_eq!(
            tree.take_hook_events(),
            vec![
                HookEvent::ChildRemoved { owner: root, node: a, len: 3 },
                HookEvent::ChildRemoved { owner: root, node: b, len: 1 },
            ]
        );
    }

    #[test]
    fn test_add_all_reports_length_change() {
        let (mut tree, root) = journaled();
        let a = tree.create_text("a");
        let b = tree.create_text("b");
        let mut view = tree.content(root).unwrap();
        assert_eq!(view.add_all(vec![a, b]), Ok(true));
        assert_eq!(view.add_all(Vec::new()), Ok(false));
        assert_eq!(view.to_vec(), vec![a, b]);
    }

    #[test]
    fn test_add_all_keeps_prefix_on_error() {
        let (mut tree, root) = journaled();
        let other = tree.create_element_named("other");
        let owned = tree.add_text(other, "owned").unwrap();
        let a = tree.create_text("a");
        let mut view = tree.content(root).unwrap();
        assert!(view.add_all(vec![a, owned]).is_err());
        assert_eq!(view.to_vec(), vec![a]);
    }

    #[test]
    fn test_insert_all_preserves_order() {
        let (mut tree, root) = journaled();
        let first = tree.add_text(root, "first").unwrap();
        let last = tree.add_text(root, "last").unwrap();
        let x = tree.create_text("x");
        let y = tree.create_text("y");
        let mut view = tree.content(root).unwrap();
        assert_eq!(view.insert_all(1, vec![x, y]), Ok(true));
        assert_eq!(view.to_vec(), vec![first, x, y, last]);
    }

    #[test]
    fn test_clear_stays_list_backed() {
        let (mut tree, root) = journaled();
        let a = tree.add_text(root, "a").unwrap();
        tree.take_hook_events();
        let mut view = tree.content(root).unwrap();
        view.clear();
        assert!(view.is_empty());
        drop(view);
        assert!(tree.is_content_promoted(root));
        assert_eq!(tree.parent(a), None);
        assert_eq!(
            tree.take_hook_events(),
            vec![HookEvent::ChildRemoved { owner: root, node: a, len: 1 }]
        );
    }

    #[test]
    fn test_remove_all_fires_for_every_argument() {
        let (mut tree, root) = journaled();
        let a = tree.add_text(root, "a").unwrap();
        let b = tree.add_text(root, "b").unwrap();
        let absent = tree.create_text("absent");
        let other = tree.create_element_named("other");
        let elsewhere = tree.add_text(other, "elsewhere").unwrap();
        tree.take_hook_events();

        let mut view = tree.content(root).unwrap();
        assert!(view.remove_all(&[a, absent, elsewhere]));
        assert_eq!(view.to_vec(), vec![b]);
        drop(view);

        let removed: Vec<NodeId> = tree
            .take_hook_events()
            .into_iter()
            .filter_map(|e| match e {
                HookEvent::ChildRemoved { node, .. } => Some(node),
                HookEvent::ChildAdded { .. } => None,
            })
            .collect();
        assert_eq!(removed, vec![a, absent, elsewhere]);
        assert_eq!(tree.parent(a), None);
        // a node owned by another element keeps its parent
        assert_eq!(tree.parent(elsewhere), Some(other));
    }

    #[test]
    fn test_attribute_view() {
        let (mut tree, root) = journaled();
        let id = tree.create_attribute_named("id", Some("1"));
        let text = tree.create_text("t");
        let mut view = tree.attributes(root).unwrap();
        assert!(view.add(id).unwrap());
        assert!(matches!(view.add(text), Err(TreeError::WrongKind { .. })));
        assert_eq!(view.len(), 1);
        drop(view);
        assert_eq!(tree.attribute_value(root, "id"), Some("1"));
        assert!(tree.is_attributes_promoted(root));
    }

    #[test]
    fn test_replace_all_round_trip() {
        let (mut tree, root) = journaled();
        let a = tree.add_element_named(root, "a").unwrap();
        let b = tree.add_text(root, "b").unwrap();
        let mut view = tree.content(root).unwrap();
        let backing = view.backing_list().to_vec();
        view.replace_all(backing).unwrap();
        assert_eq!(view.to_vec(), vec![a, b]);
        assert_eq!(view.tree().parent(a), Some(root));
    }

    #[test]
    fn test_view_reflects_tree_mutation() {
        let (mut tree, root) = journaled();
        let mut view = tree.content(root).unwrap();
        let child = view.tree_mut().add_text(root, "late").unwrap();
        assert_eq!(view.to_vec(), vec![child]);
        assert_eq!(view.owner(), root);
        assert_eq!(view.slot_kind(), SlotKind::Content);
    }
}
