//! ResourceArc Wrappers
//!
//! Persistent tree state shared with the BEAM. Each tree sits behind a
//! mutex; the model itself is single-owner.

use std::sync::Mutex;

use rustler::ResourceArc;

use crate::config::TreeConfig;
use crate::dom::XmlTree;

/// Wrapper for XmlTree that can be stored in a ResourceArc
pub struct TreeResource {
    pub tree: Mutex<XmlTree>,
}

impl TreeResource {
    pub fn new(config: TreeConfig) -> Self {
        TreeResource {
            tree: Mutex::new(XmlTree::with_config(config)),
        }
    }

    /// Run `f` with shared access to the tree.
    ///
    /// # Errors
    ///
    /// Returns `"mutex_poisoned"` if a previous holder panicked.
    pub fn with_tree<F, R>(&self, f: F) -> Result<R, &'static str>
    where
        F: FnOnce(&XmlTree) -> R,
    {
        let guard = self.tree.lock().map_err(|_| "mutex_poisoned")?;
        Ok(f(&guard))
    }

    /// Run `f` with exclusive access to the tree.
    ///
    /// # Errors
    ///
    /// Returns `"mutex_poisoned"` if a previous holder panicked.
    pub fn with_tree_mut<F, R>(&self, f: F) -> Result<R, &'static str>
    where
        F: FnOnce(&mut XmlTree) -> R,
    {
        let mut guard = self.tree.lock().map_err(|_| "mutex_poisoned")?;
        Ok(f(&mut guard))
    }
}

#[rustler::resource_impl]
impl rustler::Resource for TreeResource {}

impl Default for TreeResource {
    fn default() -> Self {
        Self::new(TreeConfig::from_env())
    }
}

/// Type alias for the tree ResourceArc
pub type TreeRef = ResourceArc<TreeResource>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::NodeId;

    #[test]
    fn test_with_tree_round_trip() {
        let resource = TreeResource::new(TreeConfig::default());
        let root = resource
            .with_tree_mut(|tree| {
                let root = tree.create_element_named("root");
                tree.add_text(root, "hi").map(|_| root)
            })
            .unwrap()
            .unwrap();
        let text = resource.with_tree(|tree| tree.text(root).into_owned()).unwrap();
        assert_eq!(text, "hi");
    }

    #[test]
    fn test_poisoned_tree_reports_error() {
        let resource = TreeResource::new(TreeConfig::default());
        let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _ = resource.with_tree_mut(|_| panic!("holder panicked"));
        }));
        assert!(outcome.is_err());

        assert_eq!(resource.with_tree(|tree| tree.node_total()), Err("mutex_poisoned"));
        let (parent, child) = (NodeId::from_raw(0), NodeId::from_raw(1));
        assert_eq!(
            resource.with_tree_mut(|tree| tree.remove_node(parent, child)),
            Err("mutex_poisoned")
        );
    }
}
