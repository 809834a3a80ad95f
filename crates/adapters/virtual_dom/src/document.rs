//! [`VirtualDocument`] — an in-memory host document.

use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::broadcast;

use autoresume_app::ports::{Document, HostEvent, MutationRecord};
use autoresume_domain::element::ElementSpec;
use autoresume_domain::error::{HostError, SelectorError};
use autoresume_domain::selector::Selector;

use crate::tree::{Kind, NodeId, Tree};

/// Capacity of the host event channel. Slow subscribers see `Lagged`.
const EVENT_CAPACITY: usize = 256;

/// Thread-safe in-memory document tree with DOM-like semantics.
///
/// Every structural change publishes one [`HostEvent::Mutations`] batch and
/// every click publishes [`HostEvent::Activated`]. Removing a node frees its
/// subtree: handles into it become stale and resolve to nothing.
pub struct VirtualDocument {
    tree: Mutex<Tree>,
    events: broadcast::Sender<HostEvent<NodeId>>,
}

impl Default for VirtualDocument {
    fn default() -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            tree: Mutex::new(Tree::new()),
            events,
        }
    }
}

impl VirtualDocument {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn tree(&self) -> MutexGuard<'_, Tree> {
        // tree operations never panic halfway through an update
        self.tree.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, record: MutationRecord<NodeId>) {
        // no subscriber is not an error
        let _ = self.events.send(HostEvent::Mutations(vec![record]));
    }

    /// Build `spec` and append it as the last child of `parent`.
    ///
    /// # Errors
    ///
    /// Returns [`HostError::Detached`] if `parent` is stale and
    /// [`HostError::NotAnElement`] if it is a text node.
    pub fn append(&self, parent: &NodeId, spec: &ElementSpec) -> Result<NodeId, HostError> {
        let node = {
            let mut tree = self.tree();
            let node = tree.build(spec);
            tree.append(*parent, node)?;
            node
        };
        self.publish(MutationRecord {
            target: *parent,
            added: vec![node],
            removed: Vec::new(),
        });
        Ok(node)
    }

    /// Append a text node as the last child of `parent`.
    ///
    /// # Errors
    ///
    /// Same as [`append`](Self::append).
    pub fn append_text(&self, parent: &NodeId, text: &str) -> Result<NodeId, HostError> {
        let node = {
            let mut tree = self.tree();
            let node = tree.text(text);
            tree.append(*parent, node)?;
            node
        };
        self.publish(MutationRecord {
            target: *parent,
            added: vec![node],
            removed: Vec::new(),
        });
        Ok(node)
    }

    /// Swap `old` for a freshly built `spec` in the same position, the way a
    /// framework re-render replaces a component.
    ///
    /// # Errors
    ///
    /// Returns [`HostError::Detached`] if `old` is not attached.
    pub fn replace(&self, old: &NodeId, spec: &ElementSpec) -> Result<NodeId, HostError> {
        let (parent, node) = {
            let mut tree = self.tree();
            let parent = tree
                .get(*old)
                .and_then(|n| n.parent)
                .ok_or(HostError::Detached)?;
            let node = tree.build(spec);
            tree.insert_before(parent, node, *old)?;
            tree.remove(*old)?;
            (parent, node)
        };
        self.publish(MutationRecord {
            target: parent,
            added: vec![node],
            removed: vec![*old],
        });
        Ok(node)
    }

    /// Every attached element matching `selector`, in document order.
    ///
    /// # Errors
    ///
    /// Returns a parse error for an invalid selector.
    pub fn find(&self, selector: &str) -> Result<Vec<NodeId>, SelectorError> {
        let selector = Selector::parse(selector)?;
        Ok(self.query_all(&Tree::root(), &selector))
    }

    /// Number of live nodes, including the root.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.tree().len()
    }

    /// Indented pseudo-markup of the whole tree.
    #[must_use]
    pub fn outline(&self) -> String {
        self.tree().outline(Tree::root())
    }
}

impl Document for VirtualDocument {
    type Node = NodeId;

    fn root(&self) -> NodeId {
        Tree::root()
    }

    fn parent(&self, node: &NodeId) -> Option<NodeId> {
        self.tree().get(*node).and_then(|n| n.parent)
    }

    fn children(&self, node: &NodeId) -> Vec<NodeId> {
        let tree = self.tree();
        tree.get(*node)
            .map(|n| {
                n.children
                    .iter()
                    .copied()
                    .filter(|c| tree.get(*c).is_some_and(|c| c.element().is_some()))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn matches(&self, node: &NodeId, selector: &Selector) -> bool {
        self.tree()
            .get(*node)
            .and_then(|n| n.element())
            .is_some_and(|element| selector.matches(element))
    }

    fn query_all(&self, scope: &NodeId, selector: &Selector) -> Vec<NodeId> {
        let tree = self.tree();
        tree.descendants(*scope)
            .into_iter()
            .filter(|id| {
                tree.get(*id)
                    .and_then(|n| n.element())
                    .is_some_and(|element| selector.matches(element))
            })
            .collect()
    }

    fn closest(&self, node: &NodeId, selector: &Selector) -> Option<NodeId> {
        let tree = self.tree();
        let mut current = Some(*node);
        while let Some(id) = current {
            let data = tree.get(id)?;
            if data.element().is_some_and(|element| selector.matches(element)) {
                return Some(id);
            }
            current = data.parent;
        }
        None
    }

    fn contains(&self, ancestor: &NodeId, node: &NodeId) -> bool {
        self.tree().is_inclusive_ancestor(*ancestor, *node)
    }

    fn text_content(&self, node: &NodeId) -> String {
        self.tree().text_content(*node)
    }

    fn own_text(&self, node: &NodeId) -> String {
        self.tree().own_text(*node)
    }

    fn attribute(&self, node: &NodeId, name: &str) -> Option<String> {
        let tree = self.tree();
        let element = tree.get(*node)?.element()?;
        if name == "class" {
            return Some(element.classes.join(" "));
        }
        element
            .attributes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.clone())
    }

    fn set_attribute(&self, node: &NodeId, name: &str, value: &str) -> Result<(), HostError> {
        let mut tree = self.tree();
        let element = tree.element_mut(*node)?;
        if name == "class" {
            element.classes = value.split_whitespace().map(str::to_string).collect();
            return Ok(());
        }
        match element.attributes.iter_mut().find(|(n, _)| n == name) {
            Some(slot) => value.clone_into(&mut slot.1),
            None => element.attributes.push((name.to_string(), value.to_string())),
        }
        Ok(())
    }

    fn create_element(&self, spec: &ElementSpec) -> NodeId {
        self.tree().build(spec)
    }

    fn insert_before(
        &self,
        parent: &NodeId,
        node: &NodeId,
        reference: &NodeId,
    ) -> Result<(), HostError> {
        self.tree().insert_before(*parent, *node, *reference)?;
        self.publish(MutationRecord {
            target: *parent,
            added: vec![*node],
            removed: Vec::new(),
        });
        Ok(())
    }

    fn remove(&self, node: &NodeId) -> Result<(), HostError> {
        let parent = self.tree().remove(*node)?;
        self.publish(MutationRecord {
            target: parent,
            added: Vec::new(),
            removed: vec![*node],
        });
        Ok(())
    }

    fn discard(&self, node: &NodeId) {
        self.tree().discard(*node);
    }

    fn is_connected(&self, node: &NodeId) -> bool {
        self.tree().is_inclusive_ancestor(Tree::root(), *node)
    }

    fn click(&self, node: &NodeId) -> Result<(), HostError> {
        {
            let tree = self.tree();
            if !tree.is_inclusive_ancestor(Tree::root(), *node) {
                return Err(HostError::Detached);
            }
            if matches!(tree.get(*node).map(|n| &n.kind), Some(Kind::Text(_))) {
                return Err(HostError::NotAnElement);
            }
        }
        let _ = self.events.send(HostEvent::Activated(*node));
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<HostEvent<NodeId>> {
        self.events.subscribe()
    }
}
