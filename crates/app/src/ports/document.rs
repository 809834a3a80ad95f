//! Document port — access to the host application's document tree.
//!
//! The host owns the tree and may replace any part of it at any time, so
//! node handles are only meaningful until the next host event. Callers look
//! nodes up fresh instead of caching them across cycles.
//!
//! Every operation is synchronous: the host answers from its own event loop.

use std::fmt;

use tokio::sync::broadcast;

use autoresume_domain::element::ElementSpec;
use autoresume_domain::error::HostError;
use autoresume_domain::selector::Selector;

/// One structural change observed by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationRecord<N> {
    /// Parent whose child list changed.
    pub target: N,
    pub added: Vec<N>,
    pub removed: Vec<N>,
}

/// Notifications emitted by the host document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostEvent<N> {
    /// A batch of child-list changes anywhere under the root.
    Mutations(Vec<MutationRecord<N>>),
    /// A node was activated (clicked), by the user or by us.
    Activated(N),
}

/// Read/write access to the host document tree.
pub trait Document {
    /// Handle to a node of the tree.
    type Node: Clone + PartialEq + fmt::Debug;

    /// The root of the searchable tree (the document body).
    fn root(&self) -> Self::Node;

    /// Parent of `node`, if any.
    fn parent(&self, node: &Self::Node) -> Option<Self::Node>;

    /// Child elements of `node`, in order.
    fn children(&self, node: &Self::Node) -> Vec<Self::Node>;

    /// Whether the element `node` matches `selector`. Always `false` for text nodes.
    fn matches(&self, node: &Self::Node, selector: &Selector) -> bool;

    /// Descendant elements of `scope` (excluding `scope`) matching
    /// `selector`, in document order.
    fn query_all(&self, scope: &Self::Node, selector: &Selector) -> Vec<Self::Node>;

    /// First descendant of `scope` matching `selector`.
    fn query(&self, scope: &Self::Node, selector: &Selector) -> Option<Self::Node> {
        self.query_all(scope, selector).into_iter().next()
    }

    /// Nearest inclusive ancestor of `node` matching `selector`.
    fn closest(&self, node: &Self::Node, selector: &Selector) -> Option<Self::Node> {
        let mut current = Some(node.clone());
        while let Some(candidate) = current {
            if self.matches(&candidate, selector) {
                return Some(candidate);
            }
            current = self.parent(&candidate);
        }
        None
    }

    /// Whether `node` is `ancestor` or one of its descendants.
    fn contains(&self, ancestor: &Self::Node, node: &Self::Node) -> bool {
        let mut current = Some(node.clone());
        while let Some(candidate) = current {
            if candidate == *ancestor {
                return true;
            }
            current = self.parent(&candidate);
        }
        false
    }

    /// Concatenated text of every text node under `node`.
    fn text_content(&self, node: &Self::Node) -> String;

    /// Concatenated text of the direct text children of `node`.
    fn own_text(&self, node: &Self::Node) -> String;

    /// Elements under `scope` whose own text contains `needle`, in document
    /// order (the equivalent of `.//*[contains(text(), needle)]`).
    fn find_by_text(&self, scope: &Self::Node, needle: &str) -> Vec<Self::Node> {
        self.query_all(scope, &Selector::any())
            .into_iter()
            .filter(|node| self.own_text(node).contains(needle))
            .collect()
    }

    fn attribute(&self, node: &Self::Node, name: &str) -> Option<String>;

    /// Set an attribute on an element.
    ///
    /// # Errors
    ///
    /// Returns [`HostError::Detached`] for unknown nodes and
    /// [`HostError::NotAnElement`] for text nodes.
    fn set_attribute(&self, node: &Self::Node, name: &str, value: &str) -> Result<(), HostError>;

    /// Create a detached element subtree from `spec`.
    fn create_element(&self, spec: &ElementSpec) -> Self::Node;

    /// Insert `node` into `parent` immediately before `reference`.
    ///
    /// # Errors
    ///
    /// Returns [`HostError::NotAChild`] when `reference` is not a child of
    /// `parent`, or [`HostError::Detached`] when `parent` is gone.
    fn insert_before(
        &self,
        parent: &Self::Node,
        node: &Self::Node,
        reference: &Self::Node,
    ) -> Result<(), HostError>;

    /// Detach `node` (and its subtree) from the tree.
    ///
    /// # Errors
    ///
    /// Returns [`HostError::Detached`] when `node` is not attached.
    fn remove(&self, node: &Self::Node) -> Result<(), HostError>;

    /// Release a subtree built by [`create_element`](Self::create_element)
    /// that never got attached. Attached or unknown nodes are left alone.
    fn discard(&self, node: &Self::Node);

    /// Whether `node` is currently reachable from the root.
    fn is_connected(&self, node: &Self::Node) -> bool;

    /// Activate `node` the way a user click would.
    ///
    /// # Errors
    ///
    /// Returns [`HostError::Detached`] when `node` is no longer in the tree.
    fn click(&self, node: &Self::Node) -> Result<(), HostError>;

    /// Subscribe to host events published *after* this call.
    fn subscribe(&self) -> broadcast::Receiver<HostEvent<Self::Node>>;
}

impl<T: Document> Document for std::sync::Arc<T> {
    type Node = T::Node;

    fn root(&self) -> Self::Node {
        (**self).root()
    }

    fn parent(&self, node: &Self::Node) -> Option<Self::Node> {
        (**self).parent(node)
    }

    fn children(&self, node: &Self::Node) -> Vec<Self::Node> {
        (**self).children(node)
    }

    fn matches(&self, node: &Self::Node, selector: &Selector) -> bool {
        (**self).matches(node, selector)
    }

    fn query_all(&self, scope: &Self::Node, selector: &Selector) -> Vec<Self::Node> {
        (**self).query_all(scope, selector)
    }

    fn query(&self, scope: &Self::Node, selector: &Selector) -> Option<Self::Node> {
        (**self).query(scope, selector)
    }

    fn closest(&self, node: &Self::Node, selector: &Selector) -> Option<Self::Node> {
        (**self).closest(node, selector)
    }

    fn contains(&self, ancestor: &Self::Node, node: &Self::Node) -> bool {
        (**self).contains(ancestor, node)
    }

    fn text_content(&self, node: &Self::Node) -> String {
        (**self).text_content(node)
    }

    fn own_text(&self, node: &Self::Node) -> String {
        (**self).own_text(node)
    }

    fn find_by_text(&self, scope: &Self::Node, needle: &str) -> Vec<Self::Node> {
        (**self).find_by_text(scope, needle)
    }

    fn attribute(&self, node: &Self::Node, name: &str) -> Option<String> {
        (**self).attribute(node, name)
    }

    fn set_attribute(&self, node: &Self::Node, name: &str, value: &str) -> Result<(), HostError> {
        (**self).set_attribute(node, name, value)
    }

    fn create_element(&self, spec: &ElementSpec) -> Self::Node {
        (**self).create_element(spec)
    }

    fn insert_before(
        &self,
        parent: &Self::Node,
        node: &Self::Node,
        reference: &Self::Node,
    ) -> Result<(), HostError> {
        (**self).insert_before(parent, node, reference)
    }

    fn remove(&self, node: &Self::Node) -> Result<(), HostError> {
        (**self).remove(node)
    }

    fn discard(&self, node: &Self::Node) {
        (**self).discard(node);
    }

    fn is_connected(&self, node: &Self::Node) -> bool {
        (**self).is_connected(node)
    }

    fn click(&self, node: &Self::Node) -> Result<(), HostError> {
        (**self).click(node)
    }

    fn subscribe(&self) -> broadcast::Receiver<HostEvent<Self::Node>> {
        (**self).subscribe()
    }
}
