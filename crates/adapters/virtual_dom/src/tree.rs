//! Node arena backing [`VirtualDocument`](crate::VirtualDocument).
//!
//! Slots are reused once a subtree is dropped, so every handle carries the
//! generation of the slot it was issued for. A handle whose generation no
//! longer matches is stale and resolves to nothing.

use std::fmt::Write as _;

use autoresume_domain::element::ElementSpec;
use autoresume_domain::error::HostError;
use autoresume_domain::selector::SelectorTarget;

/// Handle to a node of a [`VirtualDocument`](crate::VirtualDocument).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId {
    index: u32,
    generation: u32,
}

#[derive(Debug)]
pub(crate) struct Element {
    pub(crate) tag: String,
    pub(crate) classes: Vec<String>,
    pub(crate) attributes: Vec<(String, String)>,
}

impl SelectorTarget for Element {
    fn tag(&self) -> &str {
        &self.tag
    }

    fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }

    fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Debug)]
pub(crate) enum Kind {
    Element(Element),
    Text(String),
}

#[derive(Debug)]
pub(crate) struct NodeData {
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) kind: Kind,
}

impl NodeData {
    pub(crate) fn element(&self) -> Option<&Element> {
        match &self.kind {
            Kind::Element(element) => Some(element),
            Kind::Text(_) => None,
        }
    }
}

struct Slot {
    generation: u32,
    node: Option<NodeData>,
}

pub(crate) struct Tree {
    slots: Vec<Slot>,
    free: Vec<u32>,
}

impl Tree {
    /// A tree holding only the `body` root.
    pub(crate) fn new() -> Self {
        let mut tree = Self {
            slots: Vec::new(),
            free: Vec::new(),
        };
        tree.alloc(NodeData {
            parent: None,
            children: Vec::new(),
            kind: Kind::Element(Element {
                tag: "body".to_string(),
                classes: Vec::new(),
                attributes: Vec::new(),
            }),
        });
        tree
    }

    pub(crate) fn root() -> NodeId {
        NodeId {
            index: 0,
            generation: 0,
        }
    }

    pub(crate) fn get(&self, id: NodeId) -> Option<&NodeData> {
        self.slots
            .get(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.node.as_ref())
    }

    fn get_mut(&mut self, id: NodeId) -> Option<&mut NodeData> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.node.as_mut())
    }

    pub(crate) fn element_mut(&mut self, id: NodeId) -> Result<&mut Element, HostError> {
        match self.get_mut(id).map(|node| &mut node.kind) {
            Some(Kind::Element(element)) => Ok(element),
            Some(Kind::Text(_)) => Err(HostError::NotAnElement),
            None => Err(HostError::Detached),
        }
    }

    /// Number of live nodes, attached or not.
    pub(crate) fn len(&self) -> usize {
        self.slots.iter().filter(|slot| slot.node.is_some()).count()
    }

    fn alloc(&mut self, node: NodeData) -> NodeId {
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.generation = slot.generation.wrapping_add(1);
            slot.node = Some(node);
            NodeId {
                index,
                generation: slot.generation,
            }
        } else {
            // the arena never holds more than u32::MAX nodes in practice
            let index = u32::try_from(self.slots.len()).unwrap_or(u32::MAX);
            self.slots.push(Slot {
                generation: 0,
                node: Some(node),
            });
            NodeId {
                index,
                generation: 0,
            }
        }
    }

    /// Allocate a detached subtree described by `spec`.
    pub(crate) fn build(&mut self, spec: &ElementSpec) -> NodeId {
        let id = self.alloc(NodeData {
            parent: None,
            children: Vec::new(),
            kind: Kind::Element(Element {
                tag: spec.tag.clone(),
                classes: spec.classes.clone(),
                attributes: spec.attributes.clone(),
            }),
        });
        if let Some(text) = &spec.text {
            let text = self.text(text);
            self.link(id, text, None);
        }
        for child in &spec.children {
            let child = self.build(child);
            self.link(id, child, None);
        }
        id
    }

    /// Allocate a detached text node.
    pub(crate) fn text(&mut self, text: &str) -> NodeId {
        self.alloc(NodeData {
            parent: None,
            children: Vec::new(),
            kind: Kind::Text(text.to_string()),
        })
    }

    /// Attach the detached `child` under `parent`, before `reference` or last.
    fn link(&mut self, parent: NodeId, child: NodeId, reference: Option<NodeId>) {
        if let Some(node) = self.get_mut(child) {
            node.parent = Some(parent);
        }
        if let Some(node) = self.get_mut(parent) {
            let index = reference
                .and_then(|r| node.children.iter().position(|c| *c == r))
                .unwrap_or(node.children.len());
            node.children.insert(index, child);
        }
    }

    /// Whether `node` sits at or under `ancestor`.
    pub(crate) fn is_inclusive_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.get(id).and_then(|n| n.parent);
        }
        false
    }

    pub(crate) fn append(&mut self, parent: NodeId, child: NodeId) -> Result<(), HostError> {
        self.check_insertable(parent, child)?;
        self.link(parent, child, None);
        Ok(())
    }

    pub(crate) fn insert_before(
        &mut self,
        parent: NodeId,
        child: NodeId,
        reference: NodeId,
    ) -> Result<(), HostError> {
        self.check_insertable(parent, child)?;
        let parent_node = self.get(parent).ok_or(HostError::Detached)?;
        if !parent_node.children.contains(&reference) {
            return Err(HostError::NotAChild);
        }
        self.link(parent, child, Some(reference));
        Ok(())
    }

    fn check_insertable(&self, parent: NodeId, child: NodeId) -> Result<(), HostError> {
        let parent_node = self.get(parent).ok_or(HostError::Detached)?;
        if parent_node.element().is_none() {
            return Err(HostError::NotAnElement);
        }
        let child_node = self.get(child).ok_or(HostError::Detached)?;
        // only detached nodes move, and never under themselves
        if child_node.parent.is_some()
            || child == Self::root()
            || self.is_inclusive_ancestor(child, parent)
        {
            return Err(HostError::NotAChild);
        }
        Ok(())
    }

    /// Unlink `node` from its parent and free its subtree. Returns the former parent.
    pub(crate) fn remove(&mut self, node: NodeId) -> Result<NodeId, HostError> {
        let parent = self
            .get(node)
            .and_then(|n| n.parent)
            .ok_or(HostError::Detached)?;
        if let Some(parent_node) = self.get_mut(parent) {
            parent_node.children.retain(|c| *c != node);
        }
        self.free_subtree(node);
        Ok(parent)
    }

    /// Free a detached subtree. Returns `false` for the root, attached nodes
    /// and stale handles.
    pub(crate) fn discard(&mut self, node: NodeId) -> bool {
        let detached =
            node != Self::root() && self.get(node).is_some_and(|n| n.parent.is_none());
        if detached {
            self.free_subtree(node);
        }
        detached
    }

    fn free_subtree(&mut self, node: NodeId) {
        let mut pending = vec![node];
        while let Some(id) = pending.pop() {
            if let Some(slot) = self.slots.get_mut(id.index as usize)
                && slot.generation == id.generation
                && let Some(data) = slot.node.take()
            {
                pending.extend(data.children);
                self.free.push(id.index);
            }
        }
    }

    /// Descendants of `scope` (excluding it), in document order.
    pub(crate) fn descendants(&self, scope: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self
            .get(scope)
            .map(|n| n.children.iter().rev().copied().collect())
            .unwrap_or_default();
        while let Some(id) = stack.pop() {
            out.push(id);
            if let Some(node) = self.get(id) {
                stack.extend(node.children.iter().rev().copied());
            }
        }
        out
    }

    pub(crate) fn text_content(&self, node: NodeId) -> String {
        let mut out = String::new();
        if let Some(Kind::Text(text)) = self.get(node).map(|n| &n.kind) {
            out.push_str(text);
        }
        for id in self.descendants(node) {
            if let Some(Kind::Text(text)) = self.get(id).map(|n| &n.kind) {
                out.push_str(text);
            }
        }
        out
    }

    pub(crate) fn own_text(&self, node: NodeId) -> String {
        self.get(node)
            .map(|n| {
                n.children
                    .iter()
                    .filter_map(|c| match self.get(*c).map(|c| &c.kind) {
                        Some(Kind::Text(text)) => Some(text.as_str()),
                        _ => None,
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Render `node` as indented pseudo-markup.
    pub(crate) fn outline(&self, node: NodeId) -> String {
        let mut out = String::new();
        self.outline_into(node, 0, &mut out);
        out
    }

    fn outline_into(&self, node: NodeId, depth: usize, out: &mut String) {
        let Some(data) = self.get(node) else {
            return;
        };
        let indent = "  ".repeat(depth);
        match &data.kind {
            Kind::Text(text) => {
                let _ = writeln!(out, "{indent}{text:?}");
            }
            Kind::Element(element) => {
                let _ = write!(out, "{indent}<{}", element.tag);
                if !element.classes.is_empty() {
                    let _ = write!(out, " class=\"{}\"", element.classes.join(" "));
                }
                for (name, value) in &element.attributes {
                    let _ = write!(out, " {name}=\"{value}\"");
                }
                let _ = writeln!(out, ">");
                for child in &data.children {
                    self.outline_into(*child, depth + 1, out);
                }
            }
        }
    }
}
