//! Test doubles shared by the use-case tests.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::Duration as ChronoDuration;
use tokio::sync::broadcast;

use autoresume_domain::element::ElementSpec;
use autoresume_domain::error::HostError;
use autoresume_domain::selector::{Selector, SelectorTarget};
use autoresume_domain::time::{Timestamp, now};

use crate::ports::{Clock, Document, HostEvent, MutationRecord};

// ── Manual clock ───────────────────────────────────────────────

pub(crate) struct ManualClock {
    now: Mutex<Timestamp>,
}

impl ManualClock {
    pub(crate) fn new() -> Self {
        Self {
            now: Mutex::new(now()),
        }
    }

    pub(crate) fn advance_ms(&self, ms: i64) {
        let mut guard = self.now.lock().unwrap();
        *guard += ChronoDuration::milliseconds(ms);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        *self.now.lock().unwrap()
    }
}

// ── In-memory document ─────────────────────────────────────────

enum Kind {
    Element {
        tag: String,
        classes: Vec<String>,
        attributes: Vec<(String, String)>,
    },
    Text(String),
}

struct Node {
    parent: Option<usize>,
    children: Vec<usize>,
    kind: Kind,
}

struct View<'a> {
    tag: &'a str,
    classes: &'a [String],
    attributes: &'a [(String, String)],
}

impl SelectorTarget for View<'_> {
    fn tag(&self) -> &str {
        self.tag
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

/// Minimal arena-backed [`Document`]. Node `0` is the body.
pub(crate) struct FakeDocument {
    nodes: Mutex<Vec<Node>>,
    clicks: Mutex<Vec<usize>>,
    discarded: Mutex<Vec<usize>>,
    reject_inserts: AtomicBool,
    events: broadcast::Sender<HostEvent<usize>>,
}

impl FakeDocument {
    pub(crate) fn new() -> Self {
        let body = Node {
            parent: None,
            children: Vec::new(),
            kind: Kind::Element {
                tag: "body".to_string(),
                classes: Vec::new(),
                attributes: Vec::new(),
            },
        };
        let (events, _) = broadcast::channel(64);
        Self {
            nodes: Mutex::new(vec![body]),
            clicks: Mutex::new(Vec::new()),
            discarded: Mutex::new(Vec::new()),
            reject_inserts: AtomicBool::new(false),
            events,
        }
    }

    /// Build `spec` and append it to `parent`, publishing a mutation.
    pub(crate) fn append(&self, parent: usize, spec: &ElementSpec) -> usize {
        let node = self.create_element(spec);
        {
            let mut nodes = self.nodes.lock().unwrap();
            nodes[node].parent = Some(parent);
            nodes[parent].children.push(node);
        }
        let _ = self.events.send(HostEvent::Mutations(vec![MutationRecord {
            target: parent,
            added: vec![node],
            removed: Vec::new(),
        }]));
        node
    }

    pub(crate) fn find(&self, selector: &str) -> Vec<usize> {
        self.query_all(&0, &Selector::parse(selector).unwrap())
    }

    pub(crate) fn find_one(&self, selector: &str) -> usize {
        self.find(selector)[0]
    }

    pub(crate) fn clicks(&self) -> Vec<usize> {
        self.clicks.lock().unwrap().clone()
    }

    /// Make every following `insert_before` fail as if the host had
    /// re-rendered the parent in between.
    pub(crate) fn reject_inserts(&self) {
        self.reject_inserts.store(true, Ordering::SeqCst);
    }

    pub(crate) fn discarded(&self) -> Vec<usize> {
        self.discarded.lock().unwrap().clone()
    }

    fn walk(nodes: &[Node], node: usize, out: &mut Vec<usize>) {
        for &child in &nodes[node].children {
            out.push(child);
            Self::walk(nodes, child, out);
        }
    }

    fn collect_text(nodes: &[Node], node: usize, out: &mut String) {
        match &nodes[node].kind {
            Kind::Text(text) => out.push_str(text),
            Kind::Element { .. } => {
                for &child in &nodes[node].children {
                    Self::collect_text(nodes, child, out);
                }
            }
        }
    }

    fn build(nodes: &mut Vec<Node>, spec: &ElementSpec, parent: Option<usize>) -> usize {
        let id = nodes.len();
        nodes.push(Node {
            parent,
            children: Vec::new(),
            kind: Kind::Element {
                tag: spec.tag.clone(),
                classes: spec.classes.clone(),
                attributes: spec.attributes.clone(),
            },
        });
        if let Some(text) = &spec.text {
            let text_id = nodes.len();
            nodes.push(Node {
                parent: Some(id),
                children: Vec::new(),
                kind: Kind::Text(text.clone()),
            });
            nodes[id].children.push(text_id);
        }
        for child in &spec.children {
            let child_id = Self::build(nodes, child, Some(id));
            nodes[id].children.push(child_id);
        }
        id
    }
}

impl Document for FakeDocument {
    type Node = usize;

    fn root(&self) -> usize {
        0
    }

    fn parent(&self, node: &usize) -> Option<usize> {
        self.nodes.lock().unwrap().get(*node).and_then(|n| n.parent)
    }

    fn children(&self, node: &usize) -> Vec<usize> {
        let nodes = self.nodes.lock().unwrap();
        nodes[*node]
            .children
            .iter()
            .copied()
            .filter(|c| matches!(nodes[*c].kind, Kind::Element { .. }))
            .collect()
    }

    fn matches(&self, node: &usize, selector: &Selector) -> bool {
        let nodes = self.nodes.lock().unwrap();
        match &nodes[*node].kind {
            Kind::Element {
                tag,
                classes,
                attributes,
            } => selector.matches(&View {
                tag,
                classes,
                attributes,
            }),
            Kind::Text(_) => false,
        }
    }

    fn query_all(&self, scope: &usize, selector: &Selector) -> Vec<usize> {
        let mut all = Vec::new();
        {
            let nodes = self.nodes.lock().unwrap();
            Self::walk(&nodes, *scope, &mut all);
        }
        all.into_iter()
            .filter(|n| self.matches(n, selector))
            .collect()
    }

    fn text_content(&self, node: &usize) -> String {
        let nodes = self.nodes.lock().unwrap();
        let mut out = String::new();
        Self::collect_text(&nodes, *node, &mut out);
        out
    }

    fn own_text(&self, node: &usize) -> String {
        let nodes = self.nodes.lock().unwrap();
        nodes[*node]
            .children
            .iter()
            .filter_map(|c| match &nodes[*c].kind {
                Kind::Text(text) => Some(text.as_str()),
                Kind::Element { .. } => None,
            })
            .collect()
    }

    fn attribute(&self, node: &usize, name: &str) -> Option<String> {
        let nodes = self.nodes.lock().unwrap();
        match &nodes[*node].kind {
            Kind::Element { attributes, .. } => attributes
                .iter()
                .find(|(n, _)| n == name)
                .map(|(_, v)| v.clone()),
            Kind::Text(_) => None,
        }
    }

    fn set_attribute(&self, node: &usize, name: &str, value: &str) -> Result<(), HostError> {
        let mut nodes = self.nodes.lock().unwrap();
        match nodes.get_mut(*node).map(|n| &mut n.kind) {
            Some(Kind::Element { attributes, .. }) => {
                match attributes.iter_mut().find(|(n, _)| n == name) {
                    Some(slot) => slot.1 = value.to_string(),
                    None => attributes.push((name.to_string(), value.to_string())),
                }
                Ok(())
            }
            Some(Kind::Text(_)) => Err(HostError::NotAnElement),
            None => Err(HostError::Detached),
        }
    }

    fn create_element(&self, spec: &ElementSpec) -> usize {
        let mut nodes = self.nodes.lock().unwrap();
        Self::build(&mut nodes, spec, None)
    }

    fn insert_before(
        &self,
        parent: &usize,
        node: &usize,
        reference: &usize,
    ) -> Result<(), HostError> {
        if self.reject_inserts.load(Ordering::SeqCst) {
            return Err(HostError::NotAChild);
        }
        {
            let mut nodes = self.nodes.lock().unwrap();
            let index = nodes[*parent]
                .children
                .iter()
                .position(|c| c == reference)
                .ok_or(HostError::NotAChild)?;
            nodes[*parent].children.insert(index, *node);
            nodes[*node].parent = Some(*parent);
        }
        let _ = self.events.send(HostEvent::Mutations(vec![MutationRecord {
            target: *parent,
            added: vec![*node],
            removed: Vec::new(),
        }]));
        Ok(())
    }

    fn remove(&self, node: &usize) -> Result<(), HostError> {
        let parent = {
            let mut nodes = self.nodes.lock().unwrap();
            let parent = nodes[*node].parent.ok_or(HostError::Detached)?;
            nodes[parent].children.retain(|c| c != node);
            nodes[*node].parent = None;
            parent
        };
        let _ = self.events.send(HostEvent::Mutations(vec![MutationRecord {
            target: parent,
            added: Vec::new(),
            removed: vec![*node],
        }]));
        Ok(())
    }

    fn discard(&self, node: &usize) {
        let detached = *node != 0
            && self
                .nodes
                .lock()
                .unwrap()
                .get(*node)
                .is_some_and(|n| n.parent.is_none());
        if detached {
            self.discarded.lock().unwrap().push(*node);
        }
    }

    fn is_connected(&self, node: &usize) -> bool {
        self.contains(&0, node)
    }

    fn click(&self, node: &usize) -> Result<(), HostError> {
        if !self.is_connected(node) {
            return Err(HostError::Detached);
        }
        self.clicks.lock().unwrap().push(*node);
        let _ = self.events.send(HostEvent::Activated(*node));
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<HostEvent<usize>> {
        self.events.subscribe()
    }
}
