//! Injection manager — keeps exactly one toggle control in the host button bar.
//!
//! The host re-renders its button bar whenever it likes, dropping our
//! control with it. Injection is therefore idempotent: every call wipes any
//! marker-carrying node and inserts a fresh control before the anchor button.

use autoresume_domain::control::ControlAppearance;
use autoresume_domain::element::ElementSpec;
use autoresume_domain::layout::HostLayout;

use crate::ports::Document;

/// Owns the injected control's lifecycle.
pub struct InjectionManager<N> {
    layout: HostLayout,
    control: Option<N>,
}

impl<N: Clone + PartialEq + std::fmt::Debug> InjectionManager<N> {
    #[must_use]
    pub fn new(layout: HostLayout) -> Self {
        Self {
            layout,
            control: None,
        }
    }

    #[must_use]
    pub fn layout(&self) -> &HostLayout {
        &self.layout
    }

    /// Make sure the control sits in the button bar.
    ///
    /// Returns `false` when the button bar or the anchor button is not
    /// rendered yet; the caller retries later.
    pub fn ensure_injected<D: Document<Node = N>>(&mut self, doc: &D, active: bool) -> bool {
        let root = doc.root();
        let Some(container) = doc.query(&root, &self.layout.button_container) else {
            tracing::debug!(selector = %self.layout.button_container, "button container not found");
            return false;
        };
        let Some(anchor) = doc
            .query(&container, &self.layout.anchor_icon)
            .and_then(|icon| doc.closest(&icon, &self.layout.anchor_button))
        else {
            tracing::debug!(selector = %self.layout.anchor_icon, "anchor button not found");
            return false;
        };
        let Some(reference) = child_holding(doc, &container, &anchor) else {
            tracing::debug!("anchor button outside the button container");
            return false;
        };

        for stale in doc.query_all(&root, &self.layout.control()) {
            // a stale control nested in an already removed one is detached
            let _ = doc.remove(&stale);
        }
        self.control = None;

        let control = doc.create_element(&self.control_spec(active));
        if let Err(err) = doc.insert_before(&container, &control, &reference) {
            tracing::warn!(error = %err, "control insertion failed");
            doc.discard(&control);
            return false;
        }
        self.control = Some(control);

        tracing::info!(active, "control injected");
        true
    }

    /// Whether a control is currently attached to the tree.
    pub fn is_present<D: Document<Node = N>>(&self, doc: &D) -> bool {
        doc.query(&doc.root(), &self.layout.control()).is_some()
    }

    /// Whether `node` is the control or lies inside it.
    pub fn owns<D: Document<Node = N>>(&self, doc: &D, node: &N) -> bool {
        doc.closest(node, &self.layout.control()).is_some()
    }

    /// Re-apply the appearance for `active` to the live control.
    pub fn refresh<D: Document<Node = N>>(&self, doc: &D, active: bool) {
        let Some(control) = self.live_control(doc) else {
            return;
        };
        let look = ControlAppearance::for_active(active);
        let applied = doc
            .set_attribute(&control, "style", &look.style())
            .and_then(|()| doc.set_attribute(&control, "title", look.title));
        if let Err(err) = applied {
            tracing::warn!(error = %err, "control refresh failed");
            return;
        }
        for icon in doc.children(&control) {
            let _ = doc.set_attribute(&icon, "style", &look.icon_style());
        }
    }

    /// Detach the control, if any.
    pub fn remove<D: Document<Node = N>>(&mut self, doc: &D) {
        for control in doc.query_all(&doc.root(), &self.layout.control()) {
            let _ = doc.remove(&control);
        }
        if self.control.take().is_some() {
            tracing::info!("control removed");
        }
    }

    fn live_control<D: Document<Node = N>>(&self, doc: &D) -> Option<N> {
        self.control
            .clone()
            .filter(|c| doc.is_connected(c))
            .or_else(|| doc.query(&doc.root(), &self.layout.control()))
    }

    fn control_spec(&self, active: bool) -> ElementSpec {
        let look = ControlAppearance::for_active(active);
        ElementSpec::new("div")
            .class(&self.layout.control_classes)
            .class(&self.layout.control_marker)
            .attr("role", "button")
            .attr("style", look.style())
            .attr("title", look.title)
            .child(
                ElementSpec::new("span")
                    .class(&self.layout.control_icon_classes)
                    .attr("style", look.icon_style()),
            )
    }
}

/// The direct child of `container` that is, or contains, `node`.
fn child_holding<D: Document>(doc: &D, container: &D::Node, node: &D::Node) -> Option<D::Node> {
    let mut current = node.clone();
    loop {
        let parent = doc.parent(&current)?;
        if parent == *container {
            return Some(current);
        }
        current = parent;
    }
}
