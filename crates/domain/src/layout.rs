//! Host layout — where things live in the host application's document tree.
//!
//! Every selector here describes markup owned by the host. None of it is
//! under our control, so all of it is configurable.

use serde::{Deserialize, Serialize};

use crate::selector::Selector;

/// Selectors and markers describing the host UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostLayout {
    /// The button bar the toggle control is inserted into.
    pub button_container: Selector,
    /// Icon identifying the sibling the control is inserted before.
    pub anchor_icon: Selector,
    /// The clickable element enclosing [`anchor_icon`](Self::anchor_icon).
    pub anchor_button: Selector,
    /// Unique class marking the injected control.
    pub control_marker: String,
    /// Extra classes giving the control the host's native button look.
    pub control_classes: String,
    /// Classes of the icon inside the control.
    pub control_icon_classes: String,
    /// Elements considered structured message containers.
    pub message_container: Selector,
    /// Attribute holding a container's raw (unrendered) content.
    pub raw_content_attribute: String,
    /// Ancestor searched for actions after a text-sweep hit.
    pub section: Selector,
    /// Subtree holding the conversation.
    pub chat_window: Selector,
    /// Link-like actionable elements.
    pub links: Selector,
    /// Button-like actionable elements.
    pub buttons: Selector,
}

impl HostLayout {
    /// Selector matching the injected control.
    #[must_use]
    pub fn control(&self) -> Selector {
        Selector::class(self.control_marker.clone())
    }

    /// Selector matching any actionable element (links or buttons).
    #[must_use]
    pub fn actionable(&self) -> Selector {
        self.links.union(&self.buttons)
    }
}

impl Default for HostLayout {
    fn default() -> Self {
        Self {
            button_container: Selector::all_classes(&["button-container", "composer-button-area"]),
            anchor_icon: Selector::class("codicon-image-two"),
            anchor_button: Selector::class("anysphere-icon-button"),
            control_marker: "cursor-auto-resume-btn".to_string(),
            control_classes: "anysphere-icon-button bg-[transparent] border-none text-foreground flex w-3 items-center justify-center".to_string(),
            control_icon_classes: "codicon codicon-infinity".to_string(),
            message_container: Selector::any(),
            raw_content_attribute: "data-raw-content".to_string(),
            section: Selector::tag("section"),
            chat_window: Selector::class("conversations"),
            links: Selector::tag("a")
                .union(&Selector::tag("span").with_class("markdown-link"))
                .union(&Selector::attribute("role", Some("link")))
                .union(&Selector::attribute("data-link", None)),
            buttons: Selector::tag("button").union(&Selector::attribute("role", Some("button"))),
        }
    }
}
