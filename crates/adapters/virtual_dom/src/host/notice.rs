//! Notices the simulated host posts into its chat window.

use autoresume_domain::element::ElementSpec;

/// Attribute marking the elements of a notice that resolve it when clicked.
pub const ACTION_ATTRIBUTE: &str = "data-action";

/// An interruption the host can render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    ToolCallLimit,
    ProviderTrouble,
    HighDemand,
    ConnectionFailed,
}

impl Notice {
    /// Posting order of the demo cycle.
    pub const ALL: [Self; 4] = [
        Self::ToolCallLimit,
        Self::HighDemand,
        Self::ProviderTrouble,
        Self::ConnectionFailed,
    ];

    #[must_use]
    pub fn text(self) -> &'static str {
        match self {
            Self::ToolCallLimit => {
                "Note: we default stop the agent after 25 tool calls. You can resume the conversation."
            }
            Self::ProviderTrouble => {
                "We're having trouble connecting to the model provider. This might be temporary - please try again in a moment."
            }
            Self::HighDemand => {
                "We're experiencing high demand for Claude right now. Please switch to another model or try again in a few moments."
            }
            Self::ConnectionFailed => {
                "Connection failed. If the problem persists, please check your internet connection or VPN."
            }
        }
    }

    /// Markup of the notice as a chat message.
    #[must_use]
    pub fn render(self) -> ElementSpec {
        let message = ElementSpec::new("div")
            .class("message notice")
            .attr("data-raw-content", self.text());
        match self {
            Self::ToolCallLimit => message
                .child(
                    ElementSpec::new("p")
                        .text("Note: we default stop the agent after 25 tool calls. You can"),
                )
                .child(
                    ElementSpec::new("span")
                        .class("markdown-link")
                        .attr(ACTION_ATTRIBUTE, "resume")
                        .text("resume the conversation"),
                ),
            Self::ProviderTrouble => message
                .child(ElementSpec::new("p").text(self.text()))
                .child(button("Resume", "resume")),
            Self::HighDemand => message
                .child(ElementSpec::new("p").text(self.text()))
                .child(button("Switch model", "switch"))
                .child(button("Try again", "retry")),
            Self::ConnectionFailed => message
                .child(ElementSpec::new("p").text(self.text()))
                .child(button("Try again", "retry")),
        }
    }
}

fn button(label: &str, action: &str) -> ElementSpec {
    ElementSpec::new("button")
        .attr(ACTION_ATTRIBUTE, action)
        .text(label)
}
