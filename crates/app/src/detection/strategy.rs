//! Locator strategies — the ordered ways a scenario's action is looked for.
//!
//! Each strategy answers one question: which element (if any) in the
//! current tree is this scenario's action? Ties always go to the element
//! appearing last in document order, i.e. the most recent notification.

use std::fmt;
use std::iter::successors;

use autoresume_domain::layout::HostLayout;
use autoresume_domain::scenario::{Scenario, ScenarioScope};

use crate::ports::Document;

/// A way of locating a scenario's action element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchStrategy {
    /// Message containers whose raw content or text mentions the notice,
    /// searched for a link carrying the label.
    StructuredContainer,
    /// Any element whose own text mentions the notice; its enclosing
    /// section is searched for a link or button carrying the label.
    TextSweep,
    /// Same as the text sweep but bounded to the chat-window subtree.
    ChatWindow,
}

impl MatchStrategy {
    /// Strategies tried, in order, for a scenario of the given scope.
    #[must_use]
    pub fn for_scope(scope: ScenarioScope) -> &'static [Self] {
        match scope {
            ScenarioScope::Document => &[Self::StructuredContainer, Self::TextSweep],
            ScenarioScope::ChatWindow => &[Self::ChatWindow],
        }
    }

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::StructuredContainer => "structured_container",
            Self::TextSweep => "text_sweep",
            Self::ChatWindow => "chat_window",
        }
    }

    /// Locate the action element for `scenario`, if present.
    pub fn locate<D: Document>(
        self,
        doc: &D,
        layout: &HostLayout,
        scenario: &Scenario,
    ) -> Option<D::Node> {
        match self {
            Self::StructuredContainer => structured_container(doc, layout, scenario),
            Self::TextSweep => text_sweep(doc, layout, scenario),
            Self::ChatWindow => chat_window(doc, layout, scenario),
        }
    }
}

impl fmt::Display for MatchStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Strict ancestors of `node`, innermost first, stopping below `boundary`.
fn ancestors_below<D: Document>(
    doc: &D,
    node: &D::Node,
    boundary: &D::Node,
) -> impl Iterator<Item = D::Node> {
    successors(doc.parent(node), move |n| doc.parent(n)).take_while(move |n| n != boundary)
}

fn structured_container<D: Document>(
    doc: &D,
    layout: &HostLayout,
    scenario: &Scenario,
) -> Option<D::Node> {
    let root = doc.root();
    let mentions = |container: &D::Node| {
        doc.attribute(container, &layout.raw_content_attribute)
            .is_some_and(|raw| scenario.matches_text(&raw))
            || scenario.matches_text(&doc.text_content(container))
    };

    doc.query_all(&root, &layout.links)
        .into_iter()
        .filter(|link| scenario.label_matches(&doc.text_content(link)))
        .filter(|link| {
            ancestors_below(doc, link, &root)
                .any(|a| doc.matches(&a, &layout.message_container) && mentions(&a))
        })
        .last()
}

fn text_sweep<D: Document>(
    doc: &D,
    layout: &HostLayout,
    scenario: &Scenario,
) -> Option<D::Node> {
    let root = doc.root();
    let scopes: Vec<D::Node> = scenario
        .match_texts
        .iter()
        .filter(|t| !t.is_empty())
        .flat_map(|t| doc.find_by_text(&root, t))
        .map(|hit| doc.closest(&hit, &layout.section).unwrap_or(hit))
        .collect();
    if scopes.is_empty() {
        return None;
    }

    doc.query_all(&root, &layout.actionable())
        .into_iter()
        .filter(|candidate| scenario.label_matches(&doc.text_content(candidate)))
        .filter(|candidate| scopes.iter().any(|scope| doc.contains(scope, candidate)))
        .last()
}

fn chat_window<D: Document>(
    doc: &D,
    layout: &HostLayout,
    scenario: &Scenario,
) -> Option<D::Node> {
    let root = doc.root();
    let actionable = layout.actionable();

    doc.query_all(&root, &layout.chat_window)
        .into_iter()
        .flat_map(|window| {
            doc.query_all(&window, &actionable)
                .into_iter()
                .filter(|candidate| scenario.label_matches(&doc.text_content(candidate)))
                .filter(|candidate| {
                    ancestors_below(doc, candidate, &window)
                        .any(|a| scenario.matches_text(&doc.text_content(&a)))
                })
                .collect::<Vec<_>>()
        })
        .last()
}
