//! Detection engine — finds the current recoverable notification and clicks
//! its action.
//!
//! One scan is a pure read of the tree followed by at most one click. The
//! engine owns nothing mutable; the caller passes the [`AutomationState`] in,
//! so every gate (expiry, active flag, cooldown) is visible at the call site.

mod strategy;

use std::time::Duration;

use serde::Serialize;

use autoresume_domain::layout::HostLayout;
use autoresume_domain::scenario::Scenario;
use autoresume_domain::state::AutomationState;
use autoresume_domain::time::Timestamp;

use crate::ports::Document;

pub use strategy::MatchStrategy;

/// Outcome of a scan that clicked something.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClickResult {
    /// Position of the matched scenario in the table.
    pub scenario_index: usize,
    pub scenario: String,
    pub strategy: &'static str,
    pub label: String,
    pub at: Timestamp,
}

/// A located, not yet clicked, action.
#[derive(Debug, Clone, PartialEq)]
pub struct Detection<N> {
    pub scenario_index: usize,
    pub strategy: MatchStrategy,
    pub node: N,
}

/// Scans the document for the scenario table and clicks the first match.
pub struct DetectionEngine {
    scenarios: Vec<Scenario>,
    layout: HostLayout,
    cooldown: Duration,
}

impl DetectionEngine {
    /// Create a new engine.
    #[must_use]
    pub fn new(scenarios: Vec<Scenario>, layout: HostLayout, cooldown: Duration) -> Self {
        Self {
            scenarios,
            layout,
            cooldown,
        }
    }

    #[must_use]
    pub fn scenarios(&self) -> &[Scenario] {
        &self.scenarios
    }

    /// Locate the action of the first scenario present in the tree.
    ///
    /// Scenarios are tried in table order and, within one scenario, the
    /// strategies of its scope in their fixed order.
    pub fn find<D: Document>(&self, doc: &D) -> Option<Detection<D::Node>> {
        self.scenarios
            .iter()
            .enumerate()
            .find_map(|(scenario_index, scenario)| {
                MatchStrategy::for_scope(scenario.scope)
                    .iter()
                    .find_map(|strategy| {
                        strategy
                            .locate(doc, &self.layout, scenario)
                            .map(|node| Detection {
                                scenario_index,
                                strategy: *strategy,
                                node,
                            })
                    })
            })
    }

    /// Run one detection cycle at `now`.
    ///
    /// Does nothing when the session is expired, paused or cooling down.
    /// Otherwise clicks at most one element and records the action.
    pub fn scan<D: Document>(
        &self,
        doc: &D,
        state: &mut AutomationState,
        now: Timestamp,
    ) -> Option<ClickResult> {
        if state.check_expiry(now) || !state.is_active() || state.in_cooldown(now, self.cooldown) {
            return None;
        }

        let detection = self.find(doc)?;
        let scenario = &self.scenarios[detection.scenario_index];

        if let Err(err) = doc.click(&detection.node) {
            tracing::warn!(
                scenario = %scenario.description,
                strategy = %detection.strategy,
                error = %err,
                "click failed"
            );
            return None;
        }
        state.record_action(now);

        tracing::info!(
            scenario = %scenario.description,
            strategy = %detection.strategy,
            label = %scenario.action_label,
            "clicked action"
        );

        Some(ClickResult {
            scenario_index: detection.scenario_index,
            scenario: scenario.description.clone(),
            strategy: detection.strategy.name(),
            label: scenario.action_label.clone(),
            at: now,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeDocument;
    use autoresume_domain::element::ElementSpec;
    use autoresume_domain::scenario::default_scenarios;
    use autoresume_domain::time::now;

    fn engine() -> DetectionEngine {
        DetectionEngine::new(
            default_scenarios(),
            HostLayout::default(),
            Duration::from_millis(3000),
        )
    }

    fn ms(value: i64) -> chrono::Duration {
        chrono::Duration::milliseconds(value)
    }

    fn tool_call_notice() -> ElementSpec {
        ElementSpec::new("div")
            .class("message")
            .child(ElementSpec::new("p").text(
                "Note: we default stop the agent after 25 tool calls. You can resume.",
            ))
            .child(ElementSpec::new("a").text("resume the conversation"))
    }

    fn chat_window(children: Vec<ElementSpec>) -> ElementSpec {
        children
            .into_iter()
            .fold(ElementSpec::new("div").class("conversations"), ElementSpec::child)
    }

    #[test]
    fn should_click_tool_call_link_and_record_action() {
        let doc = FakeDocument::new();
        doc.append(0, &tool_call_notice());
        let link = doc.find_one("a");
        let t0 = now();
        let mut state = AutomationState::new(true, None, t0);

        let result = engine().scan(&doc, &mut state, t0).unwrap();

        assert_eq!(doc.clicks(), vec![link]);
        assert_eq!(result.scenario_index, 0);
        assert_eq!(result.strategy, "structured_container");
        assert_eq!(result.label, "resume the conversation");
        assert_eq!(state.last_action(), Some(t0));
    }

    #[test]
    fn should_serialize_click_result() {
        let doc = FakeDocument::new();
        doc.append(0, &tool_call_notice());
        let t0 = now();
        let mut state = AutomationState::new(true, None, t0);

        let result = engine().scan(&doc, &mut state, t0).unwrap();
        let json = serde_json::to_value(&result).unwrap();

        assert_eq!(json["scenario"], "tool call limit");
        assert_eq!(json["strategy"], "structured_container");
        assert_eq!(json["label"], "resume the conversation");
    }

    #[test]
    fn should_not_click_twice_within_cooldown() {
        let doc = FakeDocument::new();
        doc.append(0, &tool_call_notice());
        let t0 = now();
        let mut state = AutomationState::new(true, None, t0);
        let engine = engine();

        assert!(engine.scan(&doc, &mut state, t0).is_some());
        assert!(engine.scan(&doc, &mut state, t0 + ms(2999)).is_none());
        assert_eq!(doc.clicks().len(), 1);

        assert!(engine.scan(&doc, &mut state, t0 + ms(3000)).is_some());
        assert_eq!(doc.clicks().len(), 2);
    }

    #[test]
    fn should_not_click_when_paused() {
        let doc = FakeDocument::new();
        doc.append(0, &tool_call_notice());
        let t0 = now();
        let mut state = AutomationState::new(false, None, t0);

        assert!(engine().scan(&doc, &mut state, t0).is_none());
        assert!(doc.clicks().is_empty());
        assert!(state.last_action().is_none());
    }

    #[test]
    fn should_click_try_again_only_for_high_demand() {
        let doc = FakeDocument::new();
        doc.append(
            0,
            &chat_window(vec![
                ElementSpec::new("div")
                    .child(ElementSpec::new("p").text(
                        "We're experiencing high demand for Claude right now.",
                    ))
                    .child(ElementSpec::new("button").text("Resume"))
                    .child(ElementSpec::new("button").text("Try again")),
            ]),
        );
        let buttons = doc.find("button");
        let t0 = now();
        let mut state = AutomationState::new(true, None, t0);

        let result = engine().scan(&doc, &mut state, t0).unwrap();

        assert_eq!(doc.clicks(), vec![buttons[1]]);
        assert_eq!(result.scenario, "high demand");
        assert_eq!(result.strategy, "chat_window");
    }

    #[test]
    fn should_prefer_earlier_scenario_when_several_match() {
        let doc = FakeDocument::new();
        doc.append(
            0,
            &chat_window(vec![
                ElementSpec::new("div")
                    .child(ElementSpec::new("p").text("Connection failed"))
                    .child(ElementSpec::new("button").text("Try again")),
                ElementSpec::new("div")
                    .child(ElementSpec::new("p").text(
                        "We're having trouble connecting to the model provider.",
                    ))
                    .child(ElementSpec::new("button").text("Resume")),
            ]),
        );
        let resume = doc.find("button")[1];
        let t0 = now();
        let mut state = AutomationState::new(true, None, t0);

        let result = engine().scan(&doc, &mut state, t0).unwrap();

        assert_eq!(result.scenario_index, 1);
        assert_eq!(doc.clicks(), vec![resume]);
    }

    #[test]
    fn should_click_last_notice_in_document_order() {
        let doc = FakeDocument::new();
        doc.append(0, &tool_call_notice());
        doc.append(0, &tool_call_notice());
        let links = doc.find("a");
        let t0 = now();
        let mut state = AutomationState::new(true, None, t0);

        engine().scan(&doc, &mut state, t0).unwrap();

        assert_eq!(doc.clicks(), vec![links[1]]);
    }

    #[test]
    fn should_fall_back_to_text_sweep_for_section_buttons() {
        let doc = FakeDocument::new();
        doc.append(
            0,
            &ElementSpec::new("section")
                .child(ElementSpec::new("span").text("stop the agent after 25 tool calls"))
                .child(ElementSpec::new("div").child(
                    ElementSpec::new("div")
                        .attr("role", "button")
                        .text("  resume the   conversation "),
                )),
        );
        let button = doc.find_one("[role=\"button\"]");
        let t0 = now();
        let mut state = AutomationState::new(true, None, t0);

        let result = engine().scan(&doc, &mut state, t0).unwrap();

        assert_eq!(result.strategy, "text_sweep");
        assert_eq!(doc.clicks(), vec![button]);
    }

    #[test]
    fn should_ignore_secondary_notice_outside_chat_window() {
        let doc = FakeDocument::new();
        doc.append(
            0,
            &ElementSpec::new("div")
                .child(ElementSpec::new("p").text("Connection failed"))
                .child(ElementSpec::new("button").text("Try again")),
        );
        doc.append(0, &chat_window(Vec::new()));
        let t0 = now();
        let mut state = AutomationState::new(true, None, t0);

        assert!(engine().scan(&doc, &mut state, t0).is_none());
        assert!(doc.clicks().is_empty());
    }

    #[test]
    fn should_stop_clicking_for_good_once_expired() {
        let doc = FakeDocument::new();
        doc.append(0, &tool_call_notice());
        let t0 = now();
        let mut state = AutomationState::new(true, Some(Duration::from_secs(10)), t0);
        let engine = engine();

        assert!(engine.scan(&doc, &mut state, t0 + ms(11_000)).is_none());
        assert!(state.is_expired());

        state.set_active(true);
        assert!(!state.reset_session(t0 + ms(12_000)));
        assert!(engine.scan(&doc, &mut state, t0 + ms(20_000)).is_none());
        assert!(doc.clicks().is_empty());
    }

    #[test]
    fn should_not_record_action_when_nothing_matches() {
        let doc = FakeDocument::new();
        doc.append(0, &ElementSpec::new("a").text("resume the conversation"));
        let t0 = now();
        let mut state = AutomationState::new(true, None, t0);

        assert!(engine().scan(&doc, &mut state, t0).is_none());
        assert!(state.last_action().is_none());
    }
}
