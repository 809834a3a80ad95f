//! Scenario — one recoverable situation: a notification text and the action
//! that recovers from it.
//!
//! Scenarios form an ordered table. When several match during the same scan
//! the earliest entry wins.

use serde::{Deserialize, Serialize};

use crate::error::{AutoResumeError, ValidationError};

/// Where in the document a scenario is looked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioScope {
    /// The whole document: structured containers first, then a text sweep.
    #[default]
    Document,
    /// Only inside the host's chat-window subtree.
    ChatWindow,
}

/// A (notification text, expected action label) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario {
    /// Phrasings of the same notification; any one of them matches.
    pub match_texts: Vec<String>,
    /// Visible text of the element to activate.
    pub action_label: String,
    /// Human-readable name used in logs.
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub scope: ScenarioScope,
}

impl Scenario {
    /// Create a builder for constructing a [`Scenario`].
    #[must_use]
    pub fn builder() -> ScenarioBuilder {
        ScenarioBuilder::default()
    }

    /// Check domain invariants.
    ///
    /// # Errors
    ///
    /// Returns [`AutoResumeError::Validation`] when:
    /// - `action_label` is blank ([`ValidationError::EmptyActionLabel`])
    /// - no `match_texts` entry is non-blank ([`ValidationError::NoMatchText`])
    pub fn validate(&self) -> Result<(), AutoResumeError> {
        if self.action_label.trim().is_empty() {
            return Err(ValidationError::EmptyActionLabel.into());
        }
        if !self.match_texts.iter().any(|t| !t.trim().is_empty()) {
            return Err(ValidationError::NoMatchText.into());
        }
        Ok(())
    }

    /// Whether `haystack` contains one of the notification phrasings.
    #[must_use]
    pub fn matches_text(&self, haystack: &str) -> bool {
        self.match_texts
            .iter()
            .filter(|t| !t.is_empty())
            .any(|t| haystack.contains(t.as_str()))
    }

    /// Whether an element's visible text is this scenario's action label.
    ///
    /// Whitespace is trimmed and collapsed; letter case is ignored.
    #[must_use]
    pub fn label_matches(&self, visible_text: &str) -> bool {
        normalize(visible_text).eq_ignore_ascii_case(&normalize(&self.action_label))
    }
}

fn normalize(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// The scenario table used when none is configured.
///
/// The tool-call limit notice is matched across the whole document; the
/// error notices only inside the chat window.
#[must_use]
pub fn default_scenarios() -> Vec<Scenario> {
    vec![
        Scenario {
            match_texts: vec![
                "stop the agent after 25 tool calls".to_string(),
                "Note: we default stop".to_string(),
            ],
            action_label: "resume the conversation".to_string(),
            description: "tool call limit".to_string(),
            scope: ScenarioScope::Document,
        },
        Scenario {
            match_texts: vec!["We're having trouble connecting to the model provider".to_string()],
            action_label: "Resume".to_string(),
            description: "connection error".to_string(),
            scope: ScenarioScope::ChatWindow,
        },
        Scenario {
            match_texts: vec!["We're experiencing high demand for".to_string()],
            action_label: "Try again".to_string(),
            description: "high demand".to_string(),
            scope: ScenarioScope::ChatWindow,
        },
        Scenario {
            match_texts: vec!["Connection failed".to_string()],
            action_label: "Try again".to_string(),
            description: "connection failed".to_string(),
            scope: ScenarioScope::ChatWindow,
        },
    ]
}

/// Step-by-step builder for [`Scenario`].
#[derive(Debug, Default)]
pub struct ScenarioBuilder {
    match_texts: Vec<String>,
    action_label: Option<String>,
    description: Option<String>,
    scope: ScenarioScope,
}

impl ScenarioBuilder {
    /// Add a notification phrasing.
    #[must_use]
    pub fn match_text(mut self, text: impl Into<String>) -> Self {
        self.match_texts.push(text.into());
        self
    }

    #[must_use]
    pub fn action_label(mut self, label: impl Into<String>) -> Self {
        self.action_label = Some(label.into());
        self
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn scope(mut self, scope: ScenarioScope) -> Self {
        self.scope = scope;
        self
    }

    /// Consume the builder, validate, and return a [`Scenario`].
    ///
    /// The description defaults to the action label.
    ///
    /// # Errors
    ///
    /// Returns [`AutoResumeError::Validation`] if the label or match texts are missing.
    pub fn build(self) -> Result<Scenario, AutoResumeError> {
        let action_label = self.action_label.unwrap_or_default();
        let scenario = Scenario {
            description: self.description.unwrap_or_else(|| action_label.clone()),
            match_texts: self.match_texts,
            action_label,
            scope: self.scope,
        };
        scenario.validate()?;
        Ok(scenario)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tool_call_limit() -> Scenario {
        default_scenarios().remove(0)
    }

    #[test]
    fn should_build_valid_scenario() {
        let scenario = Scenario::builder()
            .match_text("Connection failed")
            .action_label("Try again")
            .scope(ScenarioScope::ChatWindow)
            .build()
            .unwrap();
        assert_eq!(scenario.description, "Try again");
        assert_eq!(scenario.scope, ScenarioScope::ChatWindow);
    }

    #[test]
    fn should_reject_blank_action_label() {
        let result = Scenario::builder()
            .match_text("x")
            .action_label("   ")
            .build();
        assert!(matches!(
            result,
            Err(AutoResumeError::Validation(
                ValidationError::EmptyActionLabel
            ))
        ));
    }

    #[test]
    fn should_reject_missing_match_text() {
        let result = Scenario::builder().match_text("").action_label("Go").build();
        assert!(matches!(
            result,
            Err(AutoResumeError::Validation(ValidationError::NoMatchText))
        ));
    }

    #[test]
    fn should_match_either_phrasing() {
        let scenario = tool_call_limit();
        assert!(scenario.matches_text("We stop the agent after 25 tool calls by default."));
        assert!(scenario.matches_text("Note: we default stop the agent after 25 calls"));
        assert!(!scenario.matches_text("The agent is running"));
    }

    #[test]
    fn should_match_label_with_loose_whitespace_and_case() {
        let scenario = tool_call_limit();
        assert!(scenario.label_matches("  resume the conversation "));
        assert!(scenario.label_matches("Resume   the\nconversation"));
        assert!(!scenario.label_matches("resume the conversation now"));
    }

    #[test]
    fn should_order_default_table_with_tool_call_limit_first() {
        let table = default_scenarios();
        assert_eq!(table.len(), 4);
        assert_eq!(table[0].scope, ScenarioScope::Document);
        assert!(table[1..].iter().all(|s| s.scope == ScenarioScope::ChatWindow));
        assert!(table.iter().all(|s| s.validate().is_ok()));
    }

    #[test]
    fn should_deserialize_with_default_scope() {
        let toml = r#"
            match_texts = ["rate limited"]
            action_label = "Retry"
        "#;
        let scenario: Scenario = toml::from_str(toml).unwrap();
        assert_eq!(scenario.scope, ScenarioScope::Document);
        assert!(scenario.description.is_empty());
    }
}
