//! The action discriminator.
//!
//! Every request names exactly one action. The wire name is what the worker
//! process sees in the `action` field and what routing config refers to.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kind of tutoring task being requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Action {
    #[serde(rename = "evaluate_answer")]
    EvaluateAnswer,

    #[serde(rename = "generate_adaptive_question", alias = "generate_question")]
    GenerateQuestion,

    #[serde(rename = "provide_tutoring_explanation", alias = "provide_explanation")]
    ProvideExplanation,

    #[serde(rename = "conversational_tutoring", alias = "conversational_turn")]
    ConversationalTurn,

    #[serde(rename = "analyze_learning_path")]
    AnalyzeLearningPath,

    #[serde(rename = "analyze_errors")]
    AnalyzeErrors,

    #[serde(rename = "get_provider_status", alias = "provider_status")]
    ProviderStatus,

    #[serde(rename = "generate_test")]
    GenerateTest,

    #[serde(rename = "chat")]
    Chat,

    #[serde(rename = "summarize_test")]
    SummarizeTest,
}

impl Action {
    /// All actions in declaration order.
    pub const ALL: [Action; 10] = [
        Action::EvaluateAnswer,
        Action::GenerateQuestion,
        Action::ProvideExplanation,
        Action::ConversationalTurn,
        Action::AnalyzeLearningPath,
        Action::AnalyzeErrors,
        Action::ProviderStatus,
        Action::GenerateTest,
        Action::Chat,
        Action::SummarizeTest,
    ];

    /// Wire name used in the worker protocol and in configuration.
    pub fn wire_name(&self) -> &'static str {
        match self {
            Action::EvaluateAnswer => "evaluate_answer",
            Action::GenerateQuestion => "generate_adaptive_question",
            Action::ProvideExplanation => "provide_tutoring_explanation",
            Action::ConversationalTurn => "conversational_tutoring",
            Action::AnalyzeLearningPath => "analyze_learning_path",
            Action::AnalyzeErrors => "analyze_errors",
            Action::ProviderStatus => "get_provider_status",
            Action::GenerateTest => "generate_test",
            Action::Chat => "chat",
            Action::SummarizeTest => "summarize_test",
        }
    }

    /// Whether remote model output for this action is used verbatim.
    ///
    /// Every other action expects the model to answer with JSON of the
    /// action's result shape.
    pub fn is_free_text(&self) -> bool {
        matches!(self, Action::Chat)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

/// Error returned when parsing an unknown action name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown action: '{0}'")]
pub struct UnknownAction(pub String);

impl FromStr for Action {
    type Err = UnknownAction;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        serde_json::from_value(serde_json::Value::String(normalized))
            .map_err(|_| UnknownAction(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_names_round_trip_through_serde() {
        for action in Action::ALL {
            let json = serde_json::to_value(action).unwrap();
            assert_eq!(json, serde_json::Value::String(action.wire_name().into()));
        }
    }

    #[test]
    fn test_aliases_parse() {
        assert_eq!("generate_question".parse::<Action>().unwrap(), Action::GenerateQuestion);
        assert_eq!("provider-status".parse::<Action>().unwrap(), Action::ProviderStatus);
        assert_eq!("Conversational_Turn".parse::<Action>().unwrap(), Action::ConversationalTurn);
    }

    #[test]
    fn test_unknown_action_rejected() {
        let err = "summon_dragon".parse::<Action>().unwrap_err();
        assert!(err.to_string().contains("summon_dragon"));
    }

    #[test]
    fn test_only_chat_is_free_text() {
        let free: Vec<_> = Action::ALL.iter().filter(|a| a.is_free_text()).collect();
        assert_eq!(free, vec![&Action::Chat]);
    }
}
