//! Canonical results.
//!
//! Every tier's output is coerced into one [`CanonicalResult`]: the action's
//! typed output, the tag of the tier that produced it, and (only after a
//! degradation) the kind of the last external failure.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

use crate::action::Action;
use crate::schema;

/// Which tier produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderTag {
    Worker,
    Remote,
    Fallback,
}

impl ProviderTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderTag::Worker => "worker",
            ProviderTag::Remote => "remote",
            ProviderTag::Fallback => "fallback",
        }
    }
}

impl fmt::Display for ProviderTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classified failure of one tier attempt.
///
/// These never reach a caller as errors. They are only logged and recorded on
/// the fallback result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Unconfigured,
    ProcessSpawnError,
    ProcessExitError,
    MalformedWorkerOutput,
    Timeout,
    RateLimited,
    Unauthorized,
    NetworkError,
    MalformedUpstream,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Unconfigured => "unconfigured",
            ErrorKind::ProcessSpawnError => "process_spawn_error",
            ErrorKind::ProcessExitError => "process_exit_error",
            ErrorKind::MalformedWorkerOutput => "malformed_worker_output",
            ErrorKind::Timeout => "timeout",
            ErrorKind::RateLimited => "rate_limited",
            ErrorKind::Unauthorized => "unauthorized",
            ErrorKind::NetworkError => "network_error",
            ErrorKind::MalformedUpstream => "malformed_upstream",
        };
        f.write_str(name)
    }
}

/// The single response shape handed back to callers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CanonicalResult {
    /// Action-specific output
    pub data: ActionOutput,

    /// Tier that produced `data`
    pub provider: ProviderTag,

    /// Last external failure, when `data` came from the fallback tier
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorKind>,
}

impl CanonicalResult {
    pub fn new(data: ActionOutput, provider: ProviderTag) -> Self {
        Self {
            data,
            provider,
            error: None,
        }
    }

    pub fn with_error(mut self, error: Option<ErrorKind>) -> Self {
        self.error = error;
        self
    }

    /// The action the result answers.
    pub fn action(&self) -> Action {
        self.data.action()
    }

    /// `data` as a JSON object.
    pub fn data_json(&self) -> JsonValue {
        serde_json::to_value(&self.data).unwrap_or(JsonValue::Null)
    }
}

/// Why a tier's JSON could not be coerced into an action's output.
#[derive(Error, Debug)]
pub enum NormalizeError {
    #[error("output for {action} violates its schema: {}", .violations.join("; "))]
    SchemaViolation {
        action: Action,
        violations: Vec<String>,
    },

    #[error("output for {action} does not fit the result type: {source}")]
    Shape {
        action: Action,
        #[source]
        source: serde_json::Error,
    },

    #[error("output for {action} is unusable: {reason}")]
    Unusable { action: Action, reason: String },
}

/// Typed output, one variant per action.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ActionOutput {
    AnswerEvaluation(AnswerEvaluation),
    Question(GeneratedQuestion),
    Explanation(TutoringExplanation),
    Conversation(ConversationReply),
    LearningPath(LearningPathPlan),
    ErrorAnalysis(ErrorAnalysis),
    ProviderStatus(ProviderStatusReport),
    Test(GeneratedTest),
    Chat(ChatReply),
    TestSummary(TestSummary),
}

impl ActionOutput {
    /// The action this output belongs to.
    pub fn action(&self) -> Action {
        match self {
            ActionOutput::AnswerEvaluation(_) => Action::EvaluateAnswer,
            ActionOutput::Question(_) => Action::GenerateQuestion,
            ActionOutput::Explanation(_) => Action::ProvideExplanation,
            ActionOutput::Conversation(_) => Action::ConversationalTurn,
            ActionOutput::LearningPath(_) => Action::AnalyzeLearningPath,
            ActionOutput::ErrorAnalysis(_) => Action::AnalyzeErrors,
            ActionOutput::ProviderStatus(_) => Action::ProviderStatus,
            ActionOutput::Test(_) => Action::GenerateTest,
            ActionOutput::Chat(_) => Action::Chat,
            ActionOutput::TestSummary(_) => Action::SummarizeTest,
        }
    }

    /// Coerce raw tier JSON into the typed output for `action`.
    ///
    /// The value must satisfy the action's schema and then deserialize into
    /// the typed struct. Unknown keys (including any `provider` the tier set
    /// itself) are dropped.
    pub fn from_value(action: Action, value: JsonValue) -> Result<Self, NormalizeError> {
        schema::validate_output(action, &value).map_err(|violations| {
            NormalizeError::SchemaViolation { action, violations }
        })?;

        let shape = |source| NormalizeError::Shape { action, source };

        let output = match action {
            Action::EvaluateAnswer => {
                ActionOutput::AnswerEvaluation(serde_json::from_value(value).map_err(shape)?)
            }
            Action::GenerateQuestion => {
                ActionOutput::Question(serde_json::from_value(value).map_err(shape)?)
            }
            Action::ProvideExplanation => {
                ActionOutput::Explanation(serde_json::from_value(value).map_err(shape)?)
            }
            Action::ConversationalTurn => {
                ActionOutput::Conversation(serde_json::from_value(value).map_err(shape)?)
            }
            Action::AnalyzeLearningPath => {
                ActionOutput::LearningPath(serde_json::from_value(value).map_err(shape)?)
            }
            Action::AnalyzeErrors => {
                ActionOutput::ErrorAnalysis(serde_json::from_value(value).map_err(shape)?)
            }
            Action::ProviderStatus => {
                ActionOutput::ProviderStatus(ProviderStatusReport::from_value(value).map_err(shape)?)
            }
            Action::GenerateTest => {
                ActionOutput::Test(serde_json::from_value(value).map_err(shape)?)
            }
            Action::Chat => ActionOutput::Chat(serde_json::from_value(value).map_err(shape)?),
            Action::SummarizeTest => {
                ActionOutput::TestSummary(serde_json::from_value(value).map_err(shape)?)
            }
        };

        output
            .check_usable()
            .map_err(|reason| NormalizeError::Unusable { action, reason })?;

        Ok(output)
    }

    /// Checks the schema cannot express: answer indexes stay inside their
    /// options and a test is never empty.
    fn check_usable(&self) -> Result<(), String> {
        match self {
            ActionOutput::Question(q) => check_answer_index(q.correct_answer, q.options.len()),
            ActionOutput::Test(test) => {
                if test.questions.is_empty() {
                    return Err("test has no questions".to_string());
                }
                test.questions.iter().enumerate().try_for_each(|(i, q)| {
                    check_answer_index(q.correct_answer, q.options.len())
                        .map_err(|reason| format!("question {}: {}", i + 1, reason))
                })
            }
            _ => Ok(()),
        }
    }
}

fn check_answer_index(correct_answer: usize, options: usize) -> Result<(), String> {
    if correct_answer < options {
        Ok(())
    } else {
        Err(format!(
            "correctAnswer {} is out of range for {} options",
            correct_answer, options
        ))
    }
}

/// Accept any JSON number as a 0..=100 score.
fn lenient_score<'de, D>(deserializer: D) -> Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = f64::deserialize(deserializer)?;
    Ok(clamp_score(raw))
}

/// Round and clamp a raw score into 0..=100.
pub fn clamp_score(raw: f64) -> u8 {
    if raw.is_nan() {
        return 0;
    }
    raw.round().clamp(0.0, 100.0) as u8
}

fn default_next_difficulty() -> String {
    "intermediate".to_string()
}

/// Result of grading one answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerEvaluation {
    #[serde(deserialize_with = "lenient_score")]
    pub score: u8,

    #[serde(default, alias = "correct")]
    pub is_correct: bool,

    pub feedback: String,

    #[serde(default)]
    pub strengths: Vec<String>,

    #[serde(default, alias = "areas_for_improvement")]
    pub weaknesses: Vec<String>,

    #[serde(default)]
    pub suggestions: Vec<String>,

    #[serde(default)]
    pub concepts_understood: Vec<String>,

    #[serde(default)]
    pub concepts_missed: Vec<String>,

    #[serde(default)]
    pub difficulty: String,

    #[serde(default = "default_next_difficulty")]
    pub next_difficulty: String,

    #[serde(default)]
    pub time_to_improve: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub explanation: String,
}

/// One generated practice question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedQuestion {
    pub question: String,

    #[serde(rename = "type", default = "default_question_type")]
    pub kind: String,

    #[serde(default)]
    pub subject: String,

    #[serde(default)]
    pub difficulty: String,

    #[serde(default)]
    pub topic: String,

    pub options: Vec<String>,

    pub correct_answer: usize,

    #[serde(default)]
    pub explanation: String,

    #[serde(default, alias = "learning_objectives")]
    pub learning_objectives: Vec<String>,

    #[serde(default)]
    pub prerequisites: Vec<String>,
}

fn default_question_type() -> String {
    "multiple-choice".to_string()
}

/// Tutoring explanation for a question and a student's answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TutoringExplanation {
    pub explanation: String,

    #[serde(default, alias = "key_concepts")]
    pub key_concepts: Vec<String>,

    #[serde(default)]
    pub examples: Vec<String>,

    #[serde(default, alias = "common_mistakes")]
    pub common_mistakes: Vec<String>,

    #[serde(default, alias = "practice_tips")]
    pub practice_tips: Vec<String>,

    #[serde(default, alias = "next_steps")]
    pub next_steps: String,
}

/// Tutor reply in a conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationReply {
    pub response: String,

    #[serde(default = "default_response_type", alias = "response_type")]
    pub response_type: String,

    #[serde(default, alias = "suggested_questions")]
    pub suggested_questions: Vec<String>,

    #[serde(default)]
    pub resources: Vec<String>,

    #[serde(default = "default_confidence", alias = "confidence_level")]
    pub confidence_level: String,

    #[serde(default, alias = "next_topic_suggestion")]
    pub next_topic_suggestion: String,
}

fn default_response_type() -> String {
    "explanation".to_string()
}

fn default_confidence() -> String {
    "medium".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectRecommendation {
    pub subject: String,
    pub priority: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LearningStep {
    pub topic: String,
    pub difficulty: String,
    #[serde(alias = "estimated_time")]
    pub estimated_time: String,
}

/// Personalised study plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LearningPathPlan {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub average_score: Option<f64>,

    #[serde(alias = "recommended_subjects")]
    pub recommended_subjects: Vec<SubjectRecommendation>,

    #[serde(default, alias = "learning_sequence")]
    pub learning_sequence: Vec<LearningStep>,

    #[serde(default)]
    pub goals: Vec<String>,

    #[serde(default, alias = "study_tips")]
    pub study_tips: Vec<String>,

    #[serde(default, alias = "progress_milestones")]
    pub progress_milestones: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorPattern {
    pub pattern: String,
    pub frequency: String,
    #[serde(alias = "root_cause")]
    pub root_cause: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Remediation {
    #[serde(alias = "error_type")]
    pub error_type: String,
    #[serde(alias = "remediation_strategy")]
    pub remediation_strategy: String,
    #[serde(default, alias = "practice_exercises")]
    pub practice_exercises: Vec<String>,
}

/// Patterns found in a student's mistakes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorAnalysis {
    #[serde(alias = "error_patterns")]
    pub error_patterns: Vec<ErrorPattern>,

    #[serde(default, alias = "targeted_remediation")]
    pub targeted_remediation: Vec<Remediation>,

    #[serde(default, alias = "learning_gaps")]
    pub learning_gaps: Vec<String>,

    #[serde(default, alias = "recommended_focus")]
    pub recommended_focus: Vec<String>,

    #[serde(default)]
    pub encouragement: String,
}

/// Availability of one backend as seen by whoever answered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendStatus {
    pub available: bool,

    #[serde(rename = "type", default)]
    pub kind: String,
}

/// Status of the backends known to the answering tier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderStatusReport {
    pub providers: BTreeMap<String, BackendStatus>,
}

impl ProviderStatusReport {
    /// Accept both `{ "providers": {..} }` and the bare name-to-status map
    /// older workers print.
    fn from_value(value: JsonValue) -> Result<Self, serde_json::Error> {
        if value.get("providers").is_some() {
            serde_json::from_value(value)
        } else {
            Ok(Self {
                providers: serde_json::from_value(value)?,
            })
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestQuestion {
    #[serde(default)]
    pub id: usize,
    pub question: String,
    pub options: Vec<String>,
    pub correct_answer: usize,
    #[serde(default)]
    pub explanation: String,
    #[serde(default)]
    pub difficulty: String,
    #[serde(default)]
    pub concepts: Vec<String>,
}

/// A generated multiple-choice test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedTest {
    #[serde(default)]
    pub title: String,

    #[serde(default)]
    pub description: String,

    pub questions: Vec<TestQuestion>,
}

/// Free-text chat answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatReply {
    pub response: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudyPlan {
    #[serde(default)]
    pub immediate: Vec<String>,
    #[serde(default)]
    pub short_term: Vec<String>,
    #[serde(default)]
    pub long_term: Vec<String>,
}

/// Summary of a whole test attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestSummary {
    #[serde(deserialize_with = "lenient_score")]
    pub overall_score: u8,

    #[serde(default)]
    pub grade: String,

    #[serde(default)]
    pub performance: String,

    #[serde(default)]
    pub strong_areas: Vec<String>,

    #[serde(default)]
    pub weak_areas: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub study_plan: Option<StudyPlan>,

    #[serde(default)]
    pub next_steps: Vec<String>,

    #[serde(default)]
    pub estimated_study_time: String,

    #[serde(default)]
    pub recommended_courses: Vec<String>,

    #[serde(default)]
    pub skill_level: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_worker_style_evaluation_normalizes() {
        let raw = json!({
            "correct": true,
            "feedback": "Well done",
            "score": 87.6,
            "suggestions": ["Try harder problems"],
            "provider": "openai",
            "usage": {"total_tokens": 12}
        });

        let output = ActionOutput::from_value(Action::EvaluateAnswer, raw).unwrap();
        match output {
            ActionOutput::AnswerEvaluation(eval) => {
                assert!(eval.is_correct);
                assert_eq!(eval.score, 88);
                assert_eq!(eval.next_difficulty, "intermediate");
            }
            other => panic!("unexpected output: {:?}", other),
        }
    }

    #[test]
    fn test_error_object_is_rejected() {
        let raw = json!({"error": "Unknown action: foo"});
        let err = ActionOutput::from_value(Action::EvaluateAnswer, raw).unwrap_err();
        assert!(matches!(err, NormalizeError::SchemaViolation { .. }));
    }

    #[test]
    fn test_question_answer_index_must_fit_options() {
        let raw = json!({"question": "q?", "options": ["a", "b"], "correctAnswer": 7});
        let err = ActionOutput::from_value(Action::GenerateQuestion, raw).unwrap_err();
        assert!(matches!(err, NormalizeError::Unusable { .. }));

        let raw = json!({"question": "q?", "options": ["a", "b"], "correctAnswer": 1});
        assert!(ActionOutput::from_value(Action::GenerateQuestion, raw).is_ok());
    }

    #[test]
    fn test_empty_or_broken_test_is_rejected() {
        let err = ActionOutput::from_value(Action::GenerateTest, json!({"questions": []}))
            .unwrap_err();
        assert!(matches!(err, NormalizeError::Unusable { .. }));

        let raw = json!({"questions": [
            {"question": "ok?", "options": ["a", "b", "c"], "correctAnswer": 2},
            {"question": "bad?", "options": ["a", "b"], "correctAnswer": 9}
        ]});
        let err = ActionOutput::from_value(Action::GenerateTest, raw).unwrap_err();
        assert!(err.to_string().contains("question 2"));
    }

    #[test]
    fn test_bare_provider_map_is_accepted() {
        let raw = json!({
            "openai": {"available": false, "type": "OpenAIProvider"},
            "mock": {"available": true, "type": "MockProvider"}
        });
        let output = ActionOutput::from_value(Action::ProviderStatus, raw).unwrap();
        match output {
            ActionOutput::ProviderStatus(report) => {
                assert_eq!(report.providers.len(), 2);
                assert!(report.providers["mock"].available);
            }
            other => panic!("unexpected output: {:?}", other),
        }
    }

    #[test]
    fn test_score_is_clamped() {
        assert_eq!(clamp_score(140.0), 100);
        assert_eq!(clamp_score(-3.0), 0);
        assert_eq!(clamp_score(f64::NAN), 0);
        assert_eq!(clamp_score(59.5), 60);
    }

    #[test]
    fn test_canonical_result_serialization() {
        let result = CanonicalResult::new(
            ActionOutput::Chat(ChatReply {
                response: "hello".into(),
            }),
            ProviderTag::Fallback,
        )
        .with_error(Some(ErrorKind::RateLimited));

        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["provider"], "fallback");
        assert_eq!(value["error"], "rate_limited");
        assert_eq!(value["data"]["response"], "hello");
        assert_eq!(result.action(), Action::Chat);
    }

    #[test]
    fn test_error_field_omitted_when_absent() {
        let result = CanonicalResult::new(
            ActionOutput::Chat(ChatReply {
                response: "hi".into(),
            }),
            ProviderTag::Remote,
        );
        let value = serde_json::to_value(&result).unwrap();
        assert!(value.get("error").is_none());
    }
}
