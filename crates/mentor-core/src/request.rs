//! Typed requests.
//!
//! A [`Request`] is a tagged union with one variant per [`Action`]. Its JSON
//! form is the worker wire format: a single object with an `action` tag and
//! the payload fields (camelCase) next to it.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::action::Action;

fn default_question_kind() -> String {
    "multiple-choice".to_string()
}

fn default_subject() -> String {
    "Mathematics".to_string()
}

fn default_difficulty() -> String {
    "intermediate".to_string()
}

fn default_error_subject() -> String {
    "general".to_string()
}

fn default_test_count() -> usize {
    10
}

/// Most questions a single test may hold.
pub const MAX_TEST_QUESTIONS: usize = 50;

/// A single request to the cascade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action")]
pub enum Request {
    #[serde(rename = "evaluate_answer")]
    EvaluateAnswer(EvaluateAnswer),

    #[serde(rename = "generate_adaptive_question", alias = "generate_question")]
    GenerateQuestion(GenerateQuestion),

    #[serde(rename = "provide_tutoring_explanation", alias = "provide_explanation")]
    ProvideExplanation(ProvideExplanation),

    #[serde(rename = "conversational_tutoring", alias = "conversational_turn")]
    ConversationalTurn(ConversationalTurn),

    #[serde(rename = "analyze_learning_path")]
    AnalyzeLearningPath(AnalyzeLearningPath),

    #[serde(rename = "analyze_errors")]
    AnalyzeErrors(AnalyzeErrors),

    #[serde(rename = "get_provider_status", alias = "provider_status")]
    ProviderStatus,

    #[serde(rename = "generate_test")]
    GenerateTest(GenerateTest),

    #[serde(rename = "chat")]
    Chat(Chat),

    #[serde(rename = "summarize_test")]
    SummarizeTest(SummarizeTest),
}

impl Request {
    /// The action this request asks for.
    pub fn action(&self) -> Action {
        match self {
            Request::EvaluateAnswer(_) => Action::EvaluateAnswer,
            Request::GenerateQuestion(_) => Action::GenerateQuestion,
            Request::ProvideExplanation(_) => Action::ProvideExplanation,
            Request::ConversationalTurn(_) => Action::ConversationalTurn,
            Request::AnalyzeLearningPath(_) => Action::AnalyzeLearningPath,
            Request::AnalyzeErrors(_) => Action::AnalyzeErrors,
            Request::ProviderStatus => Action::ProviderStatus,
            Request::GenerateTest(_) => Action::GenerateTest,
            Request::Chat(_) => Action::Chat,
            Request::SummarizeTest(_) => Action::SummarizeTest,
        }
    }

    /// Serialize to the single JSON document handed to a worker.
    pub fn to_wire_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Parse a request from its JSON wire form.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// Grade a student's answer to a question.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluateAnswer {
    #[serde(default)]
    pub question: String,

    #[serde(default)]
    pub answer: String,

    /// Question kind, e.g. "multiple-choice" or "essay"
    #[serde(rename = "type", default = "default_question_kind")]
    pub kind: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correct_answer: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,

    /// Free-form context forwarded to the worker untouched
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<JsonValue>,
}

impl EvaluateAnswer {
    pub fn new(question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            answer: answer.into(),
            kind: default_question_kind(),
            ..Default::default()
        }
    }

    pub fn with_correct_answer(mut self, correct: impl Into<String>) -> Self {
        self.correct_answer = Some(correct.into());
        self
    }

    /// The reference answer, if one can be found.
    ///
    /// Looks at `correctAnswer` first, then `context.correctAnswer` (or
    /// `context.correct_answer`). An integer there is treated as an index
    /// into `context.options`.
    pub fn expected_answer(&self) -> Option<String> {
        if let Some(answer) = &self.correct_answer {
            return Some(answer.clone());
        }

        let context = self.context.as_ref()?;
        let raw = context
            .get("correctAnswer")
            .or_else(|| context.get("correct_answer"))?;

        match raw {
            JsonValue::String(s) => Some(s.clone()),
            JsonValue::Number(n) => {
                let index = usize::try_from(n.as_u64()?).ok()?;
                context
                    .get("options")?
                    .as_array()?
                    .get(index)?
                    .as_str()
                    .map(str::to_string)
            }
            _ => None,
        }
    }
}

/// Produce one practice question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateQuestion {
    #[serde(default = "default_subject")]
    pub subject: String,

    #[serde(default = "default_difficulty")]
    pub difficulty: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,

    #[serde(default)]
    pub previous_questions: Vec<String>,
}

impl Default for GenerateQuestion {
    fn default() -> Self {
        Self {
            subject: default_subject(),
            difficulty: default_difficulty(),
            topic: None,
            previous_questions: Vec::new(),
        }
    }
}

/// Explain why an answer is right or wrong.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProvideExplanation {
    #[serde(default)]
    pub question: String,

    #[serde(default)]
    pub student_answer: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correct_answer: Option<String>,
}

/// One prior exchange in a tutoring conversation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Exchange {
    #[serde(default)]
    pub student: String,

    #[serde(default)]
    pub tutor: String,
}

/// One turn of a tutoring conversation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationalTurn {
    #[serde(default)]
    pub student_message: String,

    #[serde(default)]
    pub conversation_history: Vec<Exchange>,
}

/// Recommend what to study next from progress so far.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeLearningPath {
    /// Subject name to a score, either a bare number or `{ "score": n }`
    #[serde(default)]
    pub student_progress: serde_json::Map<String, JsonValue>,

    #[serde(default)]
    pub subjects: Vec<String>,
}

impl AnalyzeLearningPath {
    /// Numeric scores found in `student_progress`, in key order.
    pub fn scores(&self) -> Vec<(String, f64)> {
        self.student_progress
            .iter()
            .filter_map(|(subject, value)| {
                let score = match value {
                    JsonValue::Number(n) => n.as_f64(),
                    JsonValue::Object(obj) => obj.get("score").and_then(JsonValue::as_f64),
                    _ => None,
                }?;
                Some((subject.clone(), score))
            })
            .collect()
    }
}

/// Look for patterns in a student's mistakes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeErrors {
    #[serde(default)]
    pub student_errors: Vec<String>,

    #[serde(default = "default_error_subject")]
    pub subject: String,
}

impl Default for AnalyzeErrors {
    fn default() -> Self {
        Self {
            student_errors: Vec::new(),
            subject: default_error_subject(),
        }
    }
}

/// Produce a multiple-choice test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateTest {
    #[serde(default)]
    pub topic: String,

    #[serde(default = "default_test_count")]
    pub count: usize,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<String>,
}

impl GenerateTest {
    /// `count` capped at [`MAX_TEST_QUESTIONS`].
    pub fn effective_count(&self) -> usize {
        self.count.min(MAX_TEST_QUESTIONS)
    }
}

impl Default for GenerateTest {
    fn default() -> Self {
        Self {
            topic: String::new(),
            count: default_test_count(),
            difficulty: None,
        }
    }
}

/// Free-form chat with the tutor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chat {
    #[serde(default)]
    pub message: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

/// Per-question outcome fed into a test summary.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionOutcome {
    #[serde(default)]
    pub score: f64,

    #[serde(default, alias = "correct")]
    pub is_correct: bool,

    #[serde(default)]
    pub concepts_understood: Vec<String>,

    #[serde(default)]
    pub concepts_missed: Vec<String>,
}

/// Summarize a completed test.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummarizeTest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,

    #[serde(default)]
    pub results: Vec<QuestionOutcome>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_taken_secs: Option<u64>,
}
