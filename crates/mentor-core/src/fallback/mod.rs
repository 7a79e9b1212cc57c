//! Deterministic fallback generator.
//!
//! The terminal tier of the cascade. Every action has a pure, synchronous
//! answer here: no I/O, no clock, no randomness. Identical requests produce
//! identical outputs.
//!
//! ## Modules
//!
//! - `grading`: answer evaluation and test summaries (score bands)
//! - `question_bank`: static question bank for questions and tests
//! - `chat`: keyword-category replies for chat and conversational turns
//! - `analysis`: explanations, learning paths, error analysis, status

mod analysis;
mod chat;
mod grading;
mod question_bank;

pub use chat::{classify, ChatCategory};
pub use grading::{grade_for, ScoreBand};
pub use question_bank::{normalize_difficulty, normalize_topic, BankQuestion};

use crate::request::Request;
use crate::result::ActionOutput;

/// Generates canonical outputs without consulting any external system.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeterministicFallbackGenerator;

impl DeterministicFallbackGenerator {
    pub fn new() -> Self {
        Self
    }

    /// Produce the output for any request. Total: never fails, never panics.
    pub fn generate(&self, request: &Request) -> ActionOutput {
        match request {
            Request::EvaluateAnswer(req) => {
                ActionOutput::AnswerEvaluation(grading::evaluate_answer(req))
            }
            Request::GenerateQuestion(req) => {
                ActionOutput::Question(question_bank::generate_question(req))
            }
            Request::ProvideExplanation(req) => {
                ActionOutput::Explanation(analysis::explain(req))
            }
            Request::ConversationalTurn(req) => {
                ActionOutput::Conversation(chat::conversational_turn(req))
            }
            Request::AnalyzeLearningPath(req) => {
                ActionOutput::LearningPath(analysis::learning_path(req))
            }
            Request::AnalyzeErrors(req) => ActionOutput::ErrorAnalysis(analysis::errors(req)),
            Request::ProviderStatus => ActionOutput::ProviderStatus(analysis::provider_status()),
            Request::GenerateTest(req) => ActionOutput::Test(question_bank::generate_test(req)),
            Request::Chat(req) => ActionOutput::Chat(chat::chat(req)),
            Request::SummarizeTest(req) => {
                ActionOutput::TestSummary(grading::summarize_test(req))
            }
        }
    }
}

/// Stable index into `len` alternatives derived from `text` (FNV-1a).
///
/// Returns 0 when `len` is 0.
pub(crate) fn stable_index(text: &str, len: usize) -> usize {
    if len == 0 {
        return 0;
    }
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for byte in text.as_bytes() {
        hash ^= u64::from(*byte);
        hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
    }
    (hash % len as u64) as usize
}
