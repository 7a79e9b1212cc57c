//! Caller-facing operations.
//!
//! One method per action, each building the typed request and running it
//! through [`FallbackOrchestrator::evaluate`]. None of them can fail.

use mentor_core::request::{
    AnalyzeErrors, AnalyzeLearningPath, Chat, ConversationalTurn, EvaluateAnswer, Exchange,
    GenerateQuestion, GenerateTest, ProvideExplanation, QuestionOutcome, SummarizeTest,
};
use mentor_core::{CanonicalResult, Request};
use serde_json::{Map, Value as JsonValue};

use crate::orchestrator::FallbackOrchestrator;

impl FallbackOrchestrator {
    /// Grade a student's answer. `context` may carry `correctAnswer` and
    /// `options`.
    pub async fn evaluate_answer(
        &self,
        question: impl Into<String>,
        answer: impl Into<String>,
        kind: impl Into<String>,
        context: Option<JsonValue>,
    ) -> CanonicalResult {
        let request = EvaluateAnswer {
            kind: kind.into(),
            context,
            ..EvaluateAnswer::new(question, answer)
        };
        self.evaluate(&Request::EvaluateAnswer(request)).await
    }

    /// Produce a practice question not in `history`.
    pub async fn generate_adaptive_question(
        &self,
        subject: impl Into<String>,
        difficulty: impl Into<String>,
        topic: Option<String>,
        history: Vec<String>,
    ) -> CanonicalResult {
        let request = GenerateQuestion {
            subject: subject.into(),
            difficulty: difficulty.into(),
            topic,
            previous_questions: history,
        };
        self.evaluate(&Request::GenerateQuestion(request)).await
    }

    pub async fn provide_tutoring_explanation(
        &self,
        question: impl Into<String>,
        student_answer: impl Into<String>,
        correct_answer: Option<String>,
    ) -> CanonicalResult {
        let request = ProvideExplanation {
            question: question.into(),
            student_answer: student_answer.into(),
            correct_answer,
        };
        self.evaluate(&Request::ProvideExplanation(request)).await
    }

    pub async fn conversational_turn(
        &self,
        message: impl Into<String>,
        history: Vec<Exchange>,
    ) -> CanonicalResult {
        let request = ConversationalTurn {
            student_message: message.into(),
            conversation_history: history,
        };
        self.evaluate(&Request::ConversationalTurn(request)).await
    }

    /// Plan study from per-subject progress (`{"math": 72, ...}`).
    pub async fn analyze_learning_path(
        &self,
        progress: Map<String, JsonValue>,
        subjects: Vec<String>,
    ) -> CanonicalResult {
        let request = AnalyzeLearningPath {
            student_progress: progress,
            subjects,
        };
        self.evaluate(&Request::AnalyzeLearningPath(request)).await
    }

    pub async fn analyze_errors(
        &self,
        errors: Vec<String>,
        subject: impl Into<String>,
    ) -> CanonicalResult {
        let request = AnalyzeErrors {
            student_errors: errors,
            subject: subject.into(),
        };
        self.evaluate(&Request::AnalyzeErrors(request)).await
    }

    pub async fn provider_status(&self) -> CanonicalResult {
        self.evaluate(&Request::ProviderStatus).await
    }

    pub async fn generate_test(&self, topic: impl Into<String>, count: usize) -> CanonicalResult {
        let request = GenerateTest {
            topic: topic.into(),
            count,
            difficulty: None,
        };
        self.evaluate(&Request::GenerateTest(request)).await
    }

    pub async fn chat(&self, message: impl Into<String>, context: Option<String>) -> CanonicalResult {
        let request = Chat {
            message: message.into(),
            context,
        };
        self.evaluate(&Request::Chat(request)).await
    }

    pub async fn summarize_test(&self, results: Vec<QuestionOutcome>) -> CanonicalResult {
        let request = SummarizeTest {
            results,
            ..SummarizeTest::default()
        };
        self.evaluate(&Request::SummarizeTest(request)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mentor_core::{ActionOutput, ProviderTag};
    use serde_json::json;

    fn orchestrator() -> FallbackOrchestrator {
        FallbackOrchestrator::builder().build()
    }

    #[tokio::test]
    async fn test_evaluate_answer_resolves_option_index() {
        let context = json!({"options": ["3", "4", "5"], "correctAnswer": 1});
        let result = orchestrator()
            .evaluate_answer("What is 2+2?", "4", "multiple-choice", Some(context))
            .await;

        match result.data {
            ActionOutput::AnswerEvaluation(eval) => assert_eq!(eval.score, 100),
            other => panic!("unexpected output: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_generate_adaptive_question_skips_history() {
        let orchestrator = orchestrator();
        let first = orchestrator
            .generate_adaptive_question("math", "easy", None, vec![])
            .await;

        let ActionOutput::Question(first) = first.data else {
            panic!("expected a question");
        };
        assert_eq!(first.question, "What is 2 + 3?");

        let second = orchestrator
            .generate_adaptive_question("math", "easy", None, vec![first.question.clone()])
            .await;
        let ActionOutput::Question(second) = second.data else {
            panic!("expected a question");
        };
        assert_ne!(second.question, first.question);
    }

    #[tokio::test]
    async fn test_generate_test_counts() {
        let result = orchestrator().generate_test("python", 3).await;
        let ActionOutput::Test(test) = result.data else {
            panic!("expected a test");
        };
        let ids: Vec<usize> = test.questions.iter().map(|q| q.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);

        let empty = orchestrator().generate_test("python", 0).await;
        let ActionOutput::Test(empty) = empty.data else {
            panic!("expected a test");
        };
        assert!(empty.questions.is_empty());
    }

    #[tokio::test]
    async fn test_summarize_empty_test() {
        let result = orchestrator().summarize_test(vec![]).await;
        let ActionOutput::TestSummary(summary) = result.data else {
            panic!("expected a summary");
        };
        assert_eq!(summary.overall_score, 0);
        assert_eq!(summary.grade, "F");
    }

    #[tokio::test]
    async fn test_provider_status_reports_fallback_only() {
        let result = orchestrator().provider_status().await;
        assert_eq!(result.provider, ProviderTag::Fallback);

        let ActionOutput::ProviderStatus(report) = result.data else {
            panic!("expected a status report");
        };
        assert!(report.providers["fallback"].available);
        assert_eq!(report.providers.len(), 1);
    }

    #[tokio::test]
    async fn test_remaining_operations_answer() {
        let orchestrator = orchestrator();

        let mut progress = Map::new();
        progress.insert("math".into(), json!(45));
        progress.insert("python".into(), json!(90));

        let results = [
            orchestrator
                .provide_tutoring_explanation("What is 2+2?", "5", Some("4".into()))
                .await,
            orchestrator.conversational_turn("how do loops work?", vec![]).await,
            orchestrator.analyze_learning_path(progress, vec![]).await,
            orchestrator
                .analyze_errors(vec!["sign error".into(), "sign error".into()], "math")
                .await,
            orchestrator.chat("what's the weather like?", None).await,
        ];

        for result in results {
            assert_eq!(result.provider, ProviderTag::Fallback);
            assert!(serde_json::to_value(&result).is_ok());
        }
    }
}
