//! Prompts for the remote tier.
//!
//! Every remote call is one system instruction plus one user prompt built
//! from the request payload. Structured actions ask the model for a JSON
//! object of the action's result shape; chat is answered in free text.

use mentor_core::request::{Exchange, QuestionOutcome};
use mentor_core::Request;
use serde_json::Value as JsonValue;

use crate::providers::{ChatMessage, CompletionConfig};

/// Conversation turns forwarded to the model.
pub const HISTORY_WINDOW: usize = 5;

/// System prompt for free-text chat.
pub const CHAT_SYSTEM_PROMPT: &str = r#"You are a friendly AI tutor and educational assistant. Your goal is to help students learn programming and other subjects in a simple, clear way.

Guidelines:
- Use simple, everyday language that anyone can understand
- Break down complex concepts into easy steps
- Give practical examples with code when relevant
- Be encouraging and supportive
- Ask follow-up questions to help students think
- Use analogies and real-world examples to explain difficult concepts
- End by asking if they need clarification or want to learn more"#;

/// System prompt for every structured action.
pub const STRUCTURED_SYSTEM_PROMPT: &str = r#"You are an expert educational assistant working inside a tutoring platform.

Respond with a single JSON value and nothing else:
- no markdown fences
- no commentary before or after the JSON
- use exactly the field names you are given
- scores are integers from 0 to 100"#;

/// A fully built prompt for one request.
#[derive(Debug, Clone, PartialEq)]
pub struct Prompt {
    pub system: &'static str,
    pub user: String,

    /// Per-action override of the configured token limit
    pub max_tokens: Option<u32>,

    /// Per-action override of the configured temperature
    pub temperature: Option<f32>,
}

impl Prompt {
    fn structured(user: String) -> Self {
        Self {
            system: STRUCTURED_SYSTEM_PROMPT,
            user,
            max_tokens: None,
            temperature: None,
        }
    }

    /// System and user messages, in order.
    pub fn messages(&self) -> Vec<ChatMessage> {
        vec![
            ChatMessage::system(self.system),
            ChatMessage::user(self.user.clone()),
        ]
    }

    /// `base` with this prompt's overrides applied.
    pub fn completion_config(&self, base: &CompletionConfig) -> CompletionConfig {
        CompletionConfig {
            max_tokens: self.max_tokens.unwrap_or(base.max_tokens),
            temperature: self.temperature.unwrap_or(base.temperature),
            ..base.clone()
        }
    }
}

/// Build the prompt for `request`.
pub fn build_prompt(request: &Request) -> Prompt {
    match request {
        Request::EvaluateAnswer(p) => {
            let expected = p
                .expected_answer()
                .unwrap_or_else(|| "(not provided)".to_string());
            Prompt::structured(format!(
                r#"Evaluate this student's answer.

Question: {question}
Question type: {kind}
Student answer: {answer}
Expected answer: {expected}
Topic: {topic}

Return JSON with these fields:
{{"score": 0-100, "isCorrect": true|false, "feedback": "string", "strengths": ["string"], "weaknesses": ["string"], "suggestions": ["string"], "conceptsUnderstood": ["string"], "conceptsMissed": ["string"], "difficulty": "string", "nextDifficulty": "beginner|intermediate|advanced", "timeToImprove": "string", "explanation": "string"}}"#,
                question = p.question,
                kind = p.kind,
                answer = p.answer,
                expected = expected,
                topic = p.topic.as_deref().unwrap_or("general"),
            ))
        }

        Request::GenerateQuestion(p) => {
            let previous = if p.previous_questions.is_empty() {
                "none".to_string()
            } else {
                bullet_list(&p.previous_questions)
            };
            Prompt::structured(format!(
                r#"Create one multiple-choice practice question.

Subject: {subject}
Difficulty: {difficulty}
Topic: {topic}
Questions already asked (do not repeat):
{previous}

Return JSON with these fields:
{{"question": "string", "type": "multiple-choice", "subject": "string", "difficulty": "string", "topic": "string", "options": ["4 strings"], "correctAnswer": index of the correct option, "explanation": "string", "learningObjectives": ["string"], "prerequisites": ["string"]}}"#,
                subject = p.subject,
                difficulty = p.difficulty,
                topic = p.topic.as_deref().unwrap_or(&p.subject),
                previous = previous,
            ))
        }

        Request::ProvideExplanation(p) => Prompt::structured(format!(
            r#"Explain this question to a student who answered it.

Question: {question}
Student answer: {answer}
Correct answer: {correct}

Return JSON with these fields:
{{"explanation": "string", "keyConcepts": ["string"], "examples": ["string"], "commonMistakes": ["string"], "practiceTips": ["string"], "nextSteps": "string"}}"#,
            question = p.question,
            answer = p.student_answer,
            correct = p.correct_answer.as_deref().unwrap_or("(not provided)"),
        )),

        Request::ConversationalTurn(p) => Prompt::structured(format!(
            r#"Continue this tutoring conversation.

Recent conversation:
{history}
Student: {message}

Return JSON with these fields:
{{"response": "string", "responseType": "explanation|question|encouragement|guidance", "suggestedQuestions": ["string"], "resources": ["string"], "confidenceLevel": "high|medium|low", "nextTopicSuggestion": "string"}}"#,
            history = recent_history(&p.conversation_history),
            message = p.student_message,
        )),

        Request::AnalyzeLearningPath(p) => Prompt::structured(format!(
            r#"Build a personalised learning path.

Student progress: {progress}
Subjects of interest: {subjects}

Return JSON with these fields:
{{"recommendedSubjects": [{{"subject": "string", "priority": "high|medium|low", "reason": "string"}}], "learningSequence": [{{"topic": "string", "difficulty": "string", "estimatedTime": "string"}}], "goals": ["string"], "studyTips": ["string"], "progressMilestones": ["string"]}}"#,
            progress = JsonValue::Object(p.student_progress.clone()),
            subjects = join_or(&p.subjects, "none given"),
        )),

        Request::AnalyzeErrors(p) => Prompt::structured(format!(
            r#"Analyse this student's mistakes in {subject}.

Errors:
{errors}

Return JSON with these fields:
{{"errorPatterns": [{{"pattern": "string", "frequency": "string", "rootCause": "string"}}], "targetedRemediation": [{{"errorType": "string", "remediationStrategy": "string", "practiceExercises": ["string"]}}], "learningGaps": ["string"], "recommendedFocus": ["string"], "encouragement": "string"}}"#,
            subject = p.subject,
            errors = if p.student_errors.is_empty() {
                "none recorded".to_string()
            } else {
                bullet_list(&p.student_errors)
            },
        )),

        Request::ProviderStatus => Prompt::structured(
            r#"Report which inference backends you can reach.

Return JSON with these fields:
{"providers": {"<name>": {"available": true|false, "type": "string"}}}"#
                .to_string(),
        ),

        Request::GenerateTest(p) => Prompt {
            max_tokens: Some(800),
            temperature: Some(0.4),
            ..Prompt::structured(format!(
                r#"Create {count} multiple choice questions about {topic} programming{difficulty}. Each question has exactly 4 options.

Format as JSON array with fields: question, options, correctAnswer (index of the correct option), explanation, difficulty, concepts"#,
                count = p.effective_count(),
                topic = p.topic,
                difficulty = p
                    .difficulty
                    .as_deref()
                    .map(|d| format!(" at {} level", d))
                    .unwrap_or_default(),
            ))
        },

        Request::Chat(p) => {
            let user = match p.context.as_deref().map(str::trim) {
                Some(context) if !context.is_empty() => {
                    format!("Context: {}\n\n{}", context, p.message)
                }
                _ => p.message.clone(),
            };
            Prompt {
                system: CHAT_SYSTEM_PROMPT,
                user,
                max_tokens: Some(500),
                temperature: Some(0.4),
            }
        }

        Request::SummarizeTest(p) => Prompt::structured(format!(
            r#"Summarise this test attempt{subject}.

Per-question results:
{results}
Time taken: {time}

Return JSON with these fields:
{{"overallScore": 0-100, "grade": "string", "performance": "string", "strongAreas": ["string"], "weakAreas": ["string"], "studyPlan": {{"immediate": ["string"], "shortTerm": ["string"], "longTerm": ["string"]}}, "nextSteps": ["string"], "estimatedStudyTime": "string", "recommendedCourses": ["string"], "skillLevel": "string"}}"#,
            subject = p
                .subject
                .as_deref()
                .map(|s| format!(" in {}", s))
                .unwrap_or_default(),
            results = outcome_lines(&p.results),
            time = p
                .time_taken_secs
                .map(|s| format!("{} seconds", s))
                .unwrap_or_else(|| "unknown".to_string()),
        )),
    }
}

fn recent_history(history: &[Exchange]) -> String {
    let start = history.len().saturating_sub(HISTORY_WINDOW);
    let lines: Vec<String> = history[start..]
        .iter()
        .map(|exchange| format!("Student: {}\nTutor: {}", exchange.student, exchange.tutor))
        .collect();

    if lines.is_empty() {
        "(none)".to_string()
    } else {
        lines.join("\n")
    }
}

fn outcome_lines(results: &[QuestionOutcome]) -> String {
    if results.is_empty() {
        return "(no questions answered)".to_string();
    }

    results
        .iter()
        .enumerate()
        .map(|(i, outcome)| {
            format!(
                "{}. score {} ({}); understood: {}; missed: {}",
                i + 1,
                outcome.score,
                if outcome.is_correct { "correct" } else { "incorrect" },
                join_or(&outcome.concepts_understood, "-"),
                join_or(&outcome.concepts_missed, "-"),
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn bullet_list(items: &[String]) -> String {
    items
        .iter()
        .map(|item| format!("- {}", item))
        .collect::<Vec<_>>()
        .join("\n")
}

fn join_or(items: &[String], empty: &str) -> String {
    if items.is_empty() {
        empty.to_string()
    } else {
        items.join(", ")
    }
}
