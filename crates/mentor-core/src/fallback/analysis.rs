//! Explanations, learning paths, error analysis and provider status.

use std::collections::BTreeMap;

use super::stable_index;
use crate::request::{AnalyzeErrors, AnalyzeLearningPath, ProvideExplanation};
use crate::result::{
    BackendStatus, ErrorAnalysis, ErrorPattern, LearningPathPlan, LearningStep, ProviderStatusReport,
    Remediation, SubjectRecommendation, TutoringExplanation,
};

const ENCOURAGEMENTS: [&str; 3] = [
    "Keep practicing, you're making progress!",
    "Every mistake is a step toward understanding. You're on the right track.",
    "Mistakes show where to focus next. Keep going!",
];

pub(super) fn explain(req: &ProvideExplanation) -> TutoringExplanation {
    let question = req.question.trim();
    let student = req.student_answer.trim();

    let mut explanation = format!("Let's look at \"{}\" together. ", question);
    match req.correct_answer.as_deref().map(str::trim) {
        Some(expected) if expected.eq_ignore_ascii_case(student) && !student.is_empty() => {
            explanation.push_str(&format!(
                "Your answer \"{}\" is correct. Try explaining in your own words why it works.",
                student
            ));
        }
        Some(expected) if !expected.is_empty() => {
            if student.is_empty() {
                explanation.push_str(&format!("The expected answer is \"{}\". ", expected));
            } else {
                explanation.push_str(&format!(
                    "You answered \"{}\", while the expected answer is \"{}\". ",
                    student, expected
                ));
            }
            explanation.push_str(
                "Work through the question one step at a time and check where your \
                 reasoning leads somewhere different.",
            );
        }
        _ => {
            if !student.is_empty() {
                explanation.push_str(&format!("You answered \"{}\". ", student));
            }
            explanation.push_str(
                "Identify what the question is asking, list what you already know, \
                 and compare your reasoning against the key idea it tests.",
            );
        }
    }

    TutoringExplanation {
        explanation,
        key_concepts: vec![
            "Understand what the question asks".to_string(),
            "Apply the underlying rule step by step".to_string(),
        ],
        examples: vec![format!("Rework \"{}\" and check each step.", question)],
        common_mistakes: vec![
            "Skipping steps".to_string(),
            "Misreading the question".to_string(),
        ],
        practice_tips: vec![
            "Practice similar problems".to_string(),
            "Explain the solution out loud".to_string(),
        ],
        next_steps: "Try a similar question at the same difficulty.".to_string(),
    }
}

fn priority_for(score: f64) -> &'static str {
    match score {
        s if s < 60.0 => "high",
        s if s < 80.0 => "medium",
        _ => "low",
    }
}

fn difficulty_for(mean: f64) -> &'static str {
    match mean {
        m if m < 60.0 => "beginner",
        m if m < 80.0 => "intermediate",
        _ => "advanced",
    }
}

fn time_for(difficulty: &str) -> &'static str {
    match difficulty {
        "beginner" => "2 weeks",
        "intermediate" => "1-2 weeks",
        _ => "1 week",
    }
}

pub(super) fn learning_path(req: &AnalyzeLearningPath) -> LearningPathPlan {
    let mut scores: Vec<(String, f64)> = req
        .scores()
        .into_iter()
        .filter(|(_, score)| score.is_finite())
        .collect();

    let average_score = if scores.is_empty() {
        None
    } else {
        let mean = scores.iter().map(|(_, s)| s).sum::<f64>() / scores.len() as f64;
        Some((mean * 10.0).round() / 10.0)
    };

    // weakest first, ties by name
    scores.sort_by(|a, b| a.1.total_cmp(&b.1).then_with(|| a.0.cmp(&b.0)));

    let mut recommended: Vec<SubjectRecommendation> = scores
        .iter()
        .map(|(subject, score)| SubjectRecommendation {
            subject: subject.clone(),
            priority: priority_for(*score).to_string(),
            reason: format!("Current score is {:.0}", score),
        })
        .collect();

    for subject in &req.subjects {
        if !recommended.iter().any(|r| &r.subject == subject) {
            recommended.push(SubjectRecommendation {
                subject: subject.clone(),
                priority: "medium".to_string(),
                reason: "No progress recorded yet".to_string(),
            });
        }
    }

    if recommended.is_empty() {
        recommended.push(SubjectRecommendation {
            subject: "Foundations".to_string(),
            priority: "medium".to_string(),
            reason: "No progress recorded yet".to_string(),
        });
    }

    let difficulty = difficulty_for(average_score.unwrap_or(0.0));
    let learning_sequence = recommended
        .iter()
        .take(3)
        .map(|r| LearningStep {
            topic: r.subject.clone(),
            difficulty: difficulty.to_string(),
            estimated_time: time_for(difficulty).to_string(),
        })
        .collect();

    let focus = recommended[0].subject.clone();

    LearningPathPlan {
        average_score,
        recommended_subjects: recommended,
        learning_sequence,
        goals: vec![
            format!("Strengthen {}", focus),
            "Raise every subject above 80".to_string(),
        ],
        study_tips: vec![
            "Study in short, regular sessions".to_string(),
            "Review mistakes before moving on".to_string(),
        ],
        progress_milestones: vec![
            format!("Complete a practice set in {}", focus),
            "Retake an assessment after two weeks".to_string(),
        ],
    }
}

fn frequency_for(count: usize) -> &'static str {
    match count {
        0 => "none",
        1..=2 => "occasional",
        3..=5 => "frequent",
        _ => "persistent",
    }
}

pub(super) fn errors(req: &AnalyzeErrors) -> ErrorAnalysis {
    let subject = req.subject.trim();

    // distinct errors with their counts, in first-seen order
    let mut counts: Vec<(String, usize)> = Vec::new();
    for error in req.student_errors.iter().map(|e| e.trim()).filter(|e| !e.is_empty()) {
        match counts.iter_mut().find(|(seen, _)| seen.eq_ignore_ascii_case(error)) {
            Some((_, n)) => *n += 1,
            None => counts.push((error.to_string(), 1)),
        }
    }
    let total: usize = counts.iter().map(|(_, n)| n).sum();

    let mut error_patterns = Vec::new();
    let mut targeted_remediation = Vec::new();

    if counts.is_empty() {
        error_patterns.push(ErrorPattern {
            pattern: "No errors recorded".to_string(),
            frequency: frequency_for(0).to_string(),
            root_cause: "Not enough answers to analyze yet".to_string(),
        });
    } else {
        if counts.len() < total {
            error_patterns.push(ErrorPattern {
                pattern: "Repeated mistakes".to_string(),
                frequency: frequency_for(total - counts.len()).to_string(),
                root_cause: "The same misconception appears more than once".to_string(),
            });
        }
        for (error, n) in counts.iter().take(3) {
            error_patterns.push(ErrorPattern {
                pattern: error.clone(),
                frequency: frequency_for(*n).to_string(),
                root_cause: format!("Gap in {} fundamentals", subject),
            });
            targeted_remediation.push(Remediation {
                error_type: error.clone(),
                remediation_strategy: "Revisit the concept and work through guided examples"
                    .to_string(),
                practice_exercises: vec![format!("Three short exercises on: {}", error)],
            });
        }
    }

    if targeted_remediation.is_empty() {
        targeted_remediation.push(Remediation {
            error_type: "general".to_string(),
            remediation_strategy: "Practice more".to_string(),
            practice_exercises: vec!["Basic exercises".to_string()],
        });
    }

    let learning_gaps = if counts.is_empty() {
        vec!["Basic understanding".to_string()]
    } else {
        counts
            .iter()
            .take(3)
            .map(|(error, _)| format!("Understanding of: {}", error))
            .collect()
    };

    let seed = req.student_errors.join("\n");

    ErrorAnalysis {
        error_patterns,
        targeted_remediation,
        learning_gaps,
        recommended_focus: vec![
            format!("Fundamental {} concepts", subject),
            format!("Overall error rate: {}", frequency_for(total)),
        ],
        encouragement: ENCOURAGEMENTS[stable_index(&seed, ENCOURAGEMENTS.len())].to_string(),
    }
}

pub(super) fn provider_status() -> ProviderStatusReport {
    let mut providers = BTreeMap::new();
    providers.insert(
        "fallback".to_string(),
        BackendStatus {
            available: true,
            kind: "DeterministicFallbackGenerator".to_string(),
        },
    );
    ProviderStatusReport { providers }
}
