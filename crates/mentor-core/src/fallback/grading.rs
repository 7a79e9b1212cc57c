//! Answer grading and test summaries.

use crate::request::{EvaluateAnswer, SummarizeTest};
use crate::result::{clamp_score, AnswerEvaluation, StudyPlan, TestSummary};

/// How a student's answer relates to the reference answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreBand {
    /// Equal after trimming and lowercasing
    Exact,
    /// One contains the other
    Partial,
    /// Non-empty, but unrelated (or nothing to compare against)
    Attempted,
    /// Nothing submitted
    Empty,
}

impl ScoreBand {
    /// Classify `answer` against an optional `expected` answer.
    pub fn classify(answer: &str, expected: Option<&str>) -> Self {
        let answer = answer.trim().to_lowercase();
        if answer.is_empty() {
            return ScoreBand::Empty;
        }

        let expected = match expected.map(|e| e.trim().to_lowercase()) {
            Some(e) if !e.is_empty() => e,
            _ => return ScoreBand::Attempted,
        };

        if answer == expected {
            ScoreBand::Exact
        } else if answer.contains(&expected) || expected.contains(&answer) {
            ScoreBand::Partial
        } else {
            ScoreBand::Attempted
        }
    }

    pub fn score(&self) -> u8 {
        match self {
            ScoreBand::Exact => 100,
            ScoreBand::Partial => 60,
            ScoreBand::Attempted => 30,
            ScoreBand::Empty => 0,
        }
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

pub(super) fn evaluate_answer(req: &EvaluateAnswer) -> AnswerEvaluation {
    let expected = req.expected_answer();
    let band = ScoreBand::classify(&req.answer, expected.as_deref());

    let feedback = match (band, expected.is_some()) {
        (ScoreBand::Exact, _) => "Excellent! Your answer is completely correct.",
        (ScoreBand::Partial, _) => {
            "Your answer shows some understanding but needs refinement. \
             Review the correct answer for complete accuracy."
        }
        (ScoreBand::Attempted, true) => {
            "Your answer shows effort but doesn't match the expected response. \
             Please review the concept and try again."
        }
        (ScoreBand::Attempted, false) => {
            "Thanks for your answer. It could not be checked against a reference \
             right now, so review the concept and compare your reasoning."
        }
        (ScoreBand::Empty, _) => {
            "No answer provided. Make sure to attempt all questions for better learning outcomes."
        }
    };

    let (strengths, weaknesses, suggestions, understood, missed) = match band {
        ScoreBand::Exact => (
            strings(&["Correct understanding", "Good knowledge retention"]),
            vec![],
            strings(&["Continue practicing similar problems", "Try more advanced questions"]),
            strings(&["Core concept mastery", "Practical application"]),
            vec![],
        ),
        ScoreBand::Partial => (
            strings(&["Shows basic understanding", "Attempted the question"]),
            strings(&["Needs more precision", "Review key details"]),
            strings(&[
                "Review the correct answer carefully",
                "Practice similar questions",
                "Focus on key terminology",
            ]),
            strings(&["Basic concept recognition"]),
            strings(&["Detailed understanding", "Precise terminology"]),
        ),
        ScoreBand::Attempted => (
            strings(&["Attempted the question"]),
            strings(&["Concept understanding needed", "Review fundamental principles"]),
            strings(&[
                "Study the topic thoroughly",
                "Practice basic concepts",
                "Seek additional resources",
            ]),
            vec![],
            strings(&["Fundamental concept", "Core principles", "Basic terminology"]),
        ),
        ScoreBand::Empty => (
            vec![],
            strings(&["Concept understanding needed", "Review fundamental principles"]),
            strings(&[
                "Study the topic thoroughly",
                "Practice basic concepts",
                "Seek additional resources",
            ]),
            vec![],
            strings(&["Fundamental concept", "Core principles", "Basic terminology"]),
        ),
    };

    let (difficulty, next_difficulty, time_to_improve) = match band {
        ScoreBand::Exact => ("Medium", "advanced", "Continue current pace"),
        ScoreBand::Partial => ("Medium", "intermediate", "2-4 hours"),
        ScoreBand::Attempted | ScoreBand::Empty => ("Hard", "beginner", "4-6 hours"),
    };

    let explanation = match (&expected, band) {
        (Some(expected), ScoreBand::Exact) => format!("\"{}\" is the expected answer.", expected),
        (Some(expected), _) => format!("The expected answer is \"{}\".", expected),
        (None, _) => String::new(),
    };

    AnswerEvaluation {
        score: band.score(),
        is_correct: band == ScoreBand::Exact,
        feedback: feedback.to_string(),
        strengths,
        weaknesses,
        suggestions,
        concepts_understood: understood,
        concepts_missed: missed,
        difficulty: difficulty.to_string(),
        next_difficulty: next_difficulty.to_string(),
        time_to_improve: time_to_improve.to_string(),
        explanation,
    }
}

/// Letter grade for a mean score.
pub fn grade_for(score: f64) -> &'static str {
    match score {
        s if s >= 95.0 => "A+",
        s if s >= 90.0 => "A",
        s if s >= 85.0 => "B+",
        s if s >= 80.0 => "B",
        s if s >= 75.0 => "C+",
        s if s >= 70.0 => "C",
        s if s >= 60.0 => "D",
        _ => "F",
    }
}

fn performance_for(score: f64) -> &'static str {
    match score {
        s if s >= 90.0 => "Excellent",
        s if s >= 80.0 => "Good",
        s if s >= 70.0 => "Average",
        s if s >= 60.0 => "Below Average",
        _ => "Poor",
    }
}

fn skill_level_for(score: f64) -> &'static str {
    match score {
        s if s >= 85.0 => "Advanced",
        s if s >= 70.0 => "Intermediate",
        _ => "Beginner",
    }
}

fn study_time_for(score: f64) -> &'static str {
    match score {
        s if s >= 80.0 => "3-5 hours per week",
        s if s >= 60.0 => "5-8 hours per week",
        _ => "8-12 hours per week",
    }
}

/// Distinct entries in first-seen order.
fn dedup_in_order<'a>(items: impl Iterator<Item = &'a String>) -> Vec<String> {
    let mut seen: Vec<String> = Vec::new();
    for item in items {
        if !seen.contains(item) {
            seen.push(item.clone());
        }
    }
    seen
}

pub(super) fn summarize_test(req: &SummarizeTest) -> TestSummary {
    let mean = if req.results.is_empty() {
        0.0
    } else {
        let total: f64 = req
            .results
            .iter()
            .map(|r| if r.score.is_finite() { r.score } else { 0.0 })
            .sum();
        total / req.results.len() as f64
    };

    let strong = dedup_in_order(req.results.iter().flat_map(|r| &r.concepts_understood));
    let weak = dedup_in_order(req.results.iter().flat_map(|r| &r.concepts_missed));

    let strong_areas = if strong.is_empty() {
        strings(&["Basic understanding demonstrated"])
    } else {
        strong
    };
    let weak_areas = if weak.is_empty() {
        strings(&["Continue practicing for improvement"])
    } else {
        weak
    };

    let recommended_courses = match req.subject.as_deref() {
        Some(subject) if !subject.trim().is_empty() => vec![
            format!("{} Fundamentals Review", subject.trim()),
            "Advanced Practice Sessions".to_string(),
            "Concept Mastery Workshop".to_string(),
        ],
        _ => strings(&[
            "Fundamentals Review Course",
            "Advanced Practice Sessions",
            "Concept Mastery Workshop",
        ]),
    };

    TestSummary {
        overall_score: clamp_score(mean),
        grade: grade_for(mean).to_string(),
        performance: performance_for(mean).to_string(),
        strong_areas,
        weak_areas,
        study_plan: Some(StudyPlan {
            immediate: strings(&[
                "Review all incorrect answers carefully",
                "Focus on missed concepts identified in analysis",
                "Practice similar questions in weak areas",
            ]),
            short_term: strings(&[
                "Complete additional practice tests",
                "Study recommended topics systematically",
                "Seek help for challenging concepts",
            ]),
            long_term: strings(&[
                "Build comprehensive understanding of the subject",
                "Apply knowledge through practical projects",
                "Prepare for advanced level assessments",
            ]),
        }),
        next_steps: strings(&[
            "Review detailed feedback for each question",
            "Create a focused study schedule",
            "Practice regularly with similar questions",
            "Track your progress over time",
        ]),
        estimated_study_time: study_time_for(mean).to_string(),
        recommended_courses,
        skill_level: skill_level_for(mean).to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::QuestionOutcome;
    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn test_exact_match_scores_full_marks() {
        let req = EvaluateAnswer::new("2+2?", "4").with_correct_answer("4");
        let eval = evaluate_answer(&req);
        assert_eq!(eval.score, 100);
        assert!(eval.is_correct);
        assert_eq!(eval.next_difficulty, "advanced");
    }

    #[test]
    fn test_match_ignores_case_and_whitespace() {
        let req = EvaluateAnswer::new("Capital of France?", "  paris ").with_correct_answer("Paris");
        assert_eq!(evaluate_answer(&req).score, 100);
    }

    #[test]
    fn test_partial_match_either_direction() {
        let longer = EvaluateAnswer::new("q", "it is paris").with_correct_answer("Paris");
        let shorter = EvaluateAnswer::new("q", "par").with_correct_answer("Paris");
        assert_eq!(evaluate_answer(&longer).score, 60);
        assert_eq!(evaluate_answer(&shorter).score, 60);
        assert!(!evaluate_answer(&longer).is_correct);
    }

    #[test]
    fn test_unrelated_and_empty_answers() {
        let wrong = EvaluateAnswer::new("q", "london").with_correct_answer("Paris");
        let empty = EvaluateAnswer::new("q", "   ").with_correct_answer("Paris");
        assert_eq!(evaluate_answer(&wrong).score, 30);
        assert_eq!(evaluate_answer(&empty).score, 0);
        assert!(evaluate_answer(&empty).strengths.is_empty());
    }

    #[test]
    fn test_no_reference_answer() {
        let answered = EvaluateAnswer::new("Explain gravity", "things fall");
        let blank = EvaluateAnswer::new("Explain gravity", "");
        assert_eq!(evaluate_answer(&answered).score, 30);
        assert_eq!(evaluate_answer(&blank).score, 0);
        assert!(evaluate_answer(&answered).explanation.is_empty());
    }

    #[test]
    fn test_reference_answer_from_context_options() {
        let mut req = EvaluateAnswer::new("2+3?", "5");
        req.context = Some(json!({"options": ["4", "5", "6"], "correctAnswer": 1}));
        assert_eq!(evaluate_answer(&req).score, 100);
    }

    #[test]
    fn test_grade_boundaries() {
        assert_eq!(grade_for(95.0), "A+");
        assert_eq!(grade_for(94.9), "A");
        assert_eq!(grade_for(85.0), "B+");
        assert_eq!(grade_for(80.0), "B");
        assert_eq!(grade_for(75.0), "C+");
        assert_eq!(grade_for(70.0), "C");
        assert_eq!(grade_for(60.0), "D");
        assert_eq!(grade_for(59.9), "F");
    }

    #[test]
    fn test_summary_of_mixed_results() {
        let req = SummarizeTest {
            subject: None,
            results: vec![
                QuestionOutcome {
                    score: 100.0,
                    is_correct: true,
                    concepts_understood: vec!["Loops".into()],
                    concepts_missed: vec![],
                },
                QuestionOutcome {
                    score: 60.0,
                    is_correct: false,
                    concepts_understood: vec!["Loops".into(), "Arrays".into()],
                    concepts_missed: vec!["Closures".into()],
                },
            ],
            time_taken_secs: Some(300),
        };

        let summary = summarize_test(&req);
        assert_eq!(summary.overall_score, 80);
        assert_eq!(summary.grade, "B");
        assert_eq!(summary.performance, "Good");
        assert_eq!(summary.skill_level, "Intermediate");
        assert_eq!(summary.estimated_study_time, "3-5 hours per week");
        assert_eq!(summary.strong_areas, vec!["Loops", "Arrays"]);
        assert_eq!(summary.weak_areas, vec!["Closures"]);
    }

    #[test]
    fn test_empty_summary_is_an_f() {
        let summary = summarize_test(&SummarizeTest::default());
        assert_eq!(summary.overall_score, 0);
        assert_eq!(summary.grade, "F");
        assert_eq!(summary.weak_areas, vec!["Continue practicing for improvement"]);
    }

    proptest! {
        #[test]
        fn prop_score_is_one_of_the_bands(answer in ".{0,24}", expected in proptest::option::of(".{0,24}")) {
            let mut req = EvaluateAnswer::new("q", answer);
            req.correct_answer = expected;
            let eval = evaluate_answer(&req);
            prop_assert!([0u8, 30, 60, 100].contains(&eval.score));
            prop_assert_eq!(eval.is_correct, eval.score == 100);
        }

        #[test]
        fn prop_matching_answer_scores_100(expected in "[a-zA-Z0-9]{1,16}") {
            let req = EvaluateAnswer::new("q", format!("  {}  ", expected.to_uppercase()))
                .with_correct_answer(expected);
            prop_assert_eq!(evaluate_answer(&req).score, 100);
        }

        #[test]
        fn prop_summary_score_stays_in_range(scores in proptest::collection::vec(-50.0f64..150.0, 0..12)) {
            let req = SummarizeTest {
                results: scores
                    .into_iter()
                    .map(|score| QuestionOutcome { score, ..Default::default() })
                    .collect(),
                ..Default::default()
            };
            prop_assert!(summarize_test(&req).overall_score <= 100);
        }
    }
}
