//! JSON Schema validation for tier outputs.
//!
//! Each action has a schema under `schemas/<wire-name>.schema.json`. They are
//! embedded at compile time and compiled once on first use.

use std::collections::BTreeMap;
use std::sync::OnceLock;
use thiserror::Error;

use crate::action::Action;

const EVALUATE_ANSWER: &str = include_str!("../schemas/evaluate_answer.schema.json");
const GENERATE_QUESTION: &str = include_str!("../schemas/generate_adaptive_question.schema.json");
const PROVIDE_EXPLANATION: &str =
    include_str!("../schemas/provide_tutoring_explanation.schema.json");
const CONVERSATIONAL_TURN: &str = include_str!("../schemas/conversational_tutoring.schema.json");
const ANALYZE_LEARNING_PATH: &str = include_str!("../schemas/analyze_learning_path.schema.json");
const ANALYZE_ERRORS: &str = include_str!("../schemas/analyze_errors.schema.json");
const PROVIDER_STATUS: &str = include_str!("../schemas/get_provider_status.schema.json");
const GENERATE_TEST: &str = include_str!("../schemas/generate_test.schema.json");
const CHAT: &str = include_str!("../schemas/chat.schema.json");
const SUMMARIZE_TEST: &str = include_str!("../schemas/summarize_test.schema.json");

type Compiled = BTreeMap<Action, Result<jsonschema::Validator, String>>;

/// Compiled validators, one per action (initialized once, reused).
static COMPILED_SCHEMAS: OnceLock<Compiled> = OnceLock::new();

/// Errors from schema loading.
#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("Failed to load schema for {action}: {message}")]
    LoadError { action: Action, message: String },
}

/// Raw schema text for an action.
pub fn schema_source(action: Action) -> &'static str {
    match action {
        Action::EvaluateAnswer => EVALUATE_ANSWER,
        Action::GenerateQuestion => GENERATE_QUESTION,
        Action::ProvideExplanation => PROVIDE_EXPLANATION,
        Action::ConversationalTurn => CONVERSATIONAL_TURN,
        Action::AnalyzeLearningPath => ANALYZE_LEARNING_PATH,
        Action::AnalyzeErrors => ANALYZE_ERRORS,
        Action::ProviderStatus => PROVIDER_STATUS,
        Action::GenerateTest => GENERATE_TEST,
        Action::Chat => CHAT,
        Action::SummarizeTest => SUMMARIZE_TEST,
    }
}

fn compile(source: &str) -> Result<jsonschema::Validator, String> {
    let schema_value: serde_json::Value = match serde_json::from_str(source) {
        Ok(v) => v,
        Err(e) => return Err(format!("Invalid schema JSON: {}", e)),
    };

    match jsonschema::options().build(&schema_value) {
        Ok(v) => Ok(v),
        Err(e) => Err(format!("Failed to compile schema: {}", e)),
    }
}

/// Get or initialize the compiled validator for an action.
fn get_validator(action: Action) -> Result<&'static jsonschema::Validator, SchemaError> {
    let compiled = COMPILED_SCHEMAS.get_or_init(|| {
        Action::ALL
            .iter()
            .map(|&action| {
                let compiled = compile(schema_source(action));
                if let Err(e) = &compiled {
                    tracing::error!(action = %action, error = %e, "Embedded schema failed to compile");
                }
                (action, compiled)
            })
            .collect()
    });

    match compiled.get(&action) {
        Some(Ok(v)) => Ok(v),
        Some(Err(e)) => Err(SchemaError::LoadError {
            action,
            message: e.clone(),
        }),
        None => Err(SchemaError::LoadError {
            action,
            message: "no schema registered".to_string(),
        }),
    }
}

/// Validate a tier's JSON output against the action's schema.
///
/// Returns every violation as `"<message> at <instance path>"`.
pub fn validate_output(action: Action, value: &serde_json::Value) -> Result<(), Vec<String>> {
    let validator = get_validator(action).map_err(|e| vec![e.to_string()])?;

    let errors: Vec<String> = validator
        .iter_errors(value)
        .map(|e| format!("{} at {}", e, e.instance_path))
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Check that every embedded schema compiles.
pub fn check_schemas() -> Result<(), SchemaError> {
    for action in Action::ALL {
        get_validator(action)?;
    }
    Ok(())
}
