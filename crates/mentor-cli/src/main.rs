//! `mentor`: run tutoring requests through the inference cascade.
//!
//! The canonical result is printed to stdout as JSON; logs go to stderr.
//!
//! ```bash
//! # Any request, as JSON text, @file or stdin
//! mentor run '{"action":"chat","message":"what is a closure?"}'
//! mentor --config mentor.yaml run @request.json
//!
//! # Shortcuts
//! mentor evaluate-answer --question "2+2?" --answer 4 --correct-answer 4
//! mentor generate-question --subject math --difficulty easy
//! mentor chat "how do python lists work?"
//!
//! # Show which tiers answer which action
//! mentor plan
//! ```

use std::io::Read;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use mentor_core::request::{Chat, EvaluateAnswer, GenerateQuestion};
use mentor_core::{CanonicalResult, Request};
use mentor_runtime::{FallbackOrchestrator, RuntimeConfig};

#[derive(Parser, Debug)]
#[command(name = "mentor", author, version, about, long_about = None)]
struct Cli {
    /// YAML runtime configuration (defaults apply when omitted)
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    /// Pretty-print the JSON result
    #[arg(long, global = true, default_value_t = false)]
    pretty: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a request given as JSON text, `@file`, or `-` for stdin
    Run {
        request: String,
    },

    /// Grade an answer
    EvaluateAnswer {
        #[arg(long)]
        question: String,

        #[arg(long)]
        answer: String,

        #[arg(long)]
        correct_answer: Option<String>,

        /// Question type
        #[arg(long = "type", default_value = "short-answer")]
        kind: String,

        #[arg(long)]
        topic: Option<String>,
    },

    /// Produce a practice question
    GenerateQuestion {
        #[arg(long, default_value = "Mathematics")]
        subject: String,

        #[arg(long, default_value = "intermediate")]
        difficulty: String,

        #[arg(long)]
        topic: Option<String>,

        /// Question already asked (repeatable)
        #[arg(long = "previous")]
        previous: Vec<String>,
    },

    /// Free-form chat with the tutor
    Chat {
        message: String,

        #[arg(long)]
        context: Option<String>,
    },

    /// Print the tier plan for every action
    Plan,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("mentor=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    mentor_core::schema::check_schemas().context("Embedded response schemas failed to compile")?;

    let config = match &cli.config {
        Some(path) => RuntimeConfig::from_yaml_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => RuntimeConfig::default(),
    };

    let orchestrator = FallbackOrchestrator::from_config(&config);

    let request = match cli.command {
        Command::Plan => {
            print_plan(&orchestrator);
            return Ok(());
        }
        Command::Run { request } => read_request(&request)?,
        Command::EvaluateAnswer {
            question,
            answer,
            correct_answer,
            kind,
            topic,
        } => Request::EvaluateAnswer(EvaluateAnswer {
            kind,
            correct_answer,
            topic,
            ..EvaluateAnswer::new(question, answer)
        }),
        Command::GenerateQuestion {
            subject,
            difficulty,
            topic,
            previous,
        } => Request::GenerateQuestion(GenerateQuestion {
            subject,
            difficulty,
            topic,
            previous_questions: previous,
        }),
        Command::Chat { message, context } => Request::Chat(Chat { message, context }),
    };

    let result = orchestrator.evaluate(&request).await;
    print_result(&result, cli.pretty)
}

/// Parse a request from inline JSON, `@path`, or `-` (stdin).
fn read_request(source: &str) -> Result<Request> {
    let text = if source == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read request from stdin")?;
        buf
    } else if let Some(path) = source.strip_prefix('@') {
        std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path))?
    } else {
        source.to_string()
    };

    if text.trim().is_empty() {
        bail!("Request is empty");
    }

    Request::from_json(&text).context("Invalid request JSON")
}

fn print_result(result: &CanonicalResult, pretty: bool) -> Result<()> {
    let json = if pretty {
        serde_json::to_string_pretty(result)
    } else {
        serde_json::to_string(result)
    }
    .context("Failed to serialize result")?;

    println!("{}", json);
    Ok(())
}

fn print_plan(orchestrator: &FallbackOrchestrator) {
    println!("timeout: {:?}", orchestrator.timeout());
    println!(
        "remote: {}",
        orchestrator.remote().provider_name().unwrap_or("unconfigured")
    );

    for (action, tiers) in orchestrator.plan().iter() {
        let mut chain: Vec<String> = tiers.iter().map(ToString::to_string).collect();
        chain.push("fallback".to_string());
        println!("{:<30} {}", action.wire_name(), chain.join(" -> "));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use mentor_core::Action;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_read_inline_request() {
        let request = read_request(r#"{"action": "chat", "message": "hi"}"#).unwrap();
        assert_eq!(request.action(), Action::Chat);
    }

    #[test]
    fn test_read_request_rejects_garbage() {
        assert!(read_request("").is_err());
        assert!(read_request(r#"{"action": "teleport"}"#).is_err());
        assert!(read_request("@/nonexistent/request.json").is_err());
    }

    #[test]
    fn test_parse_evaluate_answer() {
        let cli = Cli::parse_from([
            "mentor",
            "--pretty",
            "evaluate-answer",
            "--question",
            "2+2?",
            "--answer",
            "4",
            "--correct-answer",
            "4",
        ]);
        assert!(cli.pretty);
        match cli.command {
            Command::EvaluateAnswer { kind, correct_answer, .. } => {
                assert_eq!(kind, "short-answer");
                assert_eq!(correct_answer.as_deref(), Some("4"));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
