//! # mentor-runtime
//!
//! The external tiers of the tutoring cascade and the orchestrator that
//! chains them.
//!
//! `mentor-core` answers every request deterministically. This crate adds
//! the tiers tried before it: a local worker process and a hosted
//! chat-completions API. Whatever happens to them, a caller always gets a
//! [`CanonicalResult`](mentor_core::CanonicalResult) back.
//!
//! ## Example
//!
//! ```rust,ignore
//! use mentor_runtime::{FallbackOrchestrator, RuntimeConfig};
//!
//! let config = RuntimeConfig::from_yaml_file("mentor.yaml")?;
//! let orchestrator = FallbackOrchestrator::from_config(&config);
//!
//! let result = orchestrator
//!     .evaluate_answer("What is 2+2?", "4", "short-answer", None)
//!     .await;
//! println!("{} answered", result.provider);
//! ```

pub mod api;
pub mod config;
pub mod orchestrator;
pub mod prompts;
pub mod providers;
pub mod remote;
pub mod routing;
pub mod worker;

pub use config::{ConfigError, RemoteConfig, RuntimeConfig, WorkerConfig};
pub use orchestrator::{FallbackOrchestrator, FallbackOrchestratorBuilder};
pub use providers::{LlmProvider, ProviderError};
pub use remote::RemoteInferenceClient;
pub use routing::{RoutingConfig, Tier, TierPlan};
pub use worker::{SubprocessWorker, WorkerTransport};
