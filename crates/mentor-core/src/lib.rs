//! # mentor-core
//!
//! Deterministic building blocks of the tutoring inference cascade.
//!
//! This crate has no I/O. It defines:
//! - the [`Action`] discriminator and typed [`Request`] payloads
//! - the [`CanonicalResult`] every caller receives, with typed outputs
//! - per-action JSON Schemas that external tier output must satisfy
//! - the [`DeterministicFallbackGenerator`], the cascade's terminal tier
//!
//! ## Key Guarantees
//!
//! 1. **Total**: the fallback generator answers every request and never fails
//! 2. **Pure**: same request, same output
//! 3. **Single normalisation path**: [`ActionOutput::from_value`] is how raw
//!    worker or model JSON becomes a typed output
//!
//! ## Example
//!
//! ```rust
//! use mentor_core::{DeterministicFallbackGenerator, Request};
//! use mentor_core::request::EvaluateAnswer;
//!
//! let request = Request::EvaluateAnswer(EvaluateAnswer::new("2+2?", "4").with_correct_answer("4"));
//! let output = DeterministicFallbackGenerator::new().generate(&request);
//! assert_eq!(output.action(), request.action());
//! ```

pub mod action;
pub mod fallback;
pub mod request;
pub mod result;
pub mod schema;

pub use action::{Action, UnknownAction};
pub use fallback::DeterministicFallbackGenerator;
pub use request::Request;
pub use result::{ActionOutput, CanonicalResult, ErrorKind, NormalizeError, ProviderTag};
pub use schema::SchemaError;
