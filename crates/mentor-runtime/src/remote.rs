//! Remote inference tier.
//!
//! Wraps one [`LlmProvider`] built at startup. When no credential was found
//! the client is still constructed, and every call returns
//! [`ProviderError::NotConfigured`] without touching the network.

use mentor_core::{Action, ActionOutput, Request};
use serde_json::{json, Value as JsonValue};
use std::sync::Arc;

use crate::config::RuntimeConfig;
use crate::prompts::build_prompt;
use crate::providers::{CompletionConfig, LlmProvider, ProviderError};

/// Client for the hosted chat-completions tier.
#[derive(Clone)]
pub struct RemoteInferenceClient {
    provider: Option<Arc<dyn LlmProvider>>,
    completion: CompletionConfig,
}

impl std::fmt::Debug for RemoteInferenceClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteInferenceClient")
            .field("provider", &self.provider.as_ref().map(|p| p.name().to_string()))
            .field("model", &self.completion.model)
            .finish()
    }
}

impl RemoteInferenceClient {
    /// Client around an already-built provider.
    pub fn new(provider: Arc<dyn LlmProvider>, completion: CompletionConfig) -> Self {
        Self {
            provider: Some(provider),
            completion,
        }
    }

    /// Client with no provider; every call fails fast.
    pub fn unconfigured(completion: CompletionConfig) -> Self {
        Self {
            provider: None,
            completion,
        }
    }

    /// Build from configuration, reading the API key from the environment
    /// exactly once.
    #[cfg(feature = "remote")]
    pub fn from_config(config: &RuntimeConfig) -> Self {
        use crate::providers::{ApiCredential, ChatCompletionsProvider};

        let completion = config.completion_config();
        let remote = &config.remote;

        let credential = match ApiCredential::from_env(&remote.api_key_env, "Remote inference API key") {
            Ok(credential) => credential,
            Err(e) => {
                tracing::info!(error = %e, "Remote tier disabled");
                return Self::unconfigured(completion);
            }
        };

        tracing::debug!(
            credential = credential.name(),
            source = %credential.source(),
            env = %remote.api_key_env,
            "Remote credential loaded"
        );

        let mut builder = ChatCompletionsProvider::builder(credential)
            .base_url(remote.base_url.as_str())
            .timeout(config.timeout);
        if let Some(referer) = &remote.referer {
            builder = builder.referer(referer.as_str());
        }
        if let Some(title) = &remote.title {
            builder = builder.title(title.as_str());
        }

        match builder.build() {
            Ok(provider) => {
                tracing::debug!(base_url = %provider.base_url(), model = %completion.model, "Remote tier configured");
                Self::new(Arc::new(provider), completion)
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to build remote provider");
                Self::unconfigured(completion)
            }
        }
    }

    /// Without the `remote` feature there is no HTTP provider to build.
    #[cfg(not(feature = "remote"))]
    pub fn from_config(config: &RuntimeConfig) -> Self {
        tracing::debug!("Built without the remote feature; remote tier disabled");
        Self::unconfigured(config.completion_config())
    }

    /// Whether a provider is present.
    pub fn is_configured(&self) -> bool {
        self.provider.is_some()
    }

    /// Name of the underlying provider, if any.
    pub fn provider_name(&self) -> Option<&str> {
        self.provider.as_ref().map(|p| p.name())
    }

    /// One upstream call for `request`, normalised into the action's output.
    pub async fn invoke(&self, request: &Request) -> Result<ActionOutput, ProviderError> {
        let provider = self.provider.as_ref().ok_or_else(|| {
            ProviderError::NotConfigured("remote inference API key not set".to_string())
        })?;

        let prompt = build_prompt(request);
        let config = prompt.completion_config(&self.completion);
        let response = provider.complete(prompt.messages(), &config).await?;

        tracing::debug!(
            action = %request.action(),
            model = %response.model,
            tokens = response.usage.total(),
            "Remote completion received"
        );

        parse_output(request, &response.content)
    }
}

/// Turn model text into the typed output for `request`'s action.
fn parse_output(request: &Request, content: &str) -> Result<ActionOutput, ProviderError> {
    let action = request.action();
    let content = content.trim();

    let value = if action.is_free_text() {
        json!({ "response": content })
    } else if let Request::GenerateTest(test) = request {
        let value = extract_json(content, '[', ']')
            .or_else(|| extract_json(content, '{', '}'))
            .ok_or_else(|| no_json(action))?;
        wrap_test(value, &test.topic)
    } else {
        extract_json(content, '{', '}').ok_or_else(|| no_json(action))?
    };

    ActionOutput::from_value(action, value).map_err(|e| ProviderError::ParseError(e.to_string()))
}

fn no_json(action: Action) -> ProviderError {
    ProviderError::ParseError(format!("no JSON found in {} model output", action))
}

/// Parse `content` as JSON, or failing that the slice from the first `open`
/// to the last `close`.
fn extract_json(content: &str, open: char, close: char) -> Option<JsonValue> {
    if let Ok(value) = serde_json::from_str::<JsonValue>(content) {
        let matches = match open {
            '[' => value.is_array(),
            _ => value.is_object(),
        };
        if matches {
            return Some(value);
        }
    }

    let start = content.find(open)?;
    let end = content.rfind(close)?;
    if end <= start {
        return None;
    }
    serde_json::from_str(&content[start..=end]).ok()
}

/// A bare question array becomes a test; questions without an id get their
/// 1-based position.
fn wrap_test(value: JsonValue, topic: &str) -> JsonValue {
    let mut test = match value {
        JsonValue::Array(questions) => json!({
            "title": format!("{} Test", topic),
            "description": format!("Multiple choice questions about {}", topic),
            "questions": questions,
        }),
        other => other,
    };

    if let Some(questions) = test.get_mut("questions").and_then(JsonValue::as_array_mut) {
        for (i, question) in questions.iter_mut().enumerate() {
            if let Some(object) = question.as_object_mut() {
                object.entry("id").or_insert_with(|| json!(i + 1));
            }
        }
    }

    test
}
