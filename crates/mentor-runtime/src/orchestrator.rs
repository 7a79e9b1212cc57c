//! The fallback cascade.
//!
//! [`FallbackOrchestrator::evaluate`] tries the external tiers planned for
//! the request's action, in order, and returns the first structurally valid
//! output. When every external tier fails (or none is planned) the
//! deterministic generator answers. The call cannot fail.
//!
//! ```text
//! request ──► worker ──fail──► remote ──fail──► fallback
//!               │                │                 │
//!               ▼                ▼                 ▼
//!        {provider: worker} {provider: remote} {provider: fallback, error}
//! ```

use std::sync::Arc;
use std::time::{Duration, Instant};

use mentor_core::{
    ActionOutput, CanonicalResult, DeterministicFallbackGenerator, ProviderTag, Request,
};

use crate::config::RuntimeConfig;
use crate::providers::{CompletionConfig, ProviderError};
use crate::remote::RemoteInferenceClient;
use crate::routing::{RoutingConfig, Tier, TierPlan};
use crate::worker::{SubprocessWorker, WorkerTransport};

/// Runs the worker → remote → fallback cascade.
///
/// Shared behind an `Arc`; calls are independent and hold no locks.
pub struct FallbackOrchestrator {
    worker: Option<Arc<dyn WorkerTransport>>,
    remote: RemoteInferenceClient,
    generator: DeterministicFallbackGenerator,
    plan: TierPlan,
    timeout: Duration,
}

impl std::fmt::Debug for FallbackOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FallbackOrchestrator")
            .field("worker", &self.worker.as_ref().map(|w| w.name().to_string()))
            .field("remote", &self.remote)
            .field("plan", &self.plan)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl FallbackOrchestrator {
    pub fn builder() -> FallbackOrchestratorBuilder {
        FallbackOrchestratorBuilder::default()
    }

    /// Build every tier from configuration.
    ///
    /// The remote credential is read here, once.
    pub fn from_config(config: &RuntimeConfig) -> Self {
        let mut builder = Self::builder()
            .timeout(config.timeout)
            .routing(config.routing.clone())
            .remote(RemoteInferenceClient::from_config(config));

        if let Some(worker) = &config.worker {
            builder = builder.worker(Arc::new(SubprocessWorker::from_config(worker, config.timeout)));
        }

        builder.build()
    }

    /// Answer `request`. Never fails.
    pub async fn evaluate(&self, request: &Request) -> CanonicalResult {
        let action = request.action();
        let mut last_error = None;

        for &tier in self.plan.tiers(action) {
            let start = Instant::now();
            tracing::debug!(action = %action, tier = %tier, "Attempting tier");

            match self.attempt(tier, request).await {
                Ok(data) => {
                    tracing::info!(
                        action = %action,
                        tier = %tier,
                        elapsed_ms = start.elapsed().as_millis() as u64,
                        "Tier answered"
                    );
                    return CanonicalResult::new(data, tier.provider_tag());
                }
                Err(e) => {
                    tracing::warn!(
                        action = %action,
                        tier = %tier,
                        kind = %e.kind(),
                        error = %e,
                        elapsed_ms = start.elapsed().as_millis() as u64,
                        "Tier failed, falling through"
                    );
                    last_error = Some(e.kind());
                }
            }
        }

        tracing::info!(action = %action, tier = "fallback", "Serving deterministic fallback");
        CanonicalResult::new(self.generator.generate(request), ProviderTag::Fallback)
            .with_error(last_error)
    }

    async fn attempt(&self, tier: Tier, request: &Request) -> Result<ActionOutput, ProviderError> {
        match tier {
            Tier::Worker => {
                let worker = self.worker.as_ref().ok_or_else(|| {
                    ProviderError::NotConfigured("no worker configured".to_string())
                })?;

                // The worker enforces the deadline itself; this only catches a
                // transport that does not.
                let budget = self.timeout + worker.reap_grace();
                let raw = tokio::time::timeout(budget, worker.invoke(request))
                    .await
                    .map_err(|_| ProviderError::Timeout(self.timeout))??;

                ActionOutput::from_value(request.action(), raw)
                    .map_err(|e| ProviderError::MalformedWorkerOutput(e.to_string()))
            }
            Tier::Remote => tokio::time::timeout(self.timeout, self.remote.invoke(request))
                .await
                .map_err(|_| ProviderError::Timeout(self.timeout))?,
        }
    }

    /// The tier plan fixed at construction.
    pub fn plan(&self) -> &TierPlan {
        &self.plan
    }

    /// Per-attempt budget.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn has_worker(&self) -> bool {
        self.worker.is_some()
    }

    pub fn remote(&self) -> &RemoteInferenceClient {
        &self.remote
    }
}

/// Builder for [`FallbackOrchestrator`].
///
/// Defaults: no worker, unconfigured remote, default routing, 30 s budget.
#[derive(Default)]
pub struct FallbackOrchestratorBuilder {
    worker: Option<Arc<dyn WorkerTransport>>,
    remote: Option<RemoteInferenceClient>,
    routing: Option<RoutingConfig>,
    generator: Option<DeterministicFallbackGenerator>,
    timeout: Option<Duration>,
}

impl FallbackOrchestratorBuilder {
    pub fn worker(mut self, worker: Arc<dyn WorkerTransport>) -> Self {
        self.worker = Some(worker);
        self
    }

    pub fn remote(mut self, remote: RemoteInferenceClient) -> Self {
        self.remote = Some(remote);
        self
    }

    pub fn routing(mut self, routing: RoutingConfig) -> Self {
        self.routing = Some(routing);
        self
    }

    pub fn generator(mut self, generator: DeterministicFallbackGenerator) -> Self {
        self.generator = Some(generator);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn build(self) -> FallbackOrchestrator {
        let timeout = self.timeout.unwrap_or(Duration::from_secs(30));
        let routing = self.routing.unwrap_or_default();
        let plan = TierPlan::new(&routing, self.worker.is_some());

        let remote = self.remote.unwrap_or_else(|| {
            RemoteInferenceClient::unconfigured(CompletionConfig {
                timeout,
                ..CompletionConfig::default()
            })
        });

        FallbackOrchestrator {
            worker: self.worker,
            remote,
            generator: self.generator.unwrap_or_default(),
            plan,
            timeout,
        }
    }
}
