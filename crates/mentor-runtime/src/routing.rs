//! Tier routing.
//!
//! Which external tiers may answer which actions. The plan is computed once
//! when the orchestrator is built; the fallback tier is implicit and always
//! last.

use mentor_core::{Action, ProviderTag};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// An external tier of the cascade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Worker,
    Remote,
}

impl Tier {
    /// Tag carried by results this tier produced.
    pub fn provider_tag(&self) -> ProviderTag {
        match self {
            Tier::Worker => ProviderTag::Worker,
            Tier::Remote => ProviderTag::Remote,
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tier::Worker => write!(f, "worker"),
            Tier::Remote => write!(f, "remote"),
        }
    }
}

/// Actions each external tier is allowed to answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RoutingConfig {
    /// Actions sent to the subprocess worker
    pub worker: Vec<Action>,

    /// Actions sent to the hosted chat API
    pub remote: Vec<Action>,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            worker: vec![
                Action::EvaluateAnswer,
                Action::GenerateQuestion,
                Action::ProvideExplanation,
                Action::ConversationalTurn,
                Action::AnalyzeLearningPath,
                Action::AnalyzeErrors,
                Action::ProviderStatus,
            ],
            remote: vec![
                Action::Chat,
                Action::ConversationalTurn,
                Action::SummarizeTest,
                Action::GenerateTest,
                Action::EvaluateAnswer,
            ],
        }
    }
}

/// Ordered external tiers per action.
///
/// Order is always worker before remote. An action with no entry goes
/// straight to the fallback generator.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TierPlan {
    plan: BTreeMap<Action, Vec<Tier>>,
}

impl TierPlan {
    /// Build the plan. The worker tier is left out entirely when no worker is
    /// configured.
    pub fn new(routing: &RoutingConfig, worker_configured: bool) -> Self {
        let mut plan = BTreeMap::new();

        for action in Action::ALL {
            let mut tiers = Vec::with_capacity(2);
            if worker_configured && routing.worker.contains(&action) {
                tiers.push(Tier::Worker);
            }
            if routing.remote.contains(&action) {
                tiers.push(Tier::Remote);
            }
            plan.insert(action, tiers);
        }

        Self { plan }
    }

    /// External tiers to try for `action`, in order.
    pub fn tiers(&self, action: Action) -> &[Tier] {
        self.plan.get(&action).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Every action with its tiers, in action order.
    pub fn iter(&self) -> impl Iterator<Item = (Action, &[Tier])> {
        self.plan.iter().map(|(action, tiers)| (*action, tiers.as_slice()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_plan_with_worker() {
        let plan = TierPlan::new(&RoutingConfig::default(), true);

        assert_eq!(plan.tiers(Action::EvaluateAnswer), &[Tier::Worker, Tier::Remote]);
        assert_eq!(plan.tiers(Action::ConversationalTurn), &[Tier::Worker, Tier::Remote]);
        assert_eq!(plan.tiers(Action::GenerateQuestion), &[Tier::Worker]);
        assert_eq!(plan.tiers(Action::Chat), &[Tier::Remote]);
        assert_eq!(plan.tiers(Action::SummarizeTest), &[Tier::Remote]);
    }

    #[test]
    fn test_unconfigured_worker_is_omitted() {
        let plan = TierPlan::new(&RoutingConfig::default(), false);

        assert_eq!(plan.tiers(Action::EvaluateAnswer), &[Tier::Remote]);
        assert!(plan.tiers(Action::GenerateQuestion).is_empty());
        assert!(plan.iter().all(|(_, tiers)| !tiers.contains(&Tier::Worker)));
    }

    #[test]
    fn test_order_is_worker_first_regardless_of_config_order() {
        let routing = RoutingConfig {
            worker: vec![Action::Chat],
            remote: vec![Action::Chat],
        };
        let plan = TierPlan::new(&routing, true);
        assert_eq!(plan.tiers(Action::Chat), &[Tier::Worker, Tier::Remote]);
    }

    #[test]
    fn test_plan_covers_every_action() {
        let plan = TierPlan::new(&RoutingConfig::default(), true);
        assert_eq!(plan.iter().count(), Action::ALL.len());
    }

    #[test]
    fn test_routing_deserializes_wire_names_and_aliases() {
        let routing: RoutingConfig =
            serde_yaml::from_str("worker: [generate_question]\nremote: [chat]\n").unwrap();
        assert_eq!(routing.worker, vec![Action::GenerateQuestion]);
        assert_eq!(routing.remote, vec![Action::Chat]);
    }
}
