// ABOUTME: Custom serde deserializers for config types.
// ABOUTME: Rejects an empty rollout list with a readable message.

use nonempty::NonEmpty;
use serde::Deserialize;

use super::RolloutPlan;

pub fn deserialize_rollouts<'de, D>(deserializer: D) -> Result<NonEmpty<RolloutPlan>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let plans: Vec<RolloutPlan> = Vec::deserialize(deserializer)?;
    NonEmpty::from_vec(plans)
        .ok_or_else(|| serde::de::Error::custom("at least one rollout is required"))
}
