use serde::{Deserialize, Serialize};

/// What happens to a deleted or unloadable node's children.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrphanPolicy {
    /// Children are re-homed under the removed node's parent, keeping
    /// sibling order.
    #[default]
    ReparentToGrandparent,
    /// Children (and their subtrees) are removed along with the node.
    Discard,
}

/// Session-wide policy flags and tuning constants.
///
/// Deserialized from the host's settings. Toggling `shared_xp_pool` at
/// runtime does not migrate existing balances; old pool keys are simply
/// orphaned.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// One pool per faction instead of one per troop id.
    pub shared_xp_pool: bool,
    /// Gate on `ExperiencePools::refund`; when false refunds are no-ops.
    pub xp_refunds_enabled: bool,
    /// Per-kill credit is `(victim_tier + 1) * xp_per_tier`.
    pub xp_per_tier: f32,
    /// Fraction of roster daily experience credited to the pool.
    pub training_xp_multiplier: f32,
    pub orphan_policy: OrphanPolicy,
    /// Prefix cloned troop names with the faction name when the culture
    /// name cannot be substituted in place.
    pub faction_names: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            shared_xp_pool: false,
            xp_refunds_enabled: false,
            xp_per_tier: 2.5,
            training_xp_multiplier: 0.2,
            orphan_policy: OrphanPolicy::ReparentToGrandparent,
            faction_names: true,
        }
    }
}
