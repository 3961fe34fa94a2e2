use std::collections::BTreeMap;

use crate::config::Config;

/// Resolve the pool key for a unit under the current key policy: one pool
/// per unit id, or one shared pool per faction.
///
/// Toggling the policy at runtime orphans balances under the old keys; they
/// are kept but no longer read. This is documented behavior, not migrated.
pub fn pool_key(config: &Config, unit_id: &str, faction_id: &str) -> String {
    if config.shared_xp_pool {
        format!("shared:{faction_id}")
    } else {
        unit_id.to_string()
    }
}

/// Experience currency gating customization actions.
///
/// Balances are non-negative, created lazily on first credit and never
/// deleted, only zeroed.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ExperiencePools {
    balances: BTreeMap<String, u32>,
}

impl ExperiencePools {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> u32 {
        self.balances.get(key).copied().unwrap_or(0)
    }

    pub fn add(&mut self, key: &str, amount: u32) {
        if amount == 0 {
            return;
        }
        *self.balances.entry(key.to_string()).or_insert(0) += amount;
    }

    /// Debit only when the balance covers `amount`; otherwise false and the
    /// balance is unchanged.
    pub fn try_spend(&mut self, key: &str, amount: u32) -> bool {
        if amount == 0 {
            return true;
        }
        let Some(balance) = self.balances.get_mut(key) else {
            return false;
        };
        if *balance < amount {
            return false;
        }
        *balance -= amount;
        true
    }

    /// Credit back, gated by the refund policy flag. A disabled policy makes
    /// this a no-op, not an error.
    pub fn refund(&mut self, config: &Config, key: &str, amount: u32) {
        if !config.xp_refunds_enabled {
            return;
        }
        self.add(key, amount);
    }

    pub fn snapshot(&self) -> BTreeMap<String, u32> {
        self.balances.clone()
    }

    pub fn restore(&mut self, balances: BTreeMap<String, u32>) {
        self.balances = balances;
    }

    pub fn len(&self) -> usize {
        self.balances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.balances.is_empty()
    }
}

/// Per-encounter kill ledger. Kills accumulate in tier-weighted units and
/// are converted to XP once, at encounter end, bounding pool mutations to
/// one per unit per battle.
#[derive(Debug, Default)]
pub struct EncounterLedger {
    /// killer unit id → sum of (victim_tier + 1) over its kills.
    weighted_kills: BTreeMap<String, u32>,
}

impl EncounterLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_kill(&mut self, killer_id: &str, victim_tier: u32) {
        *self
            .weighted_kills
            .entry(killer_id.to_string())
            .or_insert(0) += victim_tier + 1;
    }

    pub fn is_empty(&self) -> bool {
        self.weighted_kills.is_empty()
    }

    /// Apply the ledger: credit `(victim_tier + 1) * xp_per_tier` summed per
    /// killer, resolving each killer's pool key through `resolve`. Consumes
    /// the ledger so a battle can never be settled twice.
    pub fn settle(
        self,
        pools: &mut ExperiencePools,
        xp_per_tier: f32,
        mut resolve: impl FnMut(&str) -> String,
    ) {
        for (killer_id, units) in self.weighted_kills {
            let credit = (units as f32 * xp_per_tier).round() as u32;
            if credit == 0 {
                continue;
            }
            let key = resolve(&killer_id);
            tracing::debug!(unit = %killer_id, credit, "battle xp settled");
            pools.add(&key, credit);
        }
    }
}

/// Daily training credit for one roster line: a fraction of the host's
/// effective daily experience, scaled by headcount.
pub fn training_credit(daily_xp_each: f32, headcount: u32, multiplier: f32) -> u32 {
    let total = daily_xp_each * headcount as f32 * multiplier;
    if total <= 0.0 { 0 } else { total as u32 }
}
