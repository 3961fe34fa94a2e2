use std::collections::{BTreeMap, BTreeSet};

/// Item ids available in the player's build UI. Fed by the tree builder
/// (every item referenced by a cloned subtree is unlocked) and by the
/// migration pipeline.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct UnlockRegistry {
    items: BTreeSet<String>,
}

impl UnlockRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if the item was newly unlocked.
    pub fn unlock(&mut self, item_id: &str) -> bool {
        self.items.insert(item_id.to_string())
    }

    pub fn is_unlocked(&self, item_id: &str) -> bool {
        self.items.contains(item_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.items.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }
}

/// Item id → owned count, mutated by equip/unequip bookkeeping.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ItemStocks {
    counts: BTreeMap<String, u32>,
}

impl ItemStocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, item_id: &str) -> u32 {
        self.counts.get(item_id).copied().unwrap_or(0)
    }

    pub fn add(&mut self, item_id: &str, amount: u32) {
        if amount == 0 {
            return;
        }
        *self.counts.entry(item_id.to_string()).or_insert(0) += amount;
    }

    /// Remove up to `amount` from stock; returns false (unchanged) when the
    /// stock is insufficient.
    pub fn try_take(&mut self, item_id: &str, amount: u32) -> bool {
        let Some(count) = self.counts.get_mut(item_id) else {
            return false;
        };
        if *count < amount {
            return false;
        }
        *count -= amount;
        if *count == 0 {
            self.counts.remove(item_id);
        }
        true
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
        self.counts.iter().map(|(id, n)| (id.as_str(), *n))
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn clear(&mut self) {
        self.counts.clear();
    }
}
