use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::model::{EquipmentSet, TroopNode};
use crate::registry::TroopRegistry;

/// Schema version written by `write_save`. Loads accept this plus the two
/// historical shapes (see `save::legacy`).
pub const CURRENT_VERSION: u32 = 3;

/// The on-disk document, current schema: per-faction records with inlined
/// troop trees, plus the flat service maps.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SaveFile {
    pub version: u32,
    #[serde(default)]
    pub factions: Vec<FactionRecord>,
    #[serde(default)]
    pub xp_pools: BTreeMap<String, u32>,
    #[serde(default)]
    pub unlocked_items: Vec<String>,
    #[serde(default)]
    pub item_stocks: BTreeMap<String, u32>,
}

impl SaveFile {
    /// Fold a still-staged document into this one: factions not already
    /// present are appended, pool balances and stock counts are summed,
    /// unlock ids deduplicated. Used when a save is requested before the
    /// staging buffer could be flushed.
    pub fn merge_staged(&mut self, staged: &SaveFile) {
        for record in &staged.factions {
            if !self
                .factions
                .iter()
                .any(|f| f.faction_id == record.faction_id)
            {
                self.factions.push(record.clone());
            }
        }
        for (key, balance) in &staged.xp_pools {
            *self.xp_pools.entry(key.clone()).or_insert(0) += balance;
        }
        for item in &staged.unlocked_items {
            if !self.unlocked_items.contains(item) {
                self.unlocked_items.push(item.clone());
            }
        }
        for (item, count) in &staged.item_stocks {
            *self.item_stocks.entry(item.clone()).or_insert(0) += count;
        }
    }
}

/// One faction's persisted trees. Elite/basic/retinue placement is carried
/// by the slot, not by per-node flags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactionRecord {
    pub faction_id: String,
    pub name: String,
    pub culture_id: String,
    #[serde(default)]
    pub elite_root: Option<TroopRecord>,
    #[serde(default)]
    pub basic_root: Option<TroopRecord>,
    #[serde(default)]
    pub retinue_elite: Option<TroopRecord>,
    #[serde(default)]
    pub retinue_basic: Option<TroopRecord>,
}

/// One persisted troop node. Children are inlined, so tree shape survives
/// without separate parent pointers; skills use the `skill:value;...` codec.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TroopRecord {
    pub id: String,
    #[serde(default)]
    pub vanilla_id: Option<String>,
    pub name: String,
    pub level: u32,
    #[serde(default)]
    pub is_female: bool,
    #[serde(default)]
    pub skills: String,
    #[serde(default)]
    pub equipment: Vec<EquipmentSet>,
    #[serde(default)]
    pub children: Vec<TroopRecord>,
}

impl TroopRecord {
    /// Snapshot a live subtree. Children missing from the registry are
    /// dropped from the record, matching the walk semantics everywhere else.
    pub fn from_node(registry: &TroopRegistry, node: &TroopNode) -> Self {
        Self {
            id: node.id.clone(),
            vanilla_id: node.vanilla_id.clone(),
            name: node.name.clone(),
            level: node.level,
            is_female: node.is_female,
            skills: encode_skills(&node.skills),
            equipment: node.equipment.clone(),
            children: node
                .children
                .iter()
                .filter_map(|id| registry.get(id))
                .map(|child| Self::from_node(registry, child))
                .collect(),
        }
    }

    /// Ids of every node in this record's subtree, pre-order.
    pub fn ids(&self) -> Vec<&str> {
        let mut out = vec![self.id.as_str()];
        for child in &self.children {
            out.extend(child.ids());
        }
        out
    }
}

/// Encode a skill table as `skill:value;...`, key-sorted.
pub fn encode_skills(skills: &BTreeMap<String, u32>) -> String {
    skills
        .iter()
        .map(|(skill, value)| format!("{skill}:{value}"))
        .collect::<Vec<_>>()
        .join(";")
}

/// Decode the `skill:value;...` codec. Malformed pairs are skipped with a
/// warning rather than failing the whole record.
pub fn decode_skills(code: &str) -> BTreeMap<String, u32> {
    let mut skills = BTreeMap::new();
    for pair in code.split(';').filter(|p| !p.is_empty()) {
        match pair.split_once(':').map(|(s, v)| (s, v.parse::<u32>())) {
            Some((skill, Ok(value))) => {
                skills.insert(skill.to_string(), value);
            }
            _ => tracing::warn!(pair = %pair, "malformed skill pair, skipping"),
        }
    }
    skills
}
