use std::collections::BTreeMap;

use serde::Deserialize;

use crate::model::EquipmentSet;
use super::record::{CURRENT_VERSION, FactionRecord, SaveFile, TroopRecord};

/// Version 1: an unversioned flat list of root troops. Factions are implied
/// by a per-record faction id, equipment is a single battle code, and each
/// record carries its own XP balance.
#[derive(Debug, Deserialize)]
pub struct V1Save {
    #[serde(default)]
    pub troops: Vec<V1TroopRecord>,
}

#[derive(Debug, Deserialize)]
pub struct V1TroopRecord {
    pub id: String,
    #[serde(default)]
    pub vanilla_id: Option<String>,
    pub faction_id: String,
    #[serde(default)]
    pub culture_id: String,
    #[serde(default)]
    pub is_elite: bool,
    pub name: String,
    pub level: u32,
    #[serde(default)]
    pub is_female: bool,
    #[serde(default)]
    pub skills: String,
    /// Single battle loadout code; v1 predates alternates.
    #[serde(default)]
    pub equipment: String,
    #[serde(default)]
    pub xp_pool: u32,
    #[serde(default)]
    pub children: Vec<V1TroopRecord>,
}

/// Version 2: factions split into clan/kingdom containers, service maps
/// already flat. Troop records match the current shape.
#[derive(Debug, Deserialize)]
pub struct V2Save {
    #[serde(default)]
    pub clans: Vec<FactionRecord>,
    #[serde(default)]
    pub kingdoms: Vec<FactionRecord>,
    #[serde(default)]
    pub xp_pools: BTreeMap<String, u32>,
    #[serde(default)]
    pub unlocked_items: Vec<String>,
    #[serde(default)]
    pub item_stocks: BTreeMap<String, u32>,
}

impl V1Save {
    /// Lift a v1 document into the current shape: roots grouped into
    /// faction records by their faction id, embedded XP balances moved into
    /// the pool map keyed by troop id. A slot already claimed by an earlier
    /// root wins; later duplicates are skipped.
    pub fn into_current(self) -> SaveFile {
        let mut factions: BTreeMap<String, FactionRecord> = BTreeMap::new();
        let mut xp_pools = BTreeMap::new();

        for root in self.troops {
            let faction = factions
                .entry(root.faction_id.clone())
                .or_insert_with(|| FactionRecord {
                    faction_id: root.faction_id.clone(),
                    name: root.faction_id.clone(),
                    culture_id: String::new(),
                    elite_root: None,
                    basic_root: None,
                    retinue_elite: None,
                    retinue_basic: None,
                });
            if faction.culture_id.is_empty() {
                faction.culture_id = root.culture_id.clone();
            }
            let slot = if root.is_elite {
                &mut faction.elite_root
            } else {
                &mut faction.basic_root
            };
            if slot.is_some() {
                tracing::warn!(
                    faction = %root.faction_id,
                    root = %root.id,
                    "duplicate legacy root for an occupied slot, skipping"
                );
                continue;
            }
            *slot = Some(lift_v1_record(root, &mut xp_pools));
        }

        SaveFile {
            version: CURRENT_VERSION,
            factions: factions.into_values().collect(),
            xp_pools,
            unlocked_items: vec![],
            item_stocks: BTreeMap::new(),
        }
    }
}

fn lift_v1_record(record: V1TroopRecord, xp_pools: &mut BTreeMap<String, u32>) -> TroopRecord {
    if record.xp_pool > 0 {
        xp_pools.insert(record.id.clone(), record.xp_pool);
    }
    TroopRecord {
        id: record.id,
        vanilla_id: record.vanilla_id,
        name: record.name,
        level: record.level,
        is_female: record.is_female,
        skills: record.skills,
        equipment: if record.equipment.is_empty() {
            vec![]
        } else {
            vec![EquipmentSet::battle(record.equipment)]
        },
        children: record
            .children
            .into_iter()
            .map(|child| lift_v1_record(child, xp_pools))
            .collect(),
    }
}

impl V2Save {
    /// Merge the clan/kingdom containers into the current flat faction list.
    pub fn into_current(self) -> SaveFile {
        let mut factions = self.clans;
        factions.extend(self.kingdoms);
        SaveFile {
            version: CURRENT_VERSION,
            factions,
            xp_pools: self.xp_pools,
            unlocked_items: self.unlocked_items,
            item_stocks: self.item_stocks,
        }
    }
}
