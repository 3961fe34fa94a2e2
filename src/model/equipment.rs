use serde::{Deserialize, Serialize};

/// Combat contexts an equipment alternate can be enabled for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CombatContext {
    FieldBattle,
    SiegeDefense,
    SiegeAssault,
}

pub const COMBAT_CONTEXTS: [CombatContext; 3] = [
    CombatContext::FieldBattle,
    CombatContext::SiegeDefense,
    CombatContext::SiegeAssault,
];

/// Per-context enable flags for one equipment alternate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextFlags {
    pub field_battle: bool,
    pub siege_defense: bool,
    pub siege_assault: bool,
}

impl ContextFlags {
    pub fn all() -> Self {
        Self {
            field_battle: true,
            siege_defense: true,
            siege_assault: true,
        }
    }

    pub fn get(&self, context: CombatContext) -> bool {
        match context {
            CombatContext::FieldBattle => self.field_battle,
            CombatContext::SiegeDefense => self.siege_defense,
            CombatContext::SiegeAssault => self.siege_assault,
        }
    }

    pub fn set(&mut self, context: CombatContext, enabled: bool) {
        match context {
            CombatContext::FieldBattle => self.field_battle = enabled,
            CombatContext::SiegeDefense => self.siege_defense = enabled,
            CombatContext::SiegeAssault => self.siege_assault = enabled,
        }
    }
}

impl Default for ContextFlags {
    fn default() -> Self {
        Self::all()
    }
}

/// One equipment loadout alternate: a serialized `slot:item;...` code, a
/// civilian/battle tag, and per-context enable flags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EquipmentSet {
    pub code: String,
    pub civilian: bool,
    #[serde(default)]
    pub enabled: ContextFlags,
}

impl EquipmentSet {
    pub fn battle(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            civilian: false,
            enabled: ContextFlags::all(),
        }
    }

    pub fn civilian(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            civilian: true,
            enabled: ContextFlags::all(),
        }
    }

    /// Item ids referenced by this set. Malformed `slot:item` pairs are
    /// skipped rather than rejected, mirroring how the save pipeline treats
    /// partially corrupt codes.
    pub fn item_ids(&self) -> impl Iterator<Item = &str> {
        self.code
            .split(';')
            .filter_map(|pair| pair.split_once(':'))
            .map(|(_, item)| item)
            .filter(|item| !item.is_empty())
    }
}

/// Enable or disable one battle alternate for one combat context.
///
/// Rejected (returns false, state unchanged) when `alt_index` is out of
/// range, names a civilian set, or when disabling would leave the context
/// with no enabled battle alternate at all.
pub fn set_alternate_enabled(
    sets: &mut [EquipmentSet],
    alt_index: usize,
    context: CombatContext,
    enabled: bool,
) -> bool {
    let Some(set) = sets.get(alt_index) else {
        return false;
    };
    if set.civilian {
        return false;
    }
    if !enabled {
        let others_enabled = sets
            .iter()
            .enumerate()
            .filter(|(i, s)| *i != alt_index && !s.civilian)
            .any(|(_, s)| s.enabled.get(context));
        if !others_enabled {
            return false;
        }
    }
    sets[alt_index].enabled.set(context, enabled);
    true
}
