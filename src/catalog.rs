use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::model::equipment::EquipmentSet;

/// Battlefield role of a unit, derived from its mount/ranged flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormationClass {
    Infantry,
    Ranged,
    Cavalry,
    HorseArcher,
}

impl FormationClass {
    pub fn from_flags(is_mounted: bool, is_ranged: bool) -> Self {
        match (is_mounted, is_ranged) {
            (true, true) => FormationClass::HorseArcher,
            (true, false) => FormationClass::Cavalry,
            (false, true) => FormationClass::Ranged,
            (false, false) => FormationClass::Infantry,
        }
    }
}

/// One unit in the host's read-only catalog: a vanilla troop the engine can
/// clone from or be asked to substitute.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogUnit {
    pub id: String,
    pub name: String,
    pub tier: u32,
    pub is_female: bool,
    pub is_mounted: bool,
    pub is_ranged: bool,
    pub skills: BTreeMap<String, u32>,
    pub equipment: Vec<EquipmentSet>,
    /// Natural upgrade children in the vanilla tree.
    pub upgrade_targets: Vec<String>,
}

impl CatalogUnit {
    pub fn formation_class(&self) -> FormationClass {
        FormationClass::from_flags(self.is_mounted, self.is_ranged)
    }
}

/// A culture's entry points into the vanilla troop forest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Culture {
    pub id: String,
    pub name: String,
    pub elite_root: String,
    pub basic_root: String,
}

/// Read-only view of the host's unit registry. The engine never mutates it;
/// units missing from it are treated as "not tracked", not as errors.
#[derive(Debug, Default)]
pub struct Catalog {
    units: BTreeMap<String, CatalogUnit>,
    cultures: BTreeMap<String, Culture>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_unit(&mut self, unit: CatalogUnit) {
        self.units.insert(unit.id.clone(), unit);
    }

    pub fn insert_culture(&mut self, culture: Culture) {
        self.cultures.insert(culture.id.clone(), culture);
    }

    pub fn unit(&self, id: &str) -> Option<&CatalogUnit> {
        self.units.get(id)
    }

    pub fn culture(&self, id: &str) -> Option<&Culture> {
        self.cultures.get(id)
    }

    /// Whether `unit_id` sits anywhere in the culture's elite upgrade tree.
    ///
    /// Walks from the elite root across upgrade targets with a visited set,
    /// since host data occasionally contains upgrade cycles. If the unit is
    /// never reached it is classified as basic-line.
    pub fn is_elite_line(&self, culture_id: &str, unit_id: &str) -> bool {
        let Some(culture) = self.cultures.get(culture_id) else {
            return false;
        };
        let mut seen = HashSet::new();
        let mut stack = vec![culture.elite_root.as_str()];
        seen.insert(culture.elite_root.as_str());
        while let Some(current) = stack.pop() {
            if current == unit_id {
                return true;
            }
            let Some(unit) = self.units.get(current) else {
                continue;
            };
            for next in &unit.upgrade_targets {
                if seen.insert(next.as_str()) {
                    stack.push(next.as_str());
                }
            }
        }
        false
    }
}
