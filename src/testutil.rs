use std::collections::BTreeMap;

use crate::catalog::{Catalog, CatalogUnit, Culture};
use crate::config::Config;
use crate::model::{EquipmentSet, TroopNode};
use crate::session::Session;

// ---------------------------------------------------------------------------
// Catalog fixtures
// ---------------------------------------------------------------------------

/// One small culture with a three-step basic line and a two-step elite line:
///
/// basic:  vlandia_recruit (t1) -> vlandia_footman (t2) -> vlandia_sergeant (t3)
/// elite:  vlandia_squire (t2) -> vlandia_knight (t4, mounted)
pub fn sample_catalog() -> Catalog {
    let mut catalog = Catalog::new();
    catalog.insert_culture(Culture {
        id: "vlandia".to_string(),
        name: "Vlandia".to_string(),
        elite_root: "vlandia_squire".to_string(),
        basic_root: "vlandia_recruit".to_string(),
    });
    catalog.insert_unit(unit(
        "vlandia_recruit",
        "Vlandian Recruit",
        1,
        false,
        false,
        &[("athletics", 20)],
        &[EquipmentSet::battle("body:gambeson"), EquipmentSet::civilian("body:tunic")],
        &["vlandia_footman"],
    ));
    catalog.insert_unit(unit(
        "vlandia_footman",
        "Vlandian Footman",
        2,
        false,
        false,
        &[("athletics", 40), ("polearm", 30)],
        &[EquipmentSet::battle("head:helm_a;body:mail_a")],
        &["vlandia_sergeant"],
    ));
    catalog.insert_unit(unit(
        "vlandia_sergeant",
        "Vlandian Sergeant",
        3,
        false,
        false,
        &[("athletics", 70), ("polearm", 80)],
        &[EquipmentSet::battle("head:helm_b;body:mail_b")],
        &[],
    ));
    catalog.insert_unit(unit(
        "vlandia_squire",
        "Vlandian Squire",
        2,
        false,
        false,
        &[("riding", 40)],
        &[EquipmentSet::battle("body:brigandine")],
        &["vlandia_knight"],
    ));
    catalog.insert_unit(unit(
        "vlandia_knight",
        "Vlandian Knight",
        4,
        true,
        false,
        &[("riding", 120), ("polearm", 100)],
        &[EquipmentSet::battle("head:greathelm;body:plate;horse:charger")],
        &[],
    ));
    catalog
}

#[allow(clippy::too_many_arguments)]
fn unit(
    id: &str,
    name: &str,
    tier: u32,
    is_mounted: bool,
    is_ranged: bool,
    skills: &[(&str, u32)],
    equipment: &[EquipmentSet],
    upgrades: &[&str],
) -> CatalogUnit {
    CatalogUnit {
        id: id.to_string(),
        name: name.to_string(),
        tier,
        is_female: false,
        is_mounted,
        is_ranged,
        skills: skills
            .iter()
            .map(|(s, v)| (s.to_string(), *v))
            .collect(),
        equipment: equipment.to_vec(),
        upgrade_targets: upgrades.iter().map(|u| u.to_string()).collect(),
    }
}

// ---------------------------------------------------------------------------
// Node and session fixtures
// ---------------------------------------------------------------------------

/// A minimal custom node: tier 1, no skills, no equipment, no links.
pub fn bare_node(id: &str, faction_id: &str) -> TroopNode {
    TroopNode {
        id: id.to_string(),
        vanilla_id: None,
        faction_id: faction_id.to_string(),
        is_elite: false,
        is_retinue: false,
        name: id.to_string(),
        level: 1,
        is_female: false,
        skills: BTreeMap::new(),
        equipment: vec![],
        parent_id: None,
        children: vec![],
        position: vec![],
        active: true,
    }
}

/// A launched session over `sample_catalog` with the default config and one
/// registered faction, `player_clan` ("Stormcloaks", vlandia culture). No
/// trees are built; call `ensure_troops_exist` where a test needs them.
pub fn ready_session() -> Session {
    ready_session_with(Config::default())
}

pub fn ready_session_with(config: Config) -> Session {
    let mut session = Session::new(sample_catalog(), config);
    session.register_faction("player_clan", "Stormcloaks", "vlandia");
    session.launch();
    session
}
