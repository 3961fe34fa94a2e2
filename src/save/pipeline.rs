use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use serde_json::Value;
use thiserror::Error;

use super::legacy::{V1Save, V2Save};
use super::record::{CURRENT_VERSION, FactionRecord, SaveFile, TroopRecord, decode_skills};
use crate::catalog::Catalog;
use crate::config::OrphanPolicy;
use crate::model::{FactionRoster, TroopNode};
use crate::registry::TroopRegistry;
use crate::unlocks::{ItemStocks, UnlockRegistry};
use crate::xp::ExperiencePools;

#[derive(Debug, Error)]
pub enum SaveError {
    #[error("save io: {0}")]
    Io(#[from] std::io::Error),
    #[error("save json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unsupported save version {0}")]
    UnsupportedVersion(u64),
}

/// Write the current-schema document. The parent directory is created on
/// demand; the file is fully rewritten each time.
pub fn write_save(path: &Path, file: &SaveFile) -> Result<(), SaveError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer(&mut writer, file)?;
    writer.flush()?;
    Ok(())
}

/// Read a save of any known schema and lift it to the current shape.
///
/// Version detection is by the top-level `version` field; its absence means
/// v1. Legacy documents are converted wholesale; for current documents each
/// faction entry is parsed independently so one corrupt record costs only
/// itself.
pub fn read_save(path: &Path) -> Result<SaveFile, SaveError> {
    let reader = BufReader::new(File::open(path)?);
    let value: Value = serde_json::from_reader(reader)?;
    lift(value)
}

fn lift(value: Value) -> Result<SaveFile, SaveError> {
    match value.get("version").and_then(Value::as_u64) {
        None | Some(1) => {
            tracing::info!("legacy v1 save detected, converting");
            Ok(serde_json::from_value::<V1Save>(value)?.into_current())
        }
        Some(2) => {
            tracing::info!("legacy v2 save detected, converting");
            Ok(serde_json::from_value::<V2Save>(value)?.into_current())
        }
        Some(3) => Ok(parse_current(value)),
        Some(other) => Err(SaveError::UnsupportedVersion(other)),
    }
}

fn parse_current(value: Value) -> SaveFile {
    let mut file = SaveFile {
        version: CURRENT_VERSION,
        ..SaveFile::default()
    };
    if let Some(entries) = value.get("factions").and_then(Value::as_array) {
        for entry in entries {
            match serde_json::from_value::<FactionRecord>(entry.clone()) {
                Ok(record) => file.factions.push(record),
                Err(err) => {
                    tracing::warn!(error = %err, "skipping unreadable faction record");
                }
            }
        }
    }
    for (field, target) in [
        ("xp_pools", &mut file.xp_pools),
        ("item_stocks", &mut file.item_stocks),
    ] {
        if let Some(section) = value.get(field) {
            match serde_json::from_value(section.clone()) {
                Ok(parsed) => *target = parsed,
                Err(err) => {
                    tracing::warn!(section = field, error = %err, "unreadable save section, dropping");
                }
            }
        }
    }
    if let Some(section) = value.get("unlocked_items") {
        match serde_json::from_value(section.clone()) {
            Ok(parsed) => file.unlocked_items = parsed,
            Err(err) => {
                tracing::warn!(section = "unlocked_items", error = %err, "unreadable save section, dropping");
            }
        }
    }
    file
}

/// Snapshot the live services into a current-schema document.
pub fn collect(
    registry: &TroopRegistry,
    rosters: &[FactionRoster],
    pools: &ExperiencePools,
    unlocks: &UnlockRegistry,
    stocks: &ItemStocks,
) -> SaveFile {
    let record_for = |id: Option<&str>| {
        id.and_then(|id| registry.get(id))
            .map(|node| TroopRecord::from_node(registry, node))
    };
    SaveFile {
        version: CURRENT_VERSION,
        factions: rosters
            .iter()
            .map(|roster| FactionRecord {
                faction_id: roster.faction_id.clone(),
                name: roster.name.clone(),
                culture_id: roster.culture_id.clone(),
                elite_root: record_for(roster.elite_root.as_deref()),
                basic_root: record_for(roster.basic_root.as_deref()),
                retinue_elite: record_for(roster.retinue_elite.as_deref()),
                retinue_basic: record_for(roster.retinue_basic.as_deref()),
            })
            .collect(),
        xp_pools: pools.snapshot(),
        unlocked_items: unlocks.iter().map(str::to_string).collect(),
        item_stocks: stocks.iter().map(|(id, n)| (id.to_string(), n)).collect(),
    }
}

/// Rebuild one faction's live trees from its record.
///
/// A node whose vanilla reference no longer exists in the catalog is
/// dropped; under `ReparentToGrandparent` its children are spliced into its
/// place, under `Discard` the subtree goes with it. A root that is itself
/// unloadable empties the slot. Position paths are reassigned afterwards,
/// so splices cannot leave stale paths behind.
pub fn materialize_faction(
    record: &FactionRecord,
    catalog: &Catalog,
    policy: OrphanPolicy,
    registry: &mut TroopRegistry,
) -> FactionRoster {
    let mut roster = FactionRoster::new(
        record.faction_id.clone(),
        record.name.clone(),
        record.culture_id.clone(),
    );
    let slots: [(&Option<TroopRecord>, bool, bool); 4] = [
        (&record.elite_root, true, false),
        (&record.basic_root, false, false),
        (&record.retinue_elite, true, true),
        (&record.retinue_basic, false, true),
    ];
    let mut materialized: [Option<String>; 4] = [None, None, None, None];
    for (i, (slot, is_elite, is_retinue)) in slots.into_iter().enumerate() {
        let Some(troop) = slot else { continue };
        // The slot holds a single tree; an unloadable root empties it
        // instead of promoting a child, whatever the orphan policy says.
        let root_missing = troop
            .vanilla_id
            .as_deref()
            .is_some_and(|id| catalog.unit(id).is_none());
        if root_missing {
            tracing::warn!(
                faction = %record.faction_id,
                root = %troop.id,
                "tree root could not be reconstructed, slot dropped"
            );
            continue;
        }
        let roots = materialize_nodes(
            troop,
            &record.faction_id,
            is_elite,
            is_retinue,
            None,
            catalog,
            policy,
            registry,
        );
        if let Some(root) = roots.into_iter().next() {
            assign_positions(registry, &root);
            materialized[i] = Some(root);
        }
    }
    let [elite, basic, retinue_elite, retinue_basic] = materialized;
    roster.elite_root = elite;
    roster.basic_root = basic;
    roster.retinue_elite = retinue_elite;
    roster.retinue_basic = retinue_basic;
    roster
}

#[allow(clippy::too_many_arguments)]
fn materialize_nodes(
    record: &TroopRecord,
    faction_id: &str,
    is_elite: bool,
    is_retinue: bool,
    parent_id: Option<&str>,
    catalog: &Catalog,
    policy: OrphanPolicy,
    registry: &mut TroopRegistry,
) -> Vec<String> {
    let vanilla_missing = record
        .vanilla_id
        .as_deref()
        .is_some_and(|id| catalog.unit(id).is_none());
    if vanilla_missing {
        tracing::warn!(
            troop = %record.id,
            vanilla = record.vanilla_id.as_deref().unwrap_or_default(),
            "vanilla reference missing, dropping node"
        );
        return match policy {
            OrphanPolicy::ReparentToGrandparent => record
                .children
                .iter()
                .flat_map(|child| {
                    materialize_nodes(
                        child, faction_id, is_elite, is_retinue, parent_id, catalog, policy,
                        registry,
                    )
                })
                .collect(),
            OrphanPolicy::Discard => vec![],
        };
    }
    if registry.contains(&record.id) {
        tracing::warn!(troop = %record.id, "duplicate troop id in save, skipping subtree");
        return vec![];
    }

    registry.insert(TroopNode {
        id: record.id.clone(),
        vanilla_id: record.vanilla_id.clone(),
        faction_id: faction_id.to_string(),
        is_elite,
        is_retinue,
        name: record.name.clone(),
        level: record.level,
        is_female: record.is_female,
        skills: decode_skills(&record.skills),
        equipment: record.equipment.clone(),
        parent_id: parent_id.map(str::to_string),
        children: vec![],
        position: vec![],
        active: true,
    });
    let children: Vec<String> = record
        .children
        .iter()
        .flat_map(|child| {
            materialize_nodes(
                child,
                faction_id,
                is_elite,
                is_retinue,
                Some(&record.id),
                catalog,
                policy,
                registry,
            )
        })
        .collect();
    if let Some(node) = registry.get_mut(&record.id) {
        node.children = children;
    }
    vec![record.id.clone()]
}

/// Rewrite position paths for a whole subtree from its current link
/// structure: root gets the empty path, each child appends its sibling
/// index.
pub fn assign_positions(registry: &mut TroopRegistry, root_id: &str) {
    let mut stack = vec![(root_id.to_string(), Vec::new())];
    while let Some((id, position)) = stack.pop() {
        let Some(node) = registry.get_mut(&id) else {
            continue;
        };
        node.position = position.clone();
        for (i, child) in node.children.clone().into_iter().enumerate() {
            let mut child_position = position.clone();
            child_position.push(i);
            stack.push((child, child_position));
        }
    }
}
