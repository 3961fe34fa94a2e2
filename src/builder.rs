use std::collections::BTreeMap;

use crate::catalog::Catalog;
use crate::config::Config;
use crate::id::TroopIdAllocator;
use crate::model::{FactionRoster, TroopNode};
use crate::registry::TroopRegistry;
use crate::unlocks::UnlockRegistry;

/// What a clone carries over from its source unit.
#[derive(Debug, Clone, Copy)]
pub struct CloneOptions {
    /// Follow the source's upgrade targets and clone the whole subtree.
    pub keep_upgrades: bool,
    pub keep_equipment: bool,
    pub keep_skills: bool,
}

impl Default for CloneOptions {
    fn default() -> Self {
        Self {
            keep_upgrades: true,
            keep_equipment: true,
            keep_skills: true,
        }
    }
}

/// Mutable services the builder threads through a clone pass.
pub struct BuildContext<'a> {
    pub catalog: &'a Catalog,
    pub config: &'a Config,
    pub registry: &'a mut TroopRegistry,
    pub ids: &'a mut TroopIdAllocator,
    pub unlocks: &'a mut UnlockRegistry,
}

/// Clone a vanilla subtree rooted at `source_root` into `roster`'s faction,
/// depth-first pre-order, allocating a fresh namespaced id per node.
///
/// Every item referenced by a cloned equipment set is unlocked as a side
/// effect. Source units missing from the catalog are skipped together with
/// their subtrees. Returns the new root's id, or `None` when the root itself
/// is unknown.
pub fn clone_tree(
    ctx: &mut BuildContext<'_>,
    source_root: &str,
    roster: &FactionRoster,
    is_elite: bool,
    parent_id: Option<&str>,
    options: CloneOptions,
) -> Option<String> {
    let culture_name = ctx
        .catalog
        .culture(&roster.culture_id)
        .map(|c| c.name.clone())
        .unwrap_or_default();
    let position = match parent_id.and_then(|p| ctx.registry.get(p)) {
        Some(parent) => {
            let mut p = parent.position.clone();
            p.push(parent.children.len());
            p
        }
        None => vec![],
    };
    let root = clone_node(
        ctx,
        source_root,
        roster,
        &culture_name,
        is_elite,
        false,
        parent_id,
        position,
        options,
    )?;
    if let Some(parent_id) = parent_id
        && let Some(parent) = ctx.registry.get_mut(parent_id)
    {
        parent.children.push(root.clone());
    }
    tracing::info!(faction = %roster.faction_id, source = %source_root, root = %root, "cloned troop tree");
    Some(root)
}

/// Clone a single culture root into a standalone retinue slot: no upgrade
/// subtree, no parent, flagged `is_retinue`.
pub fn build_retinue(
    ctx: &mut BuildContext<'_>,
    roster: &FactionRoster,
    is_elite: bool,
) -> Option<String> {
    let culture = ctx.catalog.culture(&roster.culture_id)?;
    let culture_name = culture.name.clone();
    let source = if is_elite {
        culture.elite_root.clone()
    } else {
        culture.basic_root.clone()
    };
    let options = CloneOptions {
        keep_upgrades: false,
        ..CloneOptions::default()
    };
    clone_node(
        ctx,
        &source,
        roster,
        &culture_name,
        is_elite,
        true,
        None,
        vec![],
        options,
    )
}

#[allow(clippy::too_many_arguments)]
fn clone_node(
    ctx: &mut BuildContext<'_>,
    source_id: &str,
    roster: &FactionRoster,
    culture_name: &str,
    is_elite: bool,
    is_retinue: bool,
    parent_id: Option<&str>,
    position: Vec<usize>,
    options: CloneOptions,
) -> Option<String> {
    let Some(unit) = ctx.catalog.unit(source_id) else {
        tracing::warn!(source = %source_id, "clone source missing from catalog, skipping subtree");
        return None;
    };
    let unit = unit.clone();

    let id = ctx.ids.next_id();
    let name = if ctx.config.faction_names {
        faction_troop_name(&unit.name, culture_name, &roster.name)
    } else {
        unit.name.clone()
    };
    let equipment = if options.keep_equipment {
        unit.equipment.clone()
    } else {
        vec![]
    };
    for set in &equipment {
        for item in set.item_ids() {
            ctx.unlocks.unlock(item);
        }
    }

    ctx.registry.insert(TroopNode {
        id: id.clone(),
        vanilla_id: Some(unit.id.clone()),
        faction_id: roster.faction_id.clone(),
        is_elite,
        is_retinue,
        name,
        level: unit.tier,
        is_female: unit.is_female,
        skills: if options.keep_skills {
            unit.skills.clone()
        } else {
            BTreeMap::new()
        },
        equipment,
        parent_id: parent_id.map(str::to_string),
        children: vec![],
        position: position.clone(),
        active: true,
    });

    if options.keep_upgrades {
        let mut children = Vec::new();
        for target in &unit.upgrade_targets {
            let mut child_position = position.clone();
            child_position.push(children.len());
            if let Some(child) = clone_node(
                ctx,
                target,
                roster,
                culture_name,
                is_elite,
                is_retinue,
                Some(&id),
                child_position,
                options,
            ) {
                children.push(child);
            }
        }
        if let Some(node) = ctx.registry.get_mut(&id) {
            node.children = children;
        }
    }

    Some(id)
}

/// Derive a faction-flavored name from a vanilla one. A word that is mostly
/// the culture's name (shared prefix covering at least 80% of the longer of
/// the two, case-insensitive) is swapped for the faction name in place;
/// otherwise the faction name is prefixed.
pub fn faction_troop_name(source: &str, culture_name: &str, faction_name: &str) -> String {
    let culture: Vec<char> = culture_name.to_lowercase().chars().collect();
    if !culture.is_empty() {
        let mut replaced = false;
        let words: Vec<&str> = source.split_whitespace().collect();
        let renamed: Vec<String> = words
            .iter()
            .map(|word| {
                if !replaced && culture_word_share(word, &culture) >= 0.8 {
                    replaced = true;
                    faction_name.to_string()
                } else {
                    (*word).to_string()
                }
            })
            .collect();
        if replaced {
            return renamed.join(" ");
        }
    }
    format!("{faction_name} {source}")
}

fn culture_word_share(word: &str, culture_lower: &[char]) -> f32 {
    let word: Vec<char> = word.to_lowercase().chars().collect();
    if word.is_empty() {
        return 0.0;
    }
    let common = word
        .iter()
        .zip(culture_lower.iter())
        .take_while(|(a, b)| a == b)
        .count();
    common as f32 / word.len().max(culture_lower.len()) as f32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::is_custom_id;
    use crate::testutil::sample_catalog;

    fn fixture() -> (Catalog, Config, FactionRoster) {
        let catalog = sample_catalog();
        let config = Config::default();
        let roster = FactionRoster::new("player_clan", "Stormcloaks", "vlandia");
        (catalog, config, roster)
    }

    #[test]
    fn clones_whole_basic_line() {
        let (catalog, config, roster) = fixture();
        let mut registry = TroopRegistry::new();
        let mut ids = TroopIdAllocator::new();
        let mut unlocks = UnlockRegistry::new();
        let mut ctx = BuildContext {
            catalog: &catalog,
            config: &config,
            registry: &mut registry,
            ids: &mut ids,
            unlocks: &mut unlocks,
        };

        let root = clone_tree(
            &mut ctx,
            "vlandia_recruit",
            &roster,
            false,
            None,
            CloneOptions::default(),
        )
        .unwrap();

        // recruit -> footman -> sergeant
        let order: Vec<&TroopNode> = registry.walk_tree(&root);
        assert_eq!(order.len(), 3);
        assert!(order.iter().all(|n| is_custom_id(&n.id)));
        assert!(order.iter().all(|n| n.faction_id == "player_clan"));
        assert!(order.iter().all(|n| !n.is_elite && !n.is_retinue));
        assert_eq!(order[0].position, Vec::<usize>::new());
        assert_eq!(order[1].position, vec![0]);
        assert_eq!(order[2].position, vec![0, 0]);
        assert_eq!(order[1].parent_id.as_deref(), Some(order[0].id.as_str()));
        assert_eq!(
            order[1].vanilla_id.as_deref(),
            Some("vlandia_footman"),
            "clone order follows upgrade targets"
        );
    }

    #[test]
    fn cloned_names_substitute_the_culture_word() {
        let (catalog, config, roster) = fixture();
        let mut registry = TroopRegistry::new();
        let mut ids = TroopIdAllocator::new();
        let mut unlocks = UnlockRegistry::new();
        let mut ctx = BuildContext {
            catalog: &catalog,
            config: &config,
            registry: &mut registry,
            ids: &mut ids,
            unlocks: &mut unlocks,
        };

        let root = clone_tree(
            &mut ctx,
            "vlandia_recruit",
            &roster,
            false,
            None,
            CloneOptions::default(),
        )
        .unwrap();
        assert_eq!(registry.get(&root).unwrap().name, "Stormcloaks Recruit");
    }

    #[test]
    fn cloning_unlocks_referenced_items() {
        let (catalog, config, roster) = fixture();
        let mut registry = TroopRegistry::new();
        let mut ids = TroopIdAllocator::new();
        let mut unlocks = UnlockRegistry::new();
        let mut ctx = BuildContext {
            catalog: &catalog,
            config: &config,
            registry: &mut registry,
            ids: &mut ids,
            unlocks: &mut unlocks,
        };

        clone_tree(
            &mut ctx,
            "vlandia_recruit",
            &roster,
            false,
            None,
            CloneOptions::default(),
        )
        .unwrap();
        assert!(!unlocks.is_empty());
        assert!(unlocks.is_unlocked("gambeson"));
    }

    #[test]
    fn options_strip_skills_equipment_and_upgrades() {
        let (catalog, config, roster) = fixture();
        let mut registry = TroopRegistry::new();
        let mut ids = TroopIdAllocator::new();
        let mut unlocks = UnlockRegistry::new();
        let mut ctx = BuildContext {
            catalog: &catalog,
            config: &config,
            registry: &mut registry,
            ids: &mut ids,
            unlocks: &mut unlocks,
        };

        let root = clone_tree(
            &mut ctx,
            "vlandia_recruit",
            &roster,
            false,
            None,
            CloneOptions {
                keep_upgrades: false,
                keep_equipment: false,
                keep_skills: false,
            },
        )
        .unwrap();
        let node = registry.get(&root).unwrap();
        assert!(node.children.is_empty());
        assert!(node.skills.is_empty());
        assert!(node.equipment.is_empty());
        assert!(unlocks.is_empty());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn retinue_is_a_single_flagged_node() {
        let (catalog, config, roster) = fixture();
        let mut registry = TroopRegistry::new();
        let mut ids = TroopIdAllocator::new();
        let mut unlocks = UnlockRegistry::new();
        let mut ctx = BuildContext {
            catalog: &catalog,
            config: &config,
            registry: &mut registry,
            ids: &mut ids,
            unlocks: &mut unlocks,
        };

        let id = build_retinue(&mut ctx, &roster, true).unwrap();
        let node = registry.get(&id).unwrap();
        assert!(node.is_retinue);
        assert!(node.is_elite);
        assert!(node.children.is_empty());
        assert_eq!(node.vanilla_id.as_deref(), Some("vlandia_squire"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn unknown_root_clones_nothing() {
        let (catalog, config, roster) = fixture();
        let mut registry = TroopRegistry::new();
        let mut ids = TroopIdAllocator::new();
        let mut unlocks = UnlockRegistry::new();
        let mut ctx = BuildContext {
            catalog: &catalog,
            config: &config,
            registry: &mut registry,
            ids: &mut ids,
            unlocks: &mut unlocks,
        };

        assert!(
            clone_tree(
                &mut ctx,
                "ghost",
                &roster,
                false,
                None,
                CloneOptions::default()
            )
            .is_none()
        );
        assert!(registry.is_empty());
    }

    #[test]
    fn name_substitution_rules() {
        assert_eq!(
            faction_troop_name("Vlandian Recruit", "Vlandia", "Stormcloaks"),
            "Stormcloaks Recruit"
        );
        assert_eq!(
            faction_troop_name("Hardened Outlaw", "Vlandia", "Stormcloaks"),
            "Stormcloaks Hardened Outlaw"
        );
        // Only the first qualifying word is swapped.
        assert_eq!(
            faction_troop_name("Vlandia Vlandia", "Vlandia", "Clan"),
            "Clan Vlandia"
        );
    }
}
