use std::collections::VecDeque;

use rand::{Rng, RngCore};

use crate::catalog::{Catalog, FormationClass};
use crate::model::{FactionRoster, TroopNode};
use crate::registry::TroopRegistry;

/// Pick the faction's substitute for a vanilla `reference` unit.
///
/// The reference is classified onto the faction's elite or basic line by
/// catalog ancestry, then resolved inside that tree:
///
/// - `same_tier_only`: the first node in depth-first pre-order whose tier
///   equals the reference's. Deterministic; `rng` is untouched.
/// - otherwise: a downward walk from the root, at each step moving to the
///   child with the highest tier not exceeding the reference's, breaking
///   ties among equal-tier children through `rng`. A root already above the
///   reference tier yields `None`.
///
/// Retinue slots and inactive nodes are never candidates.
pub fn pick_best(
    registry: &TroopRegistry,
    catalog: &Catalog,
    roster: &FactionRoster,
    reference_id: &str,
    same_tier_only: bool,
    rng: &mut dyn RngCore,
) -> Option<String> {
    let reference = catalog.unit(reference_id)?;
    let is_elite = catalog.is_elite_line(&roster.culture_id, reference_id);
    let root_id = roster.root(is_elite)?;

    if same_tier_only {
        return registry
            .walk_tree(root_id)
            .into_iter()
            .find(|n| eligible(n) && n.level == reference.tier)
            .map(|n| n.id.clone());
    }

    let mut current = registry.get(root_id).filter(|n| eligible(n))?;
    if current.level > reference.tier {
        return None;
    }
    while current.level < reference.tier {
        let candidates: Vec<&TroopNode> = current
            .children
            .iter()
            .filter_map(|id| registry.get(id))
            .filter(|n| eligible(n) && n.level <= reference.tier)
            .collect();
        let Some(best_tier) = candidates.iter().map(|n| n.level).max() else {
            break;
        };
        let ties: Vec<&TroopNode> = candidates
            .into_iter()
            .filter(|n| n.level == best_tier)
            .collect();
        current = ties[rng.random_range(0..ties.len())];
    }
    Some(current.id.clone())
}

fn eligible(node: &TroopNode) -> bool {
    node.active && !node.is_retinue
}

/// Breadth-first closest-tier search, the fallback when exact substitution
/// fails. An exact tier match is returned as soon as it is dequeued; among
/// inexact matches the smallest tier distance wins, earliest visit breaking
/// ties.
pub fn match_tier<'a>(
    registry: &'a TroopRegistry,
    root_id: &str,
    target_tier: u32,
) -> Option<&'a TroopNode> {
    let mut best: Option<&TroopNode> = None;
    let mut queue = VecDeque::from([root_id.to_string()]);
    while let Some(id) = queue.pop_front() {
        let Some(node) = registry.get(&id) else {
            continue;
        };
        if eligible(node) {
            if node.level == target_tier {
                return Some(node);
            }
            let distance = node.level.abs_diff(target_tier);
            if best.is_none_or(|b| distance < b.level.abs_diff(target_tier)) {
                best = Some(node);
            }
        }
        queue.extend(node.children.iter().cloned());
    }
    best
}

/// Aggregate per-class headcounts into the party's dominant formation class.
/// The largest headcount wins; ties fall to the higher-priority class
/// (infantry over ranged over cavalry over horse archer).
pub fn dominant_formation_class(
    counts: impl Iterator<Item = (FormationClass, u32)>,
) -> Option<FormationClass> {
    let mut totals: [(FormationClass, u32); 4] = [
        (FormationClass::Infantry, 0),
        (FormationClass::Ranged, 0),
        (FormationClass::Cavalry, 0),
        (FormationClass::HorseArcher, 0),
    ];
    for (class, count) in counts {
        let slot = match class {
            FormationClass::Infantry => 0,
            FormationClass::Ranged => 1,
            FormationClass::Cavalry => 2,
            FormationClass::HorseArcher => 3,
        };
        totals[slot].1 += count;
    }
    totals
        .into_iter()
        .filter(|(_, count)| *count > 0)
        .max_by(|a, b| a.1.cmp(&b.1).then(b.0.cmp(&a.0)))
        .map(|(class, _)| class)
}
