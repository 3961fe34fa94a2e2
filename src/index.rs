use std::collections::BTreeMap;

use crate::model::FactionRoster;
use crate::registry::TroopRegistry;

/// Reverse lookups over the troop forest: unit id → owning faction and
/// child id → parent id.
///
/// Rebuilt on demand from the rosters and the registry; it is the only
/// source of truth the matcher and the wrap path consult, and it never
/// mutates a node. A miss means "not a tracked unit" and callers fall back
/// to vanilla behavior.
#[derive(Debug, Default)]
pub struct TroopIndex {
    faction_by_unit: BTreeMap<String, String>,
    parent_by_child: BTreeMap<String, String>,
}

impl TroopIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear and repopulate both maps by walking every faction's elite and
    /// basic trees plus its retinue slots. Callable repeatedly; always
    /// called after load-reconstruction and before the matcher runs.
    pub fn rebuild<'a>(
        &mut self,
        rosters: impl Iterator<Item = &'a FactionRoster>,
        registry: &TroopRegistry,
    ) {
        self.faction_by_unit.clear();
        self.parent_by_child.clear();

        for roster in rosters {
            let roots = [
                roster.elite_root.as_deref(),
                roster.basic_root.as_deref(),
                roster.retinue_elite.as_deref(),
                roster.retinue_basic.as_deref(),
            ];
            for root in roots.into_iter().flatten() {
                for node in registry.walk_tree(root) {
                    self.faction_by_unit
                        .insert(node.id.clone(), roster.faction_id.clone());
                    if let Some(parent) = &node.parent_id {
                        self.parent_by_child.insert(node.id.clone(), parent.clone());
                    }
                }
            }
        }
    }

    pub fn try_get_faction(&self, id: &str) -> Option<&str> {
        self.faction_by_unit.get(id).map(String::as_str)
    }

    pub fn try_get_parent(&self, id: &str) -> Option<&str> {
        self.parent_by_child.get(id).map(String::as_str)
    }

    /// Remove one id from both maps. Does not cascade: callers invalidate
    /// each affected id themselves when removing a subtree.
    pub fn invalidate(&mut self, id: &str) {
        self.faction_by_unit.remove(id);
        self.parent_by_child.remove(id);
    }

    #[cfg(test)]
    pub(crate) fn set_parent(&mut self, child: &str, parent: &str) {
        self.parent_by_child
            .insert(child.to_string(), parent.to_string());
    }

    pub fn len(&self) -> usize {
        self.faction_by_unit.len()
    }

    pub fn is_empty(&self) -> bool {
        self.faction_by_unit.is_empty()
    }
}
