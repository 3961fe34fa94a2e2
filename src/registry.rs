use std::collections::BTreeMap;

use crate::catalog::Catalog;
use crate::index::TroopIndex;
use crate::model::TroopNode;

/// Arena of `TroopNode` values addressed by stable string id.
///
/// "Wrap a host unit" is look-up-or-insert by id, so repeated wraps of the
/// same unit observe the same node. Entries are never evicted
/// during a session; `clear` exists for full-reset scenarios (campaign
/// reload).
#[derive(Debug, Default)]
pub struct TroopRegistry {
    nodes: BTreeMap<String, TroopNode>,
}

impl TroopRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &str) -> Option<&TroopNode> {
        self.nodes.get(id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut TroopNode> {
        self.nodes.get_mut(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    /// Insert a node, panicking on id re-use: ids are never recycled within
    /// a session, so a collision is a logic error, not host data.
    pub fn insert(&mut self, node: TroopNode) {
        let id = node.id.clone();
        let prior = self.nodes.insert(id.clone(), node);
        assert!(prior.is_none(), "registry: duplicate troop id {id}");
    }

    pub fn remove(&mut self, id: &str) -> Option<TroopNode> {
        self.nodes.remove(id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.nodes.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &TroopNode> {
        self.nodes.values()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Full reset at session teardown. Stale ids must never leak into the
    /// next session.
    pub fn clear(&mut self) {
        self.nodes.clear();
    }

    /// Look up `id`, wrapping the catalog unit into a facade node on first
    /// access. The facade's faction and parent are seeded from the index at
    /// construction time; a present parent is wrapped first, recursively, so
    /// parents always exist before their children.
    ///
    /// Returns `None` when the id is neither tracked nor in the catalog.
    pub fn get_or_wrap(
        &mut self,
        id: &str,
        catalog: &Catalog,
        index: &TroopIndex,
    ) -> Option<&TroopNode> {
        if !self.nodes.contains_key(id) {
            let unit = catalog.unit(id)?;
            let facade = TroopNode {
                id: unit.id.clone(),
                vanilla_id: None,
                faction_id: index.try_get_faction(id).unwrap_or_default().to_string(),
                is_elite: false,
                is_retinue: false,
                name: unit.name.clone(),
                level: unit.tier,
                is_female: unit.is_female,
                skills: unit.skills.clone(),
                equipment: unit.equipment.clone(),
                parent_id: index.try_get_parent(id).map(str::to_string),
                children: vec![],
                position: vec![],
                active: true,
            };
            if let Some(parent_id) = facade.parent_id.clone() {
                let _ = self.get_or_wrap(&parent_id, catalog, index);
            }
            self.nodes.insert(facade.id.clone(), facade);
        }
        self.nodes.get(id)
    }

    /// Walk a subtree depth-first, pre-order, from `root_id`. Missing child
    /// ids are skipped (a miss is "not tracked", never an error).
    pub fn walk_tree<'a>(&'a self, root_id: &str) -> Vec<&'a TroopNode> {
        let mut out = Vec::new();
        let mut stack = vec![root_id.to_string()];
        while let Some(id) = stack.pop() {
            let Some(node) = self.nodes.get(&id) else {
                continue;
            };
            out.push(node);
            // Reverse so children pop in declaration order.
            for child in node.children.iter().rev() {
                stack.push(child.clone());
            }
        }
        out
    }
}
