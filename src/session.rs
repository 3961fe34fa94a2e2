use std::collections::BTreeSet;
use std::path::Path;

use rand::RngCore;

use crate::builder::{BuildContext, CloneOptions, build_retinue, clone_tree};
use crate::catalog::Catalog;
use crate::config::{Config, OrphanPolicy};
use crate::id::TroopIdAllocator;
use crate::index::TroopIndex;
use crate::matcher::{match_tier, pick_best};
use crate::model::FactionRoster;
use crate::model::equipment::{CombatContext, set_alternate_enabled};
use crate::registry::TroopRegistry;
use crate::save::pipeline::{self, SaveError, assign_positions};
use crate::save::record::SaveFile;
use crate::unlocks::{ItemStocks, UnlockRegistry};
use crate::xp::{EncounterLedger, ExperiencePools, pool_key, training_credit};

/// Where the session is in the host's startup sequence. Staged save data is
/// only flushed once `Ready`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Loading,
    Ready,
}

/// One custom-troop roster stack in a party, as reported by the host for
/// the daily tick.
#[derive(Debug, Clone, Copy)]
pub struct PartyStack<'a> {
    pub unit_id: &'a str,
    pub headcount: u32,
    /// Effective daily experience per member, garrison and perk bonuses
    /// already applied by the host.
    pub daily_xp_each: f32,
}

/// The engine's root object: owns every service and exposes the host
/// callback surface. One session per campaign; `clear`-style teardown is a
/// drop.
pub struct Session {
    catalog: Catalog,
    config: Config,
    registry: TroopRegistry,
    index: TroopIndex,
    rosters: Vec<FactionRoster>,
    pools: ExperiencePools,
    unlocks: UnlockRegistry,
    stocks: ItemStocks,
    ids: TroopIdAllocator,
    ledger: EncounterLedger,
    /// Save data staged by `load_from`, flushed when the session is ready.
    pending: Option<SaveFile>,
    phase: SessionPhase,
}

impl Session {
    pub fn new(catalog: Catalog, config: Config) -> Self {
        Self {
            catalog,
            config,
            registry: TroopRegistry::new(),
            index: TroopIndex::new(),
            rosters: vec![],
            pools: ExperiencePools::new(),
            unlocks: UnlockRegistry::new(),
            stocks: ItemStocks::new(),
            ids: TroopIdAllocator::new(),
            ledger: EncounterLedger::new(),
            pending: None,
            phase: SessionPhase::Loading,
        }
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn registry(&self) -> &TroopRegistry {
        &self.registry
    }

    pub fn index(&self) -> &TroopIndex {
        &self.index
    }

    pub fn pools(&self) -> &ExperiencePools {
        &self.pools
    }

    pub fn unlocks(&self) -> &UnlockRegistry {
        &self.unlocks
    }

    pub fn unlocks_mut(&mut self) -> &mut UnlockRegistry {
        &mut self.unlocks
    }

    pub fn stocks(&self) -> &ItemStocks {
        &self.stocks
    }

    pub fn stocks_mut(&mut self) -> &mut ItemStocks {
        &mut self.stocks
    }

    pub fn roster(&self, faction_id: &str) -> Option<&FactionRoster> {
        self.rosters.iter().find(|r| r.faction_id == faction_id)
    }

    pub fn rosters(&self) -> &[FactionRoster] {
        &self.rosters
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    // ---- lifecycle -------------------------------------------------------

    /// Track a faction. No trees are built until `ensure_troops_exist`.
    pub fn register_faction(
        &mut self,
        faction_id: impl Into<String>,
        name: impl Into<String>,
        culture_id: impl Into<String>,
    ) {
        let faction_id = faction_id.into();
        if self.roster(&faction_id).is_none() {
            self.rosters
                .push(FactionRoster::new(faction_id, name, culture_id));
        }
    }

    /// Read a save of any known schema and stage it. If the session is
    /// already ready the staged data is flushed immediately, otherwise it
    /// waits for `launch` or a later checkpoint.
    pub fn load_from(&mut self, path: &Path) -> Result<(), SaveError> {
        let file = pipeline::read_save(path)?;
        self.pending = Some(file);
        self.flush_pending();
        Ok(())
    }

    /// Host signal that the campaign session is fully constructed: flush
    /// staged data and rebuild the index.
    pub fn launch(&mut self) {
        self.phase = SessionPhase::Ready;
        self.flush_pending();
        self.index.rebuild(self.rosters.iter(), &self.registry);
    }

    /// Move staged save data into the live services. Consuming the staging
    /// buffer makes a second flush a no-op, so pools are never
    /// double-credited and unlocks never double-inserted.
    fn flush_pending(&mut self) {
        if self.phase != SessionPhase::Ready {
            return;
        }
        let Some(file) = self.pending.take() else {
            return;
        };
        tracing::info!(factions = file.factions.len(), "flushing staged save data");
        for record in &file.factions {
            let live = self
                .rosters
                .iter()
                .position(|r| r.faction_id == record.faction_id);
            // A faction registered at setup has an empty, tree-less roster;
            // the saved trees land in its slots. Only a roster that already
            // carries live trees wins over the record.
            if let Some(pos) = live
                && self.rosters[pos].has_tree()
            {
                tracing::warn!(faction = %record.faction_id, "faction already has live trees, skipping record");
                continue;
            }
            let loaded = pipeline::materialize_faction(
                record,
                &self.catalog,
                self.config.orphan_policy,
                &mut self.registry,
            );
            match live {
                Some(pos) => {
                    let roster = &mut self.rosters[pos];
                    roster.elite_root = loaded.elite_root;
                    roster.basic_root = loaded.basic_root;
                    roster.retinue_elite = loaded.retinue_elite;
                    roster.retinue_basic = loaded.retinue_basic;
                }
                None => self.rosters.push(loaded),
            }
        }
        for (key, balance) in &file.xp_pools {
            self.pools.add(key, *balance);
        }
        for item in &file.unlocked_items {
            self.unlocks.unlock(item);
        }
        for (item, count) in &file.item_stocks {
            self.stocks.add(item, *count);
        }
        self.ids = TroopIdAllocator::resuming_after(self.registry.ids());
        self.index.rebuild(self.rosters.iter(), &self.registry);
    }

    /// Snapshot everything to disk in the current schema. A still-pending
    /// staging buffer is flushed first, or, when the session is not ready
    /// yet, merged into the written document, so staged data never goes
    /// missing from a save.
    pub fn save_to(&mut self, path: &Path) -> Result<(), SaveError> {
        self.flush_pending();
        let mut file = pipeline::collect(
            &self.registry,
            &self.rosters,
            &self.pools,
            &self.unlocks,
            &self.stocks,
        );
        if let Some(pending) = &self.pending {
            file.merge_staged(pending);
        }
        pipeline::write_save(path, &file)
    }

    /// Daily host tick: retry a pending flush, then credit training XP for
    /// each custom stack, `daily_xp * headcount * multiplier` per line.
    pub fn on_daily_tick(&mut self, stacks: &[PartyStack<'_>]) {
        self.flush_pending();
        for stack in stacks {
            if !self.registry.contains(stack.unit_id) {
                continue;
            }
            let credit = training_credit(
                stack.daily_xp_each,
                stack.headcount,
                self.config.training_xp_multiplier,
            );
            if credit > 0 {
                let key = self.pool_key_for(stack.unit_id);
                self.pools.add(&key, credit);
            }
        }
    }

    /// Record one kill for the running encounter. Non-custom killers are
    /// ignored; the credit lands at `on_battle_end`.
    pub fn record_kill(&mut self, killer_id: &str, victim_tier: u32) {
        if self.registry.contains(killer_id) {
            self.ledger.record_kill(killer_id, victim_tier);
        }
    }

    /// Settle the encounter ledger into the pools, once.
    pub fn on_battle_end(&mut self) {
        let ledger = std::mem::take(&mut self.ledger);
        let (index, registry, config) = (&self.index, &self.registry, &self.config);
        ledger.settle(&mut self.pools, config.xp_per_tier, |unit_id| {
            let faction = index
                .try_get_faction(unit_id)
                .map(str::to_string)
                .or_else(|| registry.get(unit_id).map(|n| n.faction_id.clone()))
                .unwrap_or_default();
            pool_key(config, unit_id, &faction)
        });
    }

    /// Substitute a recruitment offer: exact tier first, then the
    /// closest-tier fallback on the same line's tree.
    pub fn on_recruit(
        &mut self,
        reference_id: &str,
        faction_id: &str,
        rng: &mut dyn RngCore,
    ) -> Option<String> {
        let roster = self.roster(faction_id)?;
        if let Some(exact) = pick_best(
            &self.registry,
            &self.catalog,
            roster,
            reference_id,
            true,
            rng,
        ) {
            return Some(exact);
        }
        let reference = self.catalog.unit(reference_id)?;
        let is_elite = self
            .catalog
            .is_elite_line(&roster.culture_id, reference_id);
        let root = roster.root(is_elite)?;
        match_tier(&self.registry, root, reference.tier).map(|n| n.id.clone())
    }

    /// Substitute a settlement's volunteer slot: the tier-bounded downward
    /// walk, randomized among equal-tier branches.
    pub fn on_volunteer_refresh(
        &mut self,
        reference_id: &str,
        faction_id: &str,
        rng: &mut dyn RngCore,
    ) -> Option<String> {
        let roster = self.roster(faction_id)?;
        pick_best(
            &self.registry,
            &self.catalog,
            roster,
            reference_id,
            false,
            rng,
        )
    }

    // ---- tree building ---------------------------------------------------

    /// Materialize the faction's trees from its culture roots if it has
    /// none yet. Returns false when the faction is unknown, its culture is,
    /// or the trees already exist, so repeated calls are harmless.
    pub fn ensure_troops_exist(&mut self, faction_id: &str) -> bool {
        let Some(pos) = self.rosters.iter().position(|r| r.faction_id == faction_id) else {
            return false;
        };
        if self.rosters[pos].has_tree() {
            return false;
        }
        let roster = self.rosters[pos].clone();
        let Some(culture) = self.catalog.culture(&roster.culture_id).cloned() else {
            tracing::warn!(faction = %faction_id, culture = %roster.culture_id, "unknown culture, no trees built");
            return false;
        };

        let mut ctx = BuildContext {
            catalog: &self.catalog,
            config: &self.config,
            registry: &mut self.registry,
            ids: &mut self.ids,
            unlocks: &mut self.unlocks,
        };
        let elite_root = clone_tree(
            &mut ctx,
            &culture.elite_root,
            &roster,
            true,
            None,
            CloneOptions::default(),
        );
        let basic_root = clone_tree(
            &mut ctx,
            &culture.basic_root,
            &roster,
            false,
            None,
            CloneOptions::default(),
        );
        let retinue_elite = build_retinue(&mut ctx, &roster, true);
        let retinue_basic = build_retinue(&mut ctx, &roster, false);

        let roster = &mut self.rosters[pos];
        roster.elite_root = elite_root;
        roster.basic_root = basic_root;
        roster.retinue_elite = retinue_elite;
        roster.retinue_basic = retinue_basic;
        self.index.rebuild(self.rosters.iter(), &self.registry);
        true
    }

    /// Clone one catalog unit as a new upgrade child of `parent_id`.
    pub fn add_child(&mut self, parent_id: &str, source_unit_id: &str) -> Option<String> {
        let parent = self.registry.get(parent_id)?;
        if parent.is_retinue {
            return None;
        }
        let (faction_id, is_elite) = (parent.faction_id.clone(), parent.is_elite);
        let roster = self.roster(&faction_id)?.clone();

        let mut ctx = BuildContext {
            catalog: &self.catalog,
            config: &self.config,
            registry: &mut self.registry,
            ids: &mut self.ids,
            unlocks: &mut self.unlocks,
        };
        let id = clone_tree(
            &mut ctx,
            source_unit_id,
            &roster,
            is_elite,
            Some(parent_id),
            CloneOptions {
                keep_upgrades: false,
                ..CloneOptions::default()
            },
        )?;
        self.index.rebuild(self.rosters.iter(), &self.registry);
        Some(id)
    }

    // ---- tree mutations ---------------------------------------------------

    pub fn rename(&mut self, id: &str, name: impl Into<String>) -> bool {
        match self.registry.get_mut(id) {
            Some(node) => {
                node.name = name.into();
                true
            }
            None => false,
        }
    }

    /// Toggle one of a troop's battle equipment alternates for a combat
    /// context. Disabling the last enabled alternate for a context is
    /// rejected.
    pub fn set_equipment_enabled(
        &mut self,
        id: &str,
        alt_index: usize,
        context: CombatContext,
        enabled: bool,
    ) -> bool {
        match self.registry.get_mut(id) {
            Some(node) => set_alternate_enabled(&mut node.equipment, alt_index, context, enabled),
            None => false,
        }
    }

    /// Move `id` (and its subtree) under `new_parent_id`. Rejected when
    /// either node is missing, the factions differ, the target is a retinue,
    /// or the move would put a node inside its own subtree.
    pub fn reparent(&mut self, id: &str, new_parent_id: &str) -> bool {
        if id == new_parent_id {
            return false;
        }
        let (Some(node), Some(target)) = (self.registry.get(id), self.registry.get(new_parent_id))
        else {
            return false;
        };
        if node.faction_id != target.faction_id || target.is_retinue || node.is_retinue {
            return false;
        }
        // Roster slots must keep pointing at true roots.
        if self.is_slot_root(id) {
            return false;
        }
        // Cycle check: the target must not sit in the moving subtree.
        let subtree: BTreeSet<String> = self
            .registry
            .walk_tree(id)
            .iter()
            .map(|n| n.id.to_string())
            .collect();
        if subtree.contains(new_parent_id) {
            return false;
        }

        let old_parent = node.parent_id.clone();
        if let Some(old_parent) = &old_parent
            && let Some(parent) = self.registry.get_mut(old_parent)
        {
            parent.children.retain(|c| c != id);
        }
        if let Some(target) = self.registry.get_mut(new_parent_id) {
            target.children.push(id.to_string());
        }
        if let Some(node) = self.registry.get_mut(id) {
            node.parent_id = Some(new_parent_id.to_string());
        }

        let root = self.root_of(new_parent_id);
        assign_positions(&mut self.registry, &root);
        if let Some(old_parent) = &old_parent {
            let old_root = self.root_of(old_parent);
            if old_root != root {
                assign_positions(&mut self.registry, &old_root);
            }
        }
        self.index.rebuild(self.rosters.iter(), &self.registry);
        true
    }

    /// Remove a troop under the configured orphan policy. Re-homing a
    /// root's children has no grandparent to target, so a root with
    /// children is rejected under `ReparentToGrandparent`.
    pub fn remove_troop(&mut self, id: &str) -> bool {
        let Some(node) = self.registry.get(id).cloned() else {
            return false;
        };
        match (self.config.orphan_policy, node.parent_id.as_deref()) {
            (OrphanPolicy::ReparentToGrandparent, Some(parent_id)) => {
                for child in &node.children {
                    if let Some(child) = self.registry.get_mut(child) {
                        child.parent_id = Some(parent_id.to_string());
                    }
                }
                if let Some(parent) = self.registry.get_mut(parent_id) {
                    match parent.children.iter().position(|c| c == id) {
                        Some(at) => {
                            parent.children.splice(at..at + 1, node.children.clone());
                        }
                        None => parent.children.extend(node.children.clone()),
                    }
                }
                self.registry.remove(id);
                self.index.invalidate(id);
                let root = self.root_of(parent_id);
                assign_positions(&mut self.registry, &root);
            }
            (OrphanPolicy::ReparentToGrandparent, None) => {
                if !node.children.is_empty() {
                    return false;
                }
                self.registry.remove(id);
                self.index.invalidate(id);
                self.clear_roster_slots(id);
            }
            (OrphanPolicy::Discard, _) => {
                let doomed: Vec<String> = self
                    .registry
                    .walk_tree(id)
                    .iter()
                    .map(|n| n.id.to_string())
                    .collect();
                if let Some(parent_id) = node.parent_id.as_deref()
                    && let Some(parent) = self.registry.get_mut(parent_id)
                {
                    parent.children.retain(|c| c != id);
                }
                for doomed_id in &doomed {
                    self.registry.remove(doomed_id);
                    self.index.invalidate(doomed_id);
                }
                if let Some(parent_id) = node.parent_id.as_deref() {
                    let root = self.root_of(parent_id);
                    assign_positions(&mut self.registry, &root);
                } else {
                    self.clear_roster_slots(id);
                }
            }
        }
        // Re-homed children carry new parents; stale reverse-map entries
        // must not survive the removal.
        self.index.rebuild(self.rosters.iter(), &self.registry);
        true
    }

    /// Structural audit of one tree: every id resolves, parent/child links
    /// agree, the faction is uniform, and no node is reachable twice.
    pub fn check_tree(&self, root_id: &str) -> bool {
        let Some(root) = self.registry.get(root_id) else {
            return false;
        };
        let faction = &root.faction_id;
        let mut seen = BTreeSet::new();
        let mut stack = vec![root_id.to_string()];
        while let Some(id) = stack.pop() {
            if !seen.insert(id.clone()) {
                return false;
            }
            let Some(node) = self.registry.get(&id) else {
                return false;
            };
            if &node.faction_id != faction {
                return false;
            }
            for child in &node.children {
                let Some(child_node) = self.registry.get(child) else {
                    return false;
                };
                if child_node.parent_id.as_deref() != Some(id.as_str()) {
                    return false;
                }
                stack.push(child.clone());
            }
        }
        true
    }

    fn pool_key_for(&self, unit_id: &str) -> String {
        let faction = self
            .index
            .try_get_faction(unit_id)
            .map(str::to_string)
            .or_else(|| self.registry.get(unit_id).map(|n| n.faction_id.clone()))
            .unwrap_or_default();
        pool_key(&self.config, unit_id, &faction)
    }

    fn root_of(&self, id: &str) -> String {
        let mut current = id.to_string();
        while let Some(parent) = self
            .registry
            .get(&current)
            .and_then(|n| n.parent_id.clone())
        {
            current = parent;
        }
        current
    }

    fn is_slot_root(&self, id: &str) -> bool {
        self.rosters.iter().any(|r| {
            [
                r.elite_root.as_deref(),
                r.basic_root.as_deref(),
                r.retinue_elite.as_deref(),
                r.retinue_basic.as_deref(),
            ]
            .contains(&Some(id))
        })
    }

    fn clear_roster_slots(&mut self, id: &str) {
        for roster in &mut self.rosters {
            for slot in [
                &mut roster.elite_root,
                &mut roster.basic_root,
                &mut roster.retinue_elite,
                &mut roster.retinue_basic,
            ] {
                if slot.as_deref() == Some(id) {
                    *slot = None;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{ready_session, sample_catalog};

    #[test]
    fn ensure_troops_exist_is_idempotent() {
        let mut session = ready_session();
        assert!(session.ensure_troops_exist("player_clan"));
        let built = session.registry().len();
        assert!(built > 0);
        assert!(!session.ensure_troops_exist("player_clan"));
        assert_eq!(session.registry().len(), built);

        let roster = session.roster("player_clan").unwrap();
        assert!(roster.elite_root.is_some());
        assert!(roster.basic_root.is_some());
        assert!(roster.retinue_elite.is_some());
        assert!(roster.retinue_basic.is_some());
    }

    #[test]
    fn built_trees_pass_the_structural_audit() {
        let mut session = ready_session();
        session.ensure_troops_exist("player_clan");
        let roster = session.roster("player_clan").unwrap().clone();
        assert!(session.check_tree(roster.elite_root.as_deref().unwrap()));
        assert!(session.check_tree(roster.basic_root.as_deref().unwrap()));
    }

    #[test]
    fn unknown_faction_builds_nothing() {
        let mut session = ready_session();
        assert!(!session.ensure_troops_exist("nobody"));
        assert!(session.registry().is_empty());
    }

    #[test]
    fn reparent_rejects_cycles() {
        let mut session = ready_session();
        session.ensure_troops_exist("player_clan");
        let root = session
            .roster("player_clan")
            .unwrap()
            .basic_root
            .clone()
            .unwrap();
        let child = session.registry().get(&root).unwrap().children[0].clone();

        assert!(!session.reparent(&root, &child));
        assert!(!session.reparent(&root, &root));
        assert!(session.check_tree(&root));
    }

    #[test]
    fn reparent_moves_a_subtree() {
        let mut session = ready_session();
        session.ensure_troops_exist("player_clan");
        let roster = session.roster("player_clan").unwrap().clone();
        let basic_root = roster.basic_root.unwrap();
        let elite_root = roster.elite_root.unwrap();
        let moved = session.registry().get(&basic_root).unwrap().children[0].clone();

        assert!(session.reparent(&moved, &elite_root));
        assert_eq!(
            session.registry().get(&moved).unwrap().parent_id.as_deref(),
            Some(elite_root.as_str())
        );
        assert!(session.check_tree(&elite_root));
        assert!(session.check_tree(&basic_root));
        assert_eq!(session.index().try_get_parent(&moved), Some(elite_root.as_str()));
    }

    #[test]
    fn remove_reparents_children_to_grandparent() {
        let mut session = ready_session();
        session.ensure_troops_exist("player_clan");
        let root = session
            .roster("player_clan")
            .unwrap()
            .basic_root
            .clone()
            .unwrap();
        let middle = session.registry().get(&root).unwrap().children[0].clone();
        let grandchildren = session.registry().get(&middle).unwrap().children.clone();
        assert!(!grandchildren.is_empty());

        assert!(session.remove_troop(&middle));
        assert!(!session.registry().contains(&middle));
        for gc in &grandchildren {
            assert_eq!(
                session.registry().get(gc).unwrap().parent_id.as_deref(),
                Some(root.as_str())
            );
            // The reverse map must agree with the re-homed node, not keep
            // pointing at the removed one.
            assert_eq!(session.index().try_get_parent(gc), Some(root.as_str()));
        }
        assert_eq!(session.index().try_get_parent(&middle), None);
        assert_eq!(session.index().try_get_faction(&middle), None);
        assert!(session.check_tree(&root));
    }

    #[test]
    fn removing_a_root_with_children_is_rejected() {
        let mut session = ready_session();
        session.ensure_troops_exist("player_clan");
        let root = session
            .roster("player_clan")
            .unwrap()
            .basic_root
            .clone()
            .unwrap();
        assert!(!session.remove_troop(&root));
        assert!(session.registry().contains(&root));
    }

    #[test]
    fn battle_ledger_settles_once() {
        let mut session = ready_session();
        session.ensure_troops_exist("player_clan");
        let root = session
            .roster("player_clan")
            .unwrap()
            .basic_root
            .clone()
            .unwrap();

        session.record_kill(&root, 1);
        session.record_kill("vanilla_bandit", 1); // not custom, ignored
        session.on_battle_end();
        let balance = session.pools().get(&root);
        assert_eq!(balance, 5); // (1+1) * 2.5

        session.on_battle_end();
        assert_eq!(session.pools().get(&root), balance);
    }

    #[test]
    fn daily_tick_credits_training() {
        let mut session = ready_session();
        session.ensure_troops_exist("player_clan");
        let root = session
            .roster("player_clan")
            .unwrap()
            .basic_root
            .clone()
            .unwrap();

        session.on_daily_tick(&[
            PartyStack {
                unit_id: &root,
                headcount: 10,
                daily_xp_each: 4.0,
            },
            PartyStack {
                unit_id: "vanilla_bandit",
                headcount: 50,
                daily_xp_each: 4.0,
            },
        ]);
        assert_eq!(session.pools().get(&root), 8); // 4 * 10 * 0.2
    }

    #[test]
    fn equipment_toggle_respects_the_last_alternate_rule() {
        let mut session = ready_session();
        session.ensure_troops_exist("player_clan");
        let root = session
            .roster("player_clan")
            .unwrap()
            .basic_root
            .clone()
            .unwrap();

        // The cloned recruit has exactly one battle alternate; it can never
        // be fully disabled.
        assert!(!session.set_equipment_enabled(&root, 0, CombatContext::FieldBattle, false));
        assert!(session.set_equipment_enabled(&root, 0, CombatContext::FieldBattle, true));
        assert!(!session.set_equipment_enabled("ghost", 0, CombatContext::FieldBattle, true));
    }

    #[test]
    fn rename_hits_only_known_ids() {
        let mut session = ready_session();
        session.ensure_troops_exist("player_clan");
        let root = session
            .roster("player_clan")
            .unwrap()
            .basic_root
            .clone()
            .unwrap();
        assert!(session.rename(&root, "Veterans"));
        assert_eq!(session.registry().get(&root).unwrap().name, "Veterans");
        assert!(!session.rename("ghost", "Nope"));
    }

    #[test]
    fn add_child_extends_the_tree() {
        let mut session = ready_session();
        session.ensure_troops_exist("player_clan");
        let root = session
            .roster("player_clan")
            .unwrap()
            .basic_root
            .clone()
            .unwrap();

        let child = session.add_child(&root, "vlandia_footman").unwrap();
        let node = session.registry().get(&child).unwrap();
        assert_eq!(node.parent_id.as_deref(), Some(root.as_str()));
        assert!(node.children.is_empty());
        assert!(session.check_tree(&root));
        assert_eq!(
            session.index().try_get_faction(&child),
            Some("player_clan")
        );
    }

    #[test]
    fn retinues_accept_no_children() {
        let mut session = ready_session();
        session.ensure_troops_exist("player_clan");
        let retinue = session
            .roster("player_clan")
            .unwrap()
            .retinue_basic
            .clone()
            .unwrap();
        assert!(session.add_child(&retinue, "vlandia_footman").is_none());
    }

    #[test]
    fn loading_before_ready_stages_without_applying() {
        let catalog = sample_catalog();
        let mut session = Session::new(catalog, Config::default());
        session.pending = Some(SaveFile {
            version: crate::save::record::CURRENT_VERSION,
            xp_pools: std::collections::BTreeMap::from([("a".to_string(), 9)]),
            ..SaveFile::default()
        });

        session.flush_pending();
        assert!(session.has_pending());
        assert_eq!(session.pools().get("a"), 0);

        session.launch();
        assert!(!session.has_pending());
        assert_eq!(session.pools().get("a"), 9);

        // A second launch finds nothing to flush.
        session.launch();
        assert_eq!(session.pools().get("a"), 9);
    }
}
