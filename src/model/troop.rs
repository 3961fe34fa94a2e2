use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::equipment::EquipmentSet;
use crate::id::is_custom_id;

/// One custom unit: a node in a faction's private upgrade tree.
///
/// Structure invariants (enforced by the session's mutation entry points,
/// checked by `Session::check_tree`):
/// - at most one parent; a node appears exactly once in its parent's
///   `children`
/// - the ancestor chain always terminates at a root (`parent_id == None`)
/// - `faction_id` is uniform across a subtree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TroopNode {
    pub id: String,
    /// The vanilla unit this node was cloned from; used for cosmetic
    /// fallback and for reconstruction at load time.
    pub vanilla_id: Option<String>,
    pub faction_id: String,
    pub is_elite: bool,
    /// Standalone retinue slot, outside the elite/basic trees.
    #[serde(default)]
    pub is_retinue: bool,
    pub name: String,
    /// Tier. Monotonic non-negative; raised by rank-ups, never lowered.
    pub level: u32,
    pub is_female: bool,
    pub skills: BTreeMap<String, u32>,
    pub equipment: Vec<EquipmentSet>,
    pub parent_id: Option<String>,
    pub children: Vec<String>,
    /// Root-to-node path of sibling indices; empty for roots. Used for
    /// deterministic ordering and reconstruction after partial loads.
    pub position: Vec<usize>,
    /// Whether the node is materialized in the host's object registry.
    /// Inactive nodes are logically deleted but may still be referenced by
    /// saved rosters until swapped out.
    pub active: bool,
}

impl TroopNode {
    pub fn is_custom(&self) -> bool {
        is_custom_id(&self.id)
    }

    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    /// Battle (non-civilian) equipment sets, in declaration order.
    pub fn battle_sets(&self) -> impl Iterator<Item = &EquipmentSet> {
        self.equipment.iter().filter(|set| !set.civilian)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(id: &str) -> TroopNode {
        TroopNode {
            id: id.to_string(),
            vanilla_id: Some("vlandia_recruit".to_string()),
            faction_id: "player_clan".to_string(),
            is_elite: false,
            is_retinue: false,
            name: "Clan Recruit".to_string(),
            level: 1,
            is_female: false,
            skills: BTreeMap::from([("athletics".to_string(), 20)]),
            equipment: vec![
                EquipmentSet::battle("body:gambeson"),
                EquipmentSet::civilian("body:tunic"),
            ],
            parent_id: None,
            children: vec![],
            position: vec![],
            active: true,
        }
    }

    #[test]
    fn custom_flag_follows_id_namespace() {
        assert!(node("retinues_custom_000001").is_custom());
        assert!(!node("vlandia_recruit").is_custom());
    }

    #[test]
    fn battle_sets_exclude_civilian() {
        let n = node("retinues_custom_000001");
        let codes: Vec<&str> = n.battle_sets().map(|s| s.code.as_str()).collect();
        assert_eq!(codes, vec!["body:gambeson"]);
    }

    #[test]
    fn serializes_expected_shape() {
        let n = node("retinues_custom_000001");
        let json = serde_json::to_value(&n).unwrap();
        assert_eq!(json["id"], "retinues_custom_000001");
        assert_eq!(json["vanilla_id"], "vlandia_recruit");
        assert_eq!(json["level"], 1);
        assert_eq!(json["skills"]["athletics"], 20);
        assert!(json["parent_id"].is_null());
        assert_eq!(json["position"], serde_json::json!([]));
    }

    #[test]
    fn round_trips_through_json() {
        let n = node("retinues_custom_000007");
        let json = serde_json::to_string(&n).unwrap();
        let back: TroopNode = serde_json::from_str(&json).unwrap();
        assert_eq!(back, n);
    }
}
