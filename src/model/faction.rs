use serde::{Deserialize, Serialize};

/// A faction's entry points into its private troop forest: one root per
/// elite/basic line plus two standalone retinue slots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactionRoster {
    pub faction_id: String,
    pub name: String,
    pub culture_id: String,
    pub elite_root: Option<String>,
    pub basic_root: Option<String>,
    #[serde(default)]
    pub retinue_elite: Option<String>,
    #[serde(default)]
    pub retinue_basic: Option<String>,
}

impl FactionRoster {
    pub fn new(
        faction_id: impl Into<String>,
        name: impl Into<String>,
        culture_id: impl Into<String>,
    ) -> Self {
        Self {
            faction_id: faction_id.into(),
            name: name.into(),
            culture_id: culture_id.into(),
            elite_root: None,
            basic_root: None,
            retinue_elite: None,
            retinue_basic: None,
        }
    }

    pub fn root(&self, is_elite: bool) -> Option<&str> {
        if is_elite {
            self.elite_root.as_deref()
        } else {
            self.basic_root.as_deref()
        }
    }

    pub fn retinue(&self, is_elite: bool) -> Option<&str> {
        if is_elite {
            self.retinue_elite.as_deref()
        } else {
            self.retinue_basic.as_deref()
        }
    }

    /// True once either tree root has been materialized. Callers check this
    /// before invoking the tree builder so setup stays idempotent.
    pub fn has_tree(&self) -> bool {
        self.elite_root.is_some() || self.basic_root.is_some()
    }
}
