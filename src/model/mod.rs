pub mod equipment;
pub mod faction;
pub mod troop;

pub use equipment::{COMBAT_CONTEXTS, CombatContext, ContextFlags, EquipmentSet};
pub use faction::FactionRoster;
pub use troop::TroopNode;
