pub mod builder;
pub mod catalog;
pub mod config;
pub mod id;
pub mod index;
pub mod matcher;
pub mod model;
pub mod registry;
pub mod save;
pub mod session;
pub mod testutil;
pub mod unlocks;
pub mod xp;

pub use catalog::{Catalog, CatalogUnit, Culture, FormationClass};
pub use config::{Config, OrphanPolicy};
pub use id::TroopIdAllocator;
pub use index::TroopIndex;
pub use model::{EquipmentSet, FactionRoster, TroopNode};
pub use registry::TroopRegistry;
pub use session::{PartyStack, Session, SessionPhase};
pub use xp::ExperiencePools;
