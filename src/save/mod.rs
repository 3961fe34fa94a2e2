pub mod legacy;
pub mod pipeline;
pub mod record;

pub use pipeline::{SaveError, collect, materialize_faction, read_save, write_save};
pub use record::{CURRENT_VERSION, FactionRecord, SaveFile, TroopRecord};
