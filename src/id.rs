/// Prefix shared by every custom troop id. The index and the host use it to
/// tell custom units apart from vanilla catalog units.
pub const CUSTOM_ID_PREFIX: &str = "retinues_custom_";

/// Returns true if `id` belongs to the custom namespace.
pub fn is_custom_id(id: &str) -> bool {
    id.starts_with(CUSTOM_ID_PREFIX)
}

/// Monotonic allocator for namespaced custom troop ids.
///
/// Ids are globally unique within a session and are never reused, even after
/// the troop they named is deleted. Zero-padded serials keep lexicographic
/// and allocation order identical.
#[derive(Debug)]
pub struct TroopIdAllocator {
    next: u64,
}

impl TroopIdAllocator {
    pub fn new() -> Self {
        Self { next: 1 }
    }

    /// Resume allocation past every id in `existing`, so that ids restored
    /// from a save can never collide with newly allocated ones.
    pub fn resuming_after<'a>(existing: impl Iterator<Item = &'a str>) -> Self {
        let max_serial = existing.filter_map(parse_serial).max().unwrap_or(0);
        Self {
            next: max_serial + 1,
        }
    }

    pub fn next_id(&mut self) -> String {
        let id = format!("{CUSTOM_ID_PREFIX}{:06}", self.next);
        self.next += 1;
        id
    }
}

impl Default for TroopIdAllocator {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_serial(id: &str) -> Option<u64> {
    id.strip_prefix(CUSTOM_ID_PREFIX)?.parse().ok()
}
