use serde::{Deserialize, Serialize};
use slotmap::new_key_type;

new_key_type! {
    /// Identifies a machine instance (placed or carried) in the arena.
    pub struct MachineId;
}

/// Identifies a machine type in the registry. Cheap to copy and compare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MachineTypeId(pub u32);

/// Identifies an item type produced or consumed by a machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ItemTypeId(pub u32);
