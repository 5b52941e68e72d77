//! Shared test helpers for integration tests and property tests.
//!
//! Gated behind `#[cfg(any(test, feature = "test-utils"))]` so these
//! helpers are available in unit tests, integration tests, and downstream
//! test crates (via the `test-utils` feature).

use crate::config::ModConfig;
use crate::engine::Engine;
use crate::fixed::Fixed64;
use crate::id::{ItemTypeId, MachineId, MachineTypeId};
use crate::machine::MachineInstance;
use crate::registry::{MachineRegistry, RegistryBuilder};

// ===========================================================================
// Fixed-point helper
// ===========================================================================

pub fn fixed(v: f64) -> Fixed64 {
    Fixed64::from_num(v)
}

// ===========================================================================
// Machine type constructors (registration order fixes the IDs)
// ===========================================================================

pub fn furnace() -> MachineTypeId {
    MachineTypeId(0)
}
pub fn keg() -> MachineTypeId {
    MachineTypeId(1)
}
pub fn preserves_jar() -> MachineTypeId {
    MachineTypeId(2)
}
pub fn charcoal_kiln() -> MachineTypeId {
    MachineTypeId(3)
}
/// Ordinarily stackable, combinable only via the allow-list.
pub fn crab_pot() -> MachineTypeId {
    MachineTypeId(4)
}
/// Ordinarily stackable and NOT allow-listed: never combinable.
pub fn tapper() -> MachineTypeId {
    MachineTypeId(5)
}

// ===========================================================================
// Item type constructors
// ===========================================================================

pub fn iron_bar() -> ItemTypeId {
    ItemTypeId(0)
}
pub fn wine() -> ItemTypeId {
    ItemTypeId(1)
}
pub fn jelly() -> ItemTypeId {
    ItemTypeId(2)
}
pub fn charcoal() -> ItemTypeId {
    ItemTypeId(3)
}

// ===========================================================================
// Fixtures
// ===========================================================================

/// Registry with the machine types above, frozen.
pub fn test_registry() -> MachineRegistry {
    let mut b = RegistryBuilder::new();
    b.register_machine("Furnace", true, true);
    b.register_machine("Keg", true, false);
    b.register_machine("Preserves Jar", true, false);
    b.register_machine("Charcoal Kiln", true, true);
    let pot = b.register_machine("Crab Pot", false, false);
    b.register_machine("Tapper", false, false);
    b.allow_combining(pot);
    b.build().expect("test registry is valid")
}

/// Engine over [`test_registry`] with default config and 12 inventory slots.
pub fn test_engine() -> Engine {
    Engine::new(test_registry(), ModConfig::default(), 12)
}

/// Put a fresh machine into `slot`.
pub fn place_machine(
    engine: &mut Engine,
    slot: usize,
    machine_type: MachineTypeId,
    stack: u32,
) -> MachineId {
    engine
        .place_in_slot(slot, MachineInstance::new(machine_type, stack))
        .expect("slot is free")
}

/// Stage a fresh machine on the cursor.
pub fn stage_machine(engine: &mut Engine, machine_type: MachineTypeId, stack: u32) -> MachineId {
    engine
        .stage_on_cursor(MachineInstance::new(machine_type, stack))
        .expect("cursor is free")
}
