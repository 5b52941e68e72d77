use crate::fixed::Ticks;
use crate::id::{ItemTypeId, MachineTypeId};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Production cycle
// ---------------------------------------------------------------------------

/// An in-progress production cycle: what the machine is making, how long is
/// left, and what consumables the cycle will charge on collection.
///
/// The `*_adjusted` flags are the per-cycle idempotence markers. They are
/// born unset when a cycle begins and are never cleared within a cycle, so
/// each extension point rewrites a given cycle at most once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductionCycle {
    pub output: ItemTypeId,
    /// Output units yielded on collection. Base cycles always start at 1.
    pub quantity: u32,
    /// In-game minutes until the output is ready.
    pub minutes_remaining: Ticks,
    /// Consumable inputs charged for this cycle (0 for fuel-less types).
    pub fuel_cost: u32,
    #[serde(default)]
    pub duration_adjusted: bool,
    #[serde(default)]
    pub output_adjusted: bool,
}

impl ProductionCycle {
    /// Start a fresh, unadjusted cycle yielding one unit of `output`.
    pub fn new(output: ItemTypeId, minutes: Ticks, fuel_cost: u32) -> Self {
        Self {
            output,
            quantity: 1,
            minutes_remaining: minutes,
            fuel_cost,
            duration_adjusted: false,
            output_adjusted: false,
        }
    }

    pub fn is_ready(&self) -> bool {
        self.minutes_remaining == 0
    }
}

// ---------------------------------------------------------------------------
// Machine instance
// ---------------------------------------------------------------------------

/// A machine instance: one inventory slot or placed tile.
///
/// Invariants maintained by the combination store and operations:
/// - `stack >= 1` always.
/// - `combined_quantity`, when present, is `>= 1`; a combined instance
///   (`combined_quantity > 1`) always has `stack == 1`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MachineInstance {
    pub machine_type: MachineTypeId,
    pub stack: u32,
    /// Logical count of merged copies. Absent = not combined.
    #[serde(default)]
    pub combined_quantity: Option<u32>,
    /// In-progress production, if any.
    #[serde(default)]
    pub cycle: Option<ProductionCycle>,
}

impl MachineInstance {
    pub fn new(machine_type: MachineTypeId, stack: u32) -> Self {
        Self {
            machine_type,
            stack: stack.max(1),
            combined_quantity: None,
            cycle: None,
        }
    }

    /// Whether a combined quantity is recorded, even a transient value of 1.
    pub fn is_combined(&self) -> bool {
        self.combined_quantity.is_some()
    }

    /// The number of physical machines this instance stands for:
    /// the combined quantity when present, otherwise the stack count.
    pub fn logical_quantity(&self) -> u32 {
        self.combined_quantity.unwrap_or(self.stack)
    }
}
