//! Typed access to the combined-quantity state persisted on a machine
//! instance.
//!
//! In memory the quantity lives in `MachineInstance::combined_quantity`;
//! on disk it round-trips through the host's string attribute bag as a
//! decimal string under [`COMBINED_QUANTITY_KEY`]. A malformed persisted
//! value is treated as "not combined" and never as a fatal error.

use crate::machine::MachineInstance;
use crate::registry::MachineRegistry;
use std::collections::BTreeMap;

/// Attribute-bag key under which the combined quantity is persisted.
pub const COMBINED_QUANTITY_KEY: &str = "ganged.CombinedQuantity";

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Precondition violations on quantity writes. These surface programming
/// errors; normal user interaction paths must never reach them.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("only combinable machine types can hold a combined quantity")]
    NotCombinable,
    #[error("combined quantity must be at least 1")]
    ZeroQuantity,
}

// ---------------------------------------------------------------------------
// CombinationStore
// ---------------------------------------------------------------------------

/// Accessor over the combined-quantity state of machine instances.
/// Borrows the registry for the combinable-category precondition check.
#[derive(Debug, Clone, Copy)]
pub struct CombinationStore<'r> {
    registry: &'r MachineRegistry,
}

impl<'r> CombinationStore<'r> {
    pub fn new(registry: &'r MachineRegistry) -> Self {
        Self { registry }
    }

    /// True if the instance's type belongs to the combinable category.
    pub fn is_combinable(&self, machine: &MachineInstance) -> bool {
        self.registry.is_combinable_type(machine.machine_type)
    }

    /// The recorded combined quantity, if any.
    pub fn try_get_quantity(&self, machine: &MachineInstance) -> Option<u32> {
        machine.combined_quantity
    }

    /// Record a combined quantity and force the physical stack to 1.
    ///
    /// Fails on a non-combinable instance or a quantity of 0; both are
    /// caller bugs, not runtime conditions.
    pub fn set_quantity(
        &self,
        machine: &mut MachineInstance,
        quantity: u32,
    ) -> Result<(), StoreError> {
        if !self.is_combinable(machine) {
            return Err(StoreError::NotCombinable);
        }
        if quantity == 0 {
            return Err(StoreError::ZeroQuantity);
        }

        let previous = machine.combined_quantity.unwrap_or(0);
        let previous_stack = machine.stack;
        machine.combined_quantity = Some(quantity);
        machine.stack = 1;

        tracing::info!(
            machine = self.registry.name(machine.machine_type),
            previous_stack,
            previous,
            new = quantity,
            "set combined quantity"
        );
        Ok(())
    }

    /// Remove the recorded quantity. Does not touch the stack; restoring
    /// physical copies is the split operation's job.
    pub fn clear_quantity(&self, machine: &mut MachineInstance) {
        machine.combined_quantity = None;
    }
}

// ---------------------------------------------------------------------------
// Attribute-bag round trip (host save format)
// ---------------------------------------------------------------------------

/// Write the combined quantity into the host attribute bag, or remove the
/// entry when the instance is not combined.
pub fn write_mod_data(machine: &MachineInstance, bag: &mut BTreeMap<String, String>) {
    match machine.combined_quantity {
        Some(quantity) => {
            bag.insert(COMBINED_QUANTITY_KEY.to_string(), quantity.to_string());
        }
        None => {
            bag.remove(COMBINED_QUANTITY_KEY);
        }
    }
}

/// Restore the combined quantity from the host attribute bag. An absent,
/// unparseable, or zero value restores "not combined".
pub fn read_mod_data(machine: &mut MachineInstance, bag: &BTreeMap<String, String>) {
    machine.combined_quantity = match bag.get(COMBINED_QUANTITY_KEY) {
        Some(raw) => match raw.parse::<u32>() {
            Ok(quantity) if quantity >= 1 => Some(quantity),
            Ok(_) | Err(_) => {
                tracing::warn!(
                    value = raw.as_str(),
                    "ignoring malformed persisted combined quantity"
                );
                None
            }
        },
        None => None,
    };
}

// ===========================================================================
// Tests
// ===========================================================================
