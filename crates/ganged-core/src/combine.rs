//! Combine and split state transitions.
//!
//! Combining consumes a source instance into a target instance of the same
//! type, summing their logical quantities; splitting reverts a combined
//! instance to an ordinary stack, leaving one active copy. Quantity algebra
//! is plain integer addition, so repeated merges are associative and
//! commutative on the final total.

use crate::id::MachineId;
use crate::machine::MachineInstance;
use crate::registry::MachineRegistry;
use crate::store::{CombinationStore, StoreError};
use slotmap::SlotMap;

// ---------------------------------------------------------------------------
// Errors and outcomes
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CombineError {
    #[error("machine instance no longer exists")]
    MissingInstance,
    #[error("cannot combine a machine with itself")]
    SameInstance,
    #[error("machine type is not combinable")]
    NotCombinable,
    #[error("machines are not the same type")]
    TypeMismatch,
    #[error("machines cannot share a slot")]
    NotStackable,
    #[error("combined quantity would overflow")]
    QuantityOverflow,
    #[error("machine is not combined")]
    NotCombined,
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Result of a successful combine: the surviving instance and its new total.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CombineOutcome {
    pub target: MachineId,
    pub total_quantity: u32,
}

/// Result of a successful split: how many copies returned to the stack.
/// Zero when the recorded quantity was a transient 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SplitOutcome {
    pub returned_to_stack: u32,
}

// ---------------------------------------------------------------------------
// Preconditions
// ---------------------------------------------------------------------------

/// Two plain instances may share a slot only when they are interchangeable:
/// same type and neither holds an in-progress cycle.
fn can_stack_plain(a: &MachineInstance, b: &MachineInstance) -> bool {
    a.machine_type == b.machine_type && a.cycle.is_none() && b.cycle.is_none()
}

fn check_combine(
    registry: &MachineRegistry,
    a: &MachineInstance,
    b: &MachineInstance,
) -> Result<(), CombineError> {
    let store = CombinationStore::new(registry);
    if !store.is_combinable(a) || !store.is_combinable(b) {
        return Err(CombineError::NotCombinable);
    }
    if a.stack < 1 || b.stack < 1 {
        return Err(CombineError::NotStackable);
    }
    if a.machine_type != b.machine_type {
        return Err(CombineError::TypeMismatch);
    }
    if !(a.is_combined() || b.is_combined() || can_stack_plain(a, b)) {
        return Err(CombineError::NotStackable);
    }
    Ok(())
}

/// Whether `source` may be merged into `target`.
pub fn can_combine(
    registry: &MachineRegistry,
    machines: &SlotMap<MachineId, MachineInstance>,
    source: MachineId,
    target: MachineId,
) -> bool {
    if source == target {
        return false;
    }
    match (machines.get(source), machines.get(target)) {
        (Some(a), Some(b)) => check_combine(registry, a, b).is_ok(),
        _ => false,
    }
}

// ---------------------------------------------------------------------------
// Operations
// ---------------------------------------------------------------------------

/// Merge `source` into `target`. The target ends up holding the summed
/// quantity with a forced stack of 1; the source is removed from the arena.
pub fn combine(
    registry: &MachineRegistry,
    machines: &mut SlotMap<MachineId, MachineInstance>,
    source: MachineId,
    target: MachineId,
) -> Result<CombineOutcome, CombineError> {
    if source == target {
        return Err(CombineError::SameInstance);
    }

    let store = CombinationStore::new(registry);
    let (source_quantity, target_quantity) = {
        let src = machines.get(source).ok_or(CombineError::MissingInstance)?;
        let tgt = machines.get(target).ok_or(CombineError::MissingInstance)?;
        check_combine(registry, src, tgt)?;
        (
            store.try_get_quantity(src).unwrap_or(src.stack),
            store.try_get_quantity(tgt).unwrap_or(tgt.stack),
        )
    };

    let total = source_quantity
        .checked_add(target_quantity)
        .ok_or(CombineError::QuantityOverflow)?;

    let tgt = machines.get_mut(target).ok_or(CombineError::MissingInstance)?;
    store.set_quantity(tgt, total)?;
    machines.remove(source);

    Ok(CombineOutcome {
        target,
        total_quantity: total,
    })
}

/// Revert a combined instance to an ordinary stack: the recorded quantity
/// is cleared and `quantity - 1` copies rejoin the physical stack, while
/// this instance stays active and keeps any in-progress cycle.
///
/// A transient recorded quantity of 1 clears to a plain instance with no
/// stack change.
pub fn split(
    registry: &MachineRegistry,
    machines: &mut SlotMap<MachineId, MachineInstance>,
    id: MachineId,
) -> Result<SplitOutcome, CombineError> {
    let store = CombinationStore::new(registry);
    let machine = machines.get_mut(id).ok_or(CombineError::MissingInstance)?;
    let quantity = store
        .try_get_quantity(machine)
        .ok_or(CombineError::NotCombined)?;

    store.clear_quantity(machine);
    machine.stack += quantity - 1;

    tracing::info!(
        machine = registry.name(machine.machine_type),
        quantity,
        stack = machine.stack,
        "split combined machine"
    );

    Ok(SplitOutcome {
        returned_to_stack: quantity - 1,
    })
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::{ItemTypeId, MachineTypeId};
    use crate::machine::ProductionCycle;
    use crate::registry::RegistryBuilder;

    fn registry() -> MachineRegistry {
        let mut b = RegistryBuilder::new();
        b.register_machine("Furnace", true, true);
        b.register_machine("Keg", true, false);
        b.register_machine("Tapper", false, false);
        b.build().unwrap()
    }

    fn furnace() -> MachineTypeId {
        MachineTypeId(0)
    }
    fn keg() -> MachineTypeId {
        MachineTypeId(1)
    }
    fn tapper() -> MachineTypeId {
        MachineTypeId(2)
    }

    fn arena() -> SlotMap<MachineId, MachineInstance> {
        SlotMap::with_key()
    }

    fn add(
        machines: &mut SlotMap<MachineId, MachineInstance>,
        machine_type: MachineTypeId,
        stack: u32,
    ) -> MachineId {
        machines.insert(MachineInstance::new(machine_type, stack))
    }

    // -----------------------------------------------------------------------
    // Combine
    // -----------------------------------------------------------------------

    #[test]
    fn combine_sums_plain_stacks() {
        let reg = registry();
        let mut machines = arena();
        let a = add(&mut machines, furnace(), 2);
        let b = add(&mut machines, furnace(), 3);

        let outcome = combine(&reg, &mut machines, a, b).unwrap();
        assert_eq!(outcome.total_quantity, 5);
        assert!(machines.get(a).is_none(), "source is consumed");

        let target = &machines[b];
        assert_eq!(target.combined_quantity, Some(5));
        assert_eq!(target.stack, 1);
    }

    #[test]
    fn combine_combined_with_plain() {
        let reg = registry();
        let mut machines = arena();
        let a = add(&mut machines, furnace(), 1);
        machines[a].combined_quantity = Some(4);
        let b = add(&mut machines, furnace(), 2);

        let outcome = combine(&reg, &mut machines, a, b).unwrap();
        assert_eq!(outcome.total_quantity, 6);
    }

    #[test]
    fn combine_type_mismatch_fails() {
        let reg = registry();
        let mut machines = arena();
        let a = add(&mut machines, furnace(), 1);
        let b = add(&mut machines, keg(), 1);

        assert_eq!(
            combine(&reg, &mut machines, a, b),
            Err(CombineError::TypeMismatch)
        );
        assert!(machines.get(a).is_some(), "nothing consumed on failure");
    }

    #[test]
    fn combine_non_combinable_type_fails() {
        let reg = registry();
        let mut machines = arena();
        let a = add(&mut machines, tapper(), 1);
        let b = add(&mut machines, tapper(), 1);

        assert_eq!(
            combine(&reg, &mut machines, a, b),
            Err(CombineError::NotCombinable)
        );
    }

    #[test]
    fn combine_with_self_fails() {
        let reg = registry();
        let mut machines = arena();
        let a = add(&mut machines, furnace(), 2);

        assert_eq!(
            combine(&reg, &mut machines, a, a),
            Err(CombineError::SameInstance)
        );
    }

    #[test]
    fn combine_missing_instance_fails() {
        let reg = registry();
        let mut machines = arena();
        let a = add(&mut machines, furnace(), 1);
        let b = add(&mut machines, furnace(), 1);
        machines.remove(b);

        assert_eq!(
            combine(&reg, &mut machines, a, b),
            Err(CombineError::MissingInstance)
        );
    }

    #[test]
    fn working_machines_only_combine_when_one_is_combined() {
        let reg = registry();
        let mut machines = arena();
        let a = add(&mut machines, furnace(), 1);
        let b = add(&mut machines, furnace(), 1);
        machines[b].cycle = Some(ProductionCycle::new(ItemTypeId(0), 30, 1));

        // Two plain instances, one mid-cycle: not interchangeable.
        assert_eq!(
            combine(&reg, &mut machines, a, b),
            Err(CombineError::NotStackable)
        );

        // Once the busy one is a combined machine, merging in more is fine.
        machines[b].combined_quantity = Some(2);
        let outcome = combine(&reg, &mut machines, a, b).unwrap();
        assert_eq!(outcome.total_quantity, 3);
    }

    #[test]
    fn combine_quantity_overflow_fails() {
        let reg = registry();
        let mut machines = arena();
        let a = add(&mut machines, furnace(), 1);
        machines[a].combined_quantity = Some(u32::MAX);
        let b = add(&mut machines, furnace(), 1);

        assert_eq!(
            combine(&reg, &mut machines, a, b),
            Err(CombineError::QuantityOverflow)
        );
        assert!(machines.get(a).is_some());
    }

    #[test]
    fn repeated_combination_is_associative_on_quantity() {
        let reg = registry();

        // (a + b) + c
        let mut left = arena();
        let a = add(&mut left, keg(), 2);
        let b = add(&mut left, keg(), 3);
        let c = add(&mut left, keg(), 4);
        let ab = combine(&reg, &mut left, a, b).unwrap();
        let abc = combine(&reg, &mut left, ab.target, c).unwrap();

        // a + (b + c)
        let mut right = arena();
        let a2 = add(&mut right, keg(), 2);
        let b2 = add(&mut right, keg(), 3);
        let c2 = add(&mut right, keg(), 4);
        let bc = combine(&reg, &mut right, b2, c2).unwrap();
        let a_bc = combine(&reg, &mut right, a2, bc.target).unwrap();

        assert_eq!(abc.total_quantity, 9);
        assert_eq!(a_bc.total_quantity, 9);
    }

    // -----------------------------------------------------------------------
    // Split
    // -----------------------------------------------------------------------

    #[test]
    fn split_restores_stack_and_clears_quantity() {
        let reg = registry();
        let mut machines = arena();
        let a = add(&mut machines, furnace(), 2);
        let b = add(&mut machines, furnace(), 3);
        let merged = combine(&reg, &mut machines, a, b).unwrap();

        let outcome = split(&reg, &mut machines, merged.target).unwrap();
        assert_eq!(outcome.returned_to_stack, 4);

        let m = &machines[merged.target];
        assert!(m.combined_quantity.is_none());
        assert_eq!(m.stack, 5); // (2 + 3) - 1 returned + 1 active
    }

    #[test]
    fn split_keeps_in_progress_cycle_on_survivor() {
        let reg = registry();
        let mut machines = arena();
        let a = add(&mut machines, furnace(), 1);
        machines[a].combined_quantity = Some(3);
        machines[a].cycle = Some(ProductionCycle::new(ItemTypeId(9), 20, 1));

        split(&reg, &mut machines, a).unwrap();
        assert!(machines[a].cycle.is_some());
        assert_eq!(machines[a].stack, 3);
    }

    #[test]
    fn split_of_transient_quantity_one_is_noop() {
        let reg = registry();
        let mut machines = arena();
        let a = add(&mut machines, furnace(), 1);
        machines[a].combined_quantity = Some(1);

        let outcome = split(&reg, &mut machines, a).unwrap();
        assert_eq!(outcome.returned_to_stack, 0);
        assert_eq!(machines[a].stack, 1);
        assert!(machines[a].combined_quantity.is_none());
    }

    #[test]
    fn split_of_plain_machine_fails() {
        let reg = registry();
        let mut machines = arena();
        let a = add(&mut machines, furnace(), 2);

        assert_eq!(split(&reg, &mut machines, a), Err(CombineError::NotCombined));
    }

    #[test]
    fn merge_then_split_inverse() {
        let reg = registry();
        for (a_stack, b_stack) in [(1u32, 1u32), (1, 7), (4, 4), (25, 3)] {
            let mut machines = arena();
            let a = add(&mut machines, keg(), a_stack);
            let b = add(&mut machines, keg(), b_stack);

            let merged = combine(&reg, &mut machines, a, b).unwrap();
            split(&reg, &mut machines, merged.target).unwrap();

            let m = &machines[merged.target];
            assert_eq!(m.stack, a_stack + b_stack);
            assert!(m.combined_quantity.is_none());
        }
    }
}
