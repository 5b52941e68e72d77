//! Dual-mode application of the throughput multiplier to a production
//! cycle.
//!
//! Invoked at two host extension points: when a cycle starts counting down
//! and when a cycle completes. IncreaseSpeed rewrites the duration at
//! start; MultiplyItems rewrites the output quantity (and, for fuel-using
//! types, the consumable count) at completion. Each rewrite is guarded by
//! a per-cycle marker so re-entrant invocations of the same extension
//! point never scale the same cycle twice.

use crate::config::{ModConfig, ProcessingMode};
use crate::fixed::{Fixed64, Ticks, round_half_away};
use crate::machine::MachineInstance;
use crate::power::power_percent;
use crate::registry::MachineRegistry;

/// Hard floor on an adjusted cycle duration, in minutes. The host processes
/// time in ten-minute increments; shorter cycles are not representable.
pub const MINIMUM_CYCLE_MINUTES: Ticks = 10;

/// What an extension-point invocation did to the in-flight cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleAdjustment {
    /// Not combined, wrong mode for this extension point, already adjusted,
    /// or nothing to adjust.
    Unchanged,
    DurationScaled { from: Ticks, to: Ticks },
    OutputScaled { from: u32, to: u32, fuel_cost: u32 },
}

/// The multiplier for this instance, or None when the instance is not
/// effectively combined (absent quantity, or a transient quantity of 1).
fn active_multiplier(machine: &MachineInstance, config: &ModConfig) -> Option<(u32, Fixed64)> {
    let quantity = machine.combined_quantity?;
    if quantity <= 1 {
        return None;
    }
    Some((quantity, config.processing_power(quantity)))
}

// ---------------------------------------------------------------------------
// Cycle start
// ---------------------------------------------------------------------------

/// Extension point (a): a production cycle starts, or would continue
/// counting down. In IncreaseSpeed mode the remaining duration is divided
/// by the multiplier, rounded to the nearest minute, and clamped to
/// [`MINIMUM_CYCLE_MINUTES`]; the floor never raises a cycle above its
/// unscaled duration.
pub fn apply_on_cycle_start(
    machine: &mut MachineInstance,
    registry: &MachineRegistry,
    config: &ModConfig,
) -> CycleAdjustment {
    let Some((quantity, multiplier)) = active_multiplier(machine, config) else {
        return CycleAdjustment::Unchanged;
    };
    if config.effective_mode(registry.name(machine.machine_type)) != ProcessingMode::IncreaseSpeed {
        return CycleAdjustment::Unchanged;
    }
    let machine_type = machine.machine_type;
    let Some(cycle) = machine.cycle.as_mut() else {
        tracing::warn!(
            machine = registry.name(machine_type),
            "cycle start with no held output; skipping duration adjustment"
        );
        return CycleAdjustment::Unchanged;
    };
    if cycle.duration_adjusted {
        return CycleAdjustment::Unchanged;
    }

    let from = cycle.minutes_remaining;
    let desired = Fixed64::from_num(from) / multiplier;
    let scaled = round_half_away(desired).max(0) as Ticks;
    let to = scaled.max(MINIMUM_CYCLE_MINUTES.min(from));

    cycle.minutes_remaining = to;
    cycle.duration_adjusted = true;

    tracing::trace!(
        machine = registry.name(machine_type),
        quantity,
        field = "minutes_remaining",
        previous = from,
        new = to,
        power = format_args!("{:.2}%", power_percent(multiplier)),
        "adjusted cycle duration"
    );

    CycleAdjustment::DurationScaled { from, to }
}

// ---------------------------------------------------------------------------
// Cycle completion
// ---------------------------------------------------------------------------

/// Extension point (b): a production cycle completes and would yield
/// output. In MultiplyItems mode the output quantity is scaled by the
/// multiplier (round half away from zero, floor 1); for fuel-using types
/// the consumable count follows the scaled output 1:1 when
/// `furnace_multiply_coal_inputs` is set, and stays exactly as charged
/// otherwise.
pub fn apply_on_cycle_complete(
    machine: &mut MachineInstance,
    registry: &MachineRegistry,
    config: &ModConfig,
) -> CycleAdjustment {
    let Some((quantity, multiplier)) = active_multiplier(machine, config) else {
        return CycleAdjustment::Unchanged;
    };
    if config.effective_mode(registry.name(machine.machine_type)) != ProcessingMode::MultiplyItems {
        return CycleAdjustment::Unchanged;
    }
    let machine_type = machine.machine_type;
    let Some(cycle) = machine.cycle.as_mut() else {
        // Never scale data we cannot see; the host's unmodified behavior
        // proceeds for this cycle.
        tracing::warn!(
            machine = registry.name(machine_type),
            "cycle completion with no held output; skipping output adjustment"
        );
        return CycleAdjustment::Unchanged;
    };
    if cycle.output_adjusted {
        return CycleAdjustment::Unchanged;
    }

    let from = cycle.quantity;
    let desired = Fixed64::from_num(from) * multiplier;
    let to = round_half_away(desired).max(1) as u32;

    cycle.quantity = to;
    if registry.uses_fuel(machine_type) && config.furnace_multiply_coal_inputs {
        cycle.fuel_cost = to;
    }
    cycle.output_adjusted = true;

    tracing::trace!(
        machine = registry.name(machine_type),
        quantity,
        field = "output_quantity",
        previous = from,
        new = to,
        fuel_cost = cycle.fuel_cost,
        power = format_args!("{:.2}%", power_percent(multiplier)),
        "adjusted cycle output"
    );

    CycleAdjustment::OutputScaled {
        from,
        to,
        fuel_cost: cycle.fuel_cost,
    }
}

// ===========================================================================
// Tests
// ===========================================================================
