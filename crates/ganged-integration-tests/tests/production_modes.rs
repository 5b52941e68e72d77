//! End-to-end production scenarios: both effect modes, per-type mode
//! exclusions, furnace coal accounting, adjustment idempotence, hot
//! config reload, and save-format persistence of combined state.

use ganged_core::config::{ModifierKey, ProcessingMode};
use ganged_core::effect::CycleAdjustment;
use ganged_core::engine::{Engine, InputAction, InputEvent};
use ganged_core::machine::MachineInstance;
use ganged_core::store::{read_mod_data, write_mod_data};
use ganged_core::test_utils::*;
use std::collections::BTreeMap;

fn run_until_output(
    engine: &mut Engine,
    id: ganged_core::id::MachineId,
    max_minutes: u64,
) -> ganged_core::engine::CollectedOutput {
    for _ in 0..max_minutes {
        engine.step();
        if let Some(output) = engine.collect_output(id).unwrap() {
            return output;
        }
    }
    panic!("no output after {max_minutes} minutes");
}

fn combined_in_slot(
    engine: &mut Engine,
    slot: usize,
    machine_type: ganged_core::id::MachineTypeId,
    quantity: u32,
) -> ganged_core::id::MachineId {
    let id = place_machine(engine, slot, machine_type, 1);
    engine.machine_mut(id).unwrap().combined_quantity = Some(quantity);
    id
}

// ============================================================================
// MultiplyItems mode
// ============================================================================

#[test]
fn multiply_mode_scales_output_and_keeps_duration() {
    let mut engine = test_engine();
    engine.config_mut().combine_penalty = 0.0; // exact scaling
    let id = combined_in_slot(&mut engine, 0, keg(), 4);

    let adjustment = engine.begin_cycle(id, wine(), 100).unwrap();
    assert_eq!(adjustment, CycleAdjustment::Unchanged, "duration untouched");

    let output = run_until_output(&mut engine, id, 100);
    assert_eq!(output.item, wine());
    assert_eq!(output.quantity, 4);
    assert_eq!(engine.tick(), 100, "full base duration elapsed");
}

#[test]
fn multiply_mode_output_uses_the_penalized_curve() {
    // Default config: penalty 3%, floor 25%. Five kegs give
    // 1 + 0.97 + 0.94 + 0.91 + 0.88 = 4.70, which rounds to 5.
    let mut engine = test_engine();
    let id = combined_in_slot(&mut engine, 0, keg(), 5);

    engine.begin_cycle(id, wine(), 10).unwrap();
    let output = run_until_output(&mut engine, id, 10);
    assert_eq!(output.quantity, 5);
}

#[test]
fn furnace_coal_follows_scaled_output_when_enabled() {
    let mut engine = test_engine();
    engine.config_mut().combine_penalty = 0.0;
    engine.config_mut().furnace_multiply_coal_inputs = true;
    let id = combined_in_slot(&mut engine, 0, furnace(), 6);

    engine.begin_cycle(id, iron_bar(), 30).unwrap();
    let output = run_until_output(&mut engine, id, 30);
    assert_eq!(output.quantity, 6);
    assert_eq!(output.fuel_cost, 6, "one coal per smelted bar");
}

#[test]
fn furnace_coal_fixed_at_one_when_disabled() {
    let mut engine = test_engine();
    engine.config_mut().combine_penalty = 0.0;
    engine.config_mut().furnace_multiply_coal_inputs = false;
    let id = combined_in_slot(&mut engine, 0, furnace(), 6);

    engine.begin_cycle(id, iron_bar(), 30).unwrap();
    let output = run_until_output(&mut engine, id, 30);
    assert_eq!(output.quantity, 6);
    assert_eq!(output.fuel_cost, 1, "flag off: exactly one coal per cycle");
}

#[test]
fn double_completion_never_double_scales() {
    let mut engine = test_engine();
    engine.config_mut().combine_penalty = 0.0;
    let id = combined_in_slot(&mut engine, 0, keg(), 3);

    engine.begin_cycle(id, wine(), 5).unwrap();
    for _ in 0..5 {
        engine.step();
    }
    // Re-entrant completion calls on the same finished cycle.
    assert_eq!(
        engine.on_production_cycle_complete(id).unwrap(),
        CycleAdjustment::Unchanged
    );
    assert_eq!(
        engine.on_production_cycle_complete(id).unwrap(),
        CycleAdjustment::Unchanged
    );
    let output = engine.collect_output(id).unwrap().unwrap();
    assert_eq!(output.quantity, 3, "scaled exactly once");
}

// ============================================================================
// IncreaseSpeed mode
// ============================================================================

#[test]
fn speed_mode_shrinks_duration_and_keeps_single_output() {
    let mut engine = test_engine();
    engine.config_mut().processing_mode = ProcessingMode::IncreaseSpeed;
    engine.config_mut().combine_penalty = 0.0;
    let id = combined_in_slot(&mut engine, 0, keg(), 4);

    let adjustment = engine.begin_cycle(id, wine(), 200).unwrap();
    assert_eq!(adjustment, CycleAdjustment::DurationScaled { from: 200, to: 50 });

    let output = run_until_output(&mut engine, id, 50);
    assert_eq!(output.quantity, 1);
    assert_eq!(engine.tick(), 50);
}

#[test]
fn speed_mode_respects_the_hard_duration_floor() {
    let mut engine = test_engine();
    engine.config_mut().processing_mode = ProcessingMode::IncreaseSpeed;
    engine.config_mut().combine_penalty = 0.0;
    let id = combined_in_slot(&mut engine, 0, keg(), 100);

    // 200 / 100 = 2 minutes, clamped up to the 10-minute floor.
    let adjustment = engine.begin_cycle(id, wine(), 200).unwrap();
    assert_eq!(adjustment, CycleAdjustment::DurationScaled { from: 200, to: 10 });
}

// ============================================================================
// Mode exclusions
// ============================================================================

#[test]
fn excluded_type_runs_in_the_opposite_mode() {
    let mut engine = test_engine();
    {
        let config = engine.config_mut();
        config.processing_mode = ProcessingMode::MultiplyItems;
        config.combine_penalty = 0.0;
        config.processing_mode_exclusions = vec!["Furnace".to_string()];
    }

    // The furnace is excluded: it speeds up instead of multiplying.
    let furnace_id = combined_in_slot(&mut engine, 0, furnace(), 2);
    let adjustment = engine.begin_cycle(furnace_id, iron_bar(), 60).unwrap();
    assert_eq!(adjustment, CycleAdjustment::DurationScaled { from: 60, to: 30 });

    // The keg keeps the global mode: full duration, scaled output.
    let keg_id = combined_in_slot(&mut engine, 1, keg(), 2);
    assert_eq!(
        engine.begin_cycle(keg_id, wine(), 60).unwrap(),
        CycleAdjustment::Unchanged
    );

    let furnace_out = run_until_output(&mut engine, furnace_id, 60);
    assert_eq!(furnace_out.quantity, 1, "speed mode keeps base output");

    let keg_out = run_until_output(&mut engine, keg_id, 60);
    assert_eq!(keg_out.quantity, 2, "multiply mode scales output");
}

// ============================================================================
// Hot reload
// ============================================================================

#[test]
fn hot_reload_swaps_mode_for_subsequent_cycles() {
    let mut engine = test_engine();
    let id = combined_in_slot(&mut engine, 0, keg(), 2);

    engine
        .reload_config(r#"{"ProcessingMode": "IncreaseSpeed", "CombinePenalty": 0.0}"#)
        .unwrap();
    let adjustment = engine.begin_cycle(id, wine(), 120).unwrap();
    assert_eq!(adjustment, CycleAdjustment::DurationScaled { from: 120, to: 60 });

    // Reload back: the next cycle multiplies items again.
    engine
        .reload_config(r#"{"ProcessingMode": "MultiplyItems", "CombinePenalty": 0.0}"#)
        .unwrap();
    let _ = engine.collect_output(id);
    engine.machine_mut(id).unwrap().cycle = None;
    assert_eq!(
        engine.begin_cycle(id, wine(), 120).unwrap(),
        CycleAdjustment::Unchanged
    );
}

// ============================================================================
// Persistence across a save/load boundary
// ============================================================================

#[test]
fn combined_state_survives_the_attribute_bag_round_trip() {
    let mut engine = test_engine();
    let target = place_machine(&mut engine, 0, furnace(), 2);
    stage_machine(&mut engine, furnace(), 9);
    engine.on_combine_input(&InputEvent {
        action: InputAction::Select { slot: 0 },
        held_keys: vec![ModifierKey::LeftControl],
    });

    // Save: the quantity leaves through the host's string attribute bag.
    let mut bag = BTreeMap::new();
    write_mod_data(engine.machine(target).unwrap(), &mut bag);

    // Load into a fresh world.
    let mut restored = MachineInstance::new(furnace(), 1);
    read_mod_data(&mut restored, &bag);
    assert_eq!(restored.combined_quantity, Some(11));

    let mut fresh = test_engine();
    let id = fresh.place_in_slot(0, restored).unwrap();
    let overlay = fresh.on_render_overlay_query(id).unwrap();
    assert_eq!(overlay.quantity, 11);
}
