//! Combined-furnace example: merge five furnaces into one slot and smelt.
//!
//! Stages a stack of furnaces on the cursor, combines it into an inventory
//! slot with a modifier-click, starts a smelting cycle, and runs the tick
//! loop until the scaled output is ready.
//!
//! Run with: `cargo run -p ganged-core --example combined_furnaces`

use ganged_core::config::{ModConfig, ModifierKey};
use ganged_core::engine::{Engine, InputAction, InputEvent, InputOutcome};
use ganged_core::id::ItemTypeId;
use ganged_core::machine::MachineInstance;
use ganged_core::registry::RegistryBuilder;

fn main() {
    // --- Step 1: Register machine types ---

    let mut builder = RegistryBuilder::new();
    let furnace = builder.register_machine("Furnace", true, true);
    let registry = builder.build().expect("registry is valid");

    let mut engine = Engine::new(registry, ModConfig::default(), 12);

    // --- Step 2: Combine 2 + 3 furnaces with a modifier-click ---

    engine
        .place_in_slot(0, MachineInstance::new(furnace, 2))
        .expect("slot 0 is free");
    engine
        .stage_on_cursor(MachineInstance::new(furnace, 3))
        .expect("cursor is free");

    let outcome = engine.on_combine_input(&InputEvent {
        action: InputAction::Select { slot: 0 },
        held_keys: vec![ModifierKey::LeftControl],
    });
    let InputOutcome::Combined { target, total_quantity } = outcome else {
        panic!("combine did not trigger: {outcome:?}");
    };
    println!("combined {total_quantity} furnaces into one slot");

    let overlay = engine
        .on_render_overlay_query(target)
        .expect("combined machines draw an overlay");
    println!(
        "overlay: quantity {} at {:.1}% power",
        overlay.quantity, overlay.power_percent
    );

    // --- Step 3: Smelt. One ore in, scaled bars (and coal) out ---

    let iron_bar = ItemTypeId(0);
    engine
        .begin_cycle(target, iron_bar, 120)
        .expect("machine exists");

    let mut minutes = 0u64;
    loop {
        engine.step();
        minutes += 1;
        if let Some(output) = engine.collect_output(target).expect("machine exists") {
            println!(
                "after {minutes} minutes: {} bars ready, {} coal consumed",
                output.quantity, output.fuel_cost
            );
            break;
        }
    }
}
