//! Ganged Machines -- combine identical production machines into a single
//! logical unit with amplified throughput.
//!
//! Normally non-stackable machines occupying one inventory slot or tile
//! can be merged; the merged instance tracks a combined quantity and a
//! diminishing-returns power curve converts that quantity into a
//! throughput multiplier applied at production-cycle boundaries.
//!
//! # Data flow
//!
//! 1. **Input event** -- [`engine::Engine::on_combine_input`] routes
//!    select/secondary actions to the combine and split operations in
//!    [`combine`], which mutate the combined-quantity state through
//!    [`store`].
//! 2. **Production tick** -- at cycle start and completion,
//!    [`effect`] consults [`power`] and the mode resolution in [`config`]
//!    and rewrites the in-flight cycle's duration, output quantity, or
//!    consumable count, at most once per cycle.
//! 3. **Render query** -- [`engine::Engine::on_render_overlay_query`]
//!    exposes quantity and power for display only.
//!
//! Same-frame host interference is handled by the tick-delayed queue in
//! [`defer`].
//!
//! # Key types
//!
//! - [`engine::Engine`] -- facade owning the arena, inventory, cursor,
//!   configuration, and deferred queue.
//! - [`machine::MachineInstance`] -- one slot/tile worth of machines plus
//!   its optional combined quantity and in-progress cycle.
//! - [`store::CombinationStore`] -- typed accessor over the persisted
//!   combined-quantity state.
//! - [`power::compute_power`] -- quantity -> throughput multiplier.
//! - [`config::ModConfig`] -- operator configuration, hot-reloadable as a
//!   whole.
//! - [`fixed::Fixed64`] -- Q32.32 fixed-point for deterministic math.

pub mod combine;
pub mod config;
pub mod defer;
pub mod effect;
pub mod engine;
pub mod fixed;
pub mod id;
pub mod machine;
pub mod power;
pub mod registry;
pub mod store;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
