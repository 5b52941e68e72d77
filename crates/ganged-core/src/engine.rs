//! The engine facade: owns the machine arena, the player-facing inventory
//! slots and cursor, the configuration, and the deferred-action queue, and
//! exposes the extension points an adapter wires to host events.
//!
//! # Extension points
//!
//! - [`Engine::on_combine_input`] -- select/secondary input events drive
//!   the combine and split operations.
//! - [`Engine::on_production_cycle_start`] / [`Engine::on_production_cycle_complete`]
//!   -- production-cycle boundaries where the throughput multiplier is
//!   applied.
//! - [`Engine::on_render_overlay_query`] -- display-only data for the
//!   render collaborator; failures are suppressed to a log.
//! - [`Engine::step`] -- the host tick boundary: drains due deferred
//!   actions, counts cycles down, fires completion adjustments.
//! - [`Engine::reload_config`] -- the operator hot-reload command; replaces
//!   the configuration object atomically.
//!
//! Everything runs synchronously on one logical thread; combine/split
//! operations complete fully before any production callback for the same
//! instance can observe the change.

use crate::combine;
use crate::config::{self, ConfigError, ModConfig, ModifierKey};
use crate::defer::DeferredQueue;
use crate::effect::{self, CycleAdjustment};
use crate::fixed::Ticks;
use crate::id::{ItemTypeId, MachineId};
use crate::machine::{MachineInstance, ProductionCycle};
use crate::power;
use crate::registry::MachineRegistry;
use slotmap::SlotMap;

// ---------------------------------------------------------------------------
// Input surface
// ---------------------------------------------------------------------------

/// A host input event relevant to combining.
#[derive(Debug, Clone)]
pub struct InputEvent {
    pub action: InputAction,
    /// Modifier keys held when the action fired.
    pub held_keys: Vec<ModifierKey>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputAction {
    /// Use/select on an inventory slot (combine trigger while a source is
    /// staged and a configured modifier key is held).
    Select { slot: usize },
    /// Secondary/context action on an inventory slot (split trigger on a
    /// combined instance while nothing is staged).
    Secondary { slot: usize },
}

/// What an input event did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputOutcome {
    Combined { target: MachineId, total_quantity: u32 },
    Split { machine: MachineId, returned_to_stack: u32 },
    /// The event did not match a trigger; host behavior proceeds unchanged.
    Ignored,
}

// ---------------------------------------------------------------------------
// Query results
// ---------------------------------------------------------------------------

/// Display-only data for the render collaborator. Never mutates state.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayInfo {
    pub quantity: u32,
    /// Combined processing power as a percentage (197.0 = 197%).
    pub power_percent: f64,
    pub show_tool_tip: bool,
    pub show_quantity: bool,
    pub show_duration: bool,
    pub minutes_remaining: Option<Ticks>,
    pub number_opacity: f64,
}

/// A finished cycle's yield, handed to the host on collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollectedOutput {
    pub item: ItemTypeId,
    pub quantity: u32,
    /// Consumable inputs the host should deduct for this cycle.
    pub fuel_cost: u32,
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum EngineError {
    #[error("machine instance no longer exists")]
    MissingInstance,
    #[error("inventory slot {0} is out of range")]
    InvalidSlot(usize),
    #[error("inventory slot {0} is occupied")]
    SlotOccupied(usize),
    #[error("cursor already holds a machine")]
    CursorOccupied,
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

pub struct Engine {
    pub registry: MachineRegistry,
    config: ModConfig,
    machines: SlotMap<MachineId, MachineInstance>,
    /// Player inventory: each slot holds at most one machine instance.
    inventory: Vec<Option<MachineId>>,
    /// The staged/held instance, if any.
    cursor: Option<MachineId>,
    deferred: DeferredQueue<Engine>,
    tick: Ticks,
}

impl Engine {
    pub fn new(registry: MachineRegistry, config: ModConfig, inventory_slots: usize) -> Self {
        Self {
            registry,
            config,
            machines: SlotMap::with_key(),
            inventory: vec![None; inventory_slots],
            cursor: None,
            deferred: DeferredQueue::new(),
            tick: 0,
        }
    }

    pub fn tick(&self) -> Ticks {
        self.tick
    }

    pub fn config(&self) -> &ModConfig {
        &self.config
    }

    /// Mutable access for the settings-UI accessors.
    pub fn config_mut(&mut self) -> &mut ModConfig {
        &mut self.config
    }

    /// Operator hot-reload command: parse the document and replace the
    /// in-memory configuration object in one assignment.
    pub fn reload_config(&mut self, json: &str) -> Result<(), ConfigError> {
        let fresh = config::load_config_json(json)?;
        self.config = fresh;
        tracing::info!("configuration reloaded");
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Arena and inventory management
    // -----------------------------------------------------------------------

    pub fn machine(&self, id: MachineId) -> Option<&MachineInstance> {
        self.machines.get(id)
    }

    pub fn machine_mut(&mut self, id: MachineId) -> Option<&mut MachineInstance> {
        self.machines.get_mut(id)
    }

    pub fn cursor(&self) -> Option<MachineId> {
        self.cursor
    }

    pub fn inventory_slot(&self, slot: usize) -> Option<MachineId> {
        self.inventory.get(slot).copied().flatten()
    }

    pub fn deferred_count(&self) -> usize {
        self.deferred.pending_count()
    }

    /// Put a new machine instance into an empty inventory slot.
    pub fn place_in_slot(
        &mut self,
        slot: usize,
        machine: MachineInstance,
    ) -> Result<MachineId, EngineError> {
        let entry = self
            .inventory
            .get(slot)
            .ok_or(EngineError::InvalidSlot(slot))?;
        if entry.is_some() {
            return Err(EngineError::SlotOccupied(slot));
        }
        let id = self.machines.insert(machine);
        self.inventory[slot] = Some(id);
        Ok(id)
    }

    /// Stage a new machine instance on the cursor.
    pub fn stage_on_cursor(&mut self, machine: MachineInstance) -> Result<MachineId, EngineError> {
        if self.cursor.is_some() {
            return Err(EngineError::CursorOccupied);
        }
        let id = self.machines.insert(machine);
        self.cursor = Some(id);
        Ok(id)
    }

    /// Host-driven slot clear (the adapter mirrors inventory moves here).
    pub fn remove_from_slot(&mut self, slot: usize) -> Result<Option<MachineId>, EngineError> {
        match self.inventory.get_mut(slot) {
            Some(entry) => Ok(entry.take()),
            None => Err(EngineError::InvalidSlot(slot)),
        }
    }

    /// Host-driven cursor stage of an existing instance.
    pub fn stage_existing(&mut self, id: MachineId) -> Result<(), EngineError> {
        if self.cursor.is_some() {
            return Err(EngineError::CursorOccupied);
        }
        if !self.machines.contains_key(id) {
            return Err(EngineError::MissingInstance);
        }
        self.cursor = Some(id);
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Input extension point
    // -----------------------------------------------------------------------

    /// Route a host input event to the combine or split operation. Events
    /// that match neither trigger are ignored; user interaction never
    /// surfaces an error.
    pub fn on_combine_input(&mut self, event: &InputEvent) -> InputOutcome {
        match event.action {
            InputAction::Select { slot } => self.handle_select(slot, &event.held_keys),
            InputAction::Secondary { slot } => self.handle_secondary(slot),
        }
    }

    fn handle_select(&mut self, slot: usize, held_keys: &[ModifierKey]) -> InputOutcome {
        let armed = self
            .config
            .modifier_keys()
            .iter()
            .any(|key| held_keys.contains(key));
        if !armed {
            return InputOutcome::Ignored;
        }
        let Some(source) = self.cursor else {
            return InputOutcome::Ignored;
        };
        let Some(target) = self.inventory_slot(slot) else {
            return InputOutcome::Ignored;
        };

        match combine::combine(&self.registry, &mut self.machines, source, target) {
            Ok(outcome) => {
                self.cursor = None;
                // The host reacts to the same click by re-staging the
                // clicked item; repair the slot one tick later only if the
                // host has not already done so itself.
                self.deferred.schedule(self.tick, 1, move |engine: &mut Engine| {
                    let slot_empty = engine
                        .inventory
                        .get(slot)
                        .map(|entry| entry.is_none())
                        .unwrap_or(false);
                    if engine.cursor.is_some() && slot_empty {
                        engine.inventory[slot] = engine.cursor.take();
                    }
                });
                InputOutcome::Combined {
                    target: outcome.target,
                    total_quantity: outcome.total_quantity,
                }
            }
            Err(reason) => {
                tracing::debug!(%reason, "combine input ignored");
                InputOutcome::Ignored
            }
        }
    }

    fn handle_secondary(&mut self, slot: usize) -> InputOutcome {
        if self.cursor.is_some() {
            return InputOutcome::Ignored;
        }
        let Some(target) = self.inventory_slot(slot) else {
            return InputOutcome::Ignored;
        };

        match combine::split(&self.registry, &mut self.machines, target) {
            Ok(outcome) => InputOutcome::Split {
                machine: target,
                returned_to_stack: outcome.returned_to_stack,
            },
            Err(reason) => {
                tracing::debug!(%reason, "split input ignored");
                InputOutcome::Ignored
            }
        }
    }

    // -----------------------------------------------------------------------
    // Production extension points
    // -----------------------------------------------------------------------

    /// Begin a production cycle yielding one unit of `output` after
    /// `minutes`, then run the cycle-start adjustment.
    pub fn begin_cycle(
        &mut self,
        id: MachineId,
        output: ItemTypeId,
        minutes: Ticks,
    ) -> Result<CycleAdjustment, EngineError> {
        let uses_fuel = {
            let machine = self.machines.get(id).ok_or(EngineError::MissingInstance)?;
            self.registry.uses_fuel(machine.machine_type)
        };
        let machine = self.machines.get_mut(id).ok_or(EngineError::MissingInstance)?;
        machine.cycle = Some(ProductionCycle::new(output, minutes, u32::from(uses_fuel)));
        self.on_production_cycle_start(id)
    }

    /// Extension point (a): the cycle starts or continues counting down.
    pub fn on_production_cycle_start(
        &mut self,
        id: MachineId,
    ) -> Result<CycleAdjustment, EngineError> {
        let Engine { registry, config, machines, .. } = self;
        let machine = machines.get_mut(id).ok_or(EngineError::MissingInstance)?;
        Ok(effect::apply_on_cycle_start(machine, registry, config))
    }

    /// Extension point (b): the cycle completes and would yield output.
    pub fn on_production_cycle_complete(
        &mut self,
        id: MachineId,
    ) -> Result<CycleAdjustment, EngineError> {
        let Engine { registry, config, machines, .. } = self;
        let machine = machines.get_mut(id).ok_or(EngineError::MissingInstance)?;
        Ok(effect::apply_on_cycle_complete(machine, registry, config))
    }

    /// Hand a finished cycle's yield to the host. Returns None while the
    /// cycle is still running or the machine is empty.
    pub fn collect_output(
        &mut self,
        id: MachineId,
    ) -> Result<Option<CollectedOutput>, EngineError> {
        let Engine { registry, config, machines, .. } = self;
        let machine = machines.get_mut(id).ok_or(EngineError::MissingInstance)?;
        if matches!(&machine.cycle, Some(cycle) if cycle.is_ready()) {
            // The completion extension point is idempotent, so running it
            // here covers cycles that never crossed a tick boundary.
            effect::apply_on_cycle_complete(machine, registry, config);
        }
        match machine.cycle.take() {
            Some(cycle) if cycle.is_ready() => Ok(Some(CollectedOutput {
                item: cycle.output,
                quantity: cycle.quantity,
                fuel_cost: cycle.fuel_cost,
            })),
            still_running => {
                machine.cycle = still_running;
                Ok(None)
            }
        }
    }

    // -----------------------------------------------------------------------
    // Tick boundary
    // -----------------------------------------------------------------------

    /// Advance one tick (one in-game minute): run due deferred actions,
    /// count running cycles down, and fire completion adjustments.
    pub fn step(&mut self) {
        self.tick += 1;

        let ready = self.deferred.take_ready(self.tick);
        for action in ready {
            action(self);
        }

        let Engine { registry, config, machines, .. } = self;
        for machine in machines.values_mut() {
            // Re-entrant start adjustments are no-ops thanks to the marker.
            effect::apply_on_cycle_start(machine, registry, config);

            let finished = {
                let Some(cycle) = machine.cycle.as_mut() else { continue };
                if cycle.minutes_remaining == 0 {
                    continue;
                }
                cycle.minutes_remaining -= 1;
                cycle.minutes_remaining == 0
            };
            if finished {
                effect::apply_on_cycle_complete(machine, registry, config);
            }
        }
    }

    // -----------------------------------------------------------------------
    // Render extension point
    // -----------------------------------------------------------------------

    /// Display data for a combined machine, or None when there is nothing
    /// to draw. Internal anomalies are logged and suppressed so a defect
    /// here can never abort the host's frame.
    pub fn on_render_overlay_query(&self, id: MachineId) -> Option<OverlayInfo> {
        let machine = self.machines.get(id)?;
        let quantity = machine.combined_quantity?;
        if quantity <= 1 {
            return None;
        }
        if self.registry.get(machine.machine_type).is_none() {
            tracing::error!(
                machine_type = ?machine.machine_type,
                "overlay query hit an unregistered machine type; omitting overlay this frame"
            );
            return None;
        }

        let multiplier = self.config.processing_power(quantity);
        Some(OverlayInfo {
            quantity,
            power_percent: power::power_percent(multiplier),
            show_tool_tip: self.config.draw_tool_tip,
            show_quantity: self.config.tool_tip_show_quantity,
            show_duration: self.config.tool_tip_show_duration,
            minutes_remaining: machine.cycle.as_ref().map(|c| c.minutes_remaining),
            number_opacity: self.config.number_opacity,
        })
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("tick", &self.tick)
            .field("machines", &self.machines.len())
            .field("inventory_slots", &self.inventory.len())
            .field("cursor", &self.cursor)
            .field("deferred", &self.deferred)
            .finish()
    }
}

// ===========================================================================
// Tests
// ===========================================================================
