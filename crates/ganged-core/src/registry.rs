use crate::id::MachineTypeId;
use std::collections::{HashMap, HashSet};

/// A machine type definition in the registry.
#[derive(Debug, Clone)]
pub struct MachineTypeDef {
    pub name: String,
    /// Big/placeable craftables occupy a tile and are combinable by default.
    pub big_craftable: bool,
    /// Furnace-style types charge a consumable input (coal) per cycle.
    pub uses_fuel: bool,
}

/// Builder for constructing an immutable MachineRegistry.
/// Two-phase lifecycle: registration -> finalization.
#[derive(Debug)]
pub struct RegistryBuilder {
    types: Vec<MachineTypeDef>,
    name_to_id: HashMap<String, MachineTypeId>,
    /// Ordinarily-stackable machine types that are still allowed to combine.
    combinable_allow_list: HashSet<MachineTypeId>,
}

impl Default for RegistryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self {
            types: Vec::new(),
            name_to_id: HashMap::new(),
            combinable_allow_list: HashSet::new(),
        }
    }

    /// Register a machine type. Returns its ID.
    pub fn register_machine(
        &mut self,
        name: &str,
        big_craftable: bool,
        uses_fuel: bool,
    ) -> MachineTypeId {
        let id = MachineTypeId(self.types.len() as u32);
        self.types.push(MachineTypeDef {
            name: name.to_string(),
            big_craftable,
            uses_fuel,
        });
        self.name_to_id.insert(name.to_string(), id);
        id
    }

    /// Allow a non-big-craftable type to combine anyway.
    pub fn allow_combining(&mut self, id: MachineTypeId) {
        self.combinable_allow_list.insert(id);
    }

    /// Lookup machine type ID by name.
    pub fn machine_id(&self, name: &str) -> Option<MachineTypeId> {
        self.name_to_id.get(name).copied()
    }

    /// Finalize and build the immutable registry.
    pub fn build(self) -> Result<MachineRegistry, RegistryError> {
        for id in &self.combinable_allow_list {
            if id.0 as usize >= self.types.len() {
                return Err(RegistryError::InvalidTypeRef(*id));
            }
        }

        Ok(MachineRegistry {
            types: self.types,
            name_to_id: self.name_to_id,
            combinable_allow_list: self.combinable_allow_list,
        })
    }
}

/// Immutable machine-type registry. Frozen after build().
#[derive(Debug)]
pub struct MachineRegistry {
    types: Vec<MachineTypeDef>,
    name_to_id: HashMap<String, MachineTypeId>,
    combinable_allow_list: HashSet<MachineTypeId>,
}

impl MachineRegistry {
    pub fn get(&self, id: MachineTypeId) -> Option<&MachineTypeDef> {
        self.types.get(id.0 as usize)
    }

    pub fn machine_id(&self, name: &str) -> Option<MachineTypeId> {
        self.name_to_id.get(name).copied()
    }

    /// Display name for a type, or a placeholder for an unknown ID.
    pub fn name(&self, id: MachineTypeId) -> &str {
        self.get(id).map(|t| t.name.as_str()).unwrap_or("<unknown>")
    }

    /// Whether the type belongs to the combinable category: big craftables
    /// plus the explicit allow-list of stackable machine types.
    pub fn is_combinable_type(&self, id: MachineTypeId) -> bool {
        match self.get(id) {
            Some(def) => def.big_craftable || self.combinable_allow_list.contains(&id),
            None => false,
        }
    }

    /// Whether the type charges a consumable input per production cycle.
    pub fn uses_fuel(&self, id: MachineTypeId) -> bool {
        self.get(id).map(|t| t.uses_fuel).unwrap_or(false)
    }

    pub fn machine_count(&self) -> usize {
        self.types.len()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("invalid machine type reference: {0:?}")]
    InvalidTypeRef(MachineTypeId),
}
