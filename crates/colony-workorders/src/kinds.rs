//! The standard work-order kinds.

use colony_types::{CitizenId, WorkOrderType};
use serde_json::Value;

use crate::error::LoadError;
use crate::order::{ColonyContext, Compound, WorkOrder, WorkOrderData, read_string, read_u32};

/// Kind tag of [`BuildOrder`].
pub const BUILD_KIND: &str = "build";

/// Kind tag of [`DecorationOrder`].
pub const DECORATION_KIND: &str = "decoration";

const TAG_STRUCTURE: &str = "structure";
const TAG_UPGRADE_NAME: &str = "upgradeName";
const TAG_UPGRADE_LEVEL: &str = "upgradeLevel";
const TAG_SCHEMATIC: &str = "schematic";
const TAG_NAME: &str = "name";

/// Hand the order to the first available builder.
fn claim_first_builder(data: &mut WorkOrderData, colony: &dyn ColonyContext) -> Option<CitizenId> {
    if data.is_claimed() {
        return None;
    }
    let builder = colony.available_builders().into_iter().next()?;
    data.claim(builder);
    Some(builder)
}

/// Build or upgrade a structure to a given level.
///
/// The order stays valid only while its target structure exists.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildOrder {
    data: WorkOrderData,
    structure: String,
    upgrade_name: String,
    upgrade_level: u32,
}

impl BuildOrder {
    /// Create an order to bring `structure` up to `upgrade_level`.
    pub fn new(
        structure: impl Into<String>,
        upgrade_name: impl Into<String>,
        upgrade_level: u32,
    ) -> Self {
        Self {
            data: WorkOrderData::new(),
            structure: structure.into(),
            upgrade_name: upgrade_name.into(),
            upgrade_level,
        }
    }

    /// Key of the structure being built.
    pub fn structure(&self) -> &str {
        &self.structure
    }

    /// Display name of the upgrade.
    pub fn upgrade_name(&self) -> &str {
        &self.upgrade_name
    }

    /// Target level.
    pub const fn upgrade_level(&self) -> u32 {
        self.upgrade_level
    }
}

impl WorkOrder for BuildOrder {
    fn kind(&self) -> &'static str {
        BUILD_KIND
    }

    fn order_type(&self) -> WorkOrderType {
        WorkOrderType::Build
    }

    fn value(&self) -> String {
        format!("{} {}", self.upgrade_name, self.upgrade_level)
    }

    fn data(&self) -> &WorkOrderData {
        &self.data
    }

    fn data_mut(&mut self) -> &mut WorkOrderData {
        &mut self.data
    }

    fn is_valid(&self, colony: &dyn ColonyContext) -> bool {
        colony.structure_exists(&self.structure)
    }

    fn attempt_to_fulfill(&mut self, colony: &dyn ColonyContext) -> Option<CitizenId> {
        claim_first_builder(&mut self.data, colony)
    }

    fn write_extra(&self, compound: &mut Compound) {
        compound.insert(TAG_STRUCTURE.into(), Value::from(self.structure.as_str()));
        compound.insert(
            TAG_UPGRADE_NAME.into(),
            Value::from(self.upgrade_name.as_str()),
        );
        compound.insert(TAG_UPGRADE_LEVEL.into(), Value::from(self.upgrade_level));
    }

    fn read_extra(&mut self, compound: &Compound) -> Result<(), LoadError> {
        self.structure = read_string(compound, TAG_STRUCTURE)?;
        self.upgrade_name = read_string(compound, TAG_UPGRADE_NAME)?;
        self.upgrade_level =
            read_u32(compound, TAG_UPGRADE_LEVEL)?.ok_or(LoadError::MissingField {
                field: TAG_UPGRADE_LEVEL,
            })?;
        Ok(())
    }
}

/// Place a decoration schematic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecorationOrder {
    data: WorkOrderData,
    schematic: String,
    name: String,
}

impl DecorationOrder {
    /// Create an order to place `schematic`, shown to players as `name`.
    pub fn new(schematic: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            data: WorkOrderData::new(),
            schematic: schematic.into(),
            name: name.into(),
        }
    }

    /// Schematic to place.
    pub fn schematic(&self) -> &str {
        &self.schematic
    }
}

impl WorkOrder for DecorationOrder {
    fn kind(&self) -> &'static str {
        DECORATION_KIND
    }

    fn order_type(&self) -> WorkOrderType {
        WorkOrderType::Decoration
    }

    fn value(&self) -> String {
        self.name.clone()
    }

    fn data(&self) -> &WorkOrderData {
        &self.data
    }

    fn data_mut(&mut self) -> &mut WorkOrderData {
        &mut self.data
    }

    fn attempt_to_fulfill(&mut self, colony: &dyn ColonyContext) -> Option<CitizenId> {
        claim_first_builder(&mut self.data, colony)
    }

    fn write_extra(&self, compound: &mut Compound) {
        compound.insert(TAG_SCHEMATIC.into(), Value::from(self.schematic.as_str()));
        compound.insert(TAG_NAME.into(), Value::from(self.name.as_str()));
    }

    fn read_extra(&mut self, compound: &Compound) -> Result<(), LoadError> {
        self.schematic = read_string(compound, TAG_SCHEMATIC)?;
        self.name = read_string(compound, TAG_NAME)?;
        Ok(())
    }
}
