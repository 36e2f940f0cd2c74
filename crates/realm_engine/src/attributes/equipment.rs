//! Equipment slots and equipment-derived modifiers

use serde::{Deserialize, Serialize};

use super::model::AttributeModel;
use super::modifier::{ModifierTemplate, SourceTag};

/// Kind of attachment point an item can occupy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SlotType {
    /// Held weapon
    Weapon,
    /// Helmet
    Head,
    /// Body armor
    Body,
    /// Leg armor
    Legs,
    /// Boots
    Feet,
    /// Rings and trinkets
    Accessory,
}

impl SlotType {
    /// Every slot type
    pub const ALL: [Self; 6] = [
        Self::Weapon,
        Self::Head,
        Self::Body,
        Self::Legs,
        Self::Feet,
        Self::Accessory,
    ];

    /// Number of items of this type that can be worn at once
    pub const fn capacity(self) -> u8 {
        match self {
            Self::Accessory => 3,
            _ => 1,
        }
    }

    /// Lowercase key used in source tags
    pub const fn key(self) -> &'static str {
        match self {
            Self::Weapon => "weapon",
            Self::Head => "head",
            Self::Body => "body",
            Self::Legs => "legs",
            Self::Feet => "feet",
            Self::Accessory => "accessory",
        }
    }
}

/// One concrete item
///
/// Carries its slot requirement and modifiers so equipment can be rebuilt
/// from persisted state without the static data registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemInstance {
    /// Item definition id
    pub item_id: String,
    /// Display name
    pub name: String,
    /// Slot the item must be equipped in, if equippable
    #[serde(default)]
    pub slot: Option<SlotType>,
    /// Modifiers contributed while equipped
    #[serde(default)]
    pub modifiers: Vec<ModifierTemplate>,
}

/// Persistence bookkeeping for an equipment entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PersistState {
    /// Matches the stored copy
    #[default]
    Unchanged,
    /// Not stored yet
    New,
    /// Stored, but no longer equipped
    Removed,
}

/// An item occupying `(slot, index)`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquipmentEntry {
    /// Slot type
    pub slot: SlotType,
    /// Index within the slot type's capacity
    pub index: u8,
    /// Equipped item
    pub item: ItemInstance,
    /// Persistence tag
    #[serde(default)]
    pub state: PersistState,
}

impl EquipmentEntry {
    fn source(&self) -> SourceTag {
        SourceTag::equip(self.slot, self.index)
    }

    fn is_active(&self) -> bool {
        self.state != PersistState::Removed
    }
}

/// Equipment failures
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum EquipError {
    /// Item is not equippable at all
    #[error("{0} cannot be equipped")]
    NotEquippable(String),

    /// Item requires another slot type
    #[error("{item} goes in the {expected:?} slot, not {requested:?}")]
    SlotMismatch {
        /// Item name
        item: String,
        /// Slot the item requires
        expected: SlotType,
        /// Slot that was requested
        requested: SlotType,
    },

    /// Every index of the slot type is occupied, or the requested one is
    #[error("{0:?} slot is full")]
    SlotFull(SlotType),

    /// Index beyond the slot type's capacity
    #[error("{slot:?} has no index {index}")]
    InvalidIndex {
        /// Slot type
        slot: SlotType,
        /// Requested index
        index: u8,
    },

    /// Nothing equipped at the requested position
    #[error("nothing equipped in {slot:?} {index}")]
    EmptySlot {
        /// Slot type
        slot: SlotType,
        /// Requested index
        index: u8,
    },
}

/// Equipment table keyed by `(slot, index)`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Equipment {
    entries: Vec<EquipmentEntry>,
}

impl Equipment {
    /// Empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a table from stored entries
    pub fn from_entries(entries: Vec<EquipmentEntry>) -> Self {
        Self { entries }
    }

    /// Equip a copy of `item`, registering its modifiers under `equip:<slot>:<index>`
    ///
    /// Picks the first free index when `index` is `None`. Returns the index used.
    pub fn equip(
        &mut self,
        slot: SlotType,
        item: &ItemInstance,
        model: &mut AttributeModel,
        index: Option<u8>,
    ) -> Result<u8, EquipError> {
        let Some(required) = item.slot else {
            return Err(EquipError::NotEquippable(item.name.clone()));
        };
        if required != slot {
            return Err(EquipError::SlotMismatch {
                item: item.name.clone(),
                expected: required,
                requested: slot,
            });
        }

        let index = match index {
            Some(index) if index >= slot.capacity() => {
                return Err(EquipError::InvalidIndex { slot, index });
            }
            Some(index) if self.get(slot, index).is_some() => return Err(EquipError::SlotFull(slot)),
            Some(index) => index,
            None => (0..slot.capacity())
                .find(|i| self.get(slot, *i).is_none())
                .ok_or(EquipError::SlotFull(slot))?,
        };

        // Re-equipping over a stored-but-removed entry overwrites it
        if let Some(pos) = self.position(slot, index) {
            self.entries.remove(pos);
        }

        let entry = EquipmentEntry { slot, index, item: item.clone(), state: PersistState::New };
        let source = entry.source();
        model.add_modifiers(item.modifiers.iter().map(|m| m.tagged(source.clone())));
        self.entries.push(entry);

        Ok(index)
    }

    /// Remove the item at `(slot, index)` and its modifiers, handing the item back
    pub fn unequip(
        &mut self,
        slot: SlotType,
        index: u8,
        model: &mut AttributeModel,
    ) -> Result<ItemInstance, EquipError> {
        let pos = self
            .position(slot, index)
            .filter(|pos| self.entries[*pos].is_active())
            .ok_or(EquipError::EmptySlot { slot, index })?;

        model.remove_by_source(&SourceTag::equip(slot, index));

        if self.entries[pos].state == PersistState::New {
            // Never stored, nothing to delete later
            return Ok(self.entries.remove(pos).item);
        }
        let entry = &mut self.entries[pos];
        entry.state = PersistState::Removed;
        Ok(entry.item.clone())
    }

    /// Replay every equipped item's modifiers onto `model`
    ///
    /// Existing `equip:*` groups for these entries are replaced, so this is safe
    /// to call on a model that already has them.
    pub fn apply_modifiers(&self, model: &mut AttributeModel) {
        for entry in self.iter() {
            let source = entry.source();
            model.remove_by_source(&source);
            model.add_modifiers(entry.item.modifiers.iter().map(|m| m.tagged(source.clone())));
        }
    }

    /// Item equipped at `(slot, index)`
    pub fn get(&self, slot: SlotType, index: u8) -> Option<&ItemInstance> {
        self.iter()
            .find(|e| e.slot == slot && e.index == index)
            .map(|e| &e.item)
    }

    /// Currently equipped entries
    pub fn iter(&self) -> impl Iterator<Item = &EquipmentEntry> {
        self.entries.iter().filter(|e| e.is_active())
    }

    /// Every entry including removed ones awaiting persistence
    pub fn entries(&self) -> &[EquipmentEntry] {
        &self.entries
    }

    /// Forget removed entries and mark the rest as stored
    pub fn mark_persisted(&mut self) {
        self.entries.retain(EquipmentEntry::is_active);
        for entry in &mut self.entries {
            entry.state = PersistState::Unchanged;
        }
    }

    /// Bring back removals from a snapshot the store never accepted
    ///
    /// A position that has been re-equipped since keeps its current entry.
    pub fn restore_removed(&mut self, entries: &[EquipmentEntry]) {
        for entry in entries.iter().filter(|e| e.state == PersistState::Removed) {
            if self.position(entry.slot, entry.index).is_none() {
                self.entries.push(entry.clone());
            }
        }
    }

    /// Whether any entry differs from the stored copy
    pub fn is_dirty(&self) -> bool {
        self.entries.iter().any(|e| e.state != PersistState::Unchanged)
    }

    fn position(&self, slot: SlotType, index: u8) -> Option<usize> {
        self.entries.iter().position(|e| e.slot == slot && e.index == index)
    }
}
