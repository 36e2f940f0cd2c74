//! Player variant

use crate::attributes::{
    apply_stats, Attribute, AttributeModel, AttributeRecord, EquipError, Equipment, ItemInstance,
    SlotType, StatRecord, StatType,
};
use crate::core::config::EngineConfig;
use crate::services::persistence::{Dirty, PlayerRecord, Profile};

use super::{CombatState, Combatant, EntityRef, Intent, UserId, Vitals};

/// Stat allocation failures
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum StatError {
    /// Zero points requested
    #[error("allocate at least one point")]
    ZeroPoints,

    /// Not enough unspent points
    #[error("{requested} points requested but only {available} unspent")]
    NotEnoughPoints {
        /// Points asked for
        requested: u32,
        /// Points available
        available: u32,
    },
}

/// An active player
#[derive(Debug, Clone)]
pub struct Player {
    user_id: UserId,
    name: String,
    level: u32,
    exp: u64,
    unspent_points: u32,
    location: String,
    moving: bool,
    vitals: Vitals,
    attributes: AttributeModel,
    equipment: Equipment,
    stats: StatRecord,
    combat: CombatState,
    dirty: Dirty,
}

impl Player {
    /// Fresh level 1 player with default attributes
    pub fn new(user_id: UserId, name: impl Into<String>, location: impl Into<String>) -> Self {
        Self::with_base(user_id, name, location, AttributeRecord::player_defaults())
    }

    /// Fresh level 1 player with the given base attributes
    pub fn with_base(
        user_id: UserId,
        name: impl Into<String>,
        location: impl Into<String>,
        base: AttributeRecord,
    ) -> Self {
        Self {
            user_id,
            name: name.into(),
            level: 1,
            exp: 0,
            unspent_points: 0,
            location: location.into(),
            moving: false,
            vitals: Vitals::full(base.max_life, base.max_mentality),
            attributes: AttributeModel::new(base),
            equipment: Equipment::new(),
            stats: StatRecord::default(),
            combat: CombatState::default(),
            dirty: Dirty::all(),
        }
    }

    /// Hydrate a stored player, replaying stat and equipment modifiers
    ///
    /// The record's dirty set carries over, so a freshly created record is saved in full.
    pub fn from_record(record: PlayerRecord) -> Self {
        let mut attributes = AttributeModel::new(record.base);
        apply_stats(&record.stats, &mut attributes);
        let equipment = Equipment::from_entries(record.equipment);
        equipment.apply_modifiers(&mut attributes);

        Self {
            user_id: record.user_id,
            name: record.profile.name,
            level: record.profile.level,
            exp: record.profile.exp,
            unspent_points: record.profile.unspent_points,
            location: record.profile.location,
            moving: false,
            vitals: record.vitals,
            attributes,
            equipment,
            stats: record.stats,
            combat: CombatState::default(),
            dirty: record.dirty,
        }
    }

    /// Snapshot for the persistence store, tagged with the changed sub-records
    pub fn to_record(&self) -> PlayerRecord {
        PlayerRecord {
            user_id: self.user_id,
            profile: Profile {
                name: self.name.clone(),
                level: self.level,
                exp: self.exp,
                unspent_points: self.unspent_points,
                location: self.location.clone(),
            },
            vitals: self.vitals,
            base: *self.attributes.base_record(),
            stats: self.stats,
            equipment: self.equipment.entries().to_vec(),
            dirty: self.dirty,
        }
    }

    /// Clear change tracking after a snapshot was queued
    pub fn mark_saved(&mut self) {
        self.dirty = Dirty::empty();
        self.equipment.mark_persisted();
    }

    /// Re-mark the changes of a queued snapshot that failed to save
    pub fn restore_unsaved(&mut self, record: &PlayerRecord) {
        self.dirty |= record.dirty;
        if record.dirty.contains(Dirty::EQUIPMENT) {
            self.equipment.restore_removed(&record.equipment);
        }
    }

    /// Sub-records changed since the last save
    pub const fn dirty(&self) -> Dirty {
        self.dirty
    }

    /// Account id
    pub const fn user_id(&self) -> UserId {
        self.user_id
    }

    /// Experience toward the next level
    pub const fn exp(&self) -> u64 {
        self.exp
    }

    /// Stat points waiting to be allocated
    pub const fn unspent_points(&self) -> u32 {
        self.unspent_points
    }

    pub(crate) fn set_moving(&mut self, moving: bool) {
        self.moving = moving;
    }

    /// Move to another location
    pub fn relocate(&mut self, location: impl Into<String>) {
        self.location = location.into();
        self.dirty |= Dirty::PROFILE;
    }

    /// Add experience, levelling up for every `exp_per_level * level` crossed
    ///
    /// Returns the number of levels gained.
    pub fn gain_exp(&mut self, amount: u64, config: &EngineConfig) -> u32 {
        self.exp += amount;
        let mut gained = 0;
        loop {
            let threshold = config.exp_per_level * u64::from(self.level);
            if threshold == 0 || self.exp < threshold {
                break;
            }
            self.exp -= threshold;
            self.level += 1;
            self.unspent_points += config.stat_points_per_level;
            gained += 1;
        }
        self.dirty |= Dirty::PROFILE;
        gained
    }

    /// Spend unspent points on a stat and rebuild the stat modifiers
    pub fn allocate_stat(&mut self, stat: StatType, points: u32) -> Result<(), StatError> {
        if points == 0 {
            return Err(StatError::ZeroPoints);
        }
        if points > self.unspent_points {
            return Err(StatError::NotEnoughPoints {
                requested: points,
                available: self.unspent_points,
            });
        }

        self.unspent_points -= points;
        self.stats.set(stat, self.stats.get(stat) + points);
        apply_stats(&self.stats, &mut self.attributes);
        self.clamp_vitals();
        self.dirty |= Dirty::PROFILE | Dirty::STATS;
        Ok(())
    }

    /// Equip an item, see [`Equipment::equip`]
    pub fn equip(&mut self, slot: SlotType, item: &ItemInstance, index: Option<u8>) -> Result<u8, EquipError> {
        let index = self.equipment.equip(slot, item, &mut self.attributes, index)?;
        self.dirty |= Dirty::EQUIPMENT;
        Ok(index)
    }

    /// Unequip an item, see [`Equipment::unequip`]
    pub fn unequip(&mut self, slot: SlotType, index: u8) -> Result<ItemInstance, EquipError> {
        let item = self.equipment.unequip(slot, index, &mut self.attributes)?;
        self.clamp_vitals();
        self.dirty |= Dirty::EQUIPMENT;
        Ok(item)
    }

    fn clamp_vitals(&mut self) {
        let max_life = self.attributes.get(Attribute::MaxLife);
        let max_mentality = self.attributes.get(Attribute::MaxMentality);
        self.vitals.life = self.vitals.life.min(max_life);
        self.vitals.mentality = self.vitals.mentality.min(max_mentality);
    }
}

impl Combatant for Player {
    fn entity_ref(&self) -> EntityRef {
        EntityRef::Player(self.user_id)
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn level(&self) -> u32 {
        self.level
    }

    fn location(&self) -> &str {
        &self.location
    }

    fn attributes(&self) -> &AttributeModel {
        &self.attributes
    }

    fn attributes_mut(&mut self) -> &mut AttributeModel {
        &mut self.attributes
    }

    fn equipment(&self) -> &Equipment {
        &self.equipment
    }

    fn stats(&self) -> &StatRecord {
        &self.stats
    }

    fn vitals(&self) -> &Vitals {
        &self.vitals
    }

    fn vitals_mut(&mut self) -> &mut Vitals {
        self.dirty |= Dirty::VITALS;
        &mut self.vitals
    }

    fn combat(&self) -> &CombatState {
        &self.combat
    }

    fn combat_mut(&mut self) -> &mut CombatState {
        &mut self.combat
    }

    fn death_duration(&self, config: &EngineConfig) -> f32 {
        config.player_death_time
    }

    fn is_moving(&self) -> bool {
        self.moving
    }

    fn update(&mut self, dt: f32, config: &EngineConfig) -> Option<Intent> {
        if self.combat.dead {
            return None;
        }
        let vitals = self.vitals_mut();
        vitals.hunger = (vitals.hunger - config.hunger_decay_per_sec * dt).max(0.0);
        vitals.thirst = (vitals.thirst - config.thirst_decay_per_sec * dt).max(0.0);
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributes::{ModifierOp, ModifierTemplate};
    use approx::assert_relative_eq;

    fn sword() -> ItemInstance {
        ItemInstance {
            item_id: "iron_sword".to_string(),
            name: "Iron Sword".to_string(),
            slot: Some(SlotType::Weapon),
            modifiers: vec![ModifierTemplate {
                attribute: Attribute::AttackPower,
                op: ModifierOp::Add,
                value: 5.0,
            }],
        }
    }

    #[test]
    fn test_level_up_awards_points() {
        let config = EngineConfig::default();
        let mut player = Player::new(1, "Ayla", "village_square");

        assert_eq!(player.gain_exp(99, &config), 0);
        assert_eq!(player.gain_exp(1, &config), 1);
        assert_eq!(player.level(), 2);
        assert_eq!(player.exp(), 0);
        assert_eq!(player.unspent_points(), 3);

        // 200 for level 2, 300 for level 3
        assert_eq!(player.gain_exp(520, &config), 2);
        assert_eq!(player.level(), 4);
        assert_eq!(player.exp(), 20);
        assert_eq!(player.unspent_points(), 9);
    }

    #[test]
    fn test_allocate_stat_applies_modifiers() {
        let config = EngineConfig::default();
        let mut player = Player::new(1, "Ayla", "village_square");
        player.gain_exp(100, &config);

        assert_eq!(player.allocate_stat(StatType::Strength, 0), Err(StatError::ZeroPoints));
        assert_eq!(
            player.allocate_stat(StatType::Strength, 4),
            Err(StatError::NotEnoughPoints { requested: 4, available: 3 })
        );

        player.allocate_stat(StatType::Strength, 3).unwrap();
        assert_eq!(player.unspent_points(), 0);
        assert_eq!(player.stats().strength, 3);
        assert_relative_eq!(player.attributes().get(Attribute::AttackPower), 16.0);
        assert!(player.dirty().contains(Dirty::STATS));
    }

    #[test]
    fn test_record_round_trip_rehydrates_modifiers() {
        let config = EngineConfig::default();
        let mut player = Player::new(7, "Bram", "old_mill");
        player.gain_exp(100, &config);
        player.allocate_stat(StatType::Strength, 2).unwrap();
        player.equip(SlotType::Weapon, &sword(), None).unwrap();
        let attack = player.attributes().get(Attribute::AttackPower);
        assert_relative_eq!(attack, 19.0);

        let restored = Player::from_record(player.to_record());
        assert_eq!(restored.name(), "Bram");
        assert_eq!(restored.location(), "old_mill");
        assert_eq!(restored.level(), 2);
        assert_relative_eq!(restored.attributes().get(Attribute::AttackPower), attack);
        assert_eq!(restored.equipment().iter().count(), 1);
    }

    #[test]
    fn test_needs_decay_while_alive() {
        let config = EngineConfig::default();
        let mut player = Player::new(1, "Ayla", "village_square");
        player.update(10.0, &config);
        assert_relative_eq!(player.vitals().hunger, 99.9, epsilon = 1e-4);
        assert_relative_eq!(player.vitals().thirst, 99.85, epsilon = 1e-4);
    }

    #[test]
    fn test_unequip_clamps_life() {
        let mut player = Player::new(1, "Ayla", "village_square");
        let amulet = ItemInstance {
            item_id: "amulet".to_string(),
            name: "Amulet".to_string(),
            slot: Some(SlotType::Accessory),
            modifiers: vec![ModifierTemplate {
                attribute: Attribute::MaxLife,
                op: ModifierOp::Add,
                value: 50.0,
            }],
        };
        player.equip(SlotType::Accessory, &amulet, None).unwrap();
        player.vitals_mut().life = 150.0;

        player.unequip(SlotType::Accessory, 0).unwrap();
        assert_relative_eq!(player.life(), 100.0);
    }
}
