//! Monster variant

use crate::attributes::{Attribute, AttributeModel, Equipment, StatRecord};
use crate::core::config::EngineConfig;
use crate::data::{DropEntry, MonsterDef};

use super::{CombatState, Combatant, DamageType, EntityRef, Intent, MonsterKey, Vitals};

/// A spawned monster
///
/// Never removed from its location on death; it respawns in place.
#[derive(Debug, Clone)]
pub struct Monster {
    key: MonsterKey,
    def_id: String,
    name: String,
    level: u32,
    location: String,
    aggressive: bool,
    exp_reward: u64,
    death_time: f32,
    drops: Vec<DropEntry>,
    vitals: Vitals,
    attributes: AttributeModel,
    equipment: Equipment,
    stats: StatRecord,
    combat: CombatState,
}

impl Monster {
    /// Instantiate a definition at a location
    pub fn from_def(key: MonsterKey, def: &MonsterDef, location: impl Into<String>) -> Self {
        let attributes = AttributeModel::new(def.attributes);
        let vitals = Vitals::full(
            attributes.get(Attribute::MaxLife),
            attributes.get(Attribute::MaxMentality),
        );
        Self {
            key,
            def_id: def.id.clone(),
            name: def.name.clone(),
            level: def.level,
            location: location.into(),
            aggressive: def.aggressive,
            exp_reward: def.exp_reward,
            death_time: def.death_time,
            drops: def.drops.clone(),
            vitals,
            attributes,
            equipment: Equipment::new(),
            stats: StatRecord::default(),
            combat: CombatState::default(),
        }
    }

    /// Key within the owning location
    pub const fn key(&self) -> MonsterKey {
        self.key
    }

    /// Definition id
    pub fn def_id(&self) -> &str {
        &self.def_id
    }

    /// Whether the monster attacks unprovoked
    pub const fn is_aggressive(&self) -> bool {
        self.aggressive
    }

    /// Experience granted to the killer
    pub const fn exp_reward(&self) -> u64 {
        self.exp_reward
    }

    /// Drop table
    pub fn drops(&self) -> &[DropEntry] {
        &self.drops
    }

    /// Set or clear the current target
    pub fn set_target(&mut self, target: Option<EntityRef>) {
        self.combat.current_target = target;
    }
}

impl Combatant for Monster {
    fn entity_ref(&self) -> EntityRef {
        EntityRef::Monster { location: self.location.clone(), key: self.key }
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
        &mut self.vitals
    }

    fn combat(&self) -> &CombatState {
        &self.combat
    }

    fn combat_mut(&mut self) -> &mut CombatState {
        &mut self.combat
    }

    fn death_duration(&self, _config: &EngineConfig) -> f32 {
        self.death_time
    }

    /// Retaliate against the last attacker, or look for prey when aggressive
    fn update(&mut self, _dt: f32, _config: &EngineConfig) -> Option<Intent> {
        // A pending death does not act
        if self.combat.dead || self.vitals.life <= 0.0 {
            return None;
        }
        if self.combat.current_target.is_none() {
            self.combat.current_target = self.combat.last_damage_cause.clone();
        }
        match &self.combat.current_target {
            Some(target) if self.combat.cooldown <= 0.0 => Some(Intent::Attack {
                target: target.clone(),
                kind: DamageType::Physical,
            }),
            Some(_) => None,
            None if self.aggressive => Some(Intent::SeekTarget),
            None => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributes::AttributeRecord;
    use approx::assert_relative_eq;
    use slotmap::SlotMap;

    fn def(aggressive: bool) -> MonsterDef {
        MonsterDef {
            id: "field_rat".to_string(),
            name: "Field Rat".to_string(),
            level: 1,
            attributes: AttributeRecord { max_life: 20.0, attack_power: 3.0, attack_speed: 1.0, ..Default::default() },
            death_time: 30.0,
            exp_reward: 10,
            aggressive,
            drops: Vec::new(),
        }
    }

    fn spawn(aggressive: bool) -> Monster {
        let mut monsters: SlotMap<MonsterKey, Monster> = SlotMap::with_key();
        let key = monsters.insert_with_key(|key| Monster::from_def(key, &def(aggressive), "wheat_fields"));
        monsters.remove(key).unwrap()
    }

    #[test]
    fn test_spawns_at_full_life() {
        let monster = spawn(false);
        assert_relative_eq!(monster.life(), 20.0);
        assert_relative_eq!(monster.death_duration(&EngineConfig::default()), 30.0);
    }

    #[test]
    fn test_passive_monster_idles_until_provoked() {
        let config = EngineConfig::default();
        let mut monster = spawn(false);
        assert_eq!(monster.update(0.05, &config), None);

        monster.combat_mut().last_damage_cause = Some(EntityRef::Player(4));
        assert_eq!(
            monster.update(0.05, &config),
            Some(Intent::Attack { target: EntityRef::Player(4), kind: DamageType::Physical })
        );
    }

    #[test]
    fn test_aggressive_monster_seeks_and_waits_for_cooldown() {
        let config = EngineConfig::default();
        let mut monster = spawn(true);
        assert_eq!(monster.update(0.05, &config), Some(Intent::SeekTarget));

        monster.set_target(Some(EntityRef::Player(2)));
        monster.combat_mut().cooldown = 0.5;
        assert_eq!(monster.update(0.05, &config), None);
    }
}
