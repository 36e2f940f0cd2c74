//! Combat and lifecycle rules shared by every [`Combatant`]
//!
//! Each function takes the entity through the capability contract, so the
//! same code drives players and monsters. A tick runs [`early_update`] on every
//! active entity, then the variant hooks, then [`late_update`] on every entity.

use crate::attributes::Attribute;
use crate::core::config::EngineConfig;

use super::combat::{DamageResult, DamageType, Hit};
use super::Combatant;

/// Floor applied to attack speed before computing a cooldown
pub const MIN_ATTACK_SPEED: f32 = 0.01;

/// Lifecycle transition reported by the early and late phases
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Life reached zero this tick
    Died,
    /// The death timer ran out and the entity is back at full life
    Respawned,
}

/// Apply a hit to `target`
///
/// Effective defense is `max(0, defense - penetration)`, final damage is
/// `max(0, amount - effective_defense)`. Life may go below zero here; the death
/// transition is left to the late phase.
pub fn damage<T: Combatant + ?Sized>(target: &mut T, hit: Hit) -> DamageResult {
    let final_damage = match hit.kind.mitigation() {
        Some((defense, _)) => {
            let defense = target.attributes().get(defense);
            let effective = (defense - hit.penetration).max(0.0);
            (hit.amount - effective).max(0.0)
        }
        None => hit.amount.max(0.0),
    };

    let vitals = target.vitals_mut();
    vitals.life -= final_damage;
    let remaining_life = vitals.life;

    if let Some(cause) = hit.cause {
        target.combat_mut().last_damage_cause = Some(cause);
    }

    DamageResult {
        kind: hit.kind,
        raw_amount: hit.amount,
        final_damage,
        remaining_life,
        critical: hit.critical,
    }
}

/// Whether `attacker` may attack right now
pub fn can_attack<A: Combatant + ?Sized>(attacker: &A) -> bool {
    !attacker.is_dead() && attacker.combat().cooldown <= 0.0
}

/// Attacker's raw damage for `kind`
pub fn raw_damage<A: Combatant + ?Sized>(attacker: &A, kind: DamageType) -> f32 {
    attacker.attributes().get(kind.offense())
}

/// Build the hit `attacker` would deal, using its offense attribute unless
/// `amount` is given
pub fn prepare_hit<A: Combatant + ?Sized>(attacker: &A, kind: DamageType, amount: Option<f32>) -> Hit {
    let amount = amount.unwrap_or_else(|| raw_damage(attacker, kind));
    let penetration = kind
        .mitigation()
        .map_or(0.0, |(_, penetration)| attacker.attributes().get(penetration));
    Hit::new(amount, kind)
        .with_penetration(penetration)
        .with_cause(attacker.entity_ref())
}

/// Scale `hit` by the attacker's critical damage when `roll` lands under its
/// critical chance
pub fn apply_critical<A: Combatant + ?Sized>(attacker: &A, mut hit: Hit, roll: f32) -> Hit {
    let chance = attacker.attributes().get(Attribute::CritChance);
    if roll >= chance {
        return hit;
    }
    let bonus = attacker.attributes().get(Attribute::CritDamage).max(0.0);
    hit.amount *= 1.0 + bonus;
    hit.critical(true)
}

/// Start the attack cooldown from the attacker's current attack speed
pub fn start_cooldown<A: Combatant + ?Sized>(attacker: &mut A) {
    let speed = attacker.attributes().get(Attribute::AttackSpeed).max(MIN_ATTACK_SPEED);
    let combat = attacker.combat_mut();
    combat.max_cooldown = 1.0 / speed;
    combat.cooldown = combat.max_cooldown;
}

/// Deliver a prepared hit, gated on both parties being alive and the attacker's
/// cooldown having run out
///
/// Returns `None` without touching either entity when the attack is not allowed.
pub fn strike<A, T>(attacker: &mut A, target: &mut T, hit: Hit) -> Option<DamageResult>
where
    A: Combatant + ?Sized,
    T: Combatant + ?Sized,
{
    if !can_attack(attacker) || target.is_dead() {
        return None;
    }
    let result = damage(target, hit);
    start_cooldown(attacker);
    Some(result)
}

/// Attack `target` with the attacker's own offense, or with `amount` if given
pub fn attack<A, T>(
    attacker: &mut A,
    target: &mut T,
    kind: DamageType,
    amount: Option<f32>,
) -> Option<DamageResult>
where
    A: Combatant + ?Sized,
    T: Combatant + ?Sized,
{
    let hit = prepare_hit(attacker, kind, amount);
    strike(attacker, target, hit)
}

/// Early phase: death countdown while dead, cooldown decay and regeneration
/// while alive
pub fn early_update<E: Combatant + ?Sized>(
    entity: &mut E,
    dt: f32,
    config: &EngineConfig,
) -> Option<Transition> {
    if entity.is_dead() {
        let combat = entity.combat_mut();
        combat.death_timer -= dt;
        if combat.death_timer <= 0.0 {
            respawn(entity);
            return Some(Transition::Respawned);
        }
        return None;
    }

    let combat = entity.combat_mut();
    combat.cooldown = (combat.cooldown - dt).max(0.0);

    let max_life = entity.max_life();
    let max_mentality = entity.attributes().get(Attribute::MaxMentality);
    let vitals = entity.vitals_mut();
    // A pending death stays pending until the late phase sees it
    if vitals.life > 0.0 && vitals.life < max_life {
        vitals.life = (vitals.life + config.life_regen_per_tick).min(max_life);
    }
    if vitals.mentality < max_mentality {
        vitals.mentality = (vitals.mentality + config.mentality_regen_per_tick).min(max_mentality);
    }
    None
}

/// Late phase: the `Alive -> Dead` check
pub fn late_update<E: Combatant + ?Sized>(entity: &mut E, config: &EngineConfig) -> Option<Transition> {
    if entity.is_dead() || entity.life() > 0.0 {
        return None;
    }
    on_death(entity, config);
    Some(Transition::Died)
}

/// Force the entity into the dead state
pub fn on_death<E: Combatant + ?Sized>(entity: &mut E, config: &EngineConfig) {
    let duration = entity.death_duration(config);
    entity.vitals_mut().life = 0.0;
    let combat = entity.combat_mut();
    combat.dead = true;
    combat.death_timer = duration;
    combat.cooldown = 0.0;
}

/// Bring the entity back at full life with no target
pub fn respawn<E: Combatant + ?Sized>(entity: &mut E) {
    let max_life = entity.max_life();
    entity.vitals_mut().life = max_life;
    let combat = entity.combat_mut();
    combat.dead = false;
    combat.death_timer = 0.0;
    combat.current_target = None;
    combat.last_damage_cause = None;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributes::AttributeRecord;
    use crate::entity::{EntityRef, Player};
    use approx::assert_relative_eq;

    fn fighter(id: u64, attack: f32, defense: f32, life: f32) -> Player {
        let mut base = AttributeRecord::player_defaults();
        base.attack_power = attack;
        base.defense = defense;
        base.max_life = life;
        Player::with_base(id, format!("p{id}"), "arena", base)
    }

    #[test]
    fn test_defense_mitigates_physical_damage() {
        let mut attacker = fighter(1, 20.0, 0.0, 100.0);
        let mut target = fighter(2, 10.0, 5.0, 50.0);

        let result = attack(&mut attacker, &mut target, DamageType::Physical, None).unwrap();
        assert_relative_eq!(result.raw_amount, 20.0);
        assert_relative_eq!(result.final_damage, 15.0);
        assert_relative_eq!(result.remaining_life, 35.0);
        assert_relative_eq!(target.life(), 35.0);
        assert_eq!(target.combat().last_damage_cause, Some(EntityRef::Player(1)));
    }

    #[test]
    fn test_penetration_never_makes_defense_negative() {
        let mut target = fighter(2, 10.0, 5.0, 50.0);
        let hit = Hit::new(3.0, DamageType::Physical).with_penetration(50.0);
        let result = damage(&mut target, hit);
        assert_relative_eq!(result.final_damage, 3.0);

        let hit = Hit::new(2.0, DamageType::Physical);
        let result = damage(&mut target, hit);
        assert_relative_eq!(result.final_damage, 0.0);
    }

    #[test]
    fn test_absolute_damage_ignores_defense() {
        let mut target = fighter(2, 10.0, 500.0, 50.0);
        let result = damage(&mut target, Hit::new(12.0, DamageType::Absolute));
        assert_relative_eq!(result.final_damage, 12.0);
    }

    #[test]
    fn test_magic_uses_magic_power_and_magic_defense() {
        let mut attacker = fighter(1, 20.0, 0.0, 100.0);
        attacker.attributes_mut().set_base(Attribute::MagicPower, 30.0);
        attacker.attributes_mut().set_base(Attribute::MagicPenetration, 2.0);
        let mut target = fighter(2, 10.0, 100.0, 100.0);
        target.attributes_mut().set_base(Attribute::MagicDefense, 10.0);

        let result = attack(&mut attacker, &mut target, DamageType::Magic, None).unwrap();
        assert_relative_eq!(result.final_damage, 22.0);
    }

    #[test]
    fn test_cooldown_gates_attacks() {
        let config = EngineConfig::default();
        let mut attacker = fighter(1, 20.0, 0.0, 100.0);
        attacker.attributes_mut().set_base(Attribute::AttackSpeed, 2.0);
        let mut target = fighter(2, 1.0, 0.0, 1000.0);

        assert!(attack(&mut attacker, &mut target, DamageType::Physical, None).is_some());
        assert_relative_eq!(attacker.combat().max_cooldown, 0.5);

        attacker.early_update(0.2, &config);
        let life = target.life();
        assert!(attack(&mut attacker, &mut target, DamageType::Physical, None).is_none());
        assert_relative_eq!(target.life(), life);

        attacker.early_update(0.4, &config);
        assert!(attack(&mut attacker, &mut target, DamageType::Physical, None).is_some());
    }

    #[test]
    fn test_zero_attack_speed_is_floored() {
        let mut attacker = fighter(1, 20.0, 0.0, 100.0);
        attacker.attributes_mut().set_base(Attribute::AttackSpeed, 0.0);
        start_cooldown(&mut attacker);
        assert_relative_eq!(attacker.combat().max_cooldown, 100.0);
    }

    #[test]
    fn test_dead_parties_cannot_fight() {
        let config = EngineConfig::default();
        let mut attacker = fighter(1, 20.0, 0.0, 100.0);
        let mut target = fighter(2, 10.0, 0.0, 50.0);

        target.vitals_mut().life = 0.0;
        assert_eq!(target.late_update(&config), Some(Transition::Died));
        assert!(attack(&mut attacker, &mut target, DamageType::Physical, Some(5.0)).is_none());
        assert_relative_eq!(attacker.combat().cooldown, 0.0);

        attacker.vitals_mut().life = -3.0;
        attacker.late_update(&config);
        let mut other = fighter(3, 1.0, 0.0, 50.0);
        assert!(attack(&mut attacker, &mut other, DamageType::Physical, Some(5.0)).is_none());
        assert_relative_eq!(other.life(), 50.0);
    }

    #[test]
    fn test_death_and_respawn_cycle() {
        let config = EngineConfig::default();
        let mut player = fighter(1, 10.0, 0.0, 80.0);
        player.vitals_mut().life = -4.0;

        // Regeneration must not rescue a pending death
        assert_eq!(player.early_update(0.05, &config), None);
        assert_eq!(player.late_update(&config), Some(Transition::Died));
        assert!(player.is_dead());
        assert_relative_eq!(player.life(), 0.0);
        assert_relative_eq!(player.combat().death_timer, 10.0);

        // Death is reported once per episode
        assert_eq!(player.late_update(&config), None);

        let mut respawned = 0;
        for _ in 0..19 {
            if player.early_update(0.5, &config).is_some() {
                respawned += 1;
            }
        }
        assert_eq!(respawned, 0);
        assert!(player.is_dead());

        assert_eq!(player.early_update(0.5, &config), Some(Transition::Respawned));
        assert!(!player.is_dead());
        assert_relative_eq!(player.life(), 80.0);
        assert!(player.current_target().is_none());
        assert!(player.combat().last_damage_cause.is_none());
    }

    #[test]
    fn test_regeneration_caps_at_max() {
        let config = EngineConfig::default().with_life_regen(5.0);
        let mut player = fighter(1, 10.0, 0.0, 100.0);
        player.vitals_mut().life = 97.0;
        player.early_update(0.05, &config);
        assert_relative_eq!(player.life(), 100.0);
    }

    #[test]
    fn test_critical_roll() {
        let attacker = fighter(1, 20.0, 0.0, 100.0);
        let hit = prepare_hit(&attacker, DamageType::Physical, None);

        let normal = apply_critical(&attacker, hit.clone(), 0.99);
        assert!(!normal.critical);
        assert_relative_eq!(normal.amount, 20.0);

        let crit = apply_critical(&attacker, hit, 0.0);
        assert!(crit.critical);
        assert_relative_eq!(crit.amount, 30.0);
    }
}
