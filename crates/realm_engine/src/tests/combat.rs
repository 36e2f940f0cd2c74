use approx::assert_relative_eq;

use super::{count, ticks, world_with_player};
use crate::core::config::EngineConfig;
use crate::entity::{Combatant, DamageType, EntityRef};
use crate::events::{EventKind, SimEvent};
use crate::services::persistence::MemoryStore;
use crate::world::AttackError;

fn config_at(location: &str) -> EngineConfig {
    EngineConfig { start_location: Some(location.to_string()), ..EngineConfig::default() }
}

#[test]
fn test_killing_a_monster_rewards_the_player() {
    let (mut world, log) = world_with_player(config_at("wheat_fields"));
    world.tick(0.5);

    let key = world.location("wheat_fields").unwrap().monster_keys()[0];
    let rat = EntityRef::Monster { location: "wheat_fields".to_string(), key };
    let me = EntityRef::Player(1);

    let result = world.attack(&me, &rat, DamageType::Physical, Some(100.0)).unwrap();
    assert_relative_eq!(result.final_damage, 99.0);
    assert!(!result.critical);
    assert_eq!(
        world.attack(&me, &rat, DamageType::Physical, Some(100.0)),
        Err(AttackError::CoolingDown)
    );

    world.tick(0.5);
    let monster = world.location("wheat_fields").unwrap().monster(key).unwrap();
    assert!(monster.is_dead());
    assert_relative_eq!(monster.combat().death_timer, 20.0);
    assert_eq!(world.player(1).unwrap().exp(), 15);
    assert!(log.borrow().contains(&SimEvent::Died {
        entity: rat.clone(),
        name: "field rat".to_string(),
        killer: Some(me.clone()),
    }));
    assert_eq!(count(&log, EventKind::ExpGained), 1);

    ticks(&mut world, 39, 0.5);
    assert!(world.location("wheat_fields").unwrap().monster(key).unwrap().is_dead());
    world.tick(0.5);
    let monster = world.location("wheat_fields").unwrap().monster(key).unwrap();
    assert!(!monster.is_dead());
    assert_relative_eq!(monster.life(), 30.0);
    assert!(monster.current_target().is_none());
}

#[test]
fn test_aggressive_monster_hunts_players_in_reach() {
    let (mut world, log) = world_with_player(config_at("cellar"));

    // Spawn, pick a target, then attack
    ticks(&mut world, 3, 0.5);
    assert_relative_eq!(world.player(1).unwrap().life(), 95.0);
    assert_eq!(count(&log, EventKind::Attacked), 1);

    world.travel(1, "old_mill").unwrap();
    let life = world.player(1).unwrap().life();
    ticks(&mut world, 4, 0.5);

    let player = world.player(1).unwrap();
    assert_eq!(player.location(), "old_mill");
    assert!(player.life() >= life);
    assert_eq!(count(&log, EventKind::Attacked), 1);
}

#[test]
fn test_self_and_unknown_targets_are_rejected() {
    let (mut world, _log) = world_with_player(EngineConfig::default());
    let me = EntityRef::Player(1);
    assert_eq!(
        world.attack(&me, &me, DamageType::Physical, None),
        Err(AttackError::SelfTarget)
    );
    assert_eq!(
        world.attack(&me, &EntityRef::Player(8), DamageType::Physical, None),
        Err(AttackError::Unknown(EntityRef::Player(8)))
    );
}

#[test]
fn test_players_can_duel() {
    let (mut world, _log) = world_with_player(EngineConfig::default());
    world.login(2, "Bram", &MemoryStore::new()).unwrap();
    let (a, b) = (EntityRef::Player(1), EntityRef::Player(2));

    let result = world.attack(&a, &b, DamageType::Absolute, Some(20.0)).unwrap();
    assert_relative_eq!(result.remaining_life, 80.0);
    assert_eq!(world.attack(&a, &b, DamageType::Absolute, Some(20.0)), Err(AttackError::CoolingDown));
    assert_eq!(world.player(1).unwrap().current_target(), Some(&b));

    world.tick(1.0);
    assert!(world.attack(&a, &b, DamageType::Absolute, Some(20.0)).is_ok());
    assert!(world.player(2).unwrap().life() < 61.0);
}

#[test]
fn test_dead_player_respawns_at_configured_location() {
    let config = EngineConfig {
        player_respawn_location: Some("village_square".to_string()),
        ..config_at("wheat_fields")
    };
    let (mut world, log) = world_with_player(config);

    world.player_mut(1).unwrap().vitals_mut().life = 0.0;
    world.tick(0.5);
    assert!(world.player(1).unwrap().is_dead());
    assert_eq!(count(&log, EventKind::Died), 1);

    ticks(&mut world, 20, 0.5);
    let player = world.player(1).unwrap();
    assert!(!player.is_dead());
    assert_relative_eq!(player.life(), 100.0);
    assert_eq!(player.location(), "village_square");
    assert_eq!(count(&log, EventKind::Respawned), 1);
}

#[test]
fn test_monsters_fight_within_one_location_only() {
    let (mut world, _log) = world_with_player(EngineConfig::default());
    let data = world.state().data.clone();
    let fields = world.location_mut("wheat_fields").unwrap();
    let first = fields.spawn("field_rat", &data).unwrap();
    let second = fields.spawn("field_rat", &data).unwrap();
    let far = world.location_mut("old_mill").unwrap().spawn("field_rat", &data).unwrap();

    let attacker = EntityRef::Monster { location: "wheat_fields".to_string(), key: first };
    let target = EntityRef::Monster { location: "wheat_fields".to_string(), key: second };
    let elsewhere = EntityRef::Monster { location: "old_mill".to_string(), key: far };

    assert_eq!(
        world.attack(&attacker, &elsewhere, DamageType::Physical, Some(10.0)),
        Err(AttackError::OutOfReach)
    );

    let result = world.attack(&attacker, &target, DamageType::Physical, Some(10.0)).unwrap();
    assert_relative_eq!(result.final_damage, 9.0);
    assert_relative_eq!(result.remaining_life, 21.0);
    assert_eq!(
        world.attack(&attacker, &target, DamageType::Physical, Some(10.0)),
        Err(AttackError::CoolingDown)
    );

    let fields = world.location("wheat_fields").unwrap();
    assert_eq!(fields.monster(first).unwrap().current_target(), Some(&target));
    assert_eq!(fields.monster(second).unwrap().combat().last_damage_cause, Some(attacker.clone()));
    assert_relative_eq!(world.location("old_mill").unwrap().monster(far).unwrap().life(), 30.0);

    let attacks = world.state().pending_events().filter(|e| e.kind() == EventKind::Attacked).count();
    assert_eq!(attacks, 1);
}
