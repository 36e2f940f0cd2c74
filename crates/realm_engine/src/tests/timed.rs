use std::rc::Rc;

use approx::assert_relative_eq;

use super::{count, ticks, world_with_player};
use crate::attributes::{Attribute, SlotType, SourceTag, StatType};
use crate::core::config::EngineConfig;
use crate::entity::Combatant;
use crate::events::EventKind;
use crate::location::TravelError;
use crate::services::messaging::tests::RecordingMessenger;
use crate::world::ItemUseError;

fn attack_power(world: &crate::world::World) -> f32 {
    world.player(1).unwrap().attributes().get(Attribute::AttackPower)
}

#[test]
fn test_stats_equipment_and_buff_stack() {
    let (mut world, log) = world_with_player(EngineConfig::default());
    let config = world.config().clone();
    world.player_mut(1).unwrap().gain_exp(300, &config);
    world.allocate_stat(1, StatType::Strength, 5).unwrap();
    let sword = world.state().data().item("iron_sword").unwrap().instantiate();
    world.equip(1, SlotType::Weapon, &sword, None).unwrap();
    assert_relative_eq!(attack_power(&world), 25.0);

    world.use_item(1, "herb_tonic").unwrap();
    ticks(&mut world, 3, 0.5);
    assert_relative_eq!(attack_power(&world), 25.0);
    world.tick(0.5);
    assert_relative_eq!(attack_power(&world), 27.5);
    assert!(world.player(1).unwrap().attributes().has_source(&SourceTag::buff("herb_tonic", 0)));
    assert_eq!(count(&log, EventKind::ItemApplied), 1);

    ticks(&mut world, 59, 0.5);
    assert_relative_eq!(attack_power(&world), 27.5);
    world.tick(0.5);
    assert_relative_eq!(attack_power(&world), 25.0);
    assert_eq!(count(&log, EventKind::BuffExpired), 1);
    assert_eq!(world.coroutine_count(), 0);
}

#[test]
fn test_item_use_rejections() {
    let (mut world, _log) = world_with_player(EngineConfig::default());
    assert_eq!(world.use_item(9, "herb_tonic"), Err(ItemUseError::NotActive(9)));
    assert_eq!(world.use_item(1, "moon_rock"), Err(ItemUseError::UnknownItem("moon_rock".to_string())));
    assert_eq!(world.use_item(1, "rat_tail"), Err(ItemUseError::NotUsable("rat tail".to_string())));
}

#[test]
fn test_travel_takes_simulated_time() {
    let (mut world, log) = world_with_player(EngineConfig::default());

    let duration = world.travel(1, "wheat_fields").unwrap();
    assert_relative_eq!(duration, 10.0);
    assert_eq!(world.travel(1, "old_mill"), Err(TravelError::AlreadyMoving));

    ticks(&mut world, 19, 0.5);
    let player = world.player(1).unwrap();
    assert_eq!(player.location(), "village_square");
    assert!(player.is_moving());

    world.tick(0.5);
    let player = world.player(1).unwrap();
    assert_eq!(player.location(), "wheat_fields");
    assert!(!player.is_moving());
    assert_eq!(count(&log, EventKind::TravelProgress), 9);
    assert_eq!(count(&log, EventKind::TravelArrived), 1);

    assert_eq!(world.travel(1, "wolf_den"), Err(TravelError::Locked("wolf_den".to_string())));
}

#[test]
fn test_travel_rejections() {
    let (mut world, _log) = world_with_player(EngineConfig::default());
    assert_eq!(world.travel(4, "old_mill"), Err(TravelError::NotActive(4)));
    assert_eq!(
        world.travel(1, "nowhere"),
        Err(TravelError::UnknownLocation("nowhere".to_string()))
    );
    assert_eq!(
        world.travel(1, "cellar"),
        Err(TravelError::NoConnection { from: "village_square".to_string(), to: "cellar".to_string() })
    );
}

#[test]
fn test_death_aborts_travel() {
    let (mut world, log) = world_with_player(EngineConfig::default());
    world.travel(1, "wheat_fields").unwrap();
    world.tick(0.5);

    world.player_mut(1).unwrap().vitals_mut().life = 0.0;
    world.tick(0.5);

    let player = world.player(1).unwrap();
    assert!(player.is_dead());
    assert!(!player.is_moving());
    assert_eq!(player.location(), "village_square");
    assert_eq!(count(&log, EventKind::TravelAborted), 1);
    assert_eq!(world.coroutine_count(), 0);
}

#[test]
fn test_travel_notifies_the_traveler() {
    let messenger = Rc::new(RecordingMessenger::default());
    let (world, _log) = world_with_player(EngineConfig::default());
    let mut world = world.with_messenger(messenger.clone());

    world.travel(1, "old_mill").unwrap();
    ticks(&mut world, 20, 0.5);

    let messages = messenger.messages_for(1);
    assert!(messages[0].starts_with("You set off toward old_mill"));
    assert_eq!(messages.last().map(String::as_str), Some("You arrive at old_mill."));
}

#[test]
fn test_travel_progress_is_reported_at_least_every_second() {
    let config = EngineConfig { travel_progress_interval: 4.0, ..EngineConfig::default() };
    let (mut world, log) = world_with_player(config);

    world.travel(1, "wheat_fields").unwrap();
    ticks(&mut world, 20, 0.5);

    assert_eq!(world.player(1).unwrap().location(), "wheat_fields");
    assert_eq!(count(&log, EventKind::TravelProgress), 9);
}
