//! Attack resolution, monster targeting and kill rewards

use log::trace;
use rand::Rng;

use crate::entity::{kernel, Combatant, DamageResult, DamageType, EntityRef, Intent, MonsterKey, Player, UserId};
use crate::events::SimEvent;

use super::{World, WorldState};

/// Rejected attacks
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum AttackError {
    /// Attacker and target are the same entity
    #[error("an entity cannot attack itself")]
    SelfTarget,

    /// One of the parties does not exist
    #[error("{0} does not exist")]
    Unknown(EntityRef),

    /// The attacker is dead
    #[error("the attacker is dead")]
    AttackerDead,

    /// The target is dead
    #[error("the target is already dead")]
    TargetDead,

    /// The attacker's cooldown has not run out
    #[error("still recovering from the last attack")]
    CoolingDown,

    /// The parties are in different locations or one of them is travelling
    #[error("the target is out of reach")]
    OutOfReach,
}

struct Exchange {
    result: DamageResult,
    attacker_name: String,
    target_name: String,
}

/// Gate, roll and deliver one attack between two resolved entities
fn exchange<A, T>(
    attacker: &mut A,
    target: &mut T,
    kind: DamageType,
    amount: Option<f32>,
    rng: &mut impl Rng,
) -> Result<Exchange, AttackError>
where
    A: Combatant + ?Sized,
    T: Combatant + ?Sized,
{
    if attacker.is_dead() {
        return Err(AttackError::AttackerDead);
    }
    if target.is_dead() {
        return Err(AttackError::TargetDead);
    }
    if attacker.location() != target.location() || attacker.is_moving() || target.is_moving() {
        return Err(AttackError::OutOfReach);
    }
    if !kernel::can_attack(attacker) {
        return Err(AttackError::CoolingDown);
    }

    let mut hit = kernel::prepare_hit(attacker, kind, amount);
    if amount.is_none() {
        hit = kernel::apply_critical(attacker, hit, rng.gen::<f32>());
    }
    let result = kernel::strike(attacker, target, hit).ok_or(AttackError::CoolingDown)?;
    attacker.combat_mut().current_target = Some(target.entity_ref());

    Ok(Exchange {
        result,
        attacker_name: attacker.name().to_string(),
        target_name: target.name().to_string(),
    })
}

impl WorldState {
    /// Resolve an entity reference
    pub fn combatant(&self, entity: &EntityRef) -> Option<&dyn Combatant> {
        match entity {
            EntityRef::Player(user) => self.players.get(user).map(|p| p as &dyn Combatant),
            EntityRef::Monster { location, key } => self
                .locations
                .get(location)
                .and_then(|l| l.monster(*key))
                .map(|m| m as &dyn Combatant),
        }
    }

    /// Resolve an entity reference mutably
    pub fn combatant_mut(&mut self, entity: &EntityRef) -> Option<&mut dyn Combatant> {
        match entity {
            EntityRef::Player(user) => self.players.get_mut(user).map(|p| p as &mut dyn Combatant),
            EntityRef::Monster { location, key } => self
                .locations
                .get_mut(location)
                .and_then(|l| l.monster_mut(*key))
                .map(|m| m as &mut dyn Combatant),
        }
    }

    /// Attack between any two entities, see [`World::attack`]
    pub(crate) fn attack(
        &mut self,
        attacker: &EntityRef,
        target: &EntityRef,
        kind: DamageType,
        amount: Option<f32>,
    ) -> Result<DamageResult, AttackError> {
        if attacker == target {
            return Err(AttackError::SelfTarget);
        }
        let unknown = |entity: &EntityRef| AttackError::Unknown(entity.clone());
        let rng = &mut self.rng;

        let exchange = match (attacker, target) {
            (EntityRef::Player(a), EntityRef::Player(t)) => {
                let mut source = self.players.remove(a).ok_or_else(|| unknown(attacker))?;
                let outcome = match self.players.get_mut(t) {
                    Some(dest) => exchange(&mut source, dest, kind, amount, rng),
                    None => Err(unknown(target)),
                };
                self.players.insert(*a, source);
                outcome?
            }
            (EntityRef::Player(a), EntityRef::Monster { location, key }) => {
                let source = self.players.get_mut(a).ok_or_else(|| unknown(attacker))?;
                let dest = self
                    .locations
                    .get_mut(location)
                    .and_then(|l| l.monster_mut(*key))
                    .ok_or_else(|| unknown(target))?;
                exchange(source, dest, kind, amount, rng)?
            }
            (EntityRef::Monster { location, key }, EntityRef::Player(t)) => {
                let source = self
                    .locations
                    .get_mut(location)
                    .and_then(|l| l.monster_mut(*key))
                    .ok_or_else(|| unknown(attacker))?;
                let dest = self.players.get_mut(t).ok_or_else(|| unknown(target))?;
                exchange(source, dest, kind, amount, rng)?
            }
            (
                EntityRef::Monster { location, key },
                EntityRef::Monster { location: other, key: other_key },
            ) => {
                if location != other {
                    return Err(AttackError::OutOfReach);
                }
                let [source, dest] = self
                    .locations
                    .get_mut(location)
                    .and_then(|l| l.monster_pair_mut(*key, *other_key))
                    .ok_or_else(|| unknown(target))?;
                exchange(source, dest, kind, amount, rng)?
            }
        };

        trace!(
            "{} hit {} for {:.1} ({:?})",
            exchange.attacker_name,
            exchange.target_name,
            exchange.result.final_damage,
            kind
        );
        self.events.send(SimEvent::Attacked {
            attacker: attacker.clone(),
            attacker_name: exchange.attacker_name,
            target: target.clone(),
            target_name: exchange.target_name,
            result: exchange.result,
        });
        Ok(exchange.result)
    }

    /// Carry out an intent raised during the update phase
    pub(crate) fn resolve_intent(&mut self, actor: &EntityRef, intent: Intent) {
        match intent {
            Intent::SeekTarget => {
                let EntityRef::Monster { location, key } = actor else {
                    return;
                };
                let candidates: Vec<UserId> = self
                    .players
                    .values()
                    .filter(|p| p.location() == location && !p.is_dead() && !p.is_moving())
                    .map(Player::user_id)
                    .collect();
                if candidates.is_empty() {
                    return;
                }
                let pick = candidates[self.rng.gen_range(0..candidates.len())];
                if let Some(monster) = self.locations.get_mut(location).and_then(|l| l.monster_mut(*key)) {
                    trace!("{} targets player {}", monster.name(), pick);
                    monster.set_target(Some(EntityRef::Player(pick)));
                }
            }
            Intent::Attack { target, kind } => match self.attack(actor, &target, kind, None) {
                Ok(_) | Err(AttackError::CoolingDown) => {}
                Err(err) => {
                    trace!("{} drops target {}: {}", actor, target, err);
                    self.drop_target(actor, &target);
                }
            },
        }
    }

    fn drop_target(&mut self, actor: &EntityRef, target: &EntityRef) {
        if let Some(entity) = self.combatant_mut(actor) {
            let combat = entity.combat_mut();
            combat.current_target = None;
            if combat.last_damage_cause.as_ref() == Some(target) {
                combat.last_damage_cause = None;
            }
        }
    }

    /// Experience for a player killer and the dead monster's drop table
    pub(crate) fn reward_kill(&mut self, location: &str, key: MonsterKey, killer: Option<&EntityRef>) {
        let Some(monster) = self.locations.get(location).and_then(|l| l.monster(key)) else {
            return;
        };
        let exp = monster.exp_reward();
        let drops = monster.drops().to_vec();

        if let Some(EntityRef::Player(user)) = killer {
            if let Some(player) = self.players.get_mut(user) {
                if exp > 0 {
                    let gained = player.gain_exp(exp, &self.config);
                    self.events.send(SimEvent::ExpGained { user: *user, amount: exp });
                    let level = player.level();
                    for reached in (level + 1 - gained)..=level {
                        self.events.send(SimEvent::LevelUp { user: *user, level: reached });
                    }
                }
            }
        }

        for drop in drops {
            if self.rng.gen::<f32>() >= drop.chance {
                continue;
            }
            let (Some(def), Some(here)) = (self.data.item(&drop.item), self.locations.get_mut(location)) else {
                continue;
            };
            here.drop_item(def.instantiate());
            self.events.send(SimEvent::LootDropped {
                location: location.to_string(),
                item: drop.item.clone(),
            });
        }
    }
}

impl World {
    /// Attack `target` with `attacker`
    ///
    /// Both must exist, be alive, share a location and not be travelling, and
    /// the attacker's cooldown must have run out. Without an explicit `amount`
    /// the attacker's offense attribute is used and a critical hit is rolled.
    pub fn attack(
        &mut self,
        attacker: &EntityRef,
        target: &EntityRef,
        kind: DamageType,
        amount: Option<f32>,
    ) -> Result<DamageResult, AttackError> {
        self.state_mut().attack(attacker, target, kind, amount)
    }
}
