//! Timed item effects

use log::debug;

use crate::attributes::SourceTag;
use crate::coroutine::{Coroutine, CoroutineError, Instruction, Step};
use crate::data::{ItemDef, UseEffect};
use crate::entity::{Combatant, UserId};
use crate::events::SimEvent;

use super::WorldState;

/// Rejected item uses
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ItemUseError {
    /// The player is not logged in
    #[error("player {0} is not active")]
    NotActive(UserId),

    /// Dead players cannot use items
    #[error("dead players cannot use items")]
    Dead,

    /// No item with that id
    #[error("unknown item '{0}'")]
    UnknownItem(String),

    /// The item has no use effect
    #[error("{0} cannot be used")]
    NotUsable(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Used,
    Delayed,
    Buffed,
    Expired,
}

/// Item effect coroutine
///
/// Waits the effect's delay, heals and applies the buff modifiers under
/// `buff:<item>:<sequence>`, waits the buff duration, then removes the group.
pub struct ItemUse {
    name: String,
    user: UserId,
    item: String,
    effect: UseEffect,
    source: SourceTag,
    stage: Stage,
}

impl ItemUse {
    /// Effect of `def` used by `user`; `sequence` keeps repeated uses apart
    pub fn new(user: UserId, def: &ItemDef, effect: UseEffect, sequence: u64) -> Self {
        Self {
            name: format!("use:{}:{}", def.id, sequence),
            user,
            item: def.id.clone(),
            effect,
            source: SourceTag::buff(&def.id, sequence),
            stage: Stage::Used,
        }
    }

    fn land(&mut self, world: &mut WorldState) -> Step {
        let Some(player) = world.players.get_mut(&self.user) else {
            debug!("Effect of {} dropped, player {} left", self.item, self.user);
            return Step::Complete;
        };
        if player.is_dead() {
            debug!("Effect of {} dropped, {} is dead", self.item, player.name());
            return Step::Complete;
        }

        let max_life = player.max_life();
        let vitals = player.vitals_mut();
        vitals.life = (vitals.life + self.effect.heal).min(max_life);

        let source = self.source.clone();
        player
            .attributes_mut()
            .add_modifiers(self.effect.buffs.iter().map(|b| b.tagged(source.clone())));

        world.events.send(SimEvent::ItemApplied {
            user: self.user,
            item: self.item.clone(),
            heal: self.effect.heal,
        });

        if self.effect.buffs.is_empty() {
            self.stage = Stage::Expired;
            return Step::Complete;
        }
        self.stage = Stage::Buffed;
        Step::Yield(Instruction::Wait(self.effect.duration))
    }

    fn expire(&mut self, world: &mut WorldState) -> Step {
        self.stage = Stage::Expired;
        if let Some(player) = world.players.get_mut(&self.user) {
            player.attributes_mut().remove_by_source(&self.source);
            world.events.send(SimEvent::BuffExpired { user: self.user, item: self.item.clone() });
        }
        Step::Complete
    }
}

impl Coroutine<WorldState> for ItemUse {
    fn name(&self) -> &str {
        &self.name
    }

    fn resume(&mut self, world: &mut WorldState) -> Result<Step, CoroutineError> {
        match self.stage {
            Stage::Used if self.effect.delay > 0.0 => {
                self.stage = Stage::Delayed;
                Ok(Step::Yield(Instruction::Wait(self.effect.delay)))
            }
            Stage::Used | Stage::Delayed => Ok(self.land(world)),
            Stage::Buffed => Ok(self.expire(world)),
            Stage::Expired => Err(CoroutineError::Failed(format!("{} resumed after expiring", self.name))),
        }
    }
}
