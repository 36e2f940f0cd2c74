//! Player sessions and the save queue
//!
//! Saves are never performed inside the tick. Snapshots are queued here and
//! flushed by the caller between ticks with [`World::flush_saves`].
//!
//! A snapshot the store rejects is not retried, but its changes are put back
//! on the player so the next snapshot carries them. For a player who has
//! logged out meanwhile, the snapshot is kept and used on their next login.

use log::{info, warn};

use crate::entity::{Combatant, Player, UserId};
use crate::services::persistence::{run_save_cycle, PersistenceError, PersistenceStore, PlayerRecord, SaveReport};

use super::World;

/// Login and logout failures
#[derive(thiserror::Error, Debug)]
pub enum SessionError {
    /// The player is already logged in
    #[error("player {0} is already active")]
    AlreadyActive(UserId),

    /// The player is not logged in
    #[error("player {0} is not active")]
    NotActive(UserId),

    /// The store failed to load the player
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

impl World {
    /// Load (or create) a player and make them active
    pub fn login<S>(&mut self, user: UserId, name: &str, store: &S) -> Result<&Player, SessionError>
    where
        S: PersistenceStore + ?Sized,
    {
        if self.state().players.contains_key(&user) {
            return Err(SessionError::AlreadyActive(user));
        }

        let start = self.start_location().to_string();
        let mut record = if let Some(record) = self.state_mut().unsaved.remove(&user) {
            info!("Player {} resumes from a snapshot that was never saved", user);
            record
        } else if let Some(record) = store.load(user)? {
            record
        } else {
            info!("Creating player {} ({}) at {}", user, name, start);
            store.create(user, name, &start)
        };
        if self.location(&record.profile.location).is_none() {
            warn!(
                "Player {} was stored in unknown location '{}', moving to {}",
                user, record.profile.location, start
            );
            record.profile.location = start;
        }

        let player = Player::from_record(record);
        info!("{} logged in at {}", player.name(), player.location());
        let players = &mut self.state_mut().players;
        Ok(players.entry(user).or_insert(player))
    }

    /// Deactivate a player, queueing a final save
    pub fn logout(&mut self, user: UserId) -> Result<(), SessionError> {
        let state = self.state_mut();
        let player = state.players.remove(&user).ok_or(SessionError::NotActive(user))?;
        info!("{} logged out", player.name());
        state.save_queue.push(player.to_record());
        Ok(())
    }

    /// Queue a snapshot of one active player
    pub fn queue_save(&mut self, user: UserId) -> Result<(), SessionError> {
        let state = self.state_mut();
        let player = state.players.get_mut(&user).ok_or(SessionError::NotActive(user))?;
        state.save_queue.push(player.to_record());
        player.mark_saved();
        Ok(())
    }

    /// Queue snapshots of every active player with unsaved changes
    pub fn queue_all_saves(&mut self) -> usize {
        let state = self.state_mut();
        let mut queued = 0;
        for player in state.players.values_mut() {
            if player.dirty().is_empty() {
                continue;
            }
            state.save_queue.push(player.to_record());
            player.mark_saved();
            queued += 1;
        }
        queued
    }

    /// Hand over every queued snapshot
    pub fn take_save_queue(&mut self) -> Vec<PlayerRecord> {
        std::mem::take(&mut self.state_mut().save_queue)
    }

    /// Save every queued snapshot to `store`, keeping the changes of failed ones
    pub fn flush_saves<S>(&mut self, store: &mut S) -> SaveReport
    where
        S: PersistenceStore + ?Sized,
    {
        let mut report = run_save_cycle(store, self.take_save_queue());
        self.restore_unsaved(std::mem::take(&mut report.unsaved));
        report
    }

    /// Put the changes of snapshots the store rejected back in place
    pub fn restore_unsaved(&mut self, failed: Vec<PlayerRecord>) {
        let state = self.state_mut();
        for mut record in failed {
            let user = record.user_id;
            if let Some(player) = state.players.get_mut(&user) {
                player.restore_unsaved(&record);
                continue;
            }
            warn!("Keeping unsaved snapshot of player {} until their next login", user);
            if let Some(older) = state.unsaved.remove(&user) {
                record.absorb(&older);
            }
            state.unsaved.insert(user, record);
        }
    }

    /// Players who logged out with changes the store never accepted
    pub fn unsaved_players(&self) -> impl Iterator<Item = UserId> + '_ {
        self.state().unsaved.keys().copied()
    }

    /// Log out everyone, queueing their final saves
    pub fn logout_all(&mut self) -> usize {
        let users: Vec<UserId> = self.state().players.keys().copied().collect();
        users.into_iter().filter(|user| self.logout(*user).is_ok()).count()
    }

    fn start_location(&self) -> &str {
        let state = self.state();
        state
            .config
            .start_location
            .as_deref()
            .unwrap_or_else(|| state.data.first_location())
    }
}
