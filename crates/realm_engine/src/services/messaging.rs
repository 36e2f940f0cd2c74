//! Messaging collaborator
//!
//! Delivery is fire-and-forget: a messenger must never block the tick.

use std::rc::Rc;
use std::sync::mpsc::Sender;

use log::{info, trace};

use crate::entity::{EntityRef, UserId};
use crate::events::{Event, EventHandler, SimEvent};

/// Outbound player notifications
pub trait Messenger {
    /// Send a message to one player
    fn notify(&self, user: UserId, message: &str);

    /// Send a message to several players
    fn broadcast(&self, users: &[UserId], message: &str) {
        for user in users {
            self.notify(*user, message);
        }
    }
}

/// Messenger that writes every notification to the log
#[derive(Debug, Default, Clone, Copy)]
pub struct LogMessenger;

impl Messenger for LogMessenger {
    fn notify(&self, user: UserId, message: &str) {
        info!("[to {}] {}", user, message);
    }
}

/// Messenger that forwards notifications over a channel
///
/// A closed receiver drops messages silently.
#[derive(Debug, Clone)]
pub struct ChannelMessenger {
    sender: Sender<(UserId, String)>,
}

impl ChannelMessenger {
    /// Forward into `sender`
    pub const fn new(sender: Sender<(UserId, String)>) -> Self {
        Self { sender }
    }
}

impl Messenger for ChannelMessenger {
    fn notify(&self, user: UserId, message: &str) {
        if self.sender.send((user, message.to_string())).is_err() {
            trace!("Dropped message for {}: receiver closed", user);
        }
    }
}

/// Event handler turning simulation events into player notifications
pub struct NotificationHandler {
    messenger: Rc<dyn Messenger>,
}

impl NotificationHandler {
    /// Notify through `messenger`
    pub fn new(messenger: Rc<dyn Messenger>) -> Self {
        Self { messenger }
    }

    fn tell(&self, entity: &EntityRef, message: &str) {
        if let Some(user) = entity.user_id() {
            self.messenger.notify(user, message);
        }
    }
}

impl EventHandler for NotificationHandler {
    fn on_event(&mut self, event: &Event) -> bool {
        match &event.payload {
            SimEvent::Attacked { attacker, attacker_name, target, target_name, result } => {
                let crit = if result.critical { " Critical hit!" } else { "" };
                self.tell(
                    attacker,
                    &format!("You hit {} for {:.1} damage.{}", target_name, result.final_damage, crit),
                );
                self.tell(
                    target,
                    &format!(
                        "{} hits you for {:.1} damage ({:.1} life left).{}",
                        attacker_name, result.final_damage, result.remaining_life.max(0.0), crit
                    ),
                );
            }
            SimEvent::Died { entity, .. } => self.tell(entity, "You have died."),
            SimEvent::Respawned { entity, location, .. } => {
                self.tell(entity, &format!("You wake up in {location}."));
            }
            SimEvent::TravelStarted { user, to, duration, .. } => {
                self.messenger.notify(*user, &format!("You set off toward {to} ({duration:.1}s)."));
            }
            SimEvent::TravelProgress { user, to, remaining } => {
                self.messenger.notify(*user, &format!("{to} is {remaining:.1}s away."));
            }
            SimEvent::TravelArrived { user, location } => {
                self.messenger.notify(*user, &format!("You arrive at {location}."));
            }
            SimEvent::TravelAborted { user, to } => {
                self.messenger.notify(*user, &format!("Your journey to {to} ends here."));
            }
            SimEvent::ItemApplied { user, item, heal } => {
                self.messenger.notify(*user, &format!("The {item} takes effect (+{heal:.0} life)."));
            }
            SimEvent::BuffExpired { user, item } => {
                self.messenger.notify(*user, &format!("The {item} wears off."));
            }
            SimEvent::ExpGained { user, amount } => {
                self.messenger.notify(*user, &format!("You gain {amount} experience."));
            }
            SimEvent::LevelUp { user, level } => {
                self.messenger.notify(*user, &format!("You reached level {level}!"));
            }
            SimEvent::MonsterSpawned { .. } | SimEvent::LootDropped { .. } => {}
        }
        false
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::sync::mpsc;

    /// Messenger keeping every notification for inspection
    #[derive(Debug, Default)]
    pub(crate) struct RecordingMessenger {
        pub(crate) sent: RefCell<Vec<(UserId, String)>>,
    }

    impl RecordingMessenger {
        pub(crate) fn messages_for(&self, user: UserId) -> Vec<String> {
            self.sent
                .borrow()
                .iter()
                .filter(|(u, _)| *u == user)
                .map(|(_, m)| m.clone())
                .collect()
        }
    }

    impl Messenger for RecordingMessenger {
        fn notify(&self, user: UserId, message: &str) {
            self.sent.borrow_mut().push((user, message.to_string()));
        }
    }

    #[test]
    fn test_broadcast_reaches_each_user() {
        let messenger = RecordingMessenger::default();
        messenger.broadcast(&[1, 2, 3], "hello");
        assert_eq!(messenger.sent.borrow().len(), 3);
        assert_eq!(messenger.messages_for(2), vec!["hello".to_string()]);
    }

    #[test]
    fn test_channel_messenger_survives_closed_receiver() {
        let (tx, rx) = mpsc::channel();
        let messenger = ChannelMessenger::new(tx);
        messenger.notify(1, "first");
        assert_eq!(rx.recv().unwrap(), (1, "first".to_string()));

        drop(rx);
        messenger.notify(1, "second");
    }

    #[test]
    fn test_handler_notifies_players_only() {
        let messenger = Rc::new(RecordingMessenger::default());
        let mut handler = NotificationHandler::new(messenger.clone());
        let event = Event {
            payload: SimEvent::LevelUp { user: 4, level: 3 },
            timestamp: 0.0,
        };
        assert!(!handler.on_event(&event));
        assert_eq!(messenger.messages_for(4), vec!["You reached level 3!".to_string()]);
    }
}
