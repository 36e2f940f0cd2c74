//! Collaborator contracts the simulation talks to
//!
//! Persistence and messaging live outside the tick loop. The world only
//! queues work for them and never waits on either.

pub mod messaging;
pub mod persistence;

pub use messaging::{ChannelMessenger, LogMessenger, Messenger, NotificationHandler};
pub use persistence::{
    run_save_cycle, Dirty, MemoryStore, PersistenceError, PersistenceStore, PlayerRecord, RonFileStore, SaveReport,
};
