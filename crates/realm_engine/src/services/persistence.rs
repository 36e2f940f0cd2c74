//! Player persistence contract and stores
//!
//! The world hands out [`PlayerRecord`] snapshots tagged with the sub-records
//! that changed. A store merges only those parts into what it already holds,
//! then compacts equipment entries tagged as removed.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use log::{debug, error};
use serde::{Deserialize, Serialize};

use crate::attributes::{AttributeRecord, EquipmentEntry, PersistState, StatRecord};
use crate::entity::{UserId, Vitals};

bitflags::bitflags! {
    /// Sub-records of a player that changed since the last save
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Dirty: u8 {
        /// Name, level, experience, unspent points, location
        const PROFILE = 1 << 0;
        /// Life, mentality, hunger, thirst
        const VITALS = 1 << 1;
        /// Base attributes and stat allocation
        const STATS = 1 << 2;
        /// Equipment entries
        const EQUIPMENT = 1 << 3;
    }
}

/// Progression and placement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    /// Display name
    pub name: String,
    /// Level
    pub level: u32,
    /// Experience toward the next level
    pub exp: u64,
    /// Stat points not yet allocated
    pub unspent_points: u32,
    /// Current location id
    pub location: String,
}

/// Stored form of a player
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerRecord {
    /// Account id
    pub user_id: UserId,
    /// Progression and placement
    pub profile: Profile,
    /// Current vitals
    pub vitals: Vitals,
    /// Base attributes before any modifier
    pub base: AttributeRecord,
    /// Stat allocation
    pub stats: StatRecord,
    /// Equipment entries with their persistence tags
    #[serde(default)]
    pub equipment: Vec<EquipmentEntry>,
    /// Sub-records changed since the last save
    #[serde(skip)]
    pub dirty: Dirty,
}

impl PlayerRecord {
    /// Level 1 player with default attributes, entirely dirty
    pub fn fresh(user_id: UserId, name: impl Into<String>, location: impl Into<String>) -> Self {
        let base = AttributeRecord::player_defaults();
        Self {
            user_id,
            profile: Profile {
                name: name.into(),
                level: 1,
                exp: 0,
                unspent_points: 0,
                location: location.into(),
            },
            vitals: Vitals::full(base.max_life, base.max_mentality),
            base,
            stats: StatRecord::default(),
            equipment: Vec::new(),
            dirty: Dirty::all(),
        }
    }

    /// Merge the dirty parts of `incoming` into this stored copy
    pub fn merge(&mut self, incoming: &Self) {
        if incoming.dirty.contains(Dirty::PROFILE) {
            self.profile = incoming.profile.clone();
        }
        if incoming.dirty.contains(Dirty::VITALS) {
            self.vitals = incoming.vitals;
        }
        if incoming.dirty.contains(Dirty::STATS) {
            self.base = incoming.base;
            self.stats = incoming.stats;
        }
        if incoming.dirty.contains(Dirty::EQUIPMENT) {
            for entry in &incoming.equipment {
                let existing = self
                    .equipment
                    .iter()
                    .position(|e| e.slot == entry.slot && e.index == entry.index);
                match (entry.state, existing) {
                    (PersistState::Removed, Some(pos)) => {
                        self.equipment.remove(pos);
                    }
                    (PersistState::Removed, None) => {}
                    (_, Some(pos)) => self.equipment[pos] = entry.clone(),
                    (_, None) => self.equipment.push(entry.clone()),
                }
            }
        }
        self.compact();
    }

    /// Carry the unsaved changes of an older snapshot of the same player
    ///
    /// Dirty bits are combined and removed equipment entries the newer
    /// snapshot no longer mentions are kept, so the store still deletes them.
    pub fn absorb(&mut self, older: &Self) {
        self.dirty |= older.dirty;
        if !older.dirty.contains(Dirty::EQUIPMENT) {
            return;
        }
        for entry in older.equipment.iter().filter(|e| e.state == PersistState::Removed) {
            if !self.equipment.iter().any(|e| e.slot == entry.slot && e.index == entry.index) {
                self.equipment.push(entry.clone());
            }
        }
    }

    fn compact(&mut self) {
        self.equipment.retain(|e| e.state != PersistState::Removed);
        for entry in &mut self.equipment {
            entry.state = PersistState::Unchanged;
        }
        self.dirty = Dirty::empty();
    }
}

/// Persistence failures
#[derive(thiserror::Error, Debug)]
pub enum PersistenceError {
    /// Filesystem failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Record could not be written
    #[error("failed to encode player {user}: {message}")]
    Encode {
        /// Player
        user: UserId,
        /// Encoder message
        message: String,
    },

    /// Stored record could not be read back
    #[error("failed to decode player {user}: {message}")]
    Decode {
        /// Player
        user: UserId,
        /// Decoder message
        message: String,
    },

    /// No record exists for the player
    #[error("no record for player {0}")]
    Missing(UserId),

    /// The store refused the write
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Load/save contract for player records
pub trait PersistenceStore {
    /// Stored record, or `None` for an unknown player
    fn load(&self, user: UserId) -> Result<Option<PlayerRecord>, PersistenceError>;

    /// Fresh record for a new player; nothing is written until it is saved
    fn create(&self, user: UserId, name: &str, location: &str) -> PlayerRecord {
        PlayerRecord::fresh(user, name, location)
    }

    /// Write the dirty parts of `record`
    fn save(&mut self, record: &PlayerRecord) -> Result<(), PersistenceError>;

    /// Stored record, treating an unknown player as an error
    fn load_existing(&self, user: UserId) -> Result<PlayerRecord, PersistenceError> {
        self.load(user)?.ok_or(PersistenceError::Missing(user))
    }
}

/// In-process store
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: HashMap<UserId, PlayerRecord>,
    unavailable: bool,
}

impl MemoryStore {
    /// Empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent save fail
    pub fn set_unavailable(&mut self, unavailable: bool) {
        self.unavailable = unavailable;
    }

    /// Number of stored players
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether nothing is stored
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl PersistenceStore for MemoryStore {
    fn load(&self, user: UserId) -> Result<Option<PlayerRecord>, PersistenceError> {
        Ok(self.records.get(&user).cloned())
    }

    fn save(&mut self, record: &PlayerRecord) -> Result<(), PersistenceError> {
        if self.unavailable {
            return Err(PersistenceError::Unavailable("memory store disabled".to_string()));
        }
        self.records
            .entry(record.user_id)
            .or_insert_with(|| PlayerRecord { equipment: Vec::new(), ..record.clone() })
            .merge(record);
        Ok(())
    }
}

/// One RON file per player under a directory
#[derive(Debug, Clone)]
pub struct RonFileStore {
    dir: PathBuf,
}

impl RonFileStore {
    /// Use `dir`, creating it if needed
    pub fn new(dir: impl AsRef<Path>) -> Result<Self, PersistenceError> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    /// File holding `user`'s record
    pub fn path_for(&self, user: UserId) -> PathBuf {
        self.dir.join(format!("{user}.ron"))
    }
}

impl PersistenceStore for RonFileStore {
    fn load(&self, user: UserId) -> Result<Option<PlayerRecord>, PersistenceError> {
        let path = self.path_for(user);
        if !path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(&path)?;
        let record = ron::from_str(&contents).map_err(|e| PersistenceError::Decode {
            user,
            message: e.to_string(),
        })?;
        Ok(Some(record))
    }

    fn save(&mut self, record: &PlayerRecord) -> Result<(), PersistenceError> {
        let mut stored = match self.load(record.user_id)? {
            Some(stored) => stored,
            None => PlayerRecord { equipment: Vec::new(), ..record.clone() },
        };
        stored.merge(record);

        let contents = ron::ser::to_string_pretty(&stored, ron::ser::PrettyConfig::default())
            .map_err(|e| PersistenceError::Encode {
                user: record.user_id,
                message: e.to_string(),
            })?;
        let path = self.path_for(record.user_id);
        let tmp = path.with_extension("ron.tmp");
        std::fs::write(&tmp, contents)?;
        std::fs::rename(&tmp, &path)?;
        Ok(())
    }
}

/// Outcome of one save cycle
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SaveReport {
    /// Records written
    pub saved: usize,
    /// Records that failed
    pub failed: usize,
    /// The failed snapshots, to be handed back to the world
    pub unsaved: Vec<PlayerRecord>,
}

/// Flush queued snapshots to `store`
///
/// Failures are logged and not retried. The failed snapshots are returned in
/// [`SaveReport::unsaved`] so their dirty state is not lost; see
/// [`World::flush_saves`](crate::world::World::flush_saves).
pub fn run_save_cycle<S: PersistenceStore + ?Sized>(store: &mut S, queue: Vec<PlayerRecord>) -> SaveReport {
    let mut report = SaveReport::default();
    for record in queue {
        match store.save(&record) {
            Ok(()) => {
                debug!("Saved player {} ({:?})", record.user_id, record.dirty);
                report.saved += 1;
            }
            Err(err) => {
                error!("Failed to save player {}: {}", record.user_id, err);
                report.failed += 1;
                report.unsaved.push(record);
            }
        }
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributes::{ItemInstance, SlotType};

    fn entry(index: u8, state: PersistState) -> EquipmentEntry {
        EquipmentEntry {
            slot: SlotType::Accessory,
            index,
            item: ItemInstance {
                item_id: format!("ring{index}"),
                name: format!("ring {index}"),
                slot: Some(SlotType::Accessory),
                modifiers: Vec::new(),
            },
            state,
        }
    }

    #[test]
    fn test_merge_applies_only_dirty_parts() {
        let mut stored = PlayerRecord::fresh(1, "Ayla", "village_square");
        stored.compact();

        let mut incoming = stored.clone();
        incoming.profile.level = 5;
        incoming.vitals.life = 12.0;
        incoming.dirty = Dirty::VITALS;
        stored.merge(&incoming);

        assert_eq!(stored.profile.level, 1);
        assert!((stored.vitals.life - 12.0).abs() < f32::EPSILON);
        assert!(stored.dirty.is_empty());
    }

    #[test]
    fn test_merge_upserts_and_removes_equipment() {
        let mut stored = PlayerRecord::fresh(1, "Ayla", "village_square");
        stored.equipment = vec![entry(0, PersistState::Unchanged), entry(1, PersistState::Unchanged)];
        stored.compact();

        let mut incoming = stored.clone();
        incoming.equipment = vec![
            entry(0, PersistState::Removed),
            entry(1, PersistState::Unchanged),
            entry(2, PersistState::New),
        ];
        incoming.dirty = Dirty::EQUIPMENT;
        stored.merge(&incoming);

        let indices: Vec<u8> = stored.equipment.iter().map(|e| e.index).collect();
        assert_eq!(indices, vec![1, 2]);
        assert!(stored.equipment.iter().all(|e| e.state == PersistState::Unchanged));
    }

    #[test]
    fn test_absorb_keeps_older_removals() {
        let mut older = PlayerRecord::fresh(1, "Ayla", "village_square");
        older.equipment = vec![entry(0, PersistState::Removed), entry(1, PersistState::Removed)];
        older.dirty = Dirty::EQUIPMENT;

        let mut newer = older.clone();
        newer.equipment = vec![entry(1, PersistState::New)];
        newer.dirty = Dirty::PROFILE;
        newer.absorb(&older);

        assert_eq!(newer.dirty, Dirty::PROFILE | Dirty::EQUIPMENT);
        let tags: Vec<(u8, PersistState)> = newer.equipment.iter().map(|e| (e.index, e.state)).collect();
        assert_eq!(tags, vec![(1, PersistState::New), (0, PersistState::Removed)]);
    }

    #[test]
    fn test_memory_store_round_trip() {
        let mut store = MemoryStore::new();
        assert!(store.load(9).unwrap().is_none());
        assert!(matches!(store.load_existing(9), Err(PersistenceError::Missing(9))));

        let record = store.create(9, "Bram", "old_mill");
        store.save(&record).unwrap();
        let loaded = store.load_existing(9).unwrap();
        assert_eq!(loaded.profile.name, "Bram");
        assert_eq!(loaded.profile.location, "old_mill");
        assert!(loaded.dirty.is_empty());
    }

    #[test]
    fn test_save_cycle_logs_failures_without_retry() {
        let mut store = MemoryStore::new();
        let queue = vec![PlayerRecord::fresh(1, "a", "x"), PlayerRecord::fresh(2, "b", "x")];
        let report = run_save_cycle(&mut store, queue.clone());
        assert_eq!((report.saved, report.failed), (2, 0));
        assert!(report.unsaved.is_empty());

        store.set_unavailable(true);
        let report = run_save_cycle(&mut store, queue);
        assert_eq!((report.saved, report.failed), (0, 2));
        let users: Vec<UserId> = report.unsaved.iter().map(|r| r.user_id).collect();
        assert_eq!(users, vec![1, 2]);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_ron_file_store() {
        let dir = std::env::temp_dir().join(format!("realm_store_test_{}", std::process::id()));
        let mut store = RonFileStore::new(&dir).unwrap();

        let mut record = store.create(3, "Cass", "cellar");
        record.equipment.push(entry(0, PersistState::New));
        store.save(&record).unwrap();

        let loaded = store.load_existing(3).unwrap();
        assert_eq!(loaded.profile.name, "Cass");
        assert_eq!(loaded.equipment.len(), 1);
        assert_eq!(loaded.equipment[0].state, PersistState::Unchanged);

        std::fs::remove_dir_all(&dir).ok();
    }
}
