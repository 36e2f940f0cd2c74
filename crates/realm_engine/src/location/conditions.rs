//! Named predicates gating location connections

use std::collections::HashMap;

use log::warn;

use crate::entity::Combatant;

/// How a connection appears to an entity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Usable
    Visible,
    /// Listed but not usable
    Locked,
    /// Not listed
    Hidden,
}

type Predicate = Box<dyn Fn(&dyn Combatant) -> Access>;

/// Registry of named connection conditions
///
/// Besides registered names, two parameterised families are built in:
/// `min_level:<n>` locks the connection below level `n` and
/// `has_equipped:<item>` locks it unless the item is equipped.
/// Any other unregistered name hides the connection.
#[derive(Default)]
pub struct ConditionRegistry {
    predicates: HashMap<String, Predicate>,
}

impl ConditionRegistry {
    /// Registry with only the built-in families
    pub fn new() -> Self {
        Self::default()
    }

    /// Register or replace a named predicate
    pub fn register(&mut self, name: impl Into<String>, predicate: impl Fn(&dyn Combatant) -> Access + 'static) {
        self.predicates.insert(name.into(), Box::new(predicate));
    }

    /// Resolve `name` for `entity`
    pub fn evaluate(&self, name: &str, entity: &dyn Combatant) -> Access {
        if let Some(predicate) = self.predicates.get(name) {
            return predicate(entity);
        }

        if let Some(level) = name.strip_prefix("min_level:").and_then(|n| n.parse::<u32>().ok()) {
            return lock_unless(entity.level() >= level);
        }
        if let Some(item) = name.strip_prefix("has_equipped:") {
            return lock_unless(entity.equipment().iter().any(|e| e.item.item_id == item));
        }

        warn!("Unknown connection condition '{}', hiding connection", name);
        Access::Hidden
    }
}

const fn lock_unless(open: bool) -> Access {
    if open {
        Access::Visible
    } else {
        Access::Locked
    }
}
