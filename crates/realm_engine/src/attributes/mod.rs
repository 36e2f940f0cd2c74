//! Attribute pipeline
//!
//! Turns a base [`AttributeRecord`] plus a bag of tagged [`Modifier`]s into a
//! cached computed record. Stats and equipment are layers on top that own
//! their own source tags.

pub mod record;
pub mod modifier;
pub mod model;
pub mod stats;
pub mod equipment;

pub use record::{Attribute, AttributeRecord};
pub use modifier::{Modifier, ModifierOp, ModifierTemplate, SourceTag};
pub use model::AttributeModel;
pub use stats::{apply_stats, StatRecord, StatType};
pub use equipment::{EquipError, Equipment, EquipmentEntry, ItemInstance, PersistState, SlotType};
