//! Tagged attribute modifiers

use std::fmt;

use serde::{Deserialize, Serialize};

use super::equipment::SlotType;
use super::record::Attribute;
use super::stats::StatType;

/// How a modifier combines with the attribute it targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModifierOp {
    /// Summed onto the base value
    Add,
    /// Multiplied in after every addition has been applied
    Multiply,
}

/// Origin of a group of modifiers
///
/// Modifiers are only ever removed as a whole group, by tag.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SourceTag(String);

impl SourceTag {
    /// Arbitrary tag
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    /// `stat:<type>`
    pub fn stat(stat: StatType) -> Self {
        Self(format!("stat:{}", stat.key()))
    }

    /// `equip:<slot>:<index>`
    pub fn equip(slot: SlotType, index: u8) -> Self {
        Self(format!("equip:{}:{index}", slot.key()))
    }

    /// `buff:<item>:<sequence>`
    pub fn buff(item: &str, sequence: u64) -> Self {
        Self(format!("buff:{item}:{sequence}"))
    }

    /// Raw tag text
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SourceTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A tagged, additive or multiplicative adjustment to one attribute
#[derive(Debug, Clone, PartialEq)]
pub struct Modifier {
    /// Attribute being adjusted
    pub attribute: Attribute,
    /// Combination rule
    pub op: ModifierOp,
    /// Amount added, or factor multiplied
    pub value: f32,
    /// Group this modifier belongs to
    pub source: SourceTag,
}

impl Modifier {
    /// Additive modifier
    pub fn add(attribute: Attribute, value: f32, source: SourceTag) -> Self {
        Self { attribute, op: ModifierOp::Add, value, source }
    }

    /// Multiplicative modifier
    pub fn multiply(attribute: Attribute, factor: f32, source: SourceTag) -> Self {
        Self { attribute, op: ModifierOp::Multiply, value: factor, source }
    }
}

/// Untagged modifier as written in item definitions
///
/// Tagged with a concrete source when an item is equipped or used.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModifierTemplate {
    /// Attribute being adjusted
    pub attribute: Attribute,
    /// Combination rule
    pub op: ModifierOp,
    /// Amount added, or factor multiplied
    pub value: f32,
}

impl ModifierTemplate {
    /// Attach a source tag
    pub fn tagged(&self, source: SourceTag) -> Modifier {
        Modifier { attribute: self.attribute, op: self.op, value: self.value, source }
    }
}
