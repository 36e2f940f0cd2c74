//! Stat points and their conversion into modifiers

use serde::{Deserialize, Serialize};

use super::model::AttributeModel;
use super::modifier::{Modifier, ModifierOp, SourceTag};
use super::record::Attribute;

/// A player-allocated point pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatType {
    /// Physical offense
    Strength,
    /// Precision
    Dexterity,
    /// Magical offense and mentality
    Intelligence,
    /// Life and toughness
    Vitality,
    /// Speed
    Agility,
}

impl StatType {
    /// Every stat type
    pub const ALL: [Self; 5] = [
        Self::Strength,
        Self::Dexterity,
        Self::Intelligence,
        Self::Vitality,
        Self::Agility,
    ];

    /// Lowercase key used in source tags and commands
    pub const fn key(self) -> &'static str {
        match self {
            Self::Strength => "strength",
            Self::Dexterity => "dexterity",
            Self::Intelligence => "intelligence",
            Self::Vitality => "vitality",
            Self::Agility => "agility",
        }
    }

    /// Parse a stat key
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|stat| stat.key() == key)
    }

    /// Per-point conversion entries for this stat
    const fn conversions(self) -> &'static [Conversion] {
        match self {
            Self::Strength => STRENGTH,
            Self::Dexterity => DEXTERITY,
            Self::Intelligence => INTELLIGENCE,
            Self::Vitality => VITALITY,
            Self::Agility => AGILITY,
        }
    }
}

const STRENGTH: &[Conversion] = &[Conversion::add(Attribute::AttackPower, 2.0)];
const DEXTERITY: &[Conversion] = &[
    Conversion::add(Attribute::ArmorPenetration, 0.5),
    Conversion::add(Attribute::CritChance, 0.005),
];
const INTELLIGENCE: &[Conversion] = &[
    Conversion::add(Attribute::MagicPower, 2.0),
    Conversion::add(Attribute::MagicPenetration, 0.25),
    Conversion::add(Attribute::MaxMentality, 5.0),
];
const VITALITY: &[Conversion] = &[
    Conversion::add(Attribute::MaxLife, 10.0),
    Conversion::add(Attribute::Defense, 0.5),
    Conversion::add(Attribute::MagicDefense, 0.5),
];
const AGILITY: &[Conversion] = &[
    Conversion::multiply(Attribute::AttackSpeed, 0.02),
    Conversion::add(Attribute::Speed, 0.1),
];

struct Conversion {
    attribute: Attribute,
    op: ModifierOp,
    per_point: f32,
}

impl Conversion {
    const fn add(attribute: Attribute, per_point: f32) -> Self {
        Self { attribute, op: ModifierOp::Add, per_point }
    }

    const fn multiply(attribute: Attribute, per_point: f32) -> Self {
        Self { attribute, op: ModifierOp::Multiply, per_point }
    }

    /// Additions scale linearly; multiplications become `1 + per_point * points`
    fn scaled(&self, points: u32, source: SourceTag) -> Modifier {
        let points = points as f32;
        let value = match self.op {
            ModifierOp::Add => self.per_point * points,
            ModifierOp::Multiply => 1.0 + self.per_point * points,
        };
        Modifier { attribute: self.attribute, op: self.op, value, source }
    }
}

/// Points allocated to each stat
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StatRecord {
    /// Strength points
    pub strength: u32,
    /// Dexterity points
    pub dexterity: u32,
    /// Intelligence points
    pub intelligence: u32,
    /// Vitality points
    pub vitality: u32,
    /// Agility points
    pub agility: u32,
}

impl StatRecord {
    /// Points in one stat
    pub const fn get(&self, stat: StatType) -> u32 {
        match stat {
            StatType::Strength => self.strength,
            StatType::Dexterity => self.dexterity,
            StatType::Intelligence => self.intelligence,
            StatType::Vitality => self.vitality,
            StatType::Agility => self.agility,
        }
    }

    /// Overwrite points in one stat
    pub fn set(&mut self, stat: StatType, points: u32) {
        let slot = match stat {
            StatType::Strength => &mut self.strength,
            StatType::Dexterity => &mut self.dexterity,
            StatType::Intelligence => &mut self.intelligence,
            StatType::Vitality => &mut self.vitality,
            StatType::Agility => &mut self.agility,
        };
        *slot = points;
    }

    /// Total allocated points
    pub fn total(&self) -> u32 {
        StatType::ALL.iter().map(|stat| self.get(*stat)).sum()
    }
}

/// Replace every stat-derived modifier with fresh ones for the current allocation
///
/// All `stat:*` groups are removed before anything is re-added, so calling this
/// repeatedly never stacks modifiers.
pub fn apply_stats(stats: &StatRecord, model: &mut AttributeModel) {
    for stat in StatType::ALL {
        model.remove_by_source(&SourceTag::stat(stat));
    }

    for stat in StatType::ALL {
        let points = stats.get(stat);
        if points == 0 {
            continue;
        }
        let source = SourceTag::stat(stat);
        model.add_modifiers(
            stat.conversions()
                .iter()
                .map(|conversion| conversion.scaled(points, source.clone())),
        );
    }
}
