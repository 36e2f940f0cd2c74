//! Named attribute records

use serde::{Deserialize, Serialize};

/// A named numeric combat or movement statistic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Attribute {
    /// Life cap
    MaxLife,
    /// Mentality cap
    MaxMentality,
    /// Physical offense
    AttackPower,
    /// Magical offense
    MagicPower,
    /// Physical mitigation
    Defense,
    /// Magical mitigation
    MagicDefense,
    /// Ignores this much of a target's defense
    ArmorPenetration,
    /// Ignores this much of a target's magic defense
    MagicPenetration,
    /// Attacks per second
    AttackSpeed,
    /// Travel speed in distance units per second
    Speed,
    /// Probability of a critical hit in `[0, 1]`
    CritChance,
    /// Bonus damage fraction on critical hits
    CritDamage,
}

impl Attribute {
    /// Every attribute, in declaration order
    pub const ALL: [Self; 12] = [
        Self::MaxLife,
        Self::MaxMentality,
        Self::AttackPower,
        Self::MagicPower,
        Self::Defense,
        Self::MagicDefense,
        Self::ArmorPenetration,
        Self::MagicPenetration,
        Self::AttackSpeed,
        Self::Speed,
        Self::CritChance,
        Self::CritDamage,
    ];

    /// Short display name
    pub const fn name(self) -> &'static str {
        match self {
            Self::MaxLife => "max life",
            Self::MaxMentality => "max mentality",
            Self::AttackPower => "attack power",
            Self::MagicPower => "magic power",
            Self::Defense => "defense",
            Self::MagicDefense => "magic defense",
            Self::ArmorPenetration => "armor penetration",
            Self::MagicPenetration => "magic penetration",
            Self::AttackSpeed => "attack speed",
            Self::Speed => "speed",
            Self::CritChance => "crit chance",
            Self::CritDamage => "crit damage",
        }
    }
}

/// Fixed set of attribute values
///
/// Used both as the base record an entity starts from and as the computed
/// record produced by the modifier pipeline. Missing fields in data files
/// default to zero.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AttributeRecord {
    /// Life cap
    pub max_life: f32,
    /// Mentality cap
    pub max_mentality: f32,
    /// Physical offense
    pub attack_power: f32,
    /// Magical offense
    pub magic_power: f32,
    /// Physical mitigation
    pub defense: f32,
    /// Magical mitigation
    pub magic_defense: f32,
    /// Physical penetration
    pub armor_penetration: f32,
    /// Magical penetration
    pub magic_penetration: f32,
    /// Attacks per second
    pub attack_speed: f32,
    /// Travel speed
    pub speed: f32,
    /// Critical hit probability
    pub crit_chance: f32,
    /// Critical bonus fraction
    pub crit_damage: f32,
}

impl AttributeRecord {
    /// Starting attributes for a freshly created player
    pub fn player_defaults() -> Self {
        Self {
            max_life: 100.0,
            max_mentality: 50.0,
            attack_power: 10.0,
            magic_power: 5.0,
            defense: 2.0,
            magic_defense: 2.0,
            attack_speed: 1.0,
            speed: 5.0,
            crit_chance: 0.05,
            crit_damage: 0.5,
            ..Self::default()
        }
    }

    /// Read one attribute
    pub const fn get(&self, attribute: Attribute) -> f32 {
        match attribute {
            Attribute::MaxLife => self.max_life,
            Attribute::MaxMentality => self.max_mentality,
            Attribute::AttackPower => self.attack_power,
            Attribute::MagicPower => self.magic_power,
            Attribute::Defense => self.defense,
            Attribute::MagicDefense => self.magic_defense,
            Attribute::ArmorPenetration => self.armor_penetration,
            Attribute::MagicPenetration => self.magic_penetration,
            Attribute::AttackSpeed => self.attack_speed,
            Attribute::Speed => self.speed,
            Attribute::CritChance => self.crit_chance,
            Attribute::CritDamage => self.crit_damage,
        }
    }

    /// Mutable access to one attribute
    pub fn get_mut(&mut self, attribute: Attribute) -> &mut f32 {
        match attribute {
            Attribute::MaxLife => &mut self.max_life,
            Attribute::MaxMentality => &mut self.max_mentality,
            Attribute::AttackPower => &mut self.attack_power,
            Attribute::MagicPower => &mut self.magic_power,
            Attribute::Defense => &mut self.defense,
            Attribute::MagicDefense => &mut self.magic_defense,
            Attribute::ArmorPenetration => &mut self.armor_penetration,
            Attribute::MagicPenetration => &mut self.magic_penetration,
            Attribute::AttackSpeed => &mut self.attack_speed,
            Attribute::Speed => &mut self.speed,
            Attribute::CritChance => &mut self.crit_chance,
            Attribute::CritDamage => &mut self.crit_damage,
        }
    }

    /// Overwrite one attribute
    pub fn set(&mut self, attribute: Attribute, value: f32) {
        *self.get_mut(attribute) = value;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_set_cover_every_field() {
        let mut record = AttributeRecord::default();
        for (i, attribute) in Attribute::ALL.iter().enumerate() {
            record.set(*attribute, i as f32 + 1.0);
        }
        for (i, attribute) in Attribute::ALL.iter().enumerate() {
            assert_eq!(record.get(*attribute), i as f32 + 1.0, "{}", attribute.name());
        }
    }

    #[test]
    fn test_partial_ron_defaults_to_zero() {
        let record: AttributeRecord = ron::from_str("(max_life: 40.0, defense: 3.0)").unwrap();
        assert_eq!(record.max_life, 40.0);
        assert_eq!(record.defense, 3.0);
        assert_eq!(record.attack_power, 0.0);
    }
}
