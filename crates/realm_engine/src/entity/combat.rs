//! Damage types and results

use crate::attributes::Attribute;

use super::EntityRef;

/// How a hit is mitigated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DamageType {
    /// Mitigated by defense, reduced by armor penetration
    Physical,
    /// Mitigated by magic defense, reduced by magic penetration
    Magic,
    /// Never mitigated
    Absolute,
}

impl DamageType {
    /// Attacker attribute supplying raw damage
    pub const fn offense(self) -> Attribute {
        match self {
            Self::Physical | Self::Absolute => Attribute::AttackPower,
            Self::Magic => Attribute::MagicPower,
        }
    }

    /// Target defense and attacker penetration attributes, if mitigated
    pub const fn mitigation(self) -> Option<(Attribute, Attribute)> {
        match self {
            Self::Physical => Some((Attribute::Defense, Attribute::ArmorPenetration)),
            Self::Magic => Some((Attribute::MagicDefense, Attribute::MagicPenetration)),
            Self::Absolute => None,
        }
    }
}

/// One incoming hit
#[derive(Debug, Clone, PartialEq)]
pub struct Hit {
    /// Raw damage before mitigation
    pub amount: f32,
    /// Damage type
    pub kind: DamageType,
    /// Defense ignored, supplied by the attacker
    pub penetration: f32,
    /// Who dealt it
    pub cause: Option<EntityRef>,
    /// Whether the raw amount includes a critical bonus
    pub critical: bool,
}

impl Hit {
    /// Hit with no penetration and no cause
    pub const fn new(amount: f32, kind: DamageType) -> Self {
        Self {
            amount,
            kind,
            penetration: 0.0,
            cause: None,
            critical: false,
        }
    }

    /// Set penetration
    pub const fn with_penetration(mut self, penetration: f32) -> Self {
        self.penetration = penetration;
        self
    }

    /// Set the cause
    pub fn with_cause(mut self, cause: EntityRef) -> Self {
        self.cause = Some(cause);
        self
    }

    /// Flag as critical
    pub const fn critical(mut self, critical: bool) -> Self {
        self.critical = critical;
        self
    }
}

/// Outcome of a hit
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DamageResult {
    /// Damage type
    pub kind: DamageType,
    /// Raw damage before mitigation
    pub raw_amount: f32,
    /// Damage actually subtracted from life
    pub final_damage: f32,
    /// Target life after the hit (may be negative until the late phase)
    pub remaining_life: f32,
    /// Whether the hit was critical
    pub critical: bool,
}
