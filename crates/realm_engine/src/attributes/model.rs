//! Cached attribute model

use std::cell::OnceCell;

use super::modifier::{Modifier, ModifierOp, SourceTag};
use super::record::{Attribute, AttributeRecord};

/// Base record plus modifiers, with a lazily recomputed result
///
/// Every mutation (`set_base`, `add_modifier`, a `remove_by_source` that
/// removes something) drops the cached record; the next read recomputes it.
#[derive(Debug, Clone, Default)]
pub struct AttributeModel {
    base: AttributeRecord,
    modifiers: Vec<Modifier>,
    computed: OnceCell<AttributeRecord>,
}

impl AttributeModel {
    /// Create a model with no modifiers
    pub fn new(base: AttributeRecord) -> Self {
        Self {
            base,
            modifiers: Vec::new(),
            computed: OnceCell::new(),
        }
    }

    /// Base value of one attribute
    pub fn base(&self, attribute: Attribute) -> f32 {
        self.base.get(attribute)
    }

    /// Whole base record
    pub fn base_record(&self) -> &AttributeRecord {
        &self.base
    }

    /// Overwrite one base value
    pub fn set_base(&mut self, attribute: Attribute, value: f32) {
        self.base.set(attribute, value);
        self.invalidate();
    }

    /// Append one modifier
    pub fn add_modifier(&mut self, modifier: Modifier) {
        self.modifiers.push(modifier);
        self.invalidate();
    }

    /// Append several modifiers
    pub fn add_modifiers(&mut self, modifiers: impl IntoIterator<Item = Modifier>) {
        let before = self.modifiers.len();
        self.modifiers.extend(modifiers);
        if self.modifiers.len() != before {
            self.invalidate();
        }
    }

    /// Remove every modifier tagged with `source`, returning how many were removed
    pub fn remove_by_source(&mut self, source: &SourceTag) -> usize {
        let before = self.modifiers.len();
        self.modifiers.retain(|m| &m.source != source);
        let removed = before - self.modifiers.len();
        if removed > 0 {
            self.invalidate();
        }
        removed
    }

    /// Whether any modifier carries `source`
    pub fn has_source(&self, source: &SourceTag) -> bool {
        self.modifiers.iter().any(|m| &m.source == source)
    }

    /// Current modifiers in insertion order
    pub fn modifiers(&self) -> &[Modifier] {
        &self.modifiers
    }

    /// Computed value of one attribute
    pub fn get(&self, attribute: Attribute) -> f32 {
        self.computed().get(attribute)
    }

    /// Computed record, recomputed first if stale
    pub fn computed(&self) -> &AttributeRecord {
        self.computed
            .get_or_init(|| compute(&self.base, &self.modifiers))
    }

    /// Whether a computed record is currently cached
    pub fn is_cached(&self) -> bool {
        self.computed.get().is_some()
    }

    fn invalidate(&mut self) {
        self.computed.take();
    }
}

/// Apply every addition, then every multiplication
fn compute(base: &AttributeRecord, modifiers: &[Modifier]) -> AttributeRecord {
    let mut out = *base;
    for modifier in modifiers.iter().filter(|m| m.op == ModifierOp::Add) {
        *out.get_mut(modifier.attribute) += modifier.value;
    }
    for modifier in modifiers.iter().filter(|m| m.op == ModifierOp::Multiply) {
        *out.get_mut(modifier.attribute) *= modifier.value;
    }
    out
}
