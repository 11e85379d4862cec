//! Selector specificity calculation.
//!
//! Specificity packs three counts into one integer, most significant first:
//! identifiers, then style classes, then pseudo-class states. Comparing the
//! packed integer gives the cascade order.

use crate::{CompoundSelector, PseudoClassState, Selector, SimpleSelector};
use log::trace;

/// Packed `(ids << 8) | (classes << 4) | states`.
///
/// Fields saturate at their band maximum instead of spilling into the next band,
/// so adding ids, classes or states never lowers the value. Counts above a cap
/// are indistinguishable from the cap.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Specificity(u32);

impl Specificity {
    /// Shift of the identifier band.
    pub const ID_SHIFT: u32 = 8;
    /// Shift of the style-class band.
    pub const CLASS_SHIFT: u32 = 4;
    /// Largest representable identifier count.
    pub const MAX_IDS: u32 = u32::MAX >> Self::ID_SHIFT;
    /// Largest representable style-class count.
    pub const MAX_CLASSES: u32 = (1 << (Self::ID_SHIFT - Self::CLASS_SHIFT)) - 1;
    /// Largest representable state count.
    pub const MAX_STATES: u32 = (1 << Self::CLASS_SHIFT) - 1;

    /// Pack the three counts, saturating each field.
    pub fn from_counts(ids: usize, classes: usize, states: usize) -> Self {
        let ids = saturate(ids, Self::MAX_IDS, "id");
        let classes = saturate(classes, Self::MAX_CLASSES, "class");
        let states = saturate(states, Self::MAX_STATES, "state");
        Self((ids << Self::ID_SHIFT) | (classes << Self::CLASS_SHIFT) | states)
    }

    /// The packed integer.
    #[inline]
    pub const fn value(self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn id_count(self) -> u32 {
        self.0 >> Self::ID_SHIFT
    }

    #[inline]
    pub const fn class_count(self) -> u32 {
        (self.0 >> Self::CLASS_SHIFT) & Self::MAX_CLASSES
    }

    #[inline]
    pub const fn state_count(self) -> u32 {
        self.0 & Self::MAX_STATES
    }
}

/// Clamp `count` to `max`.
fn saturate(count: usize, max: u32, field: &str) -> u32 {
    match u32::try_from(count) {
        Ok(value) if value <= max => value,
        _ => {
            trace!(target: "css_selectors", "specificity {field} count {count} saturated at {max}");
            max
        }
    }
}

/// Identifier and style-class counts of a selector.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct SelectorCounts {
    pub ids: usize,
    pub classes: usize,
}

impl SelectorCounts {
    /// Field-wise saturating sum.
    #[must_use]
    pub const fn saturating_add(self, other: Self) -> Self {
        Self {
            ids: self.ids.saturating_add(other.ids),
            classes: self.classes.saturating_add(other.classes),
        }
    }
}

/// One id if the selector carries one, plus the size of its class set.
pub fn counts_of_simple(simple: &SimpleSelector) -> SelectorCounts {
    SelectorCounts {
        ids: usize::from(simple.id().is_some()),
        classes: simple.style_classes().len(),
    }
}

/// Sum of the member counts across the chain.
pub fn counts_of_compound(compound: &CompoundSelector) -> SelectorCounts {
    compound
        .selectors()
        .map(counts_of_simple)
        .fold(SelectorCounts::default(), SelectorCounts::saturating_add)
}

pub fn counts_of(selector: &Selector) -> SelectorCounts {
    match selector {
        Selector::Simple(simple) => counts_of_simple(simple),
        Selector::Compound(compound) => counts_of_compound(compound),
    }
}

/// Size of `states`, plus one if `selector` is a simple selector with an
/// orientation constraint. Chains never receive the orientation unit.
pub fn effective_state_count(selector: &Selector, states: &PseudoClassState) -> usize {
    let orientation_weight = match selector {
        Selector::Simple(simple) => usize::from(simple.orientation().is_constrained()),
        Selector::Compound(_) => 0,
    };
    states.len() + orientation_weight
}

/// The specificity a [`crate::Match`] of `selector` caches, without interning.
pub fn specificity_of(selector: &Selector) -> Specificity {
    let counts = counts_of(selector);
    let states = match selector {
        Selector::Simple(simple) => effective_state_count(selector, simple.pseudo_classes()),
        Selector::Compound(compound) => {
            let mut union = PseudoClassState::new();
            for simple in compound.selectors() {
                union.add_all(simple.pseudo_classes());
            }
            effective_state_count(selector, &union)
        }
    };
    Specificity::from_counts(counts.ids, counts.classes, states)
}
