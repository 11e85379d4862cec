//! The strength of a successful selector match.

use crate::cache::{PseudoClassSetsCache, StateSetInterner};
use crate::specificity::{
    SelectorCounts, Specificity, counts_of_compound, counts_of_simple, effective_state_count,
};
use crate::{CompoundSelector, PseudoClassState, Selector, SimpleSelector};
use core::cmp::Ordering;
use std::sync::Arc;

/// Immutable record of a selector that matched a node.
///
/// Bundles the selector, the pseudo classes it matched with, and its
/// specificity, computed once here and cached. Matches order by specificity
/// alone: `==` means "ranks equally", and ties are left to the cascade (source
/// order, origin, layer).
#[derive(Clone, Debug)]
pub struct Match<'sel> {
    selector: &'sel Selector,
    /// Canonical, shared through the interner.
    pseudo_classes: Arc<PseudoClassState>,
    id_count: usize,
    class_count: usize,
    specificity: Specificity,
}

impl<'sel> Match<'sel> {
    /// Derive the match for a selector already known to apply, interning its
    /// state set in the process-wide cache.
    pub fn of(selector: &'sel Selector) -> Self {
        Self::of_with(selector, PseudoClassSetsCache::global())
    }

    /// Like [`Self::of`], canonicalizing through `interner`.
    pub fn of_with<I>(selector: &'sel Selector, interner: &I) -> Self
    where
        I: StateSetInterner + ?Sized,
    {
        match selector {
            Selector::Simple(simple) => Self::of_simple(selector, simple, interner),
            Selector::Compound(compound) => Self::of_compound(selector, compound, interner),
        }
    }

    fn of_simple<I>(selector: &'sel Selector, simple: &SimpleSelector, interner: &I) -> Self
    where
        I: StateSetInterner + ?Sized,
    {
        Self::new(
            selector,
            simple.pseudo_classes(),
            counts_of_simple(simple),
            interner,
        )
    }

    /// Counts are summed across the chain; states are unioned.
    fn of_compound<I>(selector: &'sel Selector, compound: &CompoundSelector, interner: &I) -> Self
    where
        I: StateSetInterner + ?Sized,
    {
        let mut pseudo_classes = PseudoClassState::new();
        for simple in compound.selectors() {
            pseudo_classes.add_all(simple.pseudo_classes());
        }
        Self::new(
            selector,
            &pseudo_classes,
            counts_of_compound(compound),
            interner,
        )
    }

    fn new<I>(
        selector: &'sel Selector,
        pseudo_classes: &PseudoClassState,
        counts: SelectorCounts,
        interner: &I,
    ) -> Self
    where
        I: StateSetInterner + ?Sized,
    {
        let state_count = effective_state_count(selector, pseudo_classes);
        Self {
            selector,
            pseudo_classes: interner.canonicalize(pseudo_classes),
            id_count: counts.ids,
            class_count: counts.classes,
            specificity: Specificity::from_counts(counts.ids, counts.classes, state_count),
        }
    }

    #[inline]
    pub const fn selector(&self) -> &'sel Selector {
        self.selector
    }

    /// The canonical pseudo-class set; shared with every match of an equal set.
    #[inline]
    pub const fn pseudo_classes(&self) -> &Arc<PseudoClassState> {
        &self.pseudo_classes
    }

    #[inline]
    pub const fn specificity(&self) -> Specificity {
        self.specificity
    }

    #[inline]
    pub const fn id_count(&self) -> usize {
        self.id_count
    }

    #[inline]
    pub const fn class_count(&self) -> usize {
        self.class_count
    }

    /// Order by specificity; `Greater` means `self` wins over `other`.
    #[inline]
    pub fn compare(&self, other: &Self) -> Ordering {
        self.specificity.cmp(&other.specificity)
    }
}

impl PartialEq for Match<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.specificity == other.specificity
    }
}

impl Eq for Match<'_> {}

impl PartialOrd for Match<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Match<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.compare(other)
    }
}

/// Sort ascending by specificity, keeping insertion order among ties.
/// The last element wins unless the cascade breaks the tie.
pub fn sort_matches(matches: &mut [Match<'_>]) {
    matches.sort_by(Match::compare);
}

#[cfg(test)]
#[allow(clippy::panic, reason = "Test setup failures abort the test")]
mod tests {
    use super::*;
    use crate::{Combinator, NodeOrientation, PseudoClass};
    use core::{iter, ptr};

    fn pseudo(name: &str) -> PseudoClass {
        PseudoClass::new(name).unwrap_or_else(|err| panic!("{err}"))
    }

    #[test]
    fn simple_match_counts() {
        let selector = Selector::from(
            SimpleSelector::new()
                .with_type("Button")
                .with_id("ok")
                .with_class("primary")
                .with_class("large")
                .with_pseudo_class(pseudo("hover")),
        );
        let cache = PseudoClassSetsCache::new();
        let matched = Match::of_with(&selector, &cache);
        assert_eq!(matched.id_count(), 1);
        assert_eq!(matched.class_count(), 2);
        assert_eq!(matched.pseudo_classes().len(), 1);
        assert_eq!(matched.specificity(), Specificity::from_counts(1, 2, 1));
        assert!(ptr::eq(matched.selector(), &selector));
    }

    #[test]
    fn compound_match_unions_overlapping_states() {
        let hover = pseudo("hover");
        let focus = pseudo("focus");
        let selector = Selector::from(
            CompoundSelector::new(SimpleSelector::new().with_pseudo_class(hover))
                .then(
                    Combinator::Descendant,
                    SimpleSelector::new()
                        .with_pseudo_class(hover)
                        .with_pseudo_class(focus),
                )
                .then(
                    Combinator::Child,
                    SimpleSelector::new().with_pseudo_class(focus),
                ),
        );
        let matched = Match::of_with(&selector, &PseudoClassSetsCache::new());
        let expected: PseudoClassState = [hover, focus].into_iter().collect();
        assert_eq!(**matched.pseudo_classes(), expected);
        assert_eq!(matched.specificity().state_count(), 2);
    }

    #[test]
    fn orientation_is_ignored_inside_chains() {
        let rtl = SimpleSelector::new().with_orientation(NodeOrientation::RightToLeft);
        let simple = Selector::from(rtl.clone());
        let chain = Selector::from(CompoundSelector::new(rtl));
        let cache = PseudoClassSetsCache::new();
        assert_eq!(Match::of_with(&simple, &cache).specificity().state_count(), 1);
        assert_eq!(Match::of_with(&chain, &cache).specificity().state_count(), 0);
    }

    #[test]
    fn equal_state_sets_share_the_handle() {
        let hover = pseudo("hover");
        let selected = pseudo("selected");
        let left = Selector::from(
            SimpleSelector::new()
                .with_pseudo_class(hover)
                .with_pseudo_class(selected),
        );
        let right = Selector::from(
            CompoundSelector::new(SimpleSelector::new().with_pseudo_class(selected))
                .then(Combinator::Child, SimpleSelector::new().with_pseudo_class(hover)),
        );
        let cache = PseudoClassSetsCache::new();
        let first = Match::of_with(&left, &cache);
        let second = Match::of_with(&right, &cache);
        assert!(Arc::ptr_eq(first.pseudo_classes(), second.pseudo_classes()));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn sorting_is_stable_for_ties() {
        let selectors: Vec<Selector> = ["one", "two", "three"]
            .into_iter()
            .map(|class| Selector::from(SimpleSelector::new().with_class(class)))
            .chain(iter::once(Selector::from(
                SimpleSelector::new().with_id("winner"),
            )))
            .collect();
        let cache = PseudoClassSetsCache::new();
        let mut matches: Vec<Match<'_>> = selectors
            .iter()
            .rev()
            .map(|selector| Match::of_with(selector, &cache))
            .collect();
        sort_matches(&mut matches);

        let rendered: Vec<String> = matches
            .iter()
            .map(|matched| matched.selector().to_string())
            .collect();
        assert_eq!(rendered, [".three", ".two", ".one", "#winner"]);
    }

    #[test]
    fn matches_are_thread_safe() {
        const fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Match<'static>>();
    }
}
