//! Interning of pseudo-class state sets.
//!
//! Many matches carry structurally identical state sets. Canonicalizing them means
//! one allocation per distinct set, and handle identity doubles as set equality.

use crate::PseudoClassState;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use log::debug;
use once_cell::sync::Lazy;
use std::sync::Arc;

/// Canonicalizes state sets into shared immutable handles.
///
/// Two calls with set-equal inputs must return the same `Arc`
/// (`Arc::ptr_eq` holds), whatever order the members were inserted in.
pub trait StateSetInterner {
    fn canonicalize(&self, states: &PseudoClassState) -> Arc<PseudoClassState>;
}

static GLOBAL_CACHE: Lazy<PseudoClassSetsCache> = Lazy::new(PseudoClassSetsCache::new);

/// Process-wide deduplicating cache of pseudo-class sets.
///
/// Lookups take a shard read lock; only a miss takes the write lock, and racing
/// inserts of the same set resolve to a single canonical handle.
#[derive(Debug, Default)]
pub struct PseudoClassSetsCache {
    sets: DashMap<Arc<PseudoClassState>, ()>,
}

impl PseudoClassSetsCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The cache used by [`crate::Match::of`].
    pub fn global() -> &'static Self {
        &GLOBAL_CACHE
    }

    /// Number of distinct canonical sets.
    pub fn len(&self) -> usize {
        self.sets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }

    /// Get statistics about set sharing.
    pub fn stats(&self) -> PseudoClassSetsCacheStats {
        PseudoClassSetsCacheStats {
            unique_sets: self.sets.len(),
        }
    }
}

impl StateSetInterner for PseudoClassSetsCache {
    fn canonicalize(&self, states: &PseudoClassState) -> Arc<PseudoClassState> {
        if let Some(existing) = self.sets.get(states) {
            return Arc::clone(existing.key());
        }
        match self.sets.entry(Arc::new(states.clone())) {
            Entry::Occupied(occupied) => Arc::clone(occupied.key()),
            Entry::Vacant(vacant) => {
                let inserted = vacant.insert(());
                debug!(target: "css_selectors", "interned pseudo class set {states}");
                Arc::clone(inserted.key())
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PseudoClassSetsCacheStats {
    pub unique_sets: usize,
}

#[cfg(test)]
#[allow(clippy::panic, reason = "Test setup failures abort the test")]
mod tests {
    use super::*;
    use crate::PseudoClass;
    use core::ptr;

    fn states(names: &[&str]) -> PseudoClassState {
        PseudoClassState::from_names(names).unwrap_or_else(|err| panic!("{err}"))
    }

    #[test]
    fn set_equal_inputs_share_one_handle() {
        let cache = PseudoClassSetsCache::new();
        let first = cache.canonicalize(&states(&["hover", "focused"]));
        let second = cache.canonicalize(&states(&["focused", "hover"]));
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.stats(), PseudoClassSetsCacheStats { unique_sets: 1 });
    }

    #[test]
    fn distinct_sets_get_distinct_handles() {
        let cache = PseudoClassSetsCache::new();
        assert!(cache.is_empty());
        let hover = cache.canonicalize(&states(&["hover"]));
        let empty = cache.canonicalize(&PseudoClassState::new());
        assert!(!Arc::ptr_eq(&hover, &empty));
        assert_eq!(cache.len(), 2);
        assert!(empty.is_empty());
    }

    #[test]
    fn canonical_handle_survives_later_changes_to_input() {
        let cache = PseudoClassSetsCache::new();
        let mut input = states(&["selected"]);
        let handle = cache.canonicalize(&input);
        if let Ok(armed) = PseudoClass::new("armed") {
            input.insert(armed);
        }
        assert_eq!(handle.len(), 1);
        assert!(!Arc::ptr_eq(&handle, &cache.canonicalize(&input)));
    }

    #[test]
    fn global_cache_is_shared() {
        let first = PseudoClassSetsCache::global().canonicalize(&states(&["global-probe"]));
        let second = PseudoClassSetsCache::global().canonicalize(&states(&["global-probe"]));
        assert!(Arc::ptr_eq(&first, &second));
        assert!(ptr::eq(
            PseudoClassSetsCache::global(),
            PseudoClassSetsCache::global()
        ));
    }
}
