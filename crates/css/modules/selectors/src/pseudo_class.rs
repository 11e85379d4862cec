//! Pseudo-class identities and the state sets built from them.
//!
//! A pseudo class is a dynamic, non-structural condition (`:hover`, `:focused`,
//! `:disabled`) that may or may not hold for a node at a given moment. Names are
//! interned once per process and receive a dense index, which is their bit
//! position in a [`PseudoClassState`].

use anyhow::{Result, anyhow, bail};
use core::fmt;
use lasso::{Key as _, Spur, ThreadedRodeo};
use once_cell::sync::Lazy;
use smallvec::SmallVec;

/// Process-wide registry of pseudo-class names.
static PSEUDO_CLASS_NAMES: Lazy<ThreadedRodeo> = Lazy::new(ThreadedRodeo::new);

/// Bits per bitset word.
const WORD_BITS: usize = 64;

/// An interned pseudo-class name.
///
/// Two calls to [`PseudoClass::new`] with the same name return equal handles,
/// from any thread.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PseudoClass(Spur);

impl PseudoClass {
    /// Intern `name` and return its handle.
    ///
    /// # Errors
    /// Returns an error if `name` is empty or contains whitespace, or if the
    /// registry has run out of keys.
    pub fn new(name: &str) -> Result<Self> {
        if name.is_empty() {
            bail!("pseudo class name must not be empty");
        }
        if name.chars().any(char::is_whitespace) {
            bail!("pseudo class name `{name}` must not contain whitespace");
        }
        PSEUDO_CLASS_NAMES
            .try_get_or_intern(name)
            .map(Self)
            .map_err(|err| anyhow!("failed to intern pseudo class `{name}`: {err}"))
    }

    /// The name this pseudo class was interned from.
    pub fn name(self) -> &'static str {
        PSEUDO_CLASS_NAMES.resolve(&self.0)
    }

    /// Dense index, used as the bit position inside a [`PseudoClassState`].
    #[inline]
    pub fn index(self) -> usize {
        self.0.into_usize()
    }

    /// Recover a handle from its index, if a pseudo class with that index exists.
    pub fn from_index(index: usize) -> Option<Self> {
        let key = Spur::try_from_usize(index)?;
        PSEUDO_CLASS_NAMES.try_resolve(&key).map(|_| Self(key))
    }
}

impl fmt::Display for PseudoClass {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.name())
    }
}

/// Word index and bit mask for a pseudo-class index.
#[inline]
const fn locate(index: usize) -> (usize, u64) {
    (index / WORD_BITS, 1u64 << (index % WORD_BITS))
}

/// A deduplicated, order-irrelevant set of pseudo classes.
///
/// Stored as a bitset indexed by [`PseudoClass::index`]. The first 64 pseudo
/// classes fit inline without a heap allocation. Trailing zero words are always
/// trimmed, so the derived `PartialEq`/`Hash` are set equality.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct PseudoClassState {
    words: SmallVec<[u64; 1]>,
}

impl PseudoClassState {
    /// An empty set.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a set by interning every name.
    ///
    /// # Errors
    /// Returns the first name that fails [`PseudoClass::new`].
    pub fn from_names<I, S>(names: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        names
            .into_iter()
            .map(|name| PseudoClass::new(name.as_ref()))
            .collect()
    }

    /// Add a pseudo class. Returns `true` if it was not already present.
    pub fn insert(&mut self, pseudo_class: PseudoClass) -> bool {
        let (word, mask) = locate(pseudo_class.index());
        if self.words.len() <= word {
            self.words.resize(word + 1, 0);
        }
        self.words.get_mut(word).is_some_and(|bits| {
            let added = *bits & mask == 0;
            *bits |= mask;
            added
        })
    }

    /// Remove a pseudo class. Returns `true` if it was present.
    pub fn remove(&mut self, pseudo_class: PseudoClass) -> bool {
        let (word, mask) = locate(pseudo_class.index());
        let removed = self.words.get_mut(word).is_some_and(|bits| {
            let present = *bits & mask != 0;
            *bits &= !mask;
            present
        });
        self.trim();
        removed
    }

    #[inline]
    pub fn contains(&self, pseudo_class: PseudoClass) -> bool {
        let (word, mask) = locate(pseudo_class.index());
        self.words.get(word).is_some_and(|bits| bits & mask != 0)
    }

    /// Union `other` into `self`.
    pub fn add_all(&mut self, other: &Self) {
        if other.words.len() > self.words.len() {
            self.words.resize(other.words.len(), 0);
        }
        for (mine, theirs) in self.words.iter_mut().zip(other.words.iter()) {
            *mine |= *theirs;
        }
    }

    /// True if every pseudo class in `self` is also in `other`.
    pub fn is_subset_of(&self, other: &Self) -> bool {
        self.words.iter().enumerate().all(|(word, bits)| {
            let theirs = other.words.get(word).copied().unwrap_or_default();
            theirs & bits == *bits
        })
    }

    /// Number of pseudo classes in the set.
    pub fn len(&self) -> usize {
        self.words
            .iter()
            .map(|bits| bits.count_ones() as usize)
            .sum()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Iterate members in index order.
    pub fn iter(&self) -> impl Iterator<Item = PseudoClass> + '_ {
        self.words
            .iter()
            .enumerate()
            .flat_map(|(word, &bits)| {
                (0..WORD_BITS)
                    .filter(move |bit| bits & (1u64 << bit) != 0)
                    .map(move |bit| word * WORD_BITS + bit)
            })
            .filter_map(PseudoClass::from_index)
    }

    fn trim(&mut self) {
        while self.words.last() == Some(&0) {
            self.words.pop();
        }
    }
}

impl FromIterator<PseudoClass> for PseudoClassState {
    fn from_iter<I: IntoIterator<Item = PseudoClass>>(iter: I) -> Self {
        let mut state = Self::new();
        state.extend(iter);
        state
    }
}

impl Extend<PseudoClass> for PseudoClassState {
    fn extend<I: IntoIterator<Item = PseudoClass>>(&mut self, iter: I) {
        for pseudo_class in iter {
            self.insert(pseudo_class);
        }
    }
}

impl fmt::Display for PseudoClassState {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("[")?;
        for (position, pseudo_class) in self.iter().enumerate() {
            if position > 0 {
                formatter.write_str(", ")?;
            }
            formatter.write_str(pseudo_class.name())?;
        }
        formatter.write_str("]")
    }
}
