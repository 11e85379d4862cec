//! Selector match strength and specificity.
//!
//! Given a selector that is already known to match a styleable node, this crate
//! derives a comparable [`Match`] whose [`Specificity`] decides which competing
//! rule wins in the cascade:
//! - [`Selector`]: a simple selector or a combinator chain of simple selectors
//! - [`PseudoClass`] / [`PseudoClassState`]: interned dynamic state conditions
//! - [`StateSetInterner`]: canonicalizes pseudo-class sets into shared handles
//! - [`Match`]: immutable per-match record with cached specificity
//!
//! Deciding *whether* a selector matches is left to the caller.

mod cache;
mod matching;
mod pseudo_class;
mod specificity;

use core::{fmt, iter};

// Re-export public API
pub use cache::{PseudoClassSetsCache, PseudoClassSetsCacheStats, StateSetInterner};
pub use matching::{Match, sort_matches};
pub use pseudo_class::{PseudoClass, PseudoClassState};
pub use specificity::{
    SelectorCounts, Specificity, counts_of, counts_of_compound, counts_of_simple,
    effective_state_count, specificity_of,
};

/// Directional constraint a simple selector may carry (`:dir(ltr)`/`:dir(rtl)`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum NodeOrientation {
    /// No constraint; the node inherits whatever orientation applies.
    #[default]
    Inherit,
    LeftToRight,
    RightToLeft,
}

impl NodeOrientation {
    /// True if this orientation constrains the match.
    #[inline]
    pub const fn is_constrained(self) -> bool {
        !matches!(self, Self::Inherit)
    }
}

/// A single structural matcher: optional type and id, class tokens,
/// pseudo-class conditions and an orientation constraint.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct SimpleSelector {
    /// Type name. Carried for display; it is never weighted.
    type_name: Option<String>,
    id: Option<String>,
    /// Deduplicated, in declaration order.
    style_classes: Vec<String>,
    pseudo_classes: PseudoClassState,
    orientation: NodeOrientation,
}

impl SimpleSelector {
    /// A selector with no conditions (`*`).
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_type(mut self, type_name: impl Into<String>) -> Self {
        self.type_name = Some(type_name.into());
        self
    }

    /// Set the identifier. An empty id is treated as absent.
    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        let id = id.into();
        self.id = (!id.is_empty()).then_some(id);
        self
    }

    /// Add a style class; repeated tokens are kept once.
    #[must_use]
    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        let class = class.into();
        if !self.style_classes.contains(&class) {
            self.style_classes.push(class);
        }
        self
    }

    #[must_use]
    pub fn with_pseudo_class(mut self, pseudo_class: PseudoClass) -> Self {
        self.pseudo_classes.insert(pseudo_class);
        self
    }

    #[must_use]
    pub fn with_pseudo_classes(mut self, pseudo_classes: &PseudoClassState) -> Self {
        self.pseudo_classes.add_all(pseudo_classes);
        self
    }

    #[must_use]
    pub fn with_orientation(mut self, orientation: NodeOrientation) -> Self {
        self.orientation = orientation;
        self
    }

    pub fn type_name(&self) -> Option<&str> {
        self.type_name.as_deref()
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn style_classes(&self) -> &[String] {
        &self.style_classes
    }

    pub const fn pseudo_classes(&self) -> &PseudoClassState {
        &self.pseudo_classes
    }

    pub const fn orientation(&self) -> NodeOrientation {
        self.orientation
    }
}

impl fmt::Display for SimpleSelector {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let is_universal = self.type_name.is_none()
            && self.id.is_none()
            && self.style_classes.is_empty()
            && self.pseudo_classes.is_empty()
            && !self.orientation.is_constrained();
        if is_universal {
            return formatter.write_str("*");
        }
        if let Some(type_name) = &self.type_name {
            formatter.write_str(type_name)?;
        }
        if let Some(id) = &self.id {
            write!(formatter, "#{id}")?;
        }
        for class in &self.style_classes {
            write!(formatter, ".{class}")?;
        }
        for pseudo_class in self.pseudo_classes.iter() {
            write!(formatter, ":{pseudo_class}")?;
        }
        match self.orientation {
            NodeOrientation::Inherit => Ok(()),
            NodeOrientation::LeftToRight => formatter.write_str(":dir(ltr)"),
            NodeOrientation::RightToLeft => formatter.write_str(":dir(rtl)"),
        }
    }
}

/// Combinators between simple selectors of a chain.
/// They only matter to the matcher, never to specificity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Combinator {
    Descendant,
    Child,
    AdjacentSibling,
    GeneralSibling,
}

impl fmt::Display for Combinator {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(match self {
            Self::Descendant => " ",
            Self::Child => " > ",
            Self::AdjacentSibling => " + ",
            Self::GeneralSibling => " ~ ",
        })
    }
}

/// A non-empty chain of simple selectors joined by combinators, left to right.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompoundSelector {
    first: SimpleSelector,
    rest: Vec<(Combinator, SimpleSelector)>,
}

impl CompoundSelector {
    /// Start a chain from its left-most selector.
    #[inline]
    pub fn new(first: SimpleSelector) -> Self {
        Self {
            first,
            rest: Vec::new(),
        }
    }

    /// Append `next`, related to the previous selector by `combinator`.
    #[must_use]
    pub fn then(mut self, combinator: Combinator, next: SimpleSelector) -> Self {
        self.rest.push((combinator, next));
        self
    }

    /// Members of the chain in order.
    pub fn selectors(&self) -> impl Iterator<Item = &SimpleSelector> + '_ {
        iter::once(&self.first).chain(self.rest.iter().map(|pair| &pair.1))
    }

    /// Combinators in order; one fewer than [`Self::len`].
    pub fn combinators(&self) -> impl Iterator<Item = Combinator> + '_ {
        self.rest.iter().map(|pair| pair.0)
    }

    /// Number of simple selectors, always at least one.
    #[inline]
    pub fn len(&self) -> usize {
        self.rest.len() + 1
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        false
    }
}

impl fmt::Display for CompoundSelector {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}", self.first)?;
        for (combinator, simple) in &self.rest {
            write!(formatter, "{combinator}{simple}")?;
        }
        Ok(())
    }
}

/// A matched selector: one simple selector or a combinator chain.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Selector {
    Simple(SimpleSelector),
    Compound(CompoundSelector),
}

impl From<SimpleSelector> for Selector {
    fn from(simple: SimpleSelector) -> Self {
        Self::Simple(simple)
    }
}

impl From<CompoundSelector> for Selector {
    fn from(compound: CompoundSelector) -> Self {
        Self::Compound(compound)
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Simple(simple) => fmt::Display::fmt(simple, formatter),
            Self::Compound(compound) => fmt::Display::fmt(compound, formatter),
        }
    }
}
