use thiserror::Error;

use crate::model::SectionId;

/// Distance above a section's top at which it already counts as reached.
pub const DEFAULT_ACTIVATION_MARGIN: f64 = 200.0;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ResolverError {
    #[error("activation margin must be finite and non-negative, got {provided}")]
    InvalidMargin { provided: f64 },
}

//
// ─── LAYOUT ────────────────────────────────────────────────────────────────────
//

/// Position of one section on the page, as reported by the viewport tracker.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SectionCandidate {
    pub section: SectionId,
    pub vertical_offset: f64,
    pub visible_height: f64,
}

impl SectionCandidate {
    #[must_use]
    pub fn new(section: SectionId, vertical_offset: f64, visible_height: f64) -> Self {
        Self {
            section,
            vertical_offset,
            visible_height,
        }
    }
}

/// Section positions kept in document order, one entry per section.
///
/// The tracker may report sections in any order and may repeat one after a
/// relayout; the latest report for a section wins.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SectionLayout {
    candidates: Vec<SectionCandidate>,
}

impl SectionLayout {
    #[must_use]
    pub fn new(candidates: impl IntoIterator<Item = SectionCandidate>) -> Self {
        let mut ordered: Vec<SectionCandidate> = Vec::with_capacity(SectionId::COUNT);
        for candidate in candidates {
            match ordered.iter_mut().find(|c| c.section == candidate.section) {
                Some(existing) => *existing = candidate,
                None => ordered.push(candidate),
            }
        }
        ordered.sort_by_key(|c| c.section.ordinal());
        Self {
            candidates: ordered,
        }
    }

    /// Evenly spaced layout, handy for tests and headless drivers.
    #[must_use]
    pub fn uniform(section_height: f64) -> Self {
        Self::new(SectionId::ALL.into_iter().enumerate().map(|(idx, id)| {
            #[allow(clippy::cast_precision_loss)]
            let offset = idx as f64 * section_height;
            SectionCandidate::new(id, offset, section_height)
        }))
    }

    #[must_use]
    pub fn candidates(&self) -> &[SectionCandidate] {
        &self.candidates
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }
}

//
// ─── RESOLVER ──────────────────────────────────────────────────────────────────
//

/// Decides which section is "current" for a scroll position.
///
/// A section is reached once `scroll >= offset - margin`; the furthest-down
/// reached section wins.
///
/// # Examples
///
/// ```
/// # use guide_core::model::SectionId;
/// # use guide_core::resolver::{ActiveSectionResolver, SectionCandidate, SectionLayout};
/// let layout = SectionLayout::new([
///     SectionCandidate::new(SectionId::Welcome, 0.0, 800.0),
///     SectionCandidate::new(SectionId::Classes, 800.0, 800.0),
///     SectionCandidate::new(SectionId::Objects, 1600.0, 800.0),
/// ]);
/// let resolver = ActiveSectionResolver::new();
/// assert_eq!(resolver.resolve(&layout, 850.0), Some(SectionId::Classes));
/// assert_eq!(resolver.resolve(&layout, 0.0), Some(SectionId::Welcome));
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActiveSectionResolver {
    margin: f64,
}

impl ActiveSectionResolver {
    #[must_use]
    pub fn new() -> Self {
        Self {
            margin: DEFAULT_ACTIVATION_MARGIN,
        }
    }

    /// Create a resolver with a custom activation margin.
    ///
    /// # Errors
    ///
    /// Returns `ResolverError::InvalidMargin` if the margin is negative or not finite.
    pub fn with_margin(margin: f64) -> Result<Self, ResolverError> {
        if !margin.is_finite() || margin < 0.0 {
            return Err(ResolverError::InvalidMargin { provided: margin });
        }
        Ok(Self { margin })
    }

    #[must_use]
    pub fn margin(&self) -> f64 {
        self.margin
    }

    /// Resolve the active section for `scroll_position`.
    ///
    /// Returns `None` when no section has been reached yet or the position is
    /// not a finite number.
    #[must_use]
    pub fn resolve(&self, layout: &SectionLayout, scroll_position: f64) -> Option<SectionId> {
        self.resolve_candidates(layout.candidates(), scroll_position)
    }

    /// Resolve against candidates already in document order.
    #[must_use]
    pub fn resolve_candidates(
        &self,
        candidates: &[SectionCandidate],
        scroll_position: f64,
    ) -> Option<SectionId> {
        if !scroll_position.is_finite() {
            return None;
        }
        candidates
            .iter()
            .rev()
            .find(|c| scroll_position >= c.vertical_offset - self.margin)
            .map(|c| c.section)
    }
}

impl Default for ActiveSectionResolver {
    fn default() -> Self {
        Self::new()
    }
}
