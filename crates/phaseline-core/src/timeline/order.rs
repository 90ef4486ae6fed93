//! The phase category axis shared by every subplot of a chart.

use std::collections::BTreeSet;

use serde::Serialize;

/// Distinct phase names in lexicographic order.
///
/// Computed once per run and passed by reference to every subplot, so each
/// project reserves the same row for the same phase even when it skips some
/// phases entirely.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct PhaseCategoryOrder {
    phases: Vec<String>,
}

impl PhaseCategoryOrder {
    /// Collect and sort the distinct phase names from `phases`.
    pub fn from_phases<'a, I>(phases: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let unique: BTreeSet<&str> = phases.into_iter().collect();
        Self {
            phases: unique.into_iter().map(str::to_owned).collect(),
        }
    }

    /// Row index of `phase`, or `None` if the phase is not on the axis.
    pub fn position(&self, phase: &str) -> Option<usize> {
        self.phases
            .binary_search_by(|p| p.as_str().cmp(phase))
            .ok()
    }

    pub fn len(&self) -> usize {
        self.phases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.phases.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.phases.iter().map(String::as_str)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.phases
    }
}

impl<'a> IntoIterator for &'a PhaseCategoryOrder {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.phases.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sorts_and_deduplicates() {
        let order = PhaseCategoryOrder::from_phases(["Closure", "Build", "Closure", "Design"]);
        assert_eq!(order.as_slice(), ["Build", "Closure", "Design"]);
    }

    #[test]
    fn position_follows_sorted_order() {
        let order = PhaseCategoryOrder::from_phases(["C", "A", "B"]);
        assert_eq!(order.position("A"), Some(0));
        assert_eq!(order.position("C"), Some(2));
        assert_eq!(order.position("D"), None);
    }

    #[test]
    fn lexicographic_is_byte_order() {
        // Uppercase sorts before lowercase, no locale folding.
        let order = PhaseCategoryOrder::from_phases(["alpha", "Beta"]);
        assert_eq!(order.as_slice(), ["Beta", "alpha"]);
    }

    #[test]
    fn empty_order() {
        let order = PhaseCategoryOrder::from_phases(std::iter::empty());
        assert!(order.is_empty());
        assert_eq!(order.len(), 0);
    }
}
