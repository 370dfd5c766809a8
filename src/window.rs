use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::ops::Range;

use crate::density::DensityIndex;
use crate::locus::{LocusKey, StrandKey};

/// Symmetric neighbourhood around a coordinate
///
/// Covers `[center - width/2, center + width/2)` with integer division, so an
/// odd width gives the same reach on both sides of the center.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    width: u32,
}

impl Window {
    pub fn new(width: u32) -> Self {
        Window { width }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn half_width(&self) -> i64 {
        (self.width / 2) as i64
    }

    /// Coordinates covered when centered on `center`
    pub fn bounds(&self, center: i64) -> Range<i64> {
        let half = self.half_width();
        center.saturating_sub(half)..center.saturating_add(half)
    }

    /// Sum of single-mapper support around `locus`
    pub fn sum(&self, index: &DensityIndex, locus: &LocusKey) -> f64 {
        index
            .range(locus.strand_key(), self.bounds(locus.coordinate))
            .map(|(_, value)| value)
            .sum()
    }

    /// Whether any coordinate of the window around `center` is in `coords`
    pub fn touches(&self, coords: &BTreeSet<i64>, center: i64) -> bool {
        coords.range(self.bounds(center)).next().is_some()
    }

    /// Entries of `coords` inside the window around `center`, ascending
    pub fn scan<'a, V>(
        &self,
        coords: &'a BTreeMap<i64, V>,
        center: i64,
    ) -> impl Iterator<Item = (&'a i64, &'a V)> {
        coords.range(self.bounds(center))
    }
}

/// Per-(chromosome, strand) set of occupied coordinates
#[derive(Debug, Default)]
pub struct LocusSet {
    strands: HashMap<StrandKey, BTreeSet<i64>>,
}

impl LocusSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, locus: LocusKey) {
        self.strands
            .entry(locus.strand_key())
            .or_default()
            .insert(locus.coordinate);
    }

    pub fn contains(&self, locus: &LocusKey) -> bool {
        self.strands
            .get(&locus.strand_key())
            .map(|coords| coords.contains(&locus.coordinate))
            .unwrap_or(false)
    }

    /// Whether any member lies within `window` of `locus`
    pub fn any_within(&self, locus: &LocusKey, window: &Window) -> bool {
        self.strands
            .get(&locus.strand_key())
            .map(|coords| window.touches(coords, locus.coordinate))
            .unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.strands.values().map(|coords| coords.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.strands.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locus::Strand;

    fn naive_sum(index: &DensityIndex, locus: &LocusKey, window: &Window) -> f64 {
        window
            .bounds(locus.coordinate)
            .map(|coord| index.query(&LocusKey::new(locus.chrom_id, locus.strand, coord)))
            .sum()
    }

    #[test]
    fn test_bounds_use_integer_half_width() {
        assert_eq!(Window::new(11).bounds(100), 95..105);
        assert_eq!(Window::new(10).bounds(100), 95..105);
        assert_eq!(Window::new(1).bounds(100), 100..100);
        assert_eq!(Window::new(5).bounds(0), -2..2);
    }

    #[test]
    fn test_bounds_saturate_at_extremes() {
        let window = Window::new(51);
        assert_eq!(window.bounds(i64::MAX - 3), (i64::MAX - 28)..i64::MAX);
        assert_eq!(window.bounds(i64::MIN + 3), i64::MIN..(i64::MIN + 28));

        let mut index = DensityIndex::new();
        index.add(LocusKey::new(0, Strand::Forward, i64::MAX - 1), 2.0);
        assert_eq!(window.sum(&index, &LocusKey::new(0, Strand::Forward, i64::MAX - 3)), 2.0);
    }

    #[test]
    fn test_sum_matches_per_coordinate_queries() {
        let mut index = DensityIndex::new();
        for (coord, value) in [(90, 1.5), (95, 2.0), (100, 0.25), (104, 3.0), (105, 8.0)] {
            index.add(LocusKey::new(0, Strand::Forward, coord), value);
        }
        index.add(LocusKey::new(0, Strand::Reverse, 100), 100.0);

        let window = Window::new(11);
        let locus = LocusKey::new(0, Strand::Forward, 100);
        let fast = window.sum(&index, &locus);
        assert_eq!(fast, 2.0 + 0.25 + 3.0);
        assert_eq!(fast, naive_sum(&index, &locus, &window));
    }

    #[test]
    fn test_scenario_a_window() {
        let mut index = DensityIndex::new();
        index.add(LocusKey::new(0, Strand::Forward, 100), 5.0);
        let window = Window::new(10);
        assert_eq!(window.sum(&index, &LocusKey::new(0, Strand::Forward, 102)), 5.0);
        assert_eq!(window.sum(&index, &LocusKey::new(1, Strand::Forward, 500)), 0.0);
    }

    #[test]
    fn test_locus_set_any_within() {
        let mut set = LocusSet::new();
        set.insert(LocusKey::new(2, Strand::Reverse, 1000));
        let window = Window::new(21);
        assert!(set.contains(&LocusKey::new(2, Strand::Reverse, 1000)));
        // 1000 is covered from centers 991..=1010 (upper bound exclusive)
        assert!(!set.any_within(&LocusKey::new(2, Strand::Reverse, 990), &window));
        assert!(set.any_within(&LocusKey::new(2, Strand::Reverse, 991), &window));
        assert!(set.any_within(&LocusKey::new(2, Strand::Reverse, 1010), &window));
        assert!(!set.any_within(&LocusKey::new(2, Strand::Reverse, 1011), &window));
        assert!(!set.any_within(&LocusKey::new(2, Strand::Forward, 1000), &window));
        assert_eq!(set.len(), 1);
    }
}
