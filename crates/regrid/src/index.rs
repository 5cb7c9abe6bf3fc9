//! Sorted coordinate index over a curvilinear grid.

use std::ops::Range;

/// Distinct coordinate values in ascending order, each with the flat indices
/// of the grid cells holding that value. NaN coordinates are left out.
#[derive(Debug, Clone)]
pub struct CoordinateIndex {
    values: Vec<f64>,
    cells: Vec<Vec<usize>>,
}

impl CoordinateIndex {
    pub fn new(coordinates: &[f64]) -> Self {
        let mut pairs: Vec<(f64, usize)> = coordinates
            .iter()
            .enumerate()
            .filter(|(_, value)| !value.is_nan())
            .map(|(index, &value)| (value, index))
            .collect();
        pairs.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));

        let mut values: Vec<f64> = Vec::new();
        let mut cells: Vec<Vec<usize>> = Vec::new();
        for (value, index) in pairs {
            match values.last() {
                Some(&last) if last == value => {
                    if let Some(group) = cells.last_mut() {
                        group.push(index);
                    }
                }
                _ => {
                    values.push(value);
                    cells.push(vec![index]);
                }
            }
        }

        Self { values, cells }
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Number of distinct values.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn min(&self) -> Option<f64> {
        self.values.first().copied()
    }

    pub fn max(&self) -> Option<f64> {
        self.values.last().copied()
    }

    fn value_range(&self, lo: f64, hi: f64) -> Range<usize> {
        let start = self.values.partition_point(|&v| v < lo);
        let end = self.values.partition_point(|&v| v <= hi);
        start..end.max(start)
    }

    /// Flat indices of cells whose coordinate lies in `[lo, hi]`.
    pub fn cells_between(&self, lo: f64, hi: f64) -> impl Iterator<Item = usize> + '_ {
        self.cells[self.value_range(lo, hi)]
            .iter()
            .flat_map(|group| group.iter().copied())
    }

    /// Number of cells whose coordinate lies in `[lo, hi]`.
    pub fn count_between(&self, lo: f64, hi: f64) -> usize {
        self.cells[self.value_range(lo, hi)].iter().map(Vec::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_groups_equal_values() {
        let index = CoordinateIndex::new(&[2.0, 1.0, f64::NAN, 2.0, 3.0]);
        assert_eq!(index.len(), 3);
        assert_eq!(index.min(), Some(1.0));
        assert_eq!(index.max(), Some(3.0));
        let mut cells: Vec<_> = index.cells_between(1.5, 2.5).collect();
        cells.sort();
        assert_eq!(cells, vec![0, 3]);
        assert_eq!(index.count_between(0.0, 10.0), 4);
    }

    #[test]
    fn test_empty_range() {
        let index = CoordinateIndex::new(&[1.0, 2.0]);
        assert_eq!(index.cells_between(5.0, 6.0).count(), 0);
        assert_eq!(index.cells_between(1.2, 1.8).count(), 0);
        assert!(CoordinateIndex::new(&[f64::NAN]).is_empty());
    }
}
