use std::{cmp::Ordering, collections::BTreeSet, fmt::Display};

use itertools::Itertools;

use crate::error::{Error, Result};

const PARAMETER_PRIORITY: i32 = 10;

/// Closed range `[start, end]` of instruction indices over which a variable
/// may still be read, plus the points where it is actually used.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LiveInterval {
    var: String,
    start: u32,
    end: u32,
    priority: i32,
    use_points: BTreeSet<u32>,
}

impl LiveInterval {
    pub fn new(var: impl Into<String>, start: u32, end: u32) -> Result<Self> {
        Self::with_priority(var, start, end, 0)
    }

    pub fn with_priority(var: impl Into<String>, start: u32, end: u32, priority: i32) -> Result<Self> {
        let var = var.into();
        if var.is_empty() {
            return Err(Error::EmptyVariableName);
        }
        if start > end {
            return Err(Error::InvalidInterval { var, start, end });
        }

        Ok(Self {
            var,
            start,
            end,
            priority,
            use_points: BTreeSet::new(),
        })
    }

    pub fn with_use_points(
        var: impl Into<String>,
        start: u32,
        end: u32,
        use_points: impl IntoIterator<Item = u32>,
    ) -> Result<Self> {
        let mut interval = Self::new(var, start, end)?;
        for point in use_points {
            interval.add_use_point(point)?;
        }
        Ok(interval)
    }

    pub fn temporary(start: u32, end: u32) -> Result<Self> {
        Self::new(format!("temp_{}_{}", start, end), start, end)
    }

    pub fn parameter(index: usize, start: u32, end: u32) -> Result<Self> {
        Self::with_priority(format!("param_{}", index), start, end, PARAMETER_PRIORITY)
    }

    pub fn var(&self) -> &str {
        &self.var
    }

    pub fn start(&self) -> u32 {
        self.start
    }

    pub fn end(&self) -> u32 {
        self.end
    }

    pub fn priority(&self) -> i32 {
        self.priority
    }

    /// Number of instruction indices covered; never zero.
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> u32 {
        self.end - self.start + 1
    }

    pub fn use_points(&self) -> impl Iterator<Item = u32> + '_ {
        self.use_points.iter().copied()
    }

    pub fn use_count(&self) -> usize {
        self.use_points.len()
    }

    /// Returns false if the point was already recorded.
    pub fn add_use_point(&mut self, point: u32) -> Result<bool> {
        if !self.contains(point) {
            return Err(Error::UsePointOutOfRange {
                var: self.var.clone(),
                point,
                start: self.start,
                end: self.end,
            });
        }
        Ok(self.use_points.insert(point))
    }

    pub fn remove_use_point(&mut self, point: u32) -> bool {
        self.use_points.remove(&point)
    }

    pub fn has_use_point(&self, point: u32) -> bool {
        self.use_points.contains(&point)
    }

    /// First use at or after `from`.
    pub fn next_use_point(&self, from: u32) -> Option<u32> {
        self.use_points.range(from..).next().copied()
    }

    pub fn density(&self) -> f64 {
        self.use_count() as f64 / self.len() as f64
    }

    pub fn overlaps(&self, other: &Self) -> bool {
        self.start.max(other.start) <= self.end.min(other.end)
    }

    pub fn contains(&self, point: u32) -> bool {
        self.start <= point && point <= self.end
    }

    /// The shared range of two overlapping intervals.
    pub fn overlap(&self, other: &Self) -> Option<(u32, u32)> {
        self.overlaps(other)
            .then(|| (self.start.max(other.start), self.end.min(other.end)))
    }

    pub fn merge(first: &Self, second: &Self) -> Result<Self> {
        if !first.overlaps(second) {
            return Err(Error::DisjointIntervals(
                first.var.clone(),
                second.var.clone(),
            ));
        }

        let mut merged = Self::with_priority(
            format!("merged_{}_{}", first.var, second.var),
            first.start.min(second.start),
            first.end.max(second.end),
            first.priority.max(second.priority),
        )?;
        merged.use_points = first
            .use_points
            .iter()
            .chain(second.use_points.iter())
            .copied()
            .collect();
        Ok(merged)
    }
}

impl PartialOrd for LiveInterval {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for LiveInterval {
    fn cmp(&self, other: &Self) -> Ordering {
        self.start
            .cmp(&other.start)
            .then(self.end.cmp(&other.end))
            .then_with(|| self.var.cmp(&other.var))
            .then(self.priority.cmp(&other.priority))
            .then_with(|| self.use_points.cmp(&other.use_points))
    }
}

impl Display for LiveInterval {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} [{}, {}]", self.var, self.start, self.end)?;
        if !self.use_points.is_empty() {
            write!(f, " uses {{{}}}", self.use_points.iter().join(", "))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_range() {
        assert_eq!(
            Err(Error::InvalidInterval {
                var: "x".to_string(),
                start: 6,
                end: 5
            }),
            LiveInterval::new("x", 6, 5)
        );
        assert_eq!(Err(Error::EmptyVariableName), LiveInterval::new("", 0, 1));
        assert!(LiveInterval::new("x", 3, 3).is_ok());
    }

    #[test]
    fn test_overlaps() {
        let cases = vec![
            ((1, 5), (2, 6), true),
            ((1, 5), (5, 9), true),
            ((1, 5), (6, 9), false),
            ((3, 3), (1, 5), true),
            ((0, 0), (1, 1), false),
        ];

        for ((s1, e1), (s2, e2), expected) in cases {
            let a = LiveInterval::new("a", s1, e1).unwrap();
            let b = LiveInterval::new("b", s2, e2).unwrap();
            assert_eq!(expected, a.overlaps(&b));
            assert_eq!(expected, b.overlaps(&a));
            assert_eq!(expected, a.overlap(&b).is_some());
        }

        let a = LiveInterval::new("a", 1, 5).unwrap();
        let b = LiveInterval::new("b", 3, 9).unwrap();
        assert_eq!(Some((3, 5)), a.overlap(&b));
    }

    #[test]
    fn test_contains_is_closed() {
        let interval = LiveInterval::new("x", 2, 4).unwrap();
        assert!(!interval.contains(1));
        assert!(interval.contains(2));
        assert!(interval.contains(4));
        assert!(!interval.contains(5));
        assert_eq!(3, interval.len());
    }

    #[test]
    fn test_use_points() {
        let mut interval = LiveInterval::with_use_points("x", 0, 9, [7, 2, 4]).unwrap();
        assert_eq!(vec![2, 4, 7], interval.use_points().collect::<Vec<_>>());

        assert!(!interval.add_use_point(4).unwrap());
        assert_eq!(3, interval.use_count());
        assert!(interval.add_use_point(9).unwrap());
        assert!(matches!(
            interval.add_use_point(10),
            Err(Error::UsePointOutOfRange { point: 10, .. })
        ));

        assert_eq!(Some(4), interval.next_use_point(3));
        assert_eq!(Some(4), interval.next_use_point(4));
        assert_eq!(None, interval.next_use_point(10));

        assert!(interval.remove_use_point(2));
        assert!(!interval.remove_use_point(2));
        assert!(!interval.has_use_point(2));
        assert!((interval.density() - 0.3).abs() < f64::EPSILON);
    }

    #[test]
    fn test_merge() {
        let a = LiveInterval::with_use_points("a", 1, 5, [1, 3]).unwrap();
        let mut b = LiveInterval::with_priority("b", 3, 8, 4).unwrap();
        b.add_use_point(3).unwrap();
        b.add_use_point(8).unwrap();

        let merged = LiveInterval::merge(&a, &b).unwrap();
        assert_eq!("merged_a_b", merged.var());
        assert_eq!((1, 8), (merged.start(), merged.end()));
        assert_eq!(4, merged.priority());
        assert_eq!(vec![1, 3, 8], merged.use_points().collect::<Vec<_>>());

        let c = LiveInterval::new("c", 9, 10).unwrap();
        assert_eq!(
            Err(Error::DisjointIntervals("a".to_string(), "c".to_string())),
            LiveInterval::merge(&a, &c)
        );
    }

    #[test]
    fn test_factories() {
        let temp = LiveInterval::temporary(3, 7).unwrap();
        assert_eq!("temp_3_7", temp.var());

        let param = LiveInterval::parameter(1, 0, 12).unwrap();
        assert_eq!("param_1", param.var());
        assert_eq!(PARAMETER_PRIORITY, param.priority());
    }

    #[test]
    fn test_ordering() {
        let mut intervals = vec![
            LiveInterval::new("b", 1, 4).unwrap(),
            LiveInterval::new("a", 1, 4).unwrap(),
            LiveInterval::new("c", 0, 9).unwrap(),
            LiveInterval::new("d", 1, 2).unwrap(),
        ];
        intervals.sort();

        let order: Vec<_> = intervals.iter().map(LiveInterval::var).collect();
        assert_eq!(vec!["c", "d", "a", "b"], order);
    }
}
