use std::collections::BTreeMap;
use std::str::FromStr;

use thiserror::Error;

/// 1-based line numbers that should be visually called out.
///
/// Stored as disjoint, non-adjacent inclusive ranges keyed by their first
/// line, so `1-1000000` costs one entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmphasisSet {
    ranges: BTreeMap<usize, usize>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EmphasisParseError {
    #[error("invalid line number {0:?}")]
    InvalidNumber(String),
    #[error("invalid line range {0:?}")]
    InvalidRange(String),
}

impl EmphasisSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Line 0 does not exist and is ignored.
    pub fn insert(&mut self, line: usize) -> bool {
        if line == 0 || self.contains(line) {
            return false;
        }
        self.insert_range(line, line);
        true
    }

    /// Add `from..=to`, merging with ranges it overlaps or touches.
    pub fn insert_range(&mut self, from: usize, to: usize) {
        let mut start = from.max(1);
        let mut end = to;
        if start > end {
            return;
        }
        if let Some((&first, &last)) = self.ranges.range(..start).next_back() {
            if last.saturating_add(1) >= start {
                start = first;
                end = end.max(last);
            }
        }
        let absorbed: Vec<usize> = self
            .ranges
            .range(start..=end.saturating_add(1))
            .map(|(&first, _)| first)
            .collect();
        for first in absorbed {
            if let Some(last) = self.ranges.remove(&first) {
                end = end.max(last);
            }
        }
        self.ranges.insert(start, end);
    }

    pub fn contains(&self, line: usize) -> bool {
        self.ranges
            .range(..=line)
            .next_back()
            .is_some_and(|(_, &last)| line <= last)
    }

    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.ranges.iter().flat_map(|(&first, &last)| first..=last)
    }

    pub fn len(&self) -> usize {
        self.ranges
            .iter()
            .fold(0usize, |total, (&first, &last)| {
                total.saturating_add(last - first).saturating_add(1)
            })
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }
}

impl FromIterator<usize> for EmphasisSet {
    fn from_iter<I: IntoIterator<Item = usize>>(iter: I) -> Self {
        let mut set = EmphasisSet::new();
        for line in iter {
            set.insert(line);
        }
        set
    }
}

/// Parses `"2,4,7-9"` style lists. Blank items are skipped.
impl FromStr for EmphasisSet {
    type Err = EmphasisParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut set = EmphasisSet::new();
        for item in s.split(',').map(str::trim).filter(|item| !item.is_empty()) {
            match item.split_once('-') {
                Some((from, to)) => {
                    let invalid = || EmphasisParseError::InvalidRange(item.to_string());
                    let from: usize = from.trim().parse().map_err(|_| invalid())?;
                    let to: usize = to.trim().parse().map_err(|_| invalid())?;
                    if from > to {
                        return Err(invalid());
                    }
                    set.insert_range(from, to);
                }
                None => {
                    let line = item
                        .parse()
                        .map_err(|_| EmphasisParseError::InvalidNumber(item.to_string()))?;
                    set.insert(line);
                }
            }
        }
        Ok(set)
    }
}

impl Extend<usize> for EmphasisSet {
    fn extend<I: IntoIterator<Item = usize>>(&mut self, iter: I) {
        for line in iter {
            self.insert(line);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn membership() {
        let set: EmphasisSet = [2, 4].into_iter().collect();
        let marked: Vec<usize> = (1..=5).filter(|n| set.contains(*n)).collect();
        assert_eq!(marked, vec![2, 4]);
    }

    #[test]
    fn zero_is_ignored() {
        let set: EmphasisSet = [0, 1].into_iter().collect();
        assert_eq!(set.iter().collect::<Vec<_>>(), vec![1]);
    }

    #[test]
    fn parses_lists_and_ranges() {
        let set: EmphasisSet = "2, 4,7-9,,".parse().unwrap();
        assert_eq!(set.iter().collect::<Vec<_>>(), vec![2, 4, 7, 8, 9]);
        assert!("".parse::<EmphasisSet>().unwrap().is_empty());
    }

    #[test]
    fn rejects_malformed_items() {
        assert_eq!(
            "2,x".parse::<EmphasisSet>(),
            Err(EmphasisParseError::InvalidNumber("x".to_string()))
        );
        assert_eq!(
            "9-3".parse::<EmphasisSet>(),
            Err(EmphasisParseError::InvalidRange("9-3".to_string()))
        );
        assert!("-3".parse::<EmphasisSet>().is_err());
    }

    #[test]
    fn huge_ranges_are_not_expanded() {
        let set: EmphasisSet = format!("5-{}", usize::MAX).parse().unwrap();
        assert!(!set.contains(4));
        assert!(set.contains(5));
        assert!(set.contains(usize::MAX));
        assert_eq!(set.len(), usize::MAX - 4);
        assert_eq!(set.iter().take(3).collect::<Vec<_>>(), vec![5, 6, 7]);
    }

    #[test]
    fn overlapping_and_touching_ranges_merge() {
        let set: EmphasisSet = "10-12,1-3,5,4,11-20,0-1".parse().unwrap();
        let lines: Vec<usize> = set.iter().collect();
        let expected: Vec<usize> = (1..=5).chain(10..=20).collect();
        assert_eq!(lines, expected);
        assert_eq!(set.len(), expected.len());
        assert!(!set.contains(0));
        assert!(!set.contains(7));
        assert_eq!(set, "1-5,10-20".parse::<EmphasisSet>().unwrap());
    }
}
