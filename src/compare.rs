//! Containment relations between mined pattern sets
//!
//! Two patterns are compared through their method bags. The bags are sorted
//! and may repeat entries, so the relation is computed with a single merge
//! walk over both lists instead of a set test: a name that occurs twice in
//! one bag and once in the other counts as one extra element.

use crate::metadata::PatternMetadata;
use anyhow::{Context, Result};
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Relation of bag A to bag B
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContainmentRelation {
    Equal,
    /// A has everything B has, and more
    Contains,
    /// B has everything A has, and more
    ContainedIn,
    Incomparable,
}

impl ContainmentRelation {
    /// The relation seen from the other side
    pub fn inverse(self) -> Self {
        match self {
            ContainmentRelation::Contains => ContainmentRelation::ContainedIn,
            ContainmentRelation::ContainedIn => ContainmentRelation::Contains,
            other => other,
        }
    }
}

/// Compare two sorted method bags
///
/// # Example
/// ```
/// use groum_ingest::compare::{compare_bags, ContainmentRelation};
///
/// let a = ["x".to_string(), "y".to_string()];
/// let b = ["x".to_string()];
/// assert_eq!(compare_bags(&a, &b), ContainmentRelation::Contains);
/// assert_eq!(compare_bags(&b, &a), ContainmentRelation::ContainedIn);
/// ```
pub fn compare_bags(a: &[String], b: &[String]) -> ContainmentRelation {
    let (mut i, mut j) = (0, 0);
    let mut only_in_a = 0usize;
    let mut only_in_b = 0usize;

    while i < a.len() || j < b.len() {
        let step = match (a.get(i), b.get(j)) {
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (Some(x), Some(y)) => x.cmp(y),
            (None, None) => break,
        };

        match step {
            Ordering::Less => {
                only_in_a += 1;
                i += 1;
            }
            Ordering::Greater => {
                only_in_b += 1;
                j += 1;
            }
            Ordering::Equal => {
                i += 1;
                j += 1;
            }
        }
    }

    match (only_in_a, only_in_b) {
        (0, 0) => ContainmentRelation::Equal,
        (_, 0) => ContainmentRelation::Contains,
        (0, _) => ContainmentRelation::ContainedIn,
        _ => ContainmentRelation::Incomparable,
    }
}

/// Compare two patterns by their method bags
pub fn compare(a: &PatternMetadata, b: &PatternMetadata) -> ContainmentRelation {
    compare_bags(a.method_bag(), b.method_bag())
}

/// Identifies one pattern across clusters
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PatternRef {
    pub cluster_id: u32,
    pub pattern_id: String,
}

impl From<&PatternMetadata> for PatternRef {
    fn from(meta: &PatternMetadata) -> Self {
        Self {
            cluster_id: meta.cluster_id,
            pattern_id: meta.pattern_id.clone(),
        }
    }
}

/// Result of comparing two pattern collections pairwise
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ComparisonSummary {
    /// Patterns of each side that passed the filter
    pub left_patterns: usize,
    pub right_patterns: usize,
    pub equal: usize,
    pub contains: usize,
    pub contained_in: usize,
    pub incomparable: usize,
    /// Smallest and largest `size` among the filtered patterns of both sides
    pub min_size: Option<usize>,
    pub max_size: Option<usize>,
    /// Pairs with identical method bags (duplicates across the two outputs)
    pub equal_pairs: Vec<(PatternRef, PatternRef)>,
}

impl ComparisonSummary {
    pub fn total_pairs(&self) -> usize {
        self.equal + self.contains + self.contained_in + self.incomparable
    }

    fn record(&mut self, relation: ContainmentRelation) {
        match relation {
            ContainmentRelation::Equal => self.equal += 1,
            ContainmentRelation::Contains => self.contains += 1,
            ContainmentRelation::ContainedIn => self.contained_in += 1,
            ContainmentRelation::Incomparable => self.incomparable += 1,
        }
    }

    fn observe_size(&mut self, size: usize) {
        self.min_size = Some(self.min_size.map_or(size, |m| m.min(size)));
        self.max_size = Some(self.max_size.map_or(size, |m| m.max(size)));
    }
}

/// Compare every filtered left pattern with every filtered right pattern
///
/// Relations are taken from the left side's point of view: `contains`
/// counts pairs where the left pattern contains the right one.
pub fn compare_collections<F>(
    left: &[PatternMetadata],
    right: &[PatternMetadata],
    filter: F,
) -> ComparisonSummary
where
    F: Fn(&PatternMetadata) -> bool,
{
    let left: Vec<&PatternMetadata> = left.iter().filter(|p| filter(*p)).collect();
    let right: Vec<&PatternMetadata> = right.iter().filter(|p| filter(*p)).collect();

    let mut summary = ComparisonSummary {
        left_patterns: left.len(),
        right_patterns: right.len(),
        ..ComparisonSummary::default()
    };

    for pattern in left.iter().chain(right.iter()) {
        summary.observe_size(pattern.size);
    }

    for a in &left {
        for b in &right {
            let relation = compare(a, b);
            summary.record(relation);
            if relation == ContainmentRelation::Equal {
                summary
                    .equal_pairs
                    .push((PatternRef::from(*a), PatternRef::from(*b)));
            }
        }
    }

    summary
}

/// Filter accepting patterns whose bag includes every required method
pub fn requires_methods(required: Vec<String>) -> impl Fn(&PatternMetadata) -> bool {
    move |pattern| pattern.includes_all(&required)
}

/// Load method names, one per line, with all whitespace removed
pub fn load_method_names<P: AsRef<Path>>(path: P) -> Result<Vec<String>> {
    let content = fs::read_to_string(path.as_ref()).with_context(|| {
        format!("Failed to read method names file: {}", path.as_ref().display())
    })?;

    Ok(content
        .lines()
        .map(|line| line.chars().filter(|c| !c.is_whitespace()).collect::<String>())
        .filter(|name| !name.is_empty())
        .collect())
}

/// Number of patterns per `size`
pub fn size_histogram(patterns: &[PatternMetadata]) -> BTreeMap<usize, usize> {
    let mut histogram = BTreeMap::new();
    for pattern in patterns {
        *histogram.entry(pattern.size).or_insert(0) += 1;
    }
    histogram
}

/// Number of patterns per frequency
pub fn frequency_histogram(patterns: &[PatternMetadata]) -> BTreeMap<u32, usize> {
    let mut histogram = BTreeMap::new();
    for pattern in patterns {
        *histogram.entry(pattern.frequency).or_insert(0) += 1;
    }
    histogram
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn bag(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn pattern(cluster: u32, id: &str, size: usize, methods: &[&str]) -> PatternMetadata {
        let mut meta = PatternMetadata::new(cluster, id).with_method_bag(bag(methods));
        meta.size = size;
        meta
    }

    #[test]
    fn test_contains_and_contained_in() {
        let a = bag(&["x", "y"]);
        let b = bag(&["x"]);
        assert_eq!(compare_bags(&a, &b), ContainmentRelation::Contains);
        assert_eq!(compare_bags(&b, &a), ContainmentRelation::ContainedIn);
    }

    #[test]
    fn test_incomparable() {
        let a = bag(&["x", "z"]);
        let b = bag(&["x", "y"]);
        assert_eq!(compare_bags(&a, &b), ContainmentRelation::Incomparable);
        assert_eq!(compare_bags(&b, &a), ContainmentRelation::Incomparable);
    }

    #[test]
    fn test_reflexive_with_duplicates() {
        let a = bag(&["a", "a", "b"]);
        assert_eq!(compare_bags(&a, &a), ContainmentRelation::Equal);
    }

    #[test]
    fn test_duplicates_count_as_extra() {
        let a = bag(&["a", "a", "b"]);
        let b = bag(&["a", "b"]);
        assert_eq!(compare_bags(&a, &b), ContainmentRelation::Contains);
    }

    #[test]
    fn test_empty_bags() {
        let empty: Vec<String> = Vec::new();
        assert_eq!(compare_bags(&empty, &empty), ContainmentRelation::Equal);
        assert_eq!(
            compare_bags(&bag(&["a"]), &empty),
            ContainmentRelation::Contains
        );
    }

    #[test]
    fn test_inverse() {
        assert_eq!(
            ContainmentRelation::Contains.inverse(),
            ContainmentRelation::ContainedIn
        );
        assert_eq!(
            ContainmentRelation::Equal.inverse(),
            ContainmentRelation::Equal
        );
    }

    #[test]
    fn test_compare_collections_counts() {
        let left = vec![
            pattern(1, "1", 3, &["a", "b"]),
            pattern(1, "2", 5, &["a", "b", "c"]),
        ];
        let right = vec![pattern(2, "9", 2, &["a", "b"]), pattern(2, "8", 7, &["z"])];

        let summary = compare_collections(&left, &right, |_| true);

        assert_eq!(summary.total_pairs(), 4);
        assert_eq!(summary.equal, 1);
        assert_eq!(summary.contains, 1);
        assert_eq!(summary.incomparable, 2);
        assert_eq!(summary.min_size, Some(2));
        assert_eq!(summary.max_size, Some(7));
        assert_eq!(
            summary.equal_pairs,
            vec![(
                PatternRef {
                    cluster_id: 1,
                    pattern_id: "1".to_string()
                },
                PatternRef {
                    cluster_id: 2,
                    pattern_id: "9".to_string()
                }
            )]
        );
    }

    #[test]
    fn test_compare_collections_with_required_methods() {
        let left = vec![pattern(1, "1", 3, &["a", "b"]), pattern(1, "2", 4, &["c"])];
        let right = vec![pattern(2, "9", 2, &["a"])];

        let summary = compare_collections(&left, &right, requires_methods(bag(&["a"])));

        assert_eq!(summary.left_patterns, 1);
        assert_eq!(summary.right_patterns, 1);
        assert_eq!(summary.contains, 1);
        assert_eq!(summary.min_size, Some(2));
        assert_eq!(summary.max_size, Some(3));
    }

    #[test]
    fn test_compare_collections_nothing_passes() {
        let left = vec![pattern(1, "1", 3, &["a"])];
        let summary = compare_collections(&left, &[], |_| false);
        assert_eq!(summary, ComparisonSummary::default());
    }

    #[test]
    fn test_load_method_names() -> Result<()> {
        let mut file = NamedTempFile::new()?;
        writeln!(file, "java.io.File.exists \n\n  java.io.File. delete")?;
        file.flush()?;

        let names = load_method_names(file.path())?;
        assert_eq!(names, vec!["java.io.File.exists", "java.io.File.delete"]);
        Ok(())
    }

    #[test]
    fn test_histograms() {
        let mut patterns = vec![
            pattern(1, "1", 3, &["a"]),
            pattern(1, "2", 3, &["b"]),
            pattern(1, "3", 5, &["c"]),
        ];
        patterns[0].frequency = 20;
        patterns[1].frequency = 40;
        patterns[2].frequency = 20;

        let sizes = size_histogram(&patterns);
        assert_eq!(sizes.get(&3), Some(&2));
        assert_eq!(sizes.get(&5), Some(&1));

        let freqs = frequency_histogram(&patterns);
        assert_eq!(freqs.into_iter().collect::<Vec<_>>(), vec![(20, 2), (40, 1)]);
    }
}
