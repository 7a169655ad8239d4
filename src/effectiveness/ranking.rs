use std::fmt;

use serde::Serialize;

use crate::effectiveness::scoring::CategoryScores;

pub const STRENGTH_THRESHOLD: f64 = 80.0;
pub const WEAKNESS_THRESHOLD: f64 = 40.0;
const KEY_CATEGORY_LIMIT: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Suitability {
    Excellent,
    Good,
    Fair,
    Poor,
}

impl Suitability {
    pub fn from_score(score: f64) -> Self {
        if score >= 80.0 {
            Self::Excellent
        } else if score >= 65.0 {
            Self::Good
        } else if score >= 45.0 {
            Self::Fair
        } else {
            Self::Poor
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Excellent => "excellent",
            Self::Good => "good",
            Self::Fair => "fair",
            Self::Poor => "poor",
        }
    }
}

impl fmt::Display for Suitability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActivityComparison {
    pub activity_id: String,
    pub activity_name: String,
    pub overall_score: f64,
    /// 1-based, gap-free.
    pub rank: usize,
    pub suitability: Suitability,
    pub key_strengths: Vec<String>,
    pub key_weaknesses: Vec<String>,
    pub category_scores: CategoryScores,
}

impl ActivityComparison {
    pub fn new(
        activity_id: impl Into<String>,
        activity_name: impl Into<String>,
        overall_score: f64,
        category_scores: CategoryScores,
    ) -> Self {
        Self {
            activity_id: activity_id.into(),
            activity_name: activity_name.into(),
            overall_score,
            rank: 0,
            suitability: Suitability::from_score(overall_score),
            key_strengths: key_strengths(&category_scores),
            key_weaknesses: key_weaknesses(&category_scores),
            category_scores,
        }
    }
}

/// Top categories scoring at least 80, best first.
pub fn key_strengths(scores: &CategoryScores) -> Vec<String> {
    let mut strong: Vec<(&str, f64)> = scores
        .entries()
        .into_iter()
        .filter(|(_, score)| *score >= STRENGTH_THRESHOLD)
        .collect();
    strong.sort_by(|left, right| right.1.total_cmp(&left.1).then_with(|| left.0.cmp(right.0)));
    strong
        .into_iter()
        .take(KEY_CATEGORY_LIMIT)
        .map(|(name, _)| name.to_string())
        .collect()
}

/// Bottom categories scoring under 40, worst first.
pub fn key_weaknesses(scores: &CategoryScores) -> Vec<String> {
    let mut weak: Vec<(&str, f64)> = scores
        .entries()
        .into_iter()
        .filter(|(_, score)| *score < WEAKNESS_THRESHOLD)
        .collect();
    weak.sort_by(|left, right| left.1.total_cmp(&right.1).then_with(|| left.0.cmp(right.0)));
    weak.into_iter()
        .take(KEY_CATEGORY_LIMIT)
        .map(|(name, _)| name.to_string())
        .collect()
}

/// Sort by overall score descending (activity ID breaks ties) and assign ranks `1..=N`.
pub fn rank_comparisons(mut comparisons: Vec<ActivityComparison>) -> Vec<ActivityComparison> {
    comparisons.sort_by(|left, right| {
        right
            .overall_score
            .total_cmp(&left.overall_score)
            .then_with(|| left.activity_id.cmp(&right.activity_id))
    });
    for (index, comparison) in comparisons.iter_mut().enumerate() {
        comparison.rank = index + 1;
    }
    comparisons
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scores(damage: f64, survivability: f64, mobility: f64) -> CategoryScores {
        CategoryScores {
            damage,
            survivability,
            mobility,
            utility: 60.0,
            cost: 60.0,
            accessibility: 60.0,
        }
    }

    #[test]
    fn suitability_buckets() {
        assert_eq!(Suitability::from_score(80.0), Suitability::Excellent);
        assert_eq!(Suitability::from_score(79.9), Suitability::Good);
        assert_eq!(Suitability::from_score(65.0), Suitability::Good);
        assert_eq!(Suitability::from_score(45.0), Suitability::Fair);
        assert_eq!(Suitability::from_score(44.9), Suitability::Poor);
    }

    #[test]
    fn strengths_and_weaknesses_take_at_most_two() {
        let s = CategoryScores {
            damage: 95.0,
            survivability: 85.0,
            mobility: 90.0,
            utility: 10.0,
            cost: 30.0,
            accessibility: 5.0,
        };
        assert_eq!(key_strengths(&s), vec!["damage", "mobility"]);
        assert_eq!(key_weaknesses(&s), vec!["accessibility", "utility"]);
    }

    #[test]
    fn ranks_are_dense_and_ordered() {
        let ranked = rank_comparisons(vec![
            ActivityComparison::new("b", "B", 50.0, scores(50.0, 50.0, 50.0)),
            ActivityComparison::new("a", "A", 50.0, scores(50.0, 50.0, 50.0)),
            ActivityComparison::new("c", "C", 90.0, scores(90.0, 90.0, 90.0)),
        ]);
        let ids: Vec<&str> = ranked.iter().map(|c| c.activity_id.as_str()).collect();
        assert_eq!(ids, vec!["c", "a", "b"]);
        let ranks: Vec<usize> = ranked.iter().map(|c| c.rank).collect();
        assert_eq!(ranks, vec![1, 2, 3]);
        assert_eq!(ranked[0].key_strengths.len(), 2);
    }
}
