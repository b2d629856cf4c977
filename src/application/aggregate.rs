//! Plurality vote over ensemble members.

use crate::domain::AlternativeDisease;

use super::ensemble::Vote;

/// Maximum number of runner-up entries.
pub const MAX_ALTERNATIVES: usize = 3;

#[derive(Debug, Clone, PartialEq)]
pub struct Aggregate {
    pub disease: String,
    /// Mean confidence over all votes, as a percentage
    pub confidence: f64,
    pub alternatives: Vec<AlternativeDisease>,
}

/// Combine votes into a winner, a confidence and alternatives.
///
/// - The winner is the label with the most votes; ties go to the label seen
///   first in vote order.
/// - Confidence averages every vote, not just the winner's supporters.
/// - Alternatives are the top votes by confidence (stable on ties), and may
///   repeat the winner or each other.
///
/// Returns `None` when there are no votes.
#[must_use]
pub fn aggregate(votes: &[Vote]) -> Option<Aggregate> {
    if votes.is_empty() {
        return None;
    }

    let mut tally: Vec<(&str, usize)> = Vec::new();
    for vote in votes {
        match tally.iter_mut().find(|(label, _)| *label == vote.disease) {
            Some((_, count)) => *count += 1,
            None => tally.push((vote.disease.as_str(), 1)),
        }
    }

    let mut winner = tally[0];
    for &entry in &tally[1..] {
        if entry.1 > winner.1 {
            winner = entry;
        }
    }

    let confidence = votes.iter().map(|v| v.confidence).sum::<f64>() / votes.len() as f64 * 100.0;

    let mut ranked: Vec<&Vote> = votes.iter().collect();
    ranked.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    let alternatives = ranked
        .into_iter()
        .take(MAX_ALTERNATIVES)
        .map(|v| AlternativeDisease {
            disease: v.disease.clone(),
            confidence: v.confidence * 100.0,
            source_model: v.model.clone(),
        })
        .collect();

    Some(Aggregate {
        disease: winner.0.to_string(),
        confidence,
        alternatives,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vote(model: &str, disease: &str, confidence: f64) -> Vote {
        Vote {
            model: model.to_string(),
            disease: disease.to_string(),
            confidence,
        }
    }

    #[test]
    fn test_plurality_ignores_confidence() {
        let votes = [
            vote("A", "Flu", 0.3),
            vote("B", "Flu", 0.4),
            vote("C", "Cold", 0.99),
        ];
        let agg = aggregate(&votes).expect("Should aggregate");
        assert_eq!(agg.disease, "Flu");
        assert!((agg.confidence - (0.3 + 0.4 + 0.99) / 3.0 * 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_tie_goes_to_first_seen() {
        let votes = [
            vote("A", "Cold", 0.5),
            vote("B", "Flu", 0.9),
            vote("C", "Flu", 0.9),
            vote("D", "Cold", 0.5),
        ];
        assert_eq!(aggregate(&votes).expect("Should aggregate").disease, "Cold");
    }

    #[test]
    fn test_alternatives_bounded_and_sorted() {
        let votes = [
            vote("A", "Flu", 0.4),
            vote("B", "Cold", 0.8),
            vote("C", "Flu", 0.6),
            vote("D", "Fever", 0.8),
        ];
        let agg = aggregate(&votes).expect("Should aggregate");
        assert_eq!(agg.alternatives.len(), MAX_ALTERNATIVES);
        let sources: Vec<_> = agg.alternatives.iter().map(|a| a.source_model.as_str()).collect();
        assert_eq!(sources, vec!["B", "D", "C"]);
        assert!(agg
            .alternatives
            .windows(2)
            .all(|w| w[0].confidence >= w[1].confidence));
        assert!((agg.alternatives[0].confidence - 80.0).abs() < 1e-9);
    }

    #[test]
    fn test_duplicates_allowed_and_empty_is_none() {
        let votes = [vote("A", "Flu", 0.9), vote("B", "Flu", 0.7)];
        let agg = aggregate(&votes).expect("Should aggregate");
        assert_eq!(agg.alternatives.len(), 2);
        assert!(agg.alternatives.iter().all(|a| a.disease == "Flu"));

        assert!(aggregate(&[]).is_none());
    }
}
